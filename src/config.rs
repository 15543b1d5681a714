//! Configuration management for the study tutor client
//!
//! This module handles loading, parsing, validating, and managing
//! configuration from files, environment variables, and CLI overrides.

use crate::error::{Result, TutorError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Tutor Service connection settings
    #[serde(default)]
    pub service: ServiceConfig,
    /// Export settings
    #[serde(default)]
    pub export: ExportConfig,
}

/// Tutor Service connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the study-platform API (e.g. `http://localhost:8000/api`)
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token passed through to the service, if any
    #[serde(default)]
    pub token: Option<String>,

    /// Transport-level request timeout (seconds)
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_timeout() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout_seconds: default_timeout(),
        }
    }
}

/// Export configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Directory artifacts are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,

    /// Upper bound on pages in a paginated export
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_max_pages() -> usize {
    500
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
            max_pages: default_max_pages(),
        }
    }
}

impl Config {
    /// Load configuration from file with environment and CLI overrides
    ///
    /// A missing file is not an error; defaults are used instead.
    ///
    /// # Errors
    ///
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(path: &str, cli: &crate::cli::Cli) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            Self::from_file(path)?
        } else {
            tracing::warn!("Config file not found at {}, using defaults", path);
            Self::default()
        };

        config.apply_env_vars();
        config.apply_cli_overrides(cli);

        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| TutorError::Config(format!("Failed to read config file: {}", e)))?;
        serde_yaml::from_str(&contents)
            .map_err(|e| TutorError::Config(format!("Failed to parse config: {}", e)).into())
    }

    fn apply_env_vars(&mut self) {
        if let Ok(base_url) = std::env::var("STUDY_TUTOR_BASE_URL") {
            tracing::debug!(base_url = %base_url, "Env override: STUDY_TUTOR_BASE_URL");
            self.service.base_url = base_url;
        }

        if let Ok(token) = std::env::var("STUDY_TUTOR_TOKEN") {
            tracing::debug!("Env override: STUDY_TUTOR_TOKEN");
            self.service.token = Some(token);
        }

        if let Ok(timeout) = std::env::var("STUDY_TUTOR_TIMEOUT_SECONDS") {
            if let Ok(value) = timeout.parse() {
                self.service.timeout_seconds = value;
            } else {
                tracing::warn!("Invalid STUDY_TUTOR_TIMEOUT_SECONDS: {}", timeout);
            }
        }

        if let Ok(dir) = std::env::var("STUDY_TUTOR_EXPORT_DIR") {
            tracing::debug!(output_dir = %dir, "Env override: STUDY_TUTOR_EXPORT_DIR");
            self.export.output_dir = PathBuf::from(dir);
        }

        if let Ok(max_pages) = std::env::var("STUDY_TUTOR_MAX_PAGES") {
            if let Ok(value) = max_pages.parse() {
                self.export.max_pages = value;
            } else {
                tracing::warn!("Invalid STUDY_TUTOR_MAX_PAGES: {}", max_pages);
            }
        }
    }

    fn apply_cli_overrides(&mut self, cli: &crate::cli::Cli) {
        if cli.verbose {
            tracing::debug!("Verbose mode enabled");
        }
        if let Some(base_url) = &cli.base_url {
            self.service.base_url = base_url.clone();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Config`] describing the first invalid value
    pub fn validate(&self) -> Result<()> {
        let parsed = url::Url::parse(&self.service.base_url).map_err(|e| {
            TutorError::Config(format!(
                "service.base_url is not a valid URL ({}): {}",
                self.service.base_url, e
            ))
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(TutorError::Config(format!(
                "service.base_url must use http or https, got {}",
                parsed.scheme()
            ))
            .into());
        }

        if self.service.timeout_seconds == 0 {
            return Err(TutorError::Config(
                "service.timeout_seconds must be greater than 0".to_string(),
            )
            .into());
        }

        if self.export.max_pages == 0 {
            return Err(
                TutorError::Config("export.max_pages must be greater than 0".to_string()).into(),
            );
        }

        Ok(())
    }
}
