//! Transcript export
//!
//! Turns a transcript snapshot into a downloadable artifact: either the
//! flat-text document or a paginated PDF. Exports never mutate the
//! transcript, and rendering the same snapshot twice with the same export
//! time yields identical bytes.

pub mod layout;
pub mod metrics;
pub mod pdf;
pub mod text;

pub use layout::{PageGeometry, PagedDocument, Paginator};
pub use metrics::{FixedAdvance, FontWeight, Helvetica, TextMetrics};

use chrono::{DateTime, Utc};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::ExportConfig;
use crate::error::{Result, TutorError};
use crate::transcript::Exchange;

/// Prefix shared by every artifact file name
const FILE_PREFIX: &str = "study-tutor-chat";

/// Export output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Plain text with divider lines
    Text,
    /// Paginated A4 PDF
    Pdf,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Text => "txt",
            ExportFormat::Pdf => "pdf",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Text => "text/plain; charset=utf-8",
            ExportFormat::Pdf => "application/pdf",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportFormat::Text => write!(f, "text"),
            ExportFormat::Pdf => write!(f, "pdf"),
        }
    }
}

impl FromStr for ExportFormat {
    type Err = TutorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text" | "txt" => Ok(ExportFormat::Text),
            "pdf" => Ok(ExportFormat::Pdf),
            other => Err(TutorError::Export(format!(
                "unknown export format '{}', expected text or pdf",
                other
            ))),
        }
    }
}

/// Rendered export, ready to be written
#[derive(Debug, Clone, PartialEq)]
pub struct ExportArtifact {
    /// Suggested file name, e.g. `study-tutor-chat-1740823200000.pdf`
    pub file_name: String,
    pub format: ExportFormat,
    pub bytes: Vec<u8>,
    /// Number of pages for PDF exports, `None` for text
    pub page_count: Option<usize>,
}

impl ExportArtifact {
    pub fn mime_type(&self) -> &'static str {
        self.format.mime_type()
    }
}

/// File name for an artifact exported at `exported_at`
///
/// # Examples
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use study_tutor::export::{artifact_file_name, ExportFormat};
///
/// let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
/// assert_eq!(
///     artifact_file_name(ExportFormat::Pdf, at),
///     "study-tutor-chat-1700000000123.pdf"
/// );
/// ```
pub fn artifact_file_name(format: ExportFormat, exported_at: DateTime<Utc>) -> String {
    format!(
        "{}-{}.{}",
        FILE_PREFIX,
        exported_at.timestamp_millis(),
        format.extension()
    )
}

/// Renders transcripts in either export format
pub struct Exporter {
    geometry: PageGeometry,
    max_pages: usize,
    metrics: Box<dyn TextMetrics>,
}

impl Exporter {
    /// Creates an exporter for A4 pages measured with Helvetica widths
    pub fn new(config: &ExportConfig) -> Self {
        Self {
            geometry: PageGeometry::A4,
            max_pages: config.max_pages,
            metrics: Box::new(Helvetica),
        }
    }

    /// Replaces the page geometry
    pub fn with_geometry(mut self, geometry: PageGeometry) -> Self {
        self.geometry = geometry;
        self
    }

    /// Replaces the text measurement used for wrapping
    pub fn with_metrics(mut self, metrics: Box<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Lays the exchanges out on pages without serializing them
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Export`] for unusable geometry or when the
    /// page limit is exceeded.
    pub fn paginate(
        &self,
        exchanges: &[Exchange],
        exported_at: DateTime<Utc>,
    ) -> Result<PagedDocument> {
        Paginator::new(self.geometry, self.metrics.as_ref(), self.max_pages)?
            .paginate(exchanges, exported_at)
    }

    /// Renders an artifact from a transcript snapshot
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Export`] when there is nothing to export or
    /// rendering fails.
    pub fn export(
        &self,
        exchanges: &[Exchange],
        format: ExportFormat,
        exported_at: DateTime<Utc>,
    ) -> Result<ExportArtifact> {
        if exchanges.is_empty() {
            return Err(TutorError::Export("transcript is empty, nothing to export".to_string()).into());
        }

        let (bytes, page_count) = match format {
            ExportFormat::Text => (text::render(exchanges, exported_at).into_bytes(), None),
            ExportFormat::Pdf => {
                let document = self.paginate(exchanges, exported_at).map_err(as_export_error)?;
                let pages = document.page_count();
                (pdf::render(&document).map_err(as_export_error)?, Some(pages))
            }
        };

        let artifact = ExportArtifact {
            file_name: artifact_file_name(format, exported_at),
            format,
            bytes,
            page_count,
        };
        tracing::info!(
            file = %artifact.file_name,
            exchanges = exchanges.len(),
            bytes = artifact.bytes.len(),
            "Rendered {} export",
            format
        );
        Ok(artifact)
    }
}

fn as_export_error(error: anyhow::Error) -> anyhow::Error {
    match error.downcast_ref::<TutorError>() {
        Some(TutorError::Export(_)) => error,
        _ => TutorError::Export(error.to_string()).into(),
    }
}

/// Writes an artifact into `dir` under its file name
///
/// The bytes go to a temporary file in the same directory that is then
/// renamed into place, so the final name never holds a partial file.
///
/// # Errors
///
/// Returns [`TutorError::Export`] if the directory or file cannot be written.
pub fn write_artifact(artifact: &ExportArtifact, dir: &Path) -> Result<PathBuf> {
    use std::io::Write;

    let fail = |what: &str, e: &dyn fmt::Display| {
        anyhow::Error::from(TutorError::Export(format!(
            "failed to {} in {}: {}",
            what,
            dir.display(),
            e
        )))
    };

    std::fs::create_dir_all(dir).map_err(|e| fail("create directory", &e))?;

    let mut file = tempfile::NamedTempFile::new_in(dir).map_err(|e| fail("create temp file", &e))?;
    file.write_all(&artifact.bytes)
        .and_then(|_| file.flush())
        .map_err(|e| fail("write export", &e))?;

    let target = dir.join(&artifact.file_name);
    file.persist(&target)
        .map_err(|e| fail("persist export", &e.error))?;

    tracing::info!("Export written to {}", target.display());
    Ok(target)
}
