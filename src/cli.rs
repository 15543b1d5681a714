//! Command-line interface definition for the study tutor client
//!
//! This module defines the CLI structure using clap's derive API,
//! providing commands for interactive chat, one-shot questions, history
//! listing, and transcript export.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::export::ExportFormat;

/// study-tutor - Terminal client for the study tutor
///
/// Ask topic-scoped questions, browse past answers, and export the
/// conversation as text or a paginated PDF.
#[derive(Parser, Debug, Clone)]
#[command(name = "study-tutor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/config.yaml")]
    pub config: Option<String>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Override the Tutor Service base URL
    #[arg(long)]
    pub base_url: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Start an interactive tutoring session
    Chat {
        /// Initial topic for questions
        #[arg(short, long)]
        topic: Option<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// Topic label for the question
        #[arg(short, long)]
        topic: String,

        /// Question text
        #[arg(short, long)]
        question: String,
    },

    /// List stored exchanges
    History,

    /// Export stored exchanges to a file
    Export {
        /// Output format (text, pdf)
        #[arg(short, long, default_value = "text")]
        format: ExportFormat,

        /// Output directory (defaults to export.output_dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
