//! study-tutor - Terminal client for a topic-scoped study tutor
//!
//! This library keeps the conversation transcript for one tutoring session,
//! drives question submission against the Tutor Service, and exports the
//! transcript as flat text or a paginated PDF.
//!
//! # Architecture
//!
//! The library is organized into the following modules:
//!
//! - `transcript`: Exchange records and the append-only transcript store
//! - `controller`: Submission state machine over a transcript
//! - `service`: Tutor Service trait and its HTTP implementation
//! - `export`: Flat-text rendering, pagination, and PDF serialization
//! - `config`: Configuration management and validation
//! - `error`: Error types and result aliases
//! - `cli`: Command-line interface definition
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use study_tutor::{Config, ExchangeController};
//! use study_tutor::service::create_service;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     config.validate()?;
//!
//!     let controller = ExchangeController::new(Arc::from(create_service(&config.service)?));
//!     controller.load_history().await?;
//!     controller.submit("Math", "What is the chain rule in calculus?").await?;
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod commands;
pub mod config;
pub mod controller;
pub mod error;
pub mod export;
pub mod service;
pub mod transcript;

// Re-export commonly used types
pub use config::Config;
pub use controller::{ExchangeController, Phase, SubmitOutcome};
pub use error::{Result, TutorError};
pub use export::{ExportArtifact, ExportFormat, Exporter};
pub use service::TutorService;
pub use transcript::{Exchange, ExchangeId, Transcript};

#[cfg(test)]
pub mod test_utils;
