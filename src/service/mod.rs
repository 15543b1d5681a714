//! Tutor Service abstraction
//!
//! This module defines the [`TutorService`] trait the exchange controller
//! talks to, the wire record validation step, and the HTTP implementation.

pub mod http;
pub mod wire;

pub use http::HttpTutorService;
pub use wire::WireExchange;

use async_trait::async_trait;

use crate::config::ServiceConfig;
use crate::error::Result;
use crate::transcript::Exchange;

/// Remote collaborator that answers questions and stores history
///
/// Implementations report every failure (transport, non-2xx status,
/// malformed payload) as [`crate::error::TutorError::Service`].
///
/// # Examples
///
/// ```no_run
/// use async_trait::async_trait;
/// use chrono::Utc;
/// use study_tutor::error::Result;
/// use study_tutor::service::TutorService;
/// use study_tutor::transcript::{Exchange, Origin};
///
/// struct EchoTutor;
///
/// #[async_trait]
/// impl TutorService for EchoTutor {
///     async fn fetch_history(&self) -> Result<Vec<Exchange>> {
///         Ok(Vec::new())
///     }
///
///     async fn ask(&self, topic: &str, question: &str) -> Result<Exchange> {
///         Exchange::new("1", topic, question, question, Utc::now(), Origin::Fresh)
///     }
/// }
/// ```
#[async_trait]
pub trait TutorService: Send + Sync {
    /// Fetch the stored conversation history
    ///
    /// Returned most-recent-first, as the service sends it; callers reorder.
    async fn fetch_history(&self) -> Result<Vec<Exchange>>;

    /// Ask one question about a topic and return the answered exchange
    async fn ask(&self, topic: &str, question: &str) -> Result<Exchange>;
}

/// Create the configured Tutor Service client
///
/// # Errors
///
/// Returns error if the HTTP client cannot be built
pub fn create_service(config: &ServiceConfig) -> Result<Box<dyn TutorService>> {
    Ok(Box::new(HttpTutorService::new(config.clone())?))
}
