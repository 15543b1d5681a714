//! HTTP client for the study-platform Tutor Service
//!
//! Talks to `GET {base_url}/tutor/history` and `POST {base_url}/tutor/ask`
//! and converts every failure into a service error carrying a readable
//! message.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::Serialize;
use std::time::Duration;

use super::wire::{detail_message, WireExchange};
use super::TutorService;
use crate::config::ServiceConfig;
use crate::error::{Result, TutorError};
use crate::transcript::{Exchange, Origin};

/// Shown when an error response carries no usable `detail`
pub const GENERIC_FAILURE: &str = "Failed to get response. Please try again.";

/// Request body for `/tutor/ask`
#[derive(Debug, Serialize)]
struct AskRequest<'a> {
    topic: &'a str,
    question: &'a str,
}

/// Tutor Service reached over HTTP
///
/// # Examples
///
/// ```
/// use study_tutor::config::ServiceConfig;
/// use study_tutor::service::HttpTutorService;
///
/// let service = HttpTutorService::new(ServiceConfig::default()).unwrap();
/// assert_eq!(service.endpoint("tutor/ask"), "http://localhost:8000/api/tutor/ask");
/// ```
pub struct HttpTutorService {
    client: Client,
    config: ServiceConfig,
}

impl HttpTutorService {
    /// Create a new client
    ///
    /// The request timeout is the transport-level timeout from config; the
    /// controller enforces none of its own.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client initialization fails
    pub fn new(config: ServiceConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("study-tutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TutorError::service(format!("Failed to create HTTP client: {}", e)))?;

        tracing::info!("Initialized tutor service client: base_url={}", config.base_url);

        Ok(Self { client, config })
    }

    /// Full URL for a path below the configured base
    pub fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match self.config.token.as_deref() {
            Some(token) if !token.is_empty() => request.bearer_auth(token),
            _ => request,
        }
    }

    async fn send(&self, request: RequestBuilder, what: &str) -> Result<Response> {
        let response = self.authorize(request).send().await.map_err(|e| {
            tracing::error!("Tutor {} request failed: {}", what, e);
            TutorError::service(format!("Tutor service unreachable: {}", e))
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Tutor service returned error {} for {}: {}", status, what, body);
            let message = detail_message(&body)
                .unwrap_or_else(|| GENERIC_FAILURE.to_string());
            return Err(TutorError::service(message).into());
        }

        Ok(response)
    }
}

#[async_trait]
impl TutorService for HttpTutorService {
    async fn fetch_history(&self) -> Result<Vec<Exchange>> {
        let url = self.endpoint("tutor/history");
        tracing::debug!("Fetching tutor history from {}", url);

        let response = self.send(self.client.get(&url), "history").await?;
        let records: Vec<WireExchange> = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse tutor history: {}", e);
            TutorError::service(format!("Failed to parse tutor history: {}", e))
        })?;

        let exchanges = records
            .into_iter()
            .map(|record| record.into_exchange(Origin::History))
            .collect::<Result<Vec<_>>>()?;

        tracing::debug!("Fetched {} history exchanges", exchanges.len());
        Ok(exchanges)
    }

    async fn ask(&self, topic: &str, question: &str) -> Result<Exchange> {
        let url = self.endpoint("tutor/ask");
        tracing::debug!(topic = %topic, "Asking tutor ({} chars)", question.len());

        let request = self
            .client
            .post(&url)
            .json(&AskRequest { topic, question });
        let response = self.send(request, "ask").await?;

        let record: WireExchange = response.json().await.map_err(|e| {
            tracing::error!("Failed to parse tutor answer: {}", e);
            TutorError::service(format!("Failed to parse tutor answer: {}", e))
        })?;

        let exchange = record.into_exchange(Origin::Fresh)?;
        tracing::debug!(id = %exchange.id, "Tutor answered ({} chars)", exchange.answer.len());
        Ok(exchange)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service(base_url: &str) -> HttpTutorService {
        HttpTutorService::new(ServiceConfig {
            base_url: base_url.to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        assert_eq!(
            service("http://example.test/api/").endpoint("/tutor/history"),
            "http://example.test/api/tutor/history"
        );
        assert_eq!(
            service("http://example.test/api").endpoint("tutor/ask"),
            "http://example.test/api/tutor/ask"
        );
    }

    #[tokio::test]
    async fn test_unreachable_service_is_service_error() {
        // Port 9 (discard) on localhost is not expected to serve HTTP
        let service = service("http://127.0.0.1:9/api");
        let err = service.ask("Math", "What is 2+2?").await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TutorError>(),
            Some(TutorError::Service { .. })
        ));
    }
}
