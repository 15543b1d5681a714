//! Wire format of Tutor Service conversation records
//!
//! Records are deserialized into [`WireExchange`], where every field is
//! optional, and then converted into a validated [`Exchange`]. Missing or
//! malformed fields fail fast instead of leaking into the transcript.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;

use crate::error::{Result, TutorError};
use crate::transcript::{Exchange, ExchangeId, Origin};

/// Conversation record as sent by the Tutor Service
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WireExchange {
    #[serde(default)]
    pub id: Option<serde_json::Value>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub question: Option<String>,
    #[serde(default)]
    pub answer: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// Error body returned by the service on non-2xx responses
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

impl WireExchange {
    /// Validate the record and build an exchange with the given origin
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Service`] naming the missing or malformed field.
    pub fn into_exchange(self, origin: Origin) -> Result<Exchange> {
        let id = match self.id {
            Some(serde_json::Value::Number(n)) => ExchangeId::new(n.to_string()),
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => ExchangeId::new(s),
            Some(other) => return Err(malformed(format!("invalid `id`: {}", other))),
            None => return Err(malformed("missing field `id`")),
        };
        let topic = self.topic.ok_or_else(|| malformed("missing field `topic`"))?;
        let question = self
            .question
            .ok_or_else(|| malformed("missing field `question`"))?;
        let answer = self.answer.ok_or_else(|| malformed("missing field `answer`"))?;
        let created_at = self
            .created_at
            .ok_or_else(|| malformed("missing field `created_at`"))?;
        let created_at = parse_timestamp(&created_at)
            .ok_or_else(|| malformed(format!("invalid `created_at`: {}", created_at)))?;

        Exchange::new(id, &topic, &question, answer, created_at, origin)
            .map_err(|e| malformed(e.to_string()))
    }
}

/// Parse an RFC 3339 timestamp, or a naive ISO-8601 one taken as UTC
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%.f"))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Pull a readable message out of an error body's `detail` field
///
/// `detail` may be a plain string or a validation error list.
pub(crate) fn detail_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    match parsed.detail? {
        serde_json::Value::String(s) if !s.is_empty() => Some(s),
        serde_json::Value::Array(items) => {
            let messages: Vec<String> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .map(str::to_string)
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        _ => None,
    }
}

fn malformed(reason: impl Into<String>) -> anyhow::Error {
    TutorError::service(format!("malformed exchange: {}", reason.into())).into()
}
