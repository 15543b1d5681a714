use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TutorError};

/// Prefix used for locally generated ids of in-flight exchanges
const PENDING_PREFIX: &str = "pending-";

/// Opaque exchange identifier
///
/// Server-assigned ids are kept in their string form. Exchanges that are
/// still waiting for the Tutor Service carry a locally generated
/// `pending-<uuid>` id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExchangeId(String);

impl ExchangeId {
    /// Wrap a server-assigned identifier
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh identifier for a pending exchange
    ///
    /// # Examples
    ///
    /// ```
    /// use study_tutor::transcript::ExchangeId;
    ///
    /// let a = ExchangeId::pending();
    /// let b = ExchangeId::pending();
    /// assert!(a.is_pending());
    /// assert_ne!(a, b);
    /// ```
    pub fn pending() -> Self {
        Self(format!("{}{}", PENDING_PREFIX, uuid::Uuid::new_v4()))
    }

    /// Returns true if this id was generated locally for a pending exchange
    pub fn is_pending(&self) -> bool {
        self.0.starts_with(PENDING_PREFIX)
    }

    /// Borrow the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ExchangeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ExchangeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for ExchangeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Where an exchange came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Origin {
    /// Loaded from a prior session
    History,
    /// Created in the current session
    Fresh,
}

/// One question/answer unit of a conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exchange {
    /// Unique identifier
    pub id: ExchangeId,
    /// Short topic label
    pub topic: String,
    /// The question as asked
    pub question: String,
    /// Tutor answer, markdown-capable; empty only while pending
    pub answer: String,
    /// When the exchange was created
    pub created_at: DateTime<Utc>,
    /// Whether the exchange was loaded from history or created now
    pub origin: Origin,
}

impl Exchange {
    /// Build a validated exchange
    ///
    /// Topic and question are trimmed and must not be empty.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::Validation`] when the topic or question is blank.
    ///
    /// # Examples
    ///
    /// ```
    /// use chrono::Utc;
    /// use study_tutor::transcript::{Exchange, Origin};
    ///
    /// let exchange = Exchange::new("7", " Math ", "What is 2+2?", "4", Utc::now(), Origin::Fresh).unwrap();
    /// assert_eq!(exchange.topic, "Math");
    ///
    /// assert!(Exchange::new("8", "", "anything", "", Utc::now(), Origin::Fresh).is_err());
    /// ```
    pub fn new(
        id: impl Into<ExchangeId>,
        topic: &str,
        question: &str,
        answer: impl Into<String>,
        created_at: DateTime<Utc>,
        origin: Origin,
    ) -> Result<Self> {
        let (topic, question) = validate_input(topic, question)?;
        Ok(Self {
            id: id.into(),
            topic,
            question,
            answer: answer.into(),
            created_at,
            origin,
        })
    }

    /// Build the optimistic preview shown while a submission is in flight
    pub fn pending(topic: &str, question: &str) -> Result<Self> {
        Self::new(
            ExchangeId::pending(),
            topic,
            question,
            String::new(),
            Utc::now(),
            Origin::Fresh,
        )
    }

    /// Returns the same exchange with a different origin tag
    pub fn with_origin(mut self, origin: Origin) -> Self {
        self.origin = origin;
        self
    }

    /// Returns true while the exchange is an unanswered local preview
    pub fn is_pending(&self) -> bool {
        self.id.is_pending()
    }
}

/// Trim and check a topic/question pair
///
/// # Errors
///
/// Returns [`TutorError::Validation`] naming the first blank field.
pub fn validate_input(topic: &str, question: &str) -> Result<(String, String)> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(TutorError::Validation("topic must not be empty".to_string()).into());
    }
    let question = question.trim();
    if question.is_empty() {
        return Err(TutorError::Validation("question must not be empty".to_string()).into());
    }
    Ok((topic.to_string(), question.to_string()))
}
