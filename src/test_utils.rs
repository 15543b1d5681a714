//! Test utilities
//!
//! Scripted and gated Tutor Service fakes plus exchange builders shared by
//! the unit tests.

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::Notify;

use crate::error::{Result, TutorError};
use crate::service::TutorService;
use crate::transcript::{Exchange, Origin};

/// Fixed timestamp `minute` minutes after 2025-03-01 10:00 UTC
pub fn minute(minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 10, 0, 0).unwrap() + chrono::Duration::minutes(minute.into())
}

/// History exchange with a fixed timestamp
pub fn exchange_at(id: &str, at: u32) -> Exchange {
    Exchange::new(
        id,
        "Math",
        &format!("Question {}", id),
        format!("Answer {}", id),
        minute(at),
        Origin::History,
    )
    .expect("valid test exchange")
}

enum Script {
    Answer,
    Fail(String),
    FixedId(String),
}

/// Tutor fake that answers, fails, or repeats an id on every call
pub struct ScriptedTutor {
    script: Script,
    history: Vec<Exchange>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedTutor {
    /// Answers every question with a fresh id
    pub fn answering() -> Self {
        Self::with_script(Script::Answer)
    }

    /// Fails every question with `message`
    pub fn failing(message: &str) -> Self {
        Self::with_script(Script::Fail(message.to_string()))
    }

    /// Answers every question with the same id
    pub fn with_fixed_id(id: &str) -> Self {
        Self::with_script(Script::FixedId(id.to_string()))
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            history: Vec::new(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// History returned by `fetch_history`
    pub fn with_history(mut self, history: Vec<Exchange>) -> Self {
        self.history = history;
        self
    }

    /// Counter of `ask` calls
    pub fn calls(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl TutorService for ScriptedTutor {
    async fn fetch_history(&self) -> Result<Vec<Exchange>> {
        Ok(self.history.clone())
    }

    async fn ask(&self, topic: &str, question: &str) -> Result<Exchange> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        let id = match &self.script {
            Script::Answer => format!("srv-{}", n),
            Script::FixedId(id) => id.clone(),
            Script::Fail(message) => return Err(TutorError::service(message.clone()).into()),
        };
        Exchange::new(
            id,
            topic,
            question,
            format!("Answer to {}", question),
            minute(n as u32),
            Origin::Fresh,
        )
    }
}

/// Tutor fake whose `ask` blocks until the paired [`Gate`] is released
pub struct GatedTutor {
    requested: Arc<Notify>,
    release: Arc<Notify>,
    calls: AtomicUsize,
}

/// Test-side handle of a [`GatedTutor`]
pub struct Gate {
    requested: Arc<Notify>,
    release: Arc<Notify>,
}

impl GatedTutor {
    pub fn new() -> (Self, Gate) {
        let requested = Arc::new(Notify::new());
        let release = Arc::new(Notify::new());
        let gate = Gate {
            requested: Arc::clone(&requested),
            release: Arc::clone(&release),
        };
        (
            Self {
                requested,
                release,
                calls: AtomicUsize::new(0),
            },
            gate,
        )
    }
}

impl Gate {
    /// Waits until the tutor has received a question
    pub async fn wait_for_request(&self) {
        self.requested.notified().await;
    }

    /// Lets the blocked question complete
    pub fn release(&self) {
        self.release.notify_one();
    }
}

#[async_trait]
impl TutorService for GatedTutor {
    async fn fetch_history(&self) -> Result<Vec<Exchange>> {
        Ok(Vec::new())
    }

    async fn ask(&self, topic: &str, question: &str) -> Result<Exchange> {
        let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.requested.notify_one();
        self.release.notified().await;
        Exchange::new(
            format!("gated-{}", n),
            topic,
            question,
            "Gated answer",
            minute(n as u32),
            Origin::Fresh,
        )
    }
}
