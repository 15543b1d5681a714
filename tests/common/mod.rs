use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

use study_tutor::error::{Result, TutorError};
use study_tutor::service::TutorService;
use study_tutor::transcript::{Exchange, Origin};

/// Timestamp `minutes` after 2025-03-01 09:00 UTC
#[allow(dead_code)]
pub fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
}

#[allow(dead_code)]
pub fn exchange(id: &str, topic: &str, question: &str, answer: &str, minutes: i64) -> Exchange {
    Exchange::new(id, topic, question, answer, at(minutes), Origin::History)
        .expect("valid test exchange")
}

/// Tutor fake answering from a queue of canned results
#[allow(dead_code)]
pub struct QueuedTutor {
    history: Vec<Exchange>,
    answers: Mutex<Vec<std::result::Result<Exchange, String>>>,
    pub asked: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl QueuedTutor {
    pub fn new(history: Vec<Exchange>) -> Self {
        Self {
            history,
            answers: Mutex::new(Vec::new()),
            asked: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Queues the next answer; answers are handed out in order
    pub fn then_answer(self, exchange: Exchange) -> Self {
        self.answers.lock().unwrap().push(Ok(exchange));
        self
    }

    /// Queues a failure carrying `message`
    pub fn then_fail(self, message: &str) -> Self {
        self.answers.lock().unwrap().push(Err(message.to_string()));
        self
    }
}

#[async_trait]
impl TutorService for QueuedTutor {
    async fn fetch_history(&self) -> Result<Vec<Exchange>> {
        Ok(self.history.clone())
    }

    async fn ask(&self, _topic: &str, _question: &str) -> Result<Exchange> {
        self.asked.fetch_add(1, Ordering::SeqCst);
        let mut answers = self.answers.lock().unwrap();
        if answers.is_empty() {
            return Err(TutorError::service("no answer queued").into());
        }
        answers
            .remove(0)
            .map_err(|message| TutorError::service(message).into())
    }
}

/// Tutor fake whose answer is held until the test releases it
#[allow(dead_code)]
pub struct HeldTutor {
    pub requested: Arc<Notify>,
    pub release: Arc<Notify>,
    pub asked: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl HeldTutor {
    pub fn new() -> Self {
        Self {
            requested: Arc::new(Notify::new()),
            release: Arc::new(Notify::new()),
            asked: Arc::new(AtomicUsize::new(0)),
        }
    }
}

#[async_trait]
impl TutorService for HeldTutor {
    async fn fetch_history(&self) -> Result<Vec<Exchange>> {
        Ok(Vec::new())
    }

    async fn ask(&self, topic: &str, question: &str) -> Result<Exchange> {
        let n = self.asked.fetch_add(1, Ordering::SeqCst) + 1;
        self.requested.notify_one();
        self.release.notified().await;
        Exchange::new(
            format!("held-{}", n),
            topic,
            question,
            "Held answer",
            at(n as i64),
            Origin::Fresh,
        )
    }
}
