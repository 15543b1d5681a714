//! Exchange controller
//!
//! Coordinates submitting a question to the Tutor Service and commits the
//! answered exchange to the transcript exactly once.
//!
//! Each submission walks `Idle -> Submitting -> {Committed | Failed}` and
//! both terminal states drop back to `Idle`. Only one submission may be in
//! flight; a second `submit` while `Submitting` is ignored. A "new chat"
//! requested mid-flight is queued and applied when the call settles, and the
//! settled result is discarded.
//!
//! The controller is a cheap clonable handle. Its state sits behind a mutex
//! that is never held across the service call, which is the only `.await`.
//! Dropping a `submit` future mid-call returns the controller to `Idle`.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::error::{user_message, Result};
use crate::service::TutorService;
use crate::transcript::{validate_input, Exchange, Origin, Transcript};

/// Whether a submission is currently in flight
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// No outstanding submission
    Idle,
    /// Waiting for the Tutor Service
    Submitting,
}

/// Terminal state reached by one call to [`ExchangeController::submit`]
#[derive(Debug, Clone, PartialEq)]
pub enum SubmitOutcome {
    /// The answered exchange was appended to the transcript
    Committed(Exchange),
    /// The service call failed; the draft is kept for a retry
    Failed {
        /// User-visible failure reason
        message: String,
    },
    /// Another submission was in flight, or the controller is closed
    Ignored,
    /// The call settled after a reset or teardown and its result was dropped
    Discarded,
}

/// What [`ExchangeController::start_new`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetOutcome {
    /// The conversation was cleared immediately
    Applied,
    /// A submission is in flight; the reset runs once it settles
    Deferred,
}

/// Pending topic/question input
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Draft {
    pub topic: String,
    pub question: String,
}

impl Draft {
    /// Returns true if both fields hold non-blank text
    pub fn is_complete(&self) -> bool {
        !self.topic.trim().is_empty() && !self.question.trim().is_empty()
    }

    fn clear(&mut self) {
        self.topic.clear();
        self.question.clear();
    }
}

#[derive(Debug)]
struct ControllerState {
    phase: Phase,
    transcript: Transcript,
    draft: Draft,
    error: Option<String>,
    pending: Option<Exchange>,
    reset_queued: bool,
    closed: bool,
}

impl ControllerState {
    fn reset(&mut self) {
        self.transcript.clear();
        self.draft.clear();
        self.error = None;
        self.reset_queued = false;
    }
}

/// Owns one conversation's transcript and drives submissions against a
/// [`TutorService`]
///
/// # Examples
///
/// ```no_run
/// use std::sync::Arc;
/// use study_tutor::config::ServiceConfig;
/// use study_tutor::controller::{ExchangeController, SubmitOutcome};
/// use study_tutor::service::HttpTutorService;
///
/// # async fn example() -> study_tutor::error::Result<()> {
/// let service = HttpTutorService::new(ServiceConfig::default())?;
/// let controller = ExchangeController::new(Arc::new(service));
/// controller.load_history().await?;
///
/// match controller.submit("Math", "What is the chain rule?").await? {
///     SubmitOutcome::Committed(exchange) => println!("{}", exchange.answer),
///     SubmitOutcome::Failed { message } => eprintln!("{}", message),
///     _ => {}
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct ExchangeController {
    service: Arc<dyn TutorService>,
    state: Arc<Mutex<ControllerState>>,
}

impl ExchangeController {
    /// Creates a controller with an empty transcript
    pub fn new(service: Arc<dyn TutorService>) -> Self {
        Self {
            service,
            state: Arc::new(Mutex::new(ControllerState {
                phase: Phase::Idle,
                transcript: Transcript::new(),
                draft: Draft::default(),
                error: None,
                pending: None,
                reset_queued: false,
                closed: false,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Hydrates the transcript from the service's stored history
    ///
    /// The service sends most-recent-first, so the list is reversed before it
    /// reaches the transcript. Returns the number of exchanges loaded.
    ///
    /// # Errors
    ///
    /// Returns the service error, or [`crate::error::TutorError::DuplicateId`] if the
    /// history repeats an id. The transcript is unchanged on error.
    pub async fn load_history(&self) -> Result<usize> {
        let history = self.service.fetch_history().await?;
        let mut history: Vec<Exchange> = history
            .into_iter()
            .map(|exchange| exchange.with_origin(Origin::History))
            .collect();
        history.reverse();

        let mut state = self.lock();
        if state.closed {
            tracing::debug!("Controller closed before history arrived, discarding");
            return Ok(0);
        }
        let count = history.len();
        state.transcript.load(history)?;
        tracing::info!("Loaded {} exchanges from tutor history", count);
        Ok(count)
    }

    /// Submits a question and commits the answer
    ///
    /// The raw input becomes the draft before validation so it survives
    /// both validation and service failures.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::TutorError::Validation`] for a blank topic or question
    /// (nothing is sent), and [`crate::error::TutorError::DuplicateId`] if the service
    /// returns an id already in the transcript. Service failures are not
    /// errors; they come back as [`SubmitOutcome::Failed`].
    pub async fn submit(&self, topic: &str, question: &str) -> Result<SubmitOutcome> {
        let (topic, question) = {
            let mut state = self.lock();
            if state.closed {
                tracing::debug!("Submit on closed controller ignored");
                return Ok(SubmitOutcome::Ignored);
            }
            if state.phase == Phase::Submitting {
                tracing::debug!("Submission already in flight, ignoring submit");
                return Ok(SubmitOutcome::Ignored);
            }

            state.draft = Draft {
                topic: topic.to_string(),
                question: question.to_string(),
            };
            let (topic, question) = validate_input(topic, question)?;

            state.phase = Phase::Submitting;
            state.error = None;
            state.pending = Exchange::pending(&topic, &question).ok();
            (topic, question)
        };

        let in_flight = InFlight {
            controller: self,
            armed: true,
        };
        tracing::debug!(topic = %topic, "Submitting question");
        let result = self.service.ask(&topic, &question).await;
        in_flight.settle();

        let mut state = self.lock();
        state.phase = Phase::Idle;
        state.pending = None;

        if state.closed {
            tracing::debug!("Controller closed while submitting, discarding result");
            return Ok(SubmitOutcome::Discarded);
        }
        if state.reset_queued {
            tracing::info!("Applying queued reset, discarding settled submission");
            state.reset();
            return Ok(SubmitOutcome::Discarded);
        }

        match result {
            Ok(exchange) => {
                let exchange = exchange.with_origin(Origin::Fresh);
                if let Err(e) = state.transcript.append(exchange.clone()) {
                    tracing::error!("Tutor service broke the transcript contract: {}", e);
                    state.error = Some(e.to_string());
                    return Err(e);
                }
                state.draft.clear();
                tracing::info!(id = %exchange.id, "Committed exchange");
                Ok(SubmitOutcome::Committed(exchange))
            }
            Err(e) => {
                let message = user_message(&e);
                tracing::warn!("Submission failed: {}", message);
                state.error = Some(message.clone());
                Ok(SubmitOutcome::Failed { message })
            }
        }
    }

    /// Starts a new conversation
    ///
    /// Clears the transcript, the draft and any error. While a submission is
    /// in flight the reset is queued instead and applied when it settles.
    pub fn start_new(&self) -> ResetOutcome {
        let mut state = self.lock();
        if state.phase == Phase::Submitting {
            tracing::debug!("Reset requested mid-submission, queuing");
            state.reset_queued = true;
            return ResetOutcome::Deferred;
        }
        state.reset();
        tracing::info!("Started a new conversation");
        ResetOutcome::Applied
    }

    /// Tears the session down
    ///
    /// The transcript is cleared and any result settling afterwards is
    /// discarded. Further submissions are ignored.
    pub fn close(&self) {
        let mut state = self.lock();
        state.closed = true;
        state.transcript.clear();
        state.pending = None;
        tracing::debug!("Exchange controller closed");
    }

    /// Returns true once [`ExchangeController::close`] has run
    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.lock().phase
    }

    /// Current draft input
    pub fn draft(&self) -> Draft {
        self.lock().draft.clone()
    }

    /// Replaces the draft input, e.g. from a suggestion
    pub fn set_draft(&self, topic: impl Into<String>, question: impl Into<String>) {
        let mut state = self.lock();
        state.draft = Draft {
            topic: topic.into(),
            question: question.into(),
        };
    }

    /// Returns true when the draft is complete and nothing is in flight
    pub fn can_submit(&self) -> bool {
        let state = self.lock();
        !state.closed && state.phase == Phase::Idle && state.draft.is_complete()
    }

    /// Last user-visible error, cleared by the next submission or reset
    pub fn error(&self) -> Option<String> {
        self.lock().error.clone()
    }

    /// Optimistic preview of the in-flight exchange
    pub fn pending(&self) -> Option<Exchange> {
        self.lock().pending.clone()
    }

    /// Owned copy of the transcript, oldest first
    pub fn snapshot(&self) -> Vec<Exchange> {
        self.lock().transcript.all().to_vec()
    }

    /// Runs `f` against the transcript without copying it
    pub fn with_transcript<R>(&self, f: impl FnOnce(&Transcript) -> R) -> R {
        f(&self.lock().transcript)
    }

    /// Number of committed exchanges
    pub fn len(&self) -> usize {
        self.lock().transcript.len()
    }

    /// Returns true if the transcript is empty
    pub fn is_empty(&self) -> bool {
        self.lock().transcript.is_empty()
    }
}

/// Puts the controller back to `Idle` if a `submit` future is dropped while
/// the service call is outstanding
struct InFlight<'a> {
    controller: &'a ExchangeController,
    armed: bool,
}

impl InFlight<'_> {
    fn settle(mut self) {
        self.armed = false;
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let mut state = self.controller.lock();
        state.phase = Phase::Idle;
        state.pending = None;
        if state.reset_queued {
            state.reset();
        }
        tracing::debug!("Submission dropped before the tutor answered");
    }
}
