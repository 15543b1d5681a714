use std::collections::HashSet;

use super::exchange::{Exchange, ExchangeId};
use crate::error::{Result, TutorError};

/// Ordered, de-duplicated sequence of exchanges for one conversation
///
/// Exchanges are kept oldest first. The store is append-only during a
/// session; the only other mutation is a full [`Transcript::clear`].
///
/// # Examples
///
/// ```
/// use chrono::Utc;
/// use study_tutor::transcript::{Exchange, Origin, Transcript};
///
/// let mut transcript = Transcript::new();
/// let exchange = Exchange::new("1", "Math", "What is 2+2?", "4", Utc::now(), Origin::Fresh).unwrap();
/// transcript.append(exchange.clone()).unwrap();
/// assert_eq!(transcript.len(), 1);
///
/// // The same id cannot be appended twice
/// assert!(transcript.append(exchange).is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Transcript {
    exchanges: Vec<Exchange>,
    ids: HashSet<ExchangeId>,
}

impl Transcript {
    /// Creates an empty transcript
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the contents with `initial`
    ///
    /// Chronological input is kept as is, reverse-chronological input is
    /// reversed, and anything else is stably sorted by `created_at`.
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::DuplicateId`] if `initial` repeats an id. The
    /// store is left untouched in that case.
    pub fn load(&mut self, initial: Vec<Exchange>) -> Result<()> {
        let mut ids = HashSet::with_capacity(initial.len());
        for exchange in &initial {
            if !ids.insert(exchange.id.clone()) {
                tracing::error!(id = %exchange.id, "Duplicate id in transcript load");
                return Err(TutorError::DuplicateId(exchange.id.to_string()).into());
            }
        }

        let mut exchanges = initial;
        if !is_chronological(&exchanges) {
            exchanges.reverse();
            if !is_chronological(&exchanges) {
                tracing::debug!("History not in either chronological order, sorting");
                exchanges.sort_by_key(|exchange| exchange.created_at);
            }
        }

        tracing::debug!("Loaded {} exchanges into transcript", exchanges.len());
        self.exchanges = exchanges;
        self.ids = ids;
        Ok(())
    }

    /// Adds one exchange at the end
    ///
    /// # Errors
    ///
    /// Returns [`TutorError::DuplicateId`] if an exchange with the same id is
    /// already present.
    pub fn append(&mut self, exchange: Exchange) -> Result<()> {
        if self.ids.contains(&exchange.id) {
            tracing::error!(id = %exchange.id, "Refusing to append duplicate exchange");
            return Err(TutorError::DuplicateId(exchange.id.to_string()).into());
        }

        if let Some(last) = self.exchanges.last() {
            if exchange.created_at < last.created_at {
                tracing::warn!(
                    id = %exchange.id,
                    "Appended exchange is older than the transcript tail"
                );
            }
        }

        self.ids.insert(exchange.id.clone());
        self.exchanges.push(exchange);
        Ok(())
    }

    /// Empties the transcript
    pub fn clear(&mut self) {
        self.exchanges.clear();
        self.ids.clear();
    }

    /// Read-only view of every exchange, oldest first
    pub fn all(&self) -> &[Exchange] {
        &self.exchanges
    }

    /// Number of exchanges
    pub fn len(&self) -> usize {
        self.exchanges.len()
    }

    /// Returns true if the transcript holds no exchanges
    pub fn is_empty(&self) -> bool {
        self.exchanges.is_empty()
    }

    /// Looks up an exchange by id
    pub fn get(&self, id: &ExchangeId) -> Option<&Exchange> {
        if !self.ids.contains(id) {
            return None;
        }
        self.exchanges.iter().find(|exchange| &exchange.id == id)
    }

    /// Most recent exchange
    pub fn last(&self) -> Option<&Exchange> {
        self.exchanges.last()
    }
}

fn is_chronological(exchanges: &[Exchange]) -> bool {
    exchanges
        .windows(2)
        .all(|pair| pair[0].created_at <= pair[1].created_at)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Origin;
    use chrono::{DateTime, TimeZone, Utc};

    fn at(minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 1, 10, minute, 0).unwrap()
    }

    fn exchange(id: &str, minute: u32) -> Exchange {
        Exchange::new(id, "Math", "Question", "Answer", at(minute), Origin::History).unwrap()
    }

    fn ids(transcript: &Transcript) -> Vec<&str> {
        transcript.all().iter().map(|e| e.id.as_str()).collect()
    }

    #[test]
    fn test_load_keeps_chronological_input() {
        let mut transcript = Transcript::new();
        transcript
            .load(vec![exchange("a", 1), exchange("b", 2), exchange("c", 3)])
            .unwrap();
        assert_eq!(ids(&transcript), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_reverses_most_recent_first_input() {
        let mut transcript = Transcript::new();
        transcript
            .load(vec![exchange("c", 3), exchange("b", 2), exchange("a", 1)])
            .unwrap();
        assert_eq!(ids(&transcript), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_sorts_shuffled_input() {
        let mut transcript = Transcript::new();
        transcript
            .load(vec![exchange("b", 2), exchange("c", 3), exchange("a", 1)])
            .unwrap();
        assert_eq!(ids(&transcript), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_load_replaces_previous_contents() {
        let mut transcript = Transcript::new();
        transcript.append(exchange("old", 0)).unwrap();
        transcript.load(vec![exchange("new", 1)]).unwrap();
        assert_eq!(ids(&transcript), vec!["new"]);
        assert!(transcript.get(&ExchangeId::new("old")).is_none());
    }

    #[test]
    fn test_load_rejects_duplicates_without_mutating() {
        let mut transcript = Transcript::new();
        transcript.append(exchange("keep", 0)).unwrap();
        let err = transcript
            .load(vec![exchange("x", 1), exchange("x", 2)])
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TutorError>(),
            Some(TutorError::DuplicateId(id)) if id == "x"
        ));
        assert_eq!(ids(&transcript), vec!["keep"]);
    }

    #[test]
    fn test_append_rejects_duplicate_id() {
        let mut transcript = Transcript::new();
        transcript.append(exchange("1", 1)).unwrap();
        let err = transcript.append(exchange("1", 2)).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<TutorError>(),
            Some(TutorError::DuplicateId(_))
        ));
        assert_eq!(transcript.len(), 1);
        assert_eq!(transcript.all()[0].created_at, at(1));
    }

    #[test]
    fn test_append_grows_by_one_and_keeps_existing() {
        let mut transcript = Transcript::new();
        transcript.append(exchange("1", 1)).unwrap();
        let before = transcript.all()[0].clone();
        transcript.append(exchange("2", 2)).unwrap();
        assert_eq!(transcript.len(), 2);
        assert_eq!(transcript.all()[0], before);
        assert_eq!(transcript.last().map(|e| e.id.as_str()), Some("2"));
    }

    #[test]
    fn test_clear_is_idempotent() {
        let mut transcript = Transcript::new();
        transcript.append(exchange("1", 1)).unwrap();
        transcript.clear();
        transcript.clear();
        assert!(transcript.is_empty());
        // Ids are released by clear
        transcript.append(exchange("1", 1)).unwrap();
        assert_eq!(transcript.len(), 1);
    }

    #[test]
    fn test_get_finds_by_id() {
        let mut transcript = Transcript::new();
        transcript
            .load(vec![exchange("a", 1), exchange("b", 2)])
            .unwrap();
        let found = transcript.get(&ExchangeId::new("b")).unwrap();
        assert_eq!(found.created_at, at(2));
    }
}
