//! Conversation transcript
//!
//! This module holds the exchange data model and the ordered,
//! de-duplicated transcript store the exchange controller writes to.

pub mod exchange;
pub mod store;

pub use exchange::{validate_input, Exchange, ExchangeId, Origin};
pub use store::Transcript;
