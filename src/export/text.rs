//! Flat-text transcript rendering

use chrono::{DateTime, Utc};
use std::fmt::Write;

use super::layout::TIMESTAMP_FORMAT;
use crate::transcript::Exchange;

const DIVIDER_WIDTH: usize = 60;

/// Renders exchanges as the plain-text export document
///
/// The header is followed by one block per exchange, each closed by a
/// 60-character dash divider.
pub fn render(exchanges: &[Exchange], exported_at: DateTime<Utc>) -> String {
    let mut out = String::new();

    out.push_str("STUDY TUTOR CHAT EXPORT\n");
    let _ = writeln!(out, "Exported on: {}", exported_at.format(TIMESTAMP_FORMAT));
    out.push_str(&"=".repeat(DIVIDER_WIDTH));
    out.push_str("\n\n");

    for (idx, exchange) in exchanges.iter().enumerate() {
        let _ = writeln!(out, "Question {}:", idx + 1);
        let _ = writeln!(out, "Topic: {}", exchange.topic);
        let _ = writeln!(out, "Q: {}\n", exchange.question);
        let _ = writeln!(out, "Answer:\n{}", exchange.answer);
        out.push_str(&"-".repeat(DIVIDER_WIDTH));
        out.push_str("\n\n");
    }

    out
}
