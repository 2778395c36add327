//! Error types for decoding and replaying order-book streams.
use thiserror::Error;

use crate::book::Side;

/// Errors that abort a replay.
///
/// All of them are caller errors (malformed input or unreadable source); the
/// engine itself never fails on well-formed data.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// The line is not valid JSON or does not match the message layout.
    #[error("line {line}: malformed message: {source}")]
    Decode {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    /// A price or volume could not be turned into a finite `f64`.
    #[error("line {line}: cannot convert {field} value {value} to a number")]
    ValueConversion {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Reading the input failed.
    #[error("read failed: {0}")]
    Io(#[from] std::io::Error),
}

/// Returned by [`crate::book::OrderBookState::best_price`] when a side has no levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("{0} side is empty")]
pub struct EmptySide(pub Side);
