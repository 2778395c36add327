//! Limit order book event extraction library.
//!
//! This crate replays exchange-style Level-2 snapshot/delta messages and
//! derives a classified stream of market events plus a mid-price trace:
//!
//! - `book`: two-sided price→volume book, cached sorted views and depth ranking
//! - `classify`: turns one level update into a market fill, limit add or cancel
//! - `mid`: mid-price observation and change gating
//! - `engine`: applies snapshots and deltas in the order the feed defines
//! - `record`: NDJSON input schema and value conversion
//! - `replay`: line-driven driver yielding events whenever the mid changes
//!
//! The binaries in this repository (`src/main.rs` and `src/bin/mid_trace.rs`)
//! wrap [`replay::Replay`] for command-line use.
pub mod book;
pub mod classify;
pub mod engine;
pub mod error;
pub mod event;
pub mod logging;
pub mod mid;
pub mod record;
pub mod replay;

pub use engine::{ExtractionEngine, ExtractorConfig, DEFAULT_MAX_DEPTH};
pub use error::ExtractError;
pub use event::{EventKind, MarketEvent, MidPrice};
pub use replay::{collect_all, Replay, ReplayStep};
