//! Per-update event classification.
//!
//! One `(side, price, new total volume)` update at a time: rank it against the
//! pinned pre-delta view, apply it to the book, and decide which event (if any)
//! it represents.
use tracing::warn;

use crate::book::{rank, OrderBookState, Side, SortedView};
use crate::event::{EventKind, MarketEvent};
use crate::mid::MidPriceTracker;

/// A single level update: the new total volume resting at `price`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LevelUpdate {
    pub side: Side,
    pub price: f64,
    pub volume: f64,
}

/// What an update means, before depth filtering and event decoration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classification {
    pub kind: EventKind,
    pub volume: f64,
    pub normalized_volume_change: f64,
}

/// Classify a move from `previous_volume` to `new_volume` at one level.
///
/// Removals report `change / previous` (so -1.0 for a full removal) while
/// cancellations report `-change / previous`; both use 1.0 for a level that
/// had no volume. An unchanged level yields `None`.
pub fn classify_change(side: Side, previous_volume: f64, new_volume: f64) -> Option<Classification> {
    let change = new_volume - previous_volume;
    let ratio = |delta: f64| if previous_volume > 0.0 { delta / previous_volume } else { 1.0 };
    if new_volume == 0.0 {
        Some(Classification {
            kind: EventKind::removed(side),
            volume: previous_volume,
            normalized_volume_change: ratio(change),
        })
    } else if change > 0.0 {
        Some(Classification {
            kind: EventKind::added(side),
            volume: change,
            normalized_volume_change: ratio(change),
        })
    } else if change < 0.0 {
        Some(Classification {
            kind: EventKind::canceled(side),
            volume: -change,
            normalized_volume_change: ratio(-change),
        })
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy)]
pub struct EventClassifier {
    max_depth: usize,
}

impl EventClassifier {
    /// Events are only reported for levels ranked shallower than `max_depth`.
    pub fn new(max_depth: usize) -> Self {
        Self { max_depth }
    }

    /// Apply `update` to `book` and return the event it triggers, if any.
    ///
    /// `view` is the side's ordering as of the start of the delta; the book is
    /// always mutated, even when the level is too deep to report.
    pub fn apply(
        &self,
        book: &mut OrderBookState,
        view: &SortedView,
        update: LevelUpdate,
        sequence_index: usize,
    ) -> Option<MarketEvent> {
        let LevelUpdate { side, price, volume } = update;
        let previous_volume = book.get(side, price);
        let depth = rank(view, side, price);
        book.upsert(side, price, volume);

        if depth >= self.max_depth {
            return None;
        }
        let class = classify_change(side, previous_volume, volume)?;
        if volume == 0.0 && previous_volume == 0.0 {
            warn!(%side, price, sequence_index, "removal of a level that was not in the book");
        }
        Some(MarketEvent {
            kind: class.kind,
            price,
            volume: class.volume,
            depth,
            sequence_index,
            mid_price: MidPriceTracker::observe(book),
            previous_volume,
            normalized_volume_change: class.normalized_volume_change,
        })
    }
}
