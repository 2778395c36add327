//! Mid-price observation and change gating.
use crate::book::{OrderBookState, Side};
use crate::event::MidPrice;

/// Remembers the last reported mid price and decides when a new one is worth reporting.
#[derive(Debug, Clone, Default)]
pub struct MidPriceTracker {
    last: Option<MidPrice>,
}

impl MidPriceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// `(best bid + best ask) / 2`, or `Invalid` when either side is empty.
    pub fn observe(book: &OrderBookState) -> MidPrice {
        match (book.best_price(Side::Bid), book.best_price(Side::Ask)) {
            (Ok(bid), Ok(ask)) => MidPrice::Valid((bid + ask) / 2.0),
            _ => MidPrice::Invalid,
        }
    }

    /// Nothing recorded yet always counts as a change; Invalid→Invalid never does.
    /// Two valid mids differ only when their values are not exactly equal.
    pub fn has_changed(previous: Option<MidPrice>, current: MidPrice) -> bool {
        match (previous, current) {
            (None, _) => true,
            (Some(MidPrice::Invalid), MidPrice::Invalid) => false,
            (Some(MidPrice::Valid(a)), MidPrice::Valid(b)) => a != b,
            (Some(_), _) => true,
        }
    }

    pub fn last(&self) -> Option<MidPrice> {
        self.last
    }

    /// Record `current` if it differs from the last recorded mid. Returns whether it did.
    pub fn record_if_changed(&mut self, current: MidPrice) -> bool {
        let changed = Self::has_changed(self.last, current);
        if changed {
            self.last = Some(current);
        }
        changed
    }
}
