//! Snapshot/delta application and event extraction for one replay session.
use tracing::{debug, warn};

use crate::book::{OrderBookState, Side, SortedView};
use crate::classify::{EventClassifier, LevelUpdate};
use crate::event::{MarketEvent, MidPrice};
use crate::mid::MidPriceTracker;

/// Default depth cutoff for reported events.
pub const DEFAULT_MAX_DEPTH: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractorConfig {
    /// Only levels ranked below this depth produce events.
    pub max_depth: usize,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self { max_depth: DEFAULT_MAX_DEPTH }
    }
}

/// Owns the book and the mid-price tracker of one replay session.
///
/// Not meant to be shared: every call mutates the book in place.
#[derive(Debug, Clone, Default)]
pub struct ExtractionEngine {
    book: OrderBookState,
    tracker: MidPriceTracker,
}

impl ExtractionEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn book(&self) -> &OrderBookState {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut OrderBookState {
        &mut self.book
    }

    /// Replace the whole book. The mid-change gate is left to the caller.
    pub fn apply_snapshot(&mut self, asks: &[(f64, f64)], bids: &[(f64, f64)]) {
        self.book.replace(asks.iter().copied(), bids.iter().copied());
        debug!(
            asks = self.book.level_count(Side::Ask),
            bids = self.book.level_count(Side::Bid),
            "snapshot applied"
        );
        if let (Ok(bid), Ok(ask)) = (self.book.best_price(Side::Bid), self.book.best_price(Side::Ask)) {
            if bid >= ask {
                warn!(bid, ask, "snapshot book is crossed");
            }
        }
    }

    /// Apply one delta: every ask update in order, then every bid update.
    ///
    /// Depth of every update is taken from the side's ordering as it stood
    /// before this delta; the views are only invalidated once both sides are
    /// done. Ask-derived events come before bid-derived ones.
    pub fn apply_delta(
        &mut self,
        asks: &[(f64, f64)],
        bids: &[(f64, f64)],
        sequence_index: usize,
        max_depth: usize,
    ) -> Vec<MarketEvent> {
        let classifier = EventClassifier::new(max_depth);
        let mut events = Vec::new();
        let ask_view = self.pin_view(Side::Ask, asks);
        let bid_view = self.pin_view(Side::Bid, bids);
        for (side, updates, view) in [(Side::Ask, asks, &ask_view), (Side::Bid, bids, &bid_view)] {
            for &(price, volume) in updates {
                let update = LevelUpdate { side, price, volume };
                events.extend(classifier.apply(&mut self.book, view, update, sequence_index));
            }
        }
        self.book.invalidate_sorted();
        debug!(sequence_index, asks = asks.len(), bids = bids.len(), events = events.len(), "delta applied");
        events
    }

    fn pin_view(&mut self, side: Side, updates: &[(f64, f64)]) -> SortedView {
        if updates.is_empty() {
            SortedView::default()
        } else {
            self.book.take_sorted_view(side)
        }
    }

    /// Mid price of the current book.
    pub fn observe_mid(&self) -> MidPrice {
        MidPriceTracker::observe(&self.book)
    }

    /// Observe the current mid and record it if it changed since the last recorded one.
    pub fn record_mid(&mut self) -> Option<MidPrice> {
        let mid = self.observe_mid();
        self.tracker.record_if_changed(mid).then_some(mid)
    }

    pub fn last_mid(&self) -> Option<MidPrice> {
        self.tracker.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::book::rank;
    use crate::event::EventKind;

    fn scenario_a() -> ExtractionEngine {
        let mut engine = ExtractionEngine::new();
        engine.apply_snapshot(&[(101.0, 5.0), (102.0, 5.0)], &[(100.0, 5.0), (99.0, 5.0)]);
        engine
    }

    #[test]
    fn snapshot_mid() {
        let engine = scenario_a();
        assert_eq!(engine.observe_mid(), MidPrice::Valid(100.5));
    }

    #[test]
    fn best_levels_rank_zero_after_snapshot() {
        let mut engine = scenario_a();
        let book = engine.book_mut();
        let best_ask = book.best_price(Side::Ask).unwrap();
        let best_bid = book.best_price(Side::Bid).unwrap();
        assert_eq!(rank(book.sorted_view(Side::Ask), Side::Ask, best_ask), 0);
        assert_eq!(rank(book.sorted_view(Side::Bid), Side::Bid, best_bid), 0);
    }

    #[test]
    fn scenario_b_market_buy() {
        let mut engine = scenario_a();
        let events = engine.apply_delta(&[(101.0, 0.0)], &[], 1, 50);
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.kind, EventKind::MarketBuy);
        assert_eq!(ev.price, 101.0);
        assert_eq!(ev.volume, 5.0);
        assert_eq!(ev.depth, 0);
        assert_eq!(ev.previous_volume, 5.0);
        assert_eq!(ev.normalized_volume_change, -1.0);
        // ask 101 is already gone when the mid is read: (100 + 102) / 2
        assert_eq!(ev.mid_price, MidPrice::Valid(101.0));
        assert_eq!(engine.book().best_price(Side::Ask), Ok(102.0));
    }

    #[test]
    fn scenario_c_buy_limit_canceled() {
        let mut engine = scenario_a();
        engine.apply_delta(&[(101.0, 0.0)], &[], 1, 50);
        let events = engine.apply_delta(&[], &[(100.0, 3.0)], 2, 50);
        assert_eq!(events.len(), 1);
        let ev = &events[0];
        assert_eq!(ev.kind, EventKind::BuyLimitCanceled);
        assert_eq!(ev.price, 100.0);
        assert_eq!(ev.volume, 2.0);
        assert_eq!(ev.depth, 0);
        assert_eq!(ev.previous_volume, 5.0);
        assert_eq!(ev.normalized_volume_change, 0.4);
        assert_eq!(ev.sequence_index, 2);
    }

    #[test]
    fn scenario_d_removing_absent_level() {
        let mut engine = scenario_a();
        let events = engine.apply_delta(&[(101.5, 0.0)], &[], 4, 50);
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, EventKind::MarketBuy);
        assert_eq!(events[0].volume, 0.0);
        assert_eq!(events[0].previous_volume, 0.0);
        assert_eq!(events[0].normalized_volume_change, 1.0);
        assert_eq!(events[0].depth, 1);
        assert_eq!(engine.book().level_count(Side::Ask), 2);
    }

    #[test]
    fn depth_uses_pre_delta_ordering() {
        let mut engine = scenario_a();
        // 100.8 becomes the new best ask, yet 101 still ranks 0 within this delta
        let events = engine.apply_delta(&[(100.8, 1.0), (101.0, 2.0)], &[], 1, 50);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, EventKind::SellLimitAdded);
        assert_eq!(events[0].depth, 0);
        assert_eq!(events[1].kind, EventKind::SellLimitCanceled);
        assert_eq!(events[1].depth, 0);
        // next delta sees the new ordering
        let events = engine.apply_delta(&[(101.0, 3.0)], &[], 2, 50);
        assert_eq!(events[0].depth, 1);
    }

    #[test]
    fn mid_tracks_progress_within_delta() {
        let mut engine = scenario_a();
        let events = engine.apply_delta(&[(100.8, 1.0)], &[(100.2, 1.0)], 1, 50);
        assert_eq!(events[0].mid_price, MidPrice::Valid((100.0 + 100.8) / 2.0));
        assert_eq!(events[1].mid_price, MidPrice::Valid((100.2 + 100.8) / 2.0));
    }

    #[test]
    fn asks_before_bids_in_input_order() {
        let mut engine = scenario_a();
        let events = engine.apply_delta(
            &[(102.0, 1.0), (101.0, 9.0)],
            &[(99.0, 0.0), (100.0, 6.0)],
            3,
            50,
        );
        let kinds: Vec<_> = events.iter().map(|e| (e.kind, e.price)).collect();
        assert_eq!(kinds, vec![
            (EventKind::SellLimitCanceled, 102.0),
            (EventKind::SellLimitAdded, 101.0),
            (EventKind::MarketSell, 99.0),
            (EventKind::BuyLimitAdded, 100.0),
        ]);
    }

    #[test]
    fn deep_updates_are_applied_silently() {
        let mut engine = scenario_a();
        let events = engine.apply_delta(&[(102.0, 7.0)], &[(99.0, 0.0)], 1, 1);
        assert!(events.is_empty());
        assert_eq!(engine.book().get(Side::Ask, 102.0), 7.0);
        assert_eq!(engine.book().get(Side::Bid, 99.0), 0.0);
    }

    #[test]
    fn repeated_price_in_one_delta_chains_volumes() {
        let mut engine = scenario_a();
        let events = engine.apply_delta(&[], &[(100.0, 8.0), (100.0, 6.0)], 1, 50);
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].previous_volume, 5.0);
        assert_eq!(events[1].previous_volume, 8.0);
        assert_eq!(events[1].kind, EventKind::BuyLimitCanceled);
        assert_eq!(events[1].volume, 2.0);
    }

    #[test]
    fn delta_leaves_views_stale() {
        let mut engine = scenario_a();
        let _ = engine.book_mut().sorted_view(Side::Ask);
        engine.apply_delta(&[(103.0, 1.0)], &[], 1, 50);
        assert!(engine.book().is_view_stale(Side::Ask));
        assert!(engine.book().is_view_stale(Side::Bid));
    }

    #[test]
    fn record_mid_gates_changes() {
        let mut engine = ExtractionEngine::new();
        assert_eq!(engine.record_mid(), Some(MidPrice::Invalid));
        engine.apply_delta(&[(101.0, 1.0)], &[], 1, 50);
        assert_eq!(engine.record_mid(), None);
        engine.apply_delta(&[], &[(99.0, 1.0)], 2, 50);
        assert_eq!(engine.record_mid(), Some(MidPrice::Valid(100.0)));
        assert_eq!(engine.last_mid(), Some(MidPrice::Valid(100.0)));
    }
}
