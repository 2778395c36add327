//! Level-2 order book state and depth ranking.
//!
//! This module defines the price→volume book replayed from snapshot/delta
//! messages (`OrderBookState`) plus the per-side sorted price view used to
//! compute the depth of a level:
//! - Asks are ranked ascending (best = lowest price), bids descending
//! - The sorted view is cached and only rebuilt after it has been invalidated
//! - [`rank`] doubles as an insertion point for prices not in the book
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::EmptySide;

/// Relative tolerance used when matching a feed price against a book level.
pub const PRICE_REL_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Bid,
    Ask,
}

impl Side {
    /// True once a level at `level` is at or beyond `price` in this side's ordering.
    fn has_passed(self, level: f64, price: f64) -> bool {
        match self {
            Side::Ask => level >= price,
            Side::Bid => level <= price,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Bid => f.write_str("bid"),
            Side::Ask => f.write_str("ask"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    /// Price level.
    pub price: f64,
    /// Total resting volume at that price.
    pub volume: f64,
}

/// Map key for `f64` prices. Ordered with `total_cmp`; `-0.0` folds into `0.0`.
#[derive(Debug, Clone, Copy)]
struct PriceKey(f64);

impl PriceKey {
    fn new(price: f64) -> Self {
        if price == 0.0 { PriceKey(0.0) } else { PriceKey(price) }
    }
}

impl PartialEq for PriceKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for PriceKey {}

impl PartialOrd for PriceKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PriceKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Prices of one side in ranking order: ascending for asks, descending for bids.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SortedView {
    prices: Vec<f64>,
}

impl SortedView {
    pub fn prices(&self) -> &[f64] { &self.prices }
}

/// Equality within [`PRICE_REL_TOLERANCE`], relative to the larger magnitude.
pub fn prices_close(a: f64, b: f64) -> bool {
    a == b || (a - b).abs() <= PRICE_REL_TOLERANCE * a.abs().max(b.abs())
}

/// Zero-based depth of `price` within `view`.
///
/// Returns the index of the first level that either matches `price` (within
/// tolerance) or lies at/beyond it in the side's ordering, or the number of
/// levels when there is none. The matching test wins, so a level being updated reports its
/// own rank. Levels are strictly ordered, which makes the "not yet reached"
/// predicate monotone and lets this run as a binary search.
pub fn rank(view: &SortedView, side: Side, price: f64) -> usize {
    view.prices
        .partition_point(|&level| !prices_close(level, price) && !side.has_passed(level, price))
}

/// Two-sided price→volume book with a lazily rebuilt sorted view per side.
///
/// A stored level never has volume 0; removals delete the entry.
#[derive(Debug, Clone, Default)]
pub struct OrderBookState {
    bids: BTreeMap<PriceKey, f64>,
    asks: BTreeMap<PriceKey, f64>,
    /// Cached views; `None` means stale.
    bid_view: Option<SortedView>,
    ask_view: Option<SortedView>,
}

impl OrderBookState {
    pub fn new() -> Self {
        Self::default()
    }

    fn levels(&self, side: Side) -> &BTreeMap<PriceKey, f64> {
        match side { Side::Bid => &self.bids, Side::Ask => &self.asks }
    }

    fn levels_mut(&mut self, side: Side) -> &mut BTreeMap<PriceKey, f64> {
        match side { Side::Bid => &mut self.bids, Side::Ask => &mut self.asks }
    }

    fn view_slot(&mut self, side: Side) -> &mut Option<SortedView> {
        match side { Side::Bid => &mut self.bid_view, Side::Ask => &mut self.ask_view }
    }

    /// Discard both sides and rebuild them from `(price, volume)` pairs.
    ///
    /// Later duplicates of a price overwrite earlier ones. Zero-volume pairs
    /// are skipped. Both sorted views become stale.
    pub fn replace<A, B>(&mut self, asks: A, bids: B)
    where
        A: IntoIterator<Item = (f64, f64)>,
        B: IntoIterator<Item = (f64, f64)>,
    {
        self.asks.clear();
        self.bids.clear();
        for (price, volume) in asks {
            self.upsert(Side::Ask, price, volume);
        }
        for (price, volume) in bids {
            self.upsert(Side::Bid, price, volume);
        }
        self.invalidate_sorted();
    }

    /// Set the level at `price` to `volume`, or remove it when `volume` is 0.
    ///
    /// Does not touch the sorted views; the caller decides when they go stale.
    pub fn upsert(&mut self, side: Side, price: f64, volume: f64) {
        let levels = self.levels_mut(side);
        if volume == 0.0 {
            levels.remove(&PriceKey::new(price));
        } else {
            levels.insert(PriceKey::new(price), volume);
        }
    }

    /// Stored volume at `price`, 0 when absent.
    pub fn get(&self, side: Side, price: f64) -> f64 {
        self.levels(side).get(&PriceKey::new(price)).copied().unwrap_or(0.0)
    }

    /// Highest bid or lowest ask.
    pub fn best_price(&self, side: Side) -> Result<f64, EmptySide> {
        let best = match side {
            Side::Bid => self.bids.keys().next_back(),
            Side::Ask => self.asks.keys().next(),
        };
        best.map(|k| k.0).ok_or(EmptySide(side))
    }

    pub fn level_count(&self, side: Side) -> usize {
        self.levels(side).len()
    }

    /// Best `n` levels of a side, best first.
    pub fn top_levels(&self, side: Side, n: usize) -> Vec<PriceLevel> {
        let to_level = |(k, v): (&PriceKey, &f64)| PriceLevel { price: k.0, volume: *v };
        match side {
            Side::Ask => self.asks.iter().take(n).map(to_level).collect(),
            Side::Bid => self.bids.iter().rev().take(n).map(to_level).collect(),
        }
    }

    fn build_view(&self, side: Side) -> SortedView {
        let prices = match side {
            Side::Ask => self.asks.keys().map(|k| k.0).collect(),
            Side::Bid => self.bids.keys().rev().map(|k| k.0).collect(),
        };
        SortedView { prices }
    }

    /// Cached sorted view of a side, rebuilt first if stale.
    pub fn sorted_view(&mut self, side: Side) -> &SortedView {
        if self.is_view_stale(side) {
            let view = self.build_view(side);
            *self.view_slot(side) = Some(view);
        }
        self.view_slot(side).get_or_insert_with(SortedView::default)
    }

    /// Move the (possibly rebuilt) view of a side out of the cache, leaving it stale.
    ///
    /// Used to pin a side's ordering while the book itself is mutated.
    pub fn take_sorted_view(&mut self, side: Side) -> SortedView {
        match self.view_slot(side).take() {
            Some(view) => view,
            None => self.build_view(side),
        }
    }

    pub fn is_view_stale(&self, side: Side) -> bool {
        match side { Side::Bid => self.bid_view.is_none(), Side::Ask => self.ask_view.is_none() }
    }

    /// Mark both sorted views stale.
    pub fn invalidate_sorted(&mut self) {
        self.bid_view = None;
        self.ask_view = None;
    }
}
