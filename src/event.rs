//! Classified market events and the mid-price observation they carry.
//!
//! `MarketEvent` serializes straight to the NDJSON output record:
//! `action`, `price`, `volume`, `depth`, `index`, `mid_price`, `previous_vol`,
//! `volume_change_normalized`. An invalid mid price is written as `null`.
use serde::{Deserialize, Serialize};

use crate::book::Side;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// An ask level disappeared.
    MarketBuy,
    /// A bid level disappeared.
    MarketSell,
    SellLimitAdded,
    SellLimitCanceled,
    BuyLimitAdded,
    BuyLimitCanceled,
}

impl EventKind {
    /// Level removed (new volume 0).
    pub fn removed(side: Side) -> Self {
        match side { Side::Ask => EventKind::MarketBuy, Side::Bid => EventKind::MarketSell }
    }

    /// Volume grew at a level.
    pub fn added(side: Side) -> Self {
        match side { Side::Ask => EventKind::SellLimitAdded, Side::Bid => EventKind::BuyLimitAdded }
    }

    /// Volume shrank at a level that is still present.
    pub fn canceled(side: Side) -> Self {
        match side { Side::Ask => EventKind::SellLimitCanceled, Side::Bid => EventKind::BuyLimitCanceled }
    }
}

/// Mid price of the book, or `Invalid` while either side is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "Option<f64>", into = "Option<f64>")]
pub enum MidPrice {
    Valid(f64),
    Invalid,
}

impl MidPrice {
    pub fn value(&self) -> Option<f64> {
        match self { MidPrice::Valid(v) => Some(*v), MidPrice::Invalid => None }
    }
}

impl From<Option<f64>> for MidPrice {
    fn from(v: Option<f64>) -> Self {
        v.map_or(MidPrice::Invalid, MidPrice::Valid)
    }
}

impl From<MidPrice> for Option<f64> {
    fn from(mid: MidPrice) -> Self {
        mid.value()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketEvent {
    #[serde(rename = "action")]
    pub kind: EventKind,
    pub price: f64,
    /// Magnitude of the volume change, never negative.
    pub volume: f64,
    /// Rank of the level against the book as it stood when the delta started.
    pub depth: usize,
    /// Position of the triggering message in the stream.
    #[serde(rename = "index")]
    pub sequence_index: usize,
    /// Mid price right after this update was applied.
    pub mid_price: MidPrice,
    #[serde(rename = "previous_vol")]
    pub previous_volume: f64,
    /// Change relative to `previous_volume`, or 1.0 for a level that did not exist.
    #[serde(rename = "volume_change_normalized")]
    pub normalized_volume_change: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_output_record() {
        let ev = MarketEvent {
            kind: EventKind::BuyLimitCanceled,
            price: 100.0,
            volume: 2.0,
            depth: 0,
            sequence_index: 3,
            mid_price: MidPrice::Valid(101.0),
            previous_volume: 5.0,
            normalized_volume_change: 0.4,
        };
        let json = serde_json::to_string(&ev).unwrap();
        assert_eq!(
            json,
            r#"{"action":"buy_limit_canceled","price":100.0,"volume":2.0,"depth":0,"index":3,"mid_price":101.0,"previous_vol":5.0,"volume_change_normalized":0.4}"#
        );
    }

    #[test]
    fn invalid_mid_is_null() {
        let ev = MarketEvent {
            kind: EventKind::MarketSell,
            price: 99.0,
            volume: 1.0,
            depth: 1,
            sequence_index: 0,
            mid_price: MidPrice::Invalid,
            previous_volume: 1.0,
            normalized_volume_change: -1.0,
        };
        let value = serde_json::to_value(&ev).unwrap();
        assert!(value["mid_price"].is_null());
        let back: MarketEvent = serde_json::from_value(value).unwrap();
        assert_eq!(back.mid_price, MidPrice::Invalid);
    }

    #[test]
    fn kind_names_match_serde() {
        for (kind, name) in [
            (EventKind::MarketBuy, "market_buy"),
            (EventKind::MarketSell, "market_sell"),
            (EventKind::SellLimitAdded, "sell_limit_added"),
            (EventKind::SellLimitCanceled, "sell_limit_canceled"),
            (EventKind::BuyLimitAdded, "buy_limit_added"),
            (EventKind::BuyLimitCanceled, "buy_limit_canceled"),
        ] {
            assert_eq!(serde_json::to_value(kind).unwrap(), name);
        }
    }
}
