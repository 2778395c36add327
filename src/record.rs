//! NDJSON input schema.
//!
//! Each line is `{"type": "snapshot"|"delta", "data": {"a": [[price, volume], ...], "b": [...]}}`.
//! Missing `data`, `a` or `b` mean "no levels". Prices and volumes may be
//! JSON numbers or numeric strings. `data` is only inspected for snapshot and
//! delta messages.
use serde::Deserialize;
use serde_json::Value;

use crate::error::ExtractError;

#[derive(Debug, Deserialize)]
struct RawMessage {
    #[serde(rename = "type", default)]
    kind: Option<Value>,
    #[serde(default = "empty_data")]
    data: Value,
}

fn empty_data() -> Value {
    Value::Object(Default::default())
}

#[derive(Debug, Deserialize)]
struct RawBook {
    #[serde(default)]
    a: Vec<(Value, Value)>,
    #[serde(default)]
    b: Vec<(Value, Value)>,
}

/// One decoded input line. Levels are `(price, volume)` pairs in input order.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Snapshot { asks: Vec<(f64, f64)>, bids: Vec<(f64, f64)> },
    Delta { asks: Vec<(f64, f64)>, bids: Vec<(f64, f64)> },
    /// Missing or unknown `type`; applies nothing.
    Other,
}

/// Decode one raw input line. `line` is its 0-based position, used in errors.
///
/// Bytes that are not UTF-8 JSON are a decode error for that line.
pub fn decode_line(bytes: &[u8], line: usize) -> Result<Message, ExtractError> {
    let decode_err = |source: serde_json::Error| ExtractError::Decode { line, source };
    // skipped fields are not checked for UTF-8 by the JSON reader, so check the whole line
    let text = std::str::from_utf8(bytes)
        .map_err(|e| decode_err(serde::de::Error::custom(format_args!("invalid UTF-8: {e}"))))?;
    let raw: RawMessage = serde_json::from_str(text).map_err(decode_err)?;
    let is_snapshot = match raw.kind.as_ref().and_then(Value::as_str) {
        Some("snapshot") => true,
        Some("delta") => false,
        _ => return Ok(Message::Other),
    };
    let book: RawBook = serde_json::from_value(raw.data).map_err(decode_err)?;
    let asks = convert_levels(&book.a, line)?;
    let bids = convert_levels(&book.b, line)?;
    Ok(if is_snapshot { Message::Snapshot { asks, bids } } else { Message::Delta { asks, bids } })
}

fn convert_levels(levels: &[(Value, Value)], line: usize) -> Result<Vec<(f64, f64)>, ExtractError> {
    levels
        .iter()
        .map(|(price, volume)| {
            let price = to_f64(price, line, "price")?;
            let volume = to_f64(volume, line, "volume")?;
            if volume < 0.0 {
                return Err(conversion_error(line, "volume", &volume.to_string()));
            }
            Ok((price, volume))
        })
        .collect()
}

/// Finite `f64` from a JSON number or a numeric string.
fn to_f64(value: &Value, line: usize, field: &'static str) -> Result<f64, ExtractError> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .filter(|v| v.is_finite())
        .ok_or_else(|| conversion_error(line, field, &value.to_string()))
}

fn conversion_error(line: usize, field: &'static str, value: &str) -> ExtractError {
    ExtractError::ValueConversion { line, field, value: value.to_owned() }
}
