//! Frame codec
//!
//! Each inbound frame is one JSON object carrying every `Snapshot` field.
//! Decoding checks presence, type and range of each field before building
//! the `Snapshot`, so that a rejected frame can name what was wrong with it.
//! Unknown extra fields are ignored.

use super::snapshot::{BuybackStatus, Snapshot};
use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Expected shape of a wire field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Flag,
    /// Integer in 0..=100
    Percent,
    /// Non-negative integer
    Count,
    /// Signed integer
    Integer,
    Buyback,
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldKind::Text => "a string",
            FieldKind::Flag => "a boolean",
            FieldKind::Percent => "an integer percentage",
            FieldKind::Count => "a non-negative integer",
            FieldKind::Integer => "an integer",
            FieldKind::Buyback => "a buyback status string",
        })
    }
}

#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("frame is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("frame is not a JSON object")]
    NotAnObject,
    #[error("missing field `{0}`")]
    MissingField(&'static str),
    #[error("field `{field}` should be {expected}")]
    WrongType {
        field: &'static str,
        expected: FieldKind,
    },
    #[error("field `{field}` out of range: {value}")]
    OutOfRange { field: &'static str, value: Number },
    #[error("field `buyback_status` has unknown value {0:?}")]
    UnknownBuybackStatus(String),
}

impl DecodeError {
    /// Name of the offending field, when the error is attributable to one.
    pub fn field(&self) -> Option<&'static str> {
        match self {
            DecodeError::MissingField(field)
            | DecodeError::WrongType { field, .. }
            | DecodeError::OutOfRange { field, .. } => Some(field),
            DecodeError::UnknownBuybackStatus(_) => Some("buyback_status"),
            DecodeError::Malformed(_) | DecodeError::NotAnObject => None,
        }
    }
}

/// Every field a frame must carry, in wire order.
const SCHEMA: &[(&str, FieldKind)] = &[
    ("hero_name", FieldKind::Text),
    ("clock_display", FieldKind::Text),
    ("strategy_text", FieldKind::Text),
    ("strategy_warn", FieldKind::Flag),
    ("health_percent", FieldKind::Percent),
    ("mana_percent", FieldKind::Percent),
    ("gold", FieldKind::Count),
    ("last_hits", FieldKind::Count),
    ("denies", FieldKind::Count),
    ("buyback_status", FieldKind::Buyback),
    ("buyback_missing", FieldKind::Count),
    ("gpm", FieldKind::Integer),
    ("kda", FieldKind::Text),
    ("wand_alert", FieldKind::Flag),
    ("tp_alert", FieldKind::Flag),
    ("hp_regen_alert", FieldKind::Flag),
    ("mana_regen_alert", FieldKind::Flag),
];

fn check_field(field: &'static str, kind: FieldKind, value: &Value) -> Result<(), DecodeError> {
    let wrong_type = || DecodeError::WrongType {
        field,
        expected: kind,
    };
    let out_of_range = |n: &Number| DecodeError::OutOfRange {
        field,
        value: n.clone(),
    };
    match kind {
        FieldKind::Text => value.is_string().then_some(()).ok_or_else(wrong_type),
        FieldKind::Flag => value.is_boolean().then_some(()).ok_or_else(wrong_type),
        FieldKind::Percent | FieldKind::Count | FieldKind::Integer => {
            let Value::Number(n) = value else {
                return Err(wrong_type());
            };
            if n.is_f64() {
                return Err(wrong_type());
            }
            let in_range = match kind {
                FieldKind::Percent => n.as_u64().map_or(false, |v| v <= 100),
                FieldKind::Count => n.as_u64().map_or(false, |v| v <= u64::from(u32::MAX)),
                _ => n
                    .as_i64()
                    .map_or(false, |v| i32::try_from(v).is_ok()),
            };
            in_range.then_some(()).ok_or_else(|| out_of_range(n))
        }
        FieldKind::Buyback => match value.as_str() {
            Some(s) if BuybackStatus::from_wire(s).is_some() => Ok(()),
            Some(s) => Err(DecodeError::UnknownBuybackStatus(s.to_string())),
            None => Err(wrong_type()),
        },
    }
}

fn check_object(obj: &Map<String, Value>) -> Result<(), DecodeError> {
    for &(field, kind) in SCHEMA {
        match obj.get(field) {
            Some(value) => check_field(field, kind, value)?,
            None => return Err(DecodeError::MissingField(field)),
        }
    }
    Ok(())
}

/// Parses one raw frame into a `Snapshot`.
pub fn decode(raw: &str) -> Result<Snapshot, DecodeError> {
    let value: Value = serde_json::from_str(raw)?;
    match &value {
        Value::Object(obj) => check_object(obj)?,
        _ => return Err(DecodeError::NotAnObject),
    }
    Ok(serde_json::from_value(value)?)
}

/// Serializes a `Snapshot` into the wire format.
pub fn encode(snapshot: &Snapshot) -> serde_json::Result<String> {
    serde_json::to_string(snapshot)
}
