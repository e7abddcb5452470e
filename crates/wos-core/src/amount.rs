//! Transaction amount lookup.
//!
//! The amount of a call is read from the first present, non-null field among
//! `amount`, `value` and `total` of a JSON object body. Numbers and numeric
//! strings are accepted.

use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;

/// Body fields inspected for the transaction amount, in priority order.
pub const AMOUNT_FIELDS: [&str; 3] = ["amount", "value", "total"];

/// Outcome of amount resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolvedAmount {
    /// A numeric amount was found.
    Value(Decimal),
    /// No body, a non-object body, or none of the fields present.
    Missing,
    /// A field was present but did not hold a number (raw JSON kept).
    Unparseable(String),
}

impl ResolvedAmount {
    /// Numeric value, with missing or unparseable amounts counted as zero.
    pub fn or_zero(&self) -> Decimal {
        match self {
            ResolvedAmount::Value(v) => *v,
            ResolvedAmount::Missing | ResolvedAmount::Unparseable(_) => Decimal::ZERO,
        }
    }

    pub fn value(&self) -> Option<Decimal> {
        match self {
            ResolvedAmount::Value(v) => Some(*v),
            _ => None,
        }
    }
}

/// Resolve the transaction amount of a request body.
pub fn resolve_amount(body: Option<&Value>) -> ResolvedAmount {
    let Some(fields) = body.and_then(Value::as_object) else {
        return ResolvedAmount::Missing;
    };

    for name in AMOUNT_FIELDS {
        match fields.get(name) {
            None | Some(Value::Null) => continue,
            Some(raw) => {
                return match parse_amount(raw) {
                    Some(v) => ResolvedAmount::Value(v),
                    None => ResolvedAmount::Unparseable(raw.to_string()),
                };
            }
        }
    }

    ResolvedAmount::Missing
}

fn parse_amount(raw: &Value) -> Option<Decimal> {
    match raw {
        Value::Number(n) => parse_decimal(&n.to_string()),
        Value::String(s) => parse_decimal(s.trim()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .ok()
        .or_else(|| Decimal::from_scientific(s).ok())
        .or_else(|| saturate(s))
}

/// Finite numbers beyond the `Decimal` range clamp to `Decimal::MAX` / `MIN`.
fn saturate(s: &str) -> Option<Decimal> {
    let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
    if f.abs() < 1.0 {
        return None;
    }
    Some(if f.is_sign_negative() {
        Decimal::MIN
    } else {
        Decimal::MAX
    })
}
