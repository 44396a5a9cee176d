//! Dynamically-typed scalar values.
//!
//! `Value` is the closed set of tags every operator works with. Comparison
//! and equality are fallible and take an explicit [`CompareOption`]; the
//! derived `PartialEq` is plain structural equality and is only meant for
//! tests and bookkeeping, never for SQL semantics.

mod arith;
mod compare;
mod pattern;

use std::fmt;

use blake3::Hasher;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::hash::{digest_with, Hash256};

pub use compare::CompareOption;
pub use pattern::{LikePattern, RegexpMatcher};

pub const NANOS_PER_SECOND: i64 = 1_000_000_000;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    String(String),
    Int(i64),
    Uint(u64),
    Float(f64),
    /// Nanoseconds since the Unix epoch, UTC.
    DateTime(i64),
    /// Signed duration in nanoseconds.
    Interval(i64),
}

// Discriminants written ahead of the payload when hashing.
const TAG_NULL: u8 = 0;
const TAG_BOOL: u8 = 1;
const TAG_STRING: u8 = 2;
const TAG_INTEGRAL: u8 = 3;
const TAG_FLOAT: u8 = 4;
const TAG_DATETIME: u8 = 5;
const TAG_INTERVAL: u8 = 6;

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Int(_) => "int64",
            Value::Uint(_) => "uint64",
            Value::Float(_) => "float64",
            Value::DateTime(_) => "datetime",
            Value::Interval(_) => "interval",
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Int(_) | Value::Uint(_) | Value::Float(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            Value::Uint(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Uint(u) => Some(*u as f64),
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::DateTime(ns) => Some(Utc.timestamp_nanos(*ns)),
            _ => None,
        }
    }

    /// SQL truthiness used when a value stands in for a predicate result.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::String(s) => compare::parse_weak_bool(s).unwrap_or(false),
            Value::Int(i) => *i != 0,
            Value::Uint(u) => *u != 0,
            Value::Float(f) => *f != 0.0 && !f.is_nan(),
            Value::DateTime(_) => true,
            Value::Interval(d) => *d != 0,
        }
    }

    /// Parse RFC3339, `YYYY-MM-DD HH:MM:SS[.f]` or `YYYY-MM-DD` into a datetime.
    pub fn datetime_from_str(s: &str) -> Result<Value> {
        parse_datetime_nanos(s)
            .map(Value::DateTime)
            .ok_or_else(|| Error::Parse(format!("invalid datetime '{}'", s)))
    }

    pub fn datetime_from_secs(secs: i64) -> Result<Value> {
        secs.checked_mul(NANOS_PER_SECOND)
            .map(Value::DateTime)
            .ok_or_else(|| Error::Overflow(format!("datetime {}s", secs)))
    }

    pub fn interval_from_secs(secs: i64) -> Result<Value> {
        secs.checked_mul(NANOS_PER_SECOND)
            .map(Value::Interval)
            .ok_or_else(|| Error::Overflow(format!("interval {}s", secs)))
    }

    /// Feed a canonical encoding of this value into `hasher`.
    ///
    /// Numbers that compare equal across int64/uint64/float64 hash equal, so
    /// the digest works as a key for strict equality.
    pub fn hash_into(&self, hasher: &mut Hasher) {
        match self {
            Value::Null => {
                hasher.update(&[TAG_NULL]);
            }
            Value::Bool(b) => {
                hasher.update(&[TAG_BOOL, *b as u8]);
            }
            Value::String(s) => {
                hasher.update(&[TAG_STRING]);
                hasher.update(&(s.len() as u64).to_le_bytes());
                hasher.update(s.as_bytes());
            }
            Value::Int(_) | Value::Uint(_) | Value::Float(_) => match self.integral() {
                Some(i) => {
                    hasher.update(&[TAG_INTEGRAL]);
                    hasher.update(&i.to_le_bytes());
                }
                None => {
                    let bits = match self {
                        Value::Float(f) if f.is_nan() => f64::NAN.to_bits(),
                        Value::Float(f) => f.to_bits(),
                        _ => 0,
                    };
                    hasher.update(&[TAG_FLOAT]);
                    hasher.update(&bits.to_le_bytes());
                }
            },
            Value::DateTime(ns) => {
                hasher.update(&[TAG_DATETIME]);
                hasher.update(&ns.to_le_bytes());
            }
            Value::Interval(ns) => {
                hasher.update(&[TAG_INTERVAL]);
                hasher.update(&ns.to_le_bytes());
            }
        }
    }

    pub fn digest(&self) -> Hash256 {
        digest_with(|h| self.hash_into(h))
    }

    /// The exact integer a numeric value holds, if any.
    fn integral(&self) -> Option<i128> {
        match self {
            Value::Int(i) => Some(*i as i128),
            Value::Uint(u) => Some(*u as i128),
            Value::Float(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 1.0e38 => {
                Some(*f as i128)
            }
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Uint(u) => serde_json::Value::from(*u),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::DateTime(_) | Value::Interval(_) => serde_json::Value::String(self.to_string()),
        }
    }

    /// Map a JSON scalar onto a value. Arrays and objects are kept as their
    /// JSON text.
    pub fn from_json(v: &serde_json::Value) -> Value {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(*b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(u)
                } else {
                    Value::Float(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s.clone()),
            other => Value::String(other.to_string()),
        }
    }

    /// Text form used by record lines: strings JSON-escaped, datetimes RFC3339.
    pub fn to_text(&self) -> String {
        match self {
            Value::String(s) => serde_json::to_string(s).unwrap_or_else(|_| "\"?\"".to_string()),
            other => other.to_string(),
        }
    }
}

pub(crate) fn parse_datetime_nanos(s: &str) -> Option<i64> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return dt.timestamp_nanos_opt();
    }
    if let Ok(ndt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S%.f") {
        return ndt.and_utc().timestamp_nanos_opt();
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return d.and_hms_opt(0, 0, 0)?.and_utc().timestamp_nanos_opt();
    }
    None
}

fn format_datetime(ns: i64) -> String {
    Utc.timestamp_nanos(ns)
        .to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Render a duration as `1h2m3.5s`, `250ms`, `12µs`, `0s`.
fn format_interval(nanos: i64) -> String {
    if nanos == 0 {
        return "0s".to_string();
    }
    let mut out = String::new();
    if nanos < 0 {
        out.push('-');
    }
    let mut rest = nanos.unsigned_abs();
    if rest < 1_000_000_000 {
        let (unit, scale) = if rest < 1_000 {
            ("ns", 1)
        } else if rest < 1_000_000 {
            ("µs", 1_000)
        } else {
            ("ms", 1_000_000)
        };
        out.push_str(&fixed_point(rest, scale));
        out.push_str(unit);
        return out;
    }
    const HOUR: u64 = 3_600_000_000_000;
    const MINUTE: u64 = 60_000_000_000;
    let hours = rest / HOUR;
    rest %= HOUR;
    let minutes = rest / MINUTE;
    rest %= MINUTE;
    if hours > 0 {
        out.push_str(&format!("{}h", hours));
    }
    if hours > 0 || minutes > 0 {
        out.push_str(&format!("{}m", minutes));
    }
    out.push_str(&fixed_point(rest, 1_000_000_000));
    out.push('s');
    out
}

// `scale` is a power of ten.
fn fixed_point(v: u64, scale: u64) -> String {
    let whole = v / scale;
    let frac = v % scale;
    if frac == 0 {
        return whole.to_string();
    }
    let width = scale.to_string().len() - 1;
    let digits = format!("{:0width$}", frac, width = width);
    format!("{}.{}", whole, digits.trim_end_matches('0'))
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::String(s) => write!(f, "{}", s),
            Value::Int(i) => write!(f, "{}", i),
            Value::Uint(u) => write!(f, "{}", u),
            Value::Float(fl) => write!(f, "{}", fl),
            Value::DateTime(ns) => write!(f, "{}", format_datetime(*ns)),
            Value::Interval(ns) => write!(f, "{}", format_interval(*ns)),
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

impl From<i32> for Value {
    fn from(i: i32) -> Self {
        Value::Int(i as i64)
    }
}

impl From<u64> for Value {
    fn from(u: u64) -> Self {
        Value::Uint(u)
    }
}

impl From<f64> for Value {
    fn from(f: f64) -> Self {
        Value::Float(f)
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<DateTime<Utc>> for Value {
    fn from(dt: DateTime<Utc>) -> Self {
        // Out-of-range instants (beyond year 2262) clamp to the epoch bounds.
        Value::DateTime(dt.timestamp_nanos_opt().unwrap_or(if dt.timestamp() < 0 {
            i64::MIN
        } else {
            i64::MAX
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numeric_family_hashes_canonically() {
        assert_eq!(Value::Int(7).digest(), Value::Uint(7).digest());
        assert_eq!(Value::Int(7).digest(), Value::Float(7.0).digest());
        assert_eq!(Value::Float(0.0).digest(), Value::Float(-0.0).digest());
        assert_eq!(Value::Float(f64::NAN).digest(), Value::Float(-f64::NAN).digest());
        assert_ne!(Value::Int(7).digest(), Value::String("7".into()).digest());
        assert_ne!(Value::Float(7.5).digest(), Value::Int(7).digest());
    }

    #[test]
    fn datetime_parses_and_formats_rfc3339() {
        let v = Value::datetime_from_str("2024-03-01T12:30:00Z").unwrap();
        assert_eq!(v.to_string(), "2024-03-01T12:30:00Z");
        let same = Value::datetime_from_str("2024-03-01 12:30:00").unwrap();
        assert_eq!(v, same);
        let midnight = Value::datetime_from_str("2024-03-01").unwrap();
        assert_eq!(midnight.to_string(), "2024-03-01T00:00:00Z");
        assert!(Value::datetime_from_str("yesterday").is_err());
    }

    #[test]
    fn interval_formatting() {
        assert_eq!(Value::Interval(0).to_string(), "0s");
        assert_eq!(Value::Interval(1_500_000_000).to_string(), "1.5s");
        assert_eq!(Value::Interval(250_000_000).to_string(), "250ms");
        assert_eq!(Value::Interval(5_400 * NANOS_PER_SECOND).to_string(), "1h30m0s");
        assert_eq!(Value::Interval(-90 * NANOS_PER_SECOND).to_string(), "-1m30s");
        assert_eq!(Value::Interval(12_000).to_string(), "12µs");
    }

    #[test]
    fn json_mapping() {
        let j: serde_json::Value = serde_json::json!([1, 18446744073709551615u64, 1.5, "x", null, true]);
        let values: Vec<Value> = j.as_array().unwrap().iter().map(Value::from_json).collect();
        assert_eq!(
            values,
            vec![
                Value::Int(1),
                Value::Uint(u64::MAX),
                Value::Float(1.5),
                Value::from("x"),
                Value::Null,
                Value::Bool(true)
            ]
        );
        assert_eq!(Value::Float(f64::NAN).to_json(), serde_json::Value::Null);
    }

    #[test]
    fn text_form_escapes_strings() {
        assert_eq!(Value::from("a\"b").to_text(), "\"a\\\"b\"");
        assert_eq!(Value::Int(-3).to_text(), "-3");
        assert_eq!(Value::Null.to_text(), "null");
    }

    #[test]
    fn truthiness() {
        assert!(Value::from("yes").is_truthy());
        assert!(!Value::from("nope").is_truthy());
        assert!(!Value::Null.is_truthy());
        assert!(Value::Uint(2).is_truthy());
        assert!(!Value::Float(f64::NAN).is_truthy());
    }
}
