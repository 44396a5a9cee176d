//! Ordering and equality across value tags.
//!
//! Dispatch is on the right-hand tag first, then the left-hand tag:
//!
//! | right \ left | null | bool | string | number | datetime | interval |
//! |--------------|------|------|--------|--------|----------|----------|
//! | null         | =    | >    | >      | >      | >        | >        |
//! | bool         | <    | S    | W      | W      | x        | x        |
//! | string       | <    | W    | S      | W      | W        | x        |
//! | number       | <    | W    | W      | S      | x        | x        |
//! | datetime     | <    | x    | W      | x      | S        | x        |
//! | interval     | <    | x    | x      | x      | x        | S        |
//!
//! `S` is legal under both policies, `W` only under [`CompareOption::Weak`],
//! `x` is always a type mismatch. "number" is int64, uint64 and float64,
//! compared exactly against each other.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::{parse_datetime_nanos, Value};
use crate::error::{Error, Result};

/// Comparison policy threaded through every predicate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompareOption {
    /// Tags must already be compatible.
    #[default]
    Strict,
    /// Allow the defined string/bool/number/datetime coercions.
    Weak,
}

impl CompareOption {
    pub fn is_weak(self) -> bool {
        matches!(self, CompareOption::Weak)
    }
}

#[derive(Debug, Clone, Copy)]
enum Num {
    I(i128),
    F(f64),
}

impl Value {
    /// Three-way comparison under `opt`. Null sorts before everything.
    pub fn compare(&self, other: &Value, opt: CompareOption) -> Result<Ordering> {
        let weak = opt.is_weak();
        match other {
            Value::Null => Ok(if self.is_null() {
                Ordering::Equal
            } else {
                Ordering::Greater
            }),
            _ if self.is_null() => Ok(Ordering::Less),

            Value::Bool(r) => match self {
                Value::Bool(l) => Ok(l.cmp(r)),
                Value::String(l) if weak => Ok(weak_bool(l, other)?.cmp(r)),
                l if weak && l.is_numeric() => Ok(cmp_num(num_of(l), Num::I(*r as i128))),
                l => Err(mismatch(l, other)),
            },

            Value::String(r) => match self {
                Value::String(l) => Ok(l.as_bytes().cmp(r.as_bytes())),
                Value::Bool(l) if weak => Ok(l.cmp(&weak_bool(r, self)?)),
                l if weak && l.is_numeric() => Ok(cmp_num(num_of(l), weak_number(r, self)?)),
                Value::DateTime(l) if weak => Ok(l.cmp(&weak_datetime(r, self)?)),
                l => Err(mismatch(l, other)),
            },

            Value::Int(_) | Value::Uint(_) | Value::Float(_) => match self {
                l if l.is_numeric() => Ok(cmp_num(num_of(l), num_of(other))),
                Value::String(l) if weak => Ok(cmp_num(weak_number(l, other)?, num_of(other))),
                Value::Bool(l) if weak => Ok(cmp_num(Num::I(*l as i128), num_of(other))),
                l => Err(mismatch(l, other)),
            },

            Value::DateTime(r) => match self {
                Value::DateTime(l) => Ok(l.cmp(r)),
                Value::String(l) if weak => Ok(weak_datetime(l, other)?.cmp(r)),
                l => Err(mismatch(l, other)),
            },

            Value::Interval(r) => match self {
                Value::Interval(l) => Ok(l.cmp(r)),
                l => Err(mismatch(l, other)),
            },
        }
    }

    /// `compare` as `-1`, `0` or `1`.
    pub fn compare_i(&self, other: &Value, opt: CompareOption) -> Result<i32> {
        Ok(match self.compare(other, opt)? {
            Ordering::Less => -1,
            Ordering::Equal => 0,
            Ordering::Greater => 1,
        })
    }

    /// Equality under `opt`. Null equals only null and never errors.
    pub fn equals(&self, other: &Value, opt: CompareOption) -> Result<bool> {
        match (self, other) {
            (Value::Null, Value::Null) => Ok(true),
            (Value::Null, _) | (_, Value::Null) => Ok(false),
            _ => Ok(self.compare(other, opt)? == Ordering::Equal),
        }
    }
}

fn mismatch(left: &Value, right: &Value) -> Error {
    Error::TypeMismatch {
        op: "compare",
        left: left.type_name(),
        right: right.type_name(),
    }
}

fn num_of(v: &Value) -> Num {
    match v {
        Value::Int(i) => Num::I(*i as i128),
        Value::Uint(u) => Num::I(*u as i128),
        Value::Float(f) => Num::F(*f),
        _ => Num::F(f64::NAN),
    }
}

fn cmp_num(a: Num, b: Num) -> Ordering {
    match (a, b) {
        (Num::I(x), Num::I(y)) => x.cmp(&y),
        (Num::I(x), Num::F(y)) => cmp_int_float(x, y),
        (Num::F(x), Num::I(y)) => cmp_int_float(y, x).reverse(),
        (Num::F(x), Num::F(y)) => cmp_float(x, y),
    }
}

// NaN sorts after every number and equals itself.
fn cmp_float(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
    }
}

fn cmp_int_float(i: i128, f: f64) -> Ordering {
    if f.is_nan() {
        return Ordering::Less;
    }
    let t = f.trunc();
    if t.abs() >= 1.0e38 {
        return if f > 0.0 {
            Ordering::Less
        } else {
            Ordering::Greater
        };
    }
    match i.cmp(&(t as i128)) {
        Ordering::Equal if f > t => Ordering::Less,
        Ordering::Equal if f < t => Ordering::Greater,
        other => other,
    }
}

/// "256.00" -> "256"; anything else unchanged.
fn strip_zero_fraction(s: &str) -> &str {
    match s.split_once('.') {
        Some((int, frac))
            if !int.is_empty() && !frac.is_empty() && frac.bytes().all(|b| b == b'0') =>
        {
            int
        }
        _ => s,
    }
}

fn parse_weak_number(s: &str) -> Option<Num> {
    let t = s.trim();
    let int_text = strip_zero_fraction(t);
    if let Ok(i) = int_text.parse::<i64>() {
        return Some(Num::I(i as i128));
    }
    if let Ok(u) = int_text.parse::<u64>() {
        return Some(Num::I(u as i128));
    }
    t.parse::<f64>().ok().map(Num::F)
}

pub(crate) fn parse_weak_bool(s: &str) -> Option<bool> {
    match s.trim().to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" | "y" | "1" => Some(true),
        "false" | "f" | "no" | "n" | "0" => Some(false),
        _ => None,
    }
}

fn weak_number(s: &str, against: &Value) -> Result<Num> {
    parse_weak_number(s).ok_or_else(|| {
        Error::Compare(format!(
            "cannot convert string '{}' to compare with {}",
            s,
            against.type_name()
        ))
    })
}

fn weak_bool(s: &str, against: &Value) -> Result<bool> {
    parse_weak_bool(s).ok_or_else(|| {
        Error::Compare(format!(
            "cannot convert string '{}' to compare with {}",
            s,
            against.type_name()
        ))
    })
}

fn weak_datetime(s: &str, against: &Value) -> Result<i64> {
    parse_datetime_nanos(s).ok_or_else(|| {
        Error::Compare(format!(
            "cannot convert string '{}' to compare with {}",
            s,
            against.type_name()
        ))
    })
}
