//! Arithmetic over numeric, datetime and interval values.
//!
//! String, bool and null operands are never coerced; they always produce
//! `could not <op> <ltype> <symbol> <rtype>`.

use super::Value;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Plus,
    Minus,
    Mult,
    Div,
    IntDiv,
    Mod,
}

impl Op {
    fn name(self) -> &'static str {
        match self {
            Op::Plus => "plus",
            Op::Minus => "minus",
            Op::Mult => "mult",
            Op::Div => "div",
            Op::IntDiv => "intDiv",
            Op::Mod => "mod",
        }
    }

    fn symbol(self) -> &'static str {
        match self {
            Op::Plus => "+",
            Op::Minus => "-",
            Op::Mult => "*",
            Op::Div => "/",
            Op::IntDiv => "DIV",
            Op::Mod => "%",
        }
    }
}

impl Value {
    pub fn plus(&self, other: &Value) -> Result<Value> {
        binary(Op::Plus, self, other)
    }

    pub fn minus(&self, other: &Value) -> Result<Value> {
        binary(Op::Minus, self, other)
    }

    pub fn mult(&self, other: &Value) -> Result<Value> {
        binary(Op::Mult, self, other)
    }

    /// True division; integer operands produce a float.
    pub fn div(&self, other: &Value) -> Result<Value> {
        binary(Op::Div, self, other)
    }

    /// Truncating division producing an integer where representable.
    pub fn int_div(&self, other: &Value) -> Result<Value> {
        binary(Op::IntDiv, self, other)
    }

    pub fn modulo(&self, other: &Value) -> Result<Value> {
        binary(Op::Mod, self, other)
    }

    pub fn uminus(&self) -> Result<Value> {
        match self {
            Value::Int(i) => narrow(-(*i as i128), false, "uminus"),
            Value::Uint(u) => narrow(-(*u as i128), false, "uminus"),
            Value::Float(f) => Ok(Value::Float(-f)),
            Value::Interval(d) => d
                .checked_neg()
                .map(Value::Interval)
                .ok_or_else(|| Error::Overflow("uminus interval".into())),
            other => Err(Error::UnaryOperation {
                op: "uminus",
                operand: other.type_name(),
            }),
        }
    }
}

fn fail(op: Op, l: &Value, r: &Value) -> Error {
    Error::Operation {
        op: op.name(),
        symbol: op.symbol(),
        left: l.type_name(),
        right: r.type_name(),
    }
}

fn overflow(op: Op, l: &Value, r: &Value) -> Error {
    Error::Overflow(format!("{} {} {}", l, op.symbol(), r))
}

/// Fit an exact integer result back into int64, else uint64.
fn narrow(v: i128, prefer_unsigned: bool, what: &str) -> Result<Value> {
    if prefer_unsigned && v >= 0 {
        if let Ok(u) = u64::try_from(v) {
            return Ok(Value::Uint(u));
        }
    }
    if let Ok(i) = i64::try_from(v) {
        return Ok(Value::Int(i));
    }
    if let Ok(u) = u64::try_from(v) {
        return Ok(Value::Uint(u));
    }
    Err(Error::Overflow(format!("{} result {}", what, v)))
}

fn integer(v: &Value) -> Option<i128> {
    match v {
        Value::Int(i) => Some(*i as i128),
        Value::Uint(u) => Some(*u as i128),
        _ => None,
    }
}

fn binary(op: Op, l: &Value, r: &Value) -> Result<Value> {
    match r {
        Value::Int(_) | Value::Uint(_) | Value::Float(_) => match l {
            Value::Int(_) | Value::Uint(_) | Value::Float(_) => numeric(op, l, r),
            Value::Interval(d) => interval_by_number(op, *d, l, r),
            _ => Err(fail(op, l, r)),
        },
        Value::Interval(rd) => match l {
            Value::DateTime(t) => {
                let shifted = match op {
                    Op::Plus => t.checked_add(*rd),
                    Op::Minus => t.checked_sub(*rd),
                    _ => return Err(fail(op, l, r)),
                };
                shifted
                    .map(Value::DateTime)
                    .ok_or_else(|| overflow(op, l, r))
            }
            Value::Interval(ld) => interval_by_interval(op, *ld, *rd, l, r),
            Value::Int(_) | Value::Uint(_) | Value::Float(_) if op == Op::Mult => {
                interval_by_number(op, *rd, r, l)
            }
            _ => Err(fail(op, l, r)),
        },
        Value::DateTime(rt) => match l {
            Value::Interval(d) if op == Op::Plus => d
                .checked_add(*rt)
                .map(Value::DateTime)
                .ok_or_else(|| overflow(op, l, r)),
            Value::DateTime(lt) if op == Op::Minus => lt
                .checked_sub(*rt)
                .map(Value::Interval)
                .ok_or_else(|| overflow(op, l, r)),
            _ => Err(fail(op, l, r)),
        },
        Value::Null | Value::Bool(_) | Value::String(_) => Err(fail(op, l, r)),
    }
}

fn numeric(op: Op, l: &Value, r: &Value) -> Result<Value> {
    if let (Some(a), Some(b)) = (integer(l), integer(r)) {
        let both_unsigned = matches!((l, r), (Value::Uint(_), Value::Uint(_)));
        let exact = match op {
            Op::Plus => a + b,
            Op::Minus => a - b,
            Op::Mult => a.checked_mul(b).ok_or_else(|| overflow(op, l, r))?,
            Op::Div => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                return Ok(Value::Float(a as f64 / b as f64));
            }
            Op::IntDiv => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                a / b
            }
            Op::Mod => {
                if b == 0 {
                    return Err(Error::DivisionByZero);
                }
                a % b
            }
        };
        return narrow(exact, both_unsigned, op.name());
    }

    let (a, b) = match (l.as_float(), r.as_float()) {
        (Some(a), Some(b)) => (a, b),
        _ => return Err(fail(op, l, r)),
    };
    match op {
        Op::Plus => Ok(Value::Float(a + b)),
        Op::Minus => Ok(Value::Float(a - b)),
        Op::Mult => Ok(Value::Float(a * b)),
        Op::Div | Op::IntDiv | Op::Mod if b == 0.0 => Err(Error::DivisionByZero),
        Op::Div => Ok(Value::Float(a / b)),
        Op::IntDiv => {
            let q = (a / b).trunc();
            if q.is_finite() && q.abs() < 9.2e18 {
                Ok(Value::Int(q as i64))
            } else {
                Ok(Value::Float(q))
            }
        }
        Op::Mod => Ok(Value::Float(a % b)),
    }
}

/// `interval <op> number`; `iv_value` is the interval operand as written.
fn interval_by_number(op: Op, d: i64, iv_value: &Value, n: &Value) -> Result<Value> {
    let scaled = match (op, integer(n), n.as_float()) {
        (Op::Mult, Some(k), _) => (d as i128).checked_mul(k),
        (Op::Div | Op::IntDiv, Some(0), _) => return Err(Error::DivisionByZero),
        (Op::Div | Op::IntDiv, Some(k), _) => Some(d as i128 / k),
        (Op::Mult, None, Some(f)) => float_nanos((d as f64 * f).round()),
        (Op::Div | Op::IntDiv, None, Some(f)) if f == 0.0 => return Err(Error::DivisionByZero),
        (Op::Div, None, Some(f)) => float_nanos((d as f64 / f).round()),
        (Op::IntDiv, None, Some(f)) => float_nanos((d as f64 / f).trunc()),
        _ => return Err(fail(op, iv_value, n)),
    };
    scaled
        .and_then(|v| i64::try_from(v).ok())
        .map(Value::Interval)
        .ok_or_else(|| overflow(op, iv_value, n))
}

/// `f` is already an integral nanosecond count.
fn float_nanos(f: f64) -> Option<i128> {
    if f.is_finite() && f.abs() < 9.2e18 {
        Some(f as i128)
    } else {
        None
    }
}

fn interval_by_interval(op: Op, a: i64, b: i64, l: &Value, r: &Value) -> Result<Value> {
    let out = match op {
        Op::Plus => a.checked_add(b).map(Value::Interval),
        Op::Minus => a.checked_sub(b).map(Value::Interval),
        Op::Div | Op::IntDiv | Op::Mod if b == 0 => return Err(Error::DivisionByZero),
        Op::Div => Some(Value::Float(a as f64 / b as f64)),
        Op::IntDiv => a.checked_div(b).map(Value::Int),
        Op::Mod => a.checked_rem(b).map(Value::Interval),
        Op::Mult => return Err(fail(op, l, r)),
    };
    out.ok_or_else(|| overflow(op, l, r))
}
