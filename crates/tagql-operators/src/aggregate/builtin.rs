//! COUNT, SUM, AVG, MIN and MAX. All skip null inputs; over no input COUNT
//! is 0 and the others are null.

use std::cmp::Ordering;

use tagql_core::{CompareOption, Context, Error, Record, Result, Value};

use crate::expr::ValueReader;

use super::Aggregator;

pub struct Count {
    arg: ValueReader,
    n: i64,
}

impl Count {
    pub fn new(arg: ValueReader) -> Self {
        Self { arg, n: 0 }
    }
}

impl Aggregator for Count {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()> {
        if !(self.arg)(ctx, record)?.is_null() {
            self.n += 1;
        }
        Ok(())
    }

    fn result(&self) -> Result<Value> {
        Ok(Value::Int(self.n))
    }
}

/// Running total for `op`. The first value seeds it and must be numeric
/// or an interval; later values go through `plus`.
fn add(op: &'static str, total: Option<Value>, v: Value) -> Result<Value> {
    match total {
        Some(t) => t.plus(&v),
        None => match v {
            Value::Int(_) | Value::Uint(_) | Value::Float(_) | Value::Interval(_) => Ok(v),
            other => Err(Error::UnaryOperation {
                op,
                operand: other.type_name(),
            }),
        },
    }
}

pub struct Sum {
    arg: ValueReader,
    total: Option<Value>,
}

impl Sum {
    pub fn new(arg: ValueReader) -> Self {
        Self { arg, total: None }
    }
}

impl Aggregator for Sum {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()> {
        let v = (self.arg)(ctx, record)?;
        if !v.is_null() {
            self.total = Some(add("sum", self.total.take(), v)?);
        }
        Ok(())
    }

    fn result(&self) -> Result<Value> {
        Ok(self.total.clone().unwrap_or(Value::Null))
    }
}

pub struct Avg {
    arg: ValueReader,
    total: Option<Value>,
    n: i64,
}

impl Avg {
    pub fn new(arg: ValueReader) -> Self {
        Self {
            arg,
            total: None,
            n: 0,
        }
    }
}

impl Aggregator for Avg {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()> {
        let v = (self.arg)(ctx, record)?;
        if !v.is_null() {
            self.total = Some(add("avg", self.total.take(), v)?);
            self.n += 1;
        }
        Ok(())
    }

    fn result(&self) -> Result<Value> {
        match &self.total {
            Some(total) => total.div(&Value::Int(self.n)),
            None => Ok(Value::Null),
        }
    }
}

/// Keeps the value that compares as `keep` against every other.
struct Extreme {
    arg: ValueReader,
    best: Option<Value>,
    keep: Ordering,
}

impl Extreme {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()> {
        let v = (self.arg)(ctx, record)?;
        if v.is_null() {
            return Ok(());
        }
        let replace = match &self.best {
            Some(b) => v.compare(b, CompareOption::Strict)? == self.keep,
            None => true,
        };
        if replace {
            self.best = Some(v);
        }
        Ok(())
    }
}

pub struct Min(Extreme);

impl Min {
    pub fn new(arg: ValueReader) -> Self {
        Min(Extreme {
            arg,
            best: None,
            keep: Ordering::Less,
        })
    }
}

impl Aggregator for Min {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()> {
        self.0.accumulate(ctx, record)
    }

    fn result(&self) -> Result<Value> {
        Ok(self.0.best.clone().unwrap_or(Value::Null))
    }
}

pub struct Max(Extreme);

impl Max {
    pub fn new(arg: ValueReader) -> Self {
        Max(Extreme {
            arg,
            best: None,
            keep: Ordering::Greater,
        })
    }
}

impl Aggregator for Max {
    fn accumulate(&mut self, ctx: &Context, record: &Record) -> Result<()> {
        self.0.accumulate(ctx, record)
    }

    fn result(&self) -> Result<Value> {
        Ok(self.0.best.clone().unwrap_or(Value::Null))
    }
}
