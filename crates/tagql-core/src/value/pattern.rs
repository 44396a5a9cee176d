//! LIKE, REGEXP and IN predicates.

use regex::Regex;

use super::{CompareOption, Value};
use crate::error::{Error, Result};

/// A LIKE pattern. Only a leading and/or trailing `%` is a wildcard; any
/// other character, including an inner `%`, matches literally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LikePattern {
    Exact(String),
    Prefix(String),
    Suffix(String),
    Contains(String),
}

impl LikePattern {
    pub fn parse(pattern: &str) -> LikePattern {
        let lead = pattern.starts_with('%');
        let trail = pattern.len() > 1 && pattern.ends_with('%');
        let start = if lead { 1 } else { 0 };
        let end = if trail { pattern.len() - 1 } else { pattern.len() };
        let body = pattern[start..end.max(start)].to_string();
        match (lead, trail) {
            (true, true) => LikePattern::Contains(body),
            (true, false) => LikePattern::Suffix(body),
            (false, true) => LikePattern::Prefix(body),
            (false, false) => LikePattern::Exact(body),
        }
    }

    pub fn matches_str(&self, s: &str) -> bool {
        match self {
            LikePattern::Exact(p) => s == p,
            LikePattern::Prefix(p) => s.starts_with(p.as_str()),
            LikePattern::Suffix(p) => s.ends_with(p.as_str()),
            LikePattern::Contains(p) => s.contains(p.as_str()),
        }
    }

    /// Null never matches; non-string operands are a type mismatch.
    pub fn matches(&self, v: &Value) -> Result<bool> {
        match v {
            Value::Null => Ok(false),
            Value::String(s) => Ok(self.matches_str(s)),
            other => Err(Error::TypeMismatch {
                op: "like",
                left: other.type_name(),
                right: "string",
            }),
        }
    }
}

/// A compiled REGEXP operand, built once per query rather than per row.
#[derive(Debug, Clone)]
pub struct RegexpMatcher {
    re: Regex,
}

impl RegexpMatcher {
    pub fn new(pattern: &str) -> Result<Self> {
        Ok(Self {
            re: Regex::new(pattern)?,
        })
    }

    pub fn as_str(&self) -> &str {
        self.re.as_str()
    }

    pub fn matches(&self, v: &Value) -> Result<bool> {
        match v {
            Value::Null => Ok(false),
            Value::String(s) => Ok(self.re.is_match(s)),
            other => Err(Error::TypeMismatch {
                op: "regexp",
                left: other.type_name(),
                right: "string",
            }),
        }
    }
}

fn pattern_text<'a>(op: &'static str, v: &Value, pattern: &'a Value) -> Result<Option<&'a str>> {
    match pattern {
        Value::Null => Ok(None),
        Value::String(p) => Ok(Some(p)),
        other => Err(Error::TypeMismatch {
            op,
            left: v.type_name(),
            right: other.type_name(),
        }),
    }
}

impl Value {
    pub fn like(&self, pattern: &Value) -> Result<bool> {
        match pattern_text("like", self, pattern)? {
            Some(p) => LikePattern::parse(p).matches(self),
            None => Ok(false),
        }
    }

    /// Compiles `pattern` on every call; use [`RegexpMatcher`] in loops.
    pub fn regexp(&self, pattern: &Value) -> Result<bool> {
        match pattern_text("regexp", self, pattern)? {
            Some(p) => RegexpMatcher::new(p)?.matches(self),
            None => Ok(false),
        }
    }

    /// True at the first element equal to `self`.
    pub fn in_list(&self, values: &[Value], opt: CompareOption) -> Result<bool> {
        for v in values {
            if self.equals(v, opt)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// False at the first element equal to `self`.
    pub fn not_in_list(&self, values: &[Value], opt: CompareOption) -> Result<bool> {
        for v in values {
            if self.equals(v, opt)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}
