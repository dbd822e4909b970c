//! Strategy interfaces consumed at the pipeline boundary.
//!
//! These are the narrow contracts the engine sees: predicates, mappers,
//! discriminators, comparators, reducers and consumers. Each has a blanket
//! impl for plain closures so the fluent façade accepts `|v| ...` directly,
//! and every fallible method returns `anyhow::Result` so user failures can
//! be routed through the stream's error-handler chain.

use crate::value::default_compare;
use anyhow::{Result, bail};
use serde_json::Value;
use std::cmp::Ordering;

/* ===================== Predicate ===================== */

/// A single-slot boolean test. Which slot(s) it is applied to is decided by
/// the [`Mode`](crate::Mode) helper, not by the predicate itself.
pub trait Predicate {
    fn test(&self, v: &Value) -> Result<bool>;
}

impl<F> Predicate for F
where
    F: Fn(&Value) -> bool,
{
    fn test(&self, v: &Value) -> Result<bool> {
        Ok(self(v))
    }
}

/// Adapter for predicates that can themselves fail.
pub struct TryPredicate<F>(pub F);

impl<F> Predicate for TryPredicate<F>
where
    F: Fn(&Value) -> Result<bool>,
{
    fn test(&self, v: &Value) -> Result<bool> {
        (self.0)(v)
    }
}

/* ===================== Mapper ===================== */

/// Transforms a value, with the key available for context.
pub trait Mapper {
    fn map(&self, value: &Value, key: &Value) -> Result<Value>;
}

impl<F> Mapper for F
where
    F: Fn(&Value, &Value) -> Value,
{
    fn map(&self, value: &Value, key: &Value) -> Result<Value> {
        Ok(self(value, key))
    }
}

/// Adapter for mappers that can fail.
pub struct TryMapper<F>(pub F);

impl<F> Mapper for TryMapper<F>
where
    F: Fn(&Value, &Value) -> Result<Value>,
{
    fn map(&self, value: &Value, key: &Value) -> Result<Value> {
        (self.0)(value, key)
    }
}

/* ===================== Discriminator ===================== */

/// Classifies a (value, key) pair into a label used for forking/grouping.
/// Labels are ordinary values; equal signatures mean the same branch.
pub trait Discriminator {
    fn classify(&self, value: &Value, key: &Value) -> Result<Value>;
}

impl<F> Discriminator for F
where
    F: Fn(&Value, &Value) -> Value,
{
    fn classify(&self, value: &Value, key: &Value) -> Result<Value> {
        Ok(self(value, key))
    }
}

/* ===================== Comparator ===================== */

/// A total ordering over values, with an optional key-aware form.
pub trait Comparator {
    fn compare(&self, a: &Value, b: &Value) -> Ordering;

    /// Combined value/key comparison. Comparators that only order values
    /// keep the default, which reports the missing capability as an error
    /// when an operation actually requires the assoc form.
    fn compare_assoc(&self, _v1: &Value, _v2: &Value, _k1: &Value, _k2: &Value) -> Result<Ordering> {
        bail!("comparator does not support key-aware comparison")
    }
}

/// The built-in ordering (type rank, then natural order per type).
#[derive(Default)]
pub struct DefaultComparator;

impl Comparator for DefaultComparator {
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        default_compare(a, b)
    }

    fn compare_assoc(&self, v1: &Value, v2: &Value, k1: &Value, k2: &Value) -> Result<Ordering> {
        Ok(default_compare(v1, v2).then(default_compare(k1, k2)))
    }
}

/// Closure comparator over values.
pub struct FnComparator<F>(pub F);

impl<F> Comparator for FnComparator<F>
where
    F: Fn(&Value, &Value) -> Ordering,
{
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.0)(a, b)
    }
}

/// Closure comparator with the 4-argument (v1, v2, k1, k2) form.
pub struct AssocFnComparator<F>(pub F);

impl<F> Comparator for AssocFnComparator<F>
where
    F: Fn(&Value, &Value, &Value, &Value) -> Ordering,
{
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        (self.0)(a, b, &Value::Null, &Value::Null)
    }

    fn compare_assoc(&self, v1: &Value, v2: &Value, k1: &Value, k2: &Value) -> Result<Ordering> {
        Ok((self.0)(v1, v2, k1, k2))
    }
}

/// Flips another comparator. Used by the rewrite engine to turn "sort then
/// take the tail" into a bounded reverse-sort without touching user code.
pub struct Reversed(pub Box<dyn Comparator>);

impl Comparator for Reversed {
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        self.0.compare(b, a)
    }

    fn compare_assoc(&self, v1: &Value, v2: &Value, k1: &Value, k2: &Value) -> Result<Ordering> {
        self.0.compare_assoc(v2, v1, k2, k1)
    }
}

/* ===================== Reducer ===================== */

/// A resettable running fold over values.
pub trait Reducer {
    fn consume(&mut self, value: &Value) -> Result<()>;
    fn has_result(&self) -> bool;
    fn result(&self) -> Value;
    fn reset(&mut self);
}

/// Numeric sum. Integers stay integral until a float is consumed.
#[derive(Default)]
pub struct Sum {
    int: i64,
    float: f64,
    any_float: bool,
    seen: bool,
}

impl Reducer for Sum {
    fn consume(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Number(n) if n.is_i64() => self.int += n.as_i64().expect("i64 number"),
            Value::Number(n) => {
                self.float += n.as_f64().unwrap_or(0.0);
                self.any_float = true;
            }
            other => bail!("cannot sum non-numeric value {other}"),
        }
        self.seen = true;
        Ok(())
    }

    fn has_result(&self) -> bool {
        self.seen
    }

    fn result(&self) -> Value {
        if self.any_float {
            Value::from(self.float + self.int as f64)
        } else {
            Value::from(self.int)
        }
    }

    fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Counts consumed values.
#[derive(Default)]
pub struct Count(u64);

impl Reducer for Count {
    fn consume(&mut self, _value: &Value) -> Result<()> {
        self.0 += 1;
        Ok(())
    }

    fn has_result(&self) -> bool {
        true
    }

    fn result(&self) -> Value {
        Value::from(self.0)
    }

    fn reset(&mut self) {
        self.0 = 0;
    }
}

/// Running minimum / maximum under the default ordering.
pub struct Extreme {
    best: Option<Value>,
    keep_max: bool,
}

impl Extreme {
    #[must_use]
    pub fn min() -> Self {
        Self { best: None, keep_max: false }
    }

    #[must_use]
    pub fn max() -> Self {
        Self { best: None, keep_max: true }
    }
}

impl Reducer for Extreme {
    fn consume(&mut self, value: &Value) -> Result<()> {
        let better = match &self.best {
            None => true,
            Some(b) => {
                let ord = default_compare(value, b);
                if self.keep_max { ord == Ordering::Greater } else { ord == Ordering::Less }
            }
        };
        if better {
            self.best = Some(value.clone());
        }
        Ok(())
    }

    fn has_result(&self) -> bool {
        self.best.is_some()
    }

    fn result(&self) -> Value {
        self.best.clone().unwrap_or(Value::Null)
    }

    fn reset(&mut self) {
        self.best = None;
    }
}

/// Joins string renderings of values with a separator.
pub struct JoinStrings {
    sep: String,
    parts: Vec<String>,
}

impl JoinStrings {
    #[must_use]
    pub fn new(sep: impl Into<String>) -> Self {
        Self { sep: sep.into(), parts: Vec::new() }
    }
}

impl Reducer for JoinStrings {
    fn consume(&mut self, value: &Value) -> Result<()> {
        let part = match value {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        self.parts.push(part);
        Ok(())
    }

    fn has_result(&self) -> bool {
        !self.parts.is_empty()
    }

    fn result(&self) -> Value {
        Value::from(self.parts.join(&self.sep))
    }

    fn reset(&mut self) {
        self.parts.clear();
    }
}

/* ===================== Consumer ===================== */

/// A side-effecting sink invoked once per item; no return value.
pub trait Consumer {
    fn consume(&mut self, value: &Value, key: &Value) -> Result<()>;
}

impl<F> Consumer for F
where
    F: FnMut(&Value, &Value),
{
    fn consume(&mut self, value: &Value, key: &Value) -> Result<()> {
        self(value, key);
        Ok(())
    }
}

/// Adapter for consumers that can fail.
pub struct TryConsumer<F>(pub F);

impl<F> Consumer for TryConsumer<F>
where
    F: FnMut(&Value, &Value) -> Result<()>,
{
    fn consume(&mut self, value: &Value, key: &Value) -> Result<()> {
        (self.0)(value, key)
    }
}
