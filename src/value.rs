//! Dynamic value helpers shared across the engine.
//!
//! Keys and values flowing through a pipeline are [`serde_json::Value`]s:
//! any scalar, array, or object can occupy either slot. This module provides
//! the two primitives the engine needs on top of that representation:
//!
//! - [`default_compare`] -- a total ordering over arbitrary values, used by
//!   the sort family whenever no custom comparator is injected.
//! - [`signature`] -- a canonical string form used by set-membership
//!   trackers (uniqueness, fork labels) as a hashable stand-in for values
//!   that don't implement `Hash` themselves.

use ordered_float::OrderedFloat;
use serde_json::Value;
use std::cmp::Ordering;

/// Rank used to order values of different JSON types against each other.
/// Null sorts first, objects last; within a type the natural order applies.
fn type_rank(v: &Value) -> u8 {
    match v {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total ordering over two dynamic values.
///
/// Numbers compare numerically (via `ordered-float`, so NaN is ordered
/// rather than poisoning the sort), strings lexicographically, booleans
/// false-before-true, arrays element-wise then by length. Values of
/// different types order by [`type_rank`]. Objects compare by their
/// serialized form; they are legal but rarely meaningful sort keys.
#[must_use]
pub fn default_compare(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => {
            let x = OrderedFloat(x.as_f64().unwrap_or(f64::NAN));
            let y = OrderedFloat(y.as_f64().unwrap_or(f64::NAN));
            x.cmp(&y)
        }
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (xa, ya) in x.iter().zip(y.iter()) {
                let ord = default_compare(xa, ya);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Object(_), Value::Object(_)) => signature(a).cmp(&signature(b)),
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

/// Canonical string signature of a value.
///
/// Two values have equal signatures iff their JSON serializations are equal,
/// which is the equality notion the uniqueness trackers and fork label maps
/// are built on. Serializing a `Value` cannot fail.
#[must_use]
pub fn signature(v: &Value) -> String {
    serde_json::to_string(v).expect("value serialization")
}

/// Combined signature of a (key, value) pair. The separator byte cannot
/// occur in JSON output, so distinct pairs cannot collide.
#[must_use]
pub fn pair_signature(key: &Value, value: &Value) -> String {
    format!("{}\u{1}{}", signature(key), signature(value))
}

/// True when the value is an integer number (no fractional part).
#[must_use]
pub fn is_int(v: &Value) -> bool {
    match v {
        Value::Number(n) => n.is_i64() || n.is_u64(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn orders_across_types_by_rank() {
        assert_eq!(default_compare(&json!(null), &json!(0)), Ordering::Less);
        assert_eq!(default_compare(&json!(1), &json!("a")), Ordering::Less);
        assert_eq!(default_compare(&json!("z"), &json!([0])), Ordering::Less);
    }

    #[test]
    fn numbers_compare_numerically() {
        assert_eq!(default_compare(&json!(2), &json!(10)), Ordering::Less);
        assert_eq!(default_compare(&json!(2.5), &json!(2)), Ordering::Greater);
    }

    #[test]
    fn signatures_distinguish_types() {
        assert_ne!(signature(&json!(1)), signature(&json!("1")));
        assert_eq!(signature(&json!([1, 2])), signature(&json!([1, 2])));
    }
}
