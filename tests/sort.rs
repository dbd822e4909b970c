use weir::testing::*;
use weir::{FnComparator, Value, json, of};

#[test]
fn sort_orders_values_ascending() -> anyhow::Result<()> {
    let out = of(vec![5, 1, 4, 2, 3]).sort().to_values()?;
    assert_values_equal(&out, &[json!(1), json!(2), json!(3), json!(4), json!(5)]);
    Ok(())
}

#[test]
fn sort_keeps_pairs_together() -> anyhow::Result<()> {
    let pairs = of(vec!["c", "a", "b"]).sort().to_pairs()?;
    assert_eq!(
        pairs,
        vec![
            (json!(1), json!("a")),
            (json!(2), json!("b")),
            (json!(0), json!("c")),
        ]
    );
    Ok(())
}

#[test]
fn sort_mixed_types_orders_by_type_rank() -> anyhow::Result<()> {
    let out = of(vec![json!("b"), json!(2), json!(null), json!(1), json!("a")])
        .sort()
        .to_values()?;
    assert_values_equal(
        &out,
        &[json!(null), json!(1), json!(2), json!("a"), json!("b")],
    );
    Ok(())
}

#[test]
fn sort_by_custom_comparator() -> anyhow::Result<()> {
    let descending = FnComparator(|a: &Value, b: &Value| {
        b.as_i64().unwrap().cmp(&a.as_i64().unwrap())
    });
    let out = of(vec![2, 9, 5]).sort_by(descending).to_values()?;
    assert_values_equal(&out, &[json!(9), json!(5), json!(2)]);
    Ok(())
}

#[test]
fn sort_keys_orders_by_key_slot() -> anyhow::Result<()> {
    let pairs = weir::from_pairs(vec![
        (json!("z"), json!(1)),
        (json!("a"), json!(2)),
        (json!("m"), json!(3)),
    ])
    .sort_keys()
    .to_pairs()?;
    assert_eq!(
        pairs,
        vec![
            (json!("a"), json!(2)),
            (json!("m"), json!(3)),
            (json!("z"), json!(1)),
        ]
    );
    Ok(())
}

#[test]
fn sort_is_stable_for_equal_values() -> anyhow::Result<()> {
    let pairs = weir::from_pairs(vec![
        (json!("first"), json!(1)),
        (json!("second"), json!(1)),
        (json!("third"), json!(0)),
    ])
    .sort()
    .to_pairs()?;
    assert_eq!(
        pairs,
        vec![
            (json!("third"), json!(0)),
            (json!("first"), json!(1)),
            (json!("second"), json!(1)),
        ]
    );
    Ok(())
}

/* ---------- bounded top-K ---------- */

#[test]
fn sort_limited_full_input_when_under_capacity() -> anyhow::Result<()> {
    let out = of(vec![3, 1, 2]).sort_limited(10).to_values()?;
    assert_values_equal(&out, &[json!(1), json!(2), json!(3)]);
    Ok(())
}

#[test]
fn sort_limited_keeps_exactly_k_smallest_in_order() -> anyhow::Result<()> {
    let input: Vec<i64> = vec![17, 3, 99, 3, 42, 8, 1, 56, 8, 23];
    let out = of(input).sort_limited(4).to_values()?;
    assert_values_equal(&out, &[json!(1), json!(3), json!(3), json!(8)]);
    Ok(())
}

#[test]
fn sort_limited_memory_stays_bounded_over_long_streams() -> anyhow::Result<()> {
    let out = weir::int_range(10_000, Some(1), -1).sort_limited(3).to_values()?;
    assert_values_equal(&out, &[json!(1), json!(2), json!(3)]);
    Ok(())
}

#[test]
fn sort_limited_on_empty_input() -> anyhow::Result<()> {
    let out = of(Vec::<i64>::new()).sort_limited(5).to_values()?;
    assert!(out.is_empty());
    Ok(())
}

#[test]
#[should_panic(expected = "capacity must be positive")]
fn sort_limited_zero_capacity_panics() {
    let _ = of(vec![1]).sort_limited(0);
}

/* ---------- reverse / shuffle / tail ---------- */

#[test]
fn reverse_replays_backwards() -> anyhow::Result<()> {
    let out = of(vec![1, 2, 3]).reverse().to_values()?;
    assert_values_equal(&out, &[json!(3), json!(2), json!(1)]);
    Ok(())
}

#[test]
fn shuffle_preserves_the_multiset() -> anyhow::Result<()> {
    let input: Vec<i64> = (0..50).collect();
    let out = of(input.clone()).shuffle().to_values()?;
    let expected: Vec<Value> = input.into_iter().map(Value::from).collect();
    assert_values_unordered_equal(&out, &expected);
    Ok(())
}

#[test]
fn tail_keeps_the_last_n_in_order() -> anyhow::Result<()> {
    let out = of(vec![1, 2, 3, 4, 5]).tail(2).to_values()?;
    assert_values_equal(&out, &[json!(4), json!(5)]);

    let short = of(vec![1]).tail(3).to_values()?;
    assert_values_equal(&short, &[json!(1)]);
    Ok(())
}

#[test]
#[should_panic(expected = "tail length must be positive")]
fn tail_zero_panics() {
    let _ = of(vec![1]).tail(0);
}

#[test]
fn ordering_ops_after_a_lazy_limit_still_flush() -> anyhow::Result<()> {
    // the halt raised by the satisfied limit must not suppress the
    // downstream sort's flush
    let out = of(vec![9, 2, 7, 1, 5]).limit(3).sort().to_values()?;
    assert_values_equal(&out, &[json!(2), json!(7), json!(9)]);
    Ok(())
}

#[test]
fn limit_after_sort_cuts_the_flush() -> anyhow::Result<()> {
    let out = of(vec![9, 2, 7, 1, 5]).sort().limit(2).to_values()?;
    assert_values_equal(&out, &[json!(1), json!(2)]);
    Ok(())
}
