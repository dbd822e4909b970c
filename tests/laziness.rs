//! Upstream pull counts: lazy chains must never over-pull the source.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use weir::producer::ValuesProducer;
use weir::testing::CountingProducer;
use weir::{Value, from_producer, json};

fn counted_source(n: i64) -> (weir::Stream, Arc<AtomicUsize>) {
    let values: Vec<Value> = (1..=n).map(Value::from).collect();
    let (producer, pulls) = CountingProducer::wrap(Box::new(ValuesProducer::new(values)));
    (from_producer(Box::new(producer)), pulls)
}

#[test]
fn limit_pulls_exactly_n() -> anyhow::Result<()> {
    let (stream, pulls) = counted_source(1000);
    let out = stream.limit(5).to_values()?;
    assert_eq!(out.len(), 5);
    assert_eq!(pulls.load(Ordering::SeqCst), 5);
    Ok(())
}

#[test]
fn limit_after_filter_pulls_the_minimum() -> anyhow::Result<()> {
    let (stream, pulls) = counted_source(1000);
    let out = stream
        .filter(|v: &Value| v.as_i64().unwrap() % 2 == 0)
        .limit(3)
        .to_values()?;
    assert_eq!(out, vec![json!(2), json!(4), json!(6)]);
    // three outputs need exactly six source items
    assert_eq!(pulls.load(Ordering::SeqCst), 6);
    Ok(())
}

#[test]
fn first_pulls_one_item() -> anyhow::Result<()> {
    let (stream, pulls) = counted_source(1000);
    let first = stream.first()?;
    assert_eq!(first, Some((json!(0), json!(1))));
    assert_eq!(pulls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[test]
fn find_stops_at_the_match() -> anyhow::Result<()> {
    let (stream, pulls) = counted_source(1000);
    let found = stream.find(|v: &Value| v.as_i64().unwrap() == 7)?;
    assert_eq!(found.map(|(_, v)| v), Some(json!(7)));
    assert_eq!(pulls.load(Ordering::SeqCst), 7);
    Ok(())
}

#[test]
fn rewritten_reverse_tail_is_lazy() -> anyhow::Result<()> {
    // reverse + tail rewrites to limit + reverse, so the source must only
    // be pulled `keep` times
    let (stream, pulls) = counted_source(1000);
    let out = stream.reverse().tail(4).to_values()?;
    assert_eq!(out, vec![json!(4), json!(3), json!(2), json!(1)]);
    assert_eq!(pulls.load(Ordering::SeqCst), 4);
    Ok(())
}

#[test]
fn eager_sort_drains_the_source() -> anyhow::Result<()> {
    let (stream, pulls) = counted_source(100);
    let out = stream.sort().to_values()?;
    assert_eq!(out.len(), 100);
    assert_eq!(pulls.load(Ordering::SeqCst), 100);
    Ok(())
}

#[test]
fn unbounded_generator_with_limit_terminates() -> anyhow::Result<()> {
    let out = weir::int_range(0, None, 1).limit(4).to_values()?;
    assert_eq!(out, vec![json!(0), json!(1), json!(2), json!(3)]);
    Ok(())
}

#[test]
fn laziness_is_visible_on_the_pipe() {
    let lazy = weir::of(vec![1]).map(|v: &Value| v.clone()).limit(1);
    assert!(lazy.pipe().has_lazy_operation());

    let eager = weir::of(vec![1]).sort();
    assert!(!eager.pipe().has_lazy_operation());
}
