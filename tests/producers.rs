use weir::producer::{
    ChainedProducer, LinesProducer, PairsProducer, Producer, RangeProducer, ValuesProducer,
};
use weir::testing::temp_lines_file;
use weir::{Item, Value, from_file_lines, from_iter, from_pairs, generate, json};

fn drain(producer: &mut dyn Producer) -> Vec<(Value, Value)> {
    let mut item = Item::empty();
    let mut out = Vec::new();
    while producer.produce(&mut item).expect("produce") {
        out.push((item.key.clone(), item.value.clone()));
    }
    out
}

#[test]
fn values_producer_auto_keys() {
    let mut p = ValuesProducer::new(vec![json!("a"), json!("b")]);
    assert_eq!(
        drain(&mut p),
        vec![(json!(0), json!("a")), (json!(1), json!("b"))]
    );
}

#[test]
fn generate_runs_until_none() -> anyhow::Result<()> {
    let mut n = 0;
    let out = generate(move || {
        n += 1;
        if n <= 3 { Some(json!(n * 10)) } else { None }
    })
    .to_values()?;
    assert_eq!(out, vec![json!(10), json!(20), json!(30)]);
    Ok(())
}

#[test]
fn from_iter_accepts_any_iterator() -> anyhow::Result<()> {
    let out = from_iter((1..=3).map(|n| n * n)).to_values()?;
    assert_eq!(out, vec![json!(1), json!(4), json!(9)]);
    Ok(())
}

#[test]
fn range_produces_inclusive_sequence() {
    let mut p = RangeProducer::new(3, Some(7), 2);
    let values: Vec<Value> = drain(&mut p).into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![json!(3), json!(5), json!(7)]);
}

#[test]
fn range_steps_downward() {
    let mut p = RangeProducer::new(3, Some(1), -1);
    let values: Vec<Value> = drain(&mut p).into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![json!(3), json!(2), json!(1)]);
}

#[test]
#[should_panic(expected = "step must be non-zero")]
fn zero_step_panics() {
    let _ = RangeProducer::new(0, Some(10), 0);
}

#[test]
fn random_ints_stay_in_bounds() -> anyhow::Result<()> {
    let out = weir::random_ints(5, 9, Some(50)).to_values()?;
    assert_eq!(out.len(), 50);
    assert!(out.iter().all(|v| {
        let n = v.as_i64().unwrap();
        (5..=9).contains(&n)
    }));
    Ok(())
}

#[test]
fn chained_producer_concatenates() {
    let mut p = ChainedProducer::new(vec![
        Box::new(ValuesProducer::new(vec![json!(1)])),
        Box::new(ValuesProducer::new(vec![json!(2), json!(3)])),
    ]);
    let values: Vec<Value> = drain(&mut p).into_iter().map(|(_, v)| v).collect();
    assert_eq!(values, vec![json!(1), json!(2), json!(3)]);
}

#[test]
fn file_lines_producer_reads_and_keys_lines() -> anyhow::Result<()> {
    let file = temp_lines_file(&["alpha", "beta", "gamma"]);
    let pairs = from_file_lines(file.path())?.to_pairs()?;
    assert_eq!(
        pairs,
        vec![
            (json!(0), json!("alpha")),
            (json!(1), json!("beta")),
            (json!(2), json!("gamma")),
        ]
    );
    Ok(())
}

#[test]
fn missing_file_is_an_error() {
    assert!(from_file_lines("/definitely/not/here.txt").is_err());
}

/* ---------- destroy semantics ---------- */

#[test]
fn destroyed_producers_yield_nothing_and_stay_destroyed() {
    let mut values = ValuesProducer::new(vec![json!(1), json!(2)]);
    values.destroy();
    values.destroy();
    assert!(drain(&mut values).is_empty());

    let mut pairs = PairsProducer::new(vec![(json!("k"), json!("v"))]);
    pairs.destroy();
    assert!(drain(&mut pairs).is_empty());

    let mut range = RangeProducer::new(0, Some(100), 1);
    range.destroy();
    range.destroy();
    assert!(drain(&mut range).is_empty());
}

#[test]
fn destroyed_file_producer_closes_the_handle() -> anyhow::Result<()> {
    let file = temp_lines_file(&["one", "two"]);
    let mut p = LinesProducer::open(file.path())?;
    let mut item = Item::empty();
    assert!(p.produce(&mut item)?);
    p.destroy();
    p.destroy();
    assert!(!p.produce(&mut item)?);
    Ok(())
}

#[test]
fn destroy_mid_chain_partial_reads() {
    let mut p = ValuesProducer::new(vec![json!(1), json!(2), json!(3)]);
    let mut item = Item::empty();
    assert!(p.produce(&mut item).expect("produce"));
    p.destroy();
    assert!(!p.produce(&mut item).expect("produce"));
}

#[test]
fn pairs_roundtrip_through_stream() -> anyhow::Result<()> {
    let out = from_pairs(vec![(json!("a"), json!(1)), (json!("b"), json!(2))])
        .to_pairs()?;
    assert_eq!(out, vec![(json!("a"), json!(1)), (json!("b"), json!(2))]);
    Ok(())
}
