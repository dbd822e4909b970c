use weir::{json, of};

#[test]
fn chunk_groups_and_flushes_remainder() -> anyhow::Result<()> {
    let pairs = of(vec![1, 2, 3, 4, 5]).chunk(2).to_pairs()?;
    assert_eq!(
        pairs,
        vec![
            (json!(0), json!([1, 2])),
            (json!(1), json!([3, 4])),
            (json!(2), json!([5])),
        ]
    );
    Ok(())
}

#[test]
fn chunk_exact_multiple_has_no_remainder() -> anyhow::Result<()> {
    let out = of(vec![1, 2, 3, 4]).chunk(2).to_values()?;
    assert_eq!(out, vec![json!([1, 2]), json!([3, 4])]);
    Ok(())
}

#[test]
fn chunk_pairs_keeps_element_keys() -> anyhow::Result<()> {
    let out = of(vec!["a", "b", "c"]).chunk_pairs(2).to_values()?;
    assert_eq!(
        out,
        vec![json!([[0, "a"], [1, "b"]]), json!([[2, "c"]])]
    );
    Ok(())
}

#[test]
fn gather_collects_everything_into_one_item() -> anyhow::Result<()> {
    let pairs = of(vec![1, 2, 3]).gather().to_pairs()?;
    assert_eq!(pairs, vec![(json!(0), json!([1, 2, 3]))]);
    Ok(())
}

#[test]
fn gather_on_empty_stream_emits_nothing() -> anyhow::Result<()> {
    let out = of(Vec::<i64>::new()).gather().to_values()?;
    assert!(out.is_empty());
    Ok(())
}

#[test]
fn sliding_window_step_one() -> anyhow::Result<()> {
    let out = of(vec![1, 2, 3, 4, 5]).window(3, 1).to_values()?;
    assert_eq!(
        out,
        vec![json!([1, 2, 3]), json!([2, 3, 4]), json!([3, 4, 5])]
    );
    Ok(())
}

#[test]
fn sliding_window_larger_step() -> anyhow::Result<()> {
    let out = of(vec![1, 2, 3, 4, 5, 6]).window(3, 2).to_values()?;
    // full windows at items 3 and 5; the trailing item flushes the last
    // window state at end-of-stream
    assert_eq!(
        out,
        vec![json!([1, 2, 3]), json!([3, 4, 5]), json!([4, 5, 6])]
    );
    Ok(())
}

#[test]
fn window_shorter_stream_flushes_partial() -> anyhow::Result<()> {
    let out = of(vec![1, 2]).window(5, 1).to_values()?;
    assert_eq!(out, vec![json!([1, 2])]);
    Ok(())
}

#[test]
fn chunk_after_limit_flushes_partial_group() -> anyhow::Result<()> {
    let out = of(vec![1, 2, 3, 4, 5, 6, 7]).limit(3).chunk(2).to_values()?;
    assert_eq!(out, vec![json!([1, 2]), json!([3])]);
    Ok(())
}

#[test]
#[should_panic(expected = "chunk size must be positive")]
fn chunk_zero_panics() {
    let _ = of(vec![1]).chunk(0);
}

#[test]
#[should_panic(expected = "step cannot exceed the window size")]
fn window_step_beyond_size_panics() {
    let _ = of(vec![1]).window(2, 3);
}
