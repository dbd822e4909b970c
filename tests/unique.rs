//! Uniqueness-mode membership tables over a fixed literal input.

use weir::{FnComparator, Mode, Value, from_pairs, json};

// keys [0,'b',2,1,'a',1,'b',2,'a'] zipped with values chosen so every
// mode retains a different member set
fn fixture() -> Vec<(Value, Value)> {
    vec![
        (json!(0), json!("x")),
        (json!("b"), json!("y")),
        (json!(2), json!("x")),
        (json!(1), json!("z")),
        (json!("a"), json!("y")),
        (json!(1), json!("w")),
        (json!("b"), json!("q")),
        (json!(2), json!("x")),
        (json!("a"), json!("r")),
    ]
}

#[test]
fn value_mode_keeps_first_per_value() -> anyhow::Result<()> {
    let out = from_pairs(fixture()).unique_mode(Mode::Value).to_pairs()?;
    assert_eq!(
        out,
        vec![
            (json!(0), json!("x")),
            (json!("b"), json!("y")),
            (json!(1), json!("z")),
            (json!(1), json!("w")),
            (json!("b"), json!("q")),
            (json!("a"), json!("r")),
        ]
    );
    Ok(())
}

#[test]
fn key_mode_keeps_first_per_key() -> anyhow::Result<()> {
    let out = from_pairs(fixture()).unique_mode(Mode::Key).to_pairs()?;
    assert_eq!(
        out,
        vec![
            (json!(0), json!("x")),
            (json!("b"), json!("y")),
            (json!(2), json!("x")),
            (json!(1), json!("z")),
            (json!("a"), json!("y")),
        ]
    );
    Ok(())
}

#[test]
fn both_mode_requires_a_full_pair_repeat() -> anyhow::Result<()> {
    let out = from_pairs(fixture()).unique_mode(Mode::Both).to_pairs()?;
    // only (2, "x") repeats as a full pair
    assert_eq!(
        out,
        vec![
            (json!(0), json!("x")),
            (json!("b"), json!("y")),
            (json!(2), json!("x")),
            (json!(1), json!("z")),
            (json!("a"), json!("y")),
            (json!(1), json!("w")),
            (json!("b"), json!("q")),
            (json!("a"), json!("r")),
        ]
    );
    Ok(())
}

#[test]
fn any_mode_dedupes_on_either_slot() -> anyhow::Result<()> {
    let out = from_pairs(fixture()).unique_mode(Mode::Any).to_pairs()?;
    // both slots of every earlier item count as seen, kept or not
    assert_eq!(
        out,
        vec![
            (json!(0), json!("x")),
            (json!("b"), json!("y")),
            (json!(1), json!("z")),
        ]
    );
    Ok(())
}

#[test]
fn default_unique_is_value_mode() -> anyhow::Result<()> {
    let out = weir::of(vec![1, 1, 2, 3, 2]).unique().to_values()?;
    assert_eq!(out, vec![json!(1), json!(2), json!(3)]);
    Ok(())
}

#[test]
fn type_distinction_survives_dedup() -> anyhow::Result<()> {
    // the string "1" and the number 1 are different values
    let out = weir::of(vec![json!(1), json!("1"), json!(1)])
        .unique()
        .to_values()?;
    assert_eq!(out, vec![json!(1), json!("1")]);
    Ok(())
}

#[test]
fn custom_comparator_drives_value_identity() -> anyhow::Result<()> {
    let case_insensitive = FnComparator(|a: &Value, b: &Value| {
        let a = a.as_str().unwrap_or_default().to_lowercase();
        let b = b.as_str().unwrap_or_default().to_lowercase();
        a.cmp(&b)
    });
    let out = weir::of(vec!["Rust", "rust", "RUST", "go"])
        .unique_by(case_insensitive, Mode::Value)
        .to_values()?;
    assert_eq!(out, vec![json!("Rust"), json!("go")]);
    Ok(())
}

#[test]
fn both_mode_with_value_only_comparator_is_an_error() {
    let value_only = FnComparator(|a: &Value, b: &Value| {
        a.to_string().cmp(&b.to_string())
    });
    let result = weir::of(vec![1, 2])
        .unique_by(value_only, Mode::Both)
        .to_values();
    let err = result.expect_err("assoc form is required for Both");
    assert!(err.to_string().contains("key-aware"));
}

#[test]
fn assoc_comparator_supports_both_mode() -> anyhow::Result<()> {
    let assoc = weir::traits::AssocFnComparator(
        |v1: &Value, v2: &Value, k1: &Value, k2: &Value| {
            weir::default_compare(v1, v2).then(weir::default_compare(k1, k2))
        },
    );
    let out = from_pairs(vec![
        (json!("k"), json!(1)),
        (json!("k"), json!(1)),
        (json!("k"), json!(2)),
    ])
    .unique_by(assoc, Mode::Both)
    .to_pairs()?;
    assert_eq!(out, vec![(json!("k"), json!(1)), (json!("k"), json!(2))]);
    Ok(())
}
