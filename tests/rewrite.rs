//! Chain-rewrite structure and equivalence checks.
//!
//! Every rewrite rule is exercised twice: once structurally (the chain
//! introspection shows the rewritten shape) and once behaviorally (the
//! rewritten chain produces the same output as the semantically-equivalent
//! naive pipeline on empty, single-element and duplicate-heavy inputs).

use weir::testing::*;
use weir::{OpKind, RewriteDecision, Value, json, of};

fn ints(values: &[i64]) -> Vec<Value> {
    values.iter().map(|&v| json!(v)).collect()
}

/* ---------- structural shape ---------- */

#[test]
fn sort_tail_fuses_into_bounded_sort() {
    let s = of(vec![1]).sort().tail(3);
    assert_eq!(s.pipe().kinds(), vec![OpKind::SortLimited]);
    assert_eq!(
        s.pipe().rewrites(),
        &[RewriteDecision::FusedSortTail { keep: 3 }]
    );
}

#[test]
fn sort_last_fuses_into_bounded_sort_plus_first() -> anyhow::Result<()> {
    let s = of(vec![1]).sort();
    // `last()` both rewrites the chain and runs it
    let out = s.last()?;
    assert_eq!(out, Some((json!(0), json!(1))));
    Ok(())
}

#[test]
fn sort_limited_reverse_is_absorbed() {
    let s = of(vec![1]).sort_limited(2).reverse();
    assert_eq!(s.pipe().kinds(), vec![OpKind::SortLimited]);
    assert_eq!(s.pipe().rewrites(), &[RewriteDecision::FlippedSortLimited]);
}

#[test]
fn shuffle_reverse_drops_the_reverse() {
    let s = of(vec![1]).shuffle().reverse();
    assert_eq!(s.pipe().kinds(), vec![OpKind::Shuffle]);
    assert_eq!(
        s.pipe().rewrites(),
        &[RewriteDecision::DroppedReverseAfterShuffle]
    );
}

#[test]
fn reverse_tail_becomes_lazy_limit_reverse() {
    let s = of(vec![1]).reverse().tail(2);
    assert_eq!(s.pipe().kinds(), vec![OpKind::Limit, OpKind::Reverse]);
    assert!(s.pipe().has_lazy_operation());
    assert_eq!(
        s.pipe().rewrites(),
        &[RewriteDecision::SwappedReverseTail { keep: 2 }]
    );
}

#[test]
fn adjacent_flats_merge_depth() {
    let s = of(vec![1]).flat(1).flat(2);
    assert_eq!(s.pipe().kinds(), vec![OpKind::Flat]);
    assert_eq!(s.pipe().rewrites(), &[RewriteDecision::MergedFlat { depth: 3 }]);
}

#[test]
fn rewrites_do_not_cascade_retroactively() {
    // sort . shuffle . reverse: the reverse is dropped against shuffle;
    // the earlier sort is untouched
    let s = of(vec![1]).sort().shuffle().reverse();
    assert_eq!(s.pipe().kinds(), vec![OpKind::Sort, OpKind::Shuffle]);
}

#[test]
fn unrelated_pairs_append_verbatim() {
    let s = of(vec![1]).sort().reverse();
    assert_eq!(s.pipe().kinds(), vec![OpKind::Sort, OpKind::Reverse]);
}

/* ---------- behavioral equivalence ---------- */

const CASES: [&[i64]; 4] = [
    &[],
    &[42],
    &[5, 3, 9, 1, 7],
    &[4, 4, 2, 9, 2, 9, 4],
];

#[test]
fn sort_tail_equivalence() -> anyhow::Result<()> {
    for case in CASES {
        // naive tail-of-sorted, spelled without triggering the rule
        let mut expected: Vec<i64> = case.to_vec();
        expected.sort_unstable();
        let keep = expected.len().min(3);
        let expected: Vec<Value> = ints(&expected[expected.len() - keep..]);

        let rewritten = of(case.to_vec()).sort().tail(3).to_values()?;
        assert_values_equal(&rewritten, &expected);
    }
    Ok(())
}

#[test]
fn sort_last_equivalence() -> anyhow::Result<()> {
    for case in CASES {
        let expected = case.iter().max().map(|&v| json!(v));
        let rewritten = of(case.to_vec()).sort().last()?.map(|(_, v)| v);
        assert_eq!(rewritten, expected, "input {case:?}");
    }
    Ok(())
}

#[test]
fn sort_limited_reverse_equivalence() -> anyhow::Result<()> {
    for case in CASES {
        // naive: bounded ascending output, then an explicit reversal of
        // the collected result
        let mut naive = of(case.to_vec()).sort_limited(3).to_values()?;
        naive.reverse();

        let rewritten = of(case.to_vec()).sort_limited(3).reverse().to_values()?;
        assert_values_equal(&rewritten, &naive);
    }
    Ok(())
}

#[test]
fn shuffle_reverse_equivalence_as_multiset() -> anyhow::Result<()> {
    for case in CASES {
        let rewritten = of(case.to_vec()).shuffle().reverse().to_values()?;
        assert_values_unordered_equal(&rewritten, &ints(case));
    }
    Ok(())
}

#[test]
fn reverse_tail_equivalence() -> anyhow::Result<()> {
    for case in CASES {
        // naive: reverse the whole input, keep the last 2
        let mut reversed: Vec<i64> = case.to_vec();
        reversed.reverse();
        let keep = reversed.len().min(2);
        let expected = ints(&reversed[reversed.len() - keep..]);

        let rewritten = of(case.to_vec()).reverse().tail(2).to_values()?;
        assert_values_equal(&rewritten, &expected);
    }
    Ok(())
}

#[test]
fn flat_merge_equivalence() -> anyhow::Result<()> {
    let nested = vec![json!([[1, 2], 3]), json!([4])];
    let merged = of(nested.clone()).flat(1).flat(1).to_values()?;
    let direct = of(nested).flat(2).to_values()?;
    assert_values_equal(&merged, &direct);
    Ok(())
}
