//! Chain-construction rewrite rules.
//!
//! When an operation is appended, the pipe consults this table keyed on
//! (kind of the current tail, kind of the incoming operation) and may fuse,
//! replace or drop nodes instead of appending. Every rule is a local
//! two-node pattern; after a rewrite the new tail is only ever checked
//! against the *next* append, never retroactively, keeping append cost
//! linear. Rules must be behavior-preserving for every input, including
//! empty streams and early termination.
//!
//! The table is deliberately a pure function so it can be tested in
//! isolation from the chain mechanics; applying a rule (which needs the
//! actual nodes) lives in [`Pipe::append`](crate::Pipe::append).
//!
//! These rules are the empirically-useful set, not a derivation from first
//! principles; pairs not listed here are appended verbatim.

use crate::operation::OpKind;

/// What to do with an incoming operation given the current tail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Rule {
    /// No rule matches: append the incoming operation as-is.
    Append,
    /// `flat` after `flat`: merge the recursion caps into the tail node.
    MergeFlat,
    /// `sort` then `tail(n)`: the n greatest in ascending order -- replace
    /// both with a bounded reverse-sort, avoiding the full-stream buffer.
    FuseSortTail,
    /// `sort` then `last`: one extreme element -- replace with a bounded
    /// reverse-sort of capacity 1 feeding `first`.
    FuseSortLast,
    /// `sort_limited` then `reverse`: a bounded sort retains only order,
    /// so reversing its output is just flipping its emission direction.
    FlipSortLimited,
    /// `shuffle` then `reverse`: reversing a uniformly random permutation
    /// changes nothing observable; the reverse is dropped.
    DropReverseAfterShuffle,
    /// `reverse` then `tail(n)`: the last n of a reversed stream are the
    /// first n of the original, reversed -- becomes `limit(n)` + `reverse`,
    /// which is lazy.
    SwapReverseTail,
}

/// The rule table. `tail` is `None` for an empty pipe.
#[must_use]
pub fn rule_for(tail: Option<OpKind>, incoming: OpKind) -> Rule {
    match (tail, incoming) {
        (Some(OpKind::Flat), OpKind::Flat) => Rule::MergeFlat,
        (Some(OpKind::Sort), OpKind::Tail) => Rule::FuseSortTail,
        (Some(OpKind::Sort), OpKind::Last) => Rule::FuseSortLast,
        (Some(OpKind::SortLimited), OpKind::Reverse) => Rule::FlipSortLimited,
        (Some(OpKind::Shuffle), OpKind::Reverse) => Rule::DropReverseAfterShuffle,
        (Some(OpKind::Reverse), OpKind::Tail) => Rule::SwapReverseTail,
        _ => Rule::Append,
    }
}

/// A record of one applied rewrite, kept by the pipe for introspection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RewriteDecision {
    /// Adjacent `flat`s merged; the tail's cap after merging.
    MergedFlat { depth: usize },
    /// `sort` + `tail(n)` became a bounded reverse-sort of capacity n.
    FusedSortTail { keep: usize },
    /// `sort` + `last` became a capacity-1 bounded sort + `first`.
    FusedSortLast,
    /// A `reverse` was absorbed into the bounded sort's direction flag.
    FlippedSortLimited,
    /// A `reverse` after `shuffle` was dropped as a no-op.
    DroppedReverseAfterShuffle,
    /// `reverse` + `tail(n)` became `limit(n)` + `reverse`.
    SwappedReverseTail { keep: usize },
}
