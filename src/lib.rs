//! # Weir
//!
//! A **lazily-evaluated, fluent stream-transformation library** for Rust.
//! Weir gives application code LINQ-style expressive data manipulation over
//! ordered key/value sequences -- filter, map, sort, dedupe, window, fork,
//! reduce, collect -- without hand-written loops, while executing
//! everything in a single synchronous pass.
//!
//! ## Key features
//!
//! - **Fluent pipeline API** - chain operations, then run once with a
//!   terminal accessor
//! - **Lazy single-pass execution** - `limit`, `first` and `find` stop
//!   pulling from the source the moment they are satisfied
//! - **Chain rewriting** - appends are checked against a rule table that
//!   fuses or drops adjacent operations (`sort` + `tail` becomes a bounded
//!   reverse-sort, `reverse` + `tail` becomes a lazy `limit` + `reverse`, ...)
//! - **Bounded top-K sorting** - `sort_limited(k)` keeps memory at `k`
//!   entries no matter how long the stream runs
//! - **Forking** - route items into per-label sub-pipelines by a
//!   discriminator, with strict pre-declared label sets when wanted
//! - **Pluggable sources** - vectors, iterators, generators, integer and
//!   random ranges, file lines, collectors, or any [`Producer`] impl
//! - **Two-tier error handling** - user-data failures route through a
//!   replaceable handler chain (skip / abort / log); engine misuse panics
//!   at the point of error
//!
//! ## Quick start
//!
//! ```
//! use weir::{of, Value};
//!
//! # fn main() -> anyhow::Result<()> {
//! let out = of(vec![4, 7, 2, 8, 5])
//!     .filter(|v: &Value| v.as_i64().unwrap() % 2 == 0)
//!     .map(|v: &Value| Value::from(v.as_i64().unwrap() * 10))
//!     .to_values()?;
//! assert_eq!(out, vec![Value::from(40), Value::from(20), Value::from(80)]);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core concepts
//!
//! ### Items and values
//!
//! Every element is a (key, value) pair of dynamically-typed
//! [`Value`]s. Sources that produce bare values get integer keys assigned
//! automatically. One mutable [`Item`] cell is reused for the whole run;
//! operations that buffer data clone what they keep.
//!
//! ### Streams are single-use
//!
//! Building a [`Stream`] assembles an operation chain; a terminal accessor
//! (`to_values`, `collect`, `first`, `fold`, `run`, ...) consumes the
//! stream and drives the single execution pass. Re-running or cloning a
//! stream is not expressible -- build a new one, or describe reusable
//! logic as a [`wrap`] prototype for forking.
//!
//! ### Lazy vs. buffering operations
//!
//! Stateless operations (`filter`, `map`, `each`, `skip`, `limit`) forward
//! items as they arrive. Buffering operations (`sort`, `reverse`,
//! `shuffle`, `tail`, `chunk`, `window`, `fork`, `fold`) absorb the stream
//! and flush when it ends. `limit`/`first`/`find` are lazy: they halt the
//! run early, and upstream sources are never over-pulled.
//!
//! ## Module overview
//!
//! - [`stream`] - the fluent façade and the driving loop
//! - [`pipe`] - chain construction and append-time rewriting
//! - [`rewrite`] - the pure rewrite rule table
//! - [`operation`] - the operation contract and the chain executor
//! - [`ops`] - the concrete operation nodes
//! - [`producer`] - data sources
//! - [`collector`] - the ordered key/value sink
//! - [`traits`] - strategy interfaces (predicates, mappers, comparators,
//!   reducers, consumers, discriminators)
//! - [`errors`] - the user-data error handler chain
//! - [`testing`] - counting producers and assertion helpers

pub mod collector;
pub mod errors;
pub mod item;
pub mod mode;
pub mod operation;
pub mod ops;
pub mod pipe;
pub mod producer;
pub mod rewrite;
pub mod signal;
pub mod stream;
pub mod testing;
pub mod traits;
pub mod value;

// General re-exports
pub use collector::Collector;
pub use errors::{
    ErrorAction, ErrorHandler, abort_on_error, log_and_abort, log_and_skip, skip_errors,
};
pub use item::Item;
pub use mode::Mode;
pub use operation::OpKind;
pub use pipe::Pipe;
pub use producer::Producer;
pub use rewrite::{Rule, RewriteDecision, rule_for};
pub use signal::Signal;
pub use stream::{
    Stream, concat, from_collector, from_file_lines, from_iter, from_pairs, from_producer,
    from_values, generate, int_range, of, random_ints, wrap,
};
pub use traits::{
    Comparator, Consumer, Count, DefaultComparator, Discriminator, Extreme, FnComparator,
    JoinStrings, Mapper, Predicate, Reducer, Reversed, Sum,
};
pub use value::{default_compare, is_int, signature};

// The dynamic value type and its literal macro, for convenience in user
// code and tests.
pub use serde_json::{Value, json};
