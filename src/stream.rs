//! The fluent pipeline façade.
//!
//! A [`Stream`] owns one [`Pipe`], one data source and the error-handler
//! chain. Fluent methods consume and return the stream; terminal accessors
//! consume it outright and drive execution, which makes every stream
//! single-use by construction -- re-running or cloning a stream is not
//! expressible, and equivalent logic is re-created through [`wrap`]
//! prototypes (fork branches) or by building a fresh stream.
//!
//! # Quick start
//!
//! ```
//! use weir::{of, Value};
//!
//! # fn main() -> anyhow::Result<()> {
//! let squares = of(vec![3, 1, 2])
//!     .sort()
//!     .map(|v: &Value| Value::from(v.as_i64().unwrap() * v.as_i64().unwrap()))
//!     .to_values()?;
//! assert_eq!(squares, vec![Value::from(1), Value::from(4), Value::from(9)]);
//! # Ok(())
//! # }
//! ```

use crate::collector::Collector;
use crate::errors::{ErrorAction, ErrorHandler, HandlerChain};
use crate::mode::Mode;
use crate::operation::{SourceFrame, drive_frames, finish_nodes};
use crate::ops::{
    CollectInOp, CollectVecOp, CountOp, DispatchOp, EachOp, FilterOp, FindOp, FirstOp, FlatOp,
    ForkOp, GatherOp, LastOp, LimitOp, MapOp, ReduceOp, ReverseOp, ShuffleOp, SkipOp, SortLimitedOp,
    SortOp, TailOp, UniqueOp, WindowOp,
};
use crate::pipe::Pipe;
use crate::producer::{
    ChainedProducer, FnProducer, IterProducer, LinesProducer, PairsProducer, Producer,
    RandomProducer, RangeProducer, ValuesProducer,
};
use crate::signal::Signal;
use crate::traits::{
    Comparator, Consumer, DefaultComparator, Discriminator, Mapper, Predicate, Reducer,
};
use anyhow::Result;
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};

/* ===================== Constructors ===================== */

/// Stream over plain values with auto-assigned integer keys.
#[must_use]
pub fn of<T: Into<Value>>(values: Vec<T>) -> Stream {
    from_values(values.into_iter().map(Into::into).collect())
}

/// Stream over dynamic values with auto-assigned integer keys.
#[must_use]
pub fn from_values(values: Vec<Value>) -> Stream {
    Stream::with_producer(Box::new(ValuesProducer::new(values)))
}

/// Stream over explicit (key, value) pairs.
#[must_use]
pub fn from_pairs(pairs: Vec<(Value, Value)>) -> Stream {
    Stream::with_producer(Box::new(PairsProducer::new(pairs)))
}

/// Stream over any iterator of values.
#[must_use]
pub fn from_iter<I>(iter: I) -> Stream
where
    I: IntoIterator + 'static,
    I::Item: Into<Value>,
    I::IntoIter: 'static,
{
    Stream::with_producer(Box::new(IterProducer::new(
        iter.into_iter().map(Into::into),
    )))
}

/// Callback-driven stream: the closure yields `Some(value)` per element
/// and `None` to end the stream.
#[must_use]
pub fn generate<F>(f: F) -> Stream
where
    F: FnMut() -> Option<Value> + 'static,
{
    Stream::with_producer(Box::new(FnProducer::new(f)))
}

/// Sequential integers; unbounded when `end` is `None` (pair it with a
/// lazy operation such as [`Stream::limit`]).
#[must_use]
pub fn int_range(start: i64, end: Option<i64>, step: i64) -> Stream {
    Stream::with_producer(Box::new(RangeProducer::new(start, end, step)))
}

/// Uniformly random integers in `[lo, hi]`.
#[must_use]
pub fn random_ints(lo: i64, hi: i64, count: Option<u64>) -> Stream {
    Stream::with_producer(Box::new(RandomProducer::new(lo, hi, count)))
}

/// Stream over the lines of a text file, keyed by line number.
pub fn from_file_lines(path: impl AsRef<Path>) -> Result<Stream> {
    Ok(Stream::with_producer(Box::new(LinesProducer::open(path)?)))
}

/// Stream over a snapshot of a collector's entries.
#[must_use]
pub fn from_collector(collector: &Arc<Mutex<Collector>>) -> Stream {
    let pairs = collector.lock().unwrap().to_pairs();
    from_pairs(pairs)
}

/// Stream over a caller-supplied producer.
#[must_use]
pub fn from_producer(producer: Box<dyn Producer>) -> Stream {
    Stream::with_producer(producer)
}

/// Concatenation of several producers, drained in order.
#[must_use]
pub fn concat(producers: Vec<Box<dyn Producer>>) -> Stream {
    Stream::with_producer(Box::new(ChainedProducer::new(producers)))
}

/// A producer-less prototype stream: the sanctioned way to describe fork
/// branches. Driving one directly is a fatal misuse.
#[must_use]
pub fn wrap() -> Stream {
    Stream { pipe: Pipe::new(), producer: None, handlers: HandlerChain::default(), destroyed: false }
}

/* ===================== Stream ===================== */

pub struct Stream {
    pipe: Pipe,
    producer: Option<Box<dyn Producer>>,
    handlers: HandlerChain,
    destroyed: bool,
}

impl Stream {
    fn with_producer(producer: Box<dyn Producer>) -> Self {
        Self {
            pipe: Pipe::new(),
            producer: Some(producer),
            handlers: HandlerChain::default(),
            destroyed: false,
        }
    }

    /// Chain introspection (kinds, applied rewrites, laziness).
    #[must_use]
    pub fn pipe(&self) -> &Pipe {
        &self.pipe
    }

    /* ---------- stateless operations ---------- */

    /// Keep items whose value satisfies the predicate.
    #[must_use]
    pub fn filter<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.pipe
            .append(Box::new(FilterOp::new(Box::new(pred), Mode::Value, false)));
        self
    }

    /// Keep items whose selected slot(s) satisfy the predicate.
    #[must_use]
    pub fn filter_mode<P>(mut self, pred: P, mode: Mode) -> Self
    where
        P: Predicate + 'static,
    {
        self.pipe
            .append(Box::new(FilterOp::new(Box::new(pred), mode, false)));
        self
    }

    /// Drop items whose value satisfies the predicate.
    #[must_use]
    pub fn omit<F>(mut self, pred: F) -> Self
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.pipe
            .append(Box::new(FilterOp::new(Box::new(pred), Mode::Value, true)));
        self
    }

    /// Drop null-valued items.
    #[must_use]
    pub fn not_null(self) -> Self {
        self.omit(|v: &Value| v.is_null())
    }

    /// Transform each value.
    #[must_use]
    pub fn map<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        let mapper = move |v: &Value, _k: &Value| f(v);
        self.pipe.append(Box::new(MapOp::values(Box::new(mapper))));
        self
    }

    /// Transform each value with the key available for context.
    #[must_use]
    pub fn map_with<M>(mut self, mapper: M) -> Self
    where
        M: Mapper + 'static,
    {
        self.pipe.append(Box::new(MapOp::values(Box::new(mapper))));
        self
    }

    /// Transform each key (the value is the mapper's context argument).
    #[must_use]
    pub fn map_keys<F>(mut self, f: F) -> Self
    where
        F: Fn(&Value) -> Value + 'static,
    {
        let mapper = move |k: &Value, _v: &Value| f(k);
        self.pipe.append(Box::new(MapOp::keys(Box::new(mapper))));
        self
    }

    /// Observe each item without changing it.
    #[must_use]
    pub fn each<C>(mut self, consumer: C) -> Self
    where
        C: Consumer + 'static,
    {
        self.pipe.append(Box::new(EachOp::new(Box::new(consumer))));
        self
    }

    /// Observe each value without changing it.
    #[must_use]
    pub fn inspect<F>(self, mut f: F) -> Self
    where
        F: FnMut(&Value) + 'static,
    {
        self.each(move |v: &Value, _k: &Value| f(v))
    }

    /// Forward only the first `n` items, then stop pulling upstream.
    #[must_use]
    pub fn limit(mut self, n: usize) -> Self {
        self.pipe.append(Box::new(LimitOp::new(n)));
        self
    }

    /// Drop the first `n` items.
    #[must_use]
    pub fn skip(mut self, n: usize) -> Self {
        self.pipe.append(Box::new(SkipOp::new(n)));
        self
    }

    /// Replace container values with their elements, `depth` levels deep.
    #[must_use]
    pub fn flat(mut self, depth: usize) -> Self {
        self.pipe.append(Box::new(FlatOp::new(depth)));
        self
    }

    /* ---------- reordering operations ---------- */

    /// Sort by value under the default ordering.
    #[must_use]
    pub fn sort(self) -> Self {
        self.sort_by(DefaultComparator)
    }

    /// Sort by value under a custom comparator.
    #[must_use]
    pub fn sort_by<C>(mut self, cmp: C) -> Self
    where
        C: Comparator + 'static,
    {
        self.pipe
            .append(Box::new(SortOp::new(Box::new(cmp), Mode::Value)));
        self
    }

    /// Sort by key under the default ordering.
    #[must_use]
    pub fn sort_keys(mut self) -> Self {
        self.pipe
            .append(Box::new(SortOp::new(Box::new(DefaultComparator), Mode::Key)));
        self
    }

    /// Keep only the `k` smallest values, emitted in sorted order.
    /// Memory stays bounded by `k`.
    #[must_use]
    pub fn sort_limited(self, k: usize) -> Self {
        self.sort_limited_by(k, DefaultComparator)
    }

    /// Bounded sort under a custom comparator.
    #[must_use]
    pub fn sort_limited_by<C>(mut self, k: usize, cmp: C) -> Self
    where
        C: Comparator + 'static,
    {
        self.pipe.append(Box::new(SortLimitedOp::new(
            k,
            Box::new(cmp),
            Mode::Value,
            false,
        )));
        self
    }

    /// Replay the stream in reverse arrival order.
    #[must_use]
    pub fn reverse(mut self) -> Self {
        self.pipe.append(Box::new(ReverseOp::new()));
        self
    }

    /// Replay the stream in uniformly random order.
    #[must_use]
    pub fn shuffle(mut self) -> Self {
        self.pipe.append(Box::new(ShuffleOp::new()));
        self
    }

    /// Keep only the last `n` items.
    #[must_use]
    pub fn tail(mut self, n: usize) -> Self {
        self.pipe.append(Box::new(TailOp::new(n)));
        self
    }

    /* ---------- deduplication ---------- */

    /// Forward only the first occurrence of each value.
    #[must_use]
    pub fn unique(mut self) -> Self {
        self.pipe.append(Box::new(UniqueOp::new(Mode::Value, None)));
        self
    }

    /// Uniqueness with an explicit identity mode.
    #[must_use]
    pub fn unique_mode(mut self, mode: Mode) -> Self {
        self.pipe.append(Box::new(UniqueOp::new(mode, None)));
        self
    }

    /// Uniqueness decided by a custom comparator (the assoc form is
    /// required for [`Mode::Both`]).
    #[must_use]
    pub fn unique_by<C>(mut self, cmp: C, mode: Mode) -> Self
    where
        C: Comparator + 'static,
    {
        self.pipe
            .append(Box::new(UniqueOp::new(mode, Some(Box::new(cmp)))));
        self
    }

    /* ---------- aggregation ---------- */

    /// Group every `n` items into one array-valued item.
    #[must_use]
    pub fn chunk(mut self, n: usize) -> Self {
        self.pipe.append(Box::new(GatherOp::new(Some(n), false)));
        self
    }

    /// Like [`chunk`](Self::chunk), but elements keep their keys as
    /// `[key, value]` pairs.
    #[must_use]
    pub fn chunk_pairs(mut self, n: usize) -> Self {
        self.pipe.append(Box::new(GatherOp::new(Some(n), true)));
        self
    }

    /// Gather the whole stream into a single array-valued item.
    #[must_use]
    pub fn gather(mut self) -> Self {
        self.pipe.append(Box::new(GatherOp::new(None, false)));
        self
    }

    /// Sliding window of `size` items advancing by `step`.
    #[must_use]
    pub fn window(mut self, size: usize, step: usize) -> Self {
        self.pipe
            .append(Box::new(WindowOp::new(size, step, false)));
        self
    }

    /* ---------- forking ---------- */

    /// Route items into per-label branches built on demand from the
    /// prototype factory. Branch streams must come from [`wrap`]. After
    /// completion the fork emits one item per label: the label as key, the
    /// branch's output values as an array.
    #[must_use]
    pub fn fork<D, F>(mut self, disc: D, factory: F) -> Self
    where
        D: Discriminator + 'static,
        F: Fn() -> Stream + 'static,
    {
        let make_pipe = move || factory().into_branch_pipe();
        self.pipe
            .append(Box::new(ForkOp::new(Box::new(disc), Box::new(make_pipe))));
        self
    }

    /// Route items into the pre-declared branches; an item classified to
    /// an undeclared label is a "handler is not defined" error.
    #[must_use]
    pub fn fork_match<D>(mut self, disc: D, branches: Vec<(Value, Stream)>) -> Self
    where
        D: Discriminator + 'static,
    {
        let branches = branches
            .into_iter()
            .map(|(label, stream)| (label, stream.into_branch_pipe()))
            .collect();
        self.pipe
            .append(Box::new(ForkOp::with_branches(Box::new(disc), branches)));
        self
    }

    /// Route each item to a consumer picked by label, forwarding the item
    /// unchanged; an undeclared label is a "handler is not defined" error.
    #[must_use]
    pub fn dispatch<D>(mut self, disc: D, handlers: Vec<(Value, Box<dyn Consumer>)>) -> Self
    where
        D: Discriminator + 'static,
    {
        self.pipe
            .append(Box::new(DispatchOp::new(Box::new(disc), handlers)));
        self
    }

    /* ---------- error handling ---------- */

    /// Register an additional error handler; all registered handlers run
    /// for every user-data error.
    #[must_use]
    pub fn on_error(mut self, handler: Box<dyn ErrorHandler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Replace every registered error handler.
    #[must_use]
    pub fn on_error_replace(mut self, handler: Box<dyn ErrorHandler>) -> Self {
        self.handlers.replace(handler);
        self
    }

    /* ---------- lifecycle ---------- */

    /// Detach the data source. Every terminal on a destroyed stream yields
    /// empty output. Idempotent.
    pub fn destroy(&mut self) {
        if let Some(p) = self.producer.as_mut() {
            p.destroy();
        }
        self.destroyed = true;
    }

    /// Extract the branch pipe of a [`wrap`] prototype.
    ///
    /// # Panics
    ///
    /// A stream with a data source is not a branch prototype.
    fn into_branch_pipe(self) -> Pipe {
        assert!(
            self.producer.is_none(),
            "fork branches must be built from wrap(), not from a sourced stream"
        );
        self.pipe
    }

    /* ---------- terminals ---------- */

    /// Drive the pipeline for its side effects.
    pub fn run(self) -> Result<()> {
        self.execute()
    }

    /// Drive the pipeline and return surviving (key, value) pairs.
    pub fn to_pairs(mut self) -> Result<Vec<(Value, Value)>> {
        let out = Arc::new(Mutex::new(Vec::new()));
        self.pipe
            .append(Box::new(CollectVecOp::new(Arc::clone(&out))));
        self.execute()?;
        let pairs = std::mem::take(&mut *out.lock().unwrap());
        Ok(pairs)
    }

    /// Drive the pipeline and return surviving values.
    pub fn to_values(self) -> Result<Vec<Value>> {
        Ok(self.to_pairs()?.into_iter().map(|(_, v)| v).collect())
    }

    /// Drive the pipeline into a fresh [`Collector`].
    pub fn collect(self) -> Result<Collector> {
        let collector = Arc::new(Mutex::new(Collector::new()));
        self.collect_into(&collector)?;
        let inner = std::mem::take(&mut *collector.lock().unwrap());
        Ok(inner)
    }

    /// Drive the pipeline into a caller-owned collector.
    pub fn collect_into(mut self, collector: &Arc<Mutex<Collector>>) -> Result<()> {
        self.pipe
            .append(Box::new(CollectInOp::new(Arc::clone(collector))));
        self.execute()
    }

    /// First surviving (key, value) pair; stops pulling once found.
    pub fn first(mut self) -> Result<Option<(Value, Value)>> {
        let out = Arc::new(Mutex::new(None));
        self.pipe.append(Box::new(FirstOp::new(Arc::clone(&out))));
        self.execute()?;
        let found = out.lock().unwrap().take();
        Ok(found)
    }

    /// Last surviving (key, value) pair.
    pub fn last(mut self) -> Result<Option<(Value, Value)>> {
        let out = Arc::new(Mutex::new(None));
        self.pipe.append(Box::new(LastOp::new(Arc::clone(&out))));
        self.execute()?;
        let found = out.lock().unwrap().take();
        Ok(found)
    }

    /// First pair whose value satisfies the predicate; stops pulling once
    /// found.
    pub fn find<F>(self, pred: F) -> Result<Option<(Value, Value)>>
    where
        F: Fn(&Value) -> bool + 'static,
    {
        self.find_mode(pred, Mode::Value)
    }

    /// First pair whose selected slot(s) satisfy the predicate.
    pub fn find_mode<P>(mut self, pred: P, mode: Mode) -> Result<Option<(Value, Value)>>
    where
        P: Predicate + 'static,
    {
        let out = Arc::new(Mutex::new(None));
        self.pipe
            .append(Box::new(FindOp::new(Box::new(pred), mode, Arc::clone(&out))));
        self.execute()?;
        let found = out.lock().unwrap().take();
        Ok(found)
    }

    /// Number of surviving items.
    pub fn count(mut self) -> Result<u64> {
        let out = Arc::new(Mutex::new(0));
        self.pipe.append(Box::new(CountOp::new(Arc::clone(&out))));
        self.execute()?;
        let n = *out.lock().unwrap();
        Ok(n)
    }

    /// Fold surviving values through a reducer; `None` for an empty fold.
    pub fn fold<R>(mut self, reducer: R) -> Result<Option<Value>>
    where
        R: Reducer + 'static,
    {
        let out = Arc::new(Mutex::new(None));
        self.pipe
            .append(Box::new(ReduceOp::new(Box::new(reducer), Arc::clone(&out))));
        self.execute()?;
        let result = out.lock().unwrap().take();
        Ok(result)
    }

    /* ---------- the driver ---------- */

    /// Pull items one at a time, feed the chain, honor the halt flag and
    /// pending source swaps, then propagate completion once.
    fn execute(self) -> Result<()> {
        let Stream { pipe, producer, handlers, destroyed } = self;
        if destroyed {
            return Ok(());
        }
        let Some(producer) = producer else {
            panic!("cannot drive a wrap() stream directly; use it as a fork branch");
        };
        let mut chain = pipe.into_chain();
        let mut sig = Signal::new();
        let root = SourceFrame { producer, resume_index: 0, depth: 0 };
        drive_frames(&mut chain, &mut sig, root, Some(&handlers))?;
        // a halt from a satisfied limit/first must not suppress downstream
        // flushes; a handler-voted abort keeps them suppressed
        if !sig.is_aborted() {
            sig.resume();
        }
        sig.finish_stream();
        if let Err(err) = finish_nodes(&mut chain, &mut sig) {
            // flush-time failures route like any user-data error, but a
            // skip vote can only cut the flush short, not resume it
            if handlers.decide(&err, sig.item()) == ErrorAction::Unhandled {
                return Err(err);
            }
        }
        Ok(())
    }
}
