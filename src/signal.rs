//! The shared control cell threaded through every operation call.
//!
//! A [`Signal`] carries the single mutable [`Item`] plus the pipeline
//! control state: the cooperative halt flag, the end-of-stream marker, the
//! set of operations detached from the chain, and the pending source-swap
//! request that implements `continue_with` as an explicit trampoline (the
//! driving loop inspects it after each `handle` call returns, so restarts
//! never grow the call stack).

use crate::item::Item;
use crate::producer::Producer;

/// Identifier assigned to each operation when it is appended to a pipe.
pub type OpId = u64;

/// A recorded request to swap the active data source.
pub struct Continuation {
    /// The producer to pull from next.
    pub producer: Box<dyn Producer>,
    /// The operation at which items from the new producer re-enter the
    /// chain (instead of the head).
    pub resume_at: OpId,
}

/// Shared mutable carrier of the current item and pipeline control flags.
///
/// Exactly one signal exists per executing stream; operations communicate
/// exclusively by mutating it, never via return values.
pub struct Signal {
    item: Item,
    halted: bool,
    aborted: bool,
    finished: bool,
    forgotten: Vec<OpId>,
    continuation: Option<Continuation>,
    source_depth: usize,
}

impl Signal {
    #[must_use]
    pub fn new() -> Self {
        Self {
            item: Item::empty(),
            halted: false,
            aborted: false,
            finished: false,
            forgotten: Vec::new(),
            continuation: None,
            source_depth: 0,
        }
    }

    #[must_use]
    pub fn item(&self) -> &Item {
        &self.item
    }

    pub fn item_mut(&mut self) -> &mut Item {
        &mut self.item
    }

    /// Request that the driving loop stop pulling upstream once the current
    /// item finishes propagating. This is the sole cancellation mechanism,
    /// used by `limit`, `first`/`find` and abort-voting error handlers.
    pub fn halt(&mut self) {
        self.halted = true;
    }

    #[must_use]
    pub fn is_halted(&self) -> bool {
        self.halted
    }

    /// Clear the halt flag between the pull loop and finish propagation,
    /// so a satisfied `limit` upstream does not suppress downstream
    /// flushes. Not called after an abort.
    pub(crate) fn resume(&mut self) {
        self.halted = false;
    }

    /// Record that an abort-voting error handler stopped the run; flushes
    /// stay suppressed.
    pub(crate) fn mark_aborted(&mut self) {
        self.aborted = true;
    }

    #[must_use]
    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    /// Mark end-of-input. Monotonic: once set, stays set.
    pub fn finish_stream(&mut self) {
        self.finished = true;
    }

    #[must_use]
    pub fn is_stream_finished(&self) -> bool {
        self.finished
    }

    /// Detach an operation from the chain. Idempotent: forgetting an
    /// already-forgotten operation is a no-op. Feeding skips forgotten
    /// operations, so an operation that has done all it will ever do can
    /// remove its own per-item overhead.
    pub fn forget(&mut self, op: OpId) {
        if !self.forgotten.contains(&op) {
            self.forgotten.push(op);
        }
    }

    #[must_use]
    pub fn is_forgotten(&self, op: OpId) -> bool {
        self.forgotten.contains(&op)
    }

    /// Record a pending source swap: the driving loop will push `producer`
    /// as a nested source frame and resume forwarding at `resume_at`.
    ///
    /// # Panics
    ///
    /// A second request before the first has been consumed is an engine
    /// invariant violation: one `handle` call can splice at most one source.
    pub fn continue_with(&mut self, producer: Box<dyn Producer>, resume_at: OpId) {
        assert!(
            self.continuation.is_none(),
            "continue_with requested while a continuation is already pending"
        );
        self.continuation = Some(Continuation { producer, resume_at });
    }

    pub fn take_continuation(&mut self) -> Option<Continuation> {
        self.continuation.take()
    }

    pub fn clear_continuation(&mut self) {
        self.continuation = None;
    }

    /// Nesting depth of the active source frame (0 for the root producer).
    /// Maintained by the driver; consumed by `flat` for its recursion cap.
    #[must_use]
    pub fn source_depth(&self) -> usize {
        self.source_depth
    }

    pub fn set_source_depth(&mut self, depth: usize) {
        self.source_depth = depth;
    }
}

impl Default for Signal {
    fn default() -> Self {
        Self::new()
    }
}
