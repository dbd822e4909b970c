//! Error routing for user-supplied callables.
//!
//! Failures raised by injected predicates, mappers, discriminators and
//! consumers while processing a specific item are routed through an
//! optional, replaceable handler chain attached to the stream. Handlers
//! inspect the error and the offending item and vote on what happens next.
//! Engine invariant violations (malformed chain topology, invalid
//! constructor arguments, resizing a sealed sort buffer) are never routed
//! here -- they panic at the point of misuse.
//!
//! All registered handlers run for every error; the most severe vote wins
//! (`Abort` over `Skip` over `Unhandled`). With no handlers registered, the
//! error propagates out of the terminal call and aborts the run.

use crate::item::Item;
use anyhow::Error;
use log::{error, warn};

/// A handler's vote on how to proceed after a user-data error.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorAction {
    /// Drop the offending item and keep processing.
    Skip,
    /// Stop the run; terminal accessors see what was processed so far.
    Abort,
    /// No opinion: propagate unless another handler decides otherwise.
    Unhandled,
}

/// Inspects a user-data error plus the item being processed when it fired.
pub trait ErrorHandler {
    fn handle(&self, err: &Error, item: &Item) -> ErrorAction;
}

impl<F> ErrorHandler for F
where
    F: Fn(&Error, &Item) -> ErrorAction,
{
    fn handle(&self, err: &Error, item: &Item) -> ErrorAction {
        self(err, item)
    }
}

/// Drop failing items silently.
#[must_use]
pub fn skip_errors() -> Box<dyn ErrorHandler> {
    Box::new(|_: &Error, _: &Item| ErrorAction::Skip)
}

/// Stop the run on the first failing item.
#[must_use]
pub fn abort_on_error() -> Box<dyn ErrorHandler> {
    Box::new(|_: &Error, _: &Item| ErrorAction::Abort)
}

/// Log the failure at warn level, then drop the item.
#[must_use]
pub fn log_and_skip() -> Box<dyn ErrorHandler> {
    Box::new(|err: &Error, item: &Item| {
        warn!("skipping item {:?}: {err:#}", item.key);
        ErrorAction::Skip
    })
}

/// Log the failure at error level, then stop the run.
#[must_use]
pub fn log_and_abort() -> Box<dyn ErrorHandler> {
    Box::new(|err: &Error, item: &Item| {
        error!("aborting stream at item {:?}: {err:#}", item.key);
        ErrorAction::Abort
    })
}

/// The ordered set of handlers attached to a stream.
#[derive(Default)]
pub struct HandlerChain {
    handlers: Vec<Box<dyn ErrorHandler>>,
}

impl HandlerChain {
    /// Register an additional handler. Handlers run in registration order.
    pub fn push(&mut self, handler: Box<dyn ErrorHandler>) {
        self.handlers.push(handler);
    }

    /// Replace every registered handler with `handler`.
    pub fn replace(&mut self, handler: Box<dyn ErrorHandler>) {
        self.handlers.clear();
        self.handlers.push(handler);
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler and combine the votes: `Abort` dominates, then
    /// `Skip`; with no handlers (or only `Unhandled` votes) the caller
    /// must propagate the error.
    #[must_use]
    pub fn decide(&self, err: &Error, item: &Item) -> ErrorAction {
        let mut decision = ErrorAction::Unhandled;
        for handler in &self.handlers {
            match handler.handle(err, item) {
                ErrorAction::Abort => decision = ErrorAction::Abort,
                ErrorAction::Skip if decision != ErrorAction::Abort => {
                    decision = ErrorAction::Skip;
                }
                _ => {}
            }
        }
        decision
    }
}
