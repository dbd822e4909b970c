//! The slot-selection mode shared by filters, uniqueness and find.

use crate::item::Item;
use crate::traits::Predicate;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// Which slot(s) of an item a predicate or comparator applies to.
///
/// This is the closed enum behind every "by value / by key / by both / by
/// either" switch in the public API; operations never branch on raw flags.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// Test the value slot only.
    #[default]
    Value,
    /// Test the key slot only.
    Key,
    /// Both slots must satisfy the predicate.
    Both,
    /// Either slot satisfying the predicate is enough.
    Any,
}

/// Apply a single-slot predicate to an item under the given mode.
pub fn mode_allows(pred: &dyn Predicate, item: &Item, mode: Mode) -> Result<bool> {
    Ok(match mode {
        Mode::Value => pred.test(&item.value)?,
        Mode::Key => pred.test(&item.key)?,
        Mode::Both => pred.test(&item.value)? && pred.test(&item.key)?,
        Mode::Any => pred.test(&item.value)? || pred.test(&item.key)?,
    })
}
