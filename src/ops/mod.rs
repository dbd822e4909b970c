//! Concrete operation nodes.
//!
//! Stateless nodes (`filter`, `map`, `each`, `skip`, `limit`, `dispatch`)
//! forward or drop the current item in place. Buffering nodes (`sort`,
//! `sort_limited`, `reverse`, `shuffle`, `tail`, `unique`, `gather`,
//! `window`, `fork`, `reduce`) absorb items and re-emit at flush. Terminal
//! nodes capture results into shared slots read by the stream façade after
//! the run.

pub mod filter;
pub mod flat;
pub mod fork;
pub mod gather;
pub mod limit;
pub mod map;
pub mod reduce;
pub mod sort;
pub mod sort_limited;
pub mod terminal;
pub mod unique;

pub use filter::FilterOp;
pub use flat::FlatOp;
pub use fork::{DispatchOp, ForkOp};
pub use gather::{GatherOp, WindowOp};
pub use limit::{LimitOp, SkipOp};
pub use map::{EachOp, MapOp};
pub use reduce::ReduceOp;
pub use sort::{ReverseOp, ShuffleOp, SortOp, TailOp};
pub use sort_limited::{BoundedSortBuffer, BufferState, SortLimitedOp};
pub use terminal::{CollectInOp, CollectVecOp, CountOp, FindOp, FirstOp, LastOp};
pub use unique::UniqueOp;
