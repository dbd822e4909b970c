//! The operation chain under construction.
//!
//! A pipe owns the ordered nodes between source and terminal and performs
//! the append-time rewriting described in [`rewrite`](crate::rewrite). The
//! chain frame is structural: nodes can only be appended before the
//! (conceptual) end, the executor only walks forward, and nothing can be
//! spliced ahead of the head -- the classic head/tail sentinels exist as
//! API shape rather than as nodes that could be corrupted.
//!
//! A pipe is single-use: sealing it into a chain consumes it, and it is
//! deliberately not cloneable (a half-built or mid-flight chain is not
//! shareable state).

use crate::operation::{ChainNode, OpKind, Operation};
use crate::ops::sort::SortOp;
use crate::ops::sort_limited::SortLimitedOp;
use crate::ops::terminal::LastOp;
use crate::ops::{FlatOp, LimitOp, ReverseOp, TailOp};
use crate::rewrite::{Rule, RewriteDecision, rule_for};
use crate::signal::OpId;
use crate::traits::Reversed;
use log::debug;

#[derive(Default)]
pub struct Pipe {
    nodes: Vec<ChainNode>,
    next_id: OpId,
    rewrites: Vec<RewriteDecision>,
}

impl Pipe {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, op: Box<dyn Operation>) {
        let id = self.next_id;
        self.next_id += 1;
        self.nodes.push(ChainNode { id, op });
    }

    fn pop(&mut self) -> Box<dyn Operation> {
        self.nodes.pop().expect("rewrite on empty pipe").op
    }

    /// Append an operation, applying at most one rewrite rule against the
    /// current tail.
    pub fn append(&mut self, op: Box<dyn Operation>) {
        let tail_kind = self.nodes.last().map(|n| n.op.kind());
        match rule_for(tail_kind, op.kind()) {
            Rule::Append => self.push(op),
            Rule::MergeFlat => {
                let incoming = op
                    .into_any()
                    .downcast::<FlatOp>()
                    .expect("incoming flat node");
                let tail = self
                    .nodes
                    .last_mut()
                    .expect("flat tail")
                    .op
                    .as_any_mut()
                    .downcast_mut::<FlatOp>()
                    .expect("flat tail node");
                tail.deepen(incoming.max_depth());
                let depth = tail.max_depth();
                debug!("rewrite: merged adjacent flat, cap now {depth}");
                self.rewrites.push(RewriteDecision::MergedFlat { depth });
            }
            Rule::FuseSortTail => {
                let keep = op
                    .into_any()
                    .downcast::<TailOp>()
                    .expect("incoming tail node")
                    .len();
                let sort = self
                    .pop()
                    .into_any()
                    .downcast::<SortOp>()
                    .expect("sort tail node");
                let (cmp, by) = sort.into_parts();
                self.push(Box::new(SortLimitedOp::new(
                    keep,
                    Box::new(Reversed(cmp)),
                    by,
                    true,
                )));
                debug!("rewrite: sort+tail({keep}) fused into bounded reverse-sort");
                self.rewrites.push(RewriteDecision::FusedSortTail { keep });
            }
            Rule::FuseSortLast => {
                let last = op
                    .into_any()
                    .downcast::<LastOp>()
                    .expect("incoming last node");
                let sort = self
                    .pop()
                    .into_any()
                    .downcast::<SortOp>()
                    .expect("sort tail node");
                let (cmp, by) = sort.into_parts();
                self.push(Box::new(SortLimitedOp::new(
                    1,
                    Box::new(Reversed(cmp)),
                    by,
                    false,
                )));
                self.push(Box::new(last.into_first()));
                debug!("rewrite: sort+last fused into bounded reverse-sort + first");
                self.rewrites.push(RewriteDecision::FusedSortLast);
            }
            Rule::FlipSortLimited => {
                let tail = self
                    .nodes
                    .last_mut()
                    .expect("sort_limited tail")
                    .op
                    .as_any_mut()
                    .downcast_mut::<SortLimitedOp>()
                    .expect("sort_limited tail node");
                tail.flip_emission();
                debug!("rewrite: reverse absorbed into bounded sort direction");
                self.rewrites.push(RewriteDecision::FlippedSortLimited);
            }
            Rule::DropReverseAfterShuffle => {
                debug!("rewrite: dropped reverse after shuffle");
                self.rewrites
                    .push(RewriteDecision::DroppedReverseAfterShuffle);
            }
            Rule::SwapReverseTail => {
                let keep = op
                    .into_any()
                    .downcast::<TailOp>()
                    .expect("incoming tail node")
                    .len();
                let _reverse = self.pop();
                self.push(Box::new(LimitOp::new(keep)));
                self.push(Box::new(ReverseOp::new()));
                debug!("rewrite: reverse+tail({keep}) became limit({keep})+reverse");
                self.rewrites
                    .push(RewriteDecision::SwappedReverseTail { keep });
            }
        }
    }

    /// The kinds of the current nodes, head to tail.
    #[must_use]
    pub fn kinds(&self) -> Vec<OpKind> {
        self.nodes.iter().map(|n| n.op.kind()).collect()
    }

    /// Rewrites applied so far, in application order.
    #[must_use]
    pub fn rewrites(&self) -> &[RewriteDecision] {
        &self.rewrites
    }

    /// Whether any node can end the run before the source is exhausted.
    #[must_use]
    pub fn has_lazy_operation(&self) -> bool {
        self.nodes.iter().any(|n| n.op.is_lazy())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Seal the pipe for execution.
    pub(crate) fn into_chain(self) -> Vec<ChainNode> {
        self.nodes
    }
}
