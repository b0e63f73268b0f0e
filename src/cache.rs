use std::collections::BinaryHeap;

use crate::histogram::{ClassStats, Histogram};
use crate::node::{QueuedSplit, TreeNode};

/// Reusable per-class running sums for the cut-position loop: the left
/// side, the residual-only right side, and the best-so-far left snapshot.
#[derive(Debug, Default)]
pub(crate) struct SplitScratch {
    pub left_sums: Vec<ClassStats>,
    pub right_residuals: Vec<f64>,
    pub best_sums: Vec<ClassStats>,
}

impl SplitScratch {
    pub fn reset(&mut self, n_classes: usize) {
        self.left_sums.clear();
        self.right_residuals.clear();
        self.best_sums.clear();
        self.left_sums.resize(n_classes, ClassStats::default());
        self.right_residuals.resize(n_classes, 0.0);
        self.best_sums.resize(n_classes, ClassStats::default());
    }
}

/// Thread-local scratch for tree building. One cache belongs to exactly
/// one worker for the duration of a build; its containers are cleared
/// between trees rather than freed, so steady-state boosting rounds run
/// without fresh allocations.
#[derive(Debug, Default)]
pub struct TrainingCache {
    pub(crate) histogram: Histogram,
    pub(crate) nodes: Vec<TreeNode>,
    pub(crate) node_stats: Vec<ClassStats>,
    pub(crate) frontier: BinaryHeap<QueuedSplit>,
    pub(crate) split_scratch: SplitScratch,
    pub(crate) totals: Vec<ClassStats>,
}

impl TrainingCache {
    pub fn new() -> Self {
        TrainingCache::default()
    }

    /// Clear per-tree state ahead of a build.
    pub(crate) fn reset_for_tree(&mut self, n_classes: usize) {
        self.nodes.clear();
        self.node_stats.clear();
        self.split_scratch.reset(n_classes);
        self.totals.clear();
        self.totals.resize(n_classes, ClassStats::default());
    }
}
