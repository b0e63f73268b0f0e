use crate::cache::SplitScratch;
use crate::errors::EmberError;
use crate::histogram::{ClassStats, Histogram};
use crate::node::{LeafRange, SplitCandidate, TreeNode};
use crate::objective::Objective;
use crate::utils::split_score;

/// Find the best cut for a leaf and stage it as a split candidate.
///
/// The left side starts as the leaf's first bucket and sweeps rightward,
/// maintaining running per-class sums so each cut position costs O(K).
/// The two child leaves are appended to the arena as a contiguous pair
/// (their aggregates land in the node-stat arena), and the candidate is
/// recorded on the parent. Staging never commits: the parent stays a
/// leaf until the grower pops it off the frontier.
///
/// The caller guarantees the leaf spans at least two buckets and that
/// the arena has room for one more pair.
pub(crate) fn examine_node<O: Objective>(
    hist: &Histogram,
    nodes: &mut Vec<TreeNode>,
    node_stats: &mut Vec<ClassStats>,
    scratch: &mut SplitScratch,
    node: usize,
) -> Result<(), EmberError> {
    let range = match &nodes[node] {
        TreeNode::Leaf { range, .. } => *range,
        TreeNode::Split { .. } => {
            return Err(EmberError::Internal("examined a committed node"))
        }
    };
    debug_assert!(range.bin_first < range.bin_last);
    log::trace!(
        "examining node {} over buckets [{}, {}]",
        node,
        range.bin_first,
        range.bin_last
    );

    let n_classes = hist.n_classes();
    let parent_base = node * n_classes;

    // Seed the sweep with the leftmost bucket on its own.
    let mut left_instances = hist.count(range.bin_first);
    let mut right_instances = range.instances - left_instances;
    let mut best_score = 0.0;
    for k in 0..n_classes {
        let bucket = hist.stat(range.bin_first, k);
        let left_residual = bucket.residual_sum;
        let right_residual = node_stats[parent_base + k].residual_sum - left_residual;
        best_score += split_score(left_residual, left_instances)
            + split_score(right_residual, right_instances);
        scratch.left_sums[k] = *bucket;
        scratch.best_sums[k] = *bucket;
        scratch.right_residuals[k] = right_residual;
    }

    let mut best_bin = range.bin_first;
    let mut best_left_instances = left_instances;
    for cut in (range.bin_first + 1)..range.bin_last {
        let moved = hist.count(cut);
        left_instances += moved;
        right_instances -= moved;

        let mut score = 0.0;
        for k in 0..n_classes {
            let bucket = hist.stat(cut, k);
            if O::USES_DENOMINATOR {
                scratch.left_sums[k].denominator_sum += bucket.denominator_sum;
            }
            let left_residual = scratch.left_sums[k].residual_sum + bucket.residual_sum;
            let right_residual = scratch.right_residuals[k] - bucket.residual_sum;
            scratch.left_sums[k].residual_sum = left_residual;
            scratch.right_residuals[k] = right_residual;
            score += split_score(left_residual, left_instances)
                + split_score(right_residual, right_instances);
        }

        // TODO: randomly choose among cuts with equal scores instead of
        // always keeping the first one found.
        if best_score < score {
            best_score = score;
            best_bin = cut;
            best_left_instances = left_instances;
            scratch.best_sums.copy_from_slice(&scratch.left_sums);
        }
    }

    // Materialize the children at the end of the arena: left takes the
    // best snapshot, right takes parent minus best.
    let children = nodes.len();
    nodes.push(TreeNode::new_leaf(LeafRange {
        bin_first: range.bin_first,
        bin_last: best_bin,
        instances: best_left_instances,
    }));
    nodes.push(TreeNode::new_leaf(LeafRange {
        bin_first: best_bin + 1,
        bin_last: range.bin_last,
        instances: range.instances - best_left_instances,
    }));
    let mut parent_score = 0.0;
    for k in 0..n_classes {
        let parent = node_stats[parent_base + k];
        parent_score += split_score(parent.residual_sum, range.instances);
        node_stats.push(scratch.best_sums[k]);
    }
    for k in 0..n_classes {
        let parent = node_stats[parent_base + k];
        let best = scratch.best_sums[k];
        node_stats.push(ClassStats {
            residual_sum: parent.residual_sum - best.residual_sum,
            denominator_sum: parent.denominator_sum - best.denominator_sum,
        });
    }

    // Splitting can only improve the partition score on the training
    // set; a positive overflow of both scores to infinity is the one way
    // the subtraction can go wrong, and it shows up as NaN.
    let mut gain = best_score - parent_score;
    if gain.is_nan() {
        gain = 0.0;
    }
    debug_assert!(gain >= -1e-10);

    nodes[node].stage_candidate(SplitCandidate {
        division_bin: best_bin,
        gain,
        children,
    });
    log::trace!(
        "staged split for node {}: division bin {}, gain {}",
        node,
        best_bin,
        gain
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::SampledSet;
    use crate::objective::SquaredLoss;

    fn examine_root(
        bins: &[u16],
        residuals: &[f64],
        n_bins: usize,
    ) -> (Histogram, Vec<TreeNode>, Vec<ClassStats>) {
        let set = SampledSet::new(bins, residuals, &[], 1);
        let mut hist = Histogram::new();
        hist.reset(n_bins, 1).unwrap();
        hist.accumulate::<SquaredLoss>(&set);
        let mut totals = vec![ClassStats::default()];
        let instances = hist.compact(&mut totals);

        let mut nodes = vec![TreeNode::new_leaf(LeafRange {
            bin_first: 0,
            bin_last: hist.n_bins() - 1,
            instances,
        })];
        let mut node_stats = totals.clone();
        let mut scratch = SplitScratch::default();
        scratch.reset(1);
        examine_node::<SquaredLoss>(&hist, &mut nodes, &mut node_stats, &mut scratch, 0)
            .unwrap();
        (hist, nodes, node_stats)
    }

    #[test]
    fn test_best_cut_in_the_middle() {
        // Bin counts {10, 10, 10}, residual sums {10, 10, -20}: the cut
        // after the second bin separates the positive mass cleanly.
        let mut bins: Vec<u16> = Vec::new();
        let mut residuals = Vec::new();
        for (bin, r) in [(0u16, 1.0), (1, 1.0), (2, -2.0)] {
            for _ in 0..10 {
                bins.push(bin);
                residuals.push(r);
            }
        }
        let (_, nodes, node_stats) = examine_root(&bins, &residuals, 3);

        let staged = nodes[0].candidate().unwrap();
        assert_eq!(staged.division_bin, 1);
        // Children score 400/20 + 400/10, parent score 0.
        assert!((staged.gain - 60.0).abs() < 1e-12);
        assert_eq!(node_stats[staged.children].residual_sum, 20.0);
        assert_eq!(node_stats[staged.children + 1].residual_sum, -20.0);
        match &nodes[staged.children] {
            TreeNode::Leaf { range, .. } => {
                assert_eq!((range.bin_first, range.bin_last, range.instances), (0, 1, 20));
            }
            _ => panic!("left child should be a leaf"),
        }
    }

    #[test]
    fn test_equal_scores_keep_first_cut() {
        // Symmetric layout: both cuts score identically, the first wins.
        let bins = vec![0u16, 1, 1, 2];
        let residuals = vec![1.0, 0.0, 0.0, -1.0];
        let (_, nodes, _) = examine_root(&bins, &residuals, 3);
        assert_eq!(nodes[0].candidate().unwrap().division_bin, 0);
    }

    #[test]
    fn test_children_partition_parent() {
        let bins = vec![0u16, 1, 2, 3, 3];
        let residuals = vec![5.0, -1.0, 2.0, 0.5, 0.5];
        let (_, nodes, node_stats) = examine_root(&bins, &residuals, 4);
        let staged = nodes[0].candidate().unwrap();
        let (left, right) = match (&nodes[staged.children], &nodes[staged.children + 1]) {
            (TreeNode::Leaf { range: l, .. }, TreeNode::Leaf { range: r, .. }) => (*l, *r),
            _ => panic!("children should be leaves"),
        };
        assert_eq!(left.instances + right.instances, 5);
        assert_eq!(left.bin_last + 1, right.bin_first);
        let sum = node_stats[staged.children].residual_sum
            + node_stats[staged.children + 1].residual_sum;
        assert!((sum - 7.0).abs() < 1e-12);
    }
}
