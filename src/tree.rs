use crate::cache::TrainingCache;
use crate::delta::ModelDelta;
use crate::errors::EmberError;
use crate::histogram::{ClassStats, Histogram};
use crate::node::{LeafRange, QueuedSplit, TreeNode};
use crate::objective::Objective;
use crate::splitter::examine_node;

const ROOT: usize = 0;

/// Midpoint between the original bin IDs on either side of a committed
/// cut, with integer division. Divisions live between bins in the
/// external model format, and the outer engine interprets them this way.
fn division_value(hist: &Histogram, division_bin: usize) -> usize {
    (hist.bin_id(division_bin) + hist.bin_id(division_bin + 1)) / 2
}

fn leaf_range(nodes: &[TreeNode], node: usize) -> Result<LeafRange, EmberError> {
    match &nodes[node] {
        TreeNode::Leaf { range, .. } => Ok(*range),
        TreeNode::Split { .. } => {
            log::warn!("expected node {} to be a leaf", node);
            Err(EmberError::Internal("expected a leaf node"))
        }
    }
}

fn reserve_pair(
    nodes: &mut Vec<TreeNode>,
    node_stats: &mut Vec<ClassStats>,
    n_classes: usize,
) -> Result<(), EmberError> {
    nodes.try_reserve(2).map_err(|_| {
        log::warn!("node arena growth failed");
        EmberError::AllocationFailure("node arena")
    })?;
    node_stats.try_reserve(2 * n_classes).map_err(|_| {
        log::warn!("node stat arena growth failed");
        EmberError::AllocationFailure("node stat arena")
    })?;
    Ok(())
}

#[derive(Debug, Default)]
struct EmitCursor {
    division: usize,
    value: usize,
}

/// In-order walk of the grown tree. Internal nodes emit their division
/// between the two subtrees; leaves emit one value per class. Staged but
/// uncommitted candidates still carry the `Leaf` variant, so they land
/// here as leaves.
fn flatten_node<O: Objective>(
    nodes: &[TreeNode],
    node_stats: &[ClassStats],
    hist: &Histogram,
    node: usize,
    divisions: &mut [usize],
    values: &mut [f64],
    cursor: &mut EmitCursor,
) {
    match &nodes[node] {
        TreeNode::Split {
            division_bin,
            children,
        } => {
            flatten_node::<O>(nodes, node_stats, hist, *children, divisions, values, cursor);
            divisions[cursor.division] = division_value(hist, *division_bin);
            cursor.division += 1;
            flatten_node::<O>(
                nodes,
                node_stats,
                hist,
                *children + 1,
                divisions,
                values,
                cursor,
            );
        }
        TreeNode::Leaf { range, .. } => {
            let n_classes = hist.n_classes();
            let base = node * n_classes;
            for k in 0..n_classes {
                values[cursor.value + k] = O::leaf_delta(&node_stats[base + k], range.instances);
            }
            cursor.value += n_classes;
        }
    }
}

/// Grow one best-first tree over the compacted histogram held by the
/// cache and write the resulting divisions and values into `delta`.
/// Returns the total gain over all committed splits.
pub(crate) fn grow_decision_tree<O: Objective>(
    cache: &mut TrainingCache,
    instances_total: usize,
    max_splits: usize,
    min_instances_for_split: usize,
    delta: &mut ModelDelta,
) -> Result<f64, EmberError> {
    let n_classes = cache.histogram.n_classes();
    let n_buckets = cache.histogram.n_bins();
    debug_assert!(instances_total >= 1);
    debug_assert!(n_buckets >= 1);
    log::trace!(
        "growing tree: {} buckets, {} instances, max {} splits",
        n_buckets,
        instances_total,
        max_splits
    );

    if instances_total < min_instances_for_split || n_buckets == 1 || max_splits == 0 {
        // Nothing to split: a single leaf over the whole sample.
        delta.set_division_count(0, 0).map_err(|e| {
            log::warn!("division sizing failed for the no-split tree: {}", e);
            e
        })?;
        delta.ensure_value_capacity(n_classes).map_err(|e| {
            log::warn!("value sizing failed for the no-split tree: {}", e);
            e
        })?;
        let values = delta.values_mut();
        for k in 0..n_classes {
            values[k] = O::leaf_delta(&cache.totals[k], instances_total);
        }
        log::trace!("exited tree growth with no splits");
        return Ok(0.0);
    }

    let TrainingCache {
        histogram,
        nodes,
        node_stats,
        frontier,
        split_scratch,
        totals,
    } = cache;

    // The root and its two children always fit before the first commit.
    nodes.try_reserve(3).map_err(|_| {
        log::warn!("initial node arena allocation failed");
        EmberError::AllocationFailure("node arena")
    })?;
    node_stats.try_reserve(3 * n_classes).map_err(|_| {
        log::warn!("initial node stat arena allocation failed");
        EmberError::AllocationFailure("node stat arena")
    })?;

    nodes.push(TreeNode::new_leaf(LeafRange {
        bin_first: 0,
        bin_last: n_buckets - 1,
        instances: instances_total,
    }));
    node_stats.extend_from_slice(totals);
    examine_node::<O>(histogram, nodes, node_stats, split_scratch, ROOT).map_err(|e| {
        log::warn!("root split examination failed: {}", e);
        e
    })?;

    if max_splits == 1 || n_buckets == 2 {
        // Exactly one split; skip the frontier entirely.
        let staged = nodes[ROOT].commit_split().ok_or_else(|| {
            log::warn!("root had no staged candidate");
            EmberError::Internal("root had no staged candidate")
        })?;
        debug_assert!(
            n_buckets != 2
                || (!nodes[staged.children].is_splittable(min_instances_for_split)
                    && !nodes[staged.children + 1].is_splittable(min_instances_for_split))
        );

        delta.set_division_count(0, 1).map_err(|e| {
            log::warn!("division sizing failed for the one-split tree: {}", e);
            e
        })?;
        let value_count = n_classes.checked_mul(2).ok_or_else(|| {
            log::warn!("value count overflowed for the one-split tree");
            EmberError::CapacityOverflow("value buffer")
        })?;
        delta.ensure_value_capacity(value_count).map_err(|e| {
            log::warn!("value sizing failed for the one-split tree: {}", e);
            e
        })?;

        let left = leaf_range(nodes, staged.children)?;
        let right = leaf_range(nodes, staged.children + 1)?;
        let (divisions, values) = delta.emit_buffers(0).map_err(|e| {
            log::warn!("unable to borrow the one-split tree's output buffers: {}", e);
            e
        })?;
        divisions[0] = division_value(histogram, staged.division_bin);
        for k in 0..n_classes {
            values[k] = O::leaf_delta(&node_stats[staged.children * n_classes + k], left.instances);
            values[n_classes + k] = O::leaf_delta(
                &node_stats[(staged.children + 1) * n_classes + k],
                right.instances,
            );
        }
        log::trace!("exited tree growth via the one-split fast path");
        return Ok(staged.gain);
    }

    // Best-first growth. The frontier is reused across builds; drain
    // whatever the previous tree left behind before trusting it.
    frontier.clear();
    let mut order: u64 = 0;
    let mut splits = 0;
    let mut total_gain = 0.0;
    let mut current = ROOT;
    loop {
        // A node is committed only here, after it came off the frontier
        // (the root skips the queue entirely).
        let staged = nodes[current].commit_split().ok_or_else(|| {
            log::warn!("committed node {} without a staged candidate", current);
            EmberError::Internal("committed a node without a candidate")
        })?;
        total_gain += staged.gain;
        splits += 1;

        for child in [staged.children, staged.children + 1] {
            if !nodes[child].is_splittable(min_instances_for_split) {
                // Stays a leaf; the flattener keys on the variant.
                continue;
            }
            reserve_pair(nodes, node_stats, n_classes)?;
            examine_node::<O>(histogram, nodes, node_stats, split_scratch, child).map_err(
                |e| {
                    log::warn!("split examination failed for node {}: {}", child, e);
                    e
                },
            )?;
            let gain = nodes[child]
                .candidate()
                .map(|staged| staged.gain)
                .ok_or_else(|| {
                    log::warn!("examined node {} has no staged candidate", child);
                    EmberError::Internal("examined child has no candidate")
                })?;
            frontier.push(QueuedSplit {
                gain,
                order,
                node: child,
            });
            order += 1;
        }

        if splits >= max_splits {
            break;
        }
        current = match frontier.pop() {
            Some(entry) => entry.node,
            None => break,
        };
    }

    delta.set_division_count(0, splits).map_err(|e| {
        log::warn!("division sizing failed after {} splits: {}", splits, e);
        e
    })?;
    let value_count = n_classes.checked_mul(splits + 1).ok_or_else(|| {
        log::warn!("value count overflowed after {} splits", splits);
        EmberError::CapacityOverflow("value buffer")
    })?;
    delta.ensure_value_capacity(value_count).map_err(|e| {
        log::warn!("value sizing failed after {} splits: {}", splits, e);
        e
    })?;

    let (divisions, values) = delta.emit_buffers(0).map_err(|e| {
        log::warn!("unable to borrow the output buffers: {}", e);
        e
    })?;
    let mut cursor = EmitCursor::default();
    flatten_node::<O>(
        nodes,
        node_stats,
        histogram,
        ROOT,
        divisions,
        values,
        &mut cursor,
    );
    debug_assert_eq!(cursor.division, splits);
    debug_assert_eq!(cursor.value, value_count);

    log::trace!("exited tree growth with {} splits", splits);
    Ok(total_gain)
}
