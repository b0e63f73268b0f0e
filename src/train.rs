use crate::cache::TrainingCache;
use crate::data::{Feature, SampledSet};
use crate::delta::ModelDelta;
use crate::errors::EmberError;
use crate::objective::Objective;
use crate::tree::grow_decision_tree;

/// Train the degenerate no-feature tree: every instance falls in one
/// implicit bucket and the model delta is a single leaf, one value per
/// class. No tree, no frontier, no node arena.
pub fn train_zero_dimensional<O: Objective>(
    cache: &mut TrainingCache,
    set: &SampledSet,
    delta: &mut ModelDelta,
) -> Result<(), EmberError> {
    log::trace!("entered zero-dimensional training");
    debug_assert!(O::USES_DENOMINATOR || set.n_classes() == 1);
    let n_classes = set.n_classes();
    cache.reset_for_tree(n_classes);

    let instances = set.n_instances();
    for i in 0..instances {
        for k in 0..n_classes {
            cache.totals[k].residual_sum += set.residual(i, k);
            if O::USES_DENOMINATOR {
                cache.totals[k].denominator_sum += set.denominator(i, k);
            }
        }
    }
    debug_assert!(instances >= 1);

    delta.ensure_value_capacity(n_classes)?;
    let values = delta.values_mut();
    for k in 0..n_classes {
        values[k] = O::leaf_delta(&cache.totals[k], instances);
    }
    log::trace!("exited zero-dimensional training");
    Ok(())
}

/// Train one shallow tree on a single pre-binned feature and write its
/// divisions and leaf values into `delta`. Returns the total gain over
/// all committed splits.
///
/// `min_instances_for_split` is the smallest instance count a leaf needs
/// before it may act as a parent; `max_splits` bounds the work. The
/// sampled set must be non-empty and every bin index must lie below
/// `feature.num_bins`.
pub fn train_single_dimensional<O: Objective>(
    cache: &mut TrainingCache,
    set: &SampledSet,
    feature: &Feature,
    max_splits: usize,
    min_instances_for_split: usize,
    delta: &mut ModelDelta,
) -> Result<f64, EmberError> {
    log::trace!(
        "entered single-dimensional training: {} bins, {} instances",
        feature.num_bins,
        set.n_instances()
    );
    debug_assert!(feature.num_bins >= 1);
    debug_assert!(O::USES_DENOMINATOR || set.n_classes() == 1);
    let n_classes = set.n_classes();
    cache.reset_for_tree(n_classes);

    cache.histogram.reset(feature.num_bins, n_classes).map_err(|e| {
        log::warn!("histogram buffer setup failed: {}", e);
        e
    })?;
    cache.histogram.accumulate::<O>(set);

    let instances_total = cache.histogram.compact(&mut cache.totals);
    debug_assert!(instances_total >= 1);
    debug_assert!(cache.histogram.n_bins() >= 1);

    let total_gain = grow_decision_tree::<O>(
        cache,
        instances_total,
        max_splits,
        min_instances_for_split,
        delta,
    )?;
    log::trace!("exited single-dimensional training");
    Ok(total_gain)
}
