use serde::{Deserialize, Serialize};

/// A single pre-binned feature. Bin construction happens upstream; the
/// core only needs to know how many bins the feature was cut into.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub num_bins: usize,
}

impl Feature {
    pub fn new(num_bins: usize) -> Self {
        Feature { num_bins }
    }
}

/// A borrowed view of the sampled training set for one tree build.
///
/// The layout is one bin index per instance, with residuals (and, for
/// classification, Newton denominators) stored instance-major with
/// `n_classes` entries per instance. Regression passes an empty
/// denominator slice. The core makes exactly one linear pass over it.
#[derive(Debug, Clone, Copy)]
pub struct SampledSet<'a> {
    bins: &'a [u16],
    residuals: &'a [f64],
    denominators: &'a [f64],
    n_classes: usize,
}

impl<'a> SampledSet<'a> {
    /// `residuals.len()` must equal `bins.len() * n_classes`, and
    /// `denominators` must either be empty or the same shape as
    /// `residuals`.
    pub fn new(
        bins: &'a [u16],
        residuals: &'a [f64],
        denominators: &'a [f64],
        n_classes: usize,
    ) -> Self {
        debug_assert!(n_classes >= 1);
        debug_assert_eq!(residuals.len(), bins.len() * n_classes);
        debug_assert!(denominators.is_empty() || denominators.len() == residuals.len());
        SampledSet {
            bins,
            residuals,
            denominators,
            n_classes,
        }
    }

    #[inline]
    pub fn n_instances(&self) -> usize {
        self.bins.len()
    }

    #[inline]
    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    #[inline]
    pub fn bin(&self, instance: usize) -> usize {
        self.bins[instance] as usize
    }

    #[inline]
    pub fn residual(&self, instance: usize, class: usize) -> f64 {
        self.residuals[instance * self.n_classes + class]
    }

    #[inline]
    pub fn denominator(&self, instance: usize, class: usize) -> f64 {
        self.denominators[instance * self.n_classes + class]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampled_set_accessors() {
        let bins = vec![0u16, 2, 1];
        let residuals = vec![1.0, -1.0, 0.5, -0.5, 0.25, -0.25];
        let denominators = vec![0.1; 6];
        let set = SampledSet::new(&bins, &residuals, &denominators, 2);
        assert_eq!(set.n_instances(), 3);
        assert_eq!(set.bin(1), 2);
        assert_eq!(set.residual(1, 0), 0.5);
        assert_eq!(set.residual(2, 1), -0.25);
        assert_eq!(set.denominator(0, 1), 0.1);
    }
}
