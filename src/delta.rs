use serde::{Deserialize, Serialize};

use crate::errors::EmberError;

/// The additive-model update produced for one feature by one tree: an
/// ordered division array per dimension (original-bin-ID midpoints) and
/// a flat value array holding one entry per class per partition cell.
///
/// Buffers are sized on demand through fallible methods so a failed
/// build never leaves the engine without a usable delta object; after a
/// build error the contents are indeterminate but safe to drop or
/// resize.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelDelta {
    divisions: Vec<Vec<usize>>,
    values: Vec<f64>,
}

impl ModelDelta {
    pub fn new(n_dimensions: usize) -> Self {
        ModelDelta {
            divisions: vec![Vec::new(); n_dimensions],
            values: Vec::new(),
        }
    }

    pub fn n_dimensions(&self) -> usize {
        self.divisions.len()
    }

    /// Resize one dimension's division array, zero-filled.
    pub fn set_division_count(
        &mut self,
        dimension: usize,
        count: usize,
    ) -> Result<(), EmberError> {
        let divisions = self
            .divisions
            .get_mut(dimension)
            .ok_or(EmberError::InvalidDimension(dimension))?;
        divisions.clear();
        divisions
            .try_reserve(count)
            .map_err(|_| EmberError::AllocationFailure("division buffer"))?;
        divisions.resize(count, 0);
        Ok(())
    }

    /// Resize the value array, zero-filled.
    pub fn ensure_value_capacity(&mut self, count: usize) -> Result<(), EmberError> {
        self.values.clear();
        self.values
            .try_reserve(count)
            .map_err(|_| EmberError::AllocationFailure("value buffer"))?;
        self.values.resize(count, 0.0);
        Ok(())
    }

    pub fn divisions(&self, dimension: usize) -> &[usize] {
        &self.divisions[dimension]
    }

    pub fn divisions_mut(&mut self, dimension: usize) -> &mut [usize] {
        &mut self.divisions[dimension]
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    /// Both writable regions at once, for the flattener.
    pub(crate) fn emit_buffers(
        &mut self,
        dimension: usize,
    ) -> Result<(&mut [usize], &mut [f64]), EmberError> {
        let divisions = self
            .divisions
            .get_mut(dimension)
            .ok_or(EmberError::InvalidDimension(dimension))?;
        Ok((divisions.as_mut_slice(), self.values.as_mut_slice()))
    }

    pub fn json_dump(&self) -> Result<String, EmberError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn json_load(json: &str) -> Result<Self, EmberError> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sizing() {
        let mut delta = ModelDelta::new(1);
        delta.set_division_count(0, 3).unwrap();
        delta.ensure_value_capacity(4).unwrap();
        assert_eq!(delta.divisions(0), &[0, 0, 0]);
        assert_eq!(delta.values().len(), 4);
        assert!(matches!(
            delta.set_division_count(1, 1),
            Err(EmberError::InvalidDimension(1))
        ));
    }

    #[test]
    fn test_json_round_trip() {
        let mut delta = ModelDelta::new(1);
        delta.set_division_count(0, 1).unwrap();
        delta.ensure_value_capacity(2).unwrap();
        delta.divisions_mut(0)[0] = 4;
        delta.values_mut().copy_from_slice(&[0.125, -0.25]);

        let json = delta.json_dump().unwrap();
        let loaded = ModelDelta::json_load(&json).unwrap();
        assert_eq!(loaded.divisions(0), &[4]);
        assert_eq!(loaded.values(), &[0.125, -0.25]);
    }
}
