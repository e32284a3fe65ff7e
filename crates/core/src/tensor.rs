//! Owned i8 tensor produced by the quantiser.

use candle_core::{bail, Result};

/// Quantised tensor: shape plus values in row-major order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuantTensor {
    shape: Vec<usize>,
    values: Vec<i8>,
}

impl QuantTensor {
    /// Fails if `values.len()` is not the product of `shape`.
    pub fn new(shape: Vec<usize>, values: Vec<i8>) -> Result<Self> {
        let expected: usize = shape.iter().product();
        if expected != values.len() {
            bail!(
                "shape {:?} holds {} elements, got {}",
                shape,
                expected,
                values.len()
            );
        }
        Ok(Self { shape, values })
    }

    pub fn shape(&self) -> &[usize] {
        &self.shape
    }

    /// Flattened values, row-major.
    pub fn values(&self) -> &[i8] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// `(min, max)` over all values, `None` when empty.
    pub fn min_max(&self) -> Option<(i8, i8)> {
        let min = *self.values.iter().min()?;
        let max = *self.values.iter().max()?;
        Some((min, max))
    }
}
