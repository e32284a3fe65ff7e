//! Q0.7 quantisation primitives.
//!
//! Q0.7 stores a real number in an `i8` with 7 fractional bits: the code
//! `q` stands for `q / 128`, so the representable range is
//! `[-1.0, 127/128]`. Hardware loaders read the exported codes verbatim, so
//! the mapping here is the wire contract:
//!
//! ```text
//! q = clip(round(clip(x, -1.0, 127/128) * 128), -128, 127)
//! ```
//!
//! Ties round away from zero (`f64::round`). `±inf` clip to the range
//! ends. NaN has no Q0.7 code and is rejected.

use candle_core::{bail, DType, Result, Tensor};

use q07_common::QuantMode;

use crate::tensor::QuantTensor;

/// Scale between a real value and its Q0.7 code.
pub const Q07_SCALE: f64 = 128.0;
/// Smallest representable real value.
pub const Q07_MIN: f64 = -1.0;
/// Largest representable real value (127/128).
pub const Q07_MAX: f64 = 0.9921875;

// ── Scalar primitives ───────────────────────────────────────────────────────

/// Quantise one value to Q0.7.
#[inline]
pub fn quantize_q07(x: f64) -> Result<i8> {
    if x.is_nan() {
        bail!("cannot quantise NaN to Q0.7");
    }
    let scaled = (x.clamp(Q07_MIN, Q07_MAX) * Q07_SCALE).round();
    // Re-clip: the i8 range is the hard bound, not Q07_MAX.
    Ok(scaled.clamp(i8::MIN as f64, i8::MAX as f64) as i8)
}

/// Cast one value to i8 without scaling: truncate toward zero, saturate.
#[inline]
pub fn cast_i8(x: f64) -> Result<i8> {
    if x.is_nan() {
        bail!("cannot cast NaN to i8");
    }
    Ok(x.trunc() as i8)
}

/// Real value represented by a Q0.7 code.
#[inline]
pub fn dequantize_q07(q: i8) -> f64 {
    q as f64 / Q07_SCALE
}

// ── Tensor quantisation ─────────────────────────────────────────────────────

/// Flatten `t` row-major into f64. Lossless for every float dtype candle
/// stores, and for the integer ones.
fn flat_f64(t: &Tensor) -> Result<Vec<f64>> {
    t.flatten_all()?.to_dtype(DType::F64)?.to_vec1::<f64>()
}

/// Quantise a tensor of any rank and dtype, keeping its shape.
///
/// The error for a NaN element names its flat (row-major) index.
pub fn quantize_tensor(t: &Tensor, mode: QuantMode) -> Result<QuantTensor> {
    let flat = flat_f64(t)?;
    let convert: fn(f64) -> Result<i8> = match mode {
        QuantMode::Q07 => quantize_q07,
        QuantMode::Cast => cast_i8,
    };
    let mut values = Vec::with_capacity(flat.len());
    for (i, &x) in flat.iter().enumerate() {
        match convert(x) {
            Ok(q) => values.push(q),
            Err(e) => bail!("element {i}: {e}"),
        }
    }
    QuantTensor::new(t.dims().to_vec(), values)
}

// ── Debug helpers ───────────────────────────────────────────────────────────

/// How many elements fall outside the Q0.7 range before quantisation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaturationStats {
    /// Elements strictly below -1.0 (including `-inf`).
    pub below: u64,
    /// Elements strictly above 127/128 (including `+inf`).
    pub above: u64,
    pub total: u64,
}

impl SaturationStats {
    pub fn saturated(&self) -> u64 {
        self.below + self.above
    }

    /// Fraction of elements clipped, 0 for an empty tensor.
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.saturated() as f64 / self.total as f64
        }
    }
}

/// Count elements that the Q0.7 clip would alter. NaN is counted as
/// neither.
pub fn q07_saturation(t: &Tensor) -> Result<SaturationStats> {
    let flat = flat_f64(t)?;
    let mut stats = SaturationStats {
        total: flat.len() as u64,
        ..Default::default()
    };
    for &x in &flat {
        if x < Q07_MIN {
            stats.below += 1;
        } else if x > Q07_MAX {
            stats.above += 1;
        }
    }
    Ok(stats)
}

// ── Tests ───────────────────────────────────────────────────────────────────
