//! # q07-core — Q0.7 Quantiser
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`quantize`] | scalar and tensor Q0.7 quantisation, cast mode, saturation stats |
//! | [`tensor`] | [`QuantTensor`], the owned i8 result |
//! | [`layer`] | [`LayerRecord`] / [`LayerParams`] and per-layer block naming |
//!
//! ## Design principles
//!
//! 1. **Pure.** Quantisation never mutates its input and keeps no state;
//!    disjoint tensors can be processed on any thread.
//! 2. **Row-major.** Every flatten is last-axis-fastest, matching the order
//!    hardware weight loaders consume.
//! 3. **Total over finite input.** Out-of-range values clip; only NaN errors.

pub mod layer;
pub mod quantize;
pub mod tensor;

// ── Public re-exports ───────────────────────────────────────────────────────

pub use layer::{LayerParams, LayerRecord, NamedBlock};
pub use quantize::{
    cast_i8, dequantize_q07, q07_saturation, quantize_q07, quantize_tensor, SaturationStats,
    Q07_MAX, Q07_MIN, Q07_SCALE,
};
pub use tensor::QuantTensor;
