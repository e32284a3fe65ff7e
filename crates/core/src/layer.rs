//! Layer records handed over by the model loader.
//!
//! A layer with exactly two parameter tensors is read as weights then bias;
//! any other count is a plain ordered list. The decision is made once in
//! [`LayerRecord::new`] so export code matches on [`LayerParams`] instead of
//! re-checking lengths.

use candle_core::{Result, Tensor};

use q07_common::QuantMode;

use crate::quantize::{q07_saturation, quantize_tensor, SaturationStats};
use crate::tensor::QuantTensor;

/// Parameter tensors of one layer.
#[derive(Debug, Clone)]
pub enum LayerParams {
    WeightBias { weights: Tensor, bias: Tensor },
    /// Zero, one, or three-plus tensors in loader order.
    Generic { params: Vec<Tensor> },
}

impl LayerParams {
    pub fn from_tensors(tensors: Vec<Tensor>) -> Self {
        match <[Tensor; 2]>::try_from(tensors) {
            Ok([weights, bias]) => Self::WeightBias { weights, bias },
            Err(params) => Self::Generic { params },
        }
    }

    pub fn len(&self) -> usize {
        match self {
            Self::WeightBias { .. } => 2,
            Self::Generic { params } => params.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// `(suffix, tensor)` pairs in export order: `weights`, `bias` or
    /// `p0`, `p1`, ...
    pub fn named(&self) -> Vec<(String, &Tensor)> {
        match self {
            Self::WeightBias { weights, bias } => vec![
                ("weights".to_string(), weights),
                ("bias".to_string(), bias),
            ],
            Self::Generic { params } => params
                .iter()
                .enumerate()
                .map(|(i, p)| (format!("p{i}"), p))
                .collect(),
        }
    }
}

/// One network layer: forward-order index, name, parameters.
#[derive(Debug, Clone)]
pub struct LayerRecord {
    pub index: usize,
    pub name: String,
    pub params: LayerParams,
}

/// A quantised parameter ready for the writer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamedBlock {
    pub name: String,
    pub tensor: QuantTensor,
    /// Elements clipped by the Q0.7 range (all zero in cast mode).
    pub saturation: SaturationStats,
}

impl LayerRecord {
    pub fn new(index: usize, name: impl Into<String>, tensors: Vec<Tensor>) -> Self {
        Self {
            index,
            name: name.into(),
            params: LayerParams::from_tensors(tensors),
        }
    }

    /// `layer_<index>_<name>`: artifact stem and block-name prefix.
    pub fn base_name(&self) -> String {
        format!("layer_{}_{}", self.index, self.name)
    }

    /// Quantise every parameter, naming each block `<base>_<suffix>`.
    pub fn quantize(&self, mode: QuantMode) -> Result<Vec<NamedBlock>> {
        let base = self.base_name();
        self.params
            .named()
            .into_iter()
            .map(|(suffix, t)| -> Result<NamedBlock> {
                let name = format!("{base}_{suffix}");
                let tensor = quantize_tensor(t, mode)
                    .map_err(|e| candle_core::Error::Msg(format!("{name}: {e}")))?;
                let saturation = match mode {
                    QuantMode::Q07 => q07_saturation(t)?,
                    QuantMode::Cast => SaturationStats {
                        total: tensor.len() as u64,
                        ..Default::default()
                    },
                };
                Ok(NamedBlock {
                    name,
                    tensor,
                    saturation,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use candle_core::Device;

    fn t(vals: &[f32]) -> Tensor {
        Tensor::new(vals, &Device::Cpu).unwrap()
    }

    #[test]
    fn two_tensors_become_weight_bias() {
        let rec = LayerRecord::new(3, "dense", vec![t(&[0.5, -0.5]), t(&[0.25])]);
        match &rec.params {
            LayerParams::WeightBias { weights, bias } => {
                assert_eq!(weights.dims(), &[2]);
                assert_eq!(bias.dims(), &[1]);
            }
            other => panic!("expected WeightBias, got {other:?}"),
        }
        let names: Vec<_> = rec.params.named().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["weights", "bias"]);
    }

    #[test]
    fn other_counts_are_generic() {
        for n in [0usize, 1, 3] {
            let rec = LayerRecord::new(0, "bn", (0..n).map(|_| t(&[0.0])).collect());
            assert!(matches!(rec.params, LayerParams::Generic { .. }));
            assert_eq!(rec.params.len(), n);
        }
        let rec = LayerRecord::new(0, "bn", vec![t(&[0.0]), t(&[0.0]), t(&[0.0])]);
        let names: Vec<_> = rec.params.named().into_iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["p0", "p1", "p2"]);
    }

    #[test]
    fn base_name_uses_index_and_name() {
        let rec = LayerRecord::new(2, "conv2d_1", vec![]);
        assert_eq!(rec.base_name(), "layer_2_conv2d_1");
        assert!(rec.params.is_empty());
    }

    #[test]
    fn quantize_names_blocks_and_counts_saturation() {
        let rec = LayerRecord::new(1, "dense", vec![t(&[2.0, 0.5]), t(&[-0.25])]);
        let blocks = rec.quantize(QuantMode::Q07).unwrap();
        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].name, "layer_1_dense_weights");
        assert_eq!(blocks[0].tensor.values(), &[127, 64]);
        assert_eq!(blocks[0].saturation.above, 1);
        assert_eq!(blocks[1].name, "layer_1_dense_bias");
        assert_eq!(blocks[1].tensor.values(), &[-32]);
    }

    #[test]
    fn quantize_error_names_block() {
        let rec = LayerRecord::new(4, "dense", vec![t(&[0.0]), t(&[f32::NAN])]);
        let err = rec.quantize(QuantMode::Q07).unwrap_err();
        assert!(err.to_string().contains("layer_4_dense_bias"), "{err}");
    }
}
