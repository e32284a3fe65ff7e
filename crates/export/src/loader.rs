//! Load layer records from a manifest and its safetensors checkpoint.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use candle_core::{Device, Tensor};

use q07_common::ModelManifest;
use q07_core::LayerRecord;

/// Read the manifest at `manifest_path` and the checkpoint it names, on CPU.
///
/// Every key listed in the manifest must exist in the checkpoint; nothing
/// is exported from a partially loadable model.
pub fn load_layers(manifest_path: &Path) -> Result<Vec<LayerRecord>> {
    let manifest = ModelManifest::load(manifest_path)?;
    let tensors = candle_core::safetensors::load(&manifest.checkpoint, &Device::Cpu)
        .with_context(|| format!("load checkpoint {}", manifest.checkpoint.display()))?;
    tracing::info!(
        checkpoint = %manifest.checkpoint.display(),
        tensors = tensors.len(),
        layers = manifest.layers.len(),
        "Loaded checkpoint"
    );
    layers_from_manifest(&manifest, &tensors)
}

/// Build records from an already loaded tensor map.
pub fn layers_from_manifest(
    manifest: &ModelManifest,
    tensors: &HashMap<String, Tensor>,
) -> Result<Vec<LayerRecord>> {
    manifest
        .layers
        .iter()
        .enumerate()
        .map(|(index, entry)| -> Result<LayerRecord> {
            let params = entry
                .params
                .iter()
                .map(|key| {
                    tensors.get(key).cloned().with_context(|| {
                        format!(
                            "tensor `{key}` listed for layer {index} ({}) missing from checkpoint",
                            entry.name
                        )
                    })
                })
                .collect::<Result<Vec<_>>>()?;
            Ok(LayerRecord::new(index, entry.name.clone(), params))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use q07_common::LayerEntry;
    use q07_core::LayerParams;

    fn sample_tensors() -> HashMap<String, Tensor> {
        let dev = Device::Cpu;
        let mut m = HashMap::new();
        m.insert(
            "dense.kernel".to_string(),
            Tensor::new(&[[0.5f32, -0.5], [0.25, 0.0], [1.0, -1.0]], &dev).unwrap(),
        );
        m.insert(
            "dense.bias".to_string(),
            Tensor::new(&[0.1f32, -0.1], &dev).unwrap(),
        );
        m
    }

    fn sample_manifest(checkpoint: &Path) -> ModelManifest {
        ModelManifest {
            checkpoint: checkpoint.to_path_buf(),
            layers: vec![
                LayerEntry {
                    name: "flatten".into(),
                    params: vec![],
                },
                LayerEntry {
                    name: "dense".into(),
                    params: vec!["dense.kernel".into(), "dense.bias".into()],
                },
            ],
        }
    }

    #[test]
    fn builds_records_in_manifest_order() {
        let layers =
            layers_from_manifest(&sample_manifest(Path::new("x")), &sample_tensors()).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[0].index, 0);
        assert!(layers[0].params.is_empty());
        assert_eq!(layers[1].index, 1);
        match &layers[1].params {
            LayerParams::WeightBias { weights, bias } => {
                assert_eq!(weights.dims(), &[3, 2]);
                assert_eq!(bias.dims(), &[2]);
            }
            other => panic!("expected WeightBias, got {other:?}"),
        }
    }

    #[test]
    fn missing_tensor_is_fatal() {
        let mut manifest = sample_manifest(Path::new("x"));
        manifest.layers[1].params.push("dense.extra".into());
        let err = layers_from_manifest(&manifest, &sample_tensors()).unwrap_err();
        assert!(err.to_string().contains("dense.extra"), "{err}");
    }

    #[test]
    fn loads_safetensors_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let ckpt = dir.path().join("model.safetensors");
        candle_core::safetensors::save(&sample_tensors(), &ckpt).unwrap();
        let manifest_path = dir.path().join("model.json");
        // Relative checkpoint resolved against the manifest directory.
        sample_manifest(Path::new("model.safetensors"))
            .save(&manifest_path)
            .unwrap();

        let layers = load_layers(&manifest_path).unwrap();
        assert_eq!(layers.len(), 2);
        assert_eq!(layers[1].base_name(), "layer_1_dense");
    }

    #[test]
    fn unreadable_checkpoint_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let manifest_path = dir.path().join("model.json");
        sample_manifest(Path::new("missing.safetensors"))
            .save(&manifest_path)
            .unwrap();
        let err = load_layers(&manifest_path).unwrap_err();
        assert!(format!("{err:#}").contains("missing.safetensors"));
    }
}
