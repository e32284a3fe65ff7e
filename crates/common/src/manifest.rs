//! Model manifest: the ordered list of layers and the checkpoint tensors
//! each one owns.
//!
//! ```json
//! {
//!   "checkpoint": "model.safetensors",
//!   "layers": [
//!     { "name": "flatten" },
//!     { "name": "dense", "params": ["dense.kernel", "dense.bias"] }
//!   ]
//! }
//! ```
//!
//! A layer's index is its position in `layers`, so weightless layers still
//! occupy an index.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelManifest {
    /// Safetensors file. Relative paths are resolved against the manifest's
    /// directory by [`ModelManifest::load`].
    pub checkpoint: PathBuf,
    pub layers: Vec<LayerEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerEntry {
    pub name: String,
    /// Checkpoint tensor keys in parameter order (weights before bias).
    #[serde(default)]
    pub params: Vec<String>,
}

impl ModelManifest {
    /// Load and validate a manifest from JSON.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read manifest {}", path.display()))?;
        let mut manifest: Self = serde_json::from_str(&json)
            .with_context(|| format!("parse manifest {}", path.display()))?;
        if manifest.checkpoint.is_relative() {
            if let Some(dir) = path.parent() {
                manifest.checkpoint = dir.join(&manifest.checkpoint);
            }
        }
        manifest.validate()?;
        Ok(manifest)
    }

    /// Save manifest as pretty JSON.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write manifest {}", path.display()))?;
        Ok(())
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        for (index, layer) in self.layers.iter().enumerate() {
            validate_layer_name(index, &layer.name)?;
        }
        Ok(())
    }
}

/// Layer names end up in file names, so they must be non-empty and free of
/// path separators.
pub fn validate_layer_name(index: usize, name: &str) -> anyhow::Result<()> {
    if name.is_empty() {
        bail!("layer {index} has an empty name");
    }
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        bail!("layer {index} name {name:?} is not a valid file name component");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manifest_json() -> &'static str {
        r#"{
            "checkpoint": "model.safetensors",
            "layers": [
                { "name": "flatten" },
                { "name": "dense", "params": ["dense.kernel", "dense.bias"] }
            ]
        }"#
    }

    #[test]
    fn params_default_to_empty() {
        let m: ModelManifest = serde_json::from_str(manifest_json()).unwrap();
        assert_eq!(m.layers.len(), 2);
        assert!(m.layers[0].params.is_empty());
        assert_eq!(m.layers[1].params, vec!["dense.kernel", "dense.bias"]);
    }

    #[test]
    fn load_resolves_checkpoint_relative_to_manifest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, manifest_json()).unwrap();
        let m = ModelManifest::load(&path).unwrap();
        assert_eq!(m.checkpoint, dir.path().join("model.safetensors"));
    }

    #[test]
    fn rejects_path_separator_in_name() {
        let m = ModelManifest {
            checkpoint: PathBuf::from("m.safetensors"),
            layers: vec![LayerEntry {
                name: "../dense".into(),
                params: vec![],
            }],
        };
        assert!(m.validate().is_err());
    }

    #[test]
    fn layer_name_rules() {
        assert!(validate_layer_name(0, "dense_1").is_ok());
        assert!(validate_layer_name(0, "conv2d.bn").is_ok());
        for bad in ["", ".", "..", "a/b", "a\\b", "../x"] {
            assert!(validate_layer_name(3, bad).is_err(), "{bad:?} accepted");
        }
    }

    #[test]
    fn rejects_empty_name() {
        let m = ModelManifest {
            checkpoint: PathBuf::from("m.safetensors"),
            layers: vec![LayerEntry {
                name: String::new(),
                params: vec!["w".into()],
            }],
        };
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("layer 0"));
    }

    #[test]
    fn malformed_json_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("model.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert!(ModelManifest::load(&path).is_err());
    }
}
