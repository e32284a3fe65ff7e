//! Export configuration.
//!
//! Serialised as JSON next to the model. Every field has a default so an
//! empty `{}` file reproduces the stock behaviour: read `model.json`, write
//! Q0.7 artifacts into `exported_weights_q07/`, one layer at a time.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Configuration for one export run.
///
/// Passed explicitly into the export pipeline; nothing in the workspace
/// reads process-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Model manifest handed to the checkpoint loader.
    #[serde(default = "default_model_path")]
    pub model_path: PathBuf,
    /// Directory receiving `layer_<index>_<name>.txt` artifacts. Created
    /// together with missing parents.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Quantise to Q0.7. When false, values are cast straight to i8.
    #[serde(default = "default_true")]
    pub use_q07: bool,
    /// Export layers concurrently (one artifact per rayon task).
    #[serde(default)]
    pub parallel: bool,
}

// ── Default value functions ─────────────────────────────────────────────────

fn default_model_path() -> PathBuf {
    PathBuf::from("model.json")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("exported_weights_q07")
}
fn default_true() -> bool {
    true
}

// ── Impl ────────────────────────────────────────────────────────────────────

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            output_dir: default_output_dir(),
            use_q07: true,
            parallel: false,
        }
    }
}

impl ExportConfig {
    /// Save config to a JSON file.
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write config {}", path.display()))?;
        Ok(())
    }

    /// Load config from a JSON file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("parse config {}", path.display()))?;
        Ok(config)
    }

    /// Resolve the quantisation switch.
    pub fn quant_mode(&self) -> QuantMode {
        if self.use_q07 {
            QuantMode::Q07
        } else {
            QuantMode::Cast
        }
    }
}

/// How real-valued parameters become i8.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantMode {
    /// Clip to [-1, 127/128], scale by 128, round, clip to i8.
    Q07,
    /// Truncate toward zero and saturate to i8, no scaling.
    ///
    /// Most trained weights have magnitude below one, so this maps nearly
    /// everything to -1, 0 or 1. Kept for compatibility with unscaled
    /// integer exports.
    Cast,
}

// ── Tests ───────────────────────────────────────────────────────────────────
