//! Export a whole model: one artifact per layer that has parameters.
//!
//! Layers are visited in forward order. A layer without parameters is
//! skipped and keeps its index, so later file names are unaffected. With
//! `parallel` set, layers are exported on the rayon pool; each task owns
//! its own artifact and the summary is still returned in layer order.

use std::path::Path;

use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use q07_common::{ExportConfig, QuantMode};
use q07_core::LayerRecord;

use crate::artifact::{export_layer, ArtifactInfo};

/// What an export run produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportSummary {
    pub quant_mode: QuantMode,
    pub layers_seen: usize,
    pub artifacts: Vec<ArtifactInfo>,
}

impl ExportSummary {
    pub fn total_values(&self) -> usize {
        self.artifacts
            .iter()
            .flat_map(|a| a.blocks.iter())
            .map(|b| b.len)
            .sum()
    }

    pub fn total_saturated(&self) -> u64 {
        self.artifacts
            .iter()
            .flat_map(|a| a.blocks.iter())
            .map(|b| b.saturated_low + b.saturated_high)
            .sum()
    }

    /// Save as pretty JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)
            .with_context(|| format!("write summary {}", path.display()))?;
        Ok(())
    }
}

/// Quantise and write every layer according to `config`.
///
/// The output directory is created with its parents. The first failing
/// layer aborts the run; artifacts already written stay in place.
pub fn export_layers(layers: &[LayerRecord], config: &ExportConfig) -> Result<ExportSummary> {
    let out = config.output_dir.as_path();
    std::fs::create_dir_all(out)
        .with_context(|| format!("create output dir {}", out.display()))?;

    let mode = config.quant_mode();
    if mode == QuantMode::Cast {
        tracing::warn!("Q0.7 disabled: values are truncated to i8 without scaling");
    }
    tracing::info!(
        layers = layers.len(),
        mode = ?mode,
        parallel = config.parallel,
        out = %out.display(),
        "Exporting"
    );

    let results: Vec<Option<ArtifactInfo>> = if config.parallel {
        layers
            .par_iter()
            .map(|layer| export_layer(layer, mode, out))
            .collect::<Result<_>>()?
    } else {
        layers
            .iter()
            .map(|layer| export_layer(layer, mode, out))
            .collect::<Result<_>>()?
    };

    let summary = ExportSummary {
        quant_mode: mode,
        layers_seen: layers.len(),
        artifacts: results.into_iter().flatten().collect(),
    };

    tracing::info!(
        artifacts = summary.artifacts.len(),
        values = summary.total_values(),
        clipped = summary.total_saturated(),
        "Export complete"
    );
    Ok(summary)
}
