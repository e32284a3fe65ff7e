//! One artifact per layer, written atomically.
//!
//! The blocks are streamed into a temp file inside the output directory and
//! renamed to `layer_<index>_<name>.txt` only after a successful flush, so
//! a reader never sees a half-written artifact under its final name. The
//! temp file is created with the same mode a plain `File::create` would
//! get (0666 masked by the umask), so the renamed artifact is not left
//! owner-only.

use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tempfile::Builder;

use q07_common::{validate_layer_name, QuantMode};
use q07_core::{LayerRecord, NamedBlock};

use crate::writer::write_blocks;

/// Summary of one written block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockInfo {
    pub name: String,
    pub shape: Vec<usize>,
    pub len: usize,
    pub min: Option<i8>,
    pub max: Option<i8>,
    /// Elements clipped low / high by the Q0.7 range.
    pub saturated_low: u64,
    pub saturated_high: u64,
}

/// Summary of one written artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactInfo {
    pub layer_index: usize,
    pub layer_name: String,
    pub path: PathBuf,
    pub blocks: Vec<BlockInfo>,
}

impl BlockInfo {
    fn from_block(block: &NamedBlock) -> Self {
        let (min, max) = match block.tensor.min_max() {
            Some((lo, hi)) => (Some(lo), Some(hi)),
            None => (None, None),
        };
        Self {
            name: block.name.clone(),
            shape: block.tensor.shape().to_vec(),
            len: block.tensor.len(),
            min,
            max,
            saturated_low: block.saturation.below,
            saturated_high: block.saturation.above,
        }
    }
}

/// `<output_dir>/layer_<index>_<name>.txt`
pub fn artifact_path(output_dir: &Path, layer: &LayerRecord) -> PathBuf {
    output_dir.join(format!("{}.txt", layer.base_name()))
}

/// Quantise and write one layer. Returns `None` for a layer without
/// parameters; no file is created for it.
pub fn export_layer(
    layer: &LayerRecord,
    mode: QuantMode,
    output_dir: &Path,
) -> Result<Option<ArtifactInfo>> {
    validate_layer_name(layer.index, &layer.name)?;
    if layer.params.is_empty() {
        tracing::debug!(index = layer.index, name = %layer.name, "no parameters, skipping");
        return Ok(None);
    }

    let blocks = layer
        .quantize(mode)
        .with_context(|| format!("quantise layer {} ({})", layer.index, layer.name))?;

    for block in &blocks {
        tracing::debug!(
            block = %block.name,
            len = block.tensor.len(),
            below = block.saturation.below,
            above = block.saturation.above,
            "quantised"
        );
        if block.saturation.saturated() > 0 {
            tracing::warn!(
                block = %block.name,
                clipped = block.saturation.saturated(),
                fraction = format!("{:.4}", block.saturation.fraction()),
                "values outside Q0.7 range were clipped"
            );
        }
    }

    let path = artifact_path(output_dir, layer);
    write_atomic(&path, output_dir, &blocks)
        .with_context(|| format!("write artifact {}", path.display()))?;

    tracing::info!(
        index = layer.index,
        name = %layer.name,
        blocks = blocks.len(),
        path = %path.display(),
        "artifact written"
    );

    Ok(Some(ArtifactInfo {
        layer_index: layer.index,
        layer_name: layer.name.clone(),
        path,
        blocks: blocks.iter().map(BlockInfo::from_block).collect(),
    }))
}

fn write_atomic(path: &Path, dir: &Path, blocks: &[NamedBlock]) -> Result<()> {
    persist_with(path, dir, |sink| write_blocks(sink, blocks))
}

/// Create a temp file in `dir`, let `fill` write through a buffered sink,
/// then rename it to `path`. On any error the temp file is removed.
fn persist_with<F>(path: &Path, dir: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> io::Result<()>,
{
    let mut builder = Builder::new();
    builder.prefix(".tmp");
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(std::fs::Permissions::from_mode(0o666));
    }
    let mut tmp = builder.tempfile_in(dir)?;
    {
        let mut w = BufWriter::new(tmp.as_file_mut());
        fill(&mut w)?;
        w.flush()?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(path)?;
    Ok(())
}
