//! # q07-export — Text Export Pipeline
//!
//! * **[`writer`]** — comma/newline-wrapped text layout for i8 blocks.
//! * **[`reader`]** — parse artifacts back into blocks.
//! * **[`artifact`]** — quantise one layer and write it atomically.
//! * **[`export`]** — run every layer, return an [`ExportSummary`].
//! * **[`loader`]** — manifest + safetensors checkpoint → [`LayerRecord`]s.
//!
//! [`LayerRecord`]: q07_core::LayerRecord

pub mod artifact;
pub mod export;
pub mod loader;
pub mod reader;
pub mod writer;

pub use artifact::{artifact_path, export_layer, ArtifactInfo, BlockInfo};
pub use export::{export_layers, ExportSummary};
pub use loader::{layers_from_manifest, load_layers};
pub use reader::{parse_artifact, read_artifact, ParsedBlock};
pub use writer::{write_blocks, write_tensor, SEPARATOR, VALUES_PER_LINE};
