//! # q07-common — Shared Types
//!
//! Types shared across every crate in the workspace:
//!
//! * **[`ExportConfig`]** — export settings (serialised as JSON).
//! * **[`QuantMode`]** — resolved quantisation switch.
//! * **[`ModelManifest`]** — ordered layer list for the checkpoint loader.

pub mod config;
pub mod manifest;

pub use config::{ExportConfig, QuantMode};
pub use manifest::{validate_layer_name, LayerEntry, ModelManifest};
