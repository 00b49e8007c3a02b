//! Project configuration
//!
//! This module handles the optional `smgen.toml` file that sits next to
//! state machine descriptions:
//!
//! - `Manifest`: the whole file
//! - `OutputConfig`: output directory and artifact selection
//! - `ParseConfig`: builder settings
//!
//! Diagram styling reuses [`DiagramStyle`](crate::codegen::DiagramStyle)
//! directly as the `[diagram]` section.

mod manifest;

pub use manifest::{Manifest, ManifestError, OutputConfig, ParseConfig, MANIFEST_FILE};
