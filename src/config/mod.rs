//! Configuration handling for confstrap
//!
//! This module contains data structures for:
//! - `confstrap.yaml` - the base manifest of profiles and components
//! - `<plugins>/<dir>/plugin.yaml` - plugin manifests contributing components
//! - [`EngineConfig`] - paths and variables for one engine instance

pub mod component;
pub mod engine;
pub mod manifest;
pub mod plugin;

// Re-export commonly used types
pub use component::{ComponentConfig, PluginOrigin, Profile};
pub use engine::EngineConfig;
pub use manifest::Manifest;
pub use plugin::{PluginManifest, PluginMetadata};
