//! Shared helpers used across the engine.

pub mod fs;
