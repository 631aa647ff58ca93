//! confstrap - profile-driven configuration installer
//!
//! Resolves a profile of components from a YAML manifest (plus plugins), plans
//! the file operations against a target directory and installs them one
//! component at a time through a staging transaction. Every installed
//! component gets a receipt, which makes reinstalls idempotent and lets the
//! doctor detect and repair drift.
//!
//! ```no_run
//! use confstrap::config::EngineConfig;
//! use confstrap::operations::{Engine, InstallOptions};
//!
//! let engine = Engine::open(EngineConfig::new("/path/to/project"))?;
//! let outcome = engine.install(&InstallOptions::profile("default"))?;
//! println!("{} file(s) changed", outcome.plan.actionable_files());
//! # Ok::<(), confstrap::error::ConfstrapError>(())
//! ```

pub mod common;
pub mod config;
pub mod doctor;
pub mod domain;
pub mod error;
pub mod hash;
pub mod installer;
pub mod merge;
pub mod operations;
pub mod path_utils;
pub mod planner;
pub mod receipts;
pub mod resolver;
pub mod transaction;
