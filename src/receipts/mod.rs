//! Receipts store
//!
//! Receipts live at `<target>/.confstrap/receipts/<component_id>.json` and are
//! written atomically. Parsed receipts are cached per store instance; the
//! cache is an optimization only and is dropped for an id whenever that
//! receipt is written or deleted.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

use serde_json::Value;

use crate::common::fs as fs_utils;
use crate::config::engine::STATE_DIR;
use crate::domain::{RECEIPT_SCHEMA_VERSION, Receipt};
use crate::error::{ConfstrapError, Result, fs as fs_error, install as install_error, receipt as receipt_error};
use crate::hash;
use crate::path_utils;

/// Subdirectory of the state dir holding receipts
pub const RECEIPTS_DIR: &str = "receipts";

/// Per-component receipt persistence and verification
#[derive(Debug)]
pub struct ReceiptStore {
    target_dir: PathBuf,
    dir: PathBuf,
    cache: RefCell<HashMap<String, Receipt>>,
}

impl ReceiptStore {
    pub fn new(target_dir: &Path) -> Self {
        Self {
            target_dir: target_dir.to_path_buf(),
            dir: target_dir.join(STATE_DIR).join(RECEIPTS_DIR),
            cache: RefCell::new(HashMap::new()),
        }
    }

    pub fn target_dir(&self) -> &Path {
        &self.target_dir
    }

    pub fn receipt_path(&self, component_id: &str) -> PathBuf {
        self.dir.join(format!("{component_id}.json"))
    }

    /// Write a receipt atomically and refresh the cache entry
    pub fn write(&self, receipt: &Receipt) -> Result<()> {
        if !path_utils::is_valid_component_id(&receipt.component_id) {
            return Err(receipt_error::invalid(
                &receipt.component_id,
                "invalid component id",
            ));
        }

        let path = self.receipt_path(&receipt.component_id);
        let mut content = serde_json::to_string_pretty(receipt)
            .map_err(|e| fs_error::write_failed(&path, e))?;
        content.push('\n');
        fs_utils::atomic_write(&path, content)?;

        log::debug!("Wrote receipt {}", path.display());
        self.cache
            .borrow_mut()
            .insert(receipt.component_id.clone(), receipt.clone());
        Ok(())
    }

    /// Read a receipt, `None` when the component has none
    pub fn read(&self, component_id: &str) -> Result<Option<Receipt>> {
        if let Some(receipt) = self.cache.borrow().get(component_id) {
            return Ok(Some(receipt.clone()));
        }

        let Some(raw) = self.read_raw(component_id)? else {
            return Ok(None);
        };

        let receipt: Receipt = serde_json::from_value(raw)
            .map_err(|e| receipt_error::invalid(component_id, e.to_string()))?;

        if receipt.schema_version > RECEIPT_SCHEMA_VERSION {
            return Err(receipt_error::invalid(
                component_id,
                format!(
                    "schema_version {} is newer than supported version {}",
                    receipt.schema_version, RECEIPT_SCHEMA_VERSION
                ),
            ));
        }
        if receipt.component_id != component_id {
            return Err(receipt_error::invalid(
                component_id,
                format!("receipt names component '{}'", receipt.component_id),
            ));
        }

        self.cache
            .borrow_mut()
            .insert(component_id.to_string(), receipt.clone());
        Ok(Some(receipt))
    }

    /// Read the receipt document without interpreting it
    pub fn read_raw(&self, component_id: &str) -> Result<Option<Value>> {
        let path = self.receipt_path(component_id);
        if !path.is_file() {
            return Ok(None);
        }
        let content =
            std::fs::read_to_string(&path).map_err(|e| fs_error::read_failed(&path, e))?;
        serde_json::from_str(&content)
            .map(Some)
            .map_err(|e| receipt_error::invalid(component_id, e.to_string()))
    }

    /// Delete a receipt; returns whether one existed
    pub fn delete(&self, component_id: &str) -> Result<bool> {
        self.cache.borrow_mut().remove(component_id);

        let path = self.receipt_path(component_id);
        if !path.exists() {
            return Ok(false);
        }
        std::fs::remove_file(&path).map_err(|e| fs_error::write_failed(&path, e))?;
        log::debug!("Deleted receipt {}", path.display());
        Ok(true)
    }

    /// Ids of all components with a receipt file, sorted
    pub fn installed(&self) -> Result<Vec<String>> {
        if !self.dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut ids: Vec<String> = std::fs::read_dir(&self.dir)
            .map_err(|e| fs_error::read_failed(&self.dir, e))?
            .filter_map(std::result::Result::ok)
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
            .filter_map(|path| {
                path.file_stem()
                    .and_then(|stem| stem.to_str())
                    .map(str::to_string)
            })
            .collect();
        ids.sort();
        Ok(ids)
    }

    /// Whether the component's tracked files (or one of them) match the receipt
    ///
    /// A component without a receipt, or a path the receipt does not track,
    /// is never current.
    pub fn is_current(&self, component_id: &str, path: Option<&str>) -> Result<bool> {
        let Some(receipt) = self.read(component_id)? else {
            return Ok(false);
        };

        match path {
            Some(path) => match receipt.file(path) {
                Some(file) => self.file_matches(path, file.target_hash()),
                None => Ok(false),
            },
            None => {
                for file in &receipt.files {
                    if !self.file_matches(file.target_path(), file.target_hash())? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
        }
    }

    fn file_matches(&self, path: &str, expected: Option<&str>) -> Result<bool> {
        let Some(expected) = expected else {
            return Ok(false);
        };
        Ok(hash::hash_file_if_exists(&self.target_dir.join(path))?
            .is_some_and(|actual| hash::verify_hash(expected, &actual)))
    }

    /// Tracked files that are missing or changed, grouped by component
    ///
    /// Components without drift are omitted.
    pub fn detect_drift(&self, component_id: Option<&str>) -> Result<BTreeMap<String, Vec<PathBuf>>> {
        let ids = match component_id {
            Some(id) => vec![id.to_string()],
            None => self.installed()?,
        };

        let mut drift = BTreeMap::new();
        for id in ids {
            let Some(receipt) = self.read(&id)? else {
                continue;
            };
            let mut paths = Vec::new();
            for file in &receipt.files {
                if !self.file_matches(file.target_path(), file.target_hash())? {
                    paths.push(PathBuf::from(file.target_path()));
                }
            }
            if !paths.is_empty() {
                log::debug!("Drift in {}: {} file(s)", id, paths.len());
                drift.insert(id, paths);
            }
        }
        Ok(drift)
    }

    /// Per-file problems of one component's receipt
    ///
    /// Missing files are reported as [`ConfstrapError::TrackedFileMissing`],
    /// changed ones as [`ConfstrapError::ContentDrift`].
    pub fn validate(&self, component_id: &str) -> Result<Vec<ConfstrapError>> {
        let receipt = self
            .read(component_id)?
            .ok_or_else(|| install_error::not_installed(component_id))?;

        let mut problems = Vec::new();
        for file in &receipt.files {
            let path = Path::new(file.target_path());
            match hash::hash_file_if_exists(&self.target_dir.join(path))? {
                None => problems.push(receipt_error::missing(component_id, path)),
                Some(actual) => {
                    let expected = file.target_hash().unwrap_or_default();
                    if !hash::verify_hash(expected, &actual) {
                        problems.push(receipt_error::drift(component_id, path, expected, actual));
                    }
                }
            }
        }
        Ok(problems)
    }
}
