//! Installation health checks and repair
//!
//! Diagnosis is read-only. It reports:
//!
//! | Finding           | Severity | Repairable |
//! |-------------------|----------|------------|
//! | malformed receipt | error    | no         |
//! | missing file      | error    | yes        |
//! | content drift     | warning  | yes        |
//! | not installed     | info     | no         |
//! | orphaned file     | warning  | no         |
//!
//! Repair restores a file from its original source when the receipt records
//! where that source lives and the source still has the recorded content.
//! Anything else is reported as unrepaired; the engine never deletes files it
//! cannot prove it owns.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::common::fs as fs_utils;
use crate::config::engine::{DEFAULT_CONFIG_DIRS, STATE_DIR};
use crate::domain::receipt::shape_problems;
use crate::domain::{Diagnostic, DiagnosticKind, FileAction, Receipt, Severity};
use crate::error::Result;
use crate::hash;
use crate::path_utils;
use crate::receipts::ReceiptStore;

/// Component label of findings no component owns
pub const UNOWNED: &str = "unowned";

/// Which checks a diagnosis runs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiagnoseOptions {
    pub drift: bool,
    pub missing: bool,
    pub orphans: bool,
}

impl Default for DiagnoseOptions {
    fn default() -> Self {
        Self {
            drift: true,
            missing: true,
            orphans: false,
        }
    }
}

/// Diagnoses and repairs one target directory
pub struct Doctor<'a> {
    target_dir: PathBuf,
    receipts: &'a ReceiptStore,
    declared: BTreeSet<String>,
    config_dirs: Vec<String>,
}

impl<'a> Doctor<'a> {
    pub fn new(target_dir: &Path, receipts: &'a ReceiptStore) -> Self {
        Self {
            target_dir: target_dir.to_path_buf(),
            receipts,
            declared: BTreeSet::new(),
            config_dirs: DEFAULT_CONFIG_DIRS.iter().map(|d| (*d).to_string()).collect(),
        }
    }

    /// Destinations the manifests declare; never reported as orphans
    pub fn with_declared_paths(mut self, declared: BTreeSet<String>) -> Self {
        self.declared = declared;
        self
    }

    /// Directories scanned for orphans, relative to the target
    pub fn with_config_dirs(mut self, dirs: Vec<String>) -> Self {
        self.config_dirs = dirs;
        self
    }

    /// Check the given components, or every installed one
    pub fn diagnose(
        &self,
        components: Option<&[String]>,
        options: DiagnoseOptions,
    ) -> Result<Vec<Diagnostic>> {
        let ids = match components {
            Some(ids) => ids.to_vec(),
            None => self.receipts.installed()?,
        };

        let mut diagnostics = Vec::new();
        for id in &ids {
            diagnostics.extend(self.diagnose_component(id, options));
        }
        if options.orphans {
            diagnostics.extend(self.find_orphans()?);
        }

        log::info!("Doctor found {} issue(s)", diagnostics.len());
        Ok(diagnostics)
    }

    fn diagnose_component(&self, id: &str, options: DiagnoseOptions) -> Vec<Diagnostic> {
        let receipt = match self.load_receipt(id) {
            Ok(Some(receipt)) => receipt,
            Ok(None) => {
                return vec![Diagnostic::new(
                    Severity::Info,
                    DiagnosticKind::NotInstalled,
                    id,
                    format!("Component '{id}' is not installed"),
                )];
            }
            Err(problems) => {
                return vec![Diagnostic::new(
                    Severity::Error,
                    DiagnosticKind::MalformedReceipt,
                    id,
                    format!("Receipt for '{id}' is malformed"),
                )
                .with_detail("problems", problems)];
            }
        };

        let mut diagnostics = Vec::new();
        for file in &receipt.files {
            let path = file.target_path();
            let expected = file.target_hash().unwrap_or_default();
            let actual = match hash::hash_file_if_exists(&self.target_dir.join(path)) {
                Ok(actual) => actual,
                Err(e) => {
                    log::warn!("Cannot read {path}: {e}");
                    continue;
                }
            };

            match actual {
                None if options.missing => diagnostics.push(
                    Diagnostic::new(
                        Severity::Error,
                        DiagnosticKind::MissingFile,
                        id,
                        format!("Tracked file {path} is missing"),
                    )
                    .with_path(path)
                    .with_detail("expected_hash", expected)
                    .repairable(),
                ),
                Some(actual) if options.drift && !hash::verify_hash(expected, &actual) => {
                    log::warn!("Content drift in {path} ({id})");
                    diagnostics.push(
                        Diagnostic::new(
                            Severity::Warning,
                            DiagnosticKind::ContentDrift,
                            id,
                            format!("Tracked file {path} was modified"),
                        )
                        .with_path(path)
                        .with_detail("expected_hash", expected)
                        .with_detail("actual_hash", actual)
                        .repairable(),
                    );
                }
                _ => {}
            }
        }
        diagnostics
    }

    /// Receipt, `None` when absent, or the list of structural problems
    fn load_receipt(&self, id: &str) -> std::result::Result<Option<Receipt>, Vec<String>> {
        let raw = match self.receipts.read_raw(id) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Ok(None),
            Err(e) => return Err(vec![e.to_string()]),
        };

        let problems = shape_problems(&raw);
        if !problems.is_empty() {
            return Err(problems);
        }
        self.receipts.read(id).map_err(|e| vec![e.to_string()])
    }

    /// Files under the config dirs that no receipt tracks and no manifest declares
    fn find_orphans(&self) -> Result<Vec<Diagnostic>> {
        let mut tracked: BTreeSet<String> = BTreeSet::new();
        for id in self.receipts.installed()? {
            if let Ok(Some(receipt)) = self.receipts.read(&id) {
                tracked.extend(receipt.tracked_paths().map(str::to_string));
            }
        }

        let mut dirs: BTreeSet<String> = self.config_dirs.iter().cloned().collect();
        dirs.extend(
            tracked
                .iter()
                .filter_map(|path| path.split_once('/').map(|(top, _)| top.to_string())),
        );
        dirs.remove(STATE_DIR);

        let mut orphans = Vec::new();
        for dir in &dirs {
            let root = self.target_dir.join(dir);
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&root)
                .sort_by_file_name()
                .into_iter()
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().is_file())
            {
                let Ok(relative) = entry.path().strip_prefix(&self.target_dir) else {
                    continue;
                };
                let relative = path_utils::to_forward_slashes(relative);
                if tracked.contains(&relative) || self.declared.contains(&relative) {
                    continue;
                }
                orphans.push(
                    Diagnostic::new(
                        Severity::Warning,
                        DiagnosticKind::OrphanedFile,
                        UNOWNED,
                        format!("{relative} is not tracked by any component"),
                    )
                    .with_path(relative),
                );
            }
        }
        Ok(orphans)
    }

    /// Attempt every repairable finding; returns success per diagnostic key
    ///
    /// A failed repair is logged and reported as `false`; it never stops the
    /// pass.
    pub fn repair(&self, diagnostics: &[Diagnostic], dry_run: bool) -> Result<BTreeMap<String, bool>> {
        let mut results = BTreeMap::new();
        for diagnostic in diagnostics {
            let repaired = diagnostic.repairable && self.repair_one(diagnostic, dry_run);
            if !repaired {
                log::warn!("Not repaired: {}", diagnostic.key());
            }
            results.insert(diagnostic.key(), repaired);
        }
        Ok(results)
    }

    fn repair_one(&self, diagnostic: &Diagnostic, dry_run: bool) -> bool {
        let Some(path) = diagnostic.path.as_deref() else {
            return false;
        };
        let receipt = match self.receipts.read(&diagnostic.component) {
            Ok(Some(receipt)) => receipt,
            Ok(None) => return false,
            Err(e) => {
                log::warn!("Cannot repair {path}: {e}");
                return false;
            }
        };
        let Some(entry) = receipt.file(path) else {
            return false;
        };
        let Some(source) = restorable_source(&receipt, entry) else {
            log::warn!(
                "Cannot repair {path}: its original source is not available unchanged"
            );
            return false;
        };

        if dry_run {
            log::info!("[dry-run] Would restore {} from {}", path, source.display());
            return true;
        }

        let destination = self.target_dir.join(path);
        let restored = fs_utils::atomic_copy(&source, &destination).and_then(|()| {
            entry
                .mode()
                .map_or(Ok(()), |mode| fs_utils::set_mode(&destination, mode))
        });
        match restored {
            Ok(()) => {
                log::info!("Restored {path}");
                true
            }
            Err(e) => {
                log::warn!("Failed to restore {path}: {e}");
                false
            }
        }
    }
}

/// Source file holding exactly the recorded content of `entry`
///
/// That is the case when the installed content was the source itself (as
/// for COPY) and the source has not changed since.
fn restorable_source(receipt: &Receipt, entry: &FileAction) -> Option<PathBuf> {
    let source_root = receipt.source_root.as_ref()?;
    let recorded_source = entry.source_hash()?;
    let recorded_target = entry.target_hash()?;
    if !hash::verify_hash(recorded_source, recorded_target) {
        return None;
    }

    let source = source_root.join(entry.source_path());
    let current = hash::hash_file_if_exists(&source).ok()??;
    hash::verify_hash(recorded_source, &current).then_some(source)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{ActionKind, ActionReason};
    use tempfile::TempDir;

    struct Setup {
        temp: TempDir,
        store: ReceiptStore,
    }

    impl Setup {
        fn target(&self) -> PathBuf {
            self.temp.path().join("target")
        }

        fn source_root(&self) -> PathBuf {
            self.temp.path().join("templates")
        }
    }

    /// Installs `.claude/a.md` (COPY) and `.claude/b.json` (MERGE) by hand
    fn setup() -> Setup {
        let temp = TempDir::new().unwrap();
        let setup = Setup {
            store: ReceiptStore::new(&temp.path().join("target")),
            temp,
        };
        let files = [(".claude/a.md", "alpha", ActionKind::Copy), (".claude/b.json", "{}", ActionKind::Merge)];

        let mut actions = Vec::new();
        for (rel, content, kind) in files {
            let source = setup.source_root().join(rel);
            std::fs::create_dir_all(source.parent().unwrap()).unwrap();
            std::fs::write(&source, content).unwrap();
            let target = setup.target().join(rel);
            std::fs::create_dir_all(target.parent().unwrap()).unwrap();
            let installed = if kind == ActionKind::Merge { "{\"merged\": true}" } else { content };
            std::fs::write(&target, installed).unwrap();
            actions.push(
                FileAction::new(kind, rel, rel, ActionReason::New)
                    .unwrap()
                    .with_source_hash(Some(hash::hash_bytes(content)))
                    .with_target_hash(Some(hash::hash_bytes(installed))),
            );
        }

        let receipt = Receipt::new("core", "a".repeat(64), actions).with_source_root(setup.source_root());
        setup.store.write(&receipt).unwrap();
        setup
    }

    fn kinds(diagnostics: &[Diagnostic]) -> Vec<(DiagnosticKind, Option<&str>)> {
        diagnostics
            .iter()
            .map(|d| (d.kind, d.path.as_deref()))
            .collect()
    }

    #[test]
    fn test_healthy_install_has_no_findings() {
        let setup = setup();
        let doctor = Doctor::new(&setup.target(), &setup.store);

        let diagnostics = doctor.diagnose(None, DiagnoseOptions::default()).unwrap();

        assert!(diagnostics.is_empty());
    }

    #[test]
    fn test_missing_and_drift() {
        let setup = setup();
        std::fs::remove_file(setup.target().join(".claude/a.md")).unwrap();
        std::fs::write(setup.target().join(".claude/b.json"), "{\"edited\": 1}").unwrap();
        let doctor = Doctor::new(&setup.target(), &setup.store);

        let diagnostics = doctor.diagnose(None, DiagnoseOptions::default()).unwrap();

        assert_eq!(
            kinds(&diagnostics),
            vec![
                (DiagnosticKind::MissingFile, Some(".claude/a.md")),
                (DiagnosticKind::ContentDrift, Some(".claude/b.json")),
            ]
        );
        assert_eq!(diagnostics[0].severity, Severity::Error);
        assert_eq!(diagnostics[1].severity, Severity::Warning);
        assert!(diagnostics.iter().all(|d| d.repairable));

        let only_drift = doctor
            .diagnose(
                None,
                DiagnoseOptions {
                    missing: false,
                    ..DiagnoseOptions::default()
                },
            )
            .unwrap();
        assert_eq!(only_drift.len(), 1);
    }

    #[test]
    fn test_requested_component_without_receipt() {
        let setup = setup();
        let doctor = Doctor::new(&setup.target(), &setup.store);

        let diagnostics = doctor
            .diagnose(Some(&["ghost".to_string()]), DiagnoseOptions::default())
            .unwrap();

        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics[0].kind, DiagnosticKind::NotInstalled);
        assert_eq!(diagnostics[0].severity, Severity::Info);
        assert!(!diagnostics[0].repairable);
    }

    #[test]
    fn test_malformed_receipt() {
        let setup = setup();
        std::fs::write(
            setup.store.receipt_path("broken"),
            r#"{"component_id": "broken", "files": "nope"}"#,
        )
        .unwrap();
        let doctor = Doctor::new(&setup.target(), &setup.store);

        let diagnostics = doctor.diagnose(None, DiagnoseOptions::default()).unwrap();

        let malformed = diagnostics
            .iter()
            .find(|d| d.kind == DiagnosticKind::MalformedReceipt)
            .unwrap();
        assert_eq!(malformed.component, "broken");
        assert!(!malformed.repairable);
        assert!(malformed.details["problems"].as_array().is_some_and(|p| !p.is_empty()));
    }

    #[test]
    fn test_orphans_exclude_tracked_and_declared() {
        let setup = setup();
        std::fs::write(setup.target().join(".claude/stray.md"), "stray").unwrap();
        std::fs::write(setup.target().join(".claude/planned.md"), "declared").unwrap();
        let doctor = Doctor::new(&setup.target(), &setup.store)
            .with_declared_paths(BTreeSet::from([".claude/planned.md".to_string()]));

        let diagnostics = doctor
            .diagnose(
                None,
                DiagnoseOptions {
                    orphans: true,
                    ..DiagnoseOptions::default()
                },
            )
            .unwrap();

        assert_eq!(
            kinds(&diagnostics),
            vec![(DiagnosticKind::OrphanedFile, Some(".claude/stray.md"))]
        );
        assert_eq!(diagnostics[0].component, UNOWNED);
        assert!(!diagnostics[0].repairable);
    }

    #[test]
    fn test_repair_restores_copy_only() {
        let setup = setup();
        std::fs::remove_file(setup.target().join(".claude/a.md")).unwrap();
        std::fs::write(setup.target().join(".claude/b.json"), "{\"edited\": 1}").unwrap();
        let doctor = Doctor::new(&setup.target(), &setup.store);
        let diagnostics = doctor.diagnose(None, DiagnoseOptions::default()).unwrap();

        let results = doctor.repair(&diagnostics, false).unwrap();

        assert_eq!(results["core:missing_file:.claude/a.md"], true);
        assert_eq!(results["core:content_drift:.claude/b.json"], false);
        assert_eq!(
            std::fs::read_to_string(setup.target().join(".claude/a.md")).unwrap(),
            "alpha"
        );
        assert!(setup.store.is_current("core", Some(".claude/a.md")).unwrap());
    }

    #[test]
    fn test_repair_refuses_changed_source() {
        let setup = setup();
        std::fs::remove_file(setup.target().join(".claude/a.md")).unwrap();
        std::fs::write(setup.source_root().join(".claude/a.md"), "changed").unwrap();
        let doctor = Doctor::new(&setup.target(), &setup.store);
        let diagnostics = doctor.diagnose(None, DiagnoseOptions::default()).unwrap();

        let results = doctor.repair(&diagnostics, false).unwrap();

        assert_eq!(results["core:missing_file:.claude/a.md"], false);
        assert!(!setup.target().join(".claude/a.md").exists());
    }

    #[test]
    fn test_repair_dry_run_writes_nothing() {
        let setup = setup();
        std::fs::remove_file(setup.target().join(".claude/a.md")).unwrap();
        let doctor = Doctor::new(&setup.target(), &setup.store);
        let diagnostics = doctor.diagnose(None, DiagnoseOptions::default()).unwrap();

        let results = doctor.repair(&diagnostics, true).unwrap();

        assert_eq!(results["core:missing_file:.claude/a.md"], true);
        assert!(!setup.target().join(".claude/a.md").exists());
    }
}
