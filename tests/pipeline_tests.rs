//! End-to-end tests of the resolve, plan, install and verify pipeline

mod common;

use std::fs;

use common::{BASIC_MANIFEST, TestWorkspace, seed_basic};
use confstrap::common::fs::SENTINEL_FILE;
use confstrap::config::Manifest;
use confstrap::doctor::DiagnoseOptions;
use confstrap::domain::{ActionKind, ActionReason, DiagnosticKind};
use confstrap::error::ConfstrapError;
use confstrap::hash;
use confstrap::operations::InstallOptions;
use serde_json::json;

fn install(workspace: &TestWorkspace, profile: &str) -> confstrap::operations::InstallOutcome {
    workspace
        .engine()
        .install(&InstallOptions::profile(profile))
        .expect("install failed")
}

// ============================================================================
// Idempotence
// ============================================================================

#[test]
fn test_second_install_changes_nothing() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);

    let first = install(&workspace, "default");
    assert_eq!(first.plan.actionable_files(), 2);
    assert!(first.results.values().all(|ok| *ok));

    let receipt_before = fs::read_to_string(workspace.receipt_path("core")).unwrap();
    let settings_before = workspace.read_target(".claude/settings/base.json");

    let second = install(&workspace, "default");
    assert_eq!(second.plan.actionable_files(), 0);
    assert!(
        second
            .plan
            .components()
            .iter()
            .flat_map(|c| c.actions())
            .all(|a| a.kind() == ActionKind::Skip && a.reason() == ActionReason::Unchanged)
    );
    assert_eq!(
        fs::read_to_string(workspace.receipt_path("core")).unwrap(),
        receipt_before
    );
    assert_eq!(workspace.read_target(".claude/settings/base.json"), settings_before);
}

#[test]
fn test_install_order_follows_priority_and_dependencies() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);

    let outcome = install(&workspace, "default");
    let ids: Vec<&str> = outcome
        .plan
        .components()
        .iter()
        .map(|c| c.component_id())
        .collect();
    assert_eq!(ids, vec!["core", "docs"]);
    assert_eq!(
        workspace.engine().receipts().installed().unwrap(),
        vec!["core".to_string(), "docs".to_string()]
    );
}

// ============================================================================
// Atomicity and rollback
// ============================================================================

const FAILING_MANIFEST: &str = r"
profiles:
  default: [broken]
components:
  core:
    category: core
    file_patterns: ['core/*']
  broken:
    category: docs
    file_patterns: ['broken/*']
    dependencies: [core]
";

#[test]
fn test_failed_component_rolls_back_the_run() {
    let workspace = TestWorkspace::with_manifest(FAILING_MANIFEST);
    workspace.write_source("core/a.txt", "core\n");
    workspace.write_source("broken/b.txt.j2", "{{ not_defined }}\n");

    let err = workspace
        .engine()
        .install(&InstallOptions::profile("default"))
        .unwrap_err();

    match err.root() {
        ConfstrapError::InstallationFailed {
            component,
            completed,
            ..
        } => {
            assert_eq!(component, "broken");
            assert_eq!(completed, &vec!["core".to_string()]);
        }
        other => panic!("Expected InstallationFailed, got {other:?}"),
    }

    assert!(!workspace.target_exists("core/a.txt"));
    assert!(!workspace.target_exists("broken/b.txt"));
    assert!(!workspace.receipt_path("core").exists());
    assert!(!workspace.receipt_path("broken").exists());
}

#[test]
fn test_failed_template_discards_sibling_files_of_same_component() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [core]
components:
  core:
    file_patterns: ['core/*']
",
    );
    workspace.write_source("core/ok.txt", "fine\n");
    workspace.write_source("core/bad.txt.j2", "{{ not_defined }}\n");

    let err = workspace
        .engine()
        .install(&InstallOptions::profile("default"))
        .unwrap_err();

    match err.root() {
        ConfstrapError::InstallationFailed {
            component,
            completed,
            ..
        } => {
            assert_eq!(component, "core");
            assert!(completed.is_empty());
        }
        other => panic!("Expected InstallationFailed, got {other:?}"),
    }
    assert!(!workspace.target_exists("core/ok.txt"));
    assert!(!workspace.target_exists("core/bad.txt"));
    assert!(!workspace.receipt_path("core").exists());
}

#[test]
fn test_rollback_restores_overwritten_user_file() {
    let workspace = TestWorkspace::with_manifest(FAILING_MANIFEST);
    workspace.write_source("core/a.txt", "from source\n");
    workspace.write_source("broken/b.txt.j2", "{{ not_defined }}\n");
    workspace.write_target("core/a.txt", "user content\n");

    assert!(
        workspace
            .engine()
            .install(&InstallOptions::profile("default"))
            .is_err()
    );

    assert_eq!(workspace.read_target("core/a.txt"), "user content\n");
}

#[test]
fn test_failure_leaves_no_staging_behind() {
    let workspace = TestWorkspace::with_manifest(FAILING_MANIFEST);
    workspace.write_source("core/a.txt", "core\n");
    workspace.write_source("broken/b.txt.j2", "{{ not_defined }}\n");

    let _ = workspace
        .engine()
        .install(&InstallOptions::profile("default"));

    let staging = workspace.target.join(".confstrap").join("staging");
    let leftovers = fs::read_dir(&staging).map_or(0, Iterator::count);
    assert_eq!(leftovers, 0);
}

#[test]
fn test_earlier_run_survives_later_failure() {
    let workspace = TestWorkspace::with_manifest(FAILING_MANIFEST);
    workspace.write_source("core/a.txt", "core\n");
    workspace.write_source("broken/b.txt.j2", "{{ not_defined }}\n");

    let mut options = InstallOptions::profile("default");
    options.components = Some(vec!["core".to_string()]);
    workspace.engine().install(&options).unwrap();

    assert!(
        workspace
            .engine()
            .install(&InstallOptions::profile("default"))
            .is_err()
    );

    assert_eq!(workspace.read_target("core/a.txt"), "core\n");
    assert!(workspace.receipt_path("core").exists());
}

// ============================================================================
// Drift
// ============================================================================

#[test]
fn test_drift_round_trip() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    install(&workspace, "default");

    workspace.write_target("docs/README.md", "# Edited by hand\n");

    let engine = workspace.engine();
    let drift = engine.receipts().detect_drift(None).unwrap();
    assert_eq!(drift.len(), 1);
    assert_eq!(
        drift["docs"],
        vec![std::path::PathBuf::from("docs/README.md")]
    );
    assert!(!engine.receipts().is_current("docs", None).unwrap());
    assert!(engine.receipts().is_current("core", None).unwrap());

    let plan = engine.plan("default", None, false).unwrap();
    let action = &plan.component("docs").unwrap().actions()[0];
    assert_eq!(action.reason(), ActionReason::Drift);
    assert!(action.is_actionable());
}

#[test]
fn test_changed_source_is_reinstalled() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    install(&workspace, "default");

    workspace.write_source("docs/README.md", "# Docs v2\n");
    let outcome = install(&workspace, "default");

    assert_eq!(outcome.plan.actionable_files(), 1);
    assert_eq!(workspace.read_target("docs/README.md"), "# Docs v2\n");
    assert!(workspace.engine().receipts().is_current("docs", None).unwrap());
}

// ============================================================================
// Resolution
// ============================================================================

#[test]
fn test_cycle_is_reported_with_chain() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [a]
components:
  a:
    file_patterns: ['a/*']
    dependencies: [b]
  b:
    file_patterns: ['b/*']
    dependencies: [a]
",
    );

    let err = workspace.engine().resolve("default", None).unwrap_err();
    assert!(err.is_dependency());
    assert!(err.to_string().contains("a -> b -> a"), "{err}");
}

#[test]
fn test_conflict_detected_before_planning() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [one, two]
components:
  one:
    file_patterns: ['shared/*']
  two:
    file_patterns: ['./shared/*']
",
    );
    workspace.write_source("shared/x.txt", "x");

    let err = workspace
        .engine()
        .install(&InstallOptions::profile("default"))
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(!workspace.target_exists("shared/x.txt"));
}

#[test]
fn test_literal_pattern_inside_glob_conflicts() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [base, extra]
components:
  base:
    file_patterns: ['conf/*.yaml']
  extra:
    file_patterns: ['conf/config.yaml']
",
    );
    workspace.write_source("conf/config.yaml", "a: 1\n");

    let err = workspace.engine().resolve("default", None).unwrap_err();
    assert!(err.is_conflict());
    assert!(err.to_string().contains("conf/config.yaml"), "{err}");
}

#[test]
fn test_shared_destination_across_prefixes_blocks_install() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [x, y]
components:
  x:
    file_patterns: ['a/*']
    target_prefix: a
  y:
    file_patterns: ['b/*']
    target_prefix: b
",
    );
    workspace.write_source("a/config.yaml", "from: x\n");
    workspace.write_source("b/config.yaml", "from: y\n");

    let err = workspace
        .engine()
        .install(&InstallOptions::profile("default"))
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(!workspace.target_exists("config.yaml"));
    assert!(!workspace.receipt_path("x").exists());
    assert!(!workspace.receipt_path("y").exists());
}

#[test]
fn test_two_sources_for_one_destination_block_install() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [notes]
components:
  notes:
    file_patterns: ['notes.*']
",
    );
    workspace.write_source("notes.txt", "plain\n");
    workspace.write_source("notes.txt.j2", "rendered for {{ component_id }}\n");
    workspace.write_target("notes.txt", "user notes\n");

    let err = workspace
        .engine()
        .install(&InstallOptions::profile("default"))
        .unwrap_err();
    assert!(err.is_conflict());
    assert!(err.to_string().contains("notes.txt"), "{err}");
    assert_eq!(workspace.read_target("notes.txt"), "user notes\n");
    assert!(!workspace.receipt_path("notes").exists());
}

#[test]
fn test_unknown_profile_is_validation_error() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    let err = workspace.engine().plan("nope", None, false).unwrap_err();
    assert!(err.is_validation());
}

#[test]
fn test_legacy_and_enhanced_shapes_plan_identically() {
    let enhanced = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&enhanced);
    let legacy = TestWorkspace::with_manifest(
        r"
profiles:
  default: [docs]
components:
  - id: core
    category: core
    file_patterns: ['.claude/settings/*']
  - name: docs
    category: docs
    file_patterns: ['docs/*']
    depends_on: [core]
",
    );
    seed_basic(&legacy);

    let a = Manifest::load(&enhanced.manifest_path()).unwrap();
    let b = Manifest::load(&legacy.manifest_path()).unwrap();
    assert_eq!(a.components, b.components);

    let plan_a = enhanced.engine().plan("default", None, false).unwrap();
    let plan_b = legacy.engine().plan("default", None, false).unwrap();
    let targets = |plan: &confstrap::domain::InstallPlan| {
        plan.components()
            .iter()
            .flat_map(|c| c.actions().iter().map(|a| a.target_path().to_string()))
            .collect::<Vec<_>>()
    };
    assert_eq!(targets(&plan_a), targets(&plan_b));
}

// ============================================================================
// Planning
// ============================================================================

#[test]
fn test_plan_is_byte_identical_across_engines() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    workspace.write_source("docs/guide/intro.md", "intro");

    let first = serde_json::to_string_pretty(
        &workspace.engine().plan("default", None, false).unwrap().to_value(),
    )
    .unwrap();
    let second = serde_json::to_string_pretty(
        &workspace.engine().plan("default", None, false).unwrap().to_value(),
    )
    .unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_deep_merge_into_existing_settings() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [settings]
components:
  settings:
    category: settings
    file_patterns: ['settings.json']
",
    );
    workspace.write_source("settings.json", r#"{"b": {"y": 2}, "c": 3}"#);
    workspace.write_target("settings.json", r#"{"a": 1, "b": {"x": 1}}"#);

    let outcome = install(&workspace, "default");
    let action = &outcome.plan.component("settings").unwrap().actions()[0];
    assert_eq!(action.kind(), ActionKind::Merge);

    let merged: serde_json::Value =
        serde_json::from_str(&workspace.read_target("settings.json")).unwrap();
    assert_eq!(merged, json!({"a": 1, "b": {"x": 1, "y": 2}, "c": 3}));

    let receipt = workspace.engine().receipts().read("settings").unwrap().unwrap();
    assert_eq!(
        receipt.expected_hash("settings.json"),
        Some(hash::hash_file(&workspace.target.join("settings.json")).unwrap().as_str())
    );
}

#[test]
fn test_template_uses_supplied_variables() {
    let workspace = TestWorkspace::with_manifest(
        r"
profiles:
  default: [greeting]
components:
  greeting:
    file_patterns: ['*.tmpl']
",
    );
    workspace.write_source("hello.txt.tmpl", "Hello {{ name }} from {{ component_id }}\n");

    let mut variables = std::collections::BTreeMap::new();
    variables.insert("name".to_string(), "Ada".to_string());
    let engine =
        confstrap::operations::Engine::open(workspace.config().with_variables(variables)).unwrap();
    engine.install(&InstallOptions::profile("default")).unwrap();

    assert_eq!(workspace.read_target("hello.txt"), "Hello Ada from greeting\n");
}

// ============================================================================
// Plugins
// ============================================================================

#[test]
fn test_plugin_component_installs_from_files_dir() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    workspace.write_plugin(
        "lint",
        r"
plugin:
  name: lint
  version: 1.2.0
components:
  lint-rules:
    category: hooks
    file_patterns: ['.claude/hooks/*']
profiles:
  linting: [lint-rules, core]
",
    );
    workspace.write_plugin_file("lint", ".claude/hooks/lint.sh", "#!/bin/sh\n");

    let outcome = install(&workspace, "linting");
    let plan = outcome.plan.component("lint-rules").unwrap();
    assert_eq!(plan.plugin_id(), Some("lint"));
    assert_eq!(workspace.read_target(".claude/hooks/lint.sh"), "#!/bin/sh\n");

    let receipt = workspace.engine().receipts().read("lint-rules").unwrap().unwrap();
    assert_eq!(receipt.metadata.get("plugin_id"), Some(&json!("lint")));
    assert_eq!(receipt.metadata.get("plugin_version"), Some(&json!("1.2.0")));
}

#[test]
fn test_base_component_wins_over_plugin() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    workspace.write_plugin(
        "shadow",
        r"
plugin:
  name: shadow
  version: 0.1.0
components:
  core:
    file_patterns: ['elsewhere/*']
",
    );

    let components = workspace.engine().list_components().unwrap();
    let core = components.iter().find(|c| c.id == "core").unwrap();
    assert!(core.plugin_id().is_none());
}

// ============================================================================
// Uninstall
// ============================================================================

#[test]
fn test_uninstall_removes_files_dirs_and_receipt() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    workspace.write_source("docs/deep/nested/page.md", "page");
    install(&workspace, "default");
    assert!(workspace.target_exists("docs/deep/nested/page.md"));

    let removed = workspace
        .engine()
        .uninstall(&["docs".to_string()])
        .unwrap();

    assert_eq!(removed, vec!["docs".to_string()]);
    assert!(!workspace.target_exists("docs"));
    assert!(!workspace.receipt_path("docs").exists());
    assert!(workspace.target_exists(".claude/settings/base.json"));
}

#[test]
fn test_uninstall_keeps_directories_with_user_files() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    install(&workspace, "default");
    workspace.write_target("docs/notes.md", "mine");

    workspace
        .engine()
        .uninstall(&["docs".to_string()])
        .unwrap();

    assert!(!workspace.target_exists("docs/README.md"));
    assert!(workspace.target_exists("docs/notes.md"));
}

#[test]
fn test_uninstall_unknown_component() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    let err = workspace
        .engine()
        .uninstall(&["ghost".to_string()])
        .unwrap_err();
    assert!(matches!(
        err.root(),
        ConfstrapError::ComponentNotInstalled { .. }
    ));
}

// ============================================================================
// Doctor
// ============================================================================

#[test]
fn test_repair_restores_deleted_copy_file() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    install(&workspace, "default");
    workspace.remove_target("docs/README.md");

    let engine = workspace.engine();
    let diagnostics = engine.diagnose(None, DiagnoseOptions::default()).unwrap();
    assert_eq!(diagnostics.len(), 1);
    assert_eq!(diagnostics[0].kind, DiagnosticKind::MissingFile);
    assert!(diagnostics[0].repairable);

    let results = engine.repair(&diagnostics, false).unwrap();
    assert_eq!(results.values().filter(|ok| **ok).count(), 1);
    assert_eq!(workspace.read_target("docs/README.md"), "# Docs\n");
    assert!(engine.diagnose(None, DiagnoseOptions::default()).unwrap().is_empty());
}

#[test]
fn test_doctor_reports_orphans_in_config_dirs() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    seed_basic(&workspace);
    install(&workspace, "default");
    workspace.write_target(".claude/stray.md", "who owns me");

    let options = DiagnoseOptions {
        orphans: true,
        ..DiagnoseOptions::default()
    };
    let diagnostics = workspace.engine().diagnose(None, options).unwrap();

    let orphans: Vec<_> = diagnostics
        .iter()
        .filter(|d| d.kind == DiagnosticKind::OrphanedFile)
        .collect();
    assert_eq!(orphans.len(), 1);
    assert_eq!(orphans[0].path.as_deref(), Some(".claude/stray.md"));
    assert!(!orphans[0].repairable);
}

// ============================================================================
// Staging sweep
// ============================================================================

#[test]
fn test_open_sweeps_marked_staging_dirs_only() {
    let workspace = TestWorkspace::with_manifest(BASIC_MANIFEST);
    let staging = workspace.target.join(".confstrap").join("staging");

    let marked = staging.join("core-1-0.stage");
    fs::create_dir_all(&marked).unwrap();
    fs::write(marked.join(SENTINEL_FILE), "").unwrap();
    fs::write(marked.join("half-written.txt"), "x").unwrap();

    let unmarked = staging.join("someone-elses");
    fs::create_dir_all(&unmarked).unwrap();
    fs::write(unmarked.join("keep.txt"), "x").unwrap();

    workspace.engine();

    assert!(!marked.exists());
    assert!(unmarked.join("keep.txt").exists());
}
