//! Common test utilities for confstrap integration tests

use std::path::{Path, PathBuf};

use confstrap::config::EngineConfig;
use confstrap::operations::Engine;
use tempfile::TempDir;

/// A temp directory holding a manifest, its sources and a target project
///
/// Layout:
/// - `<root>/confstrap.yaml`
/// - `<root>/templates/...` built-in sources
/// - `<root>/plugins/<dir>/...` plugins
/// - `<root>/project/...` the target directory
#[allow(dead_code)]
pub struct TestWorkspace {
    pub temp: TempDir,
    pub root: PathBuf,
    pub target: PathBuf,
}

#[allow(dead_code)]
impl TestWorkspace {
    pub fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp directory");
        let root = temp.path().to_path_buf();
        let target = root.join("project");
        std::fs::create_dir_all(&target).expect("Failed to create target directory");
        Self { temp, root, target }
    }

    /// Workspace with a manifest already written
    pub fn with_manifest(manifest: &str) -> Self {
        let workspace = Self::new();
        workspace.write_manifest(manifest);
        workspace
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.root.join("confstrap.yaml")
    }

    pub fn write_manifest(&self, content: &str) {
        write(&self.manifest_path(), content);
    }

    /// Write a built-in source file under `templates/`
    pub fn write_source(&self, rel: &str, content: &str) {
        write(&self.root.join("templates").join(rel), content);
    }

    /// Write a plugin manifest
    pub fn write_plugin(&self, dir: &str, manifest: &str) {
        write(&self.root.join("plugins").join(dir).join("plugin.yaml"), manifest);
    }

    /// Write a file under `plugins/<dir>/files/`
    pub fn write_plugin_file(&self, dir: &str, rel: &str, content: &str) {
        write(
            &self.root.join("plugins").join(dir).join("files").join(rel),
            content,
        );
    }

    pub fn write_target(&self, rel: &str, content: &str) {
        write(&self.target.join(rel), content);
    }

    pub fn read_target(&self, rel: &str) -> String {
        std::fs::read_to_string(self.target.join(rel)).expect("Failed to read target file")
    }

    pub fn target_exists(&self, rel: &str) -> bool {
        self.target.join(rel).exists()
    }

    pub fn remove_target(&self, rel: &str) {
        std::fs::remove_file(self.target.join(rel)).expect("Failed to remove target file");
    }

    pub fn receipt_path(&self, component: &str) -> PathBuf {
        self.target
            .join(".confstrap")
            .join("receipts")
            .join(format!("{component}.json"))
    }

    pub fn config(&self) -> EngineConfig {
        EngineConfig::new(&self.target).with_manifest(self.manifest_path())
    }

    pub fn engine(&self) -> Engine {
        Engine::open(self.config()).expect("Failed to open engine")
    }

    /// The binary, pointed at this workspace
    #[allow(deprecated)]
    pub fn cmd(&self) -> assert_cmd::Command {
        let mut cmd = assert_cmd::Command::cargo_bin("confstrap").expect("binary not built");
        cmd.env_remove("CONFSTRAP_TARGET_DIR");
        cmd.env_remove("CONFSTRAP_MANIFEST");
        cmd.env_remove("CONFSTRAP_LOG");
        cmd.arg("--target-dir")
            .arg(&self.target)
            .arg("--manifest")
            .arg(self.manifest_path());
        cmd
    }
}

impl Default for TestWorkspace {
    fn default() -> Self {
        Self::new()
    }
}

fn write(path: &Path, content: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("Failed to create parent directory");
    }
    std::fs::write(path, content).expect("Failed to write file");
}

/// Core settings plus docs that depend on them
#[allow(dead_code)]
pub const BASIC_MANIFEST: &str = r"
profiles:
  default:
    description: Everything
    components: [docs]
  minimal:
    components: [core]
components:
  core:
    category: core
    file_patterns: ['.claude/settings/*']
  docs:
    category: docs
    file_patterns: ['docs/*']
    dependencies: [core]
";

/// Seed the sources used by [`BASIC_MANIFEST`]
#[allow(dead_code)]
pub fn seed_basic(workspace: &TestWorkspace) {
    workspace.write_source(".claude/settings/base.json", "{\"theme\": \"dark\"}\n");
    workspace.write_source("docs/README.md", "# Docs\n");
}
