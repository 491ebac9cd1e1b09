//! Canonical on-disk layout for a controller state directory.

use std::path::PathBuf;

/// All fixed document locations under a project root.
///
/// The layout is flat: three state documents, a config file, the `output/`
/// namespace, the append-only run log, and the lock file guarding the full
/// `load -> ... -> save` sequence.
#[derive(Debug, Clone)]
pub struct BuilderPaths {
    pub root: PathBuf,
    pub project_path: PathBuf,
    pub rules_path: PathBuf,
    pub progress_path: PathBuf,
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub run_log_path: PathBuf,
    pub lock_path: PathBuf,
}

impl BuilderPaths {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        let logs_dir = root.join("logs");
        Self {
            project_path: root.join("project.md"),
            rules_path: root.join("rules.json"),
            progress_path: root.join("progress.json"),
            config_path: root.join("builder.toml"),
            output_dir: root.join("output"),
            run_log_path: logs_dir.join("run.jsonl"),
            lock_path: root.join(".builder.lock"),
            logs_dir,
            root,
        }
    }
}
