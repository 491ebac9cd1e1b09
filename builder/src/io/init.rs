//! Bootstrap scaffolding for a fresh state directory.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::progress::ProgressRecord;
use crate::io::config::{BuilderConfig, write_config};
use crate::io::paths::BuilderPaths;

const EMPTY_DOC: &str = "";
const DEFAULT_RULES: &str = "{}\n";

/// Create the state layout if missing: empty `project.md`, empty rule set,
/// a fresh progress record, default config, and the `output/` and `logs/`
/// directories. With `force`, existing documents are overwritten.
pub fn bootstrap(paths: &BuilderPaths, force: bool) -> Result<()> {
    fs::create_dir_all(&paths.root)
        .with_context(|| format!("create root {}", paths.root.display()))?;
    fs::create_dir_all(&paths.output_dir)
        .with_context(|| format!("create {}", paths.output_dir.display()))?;
    fs::create_dir_all(&paths.logs_dir)
        .with_context(|| format!("create {}", paths.logs_dir.display()))?;

    write_if_missing_or_force(&paths.project_path, EMPTY_DOC, force)?;
    write_if_missing_or_force(&paths.rules_path, DEFAULT_RULES, force)?;

    if force || !paths.progress_path.exists() {
        write_json(&paths.progress_path, &ProgressRecord::default())
            .context("write progress.json")?;
    }
    if force || !paths.config_path.exists() {
        write_config(&paths.config_path, &BuilderConfig::default())?;
    }

    Ok(())
}

/// Serialize `value` to pretty-printed JSON with trailing newline.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let mut payload = serde_json::to_string_pretty(value).context("serialize json")?;
    payload.push('\n');
    fs::write(path, payload).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}

fn write_if_missing_or_force(path: &Path, contents: &str, force: bool) -> Result<()> {
    if !force && path.exists() {
        return Ok(());
    }
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
    Ok(())
}
