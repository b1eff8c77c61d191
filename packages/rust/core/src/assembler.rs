//! Output tree writer.
//!
//! Writes rendered files under a flavor root atomically and records a run
//! manifest with per-file checksums:
//! ```text
//! <output_dir>/<.opencode|.claude|.agents>/
//! ├── bmad-convert.manifest.json
//! ├── agents/
//! │   └── bmad-architect.md
//! └── skills/
//!     └── bmad-brainstorming/
//!         └── SKILL.md
//! ```

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, instrument};

use bmadconv_shared::{CURRENT_SCHEMA_VERSION, ConverterError, Result, Target};

/// File name of the run manifest inside the flavor root.
pub const RUN_MANIFEST_FILE: &str = "bmad-convert.manifest.json";

/// One written file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Path relative to the flavor root, `/`-separated.
    pub path: String,
    pub sha256: String,
    pub size_bytes: usize,
}

/// Record of one conversion run, written next to the output it describes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunManifest {
    pub schema_version: u32,
    pub tool_version: String,
    pub target: Target,
    pub source_dir: String,
    pub generated_at: DateTime<Utc>,
    pub files: Vec<FileRecord>,
}

impl RunManifest {
    pub fn new(target: Target, source_dir: &Path, files: Vec<FileRecord>) -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            target,
            source_dir: source_dir.display().to_string(),
            generated_at: Utc::now(),
            files,
        }
    }
}

/// Create the flavor root. Failure here prevents any output.
pub fn prepare_root(root: &Path) -> Result<()> {
    std::fs::create_dir_all(root).map_err(|e| ConverterError::io(root, e))?;
    debug!(path = %root.display(), "output root ready");
    Ok(())
}

/// Write `content` to `root/relative` (write to temp, then rename).
pub fn write_file(root: &Path, relative: &Path, content: &str) -> Result<FileRecord> {
    let target = root.join(relative);
    let parent = target.parent().unwrap_or(root);
    std::fs::create_dir_all(parent).map_err(|e| ConverterError::io(parent, e))?;

    let file_name = target
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let temp = parent.join(format!(".{file_name}.tmp"));

    std::fs::write(&temp, content).map_err(|e| ConverterError::io(&temp, e))?;
    std::fs::rename(&temp, &target).map_err(|e| ConverterError::io(&target, e))?;

    let mut hasher = Sha256::new();
    hasher.update(content.as_bytes());
    let hash = format!("{:x}", hasher.finalize());

    debug!(file = %relative.display(), size = content.len(), "wrote file");

    Ok(FileRecord {
        path: slash_path(relative),
        sha256: hash,
        size_bytes: content.len(),
    })
}

/// Write the run manifest into the flavor root.
#[instrument(skip_all, fields(root = %root.display(), files = manifest.files.len()))]
pub fn write_run_manifest(root: &Path, manifest: &RunManifest) -> Result<PathBuf> {
    let path = root.join(RUN_MANIFEST_FILE);
    write_json(&path, manifest)?;
    info!(path = %path.display(), "run manifest written");
    Ok(path)
}

/// Read back the run manifest of a previous run.
pub fn load_run_manifest(root: &Path) -> Result<RunManifest> {
    let path = root.join(RUN_MANIFEST_FILE);
    let content = std::fs::read_to_string(&path).map_err(|e| ConverterError::io(&path, e))?;
    let manifest: RunManifest = serde_json::from_str(&content).map_err(|e| {
        ConverterError::parse(format!("invalid {RUN_MANIFEST_FILE}: {e}"))
    })?;

    if manifest.schema_version != CURRENT_SCHEMA_VERSION {
        return Err(ConverterError::parse(format!(
            "unsupported schema_version: {} (expected {})",
            manifest.schema_version, CURRENT_SCHEMA_VERSION
        )));
    }
    Ok(manifest)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Write a JSON file (pretty-printed).
fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| ConverterError::Write(format!("JSON serialization failed: {e}")))?;
    std::fs::write(path, json).map_err(|e| ConverterError::io(path, e))?;
    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

fn slash_path(path: &Path) -> String {
    path.components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
