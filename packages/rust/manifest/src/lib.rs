//! Manifest loading for a BMAD installation.
//!
//! A `_bmad/_config/` directory holds three CSV tables enumerating the
//! installed agents, workflows and tasks and where their source files live.
//! Everything the converter processes starts from these rows.

mod parser;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument, warn};

use bmadconv_shared::{CORE_MODULE, ConverterError, Result};

pub use parser::{Record, Table, parse_table};

/// Directory under the source root holding the manifest tables.
pub const CONFIG_DIR: &str = "_config";

pub const AGENT_MANIFEST: &str = "agent-manifest.csv";
pub const WORKFLOW_MANIFEST: &str = "workflow-manifest.csv";
pub const TASK_MANIFEST: &str = "task-manifest.csv";

/// Root token that may lead a manifest path.
const PROJECT_ROOT_TOKEN: &str = "{project-root}/";

/// Installation directory name that leads every manifest path.
const INSTALL_DIR_PREFIX: &str = "_bmad/";

// ---------------------------------------------------------------------------
// Rows
// ---------------------------------------------------------------------------

/// One row of `agent-manifest.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentRow {
    pub name: String,
    pub display_name: String,
    pub title: String,
    pub icon: String,
    pub role: String,
    pub identity: String,
    pub communication_style: String,
    pub principles: String,
    pub module: String,
    pub path: String,
}

/// One row of `workflow-manifest.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowRow {
    pub name: String,
    pub description: String,
    pub module: String,
    pub path: String,
    pub standalone: bool,
}

/// One row of `task-manifest.csv`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskRow {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub module: String,
    pub path: String,
    pub standalone: bool,
}

/// Common access for de-duplication.
trait ManifestRow {
    fn name(&self) -> &str;
    fn module(&self) -> &str;
}

macro_rules! impl_manifest_row {
    ($($ty:ty),*) => {$(
        impl ManifestRow for $ty {
            fn name(&self) -> &str {
                &self.name
            }
            fn module(&self) -> &str {
                &self.module
            }
        }
    )*};
}

impl_manifest_row!(AgentRow, WorkflowRow, TaskRow);

/// All three manifest tables of one installation.
#[derive(Debug, Clone, Default)]
pub struct Manifests {
    pub agents: Vec<AgentRow>,
    pub workflows: Vec<WorkflowRow>,
    pub tasks: Vec<TaskRow>,
    /// Rows skipped as duplicates of an earlier (module, name) pair.
    pub warnings: Vec<String>,
    /// Tables present on disk that could not be read.
    pub errors: Vec<String>,
}

impl Manifests {
    /// Total number of entity rows.
    pub fn len(&self) -> usize {
        self.agents.len() + self.workflows.len() + self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

/// Path of the manifest directory for a source root.
pub fn config_dir(source_dir: &Path) -> PathBuf {
    source_dir.join(CONFIG_DIR)
}

/// Read the three manifest tables under `{source_dir}/_config`.
///
/// A missing table reads as empty, and so does an unreadable one, with the
/// failure recorded in [`Manifests::errors`]. When none of the three exists
/// the result is [`ConverterError::MissingManifests`].
#[instrument(skip_all, fields(source = %source_dir.display()))]
pub fn load_manifests(source_dir: &Path) -> Result<Manifests> {
    let dir = config_dir(source_dir);

    let paths = [AGENT_MANIFEST, WORKFLOW_MANIFEST, TASK_MANIFEST].map(|name| dir.join(name));
    if !paths.iter().any(|path| path.is_file()) {
        return Err(ConverterError::MissingManifests { config_dir: dir });
    }

    // A table that cannot be read is reported; the others still load.
    let mut errors = Vec::new();
    let [agent_table, workflow_table, task_table] = paths.map(|path| match read_table(&path) {
        Ok(table) => table,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "manifest table unreadable");
            errors.push(e.to_string());
            None
        }
    });

    let mut warnings = Vec::new();

    let agents = dedupe(
        "agent",
        agent_table.iter().flat_map(Table::records).map(agent_row),
        &mut warnings,
    );
    let workflows = dedupe(
        "workflow",
        workflow_table.iter().flat_map(Table::records).map(workflow_row),
        &mut warnings,
    );
    let tasks = dedupe(
        "task",
        task_table.iter().flat_map(Table::records).map(task_row),
        &mut warnings,
    );

    info!(
        agents = agents.len(),
        workflows = workflows.len(),
        tasks = tasks.len(),
        "manifests loaded"
    );

    Ok(Manifests {
        agents,
        workflows,
        tasks,
        warnings,
        errors,
    })
}

/// Read and parse one table. `None` when the file does not exist.
fn read_table(path: &Path) -> Result<Option<Table>> {
    if !path.is_file() {
        debug!(path = %path.display(), "manifest table not present");
        return Ok(None);
    }
    let text = std::fs::read_to_string(path).map_err(|e| ConverterError::io(path, e))?;
    Ok(Some(parse_table(&text)))
}

/// Drop rows without a name and rows repeating an earlier (module, name) pair.
fn dedupe<R: ManifestRow>(
    kind: &str,
    rows: impl Iterator<Item = R>,
    warnings: &mut Vec<String>,
) -> Vec<R> {
    let mut seen = HashSet::new();
    let mut kept = Vec::new();

    for row in rows {
        if row.name().is_empty() {
            debug!(kind, "skipping manifest row without a name");
            continue;
        }
        if !seen.insert((row.module().to_string(), row.name().to_string())) {
            let message = format!(
                "duplicate {kind} '{}' in module '{}' skipped",
                row.name(),
                row.module()
            );
            warn!(kind, name = row.name(), module = row.module(), "duplicate manifest row");
            warnings.push(message);
            continue;
        }
        kept.push(row);
    }

    kept
}

/// Module column value, with an empty cell meaning the core module.
fn module_of(record: &Record<'_>) -> String {
    match record.get("module") {
        "" => CORE_MODULE.to_string(),
        m => m.to_string(),
    }
}

fn agent_row(record: Record<'_>) -> AgentRow {
    AgentRow {
        name: record.get("name").to_string(),
        display_name: record.get("displayName").to_string(),
        title: record.get("title").to_string(),
        icon: record.get("icon").to_string(),
        role: record.get("role").to_string(),
        identity: record.get("identity").to_string(),
        communication_style: record.get("communicationStyle").to_string(),
        principles: record.get("principles").to_string(),
        module: module_of(&record),
        path: record.get("path").to_string(),
    }
}

fn workflow_row(record: Record<'_>) -> WorkflowRow {
    WorkflowRow {
        name: record.get("name").to_string(),
        description: record.get("description").to_string(),
        module: module_of(&record),
        path: record.get("path").to_string(),
        standalone: record.flag("standalone"),
    }
}

fn task_row(record: Record<'_>) -> TaskRow {
    TaskRow {
        name: record.get("name").to_string(),
        display_name: record.get("displayName").to_string(),
        description: record.get("description").to_string(),
        module: module_of(&record),
        path: record.get("path").to_string(),
        standalone: record.flag("standalone"),
    }
}

// ---------------------------------------------------------------------------
// Paths
// ---------------------------------------------------------------------------

/// Strip the `{project-root}/` token and the `_bmad/` install prefix from a
/// manifest path, leaving a path relative to the source directory.
pub fn relative_source_path(manifest_path: &str) -> &str {
    let path = manifest_path.trim();
    let path = path.strip_prefix(PROJECT_ROOT_TOKEN).unwrap_or(path);
    path.strip_prefix(INSTALL_DIR_PREFIX).unwrap_or(path)
}

/// Absolute location of the file a manifest path names.
pub fn source_path(source_dir: &Path, manifest_path: &str) -> PathBuf {
    source_dir.join(relative_source_path(manifest_path))
}
