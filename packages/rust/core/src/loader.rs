//! Source loading: reads the file each manifest row names and extracts it.
//!
//! Workflows pull in sibling files (instructions, template, step files);
//! agents fall back to their manifest row for persona fields the file lacks.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use bmadconv_manifest::{AgentRow, Manifests, TaskRow, WorkflowRow, source_path};
use bmadconv_markdown::agent::split_principles;
use bmadconv_markdown::{
    frontmatter_fields, parse_agent, parse_markdown_workflow, parse_workflow_steps,
    parse_yaml_config, split_frontmatter,
};
use bmadconv_shared::{
    Agent, ConverterError, Result, SourceEntity, SourceKind, Task, Workflow,
};

const INSTRUCTIONS_MD: &str = "instructions.md";
const INSTRUCTIONS_XML: &str = "instructions.xml";
const TEMPLATE_MD: &str = "template.md";
const TEMPLATE_SUFFIX: &str = ".template.md";
const STEPS_DIR: &str = "steps";
const STEP_FILE_PREFIX: &str = "step-";

/// Every entity loaded for one run, by kind, in manifest order.
#[derive(Debug, Clone, Default)]
pub struct SourceSet {
    pub agents: Vec<Agent>,
    pub workflows: Vec<Workflow>,
    pub tasks: Vec<Task>,
}

impl SourceSet {
    pub fn len(&self) -> usize {
        self.agents.len() + self.workflows.len() + self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consume the set as entities: agents, then workflows, then tasks.
    pub fn into_entities(self) -> impl Iterator<Item = SourceEntity> {
        self.agents
            .into_iter()
            .map(SourceEntity::Agent)
            .chain(self.workflows.into_iter().map(SourceEntity::Workflow))
            .chain(self.tasks.into_iter().map(SourceEntity::Task))
    }
}

/// Load every manifest row. Failures are returned alongside the entities
/// that did load; one bad row never stops the others.
#[instrument(skip_all, fields(source = %source_dir.display(), rows = manifests.len()))]
pub fn load_sources(
    source_dir: &Path,
    manifests: &Manifests,
    mut on_loaded: impl FnMut(SourceKind, &str),
) -> (SourceSet, Vec<ConverterError>) {
    let mut set = SourceSet::default();
    let mut failures = Vec::new();

    for row in &manifests.agents {
        match load_agent(source_dir, row) {
            Ok(agent) => {
                on_loaded(SourceKind::Agent, &agent.name);
                set.agents.push(agent);
            }
            Err(e) => failures.push(e),
        }
    }
    for row in &manifests.workflows {
        match load_workflow(source_dir, row) {
            Ok(workflow) => {
                on_loaded(SourceKind::Workflow, &workflow.name);
                set.workflows.push(workflow);
            }
            Err(e) => failures.push(e),
        }
    }
    for row in &manifests.tasks {
        match load_task(source_dir, row) {
            Ok(task) => {
                on_loaded(SourceKind::Task, &task.name);
                set.tasks.push(task);
            }
            Err(e) => failures.push(e),
        }
    }

    (set, failures)
}

// ---------------------------------------------------------------------------
// Agents
// ---------------------------------------------------------------------------

/// Load one agent, filling missing persona fields from its manifest row.
pub fn load_agent(source_dir: &Path, row: &AgentRow) -> Result<Agent> {
    let path = source_path(source_dir, &row.path);
    let content = read_source(&path, "agent", &row.name)?;
    let mut agent = parse_agent(&content, &row.name, &row.module, &row.path);

    fill(&mut agent.display_name, &row.display_name);
    fill(&mut agent.title, &row.title);
    fill(&mut agent.icon, &row.icon);
    fill(&mut agent.persona.role, &row.role);
    fill(&mut agent.persona.identity, &row.identity);
    fill(&mut agent.persona.communication_style, &row.communication_style);
    if agent.persona.principles.is_empty() {
        agent.persona.principles = split_principles(&row.principles);
    }

    debug!(agent = %row.name, menu_items = agent.menu.len(), "agent loaded");
    Ok(agent)
}

fn fill(field: &mut String, fallback: &str) {
    if field.is_empty() {
        *field = fallback.to_string();
    }
}

// ---------------------------------------------------------------------------
// Workflows
// ---------------------------------------------------------------------------

/// Load one workflow with its instructions and template.
pub fn load_workflow(source_dir: &Path, row: &WorkflowRow) -> Result<Workflow> {
    let path = source_path(source_dir, &row.path);
    let content = read_source(&path, "workflow", &row.name)?;
    let dir = path.parent().unwrap_or(source_dir);

    let (mut config, instructions, template) = if is_yaml(&path) {
        let config = parse_yaml_config(&content).map_err(|e| context(&path, e))?;
        let instructions = yaml_instructions(dir, config.instructions.as_deref())?;
        let template = sibling(dir, config.template.as_deref(), &[TEMPLATE_MD])
            .map(|p| read_text(&p))
            .transpose()?;
        (config, instructions, template)
    } else {
        let (config, body) = parse_markdown_workflow(&content);
        let instructions = append_step_files(body, &dir.join(STEPS_DIR))?;
        let template = markdown_template(dir)?;
        (config, instructions, template)
    };

    if config.description.is_empty() {
        config.description = row.description.clone();
    }
    config.standalone |= row.standalone;

    let steps = parse_workflow_steps(&instructions);
    debug!(workflow = %row.name, steps = steps.len(), "workflow loaded");

    Ok(Workflow {
        name: row.name.clone(),
        module: row.module.clone(),
        path: row.path.clone(),
        config,
        instructions,
        steps,
        template,
    })
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml" | "yml")
    )
}

/// Instructions for a YAML workflow: the hinted sibling, else
/// `instructions.md`, else `instructions.xml`, else nothing.
fn yaml_instructions(dir: &Path, hint: Option<&str>) -> Result<String> {
    match sibling(dir, hint, &[INSTRUCTIONS_MD, INSTRUCTIONS_XML]) {
        Some(path) => read_text(&path),
        None => Ok(String::new()),
    }
}

/// The first existing file among the hint's basename and the defaults.
fn sibling(dir: &Path, hint: Option<&str>, defaults: &[&str]) -> Option<PathBuf> {
    let hinted = hint.and_then(basename);
    hinted
        .into_iter()
        .chain(defaults.iter().copied())
        .map(|name| dir.join(name))
        .find(|p| p.is_file())
}

/// Last path segment of a config value such as `{installed_path}/template.md`.
fn basename(value: &str) -> Option<&str> {
    value
        .rsplit(['/', '\\'])
        .next()
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

/// `template.md`, else the first `*.template.md` in name order.
fn markdown_template(dir: &Path) -> Result<Option<String>> {
    let plain = dir.join(TEMPLATE_MD);
    if plain.is_file() {
        return read_text(&plain).map(Some);
    }
    let suffixed = sorted_files(dir, |name| name.ends_with(TEMPLATE_SUFFIX))?;
    suffixed.first().map(|p| read_text(p)).transpose()
}

/// Append the bodies of `steps/step-*.md`, in name order.
fn append_step_files(mut instructions: String, steps_dir: &Path) -> Result<String> {
    let files = sorted_files(steps_dir, |name| {
        name.starts_with(STEP_FILE_PREFIX) && name.ends_with(".md")
    })?;

    for file in files {
        let text = read_text(&file)?;
        let body = split_frontmatter(&text).body.trim();
        if body.is_empty() {
            continue;
        }
        if !instructions.trim_end().is_empty() {
            instructions = format!("{}\n\n", instructions.trim_end());
        }
        instructions.push_str(body);
        instructions.push('\n');
    }

    Ok(instructions)
}

/// Regular files in `dir` whose name passes `keep`, sorted by name.
/// A missing directory yields no files.
fn sorted_files(dir: &Path, keep: impl Fn(&str) -> bool) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let entries = std::fs::read_dir(dir).map_err(|e| ConverterError::io(dir, e))?;

    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ConverterError::io(dir, e))?;
        let path = entry.path();
        let keep_it = path
            .file_name()
            .and_then(|n| n.to_str())
            .is_some_and(&keep);
        if keep_it && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

// ---------------------------------------------------------------------------
// Tasks
// ---------------------------------------------------------------------------

/// Load one task. Tag-delimited content is kept whole; plain Markdown loses
/// its front-matter, whose fields become fallbacks.
pub fn load_task(source_dir: &Path, row: &TaskRow) -> Result<Task> {
    let path = source_path(source_dir, &row.path);
    let content = read_source(&path, "task", &row.name)?;

    let is_xml = path.extension().and_then(|e| e.to_str()) == Some("xml");
    let is_tagged = is_xml || content.trim_start().starts_with("<task");

    let (content, fm_name, fm_description) = if is_tagged {
        (content, String::new(), String::new())
    } else {
        let split = split_frontmatter(&content);
        let mut fields = split.front_matter.map(frontmatter_fields).unwrap_or_default();
        (
            split.body.trim().to_string(),
            fields.remove("name").unwrap_or_default(),
            fields.remove("description").unwrap_or_default(),
        )
    };

    let display_name = first_non_empty(&[&row.display_name, &fm_name, &row.name]);
    let description = first_non_empty(&[&row.description, &fm_description, &display_name]);

    debug!(task = %row.name, is_tagged, "task loaded");

    Ok(Task {
        name: row.name.clone(),
        display_name,
        description,
        module: row.module.clone(),
        path: row.path.clone(),
        standalone: row.standalone,
        content,
        is_tagged,
    })
}

fn first_non_empty(candidates: &[&str]) -> String {
    candidates
        .iter()
        .find(|s| !s.is_empty())
        .map(|s| s.to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// File access
// ---------------------------------------------------------------------------

/// Read the file a manifest row names. Absent files are a
/// [`ConverterError::MissingSource`].
fn read_source(path: &Path, kind: &'static str, name: &str) -> Result<String> {
    if !path.is_file() {
        return Err(ConverterError::missing_source(kind, name, path));
    }
    read_text(path)
}

/// Read a file as UTF-8 text.
fn read_text(path: &Path) -> Result<String> {
    let bytes = std::fs::read(path).map_err(|e| ConverterError::io(path, e))?;
    String::from_utf8(bytes)
        .map_err(|_| ConverterError::parse(format!("{} is not valid UTF-8", path.display())))
}

/// Prefix a parse error with the file it came from.
fn context(path: &Path, err: ConverterError) -> ConverterError {
    match err {
        ConverterError::Parse { message } => {
            ConverterError::parse(format!("{}: {message}", path.display()))
        }
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn write(root: &Path, rel: &str, text: &str) {
        let path = root.join(rel);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, text).expect("write");
    }

    #[test]
    fn missing_agent_file_is_missing_source() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let row = AgentRow {
            name: "ghost".into(),
            module: "bmm".into(),
            path: "_bmad/bmm/agents/ghost.md".into(),
            ..AgentRow::default()
        };
        let err = load_agent(tmp.path(), &row).unwrap_err();
        assert!(err.is_warning());
    }

    #[test]
    fn agent_persona_falls_back_to_manifest() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "bmm/agents/pm.md", "---\nname: pm\ndescription: PM\n---\nNo block\n");
        let row = AgentRow {
            name: "pm".into(),
            title: "Product Manager".into(),
            icon: "📋".into(),
            role: "Investigative strategist".into(),
            principles: "- Ship value - Ask why".into(),
            module: "bmm".into(),
            path: "_bmad/bmm/agents/pm.md".into(),
            ..AgentRow::default()
        };

        let agent = load_agent(tmp.path(), &row).expect("load");
        // The front-matter description wins over the manifest title.
        assert_eq!(agent.title, "PM");
        assert_eq!(agent.icon, "📋");
        assert_eq!(agent.persona.role, "Investigative strategist");
        assert_eq!(agent.persona.principles, vec!["Ship value", "Ask why"]);
    }

    #[test]
    fn non_utf8_is_a_parse_error() {
        let tmp = tempfile::tempdir().expect("tempdir");
        let path = tmp.path().join("core/tasks/bin.md");
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(&path, [0xff, 0xfe, 0x00]).expect("write");
        let row = TaskRow {
            name: "bin".into(),
            module: "core".into(),
            path: "_bmad/core/tasks/bin.md".into(),
            ..TaskRow::default()
        };
        let err = load_task(tmp.path(), &row).unwrap_err();
        assert!(matches!(err, ConverterError::Parse { .. }));
        assert!(!err.is_warning());
    }

    #[test]
    fn yaml_workflow_reads_hinted_siblings() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(
            tmp.path(),
            "bmm/workflows/prd/workflow.yaml",
            "name: prd\ndescription: Write a PRD\ninstructions: \"{installed_path}/custom.xml\"\n",
        );
        write(tmp.path(), "bmm/workflows/prd/custom.xml", "<step n=\"1\" goal=\"Go\"></step>");
        write(tmp.path(), "bmm/workflows/prd/instructions.md", "ignored");
        write(tmp.path(), "bmm/workflows/prd/template.md", "# {{title}}");
        let row = WorkflowRow {
            name: "prd".into(),
            module: "bmm".into(),
            path: "_bmad/bmm/workflows/prd/workflow.yaml".into(),
            ..WorkflowRow::default()
        };

        let wf = load_workflow(tmp.path(), &row).expect("load");
        assert_eq!(wf.steps.len(), 1);
        assert_eq!(wf.steps[0].goal, "Go");
        assert_eq!(wf.template.as_deref(), Some("# {{title}}"));
        assert_eq!(wf.config.description, "Write a PRD");
    }

    #[test]
    fn yaml_workflow_without_instructions_is_empty() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "core/workflows/x/workflow.yml", "name: x\n");
        let row = WorkflowRow {
            name: "x".into(),
            module: "core".into(),
            path: "_bmad/core/workflows/x/workflow.yml".into(),
            description: "From manifest".into(),
            standalone: true,
        };
        let wf = load_workflow(tmp.path(), &row).expect("load");
        assert!(wf.instructions.is_empty());
        assert!(wf.template.is_none());
        assert_eq!(wf.config.description, "From manifest");
        assert!(wf.config.standalone);
    }

    #[test]
    fn bad_workflow_yaml_names_the_file() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "core/workflows/bad/workflow.yaml", "name: [oops");
        let row = WorkflowRow {
            name: "bad".into(),
            module: "core".into(),
            path: "_bmad/core/workflows/bad/workflow.yaml".into(),
            ..WorkflowRow::default()
        };
        let err = load_workflow(tmp.path(), &row).unwrap_err();
        assert!(err.to_string().contains("workflow.yaml"));
    }

    #[test]
    fn markdown_workflow_appends_sorted_step_files() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "core/workflows/bs/workflow.md", "---\nname: bs\n---\nIntro\n");
        write(tmp.path(), "core/workflows/bs/steps/step-02-b.md", "---\nname: b\n---\nSecond");
        write(tmp.path(), "core/workflows/bs/steps/step-01-a.md", "First");
        write(tmp.path(), "core/workflows/bs/steps/notes.md", "Skipped");
        write(tmp.path(), "core/workflows/bs/brief.template.md", "Template");
        let row = WorkflowRow {
            name: "bs".into(),
            module: "core".into(),
            path: "_bmad/core/workflows/bs/workflow.md".into(),
            ..WorkflowRow::default()
        };

        let wf = load_workflow(tmp.path(), &row).expect("load");
        assert_eq!(wf.instructions, "Intro\n\nFirst\n\nSecond\n");
        assert_eq!(wf.template.as_deref(), Some("Template"));
    }

    #[test]
    fn task_kinds() {
        let tmp = tempfile::tempdir().expect("tempdir");
        write(tmp.path(), "bmm/tasks/review.xml", "<task><mandate>Read</mandate></task>");
        write(
            tmp.path(),
            "core/tasks/shard.md",
            "---\nname: Shard Doc\ndescription: Split a document\n---\n\n# Shard\n",
        );

        let xml = load_task(
            tmp.path(),
            &TaskRow {
                name: "review".into(),
                module: "bmm".into(),
                path: "_bmad/bmm/tasks/review.xml".into(),
                standalone: true,
                ..TaskRow::default()
            },
        )
        .expect("xml task");
        assert!(xml.is_tagged);
        assert_eq!(xml.display_name, "review");
        assert!(xml.standalone);

        let md = load_task(
            tmp.path(),
            &TaskRow {
                name: "shard".into(),
                module: "core".into(),
                path: "_bmad/core/tasks/shard.md".into(),
                ..TaskRow::default()
            },
        )
        .expect("md task");
        assert!(!md.is_tagged);
        assert_eq!(md.content, "# Shard");
        assert_eq!(md.display_name, "Shard Doc");
        assert_eq!(md.description, "Split a document");
    }
}
