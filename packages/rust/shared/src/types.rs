//! Core domain types: parsed source entities and convention-neutral output artifacts.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConverterError;
use crate::naming::CanonicalId;

/// Current schema version for the run manifest written next to the output.
pub const CURRENT_SCHEMA_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Source entities
// ---------------------------------------------------------------------------

/// One parsed input definition.
#[derive(Debug, Clone)]
pub enum SourceEntity {
    Agent(Agent),
    Workflow(Workflow),
    Task(Task),
}

impl SourceEntity {
    /// Manifest name of the entity.
    pub fn name(&self) -> &str {
        match self {
            Self::Agent(a) => &a.name,
            Self::Workflow(w) => &w.name,
            Self::Task(t) => &t.name,
        }
    }

    /// Owning module.
    pub fn module(&self) -> &str {
        match self {
            Self::Agent(a) => &a.module,
            Self::Workflow(w) => &w.module,
            Self::Task(t) => &t.module,
        }
    }

    /// The identifier this entity's artifacts are generated under.
    pub fn canonical_id(&self) -> CanonicalId {
        match self {
            Self::Agent(a) => a.canonical_id(),
            Self::Workflow(w) => w.canonical_id(),
            Self::Task(t) => t.canonical_id(),
        }
    }
}

/// Leading front-matter fields shared by agent and workflow Markdown files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FrontMatter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: String,
}

/// An agent definition parsed from its `.md` file.
#[derive(Debug, Clone, Default)]
pub struct Agent {
    /// `id` attribute of the `<agent>` tag (or the front-matter name).
    pub id: String,
    /// Manifest name; the canonical identifier is derived from this.
    pub name: String,
    /// Persona name from the `<agent name="...">` attribute.
    pub display_name: String,
    pub title: String,
    pub icon: String,
    pub module: String,
    /// Raw manifest path.
    pub path: String,
    pub front_matter: FrontMatter,
    pub persona: Persona,
    pub activation: Activation,
    pub menu: Vec<MenuItem>,
}

impl Agent {
    pub fn canonical_id(&self) -> CanonicalId {
        CanonicalId::for_entity(&self.module, &self.name)
    }
}

/// `<persona>` block of an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Persona {
    pub role: String,
    pub identity: String,
    pub communication_style: String,
    pub principles: Vec<String>,
}

impl Persona {
    pub fn is_empty(&self) -> bool {
        self.role.is_empty()
            && self.identity.is_empty()
            && self.communication_style.is_empty()
            && self.principles.is_empty()
    }
}

/// `<activation>` block of an agent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Activation {
    pub steps: Vec<String>,
    pub rules: Vec<String>,
    /// Handler type → handler text, in source order.
    pub menu_handlers: Vec<(String, String)>,
}

/// How a menu item points at another entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Workflow,
    Exec,
}

impl fmt::Display for RefKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workflow => f.write_str("workflow"),
            Self::Exec => f.write_str("exec"),
        }
    }
}

/// An opaque reference string from a menu item, resolved later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuRef {
    pub kind: RefKind,
    pub target: String,
}

/// One `<item>` of an agent's `<menu>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MenuItem {
    pub cmd: String,
    pub label: String,
    pub reference: Option<MenuRef>,
    pub data: Option<String>,
    pub action: Option<String>,
}

/// A workflow definition with its instructions and template.
#[derive(Debug, Clone, Default)]
pub struct Workflow {
    /// Manifest name; the canonical identifier is derived from this.
    pub name: String,
    pub module: String,
    pub path: String,
    pub config: WorkflowConfig,
    pub instructions: String,
    pub steps: Vec<WorkflowStep>,
    pub template: Option<String>,
}

impl Workflow {
    pub fn canonical_id(&self) -> CanonicalId {
        CanonicalId::for_entity(&self.module, &self.name)
    }
}

/// Workflow configuration, from YAML or Markdown front-matter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowConfig {
    pub name: String,
    pub description: String,
    pub author: Option<String>,
    pub standalone: bool,
    /// Basename hint for the instructions file.
    pub instructions: Option<String>,
    /// Basename hint for the template file.
    pub template: Option<String>,
    pub variables: BTreeMap<String, String>,
    pub data_files: BTreeMap<String, String>,
}

/// A `<step>` parsed from workflow instructions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkflowStep {
    pub n: u32,
    pub goal: String,
    pub actions: Vec<String>,
    pub asks: Vec<String>,
    pub checks: Vec<String>,
    pub template_outputs: Vec<String>,
}

/// A task definition.
#[derive(Debug, Clone, Default)]
pub struct Task {
    pub name: String,
    pub display_name: String,
    pub description: String,
    pub module: String,
    pub path: String,
    pub standalone: bool,
    pub content: String,
    /// Content is tag-delimited (`<task>...</task>`) rather than plain Markdown.
    pub is_tagged: bool,
}

impl Task {
    pub fn canonical_id(&self) -> CanonicalId {
        CanonicalId::for_task(&self.module, &self.name)
    }
}

// ---------------------------------------------------------------------------
// Output artifacts
// ---------------------------------------------------------------------------

/// Which kind of source produced a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Agent,
    Workflow,
    Task,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Agent => "agent",
            Self::Workflow => "workflow",
            Self::Task => "task",
        }
    }
}

/// A converted agent: behaviour prompt plus permitted skills.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveFile {
    pub id: CanonicalId,
    pub name: String,
    pub description: String,
    /// Own id first, then every owned skill, without duplicates.
    pub permissions: Vec<CanonicalId>,
    pub body: String,
    pub source_module: String,
}

/// A converted skill: instructions for one agent persona, workflow or task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentFile {
    pub id: CanonicalId,
    pub description: String,
    pub kind: SourceKind,
    pub source_module: String,
    pub source_name: String,
    /// User-invocable and not model-invocable.
    pub standalone: bool,
    pub body: String,
}

/// Serializable result of converting one entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutputArtifact {
    Directive(DirectiveFile),
    Document(DocumentFile),
}

impl OutputArtifact {
    pub fn id(&self) -> &CanonicalId {
        match self {
            Self::Directive(d) => &d.id,
            Self::Document(d) => &d.id,
        }
    }
}

// ---------------------------------------------------------------------------
// Target convention
// ---------------------------------------------------------------------------

/// Output directory convention.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    #[default]
    OpenCode,
    Claude,
    Agents,
}

impl Target {
    pub const ALL: [Target; 3] = [Target::OpenCode, Target::Claude, Target::Agents];

    /// Directory created under the output location.
    pub fn root_dir(self) -> &'static str {
        match self {
            Self::OpenCode => ".opencode",
            Self::Claude => ".claude",
            Self::Agents => ".agents",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenCode => "opencode",
            Self::Claude => "claude",
            Self::Agents => "agents",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = ConverterError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "opencode" => Ok(Self::OpenCode),
            "claude" => Ok(Self::Claude),
            "agents" => Ok(Self::Agents),
            other => Err(ConverterError::config(format!(
                "unknown target '{other}': expected 'opencode', 'claude', or 'agents'"
            ))),
        }
    }
}
