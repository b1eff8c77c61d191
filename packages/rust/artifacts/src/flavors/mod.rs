//! Serializer trait and the built-in output conventions.
//!
//! Every flavor lays files out the same way under its own root
//! (`agents/{id}.md`, `skills/{id}/SKILL.md`) and differs only in the
//! front-matter fields it writes.

mod agents;
mod claude;
mod opencode;

use std::path::PathBuf;

use tracing::debug;

use bmadconv_shared::{
    CanonicalId, DirectiveFile, DocumentFile, FlavorOptions, OutputArtifact, Target,
};

use crate::frontmatter::FrontMatter;

pub use agents::AgentsSerializer;
pub use claude::ClaudeSerializer;
pub use opencode::OpenCodeSerializer;

/// Directory holding directive files, relative to the flavor root.
pub const AGENTS_DIR: &str = "agents";

/// Directory holding one folder per document, relative to the flavor root.
pub const SKILLS_DIR: &str = "skills";

/// File name of a document inside its folder.
pub const SKILL_FILE: &str = "SKILL.md";

// ---------------------------------------------------------------------------
// Trait
// ---------------------------------------------------------------------------

/// One rendered output file, relative to the flavor root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    pub relative_path: PathBuf,
    pub content: String,
}

/// Renders convention-neutral artifacts for one output convention.
pub trait Serializer: Send + Sync {
    /// The convention this serializer writes.
    fn target(&self) -> Target;

    /// Full text of an agent's directive file.
    fn render_directive(&self, directive: &DirectiveFile) -> String;

    /// Full text of a document file.
    fn render_document(&self, document: &DocumentFile) -> String;

    /// Location of a directive file under the flavor root.
    fn directive_path(&self, id: &CanonicalId) -> PathBuf {
        PathBuf::from(AGENTS_DIR).join(format!("{id}.md"))
    }

    /// Location of a document file under the flavor root.
    fn document_path(&self, id: &CanonicalId) -> PathBuf {
        PathBuf::from(SKILLS_DIR).join(id.as_str()).join(SKILL_FILE)
    }

    /// Render an artifact together with its location.
    fn render(&self, artifact: &OutputArtifact) -> RenderedFile {
        match artifact {
            OutputArtifact::Directive(d) => RenderedFile {
                relative_path: self.directive_path(&d.id),
                content: self.render_directive(d),
            },
            OutputArtifact::Document(d) => RenderedFile {
                relative_path: self.document_path(&d.id),
                content: self.render_document(d),
            },
        }
    }
}

/// Build the serializer for `target`.
pub fn serializer_for(target: Target, options: &FlavorOptions) -> Box<dyn Serializer> {
    debug!(%target, root = target.root_dir(), "serializer selected");
    match target {
        Target::OpenCode => Box::new(OpenCodeSerializer::new(options)),
        Target::Claude => Box::new(ClaudeSerializer::new(options)),
        Target::Agents => Box::new(AgentsSerializer),
    }
}

// ---------------------------------------------------------------------------
// Shared field sets
// ---------------------------------------------------------------------------

/// `name` and `description`, plus the invocation flags of standalone documents.
pub(crate) fn document_fields(document: &DocumentFile) -> FrontMatter {
    let fm = FrontMatter::new()
        .scalar("name", &document.id)
        .scalar("description", &document.description);

    if document.standalone {
        fm.flag("user-invocable", true)
            .flag("disable-model-invocation", true)
    } else {
        fm
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    use bmadconv_shared::{CanonicalId, DirectiveFile, DocumentFile, SourceKind};

    pub fn directive() -> DirectiveFile {
        DirectiveFile {
            id: CanonicalId::for_entity("core", "architect"),
            name: "bmad-architect".into(),
            description: "Architect".into(),
            permissions: vec![
                CanonicalId::for_entity("core", "architect"),
                CanonicalId::for_entity("core", "brainstorming"),
            ],
            body: "🏗️ **Architect** - Winston\n\n## Role\n\nSystem Architect\n".into(),
            source_module: "core".into(),
        }
    }

    pub fn task_document() -> DocumentFile {
        DocumentFile {
            id: CanonicalId::for_task("bmm", "review"),
            description: "Review a change: carefully".into(),
            kind: SourceKind::Task,
            source_module: "bmm".into(),
            source_name: "review".into(),
            standalone: true,
            body: "# Review\n\n## Instructions\n\n- Read every file".into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_flavor_uses_the_same_layout() {
        let options = FlavorOptions::default();
        let id = CanonicalId::for_entity("bmm", "pm");
        for target in Target::ALL {
            let serializer = serializer_for(target, &options);
            assert_eq!(serializer.target(), target);
            assert_eq!(serializer.directive_path(&id), PathBuf::from("agents/bmad-bmm-pm.md"));
            assert_eq!(
                serializer.document_path(&id),
                PathBuf::from("skills/bmad-bmm-pm/SKILL.md")
            );
        }
    }

    #[test]
    fn render_pairs_path_and_content() {
        let serializer = serializer_for(Target::Agents, &FlavorOptions::default());
        let file = serializer.render(&OutputArtifact::Document(fixtures::task_document()));
        assert_eq!(
            file.relative_path,
            PathBuf::from("skills/bmad-bmm-task-review/SKILL.md")
        );
        assert!(file.content.starts_with("---\nname: bmad-bmm-task-review\n"));
    }
}
