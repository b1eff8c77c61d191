//! Entity converters: pure functions from a parsed entity to the
//! convention-neutral artifacts the serializers render.

pub mod agent;
pub mod task;
pub mod workflow;

use bmadconv_shared::{OutputArtifact, SourceEntity};

use crate::resolver::ReferenceResolver;

pub use agent::convert_agent;
pub use task::convert_task;
pub use workflow::convert_workflow;

/// Convert one entity. Agents yield a directive and a document; workflows
/// and tasks yield a document.
pub fn convert_entity(entity: &SourceEntity, resolver: &ReferenceResolver) -> Vec<OutputArtifact> {
    match entity {
        SourceEntity::Agent(agent) => {
            let ownership = resolver.ownership(agent);
            let (directive, document) = convert_agent(agent, &ownership);
            vec![
                OutputArtifact::Directive(directive),
                OutputArtifact::Document(document),
            ]
        }
        SourceEntity::Workflow(workflow) => {
            vec![OutputArtifact::Document(convert_workflow(workflow))]
        }
        SourceEntity::Task(task) => vec![OutputArtifact::Document(convert_task(task))],
    }
}

/// Line-oriented Markdown builder shared by the converters.
#[derive(Debug, Default)]
pub(crate) struct MarkdownBody {
    lines: Vec<String>,
}

impl MarkdownBody {
    pub(crate) fn line(&mut self, text: impl Into<String>) -> &mut Self {
        self.lines.push(text.into());
        self
    }

    pub(crate) fn blank(&mut self) -> &mut Self {
        self.lines.push(String::new());
        self
    }

    /// `## {title}`, a blank line, the content, a blank line.
    pub(crate) fn section(&mut self, title: &str, content: &str) -> &mut Self {
        if content.trim().is_empty() {
            return self;
        }
        self.line(format!("## {title}")).blank().line(content.trim()).blank()
    }

    /// `## {title}`, a blank line, one `- item` per entry, a blank line.
    pub(crate) fn bullets<S: AsRef<str>>(&mut self, title: &str, items: &[S]) -> &mut Self {
        if items.is_empty() {
            return self;
        }
        self.line(format!("## {title}")).blank();
        for item in items {
            self.line(format!("- {}", item.as_ref()));
        }
        self.blank()
    }

    /// The collected lines, trimmed at both ends.
    pub(crate) fn finish(&self) -> String {
        self.lines.join("\n").trim().to_string()
    }
}
