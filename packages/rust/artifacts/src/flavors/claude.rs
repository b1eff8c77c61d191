//! `.claude/` convention.

use bmadconv_shared::{DirectiveFile, DocumentFile, FlavorOptions, Target};

use super::{Serializer, document_fields};
use crate::frontmatter::FrontMatter;

/// Writes agents with tool, model and permission-mode fields and a `skills`
/// list naming every permitted document.
#[derive(Debug, Clone)]
pub struct ClaudeSerializer {
    tools: String,
    model: String,
    permission_mode: String,
}

impl ClaudeSerializer {
    pub fn new(options: &FlavorOptions) -> Self {
        Self {
            tools: options.claude_tools.join(", "),
            model: options.claude_model.clone(),
            permission_mode: options.claude_permission_mode.clone(),
        }
    }
}

impl Serializer for ClaudeSerializer {
    fn target(&self) -> Target {
        Target::Claude
    }

    fn render_directive(&self, directive: &DirectiveFile) -> String {
        FrontMatter::new()
            .scalar("name", &directive.name)
            .scalar("description", &directive.description)
            .scalar("tools", &self.tools)
            .scalar("model", &self.model)
            .scalar("permissionMode", &self.permission_mode)
            .list("skills", &directive.permissions)
            .render(&directive.body)
    }

    fn render_document(&self, document: &DocumentFile) -> String {
        document_fields(document).render(&document.body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flavors::fixtures;
    use pretty_assertions::assert_eq;

    #[test]
    fn directive_front_matter() {
        let serializer = ClaudeSerializer::new(&FlavorOptions::default());
        let text = serializer.render_directive(&fixtures::directive());
        assert_eq!(
            text,
            "---\n\
             name: bmad-architect\n\
             description: Architect\n\
             tools: Read, Write, Edit, Bash, Glob, Grep\n\
             model: inherit\n\
             permissionMode: default\n\
             skills:\n  \
             - bmad-architect\n  \
             - bmad-brainstorming\n\
             ---\n\
             \n\
             🏗️ **Architect** - Winston\n\
             \n\
             ## Role\n\
             \n\
             System Architect\n"
        );
    }

    #[test]
    fn configured_tools_are_used() {
        let options = FlavorOptions {
            claude_tools: vec!["Read".into(), "Grep".into()],
            claude_model: "sonnet".into(),
            ..FlavorOptions::default()
        };
        let text = ClaudeSerializer::new(&options).render_directive(&fixtures::directive());
        assert!(text.contains("\ntools: Read, Grep\n"));
        assert!(text.contains("\nmodel: sonnet\n"));
    }

    #[test]
    fn standalone_document_flags() {
        let serializer = ClaudeSerializer::new(&FlavorOptions::default());
        let text = serializer.render_document(&fixtures::task_document());
        assert!(text.starts_with(
            "---\n\
             name: bmad-bmm-task-review\n\
             description: \"Review a change: carefully\"\n\
             user-invocable: true\n\
             disable-model-invocation: true\n\
             ---\n"
        ));
        assert!(!text.contains("metadata"));
    }
}
