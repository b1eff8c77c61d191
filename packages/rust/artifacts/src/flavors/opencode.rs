//! `.opencode/` convention.
//!
//! Agents carry no `name` field (the file stem names them) and grant skills
//! through a `permission.skill` map instead of a list. Documents carry a
//! `metadata` block recording where they came from.

use bmadconv_shared::{DirectiveFile, DocumentFile, FlavorOptions, Target};

use super::{Serializer, document_fields};
use crate::frontmatter::FrontMatter;

/// Permission value granted to every listed skill.
const ALLOW: &str = "allow";

#[derive(Debug, Clone)]
pub struct OpenCodeSerializer {
    agent_mode: String,
}

impl OpenCodeSerializer {
    pub fn new(options: &FlavorOptions) -> Self {
        Self {
            agent_mode: options.opencode_agent_mode.clone(),
        }
    }
}

impl Serializer for OpenCodeSerializer {
    fn target(&self) -> Target {
        Target::OpenCode
    }

    fn render_directive(&self, directive: &DirectiveFile) -> String {
        let skills = directive
            .permissions
            .iter()
            .fold(FrontMatter::new(), |fm, id| fm.scalar(id.as_str(), ALLOW));

        FrontMatter::new()
            .scalar("description", &directive.description)
            .scalar("mode", &self.agent_mode)
            .map("permission", FrontMatter::new().map("skill", skills))
            .render(&directive.body)
    }

    fn render_document(&self, document: &DocumentFile) -> String {
        let metadata = FrontMatter::new()
            .scalar("source-module", &document.source_module)
            .scalar("source-type", document.kind.as_str());

        document_fields(document)
            .map("metadata", metadata)
            .render(&document.body)
    }
}
