//! `.agents/` convention: the minimal field set.

use bmadconv_shared::{DirectiveFile, DocumentFile, Target};

use super::{Serializer, document_fields};
use crate::frontmatter::FrontMatter;

#[derive(Debug, Clone, Copy, Default)]
pub struct AgentsSerializer;

impl Serializer for AgentsSerializer {
    fn target(&self) -> Target {
        Target::Agents
    }

    fn render_directive(&self, directive: &DirectiveFile) -> String {
        FrontMatter::new()
            .scalar("name", &directive.name)
            .scalar("description", &directive.description)
            .list("skills", &directive.permissions)
            .render(&directive.body)
    }

    fn render_document(&self, document: &DocumentFile) -> String {
        document_fields(document).render(&document.body)
    }
}
