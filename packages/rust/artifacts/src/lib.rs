//! Output serializers for bmad-convert.
//!
//! Renders convention-neutral [`OutputArtifact`](bmadconv_shared::OutputArtifact)s
//! into Markdown files with a front-matter block, one [`Serializer`] per
//! target convention.

pub mod flavors;
pub mod frontmatter;

pub use flavors::{
    AgentsSerializer, ClaudeSerializer, OpenCodeSerializer, RenderedFile, Serializer,
    serializer_for,
};
pub use frontmatter::{FrontMatter, quote};
