//! Markup extraction for BMAD source files.
//!
//! Splits leading YAML front-matter from a body and pulls structured records
//! out of the tag-delimited blocks embedded in agent, workflow and task files.
//! Every extractor is a set of `LazyLock`-compiled patterns over well-known
//! tag names, not a general XML parser.

pub mod agent;
pub mod cleanup;
pub mod workflow;

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;
use tracing::warn;

use bmadconv_shared::FrontMatter;

pub use agent::parse_agent;
pub use cleanup::clean_task_markup;
pub use workflow::{parse_markdown_workflow, parse_workflow_steps, parse_yaml_config};

// ---------------------------------------------------------------------------
// Front-matter
// ---------------------------------------------------------------------------

/// A source text split into its optional front-matter and its body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Split<'a> {
    /// YAML between the `---` delimiters, without the delimiters.
    pub front_matter: Option<&'a str>,
    pub body: &'a str,
}

/// Split a leading `---` / YAML / `---` block from the rest of the text.
///
/// Text without the delimiter pattern is returned whole as the body.
pub fn split_frontmatter(text: &str) -> Split<'_> {
    static FM_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)\A---[ \t]*\r?\n(?:(.*?)\r?\n)?---[ \t]*(?:\r?\n|\z)(.*)\z")
            .expect("valid regex")
    });

    match FM_RE.captures(text) {
        Some(caps) => Split {
            // An empty block has no first capture.
            front_matter: Some(caps.get(1).map_or("", |m| m.as_str())),
            body: caps.get(2).map_or("", |m| m.as_str()),
        },
        None => Split {
            front_matter: None,
            body: text,
        },
    }
}

/// Decode front-matter YAML into a flat `key → scalar text` map.
///
/// Non-scalar values are skipped. When the YAML does not decode, a line-wise
/// `key: value` scan is used instead.
pub fn frontmatter_fields(yaml: &str) -> BTreeMap<String, String> {
    match serde_yaml::from_str::<Value>(yaml) {
        Ok(Value::Mapping(map)) => map
            .into_iter()
            .filter_map(|(k, v)| Some((scalar_text(&k)?, scalar_text(&v)?)))
            .collect(),
        Ok(Value::Null) => BTreeMap::new(),
        Ok(_) => {
            warn!("front-matter is not a mapping, scanning lines");
            scan_lines(yaml)
        }
        Err(e) => {
            warn!(error = %e, "front-matter YAML did not decode, scanning lines");
            scan_lines(yaml)
        }
    }
}

/// The `name` and `description` fields of a front-matter block.
pub fn parse_frontmatter(yaml: Option<&str>) -> FrontMatter {
    let Some(yaml) = yaml else {
        return FrontMatter::default();
    };
    let mut fields = frontmatter_fields(yaml);
    FrontMatter {
        name: fields.remove("name").unwrap_or_default(),
        description: fields.remove("description").unwrap_or_default(),
    }
}

/// Render a YAML scalar as plain text.
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn scan_lines(yaml: &str) -> BTreeMap<String, String> {
    static LINE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^([A-Za-z0-9_-]+):\s*(.*?)\s*$").expect("valid regex")
    });

    yaml.lines()
        .filter_map(|line| {
            let caps = LINE_RE.captures(line)?;
            let value = caps[2].trim_matches(|c| c == '"' || c == '\'');
            Some((caps[1].to_string(), value.to_string()))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn split_with_frontmatter() {
        let text = "---\nname: pm\ndescription: Product Manager\n---\n# Body\n";
        let split = split_frontmatter(text);
        assert_eq!(split.front_matter, Some("name: pm\ndescription: Product Manager"));
        assert_eq!(split.body, "# Body\n");
    }

    #[test]
    fn split_without_frontmatter_keeps_whole_text() {
        let text = "# Just a heading\n\n---\nnot front-matter\n";
        let split = split_frontmatter(text);
        assert!(split.front_matter.is_none());
        assert_eq!(split.body, text);
    }

    #[test]
    fn split_handles_crlf_and_missing_trailing_newline() {
        let split = split_frontmatter("---\r\nname: x\r\n---");
        assert_eq!(split.front_matter, Some("name: x"));
        assert_eq!(split.body, "");
    }

    #[test]
    fn split_accepts_empty_frontmatter() {
        let split = split_frontmatter("---\n---\n# Body\n");
        assert_eq!(split.front_matter, Some(""));
        assert_eq!(split.body, "# Body\n");
        assert_eq!(parse_frontmatter(split.front_matter), FrontMatter::default());

        let split = split_frontmatter("---\r\n---");
        assert_eq!(split.front_matter, Some(""));
        assert_eq!(split.body, "");
    }

    #[test]
    fn fields_decode_scalars() {
        let fields = frontmatter_fields("name: dev\nstandalone: true\nversion: 6\ntags: [a, b]");
        assert_eq!(fields["name"], "dev");
        assert_eq!(fields["standalone"], "true");
        assert_eq!(fields["version"], "6");
        assert!(!fields.contains_key("tags"));
    }

    #[test]
    fn fields_fall_back_to_line_scan() {
        // Unbalanced quote and a stray colon make this invalid YAML.
        let yaml = "name: \"architect\ndescription: Designs: systems";
        let fields = frontmatter_fields(yaml);
        assert_eq!(fields["name"], "architect");
        assert_eq!(fields["description"], "Designs: systems");
    }

    #[test]
    fn parse_frontmatter_defaults_when_absent() {
        assert_eq!(parse_frontmatter(None), FrontMatter::default());
        let fm = parse_frontmatter(Some("name: 'qa'\ndescription: \"Test lead\""));
        assert_eq!(fm.name, "qa");
        assert_eq!(fm.description, "Test lead");
    }
}
