//! Workflow extraction: YAML or front-matter configuration and `<step>` blocks.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

use bmadconv_shared::{ConverterError, Result, WorkflowConfig, WorkflowStep};

use crate::{frontmatter_fields, scalar_text, split_frontmatter};

/// Config keys with a dedicated meaning; everything else is a variable or
/// data file.
const KNOWN_KEYS: &[&str] = &[
    "name",
    "description",
    "author",
    "config_source",
    "output_folder",
    "installed_path",
    "template",
    "instructions",
    "standalone",
    "user_name",
    "communication_language",
    "date",
    "default_output_file",
];

/// Suffixes marking a key as a data-file reference rather than a variable.
const DATA_FILE_SUFFIXES: &[&str] = &["_frameworks", "_types", "_methods"];

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Decode a `workflow.yaml` configuration.
pub fn parse_yaml_config(content: &str) -> Result<WorkflowConfig> {
    let value: Value = serde_yaml::from_str(content)
        .map_err(|e| ConverterError::parse(format!("workflow config: {e}")))?;

    let fields = match value {
        Value::Mapping(map) => map
            .into_iter()
            .filter_map(|(k, v)| {
                let key = scalar_text(&k)?;
                // Only plain strings count as variables; booleans are kept
                // for the `standalone` lookup below.
                let text = match &v {
                    Value::Bool(b) => b.to_string(),
                    Value::String(s) => s.clone(),
                    _ => return None,
                };
                Some((key, text))
            })
            .collect(),
        Value::Null => BTreeMap::new(),
        _ => return Err(ConverterError::parse("workflow config is not a mapping")),
    };

    Ok(config_from_fields(fields))
}

/// Split a `workflow.md` into its configuration and its instruction body.
pub fn parse_markdown_workflow(content: &str) -> (WorkflowConfig, String) {
    let split = split_frontmatter(content);
    let fields = split
        .front_matter
        .map(frontmatter_fields)
        .unwrap_or_default();

    (config_from_fields(fields), split.body.to_string())
}

fn config_from_fields(mut fields: BTreeMap<String, String>) -> WorkflowConfig {
    let non_empty = |v: Option<String>| v.filter(|s| !s.is_empty());

    let mut config = WorkflowConfig {
        name: fields.remove("name").unwrap_or_default(),
        description: fields.remove("description").unwrap_or_default(),
        author: non_empty(fields.remove("author")),
        standalone: fields
            .remove("standalone")
            .is_some_and(|s| s.eq_ignore_ascii_case("true")),
        instructions: non_empty(fields.remove("instructions")),
        template: non_empty(fields.remove("template")),
        ..WorkflowConfig::default()
    };

    for (key, value) in fields {
        if KNOWN_KEYS.contains(&key.as_str()) || value == "true" || value == "false" {
            continue;
        }
        if DATA_FILE_SUFFIXES.iter().any(|s| key.ends_with(s)) {
            config.data_files.insert(key, value);
        } else {
            config.variables.insert(key, value);
        }
    }

    config
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// Collect every `<step>` block of a workflow's instructions, in source order.
///
/// Attributes may appear in any order. A step without a numeric `n` gets its
/// 1-based position.
pub fn parse_workflow_steps(instructions: &str) -> Vec<WorkflowStep> {
    static STEP_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<step(\s[^>]*)?>(.*?)</step>").expect("valid regex")
    });
    static N_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)n="\s*(\d+)\s*""#).expect("valid regex"));
    static GOAL_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)goal="([^"]*)""#).expect("valid regex"));
    static ACTION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<action(?:\s[^>]*)?>(.*?)</action>").expect("valid regex")
    });
    static ASK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<ask(?:\s[^>]*)?>(.*?)</ask>").expect("valid regex")
    });
    static CHECK_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<check(?:\s[^>]*)?>(.*?)</check>").expect("valid regex")
    });
    static TEMPLATE_OUTPUT_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<template-output(?:\s[^>]*)?>(.*?)</template-output>")
            .expect("valid regex")
    });

    STEP_RE
        .captures_iter(instructions)
        .enumerate()
        .map(|(i, caps)| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let body = caps.get(2).map_or("", |m| m.as_str());
            let position = u32::try_from(i + 1).unwrap_or(u32::MAX);

            WorkflowStep {
                n: N_RE
                    .captures(attrs)
                    .and_then(|c| c[1].parse().ok())
                    .unwrap_or(position),
                goal: crate::agent::attr(attrs, &GOAL_RE),
                actions: all(&ACTION_RE, body),
                asks: all(&ASK_RE, body),
                checks: all(&CHECK_RE, body),
                template_outputs: all(&TEMPLATE_OUTPUT_RE, body),
            }
        })
        .collect()
}

/// Trimmed, non-empty inner texts of every match of `re`.
fn all(re: &Regex, text: &str) -> Vec<String> {
    re.captures_iter(text)
        .map(|caps| caps[1].trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn single_step_with_action() {
        let steps = parse_workflow_steps(
            r#"<step n="1" goal="Gather inputs"><action>Ask for requirements</action></step>"#,
        );
        assert_eq!(steps.len(), 1);
        assert_eq!(steps[0].n, 1);
        assert_eq!(steps[0].goal, "Gather inputs");
        assert_eq!(steps[0].actions, vec!["Ask for requirements"]);
    }

    #[test]
    fn steps_accept_any_attribute_order() {
        let text = r#"
<step goal="Draft" n="2">
  <action>Write the outline</action>
  <ask>Does this look right?</ask>
  <check if="outline approved">Continue</check>
  <template-output>outline</template-output>
</step>
<step goal="Review">
  <action if="needed">Fix issues</action>
</step>
"#;
        let steps = parse_workflow_steps(text);
        assert_eq!(steps.len(), 2);
        assert_eq!(steps[0].n, 2);
        assert_eq!(steps[0].goal, "Draft");
        assert_eq!(steps[0].asks, vec!["Does this look right?"]);
        assert_eq!(steps[0].checks, vec!["Continue"]);
        assert_eq!(steps[0].template_outputs, vec!["outline"]);
        // Missing `n` falls back to the position.
        assert_eq!(steps[1].n, 2);
        assert_eq!(steps[1].actions, vec!["Fix issues"]);
    }

    #[test]
    fn steps_container_tag_is_not_a_step() {
        assert!(parse_workflow_steps("<steps>nothing here</steps>").is_empty());
        assert!(parse_workflow_steps("plain instructions").is_empty());
    }

    #[test]
    fn yaml_config_classifies_keys() {
        let yaml = r#"
name: create-prd
description: "Create a PRD"
author: BMad
standalone: true
instructions: "{installed_path}/instructions.md"
template: "{installed_path}/template.md"
output_folder: "{config_source}:output_folder"
project_types: "{installed_path}/project-types.csv"
recommended_inputs: "docs/brief.md"
web_bundle: false
"#;
        let config = parse_yaml_config(yaml).expect("valid config");
        assert_eq!(config.name, "create-prd");
        assert_eq!(config.author.as_deref(), Some("BMad"));
        assert!(config.standalone);
        assert_eq!(config.instructions.as_deref(), Some("{installed_path}/instructions.md"));
        assert_eq!(config.data_files.len(), 1);
        assert!(config.data_files.contains_key("project_types"));
        assert_eq!(config.variables.len(), 1);
        assert_eq!(config.variables["recommended_inputs"], "docs/brief.md");
    }

    #[test]
    fn yaml_config_rejects_bad_yaml() {
        let err = parse_yaml_config("name: [unclosed").unwrap_err();
        assert!(err.to_string().starts_with("parse error: workflow config"));
    }

    #[test]
    fn markdown_workflow_splits_body() {
        let (config, body) = parse_markdown_workflow(
            "---\nname: brainstorming\ndescription: Facilitate ideas\n---\n# Brainstorming\n",
        );
        assert_eq!(config.name, "brainstorming");
        assert_eq!(config.description, "Facilitate ideas");
        assert!(!config.standalone);
        assert_eq!(body, "# Brainstorming\n");
    }
}
