//! Workflow → document file.

use bmadconv_shared::{DocumentFile, SourceKind, Workflow, WorkflowStep};

use super::MarkdownBody;

pub fn convert_workflow(workflow: &Workflow) -> DocumentFile {
    let config = &workflow.config;
    let title = if config.name.trim().is_empty() {
        workflow.name.as_str()
    } else {
        config.name.trim()
    };
    let description = match config.description.trim() {
        "" => format!("{title} workflow"),
        d => d.to_string(),
    };

    let mut body = MarkdownBody::default();
    body.line(format!("# {title} Workflow")).blank();
    if !config.description.trim().is_empty() {
        body.line(config.description.trim()).blank();
    }
    if let Some(author) = config.author.as_deref().filter(|a| !a.trim().is_empty()) {
        body.line(format!("**Author:** {}", author.trim())).blank();
    }

    if !workflow.steps.is_empty() {
        body.line("## Workflow Steps").blank();
        for step in &workflow.steps {
            render_step(&mut body, step);
        }
    } else if !workflow.instructions.trim().is_empty() {
        body.line("## Instructions")
            .blank()
            .line(workflow.instructions.trim())
            .blank();
    }

    if !config.variables.is_empty() {
        body.line("## Variables").blank();
        for (key, value) in &config.variables {
            body.line(format!("- **{key}**: {}", code_span(value)));
        }
        body.blank();
    }

    if let Some(template) = workflow.template.as_deref().filter(|t| !t.trim().is_empty()) {
        let fence = "`".repeat(longest_backtick_run(template).max(2) + 1);
        body.line("## Output Template")
            .blank()
            .line(format!("{fence}markdown"))
            .line(template.trim_end())
            .line(fence);
    }

    DocumentFile {
        id: workflow.canonical_id(),
        description,
        kind: SourceKind::Workflow,
        source_module: workflow.module.clone(),
        source_name: workflow.name.clone(),
        standalone: config.standalone,
        body: body.finish(),
    }
}

fn longest_backtick_run(text: &str) -> usize {
    text.split(|c| c != '`').map(str::len).max().unwrap_or(0)
}

/// Inline code span whose delimiter outruns any backtick run in `value`.
fn code_span(value: &str) -> String {
    let delim = "`".repeat(longest_backtick_run(value) + 1);
    let pad = if value.starts_with('`') || value.ends_with('`') { " " } else { "" };
    format!("{delim}{pad}{value}{pad}{delim}")
}

fn render_step(body: &mut MarkdownBody, step: &WorkflowStep) {
    if step.goal.is_empty() {
        body.line(format!("### Step {}", step.n));
    } else {
        body.line(format!("### Step {}: {}", step.n, step.goal));
    }
    body.blank();

    for (label, items) in [
        ("Actions", &step.actions),
        ("Questions to ask", &step.asks),
        ("Checks", &step.checks),
        ("Template outputs", &step.template_outputs),
    ] {
        if items.is_empty() {
            continue;
        }
        body.line(format!("**{label}:**"));
        for item in items {
            body.line(format!("- {item}"));
        }
        body.blank();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bmadconv_shared::WorkflowConfig;
    use pretty_assertions::assert_eq;

    fn prd() -> Workflow {
        Workflow {
            name: "create-prd".into(),
            module: "bmm".into(),
            path: "_bmad/bmm/workflows/prd/workflow.yaml".into(),
            config: WorkflowConfig {
                name: "Create PRD".into(),
                description: "Write a product requirements document".into(),
                author: Some("BMad".into()),
                ..WorkflowConfig::default()
            },
            instructions: "<step n=\"1\" goal=\"Gather inputs\">...</step>".into(),
            steps: vec![WorkflowStep {
                n: 1,
                goal: "Gather inputs".into(),
                actions: vec!["Ask for requirements".into()],
                checks: vec!["Inputs complete".into()],
                ..WorkflowStep::default()
            }],
            template: Some("# PRD\n\n{{summary}}\n".into()),
        }
    }

    #[test]
    fn structured_steps() {
        let doc = convert_workflow(&prd());
        assert_eq!(doc.id.as_str(), "bmad-bmm-create-prd");
        assert_eq!(doc.description, "Write a product requirements document");
        assert_eq!(doc.kind, SourceKind::Workflow);
        assert_eq!(
            doc.body,
            "# Create PRD Workflow\n\
             \n\
             Write a product requirements document\n\
             \n\
             **Author:** BMad\n\
             \n\
             ## Workflow Steps\n\
             \n\
             ### Step 1: Gather inputs\n\
             \n\
             **Actions:**\n\
             - Ask for requirements\n\
             \n\
             **Checks:**\n\
             - Inputs complete\n\
             \n\
             ## Output Template\n\
             \n\
             ```markdown\n\
             # PRD\n\
             \n\
             {{summary}}\n\
             ```"
        );
    }

    #[test]
    fn raw_instructions_without_steps() {
        let wf = Workflow {
            name: "brainstorming".into(),
            module: "core".into(),
            config: WorkflowConfig {
                standalone: true,
                variables: [("output_folder".to_string(), "docs".to_string())].into(),
                ..WorkflowConfig::default()
            },
            instructions: "Facilitate a session.\n\n  Keep indentation.\n".into(),
            ..Workflow::default()
        };
        let doc = convert_workflow(&wf);
        assert!(doc.standalone);
        assert_eq!(doc.description, "brainstorming workflow");
        assert_eq!(
            doc.body,
            "# brainstorming Workflow\n\
             \n\
             ## Instructions\n\
             \n\
             Facilitate a session.\n\
             \n  Keep indentation.\n\
             \n\
             ## Variables\n\
             \n\
             - **output_folder**: `docs`"
        );
    }

    #[test]
    fn backticks_in_values_and_template_stay_inside_code() {
        let wf = Workflow {
            name: "release-notes".into(),
            module: "bmm".into(),
            config: WorkflowConfig {
                variables: [
                    ("cmd".to_string(), "run `make`".to_string()),
                    ("tick".to_string(), "`".to_string()),
                ]
                .into(),
                ..WorkflowConfig::default()
            },
            template: Some("# Notes\n\n```bash\nmake\n```\n".into()),
            ..Workflow::default()
        };
        let body = convert_workflow(&wf).body;
        assert!(body.contains("- **cmd**: `` run `make` ``"), "{body}");
        assert!(body.contains("- **tick**: `` ` ``"), "{body}");
        assert!(body.contains("````markdown\n# Notes\n\n```bash\nmake\n```\n````"), "{body}");
    }

    #[test]
    fn code_span_delimiters() {
        assert_eq!(code_span("docs"), "`docs`");
        assert_eq!(code_span("a``b"), "```a``b```");
        assert_eq!(code_span("`x`"), "`` `x` ``");
        assert_eq!(longest_backtick_run("no ticks"), 0);
    }
}
