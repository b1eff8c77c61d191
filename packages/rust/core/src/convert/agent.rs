//! Agent → directive file (behaviour prompt) + document file (persona skill).

use bmadconv_shared::{Agent, DirectiveFile, DocumentFile, MenuItem, SourceKind};

use super::MarkdownBody;
use crate::resolver::OwnershipRecord;

/// Convert an agent and the skills its menu resolved to.
///
/// The permission list is the agent's own identifier followed by every owned
/// identifier, without duplicates.
pub fn convert_agent(agent: &Agent, ownership: &OwnershipRecord) -> (DirectiveFile, DocumentFile) {
    let id = agent.canonical_id();

    let mut permissions = vec![id.clone()];
    for owned in &ownership.owned {
        if !permissions.contains(owned) {
            permissions.push(owned.clone());
        }
    }

    let directive = DirectiveFile {
        id: id.clone(),
        name: id.to_string(),
        description: first_of(&[&agent.front_matter.description, &agent.title, &agent.name]),
        permissions,
        body: directive_body(agent),
        source_module: agent.module.clone(),
    };

    let title = title_of(agent);
    let summary = first_of(&[&agent.persona.role, &agent.front_matter.description]);
    let description = if summary.is_empty() {
        title.clone()
    } else {
        format!("{title} - {summary}")
    };

    let document = DocumentFile {
        id,
        description,
        kind: SourceKind::Agent,
        source_module: agent.module.clone(),
        source_name: agent.name.clone(),
        standalone: false,
        body: document_body(agent, &title),
    };

    (directive, document)
}

fn first_of(candidates: &[&str]) -> String {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or_default()
        .to_string()
}

fn title_of(agent: &Agent) -> String {
    first_of(&[&agent.title, &agent.display_name, &agent.name])
}

fn persona_name(agent: &Agent) -> String {
    first_of(&[&agent.display_name, &agent.name])
}

// ---------------------------------------------------------------------------
// Directive body
// ---------------------------------------------------------------------------

fn directive_body(agent: &Agent) -> String {
    let persona = &agent.persona;
    let mut body = MarkdownBody::default();

    if !agent.icon.is_empty() {
        body.line(format!(
            "{} **{}** - {}",
            agent.icon,
            title_of(agent),
            persona_name(agent)
        ))
        .blank();
    }

    body.section("Role", &persona.role)
        .section("Identity", &persona.identity)
        .section("Communication Style", &persona.communication_style)
        .bullets("Principles", &persona.principles)
        .bullets("Rules", &agent.activation.rules);

    body.finish()
}

// ---------------------------------------------------------------------------
// Document body
// ---------------------------------------------------------------------------

fn document_body(agent: &Agent, title: &str) -> String {
    let mut body = MarkdownBody::default();

    body.line(format!("# {title} Agent Skill"))
        .blank()
        .line(format!(
            "Invoke this skill to activate the {} agent persona.",
            persona_name(agent)
        ))
        .blank();

    let steps = &agent.activation.steps;
    if !steps.is_empty() {
        body.line("## Activation Steps").blank();
        for (i, step) in steps.iter().enumerate() {
            body.line(format!("{}. {}", i + 1, step));
        }
        body.blank();
    }

    let handlers = &agent.activation.menu_handlers;
    if !handlers.is_empty() {
        body.line("## Menu Handlers").blank();
        for (kind, text) in handlers {
            body.line(format!("### {kind}")).blank();
            for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
                body.line(line);
            }
            body.blank();
        }
    }

    if !agent.menu.is_empty() {
        body.line("## Available Commands").blank();
        for item in &agent.menu {
            body.line(command_line(item));
        }
        body.blank();
    }

    let persona = &agent.persona;
    if !persona.is_empty() {
        body.line("## Persona").blank();
        for (label, value) in [
            ("Role", &persona.role),
            ("Identity", &persona.identity),
            ("Style", &persona.communication_style),
        ] {
            if !value.is_empty() {
                body.line(format!("**{label}:** {value}")).blank();
            }
        }
        if !persona.principles.is_empty() {
            body.line("**Principles:**");
            for p in &persona.principles {
                body.line(format!("- {p}"));
            }
            body.blank();
        }
    }

    body.finish()
}

/// `- **{cmd}**: {label}` plus the reference and any data/action annotations.
fn command_line(item: &MenuItem) -> String {
    let mut line = format!("- **{}**: {}", item.cmd, item.label);
    if let Some(reference) = &item.reference {
        line.push_str(&format!(" ({}: `{}`)", reference.kind, reference.target));
    }
    if let Some(data) = &item.data {
        line.push_str(&format!(" [data: `{data}`]"));
    }
    if let Some(action) = &item.action {
        line.push_str(&format!(" [action: {action}]"));
    }
    line
}
