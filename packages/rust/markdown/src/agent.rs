//! Agent file extraction: front-matter plus the fenced ```xml agent block.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use bmadconv_shared::{Activation, Agent, MenuItem, MenuRef, Persona, RefKind};

use crate::{parse_frontmatter, split_frontmatter};

/// Parse an agent `.md` file.
///
/// `name`, `module` and `path` come from the manifest row. Fields the file
/// does not carry are left empty; persona fallback from the manifest is the
/// caller's concern.
pub fn parse_agent(content: &str, name: &str, module: &str, path: &str) -> Agent {
    let split = split_frontmatter(content);
    let front_matter = parse_frontmatter(split.front_matter);

    let mut agent = Agent {
        name: name.to_string(),
        module: module.to_string(),
        path: path.to_string(),
        ..Agent::default()
    };

    let Some(block) = extract_agent_block(split.body) else {
        debug!(agent = name, "no xml block, using front-matter only");
        agent.id = front_matter.name.clone();
        agent.display_name = front_matter.name.clone();
        agent.title = front_matter.description.clone();
        agent.front_matter = front_matter;
        return agent;
    };

    let attrs = agent_tag_attributes(block);
    agent.id = or_else(attr(attrs, &ID_RE), &front_matter.name);
    agent.display_name = or_else(attr(attrs, &NAME_RE), &front_matter.name);
    agent.title = or_else(attr(attrs, &TITLE_RE), &front_matter.description);
    agent.icon = attr(attrs, &ICON_RE);
    agent.persona = extract_persona(block);
    agent.activation = extract_activation(block);
    agent.menu = extract_menu(block);
    agent.front_matter = front_matter;

    agent
}

fn or_else(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

// ---------------------------------------------------------------------------
// Block and attributes
// ---------------------------------------------------------------------------

static ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)id="([^"]*)""#).expect("valid regex"));
static NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)name="([^"]*)""#).expect("valid regex"));
static TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)title="([^"]*)""#).expect("valid regex"));
static ICON_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?:^|\s)icon="([^"]*)""#).expect("valid regex"));

/// The content of the first ```xml fenced block, trimmed.
fn extract_agent_block(body: &str) -> Option<&str> {
    static XML_FENCE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)```xml\s*(.*?)```").expect("valid regex"));

    XML_FENCE_RE
        .captures(body)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
}

/// Attribute string of the outermost `<agent ...>` tag.
fn agent_tag_attributes(block: &str) -> &str {
    static AGENT_TAG_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<agent\s+([^>]*)>").expect("valid regex"));

    AGENT_TAG_RE
        .captures(block)
        .and_then(|caps| caps.get(1))
        .map_or("", |m| m.as_str())
}

/// First capture of `re` in `attrs`, or an empty string.
pub(crate) fn attr(attrs: &str, re: &Regex) -> String {
    re.captures(attrs)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_default()
}

/// Trimmed inner text of the first `<tag>...</tag>` match of `re`.
fn inner(text: &str, re: &Regex) -> String {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Persona
// ---------------------------------------------------------------------------

fn extract_persona(block: &str) -> Persona {
    static PERSONA_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<persona>(.*?)</persona>").expect("valid regex"));
    static ROLE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<role>(.*?)</role>").expect("valid regex"));
    static IDENTITY_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<identity>(.*?)</identity>").expect("valid regex"));
    static STYLE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<communication_style>(.*?)</communication_style>").expect("valid regex")
    });
    static PRINCIPLES_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<principles>(.*?)</principles>").expect("valid regex")
    });

    let Some(persona) = PERSONA_RE.captures(block).and_then(|c| c.get(1)) else {
        return Persona::default();
    };
    let persona = persona.as_str();

    Persona {
        role: inner(persona, &ROLE_RE),
        identity: inner(persona, &IDENTITY_RE),
        communication_style: inner(persona, &STYLE_RE),
        principles: split_principles(&inner(persona, &PRINCIPLES_RE)),
    }
}

/// Split a principles paragraph on bullet dashes, dropping empty segments.
///
/// A dash only delimits at a line start or after whitespace, so hyphenated
/// words stay whole.
pub fn split_principles(raw: &str) -> Vec<String> {
    static BULLET_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?m)(?:^|\s)-\s*").expect("valid regex"));

    BULLET_RE
        .split(raw)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(String::from)
        .collect()
}

// ---------------------------------------------------------------------------
// Activation
// ---------------------------------------------------------------------------

fn extract_activation(block: &str) -> Activation {
    static ACTIVATION_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<activation[^>]*>(.*?)</activation>").expect("valid regex")
    });
    static STEP_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<step(?:\s[^>]*)?>(.*?)</step>").expect("valid regex"));
    static RULES_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<rules>(.*?)</rules>").expect("valid regex"));
    static RULE_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<r>(.*?)</r>").expect("valid regex"));
    static HANDLERS_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?s)<menu-handlers>(.*?)</menu-handlers>").expect("valid regex")
    });
    static HANDLER_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r#"(?s)<handler\s+type="([^"]*)"\s*>(.*?)</handler>"#).expect("valid regex")
    });

    let Some(activation) = ACTIVATION_RE.captures(block).and_then(|c| c.get(1)) else {
        return Activation::default();
    };
    let activation = activation.as_str();

    let steps = STEP_RE
        .captures_iter(activation)
        .map(|caps| caps[1].trim().to_string())
        .collect();

    let rules = RULES_RE
        .captures(activation)
        .and_then(|c| c.get(1))
        .map(|rules| {
            RULE_RE
                .captures_iter(rules.as_str())
                .map(|caps| caps[1].trim().to_string())
                .collect()
        })
        .unwrap_or_default();

    let menu_handlers = HANDLERS_RE
        .captures(activation)
        .and_then(|c| c.get(1))
        .map(|handlers| {
            HANDLER_RE
                .captures_iter(handlers.as_str())
                .map(|caps| (caps[1].to_string(), caps[2].trim().to_string()))
                .collect()
        })
        .unwrap_or_default();

    Activation {
        steps,
        rules,
        menu_handlers,
    }
}

// ---------------------------------------------------------------------------
// Menu
// ---------------------------------------------------------------------------

fn extract_menu(block: &str) -> Vec<MenuItem> {
    static MENU_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"(?s)<menu>(.*?)</menu>").expect("valid regex"));
    static ITEM_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"<item\s+([^>]*)>([^<]*)</item>").expect("valid regex"));
    static CMD_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)cmd="([^"]*)""#).expect("valid regex"));
    static WORKFLOW_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)workflow="([^"]*)""#).expect("valid regex"));
    static EXEC_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)exec="([^"]*)""#).expect("valid regex"));
    static DATA_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)data="([^"]*)""#).expect("valid regex"));
    static ACTION_RE: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r#"(?:^|\s)action="([^"]*)""#).expect("valid regex"));

    let Some(menu) = MENU_RE.captures(block).and_then(|c| c.get(1)) else {
        return Vec::new();
    };

    ITEM_RE
        .captures_iter(menu.as_str())
        .map(|caps| {
            let attrs = caps.get(1).map_or("", |m| m.as_str());
            let optional = |re: &LazyLock<Regex>| {
                re.captures(attrs)
                    .and_then(|c| c.get(1))
                    .map(|m| m.as_str().to_string())
            };

            let reference = optional(&WORKFLOW_RE)
                .map(|target| MenuRef {
                    kind: RefKind::Workflow,
                    target,
                })
                .or_else(|| {
                    optional(&EXEC_RE).map(|target| MenuRef {
                        kind: RefKind::Exec,
                        target,
                    })
                });

            MenuItem {
                cmd: attr(attrs, &CMD_RE),
                label: caps[2].trim().to_string(),
                reference,
                data: optional(&DATA_RE),
                action: optional(&ACTION_RE),
            }
        })
        .collect()
}
