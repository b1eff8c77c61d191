//! Canonical identifier generation.
//!
//! Every generated file name, skill folder and cross-reference goes through
//! [`CanonicalId`]. Do not build identifiers with `format!` anywhere else:
//! the resolver compares against these exact strings.

use serde::{Deserialize, Serialize};

/// Prefix carried by every generated identifier.
pub const ID_PREFIX: &str = "bmad";

/// Module whose entities get un-prefixed identifiers.
pub const CORE_MODULE: &str = "core";

/// Segment inserted before task names.
const TASK_SEGMENT: &str = "task";

/// Lowercase `s` and collapse every run of non-alphanumeric characters into a
/// single `-`, with no leading or trailing dash.
///
/// `normalize(normalize(s)) == normalize(s)` for every input.
pub fn normalize(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut pending_dash = false;

    // Lowercasing may expand a char into several (`İ` → `i` + U+0307), not
    // all of them alphanumeric, so filter after lowercasing.
    for c in s.chars().flat_map(char::to_lowercase) {
        if c.is_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            pending_dash = false;
            out.push(c);
        } else {
            pending_dash = true;
        }
    }

    out
}

/// The deterministic identifier naming one entity's output artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CanonicalId(String);

impl CanonicalId {
    /// Identifier for an agent or workflow.
    ///
    /// `core` → `bmad-{name}`, any other module → `bmad-{module}-{name}`.
    pub fn for_entity(module: &str, name: &str) -> Self {
        Self::build(module, &normalize(name))
    }

    /// Identifier for a task: the name gains a `task-` segment unless it
    /// already starts with one.
    pub fn for_task(module: &str, name: &str) -> Self {
        let name = normalize(name);
        let name = if name == TASK_SEGMENT || name.starts_with("task-") {
            name
        } else if name.is_empty() {
            TASK_SEGMENT.to_string()
        } else {
            format!("{TASK_SEGMENT}-{name}")
        };
        Self::build(module, &name)
    }

    fn build(module: &str, normalized_name: &str) -> Self {
        let module = normalize(module);
        let mut id = String::from(ID_PREFIX);
        if !module.is_empty() && module != CORE_MODULE {
            id.push('-');
            id.push_str(&module);
        }
        if !normalized_name.is_empty() {
            id.push('-');
            id.push_str(normalized_name);
        }
        Self(id)
    }

    /// Borrow the identifier text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
