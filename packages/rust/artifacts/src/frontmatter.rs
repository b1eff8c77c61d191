//! Front-matter block builder.
//!
//! Fields render in insertion order as `key: value` lines. Values made only
//! of characters YAML reads back verbatim stay plain; anything else becomes a
//! JSON-style double-quoted string, which is also valid YAML.

use std::sync::LazyLock;

use regex::Regex;

/// One front-matter value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Scalar(String),
    Bool(bool),
    List(Vec<String>),
    Map(FrontMatter),
}

/// An ordered set of front-matter fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FrontMatter {
    fields: Vec<(String, Value)>,
}

impl FrontMatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field. Empty values are omitted.
    pub fn scalar(mut self, key: &str, value: impl AsRef<str>) -> Self {
        let value = value.as_ref();
        if !value.is_empty() {
            self.fields.push((key.to_string(), Value::Scalar(value.to_string())));
        }
        self
    }

    /// Add a boolean field.
    pub fn flag(mut self, key: &str, value: bool) -> Self {
        self.fields.push((key.to_string(), Value::Bool(value)));
        self
    }

    /// Add a list field. Empty lists are omitted.
    pub fn list<I, S>(mut self, key: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let items: Vec<String> = items
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        if !items.is_empty() {
            self.fields.push((key.to_string(), Value::List(items)));
        }
        self
    }

    /// Add a nested block. Empty blocks are omitted.
    pub fn map(mut self, key: &str, block: FrontMatter) -> Self {
        if !block.is_empty() {
            self.fields.push((key.to_string(), Value::Map(block)));
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Render `---`, the fields, `---`, a blank line, then `body` with
    /// exactly one trailing newline.
    pub fn render(&self, body: &str) -> String {
        let mut out = String::from("---\n");
        self.write_fields(&mut out, 0);
        out.push_str("---\n\n");
        out.push_str(body.trim_end());
        out.push('\n');
        out
    }

    fn write_fields(&self, out: &mut String, depth: usize) {
        let indent = "  ".repeat(depth);
        for (key, value) in &self.fields {
            let key = quote(key);
            match value {
                Value::Scalar(s) => out.push_str(&format!("{indent}{key}: {}\n", quote(s))),
                Value::Bool(b) => out.push_str(&format!("{indent}{key}: {b}\n")),
                Value::List(items) => {
                    out.push_str(&format!("{indent}{key}:\n"));
                    for item in items {
                        out.push_str(&format!("{indent}  - {}\n", quote(item)));
                    }
                }
                Value::Map(block) => {
                    out.push_str(&format!("{indent}{key}:\n"));
                    block.write_fields(out, depth + 1);
                }
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Quoting
// ---------------------------------------------------------------------------

/// Words YAML 1.1 readers turn into booleans or null.
const RESERVED_WORDS: &[&str] = &["true", "false", "yes", "no", "on", "off", "null", "y", "n"];

/// Emit `value` plain when YAML reads it back unchanged, otherwise quoted.
pub fn quote(value: &str) -> String {
    if is_plain_safe(value) {
        value.to_string()
    } else {
        // serde_json only fails on non-string map keys; a &str cannot fail.
        serde_json::to_string(value).unwrap_or_else(|_| format!("\"{}\"", value.escape_default()))
    }
}

fn is_plain_safe(value: &str) -> bool {
    static SAFE_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[A-Za-z0-9][A-Za-z0-9 _.,/()+-]*$").expect("valid regex")
    });
    static NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"^[-+]?(?:[0-9][0-9_]*)?(?:\.[0-9_]*)?(?:[eE][-+]?[0-9]+)?$|^0[xob]")
            .expect("valid regex")
    });

    SAFE_RE.is_match(value)
        && !value.ends_with(' ')
        && !NUMERIC_RE.is_match(value)
        && !RESERVED_WORDS.contains(&value.to_ascii_lowercase().as_str())
}
