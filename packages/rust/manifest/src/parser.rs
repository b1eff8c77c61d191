//! Manifest table parser.
//!
//! Parses the comma-separated manifest format:
//! - Line 1: header row naming the columns
//! - Remaining lines: one record per line
//! - Fields may be wrapped in `"..."`; inside quotes `""` is a literal quote
//!   and commas or newlines do not delimit
//! - Unquoted surrounding whitespace is trimmed

use tracing::warn;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// A parsed manifest table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    /// Column names from the header row.
    pub headers: Vec<String>,
    /// Records whose field count matches the header.
    pub rows: Vec<Vec<String>>,
}

impl Table {
    /// Iterate rows as column lookups.
    pub fn records(&self) -> impl Iterator<Item = Record<'_>> {
        self.rows.iter().map(move |fields| Record {
            headers: &self.headers,
            fields,
        })
    }
}

/// One manifest row with access by column name.
#[derive(Debug, Clone, Copy)]
pub struct Record<'a> {
    headers: &'a [String],
    fields: &'a [String],
}

impl<'a> Record<'a> {
    /// Value of `column`, or an empty string when the column is absent.
    pub fn get(&self, column: &str) -> &'a str {
        self.headers
            .iter()
            .position(|h| h == column)
            .and_then(|i| self.fields.get(i))
            .map_or("", String::as_str)
    }

    /// Whether `column` holds `true` (case-insensitive).
    pub fn flag(&self, column: &str) -> bool {
        self.get(column).eq_ignore_ascii_case("true")
    }
}

// ---------------------------------------------------------------------------
// Parser
// ---------------------------------------------------------------------------

/// Parse manifest text into a header and its matching rows.
///
/// Rows whose field count differs from the header are skipped.
pub fn parse_table(text: &str) -> Table {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut records = split_records(text).into_iter();

    let Some(headers) = records.next() else {
        return Table::default();
    };

    let mut rows = Vec::new();
    for (i, fields) in records.enumerate() {
        if fields.len() != headers.len() {
            warn!(
                row = i + 1,
                expected = headers.len(),
                found = fields.len(),
                "skipping manifest row with wrong field count"
            );
            continue;
        }
        rows.push(fields);
    }

    Table { headers, rows }
}

/// Split text into records of trimmed fields, skipping blank lines.
fn split_records(text: &str) -> Vec<Vec<String>> {
    let mut records = Vec::new();
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => fields.push(take_field(&mut current)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                fields.push(take_field(&mut current));
                push_record(&mut records, std::mem::take(&mut fields));
            }
            other => current.push(other),
        }
    }

    fields.push(take_field(&mut current));
    push_record(&mut records, fields);

    records
}

fn take_field(current: &mut String) -> String {
    let field = current.trim().to_string();
    current.clear();
    field
}

fn push_record(records: &mut Vec<Vec<String>>, fields: Vec<String>) {
    let blank = fields.len() == 1 && fields[0].is_empty();
    if !blank {
        records.push(fields);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parses_header_and_rows() {
        let table = parse_table("name,module,path\npm,bmm,_bmad/bmm/agents/pm.md\n");
        assert_eq!(table.headers, vec!["name", "module", "path"]);
        assert_eq!(table.rows.len(), 1);

        let record = table.records().next().expect("one record");
        assert_eq!(record.get("module"), "bmm");
        assert_eq!(record.get("missing"), "");
    }

    #[test]
    fn quoted_fields_keep_commas_quotes_and_newlines() {
        let text = "name,principles\n\
                    architect,\"- Keep it simple, always\n- Say \"\"no\"\" often\"\n";
        let table = parse_table(text);
        assert_eq!(table.rows.len(), 1);
        assert_eq!(
            table.rows[0][1],
            "- Keep it simple, always\n- Say \"no\" often"
        );
    }

    #[test]
    fn skips_rows_with_wrong_field_count() {
        let table = parse_table("a,b\n1,2\n1,2,3\n4\n5,6\n");
        assert_eq!(table.rows, vec![vec!["1", "2"], vec!["5", "6"]]);
    }

    #[test]
    fn handles_crlf_bom_and_blank_lines() {
        let table = parse_table("\u{feff}name,standalone\r\n\r\nreview,TRUE\r\n");
        assert_eq!(table.headers, vec!["name", "standalone"]);
        let record = table.records().next().expect("one record");
        assert!(record.flag("standalone"));
    }

    #[test]
    fn empty_text_is_empty_table() {
        assert_eq!(parse_table(""), Table::default());
        assert!(parse_table("name,path\n").rows.is_empty());
    }
}
