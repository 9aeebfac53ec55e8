//! BibTeX formatting module
//!
//! Converts entries and whole databases back to BibTeX text. The output of
//! [`format_database`] parses back to an equal [`BibDatabase`].

use super::entry::BibTeXEntry;
use super::parser::BibDatabase;

/// Format a single BibTeX entry to string
pub fn format_entry(entry: &BibTeXEntry) -> String {
    let mut result = String::new();

    result.push('@');
    result.push_str(entry.entry_type.as_str());
    result.push('{');
    result.push_str(&entry.cite_key);
    result.push(',');
    result.push('\n');

    for field in &entry.fields {
        result.push_str("    ");
        result.push_str(&field.key);
        result.push_str(" = ");
        result.push_str(&format_field_value(&field.value));
        result.push(',');
        result.push('\n');
    }

    result.push('}');
    result
}

/// Format multiple entries to a single BibTeX string
pub fn format_entries(entries: &[BibTeXEntry]) -> String {
    entries
        .iter()
        .map(format_entry)
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Format a complete database: preambles, string definitions, comments,
/// then entries, each group in its stored order.
pub fn format_database(db: &BibDatabase) -> String {
    let mut blocks: Vec<String> = Vec::new();

    for preamble in &db.preambles {
        blocks.push(format_preamble(preamble));
    }
    for (key, value) in &db.strings {
        blocks.push(format_string_definition(key, value));
    }
    for comment in &db.comments {
        blocks.push(format_comment(comment));
    }
    for entry in &db.entries {
        blocks.push(format_entry(entry));
    }

    if blocks.is_empty() {
        return String::new();
    }

    let mut result = blocks.join("\n\n");
    result.push('\n');
    result
}

/// Format a field value, choosing appropriate delimiters
fn format_field_value(value: &str) -> String {
    if !value.is_empty() && value.chars().all(|c| c.is_ascii_digit()) {
        return value.to_string();
    }

    // Braces preserve LaTeX commands and inner quotes
    let mut result = String::with_capacity(value.len() + 2);
    result.push('{');
    result.push_str(value);
    result.push('}');
    result
}

fn format_string_definition(key: &str, value: &str) -> String {
    format!("@string{{{} = {}}}", key, format_field_value(value))
}

fn format_preamble(text: &str) -> String {
    format!("@preamble{{{{{}}}}}", text)
}

/// Braced form when the text reads back as one braced block, otherwise the
/// line form. A line-form comment cannot contain a newline or start with `{`.
fn format_comment(text: &str) -> String {
    if is_brace_balanced(text) {
        format!("@comment{{{}}}", text)
    } else {
        format!("@comment {}", text)
    }
}

/// Braces nest properly, counting the way the parser does (a backslash
/// escapes the next character).
fn is_brace_balanced(text: &str) -> bool {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut pos = 0;

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => match depth.checked_sub(1) {
                Some(d) => depth = d,
                None => return false,
            },
            b'\\' => {
                if pos + 1 == bytes.len() {
                    return false;
                }
                pos += 1;
            }
            _ => {}
        }
        pos += 1;
    }

    depth == 0
}
