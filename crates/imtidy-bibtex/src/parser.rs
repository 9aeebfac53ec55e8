//! BibTeX parser implementation using nom
//!
//! This parser handles standard BibTeX format including:
//! - @string definitions (plus the predefined month abbreviations)
//! - @preamble declarations
//! - @comment sections
//! - All entry types, delimited by braces or parentheses
//! - Braced, quoted, numeric and macro field values
//! - String concatenation with #
//! - Nested braces in field values
//!
//! Text between entries is ignored. A malformed `@` block is an error; the
//! parser does not try to recover from it.

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0},
    combinator::map,
    IResult,
};
use std::collections::HashMap;

use super::common_strings::expand_common_string;
use super::entry::{BibTeXEntry, BibTeXEntryType};

/// A parsed bibliography file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BibDatabase {
    pub preambles: Vec<String>,
    /// `@string` definitions in file order
    pub strings: Vec<(String, String)>,
    /// Bodies of explicit `@comment` blocks
    pub comments: Vec<String>,
    pub entries: Vec<BibTeXEntry>,
}

impl BibDatabase {
    /// Create an empty database
    pub fn new() -> Self {
        Self::default()
    }

    /// A database with the same preambles, strings and comments but the
    /// given entries.
    pub fn with_entries(&self, entries: Vec<BibTeXEntry>) -> Self {
        Self {
            preambles: self.preambles.clone(),
            strings: self.strings.clone(),
            comments: self.comments.clone(),
            entries,
        }
    }

    /// Find an entry by cite key (case-insensitive)
    pub fn find(&self, cite_key: &str) -> Option<&BibTeXEntry> {
        self.entries
            .iter()
            .find(|e| e.cite_key.eq_ignore_ascii_case(cite_key))
    }
}

/// Error type for parsing failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("line {line}, column {column}: {message}")]
    Syntax {
        line: u32,
        column: u32,
        message: String,
    },
    #[error("no entry found")]
    NoEntry,
}

/// Parse a BibTeX string
pub fn parse(input: &str) -> Result<BibDatabase, ParseError> {
    let mut db = BibDatabase::new();
    let mut macros: HashMap<String, String> = HashMap::new();
    let mut remaining = input;

    loop {
        remaining = skip_to_next_block(remaining);
        if remaining.is_empty() {
            break;
        }

        match parse_at_block(remaining, &macros) {
            Ok((rest, block)) => {
                match block {
                    AtBlock::Entry(entry) => db.entries.push(entry),
                    AtBlock::String(key, value) => {
                        macros.insert(key.to_lowercase(), value.clone());
                        db.strings.push((key, value));
                    }
                    AtBlock::Preamble(text) => db.preambles.push(text),
                    AtBlock::Comment(text) => db.comments.push(text),
                }
                remaining = rest;
            }
            Err(err) => {
                let failed_at = match &err {
                    nom::Err::Error(e) | nom::Err::Failure(e) => e.input,
                    nom::Err::Incomplete(_) => remaining,
                };
                let offset = input.len() - remaining.len();
                let (line, column) = position_of(input, offset);
                let message = describe_failure(remaining, failed_at);
                return Err(ParseError::Syntax {
                    line,
                    column,
                    message,
                });
            }
        }
    }

    Ok(db)
}

/// Parse a single BibTeX entry
pub fn parse_entry(input: &str) -> Result<BibTeXEntry, ParseError> {
    parse(input)?
        .entries
        .into_iter()
        .next()
        .ok_or(ParseError::NoEntry)
}

/// Result of parsing an @ block
enum AtBlock {
    Entry(BibTeXEntry),
    String(String, String),
    Preamble(String),
    Comment(String),
}

/// Skip text outside of @ blocks, including `%` line comments
fn skip_to_next_block(input: &str) -> &str {
    let mut pos = 0;
    let bytes = input.as_bytes();

    while pos < bytes.len() {
        match bytes[pos] {
            b'@' => break,
            b'%' => {
                while pos < bytes.len() && bytes[pos] != b'\n' {
                    pos += 1;
                }
            }
            _ => pos += 1,
        }
    }

    &input[pos..]
}

/// 1-based line and column of a byte offset
fn position_of(input: &str, offset: usize) -> (u32, u32) {
    let before = &input[..offset];
    let line = before.matches('\n').count() as u32 + 1;
    let line_start = before.rfind('\n').map(|p| p + 1).unwrap_or(0);
    let column = before[line_start..].chars().count() as u32 + 1;
    (line, column)
}

fn describe_failure(block: &str, failed_at: &str) -> String {
    let head: String = block.chars().take_while(|c| *c != '\n').take(40).collect();
    if failed_at.is_empty() {
        format!("unexpected end of input in block starting `{}`", head)
    } else {
        let near: String = failed_at.chars().take(20).collect();
        format!("malformed block starting `{}` near `{}`", head, near)
    }
}

/// Parse an @ block (entry, string, preamble, or comment)
fn parse_at_block<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, AtBlock> {
    let (rest, _) = char('@')(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, block_type) = take_while1(|c: char| c.is_ascii_alphanumeric())(rest)?;

    match block_type.to_lowercase().as_str() {
        "string" => {
            let (rest, (key, value)) = parse_string_definition(rest, macros)?;
            Ok((rest, AtBlock::String(key, value)))
        }
        "preamble" => {
            let (rest, text) = parse_preamble(rest, macros)?;
            Ok((rest, AtBlock::Preamble(text)))
        }
        "comment" => {
            let (rest, text) = parse_comment_body(rest)?;
            Ok((rest, AtBlock::Comment(text)))
        }
        _ => {
            let (rest, entry) = parse_entry_body(rest, block_type, macros)?;
            Ok((rest, AtBlock::Entry(entry)))
        }
    }
}

/// Opening delimiter of a block; returns the matching closer
fn open_block(input: &str) -> IResult<&str, char> {
    let (rest, _) = multispace0(input)?;
    alt((map(char('{'), |_| '}'), map(char('('), |_| ')')))(rest)
}

fn close_block(input: &str, closer: char) -> IResult<&str, char> {
    let (rest, _) = multispace0(input)?;
    char(closer)(rest)
}

fn macro_name(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_alphanumeric() || "_-:./+'".contains(c))(input)
}

/// Parse a @string definition
fn parse_string_definition<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, closer) = open_block(input)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, key) = macro_name(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, value) = parse_field_value(rest, macros)?;
    let (rest, _) = close_block(rest, closer)?;

    Ok((rest, (key.to_string(), value)))
}

/// Parse a @preamble
fn parse_preamble<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, String> {
    let (rest, closer) = open_block(input)?;
    let (rest, value) = parse_field_value(rest, macros)?;
    let (rest, _) = close_block(rest, closer)?;

    Ok((rest, value))
}

/// Parse a @comment body: a braced block, or the rest of the line
fn parse_comment_body(input: &str) -> IResult<&str, String> {
    let (rest, _) = multispace0(input)?;
    if rest.starts_with('{') {
        let (rest, content) = parse_braced_value(rest)?;
        Ok((rest, content.trim().to_string()))
    } else {
        let pos = rest.find('\n').unwrap_or(rest.len());
        Ok((&rest[pos..], rest[..pos].trim().to_string()))
    }
}

/// Parse an entry body
fn parse_entry_body<'a>(
    input: &'a str,
    entry_type: &str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, BibTeXEntry> {
    let (rest, closer) = open_block(input)?;
    let (rest, _) = multispace0(rest)?;

    let (rest, cite_key) = take_while1(|c: char| {
        !c.is_whitespace() && c != ',' && c != '{' && c != '}' && c != closer
    })(rest)?;
    let (rest, _) = multispace0(rest)?;

    let mut entry = BibTeXEntry::new(cite_key, BibTeXEntryType::from_str(entry_type));

    // An entry without fields may omit the comma
    if let Ok((rest, _)) = close_block(rest, closer) {
        return Ok((rest, entry));
    }

    let (rest, _) = char(',')(rest)?;
    let (rest, fields) = parse_fields(rest, macros)?;
    let (rest, _) = close_block(rest, closer)?;

    for (key, value) in fields {
        entry.set_field(key, value);
    }

    Ok((rest, entry))
}

/// Parse fields within an entry
fn parse_fields<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, Vec<(String, String)>> {
    let mut fields = Vec::new();
    let mut remaining = input;

    loop {
        match parse_single_field(remaining, macros) {
            Ok((rest, (key, value))) => {
                fields.push((key, value));

                // A comma separates fields and may trail the last one
                let (rest, _) = multispace0(rest)?;
                match rest.strip_prefix(',') {
                    Some(stripped) => remaining = stripped,
                    None => return Ok((rest, fields)),
                }
            }
            Err(nom::Err::Failure(e)) => return Err(nom::Err::Failure(e)),
            Err(_) => return Ok((remaining, fields)),
        }
    }
}

/// Parse a single field (key = value)
///
/// Once the `=` has been seen, a bad value is a hard failure rather than
/// the end of the field list.
fn parse_single_field<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, (String, String)> {
    let (rest, _) = multispace0(input)?;
    let (rest, key) = macro_name(rest)?;
    let (rest, _) = multispace0(rest)?;
    let (rest, _) = char('=')(rest)?;
    let (rest, value) = parse_field_value(rest, macros).map_err(|e| match e {
        nom::Err::Error(inner) => nom::Err::Failure(inner),
        other => other,
    })?;

    Ok((rest, (key.to_lowercase(), value)))
}

/// Parse a field value (braced, quoted, number, or string reference)
fn parse_field_value<'a>(
    input: &'a str,
    macros: &HashMap<String, String>,
) -> IResult<&'a str, String> {
    let mut result = String::new();
    let mut remaining = input;

    loop {
        let (rest, _) = multispace0(remaining)?;

        let (rest, part) = alt((
            parse_braced_value,
            parse_quoted_value,
            map(take_while1(|c: char| c.is_ascii_digit()), |s: &str| {
                s.to_string()
            }),
            map(macro_name, |name: &str| resolve_macro(name, macros)),
        ))(rest)?;

        result.push_str(&part);
        remaining = rest;

        // Check for concatenation
        let (rest, _) = multispace0(remaining)?;
        if let Some(stripped) = rest.strip_prefix('#') {
            remaining = stripped;
        } else {
            return Ok((rest, result));
        }
    }
}

/// User `@string`s first, then the predefined abbreviations, then the name
/// itself.
fn resolve_macro(name: &str, macros: &HashMap<String, String>) -> String {
    if let Some(value) = macros.get(&name.to_lowercase()) {
        return value.clone();
    }
    expand_common_string(name)
        .map(str::to_string)
        .unwrap_or_else(|| name.to_string())
}

/// Parse a braced value {content}, returning the content without the outer
/// braces
fn parse_braced_value(input: &str) -> IResult<&str, String> {
    let (rest, content) = parse_braced_content(input)?;
    let inner = &content[1..content.len() - 1];
    Ok((rest, inner.to_string()))
}

/// Parse braced content including nested braces
fn parse_braced_content(input: &str) -> IResult<&str, &str> {
    if !input.starts_with('{') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }

    let mut depth = 0;
    let mut pos = 0;
    let bytes = input.as_bytes();

    while pos < bytes.len() {
        match bytes[pos] {
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Ok((&input[pos + 1..], &input[..pos + 1]));
                }
            }
            b'\\' => {
                // Skip escaped character
                pos += 1;
            }
            _ => {}
        }
        pos += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(
        &input[input.len()..],
        nom::error::ErrorKind::Eof,
    )))
}

/// Parse a quoted value "content"; quotes inside braces do not terminate it
fn parse_quoted_value(input: &str) -> IResult<&str, String> {
    if !input.starts_with('"') {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Char,
        )));
    }

    let bytes = input.as_bytes();
    let mut pos = 1;
    let mut brace_depth = 0i32;

    while pos < bytes.len() {
        match bytes[pos] {
            b'"' if brace_depth == 0 => {
                return Ok((&input[pos + 1..], input[1..pos].to_string()));
            }
            b'{' => brace_depth += 1,
            b'}' => brace_depth -= 1,
            b'\\' => pos += 1,
            _ => {}
        }
        pos += 1;
    }

    Err(nom::Err::Error(nom::error::Error::new(
        &input[input.len()..],
        nom::error::ErrorKind::Eof,
    )))
}
