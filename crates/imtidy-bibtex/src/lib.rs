//! BibTeX parsing and formatting
//!
//! This crate provides the bibliography side of imtidy: a parser that reads
//! a `.bib` file into an ordered [`BibDatabase`] and a formatter that writes
//! it back so that it parses to the same database again.
//!
//! Features:
//! - Nom-based parser for `@string`, `@preamble`, `@comment` and entries
//! - Common string abbreviations (month names) expanded while parsing
//! - Field mapping view with the `ENTRYTYPE` and `ID` pseudo-fields
//! - Round-trip formatting

mod common_strings;
mod entry;
mod formatter;
pub mod parser;

pub use common_strings::{common_string_names, expand_common_string, is_common_string};
pub use entry::{BibTeXEntry, BibTeXEntryType, BibTeXField, ENTRY_TYPE_FIELD, ID_FIELD};
pub use formatter::{format_database, format_entries, format_entry};
pub use parser::{parse, parse_entry, BibDatabase, ParseError};
