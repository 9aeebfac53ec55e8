//! Common string abbreviations
//!
//! BibTeX styles predefine three-letter month macros (`month = jan`). Most
//! `.bib` files rely on them without declaring `@string`s, so the parser
//! treats them as always defined.

use lazy_static::lazy_static;
use std::collections::HashMap;

lazy_static! {
    /// Month macros and their expansions.
    static ref COMMON_STRINGS: HashMap<&'static str, &'static str> = {
        let mut m = HashMap::new();
        m.insert("jan", "January");
        m.insert("feb", "February");
        m.insert("mar", "March");
        m.insert("apr", "April");
        m.insert("may", "May");
        m.insert("jun", "June");
        m.insert("jul", "July");
        m.insert("aug", "August");
        m.insert("sep", "September");
        m.insert("oct", "October");
        m.insert("nov", "November");
        m.insert("dec", "December");
        m
    };
}

/// Expand a common string abbreviation (case-insensitive).
///
/// Returns `None` when the name is not one of the predefined macros.
pub fn expand_common_string(name: &str) -> Option<&'static str> {
    COMMON_STRINGS
        .get(name.trim().to_lowercase().as_str())
        .copied()
}

/// Check if a name is a predefined abbreviation
pub fn is_common_string(name: &str) -> bool {
    expand_common_string(name).is_some()
}

/// All predefined abbreviation names, sorted
pub fn common_string_names() -> Vec<&'static str> {
    let mut names: Vec<&'static str> = COMMON_STRINGS.keys().copied().collect();
    names.sort_unstable();
    names
}
