//! BibTeX entry data structures

use std::collections::HashMap;
use std::fmt;

/// Pseudo-field holding the entry type in [`BibTeXEntry::record`]
pub const ENTRY_TYPE_FIELD: &str = "ENTRYTYPE";

/// Pseudo-field holding the cite key in [`BibTeXEntry::record`]
pub const ID_FIELD: &str = "ID";

/// BibTeX entry type
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BibTeXEntryType {
    Article,
    Book,
    Booklet,
    InBook,
    InCollection,
    InProceedings,
    Manual,
    MastersThesis,
    Misc,
    PhdThesis,
    Proceedings,
    TechReport,
    Unpublished,
    Online,
    Software,
    Dataset,
    /// Any other type, stored lower-cased so it survives a round trip
    Other(String),
}

impl BibTeXEntryType {
    const STANDARD: [BibTeXEntryType; 16] = [
        Self::Article,
        Self::Book,
        Self::Booklet,
        Self::InBook,
        Self::InCollection,
        Self::InProceedings,
        Self::Manual,
        Self::MastersThesis,
        Self::Misc,
        Self::PhdThesis,
        Self::Proceedings,
        Self::TechReport,
        Self::Unpublished,
        Self::Online,
        Self::Software,
        Self::Dataset,
    ];

    /// Parse an entry type name, ignoring case. Unknown names become
    /// [`BibTeXEntryType::Other`].
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Self {
        let lower = s.trim().to_lowercase();
        Self::STANDARD
            .iter()
            .find(|ty| ty.as_str() == lower)
            .cloned()
            .unwrap_or_else(|| Self::Other(lower))
    }

    /// Canonical (lower-case) name of the type
    pub fn as_str(&self) -> &str {
        match self {
            Self::Article => "article",
            Self::Book => "book",
            Self::Booklet => "booklet",
            Self::InBook => "inbook",
            Self::InCollection => "incollection",
            Self::InProceedings => "inproceedings",
            Self::Manual => "manual",
            Self::MastersThesis => "mastersthesis",
            Self::Misc => "misc",
            Self::PhdThesis => "phdthesis",
            Self::Proceedings => "proceedings",
            Self::TechReport => "techreport",
            Self::Unpublished => "unpublished",
            Self::Online => "online",
            Self::Software => "software",
            Self::Dataset => "dataset",
            Self::Other(name) => name,
        }
    }
}

impl fmt::Display for BibTeXEntryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single BibTeX field (key-value pair)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibTeXField {
    pub key: String,
    pub value: String,
}

/// A parsed BibTeX entry
///
/// Fields keep the order they were read in; the formatter writes them back
/// in the same order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibTeXEntry {
    pub cite_key: String,
    pub entry_type: BibTeXEntryType,
    pub fields: Vec<BibTeXField>,
}

impl BibTeXEntry {
    /// Create a new BibTeX entry
    pub fn new(cite_key: impl Into<String>, entry_type: BibTeXEntryType) -> Self {
        Self {
            cite_key: cite_key.into(),
            entry_type,
            fields: Vec::new(),
        }
    }

    /// Add a field to the entry
    pub fn add_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.fields.push(BibTeXField {
            key: key.into(),
            value: value.into(),
        });
    }

    /// Set a field, replacing an existing one with the same name
    /// (case-insensitive) in place.
    pub fn set_field(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self
            .fields
            .iter_mut()
            .find(|f| f.key.eq_ignore_ascii_case(&key))
        {
            Some(field) => field.value = value,
            None => self.fields.push(BibTeXField { key, value }),
        }
    }

    /// Get a field value by key (case-insensitive)
    pub fn get_field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.key.eq_ignore_ascii_case(key))
            .map(|f| f.value.as_str())
    }

    /// The entry as a flat field mapping.
    ///
    /// Field names are lower-cased. The mapping also carries the
    /// [`ENTRY_TYPE_FIELD`] and [`ID_FIELD`] pseudo-fields, so two entries
    /// always share at least those two names.
    pub fn record(&self) -> HashMap<String, String> {
        let mut map: HashMap<String, String> = self
            .fields
            .iter()
            .map(|f| (f.key.to_lowercase(), f.value.clone()))
            .collect();
        map.insert(
            ENTRY_TYPE_FIELD.to_string(),
            self.entry_type.as_str().to_string(),
        );
        map.insert(ID_FIELD.to_string(), self.cite_key.clone());
        map
    }

    /// Number of populated fields, pseudo-fields included
    pub fn fullness(&self) -> usize {
        self.record().len()
    }
}
