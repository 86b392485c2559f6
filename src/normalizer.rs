//! Field-synonym resolution for raw book records.
//!
//! Catalog files in the wild spell the same attribute several ways
//! (`Titulli`, `TITULLI`, ...). Every attribute has a fixed list of known
//! spellings, primary spelling first, and resolves to the first candidate that
//! carries real data.

use serde_json::{Map, Value};

/// Case-insensitive token meaning "intentionally no data".
pub const NO_DATA_SENTINEL: &str = "jo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SemanticField {
    Id,
    Title,
    Author,
    Publisher,
    Year,
    Pages,
    Price,
    Category,
}

impl SemanticField {
    pub const ALL: [SemanticField; 8] = [
        SemanticField::Id,
        SemanticField::Title,
        SemanticField::Author,
        SemanticField::Publisher,
        SemanticField::Year,
        SemanticField::Pages,
        SemanticField::Price,
        SemanticField::Category,
    ];

    /// Known spellings in preference order.
    pub const fn synonyms(self) -> &'static [&'static str] {
        match self {
            SemanticField::Id => &["Nr.", "NR."],
            SemanticField::Title => &["Titulli", "TITULLI"],
            SemanticField::Author => &["Autori", "AUTORI"],
            SemanticField::Publisher => &["Shtepia_Botuese", "SHTEPIA BOTUESE", "Shtepia botuese"],
            SemanticField::Year => &["Viti_I_Botimit", "VITI I BOTIMIT", "Viti i botimit"],
            SemanticField::Pages => &["Nr_Faqe", "NR FAQE", "Nr faqe"],
            SemanticField::Price => &["Cmimi", "CMIMI"],
            SemanticField::Category => &["Kategorizimi", "KATEGORIZIMI"],
        }
    }

    /// Spelling written back when a record is serialized.
    pub fn primary_key(self) -> &'static str {
        self.synonyms()[0]
    }
}

/// Text form of a raw value, before the validity check.
///
/// Numbers are stringified (`0` included); null, booleans, arrays and objects
/// carry no display value.
fn raw_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// `true` when the text is non-empty after trimming and is not the sentinel.
pub fn is_meaningful(text: &str) -> bool {
    let trimmed = text.trim();
    !trimmed.is_empty() && trimmed.to_lowercase() != NO_DATA_SENTINEL
}

/// Returns the first candidate carrying real data, trimmed.
pub fn resolve_field(candidates: &[Option<&Value>]) -> Option<String> {
    candidates
        .iter()
        .flatten()
        .filter_map(|value| raw_text(value))
        .find(|text| is_meaningful(text))
        .map(|text| text.trim().to_string())
}

/// Resolves one attribute of a raw record through its synonym list.
pub fn resolve_record(record: &Map<String, Value>, field: SemanticField) -> Option<String> {
    let candidates: Vec<Option<&Value>> = field
        .synonyms()
        .iter()
        .map(|key| record.get(*key))
        .collect();
    resolve_field(&candidates)
}
