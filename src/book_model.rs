//! Canonical book record.
//!
//! Raw catalog files store each book as a loose JSON object whose keys vary
//! in casing and spacing from one entry to the next. [`Book`] is the
//! fixed-shape form: synonym resolution runs once, when a record is
//! deserialized, and only the primary spelling of every field is written back.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Serialize, SerializeMap, Serializer};
use serde_json::{Map, Value};

use crate::normalizer::{resolve_record, SemanticField};

/// A single catalog entry with one canonical value per attribute.
///
/// Every field is optional: absent keys, empty strings and the "no data"
/// sentinel all resolve to `None`.
///
/// # Serialization
///
/// ```rust
/// use library_catalog_core::book_model::Book;
/// use serde_json::json;
///
/// let raw = json!({"NR.": 7, "TITULLI": "Iliada", "Autori": "Jo", "AUTORI": "Homeri"});
/// let book: Book = serde_json::from_value(raw)?;
///
/// assert_eq!(book.id.as_deref(), Some("7"));
/// assert_eq!(book.author.as_deref(), Some("Homeri"));
///
/// let written = serde_json::to_value(&book)?;
/// assert_eq!(written, json!({"Nr.": 7, "Titulli": "Iliada", "Autori": "Homeri"}));
/// # Ok::<(), serde_json::Error>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Book {
    /// Identifier, unique within its category. Usually numeric.
    pub id: Option<String>,
    pub title: Option<String>,
    pub author: Option<String>,
    pub publisher: Option<String>,
    /// Publication year, kept as text.
    pub year: Option<String>,
    pub pages: Option<String>,
    pub price: Option<String>,
    /// The book's own category field. May be absent even though the book is
    /// stored under a category key.
    pub category: Option<String>,
}

impl Book {
    /// Builds the canonical record from a raw JSON object.
    pub fn from_raw(record: &Map<String, Value>) -> Self {
        Book {
            id: resolve_record(record, SemanticField::Id),
            title: resolve_record(record, SemanticField::Title),
            author: resolve_record(record, SemanticField::Author),
            publisher: resolve_record(record, SemanticField::Publisher),
            year: resolve_record(record, SemanticField::Year),
            pages: resolve_record(record, SemanticField::Pages),
            price: resolve_record(record, SemanticField::Price),
            category: resolve_record(record, SemanticField::Category),
        }
    }

    pub fn with_title(title: impl Into<String>) -> Self {
        Book {
            title: Some(title.into()),
            ..Book::default()
        }
    }

    pub fn field(&self, field: SemanticField) -> Option<&str> {
        let value = match field {
            SemanticField::Id => &self.id,
            SemanticField::Title => &self.title,
            SemanticField::Author => &self.author,
            SemanticField::Publisher => &self.publisher,
            SemanticField::Year => &self.year,
            SemanticField::Pages => &self.pages,
            SemanticField::Price => &self.price,
            SemanticField::Category => &self.category,
        };
        value.as_deref()
    }

    /// Identifier as a number, when it is one.
    pub fn numeric_id(&self) -> Option<u64> {
        self.id.as_deref().and_then(|id| id.trim().parse::<u64>().ok())
    }

    /// The book's own category, or the collection it is stored under.
    pub fn effective_category<'a>(&'a self, collection: &'a str) -> &'a str {
        self.category.as_deref().unwrap_or(collection)
    }

    /// Case-insensitive substring match on title, author or publisher.
    /// `needle` must already be lowercased.
    pub fn matches_query(&self, needle: &str) -> bool {
        [&self.title, &self.author, &self.publisher]
            .into_iter()
            .flatten()
            .any(|text| text.to_lowercase().contains(needle))
    }
}

impl Serialize for Book {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = SemanticField::ALL
            .iter()
            .filter(|field| self.field(**field).is_some())
            .count();
        let mut map = serializer.serialize_map(Some(present))?;

        for field in SemanticField::ALL {
            let Some(text) = self.field(field) else {
                continue;
            };
            // Only canonical integers become numbers; "007" must stay "007".
            match (field, self.numeric_id()) {
                (SemanticField::Id, Some(number)) if number.to_string() == text => {
                    map.serialize_entry(field.primary_key(), &number)?
                }
                _ => map.serialize_entry(field.primary_key(), text)?,
            }
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Book {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Map::<String, Value>::deserialize(deserializer)?;
        Ok(Book::from_raw(&raw))
    }
}
