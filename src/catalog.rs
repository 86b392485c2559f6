//! The category → books mapping, its read views and its mutation rules.

use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::book_model::Book;
use crate::catalog_error::{CatalogError, CatalogResult};
use crate::normalizer::is_meaningful;

/// Synthetic view name standing for every real category at once.
pub const ALL_CATEGORIES: &str = "Te Gjitha";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Catalog {
    categories: BTreeMap<String, Vec<Book>>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> CatalogResult<Self> {
        let value: Value = serde_json::from_str(json)
            .map_err(|e| CatalogError::MalformedStorage(format!("invalid JSON: {e}")))?;
        Self::from_json_value(value)
    }

    /// Accepts only a JSON object whose values are arrays. Array entries that
    /// are not objects are skipped with a warning.
    pub fn from_json_value(value: Value) -> CatalogResult<Self> {
        let Value::Object(raw) = value else {
            return Err(CatalogError::MalformedStorage(
                "stored catalog is not a JSON object".to_string(),
            ));
        };

        let mut categories = BTreeMap::new();
        for (name, entries) in raw {
            let Value::Array(entries) = entries else {
                return Err(CatalogError::MalformedStorage(format!(
                    "category \"{name}\" is not a list of books"
                )));
            };
            let mut books = Vec::with_capacity(entries.len());
            for (index, entry) in entries.iter().enumerate() {
                match entry.as_object() {
                    Some(record) => books.push(Book::from_raw(record)),
                    None => warn!("Skipping non-object entry {index} in category \"{name}\""),
                }
            }
            categories.insert(name, books);
        }
        Ok(Self { categories })
    }

    pub fn to_json_string(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn to_json_pretty(&self) -> CatalogResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.keys().map(String::as_str)
    }

    pub fn contains_category(&self, name: &str) -> bool {
        self.categories.contains_key(name)
    }

    pub fn books(&self, category: &str) -> Option<&[Book]> {
        self.categories.get(category).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn total_books(&self) -> usize {
        self.categories.values().map(Vec::len).sum()
    }

    /// Inserts or replaces a whole category.
    pub fn insert_category(&mut self, name: impl Into<String>, books: Vec<Book>) {
        self.categories.insert(name.into(), books);
    }

    /// Removes the reserved "all categories" key. Returns `true` if present.
    pub(crate) fn strip_reserved(&mut self) -> bool {
        self.categories.remove(ALL_CATEGORIES).is_some()
    }

    fn is_visible_category(name: &str) -> bool {
        name != ALL_CATEGORIES && is_meaningful(name)
    }

    /// Categories offered to visitors, the "all categories" view first.
    pub fn visible_categories(&self) -> Vec<&str> {
        std::iter::once(ALL_CATEGORIES)
            .chain(self.category_names().filter(|name| Self::is_visible_category(name)))
            .collect()
    }

    /// Books shown for a category view.
    ///
    /// A book belongs to a view through its own category field, falling back
    /// to the key it is stored under. The "all categories" view concatenates
    /// every visible category in key order.
    pub fn browse(&self, category: &str) -> Vec<&Book> {
        if category == ALL_CATEGORIES {
            return self
                .categories
                .iter()
                .filter(|(name, _)| Self::is_visible_category(name))
                .flat_map(|(_, books)| books.iter())
                .collect();
        }
        if !Self::is_visible_category(category) {
            return Vec::new();
        }
        self.categories
            .get(category)
            .map(|books| {
                books
                    .iter()
                    .filter(|book| book.effective_category(category) == category)
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Title/author/publisher search over a category view. A blank query is
    /// a plain browse.
    pub fn search(&self, query: &str, category: &str) -> Vec<&Book> {
        let needle = query.trim().to_lowercase();
        let view = self.browse(category);
        if needle.is_empty() {
            return view;
        }
        view.into_iter().filter(|book| book.matches_query(&needle)).collect()
    }

    fn books_mut(&mut self, category: &str) -> CatalogResult<&mut Vec<Book>> {
        self.categories
            .get_mut(category)
            .ok_or_else(|| CatalogError::NotFound(format!("category \"{category}\" does not exist")))
    }

    /// Identifier the next book added to `category` receives.
    ///
    /// Fails when the largest identifier already present is `u64::MAX`.
    pub fn next_book_id(&self, category: &str) -> CatalogResult<u64> {
        Self::next_id_in(self.books(category).unwrap_or_default())
    }

    fn next_id_in(books: &[Book]) -> CatalogResult<u64> {
        let max = books
            .iter()
            .map(|book| book.numeric_id().unwrap_or(0))
            .max()
            .unwrap_or(0);
        max.checked_add(1).ok_or_else(|| {
            CatalogError::ValidationFailure(format!("no book identifier left after {max}"))
        })
    }

    /// Appends a book with a fresh identifier, stamped with the category.
    pub fn add_book(&mut self, category: &str, book: Book) -> CatalogResult<Book> {
        let books = self.books_mut(category)?;
        let id = Self::next_id_in(books)?;
        let stored = Book {
            id: Some(id.to_string()),
            category: Some(category.to_string()),
            ..book
        };
        books.push(stored.clone());
        Ok(stored)
    }

    /// Replaces the book with the same identifier, keeping the stored
    /// identifier and category.
    pub fn edit_book(&mut self, category: &str, book: Book) -> CatalogResult<Book> {
        let id = book
            .id
            .clone()
            .ok_or_else(|| CatalogError::ValidationFailure("book has no identifier".to_string()))?;
        let books = self.books_mut(category)?;
        let slot = books
            .iter_mut()
            .find(|stored| stored.id.as_deref() == Some(id.as_str()))
            .ok_or_else(|| CatalogError::NotFound(format!("no book {id} in \"{category}\"")))?;

        let replaced = Book {
            id: slot.id.clone(),
            category: slot.category.clone(),
            ..book
        };
        *slot = replaced.clone();
        Ok(replaced)
    }

    /// Removes the book with `id`. An emptied category stays in place.
    pub fn delete_book(&mut self, category: &str, id: &str) -> CatalogResult<Book> {
        let books = self.books_mut(category)?;
        let index = books
            .iter()
            .position(|book| book.id.as_deref() == Some(id))
            .ok_or_else(|| CatalogError::NotFound(format!("no book {id} in \"{category}\"")))?;
        Ok(books.remove(index))
    }

    /// Creates an empty category. Returns the trimmed name it was stored as.
    pub fn add_category(&mut self, name: &str) -> CatalogResult<String> {
        let name = name.trim();
        if name.is_empty() {
            return Err(CatalogError::ValidationFailure("category name is blank".to_string()));
        }
        if !is_meaningful(name) || name == ALL_CATEGORIES {
            return Err(CatalogError::ValidationFailure(format!(
                "\"{name}\" is a reserved category name"
            )));
        }
        if self.categories.contains_key(name) {
            return Err(CatalogError::ValidationFailure("Category already exists".to_string()));
        }
        self.categories.insert(name.to_string(), Vec::new());
        Ok(name.to_string())
    }

    /// Removes the category key and every book under it.
    pub fn delete_category(&mut self, name: &str) -> CatalogResult<Vec<Book>> {
        self.categories
            .remove(name)
            .ok_or_else(|| CatalogError::NotFound(format!("category \"{name}\" does not exist")))
    }
}

/// Confirmation prompt shown before a category is deleted.
pub fn delete_category_prompt(name: &str, book_count: usize) -> String {
    if book_count > 0 {
        format!(
            "Category \"{name}\" contains {book_count} book(s). Deleting this category will also delete all books in it. Are you sure you want to continue?"
        )
    } else {
        format!("Are you sure you want to delete the category \"{name}\"?")
    }
}

pub const DELETE_BOOK_PROMPT: &str = "Are you sure you want to delete this book?";
