//! Admin editing session: the selected category plus the confirmation
//! rules around destructive edits.
//!
//! Every method works on a copy of the catalog and hands back the full new
//! catalog for the caller to persist. `Ok(None)` means the user declined a
//! confirmation and nothing should be written.

use log::info;

use crate::book_model::Book;
use crate::catalog::{delete_category_prompt, Catalog, DELETE_BOOK_PROMPT};
use crate::catalog_error::{CatalogError, CatalogResult};

/// Asks the user to confirm a destructive action.
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdminSession {
    selected: Option<String>,
}

impl AdminSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn selected_category(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn select_category(&mut self, catalog: &Catalog, name: &str) -> CatalogResult<()> {
        if !catalog.contains_category(name) {
            return Err(CatalogError::NotFound(format!("category \"{name}\" does not exist")));
        }
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    fn require_selection(&self) -> CatalogResult<&str> {
        self.selected
            .as_deref()
            .ok_or_else(|| CatalogError::ValidationFailure("Please select a category first".to_string()))
    }

    pub fn add_book(&self, catalog: &Catalog, book: Book) -> CatalogResult<(Catalog, Book)> {
        let category = self.require_selection()?;
        let mut updated = catalog.clone();
        let stored = updated.add_book(category, book)?;
        info!("Added book {:?} to \"{category}\"", stored.id);
        Ok((updated, stored))
    }

    pub fn edit_book(&self, catalog: &Catalog, book: Book) -> CatalogResult<(Catalog, Book)> {
        let category = self.require_selection()?;
        let mut updated = catalog.clone();
        let stored = updated.edit_book(category, book)?;
        info!("Edited book {:?} in \"{category}\"", stored.id);
        Ok((updated, stored))
    }

    pub fn delete_book(
        &self,
        catalog: &Catalog,
        id: &str,
        confirm: &mut dyn Confirm,
    ) -> CatalogResult<Option<Catalog>> {
        let category = self.require_selection()?;
        if !confirm.confirm(DELETE_BOOK_PROMPT) {
            return Ok(None);
        }
        let mut updated = catalog.clone();
        updated.delete_book(category, id)?;
        info!("Deleted book {id} from \"{category}\"");
        Ok(Some(updated))
    }

    /// Creates the category and selects it.
    pub fn add_category(&mut self, catalog: &Catalog, name: &str) -> CatalogResult<Catalog> {
        let mut updated = catalog.clone();
        let stored = updated.add_category(name)?;
        info!("Added category \"{stored}\"");
        self.selected = Some(stored);
        Ok(updated)
    }

    /// Deletes the category and its books. Clears the selection if it
    /// pointed at the deleted category.
    pub fn delete_category(
        &mut self,
        catalog: &Catalog,
        name: &str,
        confirm: &mut dyn Confirm,
    ) -> CatalogResult<Option<Catalog>> {
        let count = catalog
            .books(name)
            .map(<[Book]>::len)
            .ok_or_else(|| CatalogError::NotFound(format!("category \"{name}\" does not exist")))?;
        if !confirm.confirm(&delete_category_prompt(name, count)) {
            return Ok(None);
        }

        let mut updated = catalog.clone();
        updated.delete_category(name)?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        info!("Deleted category \"{name}\" with {count} book(s)");
        Ok(Some(updated))
    }
}
