//! Application facade tying the stores, the write path and the admin session
//! together for a UI host.

use std::path::PathBuf;
use std::sync::Arc;

use log::{info, warn};

use crate::admin::{AdminSession, Confirm};
use crate::auth::{AuthGate, AuthMarker};
use crate::book_model::Book;
use crate::catalog::{Catalog, ALL_CATEGORIES};
use crate::catalog_error::{CatalogError, CatalogResult};
use crate::catalog_store::{load_baseline, CatalogStore};
use crate::config::LibraryConfig;
use crate::events::{EventBus, Severity, Subscription};
use crate::local_db_state::AppDbState;
use crate::remote_sync::{save_catalog, GitHubContentsStore, RemoteFileStore, SaveOutcome};
use crate::routes::{self, Route};

pub struct LibraryApp {
    config: LibraryConfig,
    state: Arc<AppDbState>,
    store: CatalogStore,
    remote: Option<Box<dyn RemoteFileStore>>,
    auth: AuthGate,
    session: AdminSession,
    catalog: Catalog,
}

impl LibraryApp {
    /// Opens the local store in `dir` and loads the catalog.
    pub fn open(dir: PathBuf, config: LibraryConfig) -> CatalogResult<Self> {
        let state = Arc::new(AppDbState::open_at(dir)?);
        let remote: Option<Box<dyn RemoteFileStore>> = if config.is_production_mode() {
            GitHubContentsStore::from_config(&config.remote)?
                .map(|store| Box::new(store) as Box<dyn RemoteFileStore>)
        } else {
            None
        };
        Self::with_parts(state, config, remote, EventBus::default())
    }

    /// Assembles the app from already opened parts.
    pub fn with_parts(
        state: Arc<AppDbState>,
        config: LibraryConfig,
        remote: Option<Box<dyn RemoteFileStore>>,
        events: EventBus,
    ) -> CatalogResult<Self> {
        let baseline = load_baseline(config.baseline_path.as_deref())?;
        let store = CatalogStore::new(Arc::clone(&state), baseline, events);
        let auth = AuthGate::new(Arc::clone(&state), config.admin_credentials.clone());
        let catalog = store.load();
        info!(
            "Library app ready: {} categories, remote sync {}",
            catalog.len(),
            if remote.is_some() { "enabled" } else { "disabled" }
        );

        Ok(Self {
            config,
            state,
            store,
            remote,
            auth,
            session: AdminSession::new(),
            catalog,
        })
    }

    pub fn config(&self) -> &LibraryConfig {
        &self.config
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn store(&self) -> &CatalogStore {
        &self.store
    }

    pub fn session(&self) -> &AdminSession {
        &self.session
    }

    pub fn subscribe(&self) -> Subscription {
        self.store.events().subscribe()
    }

    pub fn events(&self) -> &EventBus {
        self.store.events()
    }

    /// Re-reads the catalog from the local store.
    pub fn reload(&mut self) -> &Catalog {
        self.catalog = self.store.load();
        &self.catalog
    }

    /// Drops the local snapshot and returns to the baseline. Admin only.
    pub fn reset(&mut self) -> CatalogResult<&Catalog> {
        self.require_admin()?;
        self.catalog = self.store.reset();
        if let Some(selected) = self.session.selected_category() {
            if !self.catalog.contains_category(selected) {
                self.session.clear_selection();
            }
        }
        Ok(&self.catalog)
    }

    pub fn has_override(&self) -> bool {
        self.store.has_override()
    }

    pub fn last_update_time(&self) -> i64 {
        self.store.last_update_time()
    }

    pub fn search(&self, query: &str, category: Option<&str>) -> Vec<Book> {
        self.catalog
            .search(query, category.unwrap_or(ALL_CATEGORIES))
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn route(&self, path: &str) -> Route {
        routes::resolve(path, self.auth.is_authenticated())
    }

    pub fn login(&self, username: &str, password: &str) -> CatalogResult<AuthMarker> {
        self.auth.login(username, password)
    }

    pub fn logout(&mut self) -> CatalogResult<()> {
        self.session.clear_selection();
        self.auth.logout()
    }

    pub fn current_user(&self) -> Option<String> {
        self.auth.current_user()
    }

    fn require_admin(&self) -> CatalogResult<()> {
        if self.auth.is_authenticated() {
            Ok(())
        } else {
            Err(CatalogError::Unauthorized("admin login required".to_string()))
        }
    }

    /// Writes a full new catalog. Local saves always take effect in memory;
    /// a rejected remote save leaves the in-memory catalog as it was.
    pub fn save(&mut self, catalog: Catalog) -> CatalogResult<SaveOutcome> {
        match save_catalog(&self.store, self.remote.as_deref(), &catalog) {
            Ok(outcome) => {
                self.catalog = catalog;
                Ok(outcome)
            }
            Err(e) => {
                warn!("Catalog save failed, keeping previous catalog: {e}");
                Err(e)
            }
        }
    }

    pub fn select_category(&mut self, name: &str) -> CatalogResult<()> {
        self.session.select_category(&self.catalog, name)
    }

    pub fn add_book(&mut self, book: Book) -> CatalogResult<Book> {
        self.require_admin()?;
        let (updated, stored) = self.validated(self.session.add_book(&self.catalog, book))?;
        self.save(updated)?;
        Ok(stored)
    }

    pub fn edit_book(&mut self, book: Book) -> CatalogResult<Book> {
        self.require_admin()?;
        let (updated, stored) = self.validated(self.session.edit_book(&self.catalog, book))?;
        self.save(updated)?;
        Ok(stored)
    }

    /// Returns `false` when the confirmation was declined.
    pub fn delete_book(&mut self, id: &str, confirm: &mut dyn Confirm) -> CatalogResult<bool> {
        self.require_admin()?;
        match self.validated(self.session.delete_book(&self.catalog, id, confirm))? {
            Some(updated) => self.save(updated).map(|_| true),
            None => Ok(false),
        }
    }

    pub fn add_category(&mut self, name: &str) -> CatalogResult<String> {
        self.require_admin()?;
        let previous = self.session.clone();
        let result = self.session.add_category(&self.catalog, name);
        let updated = self.validated(result)?;
        if let Err(e) = self.save(updated) {
            self.session = previous;
            return Err(e);
        }
        Ok(self.session.selected_category().unwrap_or_default().to_string())
    }

    pub fn delete_category(&mut self, name: &str, confirm: &mut dyn Confirm) -> CatalogResult<bool> {
        self.require_admin()?;
        let previous = self.session.clone();
        let result = self.session.delete_category(&self.catalog, name, confirm);
        match self.validated(result)? {
            Some(updated) => match self.save(updated) {
                Ok(_) => Ok(true),
                Err(e) => {
                    self.session = previous;
                    Err(e)
                }
            },
            None => Ok(false),
        }
    }

    /// Surfaces validation failures as a warning notification.
    fn validated<T>(&self, result: CatalogResult<T>) -> CatalogResult<T> {
        if let Err(CatalogError::ValidationFailure(msg)) = &result {
            self.store.events().notify(msg.clone(), Severity::Warning);
        }
        result
    }

    /// Closes the local store once no other handle to it remains.
    pub fn close(self) -> CatalogResult<()> {
        let LibraryApp { state, store, auth, .. } = self;
        drop(store);
        drop(auth);
        match Arc::try_unwrap(state) {
            Ok(mut state) => Ok(state.close_database()?),
            Err(_) => {
                warn!("Local store still shared; it closes when the last handle drops");
                Ok(())
            }
        }
    }
}
