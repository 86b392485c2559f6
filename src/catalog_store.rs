//! Local persistence of the catalog.
//!
//! Reads layer a stored snapshot over the baseline dataset shipped with the
//! application. Writes replace the whole snapshot, stamp the update time and
//! announce the new catalog on the [`EventBus`]. Storage failures are logged
//! and never escape: the caller's in-memory catalog stays authoritative.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use log::{error, info, warn};

use crate::catalog::Catalog;
use crate::catalog_error::CatalogResult;
use crate::events::EventBus;
use crate::local_db_state::AppDbState;

pub const STORAGE_KEY: &str = "library_data";
pub const LAST_UPDATE_KEY: &str = "library_last_update";

const BUNDLED_BASELINE: &str = include_str!("../assets/baseline_catalog.json");

/// Reads the baseline dataset from `path`, or the copy bundled in the crate.
pub fn load_baseline(path: Option<&Path>) -> CatalogResult<Catalog> {
    let mut baseline = match path {
        Some(path) => {
            info!("Loading baseline catalog from {}", path.display());
            Catalog::from_json_str(&fs::read_to_string(path)?)?
        }
        None => Catalog::from_json_str(BUNDLED_BASELINE)?,
    };
    if baseline.strip_reserved() {
        warn!("Baseline catalog contained the reserved all-categories key; dropped it");
    }
    Ok(baseline)
}

pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}

pub struct CatalogStore {
    state: Arc<AppDbState>,
    baseline: Catalog,
    events: EventBus,
}

impl CatalogStore {
    pub fn new(state: Arc<AppDbState>, baseline: Catalog, events: EventBus) -> Self {
        Self { state, baseline, events }
    }

    pub fn baseline(&self) -> &Catalog {
        &self.baseline
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    /// Stored snapshot if present and well formed, otherwise the baseline.
    pub fn load(&self) -> Catalog {
        match self.read_snapshot() {
            Ok(Some(catalog)) => catalog,
            Ok(None) => self.baseline.clone(),
            Err(e) => {
                warn!("Error loading stored library data, using baseline: {e}");
                self.baseline.clone()
            }
        }
    }

    fn read_snapshot(&self) -> CatalogResult<Option<Catalog>> {
        match self.state.get(STORAGE_KEY)? {
            Some(json) => Catalog::from_json_str(&json).map(Some),
            None => Ok(None),
        }
    }

    /// Persists the snapshot and broadcasts it. Failures are logged only.
    pub fn save(&self, catalog: &Catalog) {
        match self.write_snapshot(catalog) {
            Ok((snapshot, timestamp_ms)) => self.events.data_updated(snapshot, timestamp_ms),
            Err(e) => error!("Error saving library data: {e}"),
        }
    }

    /// Like [`save`](Self::save) but reports the outcome. Returns the stamp
    /// written as last update time.
    pub fn try_save(&self, catalog: &Catalog) -> CatalogResult<i64> {
        let (snapshot, timestamp_ms) = self.write_snapshot(catalog)?;
        self.events.data_updated(snapshot, timestamp_ms);
        Ok(timestamp_ms)
    }

    fn write_snapshot(&self, catalog: &Catalog) -> CatalogResult<(Catalog, i64)> {
        let snapshot = Self::persistable(catalog);
        let json = snapshot.to_json_string()?;
        let timestamp_ms = now_millis();
        let stamp = timestamp_ms.to_string();
        self.state
            .put_all(&[(STORAGE_KEY, json.as_str()), (LAST_UPDATE_KEY, stamp.as_str())])?;
        info!(
            "Saved library data: {} categories, {} books",
            snapshot.len(),
            snapshot.total_books()
        );
        Ok((snapshot, timestamp_ms))
    }

    /// Drops the stored snapshot and broadcasts the baseline.
    pub fn reset(&self) -> Catalog {
        if let Err(e) = self.clear_snapshot() {
            error!("Error resetting library data: {e}");
        }
        let baseline = self.baseline.clone();
        self.events.data_updated(baseline.clone(), now_millis());
        baseline
    }

    fn clear_snapshot(&self) -> CatalogResult<()> {
        self.state.remove(STORAGE_KEY)?;
        self.state.remove(LAST_UPDATE_KEY)?;
        Ok(())
    }

    /// `true` when a snapshot is stored, whether or not it parses.
    pub fn has_override(&self) -> bool {
        match self.state.contains(STORAGE_KEY) {
            Ok(present) => present,
            Err(e) => {
                warn!("Could not check for stored library data: {e}");
                false
            }
        }
    }

    /// Millisecond stamp of the last save, 0 when unknown.
    pub fn last_update_time(&self) -> i64 {
        match self.state.get(LAST_UPDATE_KEY) {
            Ok(Some(stamp)) => stamp.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    fn persistable(catalog: &Catalog) -> Catalog {
        let mut snapshot = catalog.clone();
        if snapshot.strip_reserved() {
            warn!("Refusing to persist the all-categories view as a category");
        }
        snapshot
    }
}
