//! Stored admin marker.
//!
//! This is a convenience gate, not a security boundary: credentials come from
//! configuration and are compared locally.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Duration;
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::catalog_error::{CatalogError, CatalogResult};
use crate::catalog_store::now_millis;
use crate::local_db_state::AppDbState;

pub const AUTH_KEY: &str = "admin_auth";
pub const SESSION_HOURS: i64 = 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthMarker {
    pub username: String,
    /// Issued-at, milliseconds.
    pub timestamp: i64,
    /// Expires-at, milliseconds.
    pub expires: i64,
}

impl AuthMarker {
    pub fn issue(username: impl Into<String>, now_ms: i64) -> Self {
        Self {
            username: username.into(),
            timestamp: now_ms,
            expires: now_ms + Duration::hours(SESSION_HOURS).num_milliseconds(),
        }
    }

    pub fn is_valid_at(&self, now_ms: i64) -> bool {
        self.expires > now_ms
    }
}

pub struct AuthGate {
    state: Arc<AppDbState>,
    credentials: BTreeMap<String, String>,
}

impl AuthGate {
    pub fn new(state: Arc<AppDbState>, credentials: BTreeMap<String, String>) -> Self {
        Self { state, credentials }
    }

    /// Checks the credential table and stores a fresh marker.
    pub fn login(&self, username: &str, password: &str) -> CatalogResult<AuthMarker> {
        match self.credentials.get(username) {
            Some(expected) if expected == password => {
                let marker = AuthMarker::issue(username, now_millis());
                self.state.put(AUTH_KEY, &serde_json::to_string(&marker)?)?;
                info!("Admin '{username}' logged in");
                Ok(marker)
            }
            _ => {
                warn!("Rejected admin login for '{username}'");
                Err(CatalogError::Unauthorized("Invalid username or password".to_string()))
            }
        }
    }

    pub fn logout(&self) -> CatalogResult<()> {
        self.state.remove(AUTH_KEY)?;
        Ok(())
    }

    /// Username of a valid marker. Expired or unreadable markers are removed.
    pub fn current_user(&self) -> Option<String> {
        self.current_user_at(now_millis())
    }

    pub fn current_user_at(&self, now_ms: i64) -> Option<String> {
        let raw = match self.state.get(AUTH_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!("Could not read admin marker: {e}");
                return None;
            }
        };

        match serde_json::from_str::<AuthMarker>(&raw) {
            Ok(marker) if marker.is_valid_at(now_ms) => Some(marker.username),
            Ok(_) => {
                info!("Admin marker expired");
                self.discard_marker();
                None
            }
            Err(e) => {
                warn!("Discarding malformed admin marker: {e}");
                self.discard_marker();
                None
            }
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_user().is_some()
    }

    fn discard_marker(&self) {
        if let Err(e) = self.state.remove(AUTH_KEY) {
            warn!("Could not remove admin marker: {e}");
        }
    }
}
