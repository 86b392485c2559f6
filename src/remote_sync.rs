//! Production persistence: the catalog lives in a JSON file committed to a
//! repository through a contents API.
//!
//! Each save is one optimistic read-modify-write:
//!
//! 1. fetch the current file and its version token (`sha`);
//! 2. write the full new catalog together with that token;
//! 3. on acceptance mirror the catalog into the local store so views update
//!    at once, on rejection leave everything local untouched.
//!
//! There is no retry and no merge. An editor who loses the race gets an
//! error and redoes the edit against the fresh file.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::{SecondsFormat, Utc};
use log::{error, info, warn};
use reqwest::blocking::{Client, Response};
use reqwest::header::{ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::catalog::Catalog;
use crate::catalog_error::{CatalogError, CatalogResult};
use crate::catalog_store::{now_millis, CatalogStore};
use crate::config::RemoteConfig;
use crate::events::Severity;

pub const SAVE_SUCCESS_MESSAGE: &str = "Changes saved successfully! Website will update in 1-2 minutes.";
pub const SAVE_FAILURE_MESSAGE: &str = "Error saving changes. Please try again.";

const GITHUB_ACCEPT: &str = "application/vnd.github.v3+json";
const CLIENT_USER_AGENT: &str = concat!("library_catalog_core/", env!("CARGO_PKG_VERSION"));

/// Remote file content together with its version token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub catalog: Catalog,
    pub sha: String,
}

/// Access to the versioned remote copy of the catalog.
pub trait RemoteFileStore {
    fn fetch_current(&self) -> CatalogResult<RemoteFile>;

    /// Replaces the remote file. Must be rejected when `sha` is stale.
    fn write(&self, catalog: &Catalog, sha: &str, message: &str) -> CatalogResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveOutcome {
    /// Committed remotely and mirrored locally.
    Remote,
    /// No write credentials: saved to the local store only.
    LocalOnly,
}

pub fn commit_message() -> String {
    format!(
        "Update library data - {}",
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

/// Base64 of the pretty-printed catalog, as stored in the remote file.
pub fn encode_catalog_content(catalog: &Catalog) -> CatalogResult<String> {
    Ok(STANDARD.encode(catalog.to_json_pretty()?))
}

/// Decodes contents-API base64, which arrives wrapped with line breaks.
pub fn decode_remote_catalog(content: &str) -> CatalogResult<Catalog> {
    let cleaned: String = content.chars().filter(|c| !c.is_ascii_whitespace()).collect();
    let bytes = STANDARD.decode(cleaned)?;
    let json = String::from_utf8(bytes)
        .map_err(|e| CatalogError::NetworkFailure(format!("remote content is not UTF-8: {e}")))?;
    Catalog::from_json_str(&json)
        .map_err(|e| CatalogError::NetworkFailure(format!("remote content is not a catalog: {e}")))
}

/// Saves through the remote file when a remote is configured, otherwise
/// locally. Broadcasts the same events a local save does, plus a
/// user-facing notification for remote outcomes.
pub fn save_catalog(
    store: &CatalogStore,
    remote: Option<&dyn RemoteFileStore>,
    catalog: &Catalog,
) -> CatalogResult<SaveOutcome> {
    let Some(remote) = remote else {
        warn!("No remote write token configured, falling back to local storage");
        store.save(catalog);
        return Ok(SaveOutcome::LocalOnly);
    };

    let mut outgoing = catalog.clone();
    if outgoing.strip_reserved() {
        warn!("Refusing to publish the all-categories view as a category");
    }

    match push_to_remote(remote, &outgoing) {
        Ok(()) => {
            if let Err(e) = store.try_save(&outgoing) {
                error!("Remote save succeeded but local mirror failed: {e}");
                store.events().data_updated(outgoing, now_millis());
            }
            store.events().notify(SAVE_SUCCESS_MESSAGE, Severity::Success);
            Ok(SaveOutcome::Remote)
        }
        Err(e) => {
            error!("Error saving to production: {e}");
            store.events().notify(SAVE_FAILURE_MESSAGE, Severity::Error);
            Err(e)
        }
    }
}

fn push_to_remote(remote: &dyn RemoteFileStore, catalog: &Catalog) -> CatalogResult<()> {
    let current = remote.fetch_current()?;
    info!(
        "Fetched remote catalog ({} categories) at sha {}",
        current.catalog.len(),
        current.sha
    );
    remote.write(catalog, &current.sha, &commit_message())?;
    info!("Remote catalog updated from sha {}", current.sha);
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ContentsResponse {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    sha: Option<String>,
}

/// [`RemoteFileStore`] backed by a GitHub-style repository contents API.
pub struct GitHubContentsStore {
    client: Client,
    url: String,
    token: String,
    committer_name: String,
    committer_email: String,
}

impl GitHubContentsStore {
    /// Returns `None` when no write token is configured.
    pub fn from_config(config: &RemoteConfig) -> CatalogResult<Option<Self>> {
        let Some(token) = config.token.clone() else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CatalogError::Config(format!("could not build HTTP client: {e}")))?;

        Ok(Some(Self {
            client,
            url: config.contents_url(),
            token,
            committer_name: config.committer_name.clone(),
            committer_email: config.committer_email.clone(),
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    fn authorization(&self) -> String {
        format!("token {}", self.token)
    }

    fn check_status(response: Response, action: &str) -> CatalogResult<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().unwrap_or_default();
        match status {
            StatusCode::CONFLICT | StatusCode::PRECONDITION_FAILED | StatusCode::UNPROCESSABLE_ENTITY => {
                Err(CatalogError::ConcurrentModification(format!(
                    "{action} rejected with {status}: {body}"
                )))
            }
            _ => Err(CatalogError::NetworkFailure(format!(
                "{action} failed with {status}: {body}"
            ))),
        }
    }
}

impl RemoteFileStore for GitHubContentsStore {
    fn fetch_current(&self) -> CatalogResult<RemoteFile> {
        let response = self
            .client
            .get(&self.url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .send()?;
        let response = Self::check_status(response, "fetch")?;
        let body: ContentsResponse = response.json()?;

        let sha = body
            .sha
            .filter(|sha| !sha.trim().is_empty())
            .ok_or_else(|| CatalogError::NetworkFailure("remote file has no sha".to_string()))?;
        let content = body
            .content
            .ok_or_else(|| CatalogError::NetworkFailure("remote file has no content".to_string()))?;

        Ok(RemoteFile {
            catalog: decode_remote_catalog(&content)?,
            sha,
        })
    }

    fn write(&self, catalog: &Catalog, sha: &str, message: &str) -> CatalogResult<()> {
        let body = json!({
            "message": message,
            "content": encode_catalog_content(catalog)?,
            "sha": sha,
            "committer": {
                "name": self.committer_name,
                "email": self.committer_email,
            },
        });
        let response = self
            .client
            .put(&self.url)
            .header(AUTHORIZATION, self.authorization())
            .header(ACCEPT, GITHUB_ACCEPT)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .json(&body)
            .send()?;
        Self::check_status(response, "write")?;
        Ok(())
    }
}
