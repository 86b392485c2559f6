//! Runtime configuration, read from environment variables.
//!
//! | variable                      | default                         |
//! |-------------------------------|---------------------------------|
//! | `LIBRARY_ENV`                 | `development`                   |
//! | `LIBRARY_BASELINE_PATH`       | bundled baseline                |
//! | `LIBRARY_GITHUB_API`          | `https://api.github.com`        |
//! | `LIBRARY_GITHUB_OWNER`        | `AldiD12`                       |
//! | `LIBRARY_GITHUB_REPO`         | `don-bosko-librari`             |
//! | `LIBRARY_GITHUB_FILE_PATH`    | `src/assets/librat.json`        |
//! | `LIBRARY_GITHUB_TOKEN`        | unset (local-only saves)        |
//! | `LIBRARY_COMMITTER_NAME`      | `Don Bosko Library Admin`       |
//! | `LIBRARY_COMMITTER_EMAIL`     | `admin@donbosko-library.com`    |
//! | `LIBRARY_REMOTE_TIMEOUT_MS`   | `30000`                         |
//! | `LIBRARY_ADMIN_CREDENTIALS`   | empty (`user:pass,user2:pass2`) |

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use log::warn;

use crate::catalog_error::{CatalogError, CatalogResult};

pub const DEFAULT_GITHUB_API: &str = "https://api.github.com";
pub const DEFAULT_REMOTE_TIMEOUT_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub file_path: String,
    /// Write credential. Without it every save stays local.
    pub token: Option<String>,
    pub committer_name: String,
    pub committer_email: String,
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_GITHUB_API.to_string(),
            owner: "AldiD12".to_string(),
            repo: "don-bosko-librari".to_string(),
            file_path: "src/assets/librat.json".to_string(),
            token: None,
            committer_name: "Don Bosko Library Admin".to_string(),
            committer_email: "admin@donbosko-library.com".to_string(),
            timeout: Duration::from_millis(DEFAULT_REMOTE_TIMEOUT_MS),
        }
    }
}

impl RemoteConfig {
    pub fn contents_url(&self) -> String {
        format!(
            "{}/repos/{}/{}/contents/{}",
            self.api_base.trim_end_matches('/'),
            self.owner,
            self.repo,
            self.file_path.trim_start_matches('/')
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryConfig {
    pub environment: Environment,
    pub baseline_path: Option<PathBuf>,
    pub remote: RemoteConfig,
    /// username → password
    pub admin_credentials: BTreeMap<String, String>,
}

impl Default for LibraryConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            baseline_path: None,
            remote: RemoteConfig::default(),
            admin_credentials: BTreeMap::new(),
        }
    }
}

impl LibraryConfig {
    pub fn from_env() -> CatalogResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> CatalogResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let mut config = LibraryConfig::default();

        if let Some(env) = get("LIBRARY_ENV") {
            config.environment = match env.to_lowercase().as_str() {
                "production" | "prod" => Environment::Production,
                "development" | "dev" | "test" => Environment::Development,
                other => {
                    return Err(CatalogError::Config(format!("unknown LIBRARY_ENV \"{other}\"")))
                }
            };
        }

        config.baseline_path = get("LIBRARY_BASELINE_PATH").map(PathBuf::from);

        let remote = &mut config.remote;
        if let Some(api) = get("LIBRARY_GITHUB_API") {
            remote.api_base = api;
        }
        if let Some(owner) = get("LIBRARY_GITHUB_OWNER") {
            remote.owner = owner;
        }
        if let Some(repo) = get("LIBRARY_GITHUB_REPO") {
            remote.repo = repo;
        }
        if let Some(path) = get("LIBRARY_GITHUB_FILE_PATH") {
            remote.file_path = path;
        }
        if let Some(name) = get("LIBRARY_COMMITTER_NAME") {
            remote.committer_name = name;
        }
        if let Some(email) = get("LIBRARY_COMMITTER_EMAIL") {
            remote.committer_email = email;
        }
        remote.token = get("LIBRARY_GITHUB_TOKEN");
        if let Some(ms) = get("LIBRARY_REMOTE_TIMEOUT_MS") {
            let ms: u64 = ms.parse().map_err(|_| {
                CatalogError::Config(format!("LIBRARY_REMOTE_TIMEOUT_MS is not a number: {ms}"))
            })?;
            remote.timeout = Duration::from_millis(ms);
        }

        if let Some(raw) = get("LIBRARY_ADMIN_CREDENTIALS") {
            config.admin_credentials = parse_credentials(&raw)?;
        }
        if config.admin_credentials.is_empty() {
            warn!("No admin credentials configured; admin login is disabled");
        }

        Ok(config)
    }

    /// Remote writes are used only in production with a write token.
    pub fn is_production_mode(&self) -> bool {
        self.environment == Environment::Production && self.remote.token.is_some()
    }
}

fn parse_credentials(raw: &str) -> CatalogResult<BTreeMap<String, String>> {
    raw.split(',')
        .map(str::trim)
        .filter(|pair| !pair.is_empty())
        .map(|pair| match pair.split_once(':') {
            Some((user, pass)) if !user.trim().is_empty() && !pass.is_empty() => {
                Ok((user.trim().to_string(), pass.to_string()))
            }
            _ => Err(CatalogError::Config(format!(
                "admin credential entry must look like user:password, got \"{pair}\""
            ))),
        })
        .collect()
}
