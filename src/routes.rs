//! Path → view resolution for the UI host.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    /// Browse and search.
    Browse,
    Admin,
    /// `/admin` requested without a valid admin marker.
    Login,
    NotFound,
}

pub fn resolve(path: &str, authenticated: bool) -> Route {
    let path = path.split(['?', '#']).next().unwrap_or("");
    let trimmed = path.trim_end_matches('/');
    match trimmed {
        "" => Route::Browse,
        "/admin" if authenticated => Route::Admin,
        "/admin" => Route::Login,
        _ => Route::NotFound,
    }
}
