//! # Library Catalog Core
//!
//! Data and persistence core of a small library catalog: visitors browse and
//! search books grouped by category, an admin adds, edits and deletes books
//! and categories. The crate is meant to sit under a UI host (web view,
//! Flutter, desktop shell) and talks to it through C-compatible functions
//! that exchange JSON.
//!
//! ## Features
//!
//! - **Record normalization**: book records with inconsistent key spellings
//!   resolve to one canonical value per field ([`normalizer`], [`book_model`])
//! - **Local persistence**: the catalog snapshot lives in an LMDB store,
//!   layered over a baseline dataset ([`catalog_store`])
//! - **Remote sync**: in production, saves commit the catalog file through a
//!   contents API with optimistic concurrency on the file SHA ([`remote_sync`])
//! - **Change broadcast**: every view gets its own copy of each update
//!   ([`events`])
//! - **Safe error handling**: No `unwrap()` calls in production code
//!
//! ## Quick Start
//!
//! ```no_run
//! use library_catalog_core::{create_library, search_books, free_c_string};
//! use std::ffi::CString;
//!
//! let dir = CString::new("library_state").unwrap();
//! let library = create_library(dir.as_ptr());
//!
//! let query = CString::new("kadare").unwrap();
//! let result = search_books(library, query.as_ptr(), std::ptr::null());
//! free_c_string(result as *mut _);
//! ```
//!
//! ## FFI Functions
//!
//! Every function returns a JSON-serialized [`app_response::AppResponse`]
//! that must be released with [`free_c_string`]:
//!
//! - [`create_library`] / [`close_library`] - Lifecycle
//! - [`get_catalog`], [`visible_categories`], [`search_books`] - Reads
//! - [`put_catalog`], [`reset_catalog`], [`has_local_override`] - Whole-catalog writes
//! - [`admin_login`], [`admin_logout`], [`current_admin`], [`resolve_route`] - Admin gate
//! - [`select_category`], [`add_book`], [`edit_book`], [`delete_book`],
//!   [`add_category`], [`delete_category`], [`delete_category_prompt`] - Admin edits
//! - [`poll_events`] - Pending change and notification events

pub mod admin;
pub mod app;
pub mod app_response;
pub mod auth;
pub mod book_model;
pub mod catalog;
pub mod catalog_error;
pub mod catalog_store;
pub mod config;
pub mod events;
pub mod local_db_state;
pub mod normalizer;
pub mod remote_sync;
pub mod routes;

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::PathBuf;

use log::{info, warn};
use serde::Serialize;

use crate::app::LibraryApp;
use crate::app_response::AppResponse;
use crate::book_model::Book;
use crate::catalog::Catalog;
use crate::catalog_error::CatalogResult;
use crate::config::LibraryConfig;
use crate::events::Subscription;

/// Opaque handle owned by the FFI caller.
pub struct LibraryHandle {
    app: LibraryApp,
    events: Subscription,
}

/// Opens the library state stored in directory `dir`.
///
/// Configuration is read from the environment (see [`config`]).
///
/// # Returns
///
/// A handle pointer, or null on failure. Release it with [`close_library`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn create_library(dir: *const c_char) -> *mut LibraryHandle {
    if dir.is_null() {
        warn!("Null directory pointer passed to create_library");
        return std::ptr::null_mut();
    }

    let dir = match unsafe { CStr::from_ptr(dir).to_str() } {
        Ok(s) => s.to_string(),
        Err(e) => {
            warn!("Invalid UTF-8 in directory parameter: {e}");
            return std::ptr::null_mut();
        }
    };

    let config = match LibraryConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            warn!("❌ Invalid library configuration: {e}");
            return std::ptr::null_mut();
        }
    };

    match open_handle(PathBuf::from(&dir), config) {
        Ok(handle) => {
            info!("✅ Library opened at {dir}");
            Box::into_raw(Box::new(handle))
        }
        Err(e) => {
            warn!("❌ Failed to open library at {dir}: {e}");
            std::ptr::null_mut()
        }
    }
}

fn open_handle(dir: PathBuf, config: LibraryConfig) -> CatalogResult<LibraryHandle> {
    let app = LibraryApp::open(dir, config)?;
    let events = app.subscribe();
    Ok(LibraryHandle { app, events })
}

/// Closes the store and frees the handle. The pointer is invalid afterwards.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn close_library(handle: *mut LibraryHandle) -> *const c_char {
    if handle.is_null() {
        let error = AppResponse::BadRequest("Null handle passed to close_library".to_string());
        return response_to_c_string(&error);
    }

    let handle = unsafe { *Box::from_raw(handle) };
    match handle.app.close() {
        Ok(()) => response_to_c_string(&AppResponse::success("Library closed successfully")),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Releases a string returned by any function of this library.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn free_c_string(ptr: *mut c_char) {
    if ptr.is_null() {
        return;
    }
    drop(unsafe { CString::from_raw(ptr) });
}

/// The current catalog as a JSON object of category → books.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn get_catalog(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_ref(handle, "get_catalog") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(Ok(handle.app.catalog()))
}

/// Category names for the browse view, "all categories" first.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn visible_categories(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_ref(handle, "visible_categories") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(Ok(handle.app.catalog().visible_categories()))
}

/// Books of `category` (null for all categories) matching `query`.
/// An empty query returns the whole category view.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn search_books(
    handle: *mut LibraryHandle,
    query: *const c_char,
    category: *const c_char,
) -> *const c_char {
    let handle = match handle_ref(handle, "search_books") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let query = match c_ptr_to_string(query, "query") {
        Ok(q) => q,
        Err(e) => return e,
    };
    let category = match optional_c_string(category, "category") {
        Ok(c) => c,
        Err(e) => return e,
    };
    respond(Ok(handle.app.search(&query, category.as_deref())))
}

/// Replaces the whole catalog. Requires an admin marker.
///
/// # Parameters
///
/// * `handle` - Library handle from [`create_library`]
/// * `json_ptr` - Null-terminated C string holding the catalog
///
/// # Returns
///
/// `Ok` with `"remote"` or `"local_only"` naming where the catalog was saved.
/// `Conflict` when the remote file changed since it was fetched.
///
/// # Safety
///
/// Both pointers must be valid. The returned string must be freed with
/// [`free_c_string`].
///
/// # JSON Format
///
/// ```json
/// {
///   "Letersi": [{ "Nr.": 1, "Titulli": "Iliada", "Autori": "Homeri" }],
///   "Shkence": []
/// }
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn put_catalog(handle: *mut LibraryHandle, json_ptr: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "put_catalog") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let json = match c_ptr_to_string(json_ptr, "JSON") {
        Ok(j) => j,
        Err(e) => return e,
    };
    if handle.app.current_user().is_none() {
        return response_to_c_string(&AppResponse::Unauthorized("admin login required".to_string()));
    }
    let catalog = match Catalog::from_json_str(&json) {
        Ok(c) => c,
        Err(e) => return response_to_c_string(&AppResponse::from(e)),
    };
    respond(handle.app.save(catalog))
}

/// Drops local edits and returns the baseline catalog. Requires an admin
/// marker.
///
/// # Returns
///
/// `Ok` with the baseline catalog, or `Unauthorized` without an admin marker.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn reset_catalog(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_mut(handle, "reset_catalog") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(handle.app.reset().map(Catalog::clone))
}

/// Reports whether a local snapshot overrides the baseline.
///
/// # Returns
///
/// `Ok` with a JSON boolean payload. A snapshot that fails to parse still
/// counts as an override.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn has_local_override(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_ref(handle, "has_local_override") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(Ok(handle.app.has_override()))
}

/// Checks admin credentials and stores a 24 hour admin marker.
///
/// # Parameters
///
/// * `handle` - Library handle from [`create_library`]
/// * `username` - Null-terminated C string
/// * `password` - Null-terminated C string
///
/// # Returns
///
/// `Ok` with the stored marker (`username`, `timestamp`, `expires`, all times
/// in milliseconds), or `Unauthorized` when the pair is unknown.
///
/// # Safety
///
/// All pointers must be valid. The returned string must be freed with
/// [`free_c_string`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use library_catalog_core::{admin_login, create_library, free_c_string};
///
/// let dir = CString::new("library_state").unwrap();
/// let library = create_library(dir.as_ptr());
///
/// let user = CString::new("admin").unwrap();
/// let pass = CString::new("secret").unwrap();
/// let result = admin_login(library, user.as_ptr(), pass.as_ptr());
/// free_c_string(result as *mut _);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn admin_login(
    handle: *mut LibraryHandle,
    username: *const c_char,
    password: *const c_char,
) -> *const c_char {
    let handle = match handle_ref(handle, "admin_login") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let username = match c_ptr_to_string(username, "username") {
        Ok(u) => u,
        Err(e) => return e,
    };
    let password = match c_ptr_to_string(password, "password") {
        Ok(p) => p,
        Err(e) => return e,
    };
    respond(handle.app.login(&username, &password))
}

/// Removes the admin marker and clears the selected category.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn admin_logout(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_mut(handle, "admin_logout") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(handle.app.logout().map(|_| "Logged out"))
}

/// Username of the logged-in admin, `null` in the payload when none.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn current_admin(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_ref(handle, "current_admin") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(Ok(handle.app.current_user()))
}

/// Maps a URL path to the view the host should show.
///
/// # Parameters
///
/// * `path` - Path with optional query or fragment, e.g. `/admin?tab=books`
///
/// # Returns
///
/// `Ok` with one of `"browse"`, `"admin"`, `"login"` or `"not_found"`.
/// `/admin` resolves to `"login"` while no valid admin marker is stored.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn resolve_route(handle: *mut LibraryHandle, path: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "resolve_route") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let path = match c_ptr_to_string(path, "path") {
        Ok(p) => p,
        Err(e) => return e,
    };
    respond(Ok(handle.app.route(&path)))
}

/// Selects the category that book edits apply to.
///
/// # Returns
///
/// `Ok` with the selected name, or `NotFound` when no such category exists.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn select_category(handle: *mut LibraryHandle, name: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "select_category") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let name = match c_ptr_to_string(name, "name") {
        Ok(n) => n,
        Err(e) => return e,
    };
    respond(handle.app.select_category(&name).map(|_| name))
}

/// Adds a book to the selected category. Returns the stored book.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_book(handle: *mut LibraryHandle, json_ptr: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "add_book") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let book = match book_from_c_json(json_ptr) {
        Ok(b) => b,
        Err(e) => return e,
    };
    respond(handle.app.add_book(book))
}

/// Replaces the book with the same identifier in the selected category.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn edit_book(handle: *mut LibraryHandle, json_ptr: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "edit_book") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let book = match book_from_c_json(json_ptr) {
        Ok(b) => b,
        Err(e) => return e,
    };
    respond(handle.app.edit_book(book))
}

/// Deletes a book from the selected category. `confirmed` carries the
/// user's answer to the delete prompt.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_book(handle: *mut LibraryHandle, id: *const c_char, confirmed: bool) -> *const c_char {
    let handle = match handle_mut(handle, "delete_book") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let id = match c_ptr_to_string(id, "id") {
        Ok(i) => i,
        Err(e) => return e,
    };
    match handle.app.delete_book(&id, &mut |_: &str| confirmed) {
        Ok(true) => response_to_c_string(&AppResponse::success(format!("Book {id} deleted"))),
        Ok(false) => response_to_c_string(&AppResponse::Cancelled("Delete not confirmed".to_string())),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Creates an empty category and selects it. Requires an admin marker.
///
/// # Parameters
///
/// * `handle` - Library handle from [`create_library`]
/// * `name` - Category name; surrounding whitespace is trimmed
///
/// # Returns
///
/// `Ok` with the stored name. `ValidationError` when the name is blank,
/// reserved or already taken; `Unauthorized` without an admin marker.
///
/// # Safety
///
/// Both pointers must be valid. The returned string must be freed with
/// [`free_c_string`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn add_category(handle: *mut LibraryHandle, name: *const c_char) -> *const c_char {
    let handle = match handle_mut(handle, "add_category") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let name = match c_ptr_to_string(name, "name") {
        Ok(n) => n,
        Err(e) => return e,
    };
    respond(handle.app.add_category(&name))
}

/// Text the host should show before calling [`delete_category`].
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_category_prompt(handle: *mut LibraryHandle, name: *const c_char) -> *const c_char {
    let handle = match handle_ref(handle, "delete_category_prompt") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let name = match c_ptr_to_string(name, "name") {
        Ok(n) => n,
        Err(e) => return e,
    };
    match handle.app.catalog().books(&name) {
        Some(books) => respond(Ok(catalog::delete_category_prompt(&name, books.len()))),
        None => response_to_c_string(&AppResponse::NotFound(format!("No category named {name}"))),
    }
}

/// Deletes a category together with every book in it. Requires an admin
/// marker.
///
/// # Parameters
///
/// * `handle` - Library handle from [`create_library`]
/// * `name` - Category to delete
/// * `confirmed` - The user's answer to [`delete_category_prompt`]
///
/// # Returns
///
/// `Ok` when deleted, `Cancelled` when `confirmed` is false, `NotFound` for
/// an unknown category.
///
/// # Safety
///
/// Both pointers must be valid. The returned string must be freed with
/// [`free_c_string`].
///
/// # Examples
///
/// ```no_run
/// use std::ffi::CString;
/// use library_catalog_core::{create_library, delete_category, delete_category_prompt, free_c_string};
///
/// let dir = CString::new("library_state").unwrap();
/// let library = create_library(dir.as_ptr());
/// let name = CString::new("Shkence").unwrap();
///
/// let prompt = delete_category_prompt(library, name.as_ptr());
/// free_c_string(prompt as *mut _);
///
/// let result = delete_category(library, name.as_ptr(), true);
/// free_c_string(result as *mut _);
/// ```
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn delete_category(
    handle: *mut LibraryHandle,
    name: *const c_char,
    confirmed: bool,
) -> *const c_char {
    let handle = match handle_mut(handle, "delete_category") {
        Ok(h) => h,
        Err(e) => return e,
    };
    let name = match c_ptr_to_string(name, "name") {
        Ok(n) => n,
        Err(e) => return e,
    };
    match handle.app.delete_category(&name, &mut |_: &str| confirmed) {
        Ok(true) => response_to_c_string(&AppResponse::success(format!("Category {name} deleted"))),
        Ok(false) => response_to_c_string(&AppResponse::Cancelled("Delete not confirmed".to_string())),
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Drains the events published since the previous call.
#[no_mangle]
#[allow(clippy::not_unsafe_ptr_arg_deref)]
pub extern "C" fn poll_events(handle: *mut LibraryHandle) -> *const c_char {
    let handle = match handle_mut(handle, "poll_events") {
        Ok(h) => h,
        Err(e) => return e,
    };
    respond(Ok(handle.events.drain()))
}

fn handle_ref<'a>(ptr: *mut LibraryHandle, caller: &str) -> Result<&'a LibraryHandle, *const c_char> {
    match unsafe { ptr.as_ref() } {
        Some(h) => Ok(h),
        None => {
            let error = AppResponse::BadRequest(format!("Null handle passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn handle_mut<'a>(ptr: *mut LibraryHandle, caller: &str) -> Result<&'a mut LibraryHandle, *const c_char> {
    match unsafe { ptr.as_mut() } {
        Some(h) => Ok(h),
        None => {
            let error = AppResponse::BadRequest(format!("Null handle passed to {caller}"));
            Err(response_to_c_string(&error))
        }
    }
}

fn book_from_c_json(json_ptr: *const c_char) -> Result<Book, *const c_char> {
    let json = c_ptr_to_string(json_ptr, "JSON")?;
    serde_json::from_str(&json).map_err(|e| {
        let error = AppResponse::SerializationError(format!("Invalid book JSON: {e}"));
        response_to_c_string(&error)
    })
}

/// Serializes a successful payload into `AppResponse::Ok`, or maps the error.
fn respond<T: Serialize>(result: CatalogResult<T>) -> *const c_char {
    match result {
        Ok(payload) => match serde_json::to_string(&payload) {
            Ok(json) => response_to_c_string(&AppResponse::Ok(json)),
            Err(e) => {
                let error = AppResponse::SerializationError(format!("Failed to serialize result: {e}"));
                response_to_c_string(&error)
            }
        },
        Err(e) => response_to_c_string(&AppResponse::from(e)),
    }
}

/// Converts an [`AppResponse`] to a C string owned by the caller.
///
/// Returns a null pointer if serialization or C string creation fails.
fn response_to_c_string(response: &AppResponse) -> *const c_char {
    let json = match serde_json::to_string(response) {
        Ok(j) => j,
        Err(e) => {
            warn!("Error serializing response: {e}");
            return std::ptr::null();
        }
    };

    match CString::new(json) {
        Ok(c_str) => c_str.into_raw(),
        Err(e) => {
            warn!("Error creating CString: {e}");
            std::ptr::null()
        }
    }
}

/// Converts a C string pointer to a Rust String.
///
/// On failure the error is already encoded as a C string response, ready to
/// be returned to the FFI caller.
fn c_ptr_to_string(ptr: *const c_char, field_name: &str) -> Result<String, *const c_char> {
    if ptr.is_null() {
        let error = AppResponse::BadRequest(format!("Null {field_name} pointer"));
        return Err(response_to_c_string(&error));
    }

    match unsafe { CStr::from_ptr(ptr).to_str() } {
        Ok(s) => Ok(s.to_string()),
        Err(e) => {
            let error = AppResponse::BadRequest(format!("Invalid UTF-8 in {field_name}: {e}"));
            Err(response_to_c_string(&error))
        }
    }
}

/// Like [`c_ptr_to_string`], but a null pointer means "not given".
fn optional_c_string(ptr: *const c_char, field_name: &str) -> Result<Option<String>, *const c_char> {
    if ptr.is_null() {
        return Ok(None);
    }
    c_ptr_to_string(ptr, field_name).map(Some)
}
