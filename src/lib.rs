//! Todo API: session-authenticated CRUD over per-user todos.
//!
//! Layout:
//!
//! - [`app`] wires state, routes, CORS and tracing into one router
//! - [`middleware`] holds the auth guard and the `CurrentUser` extractor
//! - [`routes`] contains the HTTP handlers
//! - [`database`] owns the pool, migrations and the SQL behind each store
//! - [`auth`] is the authentication collaborator (sessions, passwords)

pub mod app;
pub mod auth;
pub mod config;
pub mod database;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;

pub use app::{router, AppState};
pub use error::{AppError, Result};
