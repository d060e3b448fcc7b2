//! HTTP surface: server setup, routes, error envelope.

pub mod error;
pub mod models;
pub mod routes;
pub mod server;

pub use error::{ApiError, ApiResult, PrettyJson};
pub use server::{ApiServer, AppState};
