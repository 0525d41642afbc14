//! Core library for the Filo fleet dashboard.
//!
//! Holds everything that is not presentation: the session gate (token
//! store, request authentication, refresh-and-retry, route guard), the REST
//! client, the resource models and the configuration.

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError, ApiResult};
pub use auth::{Route, RouteGuard, Session, SharedTokenStore, TokenStore};
pub use config::Config;
