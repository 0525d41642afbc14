//! REST API client module for the fleet backend.
//!
//! This module provides the `ApiClient` for the vehicle, driver, task,
//! mileage and expense collections plus the dashboard summaries.
//!
//! The API uses JWT bearer tokens: a short-lived access token attached by the
//! `RequestAuthenticator`, and a refresh token exchanged for a new access
//! token when the server answers 401.

pub mod authenticator;
pub mod client;
pub mod error;

pub use authenticator::RequestAuthenticator;
pub use client::{ApiClient, ApiRequest, ApiResult, PendingRequest};
pub use error::ApiError;
