//! Session management: token storage and route gating.
//!
//! This module provides:
//! - `Session`: the access/refresh token pair
//! - `TokenStore`: the credential store interface, with memory, file and
//!   OS keychain backends
//! - `RouteGuard`: allow/redirect decisions for page navigation
//!
//! File-backed sessions expire 7 days after they were last written.

pub mod credentials;
pub mod guard;
pub mod session;
pub mod store;

pub use credentials::KeyringTokenStore;
pub use guard::{evaluate, GuardDecision, Route, RouteGuard};
pub use session::Session;
pub use store::{
    open_store, CredentialBackend, FileTokenStore, MemoryTokenStore, SharedTokenStore, TokenStore,
};
