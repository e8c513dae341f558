//! Middleware module
//!
//! Contains the middleware that extracts per-request provider credentials.

pub mod credentials;

pub use credentials::{credentials_middleware, ProviderCredentials};
