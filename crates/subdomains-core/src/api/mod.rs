//! REST API client module for the subdomain service.
//!
//! This module provides the `ApiClient` for listing and ordering subdomains
//! and for exchanging the account service's refresh token for access tokens.

pub mod client;
pub mod error;

pub use client::{ApiClient, ApiResult};
pub use error::ApiError;
