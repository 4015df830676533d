//! Core library for the subdomain client.
//!
//! - `auth`: session lifecycle for the account service's refresh/access tokens
//! - `api`: REST client for listing and ordering subdomains
//! - `models`: subdomain records and order payloads
//! - `config`: on-disk configuration with environment overrides
//! - `utils`: string helpers shared with the UI

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiError};
pub use auth::{SessionManager, SessionOptions, SessionPhase, SessionSnapshot};
pub use config::Config;
