//! Data models for the subdomain API.
//!
//! - `Subdomain`, `SubdomainStatus`: entries returned by the listing endpoints
//! - `NewSubdomain`: request body for ordering a subdomain
//! - `UserId`: opaque account identifier shared with the session identity

pub mod subdomain;
pub mod user;

pub use subdomain::{filter_subdomains, full_domain, name_taken, NewSubdomain, Subdomain, SubdomainStatus};
pub use user::UserId;
