//! Authentication module for the account service's token pair.
//!
//! This module provides:
//! - `SessionManager`: owns the login state, renews the access token every
//!   few minutes and logs out when renewal fails
//! - `TokenStore` backends for persisting the refresh and access tokens
//! - `Navigator`: the post-login redirect and the outbound login trip
//! - `decode_identity`: display claims from the refresh token

pub mod claims;
pub mod error;
pub mod navigation;
pub mod session;
pub mod storage;

pub use claims::{decode_identity, Identity};
pub use error::AuthError;
pub use navigation::{CallbackNavigator, Navigator};
pub use session::{SessionManager, SessionOptions, SessionPhase, SessionSnapshot, TokenRefresher};
pub use storage::{FileStore, KeyringStore, MemoryStore, StorageError, TokenStore};
