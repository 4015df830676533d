use thiserror::Error;

#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Malformed refresh token: {0}")]
    Decode(String),

    #[error("Navigation failed: {0}")]
    Navigation(String),
}
