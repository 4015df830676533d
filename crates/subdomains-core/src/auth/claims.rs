//! Identity claims carried by the account service's refresh token.
//!
//! Claims are read without verifying the signature. The identity is a
//! display hint (header greeting, profile, order form); the API re-validates
//! every token it is handed, so nothing here grants access.

use chrono::{DateTime, TimeZone, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::Deserialize;

use crate::models::UserId;

use super::AuthError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub username: String,
    pub email: String,
    pub user_id: UserId,
    /// `exp` claim, when the token carries one
    pub expires_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct RefreshClaims {
    username: String,
    email: String,
    user_id: UserId,
    #[serde(default)]
    exp: Option<i64>,
}

fn unverified_validation() -> Validation {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.insecure_disable_signature_validation();
    validation.validate_exp = false;
    validation.validate_aud = false;
    validation.required_spec_claims.clear();
    validation
}

/// Decode the identity claims of a refresh token.
pub fn decode_identity(token: &str) -> Result<Identity, AuthError> {
    let data = decode::<RefreshClaims>(token, &DecodingKey::from_secret(&[]), &unverified_validation())
        .map_err(|e| AuthError::Decode(e.to_string()))?;
    let claims = data.claims;

    Ok(Identity {
        username: claims.username,
        email: claims.email,
        user_id: claims.user_id,
        expires_at: claims.exp.and_then(|exp| Utc.timestamp_opt(exp, 0).single()),
    })
}

#[cfg(test)]
pub(crate) mod test_tokens {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde_json::{json, Value};

    pub fn mint(claims: Value) -> String {
        encode(&Header::default(), &claims, &EncodingKey::from_secret(b"not-the-server-secret"))
            .expect("Failed to mint test token")
    }

    pub fn alice() -> String {
        mint(json!({
            "token_type": "refresh",
            "username": "alice",
            "email": "a@x.com",
            "user_id": 7,
            "exp": 1_700_000_000i64,
        }))
    }

    pub fn bob() -> String {
        mint(json!({"username": "bob", "email": "b@x.com", "user_id": "u-2"}))
    }
}

#[cfg(test)]
mod tests {
    use super::test_tokens::*;
    use super::*;

    #[test]
    fn test_decode_alice() {
        let identity = decode_identity(&alice()).unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.email, "a@x.com");
        assert_eq!(identity.user_id, UserId::from(7));
        assert_eq!(identity.expires_at.unwrap().timestamp(), 1_700_000_000);
    }

    #[test]
    fn test_expired_token_still_decodes() {
        // Expiry is the refresh endpoint's call, not ours
        let token = mint(serde_json::json!({
            "username": "old", "email": "o@x.com", "user_id": 1, "exp": 1
        }));
        assert_eq!(decode_identity(&token).unwrap().username, "old");
    }

    #[test]
    fn test_string_user_id_and_no_exp() {
        let identity = decode_identity(&bob()).unwrap();
        assert_eq!(identity.user_id.as_str(), "u-2");
        assert_eq!(identity.expires_at, None);
    }

    #[test]
    fn test_malformed_tokens_are_errors() {
        assert!(decode_identity("").is_err());
        assert!(decode_identity("not-a-jwt").is_err());
        assert!(decode_identity("a.b.c").is_err());
        let missing_email = mint(serde_json::json!({"username": "x", "user_id": 1}));
        assert!(matches!(decode_identity(&missing_email), Err(AuthError::Decode(_))));
    }
}
