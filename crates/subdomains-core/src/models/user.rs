use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Opaque account identifier issued by the account service.
///
/// The API sends it as a JSON number, other services as a string; both are
/// accepted and kept in their textual form so nothing depends on its shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<i64> for UserId {
    fn from(id: i64) -> Self {
        Self(id.to_string())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawUserId {
    Number(i64),
    Text(String),
}

impl<'de> Deserialize<'de> for UserId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match RawUserId::deserialize(deserializer)? {
            RawUserId::Number(n) => UserId::from(n),
            RawUserId::Text(s) => UserId(s),
        })
    }
}

impl Serialize for UserId {
    // Numeric ids go back out as numbers so the API sees what it sent
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0.parse::<i64>() {
            Ok(n) => serializer.serialize_i64(n),
            Err(_) => serializer.serialize_str(&self.0),
        }
    }
}
