use serde::{Deserialize, Serialize};

use crate::utils::contains_ignore_case;

use super::UserId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubdomainStatus {
    Active,
    Pending,
    Inactive,
    Other(String),
}

impl SubdomainStatus {
    pub fn as_str(&self) -> &str {
        match self {
            SubdomainStatus::Active => "active",
            SubdomainStatus::Pending => "pending",
            SubdomainStatus::Inactive => "inactive",
            SubdomainStatus::Other(s) => s,
        }
    }
}

impl From<String> for SubdomainStatus {
    fn from(s: String) -> Self {
        match s.to_lowercase().as_str() {
            "active" => SubdomainStatus::Active,
            "pending" => SubdomainStatus::Pending,
            "inactive" => SubdomainStatus::Inactive,
            _ => SubdomainStatus::Other(s),
        }
    }
}

impl From<SubdomainStatus> for String {
    fn from(status: SubdomainStatus) -> Self {
        status.as_str().to_string()
    }
}

impl Serialize for SubdomainStatus {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SubdomainStatus {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(String::deserialize(deserializer)?.into())
    }
}

impl std::fmt::Display for SubdomainStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subdomain {
    #[serde(default)]
    pub id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub purpose: String,
    pub status: SubdomainStatus,
    #[serde(default)]
    pub user: Option<UserId>,
}

impl Subdomain {
    /// The first DNS label, lowercased. Names may come back fully qualified.
    pub fn label(&self) -> String {
        self.name
            .split('.')
            .next()
            .unwrap_or_default()
            .to_lowercase()
    }
}

/// Request body for ordering a new subdomain. New orders always start pending.
#[derive(Debug, Clone, Serialize)]
pub struct NewSubdomain {
    pub name: String,
    pub user: UserId,
    pub purpose: String,
    pub status: SubdomainStatus,
}

impl NewSubdomain {
    pub fn new(name: impl Into<String>, user: UserId, purpose: impl Into<String>) -> Self {
        Self {
            name: name.into().trim().to_string(),
            user,
            purpose: purpose.into(),
            status: SubdomainStatus::Pending,
        }
    }
}

/// Entries whose name or purpose contains `query`, ignoring case.
pub fn filter_subdomains<'a>(subdomains: &'a [Subdomain], query: &str) -> Vec<&'a Subdomain> {
    subdomains
        .iter()
        .filter(|s| {
            query.is_empty()
                || contains_ignore_case(&s.name, query)
                || contains_ignore_case(&s.purpose, query)
        })
        .collect()
}

/// Whether `candidate` collides with an existing subdomain's first label.
pub fn name_taken(subdomains: &[Subdomain], candidate: &str) -> bool {
    let candidate = candidate.trim().to_lowercase();
    if candidate.is_empty() {
        return false;
    }
    subdomains.iter().any(|s| s.label() == candidate)
}

pub fn full_domain(name: &str, suffix: &str) -> String {
    format!("{}.{}", name, suffix.trim_start_matches('.'))
}
