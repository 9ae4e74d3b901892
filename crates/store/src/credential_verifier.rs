//! Authentication against a fixed identity table (component D, spec §4.D).

use std::collections::HashMap;

use async_trait::async_trait;
use holomush_common::{Identifier, RequestContext};
use serde::Deserialize;

use crate::error::{Error, Result};

/// The identity a set of credentials resolves to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub character_id: Identifier,
    pub character_name: String,
    pub location_id: Identifier,
}

#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn authenticate(
        &self,
        ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<Authenticated>;
}

/// Always reports "not configured". The default when no credentials file is
/// supplied, so a misconfigured server fails authentication loudly rather
/// than silently accepting anyone.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnconfiguredVerifier;

#[async_trait]
impl CredentialVerifier for UnconfiguredVerifier {
    async fn authenticate(
        &self,
        _ctx: &RequestContext,
        _username: &str,
        _password: &str,
    ) -> Result<Authenticated> {
        Err(Error::Unconfigured)
    }
}

#[derive(Debug, Deserialize)]
struct CredentialsFile {
    #[serde(default)]
    user: Vec<UserEntry>,
}

#[derive(Debug, Deserialize)]
struct UserEntry {
    username: String,
    password: String,
    character_id: Identifier,
    character_name: String,
    location_id: Identifier,
}

/// Fixed username/password table, loaded once from a TOML file:
///
/// ```toml
/// [[user]]
/// username = "alice"
/// password = "correct-horse"
/// character_id = "01J0000000000000000000000"
/// character_name = "Alice"
/// location_id = "01J0000000000000000000001"
/// ```
pub struct StaticCredentialVerifier {
    users: HashMap<String, (String, Authenticated)>,
}

impl StaticCredentialVerifier {
    /// Parse a credentials table from TOML text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let file: CredentialsFile =
            toml::from_str(contents).map_err(|err| Error::format(err.to_string()))?;
        let users = file
            .user
            .into_iter()
            .map(|entry| {
                (
                    entry.username,
                    (
                        entry.password,
                        Authenticated {
                            character_id: entry.character_id,
                            character_name: entry.character_name,
                            location_id: entry.location_id,
                        },
                    ),
                )
            })
            .collect();
        Ok(Self { users })
    }

    /// Load a credentials table from a file on disk.
    pub fn load(path: &std::path::Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }
}

#[async_trait]
impl CredentialVerifier for StaticCredentialVerifier {
    async fn authenticate(
        &self,
        _ctx: &RequestContext,
        username: &str,
        password: &str,
    ) -> Result<Authenticated> {
        match self.users.get(username) {
            Some((expected, identity)) if expected == password => Ok(identity.clone()),
            _ => Err(Error::message(format!("rejected credentials for {username}"))),
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: &str = r#"
        [[user]]
        username = "alice"
        password = "hunter2"
        character_id = "01J0000000000000000000001"
        character_name = "Alice"
        location_id = "01J0000000000000000000002"
    "#;

    #[tokio::test]
    async fn unconfigured_verifier_always_rejects() {
        let ctx = RequestContext::new();
        let err = UnconfiguredVerifier.authenticate(&ctx, "anyone", "anything").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn static_verifier_accepts_matching_credentials() {
        let ctx = RequestContext::new();
        let verifier = StaticCredentialVerifier::from_toml(TABLE).unwrap();
        let identity = verifier.authenticate(&ctx, "alice", "hunter2").await.unwrap();
        assert_eq!(identity.character_name, "Alice");
    }

    #[tokio::test]
    async fn static_verifier_rejects_wrong_password() {
        let ctx = RequestContext::new();
        let verifier = StaticCredentialVerifier::from_toml(TABLE).unwrap();
        assert!(verifier.authenticate(&ctx, "alice", "wrong").await.is_err());
    }

    #[tokio::test]
    async fn static_verifier_rejects_unknown_user() {
        let ctx = RequestContext::new();
        let verifier = StaticCredentialVerifier::from_toml(TABLE).unwrap();
        assert!(verifier.authenticate(&ctx, "bob", "hunter2").await.is_err());
    }
}
