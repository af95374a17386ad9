//! Credential verification.

use std::collections::HashMap;

use crate::config::schema::CredentialConfig;

/// Capability to check a username/password pair.
pub trait CredentialStore: Send + Sync {
    fn verify(&self, username: &str, password: &str) -> bool;
}

/// In-memory credentials loaded from configuration.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentialStore {
    passwords: HashMap<String, String>,
}

impl StaticCredentialStore {
    pub fn new(entries: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            passwords: entries.into_iter().collect(),
        }
    }

    pub fn from_config(entries: &[CredentialConfig]) -> Self {
        Self::new(
            entries
                .iter()
                .map(|c| (c.username.clone(), c.password.clone())),
        )
    }

    pub fn len(&self) -> usize {
        self.passwords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passwords.is_empty()
    }
}

impl CredentialStore for StaticCredentialStore {
    fn verify(&self, username: &str, password: &str) -> bool {
        self.passwords
            .get(username)
            .is_some_and(|expected| expected == password)
    }
}
