//! Login orchestration.

use std::sync::Arc;
use std::time::Instant;

use crate::auth::credentials::CredentialStore;
use crate::auth::types::{AuthError, AuthResult};
use crate::observability::metrics;
use crate::users::lookup::{ResilientLookup, UserSource};
use crate::users::model::User;

/// Verifies credentials, then resolves the user through the guarded lookup.
#[derive(Clone)]
pub struct UserService {
    credentials: Arc<dyn CredentialStore>,
    lookup: ResilientLookup,
}

impl UserService {
    pub fn new(credentials: Arc<dyn CredentialStore>, lookup: ResilientLookup) -> Self {
        Self { credentials, lookup }
    }

    pub fn lookup(&self) -> &ResilientLookup {
        &self.lookup
    }

    pub async fn login(&self, username: &str, password: &str) -> AuthResult<User> {
        self.login_with_source(username, password)
            .await
            .map(|(user, _)| user)
    }

    /// Like [`login`](Self::login), also reporting whether the user is degraded.
    pub async fn login_with_source(&self, username: &str, password: &str) -> AuthResult<(User, UserSource)> {
        let start = Instant::now();

        if !self.credentials.verify(username, password) {
            tracing::info!(username = %username, "Login rejected: wrong credentials");
            metrics::record_login(AuthError::WrongCredentials.kind(), start);
            return Err(AuthError::WrongCredentials);
        }

        match self.lookup.resolve(username).await {
            Ok((user, source)) => {
                tracing::info!(username = %username, source = source.as_str(), "Login succeeded");
                metrics::record_login(source.as_str(), start);
                Ok((user, source))
            }
            Err(e) => {
                metrics::record_login(e.kind(), start);
                Err(e)
            }
        }
    }
}
