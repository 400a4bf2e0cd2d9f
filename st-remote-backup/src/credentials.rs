//! The single username/password pair guarding the API.
//!
//! Seeded from configuration, optionally replaced by a JSON credential file
//! at startup, and rotated through `/change-cred`.

use crate::utils::CredentialError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Minimum length of a rotated username or password
pub const MIN_CREDENTIAL_LEN: usize = 2;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    #[serde(rename = "user")]
    pub username: String,
    #[serde(rename = "pass")]
    pub password: String,
}

impl Credential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields empty: authentication is disabled
    pub fn is_empty(&self) -> bool {
        self.username.is_empty() && self.password.is_empty()
    }
}

#[derive(Debug)]
pub struct CredentialStore {
    path: PathBuf,
    current: RwLock<Credential>,
}

impl CredentialStore {
    pub fn new(path: impl Into<PathBuf>, initial: Credential) -> Self {
        Self {
            path: path.into(),
            current: RwLock::new(initial),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Replace the in-memory pair with the credential file, if it exists and
    /// holds a non-empty pair. Returns whether the file was applied.
    pub async fn load(&self) -> bool {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!("No credential file at {}: {}", self.path.display(), e);
                return false;
            }
        };

        let stored: Credential = match serde_json::from_str(&raw) {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Ignoring unreadable credential file {}: {}", self.path.display(), e);
                return false;
            }
        };

        if stored.username.is_empty() || stored.password.is_empty() {
            return false;
        }

        *self.current.write().await = stored;
        true
    }

    pub async fn current(&self) -> Credential {
        self.current.read().await.clone()
    }

    pub async fn is_open(&self) -> bool {
        self.current.read().await.is_empty()
    }

    /// Guard rule: open stores accept anything, otherwise the presented pair
    /// must match exactly
    pub async fn authorize(&self, presented: Option<&Credential>) -> bool {
        let current = self.current.read().await;
        if current.is_empty() {
            return true;
        }
        presented.is_some_and(|p| *p == *current)
    }

    /// Exact comparison regardless of whether authentication is enabled
    pub async fn matches(&self, username: &str, password: &str) -> bool {
        let current = self.current.read().await;
        current.username == username && current.password == password
    }

    /// Swap in a new pair after verifying the old one.
    ///
    /// The write lock is held until the file is written, so a failed write
    /// leaves the old pair active and concurrent rotations are serialized.
    pub async fn rotate(
        &self,
        old_username: &str,
        old_password: &str,
        new_username: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        let mut current = self.current.write().await;

        if current.username != old_username || current.password != old_password {
            return Err(CredentialError::Mismatch);
        }

        validate(new_username, new_password)?;

        let next = Credential::new(new_username, new_password);
        let body = serde_json::to_string(&next)?;
        tokio::fs::write(&self.path, body)
            .await
            .map_err(|source| CredentialError::Persist {
                path: self.path.clone(),
                source,
            })?;

        *current = next;
        Ok(())
    }
}

fn validate(username: &str, password: &str) -> Result<(), CredentialError> {
    if username.is_empty() || password.is_empty() {
        return Err(CredentialError::Invalid(
            "new username and password are required".into(),
        ));
    }
    if username.chars().count() < MIN_CREDENTIAL_LEN
        || password.chars().count() < MIN_CREDENTIAL_LEN
    {
        return Err(CredentialError::Invalid(format!(
            "new username and password must be strings of at least {MIN_CREDENTIAL_LEN} characters"
        )));
    }
    Ok(())
}
