//! Bearer credential storage.
//!
//! One `get`/`set`/`clear` contract and one expiry policy, whatever backend
//! actually holds the token.

use std::fmt;

use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::{LocalStore, CREDENTIAL_KEY};
use crate::util::normalize_text_option;
use crate::{Error, Result};

/// How long a stored credential stays valid after `set`.
pub const CREDENTIAL_TTL_DAYS: i64 = 7;

#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCredential {
    pub token: String,
    /// Unix seconds.
    pub expires_at: i64,
}

impl StoredCredential {
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now().timestamp()
    }

    /// Decode a persisted credential. Unreadable values are logged and
    /// treated as no credential.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match serde_json::from_str(raw) {
            Ok(credential) => Some(credential),
            Err(error) => {
                tracing::warn!("Ignoring corrupt stored credential: {}", error);
                None
            }
        }
    }
}

impl fmt::Debug for StoredCredential {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("StoredCredential")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Backend holding at most one credential.
pub trait CredentialPersistence: Send + Sync {
    fn load(&self) -> Result<Option<StoredCredential>>;
    fn save(&self, credential: &StoredCredential) -> Result<()>;
    fn clear(&self) -> Result<()>;
}

/// Credential store applying the expiry policy on top of a backend.
#[derive(Debug, Clone)]
pub struct CredentialStore<P> {
    persistence: P,
    ttl: Duration,
}

impl<P: CredentialPersistence> CredentialStore<P> {
    pub fn new(persistence: P) -> Self {
        Self {
            persistence,
            ttl: Duration::days(CREDENTIAL_TTL_DAYS),
        }
    }

    /// The current token. Expired tokens are cleared and reported as `None`.
    pub fn get(&self) -> Result<Option<String>> {
        Ok(self.stored()?.map(|credential| credential.token))
    }

    /// The current credential with its expiry.
    pub fn stored(&self) -> Result<Option<StoredCredential>> {
        let Some(credential) = self.persistence.load()? else {
            return Ok(None);
        };

        if credential.is_expired() {
            tracing::info!("Stored credential expired; clearing it");
            self.persistence.clear()?;
            return Ok(None);
        }
        Ok(Some(credential))
    }

    pub fn set(&self, token: &str) -> Result<StoredCredential> {
        let token = normalize_text_option(Some(token.to_string()))
            .ok_or_else(|| Error::InvalidInput("Credential must not be empty".to_string()))?;
        let credential = StoredCredential {
            token,
            expires_at: Utc::now().timestamp().saturating_add(self.ttl.num_seconds()),
        };
        self.persistence.save(&credential)?;
        Ok(credential)
    }

    pub fn clear(&self) -> Result<()> {
        self.persistence.clear()
    }
}

/// Keeps the credential in a [`LocalStore`] under [`CREDENTIAL_KEY`].
#[derive(Debug, Clone)]
pub struct LocalStoreCredentials<L> {
    store: L,
}

impl<L: LocalStore> LocalStoreCredentials<L> {
    pub const fn new(store: L) -> Self {
        Self { store }
    }
}

impl<L: LocalStore> CredentialPersistence for LocalStoreCredentials<L> {
    fn load(&self) -> Result<Option<StoredCredential>> {
        Ok(self
            .store
            .get(CREDENTIAL_KEY)?
            .and_then(|raw| StoredCredential::parse(&raw)))
    }

    fn save(&self, credential: &StoredCredential) -> Result<()> {
        let serialized = serde_json::to_string(credential)?;
        self.store.set(CREDENTIAL_KEY, &serialized)
    }

    fn clear(&self) -> Result<()> {
        self.store.remove(CREDENTIAL_KEY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryStore;

    fn store() -> (MemoryStore, CredentialStore<LocalStoreCredentials<MemoryStore>>) {
        let cache = MemoryStore::new();
        let credentials = CredentialStore::new(LocalStoreCredentials::new(cache.clone()));
        (cache, credentials)
    }

    #[test]
    fn set_get_clear() {
        let (_, credentials) = store();
        assert_eq!(credentials.get().unwrap(), None);

        let stored = credentials.set("  ghp_token  ").unwrap();
        assert_eq!(stored.token, "ghp_token");
        assert_eq!(credentials.get().unwrap().as_deref(), Some("ghp_token"));

        credentials.clear().unwrap();
        assert_eq!(credentials.get().unwrap(), None);
    }

    #[test]
    fn set_applies_seven_day_expiry() {
        let (_, credentials) = store();
        let before = Utc::now().timestamp();
        let stored = credentials.set("ghp_token").unwrap();

        let ttl = stored.expires_at - before;
        assert!((7 * 24 * 60 * 60 - 5..=7 * 24 * 60 * 60 + 5).contains(&ttl));
    }

    #[test]
    fn expired_credential_is_cleared_on_read() {
        let (cache, credentials) = store();
        LocalStoreCredentials::new(cache.clone())
            .save(&StoredCredential {
                token: "old".to_string(),
                expires_at: Utc::now().timestamp() - 1,
            })
            .unwrap();

        assert_eq!(credentials.get().unwrap(), None);
        assert_eq!(cache.get(CREDENTIAL_KEY).unwrap(), None);
    }

    #[test]
    fn empty_token_is_rejected() {
        let (_, credentials) = store();
        assert!(matches!(credentials.set("  "), Err(Error::InvalidInput(_))));
    }

    #[test]
    fn corrupt_credential_is_ignored() {
        let (cache, credentials) = store();
        cache.set(CREDENTIAL_KEY, "plain-token-from-old-version").unwrap();
        assert_eq!(credentials.get().unwrap(), None);
    }

    #[test]
    fn parse_accepts_only_the_stored_shape() {
        let parsed = StoredCredential::parse(r#"{"token":"ghp_x","expires_at":42}"#).unwrap();
        assert_eq!(parsed.token, "ghp_x");
        assert_eq!(parsed.expires_at, 42);
        assert!(StoredCredential::parse("ghp_x").is_none());
        assert!(StoredCredential::parse("").is_none());
    }

    #[test]
    fn debug_redacts_token() {
        let credential = StoredCredential {
            token: "ghp_secret".to_string(),
            expires_at: 1,
        };
        let rendered = format!("{credential:?}");
        assert!(!rendered.contains("ghp_secret"));
    }
}
