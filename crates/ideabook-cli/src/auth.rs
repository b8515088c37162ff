//! GitHub credential persistence for the CLI.
//!
//! The credential lives in the data directory by default, or in the OS
//! keychain when the config selects it. Either way the expiry policy comes
//! from [`CredentialStore`].

use std::path::Path;

use ideabook_core::cache::FileStore;
use ideabook_core::credentials::{
    CredentialPersistence, CredentialStore, LocalStoreCredentials, StoredCredential,
};
use ideabook_core::util::normalize_text_option;
use ideabook_core::{Error, Result};
use keyring::Entry;

use crate::cli_config::{CliConfig, CredentialBackend};

/// Environment variable that overrides the stored credential.
pub const TOKEN_ENV: &str = "GITHUB_TOKEN";

const KEYRING_SERVICE_NAME: &str = "ideabook-cli";
const KEYRING_USERNAME: &str = "github_token";

#[derive(Debug, Clone)]
pub struct KeychainCredentials {
    service: String,
    username: String,
}

impl KeychainCredentials {
    pub fn new() -> Self {
        Self::with_service(KEYRING_SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            username: KEYRING_USERNAME.to_string(),
        }
    }

    fn entry(&self) -> Result<Entry> {
        Entry::new(&self.service, &self.username).map_err(keychain_error)
    }
}

impl Default for KeychainCredentials {
    fn default() -> Self {
        Self::new()
    }
}

fn keychain_error(error: keyring::Error) -> Error {
    Error::Credential(error.to_string())
}

impl CredentialPersistence for KeychainCredentials {
    fn load(&self) -> Result<Option<StoredCredential>> {
        match self.entry()?.get_password() {
            Ok(raw) => Ok(StoredCredential::parse(&raw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(error) => Err(keychain_error(error)),
        }
    }

    fn save(&self, credential: &StoredCredential) -> Result<()> {
        let raw = serde_json::to_string(credential)?;
        self.entry()?.set_password(&raw).map_err(keychain_error)?;

        // Read back through a fresh handle: a keychain without a persistent
        // backend accepts the write and forgets it.
        match self.entry()?.get_password() {
            Ok(stored) if stored == raw => Ok(()),
            Ok(_) | Err(keyring::Error::NoEntry) => Err(Error::Credential(
                "The OS keychain did not keep the credential; run \
                 `ideabook config init --credential-store file` to store it in the data directory"
                    .to_string(),
            )),
            Err(error) => Err(keychain_error(error)),
        }
    }

    fn clear(&self) -> Result<()> {
        match self.entry()?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(error) => Err(keychain_error(error)),
        }
    }
}

/// Backend selected by [`CliConfig::credential_store`].
#[derive(Debug, Clone)]
pub enum CliCredentials {
    Keychain(KeychainCredentials),
    File(LocalStoreCredentials<FileStore>),
}

impl CredentialPersistence for CliCredentials {
    fn load(&self) -> Result<Option<StoredCredential>> {
        match self {
            Self::Keychain(backend) => backend.load(),
            Self::File(backend) => backend.load(),
        }
    }

    fn save(&self, credential: &StoredCredential) -> Result<()> {
        match self {
            Self::Keychain(backend) => backend.save(credential),
            Self::File(backend) => backend.save(credential),
        }
    }

    fn clear(&self) -> Result<()> {
        match self {
            Self::Keychain(backend) => backend.clear(),
            Self::File(backend) => backend.clear(),
        }
    }
}

pub fn credential_store(config: &CliConfig, data_dir: &Path) -> CredentialStore<CliCredentials> {
    let backend = match config.credential_store {
        CredentialBackend::Keychain => CliCredentials::Keychain(KeychainCredentials::new()),
        CredentialBackend::File => {
            CliCredentials::File(LocalStoreCredentials::new(FileStore::new(data_dir)))
        }
    };
    CredentialStore::new(backend)
}

/// Where the active credential came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenSource {
    Environment,
    Stored,
}

impl TokenSource {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Environment => TOKEN_ENV,
            Self::Stored => "credential store",
        }
    }
}

/// Active credential: `GITHUB_TOKEN` first, then the store.
pub fn resolve_token(
    store: &CredentialStore<CliCredentials>,
) -> Result<Option<(String, TokenSource)>> {
    pick_token(normalize_text_option(std::env::var(TOKEN_ENV).ok()), store)
}

fn pick_token<P: CredentialPersistence>(
    env_token: Option<String>,
    store: &CredentialStore<P>,
) -> Result<Option<(String, TokenSource)>> {
    if let Some(token) = env_token {
        return Ok(Some((token, TokenSource::Environment)));
    }
    Ok(store.get()?.map(|token| (token, TokenSource::Stored)))
}

#[cfg(test)]
mod tests {
    use std::sync::Once;

    use ideabook_core::cache::MemoryStore;
    use pretty_assertions::assert_eq;

    use super::*;

    /// Route every `keyring::Entry` in this test binary to the mock backend,
    /// which forgets a value as soon as its entry is dropped.
    fn use_mock_keychain() {
        static MOCK: Once = Once::new();
        MOCK.call_once(|| {
            keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        });
    }

    #[test]
    fn keychain_that_forgets_is_rejected_on_save() {
        use_mock_keychain();
        let store = CredentialStore::new(KeychainCredentials::with_service("ideabook-cli-test"));

        match store.set("ghp_keychain") {
            Err(Error::Credential(message)) => assert!(message.contains("did not keep")),
            other => panic!("unexpected result: {other:?}"),
        }
        assert_eq!(store.get().unwrap(), None);
        store.clear().unwrap();
    }

    #[test]
    fn default_backend_survives_a_new_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig::default();
        assert_eq!(config.credential_store, CredentialBackend::File);

        credential_store(&config, dir.path())
            .set("ghp_default")
            .unwrap();

        // A later command builds its own store from scratch.
        let later = credential_store(&config, dir.path());
        assert_eq!(later.get().unwrap().as_deref(), Some("ghp_default"));
    }

    #[test]
    fn file_backend_writes_into_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = CliConfig {
            credential_store: CredentialBackend::File,
            ..CliConfig::default()
        };

        let store = credential_store(&config, dir.path());
        store.set("ghp_file").unwrap();
        assert!(dir.path().join("github_token.json").exists());
        assert_eq!(store.get().unwrap().as_deref(), Some("ghp_file"));
    }

    #[test]
    fn environment_token_wins_over_stored() {
        let store = CredentialStore::new(LocalStoreCredentials::new(MemoryStore::new()));
        store.set("ghp_stored").unwrap();

        assert_eq!(
            pick_token(Some("ghp_env".to_string()), &store).unwrap(),
            Some(("ghp_env".to_string(), TokenSource::Environment))
        );
        assert_eq!(
            pick_token(None, &store).unwrap(),
            Some(("ghp_stored".to_string(), TokenSource::Stored))
        );

        store.clear().unwrap();
        assert_eq!(pick_token(None, &store).unwrap(), None);
    }
}
