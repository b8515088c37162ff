//! Local cache.
//!
//! A small string key/value store holding the full entry list, the
//! repository settings and (for the local credential backend) the bearer
//! token. Values are JSON documents.

mod file_store;
mod memory_store;

use crate::config::SyncSettings;
use crate::models::Entry;
use crate::Result;

pub use file_store::FileStore;
pub use memory_store::MemoryStore;

/// Key holding the JSON array of every entry.
pub const IDEAS_KEY: &str = "ideas";
/// Key holding `{owner, repo}`.
pub const SYNC_CONFIG_KEY: &str = "github_sync_config";
/// Key holding the stored credential.
pub const CREDENTIAL_KEY: &str = "github_token";

/// Trait for key/value cache backends
pub trait LocalStore: Send + Sync {
    /// Raw value for `key`, `None` when unset
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Replace the value for `key`
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`; removing a missing key is not an error
    fn remove(&self, key: &str) -> Result<()>;
}

/// Every cached entry.
///
/// Unreadable or corrupt data is logged and treated as an empty cache.
pub fn load_entries<L: LocalStore + ?Sized>(store: &L) -> Vec<Entry> {
    let raw = match store.get(IDEAS_KEY) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(error) => {
            tracing::warn!("Failed to read cached entries: {}", error);
            return Vec::new();
        }
    };

    serde_json::from_str(&raw).unwrap_or_else(|error| {
        tracing::warn!("Ignoring corrupt cached entries: {}", error);
        Vec::new()
    })
}

/// Overwrite the cached entry list.
pub fn save_entries<L: LocalStore + ?Sized>(store: &L, entries: &[Entry]) -> Result<()> {
    let serialized = serde_json::to_string(entries)?;
    store.set(IDEAS_KEY, &serialized)
}

/// Persisted repository settings, if any.
pub fn load_sync_settings<L: LocalStore + ?Sized>(store: &L) -> Option<SyncSettings> {
    let raw = match store.get(SYNC_CONFIG_KEY) {
        Ok(raw) => raw?,
        Err(error) => {
            tracing::warn!("Failed to read sync settings: {}", error);
            return None;
        }
    };

    match serde_json::from_str::<SyncSettings>(&raw) {
        Ok(settings) => SyncSettings::new(settings.owner, settings.repo).ok(),
        Err(error) => {
            tracing::warn!("Ignoring corrupt sync settings: {}", error);
            None
        }
    }
}

pub fn save_sync_settings<L: LocalStore + ?Sized>(store: &L, settings: &SyncSettings) -> Result<()> {
    let serialized = serde_json::to_string(settings)?;
    store.set(SYNC_CONFIG_KEY, &serialized)
}

pub fn clear_sync_settings<L: LocalStore + ?Sized>(store: &L) -> Result<()> {
    store.remove(SYNC_CONFIG_KEY)
}
