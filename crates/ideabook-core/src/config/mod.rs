//! Connection configuration.
//!
//! [`SyncSettings`] is the part the user picks once and that is persisted in
//! the local cache (`owner`/`repo`). [`SyncConfig`] adds the bearer
//! credential and is what a connection is built from; it does not change for
//! the lifetime of that connection.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::util::normalize_text_option;
use crate::{Error, Result};

/// Repository coordinates persisted under the `github_sync_config` key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSettings {
    pub owner: String,
    pub repo: String,
}

impl SyncSettings {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>) -> Result<Self> {
        Ok(Self {
            owner: normalize_coordinate(owner.into(), "owner")?,
            repo: normalize_coordinate(repo.into(), "repo")?,
        })
    }

    /// `owner/repo`
    #[must_use]
    pub fn slug(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

/// Everything needed to talk to the remote repository.
#[derive(Clone, PartialEq, Eq)]
pub struct SyncConfig {
    settings: SyncSettings,
    credential: String,
}

impl SyncConfig {
    pub fn new(
        owner: impl Into<String>,
        repo: impl Into<String>,
        credential: impl Into<String>,
    ) -> Result<Self> {
        Self::from_settings(SyncSettings::new(owner, repo)?, credential)
    }

    pub fn from_settings(settings: SyncSettings, credential: impl Into<String>) -> Result<Self> {
        let credential = normalize_text_option(Some(credential.into()))
            .ok_or_else(|| Error::InvalidInput("Credential must not be empty".to_string()))?;
        let settings = SyncSettings::new(settings.owner, settings.repo)?;
        Ok(Self {
            settings,
            credential,
        })
    }

    #[must_use]
    pub fn owner(&self) -> &str {
        &self.settings.owner
    }

    #[must_use]
    pub fn repo(&self) -> &str {
        &self.settings.repo
    }

    #[must_use]
    pub fn credential(&self) -> &str {
        &self.credential
    }

    #[must_use]
    pub const fn settings(&self) -> &SyncSettings {
        &self.settings
    }
}

impl fmt::Debug for SyncConfig {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("SyncConfig")
            .field("owner", &self.settings.owner)
            .field("repo", &self.settings.repo)
            .field("credential", &"[REDACTED]")
            .finish()
    }
}

fn normalize_coordinate(raw: String, field: &str) -> Result<String> {
    let value = normalize_text_option(Some(raw))
        .ok_or_else(|| Error::InvalidInput(format!("Repository {field} must not be empty")))?;
    if value.contains('/') || value.chars().any(char::is_whitespace) {
        return Err(Error::InvalidInput(format!(
            "Repository {field} '{value}' must not contain '/' or whitespace"
        )));
    }
    Ok(value)
}
