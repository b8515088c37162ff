//! Remote document store.
//!
//! [`RemoteStore`] exposes the raw file operations of a repository content
//! API. The day-document operations used by the journal are provided on top
//! of them, so every backend gets the same version-token handling.

mod github;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::codec::document_path;

pub use github::{GitHubClient, GitHubClientOptions, DEFAULT_API_BASE_URL};

/// Attempts made by [`RemoteStore::write_document`] before a version
/// conflict is reported.
pub const MAX_WRITE_ATTEMPTS: usize = 3;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("Invalid remote configuration: {0}")]
    InvalidConfiguration(String),
    #[error("Remote HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Remote API error: {message} ({status})")]
    Api { status: u16, message: String },
    #[error("Version conflict while writing {path}")]
    Conflict { path: String },
    #[error("Invalid remote payload: {0}")]
    InvalidPayload(String),
}

impl RemoteError {
    /// HTTP status behind the error, when there is one.
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::Conflict { .. } => Some(409),
            Self::Http(error) => error.status().map(|status| status.as_u16()),
            Self::InvalidConfiguration(_) | Self::InvalidPayload(_) => None,
        }
    }
}

pub type RemoteResult<T> = Result<T, RemoteError>;

/// A file read from the remote store, already decoded to text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFile {
    pub content: String,
    /// Version token (content hash) of the stored blob.
    pub sha: String,
}

/// Location and current version token of a day document.
///
/// Fetched right before a write and dropped afterwards. A missing token means
/// the file does not exist yet and the write creates it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteFileHandle {
    pub path: String,
    pub version_token: Option<String>,
}

/// Account that owns the credential.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl RemoteUser {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(&self.login)
    }
}

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Read a file. `Ok(None)` when the path does not exist.
    async fn get_file(&self, path: &str) -> RemoteResult<Option<RemoteFile>>;

    /// Version token of a file without its content. `Ok(None)` when the
    /// path does not exist.
    ///
    /// Backends that can describe a file they cannot decode (oversized or
    /// binary blobs) should override this, so such a file can still be
    /// replaced.
    async fn get_file_sha(&self, path: &str) -> RemoteResult<Option<String>> {
        Ok(self.get_file(path).await?.map(|file| file.sha))
    }

    /// Create or update a file and return the new version token.
    ///
    /// `sha` must be the current token when the file exists; a stale or
    /// missing token is rejected with [`RemoteError::Conflict`].
    async fn put_file(
        &self,
        path: &str,
        content: &str,
        message: &str,
        sha: Option<&str>,
    ) -> RemoteResult<String>;

    /// Whether the configured repository is reachable. Any failure is `false`.
    async fn repository_exists(&self) -> bool;

    /// Identity of the configured credential.
    async fn authenticated_user(&self) -> RemoteResult<RemoteUser>;

    /// Text of the document for `day`, or `None` when it does not exist.
    async fn fetch_document(&self, day: NaiveDate) -> RemoteResult<Option<String>> {
        let file = self.get_file(&document_path(day)).await?;
        Ok(file.map(|file| file.content))
    }

    /// Current version token of the document for `day`.
    async fn fetch_handle(&self, day: NaiveDate) -> RemoteResult<RemoteFileHandle> {
        let path = document_path(day);
        let version_token = self.get_file_sha(&path).await?;
        Ok(RemoteFileHandle {
            path,
            version_token,
        })
    }

    /// Replace the document for `day` with `content`.
    ///
    /// Reads the current version token, then writes with it. Reading and
    /// writing are separate requests, so another writer can slip in between;
    /// on a version conflict the token is read again and the write re-applied,
    /// up to [`MAX_WRITE_ATTEMPTS`] times.
    async fn write_document(
        &self,
        day: NaiveDate,
        content: &str,
        message: &str,
    ) -> RemoteResult<String> {
        let mut attempt = 1;
        loop {
            let handle = self.fetch_handle(day).await?;
            let result = self
                .put_file(
                    &handle.path,
                    content,
                    message,
                    handle.version_token.as_deref(),
                )
                .await;

            match result {
                Err(RemoteError::Conflict { path }) if attempt < MAX_WRITE_ATTEMPTS => {
                    tracing::warn!(
                        "Version conflict writing {} (attempt {}/{}); refreshing token",
                        path,
                        attempt,
                        MAX_WRITE_ATTEMPTS
                    );
                    attempt += 1;
                }
                result => return result,
            }
        }
    }
}
