use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] ideabook_core::Error),
    #[error(transparent)]
    Remote(#[from] ideabook_core::remote::RemoteError),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("No idea title provided")]
    EmptyTitle,
    #[error("No idea description provided")]
    EmptyDescription,
    #[error("Entry ID cannot be empty")]
    EmptyEntryId,
    #[error("Invalid day '{0}', expected YYYY-MM-DD")]
    InvalidDay(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error("Not signed in. Run `ideabook auth login --token <TOKEN>` or set GITHUB_TOKEN.")]
    NotSignedIn,
    #[error("Account '{actual}' is not authorized; this journal belongs to '{expected}'")]
    UnauthorizedAccount { expected: String, actual: String },
    #[error(
        "Sync is not configured. Run `ideabook connect --owner <OWNER> --repo <REPO>` after `ideabook auth login`."
    )]
    SyncNotConfigured,
    #[error("Repository {0} is not reachable with the current credential")]
    RepositoryUnreachable(String),
    #[error("Sync failed; local changes are kept and will be pushed on the next save")]
    SyncFailed,
}
