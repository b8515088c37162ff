use std::env;
use std::io::{self, IsTerminal, Read};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::{SystemTime, UNIX_EPOCH};

use chrono::{DateTime, NaiveDate, Utc};
use ideabook_core::cache::{self, FileStore};
use ideabook_core::config::SyncConfig;
use ideabook_core::credentials::CredentialStore;
use ideabook_core::remote::GitHubClient;
use ideabook_core::{Entry, IdeaJournal};
use serde::Serialize;

use crate::auth::{credential_store, resolve_token, CliCredentials};
use crate::cli_config::CliConfig;
use crate::error::CliError;

/// Environment override for the data directory.
pub const DATA_DIR_ENV: &str = "IDEABOOK_DATA_DIR";

pub type Journal = IdeaJournal<GitHubClient, FileStore>;

/// Resolved locations and settings shared by every command.
#[derive(Debug, Clone)]
pub struct Context {
    pub data_dir: PathBuf,
    pub config: CliConfig,
}

impl Context {
    pub fn load(cli_data_dir: Option<PathBuf>) -> Result<Self, CliError> {
        Ok(Self {
            data_dir: resolve_data_dir(cli_data_dir)?,
            config: CliConfig::load().map_err(CliError::Config)?,
        })
    }

    pub fn store(&self) -> FileStore {
        FileStore::new(&self.data_dir)
    }

    pub fn credentials(&self) -> CredentialStore<CliCredentials> {
        credential_store(&self.config, &self.data_dir)
    }

    /// Client for the configured repository, when both the repository and a
    /// credential are available.
    ///
    /// An unreadable credential store is logged and treated as signed out,
    /// so local edits still go through.
    pub fn remote_client(&self) -> Result<Option<GitHubClient>, CliError> {
        let Some(settings) = cache::load_sync_settings(&self.store()) else {
            return Ok(None);
        };
        let token = match resolve_token(&self.credentials()) {
            Ok(Some((token, _))) => token,
            Ok(None) => {
                tracing::warn!(
                    "Repository {} is configured but no credential is available",
                    settings.slug()
                );
                return Ok(None);
            }
            Err(error) => {
                tracing::warn!(
                    "Credential store unavailable, working from the local cache: {}",
                    error
                );
                return Ok(None);
            }
        };

        let config = SyncConfig::from_settings(settings, token)?;
        Ok(Some(GitHubClient::new(&config, &self.config.client_options())?))
    }

    /// Journal over the local cache, connected when possible, already loaded.
    pub async fn open_journal(&self) -> Result<Journal, CliError> {
        let journal = IdeaJournal::new(self.store());
        if let Some(client) = self.remote_client()? {
            if !journal.connect(client).await.is_connected() {
                tracing::warn!("Working from the local cache only");
            }
        }
        journal.load().await;
        Ok(journal)
    }
}

#[derive(Debug, Serialize)]
pub struct EntryListItem {
    pub id: String,
    pub title: String,
    pub description: String,
    pub created_at: String,
    pub day: String,
    pub relative_time: String,
}

pub fn entry_to_list_item(entry: &Entry, now: DateTime<Utc>) -> EntryListItem {
    EntryListItem {
        id: entry.id.to_string(),
        title: entry.title.clone(),
        description: entry.description.clone(),
        created_at: entry.created_at.to_rfc3339(),
        day: entry.day().to_string(),
        relative_time: format_relative_time(
            entry.created_at.timestamp_millis(),
            now.timestamp_millis(),
        ),
    }
}

pub fn format_entry_lines(entries: &[Entry], now: DateTime<Utc>) -> Vec<String> {
    entries
        .iter()
        .map(|entry| {
            let short_id = entry.id.short();
            let title = truncate_preview(&entry.title, 30);
            let description = truncate_preview(&entry.description_preview(200), 40);
            let relative_time = format_relative_time(
                entry.created_at.timestamp_millis(),
                now.timestamp_millis(),
            );
            format!("{short_id:<13}  {title:<30}  {description:<40}  {relative_time}")
        })
        .collect()
}

/// First line, whitespace collapsed, cut to `max_chars` with an ellipsis.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let first_line = text.lines().next().unwrap_or("").trim();
    let collapsed = first_line.split_whitespace().collect::<Vec<_>>().join(" ");

    if collapsed.chars().count() <= max_chars {
        collapsed
    } else {
        let take_len = max_chars.saturating_sub(3);
        let mut truncated = collapsed.chars().take(take_len).collect::<String>();
        truncated.push_str("...");
        truncated
    }
}

pub fn format_timestamp(value: DateTime<Utc>) -> String {
    value.format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

pub fn format_relative_time(timestamp_ms: i64, now_ms: i64) -> String {
    let diff = now_ms.saturating_sub(timestamp_ms);
    let minute = 60_000;
    let hour = 60 * minute;
    let day = 24 * hour;
    let week = 7 * day;

    if diff < minute {
        "just now".to_string()
    } else if diff < hour {
        format!("{}m ago", diff / minute)
    } else if diff < day {
        format!("{}h ago", diff / hour)
    } else if diff < week {
        format!("{}d ago", diff / day)
    } else {
        format!("{}w ago", diff / week)
    }
}

pub fn resolve_title(title_parts: &[String]) -> Result<String, CliError> {
    normalize_content(&title_parts.join(" ")).ok_or(CliError::EmptyTitle)
}

/// Description from the flag, then piped stdin, then `$EDITOR`.
pub fn resolve_description(flag: Option<&str>) -> Result<String, CliError> {
    if let Some(description) = flag.and_then(normalize_content) {
        return Ok(description);
    }

    if let Some(description) = read_piped_stdin()? {
        return Ok(description);
    }

    if let Some(description) = capture_editor_input_with_initial("")? {
        return Ok(description);
    }

    Err(CliError::EmptyDescription)
}

pub fn normalize_content(content: &str) -> Option<String> {
    let trimmed = content.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn normalize_entry_identifier(id: &str) -> Result<String, CliError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        Err(CliError::EmptyEntryId)
    } else {
        Ok(trimmed.to_string())
    }
}

/// `YYYY-MM-DD`, or `today` when omitted.
pub fn parse_day(raw: Option<&str>, today: NaiveDate) -> Result<NaiveDate, CliError> {
    let Some(raw) = raw.map(str::trim).filter(|value| !value.is_empty()) else {
        return Ok(today);
    };
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| CliError::InvalidDay(raw.to_string()))
}

pub fn read_piped_stdin() -> Result<Option<String>, CliError> {
    let stdin = io::stdin();
    if stdin.is_terminal() {
        return Ok(None);
    }

    let mut buffer = String::new();
    stdin.lock().read_to_string(&mut buffer)?;
    Ok(normalize_content(&buffer))
}

pub fn capture_editor_input_with_initial(
    initial_content: &str,
) -> Result<Option<String>, CliError> {
    let editor = preferred_editor();
    let temp_file = create_temp_idea_file_path();
    std::fs::write(&temp_file, initial_content)?;

    let launch_result = launch_editor(&editor, &temp_file);
    let content = std::fs::read_to_string(&temp_file)?;
    let _ = std::fs::remove_file(&temp_file);

    launch_result?;
    Ok(normalize_content(&content))
}

pub fn launch_editor(editor: &str, file_path: &Path) -> Result<(), CliError> {
    match Command::new(editor).arg(file_path).status() {
        Ok(status) => {
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            // EDITOR may carry arguments, e.g. "code --wait".
            let mut parts = editor.split_whitespace();
            let Some(program) = parts.next() else {
                return Err(CliError::EditorFailed("empty EDITOR command".into()));
            };

            let mut command = Command::new(program);
            command.args(parts).arg(file_path);

            let status = command.status()?;
            if status.success() {
                Ok(())
            } else {
                Err(CliError::EditorFailed(format!(
                    "`{editor}` exited with status {status}"
                )))
            }
        }
        Err(err) => Err(CliError::Io(err)),
    }
}

pub fn preferred_editor() -> String {
    env::var("VISUAL")
        .or_else(|_| env::var("EDITOR"))
        .unwrap_or_else(|_| default_editor().to_string())
}

pub const fn default_editor() -> &'static str {
    if cfg!(windows) {
        "notepad"
    } else {
        "vi"
    }
}

pub fn create_temp_idea_file_path() -> PathBuf {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |duration| duration.as_nanos());
    env::temp_dir().join(format!("ideabook-idea-{}-{now}.md", std::process::id()))
}

/// `--data-dir`, then `IDEABOOK_DATA_DIR`, then the platform data directory.
pub fn resolve_data_dir(cli_data_dir: Option<PathBuf>) -> Result<PathBuf, CliError> {
    if let Some(dir) = cli_data_dir.or_else(|| env::var_os(DATA_DIR_ENV).map(PathBuf::from)) {
        return Ok(dir);
    }
    default_data_dir()
}

pub fn default_data_dir() -> Result<PathBuf, CliError> {
    dirs::data_dir()
        .map(|dir| dir.join("ideabook"))
        .ok_or_else(|| CliError::Config("Failed to resolve CLI data directory".to_string()))
}
