use ideabook_core::cache::load_sync_settings;
use ideabook_core::state::{ConnectionState, SyncState};
use serde::Serialize;

use crate::auth::resolve_token;
use crate::commands::common::{format_timestamp, Context};
use crate::error::CliError;

#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub connection: ConnectionState,
    pub sync: SyncState,
    pub repository: Option<String>,
    pub credential_source: Option<&'static str>,
    pub last_sync: Option<String>,
    pub entries: usize,
    pub data_dir: String,
}

impl StatusReport {
    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Connection:  {}", self.connection),
            format!("Sync:        {}", self.sync),
            format!(
                "Repository:  {}",
                self.repository.as_deref().unwrap_or("(not configured)")
            ),
            format!(
                "Credential:  {}",
                self.credential_source.unwrap_or("(not signed in)")
            ),
            format!(
                "Last sync:   {}",
                self.last_sync.as_deref().unwrap_or("never")
            ),
            format!("Ideas:       {}", self.entries),
            format!("Data dir:    {}", self.data_dir),
        ]
    }
}

pub async fn run_status(as_json: bool, context: &Context) -> Result<(), CliError> {
    let settings = load_sync_settings(&context.store());
    let credential_source = match resolve_token(&context.credentials()) {
        Ok(token) => token.map(|(_, source)| source.label()),
        Err(error) => {
            tracing::warn!("Credential store unavailable: {}", error);
            None
        }
    };
    let journal = context.open_journal().await?;

    let report = StatusReport {
        connection: journal.connection_state(),
        sync: journal.sync_state(),
        repository: settings.map(|settings| settings.slug()),
        credential_source,
        last_sync: journal.last_sync().map(format_timestamp),
        entries: journal.entries().len(),
        data_dir: context.data_dir.display().to_string(),
    };

    if as_json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for line in report.lines() {
            println!("{line}");
        }
    }
    Ok(())
}
