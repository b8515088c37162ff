use ideabook_core::cache::{clear_sync_settings, save_sync_settings};
use ideabook_core::config::SyncSettings;
use ideabook_core::IdeaJournal;

use crate::auth::resolve_token;
use crate::commands::common::{Context, Journal};
use crate::error::CliError;

/// Persist the repository settings, then probe the repository.
///
/// The settings are kept even when the probe fails so a later `sync` can
/// retry once the repository or credential is fixed.
pub async fn run_connect(owner: &str, repo: &str, context: &Context) -> Result<(), CliError> {
    let settings = SyncSettings::new(owner, repo)?;
    let store = context.store();
    save_sync_settings(&store, &settings)?;
    println!("Saved repository {}", settings.slug());

    if resolve_token(&context.credentials())?.is_none() {
        println!("Not signed in yet; run `ideabook auth login --token <TOKEN>` to start syncing.");
        return Ok(());
    }

    let Some(client) = context.remote_client()? else {
        return Err(CliError::SyncNotConfigured);
    };
    let journal: Journal = IdeaJournal::new(store);
    let state = journal.connect(client).await;
    println!("Connection: {state}");

    if state.is_connected() {
        Ok(())
    } else {
        Err(CliError::RepositoryUnreachable(settings.slug()))
    }
}

pub fn run_disconnect(context: &Context) -> Result<(), CliError> {
    clear_sync_settings(&context.store())?;
    println!("Repository settings cleared; ideas stay in the local cache.");
    Ok(())
}
