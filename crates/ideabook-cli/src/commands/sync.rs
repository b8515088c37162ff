use chrono::Utc;
use ideabook_core::cache::load_sync_settings;
use ideabook_core::codec::entries_for_day;
use ideabook_core::state::SyncState;

use crate::auth::resolve_token;
use crate::commands::common::Context;
use crate::error::CliError;

pub async fn run_sync(context: &Context) -> Result<(), CliError> {
    let settings = load_sync_settings(&context.store()).ok_or(CliError::SyncNotConfigured)?;
    if resolve_token(&context.credentials())?.is_none() {
        return Err(CliError::NotSignedIn);
    }

    let journal = context.open_journal().await?;
    if !journal.connection_state().is_connected() {
        return Err(CliError::RepositoryUnreachable(settings.slug()));
    }

    if journal.sync_now().await == SyncState::Error {
        return Err(CliError::SyncFailed);
    }

    let pushed = entries_for_day(&journal.entries(), Utc::now().date_naive()).len();
    println!("Synced {pushed} idea(s) for today to {}", settings.slug());
    Ok(())
}
