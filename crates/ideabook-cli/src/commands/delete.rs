use crate::commands::common::{normalize_entry_identifier, Context};
use crate::error::CliError;

pub async fn run_delete(id: &str, context: &Context) -> Result<(), CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let journal = context.open_journal().await?;
    let entry = journal.find(&normalized_id)?;

    if journal.delete(&entry.id).await? {
        println!("{}", entry.id);
    } else {
        println!("Delete of {} is already in progress", entry.id);
    }
    Ok(())
}
