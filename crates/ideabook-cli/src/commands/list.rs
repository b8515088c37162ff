use chrono::Utc;

use crate::commands::common::{entry_to_list_item, format_entry_lines, Context, EntryListItem};
use crate::error::CliError;

pub async fn run_list(as_json: bool, context: &Context) -> Result<(), CliError> {
    let journal = context.open_journal().await?;
    let entries = journal.entries();
    let now = Utc::now();

    if as_json {
        let json_items = entries
            .iter()
            .map(|entry| entry_to_list_item(entry, now))
            .collect::<Vec<EntryListItem>>();
        println!("{}", serde_json::to_string_pretty(&json_items)?);
    } else if entries.is_empty() {
        println!("No ideas yet.");
    } else {
        for line in format_entry_lines(&entries, now) {
            println!("{line}");
        }
    }

    Ok(())
}
