use std::path::Path;

use chrono::{NaiveDate, Utc};
use ideabook_core::codec::{decode, encode, entries_for_day};
use ideabook_core::remote::RemoteStore;
use ideabook_core::{cache, Entry};

use crate::cli::ExportFormat;
use crate::commands::common::{parse_day, Context};
use crate::error::CliError;

pub async fn run_export(
    day: Option<&str>,
    format: ExportFormat,
    output_path: Option<&Path>,
    context: &Context,
) -> Result<(), CliError> {
    let day = parse_day(day, Utc::now().date_naive())?;
    let entries = day_entries(day, context).await?;
    let rendered = render_export(&entries, day, format)?;

    if let Some(path) = output_path {
        std::fs::write(path, rendered)?;
        println!("{}", path.display());
    } else {
        print!("{rendered}");
    }

    Ok(())
}

pub fn render_export(
    entries: &[Entry],
    day: NaiveDate,
    format: ExportFormat,
) -> Result<String, CliError> {
    Ok(match format {
        ExportFormat::Markdown => encode(entries, day),
        ExportFormat::Json => format!("{}\n", serde_json::to_string_pretty(entries)?),
    })
}

/// The repository's document for `day` when reachable, else the cached
/// entries of that day.
async fn day_entries(day: NaiveDate, context: &Context) -> Result<Vec<Entry>, CliError> {
    if let Some(client) = context.remote_client()? {
        match client.fetch_document(day).await {
            Ok(Some(document)) => return Ok(decode(&document)),
            Ok(None) => tracing::debug!("No remote document for {}", day),
            Err(error) => tracing::warn!("Remote read failed, exporting from cache: {}", error),
        }
    }

    let cached = cache::load_entries(&context.store());
    Ok(entries_for_day(&cached, day))
}
