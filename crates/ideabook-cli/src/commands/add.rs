use crate::commands::common::{resolve_description, resolve_title, Context};
use crate::error::CliError;

pub async fn run_add(
    title_parts: &[String],
    description: Option<&str>,
    context: &Context,
) -> Result<(), CliError> {
    let title = resolve_title(title_parts)?;
    let description = resolve_description(description)?;

    let journal = context.open_journal().await?;
    let entry = journal.create(&title, &description).await?;

    println!("{}", entry.id);
    Ok(())
}
