use crate::commands::common::{
    capture_editor_input_with_initial, normalize_content, normalize_entry_identifier, Context,
};
use crate::error::CliError;

/// Without `--title` or `--description` the description opens in `$EDITOR`.
pub async fn run_edit(
    id: &str,
    title: Option<&str>,
    description: Option<&str>,
    context: &Context,
) -> Result<(), CliError> {
    let normalized_id = normalize_entry_identifier(id)?;
    let journal = context.open_journal().await?;
    let entry = journal.find(&normalized_id)?;

    let new_title = match title {
        Some(title) => normalize_content(title).ok_or(CliError::EmptyTitle)?,
        None => entry.title.clone(),
    };
    let new_description = match (title, description) {
        (_, Some(description)) => {
            normalize_content(description).ok_or(CliError::EmptyDescription)?
        }
        (Some(_), None) => entry.description.clone(),
        (None, None) => capture_editor_input_with_initial(&entry.description)?
            .ok_or(CliError::EmptyDescription)?,
    };

    if new_title == entry.title && new_description == entry.description {
        println!("{}", entry.id);
        return Ok(());
    }

    let updated = journal
        .update(&entry.id, &new_title, &new_description)
        .await?;
    println!("{}", updated.id);
    Ok(())
}
