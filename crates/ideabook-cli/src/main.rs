//! Ideabook CLI - capture dated ideas from the terminal
//!
//! Ideas land in a local cache and, once a repository is connected, in one
//! Markdown file per day on GitHub.

mod auth;
mod cli;
mod cli_config;
mod commands;
mod error;

use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};
use crate::commands::add::run_add;
use crate::commands::auth_cmd::run_auth;
use crate::commands::common::Context;
use crate::commands::completions::run_completions;
use crate::commands::config::run_config;
use crate::commands::connect::{run_connect, run_disconnect};
use crate::commands::delete::run_delete;
use crate::commands::edit::run_edit;
use crate::commands::export::run_export;
use crate::commands::list::run_list;
use crate::commands::status::run_status;
use crate::commands::sync::run_sync;
use crate::error::CliError;

const DEFAULT_LOG_FILTER: &str = "ideabook=info,ideabook_core=info";

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("Error: {error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), CliError> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Some(Commands::Completions { shell, output }) = &cli.command {
        return run_completions(*shell, output.as_deref());
    }

    let context = Context::load(cli.data_dir)?;

    match cli.command {
        Some(Commands::Add { title, description }) => {
            run_add(&title, description.as_deref(), &context).await?;
        }
        Some(Commands::List { json }) => run_list(json, &context).await?,
        Some(Commands::Edit {
            id,
            title,
            description,
        }) => run_edit(&id, title.as_deref(), description.as_deref(), &context).await?,
        Some(Commands::Delete { id }) => run_delete(&id, &context).await?,
        Some(Commands::Sync) => run_sync(&context).await?,
        Some(Commands::Status { json }) => run_status(json, &context).await?,
        Some(Commands::Connect { owner, repo }) => run_connect(&owner, &repo, &context).await?,
        Some(Commands::Disconnect) => run_disconnect(&context)?,
        Some(Commands::Auth { command }) => run_auth(command, &context).await?,
        Some(Commands::Export {
            day,
            format,
            output,
        }) => run_export(day.as_deref(), format, output.as_deref(), &context).await?,
        Some(Commands::Config { command }) => run_config(command, &context)?,
        Some(Commands::Completions { .. }) => {}
        None => {
            // Quick capture mode: ideabook "my idea"
            if cli.idea.is_empty() {
                Cli::command().print_help().map_err(CliError::Io)?;
                println!();
            } else {
                run_add(&cli.idea, None, &context).await?;
            }
        }
    }

    Ok(())
}
