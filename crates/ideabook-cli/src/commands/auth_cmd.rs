use chrono::DateTime;
use ideabook_core::cache::clear_sync_settings;
use ideabook_core::remote::{GitHubClient, RemoteUser};

use crate::auth::{resolve_token, TokenSource};
use crate::cli::AuthCommands;
use crate::cli_config::CliConfig;
use crate::commands::common::{format_timestamp, Context};
use crate::error::CliError;

pub async fn run_auth(command: AuthCommands, context: &Context) -> Result<(), CliError> {
    match command {
        AuthCommands::Login { token } => {
            let user = verify_token(&token, &context.config).await?;
            let stored = context.credentials().set(&token)?;
            println!(
                "Signed in as {} ({}); credential expires {}",
                user.display_name(),
                user.login,
                format_expiry(stored.expires_at)
            );
            Ok(())
        }
        AuthCommands::Status => {
            let credentials = context.credentials();
            let Some((token, source)) = resolve_token(&credentials)? else {
                println!("Not signed in.");
                return Ok(());
            };

            let expiry = match source {
                TokenSource::Environment => "never (from environment)".to_string(),
                TokenSource::Stored => credentials
                    .stored()?
                    .map_or_else(|| "unknown".to_string(), |stored| format_expiry(stored.expires_at)),
            };

            match GitHubClient::verify_credential(&token, &context.config.client_options()).await {
                Ok(user) => println!(
                    "Signed in as {} ({}) via {}; expires {}",
                    user.display_name(),
                    user.login,
                    source.label(),
                    expiry
                ),
                Err(error) => {
                    tracing::warn!("Credential check failed: {}", error);
                    println!(
                        "A credential is set via {} but GitHub rejected it: {error}",
                        source.label()
                    );
                }
            }
            Ok(())
        }
        AuthCommands::Logout => {
            context.credentials().clear()?;
            clear_sync_settings(&context.store())?;
            println!("Signed out; credential and repository settings cleared.");
            Ok(())
        }
    }
}

/// Look up the account behind `token` and enforce `authorized_login`.
async fn verify_token(token: &str, config: &CliConfig) -> Result<RemoteUser, CliError> {
    let user = GitHubClient::verify_credential(token, &config.client_options())
        .await
        .map_err(|error| CliError::Auth(error.to_string()))?;
    check_authorized_login(&user, config.authorized_login().as_deref())?;
    Ok(user)
}

pub fn check_authorized_login(user: &RemoteUser, expected: Option<&str>) -> Result<(), CliError> {
    match expected {
        Some(expected) if !expected.eq_ignore_ascii_case(&user.login) => {
            Err(CliError::UnauthorizedAccount {
                expected: expected.to_string(),
                actual: user.login.clone(),
            })
        }
        _ => Ok(()),
    }
}

fn format_expiry(expires_at: i64) -> String {
    DateTime::from_timestamp(expires_at, 0)
        .map_or_else(|| expires_at.to_string(), format_timestamp)
}
