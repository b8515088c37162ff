use ideabook_core::util::normalize_text_option;

use crate::cli::ConfigCommands;
use crate::cli_config::{default_config_path, normalize_api_base_url, CliConfig, CredentialBackend};
use crate::commands::common::Context;
use crate::error::CliError;

pub fn run_config(command: ConfigCommands, context: &Context) -> Result<(), CliError> {
    match command {
        ConfigCommands::Init {
            api_base_url,
            authorized_login,
            request_timeout_secs,
            credential_store,
        } => run_config_init(
            api_base_url,
            authorized_login,
            request_timeout_secs,
            credential_store,
        ),
        ConfigCommands::Show => run_config_show(context),
    }
}

pub fn run_config_init(
    api_base_url: Option<String>,
    authorized_login: Option<String>,
    request_timeout_secs: Option<u64>,
    credential_store: Option<CredentialBackend>,
) -> Result<(), CliError> {
    let mut config = CliConfig::load().map_err(CliError::Config)?;
    apply_config_init(
        &mut config,
        api_base_url,
        authorized_login,
        request_timeout_secs,
        credential_store,
    )?;

    let path = config.save().map_err(CliError::Config)?;
    println!("Config written to {}", path.display());
    if config.authorized_login().is_none() {
        println!("Any GitHub account may sign in; set --authorized-login to restrict it.");
    }
    Ok(())
}

/// Merge explicit `config init` values into `config`; omitted values keep
/// their current setting.
pub fn apply_config_init(
    config: &mut CliConfig,
    api_base_url: Option<String>,
    authorized_login: Option<String>,
    request_timeout_secs: Option<u64>,
    credential_store: Option<CredentialBackend>,
) -> Result<(), CliError> {
    if let Some(url) = api_base_url {
        config.api_base_url = Some(normalize_api_base_url(url).map_err(CliError::Config)?);
    }
    if let Some(login) = authorized_login {
        config.authorized_login = normalize_text_option(Some(login));
    }
    if let Some(secs) = request_timeout_secs {
        if secs == 0 {
            return Err(CliError::Config(
                "request_timeout_secs must be greater than zero".to_string(),
            ));
        }
        config.request_timeout_secs = Some(secs);
    }
    if let Some(backend) = credential_store {
        config.credential_store = backend;
    }
    Ok(())
}

fn run_config_show(context: &Context) -> Result<(), CliError> {
    let path = default_config_path().map_err(CliError::Config)?;
    println!("# {}", path.display());
    println!("{}", serde_json::to_string_pretty(&context.config)?);
    println!("# effective API base URL: {}", context.config.resolved_api_base_url());
    println!("# data dir: {}", context.data_dir.display());
    Ok(())
}
