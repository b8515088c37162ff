use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli_config::CredentialBackend;

#[derive(Parser)]
#[command(name = "ideabook")]
#[command(about = "Capture dated ideas and sync them to a GitHub repository")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding the local cache
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,

    /// Quick capture: ideabook "my idea title"
    #[arg(trailing_var_arg = true)]
    pub idea: Vec<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a new idea
    #[command(alias = "new")]
    Add {
        /// Idea title
        title: Vec<String>,
        /// Idea description (read from stdin or $EDITOR when omitted)
        #[arg(short, long, value_name = "TEXT")]
        description: Option<String>,
    },
    /// List ideas
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit an existing idea
    Edit {
        /// Entry ID or unique ID prefix
        id: String,
        /// New title
        #[arg(long, value_name = "TEXT")]
        title: Option<String>,
        /// New description
        #[arg(long, value_name = "TEXT")]
        description: Option<String>,
    },
    /// Delete an idea
    Delete {
        /// Entry ID or unique ID prefix
        id: String,
    },
    /// Push today's ideas to the repository now
    Sync,
    /// Show connection and sync status
    Status {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Connect the journal to a GitHub repository
    Connect {
        /// Repository owner (user or organization)
        #[arg(long, value_name = "OWNER")]
        owner: String,
        /// Repository name
        #[arg(long, value_name = "REPO")]
        repo: String,
    },
    /// Forget the configured repository
    Disconnect,
    /// Manage the GitHub credential
    Auth {
        #[command(subcommand)]
        command: AuthCommands,
    },
    /// Export one day of ideas
    Export {
        /// Day to export (YYYY-MM-DD, UTC); today when omitted
        #[arg(long, value_name = "DAY")]
        day: Option<String>,
        /// Export format
        #[arg(long, value_enum, default_value_t = ExportFormat::Markdown)]
        format: ExportFormat,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
    /// Configure the CLI
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
    /// Generate shell completion scripts
    Completions {
        /// Target shell
        #[arg(value_enum)]
        shell: CompletionShell,
        /// Optional output path (stdout when omitted)
        #[arg(short, long, value_name = "PATH")]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum ExportFormat {
    Json,
    Markdown,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Verify a personal access token and store it
    Login {
        /// GitHub personal access token with contents access
        #[arg(long, value_name = "TOKEN")]
        token: String,
    },
    /// Show which account the credential belongs to
    Status,
    /// Clear the stored credential and repository settings
    Logout,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Create or update the CLI config file
    Init {
        /// GitHub API base URL (GitHub Enterprise: https://HOST/api/v3)
        #[arg(long, value_name = "URL")]
        api_base_url: Option<String>,
        /// Only accept credentials belonging to this GitHub login
        #[arg(long, value_name = "LOGIN")]
        authorized_login: Option<String>,
        /// HTTP request timeout in seconds
        #[arg(long, value_name = "SECS")]
        request_timeout_secs: Option<u64>,
        /// Where the credential is kept
        #[arg(long, value_enum, value_name = "BACKEND")]
        credential_store: Option<CredentialBackend>,
    },
    /// Print the current configuration
    Show,
}
