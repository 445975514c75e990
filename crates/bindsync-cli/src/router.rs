// Command routing and dispatch

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::debug;

use crate::commands::*;
use crate::error::CliResult;

/// bindsync - reconcile local keybindings into a remote database
#[derive(Parser, Debug)]
#[command(name = "bindsync")]
#[command(bin_name = "bindsync")]
#[command(about = "Reconcile local keybindings into a remote database")]
#[command(
    long_about = "bindsync reads keybinding records produced by an editor-side collector,\nmatches them against rows already in the remote database and creates,\nupdates or rebinds only what changed.\n\nQuick start:\n  bindsync whoami              Check the configured token\n  bindsync describe            Check the database properties\n  bindsync plan -i keys.json   Preview without writing\n  bindsync sync -i keys.json   Apply after confirmation"
)]
#[command(version)]
#[command(disable_help_subcommand = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file (default: platform config dir)
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    pub verbose: bool,

    /// Errors only
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Preview the plan without writing to the remote
    #[command(visible_alias = "dry-run")]
    Plan {
        /// Collector output, or `-` for stdin
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Input format (json, jsonl); detected when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,

        /// Include skipped rows in the listing
        #[arg(long)]
        all: bool,
    },

    /// Apply creates, updates and rebinds
    Sync {
        /// Collector output, or `-` for stdin
        #[arg(short, long, value_name = "PATH")]
        input: PathBuf,

        /// Input format (json, jsonl); detected when omitted
        #[arg(short, long)]
        format: Option<String>,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Write identity keys into remote rows that lack one
    Backfill {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show the account behind the configured token
    Whoami,

    /// Check the remote database schema against the property map
    Describe,

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigSubcommand>,
    },
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigSubcommand {
    /// Print the effective configuration (token redacted)
    Show,
    /// Print the configuration file path
    Path,
    /// Validate the configuration
    Check,
}

impl From<&ConfigSubcommand> for ConfigAction {
    fn from(sub: &ConfigSubcommand) -> Self {
        match sub {
            ConfigSubcommand::Show => ConfigAction::Show,
            ConfigSubcommand::Path => ConfigAction::Path,
            ConfigSubcommand::Check => ConfigAction::Check,
        }
    }
}

/// Route and execute commands
pub struct CommandRouter;

impl CommandRouter {
    /// Parse arguments and execute the appropriate command
    pub async fn route() -> CliResult<()> {
        let cli = Cli::parse();

        // Configured level applies only when no flag overrides it
        let configured = load_config(cli.config.as_deref())
            .ok()
            .and_then(|config| config.log_level);
        crate::logging::init_logging(cli.verbose, cli.quiet, configured.as_deref());

        Self::execute(&cli).await
    }

    /// Execute a parsed command line
    pub async fn execute(cli: &Cli) -> CliResult<()> {
        let config = cli.config.clone();
        debug!(command = ?cli.command, "Dispatching");

        match &cli.command {
            Commands::Plan {
                input,
                format,
                json,
                all,
            } => {
                PlanCommand {
                    config,
                    input: input.clone(),
                    format: format.clone(),
                    json: *json,
                    show_skips: *all,
                }
                .execute()
                .await
            }
            Commands::Sync { input, format, yes } => {
                SyncCommand {
                    config,
                    input: input.clone(),
                    format: format.clone(),
                    assume_yes: *yes,
                }
                .execute()
                .await
            }
            Commands::Backfill { yes } => {
                BackfillCommand {
                    config,
                    assume_yes: *yes,
                }
                .execute()
                .await
            }
            Commands::Whoami => WhoamiCommand { config }.execute().await,
            Commands::Describe => DescribeCommand { config }.execute().await,
            Commands::Config { action } => {
                let action = action
                    .as_ref()
                    .map(ConfigAction::from)
                    .unwrap_or(ConfigAction::Show);
                ConfigCommand::new(config, action).execute().await
            }
        }
    }
}
