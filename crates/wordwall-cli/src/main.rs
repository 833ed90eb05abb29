//! Word Wall CLI
//!
//! Command-line interface for the word wall - kiosk display and entry management.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;
mod tui;

use output::{Output, OutputFormat};

#[derive(Parser)]
#[command(name = "wordwall")]
#[command(about = "Word Wall - a live wall of short texts for events and installations")]
#[command(version)]
#[command(propagate_version = true)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Quiet mode - minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Use this config file instead of the default
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the wall display (default)
    Display {
        /// Hide the status footer
        #[arg(long)]
        presentation: bool,
    },
    /// Submit a new entry
    Add {
        /// Entry text (multiple words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        content: Vec<String>,
    },
    /// List entries in wall order
    #[command(alias = "ls")]
    List,
    /// Show or set configuration
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
enum ConfigCommands {
    /// Show current configuration
    Show,
    /// Set a configuration value
    Set {
        /// Configuration key (url, token, collection, log_file, animation.<name>_ms)
        key: String,
        /// Configuration value ("none" clears optional keys)
        value: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let output = Output::new(OutputFormat::from_flags(cli.json, cli.quiet));
    let config_path = cli.config.as_ref();

    let command = cli.command.unwrap_or(Commands::Display {
        presentation: false,
    });

    // The display owns the terminal and logs to a file instead
    if !matches!(command, Commands::Display { .. }) {
        init_cli_logging();
    }

    match command {
        Commands::Display { presentation } => tui::run(config_path, presentation).await,
        Commands::Add { content } => {
            commands::entry::add(content.join(" "), config_path, &output).await
        }
        Commands::List => commands::entry::list(config_path, &output).await,
        Commands::Config { command } => handle_config_command(command, config_path, &output),
    }
}

fn handle_config_command(
    command: Option<ConfigCommands>,
    config_path: Option<&PathBuf>,
    output: &Output,
) -> Result<()> {
    match command {
        Some(ConfigCommands::Show) | None => commands::config::show(config_path, output),
        Some(ConfigCommands::Set { key, value }) => {
            commands::config::set(key, value, config_path, output)
        }
    }
}

/// Log to stderr, filtered by RUST_LOG (errors only by default)
fn init_cli_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
