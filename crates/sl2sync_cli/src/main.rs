//! sl2sync CLI
//!
//! Command-line interface for syncing Dark Souls II saves with cloud storage.
//!
//! # Commands
//!
//! - `sync` - Run a full sync, prompting on divergence
//! - `status` - Show detected installation, save location, and configuration
//! - `preview` - Print the local/cloud comparison without mutating anything
//! - `remote` - Get or set the configured cloud remote

mod commands;

use clap::{Parser, Subcommand};
use sl2sync_core::JsonConfigStore;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Dark Souls II cloud save synchronization.
#[derive(Parser)]
#[command(name = "sl2sync")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the config file
    #[arg(global = true, short, long)]
    config: Option<PathBuf>,

    /// Path to the rclone binary
    #[arg(global = true, long)]
    rclone: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a full sync against the configured remote
    Sync {
        /// Resolve any divergence by keeping this machine's save,
        /// without prompting (for scheduled runs)
        #[arg(long)]
        keep_local: bool,
    },

    /// Show detected installation, save location, and configuration
    Status,

    /// Print the local/cloud save comparison without syncing
    Preview,

    /// Get or set the configured cloud remote
    Remote {
        #[command(subcommand)]
        action: RemoteAction,
    },
}

#[derive(Subcommand)]
enum RemoteAction {
    /// Print the configured remote
    Get,
    /// Set the remote, e.g. `gdrive:ds2cloudsync`
    Set {
        /// Remote location in rclone syntax
        remote: String,
    },
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("sl2sync_core=debug,sl2sync_cli=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(JsonConfigStore::default_path);

    let result = match cli.command {
        Commands::Sync { keep_local } => {
            commands::sync::run(&config_path, cli.rclone.as_deref(), keep_local, cli.verbose)
        }
        Commands::Status => commands::status::run(&config_path),
        Commands::Preview => commands::preview::run(&config_path, cli.rclone.as_deref()),
        Commands::Remote { action } => match action {
            RemoteAction::Get => commands::remote::get(&config_path),
            RemoteAction::Set { remote } => commands::remote::set(&config_path, &remote),
        },
    };

    if let Err(err) = result {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
