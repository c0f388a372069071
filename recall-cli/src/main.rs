// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Recall CLI
//!
//! Command-line interface for phrase-keyed profile sync.

mod commands;
mod config;
mod display;

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use tracing_subscriber::EnvFilter;

use config::CliConfig;

#[derive(Parser)]
#[command(name = "recall")]
#[command(author, version, about = "Recall - one profile per recovery phrase, on every device", long_about = None)]
struct Cli {
    /// Data directory (default: platform data dir)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Shared fallback directory (default: <data-dir>/shared)
    #[arg(long, global = true, env = "RECALL_SHARED_DIR")]
    shared_dir: Option<PathBuf>,

    /// Relay server URL
    #[arg(
        long,
        global = true,
        env = "RECALL_RELAY_URL",
        default_value = recall_core::DEFAULT_RELAY_ENDPOINT
    )]
    relay: String,

    /// How long to keep talking to the relay, in milliseconds
    #[arg(long, global = true, env = "RECALL_WAIT_MS", default_value_t = 2000)]
    wait_ms: u64,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Activate a recovery phrase and recover its profile
    Init {
        /// Recovery phrase words
        #[arg(required = true, num_args = 1..)]
        words: Vec<String>,
    },

    /// Forget the remembered phrase (stored profiles are kept)
    Forget,

    /// Print the identity derived from a phrase
    Identity {
        /// Phrase to derive from (default: the remembered phrase)
        #[arg(long)]
        phrase: Option<String>,
    },

    /// Profile management
    #[command(subcommand)]
    Profile(ProfileCommands),

    /// Reconcile the profile with the relay
    Sync,

    /// Check whether the relay persists data
    Probe,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
enum ProfileCommands {
    /// Show the current profile
    Show {
        /// Print the decrypted record as JSON
        #[arg(long)]
        json: bool,
    },

    /// Set an attribute
    Set {
        /// Attribute name
        key: String,
        /// Attribute value (numbers and booleans keep their type)
        value: String,
    },

    /// Remove an attribute
    Unset {
        /// Attribute name
        key: String,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("recall=warn,recall_core=warn")),
        )
        .init();

    let cli = Cli::parse();

    let config = CliConfig {
        data_dir: cli.data_dir.unwrap_or_else(CliConfig::default_data_dir),
        shared_dir: cli.shared_dir,
        relay_url: cli.relay,
        wait: Duration::from_millis(cli.wait_ms),
    };

    match cli.command {
        Commands::Init { words } => commands::init::run(&config, &words.join(" "))?,
        Commands::Forget => commands::init::forget(&config)?,
        Commands::Identity { phrase } => commands::identity::show(&config, phrase.as_deref())?,
        Commands::Profile(cmd) => match cmd {
            ProfileCommands::Show { json } => commands::profile::show(&config, json)?,
            ProfileCommands::Set { key, value } => commands::profile::set(&config, &key, &value)?,
            ProfileCommands::Unset { key } => commands::profile::unset(&config, &key)?,
        },
        Commands::Sync => commands::sync::run(&config)?,
        Commands::Probe => commands::probe::run(&config)?,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "recall", &mut io::stdout());
        }
    }

    Ok(())
}
