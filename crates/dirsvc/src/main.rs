// SPDX-FileCopyrightText: 2026 Dirsvc Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! dirsvc - pluggable directory service.
//!
//! This is the binary entry point for the directory service daemon.

mod inspect;
mod serve;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dirsvc_config::DirsvcConfig;
use dirsvc_core::DirError;

/// dirsvc - pluggable directory service.
#[derive(Parser, Debug)]
#[command(name = "dirsvc", version, about, long_about = None)]
struct Cli {
    /// Load this configuration file instead of searching the default locations.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Boot every plugin and serve until interrupted.
    Serve,
    /// Boot the service and print the nodes matching a lookup.
    Nodes {
        /// Pattern compared against node paths (ignored by selector modes).
        #[arg(long, default_value = "/")]
        pattern: String,
        /// Match mode, e.g. `starts-with`, `contains-ignore-case`, `local-node`.
        #[arg(long, default_value = "starts-with")]
        mode: String,
        /// Result capacity.
        #[arg(long, default_value_t = 256)]
        capacity: usize,
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Boot the service and print the plugin table.
    Plugins {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration.
    Config,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let loaded = match &cli.config {
        Some(path) => dirsvc_config::load_and_validate_path(path),
        None => dirsvc_config::load_and_validate(),
    };
    let config = match loaded {
        Ok(config) => config,
        Err(errors) => {
            dirsvc_config::render_errors(&errors);
            std::process::exit(1);
        }
    };
    init_tracing(&config.service.log_level);

    let result = match cli.command {
        Some(Commands::Serve) => serve::run_serve(config).await,
        Some(Commands::Nodes {
            pattern,
            mode,
            capacity,
            json,
        }) => inspect::run_nodes(&config, &pattern, &mode, capacity, json).await,
        Some(Commands::Plugins { json }) => inspect::run_plugins(&config, json).await,
        Some(Commands::Config) => print_config(&config),
        None => {
            println!("dirsvc: use --help for available commands");
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("dirsvc: {e}");
        std::process::exit(1);
    }
}

fn print_config(config: &DirsvcConfig) -> Result<(), DirError> {
    let rendered = toml::to_string_pretty(config)
        .map_err(|e| DirError::Internal(format!("failed to render config: {e}")))?;
    print!("{rendered}");
    Ok(())
}

/// Initialize the tracing subscriber. `RUST_LOG` overrides the configured level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "dirsvc={log_level},dirsvc_plugin={log_level},dirsvc_registry={log_level},warn"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .with_writer(std::io::stderr)
        .init();
}
