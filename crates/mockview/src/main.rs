// SPDX-FileCopyrightText: 2026 Mockview Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mockview - an AI mock-interview service.
//!
//! This is the binary entry point.

mod serve;
mod shutdown;

use std::path::PathBuf;

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use clap::{Parser, Subcommand};
use mockview_config::{ConfigError, MockviewConfig};

/// Mockview - an AI mock-interview service.
#[derive(Parser, Debug)]
#[command(name = "mockview", version, about, long_about = None)]
struct Cli {
    /// Load configuration from this file instead of the standard locations.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the HTTP/WebSocket server (default).
    Serve,
    /// Inspect configuration.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Validate configuration and report every problem.
    Check,
    /// Print the effective configuration as TOML, secrets redacted.
    Show,
}

fn load(path: Option<&std::path::Path>) -> Result<MockviewConfig, Vec<ConfigError>> {
    match path {
        Some(path) => mockview_config::load_and_validate_path(path),
        None => mockview_config::load_and_validate(),
    }
}

/// Copy of `config` that is safe to print.
fn redacted(config: &MockviewConfig) -> MockviewConfig {
    let mut shown = config.clone();
    if shown.openai.api_key.is_some() {
        shown.openai.api_key = Some("[redacted]".to_string());
    }
    shown
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(errors) => {
            mockview_config::render_errors(&errors);
            std::process::exit(1);
        }
    };

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("error: {e}");
                std::process::exit(1);
            }
        }
        Commands::Config {
            action: ConfigAction::Check,
        } => {
            println!(
                "mockview: config OK (server={}:{}, chat_model={}, questions={})",
                config.server.host,
                config.server.port,
                config.openai.chat_model,
                config.interview.max_questions
            );
        }
        Commands::Config {
            action: ConfigAction::Show,
        } => match toml::to_string_pretty(&redacted(&config)) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("error: failed to render config: {e}");
                std::process::exit(1);
            }
        },
    }
}
