//! Hex Publisher CLI
//!
//! JSON front end for the Hex plugin: requests come in on stdin (or a file),
//! responses go out on stdout. Logs go to stderr (`RUST_LOG=debug`).

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use hex_publisher::{ExecuteRequest, HexPlugin, Plugin, RawConfig};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Publish Elixir packages to Hex.pm from a release pipeline
#[derive(Parser)]
#[command(name = "hex-publisher")]
#[command(version)]
#[command(about = "Publish Elixir packages to Hex.pm from a release pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print plugin metadata and configuration schema
    Info,

    /// Validate a plugin configuration object
    Validate {
        /// JSON file with the configuration (defaults to stdin)
        #[arg(short, long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Run the plugin for one lifecycle hook
    Execute {
        /// JSON file with the execute request (defaults to stdin)
        #[arg(short, long, value_name = "FILE")]
        request: Option<PathBuf>,

        /// Cancel the publish after this many seconds
        #[arg(long, value_name = "SECS")]
        timeout: Option<u64>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .target(env_logger::Target::Stderr)
        .init();

    match run().await {
        Ok(exit_code) => process::exit(exit_code),
        Err(e) => {
            eprintln!("error: {:#}", e);
            process::exit(2);
        }
    }
}

async fn run() -> Result<i32> {
    let cli = Cli::parse();
    let plugin = HexPlugin::new();

    match cli.command {
        Commands::Info => {
            println!("{}", serde_json::to_string_pretty(&plugin.info())?);
            Ok(0)
        }
        Commands::Validate { config } => {
            let input = read_input(config.as_deref())?;
            let config: RawConfig =
                serde_json::from_str(&input).context("configuration must be a JSON object")?;

            let response = plugin.validate(&config).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.valid { 0 } else { 1 })
        }
        Commands::Execute { request, timeout } => {
            let input = read_input(request.as_deref())?;
            let request: ExecuteRequest =
                serde_json::from_str(&input).context("invalid execute request")?;

            let cancel = CancellationToken::new();
            spawn_cancel_triggers(&cancel, timeout.map(Duration::from_secs));

            let response = plugin.execute(&cancel, request).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            Ok(if response.success { 0 } else { 1 })
        }
    }
}

/// Read from `path`, or stdin when no path is given
fn read_input(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Cancel on Ctrl-C, and after `timeout` when one is set
fn spawn_cancel_triggers(cancel: &CancellationToken, timeout: Option<Duration>) {
    let on_signal = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            log::warn!("interrupted, cancelling publish");
            on_signal.cancel();
        }
    });

    if let Some(timeout) = timeout {
        let on_timeout = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            log::warn!("timed out after {:?}, cancelling publish", timeout);
            on_timeout.cancel();
        });
    }
}
