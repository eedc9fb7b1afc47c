//! fleetctl
//!
//! Command-line client for the fleet management API:
//! 1. Loads config (file, then env overrides)
//! 2. Restores the persisted session from disk
//! 3. Runs one subcommand through the shared API client
//! 4. Prints the result as pretty JSON on stdout

mod commands;
mod config;

use std::sync::Arc;

use anyhow::{Context, Result};
use fleet_auth::TokenStore;
use fleet_client::{ApiClient, SessionState};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::commands::{Command, USAGE};
use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout stays machine-readable.
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_env("LOG_LEVEL")
                .or_else(|_| EnvFilter::try_from_default_env())
                .unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let (config_path, rest) = split_config_flag(&args)?;
    let command = Command::parse(&rest)?;
    if command == Command::Help {
        println!("{USAGE}");
        return Ok(());
    }

    let config = Config::resolve(config_path.as_deref()).context("failed to load configuration")?;
    let session_path = config.session_path();
    debug!(base_url = %config.api.base_url, session = %session_path.display(), "configuration loaded");

    let store = Arc::new(TokenStore::load(session_path).await);
    let client = ApiClient::new(config.client_config(), store)
        .await
        .context("failed to build API client")?;
    let watcher = watch_session(client.subscribe(), command != Command::Logout);

    let result = commands::run(&client, command).await;

    // Dropping the client closes the session channel, which ends the watcher
    // after it has seen every transition.
    drop(client);
    join_watcher(watcher).await;

    if let Err(e) = &result {
        error!(error = %e, "command failed");
    }
    if let Some(output) = result? {
        println!("{}", serde_json::to_string_pretty(&output)?);
    }
    Ok(())
}

/// Extract `--config <path>` from anywhere in the argument list.
fn split_config_flag(args: &[String]) -> Result<(Option<String>, Vec<String>)> {
    let Some(i) = args.iter().position(|a| a == "--config") else {
        return Ok((None, args.to_vec()));
    };
    let path = args
        .get(i + 1)
        .cloned()
        .context("--config requires a path")?;
    let rest = args[..i].iter().chain(&args[i + 2..]).cloned().collect();
    Ok((Some(path), rest))
}

/// Log session transitions. With `hint_on_logout`, losing the session
/// prints a re-login hint on stderr.
fn watch_session(mut rx: watch::Receiver<SessionState>, hint_on_logout: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut previous = *rx.borrow_and_update();
        while rx.changed().await.is_ok() {
            let state = *rx.borrow_and_update();
            info!(from = ?previous, to = ?state, "session state changed");
            if hint_on_logout && state == SessionState::LoggedOut {
                eprintln!("session expired, run `fleetctl login`");
            }
            previous = state;
        }
    })
}

/// Wait for the watcher to drain. Returns false if the task panicked or was
/// cancelled.
async fn join_watcher(watcher: JoinHandle<()>) -> bool {
    match watcher.await {
        Ok(()) => true,
        Err(e) => {
            debug!(error = %e, "session watcher did not finish cleanly");
            false
        }
    }
}
