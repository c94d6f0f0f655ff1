//! Usertable - edit a remote user table from the terminal.
//!
//! Loads the user list once, then reads commands line by line. Saves show up
//! immediately; store responses are printed as they come back.

mod commands;
mod render;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::Command;
use usertable_core::{ApiClient, Config, InMemoryStore, RemoteStore, SyncController, TableView};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling input lines (in milliseconds)
const INPUT_POLL_TIMEOUT_MS: u64 = 100;

/// Buffer size for the input line channel
const INPUT_BUFFER_SIZE: usize = 16;

/// Initialize the tracing subscriber for logging
fn init_tracing() {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn build_store(config: &Config, demo: bool) -> Result<Arc<dyn RemoteStore>> {
    if demo {
        info!("Using in-memory demo store");
        return Ok(Arc::new(InMemoryStore::seeded()));
    }

    let mut client = ApiClient::new(config.api_base_url(), config.request_timeout())
        .context("Failed to create API client")?;
    if let Some(ref token) = config.api_token {
        client.set_token(token.clone());
    }
    info!(url = client.base_url(), "Using user service");
    Ok(Arc::new(client))
}

/// Forward stdin lines to the main loop
fn spawn_input_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(INPUT_BUFFER_SIZE);
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if tx.send(line).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    error!(error = %e, "Failed to read input");
                    break;
                }
            }
        }
    });
    rx
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let args: Vec<String> = std::env::args().collect();
    if args.iter().any(|a| a == "--help" || a == "-h") {
        println!("usage: usertable [--demo]\n\n{}", commands::HELP);
        return Ok(());
    }
    let demo = args.iter().any(|a| a == "--demo");

    init_tracing();
    info!("Usertable starting");

    let config = Config::load()?;
    let store = build_store(&config, demo)?;

    let mut sync = SyncController::new(store, config.rollback_policy);
    sync.load_from_remote()
        .await
        .context("Failed to load users")?;

    let mut view = TableView::new(sync, config.page_size());
    print!("{}", render::table(&view));

    run(&mut view).await;

    // Let outstanding requests finish so their results are not lost
    for report in view.sync_mut().settle().await {
        println!("{}", render::report(&report));
    }

    info!("Usertable shutting down");
    Ok(())
}

async fn run(view: &mut TableView) {
    let mut input = spawn_input_reader();

    loop {
        match tokio::time::timeout(Duration::from_millis(INPUT_POLL_TIMEOUT_MS), input.recv()).await {
            Ok(Some(line)) => match Command::parse(&line) {
                Ok(command) => {
                    if !commands::execute(view, command) {
                        break;
                    }
                }
                Err(e) => println!("{}", e),
            },
            // stdin closed
            Ok(None) => break,
            Err(_) => {}
        }

        let reports = view.sync_mut().process_completions();
        if !reports.is_empty() {
            for report in &reports {
                println!("{}", render::report(report));
            }
            print!("{}", render::table(view));
        }
    }
}
