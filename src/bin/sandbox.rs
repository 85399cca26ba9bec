//! Headless sandbox runner
//!
//! Seeds the board with any prompts given on the command line, then lets
//! auto-play run for a while and logs the resulting board.
//!
//! Usage:
//!   GEMINI_API_KEY=... ./mugen-sandbox [prompt ...]
//!
//! Environment variables:
//!   - GEMINI_API_KEY: Gemini API key (overrides the config file)
//!   - MUGEN_CONFIG: Config file path (default: ~/.mugen/config.yaml)
//!   - MUGEN_RUN_SECS: How long auto-play runs (default: 30)
//!   - RUST_LOG: Log filter (default: info)

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use mugen_lib::config;
use mugen_lib::events::EventBus;
use mugen_lib::gemini::GeminiClient;
use mugen_lib::{AutoPlayer, Sandbox, Selection};

const DEFAULT_RUN_SECS: u64 = 30;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let config = match config::load_config() {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    let client = match GeminiClient::new(config.gemini.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!("Failed to create Gemini client: {}", e);
            std::process::exit(1);
        }
    };

    if config.connections.has_api_key() {
        let reply = client
            .check_connection(&config.connections.gemini_api_key)
            .await;
        info!("Connection check: {}", reply);
    } else {
        warn!("No Gemini API key configured; every generation will fail");
    }

    let bus = EventBus::new();
    let sandbox = Arc::new(Sandbox::from_config(&config, Arc::new(client), bus.clone()));
    let selection = Arc::new(Selection::new(sandbox.clone()));
    let listener = selection.clone().listen();

    for prompt in std::env::args().skip(1) {
        match sandbox.submit_prompt(&prompt).await {
            Ok(Some(id)) => info!("Created card {} from '{}'", id, prompt),
            Ok(None) => {}
            Err(e) => warn!("Failed to create '{}': {}", prompt, e),
        }
    }

    let run_secs: u64 = std::env::var("MUGEN_RUN_SECS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(DEFAULT_RUN_SECS);

    let player = Arc::new(AutoPlayer::new(sandbox.clone(), config.auto.clone(), bus));
    let handle = player.start();
    player.set_enabled(true);
    info!("Auto-play running for {}s", run_secs);

    tokio::select! {
        _ = tokio::time::sleep(Duration::from_secs(run_secs)) => {}
        _ = tokio::signal::ctrl_c() => info!("Interrupted"),
    }

    player.set_enabled(false);
    info!("Waiting for {} in-flight actions", player.in_flight());
    player.drain().await;
    handle.abort();
    listener.abort();

    info!("Board has {} cards", sandbox.len());
    for label in sandbox.labels() {
        info!("  {}", label);
    }
}
