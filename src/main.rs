//! flight-notify - stands in for the host application.
//!
//! Loads the settings file, activates the engine and feeds it host events read
//! as JSON lines from stdin until EOF or Ctrl-C.

use anyhow::Result;
use clap::Parser;
use flight_notify::{
    app::App,
    cli::Cli,
    config::PluginSettings,
    core::HostEvent,
    host::Subscriptions,
    relay::DebugRelay,
    task_manager::TaskManager,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load settings by layering sources: defaults, file, environment, and CLI args.
    let settings = PluginSettings::load(&cli);

    let log_level = settings
        .as_ref()
        .map(|s| s.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .init();

    if let Err(e) = &settings {
        error!("Failed to load settings: {}", e);
    }

    info!("flight-notify starting up...");

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut subscriptions = Subscriptions::new();
    let mut app = match App::builder()
        .settings_result(settings)
        .relay(Box::new(DebugRelay::new()))
        .task_manager(TaskManager::new(shutdown_rx))
        .activate(&mut subscriptions)
    {
        Ok(app) => app,
        Err(e) => {
            error!("Activation failed: {}", e);
            std::process::exit(1);
        }
    };

    let kinds: Vec<String> = subscriptions.kinds().map(|k| k.to_string()).collect();
    info!("Subscribed to: {}", kinds.join(", "));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received. Abandoning outstanding sends...");
                let _ = shutdown_tx.send(true);
                break;
            }
            line = lines.next_line() => {
                let line = match line {
                    Ok(Some(line)) => line,
                    Ok(None) => {
                        info!("Event stream closed. Waiting for outstanding sends...");
                        break;
                    }
                    Err(e) => {
                        error!("Failed to read host event: {}", e);
                        break;
                    }
                };
                if line.trim().is_empty() {
                    continue;
                }
                match serde_json::from_str::<HostEvent>(&line) {
                    Ok(event) if subscriptions.accepts(&event) => app.handle(event),
                    Ok(event) => debug!(kind = %event.kind(), "No handler subscribed, dropping event."),
                    Err(e) => warn!("Ignoring malformed host event: {}", e),
                }
            }
        }
    }

    app.shutdown().await;
    info!("Exiting.");
    Ok(())
}
