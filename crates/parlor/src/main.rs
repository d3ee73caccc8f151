//! Main application entry point for the Parlor session server.
//!
//! Wires the dispatch core to the WebSocket gateway: configuration loading,
//! logging setup, dependency construction, and graceful shutdown.

mod cli;
mod config;
mod signals;

use anyhow::{Context, Result};
use cli::CliArgs;
use config::{AppConfig, LoggingSettings};
use session_core::providers::{SystemClock, ThreadRandom, UuidIds};
use session_core::{EngineRegistry, GameService, MemorySessionStore, NullSink};
use session_gateway::{BearerAuth, ConnectionAuth, GatewayServer, OpenAuth};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize the logging system.
fn setup_logging(config: &LoggingSettings) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.level.as_str()));

    let registry = tracing_subscriber::registry().with(filter);

    if config.json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_ansi(true)
                    .with_file(false)
                    .with_line_number(false)
                    .with_thread_ids(true)
                    .with_thread_names(true),
            )
            .init();
    }

    info!("🔧 Logging initialized with level: {}", config.level);
    Ok(())
}

/// Builds the dispatch core with its production providers.
fn build_service() -> Arc<GameService> {
    let clock = Arc::new(SystemClock);
    let engines = Arc::new(EngineRegistry::new(clock.clone(), Arc::new(ThreadRandom)));
    Arc::new(GameService::new(
        Arc::new(MemorySessionStore::new()),
        Arc::new(NullSink),
        clock,
        Arc::new(UuidIds),
        engines,
    ))
}

fn build_auth(config: &AppConfig) -> Arc<dyn ConnectionAuth> {
    match &config.auth.bearer_token {
        Some(token) => {
            info!("🔐 Bearer token authentication enabled");
            Arc::new(BearerAuth::new(token.clone()))
        }
        None => {
            info!("🔓 Open access (no bearer token configured)");
            Arc::new(OpenAuth)
        }
    }
}

async fn run(args: CliArgs) -> Result<()> {
    let mut config = AppConfig::load_from_file(&args.config_path)
        .await
        .context("loading configuration")?;

    // Apply CLI overrides.
    if let Some(bind_address) = args.bind_address {
        config.server.bind_address = bind_address;
    }
    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }
    if args.json_logs {
        config.logging.json_format = true;
    }
    if let Some(token) = args.auth_token {
        config.auth.bearer_token = Some(token);
    }

    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Configuration validation failed: {e}"))?;

    setup_logging(&config.logging)?;

    info!("🚀 Parlor Session Server v{}", env!("CARGO_PKG_VERSION"));
    info!("📋 Configuration Summary:");
    info!("  🌐 Bind address: {}", config.server.bind_address);
    info!("  👥 Max connections: {}", config.server.max_connections);
    info!("  💓 Ping interval: {}ms", config.server.ping_interval_ms);
    info!("  ⏱️ Read deadline: {}ms", config.server.read_timeout_ms);
    info!("  📂 Config: {}", args.config_path.display());

    let service = build_service();
    let auth = build_auth(&config);
    let gateway_config = config.to_gateway_config()?;

    let server = GatewayServer::new(gateway_config, service, auth);
    let shutdown = server.shutdown_handle();

    let server_handle = tokio::spawn(async move {
        match server.run().await {
            Ok(()) => info!("✅ Gateway completed successfully"),
            Err(e) => {
                error!("❌ Gateway error: {e}");
                std::process::exit(1);
            }
        }
    });

    info!("✅ Parlor is now running!");
    info!("🛑 Press Ctrl+C to gracefully shutdown");

    signals::wait_for_shutdown().await?;

    info!("🛑 Shutdown signal received, initiating graceful shutdown...");
    let _ = shutdown.send(());

    // Give in-flight connections a moment to see the close.
    tokio::time::sleep(tokio::time::Duration::from_secs(1)).await;
    server_handle.abort();

    info!("✅ Parlor shutdown complete");
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    if let Err(e) = run(args).await {
        eprintln!("❌ Failed to start Parlor: {e:?}");
        std::process::exit(1);
    }

    Ok(())
}
