use anyhow::{Context, Result};
use chrono::Utc;
use hostwatch_collector::system::{host_name, SystemSource};
use hostwatch_common::types::EventSource;
use std::net::SocketAddr;
use std::path::PathBuf;
use tokio::signal;
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

use hostwatch_server::app;
use hostwatch_server::config::ServerConfig;
use hostwatch_server::sampler::Sampler;
use hostwatch_server::state::AppState;

const DEFAULT_CONFIG_PATH: &str = "config/hostwatch.toml";

#[allow(clippy::print_stderr)]
fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  hostwatch [config.toml]    Start sampling and serve the API (default: {DEFAULT_CONFIG_PATH})");
    eprintln!("  hostwatch --help           Show this message");
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("hostwatch=info".parse()?))
        .init();

    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        Some("--help" | "-h") => {
            print_usage();
            Ok(())
        }
        Some(path) => run_server(PathBuf::from(path)).await,
        None => run_server(PathBuf::from(DEFAULT_CONFIG_PATH)).await,
    }
}

async fn run_server(config_path: PathBuf) -> Result<()> {
    let config = ServerConfig::load_or_default(&config_path)?;
    let rules_config = config.rules_config();

    tracing::info!(
        http_port = config.http_port,
        interval_ms = config.sampler.interval_ms,
        history_capacity = config.sampler.history_capacity,
        event_capacity = config.events.capacity,
        config = %config_path.display(),
        "hostwatch starting"
    );

    let source = EventSource {
        service: config.service_name.clone(),
        host: host_name(),
        pid: std::process::id(),
    };
    let state = AppState::new(config.clone(), Some(config_path), source);
    let rule_count = hostwatch_server::query::rules(&state).len();
    tracing::info!(
        rule_count,
        rule_source = rule_source_name(&rules_config),
        "Alert rules active"
    );

    // Sampler task
    let mut sampler = Sampler::new(
        Box::new(SystemSource::new(&config.disk_path)),
        state.clone(),
        config.sampler.interval(),
    );
    sampler.prime(Utc::now());
    let (stop_tx, stop_rx) = watch::channel(false);
    let sampler_handle = tokio::spawn(sampler.run(stop_rx));

    // HTTP server
    let http_addr: SocketAddr = format!("0.0.0.0:{}", config.http_port).parse()?;
    let http_listener = tokio::net::TcpListener::bind(http_addr)
        .await
        .with_context(|| format!("Failed to bind {http_addr}"))?;
    let http_app = app::build_http_app(state);

    tracing::info!(http = %http_addr, "Server started");

    let served = axum::serve(http_listener, http_app)
        .with_graceful_shutdown(async {
            signal::ctrl_c().await.ok();
            tracing::info!("Shutting down gracefully");
        })
        .await;
    if let Err(e) = &served {
        tracing::error!(error = %e, "HTTP server error");
    }

    let _ = stop_tx.send(true);
    if let Err(e) = sampler_handle.await {
        tracing::error!(error = %e, "Sampler task failed");
    }
    tracing::info!("Server stopped");

    served.map_err(Into::into)
}

fn rule_source_name(config: &hostwatch_alert::RulesConfig) -> &'static str {
    match config.source() {
        hostwatch_alert::RuleSource::RuleList(_) => "rules",
        hostwatch_alert::RuleSource::LegacyThresholds(_) => "thresholds",
        hostwatch_alert::RuleSource::Empty => "none",
    }
}
