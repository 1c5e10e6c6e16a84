mod client;
mod config;
mod error;
mod handlers;
mod metrics;
mod models;
mod rate_limit;
mod server;

use anyhow::Context;
use axum::{Router, routing::get};
use clap::Parser;
use rmcp::ServiceExt;
use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::client::{AlphaVantageClient, ApiKey};
use crate::config::{Args, LogFormat};
use crate::handlers::{health_handler, metrics_handler};
use crate::rate_limit::RateGate;
use crate::server::AlphaVantageServer;

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.log_format);

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "Fatal");
            ExitCode::FAILURE
        }
    }
}

// stdout carries the MCP transport, so every log line goes to stderr
fn init_tracing(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("alpha_vantage_mcp=info"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(log_layer(format, std::io::stderr))
        .init();
}

fn log_layer<S, W>(format: LogFormat, writer: W) -> Box<dyn Layer<S> + Send + Sync>
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    W: for<'a> fmt::MakeWriter<'a> + Send + Sync + 'static,
{
    match format {
        LogFormat::Json => fmt::layer().json().with_writer(writer).boxed(),
        LogFormat::Pretty => fmt::layer()
            .pretty()
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    }
}

async fn run(args: Args) -> anyhow::Result<()> {
    let base_url = reqwest::Url::parse(&args.base_url)
        .with_context(|| format!("invalid base url {}", args.base_url))?;

    let api_key = ApiKey::from_env();
    if let Err(e) = api_key.resolve() {
        warn!("{e}; tools will fail until it is set");
    }

    let gate = Arc::new(RateGate::new(Duration::from_millis(args.min_interval_ms)));
    let min_interval = gate.interval();
    let client = AlphaVantageClient::new(reqwest::Client::new(), base_url, api_key, gate);

    if let Some(addr) = args.metrics_addr {
        spawn_metrics_server(addr).await?;
    }

    info!(
        upstream = %args.base_url,
        ?min_interval,
        "Serving Alpha Vantage tools over stdio"
    );

    let service = AlphaVantageServer::new(Arc::new(client))
        .serve(rmcp::transport::stdio())
        .await
        .context("failed to start MCP stdio transport")?;

    let reason = service.waiting().await.context("MCP service task failed")?;
    info!(?reason, "Host disconnected, shutting down");
    Ok(())
}

// Bind eagerly so a bad address fails startup, then serve in the background
async fn spawn_metrics_server(addr: SocketAddr) -> anyhow::Result<()> {
    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind metrics endpoint on {addr}"))?;
    info!("Metrics endpoint on http://{}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            error!(error = %e, "metrics endpoint stopped");
        }
    });
    Ok(())
}
