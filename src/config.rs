use clap::{Parser, ValueEnum};
use std::net::SocketAddr;
use crate::client::DEFAULT_BASE_URL;
use crate::rate_limit::RATE_LIMIT_MS;

// CLI argument structure. The API key is read per call, not parsed here.
#[derive(Parser, Debug, Clone)]
#[command(name = "mcp-alpha-vantage")]
#[command(about = "MCP server exposing Alpha Vantage market data over stdio")]
pub struct Args {
    /// Alpha Vantage query endpoint
    #[arg(long, env = "ALPHA_VANTAGE_BASE_URL", default_value = DEFAULT_BASE_URL)]
    pub base_url: String,

    /// Minimum spacing between upstream calls, in milliseconds
    #[arg(long, env = "ALPHA_VANTAGE_MIN_INTERVAL_MS", default_value_t = RATE_LIMIT_MS)]
    pub min_interval_ms: u64,

    /// Serve /health and /metrics on this address (disabled when unset)
    #[arg(long, env = "ALPHA_VANTAGE_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,

    /// Log output format (logs always go to stderr)
    #[arg(long, env = "ALPHA_VANTAGE_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}
