use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo};
use rmcp::{ErrorData as McpError, ServerHandler, tool, tool_handler, tool_router};
use serde_json::Value;
use std::future::Future;
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use crate::client::AlphaVantageClient;
use crate::metrics::{TOOL_CALLS, TOOL_LATENCY};
use crate::models::{CryptoArgs, DailyArgs, EarningsArgs, ForexArgs, QuoteArgs, SearchArgs};

pub const SERVER_NAME: &str = "mcp-alpha-vantage";

// Tool surface exposed to the host. Each tool is a thin wrapper over one client call.
#[derive(Clone)]
pub struct AlphaVantageServer {
    client: Arc<AlphaVantageClient>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl AlphaVantageServer {
    pub fn new(client: Arc<AlphaVantageClient>) -> Self {
        Self {
            client,
            tool_router: Self::tool_router(),
        }
    }

    #[tool(description = "Get real-time stock quote.")]
    async fn get_quote(
        &self,
        Parameters(args): Parameters<QuoteArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(run_tool("get_quote", self.client.quote(&args.symbol)).await)
    }

    #[tool(description = "Get daily historical prices.")]
    async fn get_daily(
        &self,
        Parameters(args): Parameters<DailyArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(run_tool("get_daily", self.client.daily(&args.symbol, args.outputsize)).await)
    }

    #[tool(description = "Search for ticker symbols.")]
    async fn search_symbol(
        &self,
        Parameters(args): Parameters<SearchArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(run_tool("search_symbol", self.client.search_symbol(&args.keywords)).await)
    }

    #[tool(description = "Get foreign exchange rate.")]
    async fn get_forex(
        &self,
        Parameters(args): Parameters<ForexArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(run_tool(
            "get_forex",
            self.client.forex_rate(&args.from_currency, &args.to_currency),
        )
        .await)
    }

    #[tool(description = "Get daily crypto prices.")]
    async fn get_crypto(
        &self,
        Parameters(args): Parameters<CryptoArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(run_tool("get_crypto", self.client.crypto_daily(&args.symbol, &args.market)).await)
    }

    #[tool(description = "Get company earnings data.")]
    async fn get_earnings(
        &self,
        Parameters(args): Parameters<EarningsArgs>,
    ) -> std::result::Result<CallToolResult, McpError> {
        Ok(run_tool("get_earnings", self.client.earnings(&args.symbol)).await)
    }
}

#[tool_handler(router = self.tool_router)]
impl ServerHandler for AlphaVantageServer {
    fn get_info(&self) -> ServerInfo {
        let mut server_info = Implementation::from_build_env();
        server_info.name = SERVER_NAME.to_string();
        server_info.version = env!("CARGO_PKG_VERSION").to_string();

        let mut info = ServerInfo::default();
        info.capabilities = ServerCapabilities::builder().enable_tools().build();
        info.server_info = server_info;
        info.instructions = Some(
            "Alpha Vantage market data. Upstream calls are spaced out to respect the API quota, \
             so back-to-back tool calls may take several seconds each."
                .to_string(),
        );
        info
    }
}

// Every failure becomes a tool-level error result, never a protocol error
async fn run_tool<F>(tool: &'static str, call: F) -> CallToolResult
where
    // Full path: a bare `Result` alias in scope breaks the rmcp macro expansions
    F: Future<Output = crate::error::Result<Value>>,
{
    TOOL_CALLS.inc();
    let start_time = Instant::now();

    let outcome = call.await;
    TOOL_LATENCY.observe(start_time.elapsed().as_secs_f64());

    match outcome {
        Ok(body) => {
            info!(tool, elapsed_ms = start_time.elapsed().as_millis() as u64, "tool call completed");
            let text = serde_json::to_string_pretty(&body).unwrap_or_else(|_| body.to_string());
            CallToolResult::success(vec![Content::text(text)])
        }
        Err(e) => {
            warn!(tool, error = %e, "tool call failed");
            CallToolResult::error(vec![Content::text(e.to_string())])
        }
    }
}
