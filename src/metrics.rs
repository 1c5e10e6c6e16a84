use lazy_static::lazy_static;
use prometheus::{Counter, Histogram, register_counter, register_histogram};


lazy_static! {
    pub static ref TOOL_CALLS: Counter =
        register_counter!("alpha_vantage_tool_calls_total", "Total number of tool invocations")
            .expect("tool call counter registers");
    pub static ref UPSTREAM_REQUESTS: Counter = register_counter!(
        "alpha_vantage_upstream_requests_total",
        "Requests issued to Alpha Vantage"
    )
    .expect("upstream request counter registers");
    pub static ref UPSTREAM_FAILURES: Counter = register_counter!(
        "alpha_vantage_upstream_failures_total",
        "Upstream requests that ended in a non-2xx status or transport error"
    )
    .expect("upstream failure counter registers");
    pub static ref TOOL_LATENCY: Histogram = register_histogram!(
        "alpha_vantage_tool_latency_seconds",
        "Tool latency in seconds, rate gate wait included"
    )
    .expect("tool latency histogram registers");
    pub static ref RATE_GATE_WAIT: Histogram = register_histogram!(
        "alpha_vantage_rate_gate_wait_seconds",
        "Time callers spent suspended at the rate gate",
        vec![0.0, 1.0, 2.5, 5.0, 10.0, 12.5, 25.0, 50.0, 100.0]
    )
    .expect("rate gate histogram registers");
}
