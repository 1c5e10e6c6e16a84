use reqwest::Url;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use crate::error::{AlphaVantageError, Result};
use crate::metrics::{UPSTREAM_FAILURES, UPSTREAM_REQUESTS};
use crate::models::{OutputSize, UpstreamFunction};
use crate::rate_limit::RateGate;

pub const DEFAULT_BASE_URL: &str = "https://www.alphavantage.co/query";
pub const API_KEY_ENV: &str = "ALPHA_VANTAGE_API_KEY";

// Where the API key comes from. `Env` is read on every call, not cached.
#[derive(Debug, Clone)]
pub enum ApiKey {
    Env(String),
    #[cfg(test)]
    Fixed(String),
}

impl ApiKey {
    pub fn from_env() -> Self {
        ApiKey::Env(API_KEY_ENV.to_string())
    }

    pub fn resolve(&self) -> Result<String> {
        let (key, var) = match self {
            ApiKey::Env(var) => (std::env::var(var).unwrap_or_default(), var.as_str()),
            #[cfg(test)]
            ApiKey::Fixed(key) => (key.clone(), API_KEY_ENV),
        };
        // Blank counts as missing, but a present key is sent exactly as given
        if key.trim().is_empty() {
            return Err(AlphaVantageError::missing_api_key(var));
        }
        Ok(key)
    }
}

/// Request executor for the Alpha Vantage query endpoint.
///
/// Every call resolves the API key first, then waits its turn at the shared
/// [`RateGate`], then issues exactly one GET. A missing key therefore fails
/// without touching the network or consuming a gate slot. No retries.
pub struct AlphaVantageClient {
    http: reqwest::Client,
    base_url: Url,
    api_key: ApiKey,
    gate: Arc<RateGate>,
}

impl AlphaVantageClient {
    pub fn new(http: reqwest::Client, base_url: Url, api_key: ApiKey, gate: Arc<RateGate>) -> Self {
        Self {
            http,
            base_url,
            api_key,
            gate,
        }
    }

    pub async fn execute(&self, function: UpstreamFunction, params: &[(&str, &str)]) -> Result<Value> {
        let api_key = self.api_key.resolve()?;

        self.gate.wait_turn().await;

        let url = self.request_url(function, params, &api_key);
        UPSTREAM_REQUESTS.inc();
        debug!(function = function.as_str(), "calling Alpha Vantage");

        let result = self.send(url).await;
        if let Err(e) = &result {
            UPSTREAM_FAILURES.inc();
            warn!(function = function.as_str(), error = %e, "upstream call failed");
        }
        result
    }

    async fn send(&self, url: Url) -> Result<Value> {
        // Strip the URL from reqwest errors, it carries the key
        let res = self.http.get(url).send().await.map_err(|e| e.without_url())?;

        let status = res.status();
        if !status.is_success() {
            return Err(AlphaVantageError::Upstream {
                status: status.as_u16(),
            });
        }

        let body = res.json::<Value>().await.map_err(|e| e.without_url())?;
        Ok(body)
    }

    // base + function + caller params + apikey, in that order
    fn request_url(&self, function: UpstreamFunction, params: &[(&str, &str)], api_key: &str) -> Url {
        let mut url = self.base_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("function", function.as_str());
            for (key, value) in params {
                query.append_pair(key, value);
            }
            query.append_pair("apikey", api_key);
        }
        url
    }

    pub async fn quote(&self, symbol: &str) -> Result<Value> {
        self.execute(UpstreamFunction::GlobalQuote, &[("symbol", symbol)])
            .await
    }

    pub async fn daily(&self, symbol: &str, outputsize: OutputSize) -> Result<Value> {
        self.execute(
            UpstreamFunction::TimeSeriesDaily,
            &[("symbol", symbol), ("outputsize", outputsize.as_str())],
        )
        .await
    }

    pub async fn search_symbol(&self, keywords: &str) -> Result<Value> {
        self.execute(UpstreamFunction::SymbolSearch, &[("keywords", keywords)])
            .await
    }

    pub async fn forex_rate(&self, from_currency: &str, to_currency: &str) -> Result<Value> {
        self.execute(
            UpstreamFunction::CurrencyExchangeRate,
            &[("from_currency", from_currency), ("to_currency", to_currency)],
        )
        .await
    }

    pub async fn crypto_daily(&self, symbol: &str, market: &str) -> Result<Value> {
        self.execute(
            UpstreamFunction::DigitalCurrencyDaily,
            &[("symbol", symbol), ("market", market)],
        )
        .await
    }

    pub async fn earnings(&self, symbol: &str) -> Result<Value> {
        self.execute(UpstreamFunction::Earnings, &[("symbol", symbol)])
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, api_key: ApiKey) -> AlphaVantageClient {
        let base_url = Url::parse(&format!("{}/query", server.uri())).unwrap();
        AlphaVantageClient::new(
            reqwest::Client::new(),
            base_url,
            api_key,
            Arc::new(RateGate::new(Duration::ZERO)),
        )
    }

    fn test_key() -> ApiKey {
        ApiKey::Fixed("demo".to_string())
    }

    #[test]
    fn resolve_rejects_blank_keys() {
        assert!(matches!(
            ApiKey::Fixed("   ".to_string()).resolve(),
            Err(AlphaVantageError::Configuration(_))
        ));
        assert!(matches!(
            ApiKey::Env("ALPHA_VANTAGE_TEST_KEY_THAT_IS_NEVER_SET".to_string()).resolve(),
            Err(AlphaVantageError::Configuration(_))
        ));
        assert_eq!(test_key().resolve().unwrap(), "demo");
    }

    #[test]
    fn resolve_keeps_key_verbatim() {
        assert_eq!(ApiKey::Fixed("  abc  ".to_string()).resolve().unwrap(), "  abc  ");
    }

    #[test]
    fn request_url_puts_function_first_and_key_last() {
        let client = AlphaVantageClient::new(
            reqwest::Client::new(),
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            test_key(),
            Arc::new(RateGate::default()),
        );

        let url = client.request_url(
            UpstreamFunction::SymbolSearch,
            &[("keywords", "tesla motors")],
            "demo",
        );

        assert_eq!(
            url.as_str(),
            "https://www.alphavantage.co/query?function=SYMBOL_SEARCH&keywords=tesla+motors&apikey=demo"
        );
    }

    #[tokio::test]
    async fn returns_body_unchanged_on_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(json!({ "foo": 1 }).to_string(), "application/json"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let body = client_for(&server, test_key())
            .execute(UpstreamFunction::GlobalQuote, &[("symbol", "IBM")])
            .await
            .unwrap();

        assert_eq!(body, json!({ "foo": 1 }));
    }

    #[tokio::test]
    async fn rate_limited_response_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .respond_with(ResponseTemplate::new(429))
            .expect(1)
            .mount(&server)
            .await;

        let err = client_for(&server, test_key())
            .quote("IBM")
            .await
            .unwrap_err();

        assert!(matches!(err, AlphaVantageError::Upstream { status: 429 }));
        assert_eq!(err.to_string(), "Alpha Vantage error: 429");
    }

    #[tokio::test]
    async fn missing_key_never_reaches_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let err = client_for(&server, ApiKey::Fixed(String::new()))
            .earnings("IBM")
            .await
            .unwrap_err();

        assert!(matches!(err, AlphaVantageError::Configuration(_)));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[tokio::test(start_paused = true)]
    async fn missing_key_does_not_consume_a_gate_slot() {
        let gate = Arc::new(RateGate::default());
        let client = AlphaVantageClient::new(
            reqwest::Client::new(),
            Url::parse(DEFAULT_BASE_URL).unwrap(),
            ApiKey::Fixed(String::new()),
            Arc::clone(&gate),
        );

        assert!(client.quote("IBM").await.is_err());

        let before = tokio::time::Instant::now();
        gate.wait_turn().await;
        assert_eq!(before.elapsed(), Duration::ZERO);
    }

    #[tokio::test]
    async fn malformed_body_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("not json", "application/json"))
            .mount(&server)
            .await;

        let err = client_for(&server, test_key())
            .quote("IBM")
            .await
            .unwrap_err();

        assert!(matches!(err, AlphaVantageError::Transport(_)));
    }

    #[tokio::test]
    async fn forex_maps_parameter_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/query"))
            .and(query_param("function", "CURRENCY_EXCHANGE_RATE"))
            .and(query_param("from_currency", "EUR"))
            .and(query_param("to_currency", "USD"))
            .and(query_param("apikey", "demo"))
            .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server, test_key())
            .forex_rate("EUR", "USD")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn wrappers_send_their_upstream_function() {
        let server = MockServer::start().await;
        for (function, extra) in [
            ("GLOBAL_QUOTE", ("symbol", "IBM")),
            ("TIME_SERIES_DAILY", ("outputsize", "full")),
            ("SYMBOL_SEARCH", ("keywords", "micro")),
            ("DIGITAL_CURRENCY_DAILY", ("market", "EUR")),
            ("EARNINGS", ("symbol", "MSFT")),
        ] {
            Mock::given(method("GET"))
                .and(query_param("function", function))
                .and(query_param(extra.0, extra.1))
                .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
                .expect(1)
                .mount(&server)
                .await;
        }

        let client = client_for(&server, test_key());
        client.quote("IBM").await.unwrap();
        client.daily("IBM", OutputSize::Full).await.unwrap();
        client.search_symbol("micro").await.unwrap();
        client.crypto_daily("BTC", "EUR").await.unwrap();
        client.earnings("MSFT").await.unwrap();
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error_without_the_key() {
        // Grab a free port, then close it so nothing is listening there
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = AlphaVantageClient::new(
            reqwest::Client::new(),
            Url::parse(&format!("http://{addr}/query")).unwrap(),
            ApiKey::Fixed("super-secret-key".to_string()),
            Arc::new(RateGate::new(Duration::ZERO)),
        );

        let err = client.quote("IBM").await.unwrap_err();

        assert!(matches!(err, AlphaVantageError::Transport(_)));
        assert!(!err.to_string().contains("super-secret-key"));
        assert!(!format!("{err:?}").contains("super-secret-key"));
    }
}
