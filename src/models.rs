use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

// Upstream function identifiers, one per tool
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamFunction {
    GlobalQuote,
    TimeSeriesDaily,
    SymbolSearch,
    CurrencyExchangeRate,
    DigitalCurrencyDaily,
    Earnings,
}

impl UpstreamFunction {
    pub fn as_str(self) -> &'static str {
        match self {
            UpstreamFunction::GlobalQuote => "GLOBAL_QUOTE",
            UpstreamFunction::TimeSeriesDaily => "TIME_SERIES_DAILY",
            UpstreamFunction::SymbolSearch => "SYMBOL_SEARCH",
            UpstreamFunction::CurrencyExchangeRate => "CURRENCY_EXCHANGE_RATE",
            UpstreamFunction::DigitalCurrencyDaily => "DIGITAL_CURRENCY_DAILY",
            UpstreamFunction::Earnings => "EARNINGS",
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum OutputSize {
    /// Latest 100 data points
    #[default]
    Compact,
    /// Full-length history
    Full,
}

impl OutputSize {
    pub fn as_str(self) -> &'static str {
        match self {
            OutputSize::Compact => "compact",
            OutputSize::Full => "full",
        }
    }
}

// Tool argument formats

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct QuoteArgs {
    /// Ticker (e.g. AAPL)
    pub symbol: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct DailyArgs {
    pub symbol: String,
    #[serde(default)]
    pub outputsize: OutputSize,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct SearchArgs {
    pub keywords: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ForexArgs {
    /// e.g. EUR
    pub from_currency: String,
    /// e.g. USD
    pub to_currency: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct CryptoArgs {
    /// e.g. BTC
    pub symbol: String,
    #[serde(default = "default_market")]
    pub market: String,
}

#[derive(Debug, Deserialize, Serialize, JsonSchema)]
pub struct EarningsArgs {
    pub symbol: String,
}

fn default_market() -> String {
    "USD".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn daily_defaults_to_compact() {
        let args: DailyArgs = serde_json::from_value(json!({ "symbol": "IBM" })).unwrap();
        assert_eq!(args.outputsize, OutputSize::Compact);

        let args: DailyArgs =
            serde_json::from_value(json!({ "symbol": "IBM", "outputsize": "full" })).unwrap();
        assert_eq!(args.outputsize.as_str(), "full");
    }

    #[test]
    fn daily_rejects_unknown_outputsize() {
        let res: Result<DailyArgs, _> =
            serde_json::from_value(json!({ "symbol": "IBM", "outputsize": "huge" }));
        assert!(res.is_err());
    }

    #[test]
    fn forex_uses_camel_case_keys() {
        let args: ForexArgs =
            serde_json::from_value(json!({ "fromCurrency": "EUR", "toCurrency": "USD" })).unwrap();
        assert_eq!(args.from_currency, "EUR");
        assert_eq!(args.to_currency, "USD");
    }

    #[test]
    fn crypto_market_defaults_to_usd() {
        let args: CryptoArgs = serde_json::from_value(json!({ "symbol": "BTC" })).unwrap();
        assert_eq!(args.market, "USD");
    }
}
