use thiserror::Error;

// Errors surfaced by the request executor
#[derive(Error, Debug)]
pub enum AlphaVantageError {
    #[error("{0}")]
    Configuration(String),

    #[error("Alpha Vantage error: {status}")]
    Upstream { status: u16 },

    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl AlphaVantageError {
    pub fn missing_api_key(var: &str) -> Self {
        AlphaVantageError::Configuration(format!(
            "{var} required. Free at https://www.alphavantage.co/support/#api-key"
        ))
    }
}

pub type Result<T> = std::result::Result<T, AlphaVantageError>;
