/// Domain-specific error types for the pricing service.
/// Rate-lookup failures are recovered with the fallback rate upstream;
/// everything else is surfaced to the caller of the quote pipeline.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("unknown ticker: {0}")]
    UnknownTicker(String),

    #[error("insufficient history: need {required} observations, got {actual}")]
    InsufficientHistory { required: usize, actual: usize },

    #[error("invalid yield curve: {0}")]
    InvalidCurve(String),

    #[error("maturity {t} outside curve range [{min}, {max}]")]
    OutOfRange { t: f64, min: f64, max: f64 },

    #[error("yield curve fetch failed: {0}")]
    CurveFetch(String),

    #[error("market data error: {0}")]
    MarketData(String),

    #[error("degenerate lattice: risk-neutral probability {p} outside [0, 1]")]
    DegenerateLattice { p: f64 },

    #[error("parse error: {0}")]
    Parse(String),

    #[error("network error: {0}")]
    Network(String),

    #[error("config error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for EngineError {
    fn from(e: reqwest::Error) -> Self {
        EngineError::Network(e.to_string())
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Parse(e.to_string())
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
