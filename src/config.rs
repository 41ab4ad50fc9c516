use crate::errors::{EngineError, EngineResult};
use crate::models::volatility::VolatilityStrategy;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server_port: u16,
    pub market_data_base_url: String,
    /// Lookback window passed to the chart API (e.g. `1y`, `2y`)
    pub history_range: String,
    pub treasury_base_url: String,
    /// Rate used whenever the curve lookup fails
    pub fallback_rate: f64,
    pub curve_extrapolate: bool,
    pub vol_strategy: VolatilityStrategy,
    pub max_days: f64,
    pub max_depth: usize,
}

impl AppConfig {
    pub fn from_env() -> EngineResult<Self> {
        dotenvy::dotenv().ok();

        let server_port = env_var_or("SERVER_PORT", "3001")
            .parse::<u16>()
            .map_err(|e| EngineError::Config(format!("SERVER_PORT: {e}")))?;

        let fallback_rate = env_var_or("FALLBACK_RATE", "0.02")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("FALLBACK_RATE: {e}")))?;

        let curve_extrapolate = env_var_or("CURVE_EXTRAPOLATE", "true")
            .parse::<bool>()
            .map_err(|e| EngineError::Config(format!("CURVE_EXTRAPOLATE: {e}")))?;

        let ewm_span = env_var_or("EWM_SPAN", "252")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("EWM_SPAN: {e}")))?;
        let vol_strategy = VolatilityStrategy::from_name(&env_var_or("VOL_STRATEGY", "ewm"), ewm_span)?;

        let max_days = env_var_or("MAX_DAYS", "60")
            .parse::<f64>()
            .map_err(|e| EngineError::Config(format!("MAX_DAYS: {e}")))?;

        let max_depth = env_var_or("MAX_DEPTH", "200")
            .parse::<usize>()
            .map_err(|e| EngineError::Config(format!("MAX_DEPTH: {e}")))?;

        Ok(Self {
            server_port,
            market_data_base_url: env_var_or(
                "MARKET_DATA_BASE_URL",
                "https://query1.finance.yahoo.com/v8/finance/chart",
            ),
            history_range: env_var_or("HISTORY_RANGE", "2y"),
            treasury_base_url: env_var_or(
                "TREASURY_BASE_URL",
                "https://home.treasury.gov/resource-center/data-chart-center/interest-rates/daily-treasury-rates.csv",
            ),
            fallback_rate,
            curve_extrapolate,
            vol_strategy,
            max_days,
            max_depth,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_port: 3001,
            market_data_base_url: "https://query1.finance.yahoo.com/v8/finance/chart".into(),
            history_range: "2y".into(),
            treasury_base_url:
                "https://home.treasury.gov/resource-center/data-chart-center/interest-rates/daily-treasury-rates.csv"
                    .into(),
            fallback_rate: 0.02,
            curve_extrapolate: true,
            vol_strategy: VolatilityStrategy::default(),
            max_days: 60.0,
            max_depth: 200,
        }
    }
}

fn env_var_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
