//! Quote pipeline: request validation, rate resolution, volatility,
//! lattice pricing and projection.
//!
//! Everything here is pure given the fetched inputs; the HTTP handler does
//! the I/O and feeds the results in.

use crate::config::AppConfig;
use crate::errors::{EngineError, EngineResult};
use crate::models::lattice::{self, PricingParameters};
use crate::models::projection::{self, CoordinatePoint};
use crate::models::volatility::VolatilityStrategy;
use crate::models::yield_curve::{YieldCurve, YieldCurveTable};
use crate::models::{OptionType, PriceHistory};

/// Calendar days per year used to convert the request tenor.
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Incoming quote request, as posted by the front end.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct QuoteRequest {
    pub ticker: String,
    pub strike: f64,
    /// Time to expiration in calendar days
    pub days: f64,
    /// Tree height
    pub depth: i64,
    #[serde(rename = "type")]
    pub option_type: String,
}

/// A request that passed validation.
#[derive(Debug, Clone)]
pub struct ValidatedQuote {
    pub ticker: String,
    pub strike: f64,
    pub days: f64,
    pub t_years: f64,
    pub depth: usize,
    pub option_type: OptionType,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct QuoteResponse {
    pub ticker: String,
    /// Latest close of the underlying
    pub price: f64,
    pub strike: f64,
    pub days: f64,
    pub depth: usize,
    pub option_type: OptionType,
    pub risk_free_rate: f64,
    pub volatility: f64,
    pub volatility_strategy: &'static str,
    pub american_value: f64,
    pub european_value: f64,
    /// Projection of the American lattice
    pub points: Vec<CoordinatePoint>,
}

/// Decode a request body. Malformed JSON, missing fields and mistyped
/// values all surface as `Parse`.
pub fn parse_request(body: &[u8]) -> EngineResult<QuoteRequest> {
    Ok(serde_json::from_slice(body)?)
}

/// Check contract terms against the configured limits.
pub fn validate(req: &QuoteRequest, config: &AppConfig) -> EngineResult<ValidatedQuote> {
    let ticker = req.ticker.trim().to_ascii_uppercase();
    if ticker.is_empty() {
        return Err(EngineError::InvalidParameter("ticker must not be empty".into()));
    }
    if !(req.strike.is_finite() && req.strike > 0.0) {
        return Err(EngineError::InvalidParameter(format!(
            "strike must be > 0, got {}",
            req.strike
        )));
    }
    if !(req.days.is_finite() && req.days > 0.0 && req.days <= config.max_days) {
        return Err(EngineError::InvalidParameter(format!(
            "days must be in (0, {}], got {}",
            config.max_days, req.days
        )));
    }
    if req.depth < 1 || req.depth > config.max_depth as i64 {
        return Err(EngineError::InvalidParameter(format!(
            "depth must be in [1, {}], got {}",
            config.max_depth, req.depth
        )));
    }
    let option_type: OptionType = req.option_type.parse()?;

    Ok(ValidatedQuote {
        ticker,
        strike: req.strike,
        days: req.days,
        t_years: req.days / DAYS_PER_YEAR,
        depth: req.depth as usize,
        option_type,
    })
}

/// Build the curve from a fetched table and read the rate at the tenor.
pub fn lookup_rate(
    table: EngineResult<YieldCurveTable>,
    t_years: f64,
    extrapolate: bool,
) -> EngineResult<f64> {
    let curve = YieldCurve::build(table?)?.with_extrapolation(extrapolate);
    curve.rate_at(t_years)
}

/// Risk-free rate used for a quote, and whether it is the fallback.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResolvedRate {
    pub rate: f64,
    pub fallback: bool,
}

/// Any failure in the rate lookup is replaced by the fallback rate.
/// The failure is logged, never propagated.
pub fn resolve_rate(lookup: EngineResult<f64>, fallback_rate: f64) -> ResolvedRate {
    match lookup {
        Ok(rate) if rate.is_finite() => ResolvedRate {
            rate,
            fallback: false,
        },
        Ok(rate) => {
            tracing::warn!(rate = rate, fallback = fallback_rate, "non-finite curve rate, using fallback");
            ResolvedRate {
                rate: fallback_rate,
                fallback: true,
            }
        }
        Err(e) => {
            tracing::warn!(error = %e, fallback = fallback_rate, "risk-free rate lookup failed, using fallback");
            ResolvedRate {
                rate: fallback_rate,
                fallback: true,
            }
        }
    }
}

/// Price the contract and project the American lattice.
pub fn build_quote(
    quote: &ValidatedQuote,
    history: &PriceHistory,
    rate: f64,
    strategy: VolatilityStrategy,
) -> EngineResult<QuoteResponse> {
    let spot = history
        .last_close()
        .ok_or_else(|| EngineError::UnknownTicker(quote.ticker.clone()))?;

    let volatility = strategy.estimate(history, quote.t_years)?;

    let params = PricingParameters {
        t_years: quote.t_years,
        depth: quote.depth,
        spot,
        strike: quote.strike,
        rate,
        volatility,
        option_type: quote.option_type,
    };
    let lattice = lattice::price(&params)?;
    let points = projection::project(&lattice.american, lattice.delta_t);

    Ok(QuoteResponse {
        ticker: quote.ticker.clone(),
        price: spot,
        strike: quote.strike,
        days: quote.days,
        depth: quote.depth,
        option_type: quote.option_type,
        risk_free_rate: rate,
        volatility,
        volatility_strategy: strategy.name(),
        american_value: lattice.american_value(),
        european_value: lattice.european_value(),
        points,
    })
}
