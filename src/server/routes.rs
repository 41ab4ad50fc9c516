use crate::errors::EngineError;
use crate::pricing::{self, QuoteResponse};
use crate::state::{AppState, Counters, CountersSnapshot};
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use std::sync::Arc;

/// HTTP status for a failed quote.
pub fn status_for(err: &EngineError) -> StatusCode {
    match err {
        EngineError::InvalidParameter(_) | EngineError::Parse(_) => StatusCode::BAD_REQUEST,
        EngineError::UnknownTicker(_) => StatusCode::NOT_FOUND,
        EngineError::InsufficientHistory { .. } | EngineError::DegenerateLattice { .. } => {
            StatusCode::UNPROCESSABLE_ENTITY
        }
        EngineError::MarketData(_) | EngineError::Network(_) => {
            StatusCode::BAD_GATEWAY
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

type ApiError = (StatusCode, Json<serde_json::Value>);

fn reject(state: &AppState, request_id: &uuid::Uuid, err: EngineError) -> ApiError {
    Counters::incr(&state.counters.quote_errors);
    if matches!(err, EngineError::DegenerateLattice { .. }) {
        Counters::incr(&state.counters.degenerate_lattices);
    }
    let status = status_for(&err);
    tracing::warn!(request_id = %request_id, status = status.as_u16(), error = %err, "quote rejected");
    (status, Json(serde_json::json!({ "error": err.to_string() })))
}

/// POST /bopm -- price one option and return the projected American lattice
pub async fn post_quote(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<QuoteResponse>, ApiError> {
    let request_id = uuid::Uuid::new_v4();

    // Reject bad terms before any network I/O
    let req = pricing::parse_request(&body).map_err(|e| reject(&state, &request_id, e))?;
    let quote = pricing::validate(&req, &state.config).map_err(|e| reject(&state, &request_id, e))?;

    tracing::info!(
        request_id = %request_id,
        ticker = %quote.ticker,
        strike = quote.strike,
        days = quote.days,
        depth = quote.depth,
        option_type = %quote.option_type,
        "quote requested"
    );

    let (history, curve) = tokio::join!(
        state.market_data.fetch_history(&quote.ticker),
        state.treasury.fetch_curve(),
    );
    let history = history.map_err(|e| reject(&state, &request_id, e))?;

    let rate = pricing::resolve_rate(
        pricing::lookup_rate(curve, quote.t_years, state.config.curve_extrapolate),
        state.config.fallback_rate,
    );
    if rate.fallback {
        Counters::incr(&state.counters.rate_fallbacks);
    }

    let resp = pricing::build_quote(&quote, &history, rate.rate, state.config.vol_strategy)
        .map_err(|e| reject(&state, &request_id, e))?;

    Counters::incr(&state.counters.quotes_served);
    tracing::info!(
        request_id = %request_id,
        ticker = %resp.ticker,
        spot = resp.price,
        rate = resp.risk_free_rate,
        rate_fallback = rate.fallback,
        vol = resp.volatility,
        american = resp.american_value,
        european = resp.european_value,
        points = resp.points.len(),
        "quote served"
    );

    Ok(Json(resp))
}

/// GET /api/counters -- performance counters (lock-free reads)
pub async fn get_counters(State(state): State<Arc<AppState>>) -> Json<CountersSnapshot> {
    Json(state.counters.snapshot())
}
