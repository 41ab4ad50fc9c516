use crate::config::AppConfig;
use crate::feeds::market_data::MarketDataClient;
use crate::feeds::treasury::TreasuryCurveClient;
use portable_atomic::{AtomicU64, Ordering};
use std::sync::Arc;

// ── Performance Counters (lock-free) ──

#[derive(Debug, Default)]
pub struct Counters {
    pub quotes_served: AtomicU64,
    pub quote_errors: AtomicU64,
    /// Curve lookups that ended on the fallback rate
    pub rate_fallbacks: AtomicU64,
    pub degenerate_lattices: AtomicU64,
}

#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct CountersSnapshot {
    pub quotes_served: u64,
    pub quote_errors: u64,
    pub rate_fallbacks: u64,
    pub degenerate_lattices: u64,
}

impl Counters {
    #[inline]
    pub fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CountersSnapshot {
        CountersSnapshot {
            quotes_served: self.quotes_served.load(Ordering::Relaxed),
            quote_errors: self.quote_errors.load(Ordering::Relaxed),
            rate_fallbacks: self.rate_fallbacks.load(Ordering::Relaxed),
            degenerate_lattices: self.degenerate_lattices.load(Ordering::Relaxed),
        }
    }
}

// ── Shared Application State ──

/// Immutable config plus the two fetch clients; only the counters change.
pub struct AppState {
    pub config: AppConfig,
    pub market_data: MarketDataClient,
    pub treasury: TreasuryCurveClient,
    pub counters: Counters,
}

impl AppState {
    pub fn new(config: AppConfig) -> Arc<Self> {
        let market_data = MarketDataClient::new(&config.market_data_base_url, &config.history_range);
        let treasury = TreasuryCurveClient::new(&config.treasury_base_url);
        Arc::new(Self {
            config,
            market_data,
            treasury,
            counters: Counters::default(),
        })
    }
}
