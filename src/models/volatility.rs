use crate::errors::{EngineError, EngineResult};
use crate::models::PriceHistory;
use statrs::statistics::Statistics;

/// Trading days used to annualize the simple-return estimate.
const TRADING_DAYS: f64 = 253.0;

/// Default EWM span (observations).
pub const DEFAULT_EWM_SPAN: f64 = 252.0;

/// Historical volatility estimator.
///
/// Two variants of the same estimator:
///   - `SimpleReturn`: stdev of open/close - 1, scaled by sqrt(T * 253)
///     for the contract tenor T in years.
///   - `Ewm`: exponentially weighted stdev of daily log close returns,
///     last value of the series, not rescaled by tenor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VolatilityStrategy {
    SimpleReturn,
    Ewm { span: f64 },
}

impl Default for VolatilityStrategy {
    fn default() -> Self {
        Self::Ewm {
            span: DEFAULT_EWM_SPAN,
        }
    }
}

impl VolatilityStrategy {
    pub fn name(&self) -> &'static str {
        match self {
            Self::SimpleReturn => "simple",
            Self::Ewm { .. } => "ewm",
        }
    }

    /// Parse a strategy name as used in config (`simple` | `ewm`).
    pub fn from_name(name: &str, span: f64) -> EngineResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "simple" | "simple_return" => Ok(Self::SimpleReturn),
            "ewm" | "ewma" => {
                if !(span.is_finite() && span > 1.0) {
                    return Err(EngineError::Config(format!("EWM span must be > 1, got {span}")));
                }
                Ok(Self::Ewm { span })
            }
            other => Err(EngineError::Config(format!("unknown volatility strategy: {other}"))),
        }
    }

    /// Estimate volatility from daily bars. `t_years` is the contract tenor,
    /// only used by the simple-return annualization.
    pub fn estimate(&self, history: &PriceHistory, t_years: f64) -> EngineResult<f64> {
        let n = history.len();
        if n < 2 {
            return Err(EngineError::InsufficientHistory {
                required: 2,
                actual: n,
            });
        }
        if history
            .bars()
            .iter()
            .any(|b| !(b.open > 0.0 && b.close > 0.0 && b.open.is_finite() && b.close.is_finite()))
        {
            return Err(EngineError::InvalidParameter(
                "history contains non-positive prices".into(),
            ));
        }

        let vol = match *self {
            Self::SimpleReturn => simple_return_vol(history, t_years)?,
            Self::Ewm { span } => ewm_log_return_vol(history, span)?,
        };

        tracing::debug!(strategy = self.name(), observations = n, vol = vol, "volatility estimated");
        Ok(vol)
    }
}

fn simple_return_vol(history: &PriceHistory, t_years: f64) -> EngineResult<f64> {
    if !(t_years.is_finite() && t_years > 0.0) {
        return Err(EngineError::InvalidParameter(format!(
            "tenor must be > 0, got {t_years}"
        )));
    }
    // Ratio direction is open over close, as taken from the daily bars
    let changes: Vec<f64> = history.bars().iter().map(|b| b.open / b.close - 1.0).collect();
    let sd = changes.iter().std_dev();
    Ok(sd * (t_years * TRADING_DAYS).sqrt())
}

fn ewm_log_return_vol(history: &PriceHistory, span: f64) -> EngineResult<f64> {
    let returns: Vec<f64> = history
        .bars()
        .windows(2)
        .map(|w| (w[1].close / w[0].close).ln())
        .collect();

    if returns.len() < 2 {
        return Err(EngineError::InsufficientHistory {
            required: 3,
            actual: history.len(),
        });
    }

    ewm_std(&returns, span)
}

/// Bias-corrected exponentially weighted standard deviation at the last
/// observation, with adjusted weights (1 - alpha)^age and alpha = 2 / (span + 1).
fn ewm_std(xs: &[f64], span: f64) -> EngineResult<f64> {
    let decay = 1.0 - 2.0 / (span + 1.0);

    let mut sum_w = 0.0;
    let mut sum_w2 = 0.0;
    let mut sum_wx = 0.0;
    let mut w = 1.0;
    for &x in xs.iter().rev() {
        sum_w += w;
        sum_w2 += w * w;
        sum_wx += w * x;
        w *= decay;
    }
    let mean = sum_wx / sum_w;

    let mut sum_wd2 = 0.0;
    let mut w = 1.0;
    for &x in xs.iter().rev() {
        let d = x - mean;
        sum_wd2 += w * d * d;
        w *= decay;
    }

    let biased = sum_wd2 / sum_w;
    let denom = sum_w * sum_w - sum_w2;
    // span <= 1 puts all weight on the last return
    if denom <= 0.0 {
        return Err(EngineError::InvalidParameter(format!(
            "EWM span {span} leaves no effective sample"
        )));
    }
    Ok((biased * sum_w * sum_w / denom).max(0.0).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Bar;
    use chrono::NaiveDate;

    fn history(prices: &[(f64, f64)]) -> PriceHistory {
        let start = NaiveDate::from_ymd_opt(2024, 1, 2).unwrap();
        PriceHistory::new(
            prices
                .iter()
                .enumerate()
                .map(|(i, &(open, close))| Bar {
                    date: start + chrono::Duration::days(i as i64),
                    open,
                    close,
                })
                .collect(),
        )
    }

    fn closes(closes: &[f64]) -> PriceHistory {
        history(&closes.iter().map(|&c| (c, c)).collect::<Vec<_>>())
    }

    #[test]
    fn test_constant_prices_zero_vol() {
        let h = closes(&[50.0; 30]);
        let ewm = VolatilityStrategy::default().estimate(&h, 0.1).unwrap();
        let simple = VolatilityStrategy::SimpleReturn.estimate(&h, 0.1).unwrap();
        assert!(ewm.abs() < 1e-12, "ewm={ewm}");
        assert!(simple.abs() < 1e-12, "simple={simple}");
    }

    #[test]
    fn test_single_observation_insufficient() {
        let h = closes(&[100.0]);
        for s in [VolatilityStrategy::SimpleReturn, VolatilityStrategy::default()] {
            assert!(matches!(
                s.estimate(&h, 0.1),
                Err(EngineError::InsufficientHistory { actual: 1, .. })
            ));
        }
    }

    #[test]
    fn test_ewm_needs_two_returns() {
        let h = closes(&[100.0, 101.0]);
        assert!(matches!(
            VolatilityStrategy::default().estimate(&h, 0.1),
            Err(EngineError::InsufficientHistory { required: 3, .. })
        ));
    }

    #[test]
    fn test_ewm_two_returns_hand_value() {
        let h = closes(&[100.0, 110.0, 99.0]);
        let v = VolatilityStrategy::default().estimate(&h, 0.1).unwrap();
        assert!((v - 0.14189560954670769).abs() < 1e-10, "v={v}");
    }

    #[test]
    fn test_ewm_tracks_recent_regime() {
        // Calm first half, noisy second half
        let mut prices = vec![100.0];
        for i in 0..200 {
            let step = if i < 100 { 0.001 } else { 0.03 };
            let sign = if i % 2 == 0 { 1.0 } else { -1.0 };
            let last = prices[prices.len() - 1];
            prices.push(last * (1.0 + sign * step));
        }
        let h = closes(&prices);
        let short = VolatilityStrategy::Ewm { span: 20.0 }.estimate(&h, 0.1).unwrap();
        let long = VolatilityStrategy::Ewm { span: 252.0 }.estimate(&h, 0.1).unwrap();
        assert!(short > long, "short span {short} should react faster than {long}");
    }

    #[test]
    fn test_simple_return_hand_value() {
        let h = history(&[(101.0, 100.0), (99.0, 100.0), (102.0, 100.0)]);
        let v = VolatilityStrategy::SimpleReturn.estimate(&h, 30.0 / 365.0).unwrap();
        assert!((v - 0.06965669238860367).abs() < 1e-10, "v={v}");
    }

    #[test]
    fn test_simple_return_scales_with_tenor() {
        let h = history(&[(101.0, 100.0), (99.0, 100.0), (102.0, 100.0)]);
        let short = VolatilityStrategy::SimpleReturn.estimate(&h, 0.1).unwrap();
        let long = VolatilityStrategy::SimpleReturn.estimate(&h, 0.4).unwrap();
        assert!((long / short - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_non_positive_prices_rejected() {
        let h = closes(&[100.0, 0.0, 101.0]);
        assert!(matches!(
            VolatilityStrategy::default().estimate(&h, 0.1),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_strategy_names() {
        assert_eq!(
            VolatilityStrategy::from_name("EWM", 252.0).unwrap(),
            VolatilityStrategy::Ewm { span: 252.0 }
        );
        assert_eq!(
            VolatilityStrategy::from_name("simple", 252.0).unwrap(),
            VolatilityStrategy::SimpleReturn
        );
        assert!(VolatilityStrategy::from_name("garch", 252.0).is_err());
        assert!(VolatilityStrategy::from_name("ewm", 0.0).is_err());
        assert!(VolatilityStrategy::from_name("ewm", 1.0).is_err());
        assert!(VolatilityStrategy::from_name("ewm", 1.5).is_ok());
    }

    #[test]
    fn test_unit_span_rejected() {
        let h = closes(&[100.0, 110.0, 99.0, 104.0]);
        let strategy = VolatilityStrategy::Ewm { span: 1.0 };
        assert!(matches!(
            strategy.estimate(&h, 1.0),
            Err(EngineError::InvalidParameter(_))
        ));
    }
}
