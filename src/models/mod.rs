pub mod lattice;
pub mod projection;
pub mod volatility;
pub mod yield_curve;

use crate::errors::{EngineError, EngineResult};
use chrono::NaiveDate;

/// Option payoff direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl std::str::FromStr for OptionType {
    type Err = EngineError;

    /// Case-insensitive `call` / `c` / `put` / `p`.
    fn from_str(s: &str) -> EngineResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "call" | "c" => Ok(Self::Call),
            "put" | "p" => Ok(Self::Put),
            other => Err(EngineError::InvalidParameter(format!(
                "option type must be call or put, got {other:?}"
            ))),
        }
    }
}

impl std::fmt::Display for OptionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Call => write!(f, "call"),
            Self::Put => write!(f, "put"),
        }
    }
}

/// One daily observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bar {
    pub date: NaiveDate,
    pub open: f64,
    pub close: f64,
}

/// Daily bars in ascending date order. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct PriceHistory {
    bars: Vec<Bar>,
}

impl PriceHistory {
    pub fn new(mut bars: Vec<Bar>) -> Self {
        bars.sort_by_key(|b| b.date);
        Self { bars }
    }

    #[inline]
    pub fn bars(&self) -> &[Bar] {
        &self.bars
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    /// Most recent close, used as the spot price.
    pub fn last_close(&self) -> Option<f64> {
        self.bars.last().map(|b| b.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_option_type_parsing() {
        for s in ["call", "CALL", "c", " C "] {
            assert_eq!(s.parse::<OptionType>().unwrap(), OptionType::Call);
        }
        for s in ["put", "Put", "p", "P"] {
            assert_eq!(s.parse::<OptionType>().unwrap(), OptionType::Put);
        }
        assert!(matches!(
            "straddle".parse::<OptionType>(),
            Err(EngineError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_history_sorted_and_last_close() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let h = PriceHistory::new(vec![
            Bar { date: d(5), open: 10.0, close: 11.0 },
            Bar { date: d(4), open: 9.0, close: 10.0 },
        ]);
        assert_eq!(h.bars()[0].date, d(4));
        assert_eq!(h.last_close(), Some(11.0));
        assert!(PriceHistory::default().last_close().is_none());
    }
}
