use crate::errors::{EngineError, EngineResult};

/// Ordered (maturity in years, rate as a fraction) pairs.
pub type YieldCurveTable = Vec<(f64, f64)>;

/// Piecewise-linear interpolation of the risk-free rate over maturity.
///
/// Queries outside the table follow the nearest end segment (linear
/// extrapolation) unless extrapolation is switched off, in which case they
/// fail with `OutOfRange`. Never clamps to the end rates.
#[derive(Debug, Clone)]
pub struct YieldCurve {
    maturities: Vec<f64>,
    rates: Vec<f64>,
    extrapolate: bool,
}

impl YieldCurve {
    pub fn build(table: YieldCurveTable) -> EngineResult<Self> {
        if table.len() < 2 {
            return Err(EngineError::InvalidCurve(format!(
                "need at least 2 points, got {}",
                table.len()
            )));
        }

        let (maturities, rates): (Vec<f64>, Vec<f64>) = table.into_iter().unzip();

        if maturities.iter().chain(rates.iter()).any(|x| !x.is_finite()) {
            return Err(EngineError::InvalidCurve("non-finite curve point".into()));
        }
        if maturities.windows(2).any(|w| w[1] <= w[0]) {
            return Err(EngineError::InvalidCurve(
                "maturities must be strictly increasing".into(),
            ));
        }

        Ok(Self {
            maturities,
            rates,
            extrapolate: true,
        })
    }

    /// With `false`, queries outside [first maturity, last maturity] fail.
    #[must_use]
    pub fn with_extrapolation(mut self, extrapolate: bool) -> Self {
        self.extrapolate = extrapolate;
        self
    }

    pub fn min_maturity(&self) -> f64 {
        self.maturities[0]
    }

    pub fn max_maturity(&self) -> f64 {
        self.maturities[self.maturities.len() - 1]
    }

    /// Index i of the segment [m_i, m_{i+1}] used for t.
    fn segment(&self, t: f64) -> usize {
        let last = self.maturities.len() - 2;
        self.maturities
            .partition_point(|&m| m <= t)
            .saturating_sub(1)
            .min(last)
    }

    pub fn rate_at(&self, t: f64) -> EngineResult<f64> {
        let (min, max) = (self.min_maturity(), self.max_maturity());
        if !t.is_finite() || (!self.extrapolate && (t < min || t > max)) {
            return Err(EngineError::OutOfRange { t, min, max });
        }

        let i = self.segment(t);
        let (m0, m1) = (self.maturities[i], self.maturities[i + 1]);
        let (r0, r1) = (self.rates[i], self.rates[i + 1]);

        let w = (t - m0) / (m1 - m0);
        Ok(r0 + w * (r1 - r0))
    }
}
