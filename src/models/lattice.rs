use crate::errors::{EngineError, EngineResult};
use crate::models::OptionType;

/// Cox-Ross-Rubinstein binomial lattice.
///
/// Node (i, j) sits at time step i with j up-moves, i.e. underlying
/// S * up^(2j - i). Values are filled by backward induction from the
/// terminal payoff row:
///
///   V[i, j] = disc * (p * V[i+1, j+1] + (1 - p) * V[i+1, j])
///
/// with the American matrix additionally floored by intrinsic value.
#[derive(Debug, Clone, Copy)]
pub struct PricingParameters {
    /// Time to expiration in years
    pub t_years: f64,
    /// Number of time steps
    pub depth: usize,
    pub spot: f64,
    pub strike: f64,
    /// Annualized risk-free rate
    pub rate: f64,
    /// Annualized volatility
    pub volatility: f64,
    pub option_type: OptionType,
}

impl PricingParameters {
    pub fn validate(&self) -> EngineResult<()> {
        if self.depth == 0 {
            return Err(EngineError::InvalidParameter("depth must be >= 1".into()));
        }
        if !(self.t_years.is_finite() && self.t_years > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "time to expiration must be > 0, got {}",
                self.t_years
            )));
        }
        if !(self.spot.is_finite() && self.spot > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "spot must be > 0, got {}",
                self.spot
            )));
        }
        if !(self.strike.is_finite() && self.strike > 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "strike must be > 0, got {}",
                self.strike
            )));
        }
        if !(self.volatility.is_finite() && self.volatility >= 0.0) {
            return Err(EngineError::InvalidParameter(format!(
                "volatility must be >= 0, got {}",
                self.volatility
            )));
        }
        if !self.rate.is_finite() {
            return Err(EngineError::InvalidParameter("rate must be finite".into()));
        }
        Ok(())
    }
}

/// Per-request constants derived from the pricing parameters.
#[derive(Debug, Clone, Copy)]
pub struct LatticeConstants {
    pub delta_t: f64,
    pub up: f64,
    pub down: f64,
    pub p: f64,
    pub disc: f64,
}

impl LatticeConstants {
    pub fn new(params: &PricingParameters) -> Self {
        let delta_t = params.t_years / params.depth as f64;
        let up = (params.volatility * delta_t.sqrt()).exp();
        let down = 1.0 / up;
        let p = ((params.rate * delta_t).exp() - down) / (up - down);
        let disc = (-params.rate * delta_t).exp();
        Self { delta_t, up, down, p, disc }
    }

    /// True when p is a valid probability.
    #[inline]
    pub fn is_valid_measure(&self) -> bool {
        self.p.is_finite() && (0.0..=1.0).contains(&self.p)
    }
}

/// Lower-triangular matrix stored in a full (N+1) x (N+1) row-major grid.
/// Only columns 0..=i of row i are ever written or read.
#[derive(Debug, Clone)]
pub struct TriangularGrid {
    width: usize,
    cells: Vec<f64>,
}

impl TriangularGrid {
    fn new(depth: usize) -> Self {
        let width = depth + 1;
        Self {
            width,
            cells: vec![0.0; width * width],
        }
    }

    /// Tree depth N (number of time steps).
    #[inline]
    pub fn depth(&self) -> usize {
        self.width - 1
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        debug_assert!(j <= i && i < self.width);
        self.cells[i * self.width + j]
    }

    /// The i+1 valid values of row i.
    #[inline]
    pub fn row(&self, i: usize) -> &[f64] {
        let start = i * self.width;
        &self.cells[start..start + i + 1]
    }

    #[inline]
    fn row_mut(&mut self, i: usize) -> &mut [f64] {
        let start = i * self.width;
        &mut self.cells[start..start + i + 1]
    }

    /// Row i (mutable) together with row i+1 (read-only).
    #[inline]
    fn row_pair_mut(&mut self, i: usize) -> (&mut [f64], &[f64]) {
        let (head, tail) = self.cells.split_at_mut((i + 1) * self.width);
        let start = i * self.width;
        (&mut head[start..start + i + 1], &tail[..i + 2])
    }
}

/// Fully built lattice for one pricing request.
#[derive(Debug, Clone)]
pub struct Lattice {
    pub american: TriangularGrid,
    pub european: TriangularGrid,
    pub delta_t: f64,
    pub constants: LatticeConstants,
}

impl Lattice {
    /// Option value at the root of the American tree.
    #[inline]
    pub fn american_value(&self) -> f64 {
        self.american.get(0, 0)
    }

    #[inline]
    pub fn european_value(&self) -> f64 {
        self.european.get(0, 0)
    }
}

#[inline]
fn intrinsic(option_type: OptionType, price: f64, strike: f64) -> f64 {
    match option_type {
        OptionType::Call => (price - strike).max(0.0),
        OptionType::Put => (strike - price).max(0.0),
    }
}

/// Underlying price at node (i, j): S * up^(2j - i).
#[inline]
pub fn node_price(spot: f64, up: f64, i: usize, j: usize) -> f64 {
    spot * up.powi(2 * j as i32 - i as i32)
}

/// Build the American and European lattices by backward induction.
/// Pure function of its inputs.
pub fn price(params: &PricingParameters) -> EngineResult<Lattice> {
    params.validate()?;

    let c = LatticeConstants::new(params);
    if !c.is_valid_measure() {
        tracing::warn!(
            p = c.p,
            rate = params.rate,
            volatility = params.volatility,
            delta_t = c.delta_t,
            "risk-neutral probability outside [0, 1], refusing to build lattice"
        );
        return Err(EngineError::DegenerateLattice { p: c.p });
    }

    let n = params.depth;
    let mut american = TriangularGrid::new(n);
    let mut european = TriangularGrid::new(n);

    // Terminal row: exact intrinsic payoff in both trees
    for (j, value) in american.row_mut(n).iter_mut().enumerate() {
        let s = node_price(params.spot, c.up, n, j);
        *value = intrinsic(params.option_type, s, params.strike);
    }
    european.row_mut(n).copy_from_slice(american.row(n));

    let disc_p = c.disc * c.p;
    let disc_1mp = c.disc * (1.0 - c.p);

    for i in (0..n).rev() {
        let (am_row, am_next) = american.row_pair_mut(i);
        let (eu_row, eu_next) = european.row_pair_mut(i);

        for j in 0..=i {
            let s = node_price(params.spot, c.up, i, j);
            let exercise = intrinsic(params.option_type, s, params.strike);

            let am_cont = disc_p * am_next[j + 1] + disc_1mp * am_next[j];
            am_row[j] = exercise.max(am_cont);

            eu_row[j] = disc_p * eu_next[j + 1] + disc_1mp * eu_next[j];
        }
    }

    tracing::debug!(
        depth = n,
        p = c.p,
        up = c.up,
        down = c.down,
        disc = c.disc,
        american = american.get(0, 0),
        european = european.get(0, 0),
        "lattice built"
    );

    Ok(Lattice {
        american,
        european,
        delta_t: c.delta_t,
        constants: c,
    })
}
