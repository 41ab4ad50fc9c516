use crate::models::lattice::TriangularGrid;

/// One plotted lattice node: (time in years, vertical position, option value).
///
/// Rows start one unit lower than the previous row and siblings are two
/// units apart, so an up-then-down path lands on the same position as a
/// down-then-up path.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
#[serde(into = "[f64; 3]")]
pub struct CoordinatePoint {
    pub time_offset: f64,
    pub spatial_index: i64,
    pub value: f64,
}

impl From<CoordinatePoint> for [f64; 3] {
    fn from(p: CoordinatePoint) -> Self {
        [p.time_offset, p.spatial_index as f64, p.value]
    }
}

/// Number of nodes in a lattice of the given depth: (N+1)(N+2)/2.
#[inline]
pub fn node_count(depth: usize) -> usize {
    (depth + 1) * (depth + 2) / 2
}

/// Flatten a triangular value matrix into row-major plot points.
pub fn project(grid: &TriangularGrid, delta_t: f64) -> Vec<CoordinatePoint> {
    let depth = grid.depth();
    let mut points = Vec::with_capacity(node_count(depth));

    let mut start: i64 = 0;
    for i in 0..=depth {
        let time_offset = i as f64 * delta_t;
        for (j, &value) in grid.row(i).iter().enumerate() {
            points.push(CoordinatePoint {
                time_offset,
                spatial_index: start + 2 * j as i64,
                value,
            });
        }
        start -= 1;
    }

    points
}
