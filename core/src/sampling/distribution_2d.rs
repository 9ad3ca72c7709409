//! 2D Distribution.

#![allow(dead_code)]

use super::distribution_1d::Distribution1D;
use crate::base::*;
use crate::geometry::Vector2f;

/// Piecewise-constant 2D distribution built from a row-major grid of
/// non-negative values, sampled as a marginal over rows and a conditional
/// along the selected row.
pub struct Distribution2D {
    /// Conditional distribution along each row.
    conditional: Vec<Distribution1D>,

    /// Marginal distribution over the rows.
    marginal: Distribution1D,
}

impl Distribution2D {
    /// Returns a new `Distribution2D` for the given grid.
    ///
    /// * `func` - Row-major grid values.
    /// * `nu`   - Number of columns.
    /// * `nv`   - Number of rows.
    pub fn new(func: &[Float], nu: usize, nv: usize) -> Self {
        debug_assert_eq!(func.len(), nu * nv);

        let conditional: Vec<Distribution1D> = (0..nv)
            .map(|v| Distribution1D::new(func[v * nu..(v + 1) * nu].to_vec()))
            .collect();
        let marginal =
            Distribution1D::new(conditional.iter().map(|c| c.func_int).collect());

        Self {
            conditional,
            marginal,
        }
    }

    /// Samples a (u, v) position in [0,1)² and returns it with its PDF.
    ///
    /// * `u` - Primary sample in [0,1)².
    pub fn sample_continuous(&self, u: Vector2f) -> (Vector2f, Float) {
        let (v, pdf_v, offset) = self.marginal.sample_continuous(u.y);
        let (s, pdf_u, _) = self.conditional[offset].sample_continuous(u.x);
        (Vector2f::new(s, v), pdf_u * pdf_v)
    }

    /// Maps a sampled (u, v) position back to the primary sample.
    ///
    /// * `p` - Position in [0,1)².
    pub fn sample_continuous_inverse(&self, p: Vector2f) -> Vector2f {
        let row = clamp(
            (p.y * self.conditional.len() as Float) as Int,
            0,
            self.conditional.len() as Int - 1,
        ) as usize;
        Vector2f::new(
            self.conditional[row].sample_continuous_inverse(p.x),
            self.marginal.sample_continuous_inverse(p.y),
        )
    }

    /// The PDF of sampling the position `p`.
    ///
    /// * `p` - Position in [0,1)².
    pub fn pdf(&self, p: Vector2f) -> Float {
        let row = clamp(
            (p.y * self.conditional.len() as Float) as Int,
            0,
            self.conditional.len() as Int - 1,
        ) as usize;
        self.marginal.pdf(p.y) * self.conditional[row].pdf(p.x)
    }
}
