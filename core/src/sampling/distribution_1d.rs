//! 1D Distribution.

#![allow(dead_code)]

use crate::base::*;

/// Represents a piecewise-constant 1D function's PDF and CDF and supports
/// sampling it in primary-sample space, including the inverse map.
#[derive(Clone)]
pub struct Distribution1D {
    /// Piecewise-constant function.
    pub func: Vec<Float>,

    /// CDF for `func`.
    pub cdf: Vec<Float>,

    /// Integral of `func`.
    pub func_int: Float,
}

impl Distribution1D {
    /// Returns a new `Distribution1D` for given piecewise-constant function.
    ///
    /// * `f` - Piecewise-constant 1D function.
    pub fn new(f: Vec<Float>) -> Self {
        let n = f.len();

        // Compute integral of step function at x_i.
        let mut cdf: Vec<Float> = Vec::with_capacity(n + 1);
        cdf.push(0.0);
        for i in 1..n + 1 {
            cdf.push(cdf[i - 1] + f[i - 1] / n as Float);
        }

        // Transform step function integral into CDF.
        let func_int = cdf[n];
        if func_int == 0.0 {
            for (i, v) in cdf.iter_mut().enumerate().skip(1).take(n) {
                *v = i as Float / n as Float;
            }
        } else {
            for v in cdf.iter_mut().skip(1).take(n) {
                *v /= func_int;
            }
        }

        Self {
            func: f,
            cdf,
            func_int,
        }
    }

    /// Returns the number of sample points for the piecewise-constant
    /// function.
    pub fn count(&self) -> usize {
        self.func.len()
    }

    /// Index of the CDF segment containing `u`.
    fn find_interval(&self, u: Float) -> usize {
        let idx = self.cdf.partition_point(|&cdf| cdf <= u);
        clamp(idx as Int - 1, 0, self.count() as Int - 1) as usize
    }

    /// Return a sample in [0, 1), its PDF and the segment offset for a
    /// random sample.
    ///
    /// * `u` - The random sample.
    pub fn sample_continuous(&self, u: Float) -> (Float, Float, usize) {
        let offset = self.find_interval(u);

        // Compute offset along CDF segment.
        let mut du = u - self.cdf[offset];
        if self.cdf[offset + 1] - self.cdf[offset] > 0.0 {
            du /= self.cdf[offset + 1] - self.cdf[offset];
        }
        debug_assert!(!du.is_nan());

        let pdf = if self.func_int > 0.0 {
            self.func[offset] / self.func_int
        } else {
            0.0
        };

        ((offset as Float + du) / self.count() as Float, pdf, offset)
    }

    /// Maps a sampled value in [0, 1) back to the primary sample that
    /// produces it, inverting `sample_continuous`.
    ///
    /// * `x` - A value in [0, 1).
    pub fn sample_continuous_inverse(&self, x: Float) -> Float {
        let scaled = x * self.count() as Float;
        let offset = clamp(scaled as Int, 0, self.count() as Int - 1) as usize;
        let du = scaled - offset as Float;
        self.cdf[offset] + du * (self.cdf[offset + 1] - self.cdf[offset])
    }

    /// The PDF of `sample_continuous` producing the value `x`.
    ///
    /// * `x` - A value in [0, 1).
    pub fn pdf(&self, x: Float) -> Float {
        let offset = clamp(
            (x * self.count() as Float) as Int,
            0,
            self.count() as Int - 1,
        ) as usize;
        if self.func_int > 0.0 {
            self.func[offset] / self.func_int
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_function() {
        let d = Distribution1D::new(vec![1.0; 4]);
        let (x, pdf, _) = d.sample_continuous(0.3);
        assert!((x - 0.3).abs() < 1e-5);
        assert!((pdf - 1.0).abs() < 1e-5);
    }

    #[test]
    fn continuous_round_trip() {
        let d = Distribution1D::new(vec![0.25, 1.0, 2.0, 0.5]);
        for u in [0.05, 0.3, 0.77, 0.99] {
            let (x, _, _) = d.sample_continuous(u);
            let back = d.sample_continuous_inverse(x);
            assert!((back - u).abs() < 1e-4, "{} vs {}", back, u);
        }
    }

    #[test]
    fn pdf_integrates_to_one() {
        let d = Distribution1D::new(vec![0.25, 1.0, 2.0, 0.5]);
        let n = 1000;
        let integral: Float = (0..n)
            .map(|i| d.pdf((i as Float + 0.5) / n as Float) / n as Float)
            .sum();
        assert!((integral - 1.0).abs() < 1e-3);
    }
}
