//! Anisotropic Trowbridge-Reitz (GGX) microfacet distribution.

#![allow(dead_code)]

use super::*;
use crate::base::*;
use crate::geometry::*;

/// Implements the anisotropic variant of the Trowbridge-Reitz distribution
/// with visible-normal sampling.
#[derive(Copy, Clone, Debug)]
pub struct TrowbridgeReitz {
    /// Roughness for microfacets oriented perpendicular to the x-axis.
    pub alpha_x: Float,

    /// Roughness for microfacets oriented perpendicular to the y-axis.
    pub alpha_y: Float,
}

impl TrowbridgeReitz {
    /// Create a new distribution. The roughness values are clamped to 0.001
    /// so the distribution stays finite.
    ///
    /// * `alpha_x` - Roughness along the tangent.
    /// * `alpha_y` - Roughness along the binormal.
    pub fn new(alpha_x: Float, alpha_y: Float) -> Self {
        Self {
            alpha_x: max(0.001, alpha_x),
            alpha_y: max(0.001, alpha_y),
        }
    }

    /// Return the differential area of microfacets oriented with the surface
    /// normal `wh`.
    ///
    /// * `wh` - A normal from the distribution of normal vectors.
    pub fn d(&self, wh: &Vector3f) -> Float {
        let tan2_theta = tan_2_theta(wh);
        if tan2_theta.is_infinite() {
            return 0.0;
        }
        let cos4_theta = cos_2_theta(wh) * cos_2_theta(wh);
        let e = (cos_2_phi(wh) / (self.alpha_x * self.alpha_x)
            + sin_2_phi(wh) / (self.alpha_y * self.alpha_y))
            * tan2_theta;
        1.0 / (PI * self.alpha_x * self.alpha_y * cos4_theta * (1.0 + e) * (1.0 + e))
    }

    /// Returns the invisible masked microfacet area per visible microfacet
    /// area (the separable Λ form).
    ///
    /// * `w` - The direction from the viewer.
    pub fn lambda(&self, w: &Vector3f) -> Float {
        let abs_tan_theta = abs(tan_theta(w));
        if abs_tan_theta.is_infinite() {
            return 0.0;
        }
        let alpha = (cos_2_phi(w) * self.alpha_x * self.alpha_x
            + sin_2_phi(w) * self.alpha_y * self.alpha_y)
            .sqrt();
        let alpha2_tan2_theta = (alpha * abs_tan_theta) * (alpha * abs_tan_theta);
        (-1.0 + (1.0 + alpha2_tan2_theta).sqrt()) / 2.0
    }

    /// Smith's masking function for a single direction.
    ///
    /// * `w` - The direction from the viewer.
    pub fn g1(&self, w: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(w))
    }

    /// Masking-shadowing for a pair of directions.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn g(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        1.0 / (1.0 + self.lambda(wo) + self.lambda(wi))
    }

    /// Samples a normal from the distribution of normals visible from `wo`.
    ///
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D uniform random values.
    pub fn sample_wh(&self, wo: &Vector3f, u: Vector2f) -> Vector3f {
        let flip = wo.z < 0.0;
        let wo_flipped = if flip { -(*wo) } else { *wo };
        let wh = sample_visible_normal(&wo_flipped, self.alpha_x, self.alpha_y, u.x, u.y);
        if flip {
            -wh
        } else {
            wh
        }
    }

    /// Probability density of `sample_wh` returning `wh` for the outgoing
    /// direction `wo`.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wh` - A normal from the distribution of normal vectors.
    pub fn pdf(&self, wo: &Vector3f, wh: &Vector3f) -> Float {
        self.d(wh) * self.g1(wo) * wo.abs_dot(wh) / abs_cos_theta(wo)
    }
}

/// Samples the slope-space distribution of visible normals for normalized
/// roughness, using the polynomial approximation of the inverse CDF. Falls
/// back to a uniform disc in slope space at near-normal incidence.
///
/// * `cos_theta` - Cosine of the incident angle in the stretched frame.
/// * `u1`        - The uniform random value.
/// * `u2`        - The uniform random value.
fn sample_slopes_11(cos_theta: Float, u1: Float, u2: Float) -> (Float, Float) {
    // Special case (normal incidence).
    if cos_theta > 0.9999 {
        let r = (u1 / (1.0 - u1)).sqrt();
        let phi = TWO_PI * u2;
        return (r * phi.cos(), r * phi.sin());
    }

    let sin_theta = max(0.0, 1.0 - cos_theta * cos_theta).sqrt();
    let tan_theta = sin_theta / cos_theta;
    let a = 1.0 / tan_theta;
    let g1 = 2.0 / (1.0 + (1.0 + 1.0 / (a * a)).sqrt());

    // Sample slope_x.
    let a = 2.0 * u1 / g1 - 1.0;
    let mut tmp = 1.0 / (a * a - 1.0);
    if tmp > 1e10 {
        tmp = 1e10;
    }

    let b = tan_theta;
    let d = max(b * b * tmp * tmp - (a * a - b * b) * tmp, 0.0).sqrt();
    let slope_x_1 = b * tmp - d;
    let slope_x_2 = b * tmp + d;
    let slope_x = if a < 0.0 || slope_x_2 > 1.0 / tan_theta {
        slope_x_1
    } else {
        slope_x_2
    };

    // Sample slope_y.
    let (s, u2) = if u2 > 0.5 {
        (1.0, 2.0 * (u2 - 0.5))
    } else {
        (-1.0, 2.0 * (0.5 - u2))
    };
    let z = (u2 * (u2 * (u2 * 0.27385 - 0.73369) + 0.46341))
        / (u2 * (u2 * (u2 * 0.093073 + 0.309420) - 1.000000) + 0.597999);
    let slope_y = s * z * (1.0 + slope_x * slope_x).sqrt();

    debug_assert!(slope_y.is_finite());
    (slope_x, slope_y)
}

/// Samples the visible normal distribution via the stretch, sample, rotate,
/// unstretch procedure.
///
/// * `wo`      - Outgoing direction with positive z.
/// * `alpha_x` - Roughness along the tangent.
/// * `alpha_y` - Roughness along the binormal.
/// * `u1`      - The uniform random value.
/// * `u2`      - The uniform random value.
fn sample_visible_normal(
    wo: &Vector3f,
    alpha_x: Float,
    alpha_y: Float,
    u1: Float,
    u2: Float,
) -> Vector3f {
    // 1. Stretch wo.
    let wo_stretched = Vector3f::new(alpha_x * wo.x, alpha_y * wo.y, wo.z).normalize();

    // 2. Sample the slope distribution for unit roughness.
    let (mut slope_x, mut slope_y) = sample_slopes_11(cos_theta(&wo_stretched), u1, u2);

    // 3. Rotate.
    let tmp = cos_phi(&wo_stretched) * slope_x - sin_phi(&wo_stretched) * slope_y;
    slope_y = sin_phi(&wo_stretched) * slope_x + cos_phi(&wo_stretched) * slope_y;
    slope_x = tmp;

    // 4. Unstretch.
    slope_x *= alpha_x;
    slope_y *= alpha_y;

    // 5. Compute normal.
    Vector3f::new(-slope_x, -slope_y, 1.0).normalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    #[test]
    fn alpha_is_clamped() {
        let d = TrowbridgeReitz::new(0.0, 0.0);
        assert_eq!(d.alpha_x, 0.001);
        assert_eq!(d.alpha_y, 0.001);
        // The distribution stays finite at the pole.
        let v = d.d(&Vector3f::new(0.0, 0.0, 1.0));
        assert!(v.is_finite());
    }

    #[test]
    fn sampled_normals_are_up_facing() {
        let d = TrowbridgeReitz::new(0.3, 0.3);
        let wo = Vector3f::new(0.4, -0.1, 0.9).normalize();
        let mut rng = Rng::new(11);
        for _ in 0..1000 {
            let (u1, u2) = rng.next_float_2d();
            let wh = d.sample_wh(&wo, Vector2f::new(u1, u2));
            assert!(wh.z > 0.0);
            assert!(d.pdf(&wo, &wh) > 0.0);
        }
    }

    #[test]
    fn normalization_of_visible_normals() {
        // Chi-square style check: integrating pdf over the hemisphere
        // should give 1.
        let d = TrowbridgeReitz::new(0.5, 0.5);
        let wo = Vector3f::new(0.2, 0.3, 0.8).normalize();
        let n = 64;
        let mut integral = 0.0;
        for i in 0..n {
            for j in 0..(4 * n) {
                let theta = (i as Float + 0.5) / n as Float * PI_OVER_TWO;
                let phi = (j as Float + 0.5) / (4 * n) as Float * TWO_PI;
                let wh = Vector3f::new(
                    theta.sin() * phi.cos(),
                    theta.sin() * phi.sin(),
                    theta.cos(),
                );
                let weight = theta.sin() * PI_OVER_TWO * TWO_PI / (n * 4 * n) as Float;
                integral += d.pdf(&wo, &wh) * weight;
            }
        }
        assert!((integral - 1.0).abs() < 0.02, "integral = {}", integral);
    }
}
