//! Shading space: the local reflectance frame and its trigonometry.
//!
//! Shading space is a right-handed orthonormal frame at a surface point with
//! +z aligned with the shading normal. All BSDF lobes operate in this space.

#![allow(dead_code)]

mod fresnel;
mod generic_material;
mod lobes;
mod microfacet;

// Re-export
pub use fresnel::*;
pub use generic_material::*;
pub use lobes::*;
pub use microfacet::*;

use crate::base::*;
use crate::geometry::*;
use crate::sampling::compute_basis_vectors;

/// The orthonormal local frame at a surface point. Conversions in either
/// direction preserve length.
#[derive(Copy, Clone, Debug)]
pub struct ShadingFrame {
    /// First basis vector, lies in the surface.
    pub tangent: Vector3f,

    /// Second basis vector, lies in the surface.
    pub binormal: Vector3f,

    /// Third basis vector, the shading normal.
    pub normal: Vector3f,
}

impl ShadingFrame {
    /// Builds the frame around a unit shading normal.
    ///
    /// * `normal` - The unit shading normal.
    pub fn new(normal: Vector3f) -> Self {
        let (tangent, binormal) = compute_basis_vectors(normal);
        Self {
            tangent,
            binormal,
            normal,
        }
    }

    /// Transforms a world space vector into shading space.
    ///
    /// * `v` - World space vector.
    pub fn world_to_shading(&self, v: Vector3f) -> Vector3f {
        Vector3f::new(
            self.tangent.dot(&v),
            self.binormal.dot(&v),
            self.normal.dot(&v),
        )
    }

    /// Transforms a shading space vector back to world space.
    ///
    /// * `v` - Shading space vector.
    pub fn shading_to_world(&self, v: Vector3f) -> Vector3f {
        self.tangent * v.x + self.binormal * v.y + self.normal * v.z
    }
}

/// Cosine of the angle θ between a shading space direction and the normal.
#[inline]
pub fn cos_theta(w: &Vector3f) -> Float {
    w.z
}

/// Squared cosine of θ.
#[inline]
pub fn cos_2_theta(w: &Vector3f) -> Float {
    w.z * w.z
}

/// Absolute cosine of θ.
#[inline]
pub fn abs_cos_theta(w: &Vector3f) -> Float {
    abs(w.z)
}

/// Squared sine of θ.
#[inline]
pub fn sin_2_theta(w: &Vector3f) -> Float {
    max(0.0, 1.0 - cos_2_theta(w))
}

/// Sine of θ.
#[inline]
pub fn sin_theta(w: &Vector3f) -> Float {
    sin_2_theta(w).sqrt()
}

/// Tangent of θ.
#[inline]
pub fn tan_theta(w: &Vector3f) -> Float {
    sin_theta(w) / cos_theta(w)
}

/// Squared tangent of θ.
#[inline]
pub fn tan_2_theta(w: &Vector3f) -> Float {
    sin_2_theta(w) / cos_2_theta(w)
}

/// Cosine of the azimuth angle Φ of a shading space direction.
#[inline]
pub fn cos_phi(w: &Vector3f) -> Float {
    let s = sin_theta(w);
    if s == 0.0 {
        1.0
    } else {
        clamp(w.x / s, -1.0, 1.0)
    }
}

/// Squared cosine of Φ.
#[inline]
pub fn cos_2_phi(w: &Vector3f) -> Float {
    let c = cos_phi(w);
    c * c
}

/// Sine of the azimuth angle Φ of a shading space direction.
#[inline]
pub fn sin_phi(w: &Vector3f) -> Float {
    let s = sin_theta(w);
    if s == 0.0 {
        0.0
    } else {
        clamp(w.y / s, -1.0, 1.0)
    }
}

/// Squared sine of Φ.
#[inline]
pub fn sin_2_phi(w: &Vector3f) -> Float {
    let s = sin_phi(w);
    s * s
}

/// Returns `true` if two shading space directions are in the same
/// hemisphere.
#[inline]
pub fn same_hemisphere(a: &Vector3f, b: &Vector3f) -> bool {
    a.z * b.z > 0.0
}

/// Computes the reflection of a vector around a normal.
///
/// * `wo` - Vector to reflect.
/// * `n`  - Normal.
#[inline]
pub fn reflect(wo: &Vector3f, n: &Vector3f) -> Vector3f {
    -(*wo) + 2.0 * wo.dot(n) * *n
}

/// Computes the refracted direction, given incident direction `wi`, a normal
/// `n` in the same hemisphere as `wi`, and the relative index of refraction
/// `eta`. Returns `None` on total internal reflection.
///
/// * `wi`  - Incident direction.
/// * `n`   - Surface normal on the side of `wi`.
/// * `eta` - Ratio of indices of refraction of the incident and transmitted
///           media.
pub fn refract(wi: &Vector3f, n: &Vector3f, eta: Float) -> Option<Vector3f> {
    // Compute cos(theta_t) using Snell's law.
    let cos_theta_i = n.dot(wi);
    let sin_2_theta_i = max(0.0, 1.0 - cos_theta_i * cos_theta_i);
    let sin_2_theta_t = eta * eta * sin_2_theta_i;

    // Handle total internal reflection for transmission.
    if sin_2_theta_t >= 1.0 {
        None
    } else {
        let cos_theta_t = (1.0 - sin_2_theta_t).sqrt();
        Some(eta * -(*wi) + (eta * cos_theta_i - cos_theta_t) * *n)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::uniform_sample_sphere;
    use proptest::prelude::*;

    fn unit_square() -> impl Strategy<Value = Vector2f> {
        (0.001f32..0.999, 0.001f32..0.999).prop_map(|(x, y)| Vector2f::new(x, y))
    }

    proptest! {
        #[test]
        fn frame_round_trip_is_isometry(un in unit_square(), uv in unit_square()) {
            let frame = ShadingFrame::new(uniform_sample_sphere(un));
            let v = uniform_sample_sphere(uv) * 3.0;
            let local = frame.world_to_shading(v);
            prop_assert!((local.length() - v.length()).abs() < 1e-3);
            let back = frame.shading_to_world(local);
            prop_assert!((back - v).length() < 1e-3);
        }
    }

    #[test]
    fn reflect_mirrors_z() {
        let wo = Vector3f::new(0.3, -0.2, 0.8).normalize();
        let r = reflect(&wo, &Vector3f::new(0.0, 0.0, 1.0));
        assert!((r.x + wo.x).abs() < 1e-6);
        assert!((r.y + wo.y).abs() < 1e-6);
        assert!((r.z - wo.z).abs() < 1e-6);
    }

    #[test]
    fn refract_straight_through() {
        let wi = Vector3f::new(0.0, 0.0, 1.0);
        let wt = refract(&wi, &Vector3f::new(0.0, 0.0, 1.0), 1.0 / 1.5).unwrap();
        assert!((wt + wi).length() < 1e-6);
    }
}
