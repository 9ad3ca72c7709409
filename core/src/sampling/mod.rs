//! Common sampling warps and measure conversions.

#![allow(dead_code)]

mod distribution_1d;
mod distribution_2d;

// Re-export
pub use distribution_1d::*;
pub use distribution_2d::*;

use crate::base::*;
use crate::geometry::*;

/// Sample a point on a unit disc by mapping from a unit square to the unit
/// circle. The concentric mapping takes points in [-1, 1]² to the unit disc
/// by uniformly mapping concentric squares to concentric circles.
///
/// * `u` - The random sample point.
pub fn concentric_sample_disc(u: Vector2f) -> Vector2f {
    // Map uniform random numbers to [-1,1]².
    let u_offset = 2.0 * u - Vector2f::new(1.0, 1.0);

    // Handle degeneracy at the origin.
    if u_offset.x == 0.0 && u_offset.y == 0.0 {
        return Vector2f::zero();
    }

    // Apply concentric mapping to point.
    let (r, theta) = if abs(u_offset.x) > abs(u_offset.y) {
        (u_offset.x, PI_OVER_FOUR * (u_offset.y / u_offset.x))
    } else {
        (
            u_offset.y,
            PI_OVER_TWO - PI_OVER_FOUR * (u_offset.x / u_offset.y),
        )
    };

    r * Vector2f::new(theta.cos(), theta.sin())
}

/// Maps a point on the unit disc back to the primary sample that
/// `concentric_sample_disc` would use to produce it.
///
/// * `p` - Point on the unit disc.
pub fn concentric_sample_disc_inverse(p: Vector2f) -> Vector2f {
    if p.x == 0.0 && p.y == 0.0 {
        return Vector2f::new(0.5, 0.5);
    }

    let r = p.length();
    let mut phi = p.y.atan2(p.x);
    if phi < -PI_OVER_FOUR {
        phi += TWO_PI;
    }

    // Undo the per-quadrant branches of the forward map.
    let (a, b) = if phi < PI_OVER_FOUR {
        (r, phi * r / PI_OVER_FOUR)
    } else if phi < 3.0 * PI_OVER_FOUR {
        ((PI_OVER_TWO - phi) * r / PI_OVER_FOUR, r)
    } else if phi < 5.0 * PI_OVER_FOUR {
        (-r, (phi - PI) * -r / PI_OVER_FOUR)
    } else {
        ((phi - 3.0 * PI_OVER_TWO) * r / PI_OVER_FOUR, -r)
    };

    Vector2f::new((a + 1.0) * 0.5, (b + 1.0) * 0.5)
}

/// Maps a primary sample to the positive hemisphere with density cosθ/π and
/// returns the direction together with its pdf.
///
/// * `u` - The random sample point.
pub fn to_cos_hemisphere(u: Vector2f) -> (Vector3f, Float) {
    let d = concentric_sample_disc(u);
    let z = max(0.0, 1.0 - d.x * d.x - d.y * d.y).sqrt();
    (Vector3f::new(d.x, d.y, z), cosine_hemisphere_pdf(z))
}

/// Maps a direction in the positive hemisphere back to the primary sample.
/// Boundary directions (z == 0) map to valid samples on the disc rim.
///
/// * `direction` - Unit direction with non-negative z.
pub fn from_cos_hemisphere(direction: Vector3f) -> Vector2f {
    concentric_sample_disc_inverse(Vector2f::new(direction.x, direction.y))
}

/// Returns the PDF for cosine-weighted sampling a direction from a
/// hemisphere.
///
/// * `cos_theta` - Cosine term of the sampled direction.
#[inline]
pub fn cosine_hemisphere_pdf(cos_theta: Float) -> Float {
    cos_theta * INV_PI
}

/// Uniformly sample a direction from the sphere.
///
/// * `u` - The random sample point.
pub fn uniform_sample_sphere(u: Vector2f) -> Vector3f {
    let z = 1.0 - 2.0 * u.x;
    let r = max(0.0, 1.0 - z * z).sqrt();
    let phi = TWO_PI * u.y;
    Vector3f::new(r * phi.cos(), r * phi.sin(), z)
}

/// Maps a unit direction back to the primary sample of
/// `uniform_sample_sphere`.
///
/// * `direction` - Unit direction.
pub fn uniform_sample_sphere_inverse(direction: Vector3f) -> Vector2f {
    let ux = (1.0 - direction.z) * 0.5;
    let mut phi = direction.y.atan2(direction.x);
    if phi < 0.0 {
        phi += TWO_PI;
    }
    Vector2f::new(ux, phi * INV_TWO_PI)
}

/// Returns the PDF for uniformly sampling a direction from the sphere.
#[inline]
pub fn uniform_sphere_pdf() -> Float {
    INV_FOUR_PI
}

/// Converts a probability density with respect to surface area at `to` into
/// the solid-angle density, measured at `from`, of the ray connecting the
/// two points: |cos θ_to| / ‖to - from‖², where θ_to is measured against the
/// geometric normal at `to`.
///
/// * `from` - The point the connecting ray starts at.
/// * `to`   - The point carrying the surface-area density.
pub fn surface_area_to_solid_angle(from: &SurfacePoint, to: &SurfacePoint) -> Float {
    let dir = from.position - to.position;
    let dist_squared = dir.length_squared();
    if dist_squared == 0.0 {
        return 0.0;
    }
    to.normal.abs_dot(&(dir / dist_squared.sqrt())) / dist_squared
}

/// Builds the tangent and binormal of an orthonormal right-handed basis
/// around a unit normal, using the branchless construction of Duff et al.
///
/// * `normal` - Unit normal, becomes the third basis vector.
pub fn compute_basis_vectors(normal: Vector3f) -> (Vector3f, Vector3f) {
    let sign = if normal.z >= 0.0 { 1.0 } else { -1.0 };
    let a = -1.0 / (sign + normal.z);
    let b = normal.x * normal.y * a;

    let tangent = Vector3f::new(
        1.0 + sign * normal.x * normal.x * a,
        sign * b,
        -sign * normal.x,
    );
    let binormal = Vector3f::new(b, sign + normal.y * normal.y * a, -normal.y);

    (tangent, binormal)
}

/// Weight samples using the balance heuristic.
///
/// * `nf`    - Number of samples taken from `f_pdf`.
/// * `f_pdf` - First sampling distribution.
/// * `ng`    - Number of samples taken from `g_pdf`.
/// * `g_pdf` - Second sampling distribution.
#[inline]
pub fn balance_heuristic(nf: Int, f_pdf: Float, ng: Int, g_pdf: Float) -> Float {
    (nf as Float * f_pdf) / (nf as Float * f_pdf + ng as Float * g_pdf)
}
