//! Fresnel terms for the generic material.

#![allow(dead_code)]

use crate::base::*;
use crate::spectrum::RgbColor;

/// Schlick's weight (1 - cosθ)^5.
///
/// * `cos_theta` - Cosine of the angle to the normal.
#[inline]
pub fn schlick_weight(cos_theta: Float) -> Float {
    let m = clamp(1.0 - cos_theta, 0.0, 1.0);
    let m2 = m * m;
    m2 * m2 * m
}

/// Schlick's approximation of the Fresnel reflectance for a reflectance at
/// normal incidence.
///
/// * `r0`        - Reflectance at normal incidence.
/// * `cos_theta` - Cosine of the angle to the normal.
#[inline]
pub fn fr_schlick(r0: RgbColor, cos_theta: Float) -> RgbColor {
    r0.lerp(schlick_weight(cos_theta), RgbColor::WHITE)
}

/// Reflectance at normal incidence of a dielectric interface against vacuum.
///
/// * `eta` - Index of refraction of the interior medium.
#[inline]
pub fn schlick_r0_from_eta(eta: Float) -> Float {
    let r = (eta - 1.0) / (eta + 1.0);
    r * r
}

/// Full Fresnel reflectance of a dielectric interface.
///
/// * `cos_theta_i` - Cosine between incident direction and normal; negative
///                   when arriving from the interior side.
/// * `eta_i`       - Index of refraction on the incident side.
/// * `eta_t`       - Index of refraction on the transmitted side.
pub fn fr_dielectric(cos_theta_i: Float, eta_i: Float, eta_t: Float) -> Float {
    let mut cos_theta_i = clamp(cos_theta_i, -1.0, 1.0);
    let (eta_i, eta_t) = if cos_theta_i > 0.0 {
        (eta_i, eta_t)
    } else {
        cos_theta_i = -cos_theta_i;
        (eta_t, eta_i)
    };

    // Compute cos(theta_t) using Snell's law.
    let sin_theta_i = max(0.0, 1.0 - cos_theta_i * cos_theta_i).sqrt();
    let sin_theta_t = eta_i / eta_t * sin_theta_i;

    // Handle total internal reflection.
    if sin_theta_t >= 1.0 {
        return 1.0;
    }

    let cos_theta_t = max(0.0, 1.0 - sin_theta_t * sin_theta_t).sqrt();
    let r_parl = ((eta_t * cos_theta_i) - (eta_i * cos_theta_t))
        / ((eta_t * cos_theta_i) + (eta_i * cos_theta_t));
    let r_perp = ((eta_i * cos_theta_i) - (eta_t * cos_theta_t))
        / ((eta_i * cos_theta_i) + (eta_t * cos_theta_t));
    (r_parl * r_parl + r_perp * r_perp) * 0.5
}

/// The blended Fresnel term of the generic material: a dielectric Schlick
/// reflectance with R0 derived from the index of refraction and tinted by
/// the specular tint, mixed towards a metallic base-color tint.
#[derive(Copy, Clone, Debug)]
pub struct DisneyFresnel {
    /// Dielectric reflectance color at normal incidence.
    pub r0: RgbColor,

    /// Metallic blend parameter.
    pub metallic: Float,

    /// Base color used by the metallic term.
    pub base_color: RgbColor,
}

impl DisneyFresnel {
    /// Evaluates the blended reflectance.
    ///
    /// * `cos_theta` - Cosine between the direction and the half vector.
    pub fn evaluate(&self, cos_theta: Float) -> RgbColor {
        let dielectric = fr_schlick(self.r0, abs(cos_theta));
        let metallic = fr_schlick(self.base_color, abs(cos_theta));
        dielectric.lerp(self.metallic, metallic)
    }
}
