//! The individual shading-space lobes of the generic material.
//!
//! Every lobe exposes the same three operations: `evaluate`, `sample` and
//! `pdf`, where `pdf` returns the density of the sampled direction and the
//! density of sampling the outgoing direction from the incident one. The
//! reverse density is what bidirectional weighting needs.
//!
//! Degenerate configurations (grazing incidence, a zero half vector, total
//! internal reflection) yield a zero value and zero densities; callers treat
//! that as a failed sample.

#![allow(dead_code)]

use super::*;
use crate::base::*;
use crate::geometry::*;
use crate::sampling::*;
use crate::spectrum::RgbColor;

/// Retro-reflection weighted diffuse lobe of the Disney BRDF.
#[derive(Copy, Clone, Debug)]
pub struct DisneyDiffuse {
    /// Diffuse reflectance.
    pub reflectance: RgbColor,
}

impl DisneyDiffuse {
    /// Returns the value of the lobe for the given pair of directions.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn evaluate(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> RgbColor {
        if !same_hemisphere(wo, wi) {
            return RgbColor::BLACK;
        }
        let fo = schlick_weight(abs_cos_theta(wo));
        let fi = schlick_weight(abs_cos_theta(wi));
        self.reflectance * INV_PI * (1.0 - fo / 2.0) * (1.0 - fi / 2.0)
    }

    /// Samples an incident direction on the hemisphere of `wo` with cosine
    /// density.
    ///
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D uniform random values.
    pub fn sample(&self, wo: &Vector3f, _is_on_light_subpath: bool, u: Vector2f) -> Option<Vector3f> {
        let (mut wi, _) = to_cos_hemisphere(u);
        if wo.z < 0.0 {
            wi.z = -wi.z;
        }
        if wi.z == 0.0 || wo.z == 0.0 {
            return None;
        }
        Some(wi)
    }

    /// Forward and reverse density of the cosine sampling.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> (Float, Float) {
        if !same_hemisphere(wo, wi) {
            return (0.0, 0.0);
        }
        (
            cosine_hemisphere_pdf(abs_cos_theta(wi)),
            cosine_hemisphere_pdf(abs_cos_theta(wo)),
        )
    }
}

/// Retro-reflection lobe of the Disney BRDF.
#[derive(Copy, Clone, Debug)]
pub struct DisneyRetro {
    /// Retro reflectance.
    pub reflectance: RgbColor,

    /// Scalar roughness in [0, 1].
    pub roughness: Float,
}

impl DisneyRetro {
    /// Returns the value of the lobe for the given pair of directions.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn evaluate(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> RgbColor {
        if !same_hemisphere(wo, wi) {
            return RgbColor::BLACK;
        }
        let wh = *wi + *wo;
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return RgbColor::BLACK;
        }
        let wh = wh.normalize();
        let cos_theta_d = wi.dot(&wh);

        let fo = schlick_weight(abs_cos_theta(wo));
        let fi = schlick_weight(abs_cos_theta(wi));
        let rr = 2.0 * self.roughness * cos_theta_d * cos_theta_d;

        self.reflectance * INV_PI * rr * (fo + fi + fo * fi * (rr - 1.0))
    }

    /// Samples an incident direction, cosine distributed like the diffuse
    /// lobe.
    ///
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D uniform random values.
    pub fn sample(&self, wo: &Vector3f, _is_on_light_subpath: bool, u: Vector2f) -> Option<Vector3f> {
        let (mut wi, _) = to_cos_hemisphere(u);
        if wo.z < 0.0 {
            wi.z = -wi.z;
        }
        if wi.z == 0.0 || wo.z == 0.0 {
            return None;
        }
        Some(wi)
    }

    /// Forward and reverse density of the cosine sampling.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> (Float, Float) {
        if !same_hemisphere(wo, wi) {
            return (0.0, 0.0);
        }
        (
            cosine_hemisphere_pdf(abs_cos_theta(wi)),
            cosine_hemisphere_pdf(abs_cos_theta(wo)),
        )
    }
}

/// Thin-surface diffuse transmission: a cosine lobe on the hemisphere
/// opposite the outgoing direction. Reciprocal.
#[derive(Copy, Clone, Debug)]
pub struct DiffuseTransmission {
    /// Transmittance.
    pub transmittance: RgbColor,
}

impl DiffuseTransmission {
    /// Returns the value of the lobe for the given pair of directions.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn evaluate(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> RgbColor {
        if same_hemisphere(wo, wi) {
            return RgbColor::BLACK;
        }
        self.transmittance * INV_PI
    }

    /// Samples an incident direction on the hemisphere opposite `wo` with
    /// cosine density.
    ///
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D uniform random values.
    pub fn sample(&self, wo: &Vector3f, _is_on_light_subpath: bool, u: Vector2f) -> Option<Vector3f> {
        let (mut wi, _) = to_cos_hemisphere(u);
        if wo.z > 0.0 {
            wi.z = -wi.z;
        }
        if wi.z == 0.0 || wo.z == 0.0 {
            return None;
        }
        Some(wi)
    }

    /// Forward and reverse density of the flipped cosine sampling.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> (Float, Float) {
        if same_hemisphere(wo, wi) {
            return (0.0, 0.0);
        }
        (
            cosine_hemisphere_pdf(abs_cos_theta(wi)),
            cosine_hemisphere_pdf(abs_cos_theta(wo)),
        )
    }
}

/// Microfacet reflection with a Trowbridge-Reitz distribution and the
/// blended Fresnel term of the generic material.
#[derive(Copy, Clone, Debug)]
pub struct MicrofacetReflection {
    /// Tint applied on top of the Fresnel term.
    pub tint: RgbColor,

    /// The microfacet distribution.
    pub distribution: TrowbridgeReitz,

    /// Blended Fresnel term.
    pub fresnel: DisneyFresnel,
}

impl MicrofacetReflection {
    /// Returns the value of the lobe for the given pair of directions.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn evaluate(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> RgbColor {
        if !same_hemisphere(wo, wi) {
            return RgbColor::BLACK;
        }
        let cos_theta_o = abs_cos_theta(wo);
        let cos_theta_i = abs_cos_theta(wi);
        let wh = *wi + *wo;
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
            return RgbColor::BLACK;
        }
        if wh.x == 0.0 && wh.y == 0.0 && wh.z == 0.0 {
            return RgbColor::BLACK;
        }
        let wh = wh.normalize();

        // Evaluate the Fresnel term with wh oriented into the upper
        // hemisphere so total internal reflection is handled correctly.
        let f = self
            .fresnel
            .evaluate(wi.dot(&wh.face_forward(&Vector3f::new(0.0, 0.0, 1.0))));

        self.tint * f * self.distribution.d(&wh) * self.distribution.g(wo, wi)
            / (4.0 * cos_theta_i * cos_theta_o)
    }

    /// Samples the visible-normal distribution and reflects `wo` about the
    /// sampled half vector.
    ///
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D uniform random values.
    pub fn sample(&self, wo: &Vector3f, _is_on_light_subpath: bool, u: Vector2f) -> Option<Vector3f> {
        if wo.z == 0.0 {
            return None;
        }
        let wh = self.distribution.sample_wh(wo, u);
        if wo.dot(&wh) < 0.0 {
            // Should be rare.
            return None;
        }
        let wi = reflect(wo, &wh);
        if !same_hemisphere(wo, &wi) {
            return None;
        }
        Some(wi)
    }

    /// Density of one reflection direction, without the reverse.
    fn pdf_dir(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if !same_hemisphere(wo, wi) {
            return 0.0;
        }
        let wh = (*wo + *wi).normalize();
        let dot = wo.dot(&wh);
        if dot <= 0.0 {
            return 0.0;
        }
        self.distribution.pdf(wo, &wh) / (4.0 * dot)
    }

    /// Forward and reverse density of the half-vector sampling.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> (Float, Float) {
        (self.pdf_dir(wo, wi), self.pdf_dir(wi, wo))
    }
}

/// Microfacet transmission through a rough dielectric interface, in the
/// Walter et al. form.
#[derive(Copy, Clone, Debug)]
pub struct MicrofacetTransmission {
    /// Transmittance scale.
    pub transmittance: RgbColor,

    /// The microfacet distribution.
    pub distribution: TrowbridgeReitz,

    /// Index of refraction above the surface (same side as the normal).
    pub eta_a: Float,

    /// Index of refraction below the surface.
    pub eta_b: Float,
}

impl MicrofacetTransmission {
    /// Returns the value of the lobe for the given pair of directions.
    /// Radiance transport (camera paths) carries the 1/η² compression of
    /// solid angles; importance transport does not, which is the
    /// non-reciprocal part of this lobe.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn evaluate(&self, wo: &Vector3f, wi: &Vector3f, is_on_light_subpath: bool) -> RgbColor {
        if same_hemisphere(wo, wi) {
            return RgbColor::BLACK;
        }
        let cos_theta_o = cos_theta(wo);
        let cos_theta_i = cos_theta(wi);
        if cos_theta_i == 0.0 || cos_theta_o == 0.0 {
            return RgbColor::BLACK;
        }

        let eta = if cos_theta_o > 0.0 {
            self.eta_b / self.eta_a
        } else {
            self.eta_a / self.eta_b
        };
        let mut wh = (*wo + *wi * eta).normalize();
        if wh.z < 0.0 {
            wh = -wh;
        }
        if wo.dot(&wh) * wi.dot(&wh) > 0.0 {
            return RgbColor::BLACK;
        }

        let f = fr_dielectric(wo.dot(&wh), self.eta_a, self.eta_b);
        let sqrt_denom = wo.dot(&wh) + eta * wi.dot(&wh);
        let factor = if is_on_light_subpath { 1.0 } else { 1.0 / eta };

        self.transmittance
            * (1.0 - f)
            * abs(self.distribution.d(&wh)
                * self.distribution.g(wo, wi)
                * eta
                * eta
                * wi.abs_dot(&wh)
                * wo.abs_dot(&wh)
                * factor
                * factor
                / (cos_theta_i * cos_theta_o * sqrt_denom * sqrt_denom))
    }

    /// Samples the visible-normal distribution and refracts `wo` through the
    /// sampled half vector. Total internal reflection fails the sample.
    ///
    /// * `wo` - Outgoing direction.
    /// * `u`  - The 2D uniform random values.
    pub fn sample(&self, wo: &Vector3f, _is_on_light_subpath: bool, u: Vector2f) -> Option<Vector3f> {
        if wo.z == 0.0 {
            return None;
        }
        let wh = self.distribution.sample_wh(wo, u);
        if wo.dot(&wh) < 0.0 {
            // Should be rare.
            return None;
        }
        let eta = if cos_theta(wo) > 0.0 {
            self.eta_a / self.eta_b
        } else {
            self.eta_b / self.eta_a
        };
        let wi = refract(wo, &wh.face_forward(wo), eta)?;
        if wi.z == 0.0 || same_hemisphere(wo, &wi) {
            return None;
        }
        Some(wi)
    }

    /// Density of one refraction direction, without the reverse.
    fn pdf_dir(&self, wo: &Vector3f, wi: &Vector3f) -> Float {
        if same_hemisphere(wo, wi) {
            return 0.0;
        }
        let eta = if cos_theta(wo) > 0.0 {
            self.eta_b / self.eta_a
        } else {
            self.eta_a / self.eta_b
        };
        let wh = (*wo + *wi * eta).normalize();
        if wo.dot(&wh) * wi.dot(&wh) > 0.0 {
            return 0.0;
        }

        // Change of variables dwh/dwi for refraction through wh.
        let sqrt_denom = wo.dot(&wh) + eta * wi.dot(&wh);
        let dwh_dwi = abs((eta * eta * wi.dot(&wh)) / (sqrt_denom * sqrt_denom));
        self.distribution.pdf(wo, &wh) * dwh_dwi
    }

    /// Forward and reverse density of the refraction sampling.
    ///
    /// * `wo` - Outgoing direction.
    /// * `wi` - Incident direction.
    pub fn pdf(&self, wo: &Vector3f, wi: &Vector3f, _is_on_light_subpath: bool) -> (Float, Float) {
        (self.pdf_dir(wo, wi), self.pdf_dir(wi, wo))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    fn sample_pdf_consistency<S, P>(sample: S, pdf: P)
    where
        S: Fn(&Vector3f, Vector2f) -> Option<Vector3f>,
        P: Fn(&Vector3f, &Vector3f) -> (Float, Float),
    {
        let mut rng = Rng::new(99);
        let mut checked = 0;
        while checked < 1000 {
            let (a, b, c) = rng.next_float_3d();
            let wo = Vector3f::new(a * 2.0 - 1.0, b * 2.0 - 1.0, max(0.05, c)).normalize();
            let (u1, u2) = rng.next_float_2d();
            if let Some(wi) = sample(&wo, Vector2f::new(u1, u2)) {
                let (fwd, rev) = pdf(&wo, &wi);
                assert!(fwd > 0.0, "forward pdf of a sampled direction is zero");
                // Reverse direction: pdf of wo as seen from wi.
                let (fwd_swapped, _) = pdf(&wi, &wo);
                assert!(
                    (rev - fwd_swapped).abs() <= 1e-3 * fwd_swapped.max(1.0),
                    "reverse pdf {} does not match swapped forward pdf {}",
                    rev,
                    fwd_swapped
                );
                checked += 1;
            }
        }
    }

    #[test]
    fn diffuse_sample_pdf_consistency() {
        let lobe = DisneyDiffuse {
            reflectance: RgbColor::gray(0.5),
        };
        sample_pdf_consistency(
            |wo, u| lobe.sample(wo, false, u),
            |wo, wi| lobe.pdf(wo, wi, false),
        );
    }

    #[test]
    fn retro_sample_pdf_consistency() {
        let lobe = DisneyRetro {
            reflectance: RgbColor::gray(0.5),
            roughness: 0.4,
        };
        sample_pdf_consistency(
            |wo, u| lobe.sample(wo, false, u),
            |wo, wi| lobe.pdf(wo, wi, false),
        );
    }

    #[test]
    fn diffuse_transmission_flips_hemisphere() {
        let lobe = DiffuseTransmission {
            transmittance: RgbColor::gray(0.5),
        };
        let wo = Vector3f::new(0.1, 0.2, 0.9).normalize();
        let mut rng = Rng::new(3);
        for _ in 0..100 {
            let (u1, u2) = rng.next_float_2d();
            let wi = lobe.sample(&wo, false, Vector2f::new(u1, u2)).unwrap();
            assert!(wi.z < 0.0);
            let (fwd, rev) = lobe.pdf(&wo, &wi, false);
            assert!(fwd > 0.0 && rev > 0.0);
        }
    }

    #[test]
    fn microfacet_reflection_sample_pdf_consistency() {
        let lobe = MicrofacetReflection {
            tint: RgbColor::WHITE,
            distribution: TrowbridgeReitz::new(0.2, 0.2),
            fresnel: DisneyFresnel {
                r0: RgbColor::gray(0.04),
                metallic: 0.0,
                base_color: RgbColor::gray(0.5),
            },
        };
        sample_pdf_consistency(
            |wo, u| lobe.sample(wo, false, u),
            |wo, wi| lobe.pdf(wo, wi, false),
        );
    }

    #[test]
    fn microfacet_transmission_crosses_hemisphere() {
        let lobe = MicrofacetTransmission {
            transmittance: RgbColor::WHITE,
            distribution: TrowbridgeReitz::new(0.1, 0.1),
            eta_a: 1.0,
            eta_b: 1.45,
        };
        let wo = Vector3f::new(0.3, 0.1, 0.95).normalize();
        let mut rng = Rng::new(5);
        let mut found = 0;
        for _ in 0..200 {
            let (u1, u2) = rng.next_float_2d();
            if let Some(wi) = lobe.sample(&wo, false, Vector2f::new(u1, u2)) {
                assert!(wi.z < 0.0);
                let (fwd, rev) = lobe.pdf(&wo, &wi, false);
                assert!(fwd > 0.0);
                let (swapped, _) = lobe.pdf(&wi, &wo, false);
                assert!((rev - swapped).abs() <= 1e-3 * swapped.max(1.0));
                found += 1;
            }
        }
        assert!(found > 100);
    }

    #[test]
    fn grazing_directions_have_zero_pdf() {
        let lobe = MicrofacetReflection {
            tint: RgbColor::WHITE,
            distribution: TrowbridgeReitz::new(0.3, 0.3),
            fresnel: DisneyFresnel {
                r0: RgbColor::gray(0.04),
                metallic: 0.0,
                base_color: RgbColor::gray(0.5),
            },
        };
        let wo = Vector3f::new(1.0, 0.0, 0.0);
        assert!(lobe.sample(&wo, false, Vector2f::new(0.4, 0.6)).is_none() || {
            let wi = lobe.sample(&wo, false, Vector2f::new(0.4, 0.6)).unwrap();
            let (fwd, _) = lobe.pdf(&wo, &wi, false);
            fwd == 0.0
        });
    }
}
