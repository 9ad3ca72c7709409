//! The generic uber material: a Disney-style BSDF composed of five lobes.
//!
//! The lobes are concrete value types composed by field; the set is fixed,
//! so there is no dynamic dispatch anywhere on the shading path. The
//! material owns the importance-sampling decision between lobes and
//! aggregates the forward and reverse densities over all of them, so that
//! the density returned by `sample` always matches `pdf` exactly.

use super::*;
use crate::base::*;
use crate::geometry::*;
use crate::spectrum::RgbColor;
use crate::texture::{RgbTexture, ScalarTexture};

/// User-facing parameters of the generic material.
#[derive(Clone)]
pub struct MaterialParameters {
    /// Base color texture.
    pub base_color: RgbTexture,

    /// Scalar roughness texture: 0 is specular, 1 is diffuse.
    pub roughness: ScalarTexture,

    /// Anisotropy of the microfacet distribution in [0, 1].
    pub anisotropic: Float,

    /// Metallic blend in [0, 1].
    pub metallic: Float,

    /// How much the specular reflection is tinted by the base color, [0, 1].
    pub specular_tint_strength: Float,

    /// Index of refraction of the interior, at least 1.
    pub index_of_refraction: Float,

    /// Amount of specular transmission in [0, 1].
    pub specular_transmittance: Float,

    /// Amount of diffuse transmission in [0, 1], only used by thin surfaces.
    pub diffuse_transmittance: Float,

    /// Models a thin sheet instead of a solid interface.
    pub thin: bool,
}

impl Default for MaterialParameters {
    fn default() -> Self {
        Self {
            base_color: RgbTexture::constant(RgbColor::gray(0.5)),
            roughness: ScalarTexture::constant(0.5),
            anisotropic: 0.0,
            metallic: 0.0,
            specular_tint_strength: 0.0,
            index_of_refraction: 1.45,
            specular_transmittance: 0.0,
            diffuse_transmittance: 0.0,
            thin: false,
        }
    }
}

/// A sampled continuation direction with its aggregated densities.
#[derive(Copy, Clone, Debug)]
pub struct BsdfSample {
    /// Sampled incident direction in world space.
    pub direction: Vector3f,

    /// Density of the sampled direction, aggregated over all lobes with
    /// their selection weights. Solid-angle measure.
    pub pdf_forward: Float,

    /// Density of sampling the outgoing direction from the sampled one,
    /// aggregated with the mirrored selection weights. Solid-angle measure.
    pub pdf_reverse: Float,

    /// BSDF value times cosine divided by the forward density, including the
    /// non-reciprocal corrections of the transport direction.
    pub weight: RgbColor,
}

/// Per-hit lobe instances derived from the textured parameters.
struct LocalParams {
    diffuse: DisneyDiffuse,
    retro: DisneyRetro,
    diffuse_transmission: Option<DiffuseTransmission>,
    reflection: MicrofacetReflection,
    transmission: Option<MicrofacetTransmission>,
    diffuse_weight: Float,
    diffuse_transmittance: Float,
    thin: bool,
}

/// Normalized lobe selection probabilities for one outgoing direction.
#[derive(Copy, Clone, Default)]
struct SelectionWeights {
    diffuse: Float,
    retro: Float,
    diffuse_transmission: Float,
    reflection: Float,
    transmission: Float,
}

/// The generic material.
#[derive(Clone)]
pub struct GenericMaterial {
    /// The parameters the lobes are derived from.
    pub parameters: MaterialParameters,
}

impl GenericMaterial {
    /// Creates a material from its parameters.
    ///
    /// * `parameters` - The material parameters.
    pub fn new(parameters: MaterialParameters) -> Self {
        Self { parameters }
    }

    /// Derives the lobes for a hit point.
    fn compute_local_params(&self, point: &SurfacePoint) -> LocalParams {
        let p = &self.parameters;
        let base_color = p.base_color.evaluate(point.uv);
        let roughness = clamp(p.roughness.evaluate(point.uv), 0.0, 1.0);

        let luminance = base_color.luminance();
        let color_tint = if luminance > 0.0 {
            base_color / luminance
        } else {
            RgbColor::WHITE
        };
        let specular_tint = RgbColor::WHITE.lerp(p.specular_tint_strength, color_tint);

        let diffuse_weight = (1.0 - p.metallic) * (1.0 - p.specular_transmittance);

        let aspect = (1.0 - 0.9 * p.anisotropic).sqrt();
        let alpha = roughness * roughness;
        let distribution = TrowbridgeReitz::new(alpha / aspect, alpha * aspect);

        let fresnel = DisneyFresnel {
            r0: specular_tint * schlick_r0_from_eta(p.index_of_refraction),
            metallic: p.metallic,
            base_color,
        };

        let diffuse_reflectance = if p.thin {
            base_color * (diffuse_weight * (1.0 - p.diffuse_transmittance))
        } else {
            base_color * diffuse_weight
        };

        let diffuse_transmission = if p.thin && p.diffuse_transmittance > 0.0 {
            Some(DiffuseTransmission {
                transmittance: base_color * (diffuse_weight * p.diffuse_transmittance),
            })
        } else {
            None
        };

        let transmission = if p.specular_transmittance > 0.0 {
            // Thin surfaces scatter more diffusely when refracting; Burley's
            // remapping widens the distribution accordingly.
            let trans_distribution = if p.thin {
                let rscaled = (0.65 * p.index_of_refraction - 0.35) * roughness;
                let talpha = rscaled * rscaled;
                TrowbridgeReitz::new(talpha / aspect, talpha * aspect)
            } else {
                distribution
            };
            Some(MicrofacetTransmission {
                transmittance: base_color.sqrt() * p.specular_transmittance,
                distribution: trans_distribution,
                eta_a: 1.0,
                eta_b: p.index_of_refraction,
            })
        } else {
            None
        };

        LocalParams {
            diffuse: DisneyDiffuse {
                reflectance: diffuse_reflectance,
            },
            retro: DisneyRetro {
                reflectance: base_color * diffuse_weight,
                roughness,
            },
            diffuse_transmission,
            reflection: MicrofacetReflection {
                tint: RgbColor::WHITE,
                distribution,
                fresnel,
            },
            transmission,
            diffuse_weight,
            diffuse_transmittance: p.diffuse_transmittance,
            thin: p.thin,
        }
    }

    /// Computes the normalized lobe selection probabilities for an outgoing
    /// direction. The specular split follows the Fresnel luminance at that
    /// direction; using the incident direction instead yields the mirrored
    /// weights needed for the reverse density.
    fn selection_weights(local: &LocalParams, cos_theta_out: Float) -> SelectionWeights {
        let mut w = SelectionWeights::default();

        if local.thin {
            w.diffuse_transmission = local.diffuse_weight * local.diffuse_transmittance;
            let shared = local.diffuse_weight * (1.0 - local.diffuse_transmittance);
            w.diffuse = 0.5 * shared;
            w.retro = 0.5 * shared;
        } else {
            w.diffuse = 0.5 * local.diffuse_weight;
            w.retro = 0.5 * local.diffuse_weight;
        }

        let specular = 1.0 - local.diffuse_weight;
        let f = clamp(
            local
                .reflection
                .fresnel
                .evaluate(abs(cos_theta_out))
                .luminance(),
            0.0,
            1.0,
        );
        if local.transmission.is_some() {
            w.reflection = specular * f;
            w.transmission = specular * (1.0 - f);
        } else {
            w.reflection = specular;
        }

        let sum = w.diffuse + w.retro + w.diffuse_transmission + w.reflection + w.transmission;
        if sum > 0.0 {
            w.diffuse /= sum;
            w.retro /= sum;
            w.diffuse_transmission /= sum;
            w.reflection /= sum;
            w.transmission /= sum;
        } else {
            w.diffuse = 1.0;
        }
        w
    }

    /// Sums the lobe values in shading space.
    fn evaluate_local(
        local: &LocalParams,
        wo: &Vector3f,
        wi: &Vector3f,
        is_on_light_subpath: bool,
    ) -> RgbColor {
        let mut value = local.diffuse.evaluate(wo, wi, is_on_light_subpath)
            + local.retro.evaluate(wo, wi, is_on_light_subpath)
            + local.reflection.evaluate(wo, wi, is_on_light_subpath);
        if let Some(dt) = &local.diffuse_transmission {
            value += dt.evaluate(wo, wi, is_on_light_subpath);
        }
        if let Some(t) = &local.transmission {
            value += t.evaluate(wo, wi, is_on_light_subpath);
        }
        value
    }

    /// Aggregates the forward and reverse densities over all lobes.
    fn pdf_local(
        local: &LocalParams,
        wo: &Vector3f,
        wi: &Vector3f,
        is_on_light_subpath: bool,
    ) -> (Float, Float) {
        let select = Self::selection_weights(local, cos_theta(wo));
        let select_reverse = Self::selection_weights(local, cos_theta(wi));

        let mut forward = 0.0;
        let mut reverse = 0.0;

        let (f, r) = local.diffuse.pdf(wo, wi, is_on_light_subpath);
        forward += select.diffuse * f;
        reverse += select_reverse.diffuse * r;

        let (f, r) = local.retro.pdf(wo, wi, is_on_light_subpath);
        forward += select.retro * f;
        reverse += select_reverse.retro * r;

        if let Some(dt) = &local.diffuse_transmission {
            let (f, r) = dt.pdf(wo, wi, is_on_light_subpath);
            forward += select.diffuse_transmission * f;
            reverse += select_reverse.diffuse_transmission * r;
        }

        let (f, r) = local.reflection.pdf(wo, wi, is_on_light_subpath);
        forward += select.reflection * f;
        reverse += select_reverse.reflection * r;

        if let Some(t) = &local.transmission {
            let (f, r) = t.pdf(wo, wi, is_on_light_subpath);
            forward += select.transmission * f;
            reverse += select_reverse.transmission * r;
        }

        (forward, reverse)
    }

    /// Evaluates the BSDF for a pair of world space directions. The value
    /// excludes the cosine term.
    ///
    /// * `point`               - The shading point.
    /// * `out_dir`             - Outgoing direction (towards the previous
    ///                           vertex), world space.
    /// * `in_dir`              - Incident direction, world space.
    /// * `is_on_light_subpath` - True when transporting importance.
    pub fn evaluate(
        &self,
        point: &SurfacePoint,
        out_dir: Vector3f,
        in_dir: Vector3f,
        is_on_light_subpath: bool,
    ) -> RgbColor {
        let frame = ShadingFrame::new(point.shading_normal);
        let wo = frame.world_to_shading(out_dir);
        let wi = frame.world_to_shading(in_dir);
        if wo.z == 0.0 {
            return RgbColor::BLACK;
        }
        let local = self.compute_local_params(point);
        Self::evaluate_local(&local, &wo, &wi, is_on_light_subpath)
    }

    /// Evaluates the BSDF times the absolute shading cosine of the incident
    /// direction, with the shading-normal correction applied on light
    /// subpaths.
    ///
    /// * `point`               - The shading point.
    /// * `out_dir`             - Outgoing direction, world space.
    /// * `in_dir`              - Incident direction, world space.
    /// * `is_on_light_subpath` - True when transporting importance.
    pub fn evaluate_with_cosine(
        &self,
        point: &SurfacePoint,
        out_dir: Vector3f,
        in_dir: Vector3f,
        is_on_light_subpath: bool,
    ) -> RgbColor {
        let value = self.evaluate(point, out_dir, in_dir, is_on_light_subpath);
        let cosine = point.shading_normal.abs_dot(&in_dir);
        value * cosine * shading_normal_correction(point, out_dir, in_dir, is_on_light_subpath)
    }

    /// The aggregated forward and reverse densities of `sample`, in solid
    /// angle measure.
    ///
    /// * `point`               - The shading point.
    /// * `out_dir`             - Outgoing direction, world space.
    /// * `in_dir`              - Incident direction, world space.
    /// * `is_on_light_subpath` - True when transporting importance.
    pub fn pdf(
        &self,
        point: &SurfacePoint,
        out_dir: Vector3f,
        in_dir: Vector3f,
        is_on_light_subpath: bool,
    ) -> (Float, Float) {
        let frame = ShadingFrame::new(point.shading_normal);
        let wo = frame.world_to_shading(out_dir);
        let wi = frame.world_to_shading(in_dir);
        if wo.z == 0.0 || wi.z == 0.0 {
            return (0.0, 0.0);
        }
        let local = self.compute_local_params(point);
        Self::pdf_local(&local, &wo, &wi, is_on_light_subpath)
    }

    /// Importance samples a continuation direction: a lobe is drawn from the
    /// selection weights along the first primary dimension, that dimension
    /// is rescaled, the lobe samples a direction, and both densities are
    /// re-aggregated over all lobes so they match `pdf` exactly.
    ///
    /// * `point`               - The shading point.
    /// * `out_dir`             - Outgoing direction, world space.
    /// * `is_on_light_subpath` - True when transporting importance.
    /// * `u`                   - Primary sample in [0,1)².
    pub fn sample(
        &self,
        point: &SurfacePoint,
        out_dir: Vector3f,
        is_on_light_subpath: bool,
        u: (Float, Float),
    ) -> Option<BsdfSample> {
        let frame = ShadingFrame::new(point.shading_normal);
        let wo = frame.world_to_shading(out_dir);
        if wo.z == 0.0 {
            return None;
        }
        let local = self.compute_local_params(point);
        let select = Self::selection_weights(&local, cos_theta(&wo));

        // Draw a lobe from the weighted CDF along u.0 and rescale u.0 into
        // the chosen interval.
        let mut ux = u.0;
        let mut wi = None;
        let order = [
            select.diffuse,
            select.retro,
            select.diffuse_transmission,
            select.reflection,
            select.transmission,
        ];
        let last_positive = order
            .iter()
            .rposition(|&w| w > 0.0)
            .unwrap_or(0);
        let mut chosen = order.len();
        for (lobe_idx, &weight) in order.iter().enumerate() {
            if weight <= 0.0 {
                continue;
            }
            if ux < weight || lobe_idx == last_positive {
                ux = min(ux / weight, crate::rng::ONE_MINUS_EPSILON);
                chosen = lobe_idx;
                break;
            }
            ux -= weight;
        }
        let u2 = Vector2f::new(ux, u.1);
        match chosen {
            0 => wi = local.diffuse.sample(&wo, is_on_light_subpath, u2),
            1 => wi = local.retro.sample(&wo, is_on_light_subpath, u2),
            2 => {
                if let Some(dt) = &local.diffuse_transmission {
                    wi = dt.sample(&wo, is_on_light_subpath, u2);
                }
            }
            3 => wi = local.reflection.sample(&wo, is_on_light_subpath, u2),
            4 => {
                if let Some(t) = &local.transmission {
                    wi = t.sample(&wo, is_on_light_subpath, u2);
                }
            }
            _ => {}
        }
        let wi = wi?;

        let (pdf_forward, pdf_reverse) =
            Self::pdf_local(&local, &wo, &wi, is_on_light_subpath);
        if pdf_forward <= 0.0 {
            return None;
        }

        let value = Self::evaluate_local(&local, &wo, &wi, is_on_light_subpath);
        let in_dir = frame.shading_to_world(wi);
        let weight = value * abs_cos_theta(&wi)
            * shading_normal_correction(point, out_dir, in_dir, is_on_light_subpath)
            / pdf_forward;
        if weight.has_non_finite() {
            return None;
        }

        Some(BsdfSample {
            direction: in_dir,
            pdf_forward,
            pdf_reverse,
            weight,
        })
    }
}

/// Correction factor for the mismatch between shading and geometric normals
/// when transporting importance along light subpaths.
///
/// * `point`               - The shading point.
/// * `out_dir`             - Outgoing direction, world space.
/// * `in_dir`              - Incident direction, world space.
/// * `is_on_light_subpath` - True when transporting importance.
pub fn shading_normal_correction(
    point: &SurfacePoint,
    out_dir: Vector3f,
    in_dir: Vector3f,
    is_on_light_subpath: bool,
) -> Float {
    if !is_on_light_subpath {
        return 1.0;
    }
    let num = out_dir.abs_dot(&point.shading_normal) * in_dir.abs_dot(&point.normal);
    let denom = out_dir.abs_dot(&point.normal) * in_dir.abs_dot(&point.shading_normal);
    if denom == 0.0 {
        0.0
    } else {
        num / denom
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Rng;

    fn test_point() -> SurfacePoint {
        SurfacePoint {
            position: Vector3f::zero(),
            normal: Vector3f::new(0.0, 0.0, 1.0),
            shading_normal: Vector3f::new(0.0, 0.0, 1.0),
            ..Default::default()
        }
    }

    fn glossy_material() -> GenericMaterial {
        GenericMaterial::new(MaterialParameters {
            base_color: RgbTexture::constant(RgbColor::new(0.6, 0.4, 0.3)),
            roughness: ScalarTexture::constant(0.3),
            metallic: 0.2,
            ..Default::default()
        })
    }

    #[test]
    fn sample_pdf_matches_pdf_query() {
        // The density returned along a sample must be exactly what `pdf`
        // reports for the same pair of directions.
        let material = glossy_material();
        let point = test_point();
        let mut rng = Rng::new(123);
        let mut checked = 0;
        while checked < 500 {
            let (a, b) = rng.next_float_2d();
            let out_dir = Vector3f::new(a - 0.5, b - 0.5, 0.4 + 0.6 * rng.next_float())
                .normalize();
            let u = rng.next_float_2d();
            if let Some(sample) = material.sample(&point, out_dir, false, u) {
                let (fwd, rev) = material.pdf(&point, out_dir, sample.direction, false);
                assert!(
                    (sample.pdf_forward - fwd).abs() <= 1e-3 * fwd.max(1e-3),
                    "{} vs {}",
                    sample.pdf_forward,
                    fwd
                );
                assert!(
                    (sample.pdf_reverse - rev).abs() <= 1e-3 * rev.max(1e-3),
                    "{} vs {}",
                    sample.pdf_reverse,
                    rev
                );
                checked += 1;
            }
        }
    }

    #[test]
    fn reverse_pdf_is_swapped_forward_pdf() {
        let material = glossy_material();
        let point = test_point();
        let mut rng = Rng::new(17);
        for _ in 0..200 {
            let (a, b) = rng.next_float_2d();
            let out_dir = Vector3f::new(a - 0.5, b - 0.5, 0.5).normalize();
            if let Some(sample) = material.sample(&point, out_dir, false, rng.next_float_2d()) {
                let (_, rev) = material.pdf(&point, out_dir, sample.direction, false);
                let (swapped_fwd, _) = material.pdf(&point, sample.direction, out_dir, false);
                assert!(
                    (rev - swapped_fwd).abs() <= 1e-3 * swapped_fwd.max(1e-3),
                    "{} vs {}",
                    rev,
                    swapped_fwd
                );
            }
        }
    }

    #[test]
    fn evaluate_is_additive_and_finite() {
        let material = GenericMaterial::new(MaterialParameters {
            base_color: RgbTexture::constant(RgbColor::gray(0.8)),
            roughness: ScalarTexture::constant(0.6),
            specular_transmittance: 0.4,
            thin: true,
            diffuse_transmittance: 0.3,
            ..Default::default()
        });
        let point = test_point();
        let out_dir = Vector3f::new(0.2, 0.1, 0.95).normalize();
        let in_dir = Vector3f::new(-0.4, 0.3, 0.85).normalize();
        let value = material.evaluate(&point, out_dir, in_dir, false);
        assert!(!value.has_non_finite());
        assert!(!value.is_black());
    }

    #[test]
    fn white_diffuse_is_energy_conserving() {
        // Integrate f·cos over the hemisphere for a purely diffuse material;
        // must stay at or below the reflectance.
        let material = GenericMaterial::new(MaterialParameters {
            base_color: RgbTexture::constant(RgbColor::WHITE),
            roughness: ScalarTexture::constant(1.0),
            metallic: 0.0,
            ..Default::default()
        });
        let point = test_point();
        let out_dir = Vector3f::new(0.0, 0.3, 0.95).normalize();
        let mut rng = Rng::new(1);
        let mut sum = RgbColor::BLACK;
        let n = 20_000;
        for _ in 0..n {
            if let Some(sample) = material.sample(&point, out_dir, false, rng.next_float_2d()) {
                sum += sample.weight;
            }
        }
        let albedo = sum / n as Float;
        assert!(albedo.max_channel() <= 1.0 + 1e-2, "albedo = {}", albedo);
        assert!(albedo.luminance() > 0.5);
    }
}
