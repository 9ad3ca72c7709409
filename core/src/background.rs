//! Environment backgrounds: constant and image based.

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;
use crate::image::Image;
use crate::sampling::*;
use crate::spectrum::RgbColor;
use std::sync::Arc;

/// A ray sampled from the background towards the scene.
pub struct BackgroundRaySample {
    /// The ray; its origin lies on the scene bounding sphere and its
    /// direction points inward.
    pub ray: Ray,

    /// Combined density: the solid-angle density of the direction times the
    /// area density 1/(πR²) of the origin on the disc perpendicular to it.
    pub pdf: Float,

    /// Emitted radiance over the combined density.
    pub weight: RgbColor,
}

/// Directions sampled towards the background.
pub struct BackgroundDirectionSample {
    /// Unit direction from the scene towards the environment.
    pub direction: Vector3f,

    /// Solid-angle density of the direction.
    pub pdf: Float,

    /// Emitted radiance over the density.
    pub weight: RgbColor,
}

/// The environment illuminating the scene from infinity. Directions handed
/// to and returned from this interface always point from the scene towards
/// the environment.
pub trait Background: Send + Sync {
    /// Radiance arriving from the environment along a direction.
    ///
    /// * `direction` - Direction towards the environment.
    fn emitted_radiance(&self, direction: Vector3f) -> RgbColor;

    /// Samples a direction towards the environment.
    ///
    /// * `u` - Primary sample in [0,1)².
    fn sample_direction(&self, u: Vector2f) -> BackgroundDirectionSample;

    /// Maps a direction back to the primary sample of `sample_direction`.
    ///
    /// * `direction` - Direction towards the environment.
    fn sample_direction_inverse(&self, direction: Vector3f) -> Vector2f;

    /// Solid-angle density of `sample_direction`.
    ///
    /// * `direction` - Direction towards the environment.
    fn direction_pdf(&self, direction: Vector3f) -> Float;

    /// Samples an emitting ray: a direction into the scene and an origin on
    /// the bounding sphere, offset on the disc perpendicular to the
    /// direction.
    ///
    /// * `u` - Primary sample for the direction.
    /// * `v` - Primary sample for the origin.
    fn sample_ray(&self, u: Vector2f, v: Vector2f) -> BackgroundRaySample {
        let dir_sample = self.sample_direction(u);
        let (center, radius) = self.scene_bounds();

        let (tangent, binormal) = compute_basis_vectors(dir_sample.direction);
        let disc = concentric_sample_disc(v) * radius;
        let origin = center + dir_sample.direction * radius + tangent * disc.x
            + binormal * disc.y;

        let disc_pdf = 1.0 / (PI * radius * radius);
        let pdf = dir_sample.pdf * disc_pdf;

        BackgroundRaySample {
            ray: Ray::new(origin, -dir_sample.direction, 0.0),
            pdf,
            weight: dir_sample.weight / disc_pdf,
        }
    }

    /// Maps an emitting ray back to the primary samples of `sample_ray`.
    ///
    /// * `ray` - A ray produced by `sample_ray`.
    fn sample_ray_inverse(&self, ray: &Ray) -> (Vector2f, Vector2f) {
        let direction = -ray.direction;
        let u = self.sample_direction_inverse(direction);

        let (center, radius) = self.scene_bounds();
        let (tangent, binormal) = compute_basis_vectors(direction);
        let offset = (ray.origin - center - direction * radius) / radius;
        let v = concentric_sample_disc_inverse(Vector2f::new(
            offset.dot(&tangent),
            offset.dot(&binormal),
        ));
        (u, v)
    }

    /// Combined density of `sample_ray` for a ray arriving at a point from
    /// the given environment direction.
    ///
    /// * `direction` - Direction towards the environment.
    fn ray_pdf(&self, direction: Vector3f) -> Float {
        let (_, radius) = self.scene_bounds();
        self.direction_pdf(direction) / (PI * radius * radius)
    }

    /// Total power estimate used to weigh the background against the area
    /// emitters.
    fn total_power(&self) -> RgbColor;

    /// The bounding sphere of the scene, provided during preparation.
    fn scene_bounds(&self) -> (Vector3f, Float);

    /// Installs the scene bounding sphere.
    ///
    /// * `center` - Sphere center.
    /// * `radius` - Sphere radius.
    fn set_scene_bounds(&mut self, center: Vector3f, radius: Float);
}

/// A constant-radiance environment.
pub struct UniformBackground {
    /// Radiance arriving from every direction.
    pub radiance: RgbColor,

    center: Vector3f,
    radius: Float,
}

impl UniformBackground {
    /// Creates a constant environment.
    ///
    /// * `radiance` - Radiance arriving from every direction.
    pub fn new(radiance: RgbColor) -> Self {
        Self {
            radiance,
            center: Vector3f::zero(),
            radius: 1.0,
        }
    }
}

impl Background for UniformBackground {
    fn emitted_radiance(&self, _direction: Vector3f) -> RgbColor {
        self.radiance
    }

    fn sample_direction(&self, u: Vector2f) -> BackgroundDirectionSample {
        let direction = uniform_sample_sphere(u);
        let pdf = uniform_sphere_pdf();
        BackgroundDirectionSample {
            direction,
            pdf,
            weight: self.radiance / pdf,
        }
    }

    fn sample_direction_inverse(&self, direction: Vector3f) -> Vector2f {
        uniform_sample_sphere_inverse(direction)
    }

    fn direction_pdf(&self, _direction: Vector3f) -> Float {
        uniform_sphere_pdf()
    }

    fn total_power(&self) -> RgbColor {
        let (_, radius) = self.scene_bounds();
        self.radiance * (PI * radius * radius * FOUR_PI)
    }

    fn scene_bounds(&self) -> (Vector3f, Float) {
        (self.center, self.radius)
    }

    fn set_scene_bounds(&mut self, center: Vector3f, radius: Float) {
        self.center = center;
        self.radius = radius;
    }
}

/// An image-based environment in latitude-longitude parameterization with a
/// 2D importance table over the pixels.
pub struct EnvironmentMap {
    /// The radiance image.
    pub image: Arc<Image>,

    distribution: Distribution2D,
    center: Vector3f,
    radius: Float,
}

impl EnvironmentMap {
    /// Builds the importance table from the image, weighting each row by the
    /// sine of its polar angle so the table matches the solid-angle measure.
    ///
    /// * `image` - The radiance image.
    pub fn new(image: Arc<Image>) -> Self {
        let mut func = Vec::with_capacity(image.width * image.height);
        for row in 0..image.height {
            let sin_theta = (PI * (row as Float + 0.5) / image.height as Float).sin();
            for col in 0..image.width {
                func.push(image.pixel(col, row).luminance() * sin_theta);
            }
        }
        let distribution = Distribution2D::new(&func, image.width, image.height);

        Self {
            image,
            distribution,
            center: Vector3f::zero(),
            radius: 1.0,
        }
    }

    /// Maps texture coordinates to a world direction.
    fn uv_to_direction(uv: Vector2f) -> Vector3f {
        let phi = uv.x * TWO_PI;
        let theta = uv.y * PI;
        let sin_theta = theta.sin();
        Vector3f::new(sin_theta * phi.cos(), sin_theta * phi.sin(), theta.cos())
    }

    /// Maps a world direction to texture coordinates.
    fn direction_to_uv(direction: Vector3f) -> Vector2f {
        let mut phi = direction.y.atan2(direction.x);
        if phi < 0.0 {
            phi += TWO_PI;
        }
        let theta = clamp(direction.z, -1.0, 1.0).acos();
        Vector2f::new(phi * INV_TWO_PI, theta * INV_PI)
    }
}

impl Background for EnvironmentMap {
    fn emitted_radiance(&self, direction: Vector3f) -> RgbColor {
        let uv = Self::direction_to_uv(direction);
        self.image.bilinear(uv.x, uv.y)
    }

    fn sample_direction(&self, u: Vector2f) -> BackgroundDirectionSample {
        let (uv, pdf_uv) = self.distribution.sample_continuous(u);
        let direction = Self::uv_to_direction(uv);
        let sin_theta = (uv.y * PI).sin();
        if sin_theta <= 0.0 || pdf_uv <= 0.0 {
            return BackgroundDirectionSample {
                direction,
                pdf: 0.0,
                weight: RgbColor::BLACK,
            };
        }
        let pdf = pdf_uv / (2.0 * PI * PI * sin_theta);
        BackgroundDirectionSample {
            direction,
            pdf,
            weight: self.image.bilinear(uv.x, uv.y) / pdf,
        }
    }

    fn sample_direction_inverse(&self, direction: Vector3f) -> Vector2f {
        self.distribution
            .sample_continuous_inverse(Self::direction_to_uv(direction))
    }

    fn direction_pdf(&self, direction: Vector3f) -> Float {
        let uv = Self::direction_to_uv(direction);
        let sin_theta = (uv.y * PI).sin();
        if sin_theta <= 0.0 {
            return 0.0;
        }
        self.distribution.pdf(uv) / (2.0 * PI * PI * sin_theta)
    }

    fn total_power(&self) -> RgbColor {
        let (_, radius) = self.scene_bounds();
        let mean: RgbColor = self
            .image
            .pixels
            .iter()
            .fold(RgbColor::BLACK, |acc, &p| acc + p)
            / self.image.pixels.len() as Float;
        mean * (PI * radius * radius * FOUR_PI)
    }

    fn scene_bounds(&self) -> (Vector3f, Float) {
        (self.center, self.radius)
    }

    fn set_scene_bounds(&mut self, center: Vector3f, radius: Float) {
        self.center = center;
        self.radius = radius;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_direction_round_trip() {
        let bg = UniformBackground::new(RgbColor::WHITE);
        for u in [Vector2f::new(0.3, 0.7), Vector2f::new(0.9, 0.05)] {
            let sample = bg.sample_direction(u);
            let back = bg.sample_direction_inverse(sample.direction);
            assert!((back.x - u.x).abs() < 1e-3);
            assert!((back.y - u.y).abs() < 1e-3);
        }
    }

    #[test]
    fn uniform_ray_round_trip() {
        let mut bg = UniformBackground::new(RgbColor::WHITE);
        bg.set_scene_bounds(Vector3f::new(1.0, 2.0, 3.0), 5.0);
        let (u, v) = (Vector2f::new(0.2, 0.6), Vector2f::new(0.7, 0.3));
        let sample = bg.sample_ray(u, v);
        let (u_back, v_back) = bg.sample_ray_inverse(&sample.ray);
        assert!((u_back.x - u.x).abs() < 1e-3);
        assert!((u_back.y - u.y).abs() < 1e-3);
        assert!((v_back.x - v.x).abs() < 1e-3);
        assert!((v_back.y - v.y).abs() < 1e-3);
    }

    #[test]
    fn ray_pdf_matches_sample() {
        let mut bg = UniformBackground::new(RgbColor::WHITE);
        bg.set_scene_bounds(Vector3f::zero(), 2.0);
        let sample = bg.sample_ray(Vector2f::new(0.4, 0.4), Vector2f::new(0.5, 0.5));
        let pdf = bg.ray_pdf(-sample.ray.direction);
        assert!((pdf - sample.pdf).abs() < 1e-6);
    }

    #[test]
    fn envmap_importance_prefers_bright_texels() {
        let mut img = Image::new(8, 4);
        *img.pixel_mut(2, 1) = RgbColor::gray(10.0);
        for p in img.pixels.iter_mut() {
            if p.is_black() {
                *p = RgbColor::gray(0.01);
            }
        }
        let env = EnvironmentMap::new(Arc::new(img));

        let sample = env.sample_direction(Vector2f::new(0.5, 0.5));
        assert!(sample.pdf > 0.0);
        let pdf = env.direction_pdf(sample.direction);
        assert!((pdf - sample.pdf).abs() <= 1e-3 * sample.pdf);
    }
}
