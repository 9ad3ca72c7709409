//! Cameras: ray generation and the response to light-subpath vertices.

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;
use crate::spectrum::RgbColor;

/// A primary ray with the density of its pixel-to-direction mapping.
pub struct CameraRay {
    /// The primary ray.
    pub ray: Ray,

    /// Density of the direction in pixels per steradian; random walks
    /// convert this to an area density at the first hit.
    pub pdf: Float,

    /// Sensor response weight of the ray.
    pub weight: RgbColor,
}

/// The camera response to a surface point, used by the light tracer.
pub struct CameraResponse {
    /// Continuous image position the point projects to.
    pub pixel: Vector2f,

    /// Density, with respect to surface area at the point, of the camera
    /// "emitting" towards it.
    pub pdf_emit: Float,

    /// Image contribution per unit area at the point, to be multiplied by
    /// the cosine-weighted BSDF at the splatted vertex.
    pub weight: Float,
}

/// Camera interface of the integrators.
pub trait Camera: Send + Sync {
    /// Generates the primary ray through a film position.
    ///
    /// * `film_pos` - Continuous image position in pixel units.
    fn generate_ray(&self, film_pos: Vector2f) -> CameraRay;

    /// Projects a scene point onto the film, returning the response if the
    /// point is inside the frustum. Occlusion is the caller's business.
    ///
    /// * `point` - The scene point.
    fn sample_response(&self, point: &SurfacePoint) -> Option<CameraResponse>;

    /// Projects a world position to a film position, if visible.
    ///
    /// * `position` - World position.
    fn world_to_film(&self, position: Vector3f) -> Option<Vector2f>;

    /// Density conversion from solid angle at the camera to pixel area.
    ///
    /// * `direction` - World direction away from the camera.
    fn solid_angle_to_pixel_jacobian(&self, direction: Vector3f) -> Float;

    /// Image resolution in pixels.
    fn resolution(&self) -> (usize, usize);

    /// World position of the aperture.
    fn position(&self) -> Vector3f;
}

/// A pinhole perspective camera.
pub struct PerspectiveCamera {
    position: Vector3f,
    forward: Vector3f,
    right: Vector3f,
    up: Vector3f,
    tan_half_fov: Float,
    aspect: Float,
    width: usize,
    height: usize,
}

impl PerspectiveCamera {
    /// Creates a camera from a look-at specification.
    ///
    /// * `position`       - World position of the aperture.
    /// * `look_at`        - World position the camera looks at.
    /// * `up_hint`        - Approximate up direction.
    /// * `vertical_fov`   - Full vertical field of view in degrees.
    /// * `width`          - Horizontal resolution in pixels.
    /// * `height`         - Vertical resolution in pixels.
    pub fn new(
        position: Vector3f,
        look_at: Vector3f,
        up_hint: Vector3f,
        vertical_fov: Float,
        width: usize,
        height: usize,
    ) -> Self {
        let forward = (look_at - position).normalize();
        let right = forward.cross(&up_hint).normalize();
        let up = right.cross(&forward);

        Self {
            position,
            forward,
            right,
            up,
            tan_half_fov: (vertical_fov.to_radians() * 0.5).tan(),
            aspect: width as Float / height as Float,
            width,
            height,
        }
    }
}

impl Camera for PerspectiveCamera {
    fn generate_ray(&self, film_pos: Vector2f) -> CameraRay {
        let ndc_x = 2.0 * (film_pos.x / self.width as Float) - 1.0;
        let ndc_y = 1.0 - 2.0 * (film_pos.y / self.height as Float);

        let direction = (self.right * (ndc_x * self.tan_half_fov * self.aspect)
            + self.up * (ndc_y * self.tan_half_fov)
            + self.forward)
            .normalize();

        CameraRay {
            ray: Ray::new(self.position, direction, 0.0),
            pdf: self.solid_angle_to_pixel_jacobian(direction),
            weight: RgbColor::WHITE,
        }
    }

    fn sample_response(&self, point: &SurfacePoint) -> Option<CameraResponse> {
        let pixel = self.world_to_film(point.position)?;

        let to_point = point.position - self.position;
        let dist_squared = to_point.length_squared();
        if dist_squared == 0.0 {
            return None;
        }
        let direction = to_point / dist_squared.sqrt();

        let jacobian = self.solid_angle_to_pixel_jacobian(direction);
        let pdf_emit = jacobian * point.normal.abs_dot(&direction) / dist_squared;
        if !(pdf_emit > 0.0) || !pdf_emit.is_finite() {
            return None;
        }

        Some(CameraResponse {
            pixel,
            pdf_emit,
            weight: jacobian / dist_squared,
        })
    }

    fn world_to_film(&self, position: Vector3f) -> Option<Vector2f> {
        let to_point = position - self.position;
        let depth = to_point.dot(&self.forward);
        if depth <= 0.0 {
            return None;
        }

        let ndc_x = to_point.dot(&self.right) / depth / (self.tan_half_fov * self.aspect);
        let ndc_y = to_point.dot(&self.up) / depth / self.tan_half_fov;

        let film_x = (ndc_x + 1.0) * 0.5 * self.width as Float;
        let film_y = (1.0 - ndc_y) * 0.5 * self.height as Float;
        if film_x < 0.0
            || film_x >= self.width as Float
            || film_y < 0.0
            || film_y >= self.height as Float
        {
            return None;
        }
        Some(Vector2f::new(film_x, film_y))
    }

    fn solid_angle_to_pixel_jacobian(&self, direction: Vector3f) -> Float {
        let cos_theta = direction.normalize().dot(&self.forward);
        if cos_theta <= 0.0 {
            return 0.0;
        }
        let image_plane_area = 4.0 * self.tan_half_fov * self.tan_half_fov * self.aspect;
        (self.width * self.height) as Float
            / (image_plane_area * cos_theta * cos_theta * cos_theta)
    }

    fn resolution(&self) -> (usize, usize) {
        (self.width, self.height)
    }

    fn position(&self) -> Vector3f {
        self.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> PerspectiveCamera {
        PerspectiveCamera::new(
            Vector3f::new(0.0, 0.0, -5.0),
            Vector3f::zero(),
            Vector3f::new(0.0, 1.0, 0.0),
            45.0,
            64,
            48,
        )
    }

    #[test]
    fn center_pixel_looks_forward() {
        let cam = camera();
        let ray = cam.generate_ray(Vector2f::new(32.0, 24.0));
        assert!((ray.ray.direction - Vector3f::new(0.0, 0.0, 1.0)).length() < 1e-5);
        assert!(ray.pdf > 0.0);
    }

    #[test]
    fn film_projection_round_trip() {
        let cam = camera();
        for film in [
            Vector2f::new(10.5, 40.0),
            Vector2f::new(32.0, 24.0),
            Vector2f::new(63.0, 1.0),
        ] {
            let ray = cam.generate_ray(film);
            let point = ray.ray.at(7.0);
            let back = cam.world_to_film(point).expect("inside frustum");
            assert!((back.x - film.x).abs() < 1e-2, "{} vs {}", back.x, film.x);
            assert!((back.y - film.y).abs() < 1e-2, "{} vs {}", back.y, film.y);
        }
    }

    #[test]
    fn response_matches_primary_pdf() {
        // The area density reported by sample_response must equal the
        // converted primary-ray density for the same geometry.
        let cam = camera();
        let ray = cam.generate_ray(Vector2f::new(20.0, 12.0));
        let point = SurfacePoint {
            position: ray.ray.at(3.0),
            normal: -ray.ray.direction,
            shading_normal: -ray.ray.direction,
            ..Default::default()
        };
        let response = cam.sample_response(&point).expect("visible");
        let converted = ray.pdf * point.normal.abs_dot(&ray.ray.direction)
            / (point.position - cam.position()).length_squared();
        assert!(
            (response.pdf_emit - converted).abs() <= 1e-3 * converted,
            "{} vs {}",
            response.pdf_emit,
            converted
        );
    }

    #[test]
    fn behind_camera_is_rejected() {
        let cam = camera();
        assert!(cam.world_to_film(Vector3f::new(0.0, 0.0, -10.0)).is_none());
    }
}
