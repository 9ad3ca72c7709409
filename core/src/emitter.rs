//! Diffuse area emitters backed by scene meshes.

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::*;
use crate::sampling::*;
use crate::shading::ShadingFrame;
use crate::spectrum::RgbColor;

/// A diffuse area light: a mesh emitting uniform radiance from the front
/// hemisphere of its shading normals.
#[derive(Copy, Clone, Debug)]
pub struct DiffuseEmitter {
    /// Index of the emitting mesh within the scene.
    pub mesh_id: usize,

    /// Emitted radiance.
    pub radiance: RgbColor,
}

/// A ray sampled from an emitter surface, with the densities of both
/// sampling decisions.
pub struct EmitterRaySample {
    /// The emitting ray, spawned off the surface.
    pub ray: Ray,

    /// The sampled surface point.
    pub point: SurfacePoint,

    /// Density of the surface point with respect to area.
    pub pdf_area: Float,

    /// Density of the direction with respect to solid angle.
    pub pdf_direction: Float,

    /// Emitted radiance times cosine over both densities; the cosine of the
    /// direction cancels against the cosine-weighted hemisphere density.
    pub weight: RgbColor,
}

impl DiffuseEmitter {
    /// Creates an emitter for a mesh.
    ///
    /// * `mesh_id`  - Index of the emitting mesh within the scene.
    /// * `radiance` - Emitted radiance.
    pub fn new(mesh_id: usize, radiance: RgbColor) -> Self {
        Self { mesh_id, radiance }
    }

    /// Radiance leaving a point of the emitter in a direction: the full
    /// radiance in the front hemisphere of the shading normal, zero behind.
    /// Independent of the position on the surface.
    ///
    /// * `point`   - A point on the emitter.
    /// * `out_dir` - The direction the radiance leaves in, world space.
    pub fn emitted_radiance(&self, point: &SurfacePoint, out_dir: Vector3f) -> RgbColor {
        if point.shading_normal.dot(&out_dir) > 0.0 {
            self.radiance
        } else {
            RgbColor::BLACK
        }
    }

    /// Uniform area density of the emitter surface. Independent of the
    /// queried point, which next-event pdf computations rely on.
    ///
    /// * `mesh` - The emitting mesh.
    pub fn pdf_area(&self, mesh: &Mesh) -> Float {
        mesh.pdf_area()
    }

    /// Samples a point on the emitter with uniform area density.
    ///
    /// * `mesh` - The emitting mesh.
    /// * `u`    - Primary sample in [0,1)².
    pub fn sample_area(&self, mesh: &Mesh, u: Vector2f) -> SurfaceSample {
        mesh.sample_area(u, self.mesh_id)
    }

    /// Maps a point on the emitter back to its primary sample.
    ///
    /// * `mesh`  - The emitting mesh.
    /// * `point` - A point on the emitter.
    pub fn sample_area_inverse(&self, mesh: &Mesh, point: &SurfacePoint) -> Vector2f {
        mesh.sample_area_inverse(point)
    }

    /// Samples an emitting ray: a surface point and a cosine-weighted
    /// direction in its shading frame.
    ///
    /// * `mesh` - The emitting mesh.
    /// * `u`    - Primary sample for the surface point.
    /// * `v`    - Primary sample for the direction.
    pub fn sample_ray(&self, mesh: &Mesh, u: Vector2f, v: Vector2f) -> EmitterRaySample {
        let surface = self.sample_area(mesh, u);
        let frame = ShadingFrame::new(surface.point.shading_normal);
        let (local_dir, pdf_direction) = to_cos_hemisphere(v);
        let direction = frame.shading_to_world(local_dir);

        EmitterRaySample {
            ray: surface.point.spawn_ray(direction),
            point: surface.point,
            pdf_area: surface.pdf,
            pdf_direction,
            weight: self.radiance * PI / surface.pdf,
        }
    }

    /// Maps an emitting ray back to the primary samples of `sample_ray`.
    ///
    /// * `mesh`      - The emitting mesh.
    /// * `point`     - The ray origin on the emitter.
    /// * `direction` - The ray direction, world space.
    pub fn sample_ray_inverse(
        &self,
        mesh: &Mesh,
        point: &SurfacePoint,
        direction: Vector3f,
    ) -> (Vector2f, Vector2f) {
        let u = self.sample_area_inverse(mesh, point);
        let frame = ShadingFrame::new(point.shading_normal);
        let v = from_cos_hemisphere(frame.world_to_shading(direction));
        (u, v)
    }

    /// Combined density of `sample_ray` producing a ray from `point` in
    /// `direction`: the area density of the point times the cosine
    /// hemisphere density of the direction.
    ///
    /// * `mesh`      - The emitting mesh.
    /// * `point`     - A point on the emitter.
    /// * `direction` - The outgoing direction, world space.
    pub fn pdf_ray(&self, mesh: &Mesh, point: &SurfacePoint, direction: Vector3f) -> Float {
        let cos_theta = point.shading_normal.dot(&direction);
        self.pdf_area(mesh) * max(cos_theta, 0.0) * INV_PI
    }

    /// Total emitted power of the one-sided diffuse surface.
    ///
    /// * `mesh` - The emitting mesh.
    pub fn total_power(&self, mesh: &Mesh) -> RgbColor {
        self.radiance * mesh.surface_area() * PI
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_quad() -> Mesh {
        Mesh::new(
            vec![
                Vector3f::new(0.0, 0.0, 0.0),
                Vector3f::new(1.0, 0.0, 0.0),
                Vector3f::new(1.0, 1.0, 0.0),
                Vector3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            None,
            None,
        )
    }

    #[test]
    fn area_pdf_matches_sample() {
        let mesh = unit_quad();
        let emitter = DiffuseEmitter::new(0, RgbColor::WHITE);
        let sample = emitter.sample_area(&mesh, Vector2f::new(0.4, 0.9));
        assert_eq!(sample.pdf, emitter.pdf_area(&mesh));
    }

    #[test]
    fn front_hemisphere_only() {
        let mesh = unit_quad();
        let emitter = DiffuseEmitter::new(0, RgbColor::WHITE);
        let point = mesh.surface_point(0, Vector2f::new(0.3, 0.3), 0, 0.0);
        assert!(!emitter
            .emitted_radiance(&point, Vector3f::new(0.0, 0.0, 1.0))
            .is_black());
        assert!(emitter
            .emitted_radiance(&point, Vector3f::new(0.0, 0.0, -1.0))
            .is_black());
    }

    #[test]
    fn ray_sample_round_trip() {
        let mesh = unit_quad();
        let emitter = DiffuseEmitter::new(0, RgbColor::WHITE);
        for (u, v) in [
            (Vector2f::new(0.2, 0.6), Vector2f::new(0.3, 0.8)),
            (Vector2f::new(0.77, 0.1), Vector2f::new(0.9, 0.4)),
        ] {
            let sample = emitter.sample_ray(&mesh, u, v);
            let (u_back, v_back) =
                emitter.sample_ray_inverse(&mesh, &sample.point, sample.ray.direction);
            assert!((u_back.x - u.x).abs() < 1e-3);
            assert!((u_back.y - u.y).abs() < 1e-3);
            assert!((v_back.x - v.x).abs() < 1e-3);
            assert!((v_back.y - v.y).abs() < 1e-3);
        }
    }

    #[test]
    fn pdf_ray_is_area_times_cosine_over_pi() {
        let mesh = unit_quad();
        let emitter = DiffuseEmitter::new(0, RgbColor::WHITE);
        let sample = emitter.sample_ray(&mesh, Vector2f::new(0.5, 0.5), Vector2f::new(0.25, 0.75));
        let pdf = emitter.pdf_ray(&mesh, &sample.point, sample.ray.direction);
        assert!((pdf - sample.pdf_area * sample.pdf_direction).abs() < 1e-5);
    }
}
