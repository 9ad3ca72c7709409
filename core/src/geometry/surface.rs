//! Surface points

#![allow(dead_code)]

use super::{Ray, Vector2f, Vector3f};
use crate::base::*;

/// An intersected (or sampled) location on a surface in the scene.
///
/// Both normals are unit length; the geometric normal faces outward, i.e.
/// away from the interior of the mesh it belongs to.
#[derive(Copy, Clone, Debug, Default)]
pub struct SurfacePoint {
    /// World space position.
    pub position: Vector3f,

    /// Geometric normal of the underlying triangle.
    pub normal: Vector3f,

    /// Interpolated shading normal.
    pub shading_normal: Vector3f,

    /// Texture coordinates.
    pub uv: Vector2f,

    /// Index of the mesh within the scene.
    pub mesh_id: usize,

    /// Index of the triangle within the mesh.
    pub prim_id: usize,

    /// Barycentric coordinates of the hit within the triangle, for the second
    /// and third vertex.
    pub barycentric: Vector2f,

    /// Distance from the ray origin that produced this point.
    pub distance: Float,

    /// Numerical offset used to displace outgoing ray origins along the
    /// geometric normal so the spawned ray cannot re-intersect this surface.
    pub error_offset: Float,
}

impl SurfacePoint {
    /// Spawns a ray leaving this surface point, displaced along the geometric
    /// normal to avoid self-intersection.
    ///
    /// * `direction` - Unit direction of the new ray.
    pub fn spawn_ray(&self, direction: Vector3f) -> Ray {
        let sign = if direction.dot(&self.normal) < 0.0 {
            -1.0
        } else {
            1.0
        };
        Ray::new(
            self.position + self.normal * (sign * self.error_offset),
            direction,
            self.error_offset,
        )
    }

    /// Unit direction from this point towards another position.
    ///
    /// * `target` - The position to point at.
    pub fn direction_to(&self, target: Vector3f) -> Vector3f {
        (target - self.position).normalize()
    }

    /// Squared distance to another position.
    ///
    /// * `target` - The other position.
    pub fn distance_squared_to(&self, target: Vector3f) -> Float {
        (target - self.position).length_squared()
    }
}
