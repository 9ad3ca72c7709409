//! Indexed triangle meshes

#![allow(dead_code)]

use super::{Ray, SurfacePoint, Vector2f, Vector3f};
use crate::base::*;

/// Scale applied to derive the self-intersection offset of a surface point
/// from the scale of its position.
const ERROR_OFFSET_SCALE: Float = 1e-4;

/// An indexed triangle mesh with optional shading normals and texture
/// coordinates, plus the per-triangle area table used for area sampling.
pub struct Mesh {
    /// Vertex positions.
    pub vertices: Vec<Vector3f>,

    /// Triangle vertex indices.
    pub indices: Vec<[usize; 3]>,

    /// Optional per-vertex shading normals. Falls back to the geometric
    /// normal when absent.
    pub shading_normals: Option<Vec<Vector3f>>,

    /// Optional per-vertex texture coordinates.
    pub uvs: Option<Vec<Vector2f>>,

    /// Cumulative distribution over triangle surface areas, normalized so
    /// the last entry is one.
    area_cdf: Vec<Float>,

    /// Total surface area of the mesh.
    surface_area: Float,
}

/// A point sampled on a mesh surface together with its area density.
#[derive(Copy, Clone, Debug)]
pub struct SurfaceSample {
    /// The sampled point.
    pub point: SurfacePoint,

    /// Probability density with respect to surface area.
    pub pdf: Float,
}

impl Mesh {
    /// Creates a new mesh and builds the area distribution over triangles.
    ///
    /// * `vertices`        - Vertex positions.
    /// * `indices`         - Triangle vertex indices.
    /// * `shading_normals` - Optional per-vertex shading normals.
    /// * `uvs`             - Optional per-vertex texture coordinates.
    pub fn new(
        vertices: Vec<Vector3f>,
        indices: Vec<[usize; 3]>,
        shading_normals: Option<Vec<Vector3f>>,
        uvs: Option<Vec<Vector2f>>,
    ) -> Self {
        debug_assert!(!indices.is_empty());

        let mut area_cdf = Vec::with_capacity(indices.len());
        let mut total = 0.0;
        for tri in indices.iter() {
            let e1 = vertices[tri[1]] - vertices[tri[0]];
            let e2 = vertices[tri[2]] - vertices[tri[0]];
            total += 0.5 * e1.cross(&e2).length();
            area_cdf.push(total);
        }
        for value in area_cdf.iter_mut() {
            *value /= total;
        }

        Self {
            vertices,
            indices,
            shading_normals,
            uvs,
            area_cdf,
            surface_area: total,
        }
    }

    /// Total surface area of the mesh.
    pub fn surface_area(&self) -> Float {
        self.surface_area
    }

    /// Number of triangles.
    pub fn num_triangles(&self) -> usize {
        self.indices.len()
    }

    /// Axis-aligned bounds of the mesh as (min, max) corners.
    pub fn bounds(&self) -> (Vector3f, Vector3f) {
        let mut lo = Vector3f::new(INFINITY, INFINITY, INFINITY);
        let mut hi = -lo;
        for v in self.vertices.iter() {
            lo = lo.min(v);
            hi = hi.max(v);
        }
        (lo, hi)
    }

    /// Intersects a ray with every triangle of the mesh and returns the
    /// closest hit before `t_max`, as (distance, triangle index,
    /// barycentrics).
    ///
    /// * `ray`   - The ray; its `min_distance` bounds the near side.
    /// * `t_max` - Far bound of the search interval.
    pub fn intersect(&self, ray: &Ray, t_max: Float) -> Option<(Float, usize, Vector2f)> {
        let mut best: Option<(Float, usize, Vector2f)> = None;
        let mut closest = t_max;

        for (prim_id, tri) in self.indices.iter().enumerate() {
            let p0 = self.vertices[tri[0]];
            let e1 = self.vertices[tri[1]] - p0;
            let e2 = self.vertices[tri[2]] - p0;

            // Moeller-Trumbore.
            let p = ray.direction.cross(&e2);
            let det = e1.dot(&p);
            if abs(det) < 1e-12 {
                continue;
            }
            let inv_det = 1.0 / det;
            let s = ray.origin - p0;
            let b1 = s.dot(&p) * inv_det;
            if !(0.0..=1.0).contains(&b1) {
                continue;
            }
            let q = s.cross(&e1);
            let b2 = ray.direction.dot(&q) * inv_det;
            if b2 < 0.0 || b1 + b2 > 1.0 {
                continue;
            }
            let t = e2.dot(&q) * inv_det;
            if t > ray.min_distance && t < closest {
                closest = t;
                best = Some((t, prim_id, Vector2f::new(b1, b2)));
            }
        }

        best
    }

    /// Builds the full surface point for a triangle and barycentrics.
    ///
    /// * `prim_id`     - Triangle index.
    /// * `barycentric` - Barycentric coordinates of the second and third
    ///                   vertex.
    /// * `mesh_id`     - Index of this mesh within the scene.
    /// * `distance`    - Distance from the querying ray's origin.
    pub fn surface_point(
        &self,
        prim_id: usize,
        barycentric: Vector2f,
        mesh_id: usize,
        distance: Float,
    ) -> SurfacePoint {
        let tri = self.indices[prim_id];
        let (b1, b2) = (barycentric.x, barycentric.y);
        let b0 = 1.0 - b1 - b2;

        let position =
            self.vertices[tri[0]] * b0 + self.vertices[tri[1]] * b1 + self.vertices[tri[2]] * b2;

        let e1 = self.vertices[tri[1]] - self.vertices[tri[0]];
        let e2 = self.vertices[tri[2]] - self.vertices[tri[0]];
        let normal = e1.cross(&e2).normalize();

        let shading_normal = match &self.shading_normals {
            Some(ns) => (ns[tri[0]] * b0 + ns[tri[1]] * b1 + ns[tri[2]] * b2).normalize(),
            None => normal,
        };

        let uv = match &self.uvs {
            Some(uvs) => uvs[tri[0]] * b0 + uvs[tri[1]] * b1 + uvs[tri[2]] * b2,
            None => Vector2f::new(b1, b2),
        };

        SurfacePoint {
            position,
            normal,
            shading_normal,
            uv,
            mesh_id,
            prim_id,
            barycentric,
            distance,
            error_offset: ERROR_OFFSET_SCALE * max(1.0, position.length()),
        }
    }

    /// Warps a primary sample onto the mesh surface with uniform area
    /// density: the first dimension picks a triangle from the cumulative area
    /// table and is rescaled, then both dimensions drive the square-root
    /// barycentric warp.
    ///
    /// * `u`       - Primary sample in [0,1)².
    /// * `mesh_id` - Index of this mesh within the scene.
    pub fn sample_area(&self, u: Vector2f, mesh_id: usize) -> SurfaceSample {
        let prim_id = self
            .area_cdf
            .partition_point(|&cdf| cdf <= u.x)
            .min(self.indices.len() - 1);
        let cdf_lo = if prim_id == 0 {
            0.0
        } else {
            self.area_cdf[prim_id - 1]
        };
        let cdf_hi = self.area_cdf[prim_id];
        let rescaled = clamp((u.x - cdf_lo) / (cdf_hi - cdf_lo), 0.0, 1.0);

        let su = rescaled.sqrt();
        let barycentric = Vector2f::new(1.0 - su, u.y * su);

        SurfaceSample {
            point: self.surface_point(prim_id, barycentric, mesh_id, 0.0),
            pdf: 1.0 / self.surface_area,
        }
    }

    /// Maps a surface point back to the primary sample that `sample_area`
    /// would use to produce it.
    ///
    /// * `point` - A point on this mesh.
    pub fn sample_area_inverse(&self, point: &SurfacePoint) -> Vector2f {
        let cdf_lo = if point.prim_id == 0 {
            0.0
        } else {
            self.area_cdf[point.prim_id - 1]
        };
        let cdf_hi = self.area_cdf[point.prim_id];

        let su = 1.0 - point.barycentric.x;
        let rescaled = su * su;
        let uy = if su > 0.0 {
            clamp(point.barycentric.y / su, 0.0, 1.0)
        } else {
            0.0
        };

        Vector2f::new(cdf_lo + rescaled * (cdf_hi - cdf_lo), uy)
    }

    /// Probability density of `sample_area` with respect to surface area.
    pub fn pdf_area(&self) -> Float {
        1.0 / self.surface_area
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quad() -> Mesh {
        Mesh::new(
            vec![
                Vector3f::new(-1.0, -1.0, 0.0),
                Vector3f::new(1.0, -1.0, 0.0),
                Vector3f::new(1.0, 1.0, 0.0),
                Vector3f::new(-1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            None,
            None,
        )
    }

    #[test]
    fn quad_area() {
        assert!((quad().surface_area() - 4.0).abs() < 1e-5);
    }

    #[test]
    fn intersect_center() {
        let mesh = quad();
        let ray = Ray::new(
            Vector3f::new(0.1, 0.2, -3.0),
            Vector3f::new(0.0, 0.0, 1.0),
            0.0,
        );
        let (t, _, _) = mesh.intersect(&ray, INFINITY).expect("hit expected");
        assert!((t - 3.0).abs() < 1e-4);
    }

    #[test]
    fn sample_area_round_trip() {
        let mesh = quad();
        for u in [
            Vector2f::new(0.1, 0.7),
            Vector2f::new(0.45, 0.2),
            Vector2f::new(0.83, 0.99),
        ] {
            let sample = mesh.sample_area(u, 0);
            assert!((sample.pdf - 0.25).abs() < 1e-6);
            let back = mesh.sample_area_inverse(&sample.point);
            assert!((back.x - u.x).abs() < 1e-4, "{} vs {}", back.x, u.x);
            assert!((back.y - u.y).abs() < 1e-4, "{} vs {}", back.y, u.y);
        }
    }
}
