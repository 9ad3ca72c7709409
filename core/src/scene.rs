//! The scene container: arenas for meshes, materials and emitters, plus the
//! ray intersection facade the integrators talk to.

#![allow(dead_code)]

use crate::background::Background;
use crate::base::*;
use crate::camera::Camera;
use crate::emitter::DiffuseEmitter;
use crate::geometry::*;
use crate::shading::GenericMaterial;
use crate::spectrum::RgbColor;
use log::info;
use thiserror::Error;

/// Structural problems refused by `prepare` before rendering starts.
#[derive(Error, Debug)]
pub enum SceneError {
    #[error("the scene contains no geometry")]
    EmptyScene,

    #[error("the scene has neither emitters nor a background")]
    NoLightSource,

    #[error("mesh {mesh_id} references material {material_id} which does not exist")]
    InvalidMaterial { mesh_id: usize, material_id: usize },

    #[error("emitter {emitter_id} references mesh {mesh_id} which does not exist")]
    InvalidEmitterMesh { emitter_id: usize, mesh_id: usize },
}

/// All state shared by one render: geometry, materials, emitters, the
/// camera and the background. Cross-references between the arenas are plain
/// indices; the scene is the single lifetime anchor.
pub struct Scene {
    /// Mesh arena.
    pub meshes: Vec<Mesh>,

    /// Material arena.
    pub materials: Vec<GenericMaterial>,

    /// Per-mesh material index.
    mesh_materials: Vec<usize>,

    /// Emitter registry.
    pub emitters: Vec<DiffuseEmitter>,

    /// Per-mesh back-reference into the emitter registry.
    mesh_emitters: Vec<Option<usize>>,

    /// The environment, if any.
    pub background: Option<Box<dyn Background>>,

    /// The camera.
    pub camera: Box<dyn Camera>,

    /// Center of the bounding sphere, valid after `prepare`.
    center: Vector3f,

    /// Radius of the bounding sphere, valid after `prepare`.
    radius: Float,

    prepared: bool,
}

impl Scene {
    /// Creates an empty scene around a camera.
    ///
    /// * `camera` - The camera.
    pub fn new(camera: Box<dyn Camera>) -> Self {
        Self {
            meshes: Vec::new(),
            materials: Vec::new(),
            mesh_materials: Vec::new(),
            emitters: Vec::new(),
            mesh_emitters: Vec::new(),
            background: None,
            camera,
            center: Vector3f::zero(),
            radius: 1.0,
            prepared: false,
        }
    }

    /// Adds a material and returns its index.
    ///
    /// * `material` - The material.
    pub fn add_material(&mut self, material: GenericMaterial) -> usize {
        self.materials.push(material);
        self.materials.len() - 1
    }

    /// Adds a mesh bound to a material and returns the mesh index.
    ///
    /// * `mesh`        - The mesh.
    /// * `material_id` - Index of the mesh's material.
    pub fn add_mesh(&mut self, mesh: Mesh, material_id: usize) -> usize {
        self.meshes.push(mesh);
        self.mesh_materials.push(material_id);
        self.mesh_emitters.push(None);
        self.meshes.len() - 1
    }

    /// Registers a mesh as a diffuse area emitter and returns the emitter
    /// index.
    ///
    /// * `mesh_id`  - Index of the emitting mesh.
    /// * `radiance` - Emitted radiance.
    pub fn add_emitter(&mut self, mesh_id: usize, radiance: RgbColor) -> usize {
        self.emitters.push(DiffuseEmitter::new(mesh_id, radiance));
        let emitter_id = self.emitters.len() - 1;
        if mesh_id < self.mesh_emitters.len() {
            self.mesh_emitters[mesh_id] = Some(emitter_id);
        }
        emitter_id
    }

    /// Installs the environment.
    ///
    /// * `background` - The environment.
    pub fn set_background(&mut self, background: Box<dyn Background>) {
        self.background = Some(background);
    }

    /// Validates the scene and computes the bounding sphere. Structural
    /// errors are refused here, never during rendering.
    pub fn prepare(&mut self) -> Result<(), SceneError> {
        if self.meshes.is_empty() {
            return Err(SceneError::EmptyScene);
        }
        if self.emitters.is_empty() && self.background.is_none() {
            return Err(SceneError::NoLightSource);
        }
        for (mesh_id, &material_id) in self.mesh_materials.iter().enumerate() {
            if material_id >= self.materials.len() {
                return Err(SceneError::InvalidMaterial {
                    mesh_id,
                    material_id,
                });
            }
        }
        for (emitter_id, emitter) in self.emitters.iter().enumerate() {
            if emitter.mesh_id >= self.meshes.len() {
                return Err(SceneError::InvalidEmitterMesh {
                    emitter_id,
                    mesh_id: emitter.mesh_id,
                });
            }
        }

        // Bounding sphere from the union of the mesh bounds, padded a bit so
        // grazing background rays stay outside the geometry.
        let mut lo = Vector3f::new(INFINITY, INFINITY, INFINITY);
        let mut hi = -lo;
        for mesh in self.meshes.iter() {
            let (mesh_lo, mesh_hi) = mesh.bounds();
            lo = lo.min(&mesh_lo);
            hi = hi.max(&mesh_hi);
        }
        self.center = (lo + hi) * 0.5;
        self.radius = max((hi - lo).length() * 0.5 * 1.01, 1e-3);

        if let Some(background) = &mut self.background {
            background.set_scene_bounds(self.center, self.radius);
        }

        info!(
            "prepared scene: {} meshes, {} emitters, background: {}, radius {}",
            self.meshes.len(),
            self.emitters.len(),
            self.background.is_some(),
            self.radius
        );
        self.prepared = true;
        Ok(())
    }

    /// Center of the scene bounding sphere.
    pub fn center(&self) -> Vector3f {
        self.center
    }

    /// Radius of the scene bounding sphere.
    pub fn radius(&self) -> Float {
        self.radius
    }

    /// The material bound to a mesh.
    ///
    /// * `mesh_id` - The mesh index.
    pub fn material(&self, mesh_id: usize) -> &GenericMaterial {
        &self.materials[self.mesh_materials[mesh_id]]
    }

    /// The emitter a mesh is registered as, if any.
    ///
    /// * `mesh_id` - The mesh index.
    pub fn emitter_at(&self, mesh_id: usize) -> Option<(usize, &DiffuseEmitter)> {
        self.mesh_emitters[mesh_id].map(|id| (id, &self.emitters[id]))
    }

    /// Number of registered emitters.
    pub fn num_emitters(&self) -> usize {
        self.emitters.len()
    }

    /// Traces a ray against every mesh and returns the closest surface
    /// point.
    ///
    /// * `ray` - The ray.
    pub fn trace(&self, ray: &Ray) -> Option<SurfacePoint> {
        let mut closest = INFINITY;
        let mut best: Option<(usize, usize, Vector2f)> = None;

        for (mesh_id, mesh) in self.meshes.iter().enumerate() {
            if let Some((t, prim_id, barycentric)) = mesh.intersect(ray, closest) {
                closest = t;
                best = Some((mesh_id, prim_id, barycentric));
            }
        }

        best.map(|(mesh_id, prim_id, barycentric)| {
            self.meshes[mesh_id].surface_point(prim_id, barycentric, mesh_id, closest)
        })
    }

    /// Tests whether the straight segment between a surface point and a
    /// target position is blocked. The ray origin is biased along the normal
    /// by the point's error offset.
    ///
    /// * `from` - The surface point the shadow ray starts at.
    /// * `to`   - The target position.
    pub fn is_occluded(&self, from: &SurfacePoint, to: Vector3f) -> bool {
        let delta = to - from.position;
        let distance = delta.length();
        if distance == 0.0 {
            return true;
        }
        let ray = from.spawn_ray(delta / distance);
        let max_distance = distance * (1.0 - 1e-3);

        for mesh in self.meshes.iter() {
            if mesh.intersect(&ray, max_distance).is_some() {
                return true;
            }
        }
        false
    }

    /// Tests whether a ray from a surface point escapes the scene.
    ///
    /// * `from`      - The surface point.
    /// * `direction` - Unit direction of the ray.
    pub fn leaves_scene(&self, from: &SurfacePoint, direction: Vector3f) -> bool {
        let ray = from.spawn_ray(direction);
        self.trace(&ray).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::PerspectiveCamera;
    use crate::shading::MaterialParameters;

    fn test_camera() -> Box<dyn Camera> {
        Box::new(PerspectiveCamera::new(
            Vector3f::new(0.0, 0.0, -3.0),
            Vector3f::zero(),
            Vector3f::new(0.0, 1.0, 0.0),
            60.0,
            8,
            8,
        ))
    }

    fn quad(z: Float) -> Mesh {
        Mesh::new(
            vec![
                Vector3f::new(-1.0, -1.0, z),
                Vector3f::new(1.0, -1.0, z),
                Vector3f::new(1.0, 1.0, z),
                Vector3f::new(-1.0, 1.0, z),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
            None,
            None,
        )
    }

    #[test]
    fn empty_scene_is_refused() {
        let mut scene = Scene::new(test_camera());
        assert!(matches!(scene.prepare(), Err(SceneError::EmptyScene)));
    }

    #[test]
    fn scene_without_lights_is_refused() {
        let mut scene = Scene::new(test_camera());
        let material = scene.add_material(GenericMaterial::new(MaterialParameters::default()));
        scene.add_mesh(quad(0.0), material);
        assert!(matches!(scene.prepare(), Err(SceneError::NoLightSource)));
    }

    #[test]
    fn occlusion_between_parallel_quads() {
        let mut scene = Scene::new(test_camera());
        let material = scene.add_material(GenericMaterial::new(MaterialParameters::default()));
        let front = scene.add_mesh(quad(0.0), material);
        scene.add_mesh(quad(2.0), material);
        scene.add_emitter(front, RgbColor::WHITE);
        scene.prepare().unwrap();

        let hit = scene
            .trace(&Ray::new(
                Vector3f::new(0.2, 0.1, -3.0),
                Vector3f::new(0.0, 0.0, 1.0),
                0.0,
            ))
            .expect("front quad hit");
        assert_eq!(hit.mesh_id, front);

        // The back quad lies behind the front one.
        assert!(scene.is_occluded(&hit, Vector3f::new(0.2, 0.1, 2.0)) == false);
        // From the front quad towards a point past the back quad.
        assert!(scene.is_occluded(&hit, Vector3f::new(0.2, 0.1, 5.0)));
        assert!(!scene.leaves_scene(&hit, Vector3f::new(0.0, 0.0, 1.0)));
        assert!(scene.leaves_scene(&hit, Vector3f::new(0.0, 0.0, -1.0)));
    }
}
