//! Traces all light subpaths of an iteration into the shared vertex cache.

use crate::path_cache::{PathCache, PathVertex};
use crate::random_walk::{RandomWalk, WalkHooks};
use ground_core::base::*;
use ground_core::geometry::*;
use ground_core::rng::Rng;
use ground_core::scene::Scene;
use ground_core::spectrum::RgbColor;
use log::debug;
use rayon::prelude::*;

/// Supplies the next-event densities stored on depth 2 vertices, so the
/// weighting at the emitter end of a path can subtract the next-event
/// technique out later.
pub trait NextEventPdfCallback: Sync {
    /// Density with which next-event estimation would sample the given
    /// emitter point, in area measure, including emitter selection and the
    /// shadow-ray count.
    ///
    /// * `scene` - The scene.
    /// * `root`  - The subpath root on an emitter.
    fn emitter_next_event_pdf(&self, scene: &Scene, root: &SurfacePoint) -> Float;

    /// Density with which next-event estimation would sample the given
    /// environment direction, in solid-angle measure, including the
    /// background selection probability and the shadow-ray count.
    ///
    /// * `scene`      - The scene.
    /// * `dir_to_env` - Direction towards the environment.
    fn background_next_event_pdf(&self, scene: &Scene, dir_to_env: Vector3f) -> Float;
}

/// Traces `num_paths` light subpaths per iteration and stores every vertex
/// in a dense cache. Each worker writes only its own slot range.
pub struct LightPathCache {
    /// Number of light paths per iteration.
    pub num_paths: usize,

    /// Maximum subpath depth in edges.
    pub walk_depth: u32,

    /// Base seed of the light-path random number stream.
    pub base_seed: u64,

    /// The vertex storage.
    pub cache: PathCache,
}

impl LightPathCache {
    /// Allocates the cache.
    ///
    /// * `num_paths`  - Number of light paths per iteration.
    /// * `walk_depth` - Maximum subpath depth in edges.
    /// * `base_seed`  - Base seed of the light-path stream.
    pub fn new(num_paths: usize, walk_depth: u32, base_seed: u64) -> Self {
        Self {
            num_paths,
            walk_depth,
            base_seed,
            cache: PathCache::new(num_paths, walk_depth),
        }
    }

    /// Probability of starting a light path (or a next-event sample) on the
    /// background rather than an area emitter.
    ///
    /// * `scene` - The scene.
    pub fn background_probability(scene: &Scene) -> Float {
        if scene.background.is_some() {
            1.0 / (1.0 + scene.num_emitters() as Float)
        } else {
            0.0
        }
    }

    /// Uniform probability of picking any one emitter.
    ///
    /// * `scene` - The scene.
    pub fn select_light_pmf(scene: &Scene) -> Float {
        1.0 / scene.num_emitters() as Float
    }

    /// Full emission density of a ray leaving an emitter point towards a
    /// receiver: the area density of the point, the directional density
    /// converted with the given Jacobian, the emitter selection probability
    /// and the probability of not picking the background.
    ///
    /// * `scene`      - The scene.
    /// * `emitter_id` - The emitter.
    /// * `point`      - The point on the emitter.
    /// * `out_dir`    - Emission direction, world space.
    /// * `jacobian`   - Solid-angle-to-area factor at the receiver.
    pub fn compute_emitter_pdf(
        scene: &Scene,
        emitter_id: usize,
        point: &SurfacePoint,
        out_dir: Vector3f,
        jacobian: Float,
    ) -> Float {
        let emitter = &scene.emitters[emitter_id];
        let mesh = &scene.meshes[emitter.mesh_id];
        emitter.pdf_ray(mesh, point, out_dir)
            * jacobian
            * Self::select_light_pmf(scene)
            * (1.0 - Self::background_probability(scene))
    }

    /// Emission density of a background ray arriving from the given
    /// environment direction, per solid angle and per area on the
    /// perpendicular disc, including the background selection probability.
    ///
    /// * `scene`      - The scene.
    /// * `dir_to_env` - Direction towards the environment.
    pub fn compute_background_pdf(scene: &Scene, dir_to_env: Vector3f) -> Float {
        match &scene.background {
            Some(background) => {
                background.ray_pdf(dir_to_env) * Self::background_probability(scene)
            }
            None => 0.0,
        }
    }

    /// Traces all light paths of one iteration in parallel and fills the
    /// cache.
    ///
    /// * `scene`     - The scene.
    /// * `iteration` - Iteration index, mixed into the per-path seeds.
    /// * `callback`  - Supplies the next-event densities for depth 2
    ///                 vertices.
    pub fn trace_all(&mut self, scene: &Scene, iteration: u32, callback: &impl NextEventPdfCallback) {
        self.cache.clear();

        let base_seed = self.base_seed;
        let walk_depth = self.walk_depth;
        let stride = self.cache.stride;

        self.cache
            .vertices
            .par_chunks_mut(stride)
            .zip(self.cache.lengths.par_iter_mut())
            .enumerate()
            .for_each(|(path_index, (slot, length))| {
                let mut rng = Rng::from_hash(base_seed, path_index as u64, iteration as u64);
                trace_single_path(
                    scene,
                    slot,
                    length,
                    path_index as u32,
                    &mut rng,
                    walk_depth,
                    callback,
                );
            });

        debug!(
            "traced {} light paths, {} vertices cached",
            self.num_paths,
            self.cache.lengths.iter().map(|&l| l as usize).sum::<usize>()
        );
    }
}

/// Traces one light subpath into its slot range.
fn trace_single_path(
    scene: &Scene,
    slot: &mut [PathVertex],
    length: &mut u32,
    path_index: u32,
    rng: &mut Rng,
    walk_depth: u32,
    callback: &impl NextEventPdfCallback,
) {
    let background_probability = LightPathCache::background_probability(scene);
    let choose_background =
        scene.background.is_some() && rng.next_float() < background_probability;

    if choose_background {
        trace_background_path(
            scene,
            slot,
            length,
            path_index,
            rng,
            walk_depth,
            background_probability,
            callback,
        );
    } else {
        trace_emitter_path(
            scene,
            slot,
            length,
            path_index,
            rng,
            walk_depth,
            1.0 - background_probability,
            callback,
        );
    }
}

#[allow(clippy::too_many_arguments)]
fn trace_emitter_path(
    scene: &Scene,
    slot: &mut [PathVertex],
    length: &mut u32,
    path_index: u32,
    rng: &mut Rng,
    walk_depth: u32,
    emitter_side_probability: Float,
    callback: &impl NextEventPdfCallback,
) {
    if scene.num_emitters() == 0 {
        return;
    }
    let emitter_id = rng.next_int(0, scene.num_emitters() as u32) as usize;
    let emitter = &scene.emitters[emitter_id];
    let mesh = &scene.meshes[emitter.mesh_id];

    let (ux, uy) = rng.next_float_2d();
    let (vx, vy) = rng.next_float_2d();
    let sample = emitter.sample_ray(mesh, Vector2f::new(ux, uy), Vector2f::new(vx, vy));

    let select_pdf = LightPathCache::select_light_pmf(scene) * emitter_side_probability;
    slot[0] = PathVertex {
        point: sample.point,
        pdf_from_ancestor: sample.pdf_area * select_pdf,
        pdf_reverse_ancestor: 0.0,
        pdf_next_event_ancestor: 0.0,
        weight: emitter.radiance / (sample.pdf_area * select_pdf),
        ancestor_index: 0,
        depth: 0,
        path_index,
        is_background: false,
    };
    *length = 1;

    if walk_depth == 0 {
        return;
    }

    let mut hooks = CachedWalkHooks {
        slot,
        length,
        path_index,
        next_event_pdf_root: callback.emitter_next_event_pdf(scene, &sample.point),
    };
    let mut walk = RandomWalk {
        scene,
        max_depth: walk_depth,
        is_on_light_subpath: true,
        hooks: &mut hooks,
    };
    walk.start_from_emitter(
        rng,
        sample.ray,
        sample.point,
        sample.pdf_direction,
        sample.weight / select_pdf,
    );
}

#[allow(clippy::too_many_arguments)]
fn trace_background_path(
    scene: &Scene,
    slot: &mut [PathVertex],
    length: &mut u32,
    path_index: u32,
    rng: &mut Rng,
    walk_depth: u32,
    background_probability: Float,
    callback: &impl NextEventPdfCallback,
) {
    let background = scene.background.as_ref().unwrap();

    let (ux, uy) = rng.next_float_2d();
    let (vx, vy) = rng.next_float_2d();
    let sample = background.sample_ray(Vector2f::new(ux, uy), Vector2f::new(vx, vy));
    if sample.pdf <= 0.0 {
        return;
    }

    let dir_to_env = -sample.ray.direction;
    let direction_pdf = background.direction_pdf(dir_to_env);

    // The subpath root sits on the scene bounding sphere; its normal points
    // inward, along the emitted beam.
    slot[0] = PathVertex {
        point: SurfacePoint {
            position: sample.ray.origin,
            normal: sample.ray.direction,
            shading_normal: sample.ray.direction,
            mesh_id: usize::MAX,
            error_offset: 1e-4,
            ..Default::default()
        },
        pdf_from_ancestor: direction_pdf * background_probability,
        pdf_reverse_ancestor: 0.0,
        pdf_next_event_ancestor: 0.0,
        weight: background.emitted_radiance(dir_to_env)
            / (direction_pdf * background_probability),
        ancestor_index: 0,
        depth: 0,
        path_index,
        is_background: true,
    };
    *length = 1;

    if walk_depth == 0 {
        return;
    }

    let (_, radius) = background.scene_bounds();
    let disc_pdf = 1.0 / (PI * radius * radius);

    let mut hooks = CachedWalkHooks {
        slot,
        length,
        path_index,
        next_event_pdf_root: callback.background_next_event_pdf(scene, dir_to_env),
    };
    let mut walk = RandomWalk {
        scene,
        max_depth: walk_depth,
        is_on_light_subpath: true,
        hooks: &mut hooks,
    };
    walk.start_from_background(
        rng,
        sample.ray,
        disc_pdf,
        sample.weight / background_probability,
    );
}

/// Appends every hit of a light walk to the owning path's slot range.
struct CachedWalkHooks<'a> {
    slot: &'a mut [PathVertex],
    length: &'a mut u32,
    path_index: u32,
    next_event_pdf_root: Float,
}

impl<'a> WalkHooks for CachedWalkHooks<'a> {
    fn on_hit(
        &mut self,
        _rng: &mut Rng,
        _ray: &Ray,
        hit: &SurfacePoint,
        pdf_from_ancestor: Float,
        throughput: RgbColor,
        depth: u32,
        _to_ancestor_jacobian: Float,
    ) -> RgbColor {
        let index = *self.length as usize;
        if index >= self.slot.len() {
            return RgbColor::BLACK;
        }

        self.slot[index] = PathVertex {
            point: *hit,
            pdf_from_ancestor,
            pdf_reverse_ancestor: 0.0,
            pdf_next_event_ancestor: if depth == 2 {
                self.next_event_pdf_root
            } else {
                0.0
            },
            weight: throughput,
            ancestor_index: index as u32 - 1,
            depth,
            path_index: self.path_index,
            is_background: false,
        };
        *self.length += 1;
        RgbColor::BLACK
    }

    fn on_continue(&mut self, pdf_to_ancestor: Float, _depth: u32) {
        let len = *self.length as usize;
        if len >= 2 {
            self.slot[len - 2].pdf_reverse_ancestor = pdf_to_ancestor;
        }
    }
}
