//! Camera-side machinery of the bidirectional integrator: the per-pixel
//! camera path with its paired forward/reverse densities, the pdf view over
//! a hypothetical full path, and the estimators evaluated at every camera
//! vertex (emitter hits, next-event estimation, connections to cached light
//! vertices).

use crate::light_path_cache::LightPathCache;
use crate::path_cache::{PathCache, PathVertex};
use crate::random_walk::WalkHooks;
use crate::tech_pyramid::TechPyramid;
use crate::vertex_cache_bidir::VertexCacheBidir;
use crate::vertex_selector::VertexSelector;
use ground_core::base::*;
use ground_core::geometry::*;
use ground_core::rng::Rng;
use ground_core::sampling::surface_area_to_solid_angle;
use ground_core::scene::Scene;
use ground_core::spectrum::RgbColor;

/// The paired densities of one camera-path vertex: the density of reaching
/// it from its ancestor, and the density of sampling it back from its
/// successor. The reverse entry is filled once the walk has advanced past
/// the successor.
#[derive(Copy, Clone, Default)]
pub struct PathPdfPair {
    /// Density of this vertex as sampled from its ancestor, area measure.
    pub pdf_from_ancestor: Float,

    /// Density of this vertex as sampled from its successor.
    pub pdf_to_ancestor: Float,
}

/// The camera subpath traced for one pixel sample.
pub struct CameraPath {
    /// The image position the path was spawned for.
    pub pixel: Vector2f,

    /// Running throughput at the most recent vertex.
    pub throughput: RgbColor,

    /// Per-vertex density pairs; index 0 is the primary hit.
    pub vertices: Vec<PathPdfPair>,

    /// Edge lengths walked, parallel to `vertices`.
    pub distances: Vec<Float>,
}

impl CameraPath {
    /// Creates an empty path for a pixel.
    ///
    /// * `pixel`     - The image position.
    /// * `max_depth` - Depth bound used to reserve storage.
    pub fn new(pixel: Vector2f, max_depth: u32) -> Self {
        Self {
            pixel,
            throughput: RgbColor::WHITE,
            vertices: Vec::with_capacity(max_depth as usize + 1),
            distances: Vec::with_capacity(max_depth as usize + 1),
        }
    }
}

/// The per-vertex densities of one hypothetical full path, indexed the same
/// way from both sides: slot i of `cam_to_light` and slot i of
/// `light_to_cam` both describe the full-path vertex i steps from the
/// camera, sampled from the camera side and from the light side.
pub(crate) struct BidirPathPdfs {
    pub cam_to_light: Vec<Float>,
    pub light_to_cam: Vec<Float>,
}

impl BidirPathPdfs {
    /// Allocates a zeroed view for a path with `num_pdfs` vertices.
    pub fn new(num_pdfs: usize) -> Self {
        Self {
            cam_to_light: vec![0.0; num_pdfs],
            light_to_cam: vec![0.0; num_pdfs],
        }
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.cam_to_light.len()
    }

    /// Copies the stored densities of the camera path into the slots before
    /// the cut position. The slot at the cut itself is written by the call
    /// site, which knows the fresh connection geometry.
    ///
    /// * `path` - The camera path.
    /// * `k`    - Cut position (exclusive).
    pub fn gather_camera_pdfs(&mut self, path: &CameraPath, k: usize) {
        for i in 0..k {
            self.cam_to_light[i] = path.vertices[i].pdf_from_ancestor;
            self.light_to_cam[i] = path.vertices[i].pdf_to_ancestor;
        }
    }

    /// Walks the cached light subpath from the selected vertex back to its
    /// root, filling the slots past the cut. The camera-direction slot of
    /// the subpath root combines the stored reverse density (the hitting
    /// technique) with the next-event density stamped on the depth 2 vertex.
    ///
    /// * `cache`          - The light-vertex cache.
    /// * `selected`       - The connected (or splatted) light vertex.
    /// * `start`          - First slot owned by the light side.
    /// * `enable_hitting` - Whether emitter hits count as a technique.
    pub fn gather_light_pdfs(
        &mut self,
        cache: &PathCache,
        selected: &PathVertex,
        start: usize,
        enable_hitting: bool,
    ) {
        let n = self.len();
        let mut vert = *selected;
        let mut next_event_stamp = 0.0;
        for i in start..n {
            self.light_to_cam[i] = vert.pdf_from_ancestor;
            if i >= start + 2 {
                let mut pdf = vert.pdf_reverse_ancestor;
                if vert.depth == 0 {
                    if !enable_hitting {
                        pdf = 0.0;
                    }
                    pdf += next_event_stamp;
                }
                self.cam_to_light[i] = pdf;
            }
            if vert.depth == 2 {
                next_event_stamp = vert.pdf_next_event_ancestor;
            }
            if vert.depth > 0 {
                vert = *cache.ancestor(&vert);
            }
        }
    }
}

/// Per-pixel state threaded through the camera random walk.
pub(crate) struct CameraWalkState<'a> {
    pub integrator: &'a VertexCacheBidir,
    pub scene: &'a Scene,
    pub cache: &'a PathCache,
    pub selector: &'a VertexSelector,
    pub pyramid: Option<&'a TechPyramid>,
    pub num_light_paths: usize,
    pub path: CameraPath,
    pub previous: Option<SurfacePoint>,
}

impl<'a> CameraWalkState<'a> {
    pub fn new(
        integrator: &'a VertexCacheBidir,
        scene: &'a Scene,
        cache: &'a PathCache,
        selector: &'a VertexSelector,
        pyramid: Option<&'a TechPyramid>,
        num_light_paths: usize,
        pixel: Vector2f,
    ) -> Self {
        Self {
            integrator,
            scene,
            cache,
            selector,
            pyramid,
            num_light_paths,
            path: CameraPath::new(pixel, integrator.max_depth),
            previous: None,
        }
    }

    /// Effective density of one bidirectional connection sample; zero when
    /// the cache holds nothing to connect to.
    fn select_density(&self) -> Float {
        self.integrator
            .bidir_select_density(self.selector.count(), self.num_light_paths)
    }

    /// Records a contribution into the technique pyramid.
    fn record(&self, camera_len: usize, light_len: usize, raw: RgbColor, weighted: RgbColor) {
        if let Some(pyramid) = self.pyramid {
            pyramid.add(camera_len, light_len, self.path.pixel, raw, weighted);
        }
    }

    /// Everything estimated at one camera vertex: emitter hits, bidirectional
    /// connections and next-event estimation, each gated by its flag and the
    /// depth bounds.
    fn camera_hit(
        &mut self,
        rng: &mut Rng,
        ray: &Ray,
        hit: &SurfacePoint,
        depth: u32,
        throughput: RgbColor,
    ) -> RgbColor {
        let integrator = self.integrator;
        let mut value = RgbColor::BLACK;

        if integrator.enable_hitting && depth >= integrator.min_depth {
            if let Some((emitter_id, _)) = self.scene.emitter_at(hit.mesh_id) {
                value += self.emitter_hit(ray, hit, emitter_id, throughput);
            }
        }

        if depth < integrator.max_depth && integrator.enable_connections {
            for _ in 0..integrator.num_connections {
                value += self.bidir_connections(rng, hit, -ray.direction, depth, throughput);
            }
        }

        if depth < integrator.max_depth && depth + 1 >= integrator.min_depth {
            for _ in 0..integrator.num_shadow_rays {
                value += self.next_event(rng, hit, -ray.direction, throughput);
            }
        }

        value
    }

    /// The camera path hit an emitter directly.
    fn emitter_hit(
        &self,
        ray: &Ray,
        hit: &SurfacePoint,
        emitter_id: usize,
        throughput: RgbColor,
    ) -> RgbColor {
        let emitter = &self.scene.emitters[emitter_id];
        let radiance = emitter.emitted_radiance(hit, -ray.direction);
        if radiance.is_black() {
            return RgbColor::BLACK;
        }

        let mis_weight = if self.path.vertices.len() == 1 {
            1.0
        } else {
            let previous = self.previous.as_ref().unwrap();
            let jacobian = surface_area_to_solid_angle(hit, previous);
            let pdf_emit = LightPathCache::compute_emitter_pdf(
                self.scene,
                emitter_id,
                hit,
                -ray.direction,
                jacobian,
            );
            let pdf_next_event = self.integrator.emitter_next_event_pdf(self.scene, hit);
            self.integrator.emitter_hit_mis(
                &self.path,
                pdf_emit,
                pdf_next_event,
                self.select_density(),
                self.num_light_paths,
            )
        };

        let raw = throughput * radiance;
        self.record(self.path.vertices.len(), 0, raw, raw * mis_weight);
        raw * mis_weight
    }

    /// The camera path escaped into the environment.
    fn background_hit(
        &mut self,
        ray: &Ray,
        pdf_direction: Float,
        throughput: RgbColor,
        depth: u32,
    ) -> RgbColor {
        let integrator = self.integrator;
        if !integrator.enable_hitting || depth < integrator.min_depth {
            return RgbColor::BLACK;
        }
        let background = match &self.scene.background {
            Some(background) => background,
            None => return RgbColor::BLACK,
        };
        let radiance = background.emitted_radiance(ray.direction);
        if radiance.is_black() {
            return RgbColor::BLACK;
        }

        let mis_weight = if depth == 1 {
            1.0
        } else {
            // The escape acts as one more path vertex; its density stays in
            // solid-angle measure, and so do all competing techniques for
            // this slot.
            self.path.vertices.push(PathPdfPair {
                pdf_from_ancestor: pdf_direction,
                pdf_to_ancestor: 0.0,
            });
            let previous = self.previous.as_ref().unwrap();
            let cosine = previous.normal.abs_dot(&ray.direction);
            let pdf_emit =
                LightPathCache::compute_background_pdf(self.scene, ray.direction) * cosine;
            let pdf_next_event = integrator
                .background_next_event_pdf(self.scene, ray.direction);
            integrator.emitter_hit_mis(
                &self.path,
                pdf_emit,
                pdf_next_event,
                self.select_density(),
                self.num_light_paths,
            )
        };

        let raw = throughput * radiance;
        self.record(self.path.vertices.len(), 0, raw, raw * mis_weight);
        raw * mis_weight
    }

    /// One next-event sample: a coin flip between the environment and the
    /// area emitters, a shadow test, and the weighted contribution.
    fn next_event(
        &self,
        rng: &mut Rng,
        hit: &SurfacePoint,
        out_dir: Vector3f,
        throughput: RgbColor,
    ) -> RgbColor {
        let background_probability = LightPathCache::background_probability(self.scene);
        if rng.next_float() < background_probability {
            self.next_event_background(rng, hit, out_dir, throughput, background_probability)
        } else {
            self.next_event_emitter(rng, hit, out_dir, throughput, background_probability)
        }
    }

    fn next_event_background(
        &self,
        rng: &mut Rng,
        hit: &SurfacePoint,
        out_dir: Vector3f,
        throughput: RgbColor,
        background_probability: Float,
    ) -> RgbColor {
        let background = match &self.scene.background {
            Some(background) => background,
            None => return RgbColor::BLACK,
        };
        let (ux, uy) = rng.next_float_2d();
        let sample = background.sample_direction(Vector2f::new(ux, uy));
        if sample.pdf <= 0.0 {
            return RgbColor::BLACK;
        }
        if !self.scene.leaves_scene(hit, sample.direction) {
            return RgbColor::BLACK;
        }

        let material = self.scene.material(hit.mesh_id);
        let bsdf = material.evaluate_with_cosine(hit, out_dir, sample.direction, false);
        if bsdf.is_black() {
            return RgbColor::BLACK;
        }

        let num_shadow_rays = self.integrator.num_shadow_rays as Float;
        let pdf_next_event = sample.pdf * background_probability * num_shadow_rays;

        let (pdf_hit, pdf_reverse_dir) = material.pdf(hit, out_dir, sample.direction, false);
        let pdf_reverse = match &self.previous {
            Some(previous) => pdf_reverse_dir * surface_area_to_solid_angle(hit, previous),
            None => 0.0,
        };
        let cosine = hit.normal.abs_dot(&sample.direction);
        let pdf_emit =
            LightPathCache::compute_background_pdf(self.scene, sample.direction) * cosine;

        let mis_weight = self.integrator.next_event_mis(
            &self.path,
            pdf_emit,
            pdf_next_event,
            pdf_hit,
            pdf_reverse,
            self.select_density(),
            self.num_light_paths,
        );

        let contribution =
            throughput * bsdf * sample.weight / (background_probability * num_shadow_rays);
        self.record(
            self.path.vertices.len(),
            1,
            contribution,
            contribution * mis_weight,
        );
        contribution * mis_weight
    }

    fn next_event_emitter(
        &self,
        rng: &mut Rng,
        hit: &SurfacePoint,
        out_dir: Vector3f,
        throughput: RgbColor,
        background_probability: Float,
    ) -> RgbColor {
        let scene = self.scene;
        if scene.num_emitters() == 0 {
            return RgbColor::BLACK;
        }
        let emitter_id = rng.next_int(0, scene.num_emitters() as u32) as usize;
        let emitter = &scene.emitters[emitter_id];
        let mesh = &scene.meshes[emitter.mesh_id];

        let (ux, uy) = rng.next_float_2d();
        let sample = emitter.sample_area(mesh, Vector2f::new(ux, uy));

        let to_light = sample.point.position - hit.position;
        if to_light.length_squared() == 0.0 {
            return RgbColor::BLACK;
        }
        let direction = to_light.normalize();

        let radiance = emitter.emitted_radiance(&sample.point, -direction);
        if radiance.is_black() {
            return RgbColor::BLACK;
        }
        if scene.is_occluded(hit, sample.point.position) {
            return RgbColor::BLACK;
        }

        let material = scene.material(hit.mesh_id);
        let bsdf = material.evaluate_with_cosine(hit, out_dir, direction, false);
        if bsdf.is_black() {
            return RgbColor::BLACK;
        }

        let num_shadow_rays = self.integrator.num_shadow_rays as Float;
        let select_prob = LightPathCache::select_light_pmf(scene) * (1.0 - background_probability);
        let pdf_next_event = sample.pdf * select_prob * num_shadow_rays;

        // Solid-angle Jacobian of the connection, seen from the shading
        // point.
        let jacobian = surface_area_to_solid_angle(hit, &sample.point);
        if jacobian == 0.0 {
            return RgbColor::BLACK;
        }

        let (pdf_hit_dir, pdf_reverse_dir) = material.pdf(hit, out_dir, direction, false);
        let pdf_hit = pdf_hit_dir * jacobian;
        let pdf_reverse = match &self.previous {
            Some(previous) => pdf_reverse_dir * surface_area_to_solid_angle(hit, previous),
            None => 0.0,
        };
        let pdf_emit = LightPathCache::compute_emitter_pdf(
            scene,
            emitter_id,
            &sample.point,
            -direction,
            surface_area_to_solid_angle(&sample.point, hit),
        );

        let mis_weight = self.integrator.next_event_mis(
            &self.path,
            pdf_emit,
            pdf_next_event,
            pdf_hit,
            pdf_reverse,
            self.select_density(),
            self.num_light_paths,
        );

        let contribution = throughput * bsdf * radiance * jacobian / pdf_next_event;
        self.record(
            self.path.vertices.len(),
            1,
            contribution,
            contribution * mis_weight,
        );
        contribution * mis_weight
    }

    /// One bidirectional connection to a uniformly selected cache vertex.
    fn bidir_connections(
        &self,
        rng: &mut Rng,
        hit: &SurfacePoint,
        out_dir: Vector3f,
        depth: u32,
        throughput: RgbColor,
    ) -> RgbColor {
        let (path_index, vertex_index, _) = match self.selector.select(rng) {
            Some(selection) => selection,
            None => return RgbColor::BLACK,
        };
        let vertex = self.cache.vertex(path_index, vertex_index);
        if depth + vertex.depth + 1 > self.integrator.max_depth {
            return RgbColor::BLACK;
        }
        let ancestor = self.cache.ancestor(vertex);

        let to_vertex = vertex.point.position - hit.position;
        let dist_squared = to_vertex.length_squared();
        if dist_squared == 0.0 {
            return RgbColor::BLACK;
        }
        let direction = to_vertex / dist_squared.sqrt();

        if self.scene.is_occluded(hit, vertex.point.position) {
            return RgbColor::BLACK;
        }

        let camera_material = self.scene.material(hit.mesh_id);
        let camera_bsdf = camera_material.evaluate_with_cosine(hit, out_dir, direction, false);

        let light_out = vertex.point.direction_to(ancestor.point.position);
        let light_material = self.scene.material(vertex.point.mesh_id);
        let light_bsdf =
            light_material.evaluate_with_cosine(&vertex.point, light_out, -direction, true);

        if camera_bsdf.is_black() || light_bsdf.is_black() {
            return RgbColor::BLACK;
        }

        let select_density = self.select_density();
        let contribution =
            throughput * camera_bsdf * light_bsdf * vertex.weight / dist_squared / select_density;
        if contribution.has_non_finite() {
            return RgbColor::BLACK;
        }

        // Forward and reverse densities at both endpoints, converted between
        // area and solid-angle measures as the slots require.
        let (camera_forward, camera_reverse_dir) =
            camera_material.pdf(hit, out_dir, direction, false);
        let pdf_camera_to_light =
            camera_forward * surface_area_to_solid_angle(hit, &vertex.point);
        let pdf_camera_reverse = match &self.previous {
            Some(previous) => camera_reverse_dir * surface_area_to_solid_angle(hit, previous),
            None => 0.0,
        };

        let (light_forward, light_reverse_dir) =
            light_material.pdf(&vertex.point, light_out, -direction, true);
        let pdf_light_to_camera =
            light_forward * surface_area_to_solid_angle(&vertex.point, hit);

        let (pdf_light_reverse, pdf_next_event) = if ancestor.depth == 0 {
            let reverse = if ancestor.is_background {
                light_reverse_dir
            } else {
                light_reverse_dir * surface_area_to_solid_angle(&vertex.point, &ancestor.point)
            };
            let reverse = if self.integrator.enable_hitting {
                reverse
            } else {
                0.0
            };
            let next_event = if ancestor.is_background {
                self.integrator
                    .background_next_event_pdf(self.scene, light_out)
            } else {
                self.integrator
                    .emitter_next_event_pdf(self.scene, &ancestor.point)
            };
            (reverse, next_event)
        } else {
            (
                light_reverse_dir * surface_area_to_solid_angle(&vertex.point, &ancestor.point),
                0.0,
            )
        };

        let mis_weight = self.integrator.bidir_connect_mis(
            &self.path,
            self.cache,
            vertex,
            pdf_camera_reverse,
            pdf_camera_to_light,
            pdf_light_reverse,
            pdf_light_to_camera,
            pdf_next_event,
            select_density,
            self.num_light_paths,
        );

        self.record(
            self.path.vertices.len(),
            vertex.depth as usize + 1,
            contribution,
            contribution * mis_weight,
        );
        contribution * mis_weight
    }
}

impl<'a> WalkHooks for CameraWalkState<'a> {
    fn on_hit(
        &mut self,
        rng: &mut Rng,
        ray: &Ray,
        hit: &SurfacePoint,
        pdf_from_ancestor: Float,
        throughput: RgbColor,
        depth: u32,
        _to_ancestor_jacobian: Float,
    ) -> RgbColor {
        self.path.vertices.push(PathPdfPair {
            pdf_from_ancestor,
            pdf_to_ancestor: 0.0,
        });
        self.path.distances.push(hit.distance);
        self.path.throughput = throughput;

        let value = self.camera_hit(rng, ray, hit, depth, throughput);
        self.previous = Some(*hit);
        value
    }

    fn on_invalid_hit(
        &mut self,
        _rng: &mut Rng,
        ray: &Ray,
        pdf_direction: Float,
        throughput: RgbColor,
        depth: u32,
    ) -> RgbColor {
        self.background_hit(ray, pdf_direction, throughput, depth)
    }

    fn on_continue(&mut self, pdf_to_ancestor: Float, _depth: u32) {
        let len = self.path.vertices.len();
        if len >= 2 {
            self.path.vertices[len - 2].pdf_to_ancestor = pdf_to_ancestor;
        }
    }
}
