//! The vertex-cache bidirectional integrator: combines light tracing,
//! bidirectional connections against a shared vertex cache, next-event
//! estimation and direct emitter hits with the balance heuristic.
//!
//! The weighting machinery works on two reciprocal products accumulated
//! in-place over the per-vertex density arrays, which keeps the cost of the
//! balance heuristic constant per sample regardless of path length.

use crate::bidir_base::{BidirPathPdfs, CameraPath, CameraWalkState};
use crate::light_path_cache::{LightPathCache, NextEventPdfCallback};
use crate::path_cache::{PathCache, PathVertex};
use crate::random_walk::RandomWalk;
use crate::tech_pyramid::TechPyramid;
use crate::vertex_selector::VertexSelector;
use ground_core::base::*;
use ground_core::geometry::*;
use ground_core::image::FrameBuffer;
use ground_core::rng::Rng;
use ground_core::sampling::surface_area_to_solid_angle;
use ground_core::scene::Scene;
use ground_core::spectrum::RgbColor;
use log::{error, info};
use rayon::prelude::*;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;

/// Default seed of the camera path stream.
pub const DEFAULT_CAMERA_SEED: u64 = 0xC030114;

/// Default seed of the light path stream.
pub const DEFAULT_LIGHT_SEED: u64 = 0x13C0FEFE;

/// Errors surfaced by the render loop.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("a worker panicked during iteration {iteration}")]
    WorkerPanic { iteration: u32 },
}

/// Configuration and state of the bidirectional integrator.
pub struct VertexCacheBidir {
    /// Number of iterations to render.
    pub num_iterations: u32,

    /// Maximum path length in edges.
    pub max_depth: u32,

    /// Minimum path length in edges before contributions count.
    pub min_depth: u32,

    /// Number of light paths per iteration; defaults to the pixel count.
    pub num_light_paths: Option<usize>,

    /// Bidirectional connections per camera vertex.
    pub num_connections: u32,

    /// Shadow rays per camera vertex.
    pub num_shadow_rays: u32,

    /// Count radiance carried by paths that hit an emitter directly.
    pub enable_hitting: bool,

    /// Enable bidirectional connections against the vertex cache.
    pub enable_connections: bool,

    /// Enable projecting cached vertices onto the image.
    pub enable_light_tracer: bool,

    /// Base seed of the camera path stream.
    pub base_seed_camera: u64,

    /// Base seed of the light path stream.
    pub base_seed_light: u64,

    /// Route cross-pixel splats through a fixed-order reduction so renders
    /// are bitwise reproducible.
    pub deterministic_splats: bool,

    /// Record the per-technique image pyramid.
    pub render_technique_pyramid: bool,

    /// The pyramid recorded by the last render, when enabled.
    pub technique_pyramid: Option<TechPyramid>,
}

impl Default for VertexCacheBidir {
    fn default() -> Self {
        Self {
            num_iterations: 2,
            max_depth: 5,
            min_depth: 1,
            num_light_paths: None,
            num_connections: 1,
            num_shadow_rays: 1,
            enable_hitting: true,
            enable_connections: true,
            enable_light_tracer: true,
            base_seed_camera: DEFAULT_CAMERA_SEED,
            base_seed_light: DEFAULT_LIGHT_SEED,
            deterministic_splats: false,
            render_technique_pyramid: false,
            technique_pyramid: None,
        }
    }
}

/// One staged light-tracer splat.
struct StagedSplat {
    pixel: Vector2f,
    raw: RgbColor,
    weighted: RgbColor,
    light_len: usize,
}

impl VertexCacheBidir {
    /// Renders the scene into the frame buffer. An iteration whose worker
    /// panics aborts the render; the frame buffer keeps the state of the
    /// last completed iteration.
    ///
    /// * `scene`        - The prepared scene.
    /// * `frame_buffer` - Accumulation target.
    pub fn render(
        &mut self,
        scene: &Scene,
        frame_buffer: &mut FrameBuffer,
    ) -> Result<(), RenderError> {
        let (width, height) = scene.camera.resolution();
        let num_light_paths = self.num_light_paths.unwrap_or(width * height);

        // Light subpaths stop one edge short of the full depth bound; the
        // connection or projection to the camera supplies the last edge.
        let light_depth = self.max_depth.saturating_sub(1);
        let mut light_paths =
            LightPathCache::new(num_light_paths, light_depth, self.base_seed_light);

        let pyramid = if self.render_technique_pyramid {
            Some(TechPyramid::new(width, height, self.max_depth))
        } else {
            None
        };

        info!(
            "rendering {}x{} with {} light paths, max depth {}",
            width, height, num_light_paths, self.max_depth
        );

        for iteration in 0..self.num_iterations {
            frame_buffer.start_iteration();

            let this: &Self = self;
            let fb: &FrameBuffer = frame_buffer;
            let pyramid_ref = pyramid.as_ref();
            let light_paths_ref = &mut light_paths;
            let result = catch_unwind(AssertUnwindSafe(move || {
                light_paths_ref.trace_all(scene, iteration, this);
                let cache: &PathCache = &light_paths_ref.cache;
                let selector = VertexSelector::new(cache);

                if this.enable_light_tracer {
                    this.splat_light_vertices(
                        scene,
                        cache,
                        &selector,
                        fb,
                        pyramid_ref,
                        num_light_paths,
                    );
                }

                (0..height).into_par_iter().for_each(|row| {
                    for col in 0..width {
                        this.render_pixel(
                            scene,
                            cache,
                            &selector,
                            fb,
                            pyramid_ref,
                            num_light_paths,
                            col,
                            row,
                            width,
                            iteration,
                        );
                    }
                });
            }));

            match result {
                Ok(()) => frame_buffer.end_iteration(),
                Err(_) => {
                    error!("aborting render: worker panicked in iteration {iteration}");
                    return Err(RenderError::WorkerPanic { iteration });
                }
            }
        }

        self.technique_pyramid = pyramid;
        Ok(())
    }

    /// Traces one camera path and splats its estimate into its own pixel.
    #[allow(clippy::too_many_arguments)]
    fn render_pixel(
        &self,
        scene: &Scene,
        cache: &PathCache,
        selector: &VertexSelector,
        frame_buffer: &FrameBuffer,
        pyramid: Option<&TechPyramid>,
        num_light_paths: usize,
        col: usize,
        row: usize,
        width: usize,
        iteration: u32,
    ) -> RgbColor {
        let pixel_index = (row * width + col) as u64;
        let mut rng = Rng::from_hash(self.base_seed_camera, pixel_index, iteration as u64);

        let (jitter_x, jitter_y) = rng.next_float_2d();
        let film_pos = Vector2f::new(col as Float + jitter_x, row as Float + jitter_y);
        let camera_ray = scene.camera.generate_ray(film_pos);

        let mut state = CameraWalkState::new(
            self,
            scene,
            cache,
            selector,
            pyramid,
            num_light_paths,
            film_pos,
        );
        let mut walk = RandomWalk {
            scene,
            max_depth: self.max_depth,
            is_on_light_subpath: false,
            hooks: &mut state,
        };
        let estimate = walk.start_from_camera(
            &mut rng,
            camera_ray.ray,
            camera_ray.pdf,
            camera_ray.weight,
        );

        frame_buffer.splat_pixel(col, row, estimate);
        estimate
    }

    /// Projects every cached vertex onto the image plane and splats the
    /// weighted contribution. In deterministic mode the contributions are
    /// gathered per vertex and reduced serially in cache order.
    fn splat_light_vertices(
        &self,
        scene: &Scene,
        cache: &PathCache,
        selector: &VertexSelector,
        frame_buffer: &FrameBuffer,
        pyramid: Option<&TechPyramid>,
        num_light_paths: usize,
    ) {
        let entries = selector.entries();
        let select_density = self.bidir_select_density(selector.count(), num_light_paths);

        if self.deterministic_splats {
            let staged: Vec<Option<StagedSplat>> = entries
                .par_iter()
                .map(|&(path_index, vertex_index)| {
                    self.light_tracer_contribution(
                        scene,
                        cache,
                        cache.vertex(path_index, vertex_index),
                        select_density,
                        num_light_paths,
                    )
                })
                .collect();
            for splat in staged.into_iter().flatten() {
                frame_buffer.splat(splat.pixel.x, splat.pixel.y, splat.weighted);
                if let Some(pyramid) = pyramid {
                    pyramid.add(0, splat.light_len, splat.pixel, splat.raw, splat.weighted);
                }
            }
        } else {
            entries.par_iter().for_each(|&(path_index, vertex_index)| {
                if let Some(splat) = self.light_tracer_contribution(
                    scene,
                    cache,
                    cache.vertex(path_index, vertex_index),
                    select_density,
                    num_light_paths,
                ) {
                    frame_buffer.splat(splat.pixel.x, splat.pixel.y, splat.weighted);
                    if let Some(pyramid) = pyramid {
                        pyramid.add(0, splat.light_len, splat.pixel, splat.raw, splat.weighted);
                    }
                }
            });
        }
    }

    /// The light tracer estimate of a single cached vertex.
    fn light_tracer_contribution(
        &self,
        scene: &Scene,
        cache: &PathCache,
        vertex: &PathVertex,
        select_density: Float,
        num_light_paths: usize,
    ) -> Option<StagedSplat> {
        let response = scene.camera.sample_response(&vertex.point)?;
        if scene.is_occluded(&vertex.point, scene.camera.position()) {
            return None;
        }

        let ancestor = cache.ancestor(vertex);
        let out_dir = vertex.point.direction_to(ancestor.point.position);
        let dir_to_camera = vertex.point.direction_to(scene.camera.position());

        let material = scene.material(vertex.point.mesh_id);
        let bsdf = material.evaluate_with_cosine(&vertex.point, out_dir, dir_to_camera, true);
        if bsdf.is_black() {
            return None;
        }

        let (_, pdf_reverse_dir) = material.pdf(&vertex.point, out_dir, dir_to_camera, true);
        let (pdf_reverse, pdf_next_event) = if ancestor.depth == 0 {
            let reverse = if ancestor.is_background {
                pdf_reverse_dir
            } else {
                pdf_reverse_dir * surface_area_to_solid_angle(&vertex.point, &ancestor.point)
            };
            let reverse = if self.enable_hitting { reverse } else { 0.0 };
            let next_event = if ancestor.is_background {
                self.background_next_event_pdf(scene, out_dir)
            } else {
                self.emitter_next_event_pdf(scene, &ancestor.point)
            };
            (reverse, next_event)
        } else {
            (
                pdf_reverse_dir * surface_area_to_solid_angle(&vertex.point, &ancestor.point),
                0.0,
            )
        };

        let mis_weight = self.light_tracer_mis(
            cache,
            vertex,
            response.pdf_emit,
            pdf_reverse,
            pdf_next_event,
            select_density,
            num_light_paths,
        );

        let raw = bsdf * vertex.weight * (response.weight / num_light_paths as Float);
        let weighted = raw * mis_weight;
        if weighted.has_non_finite() {
            return None;
        }

        Some(StagedSplat {
            pixel: response.pixel,
            raw,
            weighted,
            light_len: vertex.depth as usize + 1,
        })
    }

    /// The effective density of one bidirectional connection sample,
    /// combining uniform cache selection, the connection count and the
    /// light path count. Exactly zero for an empty cache.
    pub fn bidir_select_density(&self, cache_size: usize, num_light_paths: usize) -> Float {
        if cache_size == 0 {
            return 0.0;
        }
        self.num_connections as Float * num_light_paths as Float / cache_size as Float
    }

    /// Density of next-event estimation sampling a given emitter point, in
    /// area measure, including emitter selection, the background coin and
    /// the shadow-ray count.
    pub fn emitter_next_event_pdf(&self, scene: &Scene, point: &SurfacePoint) -> Float {
        let (_, emitter) = match scene.emitter_at(point.mesh_id) {
            Some(found) => found,
            None => return 0.0,
        };
        let mesh = &scene.meshes[emitter.mesh_id];
        emitter.pdf_area(mesh)
            * LightPathCache::select_light_pmf(scene)
            * (1.0 - LightPathCache::background_probability(scene))
            * self.num_shadow_rays as Float
    }

    /// Density of next-event estimation sampling a given environment
    /// direction, in solid-angle measure.
    pub fn background_next_event_pdf(&self, scene: &Scene, dir_to_env: Vector3f) -> Float {
        match &scene.background {
            Some(background) => {
                background.direction_pdf(dir_to_env)
                    * LightPathCache::background_probability(scene)
                    * self.num_shadow_rays as Float
            }
            None => 0.0,
        }
    }

    /// Accumulates the reciprocal density ratios of all techniques that
    /// shorten the camera prefix: connections at earlier camera vertices and
    /// the light tracer at the primary vertex.
    pub(crate) fn camera_path_reciprocals(
        &self,
        k: usize,
        pdfs: &BidirPathPdfs,
        select_density: Float,
        num_light_paths: usize,
    ) -> Float {
        let mut sum = 0.0;
        let mut reciprocal = 1.0;
        let mut i = k;
        while i >= 1 {
            reciprocal *= pdfs.light_to_cam[i] / pdfs.cam_to_light[i];
            if self.enable_connections {
                sum += reciprocal * select_density;
            }
            i -= 1;
        }
        if self.enable_light_tracer {
            sum += reciprocal * pdfs.light_to_cam[0] / pdfs.cam_to_light[0]
                * num_light_paths as Float;
        }
        sum
    }

    /// Accumulates the reciprocal density ratios of all techniques that
    /// extend the camera prefix: connections at later vertices, and finally
    /// next-event estimation or a direct hit at the emitter end.
    pub(crate) fn light_path_reciprocals(
        &self,
        k: isize,
        num_pdfs: usize,
        pdfs: &BidirPathPdfs,
        select_density: Float,
    ) -> Float {
        let mut sum = 0.0;
        let mut reciprocal = 1.0;
        for i in ((k + 1).max(0) as usize)..num_pdfs {
            reciprocal *= pdfs.cam_to_light[i] / pdfs.light_to_cam[i];
            // Reaching the emitter itself is handled by the final term, not
            // as a connection.
            if i + 2 < num_pdfs && self.enable_connections {
                sum += reciprocal * select_density;
            }
        }
        sum + reciprocal
    }

    /// Balance weight for a camera path that hit an emitter (or escaped to
    /// the environment; the densities then live in solid-angle measure, the
    /// structure is identical).
    pub(crate) fn emitter_hit_mis(
        &self,
        path: &CameraPath,
        pdf_emit: Float,
        pdf_next_event: Float,
        select_density: Float,
        num_light_paths: usize,
    ) -> Float {
        let num_pdfs = path.vertices.len();
        if num_pdfs == 1 {
            return 1.0;
        }
        let k = num_pdfs - 1;

        let mut pdfs = BidirPathPdfs::new(num_pdfs);
        pdfs.gather_camera_pdfs(path, k);
        pdfs.light_to_cam[k - 1] = pdf_emit;

        let pdf_this = path.vertices[k].pdf_from_ancestor;
        let sum = self.camera_path_reciprocals(k - 1, &pdfs, select_density, num_light_paths);
        1.0 / (1.0 + pdf_next_event / pdf_this + sum / pdf_this)
    }

    /// Balance weight for a next-event sample.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn next_event_mis(
        &self,
        path: &CameraPath,
        pdf_emit: Float,
        pdf_next_event: Float,
        pdf_hit: Float,
        pdf_reverse: Float,
        select_density: Float,
        num_light_paths: usize,
    ) -> Float {
        let num_pdfs = path.vertices.len() + 1;
        let k = num_pdfs - 2;

        let mut pdfs = BidirPathPdfs::new(num_pdfs);
        pdfs.gather_camera_pdfs(path, k);
        pdfs.cam_to_light[k] = path.vertices[k].pdf_from_ancestor;
        pdfs.light_to_cam[k] = pdf_emit;
        if num_pdfs > 2 {
            pdfs.light_to_cam[k - 1] = pdf_reverse;
        }

        let sum = self.camera_path_reciprocals(k, &pdfs, select_density, num_light_paths);
        let hit_ratio = if self.enable_hitting {
            pdf_hit / pdf_next_event
        } else {
            0.0
        };
        1.0 / (1.0 + hit_ratio + sum / pdf_next_event)
    }

    /// Balance weight for a bidirectional connection.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn bidir_connect_mis(
        &self,
        path: &CameraPath,
        cache: &PathCache,
        vertex: &PathVertex,
        pdf_camera_reverse: Float,
        pdf_camera_to_light: Float,
        pdf_light_reverse: Float,
        pdf_light_to_camera: Float,
        pdf_next_event: Float,
        select_density: Float,
        num_light_paths: usize,
    ) -> Float {
        let num_pdfs = path.vertices.len() + vertex.depth as usize + 1;
        let k = path.vertices.len() - 1;

        let mut pdfs = BidirPathPdfs::new(num_pdfs);
        pdfs.gather_camera_pdfs(path, k);
        pdfs.gather_light_pdfs(cache, vertex, k + 1, self.enable_hitting);

        if k > 0 {
            pdfs.light_to_cam[k - 1] = pdf_camera_reverse;
        }
        pdfs.cam_to_light[k] = path.vertices[k].pdf_from_ancestor;
        pdfs.light_to_cam[k] = pdf_light_to_camera;
        pdfs.cam_to_light[k + 1] = pdf_camera_to_light;
        pdfs.cam_to_light[k + 2] = pdf_light_reverse + pdf_next_event;

        let sum = self.camera_path_reciprocals(k, &pdfs, select_density, num_light_paths)
            + self.light_path_reciprocals(k as isize, num_pdfs, &pdfs, select_density);
        1.0 / (1.0 + sum / select_density)
    }

    /// Balance weight for a light-tracer splat.
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn light_tracer_mis(
        &self,
        cache: &PathCache,
        vertex: &PathVertex,
        pdf_camera_to_primary: Float,
        pdf_reverse: Float,
        pdf_next_event: Float,
        select_density: Float,
        num_light_paths: usize,
    ) -> Float {
        let num_pdfs = vertex.depth as usize + 1;

        let mut pdfs = BidirPathPdfs::new(num_pdfs);
        pdfs.gather_light_pdfs(cache, vertex, 0, self.enable_hitting);
        pdfs.cam_to_light[0] = pdf_camera_to_primary;
        if num_pdfs > 1 {
            pdfs.cam_to_light[1] = pdf_reverse + pdf_next_event;
        }

        let sum = self.light_path_reciprocals(-1, num_pdfs, &pdfs, select_density);
        1.0 / (1.0 + sum / num_light_paths as Float)
    }
}

impl NextEventPdfCallback for VertexCacheBidir {
    fn emitter_next_event_pdf(&self, scene: &Scene, root: &SurfacePoint) -> Float {
        VertexCacheBidir::emitter_next_event_pdf(self, scene, root)
    }

    fn background_next_event_pdf(&self, scene: &Scene, dir_to_env: Vector3f) -> Float {
        VertexCacheBidir::background_next_event_pdf(self, scene, dir_to_env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidir_base::PathPdfPair;

    fn all_techniques() -> VertexCacheBidir {
        VertexCacheBidir {
            num_connections: 1,
            num_shadow_rays: 1,
            enable_hitting: true,
            enable_connections: true,
            enable_light_tracer: true,
            ..Default::default()
        }
    }

    /// Builds a camera path whose stored densities reproduce the master
    /// arrays: slot i carries `cam[i]` towards the light and `light[i]` back
    /// towards the camera.
    fn synthetic_camera_path(cam: &[Float], light: &[Float], count: usize) -> CameraPath {
        let mut path = CameraPath::new(Vector2f::zero(), 8);
        for i in 0..count {
            path.vertices.push(PathPdfPair {
                pdf_from_ancestor: cam[i],
                pdf_to_ancestor: light[i],
            });
            path.distances.push(1.0);
        }
        path
    }

    /// Builds one cached light path whose vertex at depth j sits at
    /// full-path slot n-1-j: emission densities from the light arrays,
    /// camera-direction densities from the cam array, and the next-event
    /// density stamped on the depth 2 vertex.
    fn synthetic_cache(cam: &[Float], light: &[Float], nee: Float, n: usize) -> PathCache {
        let mut cache = PathCache::new(1, (n - 1) as u32);
        for j in 0..n {
            let slot = n - 1 - j;
            cache.vertices[j] = PathVertex {
                pdf_from_ancestor: light[slot],
                pdf_reverse_ancestor: cam[slot],
                pdf_next_event_ancestor: if j == 2 { nee } else { 0.0 },
                ancestor_index: j.saturating_sub(1) as u32,
                depth: j as u32,
                path_index: 0,
                ..Default::default()
            };
        }
        cache.lengths[0] = n as u32;
        cache
    }

    /// For one full path, the balance weights of every enabled technique
    /// must sum to one. The densities are arbitrary positive values; what is
    /// verified is that all four weight formulas enumerate the same
    /// technique set with consistent density products.
    fn assert_partition_of_unity(cam: &[Float], light: &[Float], nee: Float) {
        let n = cam.len();
        let integrator = all_techniques();
        let num_light_paths: usize = 10;
        let density = 0.35;

        let mut total = 0.0;

        // Camera path hits the emitter.
        let path = synthetic_camera_path(cam, light, n);
        total += integrator.emitter_hit_mis(
            &path,
            light[n - 2] * light[n - 1],
            nee,
            density,
            num_light_paths,
        );

        // Next-event estimation from the last camera vertex.
        let path = synthetic_camera_path(cam, light, n - 1);
        total += integrator.next_event_mis(
            &path,
            light[n - 2] * light[n - 1],
            nee,
            cam[n - 1],
            if n >= 3 { light[n - 3] } else { 0.0 },
            density,
            num_light_paths,
        );

        // Bidirectional connections at every interior cut.
        let cache = synthetic_cache(cam, light, nee, n);
        for cut in 0..n.saturating_sub(2) {
            let depth = n - 2 - cut;
            let path = synthetic_camera_path(cam, light, cut + 1);
            let vertex = *cache.vertex(0, depth as u32);
            let (pdf_light_reverse, pdf_next_event) = if depth == 1 {
                (cam[n - 1], nee)
            } else {
                (cam[cut + 2], 0.0)
            };
            total += integrator.bidir_connect_mis(
                &path,
                &cache,
                &vertex,
                if cut > 0 { light[cut - 1] } else { 0.0 },
                cam[cut + 1],
                pdf_light_reverse,
                light[cut],
                pdf_next_event,
                density,
                num_light_paths,
            );
        }

        // The light tracer splats the deepest vertex.
        let vertex = *cache.vertex(0, (n - 1) as u32);
        total += integrator.light_tracer_mis(
            &cache,
            &vertex,
            cam[0],
            cam[1],
            if n == 2 { nee } else { 0.0 },
            density,
            num_light_paths,
        );

        assert!(
            (total - 1.0).abs() < 1e-4,
            "weights for path length {} sum to {}",
            n,
            total
        );
    }

    #[test]
    fn balance_weights_partition_unity_length_2() {
        assert_partition_of_unity(&[0.8, 1.3], &[1.1, 0.7], 0.65);
    }

    #[test]
    fn balance_weights_partition_unity_length_3() {
        assert_partition_of_unity(&[0.8, 1.3, 0.6], &[1.1, 0.7, 1.4], 0.65);
    }

    #[test]
    fn balance_weights_partition_unity_length_4() {
        assert_partition_of_unity(&[0.8, 1.3, 0.6, 0.9], &[1.1, 0.7, 1.4, 0.5], 0.65);
    }

    #[test]
    fn balance_weights_partition_unity_length_6() {
        assert_partition_of_unity(
            &[0.8, 1.3, 0.6, 0.9, 1.7, 0.4],
            &[1.1, 0.7, 1.4, 0.5, 0.8, 2.1],
            0.3,
        );
    }

    #[test]
    fn select_density_is_zero_for_empty_cache() {
        let integrator = all_techniques();
        assert_eq!(integrator.bidir_select_density(0, 100), 0.0);
        assert!(integrator.bidir_select_density(50, 100) > 0.0);
    }

    #[test]
    fn disabled_techniques_drop_out_of_the_weights() {
        // With hitting as the only technique, the direct-hit weight is one.
        let integrator = VertexCacheBidir {
            enable_connections: false,
            enable_light_tracer: false,
            num_shadow_rays: 0,
            ..Default::default()
        };
        let cam = [0.8, 1.3, 0.6];
        let light = [1.1, 0.7, 1.4];
        let path = synthetic_camera_path(&cam, &light, 3);
        let weight = integrator.emitter_hit_mis(&path, light[1] * light[2], 0.0, 0.0, 10);
        assert!((weight - 1.0).abs() < 1e-5);
    }
}

