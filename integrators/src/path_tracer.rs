//! A classic unidirectional path tracer with next-event estimation.
//!
//! Kept as the reference estimator: with connections and the light tracer
//! disabled, the bidirectional integrator must agree with this one up to
//! variance.

use crate::light_path_cache::LightPathCache;
use crate::vertex_cache_bidir::{RenderError, DEFAULT_CAMERA_SEED};
use ground_core::base::*;
use ground_core::geometry::*;
use ground_core::image::FrameBuffer;
use ground_core::rng::Rng;
use ground_core::sampling::{balance_heuristic, surface_area_to_solid_angle};
use ground_core::scene::Scene;
use ground_core::spectrum::RgbColor;
use log::info;
use rayon::prelude::*;

/// Implements the path tracing algorithm.
pub struct PathTracer {
    /// Number of iterations to render.
    pub num_iterations: u32,

    /// Maximum path length in edges.
    pub max_depth: u32,

    /// Minimum path length in edges before contributions count.
    pub min_depth: u32,

    /// Base seed of the per-pixel random number streams.
    pub base_seed: u64,
}

impl Default for PathTracer {
    fn default() -> Self {
        Self {
            num_iterations: 2,
            max_depth: 5,
            min_depth: 1,
            base_seed: DEFAULT_CAMERA_SEED,
        }
    }
}

impl PathTracer {
    /// Renders the scene into the frame buffer.
    ///
    /// * `scene`        - The prepared scene.
    /// * `frame_buffer` - Accumulation target.
    pub fn render(
        &self,
        scene: &Scene,
        frame_buffer: &mut FrameBuffer,
    ) -> Result<(), RenderError> {
        let (width, height) = scene.camera.resolution();
        info!("path tracing {}x{}, max depth {}", width, height, self.max_depth);

        for iteration in 0..self.num_iterations {
            frame_buffer.start_iteration();
            let fb: &FrameBuffer = frame_buffer;
            (0..height).into_par_iter().for_each(|row| {
                for col in 0..width {
                    let pixel_index = (row * width + col) as u64;
                    let mut rng =
                        Rng::from_hash(self.base_seed, pixel_index, iteration as u64);
                    let value = self.estimate_pixel(scene, col, row, &mut rng);
                    fb.splat_pixel(col, row, value);
                }
            });
            frame_buffer.end_iteration();
        }
        Ok(())
    }

    /// One pixel sample.
    fn estimate_pixel(&self, scene: &Scene, col: usize, row: usize, rng: &mut Rng) -> RgbColor {
        let (jitter_x, jitter_y) = rng.next_float_2d();
        let film_pos = Vector2f::new(col as Float + jitter_x, row as Float + jitter_y);
        let camera_ray = scene.camera.generate_ray(film_pos);

        let mut estimate = RgbColor::BLACK;
        let mut throughput = camera_ray.weight;
        let mut ray = camera_ray.ray;

        // Solid-angle density of the most recent direction sample, for the
        // balance weight against next-event estimation.
        let mut previous_pdf = 0.0;
        let mut previous_hit: Option<SurfacePoint> = None;

        for depth in 1..=self.max_depth {
            let hit = match scene.trace(&ray) {
                Some(hit) => hit,
                None => {
                    estimate += throughput
                        * self.background_radiance(scene, &ray, depth, previous_pdf);
                    break;
                }
            };

            // Possibly add emitted light at the intersection.
            if depth >= self.min_depth {
                if let Some((_, emitter)) = scene.emitter_at(hit.mesh_id) {
                    let radiance = emitter.emitted_radiance(&hit, -ray.direction);
                    if !radiance.is_black() {
                        let weight = match &previous_hit {
                            None => 1.0,
                            Some(previous) => {
                                let pdf_bsdf =
                                    previous_pdf * surface_area_to_solid_angle(previous, &hit);
                                let pdf_next_event = self.next_event_pdf_area(scene, &hit);
                                balance_heuristic(1, pdf_bsdf, 1, pdf_next_event)
                            }
                        };
                        estimate += throughput * radiance * weight;
                    }
                }
            }

            // Next-event estimation towards the emitters or the environment.
            if depth < self.max_depth && depth + 1 >= self.min_depth {
                estimate += throughput * self.next_event(scene, &hit, -ray.direction, rng);
            }

            // Continue the walk.
            let material = scene.material(hit.mesh_id);
            let sample =
                match material.sample(&hit, -ray.direction, false, rng.next_float_2d()) {
                    Some(sample) => sample,
                    None => break,
                };

            throughput *= sample.weight;
            previous_pdf = sample.pdf_forward;
            ray = hit.spawn_ray(sample.direction);
            previous_hit = Some(hit);
        }

        estimate.zero_if_non_finite()
    }

    /// Weighted background radiance for an escaped ray.
    fn background_radiance(
        &self,
        scene: &Scene,
        ray: &Ray,
        depth: u32,
        previous_pdf: Float,
    ) -> RgbColor {
        let background = match &scene.background {
            Some(background) => background,
            None => return RgbColor::BLACK,
        };
        if depth < self.min_depth {
            return RgbColor::BLACK;
        }
        let radiance = background.emitted_radiance(ray.direction);
        if radiance.is_black() {
            return RgbColor::BLACK;
        }
        if depth == 1 {
            return radiance;
        }
        let pdf_next_event = background.direction_pdf(ray.direction)
            * LightPathCache::background_probability(scene);
        radiance * balance_heuristic(1, previous_pdf, 1, pdf_next_event)
    }

    /// Density of next-event estimation sampling a given emitter point, in
    /// area measure.
    fn next_event_pdf_area(&self, scene: &Scene, point: &SurfacePoint) -> Float {
        match scene.emitter_at(point.mesh_id) {
            Some((_, emitter)) => {
                let mesh = &scene.meshes[emitter.mesh_id];
                emitter.pdf_area(mesh)
                    * LightPathCache::select_light_pmf(scene)
                    * (1.0 - LightPathCache::background_probability(scene))
            }
            None => 0.0,
        }
    }

    /// One next-event sample with the balance weight against a BSDF hit.
    fn next_event(
        &self,
        scene: &Scene,
        hit: &SurfacePoint,
        out_dir: Vector3f,
        rng: &mut Rng,
    ) -> RgbColor {
        let background_probability = LightPathCache::background_probability(scene);

        if rng.next_float() < background_probability {
            let background = match &scene.background {
                Some(background) => background,
                None => return RgbColor::BLACK,
            };
            let (ux, uy) = rng.next_float_2d();
            let sample = background.sample_direction(Vector2f::new(ux, uy));
            if sample.pdf <= 0.0 || !scene.leaves_scene(hit, sample.direction) {
                return RgbColor::BLACK;
            }
            let material = scene.material(hit.mesh_id);
            let bsdf = material.evaluate_with_cosine(hit, out_dir, sample.direction, false);
            if bsdf.is_black() {
                return RgbColor::BLACK;
            }
            let (pdf_bsdf, _) = material.pdf(hit, out_dir, sample.direction, false);
            let pdf_next_event = sample.pdf * background_probability;
            let weight = balance_heuristic(1, pdf_next_event, 1, pdf_bsdf);
            bsdf * sample.weight * weight / background_probability
        } else {
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
            if radiance.is_black() || scene.is_occluded(hit, sample.point.position) {
                return RgbColor::BLACK;
            }
            let material = scene.material(hit.mesh_id);
            let bsdf = material.evaluate_with_cosine(hit, out_dir, direction, false);
            if bsdf.is_black() {
                return RgbColor::BLACK;
            }

            let jacobian = surface_area_to_solid_angle(hit, &sample.point);
            let select_prob =
                LightPathCache::select_light_pmf(scene) * (1.0 - background_probability);
            let pdf_next_event = sample.pdf * select_prob;
            let (pdf_bsdf_dir, _) = material.pdf(hit, out_dir, direction, false);
            let weight =
                balance_heuristic(1, pdf_next_event, 1, pdf_bsdf_dir * jacobian);
            bsdf * radiance * jacobian * weight / pdf_next_event
        }
    }
}
