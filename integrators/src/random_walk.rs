//! The random walk engine shared by camera and light subpaths.
//!
//! The walk itself is a template: it traces, converts direction densities to
//! area densities at each hit, continues by importance sampling the surface
//! material, and reports everything through the `WalkHooks` trait. Hooks
//! decide what a vertex means (append to a cache, extend a camera path) and
//! return the radiance estimated at each hit. Termination is by depth only;
//! there is no Russian roulette here.

use ground_core::base::*;
use ground_core::geometry::*;
use ground_core::rng::Rng;
use ground_core::sampling::surface_area_to_solid_angle;
use ground_core::scene::Scene;
use ground_core::spectrum::RgbColor;

/// How the walk started, which decides how the first direction density is
/// converted to an area density.
#[derive(Copy, Clone, PartialEq)]
enum WalkStart {
    /// From the camera aperture: a point, so the usual cosine over squared
    /// distance conversion applies.
    Camera,

    /// From the environment: a parallel beam whose origin density is already
    /// per area on the perpendicular disc; only the cosine projection onto
    /// the surface remains.
    Background,
}

/// Receiver of the walk events.
pub trait WalkHooks {
    /// Called on every surface hit; returns the contribution estimated at
    /// the hit.
    ///
    /// * `rng`                  - The walk's random number generator.
    /// * `ray`                  - The ray that produced the hit.
    /// * `hit`                  - The surface point.
    /// * `pdf_from_ancestor`    - Density of this vertex as sampled from its
    ///                            ancestor, in area measure.
    /// * `throughput`           - Running throughput up to this vertex.
    /// * `depth`                - Number of edges walked so far.
    /// * `to_ancestor_jacobian` - Solid-angle-to-area factor towards the
    ///                            ancestor; zero when the ancestor is not a
    ///                            surface.
    #[allow(clippy::too_many_arguments)]
    fn on_hit(
        &mut self,
        rng: &mut Rng,
        ray: &Ray,
        hit: &SurfacePoint,
        pdf_from_ancestor: Float,
        throughput: RgbColor,
        depth: u32,
        to_ancestor_jacobian: Float,
    ) -> RgbColor;

    /// Called when the ray leaves the scene.
    ///
    /// * `rng`           - The walk's random number generator.
    /// * `ray`           - The escaping ray.
    /// * `pdf_direction` - Density of the escaping direction in solid-angle
    ///                     measure.
    /// * `throughput`    - Running throughput.
    /// * `depth`         - Number of edges walked so far.
    fn on_invalid_hit(
        &mut self,
        _rng: &mut Rng,
        _ray: &Ray,
        _pdf_direction: Float,
        _throughput: RgbColor,
        _depth: u32,
    ) -> RgbColor {
        RgbColor::BLACK
    }

    /// Called after a valid continuation sample, before the next segment is
    /// traced. The value is the density of sampling the previous vertex from
    /// the current one (area measure when the previous vertex is a surface).
    ///
    /// * `pdf_to_ancestor` - The reverse density.
    /// * `depth`           - Number of edges walked so far.
    fn on_continue(&mut self, _pdf_to_ancestor: Float, _depth: u32) {}
}

/// The walk driver.
pub struct RandomWalk<'a, H: WalkHooks> {
    /// The scene to trace against.
    pub scene: &'a Scene,

    /// Maximum number of edges.
    pub max_depth: u32,

    /// True for light subpaths; forwarded into the material so the
    /// non-reciprocal corrections apply.
    pub is_on_light_subpath: bool,

    /// The event receiver.
    pub hooks: &'a mut H,
}

impl<'a, H: WalkHooks> RandomWalk<'a, H> {
    /// Starts a walk at the camera.
    ///
    /// * `rng`    - Random number generator of this walk.
    /// * `ray`    - The primary ray.
    /// * `pdf`    - Density of the primary direction per pixel, solid-angle
    ///              measure.
    /// * `weight` - Initial throughput.
    pub fn start_from_camera(
        &mut self,
        rng: &mut Rng,
        ray: Ray,
        pdf: Float,
        weight: RgbColor,
    ) -> RgbColor {
        self.walk(rng, ray, None, WalkStart::Camera, pdf, weight)
    }

    /// Starts a walk on an emitter surface.
    ///
    /// * `rng`      - Random number generator of this walk.
    /// * `ray`      - The emitted ray.
    /// * `origin`   - The emitter point the ray leaves from.
    /// * `pdf`      - Density of the emitted direction, solid-angle measure.
    /// * `weight`   - Initial throughput.
    pub fn start_from_emitter(
        &mut self,
        rng: &mut Rng,
        ray: Ray,
        origin: SurfacePoint,
        pdf: Float,
        weight: RgbColor,
    ) -> RgbColor {
        self.walk(rng, ray, Some(origin), WalkStart::Camera, pdf, weight)
    }

    /// Starts a walk on the scene bounding sphere for background
    /// illumination.
    ///
    /// * `rng`    - Random number generator of this walk.
    /// * `ray`    - The inward ray.
    /// * `pdf`    - Area density of the ray origin on the disc perpendicular
    ///              to the direction, 1/(πR²).
    /// * `weight` - Initial throughput.
    pub fn start_from_background(
        &mut self,
        rng: &mut Rng,
        ray: Ray,
        pdf: Float,
        weight: RgbColor,
    ) -> RgbColor {
        self.walk(rng, ray, None, WalkStart::Background, pdf, weight)
    }

    fn walk(
        &mut self,
        rng: &mut Rng,
        mut ray: Ray,
        mut previous: Option<SurfacePoint>,
        start: WalkStart,
        mut pdf_direction: Float,
        mut throughput: RgbColor,
    ) -> RgbColor {
        let mut estimate = RgbColor::BLACK;
        let mut depth = 1;

        loop {
            let hit = match self.scene.trace(&ray) {
                Some(hit) => hit,
                None => {
                    estimate +=
                        self.hooks
                            .on_invalid_hit(rng, &ray, pdf_direction, throughput, depth);
                    break;
                }
            };

            // Convert the direction density into an area density at the hit.
            let (pdf_from_ancestor, to_ancestor_jacobian) = match &previous {
                Some(prev) => {
                    let jacobian_here = surface_area_to_solid_angle(prev, &hit);
                    (
                        pdf_direction * jacobian_here,
                        surface_area_to_solid_angle(&hit, prev),
                    )
                }
                None => match start {
                    WalkStart::Camera => {
                        let cosine = hit.normal.abs_dot(&ray.direction);
                        let dist_squared = hit.distance * hit.distance;
                        (pdf_direction * cosine / dist_squared, 0.0)
                    }
                    WalkStart::Background => {
                        let cosine = hit.normal.abs_dot(&ray.direction);
                        (pdf_direction * cosine, 0.0)
                    }
                },
            };

            estimate += self.hooks.on_hit(
                rng,
                &ray,
                &hit,
                pdf_from_ancestor,
                throughput,
                depth,
                to_ancestor_jacobian,
            );

            if depth + 1 > self.max_depth {
                break;
            }

            // Continue the walk by importance sampling the material.
            let out_dir = -ray.direction;
            let material = self.scene.material(hit.mesh_id);
            let sample = match material.sample(
                &hit,
                out_dir,
                self.is_on_light_subpath,
                rng.next_float_2d(),
            ) {
                Some(sample) => sample,
                None => break,
            };

            // Towards a surface ancestor the reverse density is converted to
            // area measure; the first edge of camera and background walks has
            // no surface ancestor and stays in solid-angle measure.
            let reverse_scale = if previous.is_some() {
                to_ancestor_jacobian
            } else {
                1.0
            };
            self.hooks
                .on_continue(sample.pdf_reverse * reverse_scale, depth);

            throughput *= sample.weight;
            pdf_direction = sample.pdf_forward;
            ray = hit.spawn_ray(sample.direction);
            previous = Some(hit);
            depth += 1;
        }

        estimate
    }
}
