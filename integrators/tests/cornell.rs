//! End-to-end scenarios in the Cornell-style test box.

mod common;

use common::{cornell_box, patch_statistics};
use ground_core::geometry::{Vector2f, Vector3f};
use ground_core::image::FrameBuffer;
use ground_integrators::{PathTracer, VertexCacheBidir};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Film position of the floor point directly below the light.
fn floor_patch_center(scene: &ground_core::scene::Scene) -> Vector2f {
    scene
        .camera
        .world_to_film(Vector3f::new(0.0, 0.0, 1.0))
        .expect("floor center is visible")
}

#[test]
fn direct_illumination_matches_analytic_band() {
    init_logging();
    let scene = cornell_box(128, 128);
    let mut frame_buffer = FrameBuffer::new(128, 128);

    // Next-event only: a MIS-weighted direct illumination render.
    let mut integrator = VertexCacheBidir {
        num_iterations: 16,
        max_depth: 2,
        num_shadow_rays: 1,
        num_connections: 0,
        enable_connections: false,
        enable_light_tracer: false,
        ..Default::default()
    };
    integrator.render(&scene, &mut frame_buffer).unwrap();

    let image = frame_buffer.average_image();
    let (mean, rel_std) = patch_statistics(&image, floor_patch_center(&scene), 4);

    // The 0.5 x 0.5 emitter of radiance 20 sits 2 units above the floor
    // center: the direct radiance there is close to
    // (0.5/pi) * 20 * 0.25 / 4 = 0.199.
    assert!(
        (0.18..=0.22).contains(&mean),
        "floor patch mean luminance {} outside the direct illumination band",
        mean
    );
    assert!(
        rel_std <= 0.04,
        "floor patch relative standard deviation too high: {}",
        rel_std
    );
}

#[test]
fn connections_alone_carry_indirect_light() {
    init_logging();
    let scene = cornell_box(64, 64);
    let mut frame_buffer = FrameBuffer::new(64, 64);

    // Everything but bidirectional connections disabled; the image must
    // still receive energy, demonstrating cache connections on their own.
    let mut integrator = VertexCacheBidir {
        num_iterations: 8,
        max_depth: 4,
        num_connections: 5,
        num_shadow_rays: 0,
        enable_hitting: false,
        enable_connections: true,
        enable_light_tracer: false,
        ..Default::default()
    };
    integrator.render(&scene, &mut frame_buffer).unwrap();

    let image = frame_buffer.average_image();
    let (mean, _) = patch_statistics(&image, floor_patch_center(&scene), 8);
    assert!(
        mean > 0.01,
        "connections-only render produced almost no energy: {}",
        mean
    );
    assert!(image.pixels.iter().all(|p| !p.has_non_finite()));
}

#[test]
fn light_tracer_alone_renders_the_box() {
    init_logging();
    let scene = cornell_box(64, 64);

    // Reference: hitting + next event.
    let mut reference_buffer = FrameBuffer::new(64, 64);
    let mut reference = VertexCacheBidir {
        num_iterations: 12,
        max_depth: 3,
        num_connections: 0,
        num_shadow_rays: 1,
        enable_connections: false,
        enable_light_tracer: false,
        ..Default::default()
    };
    reference.render(&scene, &mut reference_buffer).unwrap();

    // Light tracer only: no hitting, no connections, no shadow rays.
    let mut light_tracer_buffer = FrameBuffer::new(64, 64);
    let mut light_tracer = VertexCacheBidir {
        num_iterations: 12,
        max_depth: 3,
        num_connections: 0,
        num_shadow_rays: 0,
        enable_hitting: false,
        enable_connections: false,
        enable_light_tracer: true,
        ..Default::default()
    };
    light_tracer.render(&scene, &mut light_tracer_buffer).unwrap();

    let center = floor_patch_center(&scene);
    let (reference_mean, _) =
        patch_statistics(&reference_buffer.average_image(), center, 6);
    let (light_tracer_mean, _) =
        patch_statistics(&light_tracer_buffer.average_image(), center, 6);

    assert!(
        light_tracer_mean > 0.5 * reference_mean && light_tracer_mean < 2.0 * reference_mean,
        "light tracer estimate {} too far from the camera-side estimate {}",
        light_tracer_mean,
        reference_mean
    );
}

#[test]
fn full_estimator_agrees_with_the_path_tracer() {
    init_logging();
    let scene = cornell_box(64, 64);

    let mut bidir_buffer = FrameBuffer::new(64, 64);
    let mut bidir = VertexCacheBidir {
        num_iterations: 12,
        max_depth: 4,
        num_connections: 2,
        num_shadow_rays: 1,
        ..Default::default()
    };
    bidir.render(&scene, &mut bidir_buffer).unwrap();

    let mut path_buffer = FrameBuffer::new(64, 64);
    let path_tracer = PathTracer {
        num_iterations: 24,
        max_depth: 4,
        ..Default::default()
    };
    path_tracer.render(&scene, &mut path_buffer).unwrap();

    let center = floor_patch_center(&scene);
    let (bidir_mean, _) = patch_statistics(&bidir_buffer.average_image(), center, 6);
    let (path_mean, _) = patch_statistics(&path_buffer.average_image(), center, 6);

    let ratio = bidir_mean / path_mean;
    assert!(
        (0.85..=1.15).contains(&ratio),
        "bidirectional estimate {} disagrees with path tracer {}",
        bidir_mean,
        path_mean
    );
}

#[test]
fn technique_pyramid_sums_to_frame_buffer() {
    init_logging();
    let scene = cornell_box(48, 48);
    let mut frame_buffer = FrameBuffer::new(48, 48);

    let mut integrator = VertexCacheBidir {
        num_iterations: 4,
        max_depth: 3,
        num_connections: 1,
        num_shadow_rays: 1,
        render_technique_pyramid: true,
        ..Default::default()
    };
    integrator.render(&scene, &mut frame_buffer).unwrap();

    let pyramid = integrator
        .technique_pyramid
        .as_ref()
        .expect("pyramid was requested");
    let sum = pyramid.sum_weighted(frame_buffer.num_iterations());
    let average = frame_buffer.average_image();

    for (expected, actual) in average.pixels.iter().zip(sum.pixels.iter()) {
        assert!(
            (expected.luminance() - actual.luminance()).abs() <= 1e-3,
            "pyramid sum {} deviates from frame buffer {}",
            actual.luminance(),
            expected.luminance()
        );
    }
}

#[test]
fn deterministic_splats_are_bitwise_reproducible() {
    init_logging();
    let scene = cornell_box(48, 48);

    let render_once = || {
        let mut frame_buffer = FrameBuffer::new(48, 48);
        let mut integrator = VertexCacheBidir {
            num_iterations: 3,
            max_depth: 3,
            num_connections: 1,
            num_shadow_rays: 1,
            deterministic_splats: true,
            ..Default::default()
        };
        integrator.render(&scene, &mut frame_buffer).unwrap();
        frame_buffer.average_image()
    };

    let first = render_once();
    let second = render_once();
    for (a, b) in first.pixels.iter().zip(second.pixels.iter()) {
        assert_eq!(a.c[0].to_bits(), b.c[0].to_bits());
        assert_eq!(a.c[1].to_bits(), b.c[1].to_bits());
        assert_eq!(a.c[2].to_bits(), b.c[2].to_bits());
    }
}
