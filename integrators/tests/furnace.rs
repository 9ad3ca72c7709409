//! White furnace tests: energy conservation and the partition of the
//! balance weights, measured end to end.

mod common;

use common::white_furnace;
use ground_core::image::FrameBuffer;
use ground_integrators::{PathTracer, VertexCacheBidir};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Mean luminance over the central third of the image, which lies well
/// inside the sphere silhouette for the furnace camera.
fn sphere_mean(image: &ground_core::image::Image) -> f32 {
    let mut sum = 0.0;
    let mut count = 0;
    let (w, h) = (image.width, image.height);
    for row in h / 3..2 * h / 3 {
        for col in w / 3..2 * w / 3 {
            sum += image.pixel(col, row).luminance();
            count += 1;
        }
    }
    sum / count as f32
}

#[test]
fn path_tracer_passes_the_furnace() {
    init_logging();
    let scene = white_furnace(64, 64);
    let mut frame_buffer = FrameBuffer::new(64, 64);

    let path_tracer = PathTracer {
        num_iterations: 32,
        max_depth: 5,
        ..Default::default()
    };
    path_tracer.render(&scene, &mut frame_buffer).unwrap();

    let mean = sphere_mean(&frame_buffer.average_image());
    assert!(
        (mean - 0.5).abs() <= 0.015,
        "furnace sphere reads {} instead of 0.5",
        mean
    );
}

#[test]
fn reduced_bidir_matches_the_path_tracer() {
    init_logging();
    let scene = white_furnace(64, 64);

    // With connections and the light tracer off, the estimator reduces to a
    // MIS-weighted path tracer with next-event estimation.
    let mut bidir_buffer = FrameBuffer::new(64, 64);
    let mut bidir = VertexCacheBidir {
        num_iterations: 32,
        max_depth: 5,
        num_connections: 0,
        num_shadow_rays: 1,
        enable_connections: false,
        enable_light_tracer: false,
        ..Default::default()
    };
    bidir.render(&scene, &mut bidir_buffer).unwrap();

    let mut path_buffer = FrameBuffer::new(64, 64);
    let path_tracer = PathTracer {
        num_iterations: 32,
        max_depth: 5,
        ..Default::default()
    };
    path_tracer.render(&scene, &mut path_buffer).unwrap();

    let bidir_mean = sphere_mean(&bidir_buffer.average_image());
    let path_mean = sphere_mean(&path_buffer.average_image());

    assert!(
        (bidir_mean - 0.5).abs() <= 0.015,
        "reduced bidirectional estimator reads {}",
        bidir_mean
    );
    assert!(
        (bidir_mean - path_mean).abs() <= 0.01,
        "reduced bidirectional {} deviates from path tracer {}",
        bidir_mean,
        path_mean
    );
}

#[test]
fn full_bidir_passes_the_furnace() {
    init_logging();
    let scene = white_furnace(64, 64);
    let mut frame_buffer = FrameBuffer::new(64, 64);

    // All four techniques enabled; any broken balance weight shows up as a
    // brightness error on the sphere.
    let mut integrator = VertexCacheBidir {
        num_iterations: 32,
        max_depth: 5,
        num_connections: 2,
        num_shadow_rays: 1,
        ..Default::default()
    };
    integrator.render(&scene, &mut frame_buffer).unwrap();

    let mean = sphere_mean(&frame_buffer.average_image());
    assert!(
        (mean - 0.5).abs() <= 0.03,
        "full bidirectional furnace reads {} instead of 0.5",
        mean
    );
}
