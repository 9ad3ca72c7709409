//! Shared scene builders and image statistics for the end-to-end tests.

#![allow(dead_code)]

use ground_core::background::UniformBackground;
use ground_core::base::*;
use ground_core::camera::PerspectiveCamera;
use ground_core::geometry::{Mesh, Vector2f, Vector3f};
use ground_core::image::Image;
use ground_core::scene::Scene;
use ground_core::shading::{GenericMaterial, MaterialParameters};
use ground_core::spectrum::RgbColor;
use ground_core::texture::{RgbTexture, ScalarTexture};

/// A quad from four corners, wound so the geometric normal follows the
/// right-hand rule of (p1 - p0) × (p3 - p0).
pub fn quad(p0: Vector3f, p1: Vector3f, p2: Vector3f, p3: Vector3f) -> Mesh {
    Mesh::new(vec![p0, p1, p2, p3], vec![[0, 1, 2], [0, 2, 3]], None, None)
}

/// A smooth UV sphere with interpolated shading normals.
pub fn uv_sphere(center: Vector3f, radius: Float, stacks: usize, segments: usize) -> Mesh {
    let mut vertices = Vec::new();
    let mut normals = Vec::new();
    for stack in 0..=stacks {
        let theta = PI * stack as Float / stacks as Float;
        for segment in 0..=segments {
            let phi = TWO_PI * segment as Float / segments as Float;
            let normal = Vector3f::new(
                theta.sin() * phi.cos(),
                theta.cos(),
                theta.sin() * phi.sin(),
            );
            vertices.push(center + normal * radius);
            normals.push(normal);
        }
    }

    let ring = segments + 1;
    let mut indices = Vec::new();
    for stack in 0..stacks {
        for segment in 0..segments {
            let a = stack * ring + segment;
            let b = a + ring;
            indices.push([a, a + 1, b]);
            indices.push([a + 1, b + 1, b]);
        }
    }
    Mesh::new(vertices, indices, Some(normals), None)
}

/// A matte material with the given reflectance.
pub fn matte(reflectance: RgbColor) -> GenericMaterial {
    GenericMaterial::new(MaterialParameters {
        base_color: RgbTexture::constant(reflectance),
        roughness: ScalarTexture::constant(1.0),
        ..Default::default()
    })
}

/// The Cornell-style test box: walls around [-1,1] x [0,2] x [0,2], a
/// 0.5 x 0.5 area light just below the ceiling above the floor center, and
/// the camera in the open front face. Direct illumination at the floor
/// point below the light evaluates to roughly 0.2 for the default emitter
/// radiance of 20.
pub fn cornell_box(width: usize, height: usize) -> Scene {
    let camera = PerspectiveCamera::new(
        Vector3f::new(0.0, 1.0, -1.8),
        Vector3f::new(0.0, 1.0, 1.0),
        Vector3f::new(0.0, 1.0, 0.0),
        60.0,
        width,
        height,
    );
    let mut scene = Scene::new(Box::new(camera));

    let white = scene.add_material(matte(RgbColor::gray(0.5)));
    let red = scene.add_material(matte(RgbColor::new(0.6, 0.1, 0.1)));
    let green = scene.add_material(matte(RgbColor::new(0.1, 0.6, 0.1)));

    // Floor (normal up).
    scene.add_mesh(
        quad(
            Vector3f::new(-1.0, 0.0, 0.0),
            Vector3f::new(-1.0, 0.0, 2.0),
            Vector3f::new(1.0, 0.0, 2.0),
            Vector3f::new(1.0, 0.0, 0.0),
        ),
        white,
    );
    // Ceiling (normal down).
    scene.add_mesh(
        quad(
            Vector3f::new(-1.0, 2.0, 0.0),
            Vector3f::new(1.0, 2.0, 0.0),
            Vector3f::new(1.0, 2.0, 2.0),
            Vector3f::new(-1.0, 2.0, 2.0),
        ),
        white,
    );
    // Back wall (normal towards the camera).
    scene.add_mesh(
        quad(
            Vector3f::new(-1.0, 0.0, 2.0),
            Vector3f::new(-1.0, 2.0, 2.0),
            Vector3f::new(1.0, 2.0, 2.0),
            Vector3f::new(1.0, 0.0, 2.0),
        ),
        white,
    );
    // Left wall (normal towards +x).
    scene.add_mesh(
        quad(
            Vector3f::new(-1.0, 0.0, 0.0),
            Vector3f::new(-1.0, 2.0, 0.0),
            Vector3f::new(-1.0, 2.0, 2.0),
            Vector3f::new(-1.0, 0.0, 2.0),
        ),
        red,
    );
    // Right wall (normal towards -x).
    scene.add_mesh(
        quad(
            Vector3f::new(1.0, 0.0, 0.0),
            Vector3f::new(1.0, 0.0, 2.0),
            Vector3f::new(1.0, 2.0, 2.0),
            Vector3f::new(1.0, 2.0, 0.0),
        ),
        green,
    );

    // Area light just below the ceiling, facing down.
    let black = scene.add_material(matte(RgbColor::gray(0.0)));
    let light = scene.add_mesh(
        quad(
            Vector3f::new(-0.25, 1.99, 0.75),
            Vector3f::new(0.25, 1.99, 0.75),
            Vector3f::new(0.25, 1.99, 1.25),
            Vector3f::new(-0.25, 1.99, 1.25),
        ),
        black,
    );
    scene.add_emitter(light, RgbColor::gray(20.0));

    scene.prepare().expect("cornell box is structurally valid");
    scene
}

/// The white furnace: a diffuse sphere of reflectance 0.5 inside a
/// unit-radiance environment, no area emitters. Every pixel covering the
/// sphere must converge to 0.5.
pub fn white_furnace(width: usize, height: usize) -> Scene {
    let camera = PerspectiveCamera::new(
        Vector3f::new(0.0, 0.0, -3.0),
        Vector3f::zero(),
        Vector3f::new(0.0, 1.0, 0.0),
        45.0,
        width,
        height,
    );
    let mut scene = Scene::new(Box::new(camera));

    let gray = scene.add_material(matte(RgbColor::gray(0.5)));
    scene.add_mesh(uv_sphere(Vector3f::zero(), 1.0, 16, 32), gray);
    scene.set_background(Box::new(UniformBackground::new(RgbColor::WHITE)));

    scene.prepare().expect("furnace scene is structurally valid");
    scene
}

/// Mean and relative standard deviation of the pixel luminance inside a
/// square patch.
pub fn patch_statistics(image: &Image, center: Vector2f, half_size: usize) -> (Float, Float) {
    let cx = center.x as usize;
    let cy = center.y as usize;
    let mut values = Vec::new();
    for row in cy.saturating_sub(half_size)..(cy + half_size).min(image.height) {
        for col in cx.saturating_sub(half_size)..(cx + half_size).min(image.width) {
            values.push(image.pixel(col, row).luminance());
        }
    }
    assert!(!values.is_empty());

    let mean: Float = values.iter().sum::<Float>() / values.len() as Float;
    let variance: Float = values
        .iter()
        .map(|v| (v - mean) * (v - mean))
        .sum::<Float>()
        / values.len() as Float;
    (mean, variance.sqrt() / mean.max(1e-8))
}

/// Mean luminance over all pixels whose luminance exceeds a threshold.
pub fn mean_luminance_above(image: &Image, threshold: Float) -> (Float, usize) {
    let mut sum = 0.0;
    let mut count = 0;
    for pixel in image.pixels.iter() {
        let luminance = pixel.luminance();
        if luminance > threshold {
            sum += luminance;
            count += 1;
        }
    }
    (if count > 0 { sum / count as Float } else { 0.0 }, count)
}
