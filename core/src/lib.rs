//! Core data structures and sampling machinery of the renderer: geometry,
//! random numbers, sampling warps, the shading model, emitters, backgrounds,
//! cameras, the scene container and the frame buffer.

pub mod background;
pub mod base;
pub mod camera;
pub mod emitter;
pub mod geometry;
pub mod image;
pub mod rng;
pub mod sampling;
pub mod scene;
pub mod shading;
pub mod spectrum;
pub mod texture;
