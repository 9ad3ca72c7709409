//! Minimal texture types for the material parameters.

#![allow(dead_code)]

use crate::base::*;
use crate::geometry::Vector2f;
use crate::image::Image;
use crate::spectrum::RgbColor;
use std::sync::Arc;

/// An RGB texture: either a constant color or a bilinearly filtered image.
#[derive(Clone)]
pub enum RgbTexture {
    /// The same color everywhere.
    Constant(RgbColor),

    /// Bilinear lookup into a shared image.
    Image(Arc<Image>),
}

impl RgbTexture {
    /// Creates a constant texture.
    ///
    /// * `color` - The color.
    pub fn constant(color: RgbColor) -> Self {
        Self::Constant(color)
    }

    /// Evaluates the texture at a surface coordinate.
    ///
    /// * `uv` - Texture coordinates.
    pub fn evaluate(&self, uv: Vector2f) -> RgbColor {
        match self {
            Self::Constant(color) => *color,
            Self::Image(image) => image.bilinear(uv.x, uv.y),
        }
    }
}

/// A scalar texture: a constant or the first channel of an image.
#[derive(Clone)]
pub enum ScalarTexture {
    /// The same value everywhere.
    Constant(Float),

    /// Bilinear lookup into the red channel of a shared image.
    Image(Arc<Image>),
}

impl ScalarTexture {
    /// Creates a constant texture.
    ///
    /// * `value` - The value.
    pub fn constant(value: Float) -> Self {
        Self::Constant(value)
    }

    /// Evaluates the texture at a surface coordinate.
    ///
    /// * `uv` - Texture coordinates.
    pub fn evaluate(&self, uv: Vector2f) -> Float {
        match self {
            Self::Constant(value) => *value,
            Self::Image(image) => image.bilinear(uv.x, uv.y).r(),
        }
    }
}
