//! Image storage and file I/O.

#![allow(dead_code)]

mod frame_buffer;
mod preview;

// Re-export
pub use frame_buffer::*;
pub use preview::*;

use crate::base::*;
use crate::spectrum::RgbColor;
use exr::prelude as exrs;
use exr::prelude::*;
use log::info;
use std::result::Result;
use thiserror::Error;

/// Errors raised by image loading and saving.
#[derive(Error, Debug)]
pub enum ImageError {
    #[error("can't determine the file type from the suffix of '{0}'")]
    UnknownExtension(String),

    #[error("failed to read image '{path}': {reason}")]
    Read { path: String, reason: String },

    #[error("failed to write image '{path}': {reason}")]
    Write { path: String, reason: String },
}

/// A simple RGB raster of `Float` pixels in row-major layout.
pub struct Image {
    /// The pixels.
    pub pixels: Vec<RgbColor>,

    /// Width in pixels.
    pub width: usize,

    /// Height in pixels.
    pub height: usize,
}

impl Image {
    /// Creates a black image.
    ///
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            pixels: vec![RgbColor::BLACK; width * height],
            width,
            height,
        }
    }

    /// Creates an image from existing pixel data.
    ///
    /// * `pixels` - Row-major pixels; must match the resolution.
    /// * `width`  - Width in pixels.
    /// * `height` - Height in pixels.
    pub fn from_pixels(pixels: Vec<RgbColor>, width: usize, height: usize) -> Self {
        assert_eq!(pixels.len(), width * height);
        Self {
            pixels,
            width,
            height,
        }
    }

    /// Pixel accessor.
    pub fn pixel(&self, col: usize, row: usize) -> RgbColor {
        self.pixels[row * self.width + col]
    }

    /// Mutable pixel accessor.
    pub fn pixel_mut(&mut self, col: usize, row: usize) -> &mut RgbColor {
        &mut self.pixels[row * self.width + col]
    }

    /// Bilinear lookup with texture coordinates in [0, 1]², wrapping.
    ///
    /// * `u` - Horizontal coordinate.
    /// * `v` - Vertical coordinate.
    pub fn bilinear(&self, u: Float, v: Float) -> RgbColor {
        let x = (u - u.floor()) * self.width as Float - 0.5;
        let y = (v - v.floor()) * self.height as Float - 0.5;
        let x0 = x.floor() as Int;
        let y0 = y.floor() as Int;
        let fx = x - x0 as Float;
        let fy = y - y0 as Float;

        let wrap = |i: Int, n: usize| -> usize {
            (((i % n as Int) + n as Int) % n as Int) as usize
        };
        let fetch = |xi: Int, yi: Int| -> RgbColor {
            self.pixels[wrap(yi, self.height) * self.width + wrap(xi, self.width)]
        };

        fetch(x0, y0) * (1.0 - fx) * (1.0 - fy)
            + fetch(x0 + 1, y0) * fx * (1.0 - fy)
            + fetch(x0, y0 + 1) * (1.0 - fx) * fy
            + fetch(x0 + 1, y0 + 1) * fx * fy
    }

    /// Reads an image file; EXR for HDR content, anything the `image` crate
    /// decodes for LDR content.
    ///
    /// * `path` - Input file path.
    pub fn read(path: &str) -> Result<Image, ImageError> {
        match extension(path) {
            Some("exr") => read_exr(path),
            Some(_) => read_ldr(path),
            None => Err(ImageError::UnknownExtension(path.to_string())),
        }
    }

    /// Writes the image; EXR stays linear, LDR formats are gamma corrected
    /// with 2.2.
    ///
    /// * `path` - Output file path.
    pub fn write(&self, path: &str) -> Result<(), ImageError> {
        match extension(path) {
            Some("exr") => write_exr(path, self),
            Some(_) => write_ldr(path, self),
            None => Err(ImageError::UnknownExtension(path.to_string())),
        }
    }
}

/// Lower-case file extension of a path.
fn extension(path: &str) -> Option<&str> {
    std::path::Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
}

/// Read a single layer OpenEXR file.
///
/// * `path` - Input file path.
fn read_exr(path: &str) -> Result<Image, ImageError> {
    let reader = exrs::read()
        .no_deep_data()
        .largest_resolution_level()
        .rgba_channels(
            |resolution, _channels| {
                Image::new(resolution.width(), resolution.height())
            },
            |img, position, (r, g, b, _a): (f32, f32, f32, f32)| {
                *img.pixel_mut(position.x(), position.y()) = RgbColor::new(r, g, b);
            },
        )
        .first_valid_layer()
        .all_attributes();

    match reader.from_file(path) {
        Ok(image) => {
            let img = image.layer_data.channel_data.pixels;
            info!("Read EXR image {path} ({} x {})", img.width, img.height);
            Ok(img)
        }
        Err(err) => Err(ImageError::Read {
            path: path.to_string(),
            reason: err.to_string(),
        }),
    }
}

/// Write a single layer OpenEXR file.
///
/// * `path` - Output file path.
/// * `img`  - The image.
fn write_exr(path: &str, img: &Image) -> Result<(), ImageError> {
    exrs::write_rgb_file(path, img.width, img.height, |x, y| {
        let p = img.pixel(x, y);
        (p.r(), p.g(), p.b())
    })
    .map_err(|err| ImageError::Write {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

/// Read an 8-bit image and linearize it.
///
/// * `path` - Input file path.
fn read_ldr(path: &str) -> Result<Image, ImageError> {
    let decoded = image::open(path)
        .map_err(|err| ImageError::Read {
            path: path.to_string(),
            reason: err.to_string(),
        })?
        .into_rgb8();
    let (width, height) = decoded.dimensions();

    let mut img = Image::new(width as usize, height as usize);
    for (x, y, pixel) in decoded.enumerate_pixels() {
        let linear = |v: u8| (v as Float / 255.0).powf(2.2);
        *img.pixel_mut(x as usize, y as usize) =
            RgbColor::new(linear(pixel[0]), linear(pixel[1]), linear(pixel[2]));
    }
    Ok(img)
}

/// Write an 8-bit image, gamma corrected with 2.2.
///
/// * `path` - Output file path.
/// * `img`  - The image.
fn write_ldr(path: &str, img: &Image) -> Result<(), ImageError> {
    let out = image::RgbImage::from_fn(img.width as u32, img.height as u32, |x, y| {
        let p = img.pixel(x as usize, y as usize);
        let to_byte =
            |v: Float| (clamp(gamma_correct(v), 0.0, 1.0) * 255.0 + 0.5) as u8;
        image::Rgb([to_byte(p.r()), to_byte(p.g()), to_byte(p.b())])
    });
    out.save(path).map_err(|err| ImageError::Write {
        path: path.to_string(),
        reason: err.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bilinear_constant_image() {
        let mut img = Image::new(4, 4);
        for p in img.pixels.iter_mut() {
            *p = RgbColor::gray(0.25);
        }
        let v = img.bilinear(0.37, 0.83);
        assert!((v.r() - 0.25).abs() < 1e-5);
    }

    #[test]
    fn unknown_extension_is_an_error() {
        assert!(matches!(
            Image::read("foo.unknown_ext_xyz"),
            Err(ImageError::Read { .. })
        ) || matches!(
            Image::read("foo"),
            Err(ImageError::UnknownExtension(_))
        ));
    }
}
