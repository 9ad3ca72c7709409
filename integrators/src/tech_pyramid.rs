//! The technique pyramid: per-(camera length, light length) images of the
//! raw and MIS-weighted contributions, used to diagnose where variance
//! lives.

use ground_core::base::*;
use ground_core::geometry::Vector2f;
use ground_core::image::{AtomicFloat, Image};
use ground_core::spectrum::RgbColor;

/// A shared RGB raster with atomic adds.
struct AtomicImage {
    data: Vec<AtomicFloat>,
    width: usize,
    height: usize,
}

impl AtomicImage {
    fn new(width: usize, height: usize) -> Self {
        Self {
            data: (0..width * height * 3).map(|_| AtomicFloat::default()).collect(),
            width,
            height,
        }
    }

    fn add(&self, x: Float, y: Float, value: RgbColor) {
        let col = clamp(x as Int, 0, self.width as Int - 1) as usize;
        let row = clamp(y as Int, 0, self.height as Int - 1) as usize;
        let base = (row * self.width + col) * 3;
        self.data[base].add(value.r());
        self.data[base + 1].add(value.g());
        self.data[base + 2].add(value.b());
    }

    fn to_image(&self, scale: Float) -> Image {
        let pixels = (0..self.width * self.height)
            .map(|i| {
                RgbColor::new(
                    self.data[3 * i].get(),
                    self.data[3 * i + 1].get(),
                    self.data[3 * i + 2].get(),
                ) * scale
            })
            .collect();
        Image::from_pixels(pixels, self.width, self.height)
    }
}

/// The pyramid over (camera subpath length, light subpath length). The total
/// path length is the sum of both, so it is not indexed separately.
pub struct TechPyramid {
    raw: Vec<AtomicImage>,
    weighted: Vec<AtomicImage>,
    max_len: usize,
}

impl TechPyramid {
    /// Allocates images for every technique up to a path length bound.
    ///
    /// * `width`     - Image width.
    /// * `height`    - Image height.
    /// * `max_depth` - Maximum path length in edges.
    pub fn new(width: usize, height: usize, max_depth: u32) -> Self {
        let max_len = max_depth as usize + 1;
        let count = (max_len + 1) * (max_len + 1);
        Self {
            raw: (0..count).map(|_| AtomicImage::new(width, height)).collect(),
            weighted: (0..count).map(|_| AtomicImage::new(width, height)).collect(),
            max_len,
        }
    }

    fn index(&self, camera_len: usize, light_len: usize) -> usize {
        let camera_len = camera_len.min(self.max_len);
        let light_len = light_len.min(self.max_len);
        camera_len * (self.max_len + 1) + light_len
    }

    /// Records one contribution.
    ///
    /// * `camera_len` - Number of camera subpath vertices.
    /// * `light_len`  - Number of light subpath vertices.
    /// * `pixel`      - Image position.
    /// * `raw`        - Un-weighted contribution.
    /// * `weighted`   - MIS-weighted contribution.
    pub fn add(
        &self,
        camera_len: usize,
        light_len: usize,
        pixel: Vector2f,
        raw: RgbColor,
        weighted: RgbColor,
    ) {
        let index = self.index(camera_len, light_len);
        self.raw[index].add(pixel.x, pixel.y, raw.zero_if_non_finite());
        self.weighted[index].add(pixel.x, pixel.y, weighted.zero_if_non_finite());
    }

    /// The raw image of one technique, divided by the iteration count.
    pub fn raw_image(&self, camera_len: usize, light_len: usize, iterations: u32) -> Image {
        self.raw[self.index(camera_len, light_len)].to_image(1.0 / iterations as Float)
    }

    /// The weighted image of one technique, divided by the iteration count.
    pub fn weighted_image(&self, camera_len: usize, light_len: usize, iterations: u32) -> Image {
        self.weighted[self.index(camera_len, light_len)].to_image(1.0 / iterations as Float)
    }

    /// Sum of all weighted technique images; matches the frame buffer.
    ///
    /// * `iterations` - Number of completed iterations.
    pub fn sum_weighted(&self, iterations: u32) -> Image {
        let (width, height) = (self.weighted[0].width, self.weighted[0].height);
        let mut sum = Image::new(width, height);
        for image in self.weighted.iter() {
            let img = image.to_image(1.0 / iterations as Float);
            for (acc, value) in sum.pixels.iter_mut().zip(img.pixels.iter()) {
                *acc += *value;
            }
        }
        sum
    }
}
