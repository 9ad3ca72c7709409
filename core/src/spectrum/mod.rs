//! Tristimulus RGB color values.

#![allow(dead_code)]

use crate::base::*;
use std::fmt;
use std::ops::{Add, AddAssign, Div, DivAssign, Index, Mul, MulAssign, Neg, Sub, SubAssign};

/// A linear RGB color / radiance value. The whole engine is tristimulus;
/// there is no spectral representation.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct RgbColor {
    /// The channel values.
    pub c: [Float; 3],
}

impl RgbColor {
    /// Black.
    pub const BLACK: Self = Self { c: [0.0; 3] };

    /// White.
    pub const WHITE: Self = Self { c: [1.0; 3] };

    /// Creates a color from individual channel values.
    ///
    /// * `r` - Red.
    /// * `g` - Green.
    /// * `b` - Blue.
    pub fn new(r: Float, g: Float, b: Float) -> Self {
        Self { c: [r, g, b] }
    }

    /// Creates a gray color with all channels set to the same value.
    ///
    /// * `v` - The channel value.
    pub fn gray(v: Float) -> Self {
        Self { c: [v; 3] }
    }

    /// Red channel.
    pub fn r(&self) -> Float {
        self.c[0]
    }

    /// Green channel.
    pub fn g(&self) -> Float {
        self.c[1]
    }

    /// Blue channel.
    pub fn b(&self) -> Float {
        self.c[2]
    }

    /// Returns true if all channels are zero.
    pub fn is_black(&self) -> bool {
        self.c.iter().all(|&v| v == 0.0)
    }

    /// Returns true if any channel is NaN or infinite.
    pub fn has_non_finite(&self) -> bool {
        self.c.iter().any(|v| !v.is_finite())
    }

    /// Luminance with Rec. 709 weights.
    pub fn luminance(&self) -> Float {
        0.212671 * self.c[0] + 0.715160 * self.c[1] + 0.072169 * self.c[2]
    }

    /// Arithmetic mean of the channels.
    pub fn average(&self) -> Float {
        (self.c[0] + self.c[1] + self.c[2]) / 3.0
    }

    /// Largest channel value.
    pub fn max_channel(&self) -> Float {
        max(self.c[0], max(self.c[1], self.c[2]))
    }

    /// Component-wise square root.
    pub fn sqrt(&self) -> Self {
        Self::new(self.c[0].sqrt(), self.c[1].sqrt(), self.c[2].sqrt())
    }

    /// Component-wise linear interpolation towards another color.
    ///
    /// * `t`     - Parameter in [0, 1].
    /// * `other` - Color at t=1.
    pub fn lerp(&self, t: Float, other: Self) -> Self {
        *self * (1.0 - t) + other * t
    }

    /// Replaces non-finite channel values with zero.
    pub fn zero_if_non_finite(self) -> Self {
        if self.has_non_finite() {
            Self::BLACK
        } else {
            self
        }
    }
}

impl Add for RgbColor {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self::new(
            self.c[0] + other.c[0],
            self.c[1] + other.c[1],
            self.c[2] + other.c[2],
        )
    }
}

impl AddAssign for RgbColor {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl Sub for RgbColor {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self::new(
            self.c[0] - other.c[0],
            self.c[1] - other.c[1],
            self.c[2] - other.c[2],
        )
    }
}

impl SubAssign for RgbColor {
    fn sub_assign(&mut self, other: Self) {
        *self = *self - other;
    }
}

impl Mul for RgbColor {
    type Output = Self;

    fn mul(self, other: Self) -> Self {
        Self::new(
            self.c[0] * other.c[0],
            self.c[1] * other.c[1],
            self.c[2] * other.c[2],
        )
    }
}

impl MulAssign for RgbColor {
    fn mul_assign(&mut self, other: Self) {
        *self = *self * other;
    }
}

impl Mul<Float> for RgbColor {
    type Output = Self;

    fn mul(self, s: Float) -> Self {
        Self::new(self.c[0] * s, self.c[1] * s, self.c[2] * s)
    }
}

impl Mul<RgbColor> for Float {
    type Output = RgbColor;

    fn mul(self, color: RgbColor) -> RgbColor {
        color * self
    }
}

impl MulAssign<Float> for RgbColor {
    fn mul_assign(&mut self, s: Float) {
        *self = *self * s;
    }
}

impl Div<Float> for RgbColor {
    type Output = Self;

    fn div(self, s: Float) -> Self {
        debug_assert!(s != 0.0);
        Self::new(self.c[0] / s, self.c[1] / s, self.c[2] / s)
    }
}

impl DivAssign<Float> for RgbColor {
    fn div_assign(&mut self, s: Float) {
        *self = *self / s;
    }
}

impl Div<RgbColor> for Float {
    type Output = RgbColor;

    fn div(self, color: RgbColor) -> RgbColor {
        RgbColor::new(self / color.c[0], self / color.c[1], self / color.c[2])
    }
}

impl Neg for RgbColor {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.c[0], -self.c[1], -self.c[2])
    }
}

impl Index<usize> for RgbColor {
    type Output = Float;

    fn index(&self, i: usize) -> &Self::Output {
        &self.c[i]
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}, {}]", self.c[0], self.c[1], self.c[2])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn luminance_of_white_is_one() {
        assert!((RgbColor::WHITE.luminance() - 1.0).abs() < 1e-4);
    }

    #[test]
    fn black_detection() {
        assert!(RgbColor::BLACK.is_black());
        assert!(!RgbColor::new(0.0, 1e-6, 0.0).is_black());
    }

    #[test]
    fn non_finite_is_cleared() {
        let c = RgbColor::new(1.0, Float::NAN, 0.0).zero_if_non_finite();
        assert!(c.is_black());
    }
}
