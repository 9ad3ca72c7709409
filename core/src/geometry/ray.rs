//! Rays

#![allow(dead_code)]

use super::Vector3f;
use crate::base::*;

/// A ray with an origin, a direction and a minimum travel distance used to
/// step over the surface the ray was spawned from.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Ray {
    /// Origin.
    pub origin: Vector3f,

    /// Direction. Not required to be unit length for intersection queries,
    /// but expected to be unit length by all shading code.
    pub direction: Vector3f,

    /// Minimum travel distance. Strictly positive for rays spawned from a
    /// surface.
    pub min_distance: Float,
}

impl Ray {
    /// Creates a new ray.
    ///
    /// * `origin`       - Origin.
    /// * `direction`    - Direction.
    /// * `min_distance` - Minimum travel distance.
    pub fn new(origin: Vector3f, direction: Vector3f, min_distance: Float) -> Self {
        Self {
            origin,
            direction,
            min_distance,
        }
    }

    /// Get position along the ray at given parameter.
    ///
    /// * `t` - Parameter to evaluate.
    pub fn at(&self, t: Float) -> Vector3f {
        self.origin + self.direction * t
    }
}
