#![warn(missing_docs)]

//! Math types for the radial-edge kernel.
//!
//! Thin wrappers around nalgebra providing the point, vector and
//! direction types used throughout the kernel, the [`Tolerance`] that
//! every geometric comparison is made against, an axis-aligned
//! [`Aabb3`] that pads degenerate axes, and the distance primitives in
//! [`dist`] that report *where* a point or ray meets a segment.

use nalgebra::{Unit, Vector3};
use serde::{Deserialize, Serialize};

pub mod bbox;
pub mod dist;

pub use bbox::Aabb3;
pub use dist::{dist_line_point, dist_point_segment, ray_segment, PointSegment, RaySegment};

/// A point in 3D space.
pub type Point3 = nalgebra::Point3<f64>;

/// A vector in 3D space.
pub type Vec3 = Vector3<f64>;

/// A unit (normalized) direction vector in 3D space.
pub type Dir3 = Unit<Vector3<f64>>;

/// Tolerances for geometric comparisons.
///
/// `linear` is a distance: two points closer than this are the same point.
/// `perp` is a cosine: two directions whose dot product has magnitude
/// below it are perpendicular, and above `1 - perp` they are parallel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Tolerance {
    /// Linear distance tolerance.
    pub linear: f64,
    /// Perpendicularity tolerance, as a cosine.
    pub perp: f64,
}

impl Tolerance {
    /// Default tolerances (1e-6 linear, 1e-6 cosine).
    pub const DEFAULT: Self = Self {
        linear: 1e-6,
        perp: 1e-6,
    };

    /// Build a tolerance from a distance and a perpendicularity cosine.
    pub fn new(linear: f64, perp: f64) -> Self {
        Self { linear, perp }
    }

    /// Squared linear tolerance.
    #[inline]
    pub fn linear_sq(&self) -> f64 {
        self.linear * self.linear
    }

    /// Parallelism threshold (`1 - perp`).
    #[inline]
    pub fn para(&self) -> f64 {
        1.0 - self.perp
    }

    /// Check if two points are coincident within tolerance.
    pub fn points_equal(&self, a: &Point3, b: &Point3) -> bool {
        (a - b).norm_squared() < self.linear_sq()
    }

    /// Check if a scalar distance is effectively zero.
    pub fn is_zero(&self, d: f64) -> bool {
        d.abs() < self.linear
    }

    /// Check if a cosine means "perpendicular".
    pub fn is_perpendicular(&self, cos: f64) -> bool {
        cos.abs() < self.perp
    }

    /// Check if a cosine means "parallel or anti-parallel".
    pub fn is_parallel(&self, cos: f64) -> bool {
        cos.abs() >= self.para()
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self::DEFAULT
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tolerance_points_equal() {
        let tol = Tolerance::DEFAULT;
        let a = Point3::new(1.0, 2.0, 3.0);
        let b = Point3::new(1.0 + 1e-7, 2.0, 3.0);
        assert!(tol.points_equal(&a, &b));
        let c = Point3::new(1.001, 2.0, 3.0);
        assert!(!tol.points_equal(&a, &c));
    }

    #[test]
    fn test_tolerance_cosines() {
        let tol = Tolerance::new(1e-3, 1e-4);
        assert!(tol.is_perpendicular(5e-5));
        assert!(!tol.is_perpendicular(0.1));
        assert!(tol.is_parallel(-0.99995));
        assert!(!tol.is_parallel(0.9));
        assert!((tol.linear_sq() - 1e-6).abs() < 1e-18);
    }
}
