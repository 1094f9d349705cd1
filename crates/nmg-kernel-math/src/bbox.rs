//! Axis-aligned bounding boxes.
//!
//! Boxes are used as early-reject filters at every level of the model.
//! A box built from coplanar or colinear geometry would have zero
//! thickness on some axis, so [`Aabb3::pad_degenerate`] widens such axes
//! to at least the linear tolerance.

use crate::{Point3, Tolerance};

/// Axis-aligned bounding box in 3D.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb3 {
    /// Minimum corner.
    pub min: Point3,
    /// Maximum corner.
    pub max: Point3,
}

impl Aabb3 {
    /// Create an AABB from min and max corners.
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Create an empty (inverted) AABB suitable for expansion.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::INFINITY, f64::INFINITY, f64::INFINITY),
            max: Point3::new(f64::NEG_INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        }
    }

    /// Box around a set of points. Returns `None` for an empty set.
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Point3>) -> Option<Self> {
        let mut aabb = Self::empty();
        for p in points {
            aabb.include_point(p);
        }
        (!aabb.is_empty()).then_some(aabb)
    }

    /// True while nothing has been included.
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Expand this AABB to include a point.
    pub fn include_point(&mut self, p: &Point3) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.min.z = self.min.z.min(p.z);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
        self.max.z = self.max.z.max(p.z);
    }

    /// Expand this AABB to include another box.
    pub fn include_box(&mut self, other: &Aabb3) {
        if other.is_empty() {
            return;
        }
        self.include_point(&other.min);
        self.include_point(&other.max);
    }

    /// Inclusive containment test.
    pub fn contains_point(&self, p: &Point3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }

    /// Containment test with the box grown by `tol` on every side.
    pub fn contains_point_tol(&self, p: &Point3, tol: f64) -> bool {
        p.x >= self.min.x - tol
            && p.x <= self.max.x + tol
            && p.y >= self.min.y - tol
            && p.y <= self.max.y + tol
            && p.z >= self.min.z - tol
            && p.z <= self.max.z + tol
    }

    /// Expand the AABB by a tolerance in all directions.
    pub fn expand(&mut self, tol: f64) {
        self.min.x -= tol;
        self.min.y -= tol;
        self.min.z -= tol;
        self.max.x += tol;
        self.max.y += tol;
        self.max.z += tol;
    }

    /// Widen every axis thinner than `tol.linear` by half the tolerance
    /// on each side.
    pub fn pad_degenerate(&mut self, tol: &Tolerance) {
        let half = 0.5 * tol.linear;
        for axis in 0..3 {
            if self.max[axis] - self.min[axis] < tol.linear {
                self.min[axis] -= half;
                self.max[axis] += half;
            }
        }
    }

    /// Smallest extent over the three axes.
    pub fn min_extent(&self) -> f64 {
        let d = self.max - self.min;
        d.x.min(d.y).min(d.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_points() {
        let pts = [Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 5.0, 0.0)];
        let b = Aabb3::from_points(pts.iter()).unwrap();
        assert_eq!(b.min, Point3::new(-1.0, 2.0, 0.0));
        assert_eq!(b.max, Point3::new(1.0, 5.0, 3.0));
        assert!(Aabb3::from_points(std::iter::empty()).is_none());
    }

    #[test]
    fn test_pad_degenerate_flat_box() {
        let tol = Tolerance::new(0.01, 1e-6);
        let mut b = Aabb3::new(Point3::new(0.0, 0.0, 2.0), Point3::new(1.0, 1.0, 2.0));
        b.pad_degenerate(&tol);
        assert!((b.min.z - 1.995).abs() < 1e-12);
        assert!((b.max.z - 2.005).abs() < 1e-12);
        // untouched axes
        assert_eq!(b.min.x, 0.0);
        assert_eq!(b.max.y, 1.0);
        assert!(b.min_extent() >= tol.linear);
    }

    #[test]
    fn test_contains_and_union() {
        let a = Aabb3::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
        assert!(a.contains_point(&Point3::new(1.0, 0.0, 0.5)));
        assert!(!a.contains_point(&Point3::new(1.1, 0.0, 0.5)));
        assert!(a.contains_point_tol(&Point3::new(1.05, 0.0, 0.5), 0.1));
        let b = Aabb3::new(Point3::new(1.0, 1.0, 1.0), Point3::new(2.0, 2.0, 2.0));
        let mut u = Aabb3::empty();
        u.include_box(&a);
        u.include_box(&b);
        assert_eq!(u.max, Point3::new(2.0, 2.0, 2.0));
    }
}
