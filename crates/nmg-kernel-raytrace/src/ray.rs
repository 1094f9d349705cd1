//! Ray representation and the bounding-box test used for early rejects.

use nmg_kernel_math::{Aabb3, Dir3, Point3, Vec3};

/// A ray in 3D space defined by origin and direction.
///
/// Classification treats the ray as an infinite line: hits behind the
/// origin are reported with negative distances.
#[derive(Debug, Clone, Copy)]
pub struct Ray {
    /// Origin point of the ray.
    pub origin: Point3,
    /// Unit direction of the ray.
    pub direction: Dir3,
    /// Precomputed reciprocal of direction components for fast AABB tests.
    inv_direction: Vec3,
}

impl Ray {
    /// Create a new ray from origin and direction.
    ///
    /// The direction will be normalized.
    pub fn new(origin: Point3, direction: Vec3) -> Self {
        let dir = Dir3::new_normalize(direction);
        let inv = Vec3::new(1.0 / dir.x, 1.0 / dir.y, 1.0 / dir.z);
        Self {
            origin,
            direction: dir,
            inv_direction: inv,
        }
    }

    /// Evaluate the ray at parameter `t`: `origin + t * direction`.
    #[inline]
    pub fn at(&self, t: f64) -> Point3 {
        self.origin + t * self.direction.as_ref()
    }

    /// Distance along the ray to the foot of the perpendicular from `p`.
    #[inline]
    pub fn param_of(&self, p: &Point3) -> f64 {
        (p - self.origin).dot(&self.direction)
    }

    /// Test the ray's line against an AABB using the slab method.
    ///
    /// Returns `Some((t_min, t_max))` if the line passes through the box.
    /// An axis the ray runs parallel to is checked directly against the
    /// origin, so axis-aligned rays grazing a box face still count.
    #[inline]
    pub fn intersect_aabb(&self, aabb: &Aabb3) -> Option<(f64, f64)> {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        for axis in 0..3 {
            let (o, lo, hi) = (self.origin[axis], aabb.min[axis], aabb.max[axis]);
            if self.direction[axis] == 0.0 {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let inv = self.inv_direction[axis];
            let (t1, t2) = ((lo - o) * inv, (hi - o) * inv);
            t_min = t_min.max(t1.min(t2));
            t_max = t_max.min(t1.max(t2));
        }
        (t_max >= t_min).then_some((t_min, t_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_box() -> Aabb3 {
        Aabb3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_ray_at() {
        let ray = Ray::new(Point3::new(0.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let p = ray.at(5.0);
        assert!((p.x - 5.0).abs() < 1e-12);
        assert!(p.y.abs() < 1e-12);
        assert!((ray.param_of(&Point3::new(3.0, 1.0, 0.0)) - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_ray_aabb_hit() {
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.intersect_aabb(&unit_box()).unwrap();
        assert!((t_min - 5.0).abs() < 1e-10);
        assert!((t_max - 6.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_aabb_miss() {
        let ray = Ray::new(Point3::new(-5.0, 5.0, 5.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box()).is_none());
    }

    #[test]
    fn test_ray_aabb_behind_counts() {
        // the line still passes through the box
        let ray = Ray::new(Point3::new(-5.0, 0.5, 0.5), Vec3::new(-1.0, 0.0, 0.0));
        let (t_min, t_max) = ray.intersect_aabb(&unit_box()).unwrap();
        assert!((t_min + 6.0).abs() < 1e-10);
        assert!((t_max + 5.0).abs() < 1e-10);
    }

    #[test]
    fn test_ray_aabb_grazing_face() {
        // runs exactly along the box's top face
        let ray = Ray::new(Point3::new(-1.0, 0.5, 1.0), Vec3::new(1.0, 0.0, 0.0));
        assert!(ray.intersect_aabb(&unit_box()).is_some());
    }

    #[test]
    fn test_ray_aabb_diagonal() {
        let ray = Ray::new(Point3::new(-1.0, -1.0, -1.0), Vec3::new(1.0, 1.0, 1.0));
        assert!(ray.intersect_aabb(&unit_box()).is_some());
    }
}
