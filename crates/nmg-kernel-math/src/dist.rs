//! Distance primitives that report where a point or a ray meets a segment.
//!
//! Classification codes matter more than the raw distances here: the
//! point-in-face classifier and the ray intersector branch on whether a
//! contact is at an endpoint, inside the span, or beyond it.

use crate::{Point3, Tolerance, Vec3};

/// Where the point closest to `p` lies on segment `a..b`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointSegment {
    /// `p` is within tolerance of the segment interior.
    OnInterior,
    /// `p` is within tolerance of `a`.
    AtStart,
    /// `p` is within tolerance of `b`.
    AtEnd,
    /// Closest point is `a`; `p` lies beyond it.
    BeyondStart,
    /// Closest point is `b`; `p` lies beyond it.
    BeyondEnd,
    /// Closest point is inside the span but `p` is off the segment.
    Interior,
}

/// Distance from `p` to segment `a..b`.
///
/// Returns the classification, the distance, and the point of closest
/// approach. A segment shorter than the tolerance behaves as point `a`.
pub fn dist_point_segment(
    a: &Point3,
    b: &Point3,
    p: &Point3,
    tol: &Tolerance,
) -> (PointSegment, f64, Point3) {
    let a_to_p = p - a;
    let dist_a_sq = a_to_p.norm_squared();
    if dist_a_sq < tol.linear_sq() {
        return (PointSegment::AtStart, dist_a_sq.sqrt(), *a);
    }
    let dist_b_sq = (p - b).norm_squared();
    if dist_b_sq < tol.linear_sq() {
        return (PointSegment::AtEnd, dist_b_sq.sqrt(), *b);
    }

    let a_to_b = b - a;
    let len_sq = a_to_b.norm_squared();
    if len_sq < tol.linear_sq() {
        return (PointSegment::BeyondStart, dist_a_sq.sqrt(), *a);
    }

    let t = a_to_p.dot(&a_to_b) / len_sq;
    if t <= 0.0 {
        return (PointSegment::BeyondStart, dist_a_sq.sqrt(), *a);
    }
    if t >= 1.0 {
        return (PointSegment::BeyondEnd, dist_b_sq.sqrt(), *b);
    }

    let pca = a + a_to_b * t;
    let dist = (p - pca).norm();
    if dist < tol.linear {
        (PointSegment::OnInterior, dist, pca)
    } else {
        (PointSegment::Interior, dist, pca)
    }
}

/// Perpendicular distance from `p` to the infinite line through `origin`
/// along unit `dir`.
pub fn dist_line_point(origin: &Point3, dir: &Vec3, p: &Point3) -> f64 {
    let v = p - origin;
    (v - dir * v.dot(dir)).norm()
}

/// How an infinite ray line meets segment `a..b`.
///
/// Distances `t` are measured along the ray's unit direction from its
/// origin, and may be negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RaySegment {
    /// `a` and `b` coincide within tolerance.
    ZeroLength,
    /// The ray passes the segment's line beyond `b`.
    MissBeyondEnd,
    /// The ray passes the segment's line before `a`.
    MissBeforeStart,
    /// The ray and the segment's line do not meet.
    Miss,
    /// The segment lies along the ray.
    Colinear {
        /// Ray distance to `a`.
        t_start: f64,
        /// Ray distance to `b`.
        t_end: f64,
    },
    /// The ray passes through `a`.
    AtStart {
        /// Ray distance to `a`.
        t: f64,
    },
    /// The ray passes through `b`.
    AtEnd {
        /// Ray distance to `b`.
        t: f64,
    },
    /// The ray crosses the segment interior.
    Interior {
        /// Ray distance to the crossing.
        t: f64,
    },
}

/// Intersect the infinite line `origin + t * dir` (unit `dir`) with
/// segment `a..b`.
///
/// Endpoint contacts win over interior contacts, so a ray grazing a
/// vertex is always reported at that vertex.
pub fn ray_segment(origin: &Point3, dir: &Vec3, a: &Point3, b: &Point3, tol: &Tolerance) -> RaySegment {
    let seg = b - a;
    let len = seg.norm();
    if len < tol.linear {
        return RaySegment::ZeroLength;
    }

    let t_a = (a - origin).dot(dir);
    let t_b = (b - origin).dot(dir);
    let a_on = dist_line_point(origin, dir, a) < tol.linear;
    let b_on = dist_line_point(origin, dir, b) < tol.linear;
    match (a_on, b_on) {
        (true, true) => return RaySegment::Colinear { t_start: t_a, t_end: t_b },
        (true, false) => return RaySegment::AtStart { t: t_a },
        (false, true) => return RaySegment::AtEnd { t: t_b },
        (false, false) => {}
    }

    let seg_dir = seg / len;
    let cos = dir.dot(&seg_dir);
    let denom = 1.0 - cos * cos;
    if denom < tol.perp * tol.perp {
        return RaySegment::Miss;
    }

    // Closest points between the two infinite lines.
    let w0 = origin - a;
    let d = dir.dot(&w0);
    let e = seg_dir.dot(&w0);
    let t = (cos * e - d) / denom;
    let s = (e - cos * d) / denom;

    let on_ray = origin + dir * t;
    let on_seg = a + seg_dir * s;
    if (on_ray - on_seg).norm() >= tol.linear {
        return RaySegment::Miss;
    }
    if s < 0.0 {
        RaySegment::MissBeforeStart
    } else if s > len {
        RaySegment::MissBeyondEnd
    } else {
        RaySegment::Interior { t }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn tol() -> Tolerance {
        Tolerance::new(1e-6, 1e-6)
    }

    #[test]
    fn test_point_segment_codes() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let t = tol();

        let (code, d, pca) = dist_point_segment(&a, &b, &Point3::new(1.0, 1.0, 0.0), &t);
        assert_eq!(code, PointSegment::Interior);
        assert_relative_eq!(d, 1.0);
        assert_relative_eq!(pca.x, 1.0);

        let (code, _, _) = dist_point_segment(&a, &b, &Point3::new(1.0, 0.0, 0.0), &t);
        assert_eq!(code, PointSegment::OnInterior);

        let (code, d, _) = dist_point_segment(&a, &b, &Point3::new(-1.0, 1.0, 0.0), &t);
        assert_eq!(code, PointSegment::BeyondStart);
        assert_relative_eq!(d, 2.0_f64.sqrt());

        let (code, _, pca) = dist_point_segment(&a, &b, &Point3::new(3.0, 0.0, 0.0), &t);
        assert_eq!(code, PointSegment::BeyondEnd);
        assert_eq!(pca, b);

        let (code, _, _) = dist_point_segment(&a, &b, &Point3::new(2.0, 0.0, 0.0), &t);
        assert_eq!(code, PointSegment::AtEnd);
    }

    #[test]
    fn test_ray_segment_interior() {
        let o = Point3::new(1.0, -5.0, 0.0);
        let d = Vec3::new(0.0, 1.0, 0.0);
        let r = ray_segment(&o, &d, &Point3::new(0.0, 0.0, 0.0), &Point3::new(2.0, 0.0, 0.0), &tol());
        match r {
            RaySegment::Interior { t } => assert_relative_eq!(t, 5.0),
            other => panic!("expected interior hit, got {other:?}"),
        }
    }

    #[test]
    fn test_ray_segment_endpoints_and_misses() {
        let d = Vec3::new(0.0, 1.0, 0.0);
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(2.0, 0.0, 0.0);
        let t = tol();

        let r = ray_segment(&Point3::new(0.0, -1.0, 0.0), &d, &a, &b, &t);
        assert_eq!(r, RaySegment::AtStart { t: 1.0 });
        let r = ray_segment(&Point3::new(2.0, -1.0, 0.0), &d, &a, &b, &t);
        assert_eq!(r, RaySegment::AtEnd { t: 1.0 });
        let r = ray_segment(&Point3::new(-1.0, -1.0, 0.0), &d, &a, &b, &t);
        assert_eq!(r, RaySegment::MissBeforeStart);
        let r = ray_segment(&Point3::new(3.0, -1.0, 0.0), &d, &a, &b, &t);
        assert_eq!(r, RaySegment::MissBeyondEnd);
        let r = ray_segment(&Point3::new(1.0, -1.0, 1.0), &d, &a, &b, &t);
        assert_eq!(r, RaySegment::Miss);
        let r = ray_segment(&Point3::new(0.0, -1.0, 0.0), &d, &a, &a, &t);
        assert_eq!(r, RaySegment::ZeroLength);
    }

    #[test]
    fn test_ray_segment_colinear() {
        let o = Point3::new(-3.0, 0.0, 0.0);
        let d = Vec3::new(1.0, 0.0, 0.0);
        let r = ray_segment(&o, &d, &Point3::new(2.0, 0.0, 0.0), &Point3::new(0.0, 0.0, 0.0), &tol());
        assert_eq!(r, RaySegment::Colinear { t_start: 5.0, t_end: 3.0 });
    }

    #[test]
    fn test_dist_line_point() {
        let d = dist_line_point(&Point3::origin(), &Vec3::new(0.0, 0.0, 1.0), &Point3::new(3.0, 4.0, 9.0));
        assert_relative_eq!(d, 5.0);
    }
}
