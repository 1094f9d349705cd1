#![warn(missing_docs)]

//! Face and edge geometry for the radial-edge kernel.
//!
//! Topology never owns geometry directly. Faces and edges hold handles
//! into a [`GeometryStore`], and several topological elements may share
//! one record. Every share is counted, and a record is dropped exactly
//! when its last user releases it.
//!
//! Face geometry is either a [`PlaneEq`] or an externally supplied
//! [`Surface`]; the kernel only ever asks a surface for ray hits and
//! normals.

use nmg_kernel_math::{Dir3, Point3, Tolerance, Vec3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    /// Handle to shared face geometry.
    pub struct FaceGeomId;
    /// Handle to shared edge line geometry.
    pub struct EdgeGeomId;
}

// =============================================================================
// Planes
// =============================================================================

/// How an infinite line meets a plane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LinePlane {
    /// The line crosses the plane at distance `t` along its direction.
    Hit {
        /// Distance along the line.
        t: f64,
    },
    /// Parallel, running on the side the normal points away from.
    ParallelInside,
    /// Parallel, running on the side the normal points to.
    ParallelOutside,
    /// The line lies in the plane.
    Coincident,
}

/// A plane `normal . x = offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaneEq {
    /// Unit normal.
    pub normal: Dir3,
    /// Signed distance of the plane from the origin along `normal`.
    pub offset: f64,
}

impl PlaneEq {
    /// Plane through `point` with the given (not necessarily unit) normal.
    pub fn new(normal: Vec3, point: &Point3) -> Self {
        let normal = Dir3::new_normalize(normal);
        let offset = normal.dot(&point.coords);
        Self { normal, offset }
    }

    /// Plane through three points, counter-clockwise seen from the
    /// normal side. `None` if the points are colinear.
    pub fn from_points(a: &Point3, b: &Point3, c: &Point3, tol: &Tolerance) -> Option<Self> {
        let n = (b - a).cross(&(c - a));
        let len = n.norm();
        if len < tol.linear_sq() {
            return None;
        }
        Some(Self::new(n / len, a))
    }

    /// Newell's method over a closed polygon; tolerant of reflex corners.
    pub fn from_polygon(points: &[Point3], tol: &Tolerance) -> Option<Self> {
        if points.len() < 3 {
            return None;
        }
        let mut n = Vec3::zeros();
        let mut centroid = Vec3::zeros();
        for (i, p) in points.iter().enumerate() {
            let q = points[(i + 1) % points.len()];
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
            centroid += p.coords;
        }
        if n.norm() < tol.linear_sq() {
            return None;
        }
        centroid /= points.len() as f64;
        Some(Self::new(n, &Point3::from(centroid)))
    }

    /// Signed distance from a point to this plane, positive on the normal side.
    pub fn signed_distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.offset
    }

    /// The same plane facing the other way.
    pub fn flipped(&self) -> Self {
        Self {
            normal: Dir3::new_unchecked(-self.normal.into_inner()),
            offset: -self.offset,
        }
    }

    /// Intersect the infinite line `origin + t * dir` (unit `dir`) with the plane.
    pub fn intersect_line(&self, origin: &Point3, dir: &Vec3, tol: &Tolerance) -> LinePlane {
        let denom = self.normal.dot(dir);
        let dist = self.signed_distance(origin);
        if tol.is_perpendicular(denom) {
            if tol.is_zero(dist) {
                return LinePlane::Coincident;
            }
            return if dist > 0.0 {
                LinePlane::ParallelOutside
            } else {
                LinePlane::ParallelInside
            };
        }
        LinePlane::Hit { t: -dist / denom }
    }
}

// =============================================================================
// External surfaces
// =============================================================================

/// One ray crossing reported by an external surface.
#[derive(Debug, Clone, Copy)]
pub struct SurfaceHit {
    /// Distance along the ray.
    pub t: f64,
    /// Outward surface normal at the crossing.
    pub normal: Dir3,
}

/// A non-planar face surface supplied by a primitive-specific solver.
pub trait Surface: Send + Sync + std::fmt::Debug {
    /// Every crossing of the infinite line `origin + t * dir`, sorted by `t`.
    fn intersect_ray(&self, origin: &Point3, dir: &Vec3, tol: &Tolerance) -> Vec<SurfaceHit>;

    /// Outward normal at a point on the surface.
    fn normal_at(&self, p: &Point3) -> Dir3;

    /// Clone this surface into a boxed trait object.
    fn clone_box(&self) -> Box<dyn Surface>;
}

impl Clone for Box<dyn Surface> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Geometry carried by a face.
#[derive(Debug, Clone)]
pub enum FaceSurface {
    /// Planar face.
    Plane(PlaneEq),
    /// Anything else.
    Parametric(Box<dyn Surface>),
}

impl FaceSurface {
    /// The plane, if this is a planar face.
    pub fn as_plane(&self) -> Option<&PlaneEq> {
        match self {
            FaceSurface::Plane(p) => Some(p),
            FaceSurface::Parametric(_) => None,
        }
    }
}

// =============================================================================
// Edge lines
// =============================================================================

/// Line geometry shared by the uses of an edge.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineSeg {
    /// A point on the line (the first vertex when computed).
    pub point: Point3,
    /// Direction from the first vertex to the second, not unitized.
    pub dir: Vec3,
}

impl LineSeg {
    /// Line from `a` to `b`. `None` when the two points coincide.
    pub fn through(a: &Point3, b: &Point3, tol: &Tolerance) -> Option<Self> {
        if tol.points_equal(a, b) {
            return None;
        }
        Some(Self {
            point: *a,
            dir: b - a,
        })
    }
}

// =============================================================================
// Geometry store
// =============================================================================

/// A reference-counted geometry record.
#[derive(Debug, Clone)]
pub struct Shared<T> {
    /// The geometry itself.
    pub value: T,
    refs: u32,
}

impl<T> Shared<T> {
    /// Number of topological elements holding this record.
    pub fn refs(&self) -> u32 {
        self.refs
    }
}

/// Storage for all shared geometry of one model.
#[derive(Debug, Clone, Default)]
pub struct GeometryStore {
    /// Face geometry records.
    pub faces: SlotMap<FaceGeomId, Shared<FaceSurface>>,
    /// Edge geometry records.
    pub edges: SlotMap<EdgeGeomId, Shared<LineSeg>>,
}

impl GeometryStore {
    /// Create an empty geometry store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add face geometry with one user.
    pub fn add_face(&mut self, value: FaceSurface) -> FaceGeomId {
        self.faces.insert(Shared { value, refs: 1 })
    }

    /// Add edge geometry with one user.
    pub fn add_edge(&mut self, value: LineSeg) -> EdgeGeomId {
        self.edges.insert(Shared { value, refs: 1 })
    }

    /// Register one more user of a face record. `false` if it is gone.
    pub fn retain_face(&mut self, id: FaceGeomId) -> bool {
        match self.faces.get_mut(id) {
            Some(rec) => {
                rec.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Register one more user of an edge record. `false` if it is gone.
    pub fn retain_edge(&mut self, id: EdgeGeomId) -> bool {
        match self.edges.get_mut(id) {
            Some(rec) => {
                rec.refs += 1;
                true
            }
            None => false,
        }
    }

    /// Drop one user of a face record, freeing it with the last.
    ///
    /// Returns `Some(true)` when the record was freed, `None` if the
    /// handle was already dead.
    pub fn release_face(&mut self, id: FaceGeomId) -> Option<bool> {
        let rec = self.faces.get_mut(id)?;
        rec.refs = rec.refs.saturating_sub(1);
        if rec.refs == 0 {
            self.faces.remove(id);
            return Some(true);
        }
        Some(false)
    }

    /// Drop one user of an edge record, freeing it with the last.
    pub fn release_edge(&mut self, id: EdgeGeomId) -> Option<bool> {
        let rec = self.edges.get_mut(id)?;
        rec.refs = rec.refs.saturating_sub(1);
        if rec.refs == 0 {
            self.edges.remove(id);
            return Some(true);
        }
        Some(false)
    }

    /// Face geometry behind a handle.
    pub fn face(&self, id: FaceGeomId) -> Option<&FaceSurface> {
        self.faces.get(id).map(|rec| &rec.value)
    }

    /// Edge geometry behind a handle.
    pub fn edge(&self, id: EdgeGeomId) -> Option<&LineSeg> {
        self.edges.get(id).map(|rec| &rec.value)
    }
}
