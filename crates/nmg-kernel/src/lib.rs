#![warn(missing_docs)]

//! High-level radial-edge kernel facade.
//!
//! Provides the [`Object`] type: a checked model with one region and shell,
//! built from a primitive and ready to be shot with rays.
//!
//! # Example
//!
//! ```
//! use nmg_kernel::{Object, Ray};
//! use nmg_kernel_math::{Point3, Vec3};
//!
//! let cube = Object::cube(10.0, 20.0, 30.0).unwrap();
//! let ray = Ray::new(Point3::new(5.0, 5.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
//! let segments = cube.shoot(&ray).unwrap();
//! assert_eq!(segments.len(), 1);
//! ```

pub use nmg_kernel_geom;
pub use nmg_kernel_math;
pub use nmg_kernel_primitives;
pub use nmg_kernel_raytrace;
pub use nmg_kernel_topo;

pub use nmg_kernel_raytrace::{Ray, RaytraceError, Result, Segment, Shooter, ShotSettings};

use nmg_kernel_math::Point3;
use nmg_kernel_primitives::NmgSolid;
use nmg_kernel_topo::{ManifoldTable, Model, RegionId, ShellId};

/// A built model with its region and shell.
#[derive(Debug, Clone)]
pub struct Object {
    solid: NmgSolid,
}

impl Object {
    // =========================================================================
    // Constructors
    // =========================================================================

    fn checked(solid: NmgSolid) -> Result<Self> {
        solid.model.check()?;
        Ok(Self { solid })
    }

    /// An isolated point.
    pub fn point(p: Point3) -> Result<Self> {
        Self::checked(nmg_kernel_primitives::make_point(p)?)
    }

    /// A single wire edge from `a` to `b`.
    pub fn wire(a: Point3, b: Point3) -> Result<Self> {
        Self::checked(nmg_kernel_primitives::make_wire_segment(a, b)?)
    }

    /// A square sheet of side `size` in the plane `z`.
    pub fn sheet(size: f64, z: f64) -> Result<Self> {
        Self::checked(nmg_kernel_primitives::make_square_sheet(size, z)?)
    }

    /// A box with corner at origin and dimensions `(sx, sy, sz)`.
    pub fn cube(sx: f64, sy: f64, sz: f64) -> Result<Self> {
        Self::checked(nmg_kernel_primitives::make_cube(sx, sy, sz)?)
    }

    /// Two unit boxes meeting along one edge.
    pub fn boxes_sharing_edge() -> Result<Self> {
        Self::checked(nmg_kernel_primitives::make_boxes_sharing_edge()?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// The underlying model.
    pub fn model(&self) -> &Model {
        &self.solid.model
    }

    /// The region holding the object.
    pub fn region(&self) -> RegionId {
        self.solid.region
    }

    /// The shell holding the object.
    pub fn shell(&self) -> ShellId {
        self.solid.shell
    }

    /// Manifold degree of every face, edge and vertex.
    pub fn manifolds(&self) -> Result<ManifoldTable> {
        Ok(self.solid.model.manifolds()?)
    }

    /// Take the model out of the object, for editing.
    pub fn into_model(self) -> Model {
        self.solid.model
    }

    // =========================================================================
    // Ray shooting
    // =========================================================================

    /// A shooter over this object.
    pub fn shooter(&self, settings: ShotSettings) -> Result<Shooter<'_>> {
        Shooter::new(&self.solid.model, settings)
    }

    /// Shoot one ray with default settings.
    pub fn shoot(&self, ray: &Ray) -> Result<Vec<Segment>> {
        self.shooter(ShotSettings::default())?.shoot(ray)
    }
}
