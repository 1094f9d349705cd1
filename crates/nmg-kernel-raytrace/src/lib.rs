#![warn(missing_docs)]

//! Ray classification against radial-edge models.
//!
//! This crate shoots rays at a frozen [`Model`](nmg_kernel_topo::Model) and
//! reports the intervals of each ray that lie inside material. Faces,
//! edges and vertices are all hit directly; the local manifold degree of
//! each element decides whether a hit opens, closes or passes through a
//! segment.
//!
//! # Architecture
//!
//! - [`Ray`] - Ray representation with origin and direction
//! - [`classify`] - Point-in-face classification with boundary touch callbacks
//! - [`hitmiss`] - Per-element tag table and the sorted hit list
//! - [`intersect`] - Per-ray context walking regions, shells and faces
//! - [`neighborhood`] - In/out state on either side of an edge or vertex hit
//! - [`segs`] - Segment building from the sorted hits
//! - [`Shooter`] - Single and batch shots over a shared model
//!
//! # Example
//!
//! ```
//! use nmg_kernel_math::{Point3, Vec3};
//! use nmg_kernel_primitives::make_cube;
//! use nmg_kernel_raytrace::{Ray, RaytraceError, Shooter, ShotSettings};
//!
//! let solid = make_cube(10.0, 10.0, 10.0)?;
//! let shooter = Shooter::new(&solid.model, ShotSettings::default())?;
//!
//! let ray = Ray::new(
//!     Point3::new(-5.0, 5.0, 5.0),
//!     Vec3::new(1.0, 0.0, 0.0),
//! );
//!
//! let segments = shooter.shoot(&ray)?;
//! assert_eq!(segments.len(), 1);
//! assert!((segments[0].length() - 10.0).abs() < 1e-9);
//! # Ok::<(), RaytraceError>(())
//! ```

mod ray;
pub mod classify;
pub mod error;
pub mod hitmiss;
pub mod intersect;
pub mod neighborhood;
pub mod segs;
mod settings;
mod shot;

pub use classify::{ClosestElement, FaceClassification, FaceClassifier, PointClass, TouchObserver};
pub use error::{RaytraceError, Result};
pub use hitmiss::{Hit, HitElement, HitList, Tag};
pub use intersect::RayContext;
pub use neighborhood::{RayState, Transition};
pub use ray::Ray;
pub use segs::{check_transitions, Segment, SegmentBoundary, SegmentBuilder};
pub use settings::ShotSettings;
pub use shot::Shooter;
