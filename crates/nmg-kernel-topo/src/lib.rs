#![warn(missing_docs)]

//! Radial-edge topology for the nmg kernel.
//!
//! A [`Model`] owns every region, shell, face, loop, edge and vertex of an
//! object together with their *uses*: each face, loop and edge appears as
//! a mated pair of uses (one per side), and all uses of an edge form one
//! radial cycle. Elements are stored in slotmap arenas and linked by
//! handles, so every link can be followed both up and down.
//!
//! # Architecture
//!
//! - [`model`] - Element records, handles and the [`Model`] arena
//! - [`make`] - Builders that always produce legally non-empty structure
//! - [`kill`] - Removal of one use pair at a time, reporting [`KillStatus`]
//! - [`join`] - Vertex merging, radial splicing, geometry sharing
//! - [`modify`] - Edge splitting and shell inversion
//! - [`demote`] - Loop to wire edges, wire edge to point-loops
//! - [`attrib`] - Coordinates, face planes, edge lines, bounding boxes
//! - [`info`] - Read-only queries (parents, loop neighbours, left vectors)
//! - [`check`] - Whole-model invariant check and closed-surface check
//! - [`manifold`] - Per-element manifold degree table
//!
//! # Example
//!
//! ```
//! use nmg_kernel_topo::{Model, TopoError};
//!
//! let mut model = Model::new();
//! let (_region, shell) = model.make_region_shell_vertex();
//! let eu = model.make_edge(None, None, shell)?;
//! let status = model.kill_edge_use(eu)?;
//! assert!(status.parent_empty());
//! # Ok::<(), TopoError>(())
//! ```

pub mod attrib;
pub mod check;
pub mod demote;
pub mod error;
pub mod glue;
pub mod info;
pub mod join;
pub mod kill;
pub mod make;
pub mod manifold;
pub mod model;
pub mod modify;

pub use error::{Result, TopoError};
pub use manifold::{Manifold, ManifoldTable};
pub use model::{
    Edge, EdgeId, EdgeParent, EdgeUse, EdgeUseId, Face, FaceId, FaceUse, FaceUseId, KillStatus,
    Loop, LoopContents, LoopId, LoopParent, LoopUse, LoopUseId, Model, Orientation, Region,
    RegionId, Shell, ShellId, Vertex, VertexId, VertexParent, VertexUse, VertexUseId,
};
