//! Entity records and the [`Model`] arena that owns them.
//!
//! Every link between elements is a slotmap handle. Uses point up to
//! their parent and sideways to their mate; parents hold ordered lists
//! of their children. Operations in the sibling modules keep both
//! directions in step.

use nmg_kernel_geom::{EdgeGeomId, FaceGeomId, GeometryStore};
use nmg_kernel_math::{Aabb3, Point3};
use slotmap::{new_key_type, SlotMap};

use crate::error::{Result, TopoError};

new_key_type! {
    /// Handle to a region.
    pub struct RegionId;
    /// Handle to a shell.
    pub struct ShellId;
    /// Handle to a face.
    pub struct FaceId;
    /// Handle to one side of a face.
    pub struct FaceUseId;
    /// Handle to a loop.
    pub struct LoopId;
    /// Handle to one traversal of a loop.
    pub struct LoopUseId;
    /// Handle to an edge.
    pub struct EdgeId;
    /// Handle to one directed use of an edge.
    pub struct EdgeUseId;
    /// Handle to a vertex.
    pub struct VertexId;
    /// Handle to one use of a vertex.
    pub struct VertexUseId;
}

/// Orientation of a face-use or loop-use relative to its geometry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Orientation {
    /// Agrees with the geometry (outer loops, outward face side).
    Same,
    /// Opposes the geometry (holes, inward face side).
    Opposite,
    /// Not yet decided (wire loops in a shell).
    Unspecified,
}

impl Orientation {
    /// The reverse orientation; `Unspecified` stays put.
    pub fn flipped(self) -> Self {
        match self {
            Orientation::Same => Orientation::Opposite,
            Orientation::Opposite => Orientation::Same,
            Orientation::Unspecified => Orientation::Unspecified,
        }
    }
}

/// Whether a kill left its parent with children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KillStatus {
    /// The parent still has something in it.
    StillNonEmpty,
    /// The parent is now empty and must be killed or refilled by the caller.
    ParentNowEmpty,
}

impl KillStatus {
    /// True when the caller has to continue the cascade.
    pub fn parent_empty(self) -> bool {
        self == KillStatus::ParentNowEmpty
    }

    pub(crate) fn from_empty(empty: bool) -> Self {
        if empty {
            KillStatus::ParentNowEmpty
        } else {
            KillStatus::StillNonEmpty
        }
    }
}

/// Owner of a loop-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopParent {
    /// A wire loop directly in a shell.
    Shell(ShellId),
    /// A boundary loop of a face-use.
    FaceUse(FaceUseId),
}

/// Owner of an edge-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeParent {
    /// A wire edge directly in a shell.
    Shell(ShellId),
    /// One edge of a loop.
    LoopUse(LoopUseId),
}

/// Owner of a vertex-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VertexParent {
    /// The lone vertex of a shell.
    Shell(ShellId),
    /// The single vertex of a point-loop.
    LoopUse(LoopUseId),
    /// The start vertex of an edge-use.
    EdgeUse(EdgeUseId),
}

/// What a loop-use is made of.
#[derive(Debug, Clone, PartialEq)]
pub enum LoopContents {
    /// A point-loop.
    Vertex(VertexUseId),
    /// A cycle of edge-uses, in traversal order.
    Edges(Vec<EdgeUseId>),
}

impl LoopContents {
    /// Edge-uses of the loop; empty for a point-loop.
    pub fn edges(&self) -> &[EdgeUseId] {
        match self {
            LoopContents::Edges(eus) => eus,
            LoopContents::Vertex(_) => &[],
        }
    }

    /// The vertex-use of a point-loop.
    pub fn vertex(&self) -> Option<VertexUseId> {
        match self {
            LoopContents::Vertex(vu) => Some(*vu),
            LoopContents::Edges(_) => None,
        }
    }

    /// True for a loop of edges that has lost every edge.
    pub fn is_empty(&self) -> bool {
        matches!(self, LoopContents::Edges(eus) if eus.is_empty())
    }
}

/// A maximal connected solid grouping.
#[derive(Debug, Clone)]
pub struct Region {
    /// Shells in this region.
    pub shells: Vec<ShellId>,
    /// Bounding box, once computed.
    pub bbox: Option<Aabb3>,
    /// Element index.
    pub index: usize,
}

/// A topologically connected component.
#[derive(Debug, Clone)]
pub struct Shell {
    /// Owning region.
    pub region: RegionId,
    /// Face-uses, mates adjacent.
    pub faceuses: Vec<FaceUseId>,
    /// Wire loop-uses.
    pub loopuses: Vec<LoopUseId>,
    /// Wire edge-uses, mates adjacent.
    pub edgeuses: Vec<EdgeUseId>,
    /// The lone vertex, if the shell is just a point.
    pub vertexuse: Option<VertexUseId>,
    /// Bounding box, once computed.
    pub bbox: Option<Aabb3>,
    /// Element index.
    pub index: usize,
}

/// A surface patch used from two sides.
#[derive(Debug, Clone)]
pub struct Face {
    /// One of the two uses.
    pub faceuse: FaceUseId,
    /// Shared plane or surface.
    pub geom: Option<FaceGeomId>,
    /// The face's normal is the reverse of its geometry's.
    pub flip: bool,
    /// Bounding box, once computed.
    pub bbox: Option<Aabb3>,
    /// Element index.
    pub index: usize,
}

/// One side of a face.
#[derive(Debug, Clone)]
pub struct FaceUse {
    /// Owning shell.
    pub shell: ShellId,
    /// The other side.
    pub mate: FaceUseId,
    /// The face.
    pub face: FaceId,
    /// Same or opposite to the face geometry.
    pub orientation: Orientation,
    /// Boundary loops.
    pub loopuses: Vec<LoopUseId>,
    /// Element index.
    pub index: usize,
}

/// A loop of edges or a single point.
#[derive(Debug, Clone)]
pub struct Loop {
    /// One of the two uses.
    pub loopuse: LoopUseId,
    /// Bounding box, once computed.
    pub bbox: Option<Aabb3>,
    /// Element index.
    pub index: usize,
}

/// One traversal of a loop.
#[derive(Debug, Clone)]
pub struct LoopUse {
    /// Face-use or shell.
    pub parent: LoopParent,
    /// The mirror traversal.
    pub mate: LoopUseId,
    /// The loop.
    pub lp: LoopId,
    /// Outer boundary (`Same`) or hole (`Opposite`).
    pub orientation: Orientation,
    /// Edges or a point.
    pub contents: LoopContents,
    /// Element index.
    pub index: usize,
}

/// An undirected edge.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Representative use; any use reaches the rest of the radial cycle.
    pub edgeuse: EdgeUseId,
    /// Element index.
    pub index: usize,
}

/// One directed use of an edge.
#[derive(Debug, Clone)]
pub struct EdgeUse {
    /// Loop-use or shell.
    pub parent: EdgeParent,
    /// Reverse-direction twin.
    pub mate: EdgeUseId,
    /// Radially adjacent use on the other side of the same wedge.
    pub radial: EdgeUseId,
    /// The edge.
    pub edge: EdgeId,
    /// Start vertex-use.
    pub vertexuse: VertexUseId,
    /// Shared line geometry.
    pub geom: Option<EdgeGeomId>,
    /// Element index.
    pub index: usize,
}

/// A point in space.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// Every use of this vertex.
    pub uses: Vec<VertexUseId>,
    /// Coordinate, once assigned.
    pub coord: Option<Point3>,
    /// Element index.
    pub index: usize,
}

/// One use of a vertex.
#[derive(Debug, Clone)]
pub struct VertexUse {
    /// Shell, point-loop or edge-use.
    pub parent: VertexParent,
    /// The vertex.
    pub vertex: VertexId,
    /// Element index.
    pub index: usize,
}

/// The whole object universe: every element of every region.
#[derive(Debug, Clone, Default)]
pub struct Model {
    /// Regions.
    pub regions: SlotMap<RegionId, Region>,
    /// Shells.
    pub shells: SlotMap<ShellId, Shell>,
    /// Faces.
    pub faces: SlotMap<FaceId, Face>,
    /// Face-uses.
    pub faceuses: SlotMap<FaceUseId, FaceUse>,
    /// Loops.
    pub loops: SlotMap<LoopId, Loop>,
    /// Loop-uses.
    pub loopuses: SlotMap<LoopUseId, LoopUse>,
    /// Edges.
    pub edges: SlotMap<EdgeId, Edge>,
    /// Edge-uses.
    pub edgeuses: SlotMap<EdgeUseId, EdgeUse>,
    /// Vertices.
    pub vertices: SlotMap<VertexId, Vertex>,
    /// Vertex-uses.
    pub vertexuses: SlotMap<VertexUseId, VertexUse>,
    /// Shared face and edge geometry.
    pub geometry: GeometryStore,
    max_index: usize,
}

impl Model {
    /// Make an empty model.
    pub fn new() -> Self {
        Self {
            // index 0 is the model itself
            max_index: 1,
            ..Self::default()
        }
    }

    /// One past the highest element index handed out. Tables indexed by
    /// element index must be at least this long.
    pub fn max_index(&self) -> usize {
        self.max_index
    }

    pub(crate) fn next_index(&mut self) -> usize {
        let i = self.max_index;
        self.max_index += 1;
        i
    }

    pub(crate) fn reset_index(&mut self) {
        self.max_index = 1;
    }

    /// Checked region lookup.
    pub fn region(&self, id: RegionId) -> Result<&Region> {
        self.regions.get(id).ok_or(TopoError::Dead("region"))
    }

    /// Checked shell lookup.
    pub fn shell(&self, id: ShellId) -> Result<&Shell> {
        self.shells.get(id).ok_or(TopoError::Dead("shell"))
    }

    /// Checked face lookup.
    pub fn face(&self, id: FaceId) -> Result<&Face> {
        self.faces.get(id).ok_or(TopoError::Dead("face"))
    }

    /// Checked face-use lookup.
    pub fn faceuse(&self, id: FaceUseId) -> Result<&FaceUse> {
        self.faceuses.get(id).ok_or(TopoError::Dead("face-use"))
    }

    /// Checked loop-use lookup.
    pub fn loopuse(&self, id: LoopUseId) -> Result<&LoopUse> {
        self.loopuses.get(id).ok_or(TopoError::Dead("loop-use"))
    }

    /// Checked edge lookup.
    pub fn edge(&self, id: EdgeId) -> Result<&Edge> {
        self.edges.get(id).ok_or(TopoError::Dead("edge"))
    }

    /// Checked edge-use lookup.
    pub fn edgeuse(&self, id: EdgeUseId) -> Result<&EdgeUse> {
        self.edgeuses.get(id).ok_or(TopoError::Dead("edge-use"))
    }

    /// Checked vertex lookup.
    pub fn vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.get(id).ok_or(TopoError::Dead("vertex"))
    }

    /// Checked vertex-use lookup.
    pub fn vertexuse(&self, id: VertexUseId) -> Result<&VertexUse> {
        self.vertexuses.get(id).ok_or(TopoError::Dead("vertex-use"))
    }

    /// Vertex at the start of an edge-use.
    pub fn eu_start(&self, eu: EdgeUseId) -> Result<VertexId> {
        let vu = self.edgeuse(eu)?.vertexuse;
        Ok(self.vertexuse(vu)?.vertex)
    }

    /// Vertex at the end of an edge-use (the start of its mate).
    pub fn eu_end(&self, eu: EdgeUseId) -> Result<VertexId> {
        let mate = self.edgeuse(eu)?.mate;
        self.eu_start(mate)
    }

    /// Coordinate of a vertex.
    pub fn vertex_point(&self, v: VertexId) -> Result<Point3> {
        let vert = self.vertex(v)?;
        vert.coord.ok_or(TopoError::MissingGeometry {
            kind: "vertex",
            index: vert.index,
        })
    }

    /// True when the shell holds nothing at all.
    pub fn shell_is_empty(&self, s: ShellId) -> Result<bool> {
        let shell = self.shell(s)?;
        Ok(shell.faceuses.is_empty()
            && shell.loopuses.is_empty()
            && shell.edgeuses.is_empty()
            && shell.vertexuse.is_none())
    }

    /// Ids of all live regions.
    pub fn region_ids(&self) -> impl Iterator<Item = RegionId> + '_ {
        self.regions.keys()
    }
}

/// Remove the first occurrence of `item`, keeping order. `false` if absent.
pub(crate) fn remove_item<T: PartialEq>(list: &mut Vec<T>, item: &T) -> bool {
    match list.iter().position(|x| x == item) {
        Some(i) => {
            list.remove(i);
            true
        }
        None => false,
    }
}
