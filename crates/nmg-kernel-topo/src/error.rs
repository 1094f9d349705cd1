//! Error types for topology operations.
//!
//! Every variant is a structural violation: a handle that no longer
//! exists, a broken mate or radial link, or a request that cannot be
//! satisfied without corrupting the model. None of them are repaired.

use thiserror::Error;

/// Errors raised by topology operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TopoError {
    /// The handle refers to an element that is gone (or never existed).
    #[error("{0} handle does not refer to a live element")]
    Dead(&'static str),

    /// A use and its mate do not point at each other.
    #[error("{kind} #{index}: mate link is not symmetric")]
    MateMismatch {
        /// Element kind.
        kind: &'static str,
        /// Element index.
        index: usize,
    },

    /// The radial cycle of an edge is broken.
    #[error("edge-use #{0}: radial link is not symmetric")]
    RadialBroken(usize),

    /// The element's parent is of the wrong kind for this operation.
    #[error("{kind} #{index}: parent must be a {expected}")]
    WrongParent {
        /// Element kind.
        kind: &'static str,
        /// Element index.
        index: usize,
        /// Required parent kind.
        expected: &'static str,
    },

    /// A loop-use and its mate live in different shells.
    #[error("loop-use #{0}: mate is not in the same shell")]
    MateNotInShell(usize),

    /// The shell has no wire edges to build a loop from.
    #[error("shell #{0}: no wire edges to build a loop from")]
    NoWireEdges(usize),

    /// A run of wire edges does not close back to its first vertex.
    #[error("shell #{shell}: wire edges from vertex #{start} do not close (run ends at vertex #{end})")]
    WireLoopNotClosed {
        /// Shell index.
        shell: usize,
        /// First vertex of the run.
        start: usize,
        /// Last vertex of the run.
        end: usize,
    },

    /// Two edge-uses to be joined do not run between the same vertices.
    #[error("edge-uses #{dst} and #{src} do not share both endpoints")]
    NoSharedVertex {
        /// Destination edge-use index.
        dst: usize,
        /// Source edge-use index.
        src: usize,
    },

    /// A loop of edges was required but the loop holds a single vertex.
    #[error("loop-use #{0}: is a vertex loop")]
    VertexLoop(usize),

    /// The shell has nothing in it.
    #[error("shell #{0}: is empty")]
    EmptyShell(usize),

    /// Geometry needed by the operation has not been assigned.
    #[error("{kind} #{index}: no geometry assigned")]
    MissingGeometry {
        /// Element kind.
        kind: &'static str,
        /// Element index.
        index: usize,
    },

    /// Line geometry cannot be computed for an edge whose ends coincide.
    #[error("edge-use #{0}: zero length edge")]
    ZeroLengthEdge(usize),

    /// An edge cannot be split at one of its own endpoints.
    #[error("edge-use #{0}: split vertex is an endpoint of the edge")]
    SplitAtEndpoint(usize),

    /// A face needs at least three corners.
    #[error("shell #{shell}: a face needs at least 3 vertices, got {count}")]
    TooFewVertices {
        /// Shell index.
        shell: usize,
        /// Number of vertices given.
        count: usize,
    },

    /// The faces of a shell do not close around an edge.
    #[error("shell #{shell}: surface is open at edge-use #{edgeuse}")]
    OpenSurface {
        /// Shell index.
        shell: usize,
        /// Edge-use where the imbalance was found.
        edgeuse: usize,
    },

    /// A consistency check failed.
    #[error("invariant violated: {0}")]
    Invariant(String),
}

/// Result type for topology operations.
pub type Result<T> = std::result::Result<T, TopoError>;
