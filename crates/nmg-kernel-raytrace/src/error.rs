//! Error types for ray classification.

use nmg_kernel_topo::TopoError;
use thiserror::Error;

/// Errors that can occur while shooting a ray.
#[derive(Error, Debug)]
pub enum RaytraceError {
    /// Invalid shot settings.
    #[error("invalid settings: {0}")]
    InvalidSettings(String),

    /// The model's topology is inconsistent.
    #[error(transparent)]
    Topo(#[from] TopoError),

    /// A solid face was hit with the ray running along its surface.
    #[error("face #{0} hit with the ray perpendicular to its normal")]
    PerpendicularHit(usize),

    /// The hit list ran out with a segment still open.
    #[error("segment still open at end of ray after {hits} hits")]
    OpenSegment {
        /// Number of hits on the ray.
        hits: usize,
    },

    /// A hit did not fit the in/out state of the ray.
    #[error("bad transition at element #{index} (distance {dist}): {reason}")]
    BadTransition {
        /// Index of the element that was hit.
        index: usize,
        /// Distance along the ray.
        dist: f64,
        /// What went wrong.
        reason: &'static str,
    },

    /// An edge was hit but has no line geometry.
    #[error("edge #{0} was hit but has no geometry")]
    EdgeGeometry(usize),
}

/// Result type for ray classification.
pub type Result<T> = std::result::Result<T, RaytraceError>;
