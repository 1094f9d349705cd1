//! Gluing separately built faces into one shell surface.

use std::collections::HashMap;

use tracing::debug;

use crate::error::Result;
use crate::model::{EdgeUseId, FaceUseId, Model, VertexId};

impl Model {
    /// Join every pair of edge-uses of these faces that run between the
    /// same two vertices into one radial cycle.
    ///
    /// The first edge-use seen for a vertex pair anchors the cycle; later
    /// ones are spliced in with [`Model::join_edge_into`]. Returns the
    /// number of joins made.
    pub fn glue_faces(&mut self, faceuses: &[FaceUseId]) -> Result<usize> {
        let mut seen: HashMap<(VertexId, VertexId), EdgeUseId> = HashMap::new();
        let mut joins = 0;
        for &fu in faceuses {
            for eu in self.edgeuses_of_faceuse(fu)? {
                let (a, b) = (self.eu_start(eu)?, self.eu_end(eu)?);
                if a == b {
                    continue;
                }
                let key = if a < b { (a, b) } else { (b, a) };
                match seen.get(&key) {
                    Some(&anchor) => {
                        if self.edgeuse(anchor)?.edge != self.edgeuse(eu)?.edge {
                            self.join_edge_into(anchor, eu)?;
                            joins += 1;
                        }
                    }
                    None => {
                        seen.insert(key, eu);
                    }
                }
            }
        }
        debug!(faces = faceuses.len(), joins, "glued faces");
        Ok(joins)
    }
}
