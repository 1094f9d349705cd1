//! Read-only queries over the model.

use nmg_kernel_geom::{FaceSurface, PlaneEq};
use nmg_kernel_math::{Dir3, Tolerance, Vec3};

use crate::error::{Result, TopoError};
use crate::model::{
    EdgeId, EdgeParent, EdgeUseId, FaceId, FaceUseId, LoopContents, LoopParent, LoopUseId, Model,
    Orientation, ShellId, VertexId, VertexParent, VertexUseId,
};

impl Model {
    // =========================================================================
    // Parent lookups
    // =========================================================================

    /// Shell owning a face-use.
    pub fn shell_of_faceuse(&self, fu: FaceUseId) -> Result<ShellId> {
        Ok(self.faceuse(fu)?.shell)
    }

    /// Shell owning a loop-use, directly or through its face-use.
    pub fn shell_of_loopuse(&self, lu: LoopUseId) -> Result<ShellId> {
        match self.loopuse(lu)?.parent {
            LoopParent::Shell(s) => Ok(s),
            LoopParent::FaceUse(fu) => self.shell_of_faceuse(fu),
        }
    }

    /// Shell owning an edge-use.
    pub fn shell_of_edgeuse(&self, eu: EdgeUseId) -> Result<ShellId> {
        match self.edgeuse(eu)?.parent {
            EdgeParent::Shell(s) => Ok(s),
            EdgeParent::LoopUse(lu) => self.shell_of_loopuse(lu),
        }
    }

    /// Shell owning a vertex-use.
    pub fn shell_of_vertexuse(&self, vu: VertexUseId) -> Result<ShellId> {
        match self.vertexuse(vu)?.parent {
            VertexParent::Shell(s) => Ok(s),
            VertexParent::LoopUse(lu) => self.shell_of_loopuse(lu),
            VertexParent::EdgeUse(eu) => self.shell_of_edgeuse(eu),
        }
    }

    /// Face-use owning a loop-use, if it is not a wire loop.
    pub fn faceuse_of_loopuse(&self, lu: LoopUseId) -> Result<Option<FaceUseId>> {
        Ok(match self.loopuse(lu)?.parent {
            LoopParent::FaceUse(fu) => Some(fu),
            LoopParent::Shell(_) => None,
        })
    }

    /// Loop-use owning an edge-use, if it is not a wire edge.
    pub fn loopuse_of_edgeuse(&self, eu: EdgeUseId) -> Result<Option<LoopUseId>> {
        Ok(match self.edgeuse(eu)?.parent {
            EdgeParent::LoopUse(lu) => Some(lu),
            EdgeParent::Shell(_) => None,
        })
    }

    /// Face-use an edge-use bounds, if any.
    pub fn faceuse_of_edgeuse(&self, eu: EdgeUseId) -> Result<Option<FaceUseId>> {
        match self.loopuse_of_edgeuse(eu)? {
            Some(lu) => self.faceuse_of_loopuse(lu),
            None => Ok(None),
        }
    }

    // =========================================================================
    // Loops and edges
    // =========================================================================

    /// Vertices of a loop in traversal order (the start of each edge-use).
    pub fn loop_vertices(&self, lu: LoopUseId) -> Result<Vec<VertexId>> {
        match &self.loopuse(lu)?.contents {
            LoopContents::Vertex(vu) => Ok(vec![self.vertexuse(*vu)?.vertex]),
            LoopContents::Edges(eus) => eus.iter().map(|eu| self.eu_start(*eu)).collect(),
        }
    }

    fn loop_neighbour(&self, eu: EdgeUseId, step: isize) -> Result<EdgeUseId> {
        let rec = self.edgeuse(eu)?;
        let lu = match rec.parent {
            EdgeParent::LoopUse(lu) => lu,
            EdgeParent::Shell(_) => {
                return Err(TopoError::WrongParent {
                    kind: "edge-use",
                    index: rec.index,
                    expected: "loop-use",
                })
            }
        };
        let eus = self.loopuse(lu)?.contents.edges();
        let pos = eus
            .iter()
            .position(|e| *e == eu)
            .ok_or_else(|| {
                TopoError::Invariant(format!(
                    "edge-use #{} is not listed in its loop-use",
                    rec.index
                ))
            })?;
        let n = eus.len() as isize;
        Ok(eus[(pos as isize + step).rem_euclid(n) as usize])
    }

    /// The edge-use after `eu` in its loop.
    pub fn next_in_loop(&self, eu: EdgeUseId) -> Result<EdgeUseId> {
        self.loop_neighbour(eu, 1)
    }

    /// The edge-use before `eu` in its loop.
    pub fn prev_in_loop(&self, eu: EdgeUseId) -> Result<EdgeUseId> {
        self.loop_neighbour(eu, -1)
    }

    /// Every use of an edge, walking mate then radial from the
    /// representative use.
    pub fn radial_uses(&self, e: EdgeId) -> Result<Vec<EdgeUseId>> {
        let start = self.edge(e)?.edgeuse;
        let limit = self.edgeuses.len();
        let mut uses = Vec::new();
        let mut cur = start;
        loop {
            let rec = self.edgeuse(cur)?;
            uses.push(cur);
            uses.push(rec.mate);
            cur = self.edgeuse(rec.mate)?.radial;
            if cur == start {
                return Ok(uses);
            }
            if uses.len() > limit {
                return Err(TopoError::RadialBroken(rec.index));
            }
        }
    }

    /// Vector from the start to the end of an edge-use.
    pub fn edgeuse_vector(&self, eu: EdgeUseId) -> Result<Vec3> {
        let a = self.vertex_point(self.eu_start(eu)?)?;
        let b = self.vertex_point(self.eu_end(eu)?)?;
        Ok(b - a)
    }

    /// Edge-uses starting at `v`.
    pub fn edgeuses_from_vertex(&self, v: VertexId) -> Result<Vec<EdgeUseId>> {
        let mut out = Vec::new();
        for vu in &self.vertex(v)?.uses {
            if let VertexParent::EdgeUse(eu) = self.vertexuse(*vu)?.parent {
                out.push(eu);
            }
        }
        Ok(out)
    }

    /// Edge-uses of every loop of a face-use.
    pub fn edgeuses_of_faceuse(&self, fu: FaceUseId) -> Result<Vec<EdgeUseId>> {
        let mut out = Vec::new();
        for lu in &self.faceuse(fu)?.loopuses {
            out.extend_from_slice(self.loopuse(*lu)?.contents.edges());
        }
        Ok(out)
    }

    // =========================================================================
    // Vertices
    // =========================================================================

    /// True when `v` already has a point-loop directly in shell `s`.
    pub fn is_vertex_selfloop_in_shell(&self, v: VertexId, s: ShellId) -> Result<bool> {
        for vu in &self.vertex(v)?.uses {
            if let VertexParent::LoopUse(lu) = self.vertexuse(*vu)?.parent {
                if self.loopuse(lu)?.parent == LoopParent::Shell(s) {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }

    /// Face-uses touching `v`, each listed once, in vertex-use order.
    pub fn faceuses_at_vertex(&self, v: VertexId) -> Result<Vec<FaceUseId>> {
        let mut out = Vec::new();
        for vu in &self.vertex(v)?.uses {
            let fu = match self.vertexuse(*vu)?.parent {
                VertexParent::EdgeUse(eu) => self.faceuse_of_edgeuse(eu)?,
                VertexParent::LoopUse(lu) => self.faceuse_of_loopuse(lu)?,
                VertexParent::Shell(_) => None,
            };
            if let Some(fu) = fu {
                if !out.contains(&fu) {
                    out.push(fu);
                }
            }
        }
        Ok(out)
    }

    // =========================================================================
    // Face geometry
    // =========================================================================

    /// The plane stored for a face, with the face's flip flag applied.
    pub fn face_plane(&self, f: FaceId) -> Result<PlaneEq> {
        let face = self.face(f)?;
        let missing = TopoError::MissingGeometry {
            kind: "face",
            index: face.index,
        };
        let plane = face
            .geom
            .and_then(|g| self.geometry.face(g))
            .and_then(FaceSurface::as_plane)
            .ok_or(missing)?;
        Ok(if face.flip { plane.flipped() } else { *plane })
    }

    /// The plane of a face as seen from one of its uses.
    pub fn faceuse_plane(&self, fu: FaceUseId) -> Result<PlaneEq> {
        let rec = self.faceuse(fu)?;
        let plane = self.face_plane(rec.face)?;
        Ok(if rec.orientation == Orientation::Opposite {
            plane.flipped()
        } else {
            plane
        })
    }

    /// Outward normal of a face.
    pub fn face_normal(&self, f: FaceId) -> Result<Dir3> {
        Ok(self.face_plane(f)?.normal)
    }

    /// Outward normal of a face-use.
    pub fn faceuse_normal(&self, fu: FaceUseId) -> Result<Dir3> {
        Ok(self.faceuse_plane(fu)?.normal)
    }

    /// Unit vector in the face plane, perpendicular to `eu`, pointing into
    /// the face material bounded by `eu`'s loop.
    pub fn left_vector(&self, eu: EdgeUseId, tol: &Tolerance) -> Result<Vec3> {
        let index = self.edgeuse(eu)?.index;
        let fu = self.faceuse_of_edgeuse(eu)?.ok_or(TopoError::WrongParent {
            kind: "edge-use",
            index,
            expected: "face loop",
        })?;
        let n = self.faceuse_normal(fu)?;
        self.left_vector_with_normal(eu, &n, tol)
    }

    /// [`Model::left_vector`] for a caller that already has the normal.
    ///
    /// Falls back to the chord from the previous edge's start to the next
    /// edge's end when the edge itself is parallel to the normal.
    pub fn left_vector_with_normal(&self, eu: EdgeUseId, n: &Dir3, tol: &Tolerance) -> Result<Vec3> {
        let left = n.cross(&self.edgeuse_vector(eu)?);
        if left.norm() > tol.linear {
            return Ok(left.normalize());
        }
        let prev = self.prev_in_loop(eu)?;
        let next = self.next_in_loop(eu)?;
        let chord = self.vertex_point(self.eu_end(next)?)? - self.vertex_point(self.eu_start(prev)?)?;
        let left = n.cross(&chord);
        if left.norm() > tol.linear {
            return Ok(left.normalize());
        }
        Err(TopoError::Invariant(format!(
            "edge-use #{}: no left vector, edge and neighbours are parallel to the face normal",
            self.edgeuses[eu].index
        )))
    }
}
