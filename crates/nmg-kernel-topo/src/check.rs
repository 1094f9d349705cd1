//! Whole-model consistency check.
//!
//! Walks every region down to every vertex-use and verifies that up and
//! down links agree, that mates are symmetric and share their element,
//! that loops chain head to tail, and that every radial cycle closes.
//! A separate check tells whether the faces of a shell close up into a
//! surface with no free edges.

use crate::error::{Result, TopoError};
use crate::model::{
    EdgeParent, EdgeUseId, FaceUseId, LoopContents, LoopParent, LoopUseId, Model, Orientation,
    RegionId, ShellId, VertexParent, VertexUseId,
};

fn fail<T>(msg: String) -> Result<T> {
    Err(TopoError::Invariant(msg))
}

impl Model {
    /// Verify the structural invariants of the whole model. The first
    /// violation found is returned as an error.
    pub fn check(&self) -> Result<()> {
        for (r, region) in &self.regions {
            for &s in &region.shells {
                if self.shell(s)?.region != r {
                    return fail(format!(
                        "shell #{} listed in region #{} points elsewhere",
                        self.shells[s].index, region.index
                    ));
                }
                self.check_shell(s)?;
            }
        }
        for (v, vert) in &self.vertices {
            if vert.uses.is_empty() {
                return fail(format!("vertex #{} has no uses", vert.index));
            }
            for &vu in &vert.uses {
                if self.vertexuse(vu)?.vertex != v {
                    return fail(format!(
                        "vertex-use #{} listed on vertex #{} points elsewhere",
                        self.vertexuses[vu].index, vert.index
                    ));
                }
            }
        }
        for (e, edge) in &self.edges {
            for eu in self.radial_uses(e)? {
                if self.edgeuses[eu].edge != e {
                    return fail(format!(
                        "edge-use #{} in radial cycle of edge #{} belongs to another edge",
                        self.edgeuses[eu].index, edge.index
                    ));
                }
            }
        }
        Ok(())
    }

    /// Verify that the faces of shell `s` close up.
    ///
    /// Around every edge of every face, the outward uses of the shell's
    /// faces must run as often in one direction as in the other. A free
    /// edge, or a face turned the wrong way relative to its neighbours,
    /// breaks the balance.
    pub fn check_closed_surface(&self, s: ShellId) -> Result<()> {
        let shell = self.shell(s)?;
        for &fu in &shell.faceuses {
            if self.faceuse(fu)?.orientation != Orientation::Same {
                continue;
            }
            for eu in self.edgeuses_of_faceuse(fu)? {
                let a = self.eu_start(eu)?;
                if a == self.eu_end(eu)? {
                    continue;
                }
                let mut balance = 0i32;
                for other in self.radial_uses(self.edgeuse(eu)?.edge)? {
                    let Some(ofu) = self.faceuse_of_edgeuse(other)? else {
                        continue;
                    };
                    let rec = self.faceuse(ofu)?;
                    if rec.shell != s || rec.orientation != Orientation::Same {
                        continue;
                    }
                    balance += if self.eu_start(other)? == a { 1 } else { -1 };
                }
                if balance != 0 {
                    return Err(TopoError::OpenSurface {
                        shell: shell.index,
                        edgeuse: self.edgeuses[eu].index,
                    });
                }
            }
        }
        Ok(())
    }

    /// [`Model::check_closed_surface`] for every shell of a region.
    pub fn check_closed_region(&self, r: RegionId) -> Result<()> {
        for &s in &self.region(r)?.shells {
            self.check_closed_surface(s)?;
        }
        Ok(())
    }

    fn check_shell(&self, s: ShellId) -> Result<()> {
        let shell = self.shell(s)?;
        for &fu in &shell.faceuses {
            self.check_faceuse(fu, s)?;
        }
        for &lu in &shell.loopuses {
            self.check_loopuse(lu, LoopParent::Shell(s), LoopParent::Shell(s))?;
        }
        for &eu in &shell.edgeuses {
            self.check_edgeuse(eu, EdgeParent::Shell(s), EdgeParent::Shell(s))?;
        }
        if let Some(vu) = shell.vertexuse {
            self.check_vertexuse(vu, VertexParent::Shell(s))?;
        }
        Ok(())
    }

    fn check_faceuse(&self, fu: FaceUseId, s: ShellId) -> Result<()> {
        let rec = self.faceuse(fu)?;
        if rec.shell != s {
            return fail(format!("face-use #{} has the wrong shell", rec.index));
        }
        let mate = self.faceuse(rec.mate)?;
        if mate.mate != fu || mate.face != rec.face || mate.shell != s {
            return Err(TopoError::MateMismatch {
                kind: "face-use",
                index: rec.index,
            });
        }
        let sides_ok = matches!(
            (rec.orientation, mate.orientation),
            (Orientation::Same, Orientation::Opposite) | (Orientation::Opposite, Orientation::Same)
        );
        if !sides_ok {
            return fail(format!(
                "face-use #{} and its mate are not opposite sides",
                rec.index
            ));
        }
        let face = self.face(rec.face)?;
        if face.faceuse != fu && face.faceuse != rec.mate {
            return fail(format!("face #{} does not point at its uses", face.index));
        }
        for &lu in &rec.loopuses {
            self.check_loopuse(lu, LoopParent::FaceUse(fu), LoopParent::FaceUse(rec.mate))?;
        }
        Ok(())
    }

    fn check_loopuse(&self, lu: LoopUseId, parent: LoopParent, mate_parent: LoopParent) -> Result<()> {
        let rec = self.loopuse(lu)?;
        if rec.parent != parent {
            return Err(TopoError::WrongParent {
                kind: "loop-use",
                index: rec.index,
                expected: "listing parent",
            });
        }
        let mate = self.loopuse(rec.mate)?;
        if mate.mate != lu || mate.lp != rec.lp || mate.parent != mate_parent {
            return Err(TopoError::MateMismatch {
                kind: "loop-use",
                index: rec.index,
            });
        }
        match &rec.contents {
            LoopContents::Vertex(vu) => {
                if mate.contents.vertex().is_none() {
                    return fail(format!("point-loop #{} has a mate with edges", rec.index));
                }
                self.check_vertexuse(*vu, VertexParent::LoopUse(lu))
            }
            LoopContents::Edges(eus) => {
                if eus.is_empty() {
                    return fail(format!("loop-use #{} is empty", rec.index));
                }
                for (i, &eu) in eus.iter().enumerate() {
                    self.check_edgeuse(eu, EdgeParent::LoopUse(lu), EdgeParent::LoopUse(rec.mate))?;
                    let next = eus[(i + 1) % eus.len()];
                    if self.eu_end(eu)? != self.eu_start(next)? {
                        return fail(format!(
                            "loop-use #{}: edge-use #{} does not end where the next begins",
                            rec.index, self.edgeuses[eu].index
                        ));
                    }
                }
                Ok(())
            }
        }
    }

    fn check_edgeuse(&self, eu: EdgeUseId, parent: EdgeParent, mate_parent: EdgeParent) -> Result<()> {
        let rec = self.edgeuse(eu)?;
        if rec.parent != parent {
            return Err(TopoError::WrongParent {
                kind: "edge-use",
                index: rec.index,
                expected: "listing parent",
            });
        }
        let mate = self.edgeuse(rec.mate)?;
        if mate.mate != eu || mate.edge != rec.edge || mate.parent != mate_parent {
            return Err(TopoError::MateMismatch {
                kind: "edge-use",
                index: rec.index,
            });
        }
        if self.eu_end(eu)? != self.eu_start(rec.mate)? {
            return fail(format!("edge-use #{} and its mate disagree on ends", rec.index));
        }
        let radial = self.edgeuse(rec.radial)?;
        if radial.radial != eu || radial.edge != rec.edge {
            return Err(TopoError::RadialBroken(rec.index));
        }
        self.edge(rec.edge)?;
        self.check_vertexuse(rec.vertexuse, VertexParent::EdgeUse(eu))
    }

    fn check_vertexuse(&self, vu: VertexUseId, parent: VertexParent) -> Result<()> {
        let rec = self.vertexuse(vu)?;
        if rec.parent != parent {
            return Err(TopoError::WrongParent {
                kind: "vertex-use",
                index: rec.index,
                expected: "listing parent",
            });
        }
        if !self.vertex(rec.vertex)?.uses.contains(&vu) {
            return fail(format!(
                "vertex-use #{} is missing from its vertex's use list",
                rec.index
            ));
        }
        Ok(())
    }
}
