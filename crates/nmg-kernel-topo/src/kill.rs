//! Kill operations.
//!
//! Each kill removes one use and its mate, frees the underlying element
//! when that was its last use, and reports whether the immediate parent
//! is now empty. Kills never cascade upward on their own; the caller
//! decides what to do with an emptied parent.

use tracing::{debug, warn};

use crate::error::{Result, TopoError};
use crate::model::{
    remove_item, EdgeParent, EdgeUseId, FaceUseId, KillStatus, LoopContents, LoopParent,
    LoopUseId, Model, RegionId, ShellId, VertexParent, VertexUseId,
};

impl Model {
    /// Drop a vertex-use record and its vertex if that was the last use.
    /// The parent is not touched.
    pub(crate) fn free_vertexuse(&mut self, vu: VertexUseId) {
        let Some(rec) = self.vertexuses.remove(vu) else {
            return;
        };
        if let Some(vert) = self.vertices.get_mut(rec.vertex) {
            remove_item(&mut vert.uses, &vu);
            if vert.uses.is_empty() {
                self.vertices.remove(rec.vertex);
            }
        }
    }

    /// Take an edge-use pair out of its radial cycle.
    ///
    /// The neighbours on either side of the pair are linked to each other
    /// and the edge's representative use is moved off the pair. When the
    /// pair was the edge's only use, the edge itself is freed.
    pub(crate) fn unlink_radial_pair(&mut self, eu: EdgeUseId) -> Result<()> {
        let rec = self.edgeuse(eu)?;
        let (mate, r1, edge, index) = (rec.mate, rec.radial, rec.edge, rec.index);
        let r2 = self.edgeuse(mate)?.radial;

        if r1 == mate && r2 == eu {
            self.edges.remove(edge);
            return Ok(());
        }
        if self.edgeuse(r1)?.radial != eu || self.edgeuse(r2)?.radial != mate {
            return Err(TopoError::RadialBroken(index));
        }
        self.edgeuses[r1].radial = r2;
        self.edgeuses[r2].radial = r1;
        if let Some(e) = self.edges.get_mut(edge) {
            if e.edgeuse == eu || e.edgeuse == mate {
                e.edgeuse = r1;
            }
        }
        self.edgeuses[eu].radial = mate;
        self.edgeuses[mate].radial = eu;
        Ok(())
    }

    fn detach_edgeuse(&mut self, eu: EdgeUseId, parent: EdgeParent) {
        match parent {
            EdgeParent::Shell(s) => {
                if let Some(shell) = self.shells.get_mut(s) {
                    remove_item(&mut shell.edgeuses, &eu);
                }
            }
            EdgeParent::LoopUse(lu) => {
                if let Some(LoopContents::Edges(eus)) =
                    self.loopuses.get_mut(lu).map(|l| &mut l.contents)
                {
                    remove_item(eus, &eu);
                }
            }
        }
    }

    /// Kill a vertex-use.
    ///
    /// The vertex goes with its last use. A point-loop or edge-use parent
    /// is always left empty; a shell parent is empty when nothing else is
    /// in it.
    pub fn kill_vertex_use(&mut self, vu: VertexUseId) -> Result<KillStatus> {
        let parent = self.vertexuse(vu)?.parent;
        self.free_vertexuse(vu);
        match parent {
            VertexParent::Shell(s) => {
                let shell = self.shells.get_mut(s).ok_or(TopoError::Dead("shell"))?;
                if shell.vertexuse == Some(vu) {
                    shell.vertexuse = None;
                }
                Ok(KillStatus::from_empty(self.shell_is_empty(s)?))
            }
            VertexParent::LoopUse(lu) => {
                if let Some(rec) = self.loopuses.get_mut(lu) {
                    if rec.contents == LoopContents::Vertex(vu) {
                        rec.contents = LoopContents::Edges(Vec::new());
                    }
                }
                Ok(KillStatus::ParentNowEmpty)
            }
            VertexParent::EdgeUse(_) => Ok(KillStatus::ParentNowEmpty),
        }
    }

    /// Kill an edge-use and its mate.
    ///
    /// Re-threads the radial cycle around the pair, frees the edge with
    /// its last use, releases line geometry and both vertex-uses.
    /// Reports whether the loop or shell that held `eu` is now empty.
    pub fn kill_edge_use(&mut self, eu: EdgeUseId) -> Result<KillStatus> {
        let rec = self.edgeuse(eu)?;
        let (mate, parent, index) = (rec.mate, rec.parent, rec.index);
        let mate_rec = self.edgeuse(mate)?;
        if mate_rec.mate != eu {
            return Err(TopoError::MateMismatch {
                kind: "edge-use",
                index,
            });
        }
        let mate_parent = mate_rec.parent;

        self.unlink_radial_pair(eu)?;

        for e in [eu, mate] {
            let rec = &self.edgeuses[e];
            let (geom, vu) = (rec.geom, rec.vertexuse);
            if let Some(g) = geom {
                self.geometry.release_edge(g);
            }
            self.free_vertexuse(vu);
        }
        self.detach_edgeuse(eu, parent);
        self.detach_edgeuse(mate, mate_parent);
        self.edgeuses.remove(eu);
        self.edgeuses.remove(mate);

        let empty = match parent {
            EdgeParent::Shell(s) => self.shell_is_empty(s)?,
            EdgeParent::LoopUse(lu) => self.loopuse(lu)?.contents.is_empty(),
        };
        debug!(edgeuse = index, parent_empty = empty, "killed edge-use");
        Ok(KillStatus::from_empty(empty))
    }

    fn kill_loop_children(&mut self, lu: LoopUseId) -> Result<()> {
        let contents = std::mem::replace(
            &mut self.loopuses[lu].contents,
            LoopContents::Edges(Vec::new()),
        );
        match contents {
            LoopContents::Vertex(vu) => self.free_vertexuse(vu),
            LoopContents::Edges(eus) => {
                for eu in eus {
                    if self.edgeuses.contains_key(eu) {
                        self.kill_edge_use(eu)?;
                    }
                }
            }
        }
        Ok(())
    }

    fn detach_loopuse(&mut self, lu: LoopUseId, parent: LoopParent) {
        let list = match parent {
            LoopParent::Shell(s) => self.shells.get_mut(s).map(|s| &mut s.loopuses),
            LoopParent::FaceUse(fu) => self.faceuses.get_mut(fu).map(|f| &mut f.loopuses),
        };
        if let Some(list) = list {
            remove_item(list, &lu);
        }
    }

    /// Kill a loop-use, its mate, and everything in them.
    ///
    /// Reports whether the face-use or shell that held `lu` is now empty.
    pub fn kill_loop_use(&mut self, lu: LoopUseId) -> Result<KillStatus> {
        let rec = self.loopuse(lu)?;
        let (mate, parent, lp, index) = (rec.mate, rec.parent, rec.lp, rec.index);
        let mate_rec = self.loopuse(mate)?;
        if mate_rec.mate != lu {
            return Err(TopoError::MateMismatch {
                kind: "loop-use",
                index,
            });
        }
        let mate_parent = mate_rec.parent;

        self.kill_loop_children(lu)?;
        self.kill_loop_children(mate)?;
        self.detach_loopuse(lu, parent);
        self.detach_loopuse(mate, mate_parent);
        self.loops.remove(lp);
        self.loopuses.remove(lu);
        self.loopuses.remove(mate);

        let empty = match parent {
            LoopParent::Shell(s) => self.shell_is_empty(s)?,
            LoopParent::FaceUse(fu) => self.faceuse(fu)?.loopuses.is_empty(),
        };
        debug!(loopuse = index, parent_empty = empty, "killed loop-use");
        Ok(KillStatus::from_empty(empty))
    }

    /// Kill a face-use, its mate, their loops and the face.
    ///
    /// Face geometry is released (and freed with its last user). Reports
    /// whether the shell is now empty.
    pub fn kill_face_use(&mut self, fu: FaceUseId) -> Result<KillStatus> {
        let rec = self.faceuse(fu)?;
        let (mate, face, s, index) = (rec.mate, rec.face, rec.shell, rec.index);
        if self.faceuse(mate)?.mate != fu {
            return Err(TopoError::MateMismatch {
                kind: "face-use",
                index,
            });
        }

        for side in [fu, mate] {
            let lus = std::mem::take(&mut self.faceuses[side].loopuses);
            for lu in lus {
                if self.loopuses.contains_key(lu) {
                    self.kill_loop_use(lu)?;
                }
            }
        }
        if let Some(g) = self.faces.get(face).and_then(|f| f.geom) {
            self.geometry.release_face(g);
        }
        let shell = self.shells.get_mut(s).ok_or(TopoError::Dead("shell"))?;
        remove_item(&mut shell.faceuses, &fu);
        remove_item(&mut shell.faceuses, &mate);
        self.faces.remove(face);
        self.faceuses.remove(fu);
        self.faceuses.remove(mate);

        let empty = self.shell_is_empty(s)?;
        debug!(faceuse = index, shell_empty = empty, "killed face-use");
        Ok(KillStatus::from_empty(empty))
    }

    /// Kill a shell and everything in it. Reports whether its region is
    /// now empty.
    pub fn kill_shell(&mut self, s: ShellId) -> Result<KillStatus> {
        let r = self.shell(s)?.region;
        for fu in std::mem::take(&mut self.shells[s].faceuses) {
            if self.faceuses.contains_key(fu) {
                self.kill_face_use(fu)?;
            }
        }
        for lu in std::mem::take(&mut self.shells[s].loopuses) {
            if self.loopuses.contains_key(lu) {
                self.kill_loop_use(lu)?;
            }
        }
        for eu in std::mem::take(&mut self.shells[s].edgeuses) {
            if self.edgeuses.contains_key(eu) {
                self.kill_edge_use(eu)?;
            }
        }
        if let Some(vu) = self.shells[s].vertexuse.take() {
            self.free_vertexuse(vu);
        }
        self.shells.remove(s);
        let region = self.regions.get_mut(r).ok_or(TopoError::Dead("region"))?;
        remove_item(&mut region.shells, &s);
        Ok(KillStatus::from_empty(region.shells.is_empty()))
    }

    /// Kill a region and its shells. Reports whether the model is now
    /// empty; an empty model starts handing out indices from scratch.
    pub fn kill_region(&mut self, r: RegionId) -> Result<KillStatus> {
        self.region(r)?;
        for s in self.regions[r].shells.clone() {
            self.kill_shell(s)?;
        }
        self.regions.remove(r);
        let empty = self.regions.is_empty();
        if empty {
            self.reset_index();
        }
        Ok(KillStatus::from_empty(empty))
    }

    /// Destroy the model, region by region.
    pub fn kill_model(mut self) -> Result<()> {
        let regions: Vec<RegionId> = self.regions.keys().collect();
        for r in regions {
            self.kill_region(r)?;
        }
        Ok(())
    }

    /// Kill every edge-use pair in the shell whose two ends are the same
    /// vertex, then any loop or face left empty by that.
    ///
    /// Reports whether the shell is now empty.
    pub fn kill_zero_length_edges(&mut self, s: ShellId) -> Result<KillStatus> {
        let shell = self.shell(s)?;
        let mut candidates: Vec<EdgeUseId> = shell.edgeuses.clone();
        for &lu in &shell.loopuses {
            candidates.extend_from_slice(self.loopuses[lu].contents.edges());
        }
        for &fu in &shell.faceuses {
            for &lu in &self.faceuses[fu].loopuses {
                candidates.extend_from_slice(self.loopuses[lu].contents.edges());
            }
        }

        let mut killed = 0usize;
        for eu in candidates {
            let Some(rec) = self.edgeuses.get(eu) else {
                continue;
            };
            let parent = rec.parent;
            if self.eu_start(eu)? != self.eu_end(eu)? {
                continue;
            }
            killed += 1;
            if !self.kill_edge_use(eu)?.parent_empty() {
                continue;
            }
            if let EdgeParent::LoopUse(lu) = parent {
                let lparent = self.loopuse(lu)?.parent;
                if self.kill_loop_use(lu)?.parent_empty() {
                    if let LoopParent::FaceUse(fu) = lparent {
                        self.kill_face_use(fu)?;
                    }
                }
            }
        }
        if killed > 0 {
            warn!(shell = self.shells[s].index, killed, "removed zero length edges");
        }
        Ok(KillStatus::from_empty(self.shell_is_empty(s)?))
    }
}
