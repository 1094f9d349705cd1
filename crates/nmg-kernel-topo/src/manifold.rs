//! Local manifold degree of every face, edge and vertex.
//!
//! A face closed against other faces of its shell on every edge bounds a
//! solid; a face with a free edge is a dangling sheet. Edges and vertices
//! take the highest degree of anything using them, so an edge shared by a
//! solid and a wire is still a solid edge.

use tracing::debug;

use crate::error::Result;
use crate::model::{FaceUseId, LoopContents, Model, Orientation, ShellId, VertexId};

/// How many surface sheets meet locally at an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Manifold {
    /// An isolated point.
    Point = 0,
    /// Wire edges only.
    Wire = 1,
    /// A face with at least one free edge.
    Sheet = 2,
    /// A face closed on every edge.
    Solid = 3,
}

impl Manifold {
    /// Degree as a number.
    pub fn degree(self) -> u8 {
        self as u8
    }

    /// True for elements of a closed solid boundary.
    pub fn is_solid(self) -> bool {
        self == Manifold::Solid
    }
}

/// Manifold degree per element index.
#[derive(Debug, Clone, Default)]
pub struct ManifoldTable {
    degrees: Vec<Option<Manifold>>,
}

impl ManifoldTable {
    /// Degree of the element with this index, if it was classified.
    pub fn get(&self, index: usize) -> Option<Manifold> {
        self.degrees.get(index).copied().flatten()
    }

    fn raise(&mut self, index: usize, m: Manifold) {
        if index >= self.degrees.len() {
            self.degrees.resize(index + 1, None);
        }
        let slot = &mut self.degrees[index];
        *slot = Some(slot.map_or(m, |old| old.max(m)));
    }
}

impl Model {
    /// Classify every face, edge and vertex of the model.
    pub fn manifolds(&self) -> Result<ManifoldTable> {
        let mut table = ManifoldTable {
            degrees: vec![None; self.max_index()],
        };
        for s in self.shells.keys() {
            self.shell_manifolds(s, &mut table)?;
        }
        debug!(elements = table.degrees.iter().flatten().count(), "computed manifold table");
        Ok(table)
    }

    fn raise_vertex(&self, v: VertexId, m: Manifold, table: &mut ManifoldTable) -> Result<()> {
        table.raise(self.vertex(v)?.index, m);
        Ok(())
    }

    fn face_is_closed(&self, fu: FaceUseId, s: ShellId) -> Result<bool> {
        let face = self.faceuse(fu)?.face;
        for eu in self.edgeuses_of_faceuse(fu)? {
            let mut closed = false;
            for other in self.radial_uses(self.edgeuse(eu)?.edge)? {
                if let Some(ofu) = self.faceuse_of_edgeuse(other)? {
                    let rec = self.faceuse(ofu)?;
                    if rec.face != face && rec.shell == s {
                        closed = true;
                        break;
                    }
                }
            }
            if !closed {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn shell_manifolds(&self, s: ShellId, table: &mut ManifoldTable) -> Result<()> {
        let shell = self.shell(s)?;
        if let Some(vu) = shell.vertexuse {
            self.raise_vertex(self.vertexuse(vu)?.vertex, Manifold::Point, table)?;
        }
        for &eu in &shell.edgeuses {
            table.raise(self.edge(self.edgeuse(eu)?.edge)?.index, Manifold::Wire);
            self.raise_vertex(self.eu_start(eu)?, Manifold::Wire, table)?;
        }
        for &lu in &shell.loopuses {
            match &self.loopuse(lu)?.contents {
                LoopContents::Vertex(vu) => {
                    self.raise_vertex(self.vertexuse(*vu)?.vertex, Manifold::Point, table)?;
                }
                LoopContents::Edges(eus) => {
                    for &eu in eus {
                        table.raise(self.edge(self.edgeuse(eu)?.edge)?.index, Manifold::Wire);
                        self.raise_vertex(self.eu_start(eu)?, Manifold::Wire, table)?;
                    }
                }
            }
        }

        for &fu in &shell.faceuses {
            let rec = self.faceuse(fu)?;
            if rec.orientation != Orientation::Same {
                continue;
            }
            let degree = if self.face_is_closed(fu, s)? {
                Manifold::Solid
            } else {
                Manifold::Sheet
            };
            table.raise(self.face(rec.face)?.index, degree);
            table.raise(rec.index, degree);
            table.raise(self.faceuse(rec.mate)?.index, degree);
            for &lu in &rec.loopuses {
                match &self.loopuse(lu)?.contents {
                    LoopContents::Vertex(vu) => {
                        self.raise_vertex(self.vertexuse(*vu)?.vertex, degree, table)?;
                    }
                    LoopContents::Edges(eus) => {
                        for &eu in eus {
                            table.raise(self.edge(self.edgeuse(eu)?.edge)?.index, degree);
                            self.raise_vertex(self.eu_start(eu)?, degree, table)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
