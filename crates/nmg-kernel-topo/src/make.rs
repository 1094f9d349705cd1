//! Make operations.
//!
//! Each operation produces a legally non-empty structure: a new shell
//! always carries a lone vertex, a new loop always carries a vertex or
//! edges, and a new edge always has both endpoint uses.

use tracing::debug;

use crate::error::{Result, TopoError};
use crate::model::{
    remove_item, Edge, EdgeParent, EdgeUse, EdgeUseId, Face, FaceUse, FaceUseId, Loop,
    LoopContents, LoopParent, LoopUse, LoopUseId, Model, Orientation, Region, RegionId, Shell,
    ShellId, Vertex, VertexId, VertexParent, VertexUse, VertexUseId,
};

impl Model {
    // =========================================================================
    // Internal constructors
    // =========================================================================

    pub(crate) fn new_vertex(&mut self) -> VertexId {
        let index = self.next_index();
        self.vertices.insert(Vertex {
            uses: Vec::new(),
            coord: None,
            index,
        })
    }

    pub(crate) fn new_vertexuse(&mut self, v: VertexId, parent: VertexParent) -> VertexUseId {
        let index = self.next_index();
        let vu = self.vertexuses.insert(VertexUse {
            parent,
            vertex: v,
            index,
        });
        self.vertices[v].uses.push(vu);
        vu
    }

    /// Edge plus a mated, mutually radial pair of uses. Vertex-uses are
    /// left for the caller to fill in.
    pub(crate) fn new_edge_pair(&mut self, p1: EdgeParent, p2: EdgeParent) -> (EdgeUseId, EdgeUseId) {
        let e_index = self.next_index();
        let e = self.edges.insert(Edge {
            edgeuse: EdgeUseId::default(),
            index: e_index,
        });
        let i1 = self.next_index();
        let eu1 = self.edgeuses.insert(EdgeUse {
            parent: p1,
            mate: EdgeUseId::default(),
            radial: EdgeUseId::default(),
            edge: e,
            vertexuse: VertexUseId::default(),
            geom: None,
            index: i1,
        });
        let i2 = self.next_index();
        let eu2 = self.edgeuses.insert(EdgeUse {
            parent: p2,
            mate: eu1,
            radial: eu1,
            edge: e,
            vertexuse: VertexUseId::default(),
            geom: None,
            index: i2,
        });
        let rec = &mut self.edgeuses[eu1];
        rec.mate = eu2;
        rec.radial = eu2;
        self.edges[e].edgeuse = eu1;
        (eu1, eu2)
    }

    /// Loop plus a mated pair of uses with empty contents.
    pub(crate) fn new_loop_pair(
        &mut self,
        p1: LoopParent,
        p2: LoopParent,
        orientation: Orientation,
    ) -> (LoopUseId, LoopUseId) {
        let l_index = self.next_index();
        let lp = self.loops.insert(Loop {
            loopuse: LoopUseId::default(),
            bbox: None,
            index: l_index,
        });
        let i1 = self.next_index();
        let lu1 = self.loopuses.insert(LoopUse {
            parent: p1,
            mate: LoopUseId::default(),
            lp,
            orientation,
            contents: LoopContents::Edges(Vec::new()),
            index: i1,
        });
        let i2 = self.next_index();
        let lu2 = self.loopuses.insert(LoopUse {
            parent: p2,
            mate: lu1,
            lp,
            orientation,
            contents: LoopContents::Edges(Vec::new()),
            index: i2,
        });
        self.loopuses[lu1].mate = lu2;
        self.loops[lp].loopuse = lu1;
        (lu1, lu2)
    }

    fn insert_shell_with_vertex(&mut self, r: RegionId) -> ShellId {
        let index = self.next_index();
        let s = self.shells.insert(Shell {
            region: r,
            faceuses: Vec::new(),
            loopuses: Vec::new(),
            edgeuses: Vec::new(),
            vertexuse: None,
            bbox: None,
            index,
        });
        let v = self.new_vertex();
        let vu = self.new_vertexuse(v, VertexParent::Shell(s));
        self.shells[s].vertexuse = Some(vu);
        self.regions[r].shells.push(s);
        s
    }

    // =========================================================================
    // Public make operations
    // =========================================================================

    /// Make a region holding one shell holding one lone vertex.
    pub fn make_region_shell_vertex(&mut self) -> (RegionId, ShellId) {
        let index = self.next_index();
        let r = self.regions.insert(Region {
            shells: Vec::new(),
            bbox: None,
            index,
        });
        let s = self.insert_shell_with_vertex(r);
        debug!(region = index, "made region");
        (r, s)
    }

    /// Make a new shell with a lone vertex in an existing region.
    pub fn make_shell_vertex(&mut self, r: RegionId) -> Result<ShellId> {
        self.region(r)?;
        Ok(self.insert_shell_with_vertex(r))
    }

    /// Make a mated pair of point-loops under a face-use (and its mate) or
    /// a shell.
    ///
    /// A shell's lone vertex-use is consumed rather than duplicated; if `v`
    /// is given the stolen use is moved onto it. Otherwise `v` (or a fresh
    /// vertex) gets a new use. Returns the loop-use under `parent`.
    pub fn make_loop(
        &mut self,
        parent: LoopParent,
        v: Option<VertexId>,
        orientation: Orientation,
    ) -> Result<LoopUseId> {
        if let Some(v) = v {
            self.vertex(v)?;
        }
        let mate_parent = match parent {
            LoopParent::Shell(s) => {
                self.shell(s)?;
                parent
            }
            LoopParent::FaceUse(fu) => LoopParent::FaceUse(self.faceuse(fu)?.mate),
        };

        let (lu1, lu2) = self.new_loop_pair(parent, mate_parent, orientation);

        let stolen = match parent {
            LoopParent::Shell(s) => self.shells[s].vertexuse.take(),
            LoopParent::FaceUse(_) => None,
        };
        let vu1 = match stolen {
            Some(vu) => {
                self.vertexuses[vu].parent = VertexParent::LoopUse(lu1);
                if let Some(v) = v {
                    self.move_vertex_use(vu, v)?;
                }
                vu
            }
            None => {
                let v = match v {
                    Some(v) => v,
                    None => self.new_vertex(),
                };
                self.new_vertexuse(v, VertexParent::LoopUse(lu1))
            }
        };
        let vertex = self.vertexuses[vu1].vertex;
        let vu2 = self.new_vertexuse(vertex, VertexParent::LoopUse(lu2));
        self.loopuses[lu1].contents = LoopContents::Vertex(vu1);
        self.loopuses[lu2].contents = LoopContents::Vertex(vu2);

        for (p, l) in [(parent, lu1), (mate_parent, lu2)] {
            match p {
                LoopParent::Shell(s) => self.shells[s].loopuses.push(l),
                LoopParent::FaceUse(fu) => self.faceuses[fu].loopuses.push(l),
            }
        }
        debug!(loopuse = self.loopuses[lu1].index, ?orientation, "made point-loop");
        Ok(lu1)
    }

    /// Make a wire edge in shell `s` from `v1` to `v2`.
    ///
    /// A missing endpoint reuses the shell's lone vertex if there is one,
    /// otherwise gets a fresh vertex. The lone-vertex slot is always empty
    /// afterwards. Returns the use running from `v1` to `v2`.
    pub fn make_edge(
        &mut self,
        v1: Option<VertexId>,
        v2: Option<VertexId>,
        s: ShellId,
    ) -> Result<EdgeUseId> {
        self.shell(s)?;
        for v in [v1, v2].into_iter().flatten() {
            self.vertex(v)?;
        }

        let (eu1, eu2) = self.new_edge_pair(EdgeParent::Shell(s), EdgeParent::Shell(s));
        let mut lone = self.shells[s].vertexuse.take();

        let mut ends = [VertexUseId::default(); 2];
        for (slot, (eu, v)) in [(eu1, v1), (eu2, v2)].into_iter().enumerate() {
            let parent = VertexParent::EdgeUse(eu);
            ends[slot] = match (v, lone.take()) {
                (Some(v), stolen) => {
                    lone = stolen;
                    self.new_vertexuse(v, parent)
                }
                (None, Some(vu)) => {
                    self.vertexuses[vu].parent = parent;
                    vu
                }
                (None, None) => {
                    let v = self.new_vertex();
                    self.new_vertexuse(v, parent)
                }
            };
        }
        self.edgeuses[eu1].vertexuse = ends[0];
        self.edgeuses[eu2].vertexuse = ends[1];

        if let Some(vu) = lone {
            self.free_vertexuse(vu);
        }
        let shell = &mut self.shells[s];
        shell.edgeuses.push(eu1);
        shell.edgeuses.push(eu2);
        Ok(eu1)
    }

    /// Turn a shell's lone vertex or a point-loop into a zero-length edge
    /// starting and ending at that vertex.
    pub fn make_edge_on_vertex_use(&mut self, vu: VertexUseId) -> Result<EdgeUseId> {
        let rec = self.vertexuse(vu)?;
        let (parent, vertex, index) = (rec.parent, rec.vertex, rec.index);
        match parent {
            VertexParent::Shell(s) => {
                if self.shell(s)?.vertexuse != Some(vu) {
                    return Err(TopoError::Invariant(format!(
                        "vertex-use #{index} claims shell parent but is not its lone vertex"
                    )));
                }
                let (eu1, eu2) = self.new_edge_pair(EdgeParent::Shell(s), EdgeParent::Shell(s));
                self.shells[s].vertexuse = None;
                self.vertexuses[vu].parent = VertexParent::EdgeUse(eu1);
                let vu2 = self.new_vertexuse(vertex, VertexParent::EdgeUse(eu2));
                self.edgeuses[eu1].vertexuse = vu;
                self.edgeuses[eu2].vertexuse = vu2;
                let shell = &mut self.shells[s];
                shell.edgeuses.push(eu1);
                shell.edgeuses.push(eu2);
                Ok(eu1)
            }
            VertexParent::LoopUse(lu) => {
                let lu_mate = self.loopuse(lu)?.mate;
                let vu_mate = self
                    .loopuse(lu_mate)?
                    .contents
                    .vertex()
                    .ok_or_else(|| {
                        TopoError::Invariant(format!(
                            "loop-use #{} is a point-loop but its mate is not",
                            self.loopuses[lu].index
                        ))
                    })?;
                let (eu1, eu2) =
                    self.new_edge_pair(EdgeParent::LoopUse(lu), EdgeParent::LoopUse(lu_mate));
                self.vertexuses[vu].parent = VertexParent::EdgeUse(eu1);
                self.vertexuses[vu_mate].parent = VertexParent::EdgeUse(eu2);
                self.edgeuses[eu1].vertexuse = vu;
                self.edgeuses[eu2].vertexuse = vu_mate;
                self.loopuses[lu].contents = LoopContents::Edges(vec![eu1]);
                self.loopuses[lu_mate].contents = LoopContents::Edges(vec![eu2]);
                Ok(eu1)
            }
            VertexParent::EdgeUse(_) => Err(TopoError::WrongParent {
                kind: "vertex-use",
                index,
                expected: "shell or point-loop",
            }),
        }
    }

    /// Gather a head-to-tail run of the shell's wire edges into a mated
    /// pair of wire loops.
    ///
    /// The run starts at the first wire edge-use and keeps taking the next
    /// one in the shell's list (or its mate) while it starts where the run
    /// ends, stopping once the run closes. A shell holding only its lone
    /// vertex gets a point-loop instead.
    pub fn make_loop_from_wire_edges(&mut self, s: ShellId) -> Result<LoopUseId> {
        let shell = self.shell(s)?;
        let shell_index = shell.index;
        if shell.edgeuses.is_empty() {
            if shell.vertexuse.is_some() {
                return self.make_loop(LoopParent::Shell(s), None, Orientation::Unspecified);
            }
            return Err(TopoError::NoWireEdges(shell_index));
        }

        // Plan the run before touching anything.
        let mut pool = shell.edgeuses.clone();
        let mut run = Vec::new();
        let first = pool[0];
        let start_v = self.eu_start(first)?;
        let mut end_v = start_v;
        let mut next = Some(first);
        while let Some(eu) = next {
            let mate = self.edgeuse(eu)?.mate;
            if !remove_item(&mut pool, &eu) || !remove_item(&mut pool, &mate) {
                return Err(TopoError::Invariant(format!(
                    "wire edge-use #{} and its mate are not both in shell #{shell_index}",
                    self.edgeuses[eu].index
                )));
            }
            run.push(eu);
            end_v = self.eu_end(eu)?;
            if end_v == start_v {
                break;
            }
            next = match pool.first() {
                Some(&cand) if self.eu_start(cand)? == end_v => Some(cand),
                Some(&cand) => {
                    let cand_mate = self.edgeuse(cand)?.mate;
                    (self.eu_start(cand_mate)? == end_v).then_some(cand_mate)
                }
                None => None,
            };
        }
        if end_v != start_v {
            return Err(TopoError::WireLoopNotClosed {
                shell: shell_index,
                start: self.vertices[start_v].index,
                end: self.vertices[end_v].index,
            });
        }

        let (lu1, lu2) = self.new_loop_pair(
            LoopParent::Shell(s),
            LoopParent::Shell(s),
            Orientation::Unspecified,
        );
        let mut mates = Vec::with_capacity(run.len());
        for &eu in &run {
            let mate = self.edgeuses[eu].mate;
            self.edgeuses[eu].parent = EdgeParent::LoopUse(lu1);
            self.edgeuses[mate].parent = EdgeParent::LoopUse(lu2);
            mates.push(mate);
        }
        mates.reverse();
        let shell = &mut self.shells[s];
        shell.edgeuses.retain(|eu| !run.contains(eu) && !mates.contains(eu));
        shell.loopuses.push(lu1);
        shell.loopuses.push(lu2);
        debug!(shell = shell_index, edges = run.len(), "made loop from wire edges");
        self.loopuses[lu1].contents = LoopContents::Edges(run);
        self.loopuses[lu2].contents = LoopContents::Edges(mates);
        Ok(lu1)
    }

    /// Promote a wire loop of a shell into a face.
    ///
    /// The loop and its mate must both belong directly to the same shell.
    /// Returns the face-use that agrees with the face geometry; it owns
    /// `lu`, and its mate owns `lu`'s mate.
    pub fn make_face(&mut self, lu: LoopUseId) -> Result<FaceUseId> {
        let rec = self.loopuse(lu)?;
        let (index, mate) = (rec.index, rec.mate);
        let s = match rec.parent {
            LoopParent::Shell(s) => s,
            LoopParent::FaceUse(_) => {
                return Err(TopoError::WrongParent {
                    kind: "loop-use",
                    index,
                    expected: "shell",
                })
            }
        };
        if self.loopuse(mate)?.parent != LoopParent::Shell(s) {
            return Err(TopoError::MateNotInShell(index));
        }

        let f_index = self.next_index();
        let f = self.faces.insert(Face {
            faceuse: FaceUseId::default(),
            geom: None,
            flip: false,
            bbox: None,
            index: f_index,
        });
        let i1 = self.next_index();
        let fu1 = self.faceuses.insert(FaceUse {
            shell: s,
            mate: FaceUseId::default(),
            face: f,
            orientation: Orientation::Same,
            loopuses: vec![lu],
            index: i1,
        });
        let i2 = self.next_index();
        let fu2 = self.faceuses.insert(FaceUse {
            shell: s,
            mate: fu1,
            face: f,
            orientation: Orientation::Opposite,
            loopuses: vec![mate],
            index: i2,
        });
        self.faceuses[fu1].mate = fu2;
        self.faces[f].faceuse = fu1;

        for (l, fu) in [(lu, fu1), (mate, fu2)] {
            let rec = &mut self.loopuses[l];
            rec.parent = LoopParent::FaceUse(fu);
            rec.orientation = Orientation::Same;
        }
        let shell = &mut self.shells[s];
        shell.loopuses.retain(|l| *l != lu && *l != mate);
        shell.faceuses.push(fu1);
        shell.faceuses.push(fu2);
        debug!(face = f_index, "made face");
        Ok(fu1)
    }

    /// A use of an edge of shell `s` running from `a` to `b` whose edge
    /// has a single use pair, ignoring `skip`'s own edge.
    fn lone_pair_between(
        &self,
        a: VertexId,
        b: VertexId,
        s: ShellId,
        skip: EdgeUseId,
    ) -> Result<Option<EdgeUseId>> {
        let own = self.edgeuse(skip)?.edge;
        for eu in self.edgeuses_from_vertex(a)? {
            let rec = self.edgeuse(eu)?;
            if rec.edge == own || rec.radial != rec.mate || self.eu_end(eu)? != b {
                continue;
            }
            if self.shell_of_edgeuse(eu)? == s {
                return Ok(Some(eu));
            }
        }
        Ok(None)
    }

    /// Make a face in shell `s` whose outer loop runs through `verts` in
    /// order, counter-clockwise seen from outside.
    ///
    /// Empty slots get fresh vertices, written back into `verts`. A new
    /// edge is joined onto an existing edge of the shell between the same
    /// two vertices when that edge has exactly one use pair, so faces made
    /// one after another around a solid come out glued. The shell's lone
    /// vertex is consumed. Only topology is built; coordinates and face
    /// geometry are the caller's business.
    pub fn make_face_from_vertices(
        &mut self,
        s: ShellId,
        verts: &mut [Option<VertexId>],
    ) -> Result<FaceUseId> {
        let shell_index = self.shell(s)?.index;
        let n = verts.len();
        if n < 3 {
            return Err(TopoError::TooFewVertices {
                shell: shell_index,
                count: n,
            });
        }
        for (i, v) in verts.iter().enumerate() {
            let Some(v) = v else { continue };
            let index = self.vertex(*v)?.index;
            if verts[(i + 1) % n] == Some(*v) {
                return Err(TopoError::Invariant(format!(
                    "shell #{shell_index}: vertex #{index} repeats on consecutive corners"
                )));
            }
        }

        for slot in verts.iter_mut() {
            if slot.is_none() {
                *slot = Some(self.new_vertex());
            }
        }
        let corners: Vec<VertexId> = verts.iter().flatten().copied().collect();

        let (lu1, lu2) = self.new_loop_pair(
            LoopParent::Shell(s),
            LoopParent::Shell(s),
            Orientation::Unspecified,
        );
        let mut run = Vec::with_capacity(n);
        let mut mates = Vec::with_capacity(n);
        for (i, &v) in corners.iter().enumerate() {
            let (eu1, eu2) = self.new_edge_pair(EdgeParent::LoopUse(lu1), EdgeParent::LoopUse(lu2));
            let vu1 = self.new_vertexuse(v, VertexParent::EdgeUse(eu1));
            let vu2 = self.new_vertexuse(corners[(i + 1) % n], VertexParent::EdgeUse(eu2));
            self.edgeuses[eu1].vertexuse = vu1;
            self.edgeuses[eu2].vertexuse = vu2;
            run.push(eu1);
            mates.push(eu2);
        }
        mates.reverse();
        self.loopuses[lu1].contents = LoopContents::Edges(run.clone());
        self.loopuses[lu2].contents = LoopContents::Edges(mates);
        let shell = &mut self.shells[s];
        shell.loopuses.push(lu1);
        shell.loopuses.push(lu2);
        if let Some(vu) = shell.vertexuse.take() {
            self.free_vertexuse(vu);
        }
        let fu = self.make_face(lu1)?;

        let mut shared = 0;
        for (i, &eu) in run.iter().enumerate() {
            if let Some(other) = self.lone_pair_between(corners[i], corners[(i + 1) % n], s, eu)? {
                self.join_edge_into(other, eu)?;
                shared += 1;
            }
        }
        debug!(shell = shell_index, corners = n, shared, "made face from vertices");
        Ok(fu)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// Corners of each cube face, counter-clockwise seen from outside.
    /// Corners 0..4 are the bottom square, 4..8 the top one above them.
    pub(crate) const CUBE_FACES: [[usize; 4]; 6] = [
        [0, 3, 2, 1],
        [4, 5, 6, 7],
        [0, 1, 5, 4],
        [1, 2, 6, 5],
        [2, 3, 7, 6],
        [3, 0, 4, 7],
    ];

    /// A closed cube shell built face by face, topology only.
    pub(crate) fn cube_shell(m: &mut Model) -> (ShellId, Vec<FaceUseId>, [VertexId; 8]) {
        let (_, s) = m.make_region_shell_vertex();
        let mut vs: [Option<VertexId>; 8] = [None; 8];
        let mut fus = Vec::new();
        for corners in CUBE_FACES {
            let mut slots: Vec<Option<VertexId>> = corners.iter().map(|&i| vs[i]).collect();
            fus.push(m.make_face_from_vertices(s, &mut slots).unwrap());
            for (&i, v) in corners.iter().zip(&slots) {
                vs[i] = *v;
            }
        }
        (s, fus, vs.map(|v| v.unwrap()))
    }

    #[test]
    fn test_make_region_shell_vertex() {
        let mut m = Model::new();
        let (r, s) = m.make_region_shell_vertex();
        assert_eq!(m.region(r).unwrap().shells, vec![s]);
        let vu = m.shell(s).unwrap().vertexuse.unwrap();
        let v = m.vertexuses[vu].vertex;
        assert_eq!(m.vertices[v].uses, vec![vu]);
        assert_eq!(m.vertexuses[vu].parent, VertexParent::Shell(s));
        // region, shell, vertex, vertex-use
        assert_eq!(m.max_index(), 5);

        let s2 = m.make_shell_vertex(r).unwrap();
        assert_eq!(m.region(r).unwrap().shells, vec![s, s2]);
    }

    #[test]
    fn test_make_loop_steals_lone_vertex() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lone = m.shells[s].vertexuse.unwrap();
        let lone_v = m.vertexuses[lone].vertex;

        let lu = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        assert!(m.shells[s].vertexuse.is_none());
        assert_eq!(m.loopuses[lu].contents, LoopContents::Vertex(lone));
        let mate = m.loopuses[lu].mate;
        let vu2 = m.loopuses[mate].contents.vertex().unwrap();
        assert_eq!(m.vertexuses[vu2].vertex, lone_v);
        assert_eq!(m.vertices.len(), 1);
        assert_eq!(m.shells[s].loopuses, vec![lu, mate]);
    }

    #[test]
    fn test_make_loop_steal_moves_onto_given_vertex() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let eu = m.make_edge(None, None, s).unwrap();
        let v = m.eu_start(eu).unwrap();
        let s2 = m.make_shell_vertex(m.shells[s].region).unwrap();
        let before = m.vertices.len();

        let lu = m.make_loop(LoopParent::Shell(s2), Some(v), Orientation::Same).unwrap();
        let vu = m.loopuses[lu].contents.vertex().unwrap();
        assert_eq!(m.vertexuses[vu].vertex, v);
        // the stolen lone vertex lost its only use and is gone
        assert_eq!(m.vertices.len(), before - 1);
    }

    #[test]
    fn test_make_edge_reuses_lone_vertex() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lone = m.shells[s].vertexuse.unwrap();
        let eu = m.make_edge(None, None, s).unwrap();
        assert_eq!(m.edgeuses[eu].vertexuse, lone);
        assert!(m.shells[s].vertexuse.is_none());
        assert_eq!(m.vertices.len(), 2);
        let mate = m.edgeuses[eu].mate;
        assert_eq!(m.edgeuses[eu].radial, mate);
        assert_eq!(m.edgeuses[mate].radial, eu);
        assert_eq!(m.shells[s].edgeuses, vec![eu, mate]);
    }

    #[test]
    fn test_make_edge_with_both_vertices_kills_lone() {
        let mut m = Model::new();
        let (r, s) = m.make_region_shell_vertex();
        let eu = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(eu).unwrap(), m.eu_end(eu).unwrap());
        let s2 = m.make_shell_vertex(r).unwrap();
        let eu2 = m.make_edge(Some(a), Some(b), s2).unwrap();
        assert!(m.shells[s2].vertexuse.is_none());
        assert_eq!(m.vertices.len(), 2);
        assert_eq!(m.eu_start(eu2).unwrap(), a);
        assert_eq!(m.eu_end(eu2).unwrap(), b);
    }

    #[test]
    fn test_make_edge_on_vertex_use_point_loop() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lu = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        let vu = m.loopuses[lu].contents.vertex().unwrap();
        let eu = m.make_edge_on_vertex_use(vu).unwrap();
        assert_eq!(m.loopuses[lu].contents.edges(), &[eu]);
        assert_eq!(m.eu_start(eu).unwrap(), m.eu_end(eu).unwrap());
        let mate = m.edgeuses[eu].mate;
        assert_eq!(m.edgeuses[mate].parent, EdgeParent::LoopUse(m.loopuses[lu].mate));
    }

    #[test]
    fn test_make_edge_on_lone_vertex() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let vu = m.shells[s].vertexuse.unwrap();
        let eu = m.make_edge_on_vertex_use(vu).unwrap();
        assert!(m.shells[s].vertexuse.is_none());
        assert_eq!(m.shells[s].edgeuses.len(), 2);
        assert_eq!(m.eu_start(eu).unwrap(), m.eu_end(eu).unwrap());
    }

    #[test]
    fn test_make_loop_from_wire_edges_triangle() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(e1).unwrap(), m.eu_end(e1).unwrap());
        let e2 = m.make_edge(Some(b), None, s).unwrap();
        let c = m.eu_end(e2).unwrap();
        let e3 = m.make_edge(Some(c), Some(a), s).unwrap();

        let lu = m.make_loop_from_wire_edges(s).unwrap();
        assert!(m.shells[s].edgeuses.is_empty());
        assert_eq!(m.loopuses[lu].contents.edges(), &[e1, e2, e3]);
        let mate = m.loopuses[lu].mate;
        let mates: Vec<_> = [e3, e2, e1].iter().map(|e| m.edgeuses[*e].mate).collect();
        assert_eq!(m.loopuses[mate].contents.edges(), mates.as_slice());
        for eu in [e1, e2, e3] {
            assert_eq!(m.edgeuses[eu].parent, EdgeParent::LoopUse(lu));
        }
    }

    #[test]
    fn test_make_loop_from_open_wire_fails() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let b = m.eu_end(e1).unwrap();
        m.make_edge(Some(b), None, s).unwrap();
        let err = m.make_loop_from_wire_edges(s).unwrap_err();
        assert!(matches!(err, TopoError::WireLoopNotClosed { .. }));
        // nothing was moved
        assert_eq!(m.shells[s].edgeuses.len(), 4);
        assert!(m.shells[s].loopuses.is_empty());
    }

    #[test]
    fn test_make_loop_from_lone_vertex_only() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lu = m.make_loop_from_wire_edges(s).unwrap();
        assert!(m.loopuses[lu].contents.vertex().is_some());
    }

    #[test]
    fn test_make_face_requires_shell_loop() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lu = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        let fu = m.make_face(lu).unwrap();
        let fum = m.faceuses[fu].mate;
        assert_eq!(m.faceuses[fu].orientation, Orientation::Same);
        assert_eq!(m.faceuses[fum].orientation, Orientation::Opposite);
        assert_eq!(m.faceuses[fu].face, m.faceuses[fum].face);
        assert_eq!(m.loopuses[lu].parent, LoopParent::FaceUse(fu));
        assert!(m.shells[s].loopuses.is_empty());
        assert_eq!(m.shells[s].faceuses, vec![fu, fum]);

        let err = m.make_face(lu).unwrap_err();
        assert!(matches!(err, TopoError::WrongParent { .. }));
    }

    #[test]
    fn test_make_face_from_vertices_fills_slots() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let mut slots = [None; 3];
        let fu = m.make_face_from_vertices(s, &mut slots).unwrap();
        let vs: Vec<VertexId> = slots.iter().map(|v| v.unwrap()).collect();
        // the lone vertex went away, three fresh corners replace it
        assert!(m.shells[s].vertexuse.is_none());
        assert_eq!(m.vertices.len(), 3);
        let lu = m.faceuses[fu].loopuses[0];
        assert_eq!(m.loop_vertices(lu).unwrap(), vs);
        assert_eq!(m.loopuses[lu].orientation, Orientation::Same);
        assert_eq!(m.edges.len(), 3);
        m.check().unwrap();
    }

    #[test]
    fn test_make_face_from_vertices_shares_edges() {
        let mut m = Model::new();
        let (s, fus, _) = cube_shell(&mut m);
        assert_eq!(fus.len(), 6);
        assert_eq!(m.vertices.len(), 8);
        assert_eq!(m.edges.len(), 12);
        assert_eq!(m.shells[s].faceuses.len(), 12);
        for e in m.edges.keys() {
            assert_eq!(m.radial_uses(e).unwrap().len(), 4);
        }
        m.check().unwrap();
    }

    #[test]
    fn test_make_face_from_vertices_rejects_bad_corners() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let err = m.make_face_from_vertices(s, &mut [None, None]).unwrap_err();
        assert!(matches!(err, TopoError::TooFewVertices { count: 2, .. }));

        let mut slots = [None; 3];
        m.make_face_from_vertices(s, &mut slots).unwrap();
        let (a, b) = (slots[0], slots[1]);
        let before = m.vertices.len();
        let err = m.make_face_from_vertices(s, &mut [a, a, b]).unwrap_err();
        assert!(matches!(err, TopoError::Invariant(_)));
        assert_eq!(m.vertices.len(), before);
    }
}
