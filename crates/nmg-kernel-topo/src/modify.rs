//! Modify operations: edge splitting and shell inversion.
//!
//! Splitting keeps every loop closed and every radial cycle intact: the
//! new pieces take the places of the old edge-use in its loop and the
//! halves of a split edge keep all of its faces.

use tracing::debug;

use crate::error::{Result, TopoError};
use crate::model::{
    EdgeParent, EdgeUseId, FaceId, LoopContents, LoopUseId, Model, Orientation, ShellId, VertexId,
    VertexParent,
};

impl Model {
    fn insert_in_loop(&mut self, lu: LoopUseId, at: EdgeUseId, new: EdgeUseId, after: bool) -> Result<()> {
        let index = self.loopuse(lu)?.index;
        let LoopContents::Edges(eus) = &mut self.loopuses[lu].contents else {
            return Err(TopoError::VertexLoop(index));
        };
        let pos = eus.iter().position(|eu| *eu == at).ok_or_else(|| {
            TopoError::Invariant(format!("edge-use is not listed in loop-use #{index}"))
        })?;
        eus.insert(if after { pos + 1 } else { pos }, new);
        Ok(())
    }

    /// Split one edge-use pair at `v`.
    ///
    /// `eu` runs from A to B. Afterwards it runs from A to `v` and a new
    /// use running from `v` to B follows it in its loop; the mate side gets
    /// the reverse. A pair sharing its edge with other uses is first moved
    /// onto an edge of its own. A missing `v` becomes a fresh vertex. With
    /// `share_geom` the new pair reuses `eu`'s line geometry, otherwise it
    /// has none. Returns the new use running from `v` to B.
    pub fn split_edge_use(
        &mut self,
        v: Option<VertexId>,
        eu: EdgeUseId,
        share_geom: bool,
    ) -> Result<EdgeUseId> {
        let rec = self.edgeuse(eu)?;
        let (mate, parent, geom, index) = (rec.mate, rec.parent, rec.geom, rec.index);
        let mate_parent = self.edgeuse(mate)?.parent;
        let (a, b) = (self.eu_start(eu)?, self.eu_end(eu)?);
        if let Some(v) = v {
            self.vertex(v)?;
            if v == a || v == b {
                return Err(TopoError::SplitAtEndpoint(index));
            }
        }

        self.unglue_edge(eu)?;
        let v = match v {
            Some(v) => v,
            None => self.new_vertex(),
        };
        let (eu1, eu2) = self.new_edge_pair(parent, mate_parent);
        let vu1 = self.new_vertexuse(v, VertexParent::EdgeUse(eu1));
        let vu2 = self.new_vertexuse(b, VertexParent::EdgeUse(eu2));
        self.edgeuses[eu1].vertexuse = vu1;
        self.edgeuses[eu2].vertexuse = vu2;
        let mate_vu = self.edgeuses[mate].vertexuse;
        self.move_vertex_use(mate_vu, v)?;

        match (parent, mate_parent) {
            (EdgeParent::LoopUse(lu), EdgeParent::LoopUse(lum)) => {
                self.insert_in_loop(lu, eu, eu1, true)?;
                self.insert_in_loop(lum, mate, eu2, false)?;
            }
            (EdgeParent::Shell(s), _) => {
                let shell = &mut self.shells[s];
                shell.edgeuses.push(eu1);
                shell.edgeuses.push(eu2);
            }
            (EdgeParent::LoopUse(_), EdgeParent::Shell(_)) => {
                return Err(TopoError::WrongParent {
                    kind: "edge-use",
                    index,
                    expected: "loop-use on both sides",
                });
            }
        }

        if let (true, Some(g)) = (share_geom, geom) {
            self.geometry.retain_edge(g);
            self.geometry.retain_edge(g);
            self.edgeuses[eu1].geom = Some(g);
            self.edgeuses[eu2].geom = Some(g);
        }
        debug!(edgeuse = index, new = self.edgeuses[eu1].index, "split edge-use");
        Ok(eu1)
    }

    /// Split an edge and every use of it at `v`.
    ///
    /// Each use pair is split with [`Model::split_edge_use`], then the
    /// pieces between A and `v` are joined onto one edge and the pieces
    /// between `v` and B onto another, so both halves keep every face the
    /// old edge had. Returns the use running from `v` to B that lives in
    /// `eu`'s own parent.
    pub fn split_edge(&mut self, v: Option<VertexId>, eu: EdgeUseId, share_geom: bool) -> Result<EdgeUseId> {
        let rec = self.edgeuse(eu)?;
        let (e, mate, index) = (rec.edge, rec.mate, rec.index);
        let (a, b) = (self.eu_start(eu)?, self.eu_end(eu)?);
        if a == b {
            return Err(TopoError::ZeroLengthEdge(index));
        }
        if let Some(v) = v {
            self.vertex(v)?;
            if v == a || v == b {
                return Err(TopoError::SplitAtEndpoint(index));
            }
        }

        let pairs: Vec<EdgeUseId> = self.radial_uses(e)?.into_iter().step_by(2).collect();
        let mut v = v;
        let (mut near, mut far): (Option<EdgeUseId>, Option<EdgeUseId>) = (None, None);
        let mut result = None;
        for teu in pairs {
            let from_a = self.eu_start(teu)? == a;
            let piece = self.split_edge_use(v, teu, share_geom)?;
            v = Some(self.eu_start(piece)?);
            let (n, f) = if from_a { (teu, piece) } else { (piece, teu) };
            match near {
                Some(anchor) => self.join_edge_into(anchor, n)?,
                None => near = Some(n),
            }
            match far {
                Some(anchor) => self.join_edge_into(anchor, f)?,
                None => far = Some(f),
            }
            if teu == eu {
                result = Some(piece);
            } else if teu == mate {
                result = Some(eu);
            }
        }
        debug!(edgeuse = index, "split edge");
        result.ok_or_else(|| {
            TopoError::Invariant(format!("edge-use #{index} missing from its own radial cycle"))
        })
    }

    /// Split an edge at `v`, both halves keeping the edge's line geometry.
    /// An edge without geometry stays without.
    pub fn break_edge(&mut self, v: Option<VertexId>, eu: EdgeUseId) -> Result<EdgeUseId> {
        self.split_edge(v, eu, true)
    }

    /// Turn a shell inside out.
    ///
    /// Every face has its normal reversed and its two uses swap sides, so
    /// what was the outward use of each face now faces inward. Wire loops
    /// and wire edges are untouched.
    pub fn invert_shell(&mut self, s: ShellId) -> Result<()> {
        let shell = self.shell(s)?;
        let shell_index = shell.index;
        let mut faces: Vec<FaceId> = Vec::new();
        for &fu in &shell.faceuses {
            let rec = self.faceuse(fu)?;
            let mate = self.faceuse(rec.mate)?;
            let sides_ok = matches!(
                (rec.orientation, mate.orientation),
                (Orientation::Same, Orientation::Opposite) | (Orientation::Opposite, Orientation::Same)
            );
            if !sides_ok {
                return Err(TopoError::Invariant(format!(
                    "face-use #{} and its mate are not opposite sides",
                    rec.index
                )));
            }
            if !faces.contains(&rec.face) {
                faces.push(rec.face);
            }
        }

        for &f in &faces {
            let fu = self.faces[f].faceuse;
            let mate = self.faceuses[fu].mate;
            for u in [fu, mate] {
                let rec = &mut self.faceuses[u];
                rec.orientation = rec.orientation.flipped();
            }
            let face = &mut self.faces[f];
            face.flip = !face.flip;
        }
        debug!(shell = shell_index, faces = faces.len(), "inverted shell");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::make::tests::cube_shell;
    use approx::assert_relative_eq;
    use nmg_kernel_geom::LineSeg;
    use nmg_kernel_math::{Point3, Tolerance, Vec3};

    fn find_edgeuse(m: &Model, a: VertexId, b: VertexId) -> EdgeUseId {
        m.edgeuses_from_vertex(a)
            .unwrap()
            .into_iter()
            .find(|eu| m.eu_end(*eu).unwrap() == b)
            .unwrap()
    }

    #[test]
    fn test_split_wire_edge_use() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let eu = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(eu).unwrap(), m.eu_end(eu).unwrap());

        let new = m.split_edge_use(None, eu, false).unwrap();
        let v = m.eu_start(new).unwrap();
        assert_eq!(m.eu_end(eu).unwrap(), v);
        assert_eq!(m.eu_end(new).unwrap(), b);
        assert_eq!(m.eu_start(m.edgeuses[eu].mate).unwrap(), v);
        assert_eq!(m.eu_end(m.edgeuses[eu].mate).unwrap(), a);
        assert_eq!(m.shells[s].edgeuses.len(), 4);
        assert_eq!(m.edges.len(), 2);
        assert!(m.edgeuses[new].geom.is_none());
        m.check().unwrap();
    }

    #[test]
    fn test_split_edge_use_in_loop_keeps_chain() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let mut slots = [None; 3];
        let fu = m.make_face_from_vertices(s, &mut slots).unwrap();
        let lu = m.faceuses[fu].loopuses[0];
        let first = m.loopuses[lu].contents.edges()[0];

        let new = m.split_edge_use(None, first, false).unwrap();
        assert_eq!(m.loopuses[lu].contents.edges()[1], new);
        assert_eq!(m.loopuses[lu].contents.edges().len(), 4);
        let mate_lu = m.loopuses[lu].mate;
        assert_eq!(m.loopuses[mate_lu].contents.edges().len(), 4);
        // check walks both loops head to tail
        m.check().unwrap();
    }

    #[test]
    fn test_split_edge_use_at_endpoint_fails() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let eu = m.make_edge(None, None, s).unwrap();
        let a = m.eu_start(eu).unwrap();
        let err = m.split_edge_use(Some(a), eu, false).unwrap_err();
        assert!(matches!(err, TopoError::SplitAtEndpoint(_)));
        assert_eq!(m.edges.len(), 1);
    }

    #[test]
    fn test_split_edge_keeps_radial_faces() {
        let mut m = Model::new();
        let (s, _, vs) = cube_shell(&mut m);
        let eu = find_edgeuse(&m, vs[0], vs[1]);

        let far = m.split_edge(None, eu, false).unwrap();
        let v = m.eu_start(far).unwrap();
        assert_eq!(m.eu_end(far).unwrap(), vs[1]);
        assert_eq!(m.edgeuses[far].parent, m.edgeuses[eu].parent);
        assert_eq!(m.edges.len(), 13);
        assert_eq!(m.vertices.len(), 9);
        // both halves still run between the two faces that met there
        let near_edge = m.edgeuses[eu].edge;
        let far_edge = m.edgeuses[far].edge;
        assert_ne!(near_edge, far_edge);
        assert_eq!(m.radial_uses(near_edge).unwrap().len(), 4);
        assert_eq!(m.radial_uses(far_edge).unwrap().len(), 4);
        for u in m.radial_uses(far_edge).unwrap() {
            let ends = [m.eu_start(u).unwrap(), m.eu_end(u).unwrap()];
            assert!(ends.contains(&v) && ends.contains(&vs[1]));
        }
        m.check().unwrap();
        m.check_closed_surface(s).unwrap();
    }

    #[test]
    fn test_split_edge_from_mate_side() {
        let mut m = Model::new();
        let (_, _, vs) = cube_shell(&mut m);
        let eu = find_edgeuse(&m, vs[1], vs[0]);
        let far = m.split_edge(None, eu, false).unwrap();
        assert_eq!(m.eu_end(far).unwrap(), vs[0]);
        assert_eq!(m.eu_end(eu).unwrap(), m.eu_start(far).unwrap());
        m.check().unwrap();
    }

    #[test]
    fn test_break_edge_shares_line() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let mut slots = [None; 3];
        m.make_face_from_vertices(s, &mut slots).unwrap();
        let pts = [
            Point3::origin(),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        for (v, p) in slots.iter().zip(pts) {
            m.assign_vertex_coordinate(v.unwrap(), p).unwrap();
        }
        let tol = Tolerance::DEFAULT;
        let eu = find_edgeuse(&m, slots[0].unwrap(), slots[1].unwrap());
        let g = m.assign_edge_geometry(eu, &tol).unwrap();

        let far = m.break_edge(None, eu).unwrap();
        let v = m.eu_start(far).unwrap();
        m.assign_vertex_coordinate(v, Point3::new(1.0, 0.0, 0.0)).unwrap();
        for u in m.radial_uses(m.edgeuses[far].edge).unwrap() {
            assert_eq!(m.edgeuses[u].geom, Some(g));
        }
        assert_eq!(m.edgeuses[eu].geom, Some(g));
        assert_eq!(m.geometry.edges[g].refs(), 4);
        let line: LineSeg = *m.geometry.edge(g).unwrap();
        assert_relative_eq!(line.dir, Vec3::new(2.0, 0.0, 0.0));
        m.check().unwrap();
    }

    #[test]
    fn test_invert_shell() {
        let mut m = Model::new();
        let (s, fus, vs) = cube_shell(&mut m);
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ];
        for (v, p) in vs.iter().zip(corners) {
            m.assign_vertex_coordinate(*v, p).unwrap();
        }
        let tol = Tolerance::DEFAULT;
        for &fu in &fus {
            m.calc_face_plane(fu, &tol).unwrap();
        }
        let before: Vec<Vec3> = fus.iter().map(|fu| m.faceuse_normal(*fu).unwrap().into_inner()).collect();
        // bottom face points down
        assert_relative_eq!(before[0], Vec3::new(0.0, 0.0, -1.0));

        m.invert_shell(s).unwrap();
        m.check().unwrap();
        m.check_closed_surface(s).unwrap();
        for (&fu, n) in fus.iter().zip(&before) {
            assert_eq!(m.faceuses[fu].orientation, Orientation::Opposite);
            let outward = m.faceuses[fu].mate;
            assert_eq!(m.faceuses[outward].orientation, Orientation::Same);
            assert_relative_eq!(m.faceuse_normal(outward).unwrap().into_inner(), -n);
        }

        m.invert_shell(s).unwrap();
        for &fu in &fus {
            assert_eq!(m.faceuses[fu].orientation, Orientation::Same);
            assert!(!m.face(m.faceuses[fu].face).unwrap().flip);
        }
    }
}
