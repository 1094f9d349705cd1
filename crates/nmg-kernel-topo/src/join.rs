//! Join operations: merge vertices, splice edge-uses into a radial cycle,
//! share face geometry, and the matching un-share operations.

use nmg_kernel_geom::{EdgeGeomId, FaceGeomId, FaceSurface};
use tracing::debug;

use crate::error::{Result, TopoError};
use crate::model::{remove_item, Edge, EdgeId, EdgeUseId, FaceUseId, Model, VertexId, VertexUseId};

impl Model {
    /// Move every use of `v2` onto `v1`, in order, and free `v2`.
    ///
    /// `v1` inherits `v2`'s coordinate when it has none of its own.
    pub fn join_vertex(&mut self, v1: VertexId, v2: VertexId) -> Result<()> {
        self.vertex(v1)?;
        if v1 == v2 {
            return Ok(());
        }
        let coord = self.vertex(v2)?.coord;
        let uses = std::mem::take(&mut self.vertices[v2].uses);
        for &vu in &uses {
            self.vertexuses[vu].vertex = v1;
        }
        let target = &mut self.vertices[v1];
        target.uses.extend(uses);
        if target.coord.is_none() {
            target.coord = coord;
        }
        self.vertices.remove(v2);
        Ok(())
    }

    /// Re-home one vertex-use onto `v`. The old vertex goes with its last use.
    pub fn move_vertex_use(&mut self, vu: VertexUseId, v: VertexId) -> Result<()> {
        self.vertex(v)?;
        let old = self.vertexuse(vu)?.vertex;
        if old == v {
            return Ok(());
        }
        if let Some(rec) = self.vertices.get_mut(old) {
            remove_item(&mut rec.uses, &vu);
            if rec.uses.is_empty() {
                self.vertices.remove(old);
            }
        }
        self.vertexuses[vu].vertex = v;
        self.vertices[v].uses.push(vu);
        Ok(())
    }

    /// Splice `src` and its mate into the radial cycle of `dst`'s edge.
    ///
    /// The two uses must run between the same pair of vertices, in either
    /// direction. `src` is placed radially next to whichever of `dst` or
    /// its mate runs opposite to it. The edge `src` used to belong to is
    /// freed with its last use, and the pair adopts `dst`'s line geometry.
    pub fn join_edge_into(&mut self, dst: EdgeUseId, src: EdgeUseId) -> Result<()> {
        let d = self.edgeuse(dst)?;
        let (d_index, d_edge, d_mate, d_geom) = (d.index, d.edge, d.mate, d.geom);
        let s = self.edgeuse(src)?;
        let (s_index, s_edge, s_mate) = (s.index, s.edge, s.mate);
        if d_edge == s_edge {
            return Ok(());
        }

        let (ds, de) = (self.eu_start(dst)?, self.eu_end(dst)?);
        let (ss, se) = (self.eu_start(src)?, self.eu_end(src)?);
        let anchor = if ss == de && se == ds {
            dst
        } else if ss == ds && se == de {
            d_mate
        } else {
            return Err(TopoError::NoSharedVertex {
                dst: d_index,
                src: s_index,
            });
        };
        let anchor_r = self.edgeuse(anchor)?.radial;
        if self.edgeuse(anchor_r)?.radial != anchor {
            return Err(TopoError::RadialBroken(self.edgeuses[anchor].index));
        }

        self.unlink_radial_pair(src)?;

        self.edgeuses[anchor].radial = src;
        self.edgeuses[src].radial = anchor;
        self.edgeuses[s_mate].radial = anchor_r;
        self.edgeuses[anchor_r].radial = s_mate;

        for eu in [src, s_mate] {
            let old = self.edgeuses[eu].geom;
            if old == d_geom {
                self.edgeuses[eu].edge = d_edge;
                continue;
            }
            if let Some(g) = old {
                self.geometry.release_edge(g);
            }
            if let Some(g) = d_geom {
                self.geometry.retain_edge(g);
            }
            let rec = &mut self.edgeuses[eu];
            rec.edge = d_edge;
            rec.geom = d_geom;
        }
        debug!(dst = d_index, src = s_index, "joined edge-use into radial cycle");
        Ok(())
    }

    /// Take `eu` and its mate out of their radial cycle onto a new edge.
    ///
    /// A pair that is already alone on its edge keeps that edge.
    pub fn unglue_edge(&mut self, eu: EdgeUseId) -> Result<EdgeId> {
        let rec = self.edgeuse(eu)?;
        let (mate, radial, edge) = (rec.mate, rec.radial, rec.edge);
        if radial == mate && self.edgeuse(mate)?.radial == eu {
            return Ok(edge);
        }
        self.unlink_radial_pair(eu)?;
        let index = self.next_index();
        let e = self.edges.insert(Edge { edgeuse: eu, index });
        self.edgeuses[eu].edge = e;
        self.edgeuses[mate].edge = e;
        Ok(e)
    }

    /// Give `eu` and its mate a private copy of their line geometry.
    pub fn unshare_edge_geometry(&mut self, eu: EdgeUseId) -> Result<EdgeGeomId> {
        let rec = self.edgeuse(eu)?;
        let (mate, index) = (rec.mate, rec.index);
        let g = rec.geom.ok_or(TopoError::MissingGeometry {
            kind: "edge-use",
            index,
        })?;
        let mate_geom = self.edgeuse(mate)?.geom;
        let shared = self.geometry.edges.get(g).map(|r| (r.value, r.refs()));
        let Some((value, refs)) = shared else {
            return Err(TopoError::MissingGeometry {
                kind: "edge-use",
                index,
            });
        };
        let pair_refs = if mate_geom == Some(g) { 2 } else { 1 };
        if refs <= pair_refs {
            return Ok(g);
        }

        let fresh = self.geometry.add_edge(value);
        self.geometry.release_edge(g);
        self.edgeuses[eu].geom = Some(fresh);
        if let Some(mg) = mate_geom {
            self.geometry.release_edge(mg);
        }
        self.geometry.retain_edge(fresh);
        self.edgeuses[mate].geom = Some(fresh);
        Ok(fresh)
    }

    /// Make `fu2`'s face share `fu1`'s face geometry.
    ///
    /// The second face's flip flag is set so that its outward normal does
    /// not change. Its previous geometry is released.
    pub fn join_face_geometry(&mut self, fu1: FaceUseId, fu2: FaceUseId) -> Result<()> {
        let f1 = self.faceuse(fu1)?.face;
        let f2 = self.faceuse(fu2)?.face;
        let face1 = self.face(f1)?;
        let (flip1, index1) = (face1.flip, face1.index);
        let g1 = face1.geom.ok_or(TopoError::MissingGeometry {
            kind: "face",
            index: index1,
        })?;
        let face2 = self.face(f2)?;
        let (g2, flip2) = (face2.geom, face2.flip);
        if g2 == Some(g1) {
            return Ok(());
        }

        let planes = (
            self.geometry.face(g1).and_then(FaceSurface::as_plane),
            g2.and_then(|g| self.geometry.face(g)).and_then(FaceSurface::as_plane),
        );
        let flip = match planes {
            (Some(p1), Some(p2)) => {
                let n2 = if flip2 { -p2.normal.into_inner() } else { p2.normal.into_inner() };
                p1.normal.dot(&n2) < 0.0
            }
            _ => flip1,
        };

        if let Some(g) = g2 {
            self.geometry.release_face(g);
        }
        self.geometry.retain_face(g1);
        let face2 = &mut self.faces[f2];
        face2.geom = Some(g1);
        face2.flip = flip;
        Ok(())
    }

    /// Give the face of `fu` a private copy of its face geometry.
    pub fn face_new_geometry(&mut self, fu: FaceUseId) -> Result<FaceGeomId> {
        let f = self.faceuse(fu)?.face;
        let face = self.face(f)?;
        let index = face.index;
        let missing = TopoError::MissingGeometry { kind: "face", index };
        let g = face.geom.ok_or_else(|| missing.clone())?;
        let rec = self.geometry.faces.get(g).ok_or(missing)?;
        if rec.refs() <= 1 {
            return Ok(g);
        }
        let value = rec.value.clone();
        self.geometry.release_face(g);
        let fresh = self.geometry.add_face(value);
        self.faces[f].geom = Some(fresh);
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{LoopParent, Orientation};
    use nmg_kernel_geom::{FaceSurface, LineSeg, PlaneEq};
    use nmg_kernel_math::{Point3, Vec3};

    #[test]
    fn test_join_vertex_inherits_coordinate_and_order() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let e2 = m.make_edge(None, None, s).unwrap();
        let v1 = m.eu_start(e1).unwrap();
        let v2 = m.eu_start(e2).unwrap();
        m.vertices[v2].coord = Some(Point3::new(1.0, 2.0, 3.0));
        let v1_uses = m.vertices[v1].uses.clone();
        let v2_uses = m.vertices[v2].uses.clone();

        m.join_vertex(v1, v2).unwrap();
        assert!(m.vertex(v2).is_err());
        assert_eq!(m.vertices[v1].coord, Some(Point3::new(1.0, 2.0, 3.0)));
        let expected: Vec<_> = v1_uses.into_iter().chain(v2_uses).collect();
        assert_eq!(m.vertices[v1].uses, expected);
        for vu in expected {
            assert_eq!(m.vertexuses[vu].vertex, v1);
        }
    }

    #[test]
    fn test_join_vertex_keeps_own_coordinate() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let eu = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(eu).unwrap(), m.eu_end(eu).unwrap());
        m.vertices[a].coord = Some(Point3::origin());
        m.vertices[b].coord = Some(Point3::new(1.0, 0.0, 0.0));
        m.join_vertex(a, b).unwrap();
        assert_eq!(m.vertices[a].coord, Some(Point3::origin()));
        assert_eq!(m.eu_end(eu).unwrap(), a);
    }

    #[test]
    fn test_join_edge_into_forms_radial_cycle() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(e1).unwrap(), m.eu_end(e1).unwrap());
        let e2 = m.make_edge(Some(b), Some(a), s).unwrap();
        let e3 = m.make_edge(Some(a), Some(b), s).unwrap();
        let old_edge = m.edgeuses[e2].edge;

        m.join_edge_into(e1, e2).unwrap();
        m.join_edge_into(e1, e3).unwrap();
        assert!(m.edge(old_edge).is_err());
        assert_eq!(m.edges.len(), 1);

        // mate, radial, mate, radial ... visits all six uses and returns
        let mut seen = vec![e1];
        let mut cur = e1;
        loop {
            cur = m.edgeuses[m.edgeuses[cur].mate].radial;
            if cur == e1 {
                break;
            }
            seen.push(cur);
            assert!(seen.len() <= 3);
        }
        assert_eq!(seen.len(), 3);
        for eu in m.edgeuses.keys() {
            let r = m.edgeuses[eu].radial;
            assert_eq!(m.edgeuses[r].radial, eu);
            assert_eq!(m.eu_start(r).unwrap(), m.eu_end(eu).unwrap());
        }
    }

    #[test]
    fn test_join_edge_into_requires_shared_vertices() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let e2 = m.make_edge(None, None, s).unwrap();
        let err = m.join_edge_into(e1, e2).unwrap_err();
        assert!(matches!(err, TopoError::NoSharedVertex { .. }));
    }

    #[test]
    fn test_unglue_edge_restores_private_edge() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(e1).unwrap(), m.eu_end(e1).unwrap());
        let e2 = m.make_edge(Some(b), Some(a), s).unwrap();
        m.join_edge_into(e1, e2).unwrap();

        let e = m.unglue_edge(e2).unwrap();
        assert_ne!(e, m.edgeuses[e1].edge);
        let mate = m.edgeuses[e2].mate;
        assert_eq!(m.edgeuses[e2].radial, mate);
        assert_eq!(m.edgeuses[e1].radial, m.edgeuses[e1].mate);
        assert_eq!(m.unglue_edge(e2).unwrap(), e);
    }

    #[test]
    fn test_unshare_edge_geometry() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(e1).unwrap(), m.eu_end(e1).unwrap());
        let e2 = m.make_edge(Some(b), Some(a), s).unwrap();
        let line = LineSeg {
            point: Point3::origin(),
            dir: Vec3::x(),
        };
        let g = m.geometry.add_edge(line);
        m.edgeuses[e1].geom = Some(g);
        for eu in [m.edgeuses[e1].mate, e2, m.edgeuses[e2].mate] {
            m.geometry.retain_edge(g);
            m.edgeuses[eu].geom = Some(g);
        }
        m.join_edge_into(e1, e2).unwrap();
        assert_eq!(m.geometry.edges[g].refs(), 4);

        let fresh = m.unshare_edge_geometry(e2).unwrap();
        assert_ne!(fresh, g);
        assert_eq!(m.geometry.edges[g].refs(), 2);
        assert_eq!(m.geometry.edges[fresh].refs(), 2);
        // already private now
        assert_eq!(m.unshare_edge_geometry(e2).unwrap(), fresh);
    }

    #[test]
    fn test_join_face_geometry_sets_flip() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lu1 = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        let fu1 = m.make_face(lu1).unwrap();
        let lu2 = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        let fu2 = m.make_face(lu2).unwrap();
        let (f1, f2) = (m.faceuses[fu1].face, m.faceuses[fu2].face);

        let up = PlaneEq::new(Vec3::z(), &Point3::origin());
        let g1 = m.geometry.add_face(FaceSurface::Plane(up));
        m.faces[f1].geom = Some(g1);
        let g2 = m.geometry.add_face(FaceSurface::Plane(up.flipped()));
        m.faces[f2].geom = Some(g2);

        m.join_face_geometry(fu1, fu2).unwrap();
        assert_eq!(m.faces[f2].geom, Some(g1));
        assert!(m.faces[f2].flip);
        assert!(m.geometry.face(g2).is_none());
        assert_eq!(m.geometry.faces[g1].refs(), 2);

        let g3 = m.face_new_geometry(fu2).unwrap();
        assert_ne!(g3, g1);
        assert_eq!(m.geometry.faces[g1].refs(), 1);
        assert_eq!(m.face_new_geometry(fu1).unwrap(), g1);
    }
}
