//! Geometry and attribute attachment: coordinates, face planes and
//! surfaces, edge lines, and bounding boxes.

use nmg_kernel_geom::{EdgeGeomId, FaceGeomId, FaceSurface, LineSeg, PlaneEq, Surface};
use nmg_kernel_math::{Aabb3, Point3, Tolerance};
use tracing::warn;

use crate::error::{Result, TopoError};
use crate::model::{EdgeUseId, FaceId, FaceUseId, LoopUseId, Model, Orientation, RegionId, ShellId, VertexId};

impl Model {
    /// Set the coordinate of a vertex.
    pub fn assign_vertex_coordinate(&mut self, v: VertexId, p: Point3) -> Result<()> {
        self.vertices
            .get_mut(v)
            .ok_or(TopoError::Dead("vertex"))?
            .coord = Some(p);
        Ok(())
    }

    /// True when the stored geometry of `fu`'s face is reversed relative
    /// to `fu` itself.
    fn faceuse_reversed(&self, fu: FaceUseId) -> Result<bool> {
        let rec = self.faceuse(fu)?;
        let flip = self.face(rec.face)?.flip;
        Ok(flip ^ (rec.orientation == Orientation::Opposite))
    }

    fn set_face_geometry(&mut self, fu: FaceUseId, surface: FaceSurface) -> Result<FaceGeomId> {
        let f = self.faceuse(fu)?.face;
        let old = self.face(f)?.geom;
        if let Some(g) = old {
            if let Some(rec) = self.geometry.faces.get_mut(g) {
                if rec.refs() == 1 {
                    rec.value = surface;
                    return Ok(g);
                }
            }
            self.geometry.release_face(g);
        }
        let g = self.geometry.add_face(surface);
        self.faces[f].geom = Some(g);
        Ok(g)
    }

    /// Attach a plane to the face of `fu`, given as seen from `fu`.
    ///
    /// The stored plane is reversed as needed so that the face's flip flag
    /// and `fu`'s orientation together reproduce `plane`. Geometry shared
    /// with other faces is not overwritten; the face gets its own record.
    pub fn assign_face_plane(&mut self, fu: FaceUseId, plane: PlaneEq) -> Result<FaceGeomId> {
        let stored = if self.faceuse_reversed(fu)? {
            plane.flipped()
        } else {
            plane
        };
        self.set_face_geometry(fu, FaceSurface::Plane(stored))
    }

    /// Attach a non-planar surface to the face of `fu`.
    ///
    /// The face's flip flag is set so that the surface's outward normal is
    /// the outward normal of `fu`.
    pub fn assign_face_surface(
        &mut self,
        fu: FaceUseId,
        surface: Box<dyn Surface>,
    ) -> Result<FaceGeomId> {
        let rec = self.faceuse(fu)?;
        let (f, opposite) = (rec.face, rec.orientation == Orientation::Opposite);
        let g = self.set_face_geometry(fu, FaceSurface::Parametric(surface))?;
        self.faces[f].flip = opposite;
        Ok(g)
    }

    /// Compute the plane of `fu` from its first loop of edges and attach it.
    pub fn calc_face_plane(&mut self, fu: FaceUseId, tol: &Tolerance) -> Result<PlaneEq> {
        let rec = self.faceuse(fu)?;
        let index = rec.index;
        let lu = rec
            .loopuses
            .iter()
            .copied()
            .find(|lu| !self.loopuses[*lu].contents.edges().is_empty())
            .ok_or(TopoError::MissingGeometry {
                kind: "face-use",
                index,
            })?;
        let mut pts = Vec::new();
        for v in self.loop_vertices(lu)? {
            pts.push(self.vertex_point(v)?);
        }
        let mut plane = PlaneEq::from_polygon(&pts, tol).ok_or_else(|| {
            TopoError::Invariant(format!("face-use #{index}: loop is degenerate, no plane"))
        })?;
        if self.loopuse(lu)?.orientation == Orientation::Opposite {
            plane = plane.flipped();
        }
        self.assign_face_plane(fu, plane)?;
        Ok(plane)
    }

    /// Compute line geometry for `eu`'s edge and share one record among
    /// every use of the edge.
    pub fn assign_edge_geometry(&mut self, eu: EdgeUseId, tol: &Tolerance) -> Result<EdgeGeomId> {
        let index = self.edgeuse(eu)?.index;
        let a = self.vertex_point(self.eu_start(eu)?)?;
        let b = self.vertex_point(self.eu_end(eu)?)?;
        let Some(line) = LineSeg::through(&a, &b, tol) else {
            warn!(edgeuse = index, "zero length edge has no line geometry");
            return Err(TopoError::ZeroLengthEdge(index));
        };

        let edge = self.edgeuse(eu)?.edge;
        let uses = self.radial_uses(edge)?;
        let g = self.geometry.add_edge(line);
        for (i, &u) in uses.iter().enumerate() {
            if let Some(old) = self.edgeuses[u].geom.take() {
                self.geometry.release_edge(old);
            }
            if i > 0 {
                self.geometry.retain_edge(g);
            }
            self.edgeuses[u].geom = Some(g);
        }
        Ok(g)
    }

    /// Recompute the bounding box of `lu`'s loop from its vertices.
    pub fn assign_loop_bbox(&mut self, lu: LoopUseId, tol: &Tolerance) -> Result<Aabb3> {
        let rec = self.loopuse(lu)?;
        let (lp, index) = (rec.lp, rec.index);
        let mut pts = Vec::new();
        for v in self.loop_vertices(lu)? {
            pts.push(self.vertex_point(v)?);
        }
        let mut bbox = Aabb3::from_points(&pts).ok_or(TopoError::MissingGeometry {
            kind: "loop-use",
            index,
        })?;
        bbox.pad_degenerate(tol);
        self.loops[lp].bbox = Some(bbox);
        Ok(bbox)
    }

    /// Recompute the bounding box of a face from all of its loops.
    pub fn assign_face_bbox(&mut self, f: FaceId, tol: &Tolerance) -> Result<Aabb3> {
        let face = self.face(f)?;
        let index = face.index;
        let lus = self.faceuse(face.faceuse)?.loopuses.clone();
        let mut bbox = Aabb3::empty();
        for lu in lus {
            bbox.include_box(&self.assign_loop_bbox(lu, tol)?);
        }
        if bbox.is_empty() {
            return Err(TopoError::MissingGeometry { kind: "face", index });
        }
        bbox.pad_degenerate(tol);
        self.faces[f].bbox = Some(bbox);
        Ok(bbox)
    }

    /// Recompute the bounding box of a shell from everything in it.
    pub fn assign_shell_bbox(&mut self, s: ShellId, tol: &Tolerance) -> Result<Aabb3> {
        let shell = self.shell(s)?;
        let index = shell.index;
        let faces: Vec<FaceId> = shell
            .faceuses
            .iter()
            .filter(|fu| self.faceuses[**fu].orientation == Orientation::Same)
            .map(|fu| self.faceuses[*fu].face)
            .collect();
        let loops = shell.loopuses.clone();
        let wires = shell.edgeuses.clone();
        let lone = shell.vertexuse;

        let mut bbox = Aabb3::empty();
        for f in faces {
            bbox.include_box(&self.assign_face_bbox(f, tol)?);
        }
        for lu in loops {
            bbox.include_box(&self.assign_loop_bbox(lu, tol)?);
        }
        for eu in wires {
            bbox.include_point(&self.vertex_point(self.eu_start(eu)?)?);
        }
        if let Some(vu) = lone {
            bbox.include_point(&self.vertex_point(self.vertexuse(vu)?.vertex)?);
        }
        if bbox.is_empty() {
            return Err(TopoError::EmptyShell(index));
        }
        bbox.pad_degenerate(tol);
        self.shells[s].bbox = Some(bbox);
        Ok(bbox)
    }

    /// Recompute the bounding box of a region from its shells.
    pub fn assign_region_bbox(&mut self, r: RegionId, tol: &Tolerance) -> Result<Aabb3> {
        let region = self.region(r)?;
        let index = region.index;
        let shells = region.shells.clone();
        let mut bbox = Aabb3::empty();
        for s in shells {
            bbox.include_box(&self.assign_shell_bbox(s, tol)?);
        }
        if bbox.is_empty() {
            return Err(TopoError::Invariant(format!("region #{index} has no shells")));
        }
        bbox.pad_degenerate(tol);
        self.regions[r].bbox = Some(bbox);
        Ok(bbox)
    }

    /// Recompute every loop, face, shell and region box in the model.
    pub fn rebound(&mut self, tol: &Tolerance) -> Result<()> {
        let regions: Vec<RegionId> = self.regions.keys().collect();
        for r in regions {
            self.assign_region_bbox(r, tol)?;
        }
        Ok(())
    }
}
