//! Ray intersection with the topology of a model.
//!
//! A [`RayContext`] walks regions, shells and face-uses in that order,
//! rejecting by bounding box at each level. Face interiors are found by
//! classifying the plane or surface intercept; edges and vertices are
//! found either as classifier touches or by direct ray/segment tests on
//! wire edges and lone points. Every element is tagged once.

use nmg_kernel_geom::{FaceSurface, LinePlane};
use nmg_kernel_math::{dist_line_point, ray_segment, Aabb3, Dir3, Point3, RaySegment, Tolerance};
use nmg_kernel_topo::{
    EdgeId, EdgeUseId, FaceId, FaceUseId, LoopContents, ManifoldTable, Model, Orientation, ShellId,
    TopoError, VertexId,
};
use tracing::{debug, warn};

use crate::classify::{FaceClassifier, PointClass, TouchObserver};
use crate::error::{RaytraceError, Result};
use crate::hitmiss::{Hit, HitElement, HitList, Tag};
use crate::neighborhood::faceuse_normal_at;
use crate::ray::Ray;

/// Everything one ray shot needs, owned per ray.
#[derive(Debug)]
pub struct RayContext<'a> {
    /// The frozen model.
    pub model: &'a Model,
    /// Manifold degrees of the model.
    pub manifolds: &'a ManifoldTable,
    /// The ray.
    pub ray: Ray,
    /// Tolerance for every comparison.
    pub tol: Tolerance,
    /// Stop face classification at the first touch.
    pub first_touch: bool,
    /// Tags and sorted hits found so far.
    pub hits: HitList,
}

/// Registers classifier touches as edge and vertex hits.
struct TouchRecorder<'c> {
    model: &'c Model,
    hits: &'c mut HitList,
    dist: f64,
}

impl TouchObserver for TouchRecorder<'_> {
    fn edge_touch(&mut self, eu: EdgeUseId, pca: &Point3) -> Result<()> {
        let rec = self.model.edgeuse(eu)?;
        let index = self.model.edge(rec.edge)?.index;
        if self.hits.is_tagged(index) {
            return Ok(());
        }
        if rec.geom.is_none() {
            return Err(RaytraceError::EdgeGeometry(index));
        }
        self.hits
            .insert(index, Hit::new(self.dist, *pca, HitElement::Edge(rec.edge)));
        Ok(())
    }

    fn vertex_touch(&mut self, v: VertexId) -> Result<()> {
        let index = self.model.vertex(v)?.index;
        let point = self.model.vertex_point(v)?;
        self.hits
            .insert(index, Hit::new(self.dist, point, HitElement::Vertex(v)));
        Ok(())
    }
}

impl<'a> RayContext<'a> {
    /// A fresh context for one ray.
    pub fn new(
        model: &'a Model,
        manifolds: &'a ManifoldTable,
        ray: Ray,
        tol: Tolerance,
        first_touch: bool,
    ) -> Self {
        Self {
            model,
            manifolds,
            ray,
            tol,
            first_touch,
            hits: HitList::new(model.max_index()),
        }
    }

    fn ray_meets(&self, bbox: &Aabb3) -> bool {
        let mut padded = *bbox;
        padded.expand(self.tol.linear);
        self.ray.intersect_aabb(&padded).is_some()
    }

    /// Intersect the ray with every region of the model.
    pub fn intersect_model(&mut self) -> Result<()> {
        let model = self.model;
        for r in model.region_ids() {
            let region = model.region(r)?;
            if let Some(bbox) = &region.bbox {
                if !self.ray_meets(bbox) {
                    continue;
                }
            }
            for &s in &region.shells {
                self.intersect_shell(s)?;
            }
        }
        debug!(hits = self.hits.len(), "intersected model");
        Ok(())
    }

    /// Intersect the ray with one shell: its faces, wire loops, wire edges
    /// and lone vertex.
    pub fn intersect_shell(&mut self, s: ShellId) -> Result<()> {
        let model = self.model;
        let shell = model.shell(s)?;
        if let Some(bbox) = &shell.bbox {
            if !self.ray_meets(bbox) {
                return Ok(());
            }
        }
        for &fu in &shell.faceuses {
            if model.faceuse(fu)?.orientation == Orientation::Same {
                self.intersect_faceuse(fu)?;
            }
        }
        for &lu in &shell.loopuses {
            match &model.loopuse(lu)?.contents {
                LoopContents::Vertex(vu) => self.intersect_vertex(model.vertexuse(*vu)?.vertex)?,
                LoopContents::Edges(eus) => {
                    for &eu in eus {
                        self.intersect_wire_edge(eu)?;
                    }
                }
            }
        }
        for &eu in &shell.edgeuses {
            self.intersect_wire_edge(eu)?;
        }
        if let Some(vu) = shell.vertexuse {
            self.intersect_vertex(model.vertexuse(vu)?.vertex)?;
        }
        Ok(())
    }

    /// Intersect the ray with the face of an outward face-use.
    pub fn intersect_faceuse(&mut self, fu: FaceUseId) -> Result<()> {
        let model = self.model;
        let f = model.faceuse(fu)?.face;
        let face = model.face(f)?;
        let index = face.index;
        if self.hits.is_tagged(index) {
            return Ok(());
        }
        if let Some(bbox) = &face.bbox {
            if !self.ray_meets(bbox) {
                self.hits.mark(index, Tag::Miss);
                return Ok(());
            }
        }

        let surface = face
            .geom
            .and_then(|g| model.geometry.face(g))
            .ok_or(TopoError::MissingGeometry { kind: "face", index })?;
        let (origin, dir) = (self.ray.origin, self.ray.direction.into_inner());
        let tag = match surface {
            FaceSurface::Plane(_) => {
                let plane = model.faceuse_plane(fu)?;
                match plane.intersect_line(&origin, &dir, &self.tol) {
                    LinePlane::Hit { t } => self.face_point(fu, f, t, &plane.normal)?,
                    LinePlane::Coincident => {
                        warn!(face = index, "ray lies in face plane, counted as a miss");
                        Tag::Miss
                    }
                    LinePlane::ParallelInside | LinePlane::ParallelOutside => Tag::Miss,
                }
            }
            FaceSurface::Parametric(surface) => {
                let mut tag = Tag::Miss;
                for hit in surface.intersect_ray(&origin, &dir, &self.tol) {
                    let normal = faceuse_normal_at(model, fu, &self.ray.at(hit.t))?;
                    match self.face_point(fu, f, hit.t, &normal)? {
                        Tag::Hit => tag = Tag::Hit,
                        Tag::HitSub if tag == Tag::Miss => tag = Tag::HitSub,
                        _ => {}
                    }
                }
                tag
            }
        };
        self.hits.mark(index, tag);
        Ok(())
    }

    /// Classify one face intercept and record what it hit. Returns the tag
    /// the face itself should get.
    fn face_point(&mut self, fu: FaceUseId, f: FaceId, t: f64, normal: &Dir3) -> Result<Tag> {
        let model = self.model;
        let pt = self.ray.at(t);
        let classifier = FaceClassifier::new(model, self.tol, self.first_touch);
        let mut recorder = TouchRecorder {
            model,
            hits: &mut self.hits,
            dist: t,
        };
        let class = classifier.classify(fu, normal, &pt, None, &mut recorder)?;
        debug!(face = model.face(f)?.index, dist = t, ?class.class, "classified face intercept");
        Ok(match class.class {
            PointClass::Inside => {
                let mut hit = Hit::new(t, pt, HitElement::Face(f));
                hit.normal = Some(normal.into_inner());
                self.hits.push_sorted(hit);
                Tag::Hit
            }
            PointClass::OnBoundary => Tag::HitSub,
            PointClass::Outside => Tag::Miss,
        })
    }

    fn edge_index(&self, e: EdgeId) -> Result<usize> {
        Ok(self.model.edge(e)?.index)
    }

    fn vertex_hit(&mut self, v: VertexId, t: f64, colinear: Option<EdgeId>) -> Result<()> {
        let index = self.model.vertex(v)?.index;
        let mut hit = Hit::new(t, self.model.vertex_point(v)?, HitElement::Vertex(v));
        hit.colinear = colinear;
        self.hits.insert(index, hit);
        Ok(())
    }

    fn vertex_miss(&mut self, v: VertexId) -> Result<()> {
        let index = self.model.vertex(v)?.index;
        self.hits.mark(index, Tag::Miss);
        Ok(())
    }

    /// Intersect the ray with a wire edge by a direct ray/segment test.
    pub fn intersect_wire_edge(&mut self, eu: EdgeUseId) -> Result<()> {
        let model = self.model;
        let rec = model.edgeuse(eu)?;
        let e = rec.edge;
        let index = self.edge_index(e)?;
        if self.hits.is_tagged(index) {
            return Ok(());
        }
        let (va, vb) = (model.eu_start(eu)?, model.eu_end(eu)?);
        let (a, b) = (model.vertex_point(va)?, model.vertex_point(vb)?);
        let (origin, dir) = (self.ray.origin, self.ray.direction.into_inner());

        match ray_segment(&origin, &dir, &a, &b, &self.tol) {
            RaySegment::ZeroLength => {
                warn!(edge = index, "zero-length wire edge, testing its vertex");
                self.hits.mark(index, Tag::Miss);
                self.intersect_vertex(va)?;
            }
            RaySegment::Miss | RaySegment::MissBeforeStart | RaySegment::MissBeyondEnd => {
                self.hits.mark(index, Tag::Miss);
                self.vertex_miss(va)?;
                self.vertex_miss(vb)?;
            }
            RaySegment::AtStart { t } => {
                self.hits.mark(index, Tag::HitSub);
                self.vertex_hit(va, t, None)?;
                self.vertex_miss(vb)?;
            }
            RaySegment::AtEnd { t } => {
                self.hits.mark(index, Tag::HitSub);
                self.vertex_hit(vb, t, None)?;
                self.vertex_miss(va)?;
            }
            RaySegment::Interior { t } => {
                if rec.geom.is_none() {
                    return Err(RaytraceError::EdgeGeometry(index));
                }
                self.hits.insert(index, Hit::new(t, self.ray.at(t), HitElement::Edge(e)));
                self.vertex_miss(va)?;
                self.vertex_miss(vb)?;
            }
            RaySegment::Colinear { t_start, t_end } => {
                self.hits.mark(index, Tag::HitSub);
                self.vertex_hit(va, t_start, Some(e))?;
                self.vertex_hit(vb, t_end, Some(e))?;
            }
        }
        Ok(())
    }

    /// Intersect the ray with a lone vertex or point-loop vertex.
    pub fn intersect_vertex(&mut self, v: VertexId) -> Result<()> {
        let index = self.model.vertex(v)?.index;
        if self.hits.is_tagged(index) {
            return Ok(());
        }
        let p = self.model.vertex_point(v)?;
        let dir = self.ray.direction.into_inner();
        if dist_line_point(&self.ray.origin, &dir, &p) < self.tol.linear {
            let t = self.ray.param_of(&p);
            self.vertex_hit(v, t, None)
        } else {
            self.vertex_miss(v)
        }
    }
}
