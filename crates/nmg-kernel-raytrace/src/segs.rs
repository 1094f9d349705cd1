//! Segment building from a sorted hit list.
//!
//! Hits on closed solid boundaries open and close segments. A wire edge
//! running along the ray gives a segment spanning the wire, kept apart
//! from the solid in/out state. Other hits on dangling sheets, wires and
//! points become zero-thickness segments unless something already covers
//! them. Every hit yields a [`Transition`] that must start in the state
//! the ray is in, and the sequence must start and end outside.

use nmg_kernel_math::{Point3, Tolerance, Vec3};
use nmg_kernel_topo::{EdgeId, Manifold, ManifoldTable, Model, Orientation, VertexId};
use tracing::{debug, error};

use crate::error::{RaytraceError, Result};
use crate::hitmiss::{Hit, HitElement};
use crate::neighborhood::{
    edge_verdict, faceuse_normal_at, solid_wedges_at_vertex, vertex_verdict, RayState, Transition,
};
use crate::ray::Ray;

/// One end of a segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentBoundary {
    /// Distance along the ray.
    pub dist: f64,
    /// The boundary point.
    pub point: Point3,
    /// Outward surface normal: against the ray at entry, along it at exit.
    pub normal: Vec3,
    /// The element that produced the boundary.
    pub element: HitElement,
}

/// One interval of the ray inside material.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    /// Where the ray enters.
    pub seg_in: SegmentBoundary,
    /// Where the ray leaves.
    pub seg_out: SegmentBoundary,
}

impl Segment {
    /// Length of the segment along the ray.
    pub fn length(&self) -> f64 {
        self.seg_out.dist - self.seg_in.dist
    }
}

/// Check that a sequence of transitions is legal.
///
/// A hit that keeps the state counts as two boundary crossings, one that
/// changes it as one; an odd total is fatal. Each hit must start in the
/// state the previous one left, and the ray must end outside. `On`
/// matches either state.
pub fn check_transitions(transitions: &[(usize, f64, Transition)]) -> Result<()> {
    let last = transitions.last().map_or((0, 0.0), |&(i, d, _)| (i, d));
    let crossings: usize = transitions
        .iter()
        .map(|(_, _, t)| if t.before == t.after { 2 } else { 1 })
        .sum();
    if crossings % 2 == 1 {
        return Err(RaytraceError::BadTransition {
            index: last.0,
            dist: last.1,
            reason: "odd number of boundary crossings",
        });
    }

    let mut state = RayState::Outside;
    for &(index, dist, t) in transitions {
        let fits = t.before == state || t.before == RayState::On || state == RayState::On;
        if !fits {
            return Err(RaytraceError::BadTransition {
                index,
                dist,
                reason: "hit does not start in the state the ray is in",
            });
        }
        state = t.after;
    }
    if state == RayState::Inside {
        return Err(RaytraceError::BadTransition {
            index: last.0,
            dist: last.1,
            reason: "ray ends inside",
        });
    }
    Ok(())
}

/// A wire edge the ray runs along, already turned into a segment.
#[derive(Debug, Clone, Copy)]
struct WireSpan {
    edge: EdgeId,
    from: f64,
    to: f64,
}

/// Turns the sorted hits of one ray into segments.
pub struct SegmentBuilder<'a> {
    model: &'a Model,
    manifolds: &'a ManifoldTable,
    ray: Ray,
    tol: Tolerance,
    /// Entry of the segment open through solid material.
    open: Option<SegmentBoundary>,
    wires: Vec<WireSpan>,
    segments: Vec<Segment>,
    transitions: Vec<(usize, f64, Transition)>,
}

impl<'a> SegmentBuilder<'a> {
    /// A builder for one ray.
    pub fn new(model: &'a Model, manifolds: &'a ManifoldTable, ray: Ray, tol: Tolerance) -> Self {
        Self {
            model,
            manifolds,
            ray,
            tol,
            open: None,
            wires: Vec::new(),
            segments: Vec::new(),
            transitions: Vec::new(),
        }
    }

    fn dir(&self) -> Vec3 {
        self.ray.direction.into_inner()
    }

    fn state(&self) -> RayState {
        if self.open.is_some() {
            RayState::Inside
        } else {
            RayState::Outside
        }
    }

    /// Consume the hits, nearest first, and return the segments ordered by
    /// where they start.
    pub fn build(mut self, hits: &[Hit]) -> Result<Vec<Segment>> {
        for hit in hits {
            let index = hit.element.index(self.model)?;
            let degree = self.manifolds.get(index).unwrap_or(Manifold::Point);
            if let (Some(e), HitElement::Vertex(v)) = (hit.colinear, hit.element) {
                self.wire_span(hit, v, e)?;
            }
            let t = match (hit.element, degree) {
                (HitElement::Face(_), Manifold::Solid) => self.solid_face(hit, index)?,
                (HitElement::Edge(e), Manifold::Solid) => self.solid_edge(hit, e, index)?,
                (HitElement::Vertex(v), Manifold::Solid) => self.solid_vertex(hit, v, index)?,
                _ => self.dangling(hit)?,
            };
            debug!(element = index, dist = hit.dist, ?degree, before = ?t.before, after = ?t.after, "consumed hit");
            self.transitions.push((index, hit.dist, t));
        }

        if self.open.is_some() {
            error!(
                origin = ?self.ray.origin,
                direction = ?self.ray.direction,
                hits = hits.len(),
                "segment still open at end of ray"
            );
            return Err(RaytraceError::OpenSegment { hits: hits.len() });
        }
        check_transitions(&self.transitions)?;
        self.segments
            .sort_by(|a, b| a.seg_in.dist.total_cmp(&b.seg_in.dist));
        Ok(self.segments)
    }

    fn boundary(&self, hit: &Hit, normal: Vec3) -> SegmentBoundary {
        SegmentBoundary {
            dist: hit.dist,
            point: hit.point,
            normal,
            element: hit.element,
        }
    }

    fn bad(&self, hit: &Hit, index: usize, reason: &'static str) -> RaytraceError {
        error!(
            origin = ?self.ray.origin,
            direction = ?self.ray.direction,
            element = index,
            dist = hit.dist,
            reason,
            "bad transition"
        );
        RaytraceError::BadTransition {
            index,
            dist: hit.dist,
            reason,
        }
    }

    /// Reject a verdict that does not start in the state the ray is in.
    fn check_start(&self, hit: &Hit, index: usize, t: Transition) -> Result<Transition> {
        if t.before != RayState::On && t.before != self.state() {
            return Err(self.bad(hit, index, "hit does not start in the state the ray is in"));
        }
        Ok(t)
    }

    fn open_at(&mut self, hit: &Hit, index: usize, normal: Vec3) -> Result<()> {
        if self.open.is_some() {
            return Err(self.bad(hit, index, "entering while a segment is open"));
        }
        self.open = Some(self.boundary(hit, normal));
        Ok(())
    }

    fn close_at(&mut self, hit: &Hit, index: usize, normal: Vec3) -> Result<()> {
        let Some(seg_in) = self.open.take() else {
            return Err(self.bad(hit, index, "leaving with no segment open"));
        };
        self.segments.push(Segment {
            seg_in,
            seg_out: self.boundary(hit, normal),
        });
        Ok(())
    }

    fn solid_face(&mut self, hit: &Hit, index: usize) -> Result<Transition> {
        let n = hit
            .normal
            .ok_or(RaytraceError::BadTransition {
                index,
                dist: hit.dist,
                reason: "face hit without a normal",
            })?;
        let cos = n.dot(&self.dir());
        if self.tol.is_perpendicular(cos) {
            return Err(RaytraceError::PerpendicularHit(index));
        }
        use RayState::{Inside, Outside};
        if cos < 0.0 {
            let t = self.check_start(hit, index, Transition::new(Outside, Inside))?;
            self.open_at(hit, index, n)?;
            Ok(t)
        } else {
            let t = self.check_start(hit, index, Transition::new(Inside, Outside))?;
            self.close_at(hit, index, n)?;
            Ok(t)
        }
    }

    fn solid_edge(&mut self, hit: &Hit, e: EdgeId, index: usize) -> Result<Transition> {
        let dir = self.dir();
        let Some(v) = edge_verdict(self.model, self.manifolds, e, &dir, &hit.point, &self.tol)? else {
            debug!(edge = index, "ray runs along every face at edge");
            return Ok(Transition::unchanged(self.state()));
        };
        let t = self.check_start(hit, index, v.transition)?;
        use RayState::{Inside, Outside};
        match (t.before, t.after) {
            (Outside, Inside) => self.open_at(hit, index, v.in_normal)?,
            (Inside, Outside) => self.close_at(hit, index, v.out_normal)?,
            (Outside, Outside) if v.both_sides => {
                // in and straight back out
                self.open_at(hit, index, v.in_normal)?;
                self.close_at(hit, index, v.out_normal)?;
            }
            (Inside, Inside) if v.both_sides => {
                self.close_at(hit, index, v.in_normal)?;
                self.open_at(hit, index, v.out_normal)?;
            }
            _ => debug!(edge = index, "ray grazes edge"),
        }
        Ok(t)
    }

    fn solid_vertex(&mut self, hit: &Hit, v: VertexId, index: usize) -> Result<Transition> {
        let dir = self.dir();
        let wedges = solid_wedges_at_vertex(self.model, self.manifolds, v)?;

        let mut entering: Option<Vec3> = None;
        let mut exiting: Option<Vec3> = None;
        for w in &wedges {
            let n = w.normal.into_inner();
            let cos = n.dot(&dir);
            if cos < -self.tol.perp {
                if entering.map_or(true, |best| cos < best.dot(&dir)) {
                    entering = Some(n);
                }
            } else if cos > self.tol.perp && exiting.map_or(true, |best| cos > best.dot(&dir)) {
                exiting = Some(n);
            }
        }

        use RayState::{Inside, Outside};
        match (entering, exiting) {
            (Some(n), None) => {
                let t = self.check_start(hit, index, Transition::new(Outside, Inside))?;
                self.open_at(hit, index, n)?;
                Ok(t)
            }
            (None, Some(n)) => {
                let t = self.check_start(hit, index, Transition::new(Inside, Outside))?;
                self.close_at(hit, index, n)?;
                Ok(t)
            }
            (None, None) => Ok(Transition::unchanged(self.state())),
            (Some(_), Some(_)) => {
                let Some(verdict) = vertex_verdict(self.model, &wedges, v, &dir, &self.tol)? else {
                    return Ok(Transition::unchanged(self.state()));
                };
                let t = self.check_start(hit, index, verdict.transition)?;
                match (t.before, t.after) {
                    (Outside, Inside) => self.open_at(hit, index, verdict.in_normal)?,
                    (Inside, Outside) => self.close_at(hit, index, verdict.out_normal)?,
                    _ => debug!(vertex = index, "ray grazes vertex"),
                }
                Ok(t)
            }
        }
    }

    /// A vertex hit on a wire edge that runs along the ray. The first of
    /// the edge's two ends to be hit emits the whole span, taking the
    /// other end from the model so that a far end claimed by another
    /// element still closes it.
    fn wire_span(&mut self, hit: &Hit, v: VertexId, e: EdgeId) -> Result<()> {
        if self.wires.iter().any(|w| w.edge == e) {
            return Ok(());
        }
        let eu = self.model.edge(e)?.edgeuse;
        let (a, b) = (self.model.eu_start(eu)?, self.model.eu_end(eu)?);
        let w = if v == a { b } else { a };
        let point: Point3 = self.model.vertex_point(w)?;
        let other = SegmentBoundary {
            dist: self.ray.param_of(&point),
            point,
            normal: self.dir(),
            element: HitElement::Vertex(w),
        };
        let here = self.boundary(hit, -self.dir());
        let (seg_in, seg_out) = if other.dist >= here.dist {
            (here, other)
        } else {
            (
                SegmentBoundary {
                    normal: -self.dir(),
                    ..other
                },
                SegmentBoundary {
                    normal: self.dir(),
                    ..here
                },
            )
        };
        debug!(edge = self.model.edge(e)?.index, from = seg_in.dist, to = seg_out.dist, "ray runs along wire");
        self.wires.push(WireSpan {
            edge: e,
            from: seg_in.dist,
            to: seg_out.dist,
        });
        self.segments.push(Segment { seg_in, seg_out });
        Ok(())
    }

    fn covered(&self, dist: f64) -> bool {
        self.open.is_some()
            || self
                .wires
                .iter()
                .any(|w| w.from - self.tol.linear <= dist && dist <= w.to + self.tol.linear)
    }

    /// The normal of a lower-dimensional hit: the face normal around it
    /// most opposed to the ray, or the reversed ray direction when no face
    /// meets it.
    fn dangling_normal(&self, hit: &Hit) -> Result<Vec3> {
        let dir = self.dir();
        let m = self.model;
        let faceuses = match hit.element {
            HitElement::Face(f) => vec![m.face(f)?.faceuse],
            HitElement::Edge(e) => {
                let mut fus = Vec::new();
                for eu in m.radial_uses(e)? {
                    if let Some(fu) = m.faceuse_of_edgeuse(eu)? {
                        fus.push(fu);
                    }
                }
                fus
            }
            HitElement::Vertex(v) => m.faceuses_at_vertex(v)?,
        };
        let mut best: Option<Vec3> = None;
        for fu in faceuses {
            if m.faceuse(fu)?.orientation != Orientation::Same {
                continue;
            }
            let n = faceuse_normal_at(m, fu, &hit.point)?.into_inner();
            let n = if n.dot(&dir) > 0.0 { -n } else { n };
            if best.map_or(true, |b| n.dot(&dir) < b.dot(&dir)) {
                best = Some(n);
            }
        }
        Ok(best.unwrap_or(-dir))
    }

    /// Hits below solid degree never change the in/out state.
    fn dangling(&mut self, hit: &Hit) -> Result<Transition> {
        let t = Transition::unchanged(self.state());
        if hit.colinear.is_some() || self.covered(hit.dist) {
            return Ok(t);
        }
        let normal = self.dangling_normal(hit)?;
        self.segments.push(Segment {
            seg_in: self.boundary(hit, normal),
            seg_out: self.boundary(hit, -normal),
        });
        Ok(t)
    }
}
