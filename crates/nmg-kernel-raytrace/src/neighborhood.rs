//! In/out state of the ray on either side of an edge or vertex hit.
//!
//! At an edge, the solid faces around it are ranked by how their left
//! vectors line up with the ray: the face most opposed to the ray is the
//! one it arrives through, the most aligned is the one it leaves through.
//! At a vertex, two poles are placed just before and just after the hit
//! and each is classified against the nearest face wedge.

use nmg_kernel_geom::FaceSurface;
use nmg_kernel_math::{Dir3, Point3, Tolerance, Vec3};
use nmg_kernel_topo::{
    EdgeId, EdgeUseId, FaceUseId, Manifold, ManifoldTable, Model, Orientation, TopoError, VertexId,
};

use crate::error::Result;

/// Pole offset from a vertex, in multiples of the distance tolerance.
const POLE_SCALE: f64 = 10.0;

/// Where the ray is relative to solid material.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RayState {
    /// Outside all solids.
    Outside,
    /// Running along a surface.
    On,
    /// Inside a solid.
    Inside,
}

/// State of the ray just before and just after a hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    /// State before the hit.
    pub before: RayState,
    /// State after the hit.
    pub after: RayState,
}

impl Transition {
    /// A transition between two states.
    pub const fn new(before: RayState, after: RayState) -> Self {
        Self { before, after }
    }

    /// A hit that leaves the state as it was.
    pub const fn unchanged(state: RayState) -> Self {
        Self::new(state, state)
    }
}

/// Outward normal of a face-use at a point on it.
pub(crate) fn faceuse_normal_at(model: &Model, fu: FaceUseId, at: &Point3) -> Result<Dir3> {
    let rec = model.faceuse(fu)?;
    let face = model.face(rec.face)?;
    match face.geom.and_then(|g| model.geometry.face(g)) {
        Some(FaceSurface::Plane(_)) => Ok(model.faceuse_normal(fu)?),
        Some(FaceSurface::Parametric(surface)) => {
            let n = surface.normal_at(at);
            let flip = face.flip ^ (rec.orientation == Orientation::Opposite);
            Ok(if flip {
                Dir3::new_unchecked(-n.into_inner())
            } else {
                n
            })
        }
        None => Err(TopoError::MissingGeometry {
            kind: "face",
            index: face.index,
        }
        .into()),
    }
}

fn is_solid(model: &Model, manifolds: &ManifoldTable, fu: FaceUseId) -> Result<bool> {
    let face = model.face(model.faceuse(fu)?.face)?;
    Ok(manifolds.get(face.index) == Some(Manifold::Solid))
}

/// One solid face-use around an edge, seen from its outward side.
#[derive(Debug, Clone, Copy)]
struct EdgeFace {
    normal: Dir3,
    left: Vec3,
}

/// The local picture at an edge hit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct EdgeVerdict {
    pub transition: Transition,
    /// Outward normal of the face the ray arrives through.
    pub in_normal: Vec3,
    /// Outward normal of the face the ray leaves through.
    pub out_normal: Vec3,
    /// Faces lie on both sides of the plane holding the ray and the edge.
    pub both_sides: bool,
}

fn solid_faces_at_edge(
    model: &Model,
    manifolds: &ManifoldTable,
    e: EdgeId,
    at: &Point3,
    tol: &Tolerance,
) -> Result<Vec<EdgeFace>> {
    let mut seen: Vec<EdgeUseId> = Vec::new();
    let mut out = Vec::new();
    for eu in model.radial_uses(e)? {
        let Some(fu) = model.faceuse_of_edgeuse(eu)? else {
            continue;
        };
        let (eu, fu) = if model.faceuse(fu)?.orientation == Orientation::Same {
            (eu, fu)
        } else {
            (model.edgeuse(eu)?.mate, model.faceuse(fu)?.mate)
        };
        if seen.contains(&eu) || !is_solid(model, manifolds, fu)? {
            continue;
        }
        seen.push(eu);
        let normal = faceuse_normal_at(model, fu, at)?;
        let left = model.left_vector_with_normal(eu, &normal, tol)?;
        out.push(EdgeFace { normal, left });
    }
    Ok(out)
}

/// Classify the ray at an edge of solid faces.
///
/// Faces the ray runs along are left out. Returns `None` when no other
/// solid face meets the edge.
pub(crate) fn edge_verdict(
    model: &Model,
    manifolds: &ManifoldTable,
    e: EdgeId,
    dir: &Vec3,
    at: &Point3,
    tol: &Tolerance,
) -> Result<Option<EdgeVerdict>> {
    let faces: Vec<EdgeFace> = solid_faces_at_edge(model, manifolds, e, at, tol)?
        .into_iter()
        .filter(|f| !tol.is_perpendicular(f.normal.dot(dir)))
        .collect();
    let Some(first) = faces.first() else {
        return Ok(None);
    };

    let (mut inbound, mut outbound) = (first, first);
    for f in &faces[1..] {
        let cos = f.left.dot(dir);
        if cos < inbound.left.dot(dir) {
            inbound = f;
        }
        if cos > outbound.left.dot(dir) {
            outbound = f;
        }
    }

    let before = if inbound.normal.dot(dir) < 0.0 {
        RayState::Outside
    } else {
        RayState::Inside
    };
    let after = if outbound.normal.dot(dir) > 0.0 {
        RayState::Outside
    } else {
        RayState::Inside
    };

    let edge_dir = model.edgeuse_vector(model.edge(e)?.edgeuse)?;
    let both_sides = match edge_dir.try_normalize(tol.linear) {
        Some(u) if !tol.is_parallel(dir.dot(&u)) => {
            let p = dir.cross(&u).normalize();
            let left = faces.iter().any(|f| f.left.dot(&p) > tol.perp);
            let right = faces.iter().any(|f| f.left.dot(&p) < -tol.perp);
            left && right
        }
        _ => false,
    };

    Ok(Some(EdgeVerdict {
        transition: Transition::new(before, after),
        in_normal: inbound.normal.into_inner(),
        out_normal: outbound.normal.into_inner(),
        both_sides,
    }))
}

/// The corner of one solid face-use at a vertex: the edge-use leaving the
/// vertex and its predecessor arriving there.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Wedge {
    pub eu: EdgeUseId,
    pub normal: Dir3,
}

/// Corners of every outward solid face-use at `v`, in vertex-use order.
pub(crate) fn solid_wedges_at_vertex(
    model: &Model,
    manifolds: &ManifoldTable,
    v: VertexId,
) -> Result<Vec<Wedge>> {
    let at = model.vertex_point(v)?;
    let mut out = Vec::new();
    for eu in model.edgeuses_from_vertex(v)? {
        let Some(fu) = model.faceuse_of_edgeuse(eu)? else {
            continue;
        };
        if model.faceuse(fu)?.orientation != Orientation::Same || !is_solid(model, manifolds, fu)? {
            continue;
        }
        let normal = faceuse_normal_at(model, fu, &at)?;
        out.push(Wedge { eu, normal });
    }
    Ok(out)
}

/// The local picture at a vertex hit.
#[derive(Debug, Clone, Copy)]
pub(crate) struct VertexVerdict {
    pub transition: Transition,
    pub in_normal: Vec3,
    pub out_normal: Vec3,
}

fn dist_to_ray(p: &Point3, origin: &Point3, dir: &Vec3) -> f64 {
    let s = (p - origin).dot(dir).max(0.0);
    (p - (origin + dir * s)).norm()
}

/// Distance from `pole` to the part of the wedge's face plane that lies
/// between its two edges at the vertex.
fn pole_distance(model: &Model, w: &Wedge, vertex: &Point3, pole: &Point3, tol: &Tolerance) -> Result<f64> {
    let prev = model.prev_in_loop(w.eu)?;
    let dir_a = model.vertex_point(model.eu_end(w.eu)?)? - vertex;
    let dir_b = model.vertex_point(model.eu_start(prev)?)? - vertex;
    let n = w.normal.into_inner();
    let height = (pole - vertex).dot(&n);
    if dir_a.norm() < tol.linear || dir_b.norm() < tol.linear {
        return Ok(height.abs());
    }
    let (dir_a, dir_b) = (dir_a.normalize(), dir_b.normalize());

    let left_a = model.left_vector_with_normal(w.eu, &w.normal, tol)?;
    let left_b = model.left_vector_with_normal(prev, &w.normal, tol)?;
    let u = (pole - n * height) - vertex;
    let (sa, sb) = (left_a.dot(&u), left_b.dot(&u));
    let convex = dir_a.cross(&dir_b).dot(&n) > 0.0;
    let within = if convex {
        sa >= 0.0 && sb >= 0.0
    } else {
        sa >= 0.0 || sb >= 0.0
    };
    if within {
        return Ok(height.abs());
    }
    Ok(dist_to_ray(pole, vertex, &dir_a).min(dist_to_ray(pole, vertex, &dir_b)))
}

fn nearest_wedge<'w>(
    model: &Model,
    wedges: &'w [Wedge],
    vertex: &Point3,
    pole: &Point3,
    tol: &Tolerance,
) -> Result<Option<&'w Wedge>> {
    let mut best: Option<(&Wedge, f64)> = None;
    for w in wedges {
        let d = pole_distance(model, w, vertex, pole, tol)?;
        if best.map_or(true, |(_, bd)| d < bd) {
            best = Some((w, d));
        }
    }
    Ok(best.map(|(w, _)| w))
}

/// State at a pole given the outward normal of its nearest face and the
/// unit direction from the vertex to the pole. A pole lying in the face
/// plane counts as outside.
fn pole_state(normal: &Dir3, toward_pole: &Vec3, tol: &Tolerance) -> RayState {
    let s = normal.dot(toward_pole);
    if s < -tol.perp {
        RayState::Inside
    } else {
        RayState::Outside
    }
}

/// Classify the ray at a vertex by its two poles.
pub(crate) fn vertex_verdict(
    model: &Model,
    wedges: &[Wedge],
    v: VertexId,
    dir: &Vec3,
    tol: &Tolerance,
) -> Result<Option<VertexVerdict>> {
    let vertex = model.vertex_point(v)?;
    let h = POLE_SCALE * tol.linear;
    let north = vertex - dir * h;
    let south = vertex + dir * h;
    let (Some(wn), Some(ws)) = (
        nearest_wedge(model, wedges, &vertex, &north, tol)?,
        nearest_wedge(model, wedges, &vertex, &south, tol)?,
    ) else {
        return Ok(None);
    };
    Ok(Some(VertexVerdict {
        transition: Transition::new(
            pole_state(&wn.normal, &-dir, tol),
            pole_state(&ws.normal, dir, tol),
        ),
        in_normal: wn.normal.into_inner(),
        out_normal: ws.normal.into_inner(),
    }))
}
