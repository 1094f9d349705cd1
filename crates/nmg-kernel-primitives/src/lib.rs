#![warn(missing_docs)]

//! Primitive model construction for the nmg kernel.
//!
//! Drives the make and join operations of `nmg-kernel-topo` to build
//! complete, checked models: an isolated point, a wire segment, a square
//! sheet, a box, and two boxes meeting along one edge. Every builder
//! assigns face planes, edge lines and bounding boxes before returning.

use nmg_kernel_math::{Point3, Tolerance};
use nmg_kernel_topo::{FaceUseId, Model, RegionId, Result, ShellId, VertexId};
use tracing::debug;

/// Result of building a primitive: the model and its single region/shell.
#[derive(Debug, Clone)]
pub struct NmgSolid {
    /// The model.
    pub model: Model,
    /// The region holding the primitive.
    pub region: RegionId,
    /// The shell holding the primitive.
    pub shell: ShellId,
}

/// Build a face in shell `s` whose boundary runs through `corners` in
/// order.
///
/// `slots` maps corner numbers to vertices; an empty slot gets a fresh
/// vertex at `coords[corner]`, so faces built one after another share
/// vertices at common corners. The returned face-use runs the corners in
/// the given order; they should be counter-clockwise seen from outside.
pub fn polygon_face(
    model: &mut Model,
    s: ShellId,
    slots: &mut [Option<VertexId>],
    coords: &[Point3],
    corners: &[usize],
) -> Result<FaceUseId> {
    for (i, &c) in corners.iter().enumerate() {
        let next = corners[(i + 1) % corners.len()];
        let eu = model.make_edge(slots[c], slots[next], s)?;
        let (a, b) = (model.eu_start(eu)?, model.eu_end(eu)?);
        for (corner, v) in [(c, a), (next, b)] {
            if slots[corner].is_none() {
                model.assign_vertex_coordinate(v, coords[corner])?;
                slots[corner] = Some(v);
            }
        }
    }
    let lu = model.make_loop_from_wire_edges(s)?;
    model.make_face(lu)
}

/// Assign planes to the faces, share one line per edge, and recompute
/// every bounding box.
pub fn finish_faces(model: &mut Model, faceuses: &[FaceUseId], tol: &Tolerance) -> Result<()> {
    for &fu in faceuses {
        model.calc_face_plane(fu, tol)?;
        for eu in model.edgeuses_of_faceuse(fu)? {
            if model.edgeuse(eu)?.geom.is_none() {
                model.assign_edge_geometry(eu, tol)?;
            }
        }
    }
    model.rebound(tol)
}

/// Build a single isolated point.
pub fn make_point(p: Point3) -> Result<NmgSolid> {
    let mut model = Model::new();
    let (region, shell) = model.make_region_shell_vertex();
    if let Some(vu) = model.shell(shell)?.vertexuse {
        let v = model.vertexuse(vu)?.vertex;
        model.assign_vertex_coordinate(v, p)?;
    }
    model.rebound(&Tolerance::DEFAULT)?;
    Ok(NmgSolid {
        model,
        region,
        shell,
    })
}

/// Build a single wire edge from `a` to `b`.
pub fn make_wire_segment(a: Point3, b: Point3) -> Result<NmgSolid> {
    let tol = Tolerance::DEFAULT;
    let mut model = Model::new();
    let (region, shell) = model.make_region_shell_vertex();
    let eu = model.make_edge(None, None, shell)?;
    model.assign_vertex_coordinate(model.eu_start(eu)?, a)?;
    model.assign_vertex_coordinate(model.eu_end(eu)?, b)?;
    model.assign_edge_geometry(eu, &tol)?;
    model.rebound(&tol)?;
    Ok(NmgSolid {
        model,
        region,
        shell,
    })
}

/// Build a square sheet of side `size` in the plane `z`, corner at
/// `(0, 0, z)`, with its outward normal along +Z.
pub fn make_square_sheet(size: f64, z: f64) -> Result<NmgSolid> {
    let tol = Tolerance::DEFAULT;
    let mut model = Model::new();
    let (region, shell) = model.make_region_shell_vertex();
    let coords = [
        Point3::new(0.0, 0.0, z),
        Point3::new(size, 0.0, z),
        Point3::new(size, size, z),
        Point3::new(0.0, size, z),
    ];
    let mut slots = [None; 4];
    let fu = polygon_face(&mut model, shell, &mut slots, &coords, &[0, 1, 2, 3])?;
    finish_faces(&mut model, &[fu], &tol)?;
    Ok(NmgSolid {
        model,
        region,
        shell,
    })
}

/// Corner lists of the six box faces, counter-clockwise from outside,
/// for the corner numbering of [`box_corners`].
const BOX_FACES: [[usize; 4]; 6] = [
    [0, 3, 2, 1], // bottom, -Z
    [4, 5, 6, 7], // top, +Z
    [0, 1, 5, 4], // front, -Y
    [2, 3, 7, 6], // back, +Y
    [0, 4, 7, 3], // left, -X
    [1, 2, 6, 5], // right, +X
];

/// The eight corners of an axis-aligned box.
///
/// ```text
///     v4----v5
///    /|    /|
///   v7----v6|    z
///   | v0--|-v1   | y
///   |/    |/     |/
///   v3----v2     +---x
/// ```
fn box_corners(min: Point3, max: Point3) -> [Point3; 8] {
    [
        Point3::new(min.x, min.y, min.z),
        Point3::new(max.x, min.y, min.z),
        Point3::new(max.x, max.y, min.z),
        Point3::new(min.x, max.y, min.z),
        Point3::new(min.x, min.y, max.z),
        Point3::new(max.x, min.y, max.z),
        Point3::new(max.x, max.y, max.z),
        Point3::new(min.x, max.y, max.z),
    ]
}

fn box_faces(
    model: &mut Model,
    s: ShellId,
    slots: &mut [Option<VertexId>],
    coords: &[Point3],
    offset: usize,
) -> Result<Vec<FaceUseId>> {
    let mut fus = Vec::with_capacity(6);
    for face in BOX_FACES {
        let corners = face.map(|c| c + offset);
        fus.push(polygon_face(model, s, slots, coords, &corners)?);
    }
    Ok(fus)
}

/// Build a box with corner at the origin and dimensions `(sx, sy, sz)`.
///
/// The box has 6 planar faces, 12 edges and 8 vertices, glued into one
/// closed shell.
pub fn make_cube(sx: f64, sy: f64, sz: f64) -> Result<NmgSolid> {
    let tol = Tolerance::DEFAULT;
    let mut model = Model::new();
    let (region, shell) = model.make_region_shell_vertex();
    let coords = box_corners(Point3::origin(), Point3::new(sx, sy, sz));
    let mut slots = [None; 8];
    let fus = box_faces(&mut model, shell, &mut slots, &coords, 0)?;
    model.glue_faces(&fus)?;
    finish_faces(&mut model, &fus, &tol)?;
    debug!(faces = fus.len(), edges = model.edges.len(), "built box");
    Ok(NmgSolid {
        model,
        region,
        shell,
    })
}

/// Build two unit boxes in one shell touching along a single edge.
///
/// The first box spans `[0, 1]^3`, the second `[1, 2] x [1, 2] x [0, 1]`.
/// They share the vertical edge at `x = 1, y = 1`, whose radial cycle
/// therefore carries four faces.
pub fn make_boxes_sharing_edge() -> Result<NmgSolid> {
    let tol = Tolerance::DEFAULT;
    let mut model = Model::new();
    let (region, shell) = model.make_region_shell_vertex();

    let a = box_corners(Point3::origin(), Point3::new(1.0, 1.0, 1.0));
    let b = box_corners(Point3::new(1.0, 1.0, 0.0), Point3::new(2.0, 2.0, 1.0));
    let coords: Vec<Point3> = a.iter().chain(b.iter()).copied().collect();
    let mut slots = vec![None; 16];

    let mut fus = box_faces(&mut model, shell, &mut slots, &coords, 0)?;
    // box B's v0 and v4 sit on box A's v2 and v6
    slots[8] = slots[2];
    slots[12] = slots[6];
    fus.extend(box_faces(&mut model, shell, &mut slots, &coords, 8)?);

    model.glue_faces(&fus)?;
    finish_faces(&mut model, &fus, &tol)?;
    Ok(NmgSolid {
        model,
        region,
        shell,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nmg_kernel_topo::Manifold;

    #[test]
    fn test_make_cube_topology() {
        let solid = make_cube(10.0, 10.0, 10.0).unwrap();
        let m = &solid.model;
        m.check().unwrap();
        assert_eq!(m.faces.len(), 6);
        assert_eq!(m.faceuses.len(), 12);
        assert_eq!(m.edges.len(), 12);
        assert_eq!(m.edgeuses.len(), 48);
        assert_eq!(m.vertices.len(), 8);
        for e in m.edges.keys() {
            assert_eq!(m.radial_uses(e).unwrap().len(), 4);
        }
    }

    #[test]
    fn test_make_cube_outward_normals() {
        let solid = make_cube(2.0, 3.0, 4.0).unwrap();
        let m = &solid.model;
        let center = Point3::new(1.0, 1.5, 2.0);
        for (fu, rec) in &m.faceuses {
            let plane = m.faceuse_plane(fu).unwrap();
            let d = plane.signed_distance(&center);
            match rec.orientation {
                nmg_kernel_topo::Orientation::Same => assert!(d < 0.0),
                _ => assert!(d > 0.0),
            }
        }
    }

    #[test]
    fn test_make_cube_is_solid() {
        let solid = make_cube(1.0, 1.0, 1.0).unwrap();
        let m = &solid.model;
        let table = m.manifolds().unwrap();
        for f in m.faces.values() {
            assert_eq!(table.get(f.index), Some(Manifold::Solid));
        }
        for e in m.edges.values() {
            assert_eq!(table.get(e.index), Some(Manifold::Solid));
        }
        let bbox = m.regions[solid.region].bbox.unwrap();
        for v in m.vertices.values() {
            assert!(bbox.contains_point(&v.coord.unwrap()));
        }
    }

    #[test]
    fn test_square_sheet_is_dangling() {
        let solid = make_square_sheet(1.0, 0.5).unwrap();
        let m = &solid.model;
        m.check().unwrap();
        let table = m.manifolds().unwrap();
        let f = m.faces.values().next().unwrap();
        assert_eq!(table.get(f.index), Some(Manifold::Sheet));
        let n = m.face_normal(m.faceuses[f.faceuse].face).unwrap();
        assert_relative_eq!(n.z, 1.0);
        let bbox = m.shells[solid.shell].bbox.unwrap();
        assert!(bbox.max.z - bbox.min.z > 0.0);
    }

    #[test]
    fn test_point_and_wire() {
        let p = make_point(Point3::new(1.0, 2.0, 3.0)).unwrap();
        assert_eq!(p.model.vertices.len(), 1);
        assert!(p.model.shells[p.shell].bbox.is_some());

        let w = make_wire_segment(Point3::origin(), Point3::new(0.0, 0.0, 2.0)).unwrap();
        w.model.check().unwrap();
        assert_eq!(w.model.edges.len(), 1);
        assert_eq!(w.model.geometry.edges.len(), 1);
    }

    #[test]
    fn test_boxes_sharing_edge() {
        let solid = make_boxes_sharing_edge().unwrap();
        let m = &solid.model;
        m.check().unwrap();
        assert_eq!(m.vertices.len(), 14);
        assert_eq!(m.edges.len(), 23);
        let shared = m
            .edges
            .keys()
            .find(|e| m.radial_uses(*e).unwrap().len() == 8)
            .unwrap();
        let eu = m.edges[shared].edgeuse;
        let a = m.vertex_point(m.eu_start(eu).unwrap()).unwrap();
        assert_relative_eq!(a.x, 1.0);
        assert_relative_eq!(a.y, 1.0);
    }
}
