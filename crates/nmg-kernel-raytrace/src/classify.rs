//! Point-in-face classification.
//!
//! Each loop of the face-use is judged on its own by the boundary element
//! closest to the point, then the verdicts are combined: a point is inside
//! when more same-side loops hold it than holes swallow it. Exact touches
//! are reported to a [`TouchObserver`] and make the point `OnBoundary`.

use nmg_kernel_math::{dist_point_segment, Dir3, Point3, PointSegment, Tolerance};
use nmg_kernel_topo::{EdgeUseId, FaceUseId, LoopContents, LoopUseId, Model, Orientation, VertexId};

use crate::error::Result;

/// Where a point lies relative to a face-use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointClass {
    /// Inside the face material.
    Inside,
    /// Within tolerance of an edge or vertex of the face.
    OnBoundary,
    /// Outside the face.
    Outside,
}

/// The boundary element that decided a classification.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosestElement {
    /// Interior of an edge-use span, with the closest point on it.
    Edge {
        /// The edge-use.
        eu: EdgeUseId,
        /// Point of closest approach.
        pca: Point3,
    },
    /// An endpoint of an edge-use.
    Vertex {
        /// The vertex.
        v: VertexId,
        /// The edge-use the vertex was reached through.
        eu: EdgeUseId,
    },
    /// The vertex of a point-loop.
    PointLoop {
        /// The loop-use.
        lu: LoopUseId,
        /// Its vertex.
        v: VertexId,
    },
}

/// Result of classifying one point against one face-use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceClassification {
    /// The verdict.
    pub class: PointClass,
    /// Closest boundary element, if the face had any unrejected loop.
    pub closest: Option<ClosestElement>,
    /// Distance to the closest element.
    pub dist: f64,
}

/// Receives every exact boundary touch found while classifying.
///
/// Each edge-use and vertex is reported at most once per call.
pub trait TouchObserver {
    /// The point lies on the interior of edge-use `eu`.
    fn edge_touch(&mut self, _eu: EdgeUseId, _pca: &Point3) -> Result<()> {
        Ok(())
    }

    /// The point lies on vertex `v`.
    fn vertex_touch(&mut self, _v: VertexId) -> Result<()> {
        Ok(())
    }
}

impl TouchObserver for () {}

/// Verdict for one loop.
enum LoopVerdict {
    Touch(ClosestElement),
    Closest {
        element: ClosestElement,
        dist: f64,
        inside: bool,
    },
    Rejected,
}

/// Classifies points against the face-uses of one model.
#[derive(Debug, Clone, Copy)]
pub struct FaceClassifier<'a> {
    model: &'a Model,
    tol: Tolerance,
    first_touch: bool,
}

impl<'a> FaceClassifier<'a> {
    /// A classifier over `model`. With `first_touch` set, the search stops
    /// at the first boundary touch instead of reporting every one.
    pub fn new(model: &'a Model, tol: Tolerance, first_touch: bool) -> Self {
        Self {
            model,
            tol,
            first_touch,
        }
    }

    /// Classify `pt`, assumed to lie on the face, against face-use `fu`.
    ///
    /// `normal` is the face-use's outward normal at `pt`; `ignore` names a
    /// loop-use to leave out.
    pub fn classify(
        &self,
        fu: FaceUseId,
        normal: &Dir3,
        pt: &Point3,
        ignore: Option<LoopUseId>,
        observer: &mut dyn TouchObserver,
    ) -> Result<FaceClassification> {
        let mut touched_edges = Vec::new();
        let mut touched_verts = Vec::new();
        let mut first_touch: Option<ClosestElement> = None;
        let mut closest: Option<(ClosestElement, f64)> = None;
        let mut same_in = 0usize;
        let mut holes_in = 0usize;
        let mut edge_loops = 0usize;

        for &lu in &self.model.faceuse(fu)?.loopuses {
            if Some(lu) == ignore {
                continue;
            }
            let orientation = self.model.loopuse(lu)?.orientation;
            let verdict = self.classify_loop(
                lu,
                normal,
                pt,
                observer,
                &mut touched_edges,
                &mut touched_verts,
            )?;
            match verdict {
                LoopVerdict::Rejected => {}
                LoopVerdict::Touch(element) => {
                    first_touch.get_or_insert(element);
                    if self.first_touch {
                        break;
                    }
                }
                LoopVerdict::Closest {
                    element,
                    dist,
                    inside,
                } => {
                    if !matches!(element, ClosestElement::PointLoop { .. }) {
                        edge_loops += 1;
                        match (orientation, inside) {
                            (Orientation::Same, true) => same_in += 1,
                            (Orientation::Opposite, false) => holes_in += 1,
                            _ => {}
                        }
                    }
                    if closest.map_or(true, |(_, d)| dist < d) {
                        closest = Some((element, dist));
                    }
                }
            }
        }

        if let Some(element) = first_touch {
            return Ok(FaceClassification {
                class: PointClass::OnBoundary,
                closest: Some(element),
                dist: 0.0,
            });
        }
        let Some((element, dist)) = closest else {
            return Ok(FaceClassification {
                class: PointClass::Outside,
                closest: None,
                dist: f64::INFINITY,
            });
        };

        let inside = if edge_loops > 0 {
            same_in > holes_in
        } else if let ClosestElement::PointLoop { lu, .. } = element {
            self.model.loopuse(lu)?.orientation == Orientation::Same
        } else {
            false
        };
        Ok(FaceClassification {
            class: if inside {
                PointClass::Inside
            } else {
                PointClass::Outside
            },
            closest: Some(element),
            dist,
        })
    }

    fn classify_loop(
        &self,
        lu: LoopUseId,
        normal: &Dir3,
        pt: &Point3,
        observer: &mut dyn TouchObserver,
        touched_edges: &mut Vec<EdgeUseId>,
        touched_verts: &mut Vec<VertexId>,
    ) -> Result<LoopVerdict> {
        let m = self.model;
        let rec = m.loopuse(lu)?;
        let bbox = m.loops.get(rec.lp).and_then(|l| l.bbox);
        if let Some(bbox) = bbox {
            if !bbox.contains_point_tol(pt, self.tol.linear) {
                return Ok(LoopVerdict::Rejected);
            }
        }

        let eus = match &rec.contents {
            LoopContents::Vertex(vu) => {
                let v = m.vertexuse(*vu)?.vertex;
                let dist = (pt - m.vertex_point(v)?).norm();
                let element = ClosestElement::PointLoop { lu, v };
                if dist < self.tol.linear {
                    if !touched_verts.contains(&v) {
                        touched_verts.push(v);
                        observer.vertex_touch(v)?;
                    }
                    return Ok(LoopVerdict::Touch(element));
                }
                return Ok(LoopVerdict::Closest {
                    element,
                    dist,
                    inside: false,
                });
            }
            LoopContents::Edges(eus) => eus,
        };

        let mut touch = None;
        let mut best: Option<(ClosestElement, f64)> = None;
        for &eu in eus {
            let (va, vb) = (m.eu_start(eu)?, m.eu_end(eu)?);
            let (a, b) = (m.vertex_point(va)?, m.vertex_point(vb)?);
            let (code, dist, pca) = dist_point_segment(&a, &b, pt, &self.tol);
            let candidate = match code {
                PointSegment::OnInterior => {
                    if !touched_edges.contains(&eu) {
                        touched_edges.push(eu);
                        observer.edge_touch(eu, &pca)?;
                    }
                    touch.get_or_insert(ClosestElement::Edge { eu, pca });
                    if self.first_touch {
                        break;
                    }
                    continue;
                }
                PointSegment::AtStart | PointSegment::AtEnd => {
                    let v = if code == PointSegment::AtStart { va } else { vb };
                    if !touched_verts.contains(&v) {
                        touched_verts.push(v);
                        observer.vertex_touch(v)?;
                    }
                    touch.get_or_insert(ClosestElement::Vertex { v, eu });
                    if self.first_touch {
                        break;
                    }
                    continue;
                }
                PointSegment::Interior => ClosestElement::Edge { eu, pca },
                PointSegment::BeyondStart => ClosestElement::Vertex { v: va, eu },
                PointSegment::BeyondEnd => ClosestElement::Vertex { v: vb, eu },
            };
            if best.map_or(true, |(_, d)| dist < d) {
                best = Some((candidate, dist));
            }
        }

        if let Some(element) = touch {
            return Ok(LoopVerdict::Touch(element));
        }
        let Some((element, dist)) = best else {
            return Ok(LoopVerdict::Rejected);
        };
        let inside = match element {
            ClosestElement::Edge { eu, pca } => {
                let left = m.left_vector_with_normal(eu, normal, &self.tol)?;
                left.dot(&(pt - pca)) > 0.0
            }
            ClosestElement::Vertex { v, .. } => self.inside_at_vertex(eus, v, normal, pt)?,
            ClosestElement::PointLoop { .. } => false,
        };
        Ok(LoopVerdict::Closest {
            element,
            dist,
            inside,
        })
    }

    /// Break a tie at a vertex: of all loop edges meeting `v`, the one whose
    /// left vector is most anti-parallel to the vertex-to-point direction
    /// decides. The first such edge in loop order wins exact ties.
    fn inside_at_vertex(
        &self,
        eus: &[EdgeUseId],
        v: VertexId,
        normal: &Dir3,
        pt: &Point3,
    ) -> Result<bool> {
        let m = self.model;
        let to_pt = pt - m.vertex_point(v)?;
        let norm = to_pt.norm();
        if norm < self.tol.linear {
            return Ok(false);
        }
        let u = to_pt / norm;
        let mut decider: Option<f64> = None;
        for &eu in eus {
            if m.eu_start(eu)? != v && m.eu_end(eu)? != v {
                continue;
            }
            let cos = m.left_vector_with_normal(eu, normal, &self.tol)?.dot(&u);
            if decider.map_or(true, |best| cos < best) {
                decider = Some(cos);
            }
        }
        Ok(decider.is_some_and(|cos| cos > 0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nmg_kernel_primitives::{finish_faces, make_square_sheet, polygon_face};

    #[derive(Default)]
    struct Recorder {
        edges: Vec<EdgeUseId>,
        verts: Vec<VertexId>,
    }

    impl TouchObserver for Recorder {
        fn edge_touch(&mut self, eu: EdgeUseId, _pca: &Point3) -> Result<()> {
            self.edges.push(eu);
            Ok(())
        }

        fn vertex_touch(&mut self, v: VertexId) -> Result<()> {
            self.verts.push(v);
            Ok(())
        }
    }

    fn same_faceuse(m: &Model) -> FaceUseId {
        m.faceuses
            .iter()
            .find(|(_, fu)| fu.orientation == Orientation::Same)
            .map(|(id, _)| id)
            .unwrap()
    }

    /// L-shaped face with a reflex corner at (1, 1).
    fn l_shape() -> (Model, FaceUseId) {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let coords = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(1.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let mut slots = [None; 6];
        let fu = polygon_face(&mut m, s, &mut slots, &coords, &[0, 1, 2, 3, 4, 5]).unwrap();
        finish_faces(&mut m, &[fu], &Tolerance::DEFAULT).unwrap();
        (m, fu)
    }

    fn classify(m: &Model, fu: FaceUseId, p: Point3) -> FaceClassification {
        let n = m.faceuse_normal(fu).unwrap();
        FaceClassifier::new(m, Tolerance::DEFAULT, true)
            .classify(fu, &n, &p, None, &mut ())
            .unwrap()
    }

    #[test]
    fn test_square_inside_outside() {
        let sheet = make_square_sheet(1.0, 0.0).unwrap();
        let m = &sheet.model;
        let fu = same_faceuse(m);
        let inside = classify(m, fu, Point3::new(0.5, 0.4, 0.0));
        assert_eq!(inside.class, PointClass::Inside);
        assert!(matches!(inside.closest, Some(ClosestElement::Edge { .. })));
        assert!((inside.dist - 0.4).abs() < 1e-12);

        let outside = classify(m, fu, Point3::new(0.5, -0.0001, 0.0));
        assert_eq!(outside.class, PointClass::Outside);

        // bounding box reject
        let far = classify(m, fu, Point3::new(5.0, 5.0, 0.0));
        assert_eq!(far.class, PointClass::Outside);
        assert!(far.closest.is_none());
    }

    #[test]
    fn test_square_from_other_side() {
        let sheet = make_square_sheet(1.0, 0.0).unwrap();
        let m = &sheet.model;
        let fu = m.faceuses[same_faceuse(m)].mate;
        assert_eq!(
            classify(m, fu, Point3::new(0.5, 0.5, 0.0)).class,
            PointClass::Inside
        );
        assert_eq!(
            classify(m, fu, Point3::new(1.5, 0.5, 0.0)).class,
            PointClass::Outside
        );
    }

    #[test]
    fn test_touches_are_reported_once() {
        let sheet = make_square_sheet(1.0, 0.0).unwrap();
        let m = &sheet.model;
        let fu = same_faceuse(m);
        let n = m.faceuse_normal(fu).unwrap();
        let classifier = FaceClassifier::new(m, Tolerance::DEFAULT, false);

        let mut rec = Recorder::default();
        let c = classifier
            .classify(fu, &n, &Point3::new(0.5, 0.0, 0.0), None, &mut rec)
            .unwrap();
        assert_eq!(c.class, PointClass::OnBoundary);
        assert_eq!(rec.edges.len(), 1);
        assert!(rec.verts.is_empty());

        // a corner is the end of one edge and the start of the next
        let mut rec = Recorder::default();
        let c = classifier
            .classify(fu, &n, &Point3::new(1.0, 1.0, 0.0), None, &mut rec)
            .unwrap();
        assert_eq!(c.class, PointClass::OnBoundary);
        assert_eq!(rec.verts.len(), 1);
        assert!(matches!(c.closest, Some(ClosestElement::Vertex { .. })));
    }

    #[test]
    fn test_beyond_convex_corner_is_outside() {
        let sheet = make_square_sheet(1.0, 0.0).unwrap();
        let m = &sheet.model;
        let fu = same_faceuse(m);
        let c = classify(m, fu, Point3::new(-0.5, -0.5, 0.0));
        assert_eq!(c.class, PointClass::Outside);
        assert!(matches!(c.closest, Some(ClosestElement::Vertex { .. })));
    }

    #[test]
    fn test_reflex_corner() {
        let (m, fu) = l_shape();
        let notch = classify(&m, fu, Point3::new(1.5, 1.5, 0.0));
        assert_eq!(notch.class, PointClass::Outside);

        let behind = classify(&m, fu, Point3::new(0.9, 0.9, 0.0));
        assert_eq!(behind.class, PointClass::Inside);
        assert!(matches!(behind.closest, Some(ClosestElement::Vertex { .. })));

        let near = classify(&m, fu, Point3::new(1.2, 1.2, 0.0));
        assert_eq!(near.class, PointClass::Outside);
    }

    #[test]
    fn test_classification_is_idempotent() {
        let (m, fu) = l_shape();
        for p in [
            Point3::new(0.5, 1.5, 0.0),
            Point3::new(1.5, 1.5, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(3.0, 0.5, 0.0),
        ] {
            assert_eq!(classify(&m, fu, p), classify(&m, fu, p));
        }
    }

    #[test]
    fn test_ignored_loop() {
        let sheet = make_square_sheet(1.0, 0.0).unwrap();
        let m = &sheet.model;
        let fu = same_faceuse(m);
        let lu = m.faceuses[fu].loopuses[0];
        let n = m.faceuse_normal(fu).unwrap();
        let c = FaceClassifier::new(m, Tolerance::DEFAULT, true)
            .classify(fu, &n, &Point3::new(0.5, 0.5, 0.0), Some(lu), &mut ())
            .unwrap();
        assert_eq!(c.class, PointClass::Outside);
    }
}
