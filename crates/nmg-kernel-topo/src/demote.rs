//! Demotion: drop a loop to wire edges, or a wire edge to point-loops.

use tracing::debug;

use crate::error::{Result, TopoError};
use crate::model::{
    EdgeParent, EdgeUseId, KillStatus, LoopContents, LoopParent, LoopUseId, Model, Orientation,
};

impl Model {
    /// Move every edge-use of `lu` (and of its mate) into the owning shell
    /// as wire edges, then kill the emptied loop.
    ///
    /// Wire edges land in the shell in loop order, each use followed by its
    /// mate. Reports whether the loop's parent is now empty.
    pub fn demote_loop_to_wire(&mut self, lu: LoopUseId) -> Result<KillStatus> {
        let rec = self.loopuse(lu)?;
        let (index, mate, parent) = (rec.index, rec.mate, rec.parent);
        let eus = match &rec.contents {
            LoopContents::Vertex(_) => return Err(TopoError::VertexLoop(index)),
            LoopContents::Edges(eus) => eus.clone(),
        };
        let s = match parent {
            LoopParent::Shell(s) => s,
            LoopParent::FaceUse(fu) => self.faceuse(fu)?.shell,
        };
        self.shell(s)?;

        let mut wires = Vec::with_capacity(eus.len() * 2);
        for eu in &eus {
            let eu_mate = self.edgeuse(*eu)?.mate;
            wires.push(*eu);
            wires.push(eu_mate);
        }
        for &eu in &wires {
            self.edgeuses[eu].parent = EdgeParent::Shell(s);
        }
        for l in [lu, mate] {
            self.loopuses[l].contents = LoopContents::Edges(Vec::new());
        }
        self.shells[s].edgeuses.extend(wires);

        debug!(loopuse = index, edges = eus.len(), "demoted loop to wire edges");
        self.kill_loop_use(lu)
    }

    /// Replace a wire edge by point-loops at its endpoints.
    ///
    /// An endpoint that already has a point-loop in the shell is left
    /// alone. Reports whether the shell is now empty.
    pub fn demote_edge_to_points(&mut self, eu: EdgeUseId) -> Result<KillStatus> {
        let rec = self.edgeuse(eu)?;
        let index = rec.index;
        let s = match rec.parent {
            EdgeParent::Shell(s) => s,
            EdgeParent::LoopUse(_) => {
                return Err(TopoError::WrongParent {
                    kind: "edge-use",
                    index,
                    expected: "shell",
                })
            }
        };
        let (start, end) = (self.eu_start(eu)?, self.eu_end(eu)?);
        let ends = if start == end { vec![start] } else { vec![start, end] };
        for v in ends {
            if !self.is_vertex_selfloop_in_shell(v, s)? {
                self.make_loop(LoopParent::Shell(s), Some(v), Orientation::Same)?;
            }
        }
        debug!(edgeuse = index, "demoted wire edge to points");
        self.kill_edge_use(eu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demote_edge_to_points_scenario() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        // a - b - c, and a point-loop already at c
        let ab = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(ab).unwrap(), m.eu_end(ab).unwrap());
        let bc = m.make_edge(Some(b), None, s).unwrap();
        let c = m.eu_end(bc).unwrap();
        let ca = m.make_edge(Some(c), Some(a), s).unwrap();
        m.make_loop(LoopParent::Shell(s), Some(c), Orientation::Same).unwrap();
        let loops_before = m.shells[s].loopuses.len();

        let e = m.edgeuses[ca].edge;
        let status = m.demote_edge_to_points(ca).unwrap();
        assert_eq!(status, KillStatus::StillNonEmpty);
        assert!(m.edge(e).is_err());
        assert!(m.edgeuse(ca).is_err());
        // one new point-loop pair at a, none at c
        assert_eq!(m.shells[s].loopuses.len(), loops_before + 2);
        assert!(m.is_vertex_selfloop_in_shell(a, s).unwrap());
        assert!(m.is_vertex_selfloop_in_shell(c, s).unwrap());
        assert!(!m.is_vertex_selfloop_in_shell(b, s).unwrap());
    }

    #[test]
    fn test_demote_loop_edge_rejected() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lu = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        let vu = m.loopuses[lu].contents.vertex().unwrap();
        let eu = m.make_edge_on_vertex_use(vu).unwrap();
        assert!(matches!(
            m.demote_edge_to_points(eu),
            Err(TopoError::WrongParent { .. })
        ));
    }

    #[test]
    fn test_demote_loop_to_wire() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let e1 = m.make_edge(None, None, s).unwrap();
        let (a, b) = (m.eu_start(e1).unwrap(), m.eu_end(e1).unwrap());
        let e2 = m.make_edge(Some(b), None, s).unwrap();
        let c = m.eu_end(e2).unwrap();
        let e3 = m.make_edge(Some(c), Some(a), s).unwrap();
        let lu = m.make_loop_from_wire_edges(s).unwrap();
        let fu = m.make_face(lu).unwrap();

        let status = m.demote_loop_to_wire(lu).unwrap();
        assert!(status.parent_empty());
        assert!(m.loops.is_empty());
        let wires = &m.shells[s].edgeuses;
        assert_eq!(wires.len(), 6);
        assert_eq!(wires[0], e1);
        assert_eq!(wires[2], e2);
        assert_eq!(wires[4], e3);
        for eu in wires {
            assert_eq!(m.edgeuses[*eu].parent, EdgeParent::Shell(s));
        }
        m.kill_face_use(fu).unwrap();
        assert_eq!(m.shells[s].edgeuses.len(), 6);
    }

    #[test]
    fn test_demote_vertex_loop_fails() {
        let mut m = Model::new();
        let (_, s) = m.make_region_shell_vertex();
        let lu = m.make_loop(LoopParent::Shell(s), None, Orientation::Same).unwrap();
        assert!(matches!(m.demote_loop_to_wire(lu), Err(TopoError::VertexLoop(_))));
    }
}
