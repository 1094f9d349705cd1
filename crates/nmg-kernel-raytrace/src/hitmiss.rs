//! Per-ray hit/miss bookkeeping.
//!
//! Every face, edge and vertex is tagged at most once per ray in a table
//! indexed by the model's element index. Confirmed hits go into a list
//! kept sorted by distance along the ray.

use nmg_kernel_math::{Point3, Vec3};
use nmg_kernel_topo::{EdgeId, FaceId, Model, VertexId};

use crate::error::Result;

/// The element a hit was made on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HitElement {
    /// Interior of a face.
    Face(FaceId),
    /// Interior of an edge.
    Edge(EdgeId),
    /// A vertex.
    Vertex(VertexId),
}

impl HitElement {
    /// The element's model index.
    pub fn index(&self, model: &Model) -> Result<usize> {
        Ok(match *self {
            HitElement::Face(f) => model.face(f)?.index,
            HitElement::Edge(e) => model.edge(e)?.index,
            HitElement::Vertex(v) => model.vertex(v)?.index,
        })
    }
}

/// What the ray did to an element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    /// The ray misses the element.
    Miss,
    /// The element carries a hit of its own.
    Hit,
    /// The element was resolved through hits on its sub-elements.
    HitSub,
}

/// One point where the ray meets the model.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    /// Distance along the ray.
    pub dist: f64,
    /// The hit point.
    pub point: Point3,
    /// What was hit.
    pub element: HitElement,
    /// Outward normal of a face hit.
    pub normal: Option<Vec3>,
    /// The wire edge this vertex hit runs colinear with.
    pub colinear: Option<EdgeId>,
}

impl Hit {
    /// A hit with no normal and no colinear wire.
    pub fn new(dist: f64, point: Point3, element: HitElement) -> Self {
        Self {
            dist,
            point,
            element,
            normal: None,
            colinear: None,
        }
    }
}

/// The tag table and sorted hit list for one ray.
#[derive(Debug, Clone, Default)]
pub struct HitList {
    tags: Vec<Option<Tag>>,
    hits: Vec<Hit>,
}

impl HitList {
    /// An empty list for a model whose indices are below `size`.
    pub fn new(size: usize) -> Self {
        Self {
            tags: vec![None; size],
            hits: Vec::new(),
        }
    }

    /// Tag of the element with this index.
    pub fn tag(&self, index: usize) -> Option<Tag> {
        self.tags.get(index).copied().flatten()
    }

    /// True when the element already has a tag.
    pub fn is_tagged(&self, index: usize) -> bool {
        self.tag(index).is_some()
    }

    /// Tag an element unless it already has one. Returns whether the tag
    /// was set.
    pub fn mark(&mut self, index: usize, tag: Tag) -> bool {
        if index >= self.tags.len() {
            self.tags.resize(index + 1, None);
        }
        let slot = &mut self.tags[index];
        if slot.is_some() {
            return false;
        }
        *slot = Some(tag);
        true
    }

    /// Tag an element as hit and insert its hit in distance order. Does
    /// nothing if the element was already tagged.
    pub fn insert(&mut self, index: usize, hit: Hit) -> bool {
        if !self.mark(index, Tag::Hit) {
            return false;
        }
        self.push_sorted(hit);
        true
    }

    /// Insert a hit in distance order without touching the tag table.
    /// Equal distances keep arrival order.
    pub(crate) fn push_sorted(&mut self, hit: Hit) {
        let at = self
            .hits
            .iter()
            .position(|h| h.dist > hit.dist)
            .unwrap_or(self.hits.len());
        self.hits.insert(at, hit);
    }

    /// The hits, nearest first.
    pub fn hits(&self) -> &[Hit] {
        &self.hits
    }

    /// Take the hits, nearest first.
    pub fn into_hits(self) -> Vec<Hit> {
        self.hits
    }

    /// Number of hits.
    pub fn len(&self) -> usize {
        self.hits.len()
    }

    /// True when nothing was hit.
    pub fn is_empty(&self) -> bool {
        self.hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex_hit(m: &mut Model, dist: f64) -> (usize, Hit) {
        let (_, s) = m.make_region_shell_vertex();
        let vu = m.shells[s].vertexuse.unwrap();
        let v = m.vertexuses[vu].vertex;
        let hit = Hit::new(dist, Point3::origin(), HitElement::Vertex(v));
        (hit.element.index(m).unwrap(), hit)
    }

    #[test]
    fn test_hits_sorted_by_distance() {
        let mut m = Model::new();
        let mut list = HitList::new(4);
        for d in [3.0, -1.0, 2.0] {
            let (index, hit) = vertex_hit(&mut m, d);
            assert!(list.insert(index, hit));
        }
        let dists: Vec<f64> = list.hits().iter().map(|h| h.dist).collect();
        assert_eq!(dists, vec![-1.0, 2.0, 3.0]);
        assert_eq!(list.len(), 3);
    }

    #[test]
    fn test_elements_tagged_once() {
        let mut m = Model::new();
        let mut list = HitList::new(m.max_index());
        let (index, hit) = vertex_hit(&mut m, 1.0);
        assert!(list.insert(index, hit));
        assert!(!list.insert(index, hit));
        assert!(!list.mark(index, Tag::Miss));
        assert_eq!(list.tag(index), Some(Tag::Hit));
        assert_eq!(list.len(), 1);

        assert!(list.mark(index + 1, Tag::HitSub));
        assert_eq!(list.tag(index + 1), Some(Tag::HitSub));
        assert!(!list.is_tagged(index + 2));
    }
}
