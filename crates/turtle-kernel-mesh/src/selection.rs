//! Homogeneous element selection.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::{EdgeId, FaceId, VertexId};

/// Kind of mesh element a selection holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementKind {
    /// Vertices.
    #[default]
    Vertex,
    /// Edges.
    Edge,
    /// Faces.
    Face,
}

/// Handle to a mesh element of any kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ElementId {
    /// A vertex.
    Vertex(VertexId),
    /// An edge.
    Edge(EdgeId),
    /// A face.
    Face(FaceId),
}

impl ElementId {
    /// Kind of this element.
    pub fn kind(&self) -> ElementKind {
        match self {
            ElementId::Vertex(_) => ElementKind::Vertex,
            ElementId::Edge(_) => ElementKind::Edge,
            ElementId::Face(_) => ElementKind::Face,
        }
    }
}

/// The set of currently active elements, all of one kind.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    kind: ElementKind,
    items: BTreeSet<ElementId>,
}

impl Selection {
    /// Empty vertex selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Element kind of this selection.
    pub fn kind(&self) -> ElementKind {
        self.kind
    }

    /// Whether nothing is selected.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Number of selected elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether `id` is selected.
    pub fn contains(&self, id: &ElementId) -> bool {
        self.items.contains(id)
    }

    /// Selected elements.
    pub fn iter(&self) -> impl Iterator<Item = &ElementId> {
        self.items.iter()
    }

    /// Selected vertex handles (empty unless this is a vertex selection).
    pub fn vertices(&self) -> impl Iterator<Item = VertexId> + '_ {
        self.items.iter().filter_map(|e| match e {
            ElementId::Vertex(v) => Some(*v),
            _ => None,
        })
    }

    /// Selected edge handles.
    pub fn edges(&self) -> impl Iterator<Item = EdgeId> + '_ {
        self.items.iter().filter_map(|e| match e {
            ElementId::Edge(id) => Some(*id),
            _ => None,
        })
    }

    /// Selected face handles.
    pub fn faces(&self) -> impl Iterator<Item = FaceId> + '_ {
        self.items.iter().filter_map(|e| match e {
            ElementId::Face(id) => Some(*id),
            _ => None,
        })
    }

    /// Clear, keeping the current kind.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// Replace or extend with `elements` of `kind`.
    ///
    /// A kind switch always clears first, even when `additive` is set.
    /// Elements of another kind are ignored.
    pub fn apply(
        &mut self,
        kind: ElementKind,
        elements: impl IntoIterator<Item = ElementId>,
        additive: bool,
    ) {
        if !additive || kind != self.kind {
            self.items.clear();
        }
        self.kind = kind;
        self.items
            .extend(elements.into_iter().filter(|e| e.kind() == kind));
    }

    /// Keep only elements for which `keep` returns true.
    pub fn retain(&mut self, keep: impl FnMut(&ElementId) -> bool) {
        self.items.retain(keep);
    }

    /// Rewrite selected vertex handles through `map`.
    pub fn remap_vertices(&mut self, map: impl Fn(VertexId) -> VertexId) {
        if self.kind != ElementKind::Vertex {
            return;
        }
        self.items = self
            .items
            .iter()
            .map(|e| match e {
                ElementId::Vertex(v) => ElementId::Vertex(map(*v)),
                other => *other,
            })
            .collect();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slotmap::SlotMap;

    fn keys() -> (VertexId, VertexId, EdgeId) {
        let mut verts: SlotMap<VertexId, ()> = SlotMap::with_key();
        let mut edges: SlotMap<EdgeId, ()> = SlotMap::with_key();
        (verts.insert(()), verts.insert(()), edges.insert(()))
    }

    #[test]
    fn additive_unions_same_kind() {
        let (a, b, _) = keys();
        let mut sel = Selection::new();
        sel.apply(ElementKind::Vertex, [ElementId::Vertex(a)], false);
        sel.apply(ElementKind::Vertex, [ElementId::Vertex(b)], true);
        assert_eq!(sel.len(), 2);
        sel.apply(ElementKind::Vertex, [ElementId::Vertex(b)], false);
        assert_eq!(sel.vertices().collect::<Vec<_>>(), vec![b]);
    }

    #[test]
    fn kind_switch_clears_even_when_additive() {
        let (a, _, e) = keys();
        let mut sel = Selection::new();
        sel.apply(ElementKind::Vertex, [ElementId::Vertex(a)], false);
        sel.apply(ElementKind::Edge, [ElementId::Edge(e)], true);
        assert_eq!(sel.kind(), ElementKind::Edge);
        assert_eq!(sel.len(), 1);
        assert_eq!(sel.vertices().count(), 0);
    }

    #[test]
    fn mismatched_elements_are_ignored() {
        let (a, _, e) = keys();
        let mut sel = Selection::new();
        sel.apply(
            ElementKind::Edge,
            [ElementId::Vertex(a), ElementId::Edge(e)],
            false,
        );
        assert_eq!(sel.edges().collect::<Vec<_>>(), vec![e]);
    }

    #[test]
    fn remap_rewrites_vertices() {
        let (a, b, _) = keys();
        let mut sel = Selection::new();
        sel.apply(ElementKind::Vertex, [ElementId::Vertex(a)], false);
        sel.remap_vertices(|v| if v == a { b } else { v });
        assert!(sel.contains(&ElementId::Vertex(b)));
        assert!(!sel.contains(&ElementId::Vertex(a)));
    }
}
