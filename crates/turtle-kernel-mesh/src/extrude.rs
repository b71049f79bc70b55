//! Vertex and region extrusion on a [`Canvas`].

use std::collections::{HashMap, HashSet};

use turtle_kernel_math::Vec3;

use crate::canvas::{edge_key, Canvas, Edge};
use crate::selection::{ElementId, ElementKind};
use crate::{EdgeId, MeshBackend, MeshError, Result, VertexId};

impl Canvas {
    pub(crate) fn extrude_vertices(&mut self, offset: &Vec3) -> Result<Vec<VertexId>> {
        let sources = self.selected_vertices();
        if sources.is_empty() {
            return Err(MeshError::EmptySelection);
        }
        let mut created = Vec::with_capacity(sources.len());
        for src in sources {
            let p = self.vertices[src].point + offset;
            let v = self.insert_vertex(p);
            self.make_edge(src, v)?;
            created.push(v);
        }
        self.select_created(&created);
        Ok(created)
    }

    /// Region extrusion.
    ///
    /// An edge is interior when two selected faces share it; every other
    /// selected edge is a boundary edge and sweeps into a side quad. Selected
    /// faces move onto the copies, leaving the region open underneath.
    /// Vertices whose every edge is interior are moved instead of copied.
    pub(crate) fn extrude_region_impl(&mut self, offset: &Vec3) -> Result<Vec<VertexId>> {
        let sources = self.selected_vertices();
        if sources.is_empty() {
            return Err(MeshError::EmptySelection);
        }
        let set: HashSet<VertexId> = sources.iter().copied().collect();
        let faces = self.faces_within(&set);

        let mut adjacency: HashMap<(VertexId, VertexId), usize> = HashMap::new();
        for f in &faces {
            let ring = &self.faces[*f].vertices;
            let n = ring.len();
            for i in 0..n {
                *adjacency.entry(edge_key(ring[i], ring[(i + 1) % n])).or_default() += 1;
            }
        }
        let (interior_edges, boundary_edges): (Vec<EdgeId>, Vec<EdgeId>) =
            self.edges_within(&set).into_iter().partition(|e| {
                let edge = self.edges[*e];
                adjacency
                    .get(&edge_key(edge.a, edge.b))
                    .copied()
                    .unwrap_or(0)
                    >= 2
            });
        let interior_set: HashSet<EdgeId> = interior_edges.iter().copied().collect();
        let interior_vertices: HashSet<VertexId> = sources
            .iter()
            .copied()
            .filter(|v| {
                let mut incident = self
                    .edges
                    .iter()
                    .filter(|(_, e)| e.touches(*v))
                    .peekable();
                incident.peek().is_some() && incident.all(|(id, _)| interior_set.contains(&id))
            })
            .collect();

        let mut map: HashMap<VertexId, VertexId> = HashMap::new();
        let mut created = Vec::with_capacity(sources.len());
        for src in &sources {
            let copy = if interior_vertices.contains(src) {
                let moved = self.vertices[*src].point + offset;
                self.relocate(*src, moved)?;
                *src
            } else {
                let p = self.vertices[*src].point + offset;
                let v = self.insert_vertex(p);
                self.make_edge(*src, v)?;
                v
            };
            map.insert(*src, copy);
            created.push(copy);
        }

        for e in &boundary_edges {
            let Edge { a, b } = self.edges[*e];
            self.make_face(&[a, b, map[&b], map[&a]])?;
        }

        for f in &faces {
            let ring: Vec<VertexId> = self.faces[*f].vertices.iter().map(|v| map[v]).collect();
            let n = ring.len();
            for i in 0..n {
                self.make_edge(ring[i], ring[(i + 1) % n])?;
            }
            self.faces[*f].vertices = ring;
        }

        for e in &interior_edges {
            let Some(Edge { a, b }) = self.edges.remove(*e) else {
                continue;
            };
            self.edge_lookup.remove(&edge_key(a, b));
            self.make_edge(map[&a], map[&b])?;
        }

        self.select_created(&created);
        Ok(created)
    }

    fn select_created(&mut self, created: &[VertexId]) {
        self.selection.apply(
            ElementKind::Vertex,
            created.iter().map(|v| ElementId::Vertex(*v)),
            false,
        );
    }
}
