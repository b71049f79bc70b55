//! Standalone polygon canvas.

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use turtle_kernel_math::{Euler3, Point3, Vec3};

use crate::selection::{ElementId, ElementKind, Selection};
use crate::weld::{VertexGrid, WeldReport};
use crate::{Coords, EdgeId, FaceId, MeshBackend, MeshError, Result, VertexId};

/// A canvas vertex.
#[derive(Debug, Clone, PartialEq)]
pub struct Vertex {
    /// Canvas-local position.
    pub point: Point3,
    /// Monotonic creation stamp; orders vertices even across slot reuse.
    pub(crate) serial: u64,
}

/// An undirected edge between two vertices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    /// First endpoint.
    pub a: VertexId,
    /// Second endpoint.
    pub b: VertexId,
}

impl Edge {
    /// Whether `v` is an endpoint.
    pub fn touches(&self, v: VertexId) -> bool {
        self.a == v || self.b == v
    }
}

/// A polygon face.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Face {
    /// Vertex loop in winding order.
    pub vertices: Vec<VertexId>,
}

/// Plain indexed snapshot of a canvas, indices being creation ordinals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshExport {
    /// Vertex positions.
    pub vertices: Vec<[f64; 3]>,
    /// Edges as index pairs.
    pub edges: Vec<[usize; 2]>,
    /// Faces as index loops.
    pub faces: Vec<Vec<usize>>,
}

/// The mesh a turtle draws into.
///
/// Vertices are stored in canvas-local coordinates; the canvas location and
/// rotation map them into world space.
#[derive(Debug, Clone)]
pub struct Canvas {
    location: Point3,
    rotation: Euler3,
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    /// Live vertices sorted by serial.
    pub(crate) order: Vec<VertexId>,
    pub(crate) edge_lookup: HashMap<(VertexId, VertexId), EdgeId>,
    pub(crate) selection: Selection,
    pub(crate) grid: VertexGrid,
    next_serial: u64,
}

pub(crate) fn edge_key(a: VertexId, b: VertexId) -> (VertexId, VertexId) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

impl Canvas {
    /// Empty canvas whose origin sits at `location` with base `rotation`.
    pub fn new(location: Point3, rotation: Euler3) -> Self {
        Self {
            location,
            rotation,
            vertices: SlotMap::with_key(),
            edges: SlotMap::with_key(),
            faces: SlotMap::with_key(),
            order: Vec::new(),
            edge_lookup: HashMap::new(),
            selection: Selection::new(),
            grid: VertexGrid::default(),
            next_serial: 0,
        }
    }

    /// Vertex data by handle.
    pub fn vertex(&self, id: VertexId) -> Option<&Vertex> {
        self.vertices.get(id)
    }

    /// Edge data by handle.
    pub fn edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Face data by handle.
    pub fn face(&self, id: FaceId) -> Option<&Face> {
        self.faces.get(id)
    }

    /// Edge connecting `a` and `b`, if any.
    pub fn find_edge(&self, a: VertexId, b: VertexId) -> Option<EdgeId> {
        self.edge_lookup.get(&edge_key(a, b)).copied()
    }

    /// Indexed snapshot in the requested coordinate space.
    pub fn export(&self, coords: Coords) -> MeshExport {
        let index: HashMap<VertexId, usize> = self
            .order
            .iter()
            .enumerate()
            .map(|(i, v)| (*v, i))
            .collect();
        let transform = self.transform();
        let vertices = self
            .order
            .iter()
            .map(|v| {
                let p = self.vertices[*v].point;
                let p = match coords {
                    Coords::Local => p,
                    Coords::World => transform.apply_point(&p),
                };
                [p.x, p.y, p.z]
            })
            .collect();
        let mut edges: Vec<[usize; 2]> = self
            .edges
            .values()
            .map(|e| {
                let (a, b) = (index[&e.a], index[&e.b]);
                [a.min(b), a.max(b)]
            })
            .collect();
        edges.sort_unstable();
        let faces = self
            .faces
            .values()
            .map(|f| f.vertices.iter().map(|v| index[v]).collect())
            .collect();
        MeshExport {
            vertices,
            edges,
            faces,
        }
    }

    pub(crate) fn insert_vertex(&mut self, point: Point3) -> VertexId {
        let serial = self.next_serial;
        self.next_serial += 1;
        let id = self.vertices.insert(Vertex { point, serial });
        self.grid.insert(id, &point);
        self.order.push(id);
        id
    }

    /// Move a vertex, refiling it in the grid.
    pub(crate) fn relocate(&mut self, id: VertexId, point: Point3) -> Result<()> {
        let v = self
            .vertices
            .get_mut(id)
            .ok_or(MeshError::UnknownVertex(id))?;
        self.grid.remove(id, &v.point);
        v.point = point;
        self.grid.insert(id, &point);
        Ok(())
    }

    pub(crate) fn require_vertex(&self, id: VertexId) -> Result<&Vertex> {
        self.vertices.get(id).ok_or(MeshError::UnknownVertex(id))
    }

    pub(crate) fn sort_by_creation(&self, ids: &mut [VertexId]) {
        ids.sort_by_key(|v| self.vertices.get(*v).map(|x| x.serial).unwrap_or(u64::MAX));
    }

    /// Edges whose endpoints are both in `verts`.
    pub(crate) fn edges_within(&self, verts: &HashSet<VertexId>) -> Vec<EdgeId> {
        self.edges
            .iter()
            .filter(|(_, e)| verts.contains(&e.a) && verts.contains(&e.b))
            .map(|(id, _)| id)
            .collect()
    }

    /// Faces whose vertices are all in `verts`.
    pub(crate) fn faces_within(&self, verts: &HashSet<VertexId>) -> Vec<FaceId> {
        self.faces
            .iter()
            .filter(|(_, f)| f.vertices.iter().all(|v| verts.contains(v)))
            .map(|(id, _)| id)
            .collect()
    }

    fn remove_edges(&mut self, ids: &HashSet<EdgeId>) {
        for id in ids {
            if let Some(e) = self.edges.remove(*id) {
                self.edge_lookup.remove(&edge_key(e.a, e.b));
            }
        }
        // A face needs every one of its boundary edges.
        let dead_faces: Vec<FaceId> = self
            .faces
            .iter()
            .filter(|(_, f)| {
                let n = f.vertices.len();
                (0..n).any(|i| {
                    self.find_edge(f.vertices[i], f.vertices[(i + 1) % n])
                        .is_none()
                })
            })
            .map(|(id, _)| id)
            .collect();
        for f in dead_faces {
            self.faces.remove(f);
        }
    }

    pub(crate) fn remove_vertices(&mut self, ids: &HashSet<VertexId>) {
        let edges: HashSet<EdgeId> = self
            .edges
            .iter()
            .filter(|(_, e)| ids.contains(&e.a) || ids.contains(&e.b))
            .map(|(id, _)| id)
            .collect();
        self.remove_edges(&edges);
        self.faces
            .retain(|_, f| !f.vertices.iter().any(|v| ids.contains(v)));
        for id in ids {
            if let Some(gone) = self.vertices.remove(*id) {
                self.grid.remove(*id, &gone.point);
            }
        }
        self.order.retain(|v| !ids.contains(v));
        self.prune_selection();
    }

    /// Drop selected handles that no longer resolve.
    pub(crate) fn prune_selection(&mut self) {
        let (vertices, edges, faces) = (&self.vertices, &self.edges, &self.faces);
        self.selection.retain(|e| match e {
            ElementId::Vertex(v) => vertices.contains_key(*v),
            ElementId::Edge(id) => edges.contains_key(*id),
            ElementId::Face(id) => faces.contains_key(*id),
        });
    }

    fn selected_edges(&self) -> HashSet<EdgeId> {
        match self.selection.kind() {
            ElementKind::Edge => self.selection.edges().collect(),
            _ => {
                let verts: HashSet<VertexId> = self.selected_vertices().into_iter().collect();
                self.edges_within(&verts).into_iter().collect()
            }
        }
    }

    fn selected_faces(&self) -> HashSet<FaceId> {
        match self.selection.kind() {
            ElementKind::Face => self.selection.faces().collect(),
            _ => {
                let verts: HashSet<VertexId> = self.selected_vertices().into_iter().collect();
                self.faces_within(&verts).into_iter().collect()
            }
        }
    }
}

impl MeshBackend for Canvas {
    fn location(&self) -> Point3 {
        self.location
    }

    fn rotation(&self) -> Euler3 {
        self.rotation
    }

    fn add_vertex(&mut self, local: Point3) -> VertexId {
        self.insert_vertex(local)
    }

    fn make_edge(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId> {
        if a == b {
            return Err(MeshError::DegenerateEdge);
        }
        self.require_vertex(a)?;
        self.require_vertex(b)?;
        if let Some(id) = self.find_edge(a, b) {
            return Ok(id);
        }
        let id = self.edges.insert(Edge { a, b });
        self.edge_lookup.insert(edge_key(a, b), id);
        Ok(id)
    }

    fn make_face(&mut self, vertices: &[VertexId]) -> Result<FaceId> {
        let mut ring: Vec<VertexId> = Vec::with_capacity(vertices.len());
        for v in vertices {
            self.require_vertex(*v)?;
            if ring.last() != Some(v) {
                ring.push(*v);
            }
        }
        while ring.len() > 1 && ring.first() == ring.last() {
            ring.pop();
        }
        let distinct: HashSet<VertexId> = ring.iter().copied().collect();
        if ring.len() < 3 || distinct.len() != ring.len() {
            return Err(MeshError::DegenerateFace(distinct.len()));
        }

        let mut key: Vec<VertexId> = ring.clone();
        key.sort_unstable();
        let existing = self.faces.iter().find(|(_, f)| {
            let mut k = f.vertices.clone();
            k.sort_unstable();
            k == key
        });
        if let Some((id, _)) = existing {
            return Ok(id);
        }

        let n = ring.len();
        for i in 0..n {
            self.make_edge(ring[i], ring[(i + 1) % n])?;
        }
        Ok(self.faces.insert(Face { vertices: ring }))
    }

    fn extrude_selected(&mut self, offset: &Vec3) -> Result<Vec<VertexId>> {
        self.extrude_vertices(offset)
    }

    fn extrude_region(&mut self, offset: &Vec3) -> Result<Vec<VertexId>> {
        self.extrude_region_impl(offset)
    }

    fn weld_coincident(&mut self, tolerance: f64) -> WeldReport {
        self.weld(tolerance)
    }

    fn merge_vertex(&mut self, from: VertexId, into: VertexId) -> Result<()> {
        self.require_vertex(from)?;
        self.require_vertex(into)?;
        if from != into {
            let mut map = HashMap::new();
            map.insert(from, into);
            self.apply_merge(&map);
        }
        Ok(())
    }

    fn delete_selected(&mut self, kind: ElementKind) -> usize {
        let removed = match kind {
            ElementKind::Vertex => {
                let ids: HashSet<VertexId> = self.selected_vertices().into_iter().collect();
                self.remove_vertices(&ids);
                ids.len()
            }
            ElementKind::Edge => {
                let ids = self.selected_edges();
                self.remove_edges(&ids);
                ids.len()
            }
            ElementKind::Face => {
                let ids = self.selected_faces();
                for id in &ids {
                    self.faces.remove(*id);
                }
                ids.len()
            }
        };
        self.selection.clear();
        removed
    }

    fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    fn edge_count(&self) -> usize {
        self.edges.len()
    }

    fn face_count(&self) -> usize {
        self.faces.len()
    }

    fn last_vertex_id(&self) -> Option<VertexId> {
        self.order.last().copied()
    }

    fn contains_vertex(&self, id: VertexId) -> bool {
        self.vertices.contains_key(id)
    }

    fn vertex_position(&self, id: VertexId, coords: Coords) -> Option<Point3> {
        let p = self.vertices.get(id)?.point;
        Some(match coords {
            Coords::Local => p,
            Coords::World => self.transform().apply_point(&p),
        })
    }

    fn set_vertex_position(&mut self, id: VertexId, local: Point3) -> Result<()> {
        self.relocate(id, local)
    }

    fn vertices_near(&self, local: &Point3, radius: f64) -> Vec<VertexId> {
        let mut hits: Vec<VertexId> = self
            .grid
            .candidates(local, radius)
            .into_iter()
            .filter(|v| {
                self.vertices
                    .get(*v)
                    .is_some_and(|x| (x.point - local).norm() <= radius)
            })
            .collect();
        self.sort_by_creation(&mut hits);
        hits
    }

    fn vertex_ids(&self) -> Vec<VertexId> {
        self.order.clone()
    }

    fn ordinal(&self, id: VertexId) -> Option<usize> {
        let serial = self.vertices.get(id)?.serial;
        self.order
            .binary_search_by_key(&serial, |v| self.vertices[*v].serial)
            .ok()
    }

    fn edge_ids(&self) -> Vec<EdgeId> {
        self.edges.keys().collect()
    }

    fn edge_vertices(&self, id: EdgeId) -> Option<[VertexId; 2]> {
        self.edges.get(id).map(|e| [e.a, e.b])
    }

    fn face_ids(&self) -> Vec<FaceId> {
        self.faces.keys().collect()
    }

    fn face_vertices(&self, id: FaceId) -> Option<Vec<VertexId>> {
        self.faces.get(id).map(|f| f.vertices.clone())
    }

    fn selection(&self) -> &Selection {
        &self.selection
    }

    fn select(&mut self, kind: ElementKind, elements: Vec<ElementId>, additive: bool) {
        self.selection.apply(kind, elements, additive);
        self.prune_selection();
    }

    fn select_all(&mut self, kind: ElementKind) {
        let all: Vec<ElementId> = match kind {
            ElementKind::Vertex => self.order.iter().map(|v| ElementId::Vertex(*v)).collect(),
            ElementKind::Edge => self.edges.keys().map(ElementId::Edge).collect(),
            ElementKind::Face => self.faces.keys().map(ElementId::Face).collect(),
        };
        self.selection.apply(kind, all, false);
    }

    fn deselect_all(&mut self) {
        self.selection.clear();
    }

    fn selected_vertices(&self) -> Vec<VertexId> {
        let mut set: HashSet<VertexId> = HashSet::new();
        for e in self.selection.iter() {
            match e {
                ElementId::Vertex(v) => {
                    set.insert(*v);
                }
                ElementId::Edge(id) => {
                    if let Some(edge) = self.edges.get(*id) {
                        set.insert(edge.a);
                        set.insert(edge.b);
                    }
                }
                ElementId::Face(id) => {
                    if let Some(face) = self.faces.get(*id) {
                        set.extend(face.vertices.iter().copied());
                    }
                }
            }
        }
        let mut out: Vec<VertexId> = set
            .into_iter()
            .filter(|v| self.vertices.contains_key(*v))
            .collect();
        self.sort_by_creation(&mut out);
        out
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(Point3::origin(), Euler3::default())
    }
}
