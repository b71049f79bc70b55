#![warn(missing_docs)]

//! Canvas mesh for the turtle kernel.
//!
//! Defines the [`MeshBackend`] contract the turtle engine drives, and
//! [`Canvas`], a standalone polygon mesh implementing it. Elements are
//! addressed by generational [`slotmap`] keys, so a handle to a vertex that
//! has since been deleted or welded away is detected instead of silently
//! aliasing a different vertex.
//!
//! # Example
//!
//! ```
//! use turtle_kernel_math::{Euler3, Point3, Vec3};
//! use turtle_kernel_mesh::{Canvas, MeshBackend};
//!
//! let mut canvas = Canvas::new(Point3::origin(), Euler3::default());
//! let v = canvas.add_vertex(Point3::origin());
//! canvas.select_only(v);
//! canvas.extrude_selected(&Vec3::new(0.0, 10.0, 0.0)).unwrap();
//! assert_eq!(canvas.vertex_count(), 2);
//! assert_eq!(canvas.edge_count(), 1);
//! ```

mod canvas;
mod extrude;
mod selection;
mod weld;

pub use canvas::{Canvas, Edge, Face, MeshExport, Vertex};
pub use selection::{ElementId, ElementKind, Selection};
pub use weld::WeldReport;

use serde::{Deserialize, Serialize};
use slotmap::new_key_type;
use thiserror::Error;
use turtle_kernel_math::{Euler3, Point3, Transform, Vec3};

new_key_type! {
    /// Generational handle to a canvas vertex.
    pub struct VertexId;
    /// Generational handle to a canvas edge.
    pub struct EdgeId;
    /// Generational handle to a canvas face.
    pub struct FaceId;
}

/// Coordinate space used when reading or testing vertex positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Coords {
    /// Canvas-local coordinates (as stored).
    Local,
    /// World coordinates (canvas transform applied).
    #[default]
    World,
}

/// Errors from canvas mutation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MeshError {
    /// Vertex handle is unknown or stale.
    #[error("unknown or stale vertex {0:?}")]
    UnknownVertex(VertexId),

    /// Edge would connect a vertex to itself.
    #[error("edge endpoints are the same vertex")]
    DegenerateEdge,

    /// Face needs at least three distinct vertices.
    #[error("face needs at least 3 distinct vertices, got {0}")]
    DegenerateFace(usize),

    /// Operation needs a non-empty selection.
    #[error("selection is empty")]
    EmptySelection,
}

/// Result type for mesh operations.
pub type Result<T> = std::result::Result<T, MeshError>;

/// The mesh operations the turtle engine needs from a canvas.
///
/// [`Canvas`] is the in-crate implementation. Another implementation can
/// adapt an external editor's mesh, as long as it honours the same
/// selection and ordering contract:
///
/// - vertices have a stable creation order, exposed through
///   [`vertex_ids`](Self::vertex_ids) and [`ordinal`](Self::ordinal);
/// - the selection is homogeneous in element kind;
/// - extrusions replace the selection with the newly created vertices.
///
/// `Clone` lets the engine snapshot the backend and roll a failed
/// multi-step command back.
pub trait MeshBackend: Clone {
    /// Canvas origin in world space.
    fn location(&self) -> Point3;

    /// Canvas base rotation.
    fn rotation(&self) -> Euler3;

    /// Local-to-world transform of the canvas.
    fn transform(&self) -> Transform {
        Transform::from_location_rotation(&self.location(), &self.rotation())
    }

    /// Map a world point into canvas-local coordinates.
    fn world_to_local(&self, p: &Point3) -> Point3 {
        let offset = *p - self.location();
        Point3::from(self.rotation().to_rotation().inverse() * offset)
    }

    /// Map a world direction into canvas-local coordinates.
    fn world_vec_to_local(&self, v: &Vec3) -> Vec3 {
        self.rotation().to_rotation().inverse() * v
    }

    /// Add a loose vertex at a canvas-local position.
    fn add_vertex(&mut self, local: Point3) -> VertexId;

    /// Connect two vertices. Returns the existing edge if they are already connected.
    fn make_edge(&mut self, a: VertexId, b: VertexId) -> Result<EdgeId>;

    /// Create a face over `vertices` in loop order, adding missing boundary edges.
    fn make_face(&mut self, vertices: &[VertexId]) -> Result<FaceId>;

    /// Extrude every selected vertex by `offset` (canvas-local), connecting
    /// each source to its copy by an edge. The copies become the selection.
    fn extrude_selected(&mut self, offset: &Vec3) -> Result<Vec<VertexId>>;

    /// Region extrusion: like [`extrude_selected`](Self::extrude_selected),
    /// but selected boundary edges sweep into quads and fully selected
    /// faces move with the copies.
    fn extrude_region(&mut self, offset: &Vec3) -> Result<Vec<VertexId>>;

    /// Merge all vertices closer than `tolerance`, keeping the earliest
    /// created vertex of each cluster and remapping edges and faces.
    fn weld_coincident(&mut self, tolerance: f64) -> WeldReport;

    /// Merge `from` into `into`, remapping dependent topology.
    fn merge_vertex(&mut self, from: VertexId, into: VertexId) -> Result<()>;

    /// Delete the selected elements of `kind`. Returns how many were removed.
    fn delete_selected(&mut self, kind: ElementKind) -> usize;

    /// Number of vertices.
    fn vertex_count(&self) -> usize;

    /// Number of edges.
    fn edge_count(&self) -> usize;

    /// Number of faces.
    fn face_count(&self) -> usize;

    /// Most recently created vertex still alive.
    fn last_vertex_id(&self) -> Option<VertexId>;

    /// Whether the handle still refers to a live vertex.
    fn contains_vertex(&self, id: VertexId) -> bool;

    /// Position of a vertex in the requested space.
    fn vertex_position(&self, id: VertexId, coords: Coords) -> Option<Point3>;

    /// Overwrite a vertex position (canvas-local).
    fn set_vertex_position(&mut self, id: VertexId, local: Point3) -> Result<()>;

    /// All live vertices in creation order.
    fn vertex_ids(&self) -> Vec<VertexId>;

    /// Position of a vertex in creation order.
    fn ordinal(&self, id: VertexId) -> Option<usize>;

    /// Vertices within `radius` of a canvas-local point, in creation order.
    ///
    /// The default scans every vertex; [`Canvas`] answers from a spatial grid.
    fn vertices_near(&self, local: &Point3, radius: f64) -> Vec<VertexId> {
        self.vertex_ids()
            .into_iter()
            .filter(|v| {
                self.vertex_position(*v, Coords::Local)
                    .is_some_and(|p| (p - local).norm() <= radius)
            })
            .collect()
    }

    /// All live edges.
    fn edge_ids(&self) -> Vec<EdgeId>;

    /// Endpoints of an edge.
    fn edge_vertices(&self, id: EdgeId) -> Option<[VertexId; 2]>;

    /// All live faces.
    fn face_ids(&self) -> Vec<FaceId>;

    /// Vertex loop of a face.
    fn face_vertices(&self, id: FaceId) -> Option<Vec<VertexId>>;

    /// Current selection.
    fn selection(&self) -> &Selection;

    /// Replace (`additive == false`) or extend the selection.
    ///
    /// Elements must share one kind; switching kind clears the previous selection.
    fn select(&mut self, kind: ElementKind, elements: Vec<ElementId>, additive: bool);

    /// Select every element of `kind`.
    fn select_all(&mut self, kind: ElementKind);

    /// Clear the selection.
    fn deselect_all(&mut self);

    /// Make `id` the only selected element.
    fn select_only(&mut self, id: VertexId) {
        self.select(ElementKind::Vertex, vec![ElementId::Vertex(id)], false);
    }

    /// Vertices touched by the selection, in creation order.
    fn selected_vertices(&self) -> Vec<VertexId>;

    /// Unit normal of a face (Newell's method), canvas-local.
    fn face_normal(&self, id: FaceId) -> Option<Vec3> {
        let verts = self.face_vertices(id)?;
        let pts: Vec<Point3> = verts
            .iter()
            .filter_map(|v| self.vertex_position(*v, Coords::Local))
            .collect();
        newell_normal(&pts)
    }
}

/// Unit polygon normal by Newell's method, `None` for degenerate loops.
pub fn newell_normal(points: &[Point3]) -> Option<Vec3> {
    if points.len() < 3 {
        return None;
    }
    let mut n = Vec3::zeros();
    for (i, p) in points.iter().enumerate() {
        let q = points[(i + 1) % points.len()];
        n.x += (p.y - q.y) * (p.z + q.z);
        n.y += (p.z - q.z) * (p.x + q.x);
        n.z += (p.x - q.x) * (p.y + q.y);
    }
    let len = n.norm();
    if len < 1e-12 {
        None
    } else {
        Some(n / len)
    }
}
