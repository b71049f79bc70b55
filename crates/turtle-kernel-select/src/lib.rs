#![warn(missing_docs)]

//! Bounding-box selection over a [`MeshBackend`].
//!
//! A vertex is inside a box when every coordinate lies within
//! `[lower - buffer, upper + buffer]`, boundaries included. Edges and faces
//! use an all-reduction: every one of their vertices must be inside, so a
//! thin box only catches topology it fully encloses.

use turtle_kernel_math::Point3;
use turtle_kernel_mesh::{Coords, ElementId, ElementKind, MeshBackend, VertexId};

/// Axis-aligned selection box with an inclusion buffer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    /// Lower corner.
    pub lower: Point3,
    /// Upper corner.
    pub upper: Point3,
    /// Distance the box is grown by on every side.
    pub buffer: f64,
}

impl BoundingBox {
    /// Box between two corners, in any order.
    pub fn new(a: Point3, b: Point3, buffer: f64) -> Self {
        Self {
            lower: a.inf(&b),
            upper: a.sup(&b),
            buffer: buffer.abs(),
        }
    }

    /// Degenerate box around a single point.
    pub fn at_point(p: Point3, buffer: f64) -> Self {
        Self::new(p, p, buffer)
    }

    /// Inclusive containment test, buffer applied.
    pub fn contains(&self, p: &Point3) -> bool {
        (0..3).all(|i| {
            p[i] >= self.lower[i] - self.buffer && p[i] <= self.upper[i] + self.buffer
        })
    }
}

/// Elements of `kind` that lie inside `bbox`, measured in `coords`.
pub fn elements_in_box<B: MeshBackend>(
    backend: &B,
    bbox: &BoundingBox,
    kind: ElementKind,
    coords: Coords,
) -> Vec<ElementId> {
    let inside = |v: VertexId| {
        backend
            .vertex_position(v, coords)
            .is_some_and(|p| bbox.contains(&p))
    };
    match kind {
        ElementKind::Vertex => backend
            .vertex_ids()
            .into_iter()
            .filter(|v| inside(*v))
            .map(ElementId::Vertex)
            .collect(),
        ElementKind::Edge => backend
            .edge_ids()
            .into_iter()
            .filter(|e| {
                backend
                    .edge_vertices(*e)
                    .is_some_and(|ends| ends.iter().all(|v| inside(*v)))
            })
            .map(ElementId::Edge)
            .collect(),
        ElementKind::Face => backend
            .face_ids()
            .into_iter()
            .filter(|f| {
                backend
                    .face_vertices(*f)
                    .is_some_and(|ring| ring.iter().all(|v| inside(*v)))
            })
            .map(ElementId::Face)
            .collect(),
    }
}

/// Select the elements of `kind` inside `bbox`.
///
/// With `additive == false` the selection is replaced, otherwise the hits
/// are added to it. Returns the number of elements that matched.
pub fn select_by_location<B: MeshBackend>(
    backend: &mut B,
    bbox: &BoundingBox,
    kind: ElementKind,
    coords: Coords,
    additive: bool,
) -> usize {
    let hits = elements_in_box(backend, bbox, kind, coords);
    let n = hits.len();
    backend.select(kind, hits, additive);
    n
}

/// Select the vertices within `buffer` of a world point.
pub fn select_at_point<B: MeshBackend>(
    backend: &mut B,
    point: &Point3,
    buffer: f64,
    additive: bool,
) -> usize {
    select_by_location(
        backend,
        &BoundingBox::at_point(*point, buffer),
        ElementKind::Vertex,
        Coords::World,
        additive,
    )
}

/// Vertices within `buffer` of a world point, without touching the selection.
pub fn vertices_at_point<B: MeshBackend>(backend: &B, point: &Point3, buffer: f64) -> Vec<VertexId> {
    elements_in_box(
        backend,
        &BoundingBox::at_point(*point, buffer),
        ElementKind::Vertex,
        Coords::World,
    )
    .into_iter()
    .filter_map(|e| match e {
        ElementId::Vertex(v) => Some(v),
        _ => None,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use turtle_kernel_math::{Euler3, Vec3};
    use turtle_kernel_mesh::Canvas;

    fn square(canvas: &mut Canvas) -> [VertexId; 4] {
        let a = canvas.add_vertex(Point3::new(0.0, 0.0, 0.0));
        let b = canvas.add_vertex(Point3::new(1.0, 0.0, 0.0));
        let c = canvas.add_vertex(Point3::new(1.0, 1.0, 0.0));
        let d = canvas.add_vertex(Point3::new(0.0, 1.0, 0.0));
        canvas.make_face(&[a, b, c, d]).unwrap();
        [a, b, c, d]
    }

    #[test]
    fn test_boundary_is_inclusive() {
        let bbox = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 0.001);
        let eps = 1e-6;
        assert!(bbox.contains(&Point3::new(-0.001, 0.5, 0.5)));
        assert!(!bbox.contains(&Point3::new(-0.001 - eps, 0.5, 0.5)));
        assert!(bbox.contains(&Point3::new(1.001, 1.001, 1.001)));
        assert!(!bbox.contains(&Point3::new(0.5, 1.001 + eps, 0.5)));
    }

    #[test]
    fn test_boundary_vertex_selection() {
        let mut canvas = Canvas::default();
        let inside = canvas.add_vertex(Point3::new(-0.001, 0.0, 0.0));
        canvas.add_vertex(Point3::new(-0.001 - 1e-6, 0.0, 0.0));
        let bbox = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 1.0), 0.001);
        let n = select_by_location(&mut canvas, &bbox, ElementKind::Vertex, Coords::World, false);
        assert_eq!(n, 1);
        assert_eq!(canvas.selected_vertices(), vec![inside]);
    }

    #[test]
    fn test_edges_need_both_endpoints() {
        let mut canvas = Canvas::default();
        square(&mut canvas);
        // Catches the bottom edge only.
        let bbox = BoundingBox::new(Point3::new(-0.1, -0.1, 0.0), Point3::new(1.1, 0.1, 0.0), 0.0);
        let n = select_by_location(&mut canvas, &bbox, ElementKind::Edge, Coords::World, false);
        assert_eq!(n, 1);
        assert_eq!(canvas.selection().kind(), ElementKind::Edge);

        let n = select_by_location(&mut canvas, &bbox, ElementKind::Face, Coords::World, false);
        assert_eq!(n, 0);
        assert!(canvas.selection().is_empty());
    }

    #[test]
    fn test_face_selected_when_enclosed() {
        let mut canvas = Canvas::default();
        square(&mut canvas);
        let bbox = BoundingBox::new(Point3::origin(), Point3::new(1.0, 1.0, 0.0), 0.001);
        let n = select_by_location(&mut canvas, &bbox, ElementKind::Face, Coords::World, false);
        assert_eq!(n, 1);
    }

    #[test]
    fn test_additive_selection_unions() {
        let mut canvas = Canvas::default();
        let [a, _, c, _] = square(&mut canvas);
        select_at_point(&mut canvas, &Point3::origin(), 0.001, false);
        select_at_point(&mut canvas, &Point3::new(1.0, 1.0, 0.0), 0.001, true);
        assert_eq!(canvas.selected_vertices(), vec![a, c]);
        select_at_point(&mut canvas, &Point3::new(1.0, 1.0, 0.0), 0.001, false);
        assert_eq!(canvas.selected_vertices(), vec![c]);
    }

    #[test]
    fn test_local_versus_world_coords() {
        let mut canvas = Canvas::new(Point3::new(10.0, 0.0, 0.0), Euler3::default());
        let v = canvas.add_vertex(Point3::origin());
        let local = BoundingBox::at_point(Point3::origin(), 0.001);
        assert_eq!(
            elements_in_box(&canvas, &local, ElementKind::Vertex, Coords::Local),
            vec![ElementId::Vertex(v)]
        );
        assert!(elements_in_box(&canvas, &local, ElementKind::Vertex, Coords::World).is_empty());
        assert_eq!(
            vertices_at_point(&canvas, &Point3::new(10.0, 0.0, 0.0), 0.001),
            vec![v]
        );
    }

    #[test]
    fn test_new_orders_corners() {
        let bbox = BoundingBox::new(Point3::new(1.0, 2.0, 3.0), Point3::new(-1.0, 5.0, 0.0), -0.5);
        assert_eq!(bbox.lower, Point3::new(-1.0, 2.0, 0.0));
        assert_eq!(bbox.upper, Point3::new(1.0, 5.0, 3.0));
        assert_eq!(bbox.buffer, 0.5);
        assert!(bbox.contains(&(Point3::origin() + Vec3::new(0.0, 3.0, 1.0))));
        assert!(bbox.contains(&Point3::new(1.5, 5.5, -0.5)));
    }
}
