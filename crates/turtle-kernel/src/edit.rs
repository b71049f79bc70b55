//! Selection and direct mesh-editing commands.

use tracing::debug;
use turtle_kernel_math::{Point3, Vec3};
use turtle_kernel_mesh::{Coords, ElementKind, MeshBackend};
use turtle_kernel_select::{select_at_point, BoundingBox};

use crate::error::{Result, TurtleError};
use crate::session::{check_finite, check_finite_vec, TurtleSession};

impl<B: MeshBackend> TurtleSession<B> {
    // =========================================================================
    // Selection
    // =========================================================================

    /// Select every vertex.
    pub fn select_all(&mut self) -> Result<()> {
        self.canvas_mut()?.select_all(ElementKind::Vertex);
        debug!("select all");
        Ok(())
    }

    /// Clear the selection.
    pub fn deselect_all(&mut self) -> Result<()> {
        self.canvas_mut()?.deselect_all();
        debug!("deselect all");
        Ok(())
    }

    /// Select the vertices under the turtle, within `select_buffer`.
    ///
    /// Returns how many vertices matched.
    pub fn select_at_cursor(&mut self, additive: bool) -> Result<usize> {
        let position = self.pose.position;
        let buffer = self.config.select_buffer;
        let hits = select_at_point(self.canvas_mut()?, &position, buffer, additive);
        debug!(hits, additive, "select at cursor");
        Ok(hits)
    }

    /// Select the elements of `kind` inside the box spanned by `lower` and
    /// `upper`, grown by `buffer` on every side.
    ///
    /// Edges and faces match only when all their vertices are inside.
    /// Returns how many elements matched.
    pub fn select_by_location(
        &mut self,
        lower: Point3,
        upper: Point3,
        kind: ElementKind,
        coords: Coords,
        buffer: f64,
        additive: bool,
    ) -> Result<usize> {
        check_finite_vec(&lower.coords, "lower bound")?;
        check_finite_vec(&upper.coords, "upper bound")?;
        check_finite(buffer, "buffer")?;
        let bbox = BoundingBox::new(lower, upper, buffer);
        let hits =
            turtle_kernel_select::select_by_location(self.canvas_mut()?, &bbox, kind, coords, additive);
        debug!(?kind, ?coords, hits, additive, "select by location");
        Ok(hits)
    }

    // =========================================================================
    // Editing
    // =========================================================================

    /// Add a vertex at the turtle and make it the only selection and the tail.
    pub fn add_vert(&mut self) -> Result<()> {
        let position = self.pose.position;
        let canvas = self.canvas_mut()?;
        let local = canvas.world_to_local(&position);
        let v = canvas.add_vertex(local);
        canvas.select_only(v);
        self.set_tail(v);
        debug!(?position, "add vertex");
        Ok(())
    }

    /// Weld coincident vertices across the canvas.
    ///
    /// Returns how many vertices were merged away.
    pub fn merge(&mut self) -> Result<usize> {
        let tolerance = self.config.weld_tolerance;
        let report = self.canvas_mut()?.weld_coincident(tolerance);
        self.follow_weld(&report);
        debug!(merged = report.merged_count(), "merge");
        Ok(report.merged_count())
    }

    /// Region-extrude the selection by `distance`.
    ///
    /// Selected faces travel along their mean normal; without selected faces
    /// the turtle's up axis is used.
    pub fn extrude(&mut self, distance: f64) -> Result<()> {
        check_finite(distance, "distance")?;
        let up = self.pose.local_to_world(&Vec3::z());
        let canvas = self.canvas()?;
        if canvas.selection().is_empty() {
            return Err(TurtleError::DegenerateSelection("extrude"));
        }
        let direction = mean_face_normal(canvas).unwrap_or_else(|| canvas.world_vec_to_local(&up));
        self.atomic(|s| {
            s.canvas_mut()?.extrude_region(&(direction * distance))?;
            Ok(())
        })?;
        debug!(distance, ?direction, "extrude");
        Ok(())
    }

    /// Delete the selected elements of `kind`.
    ///
    /// Deleting vertices also removes their edges and faces. Returns the
    /// number of elements removed.
    pub fn delete(&mut self, kind: ElementKind) -> Result<usize> {
        let removed = self.canvas_mut()?.delete_selected(kind);
        debug!(?kind, removed, "delete");
        Ok(removed)
    }
}

/// Normalised mean of the selected faces' normals, canvas-local.
fn mean_face_normal<B: MeshBackend>(canvas: &B) -> Option<Vec3> {
    let sum = canvas
        .selection()
        .faces()
        .filter_map(|f| canvas.face_normal(f))
        .fold(Vec3::zeros(), |acc, n| acc + n);
    let len = sum.norm();
    (len > 1e-12).then(|| sum / len)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{TurtleConfig, TurtleSession};
    use approx::assert_relative_eq;
    use turtle_kernel_mesh::{Canvas, ElementId};

    fn session() -> TurtleSession {
        TurtleSession::with_canvas(Canvas::default(), TurtleConfig::default())
    }

    /// Counter-clockwise 2×2 square, filled.
    fn filled_square() -> TurtleSession {
        let mut s = session();
        s.pen_down().unwrap();
        s.begin_path().unwrap();
        for _ in 0..3 {
            s.forward(2.0).unwrap();
            s.left_turn(90.0).unwrap();
        }
        s.fill_path().unwrap();
        s
    }

    #[test]
    fn select_all_is_idempotent() {
        let mut s = session();
        s.pen_down().unwrap();
        s.forward(1.0).unwrap();
        s.forward(1.0).unwrap();

        s.select_all().unwrap();
        let once = s.canvas().unwrap().selection().clone();
        s.select_all().unwrap();
        assert_eq!(s.canvas().unwrap().selection(), &once);
        assert_eq!(once.len(), 3);

        s.deselect_all().unwrap();
        assert!(s.canvas().unwrap().selection().is_empty());
    }

    #[test]
    fn select_at_cursor_finds_vertex_under_turtle() {
        let mut s = session();
        s.pen_down().unwrap();
        s.forward(1.0).unwrap();
        s.pen_up().unwrap();
        s.backward(1.0).unwrap();
        assert_eq!(s.select_at_cursor(false).unwrap(), 1);
        s.forward(1.0).unwrap();
        assert_eq!(s.select_at_cursor(true).unwrap(), 1);
        assert_eq!(s.canvas().unwrap().selection().len(), 2);

        s.forward(0.5).unwrap();
        assert_eq!(s.select_at_cursor(false).unwrap(), 0);
        assert!(s.canvas().unwrap().selection().is_empty());
    }

    #[test]
    fn bounding_box_boundary_is_inclusive() {
        let mut s = session();
        let buffer = 0.5;
        // Exactly at lower - buffer.
        s.set_position(Point3::new(0.5, 0.0, 0.0)).unwrap();
        s.add_vert().unwrap();
        // Just outside.
        s.set_position(Point3::new(0.5 - 1e-9, 0.0, 0.0)).unwrap();
        s.add_vert().unwrap();

        let hits = s
            .select_by_location(
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(2.0, 0.0, 0.0),
                ElementKind::Vertex,
                Coords::World,
                buffer,
                false,
            )
            .unwrap();
        assert_eq!(hits, 1);
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.selected_vertices(), vec![canvas.vertex_ids()[0]]);
    }

    #[test]
    fn edge_selection_needs_both_ends_inside() {
        let mut s = session();
        s.pen_down().unwrap();
        s.forward(1.0).unwrap();
        s.forward(1.0).unwrap();
        let hits = s
            .select_by_location(
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 1.5, 0.0),
                ElementKind::Edge,
                Coords::World,
                0.001,
                false,
            )
            .unwrap();
        assert_eq!(hits, 1);
        let selection = s.canvas().unwrap().selection();
        assert_eq!(selection.kind(), ElementKind::Edge);
        assert!(selection.iter().all(|e| matches!(e, ElementId::Edge(_))));
    }

    #[test]
    fn local_coords_follow_canvas_frame() {
        let mut s: TurtleSession = TurtleSession::default();
        s.add_turtle(Point3::new(10.0, 0.0, 0.0), Vec3::zeros()).unwrap();
        // The seed sits at world (10, 0, 0), canvas-local origin.
        let world_hits = s
            .select_by_location(
                Point3::origin(),
                Point3::origin(),
                ElementKind::Vertex,
                Coords::World,
                0.001,
                false,
            )
            .unwrap();
        let local_hits = s
            .select_by_location(
                Point3::origin(),
                Point3::origin(),
                ElementKind::Vertex,
                Coords::Local,
                0.001,
                false,
            )
            .unwrap();
        assert_eq!((world_hits, local_hits), (0, 1));
    }

    #[test]
    fn add_vert_replaces_selection() {
        let mut s = session();
        s.pen_down().unwrap();
        s.pen_up().unwrap();
        s.forward(3.0).unwrap();
        s.add_vert().unwrap();
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.vertex_count(), 2);
        assert_eq!(canvas.selected_vertices(), vec![canvas.vertex_ids()[1]]);
        assert!(!s.is_pen_down());
    }

    #[test]
    fn merge_welds_duplicates() {
        let mut s = session();
        s.add_vert().unwrap();
        s.add_vert().unwrap();
        s.forward(1.0).unwrap();
        s.add_vert().unwrap();
        assert_eq!(s.merge().unwrap(), 1);
        assert_eq!(s.canvas().unwrap().vertex_count(), 2);
        assert_eq!(s.merge().unwrap(), 0);
    }

    #[test]
    fn extrude_face_along_normal() {
        let mut s = filled_square();
        s.canvas.as_mut().unwrap().select_all(ElementKind::Face);
        s.extrude(1.5).unwrap();

        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.vertex_count(), 8);
        assert_eq!(canvas.face_count(), 5);
        assert_eq!(canvas.edge_count(), 12);
        for v in canvas.selected_vertices() {
            let p = canvas.vertex_position(v, Coords::World).unwrap();
            assert_relative_eq!(p.z, 1.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn extrude_edges_uses_turtle_up() {
        let mut s = session();
        s.pen_down().unwrap();
        s.forward(2.0).unwrap();
        s.look_up(90.0).unwrap();
        s.select_all().unwrap();
        s.extrude(1.0).unwrap();
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.face_count(), 1);
        // Pitched up 90°, the turtle's up axis is world -Y.
        let ys: Vec<f64> = canvas
            .selected_vertices()
            .iter()
            .map(|v| canvas.vertex_position(*v, Coords::World).unwrap().y)
            .collect();
        assert_relative_eq!(ys[0], -1.0, epsilon = 1e-9);
        assert_relative_eq!(ys[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn extrude_needs_selection() {
        let mut s = session();
        s.add_vert().unwrap();
        s.deselect_all().unwrap();
        assert_eq!(s.extrude(1.0), Err(TurtleError::DegenerateSelection("extrude")));
    }

    #[test]
    fn delete_selected_faces_keeps_outline() {
        let mut s = filled_square();
        s.canvas.as_mut().unwrap().select_all(ElementKind::Face);
        assert_eq!(s.delete(ElementKind::Face).unwrap(), 1);
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.face_count(), 0);
        assert_eq!(canvas.edge_count(), 4);

        s.select_all().unwrap();
        assert_eq!(s.delete(ElementKind::Vertex).unwrap(), 4);
        assert_eq!(s.canvas().unwrap().edge_count(), 0);
    }
}
