//! Path marker and the path commands built on it.
//!
//! `begin_path` marks the turtle's tail: the vertex its last create, snap or
//! weld left under the cursor. From then on every new tail is appended, so
//! the path commands act on the vertices the turtle actually visited, even
//! when a move snapped onto an older vertex.

use tracing::debug;
use turtle_kernel_math::Vec3;
use turtle_kernel_mesh::{ElementId, ElementKind, MeshBackend, VertexId, WeldReport};

use crate::error::{Result, TurtleError};
use crate::session::{check_finite, TurtleSession};

/// An in-progress path: its start vertex and every tail recorded since.
///
/// Holds generational vertex handles, so deleting a path vertex is detected
/// rather than silently pointing at another vertex.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathMarker {
    vertices: Vec<VertexId>,
}

impl PathMarker {
    pub(crate) fn new(start: VertexId) -> Self {
        Self {
            vertices: vec![start],
        }
    }

    /// Marked start vertex.
    pub fn start(&self) -> VertexId {
        self.vertices[0]
    }

    /// Vertices recorded so far, start first.
    pub fn vertices(&self) -> &[VertexId] {
        &self.vertices
    }

    pub(crate) fn push(&mut self, v: VertexId) {
        if self.vertices.last() != Some(&v) {
            self.vertices.push(v);
        }
    }

    /// Follow a weld so every recorded handle points at its survivor.
    pub(crate) fn remap(&mut self, report: &WeldReport) {
        for v in &mut self.vertices {
            *v = report.resolve(*v);
        }
        self.vertices.dedup();
    }
}

impl<B: MeshBackend> TurtleSession<B> {
    /// Make `v` the tail and append it to the open path.
    pub(crate) fn set_tail(&mut self, v: VertexId) {
        self.tail = Some(v);
        if let Some(marker) = &mut self.marker {
            marker.push(v);
        }
    }

    /// Follow a weld so the tail and path keep pointing at surviving vertices.
    pub(crate) fn follow_weld(&mut self, report: &WeldReport) {
        if report.is_empty() {
            return;
        }
        self.tail = self.tail.map(|v| report.resolve(v));
        if let Some(marker) = &mut self.marker {
            marker.remap(report);
        }
    }

    /// The vertices of the open path, start first, ending at the tail.
    pub fn path_vertices(&self) -> Result<Vec<VertexId>> {
        let canvas = self.canvas()?;
        let marker = self.marker.as_ref().ok_or(TurtleError::NoMarkerSet)?;
        if !canvas.contains_vertex(marker.start()) {
            return Err(TurtleError::StaleMarker);
        }
        let len = marker.vertices().len();
        if let Some(missing) = marker.vertices().iter().position(|v| !canvas.contains_vertex(*v)) {
            return Err(TurtleError::InvalidRange { missing, len });
        }
        Ok(marker.vertices().to_vec())
    }

    /// Mark the tail as the path start.
    ///
    /// Falls back to the most recently created vertex when the tail is gone.
    pub fn begin_path(&mut self) -> Result<()> {
        let canvas = self.canvas()?;
        let start = self
            .tail
            .filter(|v| canvas.contains_vertex(*v))
            .or_else(|| canvas.last_vertex_id())
            .ok_or(TurtleError::EmptyCanvas)?;
        let ordinal = canvas.ordinal(start);
        self.tail = Some(start);
        self.marker = Some(PathMarker::new(start));
        debug!(?ordinal, "begin path");
        Ok(())
    }

    /// Connect the path start to the tail, then select only the tail.
    pub fn stroke_path(&mut self) -> Result<()> {
        let path = self.path_vertices()?;
        let (first, last) = endpoints(&path)?;
        let canvas = self.canvas_mut()?;
        canvas.make_edge(first, last)?;
        canvas.select_only(last);
        debug!(len = path.len(), "stroke path");
        Ok(())
    }

    /// Face over the whole path, then select only the tail.
    pub fn fill_path(&mut self) -> Result<()> {
        let path = self.path_vertices()?;
        if path.len() < 3 {
            return Err(TurtleError::DegenerateSelection("fill_path"));
        }
        self.atomic(|s| {
            let canvas = s.canvas_mut()?;
            canvas.make_face(&path)?;
            if let Some(last) = path.last() {
                canvas.select_only(*last);
            }
            Ok(())
        })?;
        debug!(len = path.len(), "fill path");
        Ok(())
    }

    /// Select the whole path without creating geometry.
    pub fn select_path(&mut self) -> Result<()> {
        let path = self.path_vertices()?;
        select_vertices(self.canvas_mut()?, &path);
        debug!(len = path.len(), "select path");
        Ok(())
    }

    /// Region-extrude the path along the turtle's up axis, then select the
    /// tail again.
    pub fn extrude_path(&mut self, distance: f64) -> Result<()> {
        check_finite(distance, "distance")?;
        let path = self.path_vertices()?;
        let (_, last) = endpoints(&path)?;
        let world = self.pose.local_to_world(&(Vec3::z() * distance));
        self.atomic(|s| {
            let canvas = s.canvas_mut()?;
            select_vertices(canvas, &path);
            let offset = canvas.world_vec_to_local(&world);
            canvas.extrude_region(&offset)?;
            canvas.select_only(last);
            Ok(())
        })?;
        debug!(len = path.len(), distance, "extrude path");
        Ok(())
    }
}

fn endpoints(path: &[VertexId]) -> Result<(VertexId, VertexId)> {
    match (path.first(), path.last()) {
        (Some(first), Some(last)) => Ok((*first, *last)),
        _ => Err(TurtleError::EmptyCanvas),
    }
}

fn select_vertices<B: MeshBackend>(canvas: &mut B, vertices: &[VertexId]) {
    canvas.select(
        ElementKind::Vertex,
        vertices.iter().map(|v| ElementId::Vertex(*v)).collect(),
        false,
    );
}

#[cfg(test)]
mod tests {
    use crate::{ClearMode, TurtleConfig, TurtleError, TurtleSession};
    use approx::assert_relative_eq;
    use turtle_kernel_math::{Point3, Vec3};
    use turtle_kernel_mesh::{Canvas, Coords, ElementKind, MeshBackend, VertexId};

    fn drawing() -> TurtleSession {
        let mut s = TurtleSession::with_canvas(Canvas::default(), TurtleConfig::default());
        s.pen_down().unwrap();
        s
    }

    /// Three sides of a 2×2 square, starting from a marked corner.
    fn open_square(s: &mut TurtleSession) {
        s.begin_path().unwrap();
        for _ in 0..3 {
            s.forward(2.0).unwrap();
            s.right_turn(90.0).unwrap();
        }
    }

    fn world(s: &TurtleSession, v: VertexId) -> Point3 {
        s.canvas()
            .unwrap()
            .vertex_position(v, Coords::World)
            .unwrap()
    }

    /// Closed 10×10 square; the last move snaps back onto the seed.
    fn closed_square(s: &mut TurtleSession) {
        for _ in 0..4 {
            s.forward(10.0).unwrap();
            s.right_turn(90.0).unwrap();
        }
    }

    #[test]
    fn path_commands_need_marker() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        assert_eq!(s.stroke_path(), Err(TurtleError::NoMarkerSet));
        assert_eq!(s.fill_path(), Err(TurtleError::NoMarkerSet));
        assert_eq!(s.select_path(), Err(TurtleError::NoMarkerSet));
        assert_eq!(s.extrude_path(1.0), Err(TurtleError::NoMarkerSet));
    }

    #[test]
    fn begin_path_needs_vertices() {
        let mut s = TurtleSession::with_canvas(Canvas::default(), TurtleConfig::default());
        assert_eq!(s.begin_path(), Err(TurtleError::EmptyCanvas));
    }

    #[test]
    fn begin_path_marks_last_created_vertex() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        s.forward(1.0).unwrap();
        // Selecting an older vertex does not change what gets marked.
        let first = s.canvas().unwrap().vertex_ids()[0];
        s.canvas.as_mut().unwrap().select_only(first);
        s.begin_path().unwrap();
        let last = s.canvas().unwrap().last_vertex_id();
        assert_eq!(s.marker().map(|m| m.start()), last);
    }

    #[test]
    fn begin_path_after_snap_marks_vertex_under_turtle() {
        let mut s = drawing();
        closed_square(&mut s);
        let seed = s.canvas().unwrap().vertex_ids()[0];
        assert_eq!(s.tail(), Some(seed));
        s.begin_path().unwrap();
        let start = s.marker().unwrap().start();
        assert_eq!(start, seed);
        assert_relative_eq!(world(&s, start), s.position(), epsilon = 1e-9);
    }

    #[test]
    fn fill_after_closed_square_starts_at_turtle() {
        let mut s = drawing();
        closed_square(&mut s);
        s.begin_path().unwrap();
        s.forward(5.0).unwrap();
        s.right_turn(90.0).unwrap();
        s.forward(5.0).unwrap();
        s.fill_path().unwrap();

        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.vertex_count(), 6);
        assert_eq!(canvas.face_count(), 1);
        let face = canvas.face_ids()[0];
        let ring: Vec<Point3> = canvas
            .face_vertices(face)
            .unwrap()
            .into_iter()
            .map(|v| world(&s, v))
            .collect();
        assert_eq!(ring.len(), 3);
        assert_relative_eq!(ring[0], Point3::origin(), epsilon = 1e-9);
        assert_relative_eq!(ring[1], Point3::new(0.0, 5.0, 0.0), epsilon = 1e-9);
        assert_relative_eq!(ring[2], Point3::new(5.0, 5.0, 0.0), epsilon = 1e-9);
        assert_eq!(canvas.selected_vertices(), vec![s.tail().unwrap()]);
    }

    #[test]
    fn closing_a_path_by_snapping_fills_the_loop() {
        let mut s = drawing();
        s.forward(3.0).unwrap();
        s.begin_path().unwrap();
        closed_square(&mut s);
        // The loop ends back on its own start.
        let marker = s.marker().unwrap();
        assert_eq!(marker.vertices().len(), 5);
        assert_eq!(marker.vertices().first(), marker.vertices().last());

        s.fill_path().unwrap();
        let canvas = s.canvas().unwrap();
        let face = canvas.face_ids()[0];
        let ring = canvas.face_vertices(face).unwrap();
        assert_eq!(ring.len(), 4);
        assert_relative_eq!(world(&s, ring[0]), Point3::new(0.0, 3.0, 0.0), epsilon = 1e-9);
    }

    #[test]
    fn curve_ending_on_older_vertex_becomes_tail() {
        let mut s = drawing();
        let seed = s.canvas().unwrap().vertex_ids()[0];
        s.begin_path().unwrap();
        s.forward(10.0).unwrap();
        // Curve back down to the seed.
        s.quadratic_curve(Vec3::new(5.0, -5.0, 0.0), Vec3::new(0.0, -10.0, 0.0))
            .unwrap();

        assert_eq!(s.tail(), Some(seed));
        assert_ne!(s.canvas().unwrap().last_vertex_id(), Some(seed));
        s.fill_path().unwrap();
        let canvas = s.canvas().unwrap();
        let face = canvas.face_ids()[0];
        let ring = canvas.face_vertices(face).unwrap();
        // Seed, the straight move's end and the curve's interior points.
        assert_eq!(ring.len(), 1 + s.config().curve_resolution);
        assert_eq!(ring[0], seed);
        assert_eq!(canvas.selected_vertices(), vec![seed]);

        s.begin_path().unwrap();
        assert_eq!(s.marker().unwrap().start(), seed);
    }

    #[test]
    fn deleted_path_vertex_is_invalid_range() {
        let mut s = drawing();
        s.begin_path().unwrap();
        s.forward(1.0).unwrap();
        s.forward(1.0).unwrap();
        let middle = s.marker().unwrap().vertices()[1];
        let canvas = s.canvas.as_mut().unwrap();
        canvas.select_only(middle);
        canvas.delete_selected(ElementKind::Vertex);
        assert_eq!(
            s.select_path(),
            Err(TurtleError::InvalidRange { missing: 1, len: 3 })
        );
    }

    #[test]
    fn begin_path_falls_back_when_tail_deleted() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        let tail = s.tail().unwrap();
        let canvas = s.canvas.as_mut().unwrap();
        canvas.select_only(tail);
        canvas.delete_selected(ElementKind::Vertex);
        s.begin_path().unwrap();
        let seed = s.canvas().unwrap().vertex_ids()[0];
        assert_eq!(s.marker().unwrap().start(), seed);
        assert_eq!(s.tail(), Some(seed));
    }

    #[test]
    fn stroke_path_closes_loop() {
        let mut s = drawing();
        open_square(&mut s);
        s.stroke_path().unwrap();
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.vertex_count(), 4);
        assert_eq!(canvas.edge_count(), 4);
        assert_eq!(canvas.selected_vertices(), vec![canvas.last_vertex_id().unwrap()]);
    }

    #[test]
    fn fill_path_adds_face_and_keeps_drawing() {
        let mut s = drawing();
        open_square(&mut s);
        s.fill_path().unwrap();
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.face_count(), 1);
        assert_eq!(canvas.edge_count(), 4);
        let tail = canvas.last_vertex_id().unwrap();
        assert_eq!(canvas.selected_vertices(), vec![tail]);

        s.forward(1.0).unwrap();
        assert_eq!(s.canvas().unwrap().vertex_count(), 5);
    }

    #[test]
    fn fill_after_moves_spans_marker_and_moves() {
        let mut s = drawing();
        s.begin_path().unwrap();
        s.forward(10.0).unwrap();
        s.right(10.0).unwrap();
        s.fill_path().unwrap();
        let canvas = s.canvas().unwrap();
        let face = canvas.face_ids()[0];
        assert_eq!(canvas.face_vertices(face).unwrap(), canvas.vertex_ids());
        assert_eq!(canvas.vertex_count(), 3);
    }

    #[test]
    fn fill_path_needs_three_vertices() {
        let mut s = drawing();
        s.begin_path().unwrap();
        s.forward(1.0).unwrap();
        assert!(matches!(s.fill_path(), Err(TurtleError::DegenerateSelection(_))));
        assert_eq!(s.canvas().unwrap().face_count(), 0);
    }

    #[test]
    fn select_path_selects_inclusive_range() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        s.begin_path().unwrap();
        s.forward(1.0).unwrap();
        s.forward(1.0).unwrap();
        s.select_path().unwrap();
        let canvas = s.canvas().unwrap();
        assert_eq!(canvas.selected_vertices(), canvas.vertex_ids()[1..].to_vec());
    }

    #[test]
    fn extrude_path_builds_wall() {
        let mut s = drawing();
        open_square(&mut s);
        s.extrude_path(3.0).unwrap();
        let canvas = s.canvas().unwrap();
        // Four corners, each copied upwards; three side quads.
        assert_eq!(canvas.vertex_count(), 8);
        assert_eq!(canvas.face_count(), 3);
        assert_eq!(canvas.edge_count(), 10);
        let selected = canvas.selected_vertices();
        assert_eq!(selected.len(), 1);
        let p = canvas.vertex_position(selected[0], Coords::World).unwrap();
        assert_relative_eq!(p.z, 0.0, epsilon = 1e-12);

        let top = canvas
            .vertex_ids()
            .into_iter()
            .filter(|v| canvas.vertex_position(*v, Coords::World).unwrap().z > 2.999)
            .count();
        assert_eq!(top, 4);
    }

    #[test]
    fn deleted_marker_is_stale() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        s.begin_path().unwrap();
        s.forward(1.0).unwrap();
        let marked = s.marker().unwrap().start();
        let canvas = s.canvas.as_mut().unwrap();
        canvas.select_only(marked);
        canvas.delete_selected(ElementKind::Vertex);
        assert_eq!(s.select_path(), Err(TurtleError::StaleMarker));
    }

    #[test]
    fn marker_follows_weld() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        s.backward(1.0).unwrap();
        // Snapping already merged the return trip, so disable it and redo.
        let mut config = TurtleConfig::default();
        config.snap_moves = false;
        s.set_config(config);
        s.clean().unwrap();
        s.forward(1.0).unwrap();
        s.backward(1.0).unwrap();
        s.begin_path().unwrap();
        let before = s.marker().unwrap().start();
        assert_eq!(s.canvas().unwrap().ordinal(before), Some(2));

        s.merge().unwrap();
        let after = s.marker().unwrap().start();
        assert_ne!(after, before);
        assert_eq!(s.canvas().unwrap().ordinal(after), Some(0));
        assert_eq!(s.tail(), Some(after));
    }

    #[test]
    fn clean_resets_marker_to_seed() {
        let mut s = drawing();
        s.forward(1.0).unwrap();
        s.begin_path().unwrap();
        s.clear(ClearMode::CleanOnly).unwrap();
        let start = s.marker().unwrap().start();
        assert_eq!(s.canvas().unwrap().ordinal(start), Some(0));
        assert_eq!(s.tail(), Some(start));
        assert_relative_eq!(world(&s, start), Point3::new(0.0, 1.0, 0.0), epsilon = 1e-12);
    }
}
