//! The turtle session: pose, pen state and the canvas it draws into.

use tracing::debug;
use turtle_kernel_math::{Euler3, MoveAxis, Point3, Pose, TurnAxis, Vec3};
use turtle_kernel_mesh::{Canvas, Coords, ElementKind, MeshBackend, VertexId, WeldReport};
use turtle_kernel_select::vertices_at_point;

use crate::config::TurtleConfig;
use crate::error::{Result, TurtleError};
use crate::path::PathMarker;

/// Whether moves draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PenState {
    /// Moves only change the pose.
    #[default]
    Up,
    /// Moves extrude the selection.
    Down,
}

/// How much of the session `clear` resets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClearMode {
    /// Home the turtle, then clean.
    FullClear,
    /// Delete all geometry, leaving the turtle where it is.
    CleanOnly,
}

/// A turtle drawing into one canvas.
///
/// All state is owned here; commands run strictly in call order. A command
/// that fails leaves pose, pen, tail, path marker and canvas as they were.
///
/// The tail is the vertex the last create, snap or weld left under the
/// turtle. It is tracked by handle because snapping can delete the newest
/// vertex, after which the canvas's last vertex is no longer the tail.
#[derive(Debug, Clone)]
pub struct TurtleSession<B: MeshBackend = Canvas> {
    pub(crate) canvas: Option<B>,
    pub(crate) pose: Pose,
    pub(crate) pen: PenState,
    pub(crate) tail: Option<VertexId>,
    pub(crate) marker: Option<PathMarker>,
    pub(crate) config: TurtleConfig,
}

impl<B: MeshBackend> Default for TurtleSession<B> {
    fn default() -> Self {
        Self::new(TurtleConfig::default())
    }
}

pub(crate) fn check_finite(value: f64, what: &'static str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(TurtleError::NonFinite(what))
    }
}

pub(crate) fn check_finite_vec(v: &Vec3, what: &'static str) -> Result<()> {
    if v.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(TurtleError::NonFinite(what))
    }
}

impl TurtleSession<Canvas> {
    /// Create a canvas at `location` with base rotation `rotation_degrees`,
    /// then home the turtle onto it and put the pen down.
    ///
    /// Any previous canvas is replaced.
    pub fn add_turtle(&mut self, location: Point3, rotation_degrees: Vec3) -> Result<()> {
        check_finite_vec(&location.coords, "canvas location")?;
        check_finite_vec(&rotation_degrees, "canvas rotation")?;
        self.attach_canvas(Canvas::new(location, Euler3::from_degrees(&rotation_degrees)));
        self.home()?;
        self.pen_down()?;
        debug!(?location, ?rotation_degrees, "added turtle");
        Ok(())
    }
}

impl<B: MeshBackend> TurtleSession<B> {
    // =========================================================================
    // Construction and state
    // =========================================================================

    /// Session without a canvas. Commands fail with `NoActiveCanvas` until
    /// one is attached.
    pub fn new(config: TurtleConfig) -> Self {
        Self {
            canvas: None,
            pose: Pose::default(),
            pen: PenState::Up,
            tail: None,
            marker: None,
            config,
        }
    }

    /// Session drawing into `canvas`, turtle at the canvas origin, pen up.
    pub fn with_canvas(canvas: B, config: TurtleConfig) -> Self {
        let mut session = Self::new(config);
        session.attach_canvas(canvas);
        session
    }

    /// Make `canvas` the active canvas and home the turtle onto it.
    ///
    /// Tail and path marker are dropped since they referred to the previous canvas.
    pub fn attach_canvas(&mut self, canvas: B) {
        self.pose = Pose::new(canvas.location(), canvas.rotation());
        self.canvas = Some(canvas);
        self.tail = None;
        self.marker = None;
    }

    /// Detach and return the active canvas.
    pub fn take_canvas(&mut self) -> Option<B> {
        self.tail = None;
        self.marker = None;
        self.canvas.take()
    }

    /// Active canvas.
    pub fn canvas(&self) -> Result<&B> {
        self.canvas.as_ref().ok_or(TurtleError::NoActiveCanvas)
    }

    pub(crate) fn canvas_mut(&mut self) -> Result<&mut B> {
        self.canvas.as_mut().ok_or(TurtleError::NoActiveCanvas)
    }

    /// Current pose.
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Pen state.
    pub fn pen(&self) -> PenState {
        self.pen
    }

    /// Whether the pen is down.
    pub fn is_pen_down(&self) -> bool {
        self.pen == PenState::Down
    }

    /// Vertex under the turtle left by the last create, snap or weld.
    pub fn tail(&self) -> Option<VertexId> {
        self.tail
    }

    /// Current path marker.
    pub fn marker(&self) -> Option<&PathMarker> {
        self.marker.as_ref()
    }

    /// Session configuration.
    pub fn config(&self) -> &TurtleConfig {
        &self.config
    }

    /// Replace the configuration.
    pub fn set_config(&mut self, config: TurtleConfig) {
        self.config = config;
    }

    /// World position of the turtle.
    pub fn position(&self) -> Point3 {
        self.pose.position
    }

    /// Orientation of the turtle in degrees (x = pitch, y = roll, z = yaw).
    pub fn heading(&self) -> Vec3 {
        self.pose.heading_degrees()
    }

    /// Run `f`, restoring the session if it fails.
    pub(crate) fn atomic<T>(&mut self, f: impl FnOnce(&mut Self) -> Result<T>) -> Result<T> {
        let canvas = self.canvas()?.clone();
        let (pose, pen, tail) = (self.pose, self.pen, self.tail);
        let marker = self.marker.clone();
        match f(self) {
            Ok(value) => Ok(value),
            Err(e) => {
                debug!(error = %e, "rolling back failed command");
                self.canvas = Some(canvas);
                self.pose = pose;
                self.pen = pen;
                self.tail = tail;
                self.marker = marker;
                Err(e)
            }
        }
    }

    // =========================================================================
    // Movement
    // =========================================================================

    /// Move along a local axis, drawing if the pen is down.
    pub fn travel(&mut self, axis: MoveAxis, distance: f64) -> Result<()> {
        check_finite(distance, "distance")?;
        self.canvas()?;
        let mut pose = self.pose;
        let delta = pose.advance(axis, distance);
        if self.is_pen_down() {
            self.draw_by(&delta)?;
        }
        self.pose = pose;
        debug!(?axis, distance, pen = ?self.pen, "move");
        Ok(())
    }

    /// Move along local +Y.
    pub fn forward(&mut self, distance: f64) -> Result<()> {
        self.travel(MoveAxis::Forward, distance)
    }

    /// Move along local -Y.
    pub fn backward(&mut self, distance: f64) -> Result<()> {
        self.travel(MoveAxis::Backward, distance)
    }

    /// Move along local -X.
    pub fn left(&mut self, distance: f64) -> Result<()> {
        self.travel(MoveAxis::Left, distance)
    }

    /// Move along local +X.
    pub fn right(&mut self, distance: f64) -> Result<()> {
        self.travel(MoveAxis::Right, distance)
    }

    /// Move along local +Z.
    pub fn up(&mut self, distance: f64) -> Result<()> {
        self.travel(MoveAxis::Up, distance)
    }

    /// Move along local -Z.
    pub fn down(&mut self, distance: f64) -> Result<()> {
        self.travel(MoveAxis::Down, distance)
    }

    /// Jump to an absolute world position.
    ///
    /// With the pen down the selection is extruded there and the new
    /// vertices are snapped exactly onto `target`.
    pub fn set_position(&mut self, target: Point3) -> Result<()> {
        check_finite_vec(&target.coords, "position")?;
        self.canvas()?;
        if self.is_pen_down() {
            let delta = target - self.pose.position;
            self.atomic(|s| {
                let created = s.extrude_selection(&delta)?;
                let canvas = s.canvas_mut()?;
                let local = canvas.world_to_local(&target);
                for v in &created {
                    canvas.set_vertex_position(*v, local)?;
                }
                s.finish_stroke(&created)
            })?;
        }
        self.pose.position = target;
        debug!(?target, pen = ?self.pen, "set_position");
        Ok(())
    }

    /// Extrude the selection by a world displacement, then snap the new
    /// vertices onto coincident geometry.
    fn draw_by(&mut self, world_delta: &Vec3) -> Result<()> {
        let created = self.extrude_selection(world_delta)?;
        self.finish_stroke(&created)
    }

    /// Snap `created`, then make the survivor of the last one the tail.
    fn finish_stroke(&mut self, created: &[VertexId]) -> Result<()> {
        let report = self.snap_created(created)?;
        if let Some(last) = created.last() {
            self.set_tail(report.resolve(*last));
        }
        Ok(())
    }

    fn extrude_selection(&mut self, world_delta: &Vec3) -> Result<Vec<VertexId>> {
        self.ensure_seeded()?;
        let canvas = self.canvas_mut()?;
        if canvas.selection().is_empty() {
            return Err(TurtleError::DegenerateSelection("pen-down move"));
        }
        let local = canvas.world_vec_to_local(world_delta);
        Ok(canvas.extrude_selected(&local)?)
    }

    /// Seed a selected vertex at the cursor if the canvas is empty.
    fn ensure_seeded(&mut self) -> Result<()> {
        let position = self.pose.position;
        let canvas = self.canvas_mut()?;
        if canvas.vertex_count() == 0 {
            let local = canvas.world_to_local(&position);
            let v = canvas.add_vertex(local);
            canvas.select_only(v);
            self.set_tail(v);
            debug!("seeded canvas at cursor");
        }
        Ok(())
    }

    /// Merge freshly extruded vertices into older vertices they landed on.
    fn snap_created(&mut self, created: &[VertexId]) -> Result<WeldReport> {
        let mut report = WeldReport::default();
        if !self.config.snap_moves {
            return Ok(report);
        }
        let tolerance = self.config.weld_tolerance;
        let canvas = self.canvas_mut()?;
        for v in created {
            let Some(p) = canvas.vertex_position(*v, Coords::Local) else {
                continue;
            };
            let own = canvas.ordinal(*v);
            let target = canvas
                .vertices_near(&p, tolerance)
                .into_iter()
                .find(|u| u != v && canvas.ordinal(*u) < own);
            if let Some(target) = target {
                canvas.merge_vertex(*v, target)?;
                report.merged.insert(*v, target);
            }
        }
        if !report.is_empty() {
            debug!(merged = report.merged_count(), "snapped move onto existing vertices");
            self.follow_weld(&report);
        }
        Ok(report)
    }

    // =========================================================================
    // Orientation
    // =========================================================================

    fn rotate(&mut self, axis: TurnAxis, degrees: f64) -> Result<()> {
        check_finite(degrees, "angle")?;
        self.canvas()?;
        self.pose.turn(axis, degrees);
        debug!(?axis, degrees, "turn");
        Ok(())
    }

    /// Turn left (positive yaw).
    pub fn left_turn(&mut self, degrees: f64) -> Result<()> {
        self.rotate(TurnAxis::Yaw, degrees)
    }

    /// Turn right (negative yaw).
    pub fn right_turn(&mut self, degrees: f64) -> Result<()> {
        self.rotate(TurnAxis::Yaw, -degrees)
    }

    /// Pitch up.
    pub fn look_up(&mut self, degrees: f64) -> Result<()> {
        self.rotate(TurnAxis::Pitch, degrees)
    }

    /// Pitch down.
    pub fn look_down(&mut self, degrees: f64) -> Result<()> {
        self.rotate(TurnAxis::Pitch, -degrees)
    }

    /// Roll right (positive rotation about local Y).
    pub fn roll_right(&mut self, degrees: f64) -> Result<()> {
        self.rotate(TurnAxis::Roll, degrees)
    }

    /// Roll left.
    pub fn roll_left(&mut self, degrees: f64) -> Result<()> {
        self.rotate(TurnAxis::Roll, -degrees)
    }

    /// Overwrite one Euler component.
    pub fn set_orientation(&mut self, axis: TurnAxis, degrees: f64) -> Result<()> {
        check_finite(degrees, "angle")?;
        self.canvas()?;
        self.pose.set_angle(axis, degrees);
        debug!(?axis, degrees, "set orientation");
        Ok(())
    }

    /// Overwrite yaw.
    pub fn set_heading(&mut self, degrees: f64) -> Result<()> {
        self.set_orientation(TurnAxis::Yaw, degrees)
    }

    /// Overwrite pitch.
    pub fn set_pitch(&mut self, degrees: f64) -> Result<()> {
        self.set_orientation(TurnAxis::Pitch, degrees)
    }

    /// Overwrite roll.
    pub fn set_roll(&mut self, degrees: f64) -> Result<()> {
        self.set_orientation(TurnAxis::Roll, degrees)
    }

    /// Overwrite the whole orientation (Euler XYZ, degrees).
    pub fn set_rotation(&mut self, degrees: Vec3) -> Result<()> {
        check_finite_vec(&degrees, "rotation")?;
        self.canvas()?;
        self.pose.set_orientation_degrees(&degrees);
        debug!(?degrees, "set rotation");
        Ok(())
    }

    // =========================================================================
    // Pen, home and clearing
    // =========================================================================

    /// Put the pen down.
    ///
    /// If nothing is selected, the vertex under the cursor is selected,
    /// creating it when there is none.
    pub fn pen_down(&mut self) -> Result<()> {
        let position = self.pose.position;
        let buffer = self.config.select_buffer;
        let canvas = self.canvas_mut()?;
        if canvas.vertex_count() == 0 || canvas.selection().is_empty() {
            let v = match vertices_at_point(canvas, &position, buffer).first() {
                Some(v) => *v,
                None => {
                    let local = canvas.world_to_local(&position);
                    canvas.add_vertex(local)
                }
            };
            canvas.select_only(v);
            self.set_tail(v);
        }
        self.pen = PenState::Down;
        debug!("pen down");
        Ok(())
    }

    /// Lift the pen and clear the selection.
    pub fn pen_up(&mut self) -> Result<()> {
        self.canvas_mut()?.deselect_all();
        self.pen = PenState::Up;
        debug!("pen up");
        Ok(())
    }

    /// Return to the canvas origin and base rotation.
    pub fn home(&mut self) -> Result<()> {
        let canvas = self.canvas()?;
        self.pose = Pose::new(canvas.location(), canvas.rotation());
        debug!(position = ?self.pose.position, "home");
        Ok(())
    }

    /// Delete geometry, optionally homing first.
    ///
    /// With the pen down a fresh vertex is seeded at the turtle and becomes
    /// the tail and the path start.
    pub fn clear(&mut self, mode: ClearMode) -> Result<()> {
        if mode == ClearMode::FullClear {
            self.home()?;
        }
        let position = self.pose.position;
        let pen_down = self.is_pen_down();
        let canvas = self.canvas_mut()?;
        canvas.select_all(ElementKind::Vertex);
        let removed = canvas.delete_selected(ElementKind::Vertex);
        let seed = if pen_down {
            let local = canvas.world_to_local(&position);
            let v = canvas.add_vertex(local);
            canvas.select_only(v);
            Some(v)
        } else {
            None
        };
        self.tail = seed;
        self.marker = seed.map(PathMarker::new);
        debug!(?mode, removed, "clear");
        Ok(())
    }

    /// Home, then clear the canvas.
    pub fn clear_screen(&mut self) -> Result<()> {
        self.clear(ClearMode::FullClear)
    }

    /// Clear the canvas, leaving the turtle where it is.
    pub fn clean(&mut self) -> Result<()> {
        self.clear(ClearMode::CleanOnly)
    }
}
