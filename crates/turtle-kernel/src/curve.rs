//! Curve and arc commands.
//!
//! Control and end points are offsets in the turtle's local frame. With the
//! pen down the sampled curve is joined into the canvas and welded, and its
//! end becomes the tail. Either way the turtle ends on the curve end, facing
//! along its end tangent.

use tracing::debug;
use turtle_kernel_curve::{join_polyline, Bezier, CubicBezier, CurveError, QuadraticBezier};
use turtle_kernel_math::{Point3, Vec3};
use turtle_kernel_mesh::MeshBackend;

use crate::error::{Result, TurtleError};
use crate::session::{check_finite, check_finite_vec, TurtleSession};

impl<B: MeshBackend> TurtleSession<B> {
    /// Quadratic Bézier from the turtle through `control` to `end`.
    pub fn quadratic_curve(&mut self, control: Vec3, end: Vec3) -> Result<()> {
        let curve = QuadraticBezier::new(
            self.pose.position,
            self.pose.local_point(&control),
            self.pose.local_point(&end),
        );
        self.draw_curve(&curve)
    }

    /// Cubic Bézier from the turtle through `control1` and `control2` to `end`.
    pub fn cubic_curve(&mut self, control1: Vec3, control2: Vec3, end: Vec3) -> Result<()> {
        let curve = CubicBezier::new(
            self.pose.position,
            self.pose.local_point(&control1),
            self.pose.local_point(&control2),
            self.pose.local_point(&end),
        );
        self.draw_curve(&curve)
    }

    fn draw_curve(&mut self, curve: &impl Bezier) -> Result<()> {
        self.canvas()?;
        curve
            .validate()
            .map_err(TurtleError::MalformedCurveControlPoints)?;
        let mut pose = self.pose;
        pose.position = curve.end();
        if !pose.look_along(&curve.end_tangent()) {
            return Err(TurtleError::MalformedCurveControlPoints(
                CurveError::DegenerateTangent,
            ));
        }

        if self.is_pen_down() {
            let points = curve.discretize(self.config.curve_resolution);
            let tolerance = self.config.weld_tolerance;
            self.atomic(|s| {
                let outcome = join_polyline(s.canvas_mut()?, &points, tolerance)?;
                s.follow_weld(&outcome.weld);
                for v in outcome.vertices {
                    s.set_tail(v);
                }
                Ok(())
            })?;
        }
        self.pose = pose;
        debug!(end = ?pose.position, pen = ?self.pen, "curve");
        Ok(())
    }

    /// Arc of `steps` segments around the turtle in its local XY plane.
    ///
    /// Starts at local +Y·`radius` and sweeps `angle` degrees, positive
    /// counter-clockwise. The turtle does not move and the previous
    /// selection is restored. Does nothing with the pen up.
    pub fn arc(&mut self, angle: f64, radius: f64, steps: u32) -> Result<()> {
        check_finite(angle, "angle")?;
        check_finite(radius, "radius")?;
        self.canvas()?;
        if steps == 0 {
            return Err(TurtleError::DegenerateSelection("arc with zero steps"));
        }
        if !self.is_pen_down() {
            return Ok(());
        }

        let sweep = angle.to_radians();
        let points: Vec<Point3> = (0..=steps)
            .map(|i| {
                let theta = sweep * f64::from(i) / f64::from(steps);
                let offset = Vec3::new(-radius * theta.sin(), radius * theta.cos(), 0.0);
                self.pose.local_point(&offset)
            })
            .collect();
        check_finite_vec(&points[points.len() - 1].coords, "arc end")?;

        let tolerance = self.config.weld_tolerance;
        self.atomic(|s| {
            let canvas = s.canvas_mut()?;
            let mut previous = canvas.selection().clone();
            let outcome = join_polyline(canvas, &points, tolerance)?;
            previous.remap_vertices(|v| outcome.weld.resolve(v));
            canvas.select(previous.kind(), previous.iter().copied().collect(), false);
            s.follow_weld(&outcome.weld);
            Ok(())
        })?;
        debug!(angle, radius, steps, "arc");
        Ok(())
    }
}
