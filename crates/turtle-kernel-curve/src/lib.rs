#![warn(missing_docs)]

//! Bézier curve discretisation for the turtle kernel.
//!
//! Curves are evaluated with de Casteljau's algorithm, sampled into a
//! polyline whose first and last points are the exact curve endpoints, and
//! joined into a canvas:
//!
//! 1. the polyline is added as a chain of vertices and edges;
//! 2. the whole canvas is welded at the join tolerance, which fuses the
//!    curve start onto the path it continues;
//! 3. the vertex at the curve end becomes the only selected element.
//!
//! # Key types
//!
//! - [`QuadraticBezier`] and [`CubicBezier`], both implementing [`Bezier`]
//! - [`JoinOutcome`]: what [`join_polyline`] did to the canvas

use thiserror::Error;
use tracing::trace;
use turtle_kernel_math::{Point3, Vec3};
use turtle_kernel_mesh::{MeshBackend, MeshError, VertexId, WeldReport};

/// Errors from curve construction and joining.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CurveError {
    /// A control or end point has a NaN or infinite coordinate.
    #[error("curve points must be finite")]
    NonFinite,

    /// The last control point coincides with the end point, so the end
    /// tangent has no direction.
    #[error("end tangent is degenerate: last control point coincides with the end point")]
    DegenerateTangent,

    /// Fewer than two points to join.
    #[error("a curve polyline needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// Mesh mutation failed.
    #[error(transparent)]
    Mesh(#[from] MeshError),
}

/// Shared behaviour of the Bézier segments.
pub trait Bezier {
    /// Control polygon, start and end included.
    fn control_polygon(&self) -> Vec<Point3>;

    /// Point at parameter `t` in `[0, 1]`.
    fn evaluate(&self, t: f64) -> Point3 {
        de_casteljau(&self.control_polygon(), t)
    }

    /// First point.
    fn start(&self) -> Point3 {
        self.control_polygon()[0]
    }

    /// Last point.
    fn end(&self) -> Point3 {
        let poly = self.control_polygon();
        poly[poly.len() - 1]
    }

    /// Unnormalised tangent at the end point: end minus the last control point.
    fn end_tangent(&self) -> Vec3 {
        let poly = self.control_polygon();
        let n = poly.len();
        poly[n - 1] - poly[n - 2]
    }

    /// Check the curve is finite and its end tangent has a direction.
    fn validate(&self) -> Result<(), CurveError> {
        let poly = self.control_polygon();
        if poly.iter().any(|p| !p.coords.iter().all(|c| c.is_finite())) {
            return Err(CurveError::NonFinite);
        }
        if self.end_tangent().norm() < 1e-12 {
            return Err(CurveError::DegenerateTangent);
        }
        Ok(())
    }

    /// Sample `segments + 1` points. Endpoints are exact.
    fn discretize(&self, segments: usize) -> Vec<Point3> {
        let segments = segments.max(1);
        let mut points: Vec<Point3> = (0..=segments)
            .map(|i| self.evaluate(i as f64 / segments as f64))
            .collect();
        points[0] = self.start();
        points[segments] = self.end();
        points
    }
}

/// Quadratic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct QuadraticBezier {
    /// Start point.
    pub p0: Point3,
    /// Control point.
    pub p1: Point3,
    /// End point.
    pub p2: Point3,
}

impl QuadraticBezier {
    /// Create a quadratic segment.
    pub fn new(p0: Point3, p1: Point3, p2: Point3) -> Self {
        Self { p0, p1, p2 }
    }
}

impl Bezier for QuadraticBezier {
    fn control_polygon(&self) -> Vec<Point3> {
        vec![self.p0, self.p1, self.p2]
    }
}

/// Cubic Bézier segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubicBezier {
    /// Start point.
    pub p0: Point3,
    /// First control point.
    pub p1: Point3,
    /// Second control point.
    pub p2: Point3,
    /// End point.
    pub p3: Point3,
}

impl CubicBezier {
    /// Create a cubic segment.
    pub fn new(p0: Point3, p1: Point3, p2: Point3, p3: Point3) -> Self {
        Self { p0, p1, p2, p3 }
    }
}

impl Bezier for CubicBezier {
    fn control_polygon(&self) -> Vec<Point3> {
        vec![self.p0, self.p1, self.p2, self.p3]
    }
}

fn de_casteljau(points: &[Point3], t: f64) -> Point3 {
    let mut work: Vec<Vec3> = points.iter().map(|p| p.coords).collect();
    let n = work.len();
    for level in 1..n {
        for i in 0..n - level {
            work[i] = work[i] * (1.0 - t) + work[i + 1] * t;
        }
    }
    Point3::from(work[0])
}

/// Result of joining a polyline into a canvas.
#[derive(Debug, Clone)]
pub struct JoinOutcome {
    /// Vertex at the polyline end, after welding. It is the only selected element.
    pub end_vertex: VertexId,
    /// The polyline's vertices in order, after welding, without repeats in a row.
    pub vertices: Vec<VertexId>,
    /// Merges performed by the weld step.
    pub weld: WeldReport,
}

/// Join a world-space polyline into the canvas, weld, and select its end.
pub fn join_polyline<B: MeshBackend>(
    backend: &mut B,
    world_points: &[Point3],
    tolerance: f64,
) -> Result<JoinOutcome, CurveError> {
    if world_points.len() < 2 {
        return Err(CurveError::TooFewPoints(world_points.len()));
    }
    let mut chain: Vec<VertexId> = Vec::with_capacity(world_points.len());
    for p in world_points {
        let local = backend.world_to_local(p);
        let v = backend.add_vertex(local);
        if let Some(u) = chain.last() {
            backend.make_edge(*u, v)?;
        }
        chain.push(v);
    }

    let weld = backend.weld_coincident(tolerance);
    let mut vertices: Vec<VertexId> = Vec::with_capacity(chain.len());
    for v in chain.into_iter().map(|v| weld.resolve(v)) {
        if vertices.last() != Some(&v) {
            vertices.push(v);
        }
    }
    let end_vertex = *vertices.last().ok_or(CurveError::TooFewPoints(0))?;
    backend.select_only(end_vertex);
    trace!(
        points = world_points.len(),
        merged = weld.merged_count(),
        "joined curve polyline"
    );
    Ok(JoinOutcome {
        end_vertex,
        vertices,
        weld,
    })
}
