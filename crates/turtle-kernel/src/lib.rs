#![warn(missing_docs)]

//! Turtle-graphics engine for incremental polygon mesh construction.
//!
//! A [`TurtleSession`] owns a cursor pose, a pen state, the tail vertex
//! under the cursor, a path marker and the canvas it draws into. With the pen down, moves extrude the selected
//! vertices so consecutive moves draw a connected polyline; path, curve and
//! selection commands build faces, walls and curved outlines on top.
//!
//! # Example
//!
//! ```
//! use turtle_kernel::{TurtleSession, TurtleConfig};
//! use turtle_kernel::turtle_kernel_math::{Point3, Vec3};
//! use turtle_kernel::turtle_kernel_mesh::MeshBackend;
//!
//! let mut turtle: TurtleSession = TurtleSession::new(TurtleConfig::default());
//! turtle.add_turtle(Point3::origin(), Vec3::zeros()).unwrap();
//! turtle.run_macro("bp, fd 10, rt 90, fd 10, rt 90, fd 10, fp").unwrap();
//!
//! let canvas = turtle.canvas().unwrap();
//! assert_eq!(canvas.vertex_count(), 4);
//! assert_eq!(canvas.face_count(), 1);
//! ```

pub use turtle_ir;
pub use turtle_kernel_curve;
pub use turtle_kernel_math;
pub use turtle_kernel_mesh;
pub use turtle_kernel_select;

mod config;
mod curve;
mod dispatch;
mod edit;
mod error;
mod path;
mod session;

pub use config::{DispatchPolicy, TurtleConfig};
pub use dispatch::{CommandFailure, MacroReport};
pub use error::{ConfigError, Result, TurtleError};
pub use path::PathMarker;
pub use session::{ClearMode, PenState, TurtleSession};
