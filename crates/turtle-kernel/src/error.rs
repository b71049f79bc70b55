//! Error types for the turtle engine.

use std::io;
use std::path::PathBuf;

use thiserror::Error;
use turtle_ir::ParseError;
use turtle_kernel_curve::CurveError;
use turtle_kernel_mesh::MeshError;

/// Errors a turtle command can fail with.
///
/// Every variant is recoverable: the session is left as it was before the
/// failing command.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TurtleError {
    /// No canvas is attached to the session.
    #[error("no active canvas")]
    NoActiveCanvas,

    /// A path command ran before `begin_path`.
    #[error("no path marker set; call begin_path first")]
    NoMarkerSet,

    /// A vertex recorded on the path after its start has been deleted.
    #[error("path range is invalid: vertex {missing} of {len} on the path no longer exists")]
    InvalidRange {
        /// Position along the path of the first missing vertex.
        missing: usize,
        /// Number of vertices recorded on the path.
        len: usize,
    },

    /// The vertex the path marker refers to no longer exists.
    #[error("path marker refers to a deleted vertex")]
    StaleMarker,

    /// The operation needs selected elements and there are none, or too few.
    #[error("{0} needs a non-empty selection")]
    DegenerateSelection(&'static str),

    /// Curve control points leave the end tangent undefined.
    #[error("malformed curve control points: {0}")]
    MalformedCurveControlPoints(CurveError),

    /// The canvas has no vertices.
    #[error("canvas is empty")]
    EmptyCanvas,

    /// A numeric argument is NaN or infinite.
    #[error("{0} must be finite")]
    NonFinite(&'static str),

    /// Mesh operation failed.
    #[error("mesh error: {0}")]
    Mesh(MeshError),

    /// Curve joining failed.
    #[error("curve error: {0}")]
    Curve(CurveError),

    /// A macro token could not be parsed.
    #[error("parse error: {0}")]
    Parse(#[from] ParseError),

    /// A command in a script or macro failed and the dispatch policy aborted.
    #[error("command {index} (`{command}`) failed: {source}")]
    Aborted {
        /// Zero-based position of the failing command.
        index: usize,
        /// The command as written, or its name.
        command: String,
        /// Underlying failure.
        #[source]
        source: Box<TurtleError>,
    },
}

impl From<MeshError> for TurtleError {
    fn from(e: MeshError) -> Self {
        match e {
            MeshError::EmptySelection => TurtleError::DegenerateSelection("extrusion"),
            other => TurtleError::Mesh(other),
        }
    }
}

impl From<CurveError> for TurtleError {
    fn from(e: CurveError) -> Self {
        match e {
            CurveError::NonFinite | CurveError::DegenerateTangent => {
                TurtleError::MalformedCurveControlPoints(e)
            }
            CurveError::Mesh(m) => m.into(),
            other => TurtleError::Curve(other),
        }
    }
}

/// Result type for turtle commands.
pub type Result<T> = std::result::Result<T, TurtleError>;

/// Errors loading or validating a [`TurtleConfig`](crate::TurtleConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read.
    #[error("failed to read config {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The file is not valid TOML for the config schema.
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// A value is out of range.
    #[error("invalid setting '{key}': {reason}")]
    InvalidSetting {
        /// Offending key.
        key: &'static str,
        /// What is wrong with it.
        reason: String,
    },
}
