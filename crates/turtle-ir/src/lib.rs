#![warn(missing_docs)]

//! Command representation for turtle scripts.
//!
//! A script is a flat list of [`Command`]s executed in order against one
//! turtle session. Scripts come in two forms:
//!
//! - JSON, as a [`Script`] document;
//! - the textual macro form, e.g. `"pd, fd 10, rt 90, fd 10"`, parsed by
//!   [`parse_macro`].
//!
//! The IR is purely declarative. Execution lives in the engine crate.

mod parse;

pub use parse::{parse_macro, parse_token, split_macro, ParseError};

use serde::{Deserialize, Serialize};

/// 3D vector with f64 components.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Vec3 {
    /// X component.
    pub x: f64,
    /// Y component.
    pub y: f64,
    /// Z component.
    pub z: f64,
}

impl Vec3 {
    /// Create a new Vec3.
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Element kind a location selection targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SelectKind {
    /// Vertices.
    #[default]
    Vert,
    /// Edges; both endpoints must be inside.
    Edge,
    /// Faces; every vertex must be inside.
    Face,
}

/// Coordinate space a location selection is measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CoordSpace {
    /// World coordinates.
    #[default]
    Global,
    /// Canvas-local coordinates.
    Local,
}

fn default_buffer() -> f64 {
    0.001
}

/// A single turtle command.
///
/// Distances are in canvas units, angles in degrees. Curve control points
/// are offsets in the turtle's own frame (+Y forward, +Z up).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Command {
    /// Move along local +Y.
    Forward {
        /// Distance to move.
        distance: f64,
    },
    /// Move along local -Y.
    Backward {
        /// Distance to move.
        distance: f64,
    },
    /// Move along local -X.
    Left {
        /// Distance to move.
        distance: f64,
    },
    /// Move along local +X.
    Right {
        /// Distance to move.
        distance: f64,
    },
    /// Move along local +Z.
    Up {
        /// Distance to move.
        distance: f64,
    },
    /// Move along local -Z.
    Down {
        /// Distance to move.
        distance: f64,
    },
    /// Yaw left.
    LeftTurn {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Yaw right.
    RightTurn {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Pitch up.
    LookUp {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Pitch down.
    LookDown {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Roll left.
    RollLeft {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Roll right.
    RollRight {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Jump to an absolute world position, drawing if the pen is down.
    SetPosition {
        /// Target position.
        position: Vec3,
    },
    /// Overwrite yaw.
    SetHeading {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Overwrite pitch.
    SetPitch {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Overwrite roll.
    SetRoll {
        /// Angle in degrees.
        degrees: f64,
    },
    /// Overwrite the full orientation.
    SetRotation {
        /// Euler XYZ angles in degrees.
        degrees: Vec3,
    },
    /// Start drawing.
    PenDown,
    /// Stop drawing.
    PenUp,
    /// Return to the canvas origin and base rotation.
    Home,
    /// Home, then clear the canvas.
    ClearScreen,
    /// Clear the canvas, leaving the turtle where it is.
    Clean,
    /// Remember the last created vertex as the path start.
    BeginPath,
    /// Edge from the path start to the last vertex.
    StrokePath,
    /// Face over the path.
    FillPath,
    /// Select the path.
    SelectPath,
    /// Extrude the path along the turtle's up axis.
    ExtrudePath {
        /// Extrusion distance.
        distance: f64,
    },
    /// Select every vertex.
    SelectAll,
    /// Clear the selection.
    DeselectAll,
    /// Select the vertices under the turtle.
    SelectAtCursor {
        /// Add to the selection instead of replacing it.
        #[serde(default)]
        additive: bool,
    },
    /// Select the elements inside a box.
    SelectByLocation {
        /// Lower corner.
        lower: Vec3,
        /// Upper corner.
        upper: Vec3,
        /// Element kind to select.
        #[serde(default)]
        kind: SelectKind,
        /// Space the corners are given in.
        #[serde(default)]
        coords: CoordSpace,
        /// Inclusion buffer.
        #[serde(default = "default_buffer")]
        buffer: f64,
        /// Add to the selection instead of replacing it.
        #[serde(default)]
        additive: bool,
    },
    /// Quadratic Bézier from the turtle.
    QuadraticCurve {
        /// Control point.
        control: Vec3,
        /// End point.
        end: Vec3,
    },
    /// Cubic Bézier from the turtle.
    CubicCurve {
        /// First control point.
        control1: Vec3,
        /// Second control point.
        control2: Vec3,
        /// End point.
        end: Vec3,
    },
    /// Add a vertex at the turtle and select only it.
    AddVert,
    /// Weld coincident vertices.
    Merge,
    /// Region-extrude the selection along its normal.
    Extrude {
        /// Extrusion distance.
        distance: f64,
    },
    /// Draw an arc around the turtle.
    Arc {
        /// Swept angle in degrees, positive counter-clockwise.
        angle: f64,
        /// Arc radius.
        radius: f64,
        /// Number of segments.
        steps: u32,
    },
    /// Delete the selected elements of a kind.
    Delete {
        /// Element kind to delete.
        #[serde(default)]
        kind: SelectKind,
    },
}

impl Command {
    /// Stable snake-case name, used in logs and reports.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Forward { .. } => "forward",
            Command::Backward { .. } => "backward",
            Command::Left { .. } => "left",
            Command::Right { .. } => "right",
            Command::Up { .. } => "up",
            Command::Down { .. } => "down",
            Command::LeftTurn { .. } => "left_turn",
            Command::RightTurn { .. } => "right_turn",
            Command::LookUp { .. } => "look_up",
            Command::LookDown { .. } => "look_down",
            Command::RollLeft { .. } => "roll_left",
            Command::RollRight { .. } => "roll_right",
            Command::SetPosition { .. } => "set_position",
            Command::SetHeading { .. } => "set_heading",
            Command::SetPitch { .. } => "set_pitch",
            Command::SetRoll { .. } => "set_roll",
            Command::SetRotation { .. } => "set_rotation",
            Command::PenDown => "pen_down",
            Command::PenUp => "pen_up",
            Command::Home => "home",
            Command::ClearScreen => "clear_screen",
            Command::Clean => "clean",
            Command::BeginPath => "begin_path",
            Command::StrokePath => "stroke_path",
            Command::FillPath => "fill_path",
            Command::SelectPath => "select_path",
            Command::ExtrudePath { .. } => "extrude_path",
            Command::SelectAll => "select_all",
            Command::DeselectAll => "deselect_all",
            Command::SelectAtCursor { .. } => "select_at_cursor",
            Command::SelectByLocation { .. } => "select_by_location",
            Command::QuadraticCurve { .. } => "quadratic_curve",
            Command::CubicCurve { .. } => "cubic_curve",
            Command::AddVert => "add_vert",
            Command::Merge => "merge",
            Command::Extrude { .. } => "extrude",
            Command::Arc { .. } => "arc",
            Command::Delete { .. } => "delete",
        }
    }
}

/// A turtle script, the JSON file format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Format version string.
    pub version: String,
    /// Commands in execution order.
    pub commands: Vec<Command>,
}

impl Default for Script {
    fn default() -> Self {
        Self {
            version: "0.1".to_string(),
            commands: Vec::new(),
        }
    }
}

impl Script {
    /// Create a script from commands.
    pub fn new(commands: Vec<Command>) -> Self {
        Self {
            commands,
            ..Self::default()
        }
    }

    /// Parse a textual macro into a script.
    pub fn from_macro(text: &str) -> Result<Self, ParseError> {
        Ok(Self::new(parse_macro(text)?))
    }

    /// Serialize to JSON string.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize from JSON string.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serde_tagged_enum() {
        let cmd = Command::Forward { distance: 10.0 };
        let json = serde_json::to_string(&cmd).unwrap();
        assert!(json.contains("\"type\":\"Forward\""));

        let parsed: Command = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, cmd);
    }

    #[test]
    fn unit_variants_serialize_as_bare_tag() {
        let json = serde_json::to_string(&Command::PenDown).unwrap();
        assert_eq!(json, r#"{"type":"PenDown"}"#);
    }

    #[test]
    fn select_by_location_defaults() {
        let json = r#"{
            "type": "SelectByLocation",
            "lower": {"x": 0.0, "y": 0.0, "z": 0.0},
            "upper": {"x": 1.0, "y": 1.0, "z": 0.0}
        }"#;
        let cmd: Command = serde_json::from_str(json).unwrap();
        match cmd {
            Command::SelectByLocation {
                kind,
                coords,
                buffer,
                additive,
                ..
            } => {
                assert_eq!(kind, SelectKind::Vert);
                assert_eq!(coords, CoordSpace::Global);
                assert_eq!(buffer, 0.001);
                assert!(!additive);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn script_json_document() {
        let json = r#"{
            "version": "0.1",
            "commands": [
                {"type": "PenDown"},
                {"type": "Forward", "distance": 10.0},
                {"type": "Arc", "angle": 90.0, "radius": 2.0, "steps": 8},
                {"type": "Delete", "kind": "face"}
            ]
        }"#;
        let script = Script::from_json(json).unwrap();
        assert_eq!(script.commands.len(), 4);
        assert_eq!(script.commands[3], Command::Delete { kind: SelectKind::Face });

        let again = Script::from_json(&script.to_json().unwrap()).unwrap();
        assert_eq!(again, script);
    }

    #[test]
    fn script_from_macro() {
        let script = Script::from_macro("pd, fd 10, rt 90").unwrap();
        assert_eq!(script.version, "0.1");
        assert_eq!(
            script.commands.iter().map(Command::name).collect::<Vec<_>>(),
            vec!["pen_down", "forward", "right_turn"]
        );
    }
}
