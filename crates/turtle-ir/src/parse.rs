//! Textual macro parser.
//!
//! A macro is a comma- or newline-separated list of tokens. Each token is a
//! verb followed by zero or more whitespace-separated numbers; the space
//! after the verb is optional, so `rt90` and `rt 90` are the same token.
//! Tokens starting with `#` are comments.

use thiserror::Error;

use crate::{Command, CoordSpace, SelectKind, Vec3};

/// Errors from parsing a macro token.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// Token is blank.
    #[error("empty command")]
    Empty,

    /// Verb is not a known command or alias.
    #[error("unknown command `{0}`")]
    UnknownVerb(String),

    /// Wrong number of arguments.
    #[error("`{verb}` takes {expected} argument(s), got {got}")]
    ArgCount {
        /// Verb as written.
        verb: String,
        /// Accepted argument count, e.g. `1` or `6 to 8`.
        expected: &'static str,
        /// Count supplied.
        got: usize,
    },

    /// An argument is not a valid number for its slot.
    #[error("`{verb}`: `{value}` is not a valid argument")]
    BadNumber {
        /// Verb as written.
        verb: String,
        /// Offending text.
        value: String,
    },
}

/// Split a macro into trimmed, non-empty, non-comment tokens.
pub fn split_macro(text: &str) -> impl Iterator<Item = &str> {
    text.split([',', '\n'])
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.starts_with('#'))
}

/// Parse a whole macro, stopping at the first bad token.
pub fn parse_macro(text: &str) -> Result<Vec<Command>, ParseError> {
    split_macro(text).map(parse_token).collect()
}

struct Args<'a> {
    verb: &'a str,
    values: Vec<f64>,
}

impl Args<'_> {
    fn count(&self, n: usize, expected: &'static str) -> Result<&[f64], ParseError> {
        if self.values.len() == n {
            Ok(&self.values)
        } else {
            Err(self.arg_count(expected))
        }
    }

    fn arg_count(&self, expected: &'static str) -> ParseError {
        ParseError::ArgCount {
            verb: self.verb.to_string(),
            expected,
            got: self.values.len(),
        }
    }

    fn none(&self) -> Result<(), ParseError> {
        self.count(0, "0").map(|_| ())
    }

    fn one(&self) -> Result<f64, ParseError> {
        Ok(self.count(1, "1")?[0])
    }

    fn vec3(&self) -> Result<Vec3, ParseError> {
        let v = self.count(3, "3")?;
        Ok(vec3_at(v, 0))
    }

    fn flag(&self) -> Result<bool, ParseError> {
        match self.values.as_slice() {
            [] => Ok(false),
            [v] => Ok(*v != 0.0),
            _ => Err(self.arg_count("0 or 1")),
        }
    }
}

fn vec3_at(values: &[f64], i: usize) -> Vec3 {
    Vec3::new(values[i], values[i + 1], values[i + 2])
}

/// Parse a single macro token.
pub fn parse_token(token: &str) -> Result<Command, ParseError> {
    let token = token.trim();
    if token.is_empty() {
        return Err(ParseError::Empty);
    }
    let split = token
        .find(|c: char| !(c.is_ascii_alphabetic() || c == '_'))
        .unwrap_or(token.len());
    let (verb, rest) = token.split_at(split);
    if verb.is_empty() {
        return Err(ParseError::UnknownVerb(token.to_string()));
    }
    let values = rest
        .split_whitespace()
        .map(|s| {
            s.parse::<f64>().map_err(|_| ParseError::BadNumber {
                verb: verb.to_string(),
                value: s.to_string(),
            })
        })
        .collect::<Result<Vec<_>, _>>()?;
    let a = Args { verb, values };

    let cmd = match verb.to_ascii_lowercase().as_str() {
        "fd" | "forward" => Command::Forward { distance: a.one()? },
        "bk" | "backward" => Command::Backward { distance: a.one()? },
        "lf" | "left" => Command::Left { distance: a.one()? },
        "ri" | "right" => Command::Right { distance: a.one()? },
        "up" => Command::Up { distance: a.one()? },
        "dn" | "down" => Command::Down { distance: a.one()? },
        "lt" | "left_turn" => Command::LeftTurn { degrees: a.one()? },
        "rt" | "right_turn" => Command::RightTurn { degrees: a.one()? },
        "lu" | "look_up" => Command::LookUp { degrees: a.one()? },
        "ld" | "look_down" => Command::LookDown { degrees: a.one()? },
        "rl" | "roll_left" => Command::RollLeft { degrees: a.one()? },
        "rr" | "roll_right" => Command::RollRight { degrees: a.one()? },
        "setp" | "setpos" | "set_position" => Command::SetPosition { position: a.vec3()? },
        "seth" | "set_heading" => Command::SetHeading { degrees: a.one()? },
        "setpitch" | "set_pitch" => Command::SetPitch { degrees: a.one()? },
        "setr" | "set_roll" => Command::SetRoll { degrees: a.one()? },
        "setrot" | "set_rotation" => Command::SetRotation { degrees: a.vec3()? },
        "pd" | "pen_down" => a.none().map(|_| Command::PenDown)?,
        "pu" | "pen_up" => a.none().map(|_| Command::PenUp)?,
        "home" => a.none().map(|_| Command::Home)?,
        "cs" | "clear_screen" | "clear_world" => a.none().map(|_| Command::ClearScreen)?,
        "clean" => a.none().map(|_| Command::Clean)?,
        "bp" | "begin_path" => a.none().map(|_| Command::BeginPath)?,
        "sp" | "stroke_path" => a.none().map(|_| Command::StrokePath)?,
        "fp" | "fill_path" => a.none().map(|_| Command::FillPath)?,
        "selp" | "select_path" => a.none().map(|_| Command::SelectPath)?,
        "ep" | "extrude_path" => Command::ExtrudePath { distance: a.one()? },
        "sa" | "select_all" => a.none().map(|_| Command::SelectAll)?,
        "da" | "deselect_all" => a.none().map(|_| Command::DeselectAll)?,
        "sac" | "select_at_cursor" => Command::SelectAtCursor { additive: a.flag()? },
        "sbl" | "select_by_location" => {
            let v = &a.values;
            if !(6..=8).contains(&v.len()) {
                return Err(a.arg_count("6 to 8"));
            }
            Command::SelectByLocation {
                lower: vec3_at(v, 0),
                upper: vec3_at(v, 3),
                kind: SelectKind::Vert,
                coords: CoordSpace::Global,
                buffer: v.get(6).copied().unwrap_or(0.001),
                additive: v.get(7).is_some_and(|f| *f != 0.0),
            }
        }
        "qc" | "quadratic_curve" => {
            let v = a.count(6, "6")?;
            Command::QuadraticCurve {
                control: vec3_at(v, 0),
                end: vec3_at(v, 3),
            }
        }
        "cc" | "cubic_curve" => {
            let v = a.count(9, "9")?;
            Command::CubicCurve {
                control1: vec3_at(v, 0),
                control2: vec3_at(v, 3),
                end: vec3_at(v, 6),
            }
        }
        "av" | "add_vert" => a.none().map(|_| Command::AddVert)?,
        "merge" => a.none().map(|_| Command::Merge)?,
        "ex" | "extrude" => Command::Extrude { distance: a.one()? },
        "arc" => {
            let v = a.count(3, "3")?;
            let steps = v[2];
            if steps.fract() != 0.0 || steps < 1.0 || steps > f64::from(u32::MAX) {
                return Err(ParseError::BadNumber {
                    verb: verb.to_string(),
                    value: steps.to_string(),
                });
            }
            Command::Arc {
                angle: v[0],
                radius: v[1],
                steps: steps as u32,
            }
        }
        "del" | "delv" | "delete" => a.none().map(|_| Command::Delete { kind: SelectKind::Vert })?,
        "dele" => a.none().map(|_| Command::Delete { kind: SelectKind::Edge })?,
        "delf" => a.none().map(|_| Command::Delete { kind: SelectKind::Face })?,
        _ => return Err(ParseError::UnknownVerb(verb.to_string())),
    };
    Ok(cmd)
}
