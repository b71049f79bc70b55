//! Command dispatch: typed commands, JSON scripts and textual macros onto
//! the session API.

use tracing::{debug, warn};
use turtle_ir::{parse_token, split_macro, Command, CoordSpace, Script, SelectKind};
use turtle_kernel_math::{Point3, Vec3};
use turtle_kernel_mesh::{Coords, ElementKind, MeshBackend};

use crate::config::DispatchPolicy;
use crate::error::{Result, TurtleError};
use crate::session::TurtleSession;

/// A command that failed under [`DispatchPolicy::Continue`].
#[derive(Debug, Clone, PartialEq)]
pub struct CommandFailure {
    /// Zero-based position in the script or macro.
    pub index: usize,
    /// The token as written, or the command name for scripts.
    pub command: String,
    /// What went wrong.
    pub error: TurtleError,
}

/// Outcome of a script or macro run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MacroReport {
    /// Commands that ran successfully.
    pub executed: usize,
    /// Commands that failed and were skipped.
    pub failures: Vec<CommandFailure>,
}

impl MacroReport {
    /// True when every command ran.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

fn vec3(v: &turtle_ir::Vec3) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

fn point3(v: &turtle_ir::Vec3) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

fn element_kind(kind: SelectKind) -> ElementKind {
    match kind {
        SelectKind::Vert => ElementKind::Vertex,
        SelectKind::Edge => ElementKind::Edge,
        SelectKind::Face => ElementKind::Face,
    }
}

fn coords(space: CoordSpace) -> Coords {
    match space {
        CoordSpace::Global => Coords::World,
        CoordSpace::Local => Coords::Local,
    }
}

impl<B: MeshBackend> TurtleSession<B> {
    /// Execute one command.
    pub fn execute(&mut self, command: &Command) -> Result<()> {
        match command {
            Command::Forward { distance } => self.forward(*distance),
            Command::Backward { distance } => self.backward(*distance),
            Command::Left { distance } => self.left(*distance),
            Command::Right { distance } => self.right(*distance),
            Command::Up { distance } => self.up(*distance),
            Command::Down { distance } => self.down(*distance),

            Command::LeftTurn { degrees } => self.left_turn(*degrees),
            Command::RightTurn { degrees } => self.right_turn(*degrees),
            Command::LookUp { degrees } => self.look_up(*degrees),
            Command::LookDown { degrees } => self.look_down(*degrees),
            Command::RollLeft { degrees } => self.roll_left(*degrees),
            Command::RollRight { degrees } => self.roll_right(*degrees),

            Command::SetPosition { position } => self.set_position(point3(position)),
            Command::SetHeading { degrees } => self.set_heading(*degrees),
            Command::SetPitch { degrees } => self.set_pitch(*degrees),
            Command::SetRoll { degrees } => self.set_roll(*degrees),
            Command::SetRotation { degrees } => self.set_rotation(vec3(degrees)),

            Command::PenDown => self.pen_down(),
            Command::PenUp => self.pen_up(),
            Command::Home => self.home(),
            Command::ClearScreen => self.clear_screen(),
            Command::Clean => self.clean(),

            Command::BeginPath => self.begin_path(),
            Command::StrokePath => self.stroke_path(),
            Command::FillPath => self.fill_path(),
            Command::SelectPath => self.select_path(),
            Command::ExtrudePath { distance } => self.extrude_path(*distance),

            Command::SelectAll => self.select_all(),
            Command::DeselectAll => self.deselect_all(),
            Command::SelectAtCursor { additive } => self.select_at_cursor(*additive).map(drop),
            Command::SelectByLocation {
                lower,
                upper,
                kind,
                coords: space,
                buffer,
                additive,
            } => self
                .select_by_location(
                    point3(lower),
                    point3(upper),
                    element_kind(*kind),
                    coords(*space),
                    *buffer,
                    *additive,
                )
                .map(drop),

            Command::QuadraticCurve { control, end } => {
                self.quadratic_curve(vec3(control), vec3(end))
            }
            Command::CubicCurve {
                control1,
                control2,
                end,
            } => self.cubic_curve(vec3(control1), vec3(control2), vec3(end)),

            Command::AddVert => self.add_vert(),
            Command::Merge => self.merge().map(drop),
            Command::Extrude { distance } => self.extrude(*distance),
            Command::Arc {
                angle,
                radius,
                steps,
            } => self.arc(*angle, *radius, *steps),
            Command::Delete { kind } => self.delete(element_kind(*kind)).map(drop),
        }
    }

    /// Run every command of a script under the configured dispatch policy.
    pub fn run_script(&mut self, script: &Script) -> Result<MacroReport> {
        let steps = script
            .commands
            .iter()
            .map(|c| (c.name().to_string(), Ok(c.clone())));
        self.run_steps(steps)
    }

    /// Parse and run a textual macro such as `"pd, fd 10, rt 90, fd 10"`.
    ///
    /// Tokens are parsed one at a time, so under
    /// [`DispatchPolicy::Continue`] an unknown verb is reported and skipped
    /// while the rest of the macro still runs.
    pub fn run_macro(&mut self, text: &str) -> Result<MacroReport> {
        let steps = split_macro(text)
            .map(|token| (token.to_string(), parse_token(token).map_err(TurtleError::from)));
        self.run_steps(steps)
    }

    fn run_steps(
        &mut self,
        steps: impl Iterator<Item = (String, Result<Command>)>,
    ) -> Result<MacroReport> {
        let policy = self.config.dispatch_policy;
        let mut report = MacroReport::default();
        for (index, (label, parsed)) in steps.enumerate() {
            let error = match parsed.and_then(|command| self.execute(&command)) {
                Ok(()) => {
                    report.executed += 1;
                    continue;
                }
                Err(e) => e,
            };
            match policy {
                DispatchPolicy::AbortOnFirstError => {
                    return Err(TurtleError::Aborted {
                        index,
                        command: label,
                        source: Box::new(error),
                    });
                }
                DispatchPolicy::Continue => {
                    warn!(index, command = %label, %error, "skipping failed command");
                    report.failures.push(CommandFailure {
                        index,
                        command: label,
                        error,
                    });
                }
            }
        }
        debug!(
            executed = report.executed,
            failed = report.failures.len(),
            "run finished"
        );
        Ok(report)
    }
}
