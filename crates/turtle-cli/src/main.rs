//! turtle CLI - run turtle macros and scripts, export the resulting mesh.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use turtle_ir::Script;
use turtle_kernel::turtle_kernel_math::{Point3, Vec3};
use turtle_kernel::turtle_kernel_mesh::{Coords, MeshBackend};
use turtle_kernel::{DispatchPolicy, MacroReport, TurtleConfig, TurtleSession};

mod obj;

#[derive(Parser)]
#[command(name = "turtle")]
#[command(about = "Turtle-graphics mesh builder", long_about = None)]
struct Cli {
    /// Engine configuration (TOML)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct RunOptions {
    /// Skip failing commands instead of stopping at the first one
    #[arg(short, long)]
    keep_going: bool,

    /// Canvas location as x,y,z
    #[arg(long, value_delimiter = ',', default_values_t = [0.0, 0.0, 0.0])]
    location: Vec<f64>,

    /// Canvas rotation in degrees as x,y,z
    #[arg(long, value_delimiter = ',', default_values_t = [0.0, 0.0, 0.0])]
    rotation: Vec<f64>,

    /// Write the mesh here (format from extension: .obj, .json)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Export canvas-local coordinates instead of world coordinates
    #[arg(long)]
    local: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a macro file, or a JSON script if the extension is .json
    Run {
        /// Input file
        input: PathBuf,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Run a macro given on the command line, e.g. "fd 10, rt 90, fd 10"
    Eval {
        /// Macro text
        text: String,
        #[command(flatten)]
        options: RunOptions,
    },
    /// Convert a macro file into a JSON script
    Convert {
        /// Input macro file
        input: PathBuf,
        /// Output .json file
        output: PathBuf,
    },
}

fn init_logging(verbose: bool) {
    use tracing_subscriber::fmt;
    use tracing_subscriber::prelude::*;
    use tracing_subscriber::EnvFilter;

    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    let env_filter = EnvFilter::from_default_env().add_directive(level.into());
    let fmt_layer = fmt::layer().with_target(false).with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = match &cli.config {
        Some(path) => TurtleConfig::load_from_file(path)?,
        None => TurtleConfig::default(),
    };

    match cli.command {
        Commands::Run { input, options } => {
            let text = std::fs::read_to_string(&input)
                .with_context(|| format!("failed to read {}", input.display()))?;
            let is_json = input
                .extension()
                .and_then(|e| e.to_str())
                .is_some_and(|e| e.eq_ignore_ascii_case("json"));
            let source = if is_json {
                Source::Script(Script::from_json(&text)?)
            } else {
                Source::Macro(text)
            };
            run(config, &source, &options)?;
        }
        Commands::Eval { text, options } => {
            run(config, &Source::Macro(text), &options)?;
        }
        Commands::Convert { input, output } => {
            convert(&input, &output)?;
        }
    }

    Ok(())
}

enum Source {
    Macro(String),
    Script(Script),
}

fn run(mut config: TurtleConfig, source: &Source, options: &RunOptions) -> Result<()> {
    if options.keep_going {
        config.dispatch_policy = DispatchPolicy::Continue;
    }
    let location = triple(&options.location, "--location")?;
    let rotation = triple(&options.rotation, "--rotation")?;
    let mut turtle: TurtleSession = TurtleSession::new(config);
    turtle.add_turtle(Point3::from(location), rotation)?;

    let report = match source {
        Source::Macro(text) => turtle.run_macro(text)?,
        Source::Script(script) => turtle.run_script(script)?,
    };
    print_summary(&turtle, &report)?;

    if let Some(output) = &options.output {
        let coords = if options.local {
            Coords::Local
        } else {
            Coords::World
        };
        export_mesh(&turtle, output, coords)?;
    }
    Ok(())
}

fn triple(values: &[f64], flag: &str) -> Result<Vec3> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => anyhow::bail!("{} expects three comma-separated numbers, got {}", flag, values.len()),
    }
}

fn print_summary(turtle: &TurtleSession, report: &MacroReport) -> Result<()> {
    let canvas = turtle.canvas()?;
    println!("Executed {} command(s)", report.executed);
    for failure in &report.failures {
        println!(
            "  skipped #{} `{}`: {}",
            failure.index, failure.command, failure.error
        );
    }
    println!("Mesh:");
    println!("  Vertices: {}", canvas.vertex_count());
    println!("  Edges: {}", canvas.edge_count());
    println!("  Faces: {}", canvas.face_count());
    let p = turtle.position();
    let h = turtle.heading();
    println!("Turtle:");
    println!("  Position: ({:.4}, {:.4}, {:.4})", p.x, p.y, p.z);
    println!("  Rotation: ({:.2}, {:.2}, {:.2})", h.x, h.y, h.z);
    Ok(())
}

fn export_mesh(turtle: &TurtleSession, output: &Path, coords: Coords) -> Result<()> {
    let mesh = turtle.canvas()?.export(coords);
    let ext = output.extension().and_then(|e| e.to_str()).unwrap_or("");
    let contents = match ext.to_lowercase().as_str() {
        "obj" => obj::write_obj(&mesh),
        "json" => serde_json::to_string_pretty(&mesh)?,
        _ => anyhow::bail!("Unknown output format: {}", ext),
    };
    std::fs::write(output, contents)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!("Exported mesh to {}", output.display());
    Ok(())
}

fn convert(input: &Path, output: &Path) -> Result<()> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("failed to read {}", input.display()))?;
    let script = Script::from_macro(&text)?;
    std::fs::write(output, script.to_json()?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "Converted {} command(s) from {} to {}",
        script.commands.len(),
        input.display(),
        output.display()
    );
    Ok(())
}
