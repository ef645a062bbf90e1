//! quadwarp - command-line editor for four-corner perspective warps
//!
//! Loads a warp from a TOML config file, applies one edit or query, and
//! writes the result back when something changed.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use quadwarp::config::ConfigFile;
use quadwarp::render::CommandRecorder;
use quadwarp::snapshot::DEFAULT_GROUP;
use quadwarp::{
    Corner, HeadlessHost, InteractionState, Key, Point, PointerEvent, Rect, StateSnapshot,
    WarpError, WarpMatrix, Warper,
};

/// quadwarp - four-corner perspective warp editor
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file path
    #[arg(short, long, default_value = "quadwarp.toml", global = true)]
    config: PathBuf,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the base rectangle, corners and warp matrix
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Reset the base rectangle and put the corners on its extremes
    Setup {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        width: f64,
        height: f64,
    },
    /// Change the base rectangle while keeping the current warp
    Resetup {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
        width: f64,
        height: f64,
    },
    /// Place one corner (tl, tr, br, bl)
    SetCorner {
        corner: Corner,
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Nudge one corner with the arrow keys
    Nudge {
        corner: Corner,
        #[arg(value_enum)]
        direction: Direction,
        /// Number of key presses
        #[arg(short = 'n', long, default_value_t = 1)]
        times: u32,
    },
    /// Move every corner by an offset
    MoveAll {
        #[arg(allow_negative_numbers = true)]
        dx: f64,
        #[arg(allow_negative_numbers = true)]
        dy: f64,
    },
    /// Simulate a pointer drag gesture
    Drag {
        #[arg(allow_negative_numbers = true)]
        from_x: f64,
        #[arg(allow_negative_numbers = true)]
        from_y: f64,
        #[arg(allow_negative_numbers = true)]
        to_x: f64,
        #[arg(allow_negative_numbers = true)]
        to_y: f64,
        /// Hold shift to move the whole shape
        #[arg(long)]
        shift: bool,
        /// Number of intermediate drag events
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
    /// Map a screen point into warped space
    ToWarped {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Map a warped point back to screen space
    ToScreen {
        #[arg(allow_negative_numbers = true)]
        x: f64,
        #[arg(allow_negative_numbers = true)]
        y: f64,
    },
    /// Print the draw calls for one frame
    Draw,
    /// Mark the warper active
    Activate,
    /// Mark the warper inactive
    Deactivate,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl From<Direction> for Key {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Up => Key::Up,
            Direction::Down => Key::Down,
            Direction::Left => Key::Left,
            Direction::Right => Key::Right,
        }
    }
}

/// Output of `show --json`
#[derive(Serialize)]
struct Report {
    base: Rect,
    state: StateSnapshot,
    selection: InteractionState,
    matrix: WarpMatrix,
    degenerate: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    let _subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("quadwarp v{}", env!("CARGO_PKG_VERSION"));

    let mut file = ConfigFile::load_or_create(&args.config)?;
    let config = file.config.clone();

    let host = HeadlessHost::new(config.base.width, config.base.height);
    let mut warper = Warper::with_rect(host, config.base);
    warper.set_sensitivity(config.sensitivity);
    warper.enable_keys(config.keys);
    warper.enable_pointer(config.pointer);
    warper.draw_settings = config.draw.clone();

    match warper.load_from_table(&file.document, DEFAULT_GROUP) {
        Ok(()) => {}
        Err(WarpError::MissingGroup(_)) => info!("No saved corners, starting from the base rectangle"),
        Err(e) => return Err(e).context("Saved corners are unusable"),
    }

    let changed = run(&args.command, &mut warper)?;

    if changed {
        file.config.base = warper.base_rect();
        warper.save_to_table(&mut file.document, DEFAULT_GROUP);
        file.save()?;
    }

    if let Some(e) = warper.last_error() {
        tracing::warn!("Current corners do not define a warp: {}", e);
    }

    Ok(())
}

/// Execute one command, returning whether the warper changed
fn run(command: &Command, warper: &mut Warper<HeadlessHost>) -> Result<bool> {
    match *command {
        Command::Show { json } => {
            show(warper, json)?;
            Ok(false)
        }
        Command::Setup {
            x,
            y,
            width,
            height,
        } => {
            let sensitivity = warper.sensitivity();
            warper.setup_rect(Rect::new(x, y, width, height));
            warper.set_sensitivity(sensitivity);
            Ok(true)
        }
        Command::Resetup {
            x,
            y,
            width,
            height,
        } => {
            warper
                .re_setup_warped(Rect::new(x, y, width, height))
                .context("Cannot re-express the warp in the new rectangle")?;
            Ok(true)
        }
        Command::SetCorner { corner, x, y } => {
            warper.set_corner(corner, Point::new(x, y));
            Ok(true)
        }
        Command::Nudge {
            corner,
            direction,
            times,
        } => {
            with_focus(warper, |w| {
                w.select_corner(corner);
                for _ in 0..times {
                    w.key_pressed(direction.into());
                }
            });
            println!("{}: {}", corner, warper.corner(corner));
            Ok(true)
        }
        Command::MoveAll { dx, dy } => {
            warper.move_all_corners(Point::new(dx, dy));
            Ok(true)
        }
        Command::Drag {
            from_x,
            from_y,
            to_x,
            to_y,
            shift,
            steps,
        } => {
            let from = Point::new(from_x, from_y);
            let to = Point::new(to_x, to_y);
            with_focus(warper, |w| {
                w.pointer_pressed(PointerEvent::new(from.x, from.y).with_modifier(shift));
                let steps = steps.max(1);
                for i in 1..=steps {
                    let t = f64::from(i) / f64::from(steps);
                    let p = Point::new(from.x + (to.x - from.x) * t, from.y + (to.y - from.y) * t);
                    w.pointer_dragged(PointerEvent::new(p.x, p.y).with_modifier(shift));
                }
                w.pointer_released(PointerEvent::new(to.x, to.y).with_modifier(shift));
            });
            match warper.interaction_state() {
                InteractionState::MovingAll => println!("Moved all corners"),
                InteractionState::CornerSelected(corner) => {
                    println!("Dragged {} to {}", corner, warper.corner(corner))
                }
                InteractionState::Idle => println!("No corner within reach of {}", from),
            }
            Ok(true)
        }
        Command::ToWarped { x, y } => {
            let p = warper
                .to_warped_space(Point::new(x, y))
                .context("Point has no warped position")?;
            println!("{} {}", p.x, p.y);
            Ok(false)
        }
        Command::ToScreen { x, y } => {
            let p = warper
                .to_screen_space(Point::new(x, y))
                .context("Point has no screen position")?;
            println!("{} {}", p.x, p.y);
            Ok(false)
        }
        Command::Draw => {
            let mut ctx = CommandRecorder::new();
            warper.begin(&mut ctx);
            warper.end(&mut ctx);
            for command in &ctx.commands {
                println!("{}", serde_json::to_string(command)?);
            }
            Ok(false)
        }
        Command::Activate => {
            warper.activate(true);
            Ok(true)
        }
        Command::Deactivate => {
            warper.deactivate();
            Ok(true)
        }
    }
}

/// Run an interactive edit with input focus, restoring the previous activation
fn with_focus(warper: &mut Warper<HeadlessHost>, edit: impl FnOnce(&mut Warper<HeadlessHost>)) {
    let was_active = warper.is_active();
    warper.activate(true);
    edit(warper);
    warper.activate(was_active);
}

fn show(warper: &Warper<HeadlessHost>, json: bool) -> Result<()> {
    let report = Report {
        base: warper.base_rect(),
        state: warper.snapshot(),
        selection: warper.interaction_state(),
        matrix: warper.matrix(),
        degenerate: warper.last_error().map(|e| e.to_string()),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let base = report.base;
    println!(
        "Base: x={} y={} width={} height={}",
        base.x, base.y, base.width, base.height
    );
    for (corner, p) in warper.corners().iter() {
        println!("{:>12}: {}", corner.as_str(), p);
    }
    println!("Active: {}", report.state.active);
    if let Some(reason) = &report.degenerate {
        println!("Degenerate: {}", reason);
    }
    println!("Matrix:");
    for row in report.matrix.rows() {
        println!(
            "  [{:>12.6} {:>12.6} {:>12.6} {:>12.6}]",
            row[0], row[1], row[2], row[3]
        );
    }
    Ok(())
}
