//! twinarcade: a falling-block puzzle and a vertical shooter in the terminal.

mod app;
mod config;
mod effects;
mod game;
mod grid;
mod input;
mod nav;
mod piece;
mod shooter;
mod theme;
mod ticker;
mod touch;
mod ui;

use anyhow::{Context, Result};
use app::App;
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;
    let (puzzle, shooter) = config::from_args(&args)?;
    let theme = theme::Theme::load(args.theme.as_deref(), args.palette).unwrap_or_else(|e| {
        log::warn!("theme not loaded, using defaults: {e}");
        theme::Theme::default()
    });
    let mut app = App::new(&args, puzzle, shooter, theme);
    app.run()?;
    Ok(())
}

/// Logs go to `--log-file` only; the terminal belongs to the UI.
fn init_logging(path: Option<&std::path::Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = std::fs::File::create(path)
        .with_context(|| format!("cannot create log file {}", path.display()))?;
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()?;
    Ok(())
}

/// A falling-block puzzle and a vertical shooter in the terminal.
#[derive(Debug, Parser)]
#[command(
    name = "twinarcade",
    version,
    about = "Falling-block puzzle and vertical shooter in the terminal, with mouse gestures.",
    long_about = "twinarcade bundles two arcade games behind a tab bar.\n\n\
        Tetris: move and rotate falling pieces, fill whole rows to clear them.\n\
        Space War: fly a ship, shoot descending enemies, dodge their fire.\n\n\
        GLOBAL:\n  Tab / 1 2 3  Switch section   [ ]  Back / forward   Enter  Play\n  P  Pause   R  Restart after game over   Q / Esc  Quit\n\n\
        TETRIS:\n  Left/A/H  Move   Right/D/L  Move   Up/W/K  Rotate   Down/S/J  Soft drop   Space  Hard drop\n  Mouse: drag sideways to move, drag down to drop one row, flick down to hard drop, click to rotate.\n\n\
        SPACE WAR:\n  WASD / arrows  Fly   J / Space  Fire   Mouse drag  Steer"
)]
pub struct Args {
    /// Section to open: introduction, tetris or spacewar (leading '#' optional).
    #[arg(short, long, value_name = "ID")]
    pub section: Option<String>,

    /// Puzzle grid width in cells.
    #[arg(long, default_value = "10", value_name = "COLS")]
    pub width: u16,

    /// Puzzle grid height in cells.
    #[arg(long, default_value = "20", value_name = "ROWS")]
    pub height: u16,

    /// Gravity interval in milliseconds.
    #[arg(long, default_value = "1000", value_name = "MS")]
    pub tick_ms: u64,

    /// Shooter frame interval in milliseconds (16 ≈ 60 FPS).
    #[arg(long, default_value = "16", value_name = "MS")]
    pub frame_ms: u64,

    /// Shooter field width in abstract pixels.
    #[arg(long, default_value = "480", value_name = "PX")]
    pub field_width: u16,

    /// Shooter field height in abstract pixels.
    #[arg(long, default_value = "640", value_name = "PX")]
    pub field_height: u16,

    /// Shooter fires continuously whenever the cooldown allows.
    #[arg(long)]
    pub auto_fire: bool,

    /// Seed for piece and enemy randomness (reproducible sessions).
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Path to theme file (btop-style theme[key]=\"value\").
    #[arg(short, long, value_name = "FILE")]
    pub theme: Option<PathBuf>,

    /// Colour palette: normal (theme), high-contrast, or colorblind.
    #[arg(long, default_value = "normal")]
    pub palette: Palette,

    /// Pseudo-pixels per terminal column for mouse gestures.
    #[arg(long, default_value = "8", value_name = "PX")]
    pub touch_scale_x: f32,

    /// Pseudo-pixels per terminal row for mouse gestures.
    #[arg(long, default_value = "16", value_name = "PX")]
    pub touch_scale_y: f32,

    /// Disable fade animations.
    #[arg(long)]
    pub no_animation: bool,

    /// Write logs to this file (level from RUST_LOG, default info).
    #[arg(long, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Palette {
    #[default]
    Normal,

    #[value(alias = "highcontrast", alias = "contrast")]
    HighContrast,

    #[value(alias = "colourblind")]
    Colorblind,
}
