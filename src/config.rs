//! Per-game settings derived from the command line.

use crate::Args;
use std::time::Duration;
use thiserror::Error;

const MIN_GRID_SIDE: u16 = 4;
const MAX_GRID_SIDE: u16 = 200;
const MIN_FIELD_WIDTH: u16 = 100;
const MIN_FIELD_HEIGHT: u16 = 200;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("grid must be at least 4x4 cells, got {0}x{1}")]
    GridTooSmall(u16, u16),
    #[error("grid must be at most 200x200 cells, got {0}x{1}")]
    GridTooLarge(u16, u16),
    #[error("shooter field must be at least 100x200, got {0}x{1}")]
    FieldTooSmall(u16, u16),
    #[error("{0} interval must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Puzzle rules that stay fixed for a session.
#[derive(Debug, Clone)]
pub struct PuzzleConfig {
    pub width: usize,
    pub height: usize,
    pub tick: Duration,
    pub seed: Option<u64>,
}

impl PuzzleConfig {
    pub fn new(width: u16, height: u16, tick: Duration, seed: Option<u64>) -> Result<Self, ConfigError> {
        if width < MIN_GRID_SIDE || height < MIN_GRID_SIDE {
            return Err(ConfigError::GridTooSmall(width, height));
        }
        if width > MAX_GRID_SIDE || height > MAX_GRID_SIDE {
            return Err(ConfigError::GridTooLarge(width, height));
        }
        if tick.is_zero() {
            return Err(ConfigError::ZeroInterval("gravity"));
        }
        Ok(Self {
            width: width as usize,
            height: height as usize,
            tick,
            seed,
        })
    }
}

impl Default for PuzzleConfig {
    fn default() -> Self {
        Self {
            width: 10,
            height: 20,
            tick: Duration::from_millis(1000),
            seed: None,
        }
    }
}

/// Shooter play field (abstract pixels) and frame pacing.
#[derive(Debug, Clone)]
pub struct ShooterConfig {
    pub field_width: f32,
    pub field_height: f32,
    pub frame: Duration,
    /// Fire whenever the cooldown allows, without a shoot key.
    pub auto_fire: bool,
    pub seed: Option<u64>,
}

impl ShooterConfig {
    pub fn new(
        field_width: u16,
        field_height: u16,
        frame: Duration,
        auto_fire: bool,
        seed: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if field_width < MIN_FIELD_WIDTH || field_height < MIN_FIELD_HEIGHT {
            return Err(ConfigError::FieldTooSmall(field_width, field_height));
        }
        if frame.is_zero() {
            return Err(ConfigError::ZeroInterval("frame"));
        }
        Ok(Self {
            field_width: f32::from(field_width),
            field_height: f32::from(field_height),
            frame,
            auto_fire,
            seed,
        })
    }
}

impl Default for ShooterConfig {
    fn default() -> Self {
        Self {
            field_width: 480.0,
            field_height: 640.0,
            frame: Duration::from_millis(16),
            auto_fire: false,
            seed: None,
        }
    }
}

/// Both game configs, validated together.
pub fn from_args(args: &Args) -> Result<(PuzzleConfig, ShooterConfig), ConfigError> {
    let puzzle = PuzzleConfig::new(
        args.width,
        args.height,
        Duration::from_millis(args.tick_ms),
        args.seed,
    )?;
    let shooter = ShooterConfig::new(
        args.field_width,
        args.field_height,
        Duration::from_millis(args.frame_ms),
        args.auto_fire,
        args.seed,
    )?;
    Ok((puzzle, shooter))
}
