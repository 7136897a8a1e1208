//! Puzzle engine: grid, active/next/ghost piece, score, lock and line clear.

use crate::config::PuzzleConfig;
use crate::effects::Effects;
use crate::grid::Grid;
use crate::piece::{Piece, PieceFactory};
use std::time::Instant;

/// Points per cleared row; no multi-line bonus.
pub const POINTS_PER_LINE: u32 = 100;

/// Column offsets tried in order when a rotation collides.
const KICK_OFFSETS: [i32; 5] = [0, -1, 1, -2, 2];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Running,
    GameOver,
}

/// One-shot player command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    MoveLeft,
    MoveRight,
    SoftDrop,
    Rotate,
    HardDrop,
}

/// What an intent or tick did to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Not running; nothing happened.
    Ignored,
    Moved,
    /// Illegal move or rotation; piece unchanged.
    Blocked,
    Locked { cleared: u32 },
}

#[derive(Debug)]
pub struct PuzzleEngine {
    config: PuzzleConfig,
    factory: PieceFactory,
    phase: Phase,
    grid: Grid,
    active: Option<Piece>,
    next: Option<Piece>,
    ghost: Option<Piece>,
    score: u32,
    lines: u32,
    effects: Effects,
}

impl PuzzleEngine {
    pub fn new(config: PuzzleConfig) -> Self {
        let factory = PieceFactory::new(config.seed);
        Self {
            grid: Grid::new(config.width, config.height),
            config,
            factory,
            phase: Phase::Idle,
            active: None,
            next: None,
            ghost: None,
            score: 0,
            lines: 0,
            effects: Effects::default(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn active(&self) -> Option<&Piece> {
        self.active.as_ref()
    }

    pub fn next(&self) -> Option<&Piece> {
        self.next.as_ref()
    }

    pub fn ghost(&self) -> Option<&Piece> {
        self.ghost.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    /// Total rows cleared this session.
    pub fn lines(&self) -> u32 {
        self.lines
    }

    pub fn effects(&self) -> &Effects {
        &self.effects
    }

    /// Effect decay is owned here; the app calls this once per frame.
    pub fn expire_effects(&mut self, now: Instant) {
        self.effects.expire(now);
    }

    /// Fresh grid, fresh pieces, zero score. The caller starts its gravity ticker.
    pub fn start(&mut self) {
        self.grid = Grid::new(self.config.width, self.config.height);
        self.score = 0;
        self.lines = 0;
        self.effects = Effects::default();
        self.next = Some(self.factory.next_piece(self.config.width));
        self.phase = Phase::Running;
        log::info!(
            "puzzle started on {}x{} grid",
            self.config.width,
            self.config.height
        );
        self.promote_next();
    }

    /// Gravity step: identical to a soft drop.
    pub fn tick(&mut self, now: Instant) -> Step {
        self.apply_intent(Intent::SoftDrop, now)
    }

    pub fn apply_intent(&mut self, intent: Intent, now: Instant) -> Step {
        if self.phase != Phase::Running {
            return Step::Ignored;
        }
        match intent {
            Intent::MoveLeft => self.shift(-1, 0, now),
            Intent::MoveRight => self.shift(1, 0, now),
            Intent::SoftDrop => self.shift(0, 1, now),
            Intent::Rotate => self.rotate(),
            Intent::HardDrop => self.hard_drop(now),
        }
    }

    fn shift(&mut self, dx: i32, dy: i32, now: Instant) -> Step {
        let Some(piece) = self.active.as_mut() else {
            return Step::Ignored;
        };
        piece.col += dx;
        piece.row += dy;
        if !self.grid.collides(piece) {
            self.update_ghost();
            return Step::Moved;
        }
        piece.col -= dx;
        piece.row -= dy;
        if dy > 0 {
            let cleared = self.lock(now);
            return Step::Locked { cleared };
        }
        Step::Blocked
    }

    fn rotate(&mut self) -> Step {
        let Some(piece) = self.active.as_mut() else {
            return Step::Ignored;
        };
        let rotated = piece.shape.rotated_cw();
        let previous_shape = std::mem::replace(&mut piece.shape, rotated);
        let previous_col = piece.col;
        for kick in KICK_OFFSETS {
            piece.col = previous_col + kick;
            if !self.grid.collides(piece) {
                self.update_ghost();
                return Step::Moved;
            }
        }
        piece.shape = previous_shape;
        piece.col = previous_col;
        Step::Blocked
    }

    fn hard_drop(&mut self, now: Instant) -> Step {
        let Some(piece) = self.active.as_mut() else {
            return Step::Ignored;
        };
        piece.row = resting_row(&self.grid, piece);
        let cleared = self.lock(now);
        Step::Locked { cleared }
    }

    /// Merge, clear, score, feed effects, promote the next piece.
    fn lock(&mut self, now: Instant) -> u32 {
        let Some(piece) = self.active.take() else {
            return 0;
        };
        self.grid.merge(&piece);
        let cleared = self.grid.clear_full_rows();
        self.score += cleared * POINTS_PER_LINE;
        self.lines += cleared;
        self.effects.on_lines_cleared(cleared, now);
        log::debug!(
            "locked {:?} at ({}, {}), cleared {} row(s), score {}",
            piece.kind,
            piece.col,
            piece.row,
            cleared,
            self.score
        );
        self.promote_next();
        cleared
    }

    fn promote_next(&mut self) {
        let width = self.config.width;
        let piece = self
            .next
            .take()
            .unwrap_or_else(|| self.factory.next_piece(width));
        self.next = Some(self.factory.next_piece(width));
        let blocked = self.grid.collides(&piece);
        self.active = Some(piece);
        self.update_ghost();
        if blocked {
            self.phase = Phase::GameOver;
            log::info!("puzzle over: spawn blocked, final score {}", self.score);
        }
    }

    fn update_ghost(&mut self) {
        self.ghost = self.active.as_ref().map(|active| {
            let mut ghost = active.clone();
            ghost.row = resting_row(&self.grid, active);
            ghost
        });
    }
}

/// Lowest row the piece reaches by falling straight down from where it is.
/// Never above the piece's own row.
fn resting_row(grid: &Grid, piece: &Piece) -> i32 {
    let mut probe = piece.clone();
    loop {
        probe.row += 1;
        if grid.collides(&probe) {
            return probe.row - 1;
        }
    }
}
