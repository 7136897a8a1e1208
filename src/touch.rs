//! Touch-style gestures (mouse press/drag/release) mapped to puzzle intents.

use crate::game::Intent;
use std::time::{Duration, Instant};

/// Horizontal travel (px) before a lateral move.
const MOVE_THRESHOLD: f32 = 15.0;
/// Minimum gap between two gesture-driven moves.
const MOVE_INTERVAL: Duration = Duration::from_millis(40);
/// Downward travel (px) before the one soft drop of a gesture.
const DROP_THRESHOLD: f32 = 5.0;
/// Net downward travel at release that counts as a hard-drop flick.
const FLICK_THRESHOLD: f32 = DROP_THRESHOLD * 3.0;

#[derive(Debug, Clone, Default)]
pub struct TouchGestures {
    origin: Option<(f32, f32)>,
    last_move: Option<Instant>,
    moved: bool,
    dropped: bool,
}

impl TouchGestures {
    pub fn begin(&mut self, x: f32, y: f32) {
        self.origin = Some((x, y));
        self.moved = false;
        self.dropped = false;
    }

    /// Vertical travel wins over horizontal. The origin re-anchors after each emitted move.
    pub fn drag(&mut self, x: f32, y: f32, now: Instant) -> Option<Intent> {
        let (ox, oy) = self.origin?;
        if self
            .last_move
            .is_some_and(|t| now.saturating_duration_since(t) < MOVE_INTERVAL)
        {
            return None;
        }
        let (dx, dy) = (x - ox, y - oy);
        let intent = if dy.abs() > dx.abs() {
            if dy <= DROP_THRESHOLD || self.dropped {
                return None;
            }
            self.origin = Some((ox, y));
            self.dropped = true;
            Intent::SoftDrop
        } else {
            if dx.abs() <= MOVE_THRESHOLD {
                return None;
            }
            self.origin = Some((x, oy));
            if dx > 0.0 {
                Intent::MoveRight
            } else {
                Intent::MoveLeft
            }
        };
        self.last_move = Some(now);
        self.moved = true;
        Some(intent)
    }

    /// A downward flick hard-drops; a still tap rotates.
    pub fn end(&mut self, _x: f32, y: f32) -> Option<Intent> {
        let (_, oy) = self.origin.take()?;
        let intent = if y - oy > FLICK_THRESHOLD {
            Some(Intent::HardDrop)
        } else if !self.moved {
            Some(Intent::Rotate)
        } else {
            None
        };
        self.moved = false;
        self.dropped = false;
        intent
    }
}
