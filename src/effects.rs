//! Line-clear flash and back-to-back quad combo banner.
//!
//! Opacity is a pure function of "now minus start" against the effect's
//! duration; nothing here runs on a timer. The app calls [`Effects::expire`]
//! once per frame, the renderer only reads.

use std::time::{Duration, Instant};

pub const COMBO_TEXT: &str = "COMBO! BACK-TO-BACK QUADS!";
const COMBO_PEAK: f32 = 1.0;
const COMBO_DURATION: Duration = Duration::from_millis(1000);
/// Quads in a row needed before the banner shows.
const COMBO_QUADS: u32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FlashKind {
    #[default]
    None,
    Single,
    Double,
    Triple,
    Quad,
}

impl FlashKind {
    pub fn from_cleared(cleared: u32) -> Self {
        match cleared {
            1 => Self::Single,
            2 => Self::Double,
            3 => Self::Triple,
            4 => Self::Quad,
            _ => Self::None,
        }
    }

    /// Peak opacity and fade duration.
    pub fn profile(self) -> (f32, Duration) {
        match self {
            Self::None => (0.0, Duration::ZERO),
            Self::Single => (0.2, Duration::from_millis(300)),
            Self::Double => (0.4, Duration::from_millis(400)),
            Self::Triple => (0.6, Duration::from_millis(500)),
            Self::Quad => (0.8, Duration::from_millis(600)),
        }
    }
}

/// Linear fade from `peak` at `start` to zero at `start + duration`.
pub fn decay(peak: f32, start: Instant, duration: Duration, now: Instant) -> f32 {
    let elapsed = now.saturating_duration_since(start);
    if duration.is_zero() || elapsed >= duration {
        return 0.0;
    }
    peak * (1.0 - elapsed.as_secs_f32() / duration.as_secs_f32())
}

#[derive(Debug, Clone, Default)]
pub struct Flash {
    pub active: bool,
    pub kind: FlashKind,
    pub peak: f32,
    pub duration: Duration,
    pub started: Option<Instant>,
}

#[derive(Debug, Clone, Default)]
pub struct ComboBanner {
    pub active: bool,
    pub text: &'static str,
    pub peak: f32,
    pub duration: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct Effects {
    pub flash: Flash,
    pub combo: ComboBanner,
    /// Back-to-back 4-line clears; survives across ticks.
    pub consecutive_quads: u32,
}

impl Effects {
    /// Feed the result of one lock event.
    pub fn on_lines_cleared(&mut self, cleared: u32, now: Instant) {
        if cleared == 0 {
            self.consecutive_quads = 0;
            return;
        }
        let kind = FlashKind::from_cleared(cleared);
        let (peak, duration) = kind.profile();
        self.flash = Flash {
            active: true,
            kind,
            peak,
            duration,
            started: Some(now),
        };

        if cleared == 4 {
            self.consecutive_quads += 1;
            if self.consecutive_quads >= COMBO_QUADS {
                log::debug!("combo banner: {} quads in a row", self.consecutive_quads);
                self.combo = ComboBanner {
                    active: true,
                    text: COMBO_TEXT,
                    peak: COMBO_PEAK,
                    duration: COMBO_DURATION,
                };
            }
        } else {
            self.consecutive_quads = 0;
        }
    }

    pub fn flash_opacity(&self, now: Instant) -> f32 {
        match self.flash.started {
            Some(start) if self.flash.active => {
                decay(self.flash.peak, start, self.flash.duration, now)
            }
            _ => 0.0,
        }
    }

    /// The banner shares the flash's start timestamp.
    pub fn combo_opacity(&self, now: Instant) -> f32 {
        match self.flash.started {
            Some(start) if self.combo.active => {
                decay(self.combo.peak, start, self.combo.duration, now)
            }
            _ => 0.0,
        }
    }

    /// Turns off effects whose time has run out.
    pub fn expire(&mut self, now: Instant) {
        let Some(start) = self.flash.started else {
            return;
        };
        let elapsed = now.saturating_duration_since(start);
        if self.flash.active && elapsed >= self.flash.duration {
            self.flash.active = false;
        }
        if self.combo.active && elapsed >= self.combo.duration {
            self.combo.active = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_flash_starts_at_peak() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(2, now);
        assert_eq!(fx.flash.kind, FlashKind::Double);
        assert!((fx.flash_opacity(now) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_flash_decays_linearly() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(4, now);
        let half = fx.flash_opacity(now + ms(300));
        assert!((half - 0.4).abs() < 1e-3, "{half}");
        assert_eq!(fx.flash_opacity(now + ms(600)), 0.0);
    }

    #[test]
    fn test_expire_deactivates_after_duration() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(1, now);
        fx.expire(now + ms(299));
        assert!(fx.flash.active);
        fx.expire(now + ms(301));
        assert!(!fx.flash.active);
    }

    #[test]
    fn test_zero_clear_resets_quads_without_flash() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(4, now);
        assert_eq!(fx.consecutive_quads, 1);
        fx.expire(now + ms(700));
        fx.on_lines_cleared(0, now + ms(800));
        assert_eq!(fx.consecutive_quads, 0);
        assert!(!fx.flash.active);
    }

    #[test]
    fn test_back_to_back_quads_show_combo() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(4, now);
        assert!(!fx.combo.active);
        let later = now + ms(2000);
        fx.on_lines_cleared(4, later);
        assert!(fx.combo.active);
        assert_eq!(fx.combo.text, COMBO_TEXT);
        assert!((fx.combo_opacity(later) - 1.0).abs() < 1e-6);
        assert!((fx.combo_opacity(later + ms(500)) - 0.5).abs() < 1e-3);
    }

    #[test]
    fn test_intervening_clear_breaks_combo() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(4, now);
        fx.on_lines_cleared(3, now + ms(10));
        assert_eq!(fx.consecutive_quads, 0);
        fx.on_lines_cleared(4, now + ms(20));
        assert!(!fx.combo.active);
        assert_eq!(fx.consecutive_quads, 1);
    }

    #[test]
    fn test_combo_anchored_to_flash_start() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(4, now);
        fx.on_lines_cleared(4, now + ms(100));
        // a later single re-anchors the flash; the banner fades from that start
        fx.on_lines_cleared(1, now + ms(400));
        assert!(fx.combo.active);
        assert!((fx.combo_opacity(now + ms(400)) - 1.0).abs() < 1e-6);
        fx.expire(now + ms(1400));
        assert!(!fx.combo.active);
    }

    #[test]
    fn test_oversized_clear_has_no_visible_flash() {
        let now = Instant::now();
        let mut fx = Effects::default();
        fx.on_lines_cleared(5, now);
        assert_eq!(fx.flash.kind, FlashKind::None);
        assert_eq!(fx.flash_opacity(now), 0.0);
        assert_eq!(fx.consecutive_quads, 0);
    }
}
