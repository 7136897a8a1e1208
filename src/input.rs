//! Key bindings: app commands, puzzle intents (arrows, wasd and vim) and held shooter controls.

use crate::game::Intent;
use crate::nav::Section;
use crate::shooter::ShooterInput;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use std::time::{Duration, Instant};

/// Without release events, a press counts as held this long after the last press or repeat.
const HOLD_FALLBACK: Duration = Duration::from_millis(150);

/// App-level action from a key press, checked before any game binding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Quit,
    Show(Section),
    NextSection,
    Back,
    Forward,
    Start,
    Restart,
    Pause,
}

fn plain(modifiers: KeyModifiers) -> bool {
    modifiers.is_empty() || modifiers == KeyModifiers::SHIFT
}

pub fn key_to_command(key: KeyEvent) -> Option<Command> {
    let KeyEvent { code, modifiers, .. } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Some(Command::Quit);
    }
    if !plain(modifiers) {
        return None;
    }
    let cmd = match code {
        KeyCode::Char('q') | KeyCode::Esc => Command::Quit,
        KeyCode::Tab => Command::NextSection,
        KeyCode::Char('1') => Command::Show(Section::Introduction),
        KeyCode::Char('2') => Command::Show(Section::Puzzle),
        KeyCode::Char('3') => Command::Show(Section::Shooter),
        KeyCode::Char('[') => Command::Back,
        KeyCode::Char(']') => Command::Forward,
        KeyCode::Enter => Command::Start,
        KeyCode::Char('r') | KeyCode::Char('R') => Command::Restart,
        KeyCode::Char('p') | KeyCode::Char('P') => Command::Pause,
        _ => return None,
    };
    Some(cmd)
}

/// Puzzle bindings; any unbound key maps to nothing.
pub fn key_to_intent(key: KeyEvent) -> Option<Intent> {
    if !plain(key.modifiers) {
        return None;
    }
    let intent = match key.code {
        KeyCode::Left | KeyCode::Char('a') | KeyCode::Char('h') => Intent::MoveLeft,
        KeyCode::Right | KeyCode::Char('d') | KeyCode::Char('l') => Intent::MoveRight,
        KeyCode::Down | KeyCode::Char('s') | KeyCode::Char('j') => Intent::SoftDrop,
        KeyCode::Up | KeyCode::Char('w') | KeyCode::Char('k') => Intent::Rotate,
        KeyCode::Char(' ') => Intent::HardDrop,
        _ => return None,
    };
    Some(intent)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ShooterKey {
    Left,
    Right,
    Up,
    Down,
    Shoot,
}

impl ShooterKey {
    fn from_code(code: KeyCode) -> Option<Self> {
        let key = match code {
            KeyCode::Left | KeyCode::Char('a') => Self::Left,
            KeyCode::Right | KeyCode::Char('d') => Self::Right,
            KeyCode::Up | KeyCode::Char('w') => Self::Up,
            KeyCode::Down | KeyCode::Char('s') => Self::Down,
            KeyCode::Char('j') | KeyCode::Char(' ') => Self::Shoot,
            _ => return None,
        };
        Some(key)
    }

    fn slot(self) -> usize {
        self as usize
    }
}

/// Tracks which shooter controls are currently down.
///
/// Terminals that report key releases give exact held state. Others only send
/// presses (plus OS auto-repeat), so each press keeps the control down for
/// [`HOLD_FALLBACK`]. Seeing a single release switches to exact mode.
#[derive(Debug, Clone, Default)]
pub struct HeldKeys {
    last_press: [Option<Instant>; 5],
    releases_reported: bool,
}

impl HeldKeys {
    /// Returns whether the key is a shooter control.
    pub fn on_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        let Some(k) = ShooterKey::from_code(key.code) else {
            return false;
        };
        match key.kind {
            KeyEventKind::Press | KeyEventKind::Repeat => self.last_press[k.slot()] = Some(now),
            KeyEventKind::Release => {
                self.releases_reported = true;
                self.last_press[k.slot()] = None;
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.last_press = [None; 5];
    }

    fn is_down(&self, key: ShooterKey, now: Instant) -> bool {
        match self.last_press[key.slot()] {
            None => false,
            Some(_) if self.releases_reported => true,
            Some(t) => now.saturating_duration_since(t) <= HOLD_FALLBACK,
        }
    }

    pub fn snapshot(&self, now: Instant) -> ShooterInput {
        ShooterInput {
            left: self.is_down(ShooterKey::Left, now),
            right: self.is_down(ShooterKey::Right, now),
            up: self.is_down(ShooterKey::Up, now),
            down: self.is_down(ShooterKey::Down, now),
            shoot: self.is_down(ShooterKey::Shoot, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn release(code: KeyCode) -> KeyEvent {
        KeyEvent::new_with_kind(code, KeyModifiers::NONE, KeyEventKind::Release)
    }

    #[test]
    fn test_puzzle_bindings() {
        assert_eq!(key_to_intent(press(KeyCode::Left)), Some(Intent::MoveLeft));
        assert_eq!(key_to_intent(press(KeyCode::Char('a'))), Some(Intent::MoveLeft));
        assert_eq!(key_to_intent(press(KeyCode::Char('l'))), Some(Intent::MoveRight));
        assert_eq!(key_to_intent(press(KeyCode::Char('j'))), Some(Intent::SoftDrop));
        assert_eq!(key_to_intent(press(KeyCode::Up)), Some(Intent::Rotate));
        assert_eq!(key_to_intent(press(KeyCode::Char(' '))), Some(Intent::HardDrop));
        assert_eq!(key_to_intent(press(KeyCode::Char('x'))), None);
    }

    #[test]
    fn test_ctrl_combos_are_not_game_keys() {
        let key = KeyEvent::new(KeyCode::Char('a'), KeyModifiers::CONTROL);
        assert_eq!(key_to_intent(key), None);
        let key = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_to_command(key), Some(Command::Quit));
    }

    #[test]
    fn test_commands() {
        assert_eq!(key_to_command(press(KeyCode::Esc)), Some(Command::Quit));
        assert_eq!(
            key_to_command(press(KeyCode::Char('3'))),
            Some(Command::Show(Section::Shooter))
        );
        assert_eq!(key_to_command(press(KeyCode::Char('['))), Some(Command::Back));
        assert_eq!(key_to_command(press(KeyCode::Enter)), Some(Command::Start));
        assert_eq!(key_to_command(press(KeyCode::Char('h'))), None);
    }

    #[test]
    fn test_commands_do_not_shadow_game_keys() {
        for code in [
            KeyCode::Left,
            KeyCode::Char('a'),
            KeyCode::Char('s'),
            KeyCode::Char('w'),
            KeyCode::Char('d'),
            KeyCode::Char('j'),
            KeyCode::Char(' '),
        ] {
            assert_eq!(key_to_command(press(code)), None, "{code:?}");
        }
    }

    #[test]
    fn test_held_with_release_events() {
        let now = Instant::now();
        let mut held = HeldKeys::default();
        assert!(held.on_key(press(KeyCode::Char('a')), now));
        assert!(held.on_key(release(KeyCode::Char('w')), now));
        let later = now + Duration::from_secs(5);
        assert!(held.snapshot(later).left);
        held.on_key(release(KeyCode::Char('a')), later);
        assert!(!held.snapshot(later).left);
    }

    #[test]
    fn test_held_fallback_without_releases() {
        let now = Instant::now();
        let mut held = HeldKeys::default();
        held.on_key(press(KeyCode::Char(' ')), now);
        assert!(held.snapshot(now + Duration::from_millis(100)).shoot);
        assert!(!held.snapshot(now + Duration::from_millis(200)).shoot);
    }

    #[test]
    fn test_non_shooter_key_ignored() {
        let mut held = HeldKeys::default();
        assert!(!held.on_key(press(KeyCode::Char('q')), Instant::now()));
        assert_eq!(held.snapshot(Instant::now()), ShooterInput::default());
    }
}
