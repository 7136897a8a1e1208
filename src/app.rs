//! App: terminal init, main loop, tickers, key and mouse handling.

use crate::config::{PuzzleConfig, ShooterConfig};
use crate::game::{Phase, PuzzleEngine};
use crate::input::{Command, HeldKeys, key_to_command, key_to_intent};
use crate::nav::{Navigator, Section};
use crate::shooter::{ShooterEngine, ShooterPhase};
use crate::theme::Theme;
use crate::ticker::Ticker;
use crate::touch::TouchGestures;
use crate::ui::{self, Animations, Scene};
use crate::Args;
use anyhow::Result;
use crossterm::event::{
    self, Event, KeyEvent, KeyEventKind, MouseButton, MouseEvent, MouseEventKind,
};
use ratatui::DefaultTerminal;
use ratatui::layout::Rect;
use std::time::{Duration, Instant};

/// Upper bound on one loop iteration; keeps effects animating between ticks.
const FRAME: Duration = Duration::from_millis(16);

pub struct App {
    nav: Navigator,
    theme: Theme,
    puzzle_config: PuzzleConfig,
    shooter_config: ShooterConfig,
    puzzle: PuzzleEngine,
    gravity: Ticker,
    shooter: ShooterEngine,
    frames: Ticker,
    held: HeldKeys,
    gestures: TouchGestures,
    /// Pseudo-pixels per terminal column and row for mouse gestures.
    touch_scale: (f32, f32),
    /// Last pointer cell during a shooter drag.
    pointer: Option<(u16, u16)>,
    paused: bool,
    anim: Animations,
    /// Terminal area of the last drawn frame, for mapping mouse cells.
    area: Rect,
    puzzle_seen: Phase,
    shooter_seen: ShooterPhase,
}

impl App {
    pub fn new(
        args: &Args,
        puzzle_config: PuzzleConfig,
        shooter_config: ShooterConfig,
        theme: Theme,
    ) -> Self {
        let nav = Navigator::resolve(args.section.as_deref());
        log::info!("opening {}", nav.location());
        let gravity = Ticker::new(puzzle_config.tick);
        let frames = Ticker::new(shooter_config.frame);
        log::debug!(
            "gravity every {:?}, shooter frame every {:?}",
            gravity.interval(),
            frames.interval()
        );
        Self {
            nav,
            theme,
            puzzle: PuzzleEngine::new(puzzle_config.clone()),
            gravity,
            shooter: ShooterEngine::new(shooter_config.clone()),
            frames,
            puzzle_config,
            shooter_config,
            held: HeldKeys::default(),
            gestures: TouchGestures::default(),
            touch_scale: (args.touch_scale_x, args.touch_scale_y),
            pointer: None,
            paused: false,
            anim: Animations::new(!args.no_animation),
            area: Rect::default(),
            puzzle_seen: Phase::Idle,
            shooter_seen: ShooterPhase::Idle,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        crossterm::terminal::enable_raw_mode()?;
        let result = restoring(|| self.run_in_terminal(), restore_terminal);
        log::info!("bye");
        result
    }

    fn run_in_terminal(&mut self) -> Result<()> {
        use crossterm::{
            event::{EnableMouseCapture, KeyboardEnhancementFlags, PushKeyboardEnhancementFlags},
            execute,
            terminal::EnterAlternateScreen,
        };

        let mut stdout = std::io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

        // Release events make held shooter controls exact; not every terminal supports them.
        if execute!(
            stdout,
            PushKeyboardEnhancementFlags(KeyboardEnhancementFlags::REPORT_EVENT_TYPES)
        )
        .is_err()
        {
            log::info!("keyboard enhancement unavailable, using hold fallback");
        }

        let mut terminal =
            ratatui::DefaultTerminal::new(ratatui::backend::CrosstermBackend::new(stdout))?;
        self.anim.section_changed(self.theme.bg);
        self.run_loop(&mut terminal)
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> Result<()> {
        loop {
            let now = Instant::now();
            self.update(now);

            terminal.draw(|f| {
                self.area = f.area();
                let scene = Scene {
                    nav: &self.nav,
                    puzzle: &self.puzzle,
                    shooter: &self.shooter,
                    theme: &self.theme,
                    paused: self.paused,
                    now,
                };
                ui::draw(f, &scene, &mut self.anim);
            })?;

            let timeout = [self.gravity.remaining(now), self.frames.remaining(now)]
                .into_iter()
                .flatten()
                .fold(FRAME, Duration::min)
                .saturating_sub(now.elapsed());

            if event::poll(timeout)? {
                while event::poll(Duration::ZERO)? {
                    let keep_going = match event::read()? {
                        Event::Key(key) => self.on_key(key, Instant::now()),
                        Event::Mouse(mouse) => {
                            self.on_mouse(mouse, Instant::now());
                            true
                        }
                        _ => true,
                    };
                    if !keep_going {
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Fires due ticks, expires effects and keeps tickers in step with game state.
    fn update(&mut self, now: Instant) {
        self.puzzle.expire_effects(now);
        if self.gravity.poll(now) {
            self.puzzle.tick(now);
        }
        if self.frames.poll(now) {
            let input = self.held.snapshot(now);
            self.shooter.step(&input, now);
        }
        self.watch_game_over();
        self.sync_tickers(now);
    }

    /// A ticker runs only while its game is running, visible and not paused.
    fn sync_tickers(&mut self, now: Instant) {
        let active = self.nav.active();
        let puzzle_live =
            active == Section::Puzzle && self.puzzle.phase() == Phase::Running && !self.paused;
        let shooter_live = active == Section::Shooter
            && self.shooter.phase() == ShooterPhase::Running
            && !self.paused;
        for (ticker, live) in [(&mut self.gravity, puzzle_live), (&mut self.frames, shooter_live)] {
            match (live, ticker.is_running()) {
                (true, false) => ticker.start(now),
                (false, true) => ticker.stop(),
                _ => {}
            }
        }
    }

    fn watch_game_over(&mut self) {
        let puzzle = self.puzzle.phase();
        let shooter = self.shooter.phase();
        if puzzle == Phase::GameOver && self.puzzle_seen != Phase::GameOver
            || shooter == ShooterPhase::GameOver && self.shooter_seen != ShooterPhase::GameOver
        {
            self.anim.game_over(self.theme.bg);
        }
        self.puzzle_seen = puzzle;
        self.shooter_seen = shooter;
    }

    fn show(&mut self, section: Section) {
        let before = self.nav.active();
        let after = self.nav.activate(section);
        self.switched(before, after);
    }

    fn switched(&mut self, before: Section, after: Section) {
        if before != after {
            self.paused = false;
            self.held.clear();
            self.pointer = None;
            self.gestures = TouchGestures::default();
            self.anim.section_changed(self.theme.bg);
        }
    }

    fn start_active(&mut self) {
        match self.nav.active() {
            Section::Puzzle if self.puzzle.phase() == Phase::Idle => self.puzzle.start(),
            Section::Shooter if self.shooter.phase() == ShooterPhase::Idle => self.shooter.start(),
            _ => {}
        }
    }

    fn restart_active(&mut self) {
        match self.nav.active() {
            Section::Puzzle if self.puzzle.phase() == Phase::GameOver => {
                self.puzzle = PuzzleEngine::new(self.puzzle_config.clone());
                self.puzzle.start();
            }
            Section::Shooter if self.shooter.phase() == ShooterPhase::GameOver => {
                self.shooter = ShooterEngine::new(self.shooter_config.clone());
                self.shooter.start();
            }
            _ => return,
        }
        self.paused = false;
        self.anim.clear_game_over();
    }

    fn toggle_pause(&mut self) {
        let running = match self.nav.active() {
            Section::Puzzle => self.puzzle.phase() == Phase::Running,
            Section::Shooter => self.shooter.phase() == ShooterPhase::Running,
            Section::Introduction => false,
        };
        if running {
            self.paused = !self.paused;
            log::debug!("paused: {}", self.paused);
        }
    }

    /// Returns false when the app should quit.
    fn on_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        if self.nav.active() == Section::Shooter {
            self.held.on_key(key, now);
        }
        if key.kind == KeyEventKind::Release {
            return true;
        }
        if key.kind == KeyEventKind::Press {
            if let Some(cmd) = key_to_command(key) {
                match cmd {
                    Command::Quit => return false,
                    Command::Show(section) => self.show(section),
                    Command::NextSection => self.show(self.nav.active().cycle()),
                    Command::Back => {
                        let before = self.nav.active();
                        let after = self.nav.back();
                        self.switched(before, after);
                    }
                    Command::Forward => {
                        let before = self.nav.active();
                        let after = self.nav.forward();
                        self.switched(before, after);
                    }
                    Command::Start => self.start_active(),
                    Command::Restart => self.restart_active(),
                    Command::Pause => self.toggle_pause(),
                }
                return true;
            }
        }
        if self.nav.active() == Section::Puzzle && !self.paused {
            if let Some(intent) = key_to_intent(key) {
                self.puzzle.apply_intent(intent, now);
            }
        }
        true
    }

    fn on_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        if self.paused {
            return;
        }
        match self.nav.active() {
            Section::Puzzle => self.puzzle_gesture(mouse, now),
            Section::Shooter => self.shooter_drag(mouse),
            Section::Introduction => {}
        }
    }

    fn puzzle_gesture(&mut self, mouse: MouseEvent, now: Instant) {
        let x = f32::from(mouse.column) * self.touch_scale.0;
        let y = f32::from(mouse.row) * self.touch_scale.1;
        let intent = match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => {
                self.gestures.begin(x, y);
                None
            }
            MouseEventKind::Drag(MouseButton::Left) => self.gestures.drag(x, y, now),
            MouseEventKind::Up(MouseButton::Left) => self.gestures.end(x, y),
            _ => None,
        };
        if let Some(intent) = intent {
            self.puzzle.apply_intent(intent, now);
        }
    }

    /// Moves the player by the pointer delta, converted from cells to field pixels.
    fn shooter_drag(&mut self, mouse: MouseEvent) {
        let (_, body, _) = ui::layout(self.area);
        let (_, canvas) = ui::shooter_rects(body, self.shooter.field());
        if canvas.width == 0 || canvas.height == 0 {
            return;
        }
        let (field_w, field_h) = self.shooter.field();
        let at = (mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Down(MouseButton::Left) => self.pointer = Some(at),
            MouseEventKind::Drag(MouseButton::Left) => {
                if let Some((px, py)) = self.pointer.replace(at) {
                    let dx = (f32::from(at.0) - f32::from(px)) * field_w / f32::from(canvas.width);
                    let dy = (f32::from(at.1) - f32::from(py)) * field_h / f32::from(canvas.height);
                    self.shooter.drag(dx, dy);
                }
            }
            MouseEventKind::Up(MouseButton::Left) => self.pointer = None,
            _ => {}
        }
    }
}

/// Runs `body`, then `restore` however `body` ended. An error from `body` takes precedence.
fn restoring<T>(
    body: impl FnOnce() -> Result<T>,
    restore: impl FnOnce() -> Result<()>,
) -> Result<T> {
    let out = body();
    let restored = restore();
    let value = out?;
    restored?;
    Ok(value)
}

/// Undoes raw mode, the alternate screen, mouse capture and keyboard flags.
/// Each step is attempted even if an earlier one fails.
fn restore_terminal() -> Result<()> {
    use crossterm::{
        event::{DisableMouseCapture, PopKeyboardEnhancementFlags},
        execute,
        terminal::{LeaveAlternateScreen, disable_raw_mode},
    };

    let mut stdout = std::io::stdout();
    let _ = execute!(stdout, PopKeyboardEnhancementFlags);
    let left = execute!(stdout, DisableMouseCapture, LeaveAlternateScreen);
    let raw = disable_raw_mode();
    left?;
    raw?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use crossterm::event::{KeyCode, KeyModifiers};

    fn app(extra: &[&str]) -> App {
        let mut argv = vec!["twinarcade", "--seed", "7"];
        argv.extend_from_slice(extra);
        let args = Args::parse_from(argv);
        let (puzzle, shooter) = crate::config::from_args(&args).unwrap();
        App::new(&args, puzzle, shooter, Theme::default())
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn mouse(kind: MouseEventKind, column: u16, row: u16) -> MouseEvent {
        MouseEvent {
            kind,
            column,
            row,
            modifiers: KeyModifiers::NONE,
        }
    }

    #[test]
    fn test_enter_starts_active_game_and_ticker() {
        let mut app = app(&["--section", "tetris"]);
        let now = Instant::now();
        assert!(app.on_key(press(KeyCode::Enter), now));
        assert_eq!(app.puzzle.phase(), Phase::Running);
        app.update(now);
        assert!(app.gravity.is_running());
        assert!(!app.frames.is_running());
    }

    #[test]
    fn test_restore_runs_when_setup_fails() {
        let mut restored = false;
        let result: Result<()> = restoring(
            || anyhow::bail!("no terminal"),
            || {
                restored = true;
                Ok(())
            },
        );
        assert!(restored);
        assert_eq!(result.unwrap_err().to_string(), "no terminal");
    }

    #[test]
    fn test_restore_error_surfaces_after_clean_run() {
        let result = restoring(|| Ok(5), || anyhow::bail!("still raw"));
        assert_eq!(result.unwrap_err().to_string(), "still raw");
        let result = restoring(|| Ok(5), || Ok(()));
        assert_eq!(result.unwrap(), 5);
    }

    #[test]
    fn test_quit_key() {
        let mut app = app(&[]);
        assert!(!app.on_key(press(KeyCode::Char('q')), Instant::now()));
    }

    #[test]
    fn test_pause_stops_gravity() {
        let mut app = app(&["--section", "#tetris"]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Enter), now);
        app.update(now);
        app.on_key(press(KeyCode::Char('p')), now);
        app.update(now);
        assert!(!app.gravity.is_running());
        app.on_key(press(KeyCode::Char('p')), now);
        app.update(now);
        assert!(app.gravity.is_running());
    }

    #[test]
    fn test_leaving_section_stops_its_ticker() {
        let mut app = app(&["--section", "spacewar"]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Enter), now);
        app.update(now);
        assert!(app.frames.is_running());
        app.on_key(press(KeyCode::Char('1')), now);
        app.update(now);
        assert!(!app.frames.is_running());
        app.on_key(press(KeyCode::Char('[')), now);
        assert_eq!(app.nav.active(), Section::Shooter);
    }

    #[test]
    fn test_intents_ignored_outside_puzzle() {
        let mut app = app(&[]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Char('2')), now);
        app.on_key(press(KeyCode::Enter), now);
        let col = app.puzzle.active().map(|p| p.col);
        app.on_key(press(KeyCode::Char('3')), now);
        app.on_key(press(KeyCode::Left), now);
        assert_eq!(app.puzzle.active().map(|p| p.col), col);
    }

    #[test]
    fn test_mouse_tap_rotates_puzzle_piece() {
        let mut app = app(&["--section", "tetris"]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Enter), now);
        let before = app.puzzle.active().map(|p| p.shape.clone());
        app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 10, 10), now);
        app.on_mouse(mouse(MouseEventKind::Up(MouseButton::Left), 10, 10), now);
        let after = app.puzzle.active().map(|p| p.shape.clone());
        let kind = app.puzzle.active().map(|p| p.kind);
        if kind != Some(crate::piece::PieceKind::O) {
            assert_ne!(before, after);
        }
    }

    #[test]
    fn test_mouse_drag_moves_puzzle_piece() {
        let mut app = app(&["--section", "tetris"]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Enter), now);
        let col = app.puzzle.active().map(|p| p.col).unwrap();
        app.on_mouse(mouse(MouseEventKind::Down(MouseButton::Left), 10, 10), now);
        // 3 columns at 8 px each clears the 15 px threshold
        app.on_mouse(mouse(MouseEventKind::Drag(MouseButton::Left), 7, 10), now);
        assert_eq!(app.puzzle.active().map(|p| p.col), Some(col - 1));
    }

    #[test]
    fn test_gravity_stays_stopped_after_game_over() {
        let mut app = app(&["--section", "tetris", "--height", "4"]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Enter), now);
        app.update(now);
        assert!(app.gravity.is_running());
        for _ in 0..50 {
            app.on_key(press(KeyCode::Char(' ')), now);
        }
        assert_eq!(app.puzzle.phase(), Phase::GameOver);
        app.update(now);
        assert!(!app.gravity.is_running());
        app.update(now + Duration::from_secs(5));
        assert!(!app.gravity.is_running());
    }

    #[test]
    fn test_frames_stop_when_last_life_is_lost() {
        // every enemy on a field this narrow overlaps the player's column
        let mut app = app(&[
            "--section",
            "spacewar",
            "--field-width",
            "100",
            "--field-height",
            "200",
        ]);
        let mut now = Instant::now();
        app.on_key(press(KeyCode::Enter), now);
        app.update(now);
        assert!(app.frames.is_running());
        for _ in 0..50_000 {
            if app.shooter.phase() == ShooterPhase::GameOver {
                break;
            }
            now += Duration::from_millis(16);
            app.update(now);
        }
        assert_eq!(app.shooter.phase(), ShooterPhase::GameOver);
        assert_eq!(app.shooter.player().lives, 0);
        app.update(now + Duration::from_millis(16));
        assert!(!app.frames.is_running());
        app.update(now + Duration::from_secs(5));
        assert!(!app.frames.is_running());
    }

    #[test]
    fn test_restart_after_game_over_only() {
        let mut app = app(&["--section", "tetris", "--height", "4"]);
        let now = Instant::now();
        app.on_key(press(KeyCode::Char('r')), now);
        assert_eq!(app.puzzle.phase(), Phase::Idle);
        app.on_key(press(KeyCode::Enter), now);
        for _ in 0..50 {
            app.on_key(press(KeyCode::Char(' ')), now);
        }
        assert_eq!(app.puzzle.phase(), Phase::GameOver);
        app.on_key(press(KeyCode::Char('r')), now);
        assert_eq!(app.puzzle.phase(), Phase::Running);
        assert_eq!(app.puzzle.score(), 0);
    }
}
