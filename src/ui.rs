//! Layout and drawing: section tabs, intro page, puzzle board, shooter field, overlays.
//!
//! Everything here reads engine state; the only thing it mutates is [`Animations`].

use crate::effects::COMBO_TEXT;
use crate::game::{Phase, PuzzleEngine};
use crate::grid::Cell as GridCell;
use crate::nav::{Navigator, Section};
use crate::piece::{Piece, PieceKind};
use crate::shooter::{Body, ShooterEngine, ShooterPhase};
use crate::theme::{Theme, blend};
use ratatui::Frame;
use ratatui::buffer::Buffer;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Margin, Rect};
use ratatui::style::{Color, Style, Stylize};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::canvas::{Canvas, Points, Rectangle};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Widget, Wrap};
use std::time::Instant;
use tachyonfx::{Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx};

/// Each grid cell is two terminal columns wide so blocks look square.
const CELL_WIDTH: u16 = 2;
const SIDEBAR_WIDTH: u16 = 18;
const GHOST_ALPHA: f32 = 0.2;
const GAME_OVER_DIM: f32 = 0.7;
const SECTION_FADE_MS: u32 = 350;
const GAME_OVER_FADE_MS: u32 = 600;
const STAR_COUNT: usize = 48;

/// Borrowed view of everything one frame needs.
pub struct Scene<'a> {
    pub nav: &'a Navigator,
    pub puzzle: &'a PuzzleEngine,
    pub shooter: &'a ShooterEngine,
    pub theme: &'a Theme,
    pub paused: bool,
    pub now: Instant,
}

/// TachyonFX state carried between frames: section fade-in and game-over fade-in.
pub struct Animations {
    enabled: bool,
    section_fade: Option<Effect>,
    game_over_fade: Option<Effect>,
    last_frame: Option<Instant>,
}

impl Animations {
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            section_fade: None,
            game_over_fade: None,
            last_frame: None,
        }
    }

    pub fn section_changed(&mut self, bg: Color) {
        if self.enabled {
            self.section_fade = Some(fx::fade_from(
                bg,
                bg,
                (SECTION_FADE_MS, Interpolation::QuadOut),
            ));
        }
    }

    pub fn game_over(&mut self, bg: Color) {
        if self.enabled {
            self.game_over_fade = Some(fx::fade_from(
                bg,
                bg,
                (GAME_OVER_FADE_MS, Interpolation::QuadOut),
            ));
        }
    }

    pub fn clear_game_over(&mut self) {
        self.game_over_fade = None;
    }

    fn delta(&mut self, now: Instant) -> TfxDuration {
        let elapsed = self
            .last_frame
            .map(|t| now.saturating_duration_since(t))
            .unwrap_or_default();
        self.last_frame = Some(now);
        TfxDuration::from_millis(elapsed.as_millis().min(u128::from(u32::MAX)) as u32)
    }
}

/// Header (tabs), body and status line.
pub fn layout(area: Rect) -> (Rect, Rect, Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Fill(1),
            Constraint::Length(1),
        ])
        .split(area);
    (chunks[0], chunks[1], chunks[2])
}

/// Outer (bordered) rect of the shooter field and the canvas inside it, keeping the field's
/// aspect ratio with terminal cells counted as twice as tall as wide.
pub fn shooter_rects(body: Rect, (field_w, field_h): (f32, f32)) -> (Rect, Rect) {
    let rows = body.height.saturating_sub(2);
    let cols = ((f32::from(rows) * 2.0 * field_w / field_h).round() as u16)
        .min(body.width.saturating_sub(2));
    let outer = centered(body, cols + 2, rows + 2);
    (outer, outer.inner(Margin::new(1, 1)))
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(width) / 2,
        y: area.y + area.height.saturating_sub(height) / 2,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Board outer rect and sidebar rect for a puzzle of `cols` x `rows` cells.
fn puzzle_rects(body: Rect, cols: u16, rows: u16) -> (Rect, Rect) {
    let board_w = cols.saturating_mul(CELL_WIDTH).saturating_add(2);
    let board_h = rows.saturating_add(2);
    let group = centered(body, board_w.saturating_add(SIDEBAR_WIDTH), board_h);
    let board = Rect {
        width: board_w.min(group.width),
        ..group
    };
    let sidebar = Rect {
        x: board.right(),
        width: group.width.saturating_sub(board.width),
        ..group
    };
    (board, sidebar)
}

pub fn draw(frame: &mut Frame, scene: &Scene, anim: &mut Animations) {
    let area = frame.area();
    let delta = anim.delta(scene.now);
    let theme = scene.theme;
    Block::default()
        .style(Style::default().bg(theme.bg))
        .render(area, frame.buffer_mut());

    let (header, body, status) = layout(area);
    draw_tabs(frame.buffer_mut(), theme, scene.nav.active(), header);
    draw_status(frame.buffer_mut(), scene, status);

    let overlay = match scene.nav.active() {
        Section::Introduction => {
            draw_intro(frame.buffer_mut(), theme, body);
            None
        }
        Section::Puzzle => draw_puzzle(frame.buffer_mut(), scene, body),
        Section::Shooter => draw_shooter(frame, scene, body),
    };

    if let (Some(rect), Some(effect)) = (overlay, anim.game_over_fade.as_mut()) {
        if !effect.done() {
            frame.render_effect(effect, rect, delta);
        }
    }
    if let Some(effect) = anim.section_fade.as_mut() {
        frame.render_effect(effect, body, delta);
        if effect.done() {
            anim.section_fade = None;
        }
    }
}

fn draw_tabs(buf: &mut Buffer, theme: &Theme, active: Section, area: Rect) {
    let mut spans = vec![Span::styled(" twinarcade ", Style::default().fg(theme.title).bold())];
    for (i, section) in Section::ALL.into_iter().enumerate() {
        let label = format!(" {} {} ", i + 1, section.title());
        let style = if section == active {
            Style::default().fg(Color::Black).bg(theme.title).bold()
        } else {
            Style::default().fg(theme.main_fg)
        };
        spans.push(Span::raw(" "));
        spans.push(Span::styled(label, style));
    }
    Paragraph::new(Line::from(spans)).render(area, buf);
}

fn draw_status(buf: &mut Buffer, scene: &Scene, area: Rect) {
    let hints = match scene.nav.active() {
        Section::Introduction => "Tab/1-3 switch  [ ] history  q quit",
        Section::Puzzle => "←→/ad/hl move  ↑/w/k rotate  ↓/s/j drop  Space slam  p pause  q quit",
        Section::Shooter => "wasd/arrows move  j/Space fire  drag to steer  p pause  q quit",
    };
    let line = Line::from(vec![
        Span::styled(format!(" {} ", scene.nav.location()), Style::default().fg(scene.theme.title)),
        Span::styled(format!(" {hints}"), Style::default().fg(scene.theme.inactive_fg)),
    ]);
    Paragraph::new(line).render(area, buf);
}

fn draw_intro(buf: &mut Buffer, theme: &Theme, body: Rect) {
    let title = Style::default().fg(theme.title).bold();
    let fg = Style::default().fg(theme.main_fg);
    let text = Text::from(vec![
        Line::from(Span::styled("Two small arcade games", title)),
        Line::from(""),
        Line::from(Span::styled("2  Tetris", title)),
        Line::from(Span::styled(
            "Steer falling pieces, fill whole rows to clear them. 100 points per row; \
             big clears flash brighter and back-to-back four-row clears trigger a combo.",
            fg,
        )),
        Line::from(""),
        Line::from(Span::styled("3  Space War", title)),
        Line::from(Span::styled(
            "Fly, dodge and shoot. Each enemy downed is worth 100 points. \
             Ten lives; collisions and enemy fire each cost one.",
            fg,
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Mouse drags work like touch: swipe to move, tap to rotate, flick down to drop.",
            Style::default().fg(theme.inactive_fg),
        )),
    ]);
    let area = centered(body, 64, 14);
    Paragraph::new(text)
        .wrap(Wrap { trim: true })
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(theme.grid)),
        )
        .render(area, buf);
}

fn paint(buf: &mut Buffer, x: u16, y: u16, symbol: &str, style: Style) {
    if let Some(cell) = buf.cell_mut((x, y)) {
        cell.set_symbol(symbol).set_style(style);
    }
}

/// Blend every cell in `area` toward `target`, foreground and background alike.
fn tint(buf: &mut Buffer, area: Rect, target: Color, alpha: f32) {
    let area = area.intersection(buf.area);
    for y in area.top()..area.bottom() {
        for x in area.left()..area.right() {
            if let Some(cell) = buf.cell_mut((x, y)) {
                cell.fg = blend(cell.fg, target, alpha);
                cell.bg = blend(cell.bg, target, alpha);
            }
        }
    }
}

fn draw_piece(buf: &mut Buffer, inner: Rect, piece: &Piece, color: Color) {
    let visible_cols = i32::from(inner.width / CELL_WIDTH);
    let visible_rows = i32::from(inner.height);
    for (col, row) in piece.cells() {
        if !(0..visible_cols).contains(&col) || !(0..visible_rows).contains(&row) {
            continue;
        }
        let x = inner.x + col as u16 * CELL_WIDTH;
        let y = inner.y + row as u16;
        paint(buf, x, y, " ", Style::default().bg(color));
        paint(buf, x + 1, y, " ", Style::default().bg(color));
    }
}

/// Returns the overlay rect when a game-over box is shown.
fn draw_puzzle(buf: &mut Buffer, scene: &Scene, body: Rect) -> Option<Rect> {
    let theme = scene.theme;
    let engine = scene.puzzle;
    let grid = engine.grid();
    let cols = u16::try_from(grid.width()).unwrap_or(u16::MAX);
    let rows = u16::try_from(grid.height()).unwrap_or(u16::MAX);
    let (board, sidebar) = puzzle_rects(body, cols, rows);

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.grid).bg(theme.bg))
        .title(Span::styled(" Tetris ", Style::default().fg(theme.title)));
    let inner = block.inner(board);
    block.render(board, buf);

    // only the cells that fit inside the border are drawn
    let visible_cols = usize::from(inner.width / CELL_WIDTH);
    for (row, cells) in grid.rows().enumerate().take(usize::from(inner.height)) {
        for (col, cell) in cells.iter().enumerate().take(visible_cols) {
            let x = inner.x + col as u16 * CELL_WIDTH;
            let y = inner.y + row as u16;
            match cell {
                GridCell::Empty => {
                    let style = Style::default().fg(theme.grid).bg(theme.bg);
                    paint(buf, x, y, "·", style);
                    paint(buf, x + 1, y, " ", style);
                }
                GridCell::Block(kind) => {
                    let style = Style::default().bg(theme.piece_color(*kind));
                    paint(buf, x, y, " ", style);
                    paint(buf, x + 1, y, " ", style);
                }
            }
        }
    }
    if let Some(ghost) = engine.ghost() {
        draw_piece(buf, inner, ghost, blend(theme.bg, Color::Rgb(0xFF, 0xFF, 0xFF), GHOST_ALPHA));
    }
    if let Some(active) = engine.active() {
        draw_piece(buf, inner, active, theme.piece_color(active.kind));
    }

    let flash = engine.effects().flash_opacity(scene.now);
    if flash > 0.0 {
        tint(buf, inner, theme.flash, flash);
    }

    draw_sidebar(buf, theme, engine, sidebar);

    let combo = engine.effects().combo_opacity(scene.now);
    if combo > 0.0 {
        let band = Rect {
            x: body.x,
            y: board.y + board.height / 2,
            width: body.width,
            height: 1,
        };
        let style = Style::default().fg(blend(theme.bg, theme.combo, combo)).bold();
        Paragraph::new(Line::from(Span::styled(COMBO_TEXT, style)))
            .alignment(Alignment::Center)
            .render(band, buf);
    }

    match engine.phase() {
        Phase::Idle => {
            draw_play_button(buf, theme, board);
            None
        }
        Phase::GameOver => Some(draw_game_over(buf, theme, board, engine.score())),
        Phase::Running => {
            if scene.paused {
                draw_pause(buf, theme, board);
            }
            None
        }
    }
}

fn draw_sidebar(buf: &mut Buffer, theme: &Theme, engine: &PuzzleEngine, area: Rect) {
    if area.width < 4 {
        return;
    }
    let area = Rect {
        x: area.x + 1,
        width: area.width - 1,
        ..area
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(5), Constraint::Length(1), Constraint::Length(4)])
        .split(area);
    let border = Style::default().fg(theme.grid).bg(theme.bg);
    let title = Style::default().fg(theme.title);
    let fg = Style::default().fg(theme.main_fg);

    let next_block = Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled("Next", title));
    let next_inner = next_block.inner(chunks[0]);
    next_block.render(chunks[0], buf);
    if let Some(next) = engine.next() {
        let color = theme.piece_color(next.kind);
        let w = next.shape.width() as u16 * CELL_WIDTH;
        let h = next.shape.height() as u16;
        let spot = centered(next_inner, w, h);
        for (col, row) in next.shape.occupied() {
            let x = spot.x + col as u16 * CELL_WIDTH;
            let y = spot.y + row as u16;
            if x + 1 < next_inner.right() && y < next_inner.bottom() {
                paint(buf, x, y, " ", Style::default().bg(color));
                paint(buf, x + 1, y, " ", Style::default().bg(color));
            }
        }
    }

    let stats = Block::default().borders(Borders::ALL).border_style(border);
    let stats_inner = stats.inner(chunks[2]);
    stats.render(chunks[2], buf);
    Paragraph::new(vec![
        Line::from(vec![
            Span::styled("Score: ", title),
            Span::styled(engine.score().to_string(), fg),
        ]),
        Line::from(vec![
            Span::styled("Lines: ", title),
            Span::styled(engine.lines().to_string(), fg),
        ]),
    ])
    .render(stats_inner, buf);
}

fn draw_play_button(buf: &mut Buffer, theme: &Theme, over: Rect) {
    let popup = centered(over, 24, 3);
    Clear.render(popup, buf);
    Paragraph::new(Line::from(Span::styled(
        "Press Enter to play",
        Style::default().fg(theme.title).bold(),
    )))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.title).bg(theme.bg))
            .style(Style::default().bg(theme.bg)),
    )
    .render(popup, buf);
}

fn draw_pause(buf: &mut Buffer, theme: &Theme, over: Rect) {
    let popup = centered(over, 20, 4);
    Clear.render(popup, buf);
    Paragraph::new(vec![
        Line::from(Span::styled(
            " Paused ",
            Style::default().fg(Color::Black).bg(theme.title),
        )),
        Line::from(Span::styled("P to resume", Style::default().fg(theme.main_fg))),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.grid).bg(theme.bg))
            .style(Style::default().bg(theme.bg)),
    )
    .render(popup, buf);
}

/// Dims `over` toward black and draws the result box on top. Returns the box rect.
fn draw_game_over(buf: &mut Buffer, theme: &Theme, over: Rect, score: u32) -> Rect {
    tint(buf, over, Color::Black, GAME_OVER_DIM);
    let popup = centered(over, 22, 7);
    Clear.render(popup, buf);
    Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "GAME OVER",
            Style::default().fg(Color::White).bold(),
        )),
        Line::from(Span::styled(
            format!("Score: {score}"),
            Style::default().fg(theme.main_fg),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "R restart  Q quit",
            Style::default().fg(theme.inactive_fg),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.combo).bg(Color::Black))
            .style(Style::default().bg(Color::Black)),
    )
    .render(popup, buf);
    popup
}

/// Fixed star pattern scrolled by the backdrop offset.
fn stars(field_w: f32, field_h: f32, offset: f32) -> Vec<(f64, f64)> {
    (0..STAR_COUNT)
        .map(|i| {
            // cheap hash for a stable scatter
            let h = (i as u32).wrapping_mul(2_654_435_761);
            let x = (h % 1000) as f32 / 1000.0 * field_w;
            let y = ((h / 1000) % 1000) as f32 / 1000.0 * field_h;
            let y = (y + offset) % field_h;
            (f64::from(x), f64::from(field_h - y))
        })
        .collect()
}

/// Canvas y grows upward; the field's grows downward.
fn to_canvas(body: &Body, field_h: f32) -> Rectangle {
    Rectangle {
        x: f64::from(body.x),
        y: f64::from(field_h - body.y - body.h),
        width: f64::from(body.w),
        height: f64::from(body.h),
        color: Color::Reset,
    }
}

fn draw_shooter(frame: &mut Frame, scene: &Scene, body: Rect) -> Option<Rect> {
    let theme = scene.theme;
    let engine = scene.shooter;
    let (field_w, field_h) = engine.field();
    let (outer, canvas) = shooter_rects(body, engine.field());

    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(theme.grid).bg(theme.bg))
        .title(Span::styled(" Space War ", Style::default().fg(theme.title)))
        .render(outer, frame.buffer_mut());

    let star_points = stars(field_w, field_h, engine.backdrop_offset());
    let player_color = theme.piece_color(PieceKind::I);
    let enemy_color = theme.piece_color(PieceKind::L);
    let player_shot = theme.piece_color(PieceKind::O);
    let enemy_shot = theme.combo;
    let hud = Style::default().fg(theme.main_fg);
    let lives = engine.player().lives;
    let score = engine.score();

    let widget = Canvas::default()
        .marker(Marker::HalfBlock)
        .background_color(theme.bg)
        .x_bounds([0.0, f64::from(field_w)])
        .y_bounds([0.0, f64::from(field_h)])
        .paint(|ctx| {
            ctx.draw(&Points {
                coords: &star_points,
                color: theme.grid,
            });
            ctx.layer();
            for enemy in engine.enemies() {
                ctx.draw(&Rectangle {
                    color: enemy_color,
                    ..to_canvas(&enemy.body, field_h)
                });
            }
            for bullet in engine.player_bullets() {
                ctx.draw(&Rectangle {
                    color: player_shot,
                    ..to_canvas(&bullet.body, field_h)
                });
            }
            for bullet in engine.enemy_bullets() {
                ctx.draw(&Rectangle {
                    color: enemy_shot,
                    ..to_canvas(&bullet.body, field_h)
                });
            }
            if engine.phase() != ShooterPhase::Idle {
                ctx.draw(&Rectangle {
                    color: player_color,
                    ..to_canvas(&engine.player().body, field_h)
                });
            }
            ctx.print(
                0.0,
                f64::from(field_h),
                Line::from(Span::styled("♥".repeat(lives as usize), Style::default().fg(enemy_shot))),
            );
            ctx.print(
                0.0,
                f64::from(field_h) * 0.96,
                Line::from(Span::styled(format!("Score: {score}"), hud)),
            );
        });
    frame.render_widget(widget, canvas);

    let buf = frame.buffer_mut();
    match engine.phase() {
        ShooterPhase::Idle => {
            draw_play_button(buf, theme, outer);
            None
        }
        ShooterPhase::GameOver => Some(draw_game_over(buf, theme, outer, score)),
        ShooterPhase::Running => {
            if scene.paused {
                draw_pause(buf, theme, outer);
            }
            None
        }
    }
}
