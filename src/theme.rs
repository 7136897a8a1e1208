//! Theme loading: btop-style `theme[key]="value"`, hex → ratatui Color, and colour blending.

use crate::Palette;
use crate::piece::PieceKind;
use ratatui::style::Color;
use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

/// Canonical piece colours in `PieceKind::ALL` order.
const CLASSIC_PIECES: [Color; 7] = [
    Color::Rgb(0x00, 0xF0, 0xF0), // I cyan
    Color::Rgb(0xF0, 0xF0, 0x00), // O yellow
    Color::Rgb(0x80, 0x00, 0x80), // T purple
    Color::Rgb(0xF0, 0xA0, 0x00), // L orange
    Color::Rgb(0x00, 0x00, 0xF0), // J blue
    Color::Rgb(0x00, 0xF0, 0x00), // S green
    Color::Rgb(0xF0, 0x00, 0x00), // Z red
];

const HIGH_CONTRAST_PIECES: [Color; 7] = [
    Color::Rgb(0x00, 0xFF, 0xFF),
    Color::Rgb(0xFF, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0xFF),
    Color::Rgb(0xFF, 0x88, 0x00),
    Color::Rgb(0x00, 0x88, 0xFF),
    Color::Rgb(0x00, 0xFF, 0x00),
    Color::Rgb(0xFF, 0x00, 0x00),
];

// Paul Tol's bright scheme plus grey, distinguishable without red/green.
const COLORBLIND_PIECES: [Color; 7] = [
    Color::Rgb(0x66, 0xCC, 0xEE),
    Color::Rgb(0xCC, 0xBB, 0x44),
    Color::Rgb(0xAA, 0x33, 0x77),
    Color::Rgb(0xEE, 0x77, 0x33),
    Color::Rgb(0x44, 0x77, 0xAA),
    Color::Rgb(0x22, 0x88, 0x33),
    Color::Rgb(0xBB, 0xBB, 0xBB),
];

const PIECE_KEYS: [&str; 7] = [
    "piece_i", "piece_o", "piece_t", "piece_l", "piece_j", "piece_s", "piece_z",
];

#[derive(Debug, Clone)]
pub struct Theme {
    /// Piece colours indexed by `PieceKind::color_index`.
    pub pieces: [Color; 7],
    /// Board and page background.
    pub bg: Color,
    /// Empty-cell dots and borders.
    pub grid: Color,
    /// Text (score, lines, hints).
    pub main_fg: Color,
    /// Highlight / titles / active tab.
    pub title: Color,
    /// Line-clear flash target.
    pub flash: Color,
    /// Combo banner colour at full opacity.
    pub combo: Color,
    pub inactive_fg: Color,
}

#[derive(Debug, Error)]
pub enum ThemeError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid hex: {0}")]
    InvalidHex(String),
}

impl Default for Theme {
    fn default() -> Self {
        Self::classic()
    }
}

impl Theme {
    pub fn classic() -> Self {
        Self {
            pieces: CLASSIC_PIECES,
            bg: Color::Rgb(0x00, 0x00, 0x00),
            grid: Color::Rgb(0x33, 0x33, 0x33),
            main_fg: Color::Rgb(0xDD, 0xDD, 0xDD),
            title: Color::Rgb(0xF0, 0xA0, 0x00),
            flash: Color::Rgb(0xFF, 0xFF, 0xFF),
            combo: Color::Rgb(0xFF, 0x00, 0x00),
            inactive_fg: Color::Rgb(0x77, 0x77, 0x77),
        }
    }

    /// Load a btop-style theme file. Missing path or file gives the classic colours.
    /// `palette` overrides the piece colours afterwards.
    pub fn load(path: Option<&Path>, palette: Palette) -> Result<Self, ThemeError> {
        let mut theme = match path {
            Some(p) if p.exists() => {
                let s = std::fs::read_to_string(p)?;
                Self::from_map(&parse_theme_file(&s))
            }
            _ => Self::classic(),
        };
        theme.apply_palette(palette);
        Ok(theme)
    }

    pub fn apply_palette(&mut self, palette: Palette) {
        match palette {
            Palette::Normal => {}
            Palette::HighContrast => {
                self.pieces = HIGH_CONTRAST_PIECES;
                self.grid = Color::Rgb(0x55, 0x55, 0x55);
                self.main_fg = Color::Rgb(0xFF, 0xFF, 0xFF);
            }
            Palette::Colorblind => {
                self.pieces = COLORBLIND_PIECES;
                self.combo = Color::Rgb(0xEE, 0x77, 0x33);
            }
        }
    }

    /// Unknown or malformed keys keep the classic value.
    fn from_map(map: &HashMap<String, String>) -> Self {
        let get = |key: &str| map.get(key).and_then(|v| parse_hex(v).ok());
        let mut theme = Self::classic();
        for (slot, key) in theme.pieces.iter_mut().zip(PIECE_KEYS) {
            if let Some(c) = get(key) {
                *slot = c;
            }
        }
        let fields = [
            ("main_bg", &mut theme.bg),
            ("grid", &mut theme.grid),
            ("main_fg", &mut theme.main_fg),
            ("title", &mut theme.title),
            ("flash", &mut theme.flash),
            ("combo", &mut theme.combo),
            ("inactive_fg", &mut theme.inactive_fg),
        ];
        for (key, slot) in fields {
            if let Some(c) = get(key) {
                *slot = c;
            }
        }
        theme
    }

    #[inline]
    pub fn piece_color(&self, kind: PieceKind) -> Color {
        self.pieces[kind.color_index()]
    }
}

/// Parse btop-style theme file into key -> value map.
fn parse_theme_file(s: &str) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for line in s.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(stripped) = line.strip_prefix("theme[") else {
            continue;
        };
        let Some(end) = stripped.find(']') else {
            continue;
        };
        let key = stripped[..end].trim();
        let rest = stripped[end + 1..].trim();
        if let Some(value) = rest.strip_prefix('=') {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            if !value.is_empty() {
                map.insert(key.to_string(), value.to_string());
            }
        }
    }
    map
}

/// Parse hex colour "#RRGGBB" or "#RGB" into ratatui Color.
pub fn parse_hex(s: &str) -> Result<Color, ThemeError> {
    let hex = s.trim().trim_start_matches('#');
    let invalid = || ThemeError::InvalidHex(s.trim().to_string());
    let channel = |range: std::ops::Range<usize>| {
        hex.get(range)
            .and_then(|d| u8::from_str_radix(d, 16).ok())
            .ok_or_else(invalid)
    };
    match hex.len() {
        6 => Ok(Color::Rgb(channel(0..2)?, channel(2..4)?, channel(4..6)?)),
        3 => Ok(Color::Rgb(
            channel(0..1)? * 17,
            channel(1..2)? * 17,
            channel(2..3)? * 17,
        )),
        _ => Err(invalid()),
    }
}

fn rgb(c: Color) -> Option<(u8, u8, u8)> {
    match c {
        Color::Rgb(r, g, b) => Some((r, g, b)),
        Color::Black => Some((0, 0, 0)),
        Color::White => Some((0xFF, 0xFF, 0xFF)),
        _ => None,
    }
}

/// Mix `over` onto `base` at `alpha` (0 = base, 1 = over). Indexed colours snap at one half.
pub fn blend(base: Color, over: Color, alpha: f32) -> Color {
    let alpha = alpha.clamp(0.0, 1.0);
    match (rgb(base), rgb(over)) {
        (Some((r0, g0, b0)), Some((r1, g1, b1))) => {
            let mix = |a: u8, b: u8| {
                (f32::from(a) + (f32::from(b) - f32::from(a)) * alpha).round() as u8
            };
            Color::Rgb(mix(r0, r1), mix(g0, g1), mix(b0, b1))
        }
        _ if alpha >= 0.5 => over,
        _ => base,
    }
}
