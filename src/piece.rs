//! Piece catalog, shape matrices and the random piece factory.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Tetromino kinds (I, O, T, L, J, S, Z). The kind doubles as the colour identifier of a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PieceKind {
    I,
    O,
    T,
    L,
    J,
    S,
    Z,
}

impl PieceKind {
    pub const ALL: [Self; 7] = [Self::I, Self::O, Self::T, Self::L, Self::J, Self::S, Self::Z];

    /// Spawn orientation as rows of occupied flags.
    fn template(&self) -> &'static [&'static [bool]] {
        const X: bool = true;
        const O: bool = false;
        match self {
            Self::I => &[&[X, X, X, X]],
            Self::O => &[&[X, X], &[X, X]],
            Self::T => &[&[X, X, X], &[O, X, O]],
            Self::L => &[&[X, X, X], &[X, O, O]],
            Self::J => &[&[X, X, X], &[O, O, X]],
            Self::S => &[&[O, X, X], &[X, X, O]],
            Self::Z => &[&[X, X, O], &[O, X, X]],
        }
    }

    /// Fresh copy of the catalog shape; rotating it never touches the catalog.
    pub fn shape(&self) -> Shape {
        Shape {
            cells: self.template().iter().map(|row| row.to_vec()).collect(),
        }
    }

    /// Index 0..7 into the theme's piece palette.
    pub fn color_index(&self) -> usize {
        match self {
            Self::I => 0,
            Self::O => 1,
            Self::T => 2,
            Self::L => 3,
            Self::J => 4,
            Self::S => 5,
            Self::Z => 6,
        }
    }
}

/// Rectangular occupancy matrix; `cells[row][col]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    cells: Vec<Vec<bool>>,
}

impl Shape {
    pub fn width(&self) -> usize {
        self.cells.first().map_or(0, Vec::len)
    }

    pub fn height(&self) -> usize {
        self.cells.len()
    }

    /// Clockwise quarter turn: transpose, then reverse each new row.
    pub fn rotated_cw(&self) -> Self {
        let h = self.height();
        let cells = (0..self.width())
            .map(|c| (0..h).rev().map(|r| self.cells[r][c]).collect())
            .collect();
        Self { cells }
    }

    /// Offsets (dx, dy) of every occupied cell inside the bounding box.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.cells.iter().enumerate().flat_map(|(dy, row)| {
            row.iter()
                .enumerate()
                .filter(|(_, filled)| **filled)
                .map(move |(dx, _)| (dx as i32, dy as i32))
        })
    }
}

/// A placed piece: shape, colour and bounding-box top-left (col, row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: PieceKind,
    pub shape: Shape,
    pub col: i32,
    pub row: i32,
}

impl Piece {
    /// Top row, horizontally centred on a grid `grid_width` columns wide.
    pub fn spawn(kind: PieceKind, grid_width: usize) -> Self {
        let shape = kind.shape();
        let col = (grid_width / 2) as i32 - (shape.width() / 2) as i32;
        Self {
            kind,
            shape,
            col,
            row: 0,
        }
    }

    /// Absolute grid coordinates (col, row) of each occupied cell.
    pub fn cells(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied()
            .map(|(dx, dy)| (self.col + dx, self.row + dy))
    }
}

/// Uniform random choice over the seven kinds.
#[derive(Debug, Clone)]
pub struct PieceFactory {
    rng: StdRng,
}

impl PieceFactory {
    /// Seeded factories repeat the same piece sequence; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    pub fn next_kind(&mut self) -> PieceKind {
        PieceKind::ALL[self.rng.random_range(0..PieceKind::ALL.len())]
    }

    pub fn next_piece(&mut self, grid_width: usize) -> Piece {
        Piece::spawn(self.next_kind(), grid_width)
    }
}
