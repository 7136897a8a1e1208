//! Playfield grid: collision checks, piece merge and line clear.

use crate::piece::{Piece, PieceKind};
use std::collections::VecDeque;

/// Single cell: either empty or a locked block coloured by its piece kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Block(PieceKind),
}

impl Cell {
    pub fn is_occupied(self) -> bool {
        matches!(self, Self::Block(_))
    }
}

/// Playfield: fixed width, fixed row count. y=0 is top.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    width: usize,
    height: usize,
    /// rows[y][x] = cell. rows[0] is top.
    rows: VecDeque<Vec<Cell>>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        let rows = (0..height).map(|_| vec![Cell::Empty; width]).collect();
        Self {
            width,
            height,
            rows,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn get(&self, col: usize, row: usize) -> Option<Cell> {
        self.rows.get(row).and_then(|r| r.get(col)).copied()
    }

    #[inline]
    pub fn set(&mut self, col: usize, row: usize, cell: Cell) {
        if let Some(c) = self.rows.get_mut(row).and_then(|r| r.get_mut(col)) {
            *c = cell;
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Cell]> {
        self.rows.iter().map(Vec::as_slice)
    }

    /// True if any occupied shape cell is off the bottom, off either side, or on a locked block.
    /// Cells above the top edge are free.
    pub fn collides(&self, piece: &Piece) -> bool {
        piece.cells().any(|(col, row)| {
            if row >= self.height as i32 || col < 0 || col >= self.width as i32 {
                return true;
            }
            if row < 0 {
                return false;
            }
            matches!(self.get(col as usize, row as usize), Some(Cell::Block(_)))
        })
    }

    /// Writes the piece into its footprint. Only ever fills cells.
    pub fn merge(&mut self, piece: &Piece) {
        for (col, row) in piece.cells() {
            if col >= 0 && row >= 0 {
                self.set(col as usize, row as usize, Cell::Block(piece.kind));
            }
        }
    }

    fn row_is_full(&self, row: usize) -> bool {
        self.rows[row].iter().all(|c| c.is_occupied())
    }

    /// Removes every full row, inserting one empty row at the top per removal.
    /// Returns the number of rows removed.
    pub fn clear_full_rows(&mut self) -> u32 {
        let mut cleared = 0;
        let mut y = self.height;
        while y > 0 {
            let row = y - 1;
            if self.row_is_full(row) {
                self.rows.remove(row);
                self.rows.push_front(vec![Cell::Empty; self.width]);
                cleared += 1;
                // the row that slid into this index has not been scanned yet
                continue;
            }
            y -= 1;
        }
        cleared
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row(grid: &mut Grid, row: usize, except: Option<usize>) {
        for col in 0..grid.width() {
            if Some(col) != except {
                grid.set(col, row, Cell::Block(PieceKind::T));
            }
        }
    }

    #[test]
    fn test_new_grid_is_empty() {
        let g = Grid::new(10, 20);
        assert_eq!(g.rows().count(), 20);
        assert!(g.rows().all(|r| r.len() == 10 && r.iter().all(|c| *c == Cell::Empty)));
    }

    #[test]
    fn test_collides_with_walls_and_floor() {
        let g = Grid::new(10, 20);
        let mut p = Piece::spawn(PieceKind::I, 10);
        assert!(!g.collides(&p));
        p.col = -1;
        assert!(g.collides(&p));
        p.col = 7;
        assert!(g.collides(&p));
        p.col = 6;
        assert!(!g.collides(&p));
        p.row = 20;
        assert!(g.collides(&p));
        p.row = 19;
        assert!(!g.collides(&p));
    }

    #[test]
    fn test_rows_above_top_are_free() {
        let g = Grid::new(10, 20);
        let mut p = Piece::spawn(PieceKind::O, 10);
        p.row = -1;
        assert!(!g.collides(&p));
    }

    #[test]
    fn test_collides_with_locked_block() {
        let mut g = Grid::new(10, 20);
        g.set(4, 1, Cell::Block(PieceKind::Z));
        let p = Piece::spawn(PieceKind::O, 10);
        assert!(g.collides(&p));
    }

    #[test]
    fn test_merge_only_fills() {
        let mut g = Grid::new(10, 20);
        g.set(0, 19, Cell::Block(PieceKind::S));
        let mut p = Piece::spawn(PieceKind::O, 10);
        p.row = 18;
        g.merge(&p);
        assert_eq!(g.get(0, 19), Some(Cell::Block(PieceKind::S)));
        for (c, r) in [(4, 18), (5, 18), (4, 19), (5, 19)] {
            assert_eq!(g.get(c, r), Some(Cell::Block(PieceKind::O)));
        }
        let filled = g.rows().flatten().filter(|c| c.is_occupied()).count();
        assert_eq!(filled, 5);
    }

    #[test]
    fn test_clear_single_row() {
        let mut g = Grid::new(4, 5);
        fill_row(&mut g, 4, None);
        g.set(1, 3, Cell::Block(PieceKind::J));
        assert_eq!(g.clear_full_rows(), 1);
        assert_eq!(g.get(1, 4), Some(Cell::Block(PieceKind::J)));
        assert_eq!(g.rows().count(), 5);
        assert!(g.rows().next().is_some_and(|r| r.iter().all(|c| !c.is_occupied())));
    }

    #[test]
    fn test_partial_row_is_kept() {
        let mut g = Grid::new(4, 5);
        fill_row(&mut g, 4, Some(0));
        assert_eq!(g.clear_full_rows(), 0);
        assert!(!g.get(0, 4).is_some_and(Cell::is_occupied));
        assert!(g.get(1, 4).is_some_and(Cell::is_occupied));
    }

    #[test]
    fn test_clear_adjacent_rows_preserves_order() {
        let mut g = Grid::new(4, 6);
        g.set(0, 1, Cell::Block(PieceKind::I));
        g.set(1, 2, Cell::Block(PieceKind::O));
        fill_row(&mut g, 3, None);
        fill_row(&mut g, 4, None);
        g.set(2, 5, Cell::Block(PieceKind::L));
        assert_eq!(g.clear_full_rows(), 2);
        assert_eq!(g.get(0, 3), Some(Cell::Block(PieceKind::I)));
        assert_eq!(g.get(1, 4), Some(Cell::Block(PieceKind::O)));
        assert_eq!(g.get(2, 5), Some(Cell::Block(PieceKind::L)));
        assert_eq!(g.rows().take(3).flatten().filter(|c| c.is_occupied()).count(), 0);
    }

    #[test]
    fn test_clear_split_rows() {
        let mut g = Grid::new(3, 6);
        fill_row(&mut g, 1, None);
        g.set(0, 2, Cell::Block(PieceKind::T));
        fill_row(&mut g, 3, None);
        g.set(2, 4, Cell::Block(PieceKind::S));
        fill_row(&mut g, 5, None);
        assert_eq!(g.clear_full_rows(), 3);
        assert_eq!(g.get(0, 4), Some(Cell::Block(PieceKind::T)));
        assert_eq!(g.get(2, 5), Some(Cell::Block(PieceKind::S)));
        assert_eq!(g.rows().flatten().filter(|c| c.is_occupied()).count(), 2);
    }
}
