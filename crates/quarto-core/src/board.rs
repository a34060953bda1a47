//! The 4x4 board, its ten lines, and line analysis.
//!
//! This module contains:
//! - The board cells (index = row * 4 + col)
//! - The ten fixed lines (4 rows, 4 columns, 2 diagonals)
//! - A single "count cells along a line" routine that both win detection and
//!   the heuristic player build on
//! - Threat detection and the end-of-move outcome check

use crate::game::InvalidMove;
use crate::piece::{Attribute, Piece};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Player identifier (0 or 1)
pub type PlayerId = u8;

/// Number of cells on the board
pub const CELL_COUNT: usize = 16;

/// Cell indices of one line
pub type Line = [usize; 4];

// 00 01 02 03
// 04 05 06 07
// 08 09 10 11
// 12 13 14 15
pub const LINES: [Line; 10] = [
    [0, 1, 2, 3],
    [4, 5, 6, 7],
    [8, 9, 10, 11],
    [12, 13, 14, 15],
    [0, 4, 8, 12],
    [1, 5, 9, 13],
    [2, 6, 10, 14],
    [3, 7, 11, 15],
    [0, 5, 10, 15],
    [3, 6, 9, 12],
];

/// Result of checking the board after a move
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Outcome {
    /// The announcing player completed a quarto
    Won(PlayerId),
    /// Board is full and no quarto was announced
    Draw,
    /// Game goes on
    Continue,
}

/// An attribute value shared by every filled cell of a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SharedAttribute {
    pub attribute: Attribute,
    pub value: bool,
}

impl SharedAttribute {
    pub fn matches(&self, piece: &Piece) -> bool {
        piece.value(self.attribute) == self.value
    }
}

/// A line one piece away from a quarto: three filled cells that all share at
/// least one attribute, and one empty cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threat {
    pub line: Line,
    pub empty_cell: usize,
    pub shared: Vec<SharedAttribute>,
}

impl Threat {
    /// Whether placing `piece` in the empty cell completes a quarto
    pub fn completed_by(&self, piece: &Piece) -> bool {
        self.shared.iter().any(|s| s.matches(piece))
    }
}

/// The game board
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Board {
    cells: [Option<Piece>; CELL_COUNT],
}

impl Board {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a board from its cells
    pub fn from_cells(cells: [Option<Piece>; CELL_COUNT]) -> Self {
        Self { cells }
    }

    pub fn cells(&self) -> &[Option<Piece>; CELL_COUNT] {
        &self.cells
    }

    /// Piece at a cell, `None` for empty or out-of-range cells
    pub fn get(&self, pos: usize) -> Option<Piece> {
        self.cells.get(pos).copied().flatten()
    }

    pub fn is_free(&self, pos: usize) -> bool {
        pos < CELL_COUNT && self.cells[pos].is_none()
    }

    /// Put a piece on a free cell. Filled cells are never replaced.
    pub fn place(&mut self, pos: usize, piece: Piece) -> Result<(), InvalidMove> {
        match self.cells.get_mut(pos) {
            None => Err(InvalidMove::PositionOutOfRange),
            Some(Some(_)) => Err(InvalidMove::PositionOccupied(pos)),
            Some(cell) => {
                *cell = Some(piece);
                Ok(())
            }
        }
    }

    pub fn empty_cells(&self) -> Vec<usize> {
        (0..CELL_COUNT).filter(|&pos| self.cells[pos].is_none()).collect()
    }

    pub fn pieces(&self) -> impl Iterator<Item = Piece> + '_ {
        self.cells.iter().flatten().copied()
    }

    pub fn is_full(&self) -> bool {
        self.cells.iter().all(Option::is_some)
    }

    /// Count the cells of a line whose content satisfies `predicate`
    pub fn count_along<F>(&self, line: &Line, predicate: F) -> usize
    where
        F: Fn(Option<Piece>) -> bool,
    {
        line.iter().filter(|&&pos| predicate(self.cells[pos])).count()
    }

    pub fn filled_along(&self, line: &Line) -> usize {
        self.count_along(line, |cell| cell.is_some())
    }

    /// Attribute values shared by every filled cell of the line.
    ///
    /// Empty when the line has no filled cell. An attribute merely appearing
    /// on some of the pieces does not count.
    pub fn shared_attributes(&self, line: &Line) -> Vec<SharedAttribute> {
        let Some(reference) = line.iter().find_map(|&pos| self.cells[pos]) else {
            return Vec::new();
        };
        let filled = self.filled_along(line);

        Attribute::ALL
            .iter()
            .filter(|&&attribute| {
                self.count_along(line, |cell| {
                    cell.is_some_and(|p| p.shares(&reference, attribute))
                }) == filled
            })
            .map(|&attribute| SharedAttribute {
                attribute,
                value: reference.value(attribute),
            })
            .collect()
    }

    /// Whether the line is full and constant on at least one attribute
    pub fn is_quarto_line(&self, line: &Line) -> bool {
        self.filled_along(line) == line.len() && !self.shared_attributes(line).is_empty()
    }

    /// Whether any of the ten lines is a quarto
    pub fn has_quarto(&self) -> bool {
        LINES.iter().any(|line| self.is_quarto_line(line))
    }

    /// All lines currently one piece away from a quarto
    pub fn threats(&self) -> Vec<Threat> {
        LINES
            .iter()
            .filter(|line| self.filled_along(line) == line.len() - 1)
            .filter_map(|line| {
                let shared = self.shared_attributes(line);
                if shared.is_empty() {
                    return None;
                }
                let empty_cell = line.iter().copied().find(|&pos| self.cells[pos].is_none())?;
                Some(Threat {
                    line: *line,
                    empty_cell,
                    shared,
                })
            })
            .collect()
    }

    /// Win detection.
    ///
    /// A win is only reported when a quarto was announced; the announcing
    /// player is `current_player`.
    pub fn outcome(&self, quarto_announced: bool, current_player: PlayerId) -> Outcome {
        if quarto_announced && self.has_quarto() {
            Outcome::Won(current_player)
        } else if self.is_full() {
            Outcome::Draw
        } else {
            Outcome::Continue
        }
    }
}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for row in self.cells.chunks(4) {
            write!(f, "|")?;
            for cell in row {
                match cell {
                    Some(piece) => write!(f, "{}|", piece)?,
                    None => write!(f, "      |")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
