//! Pieces and their four binary attributes.
//!
//! This module contains:
//! - The four attribute enums (shape, color, height, filling)
//! - The `Piece` value type
//! - The piece catalog: all 16 distinct pieces in a fixed order

use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of distinct pieces in a game
pub const PIECE_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Round,
    Square,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Dark,
    Light,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Height {
    Low,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Filling {
    Empty,
    Full,
}

/// One of the four properties a winning line can share
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Attribute {
    Shape,
    Color,
    Height,
    Filling,
}

impl Attribute {
    /// All attributes, in the order lines are checked
    pub const ALL: [Attribute; 4] = [
        Attribute::Shape,
        Attribute::Color,
        Attribute::Height,
        Attribute::Filling,
    ];
}

/// A game piece. Identity is the attribute tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    pub shape: Shape,
    pub color: Color,
    pub height: Height,
    pub filling: Filling,
}

impl Piece {
    pub const fn new(shape: Shape, color: Color, height: Height, filling: Filling) -> Self {
        Self {
            shape,
            color,
            height,
            filling,
        }
    }

    /// The value of one attribute, folded to a bool so that two pieces share
    /// the attribute iff the values are equal.
    ///
    /// `false` is the first variant of each enum (round, dark, low, empty).
    pub fn value(&self, attribute: Attribute) -> bool {
        match attribute {
            Attribute::Shape => self.shape == Shape::Square,
            Attribute::Color => self.color == Color::Light,
            Attribute::Height => self.height == Height::High,
            Attribute::Filling => self.filling == Filling::Full,
        }
    }

    /// Whether both pieces agree on the given attribute
    pub fn shares(&self, other: &Piece, attribute: Attribute) -> bool {
        self.value(attribute) == other.value(attribute)
    }

    /// The full set of 16 pieces: the Cartesian product of the attributes.
    ///
    /// Order is shape, then color, then height, then filling, so index 0 is
    /// the round dark low empty piece.
    pub fn catalog() -> Vec<Piece> {
        let mut pieces = Vec::with_capacity(PIECE_COUNT);
        for shape in [Shape::Round, Shape::Square] {
            for color in [Color::Dark, Color::Light] {
                for height in [Height::Low, Height::High] {
                    for filling in [Filling::Empty, Filling::Full] {
                        pieces.push(Piece::new(shape, color, height, filling));
                    }
                }
            }
        }
        pieces
    }
}

/// Compact notation: `(EL)` is round, empty, light and low; `[[FD]]` is
/// square, full, dark and high.
impl fmt::Display for Piece {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (open, close) = match self.shape {
            Shape::Round => ('(', ')'),
            Shape::Square => ('[', ']'),
        };
        let filling = match self.filling {
            Filling::Empty => 'E',
            Filling::Full => 'F',
        };
        let color = match self.color {
            Color::Light => 'L',
            Color::Dark => 'D',
        };
        match self.height {
            Height::Low => write!(f, " {}{}{}{} ", open, filling, color, close),
            Height::High => write!(f, "{0}{0}{1}{2}{3}{3}", open, filling, color, close),
        }
    }
}
