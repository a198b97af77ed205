//! Fluent builder for constructing positions.
//!
//! Allows creating test positions piece by piece rather than writing FEN
//! strings by hand.
//!
//! # Example
//! ```
//! use cotulenh_engine::board::{Color, Piece, PieceType, PositionBuilder};
//!
//! let game = PositionBuilder::new()
//!     .piece("g1", Piece::new(PieceType::Commander, Color::Red))
//!     .piece("g12", Piece::new(PieceType::Commander, Color::Blue))
//!     .side_to_move(Color::Red)
//!     .build()
//!     .unwrap();
//! assert!(!game.legal_moves().is_empty());
//! ```

use super::error::PlacementError;
use super::game::Game;
use super::position::Position;
use super::types::{Color, Piece, Square};

/// A fluent builder for `Game` positions.
#[derive(Clone, Debug)]
pub struct PositionBuilder {
    pieces: Vec<(Square, Piece, Vec<Piece>)>,
    side_to_move: Color,
    halfmove_clock: u32,
    fullmove_number: u32,
}

impl Default for PositionBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl PositionBuilder {
    /// Create a new empty builder, Red to move.
    #[must_use]
    pub fn new() -> Self {
        PositionBuilder {
            pieces: Vec::new(),
            side_to_move: Color::Red,
            halfmove_clock: 0,
            fullmove_number: 1,
        }
    }

    /// Add a single piece. `square` panics on bad notation, which is fine
    /// for hand-written positions.
    #[must_use]
    pub fn piece(mut self, square: &str, piece: Piece) -> Self {
        let sq: Square = square.parse().expect("valid square notation");
        self.pieces.push((sq, piece, Vec::new()));
        self
    }

    /// Add a stack: carrier plus carried pieces.
    #[must_use]
    pub fn stack(mut self, square: &str, carrier: Piece, carried: &[Piece]) -> Self {
        let sq: Square = square.parse().expect("valid square notation");
        self.pieces.push((sq, carrier, carried.to_vec()));
        self
    }

    #[must_use]
    pub fn side_to_move(mut self, color: Color) -> Self {
        self.side_to_move = color;
        self
    }

    #[must_use]
    pub fn halfmove_clock(mut self, clock: u32) -> Self {
        self.halfmove_clock = clock;
        self
    }

    #[must_use]
    pub fn fullmove_number(mut self, number: u32) -> Self {
        self.fullmove_number = number;
        self
    }

    /// Build the game, validating every placement.
    pub fn build(self) -> Result<Game, PlacementError> {
        let mut pos = Position::empty();
        for (sq, piece, carried) in &self.pieces {
            pos.place(*piece, carried, *sq)?;
        }
        Ok(Game::from_position(
            pos,
            self.side_to_move,
            self.halfmove_clock,
            self.fullmove_number,
        ))
    }
}
