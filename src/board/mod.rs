//! Board representation and game logic for Commander Chess (Cờ Tư Lệnh).
//!
//! An 11×12 board with mixed water/land terrain, eleven piece classes,
//! stackable composite pieces, multi-step deploy turns, heroic promotion
//! and air-defense zones. Bit-sets back the position store; move
//! generation walks precomputed direction rays.
//!
//! # Example
//! ```
//! use cotulenh_engine::board::Game;
//!
//! let game = Game::new();
//! let moves = game.legal_moves();
//! println!("Starting position has {} legal moves", moves.len());
//! ```

mod air_defense;
mod builder;
mod debug;
mod deploy;
mod error;
mod fen;
mod game;
mod make_unmake;
mod movegen;
pub mod prelude;
mod position;
mod san;
mod stacks;
pub mod terrain;
mod types;

#[cfg(test)]
mod tests;

// Public API - types users need
pub use air_defense::AirDefense;
pub use builder::PositionBuilder;
pub use deploy::{DeployEntry, DeploySession};
pub use error::{
    DeployError, FenError, MoveError, PlacementError, SanError, SquareError,
};
pub use game::{
    DrawReason, Game, GameResult, HistoryRecord, Modality, MoveFilter, MoveRequest, WinReason,
    START_FEN,
};
pub use position::Position;
pub use types::{Bitboard, BitboardIter, Color, Move, MoveFlags, MoveList, Piece, PieceType, Square};

pub(crate) use types::{NUM_PIECE_TYPES, NUM_SQUARES};
