//! Prelude module for convenient imports.
//!
//! # Example
//! ```
//! use cotulenh_engine::board::prelude::*;
//! ```

pub use super::{
    Color, DeployError, FenError, Game, GameResult, Move, MoveError, MoveFilter, MoveList,
    MoveRequest, Piece, PieceType, PositionBuilder, SanError, Square, START_FEN,
};
