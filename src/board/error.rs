//! Error types for engine operations.
//!
//! Every public mutation is all-or-nothing: when one of these errors comes
//! back, the game state is unchanged.

use std::fmt;

use super::types::{Color, PieceType, Square};

/// Error type for square parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SquareError {
    /// Rank out of bounds (must be 0-11)
    RankOutOfBounds { rank: usize },
    /// File out of bounds (must be 0-10)
    FileOutOfBounds { file: usize },
    /// Invalid algebraic notation
    InvalidNotation { notation: String },
}

impl fmt::Display for SquareError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SquareError::RankOutOfBounds { rank } => {
                write!(f, "Rank {rank} out of bounds (must be 0-11)")
            }
            SquareError::FileOutOfBounds { file } => {
                write!(f, "File {file} out of bounds (must be 0-10)")
            }
            SquareError::InvalidNotation { notation } => {
                write!(f, "Invalid square notation '{notation}'")
            }
        }
    }
}

impl std::error::Error for SquareError {}

/// Error type for placing pieces on the board
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlacementError {
    /// The class may not occupy the square's terrain
    TerrainMismatch { kind: PieceType, square: Square },
    /// A second Commander of the same color
    CommanderUnique { color: Color },
    /// The target square already holds a piece
    Occupied { square: Square },
    /// The carried pieces violate the composition table
    InvalidComposition {
        carrier: PieceType,
        cargo: PieceType,
    },
}

impl fmt::Display for PlacementError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlacementError::TerrainMismatch { kind, square } => {
                write!(f, "{kind:?} may not occupy {square}")
            }
            PlacementError::CommanderUnique { color } => {
                write!(f, "{color} already has a Commander on the board")
            }
            PlacementError::Occupied { square } => {
                write!(f, "Square {square} is occupied")
            }
            PlacementError::InvalidComposition { carrier, cargo } => {
                write!(f, "{carrier:?} cannot carry {cargo:?}")
            }
        }
    }
}

impl std::error::Error for PlacementError {}

/// Error type for FEN parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FenError {
    /// FEN string has too few fields (needs at least 6)
    TooFewFields { found: usize },
    /// Wrong number of rank segments (needs 12)
    BadRankCount { found: usize },
    /// A rank segment does not sum to 11 columns
    BadRankWidth { rank: usize, files: usize },
    /// Invalid piece character in the placement string
    InvalidPiece { ch: char },
    /// A '(' without matching ')' or vice versa
    UnmatchedParen { rank: usize },
    /// A '+' not followed by a piece letter
    DanglingHeroicMarker { rank: usize },
    /// Invalid side to move (must be 'r' or 'b')
    InvalidSideToMove { found: String },
    /// Malformed halfmove or fullmove counter
    InvalidCounter { field: String },
    /// Malformed DEPLOY suffix
    InvalidDeploy { reason: String },
    /// Piece placement rejected by the position store
    Placement(PlacementError),
}

impl fmt::Display for FenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FenError::TooFewFields { found } => {
                write!(f, "FEN must have at least 6 fields, found {found}")
            }
            FenError::BadRankCount { found } => {
                write!(f, "FEN must have 12 rank segments, found {found}")
            }
            FenError::BadRankWidth { rank, files } => {
                write!(f, "Rank segment {rank} covers {files} files, expected 11")
            }
            FenError::InvalidPiece { ch } => {
                write!(f, "Invalid piece character '{ch}' in FEN")
            }
            FenError::UnmatchedParen { rank } => {
                write!(f, "Unmatched parenthesis in rank segment {rank}")
            }
            FenError::DanglingHeroicMarker { rank } => {
                write!(f, "'+' not followed by a piece in rank segment {rank}")
            }
            FenError::InvalidSideToMove { found } => {
                write!(f, "Invalid side to move '{found}', expected 'r' or 'b'")
            }
            FenError::InvalidCounter { field } => {
                write!(f, "Invalid move counter '{field}'")
            }
            FenError::InvalidDeploy { reason } => {
                write!(f, "Invalid DEPLOY suffix: {reason}")
            }
            FenError::Placement(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for FenError {}

impl From<PlacementError> for FenError {
    fn from(err: PlacementError) -> Self {
        FenError::Placement(err)
    }
}

/// Error type for SAN/LAN parsing failures
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SanError {
    /// Empty SAN string
    Empty,
    /// Invalid piece character
    InvalidPiece { ch: char },
    /// Invalid square in SAN
    InvalidSquare { notation: String },
    /// Token matches more than one legal move
    AmbiguousMove { san: String },
    /// No legal move matches the token
    NoMatchingMove { san: String },
}

impl fmt::Display for SanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SanError::Empty => write!(f, "Empty SAN string"),
            SanError::InvalidPiece { ch } => {
                write!(f, "Invalid piece character '{ch}' in SAN")
            }
            SanError::InvalidSquare { notation } => {
                write!(f, "Invalid square in SAN '{notation}'")
            }
            SanError::AmbiguousMove { san } => {
                write!(f, "Ambiguous move '{san}'")
            }
            SanError::NoMatchingMove { san } => {
                write!(f, "No legal move matches '{san}'")
            }
        }
    }
}

impl std::error::Error for SanError {}

/// Error type for rejected move requests
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MoveError {
    /// Well-formed but not among the current legal moves
    Illegal { notation: String },
    /// Notation failure while parsing the request
    San(SanError),
    /// Deploy-session failure while executing the request
    Deploy(DeployError),
}

impl fmt::Display for MoveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MoveError::Illegal { notation } => write!(f, "Illegal move '{notation}'"),
            MoveError::San(err) => write!(f, "{err}"),
            MoveError::Deploy(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for MoveError {}

impl From<SanError> for MoveError {
    fn from(err: SanError) -> Self {
        MoveError::San(err)
    }
}

impl From<DeployError> for MoveError {
    fn from(err: DeployError) -> Self {
        MoveError::Deploy(err)
    }
}

/// Error type for deploy-session state violations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeployError {
    /// Commit/cancel/deploy-move without an active session
    NoActiveSession,
    /// A second session cannot start while one is active
    SessionActive { origin: Square },
    /// The named square does not hold a stack of the side to move
    NotAStack { square: Square },
    /// Sub-move does not originate from the session's origin square
    OutsideOrigin { origin: Square, from: Square },
    /// Non-deploy move attempted while a session is active
    NonDeployMove { origin: Square },
    /// The mover is not among the session's remaining members
    NotARemainingMember { kind: PieceType },
    /// Recombine would re-seat the carrier fixed at first deposit
    CarrierChange { square: Square },
    /// The session was loaded from FEN and has no recorded history to unwind
    CannotRestore,
}

impl fmt::Display for DeployError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployError::NoActiveSession => write!(f, "No active deploy session"),
            DeployError::SessionActive { origin } => {
                write!(f, "A deploy session is already active at {origin}")
            }
            DeployError::NotAStack { square } => {
                write!(f, "No friendly stack at {square}")
            }
            DeployError::OutsideOrigin { origin, from } => {
                write!(f, "Deploy move from {from} outside session origin {origin}")
            }
            DeployError::NonDeployMove { origin } => {
                write!(
                    f,
                    "Only deploy moves are allowed while the session at {origin} is active"
                )
            }
            DeployError::NotARemainingMember { kind } => {
                write!(f, "{kind:?} is not a remaining member of the deploy session")
            }
            DeployError::CarrierChange { square } => {
                write!(f, "Recombine at {square} would change the stack carrier")
            }
            DeployError::CannotRestore => {
                write!(f, "Deploy session was loaded from FEN and cannot be cancelled")
            }
        }
    }
}

impl std::error::Error for DeployError {}
