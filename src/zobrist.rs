//! Zobrist hashing for positions.
//!
//! Provides incrementally-updatable 64-bit position hashes for the
//! repetition table and the legal-move cache. Every piece hashes as a
//! (class, color, square) key, with carried pieces keyed on their stack's
//! square, and each heroic piece contributes an extra heroic key.

use rand::prelude::*;

use crate::board::{Color, Piece, PieceType, Square, NUM_PIECE_TYPES, NUM_SQUARES};

pub(crate) struct ZobristKeys {
    // piece_keys[piece_type][color][square_index]
    pub(crate) piece_keys: [[[u64; NUM_SQUARES]; 2]; NUM_PIECE_TYPES],
    // heroic_keys[piece_type][color][square_index]
    pub(crate) heroic_keys: [[[u64; NUM_SQUARES]; 2]; NUM_PIECE_TYPES],
    pub(crate) blue_to_move_key: u64,
}

impl ZobristKeys {
    fn new() -> Self {
        let mut rng = StdRng::seed_from_u64(0x00C0_7013_u64); // Fixed seed for reproducibility
        let mut piece_keys = [[[0; NUM_SQUARES]; 2]; NUM_PIECE_TYPES];
        let mut heroic_keys = [[[0; NUM_SQUARES]; 2]; NUM_PIECE_TYPES];

        for piece in &mut piece_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        for piece in &mut heroic_keys {
            for color in piece.iter_mut() {
                for key in color.iter_mut() {
                    *key = rng.gen();
                }
            }
        }

        let blue_to_move_key = rng.gen();

        ZobristKeys {
            piece_keys,
            heroic_keys,
            blue_to_move_key,
        }
    }
}

// Initialize Zobrist keys lazily and globally
pub(crate) static ZOBRIST: std::sync::LazyLock<ZobristKeys> =
    std::sync::LazyLock::new(ZobristKeys::new);

/// Key contribution of a single piece standing (or riding) on a square.
#[inline]
pub(crate) fn piece_key(piece: Piece, sq: Square) -> u64 {
    let base = ZOBRIST.piece_keys[piece.kind.index()][piece.color.index()][sq.index()];
    if piece.heroic {
        base ^ ZOBRIST.heroic_keys[piece.kind.index()][piece.color.index()][sq.index()]
    } else {
        base
    }
}

/// Key toggled when the heroic flag of a piece flips.
#[inline]
pub(crate) fn heroic_key(kind: PieceType, color: Color, sq: Square) -> u64 {
    ZOBRIST.heroic_keys[kind.index()][color.index()][sq.index()]
}

/// Key toggled when the side to move flips.
#[inline]
pub(crate) fn side_key() -> u64 {
    ZOBRIST.blue_to_move_key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_deterministic() {
        let sq = Square::new(3, 3);
        let p = Piece::new(PieceType::Tank, Color::Red);
        assert_eq!(piece_key(p, sq), piece_key(p, sq));
    }

    #[test]
    fn test_heroic_flag_changes_key() {
        let sq = Square::new(3, 3);
        let plain = Piece::new(PieceType::Tank, Color::Red);
        let hero = Piece::heroic(PieceType::Tank, Color::Red);
        assert_ne!(piece_key(plain, sq), piece_key(hero, sq));
        assert_eq!(
            piece_key(plain, sq) ^ heroic_key(PieceType::Tank, Color::Red, sq),
            piece_key(hero, sq)
        );
    }

    #[test]
    fn test_distinct_pieces_distinct_keys() {
        let sq = Square::new(0, 0);
        let a = Piece::new(PieceType::Navy, Color::Red);
        let b = Piece::new(PieceType::Navy, Color::Blue);
        let c = Piece::new(PieceType::AirForce, Color::Red);
        assert_ne!(piece_key(a, sq), piece_key(b, sq));
        assert_ne!(piece_key(a, sq), piece_key(c, sq));
    }
}
