//! Terrain masks and direction tables.
//!
//! The west edge of the board is sea: files a and b are pure water, file c
//! is the coast, and the river cuts into the mainland at d6, d7, e6 and e7.
//! Navies operate on the water mask, land units on the land mask, and the
//! air force ignores terrain entirely.

use once_cell::sync::Lazy;

use super::types::{Bitboard, PieceType, Square, NUM_RANKS, NUM_SQUARES};

/// The four cardinal directions as (rank, file) deltas.
pub(crate) const ORTHOGONAL: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// The four diagonal directions.
pub(crate) const DIAGONAL: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

/// All eight directions, orthogonals first.
pub(crate) const ALL_DIRECTIONS: [(i32, i32); 8] = [
    (1, 0),
    (-1, 0),
    (0, 1),
    (0, -1),
    (1, 1),
    (1, -1),
    (-1, 1),
    (-1, -1),
];

const fn river_mask() -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    // d6, e6, d7, e7
    let squares = [
        Square::new(5, 3),
        Square::new(5, 4),
        Square::new(6, 3),
        Square::new(6, 4),
    ];
    let mut i = 0;
    while i < squares.len() {
        let idx = squares[i].index();
        bb.0[idx / 64] |= 1u64 << (idx % 64);
        i += 1;
    }
    bb
}

const fn files_mask(from: usize, to: usize) -> Bitboard {
    let mut bb = Bitboard::EMPTY;
    let mut file = from;
    while file <= to {
        let mut rank = 0;
        while rank < NUM_RANKS {
            let idx = Square::new(rank, file).index();
            bb.0[idx / 64] |= 1u64 << (idx % 64);
            rank += 1;
        }
        file += 1;
    }
    bb
}

/// River squares d6, d7, e6, e7.
pub const RIVER: Bitboard = river_mask();

/// Squares a Navy may occupy: the sea (files a, b), the coast (file c) and
/// the river.
pub const WATER: Bitboard = files_mask(0, 2).or(RIVER);

/// Squares a land unit may occupy: files c through k.
pub const LAND: Bitboard = files_mask(2, 10);

/// Squares in both masks: the coast plus the river.
pub const MIXED: Bitboard = WATER.and(LAND);

/// Squares only a Navy (or AirForce) may occupy: the open sea.
pub const WATER_ONLY: Bitboard = WATER.and(LAND.not());

/// Squares no Navy may occupy.
pub const LAND_ONLY: Bitboard = LAND.and(WATER.not());

/// Maximum air-defense reach on the board (heroic Missile).
pub(crate) const MAX_AIR_DEFENSE_RANGE: usize = 5;

/// Precomputed cardinal-ray footprints by range, excluding the source
/// square. `ORTHO_FOOTPRINTS[r][sq]` is the reach-`r` air-defense zone of
/// a source on `sq`.
pub(crate) static ORTHO_FOOTPRINTS: Lazy<[[Bitboard; NUM_SQUARES]; MAX_AIR_DEFENSE_RANGE + 1]> =
    Lazy::new(|| {
        let mut table = [[Bitboard::EMPTY; NUM_SQUARES]; MAX_AIR_DEFENSE_RANGE + 1];
        for (range, row) in table.iter_mut().enumerate() {
            for (idx, mask) in row.iter_mut().enumerate() {
                let sq = Square::from_index(idx);
                for (dr, df) in ORTHOGONAL {
                    let mut current = sq;
                    for _ in 0..range {
                        match current.offset(dr, df) {
                            Some(next) => {
                                mask.insert(next);
                                current = next;
                            }
                            None => break,
                        }
                    }
                }
            }
        }
        table
    });

/// Terrain predicate: may a piece of this class occupy the square?
#[inline]
#[must_use]
pub fn terrain_ok(kind: PieceType, sq: Square) -> bool {
    match kind {
        PieceType::Navy => WATER.contains(sq),
        PieceType::AirForce => true,
        _ => LAND.contains(sq),
    }
}
