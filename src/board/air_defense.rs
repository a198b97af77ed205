//! Air-defense map.
//!
//! AntiAir, Missile and Navy pieces project an air-defense zone along the
//! four cardinal directions. A hostile AirForce may not land on or fly
//! through a defended square; capturing onto one is a kamikaze. Sources
//! riding inside a stack contribute from the carrier's square.

use super::position::Position;
use super::types::{Bitboard, Color, Square};

/// Per-color sets of squares under that color's air defense.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct AirDefense {
    zones: [Bitboard; 2],
}

/// Influence footprint of one source: the cardinal rays up to `range`,
/// excluding the source square itself. Blocking pieces are ignored; board
/// edges end a ray.
#[inline]
#[must_use]
pub(crate) fn footprint(sq: Square, range: usize) -> Bitboard {
    debug_assert!(range <= super::terrain::MAX_AIR_DEFENSE_RANGE);
    super::terrain::ORTHO_FOOTPRINTS[range][sq.index()]
}

impl AirDefense {
    /// Recompute both zones from the position. Cost is proportional to the
    /// number of air-defense pieces on the board.
    #[must_use]
    pub fn compute(pos: &Position) -> Self {
        let mut zones = [Bitboard::EMPTY; 2];
        for sq in pos.occupied().iter() {
            let Some(carrier) = pos.piece_at(sq) else {
                continue;
            };
            if let Some(range) = carrier.kind.air_defense_range(carrier.heroic) {
                zones[carrier.color.index()] =
                    zones[carrier.color.index()].or(footprint(sq, range));
            }
            for cargo in pos.carried_at(sq) {
                if let Some(range) = cargo.kind.air_defense_range(cargo.heroic) {
                    zones[cargo.color.index()] =
                        zones[cargo.color.index()].or(footprint(sq, range));
                }
            }
        }
        AirDefense { zones }
    }

    /// Is the square inside `by_color`'s air-defense zone?
    #[inline]
    #[must_use]
    pub fn is_defended(&self, sq: Square, by_color: Color) -> bool {
        self.zones[by_color.index()].contains(sq)
    }

    /// The full zone of one color.
    #[inline]
    #[must_use]
    pub fn zone(&self, color: Color) -> Bitboard {
        self.zones[color.index()]
    }
}
