//! The position store.
//!
//! Owns the board state: one bit-set per piece class, per color, aggregate
//! occupancy, the carrier and heroic sets, cached Commander squares, the
//! stack side table and the incremental Zobrist hash. Place and remove keep
//! every derived structure consistent in a single pass.
//!
//! The store has no notion of turn order or legality; that belongs to the
//! game controller.

use crate::zobrist::{heroic_key, piece_key};

use super::error::PlacementError;
use super::stacks::{validate_stack, StackTable};
use super::terrain::terrain_ok;
use super::types::{
    Bitboard, Color, Piece, PieceType, Square, ALL_PIECE_TYPES, NUM_PIECE_TYPES,
};

const NO_CARRIED: &[Piece] = &[];

#[derive(Clone, Debug)]
pub struct Position {
    class_sets: [Bitboard; NUM_PIECE_TYPES],
    colors: [Bitboard; 2],
    occupied: Bitboard,
    carriers: Bitboard,
    heroic: Bitboard,
    commanders: [Option<Square>; 2],
    pub(crate) stacks: StackTable,
    hash: u64,
}

impl Position {
    /// An empty board.
    #[must_use]
    pub fn empty() -> Self {
        Position {
            class_sets: [Bitboard::EMPTY; NUM_PIECE_TYPES],
            colors: [Bitboard::EMPTY; 2],
            occupied: Bitboard::EMPTY,
            carriers: Bitboard::EMPTY,
            heroic: Bitboard::EMPTY,
            commanders: [None; 2],
            stacks: StackTable::new(),
            hash: 0,
        }
    }

    /// Piece-only Zobrist hash (side to move is folded in by the game).
    #[inline]
    #[must_use]
    pub fn hash(&self) -> u64 {
        self.hash
    }

    /// The carrier piece on a square, if any.
    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        if !self.occupied.contains(sq) {
            return None;
        }
        let color = if self.colors[Color::Red.index()].contains(sq) {
            Color::Red
        } else {
            Color::Blue
        };
        for kind in ALL_PIECE_TYPES {
            if self.class_sets[kind.index()].contains(sq) {
                return Some(Piece {
                    kind,
                    color,
                    heroic: self.heroic.contains(sq),
                });
            }
        }
        None
    }

    /// Pieces carried on a square (empty slice for plain pieces).
    #[must_use]
    pub fn carried_at(&self, sq: Square) -> &[Piece] {
        self.stacks.get(sq).unwrap_or(NO_CARRIED)
    }

    /// Carrier plus carried pieces for a stack square.
    #[must_use]
    pub fn stack_at(&self, sq: Square) -> Option<(Piece, &[Piece])> {
        let carried = self.stacks.get(sq)?;
        let carrier = self.piece_at(sq)?;
        Some((carrier, carried))
    }

    /// Every piece on the square, carrier first.
    #[must_use]
    pub fn group_at(&self, sq: Square) -> Vec<Piece> {
        let mut group = Vec::new();
        if let Some(carrier) = self.piece_at(sq) {
            group.push(carrier);
            group.extend_from_slice(self.carried_at(sq));
        }
        group
    }

    #[inline]
    #[must_use]
    pub fn is_empty_square(&self, sq: Square) -> bool {
        !self.occupied.contains(sq)
    }

    #[inline]
    #[must_use]
    pub fn is_stack(&self, sq: Square) -> bool {
        self.carriers.contains(sq)
    }

    /// Aggregate occupancy.
    #[inline]
    #[must_use]
    pub fn occupied(&self) -> Bitboard {
        self.occupied
    }

    /// All squares occupied by one side.
    #[inline]
    #[must_use]
    pub fn pieces(&self, color: Color) -> Bitboard {
        self.colors[color.index()]
    }

    /// Squares whose carrier has the given class and color.
    #[inline]
    #[must_use]
    pub fn pieces_of(&self, color: Color, kind: PieceType) -> Bitboard {
        self.class_sets[kind.index()].and(self.colors[color.index()])
    }

    /// Squares holding stacks.
    #[inline]
    #[must_use]
    pub fn carriers(&self) -> Bitboard {
        self.carriers
    }

    /// Squares whose carrier is heroic.
    #[inline]
    #[must_use]
    pub fn heroic_squares(&self) -> Bitboard {
        self.heroic
    }

    /// The square of a color's Commander, whether standing alone, carrying
    /// a stack, or riding inside one.
    #[inline]
    #[must_use]
    pub fn commander_square(&self, color: Color) -> Option<Square> {
        self.commanders[color.index()]
    }

    /// Place a piece (with optional cargo) on an empty square.
    ///
    /// Checks terrain, occupancy, Commander uniqueness and stack
    /// composition; the board is unchanged on error.
    pub fn place(
        &mut self,
        piece: Piece,
        carried: &[Piece],
        sq: Square,
    ) -> Result<(), PlacementError> {
        if self.occupied.contains(sq) {
            return Err(PlacementError::Occupied { square: sq });
        }
        if !terrain_ok(piece.kind, sq) {
            return Err(PlacementError::TerrainMismatch {
                kind: piece.kind,
                square: sq,
            });
        }
        validate_stack(piece, carried)?;

        let commanders_placed = carried
            .iter()
            .chain(std::iter::once(&piece))
            .filter(|p| p.kind == PieceType::Commander)
            .count();
        if commanders_placed > 0
            && (commanders_placed > 1 || self.commanders[piece.color.index()].is_some())
        {
            return Err(PlacementError::CommanderUnique { color: piece.color });
        }

        self.place_raw(piece, carried, sq);
        Ok(())
    }

    /// Place without validation; callers must have checked the invariants
    /// (used when replaying recorded actions).
    pub(crate) fn place_raw(&mut self, piece: Piece, carried: &[Piece], sq: Square) {
        debug_assert!(!self.occupied.contains(sq), "place_raw on occupied {sq}");

        self.class_sets[piece.kind.index()].insert(sq);
        self.colors[piece.color.index()].insert(sq);
        self.occupied.insert(sq);
        if piece.heroic {
            self.heroic.insert(sq);
        }
        self.hash ^= piece_key(piece, sq);

        if piece.kind == PieceType::Commander {
            self.commanders[piece.color.index()] = Some(sq);
        }

        if !carried.is_empty() {
            self.carriers.insert(sq);
            for cargo in carried {
                self.hash ^= piece_key(*cargo, sq);
                if cargo.kind == PieceType::Commander {
                    self.commanders[cargo.color.index()] = Some(sq);
                }
            }
            self.stacks.insert(sq, carried.to_vec());
        }
    }

    /// Remove whatever stands on a square, returning the carrier and its
    /// cargo.
    pub fn remove(&mut self, sq: Square) -> Option<(Piece, Vec<Piece>)> {
        let piece = self.piece_at(sq)?;

        self.class_sets[piece.kind.index()].remove(sq);
        self.colors[piece.color.index()].remove(sq);
        self.occupied.remove(sq);
        self.heroic.remove(sq);
        self.hash ^= piece_key(piece, sq);

        if piece.kind == PieceType::Commander {
            self.commanders[piece.color.index()] = None;
        }

        let carried = if self.carriers.contains(sq) {
            self.carriers.remove(sq);
            let carried = self.stacks.remove(sq).unwrap_or_default();
            for cargo in &carried {
                self.hash ^= piece_key(*cargo, sq);
                if cargo.kind == PieceType::Commander {
                    self.commanders[cargo.color.index()] = None;
                }
            }
            carried
        } else {
            Vec::new()
        };

        Some((piece, carried))
    }

    /// Flip the heroic flag of the piece of class `kind` on `sq` (carrier
    /// or carried member). Returns false when no such piece exists or the
    /// flag already has the requested value.
    pub(crate) fn set_heroic(&mut self, sq: Square, kind: PieceType, value: bool) -> bool {
        if let Some(carrier) = self.piece_at(sq) {
            if carrier.kind == kind {
                if carrier.heroic == value {
                    return false;
                }
                self.heroic.toggle(sq);
                self.hash ^= heroic_key(kind, carrier.color, sq);
                return true;
            }
        }
        if let Some(carried) = self.stacks.get_mut(sq) {
            if let Some(cargo) = carried.iter_mut().find(|p| p.kind == kind) {
                if cargo.heroic == value {
                    return false;
                }
                cargo.heroic = value;
                self.hash ^= heroic_key(kind, cargo.color, sq);
                return true;
            }
        }
        false
    }

    /// Recompute the hash from scratch (debug audits and tests).
    #[must_use]
    pub fn recompute_hash(&self) -> u64 {
        let mut hash = 0u64;
        for sq in self.occupied.iter() {
            if let Some(piece) = self.piece_at(sq) {
                hash ^= piece_key(piece, sq);
            }
            for cargo in self.carried_at(sq) {
                hash ^= piece_key(*cargo, sq);
            }
        }
        hash
    }
}

impl Default for Position {
    fn default() -> Self {
        Position::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sq(s: &str) -> Square {
        s.parse().unwrap()
    }

    #[test]
    fn test_place_and_query() {
        let mut pos = Position::empty();
        let tank = Piece::new(PieceType::Tank, Color::Red);
        pos.place(tank, &[], sq("f4")).unwrap();

        assert_eq!(pos.piece_at(sq("f4")), Some(tank));
        assert!(pos.is_empty_square(sq("f5")));
        assert_eq!(pos.pieces_of(Color::Red, PieceType::Tank).popcount(), 1);
        assert_eq!(pos.pieces(Color::Red).popcount(), 1);
        assert!(pos.carried_at(sq("f4")).is_empty());
    }

    #[test]
    fn test_place_occupied() {
        let mut pos = Position::empty();
        let tank = Piece::new(PieceType::Tank, Color::Red);
        pos.place(tank, &[], sq("f4")).unwrap();
        assert_eq!(
            pos.place(tank, &[], sq("f4")),
            Err(PlacementError::Occupied { square: sq("f4") })
        );
    }

    #[test]
    fn test_place_terrain() {
        let mut pos = Position::empty();
        let tank = Piece::new(PieceType::Tank, Color::Red);
        assert!(matches!(
            pos.place(tank, &[], sq("a4")),
            Err(PlacementError::TerrainMismatch { .. })
        ));

        let navy = Piece::new(PieceType::Navy, Color::Red);
        assert!(matches!(
            pos.place(navy, &[], sq("f4")),
            Err(PlacementError::TerrainMismatch { .. })
        ));
        // Coast and river are fine for both kinds of mover
        pos.place(navy, &[], sq("c4")).unwrap();
        pos.place(tank, &[], sq("d6")).unwrap();
    }

    #[test]
    fn test_commander_unique() {
        let mut pos = Position::empty();
        let cmd = Piece::new(PieceType::Commander, Color::Red);
        pos.place(cmd, &[], sq("g1")).unwrap();
        assert_eq!(
            pos.place(cmd, &[], sq("h1")),
            Err(PlacementError::CommanderUnique { color: Color::Red })
        );
        // The other color still has room
        let blue = Piece::new(PieceType::Commander, Color::Blue);
        pos.place(blue, &[], sq("g12")).unwrap();
        assert_eq!(pos.commander_square(Color::Red), Some(sq("g1")));
        assert_eq!(pos.commander_square(Color::Blue), Some(sq("g12")));
    }

    #[test]
    fn test_stack_placement() {
        let mut pos = Position::empty();
        let navy = Piece::new(PieceType::Navy, Color::Red);
        let cargo = [
            Piece::new(PieceType::AirForce, Color::Red),
            Piece::new(PieceType::Tank, Color::Red),
        ];
        pos.place(navy, &cargo, sq("c3")).unwrap();

        assert!(pos.is_stack(sq("c3")));
        let (carrier, carried) = pos.stack_at(sq("c3")).unwrap();
        assert_eq!(carrier.kind, PieceType::Navy);
        assert_eq!(carried.len(), 2);
        assert_eq!(pos.carriers().popcount(), 1);

        let (piece, carried) = pos.remove(sq("c3")).unwrap();
        assert_eq!(piece.kind, PieceType::Navy);
        assert_eq!(carried.len(), 2);
        assert!(pos.occupied().is_empty());
        assert_eq!(pos.hash(), 0);
    }

    #[test]
    fn test_carried_commander_tracked() {
        let mut pos = Position::empty();
        let tank = Piece::new(PieceType::Tank, Color::Red);
        let cmd = Piece::new(PieceType::Commander, Color::Red);
        pos.place(tank, &[cmd], sq("f4")).unwrap();
        assert_eq!(pos.commander_square(Color::Red), Some(sq("f4")));

        pos.remove(sq("f4")).unwrap();
        assert_eq!(pos.commander_square(Color::Red), None);
    }

    #[test]
    fn test_hash_incremental_matches_recompute() {
        let mut pos = Position::empty();
        pos.place(Piece::new(PieceType::Tank, Color::Red), &[], sq("f4"))
            .unwrap();
        pos.place(
            Piece::new(PieceType::Navy, Color::Blue),
            &[Piece::new(PieceType::Infantry, Color::Blue)],
            sq("b9"),
        )
        .unwrap();
        assert_eq!(pos.hash(), pos.recompute_hash());

        pos.set_heroic(sq("f4"), PieceType::Tank, true);
        assert_eq!(pos.hash(), pos.recompute_hash());
        assert!(pos.piece_at(sq("f4")).unwrap().heroic);

        pos.set_heroic(sq("b9"), PieceType::Infantry, true);
        assert_eq!(pos.hash(), pos.recompute_hash());
        assert!(pos.carried_at(sq("b9"))[0].heroic);

        pos.remove(sq("f4")).unwrap();
        assert_eq!(pos.hash(), pos.recompute_hash());
    }

    #[test]
    fn test_set_heroic_idempotent() {
        let mut pos = Position::empty();
        pos.place(Piece::new(PieceType::Tank, Color::Red), &[], sq("f4"))
            .unwrap();
        assert!(pos.set_heroic(sq("f4"), PieceType::Tank, true));
        assert!(!pos.set_heroic(sq("f4"), PieceType::Tank, true));
        assert!(pos.set_heroic(sq("f4"), PieceType::Tank, false));
        assert!(!pos.set_heroic(sq("f4"), PieceType::Militia, true));
    }
}
