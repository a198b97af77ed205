use super::game::Game;
use super::position::Position;
use super::terrain::terrain_ok;
use super::types::{Bitboard, Color, PieceType, Square, ALL_PIECE_TYPES, NUM_FILES, NUM_RANKS};

#[cfg(debug_assertions)]
impl Game {
    /// Debug helper to print the board grid
    pub fn debug_board(&self) {
        println!("Side to move: {}", self.turn());
        println!("Hash: {:016x}", self.hash());
        if let Some(session) = self.deploy_session() {
            println!("Deploy session at {}", session.origin());
        }
        for rank in (0..NUM_RANKS).rev() {
            print!("{:>2} |", rank + 1);
            for file in 0..NUM_FILES {
                let sq = Square::new(rank, file);
                match self.position().piece_at(sq) {
                    Some(piece) => {
                        let marker = if self.position().is_stack(sq) { '*' } else { ' ' };
                        print!(" {}{}", piece.kind.to_fen_char(piece.color), marker);
                    }
                    None => print!(" . "),
                }
            }
            println!();
        }
        println!("     a  b  c  d  e  f  g  h  i  j  k");
        println!("------------------------------------");
    }
}

/// Audit the structural invariants of the position store. Panics on
/// violation; meant for debug builds and tests only.
pub(crate) fn audit_invariants(pos: &Position) {
    let mut occupancy_check = Bitboard::EMPTY;
    let mut commanders = [0usize; 2];

    for rank in 0..NUM_RANKS {
        for file in 0..NUM_FILES {
            let sq = Square::new(rank, file);
            let mut classes = 0;
            for kind in ALL_PIECE_TYPES {
                if pos.pieces_of(Color::Red, kind).contains(sq)
                    || pos.pieces_of(Color::Blue, kind).contains(sq)
                {
                    classes += 1;
                }
            }
            match pos.piece_at(sq) {
                Some(piece) => {
                    assert_eq!(classes, 1, "square {sq} must be in exactly one class set");
                    occupancy_check.insert(sq);
                    assert!(
                        terrain_ok(piece.kind, sq),
                        "{:?} violates terrain at {sq}",
                        piece.kind
                    );
                    for member in pos.group_at(sq) {
                        if member.kind == PieceType::Commander {
                            commanders[member.color.index()] += 1;
                        }
                    }
                }
                None => {
                    assert_eq!(classes, 0, "empty square {sq} appears in a class set");
                }
            }
        }
    }

    assert_eq!(pos.occupied(), occupancy_check, "occupancy set inconsistent");
    assert_eq!(
        pos.occupied(),
        pos.pieces(Color::Red).or(pos.pieces(Color::Blue)),
        "occupancy must be the union of the color sets"
    );
    assert!(
        pos.pieces(Color::Red).and(pos.pieces(Color::Blue)).is_empty(),
        "color sets overlap"
    );
    assert!(
        pos.carriers().is_subset_of(pos.occupied()),
        "carrier set outside occupancy"
    );
    assert!(
        pos.heroic_squares().is_subset_of(pos.occupied()),
        "heroic set outside occupancy"
    );
    assert!(commanders[0] <= 1, "Red has {} Commanders", commanders[0]);
    assert!(commanders[1] <= 1, "Blue has {} Commanders", commanders[1]);
    for sq in pos.carriers().iter() {
        assert!(
            !pos.carried_at(sq).is_empty(),
            "carrier bit without stack entry at {sq}"
        );
    }
    assert_eq!(
        pos.stacks.len() as u32,
        pos.carriers().popcount(),
        "stack table keys must equal the carrier set"
    );
    for sq in pos.stacks.keys() {
        assert!(pos.carriers().contains(sq), "orphan stack entry at {sq}");
    }
    assert_eq!(
        pos.hash(),
        pos.recompute_hash(),
        "incremental hash diverged"
    );
}
