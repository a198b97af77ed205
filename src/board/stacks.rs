//! Stack side table and composition rules.
//!
//! Carried pieces are stored out of line, keyed by square, so non-stack
//! squares pay nothing. The position store owns a `StackTable` and keeps its
//! keys equal to the carrier bit-set; this module owns the composition
//! checks.

use std::collections::HashMap;

use super::error::PlacementError;
use super::types::{Piece, PieceType, Square};

/// Carrier preference when two pieces merge and either could carry the
/// other (e.g. Commander onto Tank): vehicles before persons.
const CARRIER_PRECEDENCE: [PieceType; 6] = [
    PieceType::Navy,
    PieceType::AirForce,
    PieceType::Tank,
    PieceType::Engineer,
    PieceType::Headquarter,
    PieceType::Commander,
];

/// Validate a carrier/carried grouping against the composition table.
///
/// Each carried piece must be a class the carrier covers, share the
/// carrier's color, and appear at most once.
pub(crate) fn validate_stack(carrier: Piece, carried: &[Piece]) -> Result<(), PlacementError> {
    for (i, cargo) in carried.iter().enumerate() {
        if cargo.color != carrier.color || !carrier.kind.can_carry(cargo.kind) {
            return Err(PlacementError::InvalidComposition {
                carrier: carrier.kind,
                cargo: cargo.kind,
            });
        }
        if carried[..i].iter().any(|p| p.kind == cargo.kind) {
            return Err(PlacementError::InvalidComposition {
                carrier: carrier.kind,
                cargo: cargo.kind,
            });
        }
    }
    Ok(())
}

/// Whether two co-located groups of friendly pieces can merge into one
/// stack, and under which carrier.
///
/// `a` and `b` are flattened piece groups (carrier first). Returns the
/// merged stack `(carrier, carried)` or `None` when no orientation
/// satisfies the table.
pub(crate) fn combine(a: &[Piece], b: &[Piece]) -> Option<(Piece, Vec<Piece>)> {
    let mut all: Vec<Piece> = Vec::with_capacity(a.len() + b.len());
    all.extend_from_slice(a);
    all.extend_from_slice(b);
    fold_members(&all)
}

/// Pick a carrier for a flat group of friendly pieces and validate the
/// rest as its cargo. Used both for combinations and for the remainder of
/// a deploying stack.
pub(crate) fn fold_members(members: &[Piece]) -> Option<(Piece, Vec<Piece>)> {
    if members.len() == 1 {
        return Some((members[0], Vec::new()));
    }
    for kind in CARRIER_PRECEDENCE {
        let Some(pos) = members.iter().position(|p| p.kind == kind) else {
            continue;
        };
        let carrier = members[pos];
        let carried: Vec<Piece> = members
            .iter()
            .enumerate()
            .filter(|&(i, _)| i != pos)
            .map(|(_, &p)| p)
            .collect();
        if validate_stack(carrier, &carried).is_ok() {
            return Some((carrier, carried));
        }
    }
    None
}

/// Side table mapping stack squares to their carried pieces.
#[derive(Clone, Debug, Default)]
pub(crate) struct StackTable {
    map: HashMap<Square, Vec<Piece>>,
}

impl StackTable {
    pub(crate) fn new() -> Self {
        StackTable {
            map: HashMap::new(),
        }
    }

    pub(crate) fn get(&self, sq: Square) -> Option<&[Piece]> {
        self.map.get(&sq).map(Vec::as_slice)
    }

    pub(crate) fn insert(&mut self, sq: Square, carried: Vec<Piece>) {
        debug_assert!(!carried.is_empty(), "empty carried list for {sq}");
        self.map.insert(sq, carried);
    }

    pub(crate) fn remove(&mut self, sq: Square) -> Option<Vec<Piece>> {
        self.map.remove(&sq)
    }

    pub(crate) fn get_mut(&mut self, sq: Square) -> Option<&mut Vec<Piece>> {
        self.map.get_mut(&sq)
    }

    pub(crate) fn len(&self) -> usize {
        self.map.len()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = Square> + '_ {
        self.map.keys().copied()
    }
}
