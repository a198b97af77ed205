//! Deploy sessions: splitting a stack over several sub-moves in one turn.
//!
//! A session opens on the turn's first deploy-flagged move, tracks which
//! members have acted and where they went, and closes by commit (turn
//! passes) or cancel (every sub-move undone). The session is observable
//! state: it appears in the FEN, in cache keys and in repetition equality.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use super::air_defense::AirDefense;
use super::movegen::{self, DeployContext};
use super::position::Position;
use super::stacks;
use super::terrain::terrain_ok;
use super::types::{Color, Move, MoveList, Piece, PieceType, Square};

/// One executed sub-move of a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DeployEntry {
    pub kind: PieceType,
    pub heroic: bool,
    pub to: Square,
    /// True when the member fired without leaving the origin (stay capture).
    pub stayed: bool,
    /// True when the sub-move removed an enemy piece (any modality).
    pub capture: bool,
}

/// State of an active deploy session.
#[derive(Clone, Debug)]
pub struct DeploySession {
    origin: Square,
    color: Color,
    original: Vec<Piece>,
    entries: Vec<DeployEntry>,
    /// FEN at session start; `None` for sessions reconstructed from a
    /// loaded FEN, which therefore cannot be cancelled.
    start_fen: Option<String>,
}

/// Sessions compare by observable state (origin, side and executed
/// entries); the snapshot and start FEN are bookkeeping.
impl PartialEq for DeploySession {
    fn eq(&self, other: &Self) -> bool {
        self.origin == other.origin && self.color == other.color && self.entries == other.entries
    }
}

impl DeploySession {
    pub(crate) fn new(
        origin: Square,
        color: Color,
        original: Vec<Piece>,
        start_fen: Option<String>,
    ) -> Self {
        DeploySession {
            origin,
            color,
            original,
            entries: Vec::new(),
            start_fen,
        }
    }

    #[inline]
    #[must_use]
    pub fn origin(&self) -> Square {
        self.origin
    }

    #[inline]
    #[must_use]
    pub fn color(&self) -> Color {
        self.color
    }

    /// The stack as it stood when the session opened, carrier first.
    #[must_use]
    pub fn original_stack(&self) -> &[Piece] {
        &self.original
    }

    /// Executed sub-moves in order.
    #[must_use]
    pub fn entries(&self) -> &[DeployEntry] {
        &self.entries
    }

    #[must_use]
    pub(crate) fn start_fen(&self) -> Option<&str> {
        self.start_fen.as_deref()
    }

    pub(crate) fn record(&mut self, mv: &Move) {
        self.entries.push(DeployEntry {
            kind: mv.piece.kind,
            heroic: mv.piece.heroic,
            to: mv.to,
            stayed: mv.is_stay_capture(),
            capture: mv.is_capture(),
        });
    }

    /// Did any sub-move capture? Resets the halfmove clock at commit.
    #[must_use]
    pub(crate) fn any_capture(&self) -> bool {
        self.entries.iter().any(|e| e.capture)
    }

    /// Did the Commander act during the session?
    #[must_use]
    pub(crate) fn commander_acted(&self) -> bool {
        self.entries.iter().any(|e| e.kind == PieceType::Commander)
    }

    pub(crate) fn record_entry(&mut self, entry: DeployEntry) {
        self.entries.push(entry);
    }

    /// Has this member class already acted in the session?
    #[must_use]
    pub fn has_acted(&self, kind: PieceType) -> bool {
        self.entries.iter().any(|e| e.kind == kind)
    }

    /// Members of the original stack that still sit on the origin and have
    /// not acted yet.
    #[must_use]
    pub fn remaining_movers(&self, pos: &Position) -> Vec<Piece> {
        pos.group_at(self.origin)
            .into_iter()
            .filter(|p| !self.has_acted(p.kind))
            .collect()
    }

    /// Squares deployed to earlier that still hold a friendly piece; the
    /// legal recombine targets.
    #[must_use]
    pub(crate) fn recombine_targets(&self, pos: &Position) -> Vec<Square> {
        let mut targets = Vec::new();
        for entry in &self.entries {
            if entry.stayed || targets.contains(&entry.to) {
                continue;
            }
            if pos
                .piece_at(entry.to)
                .is_some_and(|p| p.color == self.color)
            {
                targets.push(entry.to);
            }
        }
        targets
    }

    /// Stable fingerprint folded into cache keys and repetition equality.
    #[must_use]
    pub(crate) fn fingerprint(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.origin.hash(&mut hasher);
        self.color.index().hash(&mut hasher);
        self.entries.hash(&mut hasher);
        hasher.finish()
    }
}

/// Pseudo-legal sub-moves of the active session: remaining members moving
/// out of the origin, plus recombines onto earlier destinations.
#[must_use]
pub(crate) fn session_moves(pos: &Position, ad: &AirDefense, session: &DeploySession) -> MoveList {
    let mut out = MoveList::new();
    let recombine = session.recombine_targets(pos);
    let ctx = DeployContext {
        recombine_squares: &recombine,
    };
    for member in session.remaining_movers(pos) {
        movegen::moves_for_mover(pos, ad, session.origin(), member, &[], Some(&ctx), &mut out);
    }
    out.retain(|mv| remainder_allows(pos, session.origin(), mv));
    out
}

/// Deploy-flagged first sub-moves for an idle stack: every member may step
/// out, provided what stays behind can still stand there.
pub(crate) fn opening_moves(pos: &Position, ad: &AirDefense, origin: Square, out: &mut MoveList) {
    let group = pos.group_at(origin);
    if group.len() < 2 {
        return;
    }
    let ctx = DeployContext {
        recombine_squares: &[],
    };
    let mut candidate = MoveList::new();
    for member in group {
        movegen::moves_for_mover(pos, ad, origin, member, &[], Some(&ctx), &mut candidate);
    }
    candidate.retain(|mv| remainder_allows(pos, origin, mv));
    out.extend(candidate);
}

/// After `mv`, must the pieces left on the origin still form a valid stack
/// on valid terrain?
pub(crate) fn remainder_allows(pos: &Position, origin: Square, mv: &Move) -> bool {
    if mv.is_stay_capture() {
        return true; // nothing leaves the origin
    }
    let remainder: Vec<Piece> = pos
        .group_at(origin)
        .into_iter()
        .filter(|p| p.kind != mv.piece.kind)
        .collect();
    if remainder.is_empty() {
        return true;
    }
    match stacks::fold_members(&remainder) {
        Some((carrier, _)) => terrain_ok(carrier.kind, origin),
        None => false,
    }
}
