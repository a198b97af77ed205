//! The game controller.
//!
//! Owns the position, the turn and move counters, the deploy session, the
//! history log and the legal-move cache. All legality filtering happens
//! here: a pseudo-legal candidate is applied to a scratch board, the
//! mover's Commander checked for capture, attack and flying-general
//! exposure, then the candidate is reverted.

use std::collections::{HashMap, VecDeque};

use parking_lot::Mutex;

use crate::zobrist::side_key;

use super::air_defense::AirDefense;
use super::deploy::{self, DeploySession};
use super::error::{DeployError, FenError, MoveError, PlacementError, SanError};
use super::fen;
use super::make_unmake::{self, Action};
use super::movegen;
use super::position::Position;
use super::san;
use super::types::{Color, Move, MoveList, Piece, PieceType, Square};

/// FEN of the standard starting position.
pub const START_FEN: &str =
    "6c4/1n2fh1hf2/3a2s2a1/2n1gt1tg2/2ie2m2ei/11/11/2IE2M2EI/2N1GT1TG2/3A2S2A1/1N2FH1HF2/6C4 r - - 0 1";

const CACHE_CAPACITY: usize = 64;

/// Filter for `Game::moves`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveFilter {
    pub square: Option<Square>,
    pub piece: Option<PieceType>,
    /// When false, skip the commander-safety filter and return the raw
    /// pseudo-legal list.
    pub legal: bool,
}

impl Default for MoveFilter {
    fn default() -> Self {
        MoveFilter {
            square: None,
            piece: None,
            legal: true,
        }
    }
}

impl MoveFilter {
    /// Legal moves from one square.
    #[must_use]
    pub fn square(square: Square) -> Self {
        MoveFilter {
            square: Some(square),
            ..Self::default()
        }
    }
}

/// Capture modality requested in a structured move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Modality {
    Normal,
    Stay,
    Suicide,
    Combine,
}

/// Structured move input, the programmatic equivalent of a SAN token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MoveRequest {
    pub from: Square,
    pub to: Square,
    /// Required when several members of a stack could make the move.
    pub piece: Option<PieceType>,
    pub deploy: bool,
    pub modality: Option<Modality>,
}

impl MoveRequest {
    #[must_use]
    pub fn new(from: Square, to: Square) -> Self {
        MoveRequest {
            from,
            to,
            piece: None,
            deploy: false,
            modality: None,
        }
    }

    #[must_use]
    pub fn deploy(mut self) -> Self {
        self.deploy = true;
        self
    }

    #[must_use]
    pub fn piece(mut self, kind: PieceType) -> Self {
        self.piece = Some(kind);
        self
    }

    #[must_use]
    pub fn modality(mut self, modality: Modality) -> Self {
        self.modality = Some(modality);
        self
    }

    fn matches(&self, mv: &Move) -> bool {
        if mv.from != self.from || mv.to != self.to || mv.is_deploy() != self.deploy {
            return false;
        }
        if let Some(kind) = self.piece {
            if mv.piece.kind != kind {
                return false;
            }
        }
        match self.modality {
            None => true,
            Some(Modality::Normal) => {
                !mv.is_stay_capture() && !mv.is_suicide() && !mv.is_combination()
            }
            Some(Modality::Stay) => mv.is_stay_capture(),
            Some(Modality::Suicide) => mv.is_suicide(),
            Some(Modality::Combine) => mv.is_combination(),
        }
    }
}

/// Why a finished game ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameResult {
    Win { winner: Color, reason: WinReason },
    Draw { reason: DrawReason },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WinReason {
    Checkmate,
    CommanderCaptured,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawReason {
    Stalemate,
    FiftyMoveRule,
    ThreefoldRepetition,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum EntryKind {
    Move,
    DeployStep,
    DeployCommit,
}

#[derive(Clone, Debug)]
struct HistoryEntry {
    kind: EntryKind,
    mv: Option<Move>,
    san: String,
    actions: Vec<Action>,
    prev_turn: Color,
    prev_halfmove: u32,
    prev_fullmove: u32,
    prev_session: Option<DeploySession>,
    rep_key: u64,
    fen_before: String,
}

/// One move of the game as reported by `history_verbose`.
#[derive(Clone, Debug)]
pub struct HistoryRecord {
    pub san: String,
    pub mv: Option<Move>,
    pub color: Color,
    pub fen_before: String,
}

#[derive(Clone, Debug, Default)]
struct RepetitionTable {
    counts: HashMap<u64, u32>,
}

impl RepetitionTable {
    fn new() -> Self {
        RepetitionTable {
            counts: HashMap::new(),
        }
    }

    fn get(&self, hash: u64) -> u32 {
        self.counts.get(&hash).copied().unwrap_or(0)
    }

    fn set(&mut self, hash: u64, count: u32) {
        if count == 0 {
            self.counts.remove(&hash);
        } else {
            self.counts.insert(hash, count);
        }
    }

    fn increment(&mut self, hash: u64) {
        let next = self.get(hash).saturating_add(1);
        self.set(hash, next);
    }

    fn decrement(&mut self, hash: u64) {
        let count = self.get(hash);
        self.set(hash, count.saturating_sub(1));
    }
}

#[derive(Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    fen: String,
    square: Option<Square>,
    piece: Option<PieceType>,
    legal: bool,
}

/// Bounded LRU for legal-move lists. The FEN key carries the deploy
/// suffix, so mid-session positions never alias quiescent ones.
struct MoveCache {
    map: HashMap<CacheKey, MoveList>,
    order: VecDeque<CacheKey>,
    capacity: usize,
}

impl MoveCache {
    fn new(capacity: usize) -> Self {
        MoveCache {
            map: HashMap::new(),
            order: VecDeque::new(),
            capacity,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<MoveList> {
        self.map.get(key).cloned()
    }

    fn insert(&mut self, key: CacheKey, list: MoveList) {
        if self.map.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.map.remove(&oldest);
            }
        }
        if self.map.insert(key.clone(), list).is_none() {
            self.order.push_back(key);
        }
    }

    fn clear(&mut self) {
        self.map.clear();
        self.order.clear();
    }
}

/// A complete game: position, clocks, deploy session, history.
pub struct Game {
    pos: Position,
    turn: Color,
    halfmove_clock: u32,
    fullmove_number: u32,
    session: Option<DeploySession>,
    history: Vec<HistoryEntry>,
    repetition: RepetitionTable,
    air_defense: AirDefense,
    cache: Mutex<MoveCache>,
}

impl Clone for Game {
    fn clone(&self) -> Self {
        Game {
            pos: self.pos.clone(),
            turn: self.turn,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            session: self.session.clone(),
            history: self.history.clone(),
            repetition: self.repetition.clone(),
            air_defense: self.air_defense,
            cache: Mutex::new(MoveCache::new(CACHE_CAPACITY)),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Game::new()
    }
}

impl Game {
    /// The standard starting position, Red to move.
    #[must_use]
    pub fn new() -> Self {
        Game::load(START_FEN).expect("start position FEN is valid")
    }

    /// Assemble a game from an already-built position (used by the
    /// builder).
    pub(crate) fn from_position(
        pos: Position,
        turn: Color,
        halfmove: u32,
        fullmove: u32,
    ) -> Self {
        let air_defense = AirDefense::compute(&pos);
        let mut game = Game {
            pos,
            turn,
            halfmove_clock: halfmove,
            fullmove_number: fullmove,
            session: None,
            history: Vec::new(),
            repetition: RepetitionTable::new(),
            air_defense,
            cache: Mutex::new(MoveCache::new(CACHE_CAPACITY)),
        };
        game.repetition.set(game.repetition_key(), 1);
        game
    }

    /// Load a game from extended FEN.
    pub fn load(fen_str: &str) -> Result<Self, FenError> {
        let fields = fen::parse_fen(fen_str)?;
        let air_defense = AirDefense::compute(&fields.position);
        let mut game = Game {
            pos: fields.position,
            turn: fields.turn,
            halfmove_clock: fields.halfmove,
            fullmove_number: fields.fullmove,
            session: fields.session,
            history: Vec::new(),
            repetition: RepetitionTable::new(),
            air_defense,
            cache: Mutex::new(MoveCache::new(CACHE_CAPACITY)),
        };
        game.repetition.set(game.repetition_key(), 1);
        #[cfg(feature = "logging")]
        log::debug!("loaded position {fen_str}");
        Ok(game)
    }

    /// Extended FEN of the current state, deploy suffix included.
    #[must_use]
    pub fn fen(&self) -> String {
        fen::render_fen(
            &self.pos,
            self.turn,
            self.halfmove_clock,
            self.fullmove_number,
            self.session.as_ref(),
        )
    }

    #[inline]
    #[must_use]
    pub fn turn(&self) -> Color {
        self.turn
    }

    #[inline]
    #[must_use]
    pub fn halfmove_clock(&self) -> u32 {
        self.halfmove_clock
    }

    #[inline]
    #[must_use]
    pub fn fullmove_number(&self) -> u32 {
        self.fullmove_number
    }

    /// Zobrist hash including the side to move.
    #[must_use]
    pub fn hash(&self) -> u64 {
        let mut hash = self.pos.hash();
        if self.turn == Color::Blue {
            hash ^= side_key();
        }
        hash
    }

    /// Repetition key: the hash plus the deploy-session fingerprint. A
    /// position with an active session never equals one without.
    #[must_use]
    pub fn repetition_key(&self) -> u64 {
        let mut key = self.hash();
        if let Some(session) = &self.session {
            key ^= session.fingerprint();
        }
        key
    }

    /// Read-only access to the position store.
    #[inline]
    #[must_use]
    pub fn position(&self) -> &Position {
        &self.pos
    }

    #[must_use]
    pub fn piece_at(&self, sq: Square) -> Option<Piece> {
        self.pos.piece_at(sq)
    }

    /// The current air-defense map.
    #[inline]
    #[must_use]
    pub fn air_defense(&self) -> &AirDefense {
        &self.air_defense
    }

    /// The active deploy session, if any.
    #[must_use]
    pub fn deploy_session(&self) -> Option<&DeploySession> {
        self.session.as_ref()
    }

    /// Is `sq` reachable by a capture of `by`'s pieces?
    #[must_use]
    pub fn square_attacked(&self, sq: Square, by: Color) -> bool {
        movegen::square_attacked_by(&self.pos, &self.air_defense, sq, by)
    }

    /// Is the side to move's Commander under attack?
    #[must_use]
    pub fn in_check(&self) -> bool {
        match self.pos.commander_square(self.turn) {
            Some(sq) => self.square_attacked(sq, self.turn.opponent()),
            None => false,
        }
    }

    // =====================================================================
    // Move generation
    // =====================================================================

    fn pseudo_moves(&self) -> MoveList {
        match &self.session {
            Some(session) => deploy::session_moves(&self.pos, &self.air_defense, session),
            None => {
                let mut out = movegen::pseudo_legal(&self.pos, &self.air_defense, self.turn);
                let stacks = self.pos.carriers().and(self.pos.pieces(self.turn));
                for sq in stacks.iter() {
                    deploy::opening_moves(&self.pos, &self.air_defense, sq, &mut out);
                }
                out
            }
        }
    }

    /// Drop candidates that leave the mover's Commander captured,
    /// attacked, or exposed to the enemy Commander.
    fn filter_legal(&self, pseudo: MoveList) -> MoveList {
        let mut scratch = self.pos.clone();
        let side = self.turn;
        let had_commander = scratch.commander_square(side).is_some();
        let mut legal = MoveList::new();

        for mv in pseudo {
            let actions = make_unmake::lower_move(&scratch, &mv);
            make_unmake::apply_actions(&mut scratch, &actions);
            let safe = if had_commander {
                match scratch.commander_square(side) {
                    None => false,
                    Some(cmd) => {
                        let ad = AirDefense::compute(&scratch);
                        !movegen::square_attacked_by(&scratch, &ad, cmd, side.opponent())
                            && !movegen::commanders_facing(&scratch)
                    }
                }
            } else {
                true
            };
            make_unmake::revert_actions(&mut scratch, &actions);
            if safe {
                legal.push(mv);
            }
        }
        legal
    }

    /// Moves of the side to move (or of the deploying stack while a
    /// session is active), filtered per `filter`.
    #[must_use]
    pub fn moves(&self, filter: &MoveFilter) -> MoveList {
        let key = CacheKey {
            fen: self.fen(),
            square: filter.square,
            piece: filter.piece,
            legal: filter.legal,
        };
        if let Some(hit) = self.cache.lock().get(&key) {
            return hit;
        }

        let mut list = self.pseudo_moves();
        if let Some(sq) = filter.square {
            list.retain(|m| m.from == sq);
        }
        if let Some(kind) = filter.piece {
            list.retain(|m| m.piece.kind == kind);
        }
        if filter.legal {
            list = self.filter_legal(list);
        }

        self.cache.lock().insert(key, list.clone());
        list
    }

    /// All legal moves for the side to move.
    #[must_use]
    pub fn legal_moves(&self) -> MoveList {
        self.moves(&MoveFilter::default())
    }

    // =====================================================================
    // Move application
    // =====================================================================

    /// Parse a SAN/LAN token against the current legal moves and play it.
    pub fn make_move_san(&mut self, token: &str) -> Result<Move, MoveError> {
        let legal = self.legal_moves();
        let mv = match self.match_san(token, &legal) {
            Ok(mv) => mv,
            Err(err) => return Err(self.classify_san_rejection(token, err)),
        };
        let san = self.move_to_san(&mv);
        self.apply_move_unchecked(mv, san);
        Ok(mv)
    }

    /// Play a structured move request.
    pub fn make_move(&mut self, request: &MoveRequest) -> Result<Move, MoveError> {
        let legal = self.legal_moves();
        let matches: Vec<Move> = legal
            .iter()
            .filter(|mv| request.matches(mv))
            .copied()
            .collect();
        match matches.len() {
            0 => {
                if let Some(err) =
                    self.session_violation(request.from, request.piece, request.deploy)
                {
                    return Err(err.into());
                }
                Err(MoveError::Illegal {
                    notation: format!("{}{}", request.from, request.to),
                })
            }
            1 => {
                let mv = matches[0];
                let san = self.move_to_san(&mv);
                self.apply_move_unchecked(mv, san);
                Ok(mv)
            }
            _ => Err(MoveError::San(SanError::AmbiguousMove {
                san: format!("{}{}", request.from, request.to),
            })),
        }
    }

    /// Play a deploy sub-move given as SAN. Only deploy-flagged moves are
    /// considered, so `Nc5` picks the deploy even when the whole stack
    /// could make the same trip (a session is opened on the first one).
    pub fn deploy_move(&mut self, token: &str) -> Result<Move, MoveError> {
        let mut legal = self.legal_moves();
        legal.retain(|m| m.is_deploy());
        let mv = match self.match_san(token, &legal) {
            Ok(mv) => mv,
            Err(err) => return Err(self.classify_san_rejection(token, err)),
        };
        let san = self.move_to_san(&mv);
        self.apply_move_unchecked(mv, san);
        Ok(mv)
    }

    /// Apply a move taken from the current legal-move list.
    pub fn play(&mut self, mv: &Move) -> Result<(), MoveError> {
        let legal = self.legal_moves();
        if !legal.contains(mv) {
            if let Some(err) =
                self.session_violation(mv.from, Some(mv.piece.kind), mv.is_deploy())
            {
                return Err(err.into());
            }
            return Err(MoveError::Illegal {
                notation: mv.to_string(),
            });
        }
        let san = self.move_to_san(mv);
        self.apply_move_unchecked(*mv, san);
        Ok(())
    }

    /// Session-state check for a rejected move. Inputs that name the wrong
    /// origin, skip the deploy flag, or move a member that already acted
    /// report as deploy-state errors rather than as merely illegal.
    fn session_violation(
        &self,
        from: Square,
        kind: Option<PieceType>,
        is_deploy: bool,
    ) -> Option<DeployError> {
        let session = self.session.as_ref()?;
        let origin = session.origin();
        if from != origin {
            return Some(DeployError::OutsideOrigin { origin, from });
        }
        if !is_deploy {
            return Some(DeployError::NonDeployMove { origin });
        }
        if let Some(kind) = kind {
            if !session
                .remaining_movers(&self.pos)
                .iter()
                .any(|p| p.kind == kind)
            {
                return Some(DeployError::NotARemainingMember { kind });
            }
        }
        None
    }

    /// A SAN token carries at most a class and (in LAN) an origin; while a
    /// session is active, an unmatched token naming a non-member or a
    /// foreign origin is a deploy-state error.
    fn classify_san_rejection(&self, token: &str, err: SanError) -> MoveError {
        if !matches!(err, SanError::NoMatchingMove { .. }) {
            return err.into();
        }
        let Some(session) = self.session.as_ref() else {
            return err.into();
        };
        let Some((kind, origin)) = san::token_query(token) else {
            return err.into();
        };
        if let Some(from) = origin {
            if from != session.origin() {
                return DeployError::OutsideOrigin {
                    origin: session.origin(),
                    from,
                }
                .into();
            }
        }
        if !session
            .remaining_movers(&self.pos)
            .iter()
            .any(|p| p.kind == kind)
        {
            return DeployError::NotARemainingMember { kind }.into();
        }
        err.into()
    }

    pub(crate) fn apply_move_unchecked(&mut self, mv: Move, san: String) {
        let fen_before = self.fen();
        let prev_turn = self.turn;
        let prev_halfmove = self.halfmove_clock;
        let prev_fullmove = self.fullmove_number;
        let prev_session = self.session.clone();

        // Snapshot the stack before the first sub-move opens a session.
        let opening_stack = if mv.is_deploy() && self.session.is_none() {
            Some(self.pos.group_at(mv.from))
        } else {
            None
        };

        let mut actions = make_unmake::lower_move(&self.pos, &mv);
        make_unmake::apply_actions(&mut self.pos, &actions);
        self.air_defense = AirDefense::compute(&self.pos);

        self.promote_heroes(&mut actions);

        let kind = if mv.is_deploy() {
            if self.session.is_none() {
                self.session = Some(DeploySession::new(
                    mv.from,
                    self.turn,
                    opening_stack.unwrap_or_default(),
                    Some(fen_before.clone()),
                ));
            }
            if let Some(session) = self.session.as_mut() {
                session.record(&mv);
            }
            EntryKind::DeployStep
        } else {
            if mv.is_capture() || mv.piece.kind == PieceType::Commander {
                self.halfmove_clock = 0;
            } else {
                self.halfmove_clock = self.halfmove_clock.saturating_add(1);
            }
            if self.turn == Color::Blue {
                self.fullmove_number += 1;
            }
            self.turn = self.turn.opponent();
            EntryKind::Move
        };

        let rep_key = self.repetition_key();
        self.repetition.increment(rep_key);

        self.history.push(HistoryEntry {
            kind,
            mv: Some(mv),
            san,
            actions,
            prev_turn,
            prev_halfmove,
            prev_fullmove,
            prev_session,
            rep_key,
            fen_before,
        });
        self.cache.lock().clear();

        #[cfg(feature = "logging")]
        log::trace!("applied {mv}, hash {:016x}", self.hash());

        // The session commits itself once the origin square empties.
        if let Some(session) = &self.session {
            if self.pos.group_at(session.origin()).is_empty() {
                self.commit_internal();
            }
        }
    }

    /// Sticky promotion: every piece of the mover's color whose capture
    /// range reaches the enemy Commander becomes heroic.
    fn promote_heroes(&mut self, actions: &mut Vec<Action>) {
        let enemy = self.turn.opponent();
        let Some(cmd_sq) = self.pos.commander_square(enemy) else {
            return;
        };
        let mut marks: Vec<(Square, PieceType)> = Vec::new();
        for from in self.pos.pieces(self.turn).iter() {
            let Some(piece) = self.pos.piece_at(from) else {
                continue;
            };
            if piece.heroic {
                continue;
            }
            if movegen::piece_attacks_square(&self.pos, &self.air_defense, from, piece, cmd_sq) {
                marks.push((from, piece.kind));
            }
        }
        if marks.is_empty() {
            return;
        }
        for (square, kind) in marks {
            let action = Action::SetHeroic {
                square,
                kind,
                value: true,
            };
            make_unmake::apply_action(&mut self.pos, &action);
            actions.push(action);
        }
        // Heroic air-defense sources just gained a square of reach.
        self.air_defense = AirDefense::compute(&self.pos);
    }

    /// Undo the most recent history entry (move, deploy sub-move or
    /// session commit). Returns the undone move, or `None` when the entry
    /// was a commit or the history is empty.
    pub fn undo(&mut self) -> Option<Move> {
        let entry = self.history.pop()?;
        self.repetition.decrement(entry.rep_key);
        make_unmake::revert_actions(&mut self.pos, &entry.actions);
        self.turn = entry.prev_turn;
        self.halfmove_clock = entry.prev_halfmove;
        self.fullmove_number = entry.prev_fullmove;
        self.session = entry.prev_session;
        self.air_defense = AirDefense::compute(&self.pos);
        self.cache.lock().clear();
        entry.mv
    }

    // =====================================================================
    // Deploy session control
    // =====================================================================

    /// Open a deploy session at a friendly stack without moving yet.
    pub fn start_deploy(&mut self, square: Square) -> Result<(), DeployError> {
        if let Some(session) = &self.session {
            return Err(DeployError::SessionActive {
                origin: session.origin(),
            });
        }
        let group = self.pos.group_at(square);
        if group.len() < 2 || group[0].color != self.turn {
            return Err(DeployError::NotAStack { square });
        }
        let start_fen = self.fen();
        self.session = Some(DeploySession::new(
            square,
            self.turn,
            group,
            Some(start_fen),
        ));
        self.cache.lock().clear();
        Ok(())
    }

    /// Commit the active session: the turn passes.
    pub fn commit_deploy_session(&mut self) -> Result<(), DeployError> {
        if self.session.is_none() {
            return Err(DeployError::NoActiveSession);
        }
        self.commit_internal();
        Ok(())
    }

    fn commit_internal(&mut self) {
        let session = self.session.take().expect("commit without session");
        let fen_before = fen::render_fen(
            &self.pos,
            self.turn,
            self.halfmove_clock,
            self.fullmove_number,
            Some(&session),
        );
        let prev_turn = self.turn;
        let prev_halfmove = self.halfmove_clock;
        let prev_fullmove = self.fullmove_number;

        if session.any_capture() || session.commander_acted() {
            self.halfmove_clock = 0;
        } else {
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }
        if self.turn == Color::Blue {
            self.fullmove_number += 1;
        }
        self.turn = self.turn.opponent();

        let rep_key = self.repetition_key();
        self.repetition.increment(rep_key);

        self.history.push(HistoryEntry {
            kind: EntryKind::DeployCommit,
            mv: None,
            san: String::new(),
            actions: Vec::new(),
            prev_turn,
            prev_halfmove,
            prev_fullmove,
            prev_session: Some(session),
            rep_key,
            fen_before,
        });
        self.cache.lock().clear();

        #[cfg(feature = "logging")]
        log::debug!("deploy session committed, turn passes to {}", self.turn);
    }

    /// Cancel the active session, restoring the position at session start.
    /// Sessions reconstructed from a loaded FEN carry no history and
    /// cannot be unwound.
    pub fn cancel_deploy_session(&mut self) -> Result<(), DeployError> {
        let session = self.session.as_ref().ok_or(DeployError::NoActiveSession)?;
        let start_fen = session
            .start_fen()
            .ok_or(DeployError::CannotRestore)?
            .to_string();

        while self.session.is_some() {
            match self.history.last() {
                Some(entry) if entry.kind == EntryKind::DeployStep => {
                    self.undo();
                }
                _ => break,
            }
        }
        // An explicitly started session with no sub-moves just evaporates.
        self.session = None;
        self.cache.lock().clear();
        debug_assert_eq!(self.fen(), start_fen, "cancel did not restore the start");
        Ok(())
    }

    // =====================================================================
    // Board editing
    // =====================================================================

    /// Place a piece (with optional cargo) on an empty square. Editing the
    /// board resets history, repetition counts and any deploy session.
    pub fn put(
        &mut self,
        piece: Piece,
        carried: &[Piece],
        square: Square,
    ) -> Result<(), PlacementError> {
        self.pos.place(piece, carried, square)?;
        self.reset_continuity();
        Ok(())
    }

    /// Remove whatever stands on a square. Same continuity reset as `put`.
    pub fn remove(&mut self, square: Square) -> Option<(Piece, Vec<Piece>)> {
        let removed = self.pos.remove(square)?;
        self.reset_continuity();
        Some(removed)
    }

    fn reset_continuity(&mut self) {
        self.history.clear();
        self.session = None;
        self.repetition = RepetitionTable::new();
        self.repetition.set(self.repetition_key(), 1);
        self.air_defense = AirDefense::compute(&self.pos);
        self.cache.lock().clear();
    }

    // =====================================================================
    // Game end
    // =====================================================================

    /// The game's outcome, if it has ended.
    #[must_use]
    pub fn result(&self) -> Option<GameResult> {
        if self.pos.commander_square(self.turn).is_none() {
            return Some(GameResult::Win {
                winner: self.turn.opponent(),
                reason: WinReason::CommanderCaptured,
            });
        }

        // A deploying player can always still commit or cancel, so mate
        // and stalemate are only meaningful between turns.
        if self.session.is_none() && self.legal_moves().is_empty() {
            return Some(if self.in_check() {
                GameResult::Win {
                    winner: self.turn.opponent(),
                    reason: WinReason::Checkmate,
                }
            } else {
                GameResult::Draw {
                    reason: DrawReason::Stalemate,
                }
            });
        }

        if self.halfmove_clock >= 100 {
            return Some(GameResult::Draw {
                reason: DrawReason::FiftyMoveRule,
            });
        }
        if self.repetition.get(self.repetition_key()) >= 3 {
            return Some(GameResult::Draw {
                reason: DrawReason::ThreefoldRepetition,
            });
        }
        None
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.result().is_some()
    }

    #[must_use]
    pub fn is_checkmate(&self) -> bool {
        matches!(
            self.result(),
            Some(GameResult::Win {
                reason: WinReason::Checkmate,
                ..
            })
        )
    }

    #[must_use]
    pub fn is_stalemate(&self) -> bool {
        matches!(
            self.result(),
            Some(GameResult::Draw {
                reason: DrawReason::Stalemate,
            })
        )
    }

    /// How often the current position (including deploy fingerprint) has
    /// occurred.
    #[must_use]
    pub fn repetition_count(&self) -> u32 {
        self.repetition.get(self.repetition_key())
    }

    // =====================================================================
    // History
    // =====================================================================

    /// SAN of every move played, deploy sub-moves included.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .iter()
            .filter(|e| e.mv.is_some())
            .map(|e| e.san.clone())
            .collect()
    }

    /// Full records: move, mover color and position before the move.
    #[must_use]
    pub fn history_verbose(&self) -> Vec<HistoryRecord> {
        self.history
            .iter()
            .map(|e| HistoryRecord {
                san: e.san.clone(),
                mv: e.mv,
                color: e.prev_turn,
                fen_before: e.fen_before.clone(),
            })
            .collect()
    }
}

impl std::str::FromStr for Game {
    type Err = FenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Game::load(s)
    }
}
