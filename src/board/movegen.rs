//! Pseudo-legal move generation and attack queries.
//!
//! Moves are generated by walking rays square by square; each class brings
//! its own directions, ranges and blocker rules. Legality filtering
//! (commander safety and the flying-general exposure) is the game
//! controller's job.

use super::air_defense::AirDefense;
use super::position::Position;
use super::stacks;
use super::terrain::{terrain_ok, ALL_DIRECTIONS, DIAGONAL, ORTHOGONAL, WATER, WATER_ONLY};
use super::types::{Color, Move, MoveFlags, MoveList, Piece, PieceType, Square};

/// How a class's capture lines interact with intervening pieces.
#[derive(Clone, Copy, PartialEq, Eq)]
enum CaptureBlockers {
    /// Capture line must be clear.
    Blocked,
    /// May ignore exactly one intervening piece (tank shoot-over).
    ShootOver,
    /// Intervening pieces are irrelevant (indirect fire).
    Ignore,
}

fn capture_blockers(kind: PieceType) -> CaptureBlockers {
    match kind {
        PieceType::Tank => CaptureBlockers::ShootOver,
        PieceType::Artillery | PieceType::Missile | PieceType::AirForce | PieceType::Navy => {
            CaptureBlockers::Ignore
        }
        _ => CaptureBlockers::Blocked,
    }
}

/// Directions plus ranges for one slice of a class's movement profile.
/// The missile is asymmetric, so a profile may have two slices.
#[derive(Clone, Copy)]
struct Reach {
    dirs: &'static [(i32, i32)],
    move_range: usize,
    capture_range: usize,
}

const COMMANDER_SLIDE: usize = usize::MAX;

fn one(dirs: &'static [(i32, i32)], move_range: usize, capture_range: usize) -> [Option<Reach>; 2] {
    [
        Some(Reach {
            dirs,
            move_range,
            capture_range,
        }),
        None,
    ]
}

fn reaches(kind: PieceType, heroic: bool) -> [Option<Reach>; 2] {
    use PieceType::*;
    match (kind, heroic) {
        (Infantry | Engineer | AntiAir, false) => one(&ORTHOGONAL, 1, 1),
        (Infantry | Engineer | AntiAir, true) => one(&ALL_DIRECTIONS, 2, 2),
        (Militia, false) => one(&ALL_DIRECTIONS, 1, 1),
        (Militia, true) => one(&ALL_DIRECTIONS, 2, 2),
        (Tank, false) => one(&ORTHOGONAL, 2, 2),
        (Tank, true) => one(&ALL_DIRECTIONS, 3, 3),
        (Artillery, false) => one(&ALL_DIRECTIONS, 3, 3),
        (Artillery, true) => one(&ALL_DIRECTIONS, 4, 4),
        (Missile, false) => [
            Some(Reach {
                dirs: &ORTHOGONAL,
                move_range: 2,
                capture_range: 2,
            }),
            Some(Reach {
                dirs: &DIAGONAL,
                move_range: 1,
                capture_range: 1,
            }),
        ],
        (Missile, true) => [
            Some(Reach {
                dirs: &ORTHOGONAL,
                move_range: 3,
                capture_range: 3,
            }),
            Some(Reach {
                dirs: &DIAGONAL,
                move_range: 2,
                capture_range: 2,
            }),
        ],
        (AirForce, false) => one(&ALL_DIRECTIONS, 4, 4),
        (AirForce, true) => one(&ALL_DIRECTIONS, 5, 5),
        (Navy, false) => one(&ALL_DIRECTIONS, 4, 4),
        (Navy, true) => one(&ALL_DIRECTIONS, 5, 5),
        (Commander, false) => one(&ORTHOGONAL, COMMANDER_SLIDE, 1),
        (Commander, true) => [
            Some(Reach {
                dirs: &ORTHOGONAL,
                move_range: COMMANDER_SLIDE,
                capture_range: 1,
            }),
            Some(Reach {
                dirs: &DIAGONAL,
                move_range: 1,
                capture_range: 1,
            }),
        ],
        (Headquarter, false) => [None, None],
        (Headquarter, true) => one(&ALL_DIRECTIONS, 1, 1),
    }
}

/// The navy fires two weapons: torpedoes against other navies and its gun
/// against everything else.
fn navy_capture_range(heroic: bool, target: PieceType) -> usize {
    match (target == PieceType::Navy, heroic) {
        (true, false) => 4,
        (true, true) => 5,
        (false, false) => 3,
        (false, true) => 4,
    }
}

/// Restrictions that apply while a deploy session is running.
pub(crate) struct DeployContext<'a> {
    /// Squares deployed to earlier in the session; the only legal
    /// combination targets for remaining members.
    pub recombine_squares: &'a [Square],
}

/// Generate all pseudo-legal moves for the side to move.
#[must_use]
pub(crate) fn pseudo_legal(pos: &Position, ad: &AirDefense, side: Color) -> MoveList {
    let mut out = MoveList::new();
    for from in pos.pieces(side).iter() {
        let Some(mover) = pos.piece_at(from) else {
            continue;
        };
        let cargo = pos.carried_at(from);
        moves_for_mover(pos, ad, from, mover, cargo, None, &mut out);
    }
    out
}

/// Generate pseudo-legal moves for one mover standing on (or deploying
/// from) `from`.
pub(crate) fn moves_for_mover(
    pos: &Position,
    ad: &AirDefense,
    from: Square,
    mover: Piece,
    mover_cargo: &[Piece],
    deploy: Option<&DeployContext>,
    out: &mut MoveList,
) {
    for reach in reaches(mover.kind, mover.heroic).into_iter().flatten() {
        for &dir in reach.dirs {
            slide_dir(pos, ad, from, mover, mover_cargo, dir, reach, deploy, out);
        }
    }
    if mover.kind == PieceType::Commander {
        flying_general(pos, from, mover, deploy, out);
    }
}

#[allow(clippy::too_many_arguments)]
fn slide_dir(
    pos: &Position,
    ad: &AirDefense,
    from: Square,
    mover: Piece,
    mover_cargo: &[Piece],
    dir: (i32, i32),
    reach: Reach,
    deploy: Option<&DeployContext>,
    out: &mut MoveList,
) {
    let is_air = mover.kind == PieceType::AirForce;
    let is_navy = mover.kind == PieceType::Navy;
    let enemy = mover.color.opponent();
    let blocker_rule = capture_blockers(mover.kind);
    let max_range = if reach.move_range == COMMANDER_SLIDE {
        usize::MAX
    } else {
        reach.move_range.max(reach.capture_range)
    };

    let mut blockers = 0usize;
    let mut sail_broken = false;
    let mut sq = from;
    let mut step = 0usize;

    while step < max_range {
        step += 1;
        sq = match sq.offset(dir.0, dir.1) {
            Some(next) => next,
            None => return,
        };

        // A hostile air-defense zone is a wall for the air force: no
        // landing beyond it, no flying through it, kamikaze into it.
        if is_air && ad.is_defended(sq, enemy) {
            if let Some(target) = pos.piece_at(sq) {
                if target.color == enemy && step <= reach.capture_range {
                    out.push(deploy_flagged(
                        Move::capture(from, sq, mover, target, MoveFlags::SUICIDE_CAPTURE),
                        deploy,
                    ));
                }
            }
            return;
        }

        if is_navy && !WATER.contains(sq) {
            sail_broken = true;
        }

        match pos.piece_at(sq) {
            None => {
                let movement_clear = is_air || blockers == 0;
                if step <= reach.move_range
                    && movement_clear
                    && !sail_broken
                    && terrain_ok(mover.kind, sq)
                {
                    out.push(deploy_flagged(Move::quiet(from, sq, mover), deploy));
                }
            }
            Some(other) if other.color == mover.color => {
                let movement_clear = is_air || blockers == 0;
                if step <= reach.move_range && movement_clear && !sail_broken {
                    push_combination(pos, from, sq, mover, mover_cargo, other, deploy, out);
                }
                blockers += 1;
            }
            Some(target) => {
                let range = if is_navy {
                    navy_capture_range(mover.heroic, target.kind)
                } else {
                    reach.capture_range
                };
                let line_ok = match blocker_rule {
                    CaptureBlockers::Blocked => blockers == 0,
                    CaptureBlockers::ShootOver => blockers <= 1,
                    CaptureBlockers::Ignore => true,
                };
                if step <= range && line_ok {
                    push_captures(from, sq, mover, target, ad, deploy, out);
                }
                blockers += 1;
            }
        }

        // Stop once no further square in this direction can matter.
        let done = match blocker_rule {
            CaptureBlockers::Blocked => blockers >= 1,
            CaptureBlockers::ShootOver => blockers >= 2,
            CaptureBlockers::Ignore => false,
        };
        if done && !is_air {
            return;
        }
    }
}

/// Emit the capture(s) of `target` in the applicable modalities.
fn push_captures(
    from: Square,
    to: Square,
    mover: Piece,
    target: Piece,
    _ad: &AirDefense,
    deploy: Option<&DeployContext>,
    out: &mut MoveList,
) {
    match mover.kind {
        PieceType::AirForce => {
            // Defended targets were already turned into kamikazes upstream.
            if target.kind == PieceType::Navy && WATER_ONLY.contains(to) {
                out.push(deploy_flagged(
                    Move::capture(from, to, mover, target, MoveFlags::STAY_CAPTURE),
                    deploy,
                ));
            } else {
                out.push(deploy_flagged(
                    Move::capture(from, to, mover, target, MoveFlags::CAPTURE),
                    deploy,
                ));
                // Outside a deploy the pilot may also strike and return.
                if deploy.is_none() {
                    out.push(Move::capture(
                        from,
                        to,
                        mover,
                        target,
                        MoveFlags::STAY_CAPTURE,
                    ));
                }
            }
        }
        PieceType::Navy => {
            let flags = if target.kind == PieceType::Navy {
                MoveFlags::CAPTURE
            } else {
                MoveFlags::STAY_CAPTURE
            };
            out.push(deploy_flagged(
                Move::capture(from, to, mover, target, flags),
                deploy,
            ));
        }
        _ => {
            let flags = if terrain_ok(mover.kind, to) {
                MoveFlags::CAPTURE
            } else {
                MoveFlags::STAY_CAPTURE
            };
            out.push(deploy_flagged(
                Move::capture(from, to, mover, target, flags),
                deploy,
            ));
        }
    }
}

/// Emit a combination move onto a friendly square when the composition
/// table allows it.
#[allow(clippy::too_many_arguments)]
fn push_combination(
    pos: &Position,
    from: Square,
    to: Square,
    mover: Piece,
    mover_cargo: &[Piece],
    target: Piece,
    deploy: Option<&DeployContext>,
    out: &mut MoveList,
) {
    match deploy {
        None => {
            let mut mover_group = Vec::with_capacity(1 + mover_cargo.len());
            mover_group.push(mover);
            mover_group.extend_from_slice(mover_cargo);
            let target_group = pos.group_at(to);
            let Some((carrier, _)) = stacks::combine(&mover_group, &target_group) else {
                return;
            };
            if terrain_ok(carrier.kind, to) {
                out.push(Move::combination(from, to, mover, target));
            }
        }
        Some(ctx) => {
            // During a session a member may only recombine onto squares the
            // session already deployed to, and the carrier seated there
            // stays the carrier.
            if !ctx.recombine_squares.contains(&to) {
                return;
            }
            let mut carried: Vec<Piece> = pos.carried_at(to).to_vec();
            carried.push(mover);
            if stacks::validate_stack(target, &carried).is_err() {
                return;
            }
            out.push(Move::combination(from, to, mover, target).into_deploy());
        }
    }
}

fn deploy_flagged(mv: Move, deploy: Option<&DeployContext>) -> Move {
    if deploy.is_some() {
        mv.into_deploy()
    } else {
        mv
    }
}

/// The flying-general capture: the Commander takes the enemy Commander
/// along a clear orthogonal line at any distance.
fn flying_general(
    pos: &Position,
    from: Square,
    mover: Piece,
    deploy: Option<&DeployContext>,
    out: &mut MoveList,
) {
    let enemy = mover.color.opponent();
    let Some(target_sq) = pos.commander_square(enemy) else {
        return;
    };
    // A Commander riding inside a stack is shielded by its carrier.
    if !pos.pieces_of(enemy, PieceType::Commander).contains(target_sq) {
        return;
    }
    if !from.orthogonal_to(target_sq) || from == target_sq {
        return;
    }
    if from.distance(target_sq) <= 1 {
        return; // already covered by the normal range-1 capture
    }
    let dr = (target_sq.rank() as i32 - from.rank() as i32).signum();
    let df = (target_sq.file() as i32 - from.file() as i32).signum();
    let mut sq = from;
    loop {
        sq = match sq.offset(dr, df) {
            Some(next) => next,
            None => return,
        };
        if sq == target_sq {
            break;
        }
        if !pos.is_empty_square(sq) {
            return;
        }
    }
    let target = pos
        .piece_at(target_sq)
        .expect("commander cache points at empty square");
    out.push(deploy_flagged(
        Move::capture(from, target_sq, mover, target, MoveFlags::CAPTURE),
        deploy,
    ));
}

/// Can any piece of `by` capture `target_sq` in some modality?
///
/// Mirrors the generator's capture rules; used for commander safety and
/// heroic promotion. The flying-general line is handled separately by the
/// facing check.
#[must_use]
pub(crate) fn square_attacked_by(
    pos: &Position,
    ad: &AirDefense,
    target_sq: Square,
    by: Color,
) -> bool {
    for from in pos.pieces(by).iter() {
        let Some(attacker) = pos.piece_at(from) else {
            continue;
        };
        if piece_attacks_square(pos, ad, from, attacker, target_sq) {
            return true;
        }
    }
    false
}

/// Capture reach of a single attacker against a single square.
pub(crate) fn piece_attacks_square(
    pos: &Position,
    ad: &AirDefense,
    from: Square,
    attacker: Piece,
    target_sq: Square,
) -> bool {
    if from == target_sq {
        return false;
    }
    let dr = (target_sq.rank() as i32 - from.rank() as i32).signum();
    let df = (target_sq.file() as i32 - from.file() as i32).signum();
    let on_ortho = from.orthogonal_to(target_sq);
    let on_diag = (target_sq.rank() as i32 - from.rank() as i32).abs()
        == (target_sq.file() as i32 - from.file() as i32).abs();
    if !on_ortho && !on_diag {
        return false;
    }
    let dist = from.distance(target_sq);

    let mut range = 0usize;
    for reach in reaches(attacker.kind, attacker.heroic).into_iter().flatten() {
        if reach.dirs.iter().any(|&(r, f)| r == dr && f == df) {
            range = range.max(reach.capture_range);
        }
    }
    if attacker.kind == PieceType::Navy && range > 0 {
        if let Some(target) = pos.piece_at(target_sq) {
            range = navy_capture_range(attacker.heroic, target.kind);
        }
    }
    if range == 0 || dist > range {
        return false;
    }

    // Count pieces strictly between; the air force additionally may not
    // fly through a hostile air-defense square.
    let enemy_of_attacker = attacker.color.opponent();
    let mut blockers = 0usize;
    let mut sq = from;
    loop {
        sq = match sq.offset(dr, df) {
            Some(next) => next,
            None => return false,
        };
        if sq == target_sq {
            break;
        }
        if attacker.kind == PieceType::AirForce && ad.is_defended(sq, enemy_of_attacker) {
            return false;
        }
        if !pos.is_empty_square(sq) {
            blockers += 1;
        }
    }

    match capture_blockers(attacker.kind) {
        CaptureBlockers::Blocked => blockers == 0,
        CaptureBlockers::ShootOver => blockers <= 1,
        CaptureBlockers::Ignore => true,
    }
}

/// True when both Commanders stand exposed on a clear shared rank or file.
#[must_use]
pub(crate) fn commanders_facing(pos: &Position) -> bool {
    let (Some(red_sq), Some(blue_sq)) = (
        pos.commander_square(Color::Red),
        pos.commander_square(Color::Blue),
    ) else {
        return false;
    };
    // Shielded commanders (riding inside a stack) do not face.
    if !pos.pieces_of(Color::Red, PieceType::Commander).contains(red_sq)
        || !pos
            .pieces_of(Color::Blue, PieceType::Commander)
            .contains(blue_sq)
    {
        return false;
    }
    if !red_sq.orthogonal_to(blue_sq) {
        return false;
    }
    let dr = (blue_sq.rank() as i32 - red_sq.rank() as i32).signum();
    let df = (blue_sq.file() as i32 - red_sq.file() as i32).signum();
    let mut sq = red_sq;
    loop {
        sq = match sq.offset(dr, df) {
            Some(next) => next,
            None => return false,
        };
        if sq == blue_sq {
            return true;
        }
        if !pos.is_empty_square(sq) {
            return false;
        }
    }
}
