//! Move application as a log of atomic actions.
//!
//! Every move lowers to an ordered list of `Remove` / `Place` /
//! `SetHeroic` actions. Undo replays the inverses in reverse order, which
//! restores the position byte-exactly without serializing the board.

use super::position::Position;
use super::stacks;
use super::types::{Move, Piece, PieceType, Square};

/// One atomic board mutation.
#[derive(Clone, Debug, PartialEq)]
pub(crate) enum Action {
    Remove {
        square: Square,
        piece: Piece,
        carried: Vec<Piece>,
    },
    Place {
        square: Square,
        piece: Piece,
        carried: Vec<Piece>,
    },
    SetHeroic {
        square: Square,
        kind: PieceType,
        value: bool,
    },
}

pub(crate) fn apply_action(pos: &mut Position, action: &Action) {
    match action {
        Action::Remove { square, piece, .. } => {
            let removed = pos.remove(*square);
            debug_assert_eq!(
                removed.as_ref().map(|(p, _)| *p),
                Some(*piece),
                "recorded removal does not match the board at {square}"
            );
        }
        Action::Place {
            square,
            piece,
            carried,
        } => {
            pos.place_raw(*piece, carried, *square);
        }
        Action::SetHeroic {
            square,
            kind,
            value,
        } => {
            pos.set_heroic(*square, *kind, *value);
        }
    }
}

pub(crate) fn revert_action(pos: &mut Position, action: &Action) {
    match action {
        Action::Remove {
            square,
            piece,
            carried,
        } => {
            pos.place_raw(*piece, carried, *square);
        }
        Action::Place { square, piece, .. } => {
            let removed = pos.remove(*square);
            debug_assert_eq!(
                removed.as_ref().map(|(p, _)| *p),
                Some(*piece),
                "recorded placement does not match the board at {square}"
            );
        }
        Action::SetHeroic { square, kind, value } => {
            pos.set_heroic(*square, *kind, !*value);
        }
    }
}

pub(crate) fn apply_actions(pos: &mut Position, actions: &[Action]) {
    for action in actions {
        apply_action(pos, action);
    }
}

pub(crate) fn revert_actions(pos: &mut Position, actions: &[Action]) {
    for action in actions.iter().rev() {
        revert_action(pos, action);
    }
}

/// Lower a generated move into its action list against the current board.
///
/// The move must be one the generator produced for this position.
pub(crate) fn lower_move(pos: &Position, mv: &Move) -> Vec<Action> {
    let mut actions = Vec::with_capacity(4);

    if mv.is_deploy() {
        lower_deploy_move(pos, mv, &mut actions);
        return actions;
    }

    let (mover, mover_cargo) = pos
        .stack_at(mv.from)
        .map(|(p, c)| (p, c.to_vec()))
        .or_else(|| pos.piece_at(mv.from).map(|p| (p, Vec::new())))
        .expect("move lowered from empty square");

    if mv.is_combination() {
        let mut mover_group = Vec::with_capacity(1 + mover_cargo.len());
        mover_group.push(mover);
        mover_group.extend_from_slice(&mover_cargo);
        let target_group = pos.group_at(mv.to);
        let (carrier, carried) = stacks::combine(&mover_group, &target_group)
            .expect("combination move with incompatible pieces");
        let (target, target_cargo) = split_group(target_group);

        actions.push(Action::Remove {
            square: mv.from,
            piece: mover,
            carried: mover_cargo,
        });
        actions.push(Action::Remove {
            square: mv.to,
            piece: target,
            carried: target_cargo,
        });
        actions.push(Action::Place {
            square: mv.to,
            piece: carrier,
            carried,
        });
        return actions;
    }

    if mv.is_stay_capture() {
        push_remove(pos, mv.to, &mut actions);
        return actions;
    }

    if mv.is_suicide() {
        push_remove(pos, mv.to, &mut actions);
        actions.push(Action::Remove {
            square: mv.from,
            piece: mover,
            carried: mover_cargo,
        });
        return actions;
    }

    // Quiet move or normal capture: the whole group travels.
    actions.push(Action::Remove {
        square: mv.from,
        piece: mover,
        carried: mover_cargo.clone(),
    });
    if mv.captured.is_some() {
        push_remove(pos, mv.to, &mut actions);
    }
    actions.push(Action::Place {
        square: mv.to,
        piece: mover,
        carried: mover_cargo,
    });
    actions
}

/// Deploy sub-moves split one member out of the origin stack.
fn lower_deploy_move(pos: &Position, mv: &Move, actions: &mut Vec<Action>) {
    let origin_group = pos.group_at(mv.from);
    debug_assert!(!origin_group.is_empty(), "deploy from empty origin");
    let member = *origin_group
        .iter()
        .find(|p| p.kind == mv.piece.kind)
        .expect("deploy mover not present at origin");

    if mv.is_stay_capture() {
        // The member fires without leaving the stack.
        push_remove(pos, mv.to, actions);
        return;
    }

    let remainder: Vec<Piece> = origin_group
        .iter()
        .filter(|p| p.kind != member.kind)
        .copied()
        .collect();

    let (origin_piece, origin_cargo) = split_group(origin_group);
    actions.push(Action::Remove {
        square: mv.from,
        piece: origin_piece,
        carried: origin_cargo,
    });
    if !remainder.is_empty() {
        let (carrier, carried) = stacks::fold_members(&remainder)
            .expect("deploy remainder cannot form a stack");
        actions.push(Action::Place {
            square: mv.from,
            piece: carrier,
            carried,
        });
    }

    if mv.is_suicide() {
        push_remove(pos, mv.to, actions);
        return;
    }

    if mv.is_combination() {
        // Recombine onto an earlier deploy destination; the seated carrier
        // stays the carrier.
        let target_group = pos.group_at(mv.to);
        let (target, mut target_cargo) = split_group(target_group);
        actions.push(Action::Remove {
            square: mv.to,
            piece: target,
            carried: target_cargo.clone(),
        });
        target_cargo.push(member);
        actions.push(Action::Place {
            square: mv.to,
            piece: target,
            carried: target_cargo,
        });
        return;
    }

    if mv.captured.is_some() {
        push_remove(pos, mv.to, actions);
    }
    actions.push(Action::Place {
        square: mv.to,
        piece: member,
        carried: Vec::new(),
    });
}

fn push_remove(pos: &Position, sq: Square, actions: &mut Vec<Action>) {
    let group = pos.group_at(sq);
    let (piece, carried) = split_group(group);
    actions.push(Action::Remove {
        square: sq,
        piece,
        carried,
    });
}

fn split_group(mut group: Vec<Piece>) -> (Piece, Vec<Piece>) {
    debug_assert!(!group.is_empty());
    let piece = group.remove(0);
    (piece, group)
}
