//! Heroic promotion, flying-general exposure and other rule corners.

use crate::board::debug::audit_invariants;
use crate::board::{
    Color, Game, Modality, MoveFilter, MoveRequest, Piece, PieceType, PositionBuilder, Square,
};

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

fn red(kind: PieceType) -> Piece {
    Piece::new(kind, Color::Red)
}

fn blue(kind: PieceType) -> Piece {
    Piece::new(kind, Color::Blue)
}

#[test]
fn heroic_promotion_on_check() {
    // Tank steps to e5 and its gun line reaches the commander on e7
    let mut game = PositionBuilder::new()
        .piece("e4", red(PieceType::Tank))
        .piece("h1", red(PieceType::Commander))
        .piece("e7", blue(PieceType::Commander))
        .build()
        .unwrap();

    let mv = game.make_move_san("Te5").unwrap();
    assert_eq!(mv.to, sq("e5"));

    let tank = game.position().piece_at(sq("e5")).unwrap();
    assert!(tank.heroic, "tank should promote on giving check");
    assert!(game.fen().contains("+T"), "{}", game.fen());
    assert!(game.in_check()); // Blue to move, commander attacked
    audit_invariants(game.position());

    // Undo clears the flag again
    game.undo().unwrap();
    let tank = game.position().piece_at(sq("e4")).unwrap();
    assert!(!tank.heroic);
    assert!(!game.fen().contains('+'));
    audit_invariants(game.position());
}

#[test]
fn heroic_promotion_marks_every_attacker() {
    // The tank move discovers the artillery's line as well
    let mut game = PositionBuilder::new()
        .piece("e5", red(PieceType::Tank))
        .piece("e4", red(PieceType::Artillery))
        .piece("h1", red(PieceType::Commander))
        .piece("e7", blue(PieceType::Commander))
        .build()
        .unwrap();

    game.make_move_san("Tf5").unwrap();
    // Artillery now sees e7 at range 3 (blockers would not even matter)
    assert!(game.position().piece_at(sq("e4")).unwrap().heroic);
    // The tank left the file and gained nothing
    assert!(!game.position().piece_at(sq("f5")).unwrap().heroic);
}

#[test]
fn heroic_is_sticky() {
    let mut game = PositionBuilder::new()
        .piece("e4", red(PieceType::Tank))
        .piece("h1", red(PieceType::Commander))
        .piece("e7", blue(PieceType::Commander))
        .piece("k12", blue(PieceType::Headquarter))
        .build()
        .unwrap();

    game.make_move_san("Te5").unwrap();
    assert!(game.position().piece_at(sq("e5")).unwrap().heroic);

    // Blue steps aside; the tank stays heroic
    game.make_move_san("cd7").unwrap();
    let tank = game.position().piece_at(sq("e5")).unwrap();
    assert!(tank.heroic);
}

#[test]
fn moves_that_expose_the_commander_are_illegal() {
    // The red tank on the g-file is the only thing between the commanders
    let game = PositionBuilder::new()
        .piece("g1", red(PieceType::Commander))
        .piece("g12", blue(PieceType::Commander))
        .piece("g5", red(PieceType::Tank))
        .build()
        .unwrap();

    let tank_moves = game.moves(&MoveFilter::square(sq("g5")));
    // Along the file is fine, off the file is flying-general exposure
    assert!(tank_moves.iter().all(|m| m.to.file() == 6));
    assert!(!tank_moves.is_empty());
}

#[test]
fn commander_cannot_be_left_in_check() {
    // Blue artillery pins the file: the tank may not wander off
    let game = PositionBuilder::new()
        .piece("g1", red(PieceType::Commander))
        .piece("g4", red(PieceType::Tank))
        .piece("g7", blue(PieceType::Artillery))
        .piece("a12", blue(PieceType::Commander))
        .build()
        .unwrap();

    // Artillery ignores blockers, so even staying on the file is check;
    // the only relief is capturing or blocking out of range... range 3
    // from g7 reaches g4, not g1. The tank is NOT pinned here.
    let moves = game.legal_moves();
    assert!(!moves.is_empty());

    // Put the artillery in range instead
    let game = PositionBuilder::new()
        .piece("g1", red(PieceType::Commander))
        .piece("g4", red(PieceType::Tank))
        .piece("g3", blue(PieceType::Infantry))
        .piece("a12", blue(PieceType::Commander))
        .build()
        .unwrap();
    // Blue infantry attacks g2 and g4, not g1; red commander may not
    // step to g2
    let commander_moves = game.moves(&MoveFilter::square(sq("g1")));
    assert!(!commander_moves.iter().any(|m| m.to == sq("g2")));
}

#[test]
fn suicide_with_commander_aboard_is_illegal() {
    // The air force carries the commander; a kamikaze would lose it
    let game = PositionBuilder::new()
        .stack("c5", red(PieceType::AirForce), &[red(PieceType::Commander)])
        .piece("f8", blue(PieceType::AntiAir))
        .piece("h8", blue(PieceType::AntiAir))
        .piece("g12", blue(PieceType::Commander))
        .build()
        .unwrap();
    let moves = game.legal_moves();
    assert!(
        !moves.iter().any(|m| m.is_suicide() && !m.is_deploy()),
        "whole-stack kamikaze would sacrifice the commander"
    );
}

#[test]
fn structured_move_requests() {
    let mut game = PositionBuilder::new()
        .piece("f4", red(PieceType::AirForce))
        .piece("f8", blue(PieceType::Infantry))
        .piece("h1", red(PieceType::Commander))
        .piece("a12", blue(PieceType::Commander))
        .build()
        .unwrap();

    // Without a modality the normal/stay pair is ambiguous
    let ambiguous = MoveRequest::new(sq("f4"), sq("f8"));
    assert!(game.make_move(&ambiguous).is_err());

    let stay = MoveRequest::new(sq("f4"), sq("f8")).modality(Modality::Stay);
    let mv = game.make_move(&stay).unwrap();
    assert!(mv.is_stay_capture());
    assert_eq!(game.position().piece_at(sq("f4")).unwrap().kind, PieceType::AirForce);
    assert!(game.position().is_empty_square(sq("f8")));
}

#[test]
fn terrain_forced_stay_capture_application() {
    // Scenario: navy guns down the infantry without leaving b6
    let mut game = PositionBuilder::new()
        .piece("b6", red(PieceType::Navy))
        .piece("c6", blue(PieceType::Infantry))
        .piece("h1", red(PieceType::Commander))
        .piece("a12", blue(PieceType::Commander))
        .build()
        .unwrap();

    game.make_move_san("N_c6").unwrap();
    assert_eq!(game.position().piece_at(sq("b6")).unwrap().kind, PieceType::Navy);
    assert!(game.position().is_empty_square(sq("c6")));
    assert_eq!(game.halfmove_clock(), 0);
    audit_invariants(game.position());
}

#[test]
fn put_and_remove_reset_continuity() {
    let mut game = Game::new();
    game.make_move_san("Mg6").unwrap();
    assert_eq!(game.history().len(), 1);

    game.put(red(PieceType::Infantry), &[], sq("f6")).unwrap();
    assert!(game.history().is_empty());
    assert_eq!(game.repetition_count(), 1);

    let (piece, carried) = game.remove(sq("f6")).unwrap();
    assert_eq!(piece.kind, PieceType::Infantry);
    assert!(carried.is_empty());
    assert!(game.position().is_empty_square(sq("f6")));
}

#[test]
fn captured_stack_dies_whole() {
    let mut game = PositionBuilder::new()
        .stack("c6", blue(PieceType::Navy), &[blue(PieceType::Tank)])
        .piece("c3", red(PieceType::Navy))
        .piece("h1", red(PieceType::Commander))
        .piece("a12", blue(PieceType::Commander))
        .build()
        .unwrap();

    // Torpedo at range 3 removes carrier and cargo together
    game.make_move_san("Nxc6").unwrap();
    assert_eq!(game.position().piece_at(sq("c6")).unwrap().color, Color::Red);
    assert_eq!(game.position().pieces(Color::Blue).popcount(), 1);
    audit_invariants(game.position());

    // And undo resurrects the whole stack
    game.undo().unwrap();
    let (carrier, carried) = game.position().stack_at(sq("c6")).unwrap();
    assert_eq!(carrier.kind, PieceType::Navy);
    assert_eq!(carried[0].kind, PieceType::Tank);
    audit_invariants(game.position());
}
