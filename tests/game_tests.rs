use cotulenh_engine::board::prelude::*;
use cotulenh_engine::board::{DrawReason, Modality, WinReason};

fn sq(s: &str) -> Square {
    s.parse().unwrap()
}

#[test]
fn flying_general_ends_the_game() {
    let mut game =
        Game::load("6c4/11/11/11/11/11/11/11/11/11/11/6C4 r - - 0 1").unwrap();

    let mv = game.make_move_san("Cxg12").unwrap();
    assert_eq!(mv.to, sq("g12"));
    assert!(game.is_game_over());
    assert_eq!(
        game.result(),
        Some(GameResult::Win {
            winner: Color::Red,
            reason: WinReason::CommanderCaptured,
        })
    );
    assert!(!game.fen().contains('c'));
}

#[test]
fn deploy_scenario_full_walkthrough() {
    // Red (N F T) stack on c3, commanders tucked away off the file
    let start =
        "5c5/11/11/11/11/11/11/11/11/2(NFT)8/11/4C6 r - - 0 1";
    let mut game = Game::load(start).unwrap();

    game.deploy_move("Nc5").unwrap();
    assert!(game.deploy_session().is_some());
    assert!(game.fen().contains("DEPLOY c3:Nc5,(FT)"), "{}", game.fen());

    game.deploy_move("Fd4").unwrap();
    assert!(game.fen().contains("DEPLOY c3:Nc5,Fd4,T"), "{}", game.fen());

    // Recombine the tank onto the navy; the origin empties and the
    // session commits by itself
    game.deploy_move("Tc5").unwrap();
    assert!(game.deploy_session().is_none());
    assert_eq!(game.turn(), Color::Blue);

    let fen = game.fen();
    assert!(fen.contains("(NT)"), "{fen}");
    assert!(!fen.contains("DEPLOY"), "{fen}");
    assert_eq!(game.piece_at(sq("d4")).unwrap().kind, PieceType::AirForce);
    assert!(game.piece_at(sq("c3")).is_none());

    // Three-stage unwind
    game.undo();
    assert!(game.deploy_session().is_some());
    game.undo();
    assert!(game.fen().contains("DEPLOY c3:Nc5,Fd4,T"), "{}", game.fen());
    game.undo();
    assert!(game.fen().contains("DEPLOY c3:Nc5,(FT)"), "{}", game.fen());
    game.undo();
    assert_eq!(game.fen(), start);
}

#[test]
fn deploy_session_survives_serialization() {
    let start =
        "5c5/11/11/11/11/11/11/11/11/2(NFT)8/11/4C6 r - - 0 1";
    let mut game = Game::load(start).unwrap();
    game.deploy_move("Nc5").unwrap();

    let mid = game.fen();
    let mut resumed = Game::load(&mid).unwrap();
    assert_eq!(resumed.fen(), mid);
    assert_eq!(
        resumed.legal_moves().len(),
        game.legal_moves().len(),
        "loaded session must offer the same sub-moves"
    );

    // Finish the turn in the resumed game
    resumed.deploy_move("Fd4").unwrap();
    resumed.deploy_move("Tc5").unwrap();
    assert_eq!(resumed.turn(), Color::Blue);
}

#[test]
fn repetition_draw_from_the_start() {
    let mut game = Game::new();
    for _ in 0..2 {
        for token in ["Mg6", "mg7", "Mg5", "mg8"] {
            game.make_move_san(token).unwrap();
        }
    }
    assert!(game.is_game_over());
    assert_eq!(
        game.result(),
        Some(GameResult::Draw {
            reason: DrawReason::ThreefoldRepetition,
        })
    );
}

#[test]
fn structured_requests_match_san() {
    let mut a = Game::new();
    let mut b = Game::new();

    a.make_move_san("Tf5").unwrap();
    let req = MoveRequest::new(sq("f4"), sq("f5"));
    b.make_move(&req).unwrap();
    assert_eq!(a.fen(), b.fen());
}

#[test]
fn stay_capture_request() {
    let mut game = Game::load(
        "5c5/11/11/11/11/11/2i8/1N9/11/11/11/4C6 r - - 0 1",
    )
    .unwrap();
    let req = MoveRequest::new(sq("b5"), sq("c6")).modality(Modality::Stay);
    let mv = game.make_move(&req).unwrap();
    assert!(mv.is_stay_capture());
    assert_eq!(game.piece_at(sq("b5")).unwrap().kind, PieceType::Navy);
    assert!(game.piece_at(sq("c6")).is_none());
}

#[test]
fn clone_gives_independent_games() {
    let mut game = Game::new();
    let frozen = game.clone();
    game.make_move_san("Mg6").unwrap();
    assert_ne!(game.fen(), frozen.fen());
    assert_eq!(frozen.fen(), START_FEN);
    assert_eq!(frozen.legal_moves().len(), 115);
}

#[test]
fn heroic_promotion_shows_in_fen() {
    let mut game = Game::load(
        "5c5/11/4T6/11/11/11/11/11/11/11/11/7C3 r - - 0 1",
    )
    .unwrap();
    // Tf10 brings the blue commander on f12 into the tank's gun line
    let mv = game.make_move_san("Tf10").unwrap();
    assert!(!mv.piece.heroic);
    let tank = game.piece_at(sq("f10")).unwrap();
    assert!(tank.heroic);
    assert!(game.fen().contains("+T"), "{}", game.fen());

    game.undo().unwrap();
    assert!(!game.fen().contains('+'));
}
