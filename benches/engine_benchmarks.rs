//! Benchmarks for engine performance.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use cotulenh_engine::board::{Game, MoveFilter};

fn bench_movegen(c: &mut Criterion) {
    let mut group = c.benchmark_group("movegen");

    let startpos = Game::new();
    group.bench_function("startpos_legal", |b| {
        b.iter(|| black_box(startpos.moves(&MoveFilter::default())))
    });
    group.bench_function("startpos_pseudo", |b| {
        b.iter(|| {
            black_box(startpos.moves(&MoveFilter {
                legal: false,
                ..MoveFilter::default()
            }))
        })
    });

    // A middlegame with a stack and active air defense on both sides
    let middlegame = Game::load(
        "6c4/1n2fh1hf2/3a2s2a1/2n1gt1tg2/2ie2m2ei/5T5/2(NFT)8/2IE2M2EI/2N1G2TG2/3A2S2A1/1N2FH1HF2/6C4 r - - 4 11",
    )
    .unwrap();
    group.bench_function("middlegame_legal", |b| {
        b.iter(|| black_box(middlegame.moves(&MoveFilter::default())))
    });

    group.finish();
}

fn bench_apply_undo(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_undo");

    group.bench_function("quiet_move", |b| {
        let mut game = Game::new();
        let mv = game.parse_san("Tf5").unwrap();
        b.iter(|| {
            game.play(&mv).unwrap();
            game.undo();
        })
    });

    group.finish();
}

fn bench_playout(c: &mut Criterion) {
    let mut group = c.benchmark_group("playout");

    for plies in [4usize, 8, 16] {
        group.bench_with_input(BenchmarkId::new("shuffle", plies), &plies, |b, &plies| {
            b.iter(|| {
                let mut game = Game::new();
                for i in 0..plies {
                    let token = match i % 4 {
                        0 => "Mg6",
                        1 => "mg7",
                        2 => "Mg5",
                        _ => "mg8",
                    };
                    if game.is_game_over() {
                        break;
                    }
                    game.make_move_san(black_box(token)).unwrap();
                }
                black_box(game.fen())
            })
        });
    }

    group.finish();
}

fn bench_fen(c: &mut Criterion) {
    let mut group = c.benchmark_group("fen");

    group.bench_function("parse_startpos", |b| {
        b.iter(|| black_box(Game::load(cotulenh_engine::board::START_FEN).unwrap()))
    });

    let game = Game::new();
    group.bench_function("render_startpos", |b| b.iter(|| black_box(game.fen())));

    group.finish();
}

criterion_group!(benches, bench_movegen, bench_apply_undo, bench_playout, bench_fen);
criterion_main!(benches);
