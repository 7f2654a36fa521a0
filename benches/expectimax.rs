use advisor_2048::engine::{Board, Move};
use advisor_2048::expectimax::{Expectimax, ExpectimaxParallel, SearchConfig};
use advisor_2048::session::{GameSession, RandomSpawns};
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rayon::ThreadPoolBuilder;
use std::hint::black_box;

fn corpus() -> Vec<Board> {
    let mut game = GameSession::new(RandomSpawns::seeded(7777));
    let mut boards = vec![game.board()];
    let seq = [Move::Left, Move::Up, Move::Right, Move::Down];
    for i in 0..32 {
        game.play(seq[i % seq.len()]);
        boards.push(game.board());
    }
    boards
}

fn bench_branch_evals(c: &mut Criterion) {
    // Pin a small pool for stability
    let pool = ThreadPoolBuilder::new().num_threads(4).build().unwrap();
    let boards = corpus();
    let seq = Expectimax::new();
    let par = ExpectimaxParallel::new();
    let cached = Expectimax::with_config(SearchConfig { cache_enabled: true, ..Default::default() });

    let mut group = c.benchmark_group("expectimax/branch_evals");
    for depth in [1u32, 2, 3] {
        group.bench_with_input(BenchmarkId::new("seq", depth), &depth, |bch, &d| {
            bch.iter(|| {
                let mut acc = 0.0;
                for &bd in &boards {
                    let (branches, _) = seq.branch_evals(bd, d);
                    for be in branches { if be.legal { acc += be.ev; } }
                }
                black_box(acc)
            })
        });
        group.bench_with_input(BenchmarkId::new("seq_cached", depth), &depth, |bch, &d| {
            bch.iter(|| {
                let mut acc = 0.0;
                for &bd in &boards { acc += cached.state_value(bd, d); }
                black_box(acc)
            })
        });
        group.bench_with_input(BenchmarkId::new("par", depth), &depth, |bch, &d| {
            bch.iter(|| pool.install(|| {
                let mut acc = 0.0;
                for &bd in &boards {
                    let (branches, _) = par.branch_evals(bd, d);
                    for be in branches { if be.legal { acc += be.ev; } }
                }
                black_box(acc)
            }))
        });
    }
    group.finish();
}

fn bench_selfplay(c: &mut Criterion) {
    let par = ExpectimaxParallel::new();
    c.bench_function("e2e_par/64_moves", |bch| {
        bch.iter(|| {
            let mut game = GameSession::new(RandomSpawns::seeded(13));
            let mut steps = 0;
            while steps < 64 && !game.is_game_over() {
                let Some(dir) = par.best_move(game.board(), 2) else { break };
                game.play(dir);
                steps += 1;
            }
            black_box((game.score(), steps))
        })
    });
}

criterion_group!(expectimax, bench_branch_evals, bench_selfplay);
criterion_main!(expectimax);
