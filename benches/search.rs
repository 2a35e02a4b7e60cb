//! Criterion benchmarks of fixed-depth searches.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use plies::games::breakthrough::{self, Breakthrough};
use plies::games::tictactoe::{self, TicTacToe};
use plies::search::minimax::alpha_beta;
use plies::search::time::Deadline;
use plies::{Config, Searcher};

struct Never;

impl Deadline for Never {
    fn expired(&self) -> bool {
        false
    }
}

const POSITIONS: [&str; 3] = [
    "bbbbbbbb/bbbbbbbb/......../......../......../......../wwwwwwww/wwwwwwww w",
    "bbbbbbbb/bb.bbb.b/..b...b./......../...w..../..w..w../ww.w.www/wwwwwwww b",
    "..b..b../.b..bb.b/b......./......../...ww.../.w...w../w.....w./........ w",
];

fn breakthrough_positions() -> Vec<Breakthrough> {
    POSITIONS
        .iter()
        .map(|notation| Breakthrough::from_notation(notation, Config::DEFAULT_SEED).unwrap())
        .collect()
}

fn iterative_deepening(c: &mut Criterion) {
    let mut group = c.benchmark_group("Iterative deepening");
    let positions = breakthrough_positions();
    let _ = group.throughput(Throughput::Elements(positions.len() as u64));
    for depth in [3, 4, 5] {
        let _ = group.bench_with_input(
            BenchmarkId::new("breakthrough", format!("depth {depth}")),
            &depth,
            |b, &depth| {
                b.iter(|| {
                    let mut searcher = Searcher::new(
                        Config {
                            hash_bytes: 4 << 20,
                            ..Config::default()
                        },
                        breakthrough::evaluate,
                    )
                    .unwrap();
                    for position in &positions {
                        let mut position = position.clone();
                        let _ = criterion::black_box(searcher.search_with(
                            &mut position,
                            depth,
                            &Never,
                        ));
                    }
                });
            },
        );
    }
    group.finish();
}

fn solve_tictactoe(c: &mut Criterion) {
    let _ = c.bench_function("tictactoe alpha-beta", |b| {
        b.iter(|| {
            let mut game = TicTacToe::new(0);
            criterion::black_box(alpha_beta(&mut game, &tictactoe::evaluate, 9))
        });
    });
}

criterion_group! {
    name = search;
    config = Criterion::default().sample_size(10);
    targets = iterative_deepening, solve_tictactoe
}
criterion_main!(search);
