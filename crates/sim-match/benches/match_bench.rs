use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use sim_match::squad::generate_team;

fn build_league(n_teams: usize, rng: &mut ChaCha8Rng) -> Vec<sim_core::Team> {
    (0..n_teams)
        .map(|i| {
            let base = 70 + (i % 20) as u8;
            generate_team(&format!("T{i}"), &format!("Team {i}"), "Bench", base, base, base, rng)
        })
        .collect()
}

fn bench_single_match(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(42);
    let league = build_league(2, &mut rng);
    c.bench_function("simulate_match", |b| {
        b.iter(|| {
            let m = sim_match::simulate_match(&league[0], &league[1], 1, None, &mut rng);
            black_box(m)
        })
    });
}

fn bench_round(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let league = build_league(20, &mut rng);
    c.bench_function("20 teams x 38 rounds", |b| {
        b.iter(|| {
            for _ in 0..38 {
                for pair in league.chunks(2) {
                    let _ = black_box(sim_match::simulate_match(&pair[0], &pair[1], 1, None, &mut rng));
                }
            }
        })
    });
}

criterion_group!(benches, bench_single_match, bench_round);
criterion_main!(benches);
