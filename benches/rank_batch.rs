use std::fmt::Display;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use rand::{rngs::SmallRng, Rng, SeedableRng};

use leaderboard_service::{
    constants::{MAX_RATING, MIN_RATING},
    model::RatingHistogram
};

#[derive(Debug, Clone)]
struct TestInput {
    users: usize,
    page: Vec<i32>
}

impl Display for TestInput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Users: {}, page: {}", self.users, self.page.len())
    }
}

/// The naive alternative to the batch path: one tail scan per rating.
fn rank_each_tail_scan(hist: &RatingHistogram, page: &[i32]) -> Vec<i64> {
    page.iter()
        .map(|&rating| hist.rank_of(rating).expect("rating in range"))
        .collect()
}

pub fn criterion_benchmark(c: &mut Criterion) {
    const USERS: usize = 100_000;
    const PAGE_SIZE: usize = 100;

    let mut rng = SmallRng::seed_from_u64(727);
    let mut hist = RatingHistogram::new();
    let mut page = Vec::with_capacity(PAGE_SIZE);

    for i in 0..USERS {
        let rating = rng.gen_range(MIN_RATING..=MAX_RATING);
        hist.bump(rating, 1).expect("rating in range");

        if i < PAGE_SIZE {
            page.push(rating);
        }
    }

    let input = TestInput { users: USERS, page };

    c.bench_with_input(
        BenchmarkId::new("rank_batch_suffix_sum", input.clone()),
        &input,
        |b, s| b.iter(|| hist.rank_batch(&s.page).expect("ratings in range"))
    );

    c.bench_with_input(
        BenchmarkId::new("rank_each_tail_scan", input.clone()),
        &input,
        |b, s| b.iter(|| rank_each_tail_scan(&hist, &s.page))
    );
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);
