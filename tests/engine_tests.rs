mod common;

use std::{collections::HashMap, sync::Arc, thread};

use common::init_test_env;
use leaderboard_service::{
    model::RankingEngine,
    utils::test_utils::MemoryStore
};

fn ready_engine(ratings: &[i32]) -> Arc<RankingEngine> {
    let mut counts: HashMap<i32, i64> = HashMap::new();
    for &rating in ratings {
        *counts.entry(rating).or_insert(0) += 1;
    }

    let engine = Arc::new(RankingEngine::new());
    engine.initialize_from_counts(&counts).expect("seed ratings must be in range");

    engine
}

#[tokio::test]
async fn test_initialize_from_store() {
    init_test_env();

    let store = MemoryStore::with_ratings(&[5000, 4952, 4952, 4900]);
    let engine = RankingEngine::new();
    engine
        .initialize_from_store(&store)
        .await
        .expect("store ratings must be in range");

    assert_eq!(
        engine.get_rank_batch(&[5000, 4952, 4900]).expect("engine ready"),
        vec![1, 2, 4]
    );

    let stats = engine.stats().expect("engine ready");
    assert_eq!(stats.total_users, 4);
    assert_eq!(stats.unique_ratings, 3);
}

/// Writers each shuttle their own user back and forth while readers keep
/// querying. Once every round trip has completed the histogram must be
/// exactly what it started as.
#[test]
fn test_concurrent_round_trips_preserve_histogram() {
    init_test_env();

    const WRITERS: usize = 8;
    const ITERATIONS: usize = 200;

    let seed: Vec<i32> = (0..WRITERS as i32).map(|i| 1000 + i).collect();
    let engine = ready_engine(&seed);
    let before = engine.get_rank_batch(&seed).expect("engine ready");

    let mut handles = Vec::new();

    for i in 0..WRITERS {
        let engine = Arc::clone(&engine);
        let from = 1000 + i as i32;
        let to = 3000 + i as i32;

        handles.push(thread::spawn(move || {
            for _ in 0..ITERATIONS {
                engine.update_rating(from, to).expect("forward transition");
                engine.update_rating(to, from).expect("reverse transition");
            }
        }));
    }

    for _ in 0..4 {
        let engine = Arc::clone(&engine);
        let watched = seed.clone();

        handles.push(thread::spawn(move || {
            for _ in 0..ITERATIONS {
                let stats = engine.stats().expect("engine ready");
                assert_eq!(stats.total_users, WRITERS as i64);

                // A vacated bucket ranks below every live user, so the
                // largest observable rank is N + 1.
                let ranks = engine.get_rank_batch(&watched).expect("engine ready");
                for &rank in &ranks {
                    assert!(rank >= 1 && rank <= WRITERS as i64 + 1);
                }
            }
        }));
    }

    for handle in handles {
        handle.join().expect("worker thread must not panic");
    }

    assert_eq!(engine.get_rank_batch(&seed).expect("engine ready"), before);
}

/// One user toggles between the bottom and the top of the range. Any batch
/// read must observe the toggler entirely on one side or the other; a torn
/// pair of ranks would mean the snapshot mixed two histograms.
#[test]
fn test_rank_batch_is_a_consistent_snapshot() {
    init_test_env();

    const TOGGLES: usize = 500;

    // Ten static users at 2500 plus one user starting at 100.
    let mut seed = vec![2500; 10];
    seed.push(100);
    let engine = ready_engine(&seed);

    let writer = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..TOGGLES {
                engine.update_rating(100, 5000).expect("up transition");
                engine.update_rating(5000, 100).expect("down transition");
            }
        })
    };

    let reader = {
        let engine = Arc::clone(&engine);
        thread::spawn(move || {
            for _ in 0..TOGGLES {
                let ranks = engine.get_rank_batch(&[2500, 100]).expect("engine ready");

                // Toggler above: (2, 12). Toggler below: (1, 11).
                assert!(
                    ranks == vec![2, 12] || ranks == vec![1, 11],
                    "torn snapshot: {:?}",
                    ranks
                );
            }
        })
    };

    writer.join().expect("writer must not panic");
    reader.join().expect("reader must not panic");
}
