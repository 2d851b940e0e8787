//! Progress tracker under concurrent tokio tasks

use lyra_ai::services::ProgressTracker;
use std::sync::Arc;
use tokio::task::JoinSet;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_record_batch_counts_exactly() {
    let tracker = Arc::new(ProgressTracker::new(10, 250));
    let mut join_set = JoinSet::new();

    for _ in 0..250 {
        let tracker = Arc::clone(&tracker);
        join_set.spawn(async move {
            tracker.record_batch();
        });
    }

    while let Some(result) = join_set.join_next().await {
        result.unwrap();
    }

    assert_eq!(tracker.snapshot().processed_batches, 250);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_mixed_updates() {
    let tracker = Arc::new(ProgressTracker::new(20, 200));
    let mut join_set = JoinSet::new();

    for song in 0..20 {
        let tracker = Arc::clone(&tracker);
        join_set.spawn(async move {
            for _ in 0..10 {
                tracker.record_batch();
                tokio::task::yield_now().await;
            }
            tracker.record_file(&format!("song{}.txt", song));
        });
    }

    while let Some(result) = join_set.join_next().await {
        result.unwrap();
    }

    let snapshot = tracker.snapshot();
    assert_eq!(snapshot.processed_batches, 200);
    assert_eq!(snapshot.processed_files, 20);
    assert!((snapshot.percent() - 100.0).abs() < 1e-9);
    assert_eq!(snapshot.eta_secs(), 0.0);
}
