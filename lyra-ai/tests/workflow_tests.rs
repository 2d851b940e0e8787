//! End-to-end runs of the file orchestrator against a mock analyzer

mod helpers;

use helpers::{expected_analysis, LyricTree, MockAnalyzer};
use lyra_ai::error::DiscoveryError;
use lyra_ai::FileOrchestrator;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn orchestrator(tree: &LyricTree, mock: &Arc<MockAnalyzer>) -> FileOrchestrator {
    FileOrchestrator::new(tree.pipeline_config(), mock.client())
}

#[tokio::test]
async fn test_existing_output_means_nothing_to_do() {
    let tree = LyricTree::new();
    tree.add_song("", "song1.txt", "a\nb\nc\n");
    tree.add_output("", "song1_analysis.txt", "previous run");
    let mock = Arc::new(MockAnalyzer::new());

    let orchestrator = orchestrator(&tree, &mock);
    assert!(orchestrator.discover().unwrap().is_empty());

    let summary = orchestrator.run(&CancellationToken::new()).await.unwrap();

    assert_eq!(mock.calls(), 0);
    assert_eq!(summary.songs_discovered, 0);
    assert_eq!(summary.songs_written, 0);
    assert_eq!(tree.read_output("", "song1_analysis.txt"), "previous run");
}

#[tokio::test]
async fn test_single_song_written_with_failed_middle_batch() {
    let tree = LyricTree::new();
    tree.add_song("", "song1.txt", "a\nb\n\nc\nd\ne\n  \nf\ng\nh\ni\n");
    let mock = Arc::new(MockAnalyzer::new().failing_on(&[2]));

    let summary = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    let expected = format!(
        "{}\n\nError: Unable to process batch 2.\n\n{}\n\n",
        expected_analysis(1, &["a", "b", "c", "d"]),
        expected_analysis(3, &["i"]),
    );
    assert_eq!(tree.read_output("", "song1_analysis.txt"), expected);
    assert_eq!(mock.calls(), 3);
    assert_eq!(summary.songs_discovered, 1);
    assert_eq!(summary.songs_written, 1);
    assert_eq!(summary.estimated_batches, 3);
    assert_eq!(summary.failed_batches, 1);
    assert!(!summary.was_cancelled());
}

#[tokio::test]
async fn test_subfolders_are_mirrored_in_output() {
    let tree = LyricTree::new();
    tree.add_song("album_a", "first.txt", "one\ntwo\n");
    tree.add_song("album_b", "second.txt", "three\n");
    tree.add_song("", "loose.txt", "four\n");
    tree.add_song("", "notes.md", "not a lyric file\n");
    let mock = Arc::new(MockAnalyzer::new());

    let summary = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.songs_written, 3);
    assert_eq!(
        tree.read_output("album_a", "first_analysis.txt"),
        format!("{}\n\n", expected_analysis(1, &["one", "two"]))
    );
    assert_eq!(
        tree.read_output("album_b", "second_analysis.txt"),
        format!("{}\n\n", expected_analysis(1, &["three"]))
    );
    assert_eq!(
        tree.read_output("", "loose_analysis.txt"),
        format!("{}\n\n", expected_analysis(1, &["four"]))
    );
    assert!(!tree.output_path("", "notes_analysis.txt").exists());
}

#[tokio::test]
async fn test_unreadable_song_does_not_stop_siblings() {
    let tree = LyricTree::new();
    // Invalid UTF-8 fails the text read
    tree.add_song_bytes("", "broken.txt", &[0xff, 0xfe, 0x00, 0xc3]);
    tree.add_song("", "fine.txt", "line\n");
    let mock = Arc::new(MockAnalyzer::new());

    let summary = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.songs_discovered, 2);
    assert_eq!(summary.songs_failed, 1);
    assert_eq!(summary.songs_written, 1);
    assert!(!tree.output_path("", "broken_analysis.txt").exists());
    assert!(tree.output_path("", "fine_analysis.txt").exists());
}

#[tokio::test]
async fn test_missing_input_root_is_fatal() {
    let tree = LyricTree::new();
    std::fs::remove_dir_all(tree.input_root()).unwrap();
    let mock = Arc::new(MockAnalyzer::new());

    let err = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap_err();

    assert!(matches!(err, DiscoveryError::RootNotFound(_)));
    assert_eq!(mock.calls(), 0);
}

#[tokio::test]
async fn test_cancellation_writes_no_partial_output() {
    let tree = LyricTree::new();
    for i in 0..3 {
        tree.add_song("", &format!("song{}.txt", i), "a\nb\nc\nd\ne\n");
    }
    let mock = Arc::new(MockAnalyzer::new().with_default_delay(Duration::from_secs(30)));
    let orchestrator = orchestrator(&tree, &mock);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let summary = tokio::time::timeout(Duration::from_secs(5), orchestrator.run(&cancel))
        .await
        .expect("cancelled run should finish promptly")
        .unwrap();

    assert_eq!(summary.songs_written, 0);
    assert_eq!(summary.songs_cancelled, 3);
    assert!(summary.was_cancelled());
    for i in 0..3 {
        assert!(!tree.output_path("", &format!("song{}_analysis.txt", i)).exists());
    }
}

#[tokio::test]
async fn test_sequential_mode_keeps_one_request_in_flight() {
    let tree = LyricTree::new();
    tree.add_song("", "a.txt", "1\n2\n3\n4\n5\n");
    tree.add_song("", "b.txt", "6\n7\n8\n");
    let mock = Arc::new(MockAnalyzer::new().with_default_delay(Duration::from_millis(5)));

    let mut config = tree.pipeline_config();
    config.batch_size = 1;
    config.song_concurrency = 1;
    config.batch_concurrency = 1;

    let summary = FileOrchestrator::new(config, mock.client())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.songs_written, 2);
    assert_eq!(mock.calls(), 8);
    assert_eq!(mock.max_in_flight(), 1);
}

#[tokio::test]
async fn test_blank_lyric_file_writes_empty_output() {
    let tree = LyricTree::new();
    tree.add_song("", "silence.txt", "\n   \n\n");
    let mock = Arc::new(MockAnalyzer::new());

    let summary = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(mock.calls(), 0);
    assert_eq!(summary.songs_written, 1);
    assert_eq!(tree.read_output("", "silence_analysis.txt"), "");
}

#[tokio::test]
async fn test_second_run_skips_everything() {
    let tree = LyricTree::new();
    tree.add_song("album", "song.txt", "a\nb\n");
    let mock = Arc::new(MockAnalyzer::new());

    orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(mock.calls(), 1);

    let summary = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(mock.calls(), 1);
    assert_eq!(summary.songs_discovered, 0);
}

#[tokio::test]
async fn test_output_created_after_discovery_is_not_overwritten() {
    let tree = LyricTree::new();
    tree.add_song("", "a.txt", "first\n");
    tree.add_song("", "b.txt", "second\n");

    // While a.txt is being analysed, something else produces b's output
    let competing = tree.output_path("", "b_analysis.txt");
    let mock = Arc::new(MockAnalyzer::new().with_side_effect(move |_| {
        std::fs::create_dir_all(competing.parent().unwrap()).unwrap();
        std::fs::write(&competing, "written elsewhere").unwrap();
    }));

    let mut config = tree.pipeline_config();
    config.song_concurrency = 1;

    let summary = FileOrchestrator::new(config, mock.client())
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.songs_discovered, 2);
    assert_eq!(summary.songs_written, 1);
    assert_eq!(summary.songs_skipped, 1);
    assert_eq!(mock.calls(), 1);
    assert_eq!(
        tree.read_output("", "a_analysis.txt"),
        format!("{}\n\n", expected_analysis(1, &["first"]))
    );
    assert_eq!(tree.read_output("", "b_analysis.txt"), "written elsewhere");
}

// Needs a case-sensitive filesystem to hold both spellings
#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_same_stem_songs_produce_one_analysis() {
    let tree = LyricTree::new();
    tree.add_song("", "song.txt", "lower\n");
    tree.add_song("", "song.TXT", "UPPER\n");
    let mock = Arc::new(MockAnalyzer::new());

    let summary = orchestrator(&tree, &mock)
        .run(&CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(summary.songs_discovered, 1);
    assert_eq!(summary.songs_written, 1);
    assert_eq!(mock.calls(), 1);
    // "song.TXT" sorts first, so its text is the one analysed
    assert_eq!(
        tree.read_output("", "song_analysis.txt"),
        format!("{}\n\n", expected_analysis(1, &["UPPER"]))
    );
}
