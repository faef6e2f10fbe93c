use crate::{HistoryStore, MAX_HISTORY_SIZE};

use std::path::{Path, PathBuf};

use tempfile::TempDir;

#[allow(clippy::unwrap_used)]
fn touch(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"png").unwrap();
    path
}

/// WHAT: Appends up to capacity keep every record
/// WHY: Nothing is evicted while the history has room
#[test]
#[allow(clippy::unwrap_used)]
fn given_empty_store_when_appending_below_capacity_then_all_kept() {
    // Given: An empty store and three files
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::new();

    // When: Appending three images
    let paths: Vec<_> = (1..=3)
        .map(|i| touch(tmp.path(), &format!("{i}.png")))
        .collect();
    for path in &paths {
        store.append(path.clone());
    }

    // Then: All three are kept in order, files untouched
    assert_eq!(store.len(), 3);
    assert_eq!(store.get(0).unwrap().path, paths[0]);
    assert_eq!(store.latest().unwrap().path, paths[2]);
    assert!(paths.iter().all(|p| p.exists()));
}

/// WHAT: Sequence numbers increase with every append
/// WHY: Sequence is the stable identity of a record
#[test]
fn given_appends_when_inspecting_sequence_then_monotonic() {
    // Given: An empty store
    let store = HistoryStore::new();

    // When: Appending several records
    let seqs: Vec<u64> = (0..5)
        .map(|i| store.append(format!("/nonexistent/{i}.png")).sequence)
        .collect();

    // Then: Sequences start at 1 and strictly increase
    assert_eq!(seqs, vec![1, 2, 3, 4, 5]);
}

/// WHAT: The 51st append evicts the first record and deletes its file
/// WHY: History must stay bounded at 50 without leaking files
#[test]
#[allow(clippy::unwrap_used)]
fn given_full_store_when_appending_51st_then_oldest_evicted_and_deleted() {
    // Given: 51 distinct files
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::new();
    let paths: Vec<_> = (1..=51)
        .map(|i| touch(tmp.path(), &format!("{i}.png")))
        .collect();

    // When: Appending all of them
    for path in &paths {
        store.append(path.clone());
    }

    // Then: Record #1 is gone from disk, 50 remain, latest is #51
    assert!(!paths[0].exists());
    assert_eq!(store.len(), MAX_HISTORY_SIZE);
    let latest = store.latest().unwrap();
    assert_eq!(latest.path, paths[50]);
    assert_eq!(latest.sequence, 51);
    assert_eq!(store.get(0).unwrap().path, paths[1]);
}

/// WHAT: N appends leave min(N, 50) records and delete max(0, N-50) files oldest-first
/// WHY: Eviction is strictly FIFO
#[test]
#[allow(clippy::unwrap_used)]
fn given_many_appends_when_over_capacity_then_oldest_files_deleted_first() {
    // Given: 120 files
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::new();
    let paths: Vec<_> = (0..120)
        .map(|i| touch(tmp.path(), &format!("{i}.png")))
        .collect();

    // When: Appending all
    for path in &paths {
        store.append(path.clone());
    }

    // Then: The first 70 are deleted, the last 50 survive in order
    assert_eq!(store.len(), 50);
    assert!(paths[..70].iter().all(|p| !p.exists()));
    assert!(paths[70..].iter().all(|p| p.exists()));
    let kept: Vec<_> = store.records().into_iter().map(|r| r.path).collect();
    assert_eq!(kept, paths[70..].to_vec());
}

/// WHAT: Deleting position 1 of [A, B, C] yields [A, C]
/// WHY: Positions shift down after a delete; old position 2 is no longer valid
#[test]
#[allow(clippy::unwrap_used)]
fn given_three_records_when_deleting_middle_then_positions_shift() {
    // Given: History [A, B, C]
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::new();
    let a = touch(tmp.path(), "a.png");
    let b = touch(tmp.path(), "b.png");
    let c = touch(tmp.path(), "c.png");
    store.append(a.clone());
    store.append(b.clone());
    store.append(c.clone());

    // When: Deleting position 1
    let deleted = store.delete_at(1);

    // Then: [A, C], B's file removed, position 2 now points at nothing
    assert!(deleted);
    let remaining: Vec<_> = store.records().into_iter().map(|r| r.path).collect();
    assert_eq!(remaining, vec![a, c.clone()]);
    assert!(!b.exists());
    assert!(store.get(2).is_none());
    assert_eq!(store.get(1).unwrap().path, c);
}

/// WHAT: Deleting an out-of-range position is a no-op
/// WHY: Stale positions from clients must not fail or remove anything
#[test]
fn given_records_when_deleting_out_of_range_then_false_and_unchanged() {
    // Given: Two records
    let store = HistoryStore::new();
    store.append("/nonexistent/a.png");
    store.append("/nonexistent/b.png");

    // When: Deleting position 5
    let deleted = store.delete_at(5);

    // Then: Nothing changes
    assert!(!deleted);
    assert_eq!(store.len(), 2);
}

/// WHAT: Deleting the newest record moves `latest` back
/// WHY: `latest` always reflects the newest record still held
#[test]
#[allow(clippy::unwrap_used)]
fn given_records_when_deleting_newest_then_latest_is_previous() {
    // Given: Two records
    let store = HistoryStore::new();
    store.append("/nonexistent/a.png");
    store.append("/nonexistent/b.png");

    // When: Deleting the newest
    assert!(store.delete_at(1));

    // Then: Latest is the remaining one
    assert_eq!(store.latest().unwrap().sequence, 1);
}

/// WHAT: Clear deletes every file and empties the history
/// WHY: Clear-all must not leave orphaned screenshots on disk
#[test]
#[allow(clippy::unwrap_used)]
fn given_records_when_clearing_then_files_deleted_and_latest_empty() {
    // Given: Four records backed by files
    let tmp = TempDir::new().unwrap();
    let store = HistoryStore::new();
    let paths: Vec<_> = (0..4)
        .map(|i| touch(tmp.path(), &format!("{i}.png")))
        .collect();
    for path in &paths {
        store.append(path.clone());
    }

    // When: Clearing
    let removed = store.clear();

    // Then: Empty, no latest, files gone
    assert_eq!(removed, 4);
    assert!(store.is_empty());
    assert!(store.latest().is_none());
    assert!(paths.iter().all(|p| !p.exists()));
}

/// WHAT: Sequence keeps increasing after clear
/// WHY: Sequence identity must never be reused
#[test]
#[allow(clippy::unwrap_used)]
fn given_cleared_store_when_appending_then_sequence_continues() {
    // Given: A store that had records and was cleared
    let store = HistoryStore::new();
    store.append("/nonexistent/a.png");
    store.append("/nonexistent/b.png");
    store.clear();

    // When: Appending again
    let record = store.append("/nonexistent/c.png");

    // Then: Sequence continues from 3
    assert_eq!(record.sequence, 3);
    assert_eq!(store.latest().unwrap().sequence, 3);
}

/// WHAT: Eviction tolerates a backing file that is already gone
/// WHY: Users may delete screenshots from the temp dir by hand
#[test]
fn given_missing_backing_file_when_evicted_then_no_error() {
    // Given: A store of capacity 1 holding a record with no file
    let store = HistoryStore::with_capacity(1);
    store.append("/nonexistent/gone.png");

    // When: Appending another record
    store.append("/nonexistent/next.png");

    // Then: Eviction completes and the size invariant holds
    assert_eq!(store.len(), 1);
}

/// WHAT: Concurrent appends keep the size bound and unique sequences
/// WHY: Append+evict must be atomic with respect to other writers
#[test]
fn given_concurrent_appenders_when_done_then_bounded_and_unique() {
    // Given: A shared store
    let store = HistoryStore::new();

    // When: 8 threads append 20 records each
    let handles: Vec<_> = (0..8)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                for i in 0..20 {
                    store.append(format!("/nonexistent/{t}-{i}.png"));
                }
            })
        })
        .collect();
    for handle in handles {
        assert!(handle.join().is_ok());
    }

    // Then: 50 records remain, sequences unique and ascending, latest is #160
    let records = store.records();
    assert_eq!(records.len(), 50);
    assert!(records.windows(2).all(|w| w[0].sequence < w[1].sequence));
    assert_eq!(store.latest().map(|r| r.sequence), Some(160));
}
