// tests/record_test.rs
// Lifecycle invariants on a single record: progress monotonicity and
// terminal immutability.

use torro::record::{DownloadRecord, DownloadStatus, JobId, PLACEHOLDER_TITLE};

fn new_record() -> DownloadRecord {
    DownloadRecord::new(JobId(0), "https://example.com/v1")
}

#[test]
fn test_new_record_starts_queued_with_placeholders() {
    let record = new_record();

    assert_eq!(record.status, DownloadStatus::Queued);
    assert_eq!(record.progress, 0.0);
    assert_eq!(record.title, PLACEHOLDER_TITLE);
    assert!(record.speed.is_empty());
    assert!(record.error_message.is_none());
    assert!(record.finished_at.is_none());
    assert!(record.is_active());
    assert!(!record.is_finished());
}

#[test]
fn test_progress_ignored_outside_downloading() {
    let mut record = new_record();

    record.apply_progress(50.0, "1.00 MiB/s");
    assert_eq!(record.progress, 0.0);
    assert!(record.speed.is_empty());

    record.mark_fetching_metadata();
    record.apply_progress(50.0, "1.00 MiB/s");
    assert_eq!(record.progress, 0.0);
}

#[test]
fn test_progress_never_decreases_while_downloading() {
    let mut record = new_record();
    record.mark_downloading("Cat Video", "");

    record.apply_progress(60.0, "2.00 MiB/s");
    assert_eq!(record.progress, 60.0);

    // The engine restarting its byte counter must not move us backwards.
    record.apply_progress(50.0, "2.00 MiB/s");
    assert_eq!(record.progress, 60.0);

    record.apply_progress(80.0, "2.00 MiB/s");
    assert_eq!(record.progress, 80.0);
}

#[test]
fn test_completion_forces_progress_to_100() {
    let mut record = new_record();
    record.mark_downloading("Cat Video", "");
    record.apply_progress(97.3, "2.00 MiB/s");

    record.mark_completed();

    assert_eq!(record.status, DownloadStatus::Completed);
    assert_eq!(record.progress, 100.0);
    assert!(record.speed.is_empty());
    assert!(record.error_message.is_none());
    assert!(record.finished_at.is_some());
    assert!(!record.is_active());
}

#[test]
fn test_terminal_states_are_immutable() {
    let mut record = new_record();
    record.mark_downloading("Cat Video", "");
    record.mark_completed();

    // Spurious late events must not move a terminal record.
    record.apply_progress(12.0, "1.00 MiB/s");
    record.mark_fetching_metadata();
    record.mark_downloading("Other", "x");
    record.mark_failed("too late");
    record.mark_cancelled();

    assert_eq!(record.status, DownloadStatus::Completed);
    assert_eq!(record.progress, 100.0);
    assert_eq!(record.title, "Cat Video");
    assert!(record.error_message.is_none());
}

#[test]
fn test_error_records_keep_message_and_stay_active() {
    let mut record = new_record();
    record.mark_fetching_metadata();
    record.mark_failed("404: Not Found");

    assert_eq!(record.status, DownloadStatus::Error);
    assert_eq!(record.error_message.as_deref(), Some("404: Not Found"));
    assert!(record.is_finished());
    // Errors stay visible on the active dashboard.
    assert!(record.is_active());

    // And are terminal: completion can no longer overwrite the failure.
    record.mark_completed();
    assert_eq!(record.status, DownloadStatus::Error);
}

#[test]
fn test_cancelled_is_terminal_and_inactive() {
    let mut record = new_record();
    record.mark_downloading("Cat Video", "");
    record.mark_cancelled();

    assert_eq!(record.status, DownloadStatus::Cancelled);
    assert!(record.is_finished());
    assert!(!record.is_active());

    record.apply_progress(99.0, "");
    assert_eq!(record.status, DownloadStatus::Cancelled);
}

#[test]
fn test_metadata_keeps_placeholder_thumbnail_when_probe_has_none() {
    let mut record = new_record();
    let placeholder = record.thumbnail.clone();

    record.mark_downloading("Cat Video", "");

    assert_eq!(record.title, "Cat Video");
    assert_eq!(record.thumbnail, placeholder);
}
