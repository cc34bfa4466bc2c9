// src/record.rs
// The fixed-field data model for one download job. One record per submitted
// URL, mutated only through DownloadRegistry::update.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Title shown until the probe resolves the real one
pub const PLACEHOLDER_TITLE: &str = "Fetching details...";

/// Thumbnail shown until the probe resolves the real one
pub const PLACEHOLDER_THUMBNAIL: &str = "https://via.placeholder.com/150.png?text=QUEUED";

/// Opaque unique identifier for a download job, stable for the record's
/// lifetime and never reused within a process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub u64);

impl fmt::Display for JobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Current status of a download
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DownloadStatus {
    Queued,
    FetchingMetadata,
    Downloading,
    Completed,
    Error,
    Cancelled,
}

impl Default for DownloadStatus {
    fn default() -> Self {
        Self::Queued
    }
}

impl DownloadStatus {
    /// Terminal statuses admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Error | Self::Cancelled)
    }
}

impl fmt::Display for DownloadStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Queued => "queued",
            Self::FetchingMetadata => "fetching metadata",
            Self::Downloading => "downloading",
            Self::Completed => "completed",
            Self::Error => "error",
            Self::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

/// One download job, from submission to its terminal state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadRecord {
    /// Unique identifier, assigned by the registry at insertion
    pub id: JobId,
    /// Source URL, immutable after creation
    pub url: String,
    /// Display title; placeholder until metadata resolves
    pub title: String,
    /// Preview image URL; placeholder until metadata resolves
    pub thumbnail: String,
    /// Current lifecycle status
    pub status: DownloadStatus,
    /// Percentage in [0, 100]; meaningful only while downloading or completed
    pub progress: f64,
    /// Formatted throughput for display, empty when idle
    pub speed: String,
    /// Set only when status is Error
    pub error_message: Option<String>,
    /// When the job was submitted
    pub submitted_at: DateTime<Utc>,
    /// When the job reached a terminal state
    pub finished_at: Option<DateTime<Utc>>,
}

impl DownloadRecord {
    /// Create a new queued record for a submitted URL. The id is assigned by
    /// the registry when the record is inserted.
    pub fn new(id: JobId, url: &str) -> Self {
        Self {
            id,
            url: url.to_string(),
            title: PLACEHOLDER_TITLE.to_string(),
            thumbnail: PLACEHOLDER_THUMBNAIL.to_string(),
            status: DownloadStatus::Queued,
            progress: 0.0,
            speed: String::new(),
            error_message: None,
            submitted_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Check if the record still belongs on the active dashboard. Error
    /// records stay visible there; Completed and Cancelled do not.
    pub fn is_active(&self) -> bool {
        matches!(
            self.status,
            DownloadStatus::Queued
                | DownloadStatus::FetchingMetadata
                | DownloadStatus::Downloading
                | DownloadStatus::Error
        )
    }

    /// Check if the record has reached a terminal state
    pub fn is_finished(&self) -> bool {
        self.status.is_terminal()
    }

    /// Mark the probe as started. Like every transition below, this is a
    /// no-op once the record is terminal: spurious late events must never
    /// move a record out of Completed, Error, or Cancelled.
    pub fn mark_fetching_metadata(&mut self) {
        if self.is_finished() {
            return;
        }
        self.status = DownloadStatus::FetchingMetadata;
    }

    /// Apply resolved metadata and move into the transfer phase
    pub fn mark_downloading(&mut self, title: &str, thumbnail: &str) {
        if self.is_finished() {
            return;
        }
        self.title = title.to_string();
        if !thumbnail.is_empty() {
            self.thumbnail = thumbnail.to_string();
        }
        self.status = DownloadStatus::Downloading;
    }

    /// Apply a progress sample. Only honored mid-transfer, and the
    /// percentage never moves backwards even if the engine's byte
    /// counters do.
    pub fn apply_progress(&mut self, percent: f64, speed: &str) {
        if self.status != DownloadStatus::Downloading {
            return;
        }
        if percent > self.progress {
            self.progress = percent.clamp(0.0, 100.0);
        }
        self.speed = speed.to_string();
    }

    /// Mark the download as completed, forcing progress to 100
    pub fn mark_completed(&mut self) {
        if self.is_finished() {
            return;
        }
        self.status = DownloadStatus::Completed;
        self.progress = 100.0;
        self.speed = String::new();
        self.error_message = None;
        self.finished_at = Some(Utc::now());
    }

    /// Mark the download as failed with a display message
    pub fn mark_failed(&mut self, message: &str) {
        if self.is_finished() {
            return;
        }
        self.status = DownloadStatus::Error;
        self.speed = String::new();
        self.error_message = Some(message.to_string());
        self.finished_at = Some(Utc::now());
    }

    /// Mark the download as cancelled by the user
    pub fn mark_cancelled(&mut self) {
        if self.is_finished() {
            return;
        }
        self.status = DownloadStatus::Cancelled;
        self.speed = String::new();
        self.finished_at = Some(Utc::now());
    }
}
