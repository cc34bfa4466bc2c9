// src/fetcher.rs
// Boundary contract for the external extraction/download engine. The
// manager only ever talks to the engine through this trait, which keeps
// the engine swappable and the manager testable against a mock.

use crate::error::AppError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::mpsc::UnboundedSender;

/// Metadata resolved by a probe, without transferring the payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub title: String,
    pub thumbnail: String,
}

/// One progress sample reported by the engine during a fetch.
/// `total_bytes` is None while the engine does not yet know the payload
/// size; consumers must not fabricate a percentage from it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchProgress {
    pub downloaded_bytes: u64,
    pub total_bytes: Option<u64>,
    pub speed_bps: Option<f64>,
}

/// Destination and format selection, passed through to the engine unchanged
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputPolicy {
    /// Directory downloads are written into
    pub output_dir: PathBuf,
    /// Engine filename template
    pub filename_template: String,
    /// Format-selection fallback chain
    pub format_chain: String,
    /// Restrict playlist URLs to the single linked item
    pub no_playlist: bool,
}

impl Default for OutputPolicy {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("torro_downloads"),
            filename_template: "%(title)s [%(height)sp].%(ext)s".to_string(),
            format_chain: "bestvideo[ext=mp4]+bestaudio[ext=m4a]/best[ext=mp4]/best".to_string(),
            no_playlist: true,
        }
    }
}

impl OutputPolicy {
    /// Full output template handed to the engine
    pub fn output_template(&self) -> String {
        self.output_dir
            .join(&self.filename_template)
            .to_string_lossy()
            .into_owned()
    }
}

/// The external extraction/download engine, specified only at this
/// interface. Each call is stateless; no session state is shared between
/// probe and fetch or between concurrent calls.
#[async_trait]
pub trait MediaFetcher: Send + Sync {
    /// Resolve title and thumbnail for a URL without downloading it
    async fn probe(&self, url: &str) -> Result<MediaInfo, AppError>;

    /// Transfer the media, emitting progress samples on `progress` at the
    /// engine's own cadence. Returning Ok(()) is the "finished" signal;
    /// dropping the future aborts the transfer.
    async fn fetch(
        &self,
        url: &str,
        policy: &OutputPolicy,
        progress: UnboundedSender<FetchProgress>,
    ) -> Result<(), AppError>;
}
