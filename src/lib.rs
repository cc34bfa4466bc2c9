// src/lib.rs
// Expose the download core as a library so any front end (CLI, GUI) can
// drive it through the same interface.

pub mod cli;
pub mod error;
pub mod fetcher;
pub mod manager;
pub mod record;
pub mod registry;
pub mod utils;
pub mod ytdlp;

pub use error::AppError;
pub use fetcher::{FetchProgress, MediaFetcher, MediaInfo, OutputPolicy};
pub use manager::DownloadManager;
pub use record::{DownloadRecord, DownloadStatus, JobId};
pub use registry::DownloadRegistry;
pub use ytdlp::YtDlpFetcher;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
