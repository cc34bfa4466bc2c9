// src/utils.rs

use crate::error::AppError;
use humansize::{format_size, BINARY};
use std::fs;
use std::path::PathBuf;

/// Derive a short display message from a raw engine failure.
///
/// Deliberately crude: everything after the first ':' of the raw message,
/// trimmed. "HTTP Error: 404: Not Found" becomes "404: Not Found". Kept
/// bit-for-bit stable because the observer renders it verbatim.
pub fn derive_error_message(raw: &str) -> String {
    match raw.split_once(':') {
        Some((_, rest)) => rest.trim().to_string(),
        None => raw.trim().to_string(),
    }
}

/// Format a throughput in bytes per second for display, e.g. "2.41 MiB/s".
/// Returns an empty string for unknown or zero speeds.
pub fn format_speed(speed_bps: Option<f64>) -> String {
    match speed_bps {
        Some(speed) if speed > 0.0 => format!("{}/s", format_size(speed as u64, BINARY)),
        _ => String::new(),
    }
}

/// Compute a percentage from downloaded/total bytes. None while the total
/// is unknown; callers skip the update rather than fabricate a value.
pub fn compute_percent(downloaded: u64, total: Option<u64>) -> Option<f64> {
    match total {
        Some(total) if total > 0 => {
            let pct = downloaded as f64 / total as f64 * 100.0;
            Some(pct.clamp(0.0, 100.0))
        }
        _ => None,
    }
}

/// Trim a submitted URL, rejecting empty or whitespace-only input
pub fn validate_url(url: &str) -> Result<&str, AppError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(AppError::EmptyUrl);
    }
    Ok(trimmed)
}

/// Resolve and create the download directory. Defaults to
/// ~/Downloads/torro when no custom directory is given.
pub fn initialize_download_dir(custom_dir: Option<&str>) -> Result<PathBuf, AppError> {
    let dir = match custom_dir {
        Some(dir) => PathBuf::from(dir),
        None => {
            let mut path = dirs_next::home_dir()
                .ok_or_else(|| AppError::General("Could not find home directory".to_string()))?;
            path.push("Downloads");
            path.push("torro");
            path
        }
    };

    fs::create_dir_all(&dir)?;
    Ok(dir)
}
