// src/ytdlp.rs
// MediaFetcher implementation backed by the external yt-dlp executable.

use crate::error::AppError;
use crate::fetcher::{FetchProgress, MediaFetcher, MediaInfo, OutputPolicy};
use async_trait::async_trait;
use log::{debug, warn};
use serde::Deserialize;
use std::io;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command as AsyncCommand;
use tokio::sync::mpsc::UnboundedSender;

/// Progress template handed to yt-dlp; each stdout line during transfer is
/// "download:<downloaded>/<total>/<speed>" with "NA" for unknown fields.
const PROGRESS_TEMPLATE: &str =
    "download:%(progress.downloaded_bytes)s/%(progress.total_bytes)s/%(progress.speed)s";

/// Fetcher that shells out to yt-dlp. Stateless per call; every probe and
/// fetch spawns a fresh process.
#[derive(Debug, Clone, Default)]
pub struct YtDlpFetcher {
    /// Override for the yt-dlp executable name/path
    pub binary: Option<String>,
}

impl YtDlpFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self) -> AsyncCommand {
        AsyncCommand::new(self.binary.as_deref().unwrap_or("yt-dlp"))
    }
}

/// The fields we need from `yt-dlp -j` output
#[derive(Debug, Deserialize)]
struct ProbeOutput {
    title: Option<String>,
    thumbnail: Option<String>,
}

#[async_trait]
impl MediaFetcher for YtDlpFetcher {
    async fn probe(&self, url: &str) -> Result<MediaInfo, AppError> {
        let mut command = self.command();
        command
            .arg("-j")
            .arg("--no-download")
            .arg("--no-playlist")
            .arg("--")
            .arg(url);

        debug!("Probing {} with yt-dlp", url);
        let output = command.output().await.map_err(map_spawn_error)?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(AppError::ProbeFailed(last_error_line(&stderr)));
        }

        let parsed: ProbeOutput = serde_json::from_slice(&output.stdout)
            .map_err(|e| AppError::ProbeFailed(format!("unreadable metadata: {}", e)))?;

        Ok(MediaInfo {
            title: parsed.title.unwrap_or_else(|| "Unknown Title".to_string()),
            thumbnail: parsed.thumbnail.unwrap_or_default(),
        })
    }

    async fn fetch(
        &self,
        url: &str,
        policy: &OutputPolicy,
        progress: UnboundedSender<FetchProgress>,
    ) -> Result<(), AppError> {
        let mut command = self.command();
        command
            .arg("-f")
            .arg(&policy.format_chain)
            .arg("-o")
            .arg(policy.output_template())
            .arg("--newline")
            .arg("--progress-template")
            .arg(PROGRESS_TEMPLATE)
            .arg("--quiet")
            .arg("--progress");

        if policy.no_playlist {
            command.arg("--no-playlist");
        } else {
            command.arg("--yes-playlist");
        }

        command.arg("--").arg(url);
        command.stdout(Stdio::piped());
        command.stderr(Stdio::piped());
        // Reap the child if the fetch future is dropped on cancellation.
        command.kill_on_drop(true);

        debug!("Starting yt-dlp transfer for {}", url);
        let mut child = command.spawn().map_err(map_spawn_error)?;

        if let Some(stdout) = child.stdout.take() {
            let mut lines = BufReader::new(stdout).lines();
            let progress_tx = progress.clone();

            tokio::spawn(async move {
                while let Ok(Some(line)) = lines.next_line().await {
                    if let Some(sample) = parse_progress_line(&line) {
                        if progress_tx.send(sample).is_err() {
                            break;
                        }
                    }
                }
            });
        }

        let mut last_stderr = String::new();
        if let Some(stderr) = child.stderr.take() {
            let mut lines = BufReader::new(stderr).lines();
            while let Ok(Some(line)) = lines.next_line().await {
                if !line.trim().is_empty() {
                    warn!("yt-dlp: {}", line);
                    last_stderr = line;
                }
            }
        }

        let status = child.wait().await.map_err(AppError::IoError)?;

        if status.success() {
            Ok(())
        } else {
            let message = if last_stderr.is_empty() {
                format!(
                    "yt-dlp exited with code {}",
                    status.code().unwrap_or_default()
                )
            } else {
                last_stderr
            };
            Err(AppError::FetchFailed(message))
        }
    }
}

fn map_spawn_error(e: io::Error) -> AppError {
    match e.kind() {
        io::ErrorKind::NotFound => AppError::MissingDependency("yt-dlp".to_string()),
        _ => AppError::IoError(e),
    }
}

/// Last non-empty stderr line, which is where yt-dlp puts its actual error
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .unwrap_or("yt-dlp probe failed")
        .trim()
        .to_string()
}

/// Parse one progress-template line. Returns None for non-progress output
/// or unparseable byte counts; an "NA" total stays None so callers never
/// see a fabricated size.
pub fn parse_progress_line(line: &str) -> Option<FetchProgress> {
    let payload = line.strip_prefix("download:")?;
    let mut parts = payload.splitn(3, '/');

    let downloaded = parts.next()?.trim().parse::<u64>().ok()?;
    let total = parts.next().and_then(|s| s.trim().parse::<u64>().ok());
    let speed = parts.next().and_then(|s| s.trim().parse::<f64>().ok());

    Some(FetchProgress {
        downloaded_bytes: downloaded,
        total_bytes: total.filter(|t| *t > 0),
        speed_bps: speed.filter(|s| *s > 0.0),
    })
}
