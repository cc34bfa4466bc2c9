// src/manager.rs
// Orchestrates download jobs: one worker task per submitted URL, all record
// mutation funnelled through a single event-applier loop into the registry.

use crate::error::AppError;
use crate::fetcher::{MediaFetcher, OutputPolicy};
use crate::record::JobId;
use crate::registry::DownloadRegistry;
use crate::utils::{compute_percent, derive_error_message, format_speed, validate_url};
use log::{debug, error, info};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

/// One mutation a worker requests for its record
#[derive(Debug, Clone)]
enum JobEventKind {
    ProbeStarted,
    MetadataResolved { title: String, thumbnail: String },
    Progress { percent: f64, speed: String },
    Completed,
    Failed { message: String },
    Cancelled,
}

#[derive(Debug)]
struct JobEvent {
    id: JobId,
    kind: JobEventKind,
}

/// Accepts job submissions, runs one concurrent worker per job against the
/// external fetcher, and delivers progress back into the registry.
///
/// Workers never touch the registry directly: every mutation travels as a
/// `JobEvent` over one mpsc channel and is applied by a single consumer
/// task, so updates to a record are committed in the order its worker
/// issued them regardless of how workers interleave.
pub struct DownloadManager {
    registry: Arc<DownloadRegistry>,
    fetcher: Arc<dyn MediaFetcher>,
    policy: OutputPolicy,
    event_tx: mpsc::UnboundedSender<JobEvent>,
    /// Cancel tokens for workers that have not finished yet
    workers: Arc<Mutex<HashMap<JobId, broadcast::Sender<()>>>>,
    applier: JoinHandle<()>,
}

impl DownloadManager {
    pub fn new(
        registry: Arc<DownloadRegistry>,
        fetcher: Arc<dyn MediaFetcher>,
        policy: OutputPolicy,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let applier = tokio::spawn(apply_events(Arc::clone(&registry), event_rx));

        Self {
            registry,
            fetcher,
            policy,
            event_tx,
            workers: Arc::new(Mutex::new(HashMap::new())),
            applier,
        }
    }

    /// The registry this manager reports into
    pub fn registry(&self) -> &Arc<DownloadRegistry> {
        &self.registry
    }

    /// Submit a URL for download. Validation failures are returned
    /// synchronously; everything after that is observable only through the
    /// record. Resubmitting a URL creates an independent new job.
    pub fn submit(&self, url: &str) -> Result<JobId, AppError> {
        let url = validate_url(url)?;
        let id = self.registry.insert(url);
        info!("Submitted download {} for {}", id, url);

        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        self.workers.lock().unwrap().insert(id, cancel_tx);

        tokio::spawn(supervise_job(
            id,
            url.to_string(),
            Arc::clone(&self.fetcher),
            self.policy.clone(),
            self.event_tx.clone(),
            cancel_rx,
            Arc::clone(&self.workers),
        ));

        Ok(id)
    }

    /// Request cancellation of a job. The worker aborts at its next
    /// suspension point and the record moves to the terminal Cancelled
    /// status. Cancelling an already finished job is a no-op.
    pub fn cancel(&self, id: JobId) -> Result<(), AppError> {
        if self.registry.get(id).is_none() {
            return Err(AppError::UnknownJobId(id));
        }

        let workers = self.workers.lock().unwrap();
        if let Some(cancel_tx) = workers.get(&id) {
            debug!("Cancelling download {}", id);
            let _ = cancel_tx.send(());
        }
        Ok(())
    }

    /// Number of workers still running
    pub fn active_jobs(&self) -> usize {
        self.workers.lock().unwrap().len()
    }

    /// Cancel every live worker. Records already in a terminal state are
    /// left untouched.
    pub fn shutdown(&self) {
        let workers = self.workers.lock().unwrap();
        for (id, cancel_tx) in workers.iter() {
            debug!("Cancelling download {} on shutdown", id);
            let _ = cancel_tx.send(());
        }
    }
}

impl Drop for DownloadManager {
    fn drop(&mut self) {
        self.applier.abort();
    }
}

/// Drain worker events and apply them to the registry. This is the single
/// serialization point for record mutation; the guards here are what make
/// terminal states immutable and progress monotonic no matter what a
/// worker or the engine emits.
async fn apply_events(
    registry: Arc<DownloadRegistry>,
    mut event_rx: mpsc::UnboundedReceiver<JobEvent>,
) {
    while let Some(event) = event_rx.recv().await {
        let JobEvent { id, kind } = event;
        registry.update(id, move |record| {
            if record.is_finished() {
                debug!("Dropping event for terminal job {}: {:?}", id, kind);
                return;
            }
            match kind {
                JobEventKind::ProbeStarted => record.mark_fetching_metadata(),
                JobEventKind::MetadataResolved { title, thumbnail } => {
                    record.mark_downloading(&title, &thumbnail)
                }
                JobEventKind::Progress { percent, speed } => {
                    record.apply_progress(percent, &speed)
                }
                JobEventKind::Completed => record.mark_completed(),
                JobEventKind::Failed { message } => record.mark_failed(&message),
                JobEventKind::Cancelled => record.mark_cancelled(),
            }
        });
    }
    debug!("Event applier stopped");
}

/// Run a worker in its own task and convert a panic into a terminal Error
/// record. A single job blowing up must never take down the manager or any
/// other job.
async fn supervise_job(
    id: JobId,
    url: String,
    fetcher: Arc<dyn MediaFetcher>,
    policy: OutputPolicy,
    event_tx: mpsc::UnboundedSender<JobEvent>,
    cancel_rx: broadcast::Receiver<()>,
    workers: Arc<Mutex<HashMap<JobId, broadcast::Sender<()>>>>,
) {
    let worker = tokio::spawn(run_job(
        id,
        url,
        fetcher,
        policy,
        event_tx.clone(),
        cancel_rx,
    ));

    if let Err(e) = worker.await {
        if e.is_panic() {
            error!("Worker for download {} panicked", id);
            let _ = event_tx.send(JobEvent {
                id,
                kind: JobEventKind::Failed {
                    message: "internal download failure".to_string(),
                },
            });
        }
    }

    workers.lock().unwrap().remove(&id);
}

/// The per-job worker: probe, then fetch with progress, emitting events in
/// lifecycle order. Cancellation is checked at every suspension point.
async fn run_job(
    id: JobId,
    url: String,
    fetcher: Arc<dyn MediaFetcher>,
    policy: OutputPolicy,
    event_tx: mpsc::UnboundedSender<JobEvent>,
    mut cancel_rx: broadcast::Receiver<()>,
) {
    let send = |kind: JobEventKind| {
        let _ = event_tx.send(JobEvent { id, kind });
    };

    send(JobEventKind::ProbeStarted);

    let probed = tokio::select! {
        res = fetcher.probe(&url) => res,
        _ = cancel_rx.recv() => {
            debug!("Download {} cancelled during probe", id);
            send(JobEventKind::Cancelled);
            return;
        }
    };

    let info = match probed {
        Ok(info) => info,
        Err(e) => {
            debug!("Probe for download {} failed: {}", id, e);
            send(JobEventKind::Failed {
                message: failure_message(&e),
            });
            return;
        }
    };

    send(JobEventKind::MetadataResolved {
        title: info.title,
        thumbnail: info.thumbnail,
    });

    let (progress_tx, mut progress_rx) = mpsc::unbounded_channel();
    let fetch = fetcher.fetch(&url, &policy, progress_tx);
    tokio::pin!(fetch);

    loop {
        tokio::select! {
            res = &mut fetch => {
                // Flush samples the engine emitted just before finishing so
                // the record's progress sequence stays complete.
                while let Ok(sample) = progress_rx.try_recv() {
                    if let Some(percent) =
                        compute_percent(sample.downloaded_bytes, sample.total_bytes)
                    {
                        send(JobEventKind::Progress {
                            percent,
                            speed: format_speed(sample.speed_bps),
                        });
                    }
                }
                match res {
                    Ok(()) => send(JobEventKind::Completed),
                    Err(e) => {
                        debug!("Fetch for download {} failed: {}", id, e);
                        send(JobEventKind::Failed { message: failure_message(&e) });
                    }
                }
                return;
            }
            Some(sample) = progress_rx.recv() => {
                // Unknown totals are skipped, not guessed at.
                if let Some(percent) =
                    compute_percent(sample.downloaded_bytes, sample.total_bytes)
                {
                    send(JobEventKind::Progress {
                        percent,
                        speed: format_speed(sample.speed_bps),
                    });
                }
            }
            _ = cancel_rx.recv() => {
                debug!("Download {} cancelled during fetch", id);
                send(JobEventKind::Cancelled);
                return;
            }
        }
    }
}

/// Short display message for a failed job. The colon heuristic applies to
/// the engine's raw message when we have one, otherwise to the rendered
/// error.
fn failure_message(err: &AppError) -> String {
    match err {
        AppError::ProbeFailed(raw) | AppError::FetchFailed(raw) => derive_error_message(raw),
        other => derive_error_message(&other.to_string()),
    }
}
