// src/registry.rs
// Single source of truth for all download records. Safe for concurrent
// writers (manager + workers, funnelled through update) and readers
// (observer snapshots).

use crate::record::{DownloadRecord, JobId};
use log::{debug, warn};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::RwLock;
use tokio::sync::broadcast;

/// Thread-safe, ordered collection of download records. Records are kept
/// newest-submission-first; ids are assigned from an atomic counter and
/// never reused. All reads hand out clones so the observer can iterate
/// without aliasing internal storage.
#[derive(Debug)]
pub struct DownloadRegistry {
    /// Ordered collection, index 0 is the newest submission
    records: RwLock<Vec<DownloadRecord>>,
    /// Next id to hand out
    next_id: AtomicU64,
    /// Channel for notifying listeners of record changes
    notify_tx: broadcast::Sender<()>,
}

impl Default for DownloadRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl DownloadRegistry {
    pub fn new() -> Self {
        let (notify_tx, _) = broadcast::channel(64);
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(0),
            notify_tx,
        }
    }

    /// Get a notification receiver to be notified of registry changes.
    /// One notification is sent per committed insert or update; listeners
    /// re-render from a fresh snapshot.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify_tx.subscribe()
    }

    /// Create and insert a queued record for a URL, returning its id.
    /// The new record is placed at the front so the newest submission is
    /// first in the history view.
    pub fn insert(&self, url: &str) -> JobId {
        let id = JobId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let record = DownloadRecord::new(id, url);
        {
            let mut records = self.records.write().unwrap();
            records.insert(0, record);
        }
        debug!("Registered download {} for {}", id, url);
        let _ = self.notify_tx.send(());
        id
    }

    /// Look up a record by id, cloning it out of the collection
    pub fn get(&self, id: JobId) -> Option<DownloadRecord> {
        let records = self.records.read().unwrap();
        records.iter().find(|r| r.id == id).cloned()
    }

    /// Apply an atomic read-modify-write to one record. Events for unknown
    /// ids are logged and dropped, never fatal: a worker may still emit
    /// after its record is gone.
    pub fn update<F>(&self, id: JobId, mutator: F)
    where
        F: FnOnce(&mut DownloadRecord),
    {
        let mutated = {
            let mut records = self.records.write().unwrap();
            match records.iter_mut().find(|r| r.id == id) {
                Some(record) => {
                    mutator(record);
                    true
                }
                None => false,
            }
        };

        if mutated {
            let _ = self.notify_tx.send(());
        } else {
            warn!("Ignoring update for unknown job id {}", id);
        }
    }

    /// A consistent, point-in-time copy of the full history, newest first
    pub fn snapshot(&self) -> Vec<DownloadRecord> {
        let records = self.records.read().unwrap();
        records.clone()
    }

    /// Like snapshot, filtered to records still on the active dashboard
    /// (queued, probing, downloading, or errored), relative order preserved
    pub fn active_snapshot(&self) -> Vec<DownloadRecord> {
        let records = self.records.read().unwrap();
        records.iter().filter(|r| r.is_active()).cloned().collect()
    }

    /// Number of records in the registry
    pub fn len(&self) -> usize {
        self.records.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().unwrap().is_empty()
    }
}
