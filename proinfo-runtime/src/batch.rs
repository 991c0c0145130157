//! Batch orchestration
//!
//! Targets are materialized as PENDING records up front, then analyzed in
//! fixed-size waves. Each wave runs concurrently and the next wave starts
//! only once the current one has settled. A snapshot of the whole ordered
//! sequence is published before the first wave and after every wave.

use futures::future::join_all;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, info, warn};

use proinfo_core::{Investigation, TargetRecord};

use crate::{Correlator, HistoryArchive, HistoryEntry};

/// Receives ordered record snapshots as a batch progresses
pub trait SnapshotSink: Send + Sync {
    fn publish(&self, snapshot: Vec<TargetRecord>);
}

impl SnapshotSink for UnboundedSender<Vec<TargetRecord>> {
    fn publish(&self, snapshot: Vec<TargetRecord>) {
        if self.send(snapshot).is_err() {
            debug!("Snapshot receiver dropped");
        }
    }
}

/// Discards snapshots
impl SnapshotSink for () {
    fn publish(&self, _snapshot: Vec<TargetRecord>) {}
}

/// Runs many targets through the correlator in waves
pub struct BatchOrchestrator {
    correlator: Correlator,
    wave_size: usize,
    archive: Option<Arc<dyn HistoryArchive>>,
}

impl BatchOrchestrator {
    pub fn new(correlator: Correlator, wave_size: usize) -> Self {
        Self {
            correlator,
            wave_size: wave_size.max(1),
            archive: None,
        }
    }

    /// Archive every completed batch
    pub fn with_archive(mut self, archive: Arc<dyn HistoryArchive>) -> Self {
        self.archive = Some(archive);
        self
    }

    pub fn wave_size(&self) -> usize {
        self.wave_size
    }

    /// Analyze `targets` at depth 0, preserving input order.
    ///
    /// Repeated targets are collapsed to their first occurrence.
    pub async fn run<S: AsRef<str>>(&self, targets: &[S], sink: &dyn SnapshotSink) -> Investigation {
        let mut investigation = Investigation::new();
        let mut order = Vec::with_capacity(targets.len());
        for target in targets {
            let target = target.as_ref();
            if investigation.push_root(TargetRecord::pending(target)) {
                order.push(target.to_string());
            } else {
                debug!("Skipping repeated target {}", target);
            }
        }

        sink.publish(investigation.records());

        let waves = order.len().div_ceil(self.wave_size);
        info!(
            "Analyzing {} targets in {} waves of up to {}",
            order.len(),
            waves,
            self.wave_size
        );

        for (index, wave) in order.chunks(self.wave_size).enumerate() {
            let results = join_all(wave.iter().map(|target| self.correlator.analyze(target, 0, None))).await;

            for record in results {
                investigation.complete(record);
            }
            debug!("Wave {}/{} settled", index + 1, waves);
            sink.publish(investigation.records());
        }

        if let Some(archive) = &self.archive {
            if let Err(e) = archive.append(HistoryEntry::new(investigation.records())).await {
                warn!("Failed to archive batch: {}", e);
            }
        }

        let failed = investigation.iter().filter(|r| !r.is_success()).count();
        info!(
            "Batch complete: {} analyzed, {} failed",
            investigation.len(),
            failed
        );

        investigation
    }
}
