//! Pipeline context: shared counters and flags, and the channels every thread is wired with.

use crossbeam_channel::{Receiver, Sender, bounded};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::QueueItem;

/// Counters and flags shared by the producer, workers and monitor for one run.
///
/// Both flags are monotonic: once set they stay set for the rest of the run.
#[derive(Debug, Default)]
pub struct SharedState {
    produced: AtomicUsize,
    accepted: AtomicUsize,
    stop: AtomicBool,
    failed: AtomicBool,
}

impl SharedState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn produced(&self) -> usize {
        self.produced.load(Ordering::Relaxed)
    }

    pub(crate) fn record_produced(&self) {
        self.produced.fetch_add(1, Ordering::Relaxed);
    }

    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::SeqCst)
    }

    /// Claim one accepted-document slot. Returns the new count, or `None` when `limit` is already
    /// used up. The counter never moves past `limit`.
    pub(crate) fn try_accept(&self, limit: Option<usize>) -> Option<usize> {
        self.accepted
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |count| match limit {
                Some(limit) if count >= limit => None,
                _ => Some(count + 1),
            })
            .ok()
            .map(|prev| prev + 1)
    }

    pub fn request_stop(&self) {
        self.stop.store(true, Ordering::SeqCst);
    }

    pub fn stop_requested(&self) -> bool {
        self.stop.load(Ordering::SeqCst)
    }

    pub fn mark_failed(&self) {
        self.failed.store(true, Ordering::SeqCst);
    }

    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }
}

/// Channels for one run. The producer gets `work_tx`; workers get clones of `work_rx` and
/// `gate_rx`. Nothing ever sends on the gate: dropping `gate_tx` releases every worker at once.
pub struct PipelineChannels {
    pub work_tx: Sender<QueueItem>,
    pub work_rx: Receiver<QueueItem>,
    pub gate_tx: Sender<()>,
    pub gate_rx: Receiver<()>,
}

pub fn create_pipeline_channels(channel_cap: usize) -> PipelineChannels {
    let (work_tx, work_rx) = bounded::<QueueItem>(channel_cap);
    let (gate_tx, gate_rx) = bounded::<()>(0);
    PipelineChannels {
        work_tx,
        work_rx,
        gate_tx,
        gate_rx,
    }
}
