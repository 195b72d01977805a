//! Pipeline coordinator: wires the queue, spawns workers, producer and monitor, and owns the
//! start / stop / done lifecycle.

use anyhow::{Context, Result, anyhow, ensure};
use crossbeam_channel::Sender;
use log::{debug, warn};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::PipelineOpts;
use crate::engine::normalize::Normalizer;
use crate::engine::sink::DocumentIndex;
use crate::engine::source::PostSource;
use crate::utils::config::PipelineConsts;

use super::context::{SharedState, create_pipeline_channels};
use super::monitor::spawn_monitor;
use super::producer::{ProducerContext, ProducerOutcome, ProducerReport, spawn_producer};
use super::worker::{RejectionCounts, WorkerContext, WorkerReport, spawn_workers};

/// Totals for a finished run, returned by [`Pipeline::stop`].
#[derive(Clone, Debug, Default)]
pub struct RunSummary {
    /// Posts the producer pushed onto the queue.
    pub produced: usize,
    /// Final value of the shared accepted-document counter.
    pub accepted: usize,
    /// Documents the index took without error.
    pub submitted: usize,
    pub rejected: RejectionCounts,
    /// Some worker failed to submit; the index may be incomplete.
    pub failed: bool,
    /// One entry per worker that ended with an error or panicked.
    pub errors: Vec<String>,
    pub producer: ProducerReport,
    pub workers: Vec<WorkerReport>,
    pub elapsed: Duration,
}

/// A running ingest. Workers are spawned behind the start gate; the producer starts filling
/// the queue right away.
pub struct Pipeline {
    state: Arc<SharedState>,
    gate_tx: Option<Sender<()>>,
    workers: Vec<JoinHandle<Result<WorkerReport>>>,
    producer: Option<JoinHandle<ProducerOutcome>>,
    monitor: Option<JoinHandle<()>>,
    started_at: Instant,
}

impl Pipeline {
    /// Spawn every thread for a run over `source`, submitting to `index`.
    pub fn launch(
        source: Box<dyn PostSource>,
        index: Arc<dyn DocumentIndex>,
        opts: &PipelineOpts,
    ) -> Result<Self> {
        ensure!(opts.num_threads > 0, "need at least one worker thread");
        ensure!(opts.channel_capacity > 0, "channel capacity must be positive");
        debug!(
            "pipeline: {} workers, queue capacity {}, limit {:?}, max id {}",
            opts.num_threads, opts.channel_capacity, opts.doc_limit, opts.max_id
        );

        let state = Arc::new(SharedState::new());
        let channels = create_pipeline_channels(opts.channel_capacity);
        let normalizer = Normalizer::new(&opts.language, opts.min_clean_len);

        let contexts: Vec<WorkerContext> = (0..opts.num_threads)
            .map(|id| WorkerContext {
                id,
                normalizer: normalizer.clone(),
                doc_limit: opts.doc_limit,
                state: Arc::clone(&state),
                index: Arc::clone(&index),
            })
            .collect();
        let workers = spawn_workers(&channels.work_rx, &channels.gate_rx, contexts)
            .context("spawn worker threads")?;
        // Workers hold the only receivers, so the producer sees a disconnect if they all exit.
        drop(channels.work_rx);
        drop(channels.gate_rx);

        thread::sleep(PipelineConsts::PRODUCER_WARMUP);

        let producer = spawn_producer(
            channels.work_tx,
            source,
            ProducerContext {
                num_workers: opts.num_threads,
                max_id: opts.max_id,
                deletes: opts.deletes.clone(),
                state: Arc::clone(&state),
            },
        )
        .context("spawn producer thread")?;

        let monitor = if opts.monitor {
            Some(
                spawn_monitor(Arc::clone(&state), PipelineConsts::MONITOR_INTERVAL)
                    .context("spawn monitor thread")?,
            )
        } else {
            None
        };

        Ok(Self {
            state,
            gate_tx: Some(channels.gate_tx),
            workers,
            producer: Some(producer),
            monitor,
            started_at: Instant::now(),
        })
    }

    /// Release every worker at once. Calling it again does nothing.
    pub fn start(&mut self) {
        if self.gate_tx.take().is_some() {
            debug!("pipeline: start gate opened");
        }
    }

    /// Shared counters and flags, e.g. for a Ctrl+C handler that calls `request_stop`.
    pub fn state(&self) -> Arc<SharedState> {
        Arc::clone(&self.state)
    }

    /// True once every worker thread has exited.
    pub fn done(&self) -> bool {
        self.workers.iter().all(|h| h.is_finished())
    }

    pub fn failed(&self) -> bool {
        self.state.failed()
    }

    /// Poll [`done`](Self::done) every `poll` until it is true.
    pub fn wait_until_done(&self, poll: Duration) {
        while !self.done() {
            thread::sleep(poll);
        }
    }

    /// Set the stop flag, join workers, producer and monitor, then close the source.
    ///
    /// A worker failure does not make this an error: check [`RunSummary::failed`]. Errors here
    /// are a panicked producer or a source that failed to close.
    pub fn stop(mut self) -> Result<RunSummary> {
        self.state.request_stop();
        // Never started: let the workers run so they can drain to their markers.
        self.start();

        let mut summary = RunSummary::default();
        for (i, handle) in self.workers.drain(..).enumerate() {
            match handle.join() {
                Ok(Ok(report)) => {
                    summary.submitted += report.submitted;
                    summary.rejected.merge(&report.rejected);
                    summary.workers.push(report);
                }
                Ok(Err(e)) => {
                    warn!("worker {} ended with error: {:#}", i, e);
                    summary.errors.push(format!("{:#}", e));
                }
                Err(_) => {
                    self.state.mark_failed();
                    summary.errors.push(format!("worker {} panicked", i));
                }
            }
        }
        if let Some(monitor) = self.monitor.take()
            && monitor.join().is_err()
        {
            warn!("monitor thread panicked");
        }

        let producer = self
            .producer
            .take()
            .ok_or_else(|| anyhow!("producer already joined"))?;
        let (mut source, producer_report) = producer
            .join()
            .map_err(|_| anyhow!("producer thread panicked"))?;
        source.close().context("close post source")?;

        summary.produced = self.state.produced();
        summary.accepted = self.state.accepted();
        summary.failed = self.state.failed();
        summary.producer = producer_report;
        summary.elapsed = self.started_at.elapsed();
        Ok(summary)
    }
}
