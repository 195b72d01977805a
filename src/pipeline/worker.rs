//! Worker loop: wait for the start gate, then clean posts into documents and submit them.

use anyhow::{Context, Result};
use crossbeam_channel::Receiver;
use log::{debug, info};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::QueueItem;
use crate::engine::document::build_document;
use crate::engine::normalize::{Normalizer, Rejection};
use crate::engine::sink::DocumentIndex;
use crate::utils::config::PipelineConsts;

use super::context::SharedState;

/// Per-worker state handed to the thread.
pub struct WorkerContext {
    pub id: usize,
    pub normalizer: Normalizer,
    pub doc_limit: Option<usize>,
    pub state: Arc<SharedState>,
    pub index: Arc<dyn DocumentIndex>,
}

/// Rejected posts by reason.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub missing_text: usize,
    pub language: usize,
    pub too_short: usize,
    pub all_caps: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, r: Rejection) {
        match r {
            Rejection::MissingText => self.missing_text += 1,
            Rejection::Language => self.language += 1,
            Rejection::TooShort => self.too_short += 1,
            Rejection::AllCaps => self.all_caps += 1,
        }
    }

    pub fn merge(&mut self, other: &RejectionCounts) {
        self.missing_text += other.missing_text;
        self.language += other.language;
        self.too_short += other.too_short;
        self.all_caps += other.all_caps;
    }

    pub fn total(&self) -> usize {
        self.missing_text + self.language + self.too_short + self.all_caps
    }
}

/// Outcome of one worker.
#[derive(Clone, Debug, Default)]
pub struct WorkerReport {
    pub id: usize,
    /// Documents submitted to the index.
    pub submitted: usize,
    pub rejected: RejectionCounts,
    /// This worker hit the document limit and stopped consuming.
    pub limit_reached: bool,
}

pub fn spawn_workers(
    work_rx: &Receiver<QueueItem>,
    gate_rx: &Receiver<()>,
    contexts: Vec<WorkerContext>,
) -> io::Result<Vec<JoinHandle<Result<WorkerReport>>>> {
    contexts
        .into_iter()
        .map(|ctx| {
            let work_rx = work_rx.clone();
            let gate_rx = gate_rx.clone();
            thread::Builder::new()
                .name(format!("worker-{}", ctx.id))
                .spawn(move || {
                    let state = Arc::clone(&ctx.state);
                    // Flag a panic right away so `failed()` sees it before the join.
                    match panic::catch_unwind(AssertUnwindSafe(|| {
                        run_worker_loop(work_rx, gate_rx, ctx)
                    })) {
                        Ok(result) => result,
                        Err(payload) => {
                            state.mark_failed();
                            panic::resume_unwind(payload)
                        }
                    }
                })
        })
        .collect()
}

/// Block on the gate, then consume until a shutdown marker, the document limit, or a failed
/// submission. A failed submission sets the shared failure flag and ends the thread with the error.
pub fn run_worker_loop(
    work_rx: Receiver<QueueItem>,
    gate_rx: Receiver<()>,
    ctx: WorkerContext,
) -> Result<WorkerReport> {
    let t_start = Instant::now();
    // Returns once the coordinator drops the gate sender.
    let _ = gate_rx.recv();
    drop(gate_rx);

    let mut report = WorkerReport {
        id: ctx.id,
        ..WorkerReport::default()
    };

    // A closed queue means the producer is gone; same as a marker.
    while let Ok(item) = work_rx.recv() {
        let post = match item {
            QueueItem::Shutdown => break,
            QueueItem::Post(post) => post,
        };

        let clean_text = match ctx.normalizer.clean(&post) {
            Ok(text) => text,
            Err(reason) => {
                report.rejected.record(reason);
                continue;
            }
        };
        let doc = build_document(&post, clean_text);

        let Some(count) = ctx.state.try_accept(ctx.doc_limit) else {
            debug!("worker {}: document limit reached, stopping", ctx.id);
            report.limit_reached = true;
            ctx.state.request_stop();
            break;
        };
        if count % PipelineConsts::PROGRESS_LOG_EVERY == 0 {
            info!(
                "indexer: {} docs... ({:.1} sec)",
                count,
                t_start.elapsed().as_secs_f64()
            );
        }

        let id = doc.id;
        if let Err(e) = ctx
            .index
            .submit(doc)
            .with_context(|| format!("worker {} failed to submit document {}", ctx.id, id))
        {
            ctx.state.mark_failed();
            return Err(e);
        }
        report.submitted += 1;
    }
    Ok(report)
}
