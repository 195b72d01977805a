//! Producer loop: pull posts from the source, filter, push onto the work queue, then send one
//! termination marker per worker.

use crossbeam_channel::Sender;
use log::{debug, info, warn};
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::engine::source::PostSource;
use crate::{DeletionSet, QueueItem};

use super::context::SharedState;

/// What the producer needs besides the queue and the source.
pub struct ProducerContext {
    pub num_workers: usize,
    pub max_id: u64,
    pub deletes: Option<DeletionSet>,
    pub state: Arc<SharedState>,
}

/// Outcome of one producer run.
#[derive(Clone, Debug, Default)]
pub struct ProducerReport {
    /// Posts pushed onto the queue.
    pub produced: usize,
    pub skipped_no_text: usize,
    pub skipped_deleted: usize,
    pub skipped_above_max_id: usize,
    /// Termination markers that made it onto the queue.
    pub markers_sent: usize,
    /// Every worker was gone before the producer finished sending.
    pub disconnected: bool,
    /// Source failure that ended intake early (treated as end of stream).
    pub source_error: Option<String>,
    pub elapsed: Duration,
}

/// Result the producer thread hands back on join: the source (so the coordinator can close it)
/// and the report.
pub type ProducerOutcome = (Box<dyn PostSource>, ProducerReport);

pub fn spawn_producer(
    work_tx: Sender<QueueItem>,
    mut source: Box<dyn PostSource>,
    ctx: ProducerContext,
) -> io::Result<JoinHandle<ProducerOutcome>> {
    thread::Builder::new()
        .name("producer".to_string())
        .spawn(move || {
            let report = run_producer_loop(&work_tx, source.as_mut(), &ctx);
            (source, report)
        })
}

/// Read posts until end-of-stream or stop, then send `ctx.num_workers` shutdown markers.
///
/// Source errors end intake like end-of-stream. A send error means every receiver is gone, so
/// there is nobody left to deliver to and the loop ends without further markers.
pub fn run_producer_loop(
    work_tx: &Sender<QueueItem>,
    source: &mut dyn PostSource,
    ctx: &ProducerContext,
) -> ProducerReport {
    let start = Instant::now();
    let mut report = ProducerReport::default();
    info!("producer: start");

    while !ctx.state.stop_requested() {
        let post = match source.next() {
            Ok(Some(post)) => post,
            Ok(None) => break,
            Err(e) => {
                warn!("producer: source failed, treating as end of stream: {:#}", e);
                report.source_error = Some(format!("{:#}", e));
                break;
            }
        };

        if post.text.is_none() {
            report.skipped_no_text += 1;
            continue;
        }
        if ctx.deletes.as_ref().is_some_and(|d| d.contains(&post.id)) {
            report.skipped_deleted += 1;
            continue;
        }
        if post.id > ctx.max_id {
            report.skipped_above_max_id += 1;
            continue;
        }

        if work_tx.send(QueueItem::Post(Box::new(post))).is_err() {
            report.disconnected = true;
            break;
        }
        report.produced += 1;
        ctx.state.record_produced();
    }

    if !report.disconnected {
        for _ in 0..ctx.num_workers {
            if work_tx.send(QueueItem::Shutdown).is_err() {
                report.disconnected = true;
                break;
            }
            report.markers_sent += 1;
        }
    }
    if report.disconnected {
        debug!("producer: all workers gone, stopped sending");
    }

    report.elapsed = start.elapsed();
    let secs = report.elapsed.as_secs_f64();
    let rate = if secs > 0.0 {
        report.produced as f64 / secs
    } else {
        0.0
    };
    info!(
        "producer: done, {} posts in {:.1} sec ({:.0} posts/sec)",
        report.produced, secs, rate
    );
    report
}
