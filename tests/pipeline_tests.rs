//! Pipeline tests: producer filtering and markers, start gate, document limit, failure path,
//! source lifecycle, throughput math.

use anyhow::bail;
use crossbeam_channel::bounded;
use postdex::engine::{DocumentIndex, MemoryIndex, PostSource, VecSource, parse_deletion_set};
use postdex::pipeline::{
    Pipeline, ProducerContext, SharedState, ThroughputMonitor, check_run_outcome,
    run_producer_loop,
};
use postdex::{DeletionSet, Document, PipelineOpts, QueueItem, RawPost, ingest};
use std::io::Cursor;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

fn post(id: u64) -> RawPost {
    RawPost {
        id,
        text: Some(format!("post number {} has plenty of words in it", id)),
        lang: Some("en".to_string()),
        ..Default::default()
    }
}

fn posts(n: u64) -> Vec<RawPost> {
    (1..=n).map(post).collect()
}

fn opts(threads: usize, capacity: usize) -> PipelineOpts {
    PipelineOpts {
        num_threads: threads,
        channel_capacity: capacity,
        ..PipelineOpts::default()
    }
}

/// Source that records whether it was closed and optionally fails after some posts.
struct TrackedSource {
    inner: VecSource,
    remaining: Option<usize>,
    closed: Arc<AtomicBool>,
}

impl TrackedSource {
    fn new(posts: Vec<RawPost>, fail_after: Option<usize>) -> (Self, Arc<AtomicBool>) {
        let closed = Arc::new(AtomicBool::new(false));
        let source = Self {
            inner: VecSource::new(posts),
            remaining: fail_after,
            closed: Arc::clone(&closed),
        };
        (source, closed)
    }
}

impl PostSource for TrackedSource {
    fn next(&mut self) -> anyhow::Result<Option<RawPost>> {
        if let Some(n) = self.remaining.as_mut() {
            if *n == 0 {
                bail!("stream reset");
            }
            *n -= 1;
        }
        self.inner.next()
    }

    fn close(&mut self) -> anyhow::Result<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

fn producer_ctx(num_workers: usize) -> ProducerContext {
    ProducerContext {
        num_workers,
        max_id: u64::MAX,
        deletes: None,
        state: Arc::new(SharedState::new()),
    }
}

// --- producer ---

#[test]
fn test_producer_sends_one_marker_per_worker() {
    let (tx, rx) = bounded(64);
    let mut source = VecSource::new(posts(5));
    let report = run_producer_loop(&tx, &mut source, &producer_ctx(3));
    drop(tx);

    let items: Vec<QueueItem> = rx.iter().collect();
    let markers = items
        .iter()
        .filter(|i| matches!(i, QueueItem::Shutdown))
        .count();
    assert_eq!(items.len(), 8);
    assert_eq!(markers, 3);
    assert!(matches!(items.last(), Some(QueueItem::Shutdown)));
    assert_eq!(report.produced, 5);
    assert_eq!(report.markers_sent, 3);
    assert!(!report.disconnected);
}

#[test]
fn test_producer_filters() {
    let mut input = posts(10);
    input[4].text = None; // id 5
    let deletes: DeletionSet = [2, 3].into_iter().collect();
    let ctx = ProducerContext {
        num_workers: 1,
        max_id: 8,
        deletes: Some(deletes),
        state: Arc::new(SharedState::new()),
    };
    let (tx, rx) = bounded(64);
    let report = run_producer_loop(&tx, &mut VecSource::new(input), &ctx);
    drop(tx);

    let ids: Vec<u64> = rx
        .iter()
        .filter_map(|i| match i {
            QueueItem::Post(p) => Some(p.id),
            QueueItem::Shutdown => None,
        })
        .collect();
    assert_eq!(ids, vec![1, 4, 6, 7, 8]);
    assert_eq!(report.skipped_no_text, 1);
    assert_eq!(report.skipped_deleted, 2);
    assert_eq!(report.skipped_above_max_id, 2);
    assert_eq!(ctx.state.produced(), 5);
}

#[test]
fn test_producer_stop_flag_still_sends_markers() {
    let ctx = producer_ctx(2);
    ctx.state.request_stop();
    let (tx, rx) = bounded(8);
    let report = run_producer_loop(&tx, &mut VecSource::new(posts(5)), &ctx);
    drop(tx);
    assert_eq!(report.produced, 0);
    assert_eq!(report.markers_sent, 2);
    assert_eq!(rx.iter().count(), 2);
}

#[test]
fn test_producer_disconnected_does_not_block() {
    let (tx, rx) = bounded(1);
    drop(rx);
    let report = run_producer_loop(&tx, &mut VecSource::new(posts(5)), &producer_ctx(4));
    assert!(report.disconnected);
    assert_eq!(report.produced, 0);
    assert_eq!(report.markers_sent, 0);
}

#[test]
fn test_producer_source_error_ends_intake() {
    let (mut source, _closed) = TrackedSource::new(posts(10), Some(3));
    let (tx, rx) = bounded(64);
    let report = run_producer_loop(&tx, &mut source, &producer_ctx(2));
    drop(tx);
    assert_eq!(report.produced, 3);
    assert!(report.source_error.as_deref().unwrap().contains("stream reset"));
    assert_eq!(report.markers_sent, 2);
    assert_eq!(rx.iter().count(), 5);
}

// --- full runs ---

#[test]
fn test_ingest_all_valid() {
    let index = Arc::new(MemoryIndex::new());
    let summary = ingest(Box::new(VecSource::new(posts(50))), index.clone(), &opts(4, 8)).unwrap();
    assert_eq!(index.len(), 50);
    assert_eq!(summary.produced, 50);
    assert_eq!(summary.accepted, 50);
    assert_eq!(summary.submitted, 50);
    assert_eq!(summary.producer.markers_sent, 4);
    assert_eq!(summary.workers.len(), 4);
    assert!(!summary.failed);
    assert!(summary.errors.is_empty());
    let ids: Vec<u64> = index.documents().iter().map(|d| d.id).collect();
    assert_eq!(ids, (1..=50).collect::<Vec<_>>());
    check_run_outcome(&summary, true).unwrap();
}

#[test]
fn test_ingest_counts_rejections() {
    let mut input = posts(6);
    input[0].lang = Some("fr".to_string());
    input[1].text = Some("too short".to_string());
    input[2].text = Some("THIS POST IS SHOUTING VERY LOUDLY".to_string());
    let index = Arc::new(MemoryIndex::new());
    let summary = ingest(Box::new(VecSource::new(input)), index.clone(), &opts(2, 4)).unwrap();
    assert_eq!(index.len(), 3);
    assert_eq!(summary.rejected.language, 1);
    assert_eq!(summary.rejected.too_short, 1);
    assert_eq!(summary.rejected.all_caps, 1);
    assert_eq!(summary.rejected.total(), 3);
}

#[test]
fn test_ingest_empty_source() {
    let index = Arc::new(MemoryIndex::new());
    let summary = ingest(Box::new(VecSource::new(Vec::new())), index.clone(), &opts(3, 2)).unwrap();
    assert!(index.is_empty());
    assert_eq!(summary.produced, 0);
    assert_eq!(summary.producer.markers_sent, 3);
}

#[test]
fn test_workers_wait_for_start_gate() {
    let index = Arc::new(MemoryIndex::new());
    let mut pipeline =
        Pipeline::launch(Box::new(VecSource::new(posts(20))), index.clone(), &opts(3, 4)).unwrap();
    thread::sleep(Duration::from_millis(50));
    assert!(!pipeline.done());
    assert!(index.is_empty());

    pipeline.start();
    pipeline.wait_until_done(Duration::from_millis(5));
    assert!(pipeline.done());
    let summary = pipeline.stop().unwrap();
    assert_eq!(index.len(), 20);
    assert_eq!(summary.producer.markers_sent, 3);
}

#[test]
fn test_stop_without_start_drains() {
    let index = Arc::new(MemoryIndex::new());
    let pipeline =
        Pipeline::launch(Box::new(VecSource::new(posts(100))), index.clone(), &opts(2, 4)).unwrap();
    let summary = pipeline.stop().unwrap();
    assert!(!summary.failed);
    assert!(index.len() <= 100);
    assert_eq!(summary.submitted, index.len());
}

#[test]
fn test_document_limit() {
    let threads = 4;
    let limit = 10;
    let index = Arc::new(MemoryIndex::new());
    let opts = opts(threads, 2).with_limit(limit as i64);
    let summary = ingest(Box::new(VecSource::new(posts(500))), index.clone(), &opts).unwrap();
    assert!(index.len() <= limit);
    assert!(summary.accepted <= limit + threads - 1);
    assert_eq!(summary.accepted, limit);
    assert!(summary.workers.iter().any(|w| w.limit_reached));
    assert!(summary.produced < 500);
}

#[test]
fn test_no_limit_when_negative() {
    let opts = PipelineOpts::default().with_limit(-1);
    assert_eq!(opts.doc_limit, None);
    let opts = opts.with_limit(7);
    assert_eq!(opts.doc_limit, Some(7));
}

#[test]
fn test_failing_index_marks_run_failed() {
    let index = Arc::new(MemoryIndex::failing_after(5));
    let summary = ingest(Box::new(VecSource::new(posts(100))), index.clone(), &opts(2, 4)).unwrap();
    assert!(summary.failed);
    assert_eq!(index.len(), 5);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors[0].contains("failed to submit"));
    assert!(check_run_outcome(&summary, false).is_err());
}

/// Index whose submit always panics.
struct PanickingIndex;

impl DocumentIndex for PanickingIndex {
    fn submit(&self, doc: Document) -> anyhow::Result<()> {
        panic!("index blew up on document {}", doc.id);
    }
}

#[test]
fn test_worker_panic_marks_failed_before_stop() {
    let mut pipeline = Pipeline::launch(
        Box::new(VecSource::new(posts(20))),
        Arc::new(PanickingIndex),
        &opts(2, 4),
    )
    .unwrap();
    pipeline.start();
    pipeline.wait_until_done(Duration::from_millis(5));
    assert!(pipeline.failed());

    let summary = pipeline.stop().unwrap();
    assert!(summary.failed);
    assert_eq!(summary.errors.len(), 2);
    assert!(summary.errors.iter().all(|e| e.contains("panicked")));
}

#[test]
fn test_source_closed_after_run() {
    let (source, closed) = TrackedSource::new(posts(10), None);
    let index = Arc::new(MemoryIndex::new());
    ingest(Box::new(source), index, &opts(2, 4)).unwrap();
    assert!(closed.load(Ordering::SeqCst));
}

#[test]
fn test_source_error_mid_run() {
    let (source, closed) = TrackedSource::new(posts(10), Some(4));
    let index = Arc::new(MemoryIndex::new());
    let summary = ingest(Box::new(source), index.clone(), &opts(2, 4)).unwrap();
    assert_eq!(index.len(), 4);
    assert!(summary.producer.source_error.is_some());
    assert!(closed.load(Ordering::SeqCst));
    check_run_outcome(&summary, false).unwrap();
}

#[test]
fn test_launch_rejects_zero_threads() {
    let index = Arc::new(MemoryIndex::new());
    assert!(Pipeline::launch(Box::new(VecSource::new(posts(1))), index, &opts(0, 4)).is_err());
}

// --- monitor ---

#[test]
fn test_throughput_sample_rates() {
    let t0 = Instant::now();
    let mut monitor = ThroughputMonitor::new(t0, 0, 0);
    let s = monitor.sample(t0 + Duration::from_millis(500), 1000, 400);
    assert_eq!(s.elapsed, Duration::from_millis(500));
    assert!((s.produced_per_sec - 2000.0).abs() < 1e-6);
    assert!((s.accepted_per_sec - 800.0).abs() < 1e-6);

    let s = monitor.sample(t0 + Duration::from_millis(1500), 1500, 400);
    assert_eq!(s.elapsed, Duration::from_millis(1500));
    assert!((s.produced_per_sec - 500.0).abs() < 1e-6);
    assert_eq!(s.accepted_per_sec, 0.0);
    assert_eq!(s.produced, 1500);
}

#[test]
fn test_throughput_sample_zero_interval() {
    let t0 = Instant::now();
    let mut monitor = ThroughputMonitor::new(t0, 0, 0);
    let s = monitor.sample(t0, 10, 10);
    assert_eq!(s.produced_per_sec, 0.0);
    assert_eq!(s.accepted_per_sec, 0.0);
}

// --- deletion lists ---

#[test]
fn test_parse_deletion_set() {
    let input = "# deleted posts\n1\n\n  2\textra\n3 more\n";
    let ids = parse_deletion_set(Cursor::new(input)).unwrap();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&1) && ids.contains(&2) && ids.contains(&3));
}

#[test]
fn test_parse_deletion_set_bad_id() {
    assert!(parse_deletion_set(Cursor::new("12\nnot-a-number\n")).is_err());
}
