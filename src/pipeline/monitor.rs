//! Throughput monitor: samples the shared counters on a fixed interval and logs rates.

use log::info;
use std::io;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use super::context::SharedState;

/// One monitor reading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ThroughputSample {
    /// Time since the monitor started.
    pub elapsed: Duration,
    /// Posts pushed per second since the previous sample.
    pub produced_per_sec: f64,
    /// Documents accepted per second since the previous sample.
    pub accepted_per_sec: f64,
    pub produced: usize,
    pub accepted: usize,
}

/// Rate bookkeeping between samples. Pure; the thread loop feeds it counter readings.
#[derive(Clone, Debug)]
pub struct ThroughputMonitor {
    start: Instant,
    last_at: Instant,
    last_produced: usize,
    last_accepted: usize,
}

impl ThroughputMonitor {
    pub fn new(now: Instant, produced: usize, accepted: usize) -> Self {
        Self {
            start: now,
            last_at: now,
            last_produced: produced,
            last_accepted: accepted,
        }
    }

    /// Rates since the previous sample; moves the baseline to this reading.
    pub fn sample(&mut self, now: Instant, produced: usize, accepted: usize) -> ThroughputSample {
        let secs = now.saturating_duration_since(self.last_at).as_secs_f64();
        let rate = |delta: usize| {
            if secs > 0.0 {
                delta as f64 / secs
            } else {
                0.0
            }
        };
        let sample = ThroughputSample {
            elapsed: now.saturating_duration_since(self.start),
            produced_per_sec: rate(produced.saturating_sub(self.last_produced)),
            accepted_per_sec: rate(accepted.saturating_sub(self.last_accepted)),
            produced,
            accepted,
        };
        self.last_at = now;
        self.last_produced = produced;
        self.last_accepted = accepted;
        sample
    }
}

pub fn spawn_monitor(state: Arc<SharedState>, interval: Duration) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("monitor".to_string())
        .spawn(move || run_monitor_loop(&state, interval))
}

/// Log a sample every `interval` until the stop flag is set.
pub fn run_monitor_loop(state: &SharedState, interval: Duration) {
    let mut monitor = ThroughputMonitor::new(Instant::now(), state.produced(), state.accepted());
    info!("monitor: start ingest");
    while !state.stop_requested() {
        thread::sleep(interval);
        let s = monitor.sample(Instant::now(), state.produced(), state.accepted());
        info!(
            "ingest: {} ms, {:.0} posts/sec, {:.0} docs/sec, {} produced, {} accepted",
            s.elapsed.as_millis(),
            s.produced_per_sec,
            s.accepted_per_sec,
            s.produced,
            s.accepted
        );
    }
}
