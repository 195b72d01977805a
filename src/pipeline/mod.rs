//! Ingest pipeline: shared state, producer, workers, monitor and the coordinator that runs them.

pub mod context;
pub mod coordinator;
pub mod error_handler;
pub mod monitor;
pub mod producer;
pub mod worker;

pub use context::{PipelineChannels, SharedState, create_pipeline_channels};
pub use coordinator::{Pipeline, RunSummary};
pub use error_handler::check_run_outcome;
pub use monitor::{ThroughputMonitor, ThroughputSample, run_monitor_loop, spawn_monitor};
pub use producer::{ProducerContext, ProducerReport, run_producer_loop, spawn_producer};
pub use worker::{RejectionCounts, WorkerContext, WorkerReport, run_worker_loop, spawn_workers};
