//! Postdex: multi-threaded social-media post ingester and query-likelihood scorer

pub mod engine;
pub mod pipeline;
pub mod scoring;
pub mod types;
pub mod utils;

/// Re-export types for API
pub use types::*;

use std::sync::Arc;

use crate::engine::{DocumentIndex, PostSource};
use crate::pipeline::{Pipeline, RunSummary};
use crate::utils::config::PipelineConsts;

/// Result alias used by public postdex API
pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, Error>;

/// Single entry point: run one ingest of `source` into `index` and block until it finishes.
///
/// Workers are released immediately and the run ends when the source is exhausted (or the
/// document limit is hit). A worker failure is reported through [`RunSummary::failed`], not as
/// an `Err`; pass the summary to [`check_run_outcome`](crate::pipeline::check_run_outcome) to
/// turn it into one. Use [`Pipeline`] directly for control over start and stop.
pub fn ingest(
    source: Box<dyn PostSource>,
    index: Arc<dyn DocumentIndex>,
    opts: &PipelineOpts,
) -> Result<RunSummary> {
    let mut pipeline = Pipeline::launch(source, index, opts)?;
    pipeline.start();
    pipeline.wait_until_done(PipelineConsts::DONE_POLL);
    pipeline.stop()
}
