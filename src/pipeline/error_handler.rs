use anyhow::Result;

use super::coordinator::RunSummary;

/// Check a finished run: if a worker failed, return an error listing the failures; otherwise log
/// what was skipped. Call after [`Pipeline::stop`](super::Pipeline::stop).
pub fn check_run_outcome(summary: &RunSummary, verbose: bool) -> Result<()> {
    if summary.failed {
        return Err(anyhow::anyhow!(
            "{} worker(s) failed, index may be incomplete: {}",
            summary.errors.len(),
            summary.errors.join("; ")
        ));
    }
    let p = &summary.producer;
    let skipped = p.skipped_no_text + p.skipped_deleted + p.skipped_above_max_id;
    if skipped > 0 {
        log::info!(
            "Skipped {} posts before queueing ({} without text, {} deleted, {} above max id)",
            skipped,
            p.skipped_no_text,
            p.skipped_deleted,
            p.skipped_above_max_id
        );
    }
    if let Some(ref e) = p.source_error {
        log::warn!("Post source ended early: {}", e);
    }
    let r = &summary.rejected;
    if verbose && r.total() > 0 {
        log::debug!(
            "Rejected {} posts: {} language, {} too short, {} all caps, {} missing text",
            r.total(),
            r.language,
            r.too_short,
            r.all_caps,
            r.missing_text
        );
    }
    Ok(())
}
