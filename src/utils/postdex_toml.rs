//! Load `postdex.toml` (CLI only). Lib callers build [`PipelineOpts`](crate::PipelineOpts) themselves.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::engine::handlers::IndexRun;

#[derive(Debug, Default, Deserialize)]
pub struct PostdexToml {
    #[serde(default)]
    settings: IndexSection,
}

#[derive(Debug, Default, Deserialize)]
struct IndexSection {
    output: Option<String>,
    threads: Option<usize>,
    capacity: Option<usize>,
    limit: Option<i64>,
    max_id: Option<u64>,
    deletes: Option<String>,
    monitor: Option<bool>,
    verbose: Option<bool>,
    language: Option<String>,
    min_clean_len: Option<usize>,
}

/// Load a config file if present. Returns None if the file does not exist. CLI only.
pub fn load_postdex_toml(path: &Path) -> Result<Option<PostdexToml>> {
    let s = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e).with_context(|| format!("read {}", path.display())),
    };
    parse_postdex_toml(&s)
        .map(Some)
        .with_context(|| format!("parse {}", path.display()))
}

pub fn parse_postdex_toml(s: &str) -> Result<PostdexToml, toml::de::Error> {
    toml::from_str(s)
}

/// Overwrite run field from file when present.
macro_rules! apply_file_opt {
    ($idx:expr, $target:expr, $idx_field:ident => $target_field:ident) => {
        if let Some(v) = $idx.$idx_field.clone() {
            $target.$target_field = v;
        }
    };
}

/// Apply file config to the run (only fields present in the file). Call before applying CLI flags.
pub fn apply_file_to_run(file: &PostdexToml, run: &mut IndexRun) {
    let idx = &file.settings;
    if let Some(ref p) = idx.output {
        run.output = PathBuf::from(p);
    }
    if let Some(ref p) = idx.deletes {
        run.deletes = Some(PathBuf::from(p));
    }
    if let Some(limit) = idx.limit {
        run.opts.doc_limit = usize::try_from(limit).ok();
    }
    apply_file_opt!(idx, run.opts, threads => num_threads);
    apply_file_opt!(idx, run.opts, capacity => channel_capacity);
    apply_file_opt!(idx, run.opts, max_id => max_id);
    apply_file_opt!(idx, run.opts, monitor => monitor);
    apply_file_opt!(idx, run.opts, language => language);
    apply_file_opt!(idx, run.opts, min_clean_len => min_clean_len);
    apply_file_opt!(idx, run, verbose => verbose);
}
