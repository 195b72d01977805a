//! File helpers for the CLI: deletion lists.

use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::DeletionSet;

/// Parse a deletion list: one post id per line. Blank lines and `#` comments are ignored.
/// Only the first whitespace-separated field is read, so `id<TAB>anything` lines work too.
pub fn parse_deletion_set<R: BufRead>(reader: R) -> Result<DeletionSet> {
    let mut ids = DeletionSet::new();
    for (i, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("read deletes line {}", i + 1))?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let field = line.split_whitespace().next().unwrap_or(line);
        let id: u64 = field
            .parse()
            .with_context(|| format!("deletes line {}: bad id {:?}", i + 1, field))?;
        ids.insert(id);
    }
    Ok(ids)
}

/// Load a deletion list from `path`.
pub fn load_deletion_set(path: &Path) -> Result<DeletionSet> {
    let file = File::open(path).with_context(|| format!("open deletes {}", path.display()))?;
    let ids = parse_deletion_set(BufReader::new(file))?;
    log::debug!("loaded {} deleted ids from {}", ids.len(), path.display());
    Ok(ids)
}
