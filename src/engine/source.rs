//! Post sources: the sequential stream the producer reads from.

use anyhow::{Context, Result};
use log::{debug, warn};
use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::RawPost;

/// A sequential stream of posts. `Ok(None)` is end-of-stream.
///
/// The producer owns the source for the length of a run and hands it back to the
/// coordinator, which calls [`close`](PostSource::close) after every thread is joined.
pub trait PostSource: Send {
    fn next(&mut self) -> Result<Option<RawPost>>;

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Reads one JSON [`RawPost`] per line. Blank lines are skipped; lines that are not UTF-8 or do
/// not parse are logged and skipped so a single corrupt record doesn't end the run.
pub struct JsonLinesSource<R: BufRead + Send> {
    reader: Option<R>,
    line: Vec<u8>,
    line_no: usize,
    malformed: usize,
}

impl JsonLinesSource<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("open posts {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead + Send> JsonLinesSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader: Some(reader),
            line: Vec::new(),
            line_no: 0,
            malformed: 0,
        }
    }

    /// Lines skipped because they were not valid posts.
    pub fn malformed(&self) -> usize {
        self.malformed
    }
}

impl<R: BufRead + Send> PostSource for JsonLinesSource<R> {
    fn next(&mut self) -> Result<Option<RawPost>> {
        let Some(reader) = self.reader.as_mut() else {
            return Ok(None);
        };
        loop {
            self.line.clear();
            let n = reader
                .read_until(b'\n', &mut self.line)
                .with_context(|| format!("read posts line {}", self.line_no + 1))?;
            if n == 0 {
                return Ok(None);
            }
            self.line_no += 1;
            let text = match std::str::from_utf8(&self.line) {
                Ok(text) => text,
                Err(e) => {
                    self.malformed += 1;
                    warn!("line {}: skipping post that is not UTF-8: {}", self.line_no, e);
                    continue;
                }
            };
            let trimmed = text.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<RawPost>(trimmed) {
                Ok(post) => return Ok(Some(post)),
                Err(e) => {
                    self.malformed += 1;
                    warn!("line {}: skipping malformed post: {}", self.line_no, e);
                }
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        if self.reader.take().is_some() {
            debug!(
                "posts source closed after {} lines ({} malformed)",
                self.line_no, self.malformed
            );
        }
        Ok(())
    }
}

/// In-memory source, mostly for tests and embedding.
#[derive(Default)]
pub struct VecSource {
    posts: VecDeque<RawPost>,
}

impl VecSource {
    pub fn new(posts: Vec<RawPost>) -> Self {
        Self {
            posts: posts.into(),
        }
    }
}

impl PostSource for VecSource {
    fn next(&mut self) -> Result<Option<RawPost>> {
        Ok(self.posts.pop_front())
    }
}
