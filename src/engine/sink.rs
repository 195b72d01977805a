//! Document indexes: where workers hand finished documents.

use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::Document;

/// Storage for finished documents. Called concurrently from every worker, so implementations
/// synchronize internally. An error from [`submit`](DocumentIndex::submit) is fatal to the
/// submitting worker.
pub trait DocumentIndex: Send + Sync {
    fn submit(&self, doc: Document) -> Result<()>;

    /// Make everything submitted so far durable. Called once after the run.
    fn flush(&self) -> Result<()> {
        Ok(())
    }
}

/// Appends one JSON document per line to a writer.
pub struct JsonLinesIndex<W: Write + Send> {
    writer: Mutex<W>,
}

impl JsonLinesIndex<BufWriter<File>> {
    pub fn create(path: &Path) -> Result<Self> {
        let file =
            File::create(path).with_context(|| format!("create output {}", path.display()))?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write + Send> JsonLinesIndex<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer: Mutex::new(writer),
        }
    }

    pub fn into_inner(self) -> W {
        self.writer.into_inner().unwrap_or_else(|e| e.into_inner())
    }
}

impl<W: Write + Send> DocumentIndex for JsonLinesIndex<W> {
    fn submit(&self, doc: Document) -> Result<()> {
        let line = serde_json::to_string(&doc).context("serialize document")?;
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        writeln!(w, "{}", line).context("write document")?;
        Ok(())
    }

    fn flush(&self) -> Result<()> {
        let mut w = self.writer.lock().unwrap_or_else(|e| e.into_inner());
        w.flush().context("flush documents")
    }
}

/// Read back documents written by [`JsonLinesIndex`].
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let file = File::open(path).with_context(|| format!("open documents {}", path.display()))?;
    let mut docs = Vec::new();
    for (i, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read documents line {}", i + 1))?;
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(&line)
            .with_context(|| format!("{}: line {}", path.display(), i + 1))?;
        docs.push(doc);
    }
    Ok(docs)
}

/// Keeps documents in memory. `fail_after` makes every submission past the first N fail,
/// which is how the failure path of the pipeline is exercised.
#[derive(Default)]
pub struct MemoryIndex {
    docs: Mutex<Vec<Document>>,
    fail_after: Option<usize>,
    attempts: AtomicUsize,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_after(n: usize) -> Self {
        Self {
            fail_after: Some(n),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.docs.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of stored documents, sorted by id (submission order is not deterministic).
    pub fn documents(&self) -> Vec<Document> {
        let mut docs = self.docs.lock().unwrap_or_else(|e| e.into_inner()).clone();
        docs.sort_by_key(|d| d.id);
        docs
    }
}

impl DocumentIndex for MemoryIndex {
    fn submit(&self, doc: Document) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(limit) = self.fail_after
            && attempt > limit
        {
            bail!("index rejected document {} (attempt {})", doc.id, attempt);
        }
        self.docs
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(doc);
        Ok(())
    }
}
