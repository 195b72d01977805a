//! Corpus term statistics and document term vectors.

use anyhow::{Result, bail};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use crate::Document;

use super::stemmer::Stemmer;

/// Text fields of a [`Document`] that can be scored.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum TextField {
    /// Raw post text.
    Text,
    /// Cleaned text.
    #[default]
    TextEnglish,
}

impl TextField {
    pub fn name(&self) -> &'static str {
        match self {
            TextField::Text => "text",
            TextField::TextEnglish => "text_english",
        }
    }

    pub fn of<'a>(&self, doc: &'a Document) -> &'a str {
        match self {
            TextField::Text => &doc.text,
            TextField::TextEnglish => &doc.text_english,
        }
    }
}

impl fmt::Display for TextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TextField {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(TextField::Text),
            "text_english" => Ok(TextField::TextEnglish),
            other => bail!("unknown field {:?} (expected text or text_english)", other),
        }
    }
}

/// Corpus-side numbers the scorer asks for, per field.
pub trait TermStatistics {
    /// Total occurrences of `term` in `field` across the corpus.
    fn collection_frequency(&self, field: TextField, term: &str) -> Result<u64>;
    /// Total number of term occurrences in `field` across the corpus.
    fn field_collection_length(&self, field: TextField) -> Result<u64>;
}

/// Split on anything that is not alphanumeric and lower-case the pieces.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

/// Term -> count for one text, after stemming. Tokens that stem to nothing are dropped.
pub fn term_vector<S: Stemmer + ?Sized>(text: &str, stemmer: &S) -> HashMap<String, i64> {
    let mut counts = HashMap::new();
    for token in tokenize(text) {
        let stem = stemmer.stem(&token);
        if stem.is_empty() {
            continue;
        }
        *counts.entry(stem).or_insert(0) += 1;
    }
    counts
}

/// In-memory statistics for one field, built from a set of documents.
#[derive(Clone, Debug, Default)]
pub struct CorpusStats {
    field: TextField,
    term_freqs: HashMap<String, u64>,
    total_terms: u64,
    doc_count: usize,
}

impl CorpusStats {
    pub fn new(field: TextField) -> Self {
        Self {
            field,
            ..Self::default()
        }
    }

    pub fn from_documents<'a, I, S>(docs: I, field: TextField, stemmer: &S) -> Self
    where
        I: IntoIterator<Item = &'a Document>,
        S: Stemmer + ?Sized,
    {
        let mut stats = Self::new(field);
        for doc in docs {
            stats.fold_terms(&term_vector(field.of(doc), stemmer));
        }
        stats
    }

    /// Fold one document's term vector into the totals. Negative counts are an error and leave
    /// the totals untouched.
    pub fn add_terms(&mut self, terms: &HashMap<String, i64>) -> Result<()> {
        if let Some((term, count)) = terms.iter().find(|(_, c)| **c < 0) {
            bail!("negative count {} for term {:?}", count, term);
        }
        self.fold_terms(terms);
        Ok(())
    }

    /// Counts must already be non-negative.
    fn fold_terms(&mut self, terms: &HashMap<String, i64>) {
        for (term, &count) in terms {
            let count = count as u64;
            *self.term_freqs.entry(term.clone()).or_insert(0) += count;
            self.total_terms += count;
        }
        self.doc_count += 1;
    }

    pub fn field(&self) -> TextField {
        self.field
    }

    pub fn doc_count(&self) -> usize {
        self.doc_count
    }

    fn check_field(&self, field: TextField) -> Result<()> {
        if field != self.field {
            bail!("statistics were built for {}, not {}", self.field, field);
        }
        Ok(())
    }
}

impl TermStatistics for CorpusStats {
    fn collection_frequency(&self, field: TextField, term: &str) -> Result<u64> {
        self.check_field(field)?;
        Ok(self.term_freqs.get(term).copied().unwrap_or(0))
    }

    fn field_collection_length(&self, field: TextField) -> Result<u64> {
        self.check_field(field)?;
        Ok(self.total_terms)
    }
}
