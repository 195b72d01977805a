//! Dirichlet-smoothed query likelihood.

use anyhow::{Result, bail};
use std::collections::HashMap;

use crate::Document;
use crate::utils::config::DEFAULT_MU;

use super::query::{WeightedQuery, parse_query};
use super::stats::{TermStatistics, TextField, term_vector};
use super::stemmer::Stemmer;

/// Scores a document's term counts against a weighted query:
/// `sum(w * ln((tf + mu * ctf / N) / (doc_len + mu)))` over query terms present in the corpus.
///
/// Scores are log-likelihoods: only useful for comparing documents under the same query and
/// statistics. Higher (less negative) is a better match.
#[derive(Clone, Copy, Debug)]
pub struct QueryLikelihoodModel {
    mu: f64,
}

impl Default for QueryLikelihoodModel {
    fn default() -> Self {
        Self::new(DEFAULT_MU)
    }
}

impl QueryLikelihoodModel {
    pub fn new(mu: f64) -> Self {
        Self { mu }
    }

    pub fn mu(&self) -> f64 {
        self.mu
    }

    pub fn parse_query<S: Stemmer + ?Sized>(&self, stemmer: &S, query: &str) -> Result<WeightedQuery> {
        parse_query(query, stemmer)
    }

    /// Score one document. `doc_terms` maps stemmed term -> count in the document; counts
    /// must be non-negative.
    pub fn score<T: TermStatistics + ?Sized>(
        &self,
        stats: &T,
        field: TextField,
        query: &WeightedQuery,
        doc_terms: &HashMap<String, i64>,
    ) -> Result<f64> {
        let mut doc_len: i64 = 0;
        for (term, &count) in doc_terms {
            if count < 0 {
                bail!("negative count {} for term {:?}", count, term);
            }
            doc_len += count;
        }
        let doc_len = doc_len as f64;

        let mut collection_len: Option<f64> = None;
        let mut score = 0.0;
        for (term, weight) in query.iter() {
            let ctf = stats.collection_frequency(field, term)?;
            if ctf == 0 {
                continue;
            }
            let n = match collection_len {
                Some(n) => n,
                None => {
                    let n = stats.field_collection_length(field)?;
                    if n == 0 {
                        bail!("{} has term {:?} but an empty collection length", field, term);
                    }
                    *collection_len.insert(n as f64)
                }
            };
            let tf = doc_terms.get(term).copied().unwrap_or(0) as f64;
            score += weight * ((tf + self.mu * (ctf as f64 / n)) / (doc_len + self.mu)).ln();
        }
        Ok(score)
    }
}

/// Score every document in `docs` on `field` and return them best first.
/// Ties keep input order.
pub fn score_documents<'a, T, S>(
    model: &QueryLikelihoodModel,
    stats: &T,
    field: TextField,
    query: &WeightedQuery,
    docs: &'a [Document],
    stemmer: &S,
) -> Result<Vec<(f64, &'a Document)>>
where
    T: TermStatistics + ?Sized,
    S: Stemmer + ?Sized,
{
    let mut scored = Vec::with_capacity(docs.len());
    for doc in docs {
        let terms = term_vector(field.of(doc), stemmer);
        scored.push((model.score(stats, field, query, &terms)?, doc));
    }
    scored.sort_by(|a, b| b.0.total_cmp(&a.0));
    Ok(scored)
}
