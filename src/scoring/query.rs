//! Query parsing: raw query string -> stemmed terms with weights.

use anyhow::{Context, Result, bail};
use std::collections::BTreeMap;

use super::stemmer::Stemmer;

/// Separates a term from its explicit weight, e.g. `learning^2.5`.
pub const WEIGHT_SEPARATOR: char = '^';

/// Stemmed term -> summed weight. Ordered so scores are summed in a stable order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct WeightedQuery {
    weights: BTreeMap<String, f64>,
}

impl WeightedQuery {
    pub fn weight(&self, term: &str) -> Option<f64> {
        self.weights.get(term).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.weights.iter().map(|(t, w)| (t.as_str(), *w))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }
}

impl FromIterator<(String, f64)> for WeightedQuery {
    fn from_iter<T: IntoIterator<Item = (String, f64)>>(iter: T) -> Self {
        let mut weights = BTreeMap::new();
        for (term, w) in iter {
            *weights.entry(term).or_insert(0.0) += w;
        }
        Self { weights }
    }
}

/// Parse `query` into weighted stemmed terms.
///
/// Phrases are separated by runs of commas and whitespace. `term^w` gives an explicit weight;
/// a bare phrase gets `1 / phrase_count`. Phrases that stem to the same term add up.
/// Explicit weights must be finite.
pub fn parse_query<S: Stemmer + ?Sized>(query: &str, stemmer: &S) -> Result<WeightedQuery> {
    let phrases: Vec<&str> = query
        .trim()
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let uniform = 1.0 / phrases.len().max(1) as f64;

    let mut terms = Vec::with_capacity(phrases.len());
    for phrase in &phrases {
        let (term, weight) = match phrase.split_once(WEIGHT_SEPARATOR) {
            Some((term, rest)) => {
                let raw = rest.split(WEIGHT_SEPARATOR).next().unwrap_or("");
                if raw.is_empty() {
                    bail!("missing weight after '{}' in {:?}", WEIGHT_SEPARATOR, phrase);
                }
                let weight: f64 = raw
                    .parse()
                    .with_context(|| format!("bad weight {:?} in {:?}", raw, phrase))?;
                if !weight.is_finite() {
                    bail!("weight {:?} in {:?} is not a finite number", raw, phrase);
                }
                (term, weight)
            }
            None => (*phrase, uniform),
        };
        let stem = stemmer.stem(term);
        if stem.is_empty() {
            continue;
        }
        terms.push((stem, weight));
    }
    Ok(terms.into_iter().collect())
}
