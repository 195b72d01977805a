//! Query scoring: query parsing, term statistics and the query-likelihood model.

pub mod model;
pub mod query;
pub mod stats;
pub mod stemmer;

pub use model::{QueryLikelihoodModel, score_documents};
pub use query::{WeightedQuery, parse_query};
pub use stats::{CorpusStats, TermStatistics, TextField, term_vector, tokenize};
pub use stemmer::{IdentityStemmer, LowercaseStemmer, Stemmer};
