//! Engine: post cleaning, document building, sources and indexes, and the CLI front end.

pub mod arg_parser;
pub mod document;
pub mod handlers;
pub mod normalize;
pub mod sink;
pub mod source;
pub mod tools;

// Re-export commonly used items
pub use arg_parser::{Cli, Commands, IndexArgs, ScoreArgs};
pub use document::build_document;
pub use handlers::{IndexRun, handle_index, handle_run, handle_score};
pub use normalize::{Normalizer, Rejection};
pub use sink::{DocumentIndex, JsonLinesIndex, MemoryIndex, load_documents};
pub use source::{JsonLinesSource, PostSource, VecSource};
pub use tools::{load_deletion_set, parse_deletion_set};
