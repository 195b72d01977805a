use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::utils::config::{DEFAULT_MU, DEFAULT_TOP};

/// Clean social-media posts into index-ready documents, and score documents against a query.
#[derive(Clone, Parser)]
#[command(name = "postdex")]
#[command(about = "Index a stream of posts into documents, or score documents against a query.")]
pub struct Cli {
    /// Verbose output.
    #[arg(long, short = 'v', global = true, num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub verbose: Option<bool>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    /// Run the ingest pipeline over a JSON-lines post file.
    Index(IndexArgs),
    /// Score documents written by `index` against a weighted query.
    Score(ScoreArgs),
}

#[derive(Clone, Args)]
pub struct IndexArgs {
    /// JSON-lines file with one post per line.
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Where to write documents. Default: `postdex.docs.jsonl`.
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Config file. Default: `postdex.toml` in the working directory, if present.
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Worker thread count. Default: available threads minus one.
    #[arg(long, short = 't')]
    pub threads: Option<usize>,

    /// Work queue capacity.
    #[arg(long)]
    pub capacity: Option<usize>,

    /// Stop after this many documents. -1 for no limit.
    #[arg(long, short = 'n', allow_negative_numbers = true)]
    pub limit: Option<i64>,

    /// Drop posts with an id above this value.
    #[arg(long)]
    pub max_id: Option<u64>,

    /// File of post ids to drop, one per line.
    #[arg(long, short)]
    pub deletes: Option<PathBuf>,

    /// Log throughput every 200 ms.
    #[arg(long, short = 'm', num_args = 0..=1, default_missing_value = "true", value_parser = clap::value_parser!(bool))]
    pub monitor: Option<bool>,

    /// Language tag posts must carry.
    #[arg(long)]
    pub language: Option<String>,
}

#[derive(Clone, Args)]
pub struct ScoreArgs {
    /// JSON-lines documents file written by `index`.
    #[arg(value_name = "DOCS")]
    pub docs: PathBuf,

    /// Query, e.g. "machine learning^2.5". Phrases are separated by commas or whitespace.
    #[arg(long, short)]
    pub query: String,

    /// Field to score: text or text_english.
    #[arg(long, short, default_value = "text_english")]
    pub field: String,

    /// Dirichlet smoothing parameter.
    #[arg(long, default_value_t = DEFAULT_MU)]
    pub mu: f64,

    /// Number of documents to print.
    #[arg(long, short = 'k', default_value_t = DEFAULT_TOP)]
    pub top: usize,
}
