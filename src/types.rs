//! Public and internal types for the postdex API and pipeline.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::utils::config::{NormalizerConsts, PipelineConsts, WorkerThreadLimits};

/// Character span of an entity inside a post's raw text. `start..end`, counted in chars.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntitySpan {
    pub start: usize,
    pub end: usize,
}

impl EntitySpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

/// Span-annotated entities attached to a post, in the order the source delivered them.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Entities {
    #[serde(default)]
    pub urls: Vec<EntitySpan>,
    #[serde(default)]
    pub media: Vec<EntitySpan>,
    #[serde(default)]
    pub hashtags: Vec<EntitySpan>,
    #[serde(default)]
    pub symbols: Vec<EntitySpan>,
    #[serde(default)]
    pub user_mentions: Vec<EntitySpan>,
}

/// Author metadata carried on every post.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Author {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub screen_name: String,
    #[serde(default)]
    pub friends_count: i32,
    #[serde(default)]
    pub followers_count: i32,
    #[serde(default)]
    pub statuses_count: i32,
}

/// The post a reposted post points at. Only the ids survive into the document.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RepostRef {
    pub id: u64,
    #[serde(default)]
    pub user_id: u64,
}

/// One post as delivered by a [`PostSource`](crate::engine::source::PostSource).
///
/// `text` is optional because deletion notices and truncated records arrive without one;
/// the producer drops those before they reach the queue.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawPost {
    pub id: u64,
    /// Creation time in milliseconds since epoch.
    #[serde(default)]
    pub created_at_ms: i64,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub user: Author,
    #[serde(default)]
    pub in_reply_to_status_id: Option<u64>,
    #[serde(default)]
    pub in_reply_to_user_id: Option<u64>,
    #[serde(default)]
    pub quoted_status_id: Option<u64>,
    #[serde(default)]
    pub retweeted_status: Option<RepostRef>,
    #[serde(default)]
    pub retweet_count: i32,
    #[serde(default)]
    pub entities: Entities,
}

/// Index-ready record built from an accepted post. Field names match the stored document fields.
///
/// Missing reply, quote and repost ids are stored as 0.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: u64,
    /// Creation time in seconds since epoch.
    pub epoch: i64,
    pub text: String,
    pub text_english: String,
    pub lang: String,
    pub screen_name: String,
    pub friends_count: i32,
    pub followers_count: i32,
    pub statuses_count: i32,
    pub in_reply_to_status_id: u64,
    pub in_reply_to_user_id: u64,
    pub quoted_status_id: u64,
    pub retweeted_status_id: u64,
    pub retweeted_user_id: u64,
    pub retweet_count: i32,
}

/// What travels through the bounded work queue.
#[derive(Debug)]
pub enum QueueItem {
    Post(Box<RawPost>),
    /// Termination marker. The producer sends exactly one per worker.
    Shutdown,
}

/// Ids to suppress for a run.
pub type DeletionSet = HashSet<u64>;

/// Options consumed by the pipeline coordinator.
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Worker thread count. Must be at least 1.
    pub num_threads: usize,
    /// Capacity of the work queue between producer and workers.
    pub channel_capacity: usize,
    /// Stop after this many accepted documents. `None` is unbounded.
    pub doc_limit: Option<usize>,
    /// Posts with an id above this ceiling are dropped (bounds a run to a snapshot).
    pub max_id: u64,
    /// Post ids to drop.
    pub deletes: Option<DeletionSet>,
    /// Run the throughput monitor thread.
    pub monitor: bool,
    /// Language tag a post must carry to be accepted.
    pub language: String,
    /// Minimum cleaned text length (chars) for a post to be accepted.
    pub min_clean_len: usize,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            num_threads: WorkerThreadLimits::current().default_workers(),
            channel_capacity: PipelineConsts::CHANNEL_CAP,
            doc_limit: None,
            max_id: u64::MAX,
            deletes: None,
            monitor: false,
            language: NormalizerConsts::TARGET_LANGUAGE.to_string(),
            min_clean_len: NormalizerConsts::MIN_CLEAN_TEXT_LENGTH,
        }
    }
}

impl PipelineOpts {
    /// Convert the CLI/config convention (-1 = unbounded) into `doc_limit`.
    pub fn with_limit(mut self, limit: i64) -> Self {
        self.doc_limit = usize::try_from(limit).ok();
        self
    }
}
