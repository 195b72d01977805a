//! Build the stored [`Document`] for an accepted post.

use crate::{Document, RawPost};

/// Assemble the document for `post`. `clean_text` is the normalizer output; the raw text is kept as-is.
pub fn build_document(post: &RawPost, clean_text: String) -> Document {
    let (retweeted_status_id, retweeted_user_id) = post
        .retweeted_status
        .as_ref()
        .map(|rt| (rt.id, rt.user_id))
        .unwrap_or((0, 0));

    Document {
        id: post.id,
        epoch: post.created_at_ms / 1000,
        text: post.text.clone().unwrap_or_default(),
        text_english: clean_text,
        lang: post.lang.clone().unwrap_or_default(),
        screen_name: post.user.screen_name.clone(),
        friends_count: post.user.friends_count,
        followers_count: post.user.followers_count,
        statuses_count: post.user.statuses_count,
        in_reply_to_status_id: post.in_reply_to_status_id.unwrap_or(0),
        in_reply_to_user_id: post.in_reply_to_user_id.unwrap_or(0),
        quoted_status_id: post.quoted_status_id.unwrap_or(0),
        retweeted_status_id,
        retweeted_user_id,
        retweet_count: post.retweet_count,
    }
}
