//! Post text normalizer: entity redaction, hashtag splitting, repost-marker stripping and
//! the length / all-caps acceptance checks.
//!
//! Redaction works on a `char` buffer and only ever overwrites characters with spaces, so the
//! buffer length is fixed and every entity offset stays valid no matter which span is blanked
//! first. Hashtag sub-tokens are appended in span order, which makes the whole pass
//! independent of the order the source listed its entities in.

use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

use crate::utils::config::NormalizerConsts;
use crate::{EntitySpan, RawPost};

/// Why a post did not make it into the index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Rejection {
    MissingText,
    Language,
    TooShort,
    AllCaps,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rejection::MissingText => "missing text",
            Rejection::Language => "language",
            Rejection::TooShort => "too short",
            Rejection::AllCaps => "all caps",
        };
        f.write_str(s)
    }
}

fn multi_space_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s\s+").expect("static regex"))
}

fn leading_rt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^/?RT\b:?\s*:?").expect("static regex"))
}

fn inline_rt_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)\s/?RT\b:?\s*:?|\(RT\b[^)]*\)").expect("static regex")
    })
}

/// Cleans raw posts for one run. Cheap to clone; every worker holds its own.
#[derive(Clone, Debug)]
pub struct Normalizer {
    language: String,
    min_clean_len: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new(
            NormalizerConsts::TARGET_LANGUAGE,
            NormalizerConsts::MIN_CLEAN_TEXT_LENGTH,
        )
    }
}

impl Normalizer {
    pub fn new(language: &str, min_clean_len: usize) -> Self {
        Self {
            language: language.to_string(),
            min_clean_len,
        }
    }

    /// Clean `post` and decide whether it is worth indexing. Returns the cleaned text.
    pub fn clean(&self, post: &RawPost) -> Result<String, Rejection> {
        match post.lang.as_deref() {
            Some(lang) if lang == self.language => {}
            _ => return Err(Rejection::Language),
        }
        let text = post.text.as_deref().ok_or(Rejection::MissingText)?;

        let cleaned = strip_repost_markers(&collapse_whitespace(&redact_entities(text, post)));

        if cleaned.chars().count() < self.min_clean_len {
            return Err(Rejection::TooShort);
        }
        if is_all_caps(&cleaned) {
            return Err(Rejection::AllCaps);
        }
        Ok(cleaned)
    }
}

/// Blank `span` with spaces, clamped to the buffer. Spans starting past the end are ignored.
fn blank_span(buf: &mut [char], span: &EntitySpan) {
    let len = buf.len();
    if span.start >= len {
        return;
    }
    let end = span.end.min(len);
    if end > span.start {
        buf[span.start..end].fill(' ');
    }
}

/// Split a hashtag body before every ASCII upper-case letter, e.g. `" MachineLearning"` ->
/// `["Machine", "Learning"]`. Non-ASCII capitals do not start a new word.
pub fn split_hashtag(body: &[char]) -> Vec<String> {
    let mut parts: Vec<String> = Vec::new();
    let mut current = String::new();
    for &c in body {
        if c.is_ascii_uppercase() && !current.is_empty() {
            parts.push(std::mem::take(&mut current));
        }
        current.push(c);
    }
    parts.push(current);
    parts
        .into_iter()
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty())
        .collect()
}

/// Blank URLs, media, symbols and mentions, drop hashtag markers and append the split hashtag
/// words. Output is not yet whitespace-collapsed.
pub fn redact_entities(text: &str, post: &RawPost) -> String {
    let mut buf: Vec<char> = text.chars().collect();
    let len = buf.len();
    let entities = &post.entities;

    for span in entities
        .urls
        .iter()
        .chain(&entities.media)
        .chain(&entities.symbols)
        .chain(&entities.user_mentions)
    {
        blank_span(&mut buf, span);
    }

    let mut tags: Vec<&EntitySpan> = entities.hashtags.iter().filter(|t| t.start < len).collect();
    tags.sort_by_key(|t| t.start);
    let mut hashtag_words = Vec::new();
    for tag in tags {
        buf[tag.start] = ' ';
        if tag.end <= len {
            if tag.end > tag.start {
                hashtag_words.extend(split_hashtag(&buf[tag.start..tag.end]));
            }
        } else {
            blank_span(&mut buf, tag);
        }
    }

    let mut out: String = buf.into_iter().collect();
    for word in hashtag_words {
        out.push(' ');
        out.push_str(&word);
    }
    out
}

/// Replace runs of two or more whitespace chars with one space and trim.
pub fn collapse_whitespace(text: &str) -> String {
    multi_space_re().replace_all(text, " ").trim().to_string()
}

/// Remove `RT`, `/RT:` style repost markers and `(RT ...)` annotations.
pub fn strip_repost_markers(text: &str) -> String {
    let text = leading_rt_re().replace(text, "");
    let text = inline_rt_re().replace_all(&text, " ");
    collapse_whitespace(&text)
}

/// True when the ASCII letters and digits of `text` are all upper-case letters.
/// Text with no letters or digits at all counts as all caps.
pub fn is_all_caps(text: &str) -> bool {
    text.chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .all(|c| c.is_ascii_uppercase())
}
