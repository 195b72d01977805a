//! Single-token stemmers. Real stemming lives outside this crate; anything implementing
//! [`Stemmer`] (including a plain closure) can be plugged in.

pub trait Stemmer {
    fn stem(&self, term: &str) -> String;
}

impl<F> Stemmer for F
where
    F: Fn(&str) -> String,
{
    fn stem(&self, term: &str) -> String {
        self(term)
    }
}

/// Returns the term unchanged.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdentityStemmer;

impl Stemmer for IdentityStemmer {
    fn stem(&self, term: &str) -> String {
        term.to_string()
    }
}

/// Lower-cases and trims non-alphanumeric characters off both ends.
#[derive(Clone, Copy, Debug, Default)]
pub struct LowercaseStemmer;

impl Stemmer for LowercaseStemmer {
    fn stem(&self, term: &str) -> String {
        term.trim_matches(|c: char| !c.is_alphanumeric())
            .to_lowercase()
    }
}
