//! Domain types shared across the engine.
//!
//! This module provides strongly-typed alternatives to raw primitives for:
//! - Supported analysis languages
//! - Internal document ordinals
//! - Opaque document id generation
//! - Human-readable elapsed-time formatting

use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// A language the tokenizer can analyze.
///
/// The set is the intersection of the languages the Snowball stemmer and the
/// Stopwords-ISO lists both cover. Parsing an unknown name fails with
/// [`SearchError::LanguageNotSupported`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Danish,
    Dutch,
    #[default]
    English,
    Finnish,
    French,
    German,
    Hungarian,
    Italian,
    Norwegian,
    Portuguese,
    Romanian,
    Russian,
    Spanish,
    Swedish,
    Turkish,
}

impl Language {
    /// Every supported language, in display order.
    pub const ALL: &'static [Self] = &[
        Self::Danish,
        Self::Dutch,
        Self::English,
        Self::Finnish,
        Self::French,
        Self::German,
        Self::Hungarian,
        Self::Italian,
        Self::Norwegian,
        Self::Portuguese,
        Self::Romanian,
        Self::Russian,
        Self::Spanish,
        Self::Swedish,
        Self::Turkish,
    ];

    /// Lowercase English name of the language.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Danish => "danish",
            Self::Dutch => "dutch",
            Self::English => "english",
            Self::Finnish => "finnish",
            Self::French => "french",
            Self::German => "german",
            Self::Hungarian => "hungarian",
            Self::Italian => "italian",
            Self::Norwegian => "norwegian",
            Self::Portuguese => "portuguese",
            Self::Romanian => "romanian",
            Self::Russian => "russian",
            Self::Spanish => "spanish",
            Self::Swedish => "swedish",
            Self::Turkish => "turkish",
        }
    }

    /// The Snowball algorithm for this language.
    pub(crate) fn stemmer_algorithm(self) -> rust_stemmers::Algorithm {
        use rust_stemmers::Algorithm;
        match self {
            Self::Danish => Algorithm::Danish,
            Self::Dutch => Algorithm::Dutch,
            Self::English => Algorithm::English,
            Self::Finnish => Algorithm::Finnish,
            Self::French => Algorithm::French,
            Self::German => Algorithm::German,
            Self::Hungarian => Algorithm::Hungarian,
            Self::Italian => Algorithm::Italian,
            Self::Norwegian => Algorithm::Norwegian,
            Self::Portuguese => Algorithm::Portuguese,
            Self::Romanian => Algorithm::Romanian,
            Self::Russian => Algorithm::Russian,
            Self::Spanish => Algorithm::Spanish,
            Self::Swedish => Algorithm::Swedish,
            Self::Turkish => Algorithm::Turkish,
        }
    }

    /// The Stopwords-ISO list for this language.
    pub(crate) fn stop_words_language(self) -> stop_words::LANGUAGE {
        use stop_words::LANGUAGE;
        match self {
            Self::Danish => LANGUAGE::Danish,
            Self::Dutch => LANGUAGE::Dutch,
            Self::English => LANGUAGE::English,
            Self::Finnish => LANGUAGE::Finnish,
            Self::French => LANGUAGE::French,
            Self::German => LANGUAGE::German,
            Self::Hungarian => LANGUAGE::Hungarian,
            Self::Italian => LANGUAGE::Italian,
            Self::Norwegian => LANGUAGE::Norwegian,
            Self::Portuguese => LANGUAGE::Portuguese,
            Self::Romanian => LANGUAGE::Romanian,
            Self::Russian => LANGUAGE::Russian,
            Self::Spanish => LANGUAGE::Spanish,
            Self::Swedish => LANGUAGE::Swedish,
            Self::Turkish => LANGUAGE::Turkish,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Language {
    type Err = SearchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.to_ascii_lowercase();
        Self::ALL
            .iter()
            .copied()
            .find(|lang| lang.as_str() == lower)
            .ok_or(SearchError::LanguageNotSupported {
                language: s.to_string(),
            })
    }
}

/// Dense internal ordinal of an applied document.
///
/// Assigned in writer-application order and never reused, so iterating any
/// posting set in ordinal order yields insertion-observed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub(crate) struct DocOrd(pub(crate) u32);

/// Generator for opaque document id strings.
///
/// Ids combine a per-engine seed with a monotonic counter, so they are unique
/// within an engine and opaque to callers.
#[derive(Debug)]
pub(crate) struct IdGenerator {
    seed: u32,
    counter: AtomicU64,
}

impl IdGenerator {
    pub(crate) fn new() -> Self {
        let seed = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.subsec_nanos())
            .unwrap_or(0);
        Self {
            seed,
            counter: AtomicU64::new(0),
        }
    }

    pub(crate) fn next(&self) -> String {
        let n = self.counter.fetch_add(1, Ordering::Relaxed);
        format!("{:08x}-{:012x}", self.seed, n)
    }
}

/// Format a measured duration as a short human-readable string.
///
/// Sub-microsecond durations print as integral nanoseconds; everything above
/// uses two decimals in the next-larger unit ("123.45μs", "4.56ms", "1.20s").
pub(crate) fn format_elapsed(elapsed: Duration) -> String {
    let nanos = elapsed.as_nanos();
    if nanos < 1_000 {
        format!("{nanos}ns")
    } else if nanos < 1_000_000 {
        format!("{:.2}μs", nanos as f64 / 1_000.0)
    } else if nanos < 1_000_000_000 {
        format!("{:.2}ms", nanos as f64 / 1_000_000.0)
    } else {
        format!("{:.2}s", nanos as f64 / 1_000_000_000.0)
    }
}
