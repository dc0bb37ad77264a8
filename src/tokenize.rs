//! Text analysis: the pluggable tokenizer seam and its default pipeline.
//!
//! The default pipeline lower-cases, splits on non-alphanumeric boundaries,
//! drops the language's stop words, and applies the Snowball stemmer for the
//! language. Output is a set, so duplicate tokens collapse and order is
//! deterministic (lexicographic).

use std::collections::BTreeSet;
use std::sync::OnceLock;

use ahash::{AHashMap, AHashSet};
use rust_stemmers::Stemmer;

use crate::types::Language;

/// Splits text into normalized tokens for a given language.
///
/// Implementations must be cheap to call repeatedly: the engine tokenizes
/// every text leaf at insert and delete, and the search term at query time.
pub trait Tokenizer: Send + Sync {
    /// Tokenize `text` in `language`, collapsing duplicates.
    fn tokenize(&self, text: &str, language: Language) -> BTreeSet<String>;
}

/// The built-in analysis pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultTokenizer;

impl Tokenizer for DefaultTokenizer {
    fn tokenize(&self, text: &str, language: Language) -> BTreeSet<String> {
        let stop = stop_words_for(language);
        let stemmer = Stemmer::create(language.stemmer_algorithm());

        let mut tokens = BTreeSet::new();
        for raw in text.split(|c: char| !c.is_alphanumeric()) {
            if raw.is_empty() {
                continue;
            }
            let lower = raw.to_lowercase();
            if stop.contains(lower.as_str()) {
                continue;
            }
            tokens.insert(stemmer.stem(&lower).into_owned());
        }
        tokens
    }
}

/// Stop-word set for a language, built once per process from the
/// Stopwords-ISO lists.
fn stop_words_for(language: Language) -> &'static AHashSet<String> {
    static STOP_WORDS: OnceLock<AHashMap<Language, AHashSet<String>>> = OnceLock::new();
    let all = STOP_WORDS.get_or_init(|| {
        Language::ALL
            .iter()
            .map(|lang| {
                let words = stop_words::get(lang.stop_words_language())
                    .iter()
                    .map(|w| w.to_string())
                    .collect();
                (*lang, words)
            })
            .collect()
    });
    // ALL covers every variant, so the entry always exists.
    &all[&language]
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert2::check;
    use rstest::rstest;

    fn tokenize(text: &str, language: Language) -> BTreeSet<String> {
        DefaultTokenizer.tokenize(text, language)
    }

    #[rstest]
    #[case("The Lyra Book", &["lyra", "book"])]
    #[case("cooking and COOKING", &["cook"])]
    #[case("a quick-brown fox", &["quick", "brown", "fox"])]
    fn english_pipeline(#[case] input: &str, #[case] expected: &[&str]) {
        let expected: BTreeSet<String> = expected.iter().map(|s| s.to_string()).collect();
        check!(tokenize(input, Language::English) == expected);
    }

    #[rstest]
    #[case("parsing parsed parser")]
    #[case("work working worked")]
    fn inflections_collapse_to_one_stem(#[case] input: &str) {
        check!(tokenize(input, Language::English).len() == 1);
    }

    #[test]
    fn stop_words_are_dropped() {
        let tokens = tokenize("the book is on the table", Language::English);
        check!(!tokens.contains("the"));
        check!(!tokens.contains("is"));
        check!(!tokens.contains("on"));
        check!(tokens.contains("book"));
    }

    #[test]
    fn stop_words_are_language_specific() {
        // "les" is a French stop word but an English token.
        check!(!tokenize("les livres", Language::French).contains("les"));
        check!(tokenize("les livres", Language::English).contains("les"));
    }

    #[rstest]
    #[case("")]
    #[case("   \t\n")]
    #[case("!!! --- ...")]
    fn no_tokens_from_separators(#[case] input: &str) {
        check!(tokenize(input, Language::English).is_empty());
    }

    #[test]
    fn numbers_survive_tokenization() {
        let tokens = tokenize("route 66", Language::English);
        check!(tokens.contains("66"));
    }

    #[rstest]
    #[case("Москва слезам")] // Cyrillic
    #[case("日本")] // no alphabetic boundaries at all
    fn non_latin_input_does_not_panic(#[case] input: &str) {
        let _tokens = tokenize(input, Language::English);
    }
}
