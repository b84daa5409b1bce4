//! Stop-word removal.
//!
//! Lists come from the `stop-words` crate or from the caller. Matching is
//! case-insensitive unless asked otherwise.

use rustc_hash::FxHashSet;
use stop_words::{get, LANGUAGE};

use crate::{Error, Result, Token};

/// A stop-word exclusion list.
///
/// ```rust
/// use folio::StopWords;
///
/// let stop = StopWords::english();
/// assert!(stop.is_stop_word("The"));
/// assert!(!stop.is_stop_word("glacier"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct StopWords {
    words: FxHashSet<String>,
    case_sensitive: bool,
}

impl StopWords {
    /// The English list.
    #[must_use]
    pub fn english() -> Self {
        Self::from_language(LANGUAGE::English)
    }

    /// The list for a language code or name (`en`, `german`, ...).
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for a language the list source does not cover.
    pub fn for_language(language: &str) -> Result<Self> {
        let language = match language.to_lowercase().as_str() {
            "en" | "english" => LANGUAGE::English,
            "de" | "german" => LANGUAGE::German,
            "fr" | "french" => LANGUAGE::French,
            "es" | "spanish" => LANGUAGE::Spanish,
            "it" | "italian" => LANGUAGE::Italian,
            "pt" | "portuguese" => LANGUAGE::Portuguese,
            "nl" | "dutch" => LANGUAGE::Dutch,
            "ru" | "russian" => LANGUAGE::Russian,
            "sv" | "swedish" => LANGUAGE::Swedish,
            "fi" | "finnish" => LANGUAGE::Finnish,
            other => return Err(Error::config(format!("no stop-word list for {other:?}"))),
        };
        Ok(Self::from_language(language))
    }

    fn from_language(language: LANGUAGE) -> Self {
        Self {
            words: get(language).iter().map(|w| w.to_lowercase()).collect(),
            case_sensitive: false,
        }
    }

    /// A caller-supplied list.
    #[must_use]
    pub fn from_list<S: AsRef<str>>(words: &[S]) -> Self {
        Self::default().extend(words)
    }

    /// Match case exactly. The stored words must then be in the wanted case.
    #[must_use]
    pub fn with_case_sensitive(mut self, case_sensitive: bool) -> Self {
        self.case_sensitive = case_sensitive;
        self
    }

    /// Add words to the list.
    #[must_use]
    pub fn extend<S: AsRef<str>>(mut self, words: &[S]) -> Self {
        let case_sensitive = self.case_sensitive;
        self.words.extend(words.iter().map(|w| {
            if case_sensitive {
                w.as_ref().to_string()
            } else {
                w.as_ref().to_lowercase()
            }
        }));
        self
    }

    /// Whether `word` is on the list.
    #[must_use]
    pub fn is_stop_word(&self, word: &str) -> bool {
        if self.case_sensitive {
            self.words.contains(word)
        } else {
            self.words.contains(&word.to_lowercase())
        }
    }

    /// Number of words on the list.
    #[must_use]
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// Whether the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// The tokens that are not stop words, in order.
    ///
    /// Tokens keep their original `token_index` and `following`, so the
    /// result is a filtered view of the stream rather than a new dense stream.
    #[must_use]
    pub fn remove(&self, tokens: &[Token]) -> Vec<Token> {
        let kept: Vec<Token> = tokens
            .iter()
            .filter(|token| !self.is_stop_word(&token.text))
            .cloned()
            .collect();
        log::debug!(
            "stop words removed {} of {} tokens",
            tokens.len() - kept.len(),
            tokens.len()
        );
        kept
    }
}
