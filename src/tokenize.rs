//! Tokenization of annotated lines.
//!
//! Tokenization is line-local: each line is tokenized on its own, so the
//! token count of a document is the sum of the token counts of its lines and
//! no token ever spans two lines, paragraphs or chapters.
//!
//! ## The Default Word Rule
//!
//! [`WordTokenizer`] uses Unicode word boundaries (UAX #29), then applies a
//! small set of stated rules:
//!
//! | Input | Tokens | Rule |
//! |-------|--------|------|
//! | `Cook and Aorangi.` | `cook` `and` `aorangi` | punctuation is a boundary, case folded |
//! | `can't` `o'clock` | `can't` `o'clock` | an apostrophe between letters is internal |
//! | `well-known` | `well` `known` | a hyphen is a boundary (`HyphenRule::Split`) |
//! | `well-known` | `well-known` | with `HyphenRule::Keep` |
//! | `word--word` | `word` `word` | a double dash is always a boundary |
//! | `_italic_` | `italic` | underscores at word edges are dropped |
//! | `3.14` | `3.14` | numbers keep their internal separators |
//!
//! With `ContractionRule::Split`, `can't` becomes `can` `t`.
//!
//! ## Anomalies
//!
//! A line that contains U+FFFD (the mark of an earlier lossy decode) or a
//! control character other than tab and form feed fails with
//! [`Error::Tokenization`]. The caller's [`ErrorPolicy`] decides whether that
//! aborts the run or skips the line.

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

use crate::{AnnotatedLine, Error, ErrorPolicy, Result};

/// A word-level unit with its structural provenance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    /// Normalized token text.
    pub text: String,
    /// Dense, zero-based position in the token stream.
    pub token_index: usize,
    /// Physical line the token came from.
    pub line_index: usize,
    /// Paragraph of the source line.
    pub paragraph_index: usize,
    /// Chapter of the source line.
    pub chapter_index: usize,
    /// Text of the next token in the same paragraph, once adjacency is attached.
    pub following: Option<String>,
}

/// Splits one line of text into token texts.
///
/// Implementations must be deterministic and must not look beyond the line.
pub trait Tokenizer: Send + Sync + std::fmt::Debug {
    /// Tokenize one line.
    fn tokenize(&self, text: &str) -> Vec<String>;
}

/// How hyphenated words are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HyphenRule {
    /// `well-known` is two tokens.
    #[default]
    Split,
    /// `well-known` is one token.
    Keep,
}

/// How contractions and possessives are treated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContractionRule {
    /// `can't` is one token.
    #[default]
    Keep,
    /// `can't` is `can` and `t`.
    Split,
}

/// Options shared by the built-in tokenizers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct TokenizerOptions {
    /// Lowercase every token.
    pub case_folding: bool,
    /// Hyphen handling.
    pub hyphens: HyphenRule,
    /// Apostrophe handling.
    pub contractions: ContractionRule,
}

impl Default for TokenizerOptions {
    fn default() -> Self {
        Self {
            case_folding: true,
            hyphens: HyphenRule::Split,
            contractions: ContractionRule::Keep,
        }
    }
}

/// Word tokenizer following the rules in the module docs.
///
/// ```rust
/// use folio::{Tokenizer, WordTokenizer};
///
/// let words = WordTokenizer::default().tokenize("Cook and Aorangi.");
/// assert_eq!(words, ["cook", "and", "aorangi"]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct WordTokenizer {
    options: TokenizerOptions,
}

impl WordTokenizer {
    /// Create a word tokenizer.
    #[must_use]
    pub const fn new(options: TokenizerOptions) -> Self {
        Self { options }
    }

    fn push_word(&self, word: &str, out: &mut Vec<String>) {
        let word = word.trim_matches('_');
        if word.is_empty() {
            return;
        }
        match self.options.contractions {
            ContractionRule::Keep => out.push(self.fold(word)),
            ContractionRule::Split => out.extend(
                word.split(['\'', '\u{2019}'])
                    .filter(|part| !part.is_empty())
                    .map(|part| self.fold(part)),
            ),
        }
    }

    fn fold(&self, word: &str) -> String {
        if self.options.case_folding {
            word.to_lowercase()
        } else {
            word.to_string()
        }
    }
}

fn is_word(segment: &str) -> bool {
    segment.chars().any(char::is_alphanumeric)
}

impl Tokenizer for WordTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        let keep_hyphens = self.options.hyphens == HyphenRule::Keep;
        let mut out = Vec::new();
        // The word being built and the byte offset where it ends.
        let mut pending: Option<(String, usize)> = None;
        let mut hyphen_pending = false;

        for (start, segment) in text.split_word_bound_indices() {
            let end = start + segment.len();
            if is_word(segment) {
                let joins = hyphen_pending
                    && pending
                        .as_ref()
                        .is_some_and(|(_, word_end)| *word_end + 1 == start);
                if joins {
                    if let Some((word, word_end)) = pending.as_mut() {
                        word.push('-');
                        word.push_str(segment);
                        *word_end = end;
                    }
                } else {
                    if let Some((word, _)) = pending.take() {
                        self.push_word(&word, &mut out);
                    }
                    pending = Some((segment.to_string(), end));
                }
                hyphen_pending = false;
            } else {
                hyphen_pending = keep_hyphens
                    && !hyphen_pending
                    && segment == "-"
                    && pending.as_ref().is_some_and(|(_, word_end)| *word_end == start);
            }
        }
        if let Some((word, _)) = pending {
            self.push_word(&word, &mut out);
        }
        out
    }
}

/// One token per sentence within a line.
///
/// ```rust
/// use folio::{SentenceTokenizer, Tokenizer};
///
/// let sentences = SentenceTokenizer::default().tokenize("It rained. We stayed in.");
/// assert_eq!(sentences, ["it rained.", "we stayed in."]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct SentenceTokenizer {
    options: TokenizerOptions,
}

impl SentenceTokenizer {
    /// Create a sentence tokenizer. Only `case_folding` applies.
    #[must_use]
    pub const fn new(options: TokenizerOptions) -> Self {
        Self { options }
    }
}

impl Tokenizer for SentenceTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        text.split_sentence_bounds()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                if self.options.case_folding {
                    s.to_lowercase()
                } else {
                    s.to_string()
                }
            })
            .collect()
    }
}

/// Word n-grams within a line, joined by a single space.
///
/// ```rust
/// use folio::{NgramTokenizer, Tokenizer, TokenizerOptions};
///
/// let bigrams = NgramTokenizer::new(2, TokenizerOptions::default()).unwrap();
/// assert_eq!(bigrams.tokenize("Mount Cook is big"), ["mount cook", "cook is", "is big"]);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct NgramTokenizer {
    n: usize,
    words: WordTokenizer,
}

impl NgramTokenizer {
    /// Create an n-gram tokenizer.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if `n == 0`.
    pub fn new(n: usize, options: TokenizerOptions) -> Result<Self> {
        if n == 0 {
            return Err(Error::config("n-gram size must be >= 1"));
        }
        Ok(Self {
            n,
            words: WordTokenizer::new(options),
        })
    }
}

impl Tokenizer for NgramTokenizer {
    fn tokenize(&self, text: &str) -> Vec<String> {
        self.words
            .tokenize(text)
            .windows(self.n)
            .map(|gram| gram.join(" "))
            .collect()
    }
}

/// Tokens produced from a sequence of lines, plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct Tokenized {
    /// Tokens in line order, then left-to-right.
    pub tokens: Vec<Token>,
    /// One error per skipped line. Always empty under [`ErrorPolicy::FailFast`].
    pub skipped: Vec<Error>,
}

fn check_line(text: &str) -> std::result::Result<(), String> {
    if text.contains('\u{FFFD}') {
        return Err("contains U+FFFD replacement character".to_string());
    }
    if let Some(c) = text
        .chars()
        .find(|&c| c.is_control() && c != '\t' && c != '\u{000C}')
    {
        return Err(format!("contains control character U+{:04X}", u32::from(c)));
    }
    Ok(())
}

/// Tokenize annotated lines into a dense token stream.
///
/// Tokens inherit the structural indices of their line; `token_index` counts
/// from 0 with no gaps, even when lines are skipped. `following` is left empty
/// for [`attach_following`](crate::attach_following).
///
/// # Errors
///
/// [`Error::Tokenization`] for an anomalous line under [`ErrorPolicy::FailFast`].
pub fn tokenize_lines(
    lines: &[AnnotatedLine],
    tokenizer: &dyn Tokenizer,
    policy: ErrorPolicy,
) -> Result<Tokenized> {
    let mut out = Tokenized::default();

    for line in lines {
        if let Err(reason) = check_line(line.text()) {
            let err = Error::Tokenization {
                line: line.line_index(),
                reason,
            };
            if policy == ErrorPolicy::FailFast {
                return Err(err);
            }
            log::warn!("skipping {err}");
            out.skipped.push(err);
            continue;
        }

        for text in tokenizer.tokenize(line.text()) {
            out.tokens.push(Token {
                text,
                token_index: out.tokens.len(),
                line_index: line.line_index(),
                paragraph_index: line.paragraph_index,
                chapter_index: line.chapter_index,
                following: None,
            });
        }
    }

    log::debug!(
        "tokenized {} lines into {} tokens ({} skipped)",
        lines.len(),
        out.tokens.len(),
        out.skipped.len()
    );
    Ok(out)
}
