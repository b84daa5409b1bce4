//! # folio
//!
//! Structural text analysis for books: lines, paragraphs, chapters, tokens and
//! the frequency tables built from them.
//!
//! ## The Problem
//!
//! An introductory text-analysis workflow asks the same questions of every
//! book. How often does a word occur? In which chapter? What follows it? Which
//! words characterise one chapter against the rest? Answering them needs more
//! than a bag of words: every token has to remember where it came from.
//!
//! This sounds trivial, just split on whitespace, right? But consider:
//!
//! - "CHAPTER I" on the first line is the start of the book, not chapter 1
//! - A blank line starts a new paragraph, and "what comes next" must never
//!   leak across one
//! - `don't`, `well-known` and `_emphasis_` each need a rule
//! - A percentage is meaningless without saying what it is a percentage of
//!
//! ## The Pipeline
//!
//! ```text
//! bytes ─▶ LineLoader ─▶ Annotator ─▶ Tokenizer ─▶ attach_following ─▶ FrequencyQuery
//!          Line          AnnotatedLine  Token        Token.following      FrequencyRecord
//! ```
//!
//! ### Lines and structure
//!
//! [`LineLoader`] reads UTF-8 or Latin-1 into [`Line`]s with 0-based physical
//! indices. [`Annotator`] gives each line a paragraph index (the number of
//! blank lines before it) and a chapter index (the number of boundary lines
//! before it, where a boundary only counts once real content has been seen).
//! Chapter boundaries are pluggable [`BoundaryPredicate`]s:
//!
//! ```text
//! line  text            paragraph  chapter
//! 0     CHAPTER I       0          0
//! 1     Cook and        0          0
//! 2                     0          0
//! 3     CHAPTER II      1          1
//! ```
//!
//! ### Tokens
//!
//! [`WordTokenizer`] follows UAX #29 word boundaries and lowercases by
//! default. [`SentenceTokenizer`] and [`NgramTokenizer`] are alternative
//! [`Tokenizer`]s. Lines with replacement or control characters are errors,
//! or skipped under [`ErrorPolicy::SkipLine`].
//!
//! ### Frequencies
//!
//! [`FrequencyQuery`] groups tokens by [`Dimension`]s, filters them with a
//! [`TokenPredicate`] and reports counts or percentages:
//!
//! | Normalization | Denominator | Empty groups |
//! |---------------|-------------|--------------|
//! | [`Count`](Normalization::Count) | none | omitted |
//! | [`PercentOfMatches`](Normalization::PercentOfMatches) | matching tokens | omitted |
//! | [`PercentOfGroup`](Normalization::PercentOfGroup) | term-yielding tokens in the group | zero-filled |
//!
//! ## Quick Start
//!
//! ```rust
//! use folio::{Dimension, FrequencyQuery, Normalization, Pipeline, TokenPredicate};
//!
//! let text = "CHAPTER I\nCook and Aorangi.\n\nCHAPTER II\nAorangi, Aorangi!";
//! let analysis = Pipeline::default().run_str(text)?;
//!
//! let query = FrequencyQuery::new()
//!     .group_by([Dimension::Chapter])
//!     .filter(TokenPredicate::text("aorangi"))
//!     .normalization(Normalization::PercentOfGroup);
//! let records = analysis.query(&query)?;
//!
//! assert_eq!(records.len(), 2);
//! assert_eq!(records[1].count, 2);
//! # Ok::<(), folio::Error>(())
//! ```
//!
//! ## Beyond Counting
//!
//! [`StopWords`] filters function words, [`tf_idf`] weights words by how
//! specific they are to a group, and the traits in the collaborator module
//! ([`Stemmer`], [`SentimentLexicon`], [`TopicModel`]) connect external
//! tools through plain token streams and tables. [`write_frequencies_tsv`]
//! and friends emit tables for plotting tools; every record type also
//! serializes to JSON.
//!
//! ## Configuration
//!
//! ```rust
//! use folio::ConfigLoader;
//!
//! let pipeline = ConfigLoader::new()
//!     .set_override("tokenizer.hyphens", "keep")?
//!     .build()?
//!     .build()?;
//! let analysis = pipeline.run_str("a well-known peak")?;
//! assert_eq!(analysis.tokens[1].text, "well-known");
//! # Ok::<(), folio::Error>(())
//! ```

mod adjacency;
mod annotate;
mod collab;
mod config;
mod error;
mod frequency;
mod line;
mod loader;
mod pipeline;
mod stopwords;
mod table;
mod tokenize;
mod weighting;

pub use adjacency::attach_following;
pub use annotate::{Annotator, BoundaryPredicate, ChapterRules, PatternRule, PrefixRule};
pub use collab::{
    fit_topics, sentiment_counts, stem_tokens, DocumentTopics, Lexicon, SentimentLexicon, Stemmer,
    TermDocumentMatrix, TopicModel, TopicWeight,
};
pub use crate::config::{
    load_defaults, ChapterConfig, ConfigLoader, Granularity, InputConfig, PipelineConfig,
    TokenizerConfig,
};
pub use error::{Error, ErrorPolicy, Result};
pub use frequency::{
    term_counts, Dimension, FrequencyQuery, FrequencyRecord, Normalization, Order, Term,
    TermShape, TokenPredicate, UnitKey,
};
pub use line::{AnnotatedLine, Line};
pub use loader::{lines_from_str, LineLoader, Loaded, TextEncoding};
pub use pipeline::{Analysis, Pipeline};
pub use stopwords::StopWords;
pub use table::{read_lexicon_tsv, write_frequencies_tsv, write_tf_idf_tsv, write_tokens_tsv};
pub use tokenize::{
    tokenize_lines, ContractionRule, HyphenRule, NgramTokenizer, SentenceTokenizer, Token,
    Tokenized, Tokenizer, TokenizerOptions, WordTokenizer,
};
pub use weighting::{tf_idf, TfIdfRecord};
