//! Structural annotation: paragraphs and chapters.
//!
//! ## Paragraphs
//!
//! A blank line closes the paragraph it sits in. The blank line itself still
//! belongs to that paragraph; the next line starts a new one:
//!
//! ```text
//! paragraph_index(i) = number of blank lines among lines 0..i
//!
//! line 0  "CHAPTER I"            paragraph 0
//! line 1  "Cook and Aorangi."    paragraph 0
//! line 2  ""                     paragraph 0   <- the separator
//! line 3  "Mount Cook is big."   paragraph 1
//! ```
//!
//! Consecutive blank lines each count, so a double blank line produces a
//! paragraph made of a single blank line.
//!
//! ## Chapters
//!
//! Chapter markers differ between books ("CHAPTER I", "Chapter 1", "GLOSSARY",
//! "APPENDIX", a closing note...), so the markers are a caller-supplied set of
//! [`BoundaryPredicate`]s. A line that matches any of them opens a new chapter
//! and belongs to it.
//!
//! Front matter before the first marker is chapter 0. If nothing but blank
//! lines precedes the first marker there is no front matter, and the first
//! marker opens chapter 0 itself:
//!
//! ```text
//! "CHAPTER I"   -> 0        "A Title Page" -> 0
//! "text"        -> 0        ""             -> 0
//! "CHAPTER II"  -> 1        "CHAPTER I"    -> 1
//! ```
//!
//! A document without markers is entirely chapter 0.
//!
//! Both rules are one stateful scan over the lines; nothing outside the scan
//! keeps a counter.

use regex::Regex;

use crate::{AnnotatedLine, Error, Line, Result};

/// Decides whether a line is a chapter boundary.
pub trait BoundaryPredicate: Send + Sync + std::fmt::Debug {
    /// Whether `line` opens a new chapter.
    fn is_boundary(&self, line: &str) -> bool;
}

/// Matches lines that start with a literal, ignoring leading whitespace.
///
/// ```rust
/// use folio::{BoundaryPredicate, PrefixRule};
///
/// let rule = PrefixRule::new("CHAPTER");
/// assert!(rule.is_boundary("CHAPTER XII"));
/// assert!(!rule.is_boundary("Chapter 12"));
///
/// let rule = PrefixRule::case_insensitive("chapter");
/// assert!(rule.is_boundary("  Chapter 12"));
/// ```
#[derive(Debug, Clone)]
pub struct PrefixRule {
    prefix: String,
    case_sensitive: bool,
}

impl PrefixRule {
    /// Case-sensitive prefix match.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` is empty, since it would match every line.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        assert!(!prefix.is_empty(), "boundary prefix must not be empty");
        Self {
            prefix,
            case_sensitive: true,
        }
    }

    /// Case-insensitive prefix match.
    ///
    /// # Panics
    ///
    /// Panics if `prefix` is empty.
    #[must_use]
    pub fn case_insensitive(prefix: impl Into<String>) -> Self {
        let prefix: String = prefix.into().to_lowercase();
        assert!(!prefix.is_empty(), "boundary prefix must not be empty");
        Self {
            prefix,
            case_sensitive: false,
        }
    }
}

impl BoundaryPredicate for PrefixRule {
    fn is_boundary(&self, line: &str) -> bool {
        let line = line.trim_start();
        if self.case_sensitive {
            line.starts_with(&self.prefix)
        } else {
            line.to_lowercase().starts_with(&self.prefix)
        }
    }
}

/// Matches lines against a regular expression.
///
/// ```rust
/// use folio::{BoundaryPredicate, PatternRule};
///
/// let rule = PatternRule::new(r"^(?i)chapter [ivxlc]+\.?$").unwrap();
/// assert!(rule.is_boundary("Chapter IV."));
/// assert!(!rule.is_boundary("Chapter the fourth"));
/// ```
#[derive(Debug, Clone)]
pub struct PatternRule {
    regex: Regex,
}

impl PatternRule {
    /// Compile a pattern rule.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the pattern does not compile.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|err| Error::config(format!("chapter pattern {pattern:?}: {err}")))?;
        Ok(Self { regex })
    }
}

impl BoundaryPredicate for PatternRule {
    fn is_boundary(&self, line: &str) -> bool {
        self.regex.is_match(line)
    }
}

/// An ordered set of boundary predicates, evaluated as a logical OR.
#[derive(Debug, Default)]
pub struct ChapterRules {
    rules: Vec<Box<dyn BoundaryPredicate>>,
}

impl ChapterRules {
    /// No rules: every line is chapter 0.
    #[must_use]
    pub fn none() -> Self {
        Self::default()
    }

    /// The common Project Gutenberg marker: lines starting with `CHAPTER`.
    #[must_use]
    pub fn chapter_headings() -> Self {
        Self::none().with(PrefixRule::new("CHAPTER"))
    }

    /// Append a rule.
    #[must_use]
    pub fn with(mut self, rule: impl BoundaryPredicate + 'static) -> Self {
        self.rules.push(Box::new(rule));
        self
    }

    /// Append an already boxed rule.
    pub fn push(&mut self, rule: Box<dyn BoundaryPredicate>) {
        self.rules.push(rule);
    }

    /// Number of rules.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether there are no rules.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Whether any rule matches.
    #[must_use]
    pub fn is_boundary(&self, line: &str) -> bool {
        self.rules.iter().any(|rule| rule.is_boundary(line))
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct ScanState {
    blank_lines_seen: usize,
    chapter: usize,
    seen_content: bool,
}

/// Assigns paragraph and chapter indices to lines.
///
/// ```rust
/// use folio::{lines_from_str, Annotator, ChapterRules};
///
/// let lines = lines_from_str("CHAPTER I\nCook and Aorangi.\n\nMount Cook is big.");
/// let annotated = Annotator::new(ChapterRules::chapter_headings()).annotate(lines);
///
/// let paragraphs: Vec<usize> = annotated.iter().map(|l| l.paragraph_index).collect();
/// assert_eq!(paragraphs, [0, 0, 0, 1]);
/// assert!(annotated.iter().all(|l| l.chapter_index == 0));
/// ```
#[derive(Debug, Default)]
pub struct Annotator {
    chapters: ChapterRules,
}

impl Annotator {
    /// Create an annotator with the given chapter rules.
    #[must_use]
    pub fn new(chapters: ChapterRules) -> Self {
        Self { chapters }
    }

    /// The chapter rules in use.
    #[must_use]
    pub fn chapter_rules(&self) -> &ChapterRules {
        &self.chapters
    }

    /// Annotate lines in order.
    pub fn annotate(&self, lines: impl IntoIterator<Item = Line>) -> Vec<AnnotatedLine> {
        lines
            .into_iter()
            .scan(ScanState::default(), |state, line| {
                if self.chapters.is_boundary(&line.raw_text) && state.seen_content {
                    state.chapter += 1;
                }
                let paragraph_index = state.blank_lines_seen;
                let chapter_index = state.chapter;

                if line.is_blank() {
                    state.blank_lines_seen += 1;
                } else {
                    state.seen_content = true;
                }

                Some(AnnotatedLine {
                    line,
                    paragraph_index,
                    chapter_index,
                })
            })
            .collect()
    }
}
