//! Frequency queries over a token stream.
//!
//! A [`FrequencyQuery`] groups tokens by structural unit, keeps the tokens that
//! satisfy an optional [`TokenPredicate`], counts terms per group and
//! optionally normalizes the counts.
//!
//! ## Two Kinds of Percentage
//!
//! Asking "how often does *aorangi* occur in each chapter?" has two readings,
//! and they disagree on chapters where the word never occurs:
//!
//! ```text
//! chapter  tokens  aorangi   PercentOfMatches   PercentOfGroup
//!       0     100        3   3/5 = 60%          3/100 = 3%
//!       1     200        2   2/5 = 40%          2/200 = 1%
//!       2     150        0   (no row)           0/150 = 0%
//! ```
//!
//! - [`Normalization::PercentOfMatches`] looks only at matching rows. A group
//!   without matches has no rows, so it is absent from the output.
//! - [`Normalization::PercentOfGroup`] divides by the group's token total. Every
//!   group in the stream appears, with a zero row for each term it lacks. A
//!   word named by the filter counts as a term even if it never occurs. For
//!   bigrams the total counts only tokens that have a follower.
//!
//! A group that is absent and a group with a zero count are different
//! answers, so the two are separate normalizations.
//!
//! ## Determinism
//!
//! Groups are emitted in key order and terms in the order they were first
//! encountered. Hash maps are only used for lookups, never iterated, so the
//! same tokens always produce the same records.

use std::fmt;
use std::str::FromStr;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::{Error, Result, Token};

/// A structural dimension to group by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Dimension {
    /// Group by `chapter_index`.
    Chapter,
    /// Group by `paragraph_index`.
    Paragraph,
}

impl FromStr for Dimension {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "chapter" => Ok(Self::Chapter),
            "paragraph" => Ok(Self::Paragraph),
            other => Err(Error::config(format!("unknown grouping dimension: {other:?}"))),
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Chapter => f.write_str("chapter"),
            Self::Paragraph => f.write_str("paragraph"),
        }
    }
}

/// The value of the grouping dimensions for one group.
///
/// Dimensions that are not grouped on are `None`; the key of an ungrouped
/// query is all `None` and stands for the whole document.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct UnitKey {
    /// Chapter index, if grouped by chapter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub chapter: Option<usize>,
    /// Paragraph index, if grouped by paragraph.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paragraph: Option<usize>,
}

impl UnitKey {
    /// The whole document.
    pub const DOCUMENT: Self = Self {
        chapter: None,
        paragraph: None,
    };

    /// A chapter key.
    #[must_use]
    pub const fn chapter(chapter: usize) -> Self {
        Self {
            chapter: Some(chapter),
            paragraph: None,
        }
    }

    /// A paragraph key.
    #[must_use]
    pub const fn paragraph(paragraph: usize) -> Self {
        Self {
            chapter: None,
            paragraph: Some(paragraph),
        }
    }

    /// The key of `token` under the given dimensions.
    #[must_use]
    pub fn of(token: &Token, dimensions: &[Dimension]) -> Self {
        dimensions
            .iter()
            .fold(Self::DOCUMENT, |key, dimension| match dimension {
                Dimension::Chapter => Self {
                    chapter: Some(token.chapter_index),
                    ..key
                },
                Dimension::Paragraph => Self {
                    paragraph: Some(token.paragraph_index),
                    ..key
                },
            })
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.chapter, self.paragraph) {
            (None, None) => f.write_str("document"),
            (Some(c), None) => write!(f, "chapter {c}"),
            (None, Some(p)) => write!(f, "paragraph {p}"),
            (Some(c), Some(p)) => write!(f, "chapter {c}, paragraph {p}"),
        }
    }
}

/// What a frequency record counts.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Term {
    /// A single token text.
    Word(String),
    /// A token text and the text that follows it.
    Pair(String, String),
    /// All tokens matching a predicate, named by the predicate.
    Label(String),
}

impl Term {
    /// The word, for [`Term::Word`].
    #[must_use]
    pub fn as_word(&self) -> Option<&str> {
        match self {
            Self::Word(word) => Some(word),
            _ => None,
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Word(word) | Self::Label(word) => f.write_str(word),
            Self::Pair(first, second) => write!(f, "{first} {second}"),
        }
    }
}

/// A boolean condition on a single token.
///
/// ```rust
/// use folio::TokenPredicate;
///
/// let mount_cook: TokenPredicate = "text=mount & following=cook".parse().unwrap();
/// assert_eq!(mount_cook.to_string(), "text=mount & following=cook");
/// assert!("colour=red".parse::<TokenPredicate>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenPredicate {
    /// `text` equals the value.
    TextEquals(String),
    /// `following` is present and equals the value.
    FollowingEquals(String),
    /// Every inner predicate holds.
    All(Vec<TokenPredicate>),
    /// At least one inner predicate holds.
    Any(Vec<TokenPredicate>),
    /// The inner predicate does not hold.
    Not(Box<TokenPredicate>),
}

impl TokenPredicate {
    /// `text == word`.
    #[must_use]
    pub fn text(word: impl Into<String>) -> Self {
        Self::TextEquals(word.into())
    }

    /// `following == word`.
    #[must_use]
    pub fn following(word: impl Into<String>) -> Self {
        Self::FollowingEquals(word.into())
    }

    /// Conjunction with another predicate.
    #[must_use]
    pub fn and(self, other: Self) -> Self {
        match self {
            Self::All(mut inner) => {
                inner.push(other);
                Self::All(inner)
            }
            first => Self::All(vec![first, other]),
        }
    }

    /// Whether the token satisfies the predicate.
    #[must_use]
    pub fn matches(&self, token: &Token) -> bool {
        match self {
            Self::TextEquals(word) => token.text == *word,
            Self::FollowingEquals(word) => token.following.as_deref() == Some(word.as_str()),
            Self::All(inner) => inner.iter().all(|p| p.matches(token)),
            Self::Any(inner) => inner.iter().any(|p| p.matches(token)),
            Self::Not(inner) => !inner.matches(token),
        }
    }

    /// The text every matching token must have, if the predicate fixes one.
    fn fixed_text(&self) -> Option<&str> {
        match self {
            Self::TextEquals(word) => Some(word),
            Self::All(inner) => inner.iter().find_map(Self::fixed_text),
            _ => None,
        }
    }

    /// The follower every matching token must have, if the predicate fixes one.
    fn fixed_following(&self) -> Option<&str> {
        match self {
            Self::FollowingEquals(word) => Some(word),
            Self::All(inner) => inner.iter().find_map(Self::fixed_following),
            _ => None,
        }
    }

    fn validate(&self) -> Result<()> {
        match self {
            Self::TextEquals(word) | Self::FollowingEquals(word) if word.is_empty() => {
                Err(Error::config(format!("empty value in predicate {self}")))
            }
            Self::All(inner) | Self::Any(inner) if inner.is_empty() => {
                Err(Error::config("empty predicate group"))
            }
            Self::All(inner) | Self::Any(inner) => inner.iter().try_for_each(Self::validate),
            Self::Not(inner) => inner.validate(),
            _ => Ok(()),
        }
    }

    fn parse_atom(atom: &str) -> Result<Self> {
        let atom = atom.trim();
        if let Some(rest) = atom.strip_prefix('!') {
            return Ok(Self::Not(Box::new(Self::parse_atom(rest)?)));
        }
        let (key, value) = atom
            .split_once('=')
            .ok_or_else(|| Error::config(format!("predicate {atom:?} is not key=value")))?;
        let value = value.trim();
        if value.is_empty() {
            return Err(Error::config(format!("predicate {atom:?} has no value")));
        }
        match key.trim() {
            "text" => Ok(Self::text(value)),
            "following" => Ok(Self::following(value)),
            other => Err(Error::config(format!("unknown predicate: {other:?}"))),
        }
    }
}

impl FromStr for TokenPredicate {
    type Err = Error;

    /// Parse `text=w`, `following=w`, `!atom`, conjunctions with `&` and
    /// disjunctions with `|` (`&` binds tighter).
    fn from_str(s: &str) -> Result<Self> {
        let mut alternatives = s
            .split('|')
            .map(|alternative| {
                let mut atoms = alternative
                    .split('&')
                    .map(Self::parse_atom)
                    .collect::<Result<Vec<_>>>()?;
                Ok(if atoms.len() == 1 {
                    atoms.remove(0)
                } else {
                    Self::All(atoms)
                })
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(if alternatives.len() == 1 {
            alternatives.remove(0)
        } else {
            Self::Any(alternatives)
        })
    }
}

impl fmt::Display for TokenPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(f: &mut fmt::Formatter<'_>, inner: &[TokenPredicate], sep: &str) -> fmt::Result {
            for (i, predicate) in inner.iter().enumerate() {
                if i > 0 {
                    f.write_str(sep)?;
                }
                match predicate {
                    TokenPredicate::All(_) | TokenPredicate::Any(_) => write!(f, "({predicate})")?,
                    _ => write!(f, "{predicate}")?,
                }
            }
            Ok(())
        }

        match self {
            Self::TextEquals(word) => write!(f, "text={word}"),
            Self::FollowingEquals(word) => write!(f, "following={word}"),
            Self::All(inner) => join(f, inner, " & "),
            Self::Any(inner) => join(f, inner, " | "),
            Self::Not(inner) => match inner.as_ref() {
                Self::All(_) | Self::Any(_) => write!(f, "!({inner})"),
                _ => write!(f, "!{inner}"),
            },
        }
    }
}

/// How counts are reported.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Normalization {
    /// Raw counts; groups without matches are absent, `percentage` is `None`.
    #[default]
    Count,
    /// Count over all matching tokens; groups without matches are absent.
    PercentOfMatches,
    /// Count over the group's term-yielding tokens; every group appears, zero-filled.
    PercentOfGroup,
}

impl FromStr for Normalization {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "count" => Ok(Self::Count),
            "percent-of-matches" | "matches" => Ok(Self::PercentOfMatches),
            "percent-of-group" | "group" => Ok(Self::PercentOfGroup),
            other => Err(Error::config(format!("unknown normalization: {other:?}"))),
        }
    }
}

/// What each record's term is.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TermShape {
    /// The token text.
    #[default]
    Word,
    /// The token text and its follower. Tokens without a follower are skipped.
    Bigram,
    /// One term per group: every matching token, labelled by the predicate.
    Matches,
}

impl FromStr for TermShape {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "word" => Ok(Self::Word),
            "bigram" => Ok(Self::Bigram),
            "matches" => Ok(Self::Matches),
            other => Err(Error::config(format!("unknown term shape: {other:?}"))),
        }
    }
}

/// Record order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Order {
    /// Group key order, then first-encountered term order.
    #[default]
    Source,
    /// Highest count first; ties keep source order.
    CountDescending,
}

impl FromStr for Order {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "source" => Ok(Self::Source),
            "count" | "count-descending" => Ok(Self::CountDescending),
            other => Err(Error::config(format!("unknown order: {other:?}"))),
        }
    }
}

/// One row of a frequency table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrequencyRecord {
    /// The group.
    #[serde(flatten)]
    pub unit: UnitKey,
    /// What was counted.
    pub term: Term,
    /// Number of occurrences.
    pub count: usize,
    /// Percentage in `0..=100`, absent for raw counts.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentage: Option<f64>,
}

/// A frequency query.
///
/// ```rust
/// use folio::{Dimension, FrequencyQuery, Normalization, TokenPredicate};
///
/// let query = FrequencyQuery::new()
///     .group_by([Dimension::Chapter])
///     .filter(TokenPredicate::text("aorangi"))
///     .normalization(Normalization::PercentOfGroup);
/// assert!(query.validate().is_ok());
/// ```
#[derive(Debug, Clone, Default)]
pub struct FrequencyQuery {
    group_by: Vec<Dimension>,
    filter: Option<TokenPredicate>,
    terms: TermShape,
    normalization: Normalization,
    order: Order,
}

impl FrequencyQuery {
    /// Ungrouped word counts in source order.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Group by these dimensions.
    #[must_use]
    pub fn group_by(mut self, dimensions: impl IntoIterator<Item = Dimension>) -> Self {
        self.group_by = dimensions.into_iter().collect();
        self
    }

    /// Only count tokens satisfying `predicate`.
    #[must_use]
    pub fn filter(mut self, predicate: TokenPredicate) -> Self {
        self.filter = Some(predicate);
        self
    }

    /// Choose the term shape.
    #[must_use]
    pub fn terms(mut self, terms: TermShape) -> Self {
        self.terms = terms;
        self
    }

    /// Choose the normalization.
    #[must_use]
    pub fn normalization(mut self, normalization: Normalization) -> Self {
        self.normalization = normalization;
        self
    }

    /// Choose the record order.
    #[must_use]
    pub fn order(mut self, order: Order) -> Self {
        self.order = order;
        self
    }

    /// The grouping dimensions.
    #[must_use]
    pub fn dimensions(&self) -> &[Dimension] {
        &self.group_by
    }

    /// Check the query without running it.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for a repeated dimension or a malformed predicate.
    pub fn validate(&self) -> Result<()> {
        for (i, dimension) in self.group_by.iter().enumerate() {
            if self.group_by[..i].contains(dimension) {
                return Err(Error::config(format!(
                    "dimension {dimension} listed more than once"
                )));
            }
        }
        if let Some(predicate) = &self.filter {
            predicate.validate()?;
        }
        Ok(())
    }

    fn label(&self) -> String {
        self.filter
            .as_ref()
            .map_or_else(|| "*".to_string(), ToString::to_string)
    }

    /// The term every group reports even when nothing matches it: the label
    /// for `Matches`, or the word (and follower) a filter pins down.
    fn seed_term(&self, label: &str) -> Option<Term> {
        let filter = self.filter.as_ref();
        match self.terms {
            TermShape::Matches => Some(Term::Label(label.to_string())),
            TermShape::Word => filter
                .and_then(TokenPredicate::fixed_text)
                .map(|word| Term::Word(word.to_string())),
            TermShape::Bigram => filter
                .and_then(|p| Some((p.fixed_text()?, p.fixed_following()?)))
                .map(|(word, next)| Term::Pair(word.to_string(), next.to_string())),
        }
    }

    fn term_for(&self, token: &Token, label: &str) -> Option<Term> {
        match self.terms {
            TermShape::Word => Some(Term::Word(token.text.clone())),
            TermShape::Bigram => token
                .following
                .as_ref()
                .map(|next| Term::Pair(token.text.clone(), next.clone())),
            TermShape::Matches => Some(Term::Label(label.to_string())),
        }
    }

    /// Run the query.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the query is invalid (checked before any
    /// token is read); [`Error::DivisionUndefined`] for a group percentage over
    /// a group without tokens, which happens for an ungrouped query over a
    /// stream with no token that yields a term.
    pub fn run(&self, tokens: &[Token]) -> Result<Vec<FrequencyRecord>> {
        self.validate()?;

        let label = self.label();
        let mut tally = Tally::default();
        if let Some(term) = self.seed_term(&label) {
            tally.term_slot(term);
        }
        let tally = tokens.iter().fold(tally, |mut tally, token| {
            // Tokens that yield no term under this shape (a paragraph's last
            // token for bigrams) are outside every denominator.
            let Some(term) = self.term_for(token, &label) else {
                return tally;
            };
            let group = tally.group_slot(UnitKey::of(token, &self.group_by));
            tally.group_totals[group] += 1;

            if self.filter.as_ref().map_or(true, |p| p.matches(token)) {
                let term = tally.term_slot(term);
                *tally.cells.entry((group, term)).or_insert(0) += 1;
                tally.matched += 1;
            }
            tally
        });

        if tally.groups.is_empty()
            && self.group_by.is_empty()
            && self.normalization == Normalization::PercentOfGroup
        {
            return Err(Error::DivisionUndefined {
                unit: UnitKey::DOCUMENT.to_string(),
            });
        }

        let mut records = tally.emit(self.normalization)?;
        if self.order == Order::CountDescending {
            records.sort_by(|a, b| b.count.cmp(&a.count));
        }
        log::debug!(
            "frequency query over {} tokens: {} records",
            tokens.len(),
            records.len()
        );
        Ok(records)
    }
}

/// Running totals for one query.
#[derive(Debug, Default)]
struct Tally {
    groups: Vec<UnitKey>,
    group_index: FxHashMap<UnitKey, usize>,
    group_totals: Vec<usize>,
    terms: Vec<Term>,
    term_index: FxHashMap<Term, usize>,
    cells: FxHashMap<(usize, usize), usize>,
    matched: usize,
}

impl Tally {
    fn group_slot(&mut self, key: UnitKey) -> usize {
        if let Some(&slot) = self.group_index.get(&key) {
            return slot;
        }
        let slot = self.groups.len();
        self.groups.push(key);
        self.group_totals.push(0);
        self.group_index.insert(key, slot);
        slot
    }

    fn term_slot(&mut self, term: Term) -> usize {
        if let Some(&slot) = self.term_index.get(&term) {
            return slot;
        }
        let slot = self.terms.len();
        self.term_index.insert(term.clone(), slot);
        self.terms.push(term);
        slot
    }

    fn emit(&self, normalization: Normalization) -> Result<Vec<FrequencyRecord>> {
        let mut group_order: Vec<usize> = (0..self.groups.len()).collect();
        group_order.sort_by_key(|&g| self.groups[g]);

        // Every (group, term) pair when zero-filling, otherwise only the
        // non-empty cells, sorted into the same order.
        let cells: Vec<((usize, usize), usize)> = if normalization == Normalization::PercentOfGroup
        {
            group_order
                .iter()
                .flat_map(|&group| {
                    (0..self.terms.len()).map(move |term| {
                        let count = self.cells.get(&(group, term)).copied().unwrap_or(0);
                        ((group, term), count)
                    })
                })
                .collect()
        } else {
            let mut rank = vec![0; self.groups.len()];
            for (position, &group) in group_order.iter().enumerate() {
                rank[group] = position;
            }
            let mut cells: Vec<_> = self.cells.iter().map(|(&cell, &count)| (cell, count)).collect();
            cells.sort_unstable_by_key(|&((group, term), _)| (rank[group], term));
            cells
        };

        cells
            .into_iter()
            .map(|((group, term), count)| -> Result<FrequencyRecord> {
                let unit = self.groups[group];
                let percentage = match normalization {
                    Normalization::Count => None,
                    Normalization::PercentOfMatches => Some(percent(count, self.matched, unit)?),
                    Normalization::PercentOfGroup => {
                        Some(percent(count, self.group_totals[group], unit)?)
                    }
                };
                Ok(FrequencyRecord {
                    unit,
                    term: self.terms[term].clone(),
                    count,
                    percentage,
                })
            })
            .collect()
    }
}

fn percent(count: usize, total: usize, unit: UnitKey) -> Result<f64> {
    if total == 0 {
        return Err(Error::DivisionUndefined {
            unit: unit.to_string(),
        });
    }
    Ok(count as f64 * 100.0 / total as f64)
}

/// Overall word counts, most frequent first.
///
/// # Errors
///
/// Never fails in practice; the signature matches [`FrequencyQuery::run`].
pub fn term_counts(tokens: &[Token]) -> Result<Vec<FrequencyRecord>> {
    FrequencyQuery::new()
        .order(Order::CountDescending)
        .run(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(text: &str, index: usize, paragraph: usize, chapter: usize) -> Token {
        Token {
            text: text.to_string(),
            token_index: index,
            line_index: paragraph,
            paragraph_index: paragraph,
            chapter_index: chapter,
            following: None,
        }
    }

    fn stream(chapters: &[&str]) -> Vec<Token> {
        let mut tokens = Vec::new();
        for (chapter, text) in chapters.iter().enumerate() {
            for word in text.split_whitespace() {
                tokens.push(token(word, tokens.len(), chapter, chapter));
            }
        }
        crate::attach_following(&mut tokens);
        tokens
    }

    fn summary(records: &[FrequencyRecord]) -> Vec<(String, String, usize)> {
        records
            .iter()
            .map(|r| (r.unit.to_string(), r.term.to_string(), r.count))
            .collect()
    }

    #[test]
    fn test_word_counts_source_order() {
        let tokens = stream(&["b a b"]);
        let records = FrequencyQuery::new().run(&tokens).unwrap();
        assert_eq!(
            summary(&records),
            [
                ("document".to_string(), "b".to_string(), 2),
                ("document".to_string(), "a".to_string(), 1)
            ]
        );
        assert!(records.iter().all(|r| r.percentage.is_none()));
    }

    #[test]
    fn test_count_descending_ties_first_seen() {
        let tokens = stream(&["x y z y z"]);
        let records = term_counts(&tokens).unwrap();
        let terms: Vec<String> = records.iter().map(|r| r.term.to_string()).collect();
        assert_eq!(terms, ["y", "z", "x"]);
    }

    #[test]
    fn test_grouped_by_chapter() {
        let tokens = stream(&["a b", "a"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .run(&tokens)
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].unit, UnitKey::chapter(1));
    }

    #[test]
    fn test_percent_of_group_sums_to_hundred() {
        let tokens = stream(&["a b b c", "c c d"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .normalization(Normalization::PercentOfGroup)
            .run(&tokens)
            .unwrap();
        for chapter in 0..2 {
            let total: f64 = records
                .iter()
                .filter(|r| r.unit == UnitKey::chapter(chapter))
                .filter_map(|r| r.percentage)
                .sum();
            assert!((total - 100.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_matches_only_omits_empty_group() {
        let tokens = stream(&["aorangi x", "y aorangi aorangi", "z z"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .filter(TokenPredicate::text("aorangi"))
            .normalization(Normalization::PercentOfMatches)
            .run(&tokens)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.unit != UnitKey::chapter(2)));
        let pct: Vec<f64> = records.iter().filter_map(|r| r.percentage).collect();
        assert!((pct[0] - 100.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_group_total_zero_fills() {
        let tokens = stream(&["aorangi x", "y aorangi aorangi", "z z"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .filter(TokenPredicate::text("aorangi"))
            .normalization(Normalization::PercentOfGroup)
            .run(&tokens)
            .unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[2].unit, UnitKey::chapter(2));
        assert_eq!(records[2].count, 0);
        assert_eq!(records[2].percentage, Some(0.0));
        assert_eq!(records[0].percentage, Some(50.0));
    }

    #[test]
    fn test_group_total_zero_fills_absent_word() {
        let tokens = stream(&["x y", "z", "w w"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .filter(TokenPredicate::text("aorangi"))
            .normalization(Normalization::PercentOfGroup)
            .run(&tokens)
            .unwrap();
        assert_eq!(records.len(), 3);
        assert!(records.iter().all(|r| r.count == 0 && r.percentage == Some(0.0)));
        assert!(records.iter().all(|r| r.term == Term::Word("aorangi".into())));

        let matches_only = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .filter(TokenPredicate::text("aorangi"))
            .normalization(Normalization::PercentOfMatches)
            .run(&tokens)
            .unwrap();
        assert!(matches_only.is_empty());
    }

    #[test]
    fn test_group_total_zero_fills_absent_pair() {
        let tokens = stream(&["mount cook", "cook"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .filter(TokenPredicate::text("tasman").and(TokenPredicate::following("glacier")))
            .terms(TermShape::Bigram)
            .normalization(Normalization::PercentOfGroup)
            .run(&tokens)
            .unwrap();
        // Chapter 1 has no bigram at all, so only chapter 0 is a group.
        assert_eq!(
            summary(&records),
            [("chapter 0".to_string(), "tasman glacier".to_string(), 0)]
        );
    }

    #[test]
    fn test_bigram_group_percentages_sum_to_hundred() {
        let tokens = stream(&["mount cook is big"]);
        let records = FrequencyQuery::new()
            .terms(TermShape::Bigram)
            .normalization(Normalization::PercentOfGroup)
            .run(&tokens)
            .unwrap();
        assert_eq!(records.len(), 3);
        let total: f64 = records.iter().filter_map(|r| r.percentage).sum();
        assert!((total - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_matches_shape_labels_rows() {
        let tokens = stream(&["mount cook", "cook"]);
        let records = FrequencyQuery::new()
            .group_by([Dimension::Chapter])
            .filter(TokenPredicate::text("mount").and(TokenPredicate::following("cook")))
            .terms(TermShape::Matches)
            .normalization(Normalization::PercentOfGroup)
            .run(&tokens)
            .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].term, Term::Label("text=mount & following=cook".into()));
        assert_eq!(records[0].count, 1);
        assert_eq!(records[1].count, 0);
    }

    #[test]
    fn test_bigrams_stay_in_paragraph() {
        let tokens = stream(&["mount cook", "is big"]);
        let records = FrequencyQuery::new()
            .terms(TermShape::Bigram)
            .run(&tokens)
            .unwrap();
        let terms: Vec<String> = records.iter().map(|r| r.term.to_string()).collect();
        assert_eq!(terms, ["mount cook", "is big"]);
    }

    #[test]
    fn test_following_filter() {
        let tokens = stream(&["the glacier the peak the glacier"]);
        let records = FrequencyQuery::new()
            .filter(TokenPredicate::text("the"))
            .terms(TermShape::Bigram)
            .order(Order::CountDescending)
            .run(&tokens)
            .unwrap();
        assert_eq!(records[0].term, Term::Pair("the".into(), "glacier".into()));
        assert_eq!(records[0].count, 2);
    }

    #[test]
    fn test_duplicate_dimension_rejected_before_run() {
        let err = FrequencyQuery::new()
            .group_by([Dimension::Chapter, Dimension::Chapter])
            .run(&[])
            .unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_empty_document_group_percentage_undefined() {
        let err = FrequencyQuery::new()
            .normalization(Normalization::PercentOfGroup)
            .run(&[])
            .unwrap_err();
        assert!(matches!(err, Error::DivisionUndefined { .. }));
    }

    #[test]
    fn test_empty_stream_counts_are_empty() {
        let records = FrequencyQuery::new()
            .group_by([Dimension::Paragraph])
            .normalization(Normalization::PercentOfMatches)
            .run(&[])
            .unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn test_unit_key_of() {
        let t = token("x", 0, 7, 2);
        assert_eq!(UnitKey::of(&t, &[]), UnitKey::DOCUMENT);
        let both = UnitKey::of(&t, &[Dimension::Paragraph, Dimension::Chapter]);
        assert_eq!(both.chapter, Some(2));
        assert_eq!(both.paragraph, Some(7));
        assert_eq!(both.to_string(), "chapter 2, paragraph 7");
    }

    #[test]
    fn test_parse_dimension() {
        assert_eq!("Chapter".parse::<Dimension>().unwrap(), Dimension::Chapter);
        assert!("verse".parse::<Dimension>().is_err());
    }

    #[test]
    fn test_parse_predicates() {
        let p: TokenPredicate = "text=a | text=b & !following=c".parse().unwrap();
        assert_eq!(
            p,
            TokenPredicate::Any(vec![
                TokenPredicate::text("a"),
                TokenPredicate::All(vec![
                    TokenPredicate::text("b"),
                    TokenPredicate::Not(Box::new(TokenPredicate::following("c"))),
                ]),
            ])
        );
        assert_eq!(p.to_string(), "text=a | (text=b & !following=c)");
        assert!("text=".parse::<TokenPredicate>().is_err());
        assert!("text".parse::<TokenPredicate>().is_err());
        assert!("".parse::<TokenPredicate>().is_err());
    }

    #[test]
    fn test_following_absent_never_matches() {
        let t = token("end", 0, 0, 0);
        assert!(!TokenPredicate::following("x").matches(&t));
        assert!(TokenPredicate::Not(Box::new(TokenPredicate::following("x"))).matches(&t));
    }
}
