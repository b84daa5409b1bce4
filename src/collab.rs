//! Seams for external collaborators: stemmers, sentiment lexicons and topic
//! models.
//!
//! folio ships none of these algorithms. It defines the shape of each
//! collaborator as a trait, feeds it tables keyed by [`UnitKey`], and takes
//! its answers back keyed the same way.

use rustc_hash::FxHashMap;
use serde::Serialize;

use crate::{Dimension, Error, FrequencyQuery, FrequencyRecord, Result, Term, Token, UnitKey};

/// Maps a word to its stem under some language ruleset.
pub trait Stemmer: Send + Sync {
    /// The stem of `word`.
    fn stem(&self, word: &str) -> String;
}

/// Rewrite token texts (and their followers) through a stemmer.
///
/// Indices are untouched, so stemmed tokens can be counted with the same
/// queries as the originals.
pub fn stem_tokens(tokens: &[Token], stemmer: &dyn Stemmer) -> Vec<Token> {
    tokens
        .iter()
        .map(|token| Token {
            text: stemmer.stem(&token.text),
            following: token.following.as_deref().map(|next| stemmer.stem(next)),
            ..token.clone()
        })
        .collect()
}

/// Maps a word to the sentiment categories it carries.
pub trait SentimentLexicon: Send + Sync {
    /// Categories of `word`, in lexicon order. Empty if the word is unknown.
    fn categories(&self, word: &str) -> &[String];
}

/// An in-memory lexicon built from `(word, category)` rows.
///
/// ```rust
/// use folio::{Lexicon, SentimentLexicon};
///
/// let lexicon = Lexicon::from_rows([("storm", "fear"), ("storm", "negative"), ("sunny", "joy")]);
/// assert_eq!(lexicon.categories("storm"), ["fear", "negative"]);
/// assert!(lexicon.categories("rock").is_empty());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Lexicon {
    entries: FxHashMap<String, Vec<String>>,
}

impl Lexicon {
    /// Build from rows. Repeated `(word, category)` pairs are kept once.
    pub fn from_rows<W, C>(rows: impl IntoIterator<Item = (W, C)>) -> Self
    where
        W: Into<String>,
        C: Into<String>,
    {
        rows.into_iter().fold(Self::default(), |mut lexicon, (word, category)| {
            lexicon.insert(word, category);
            lexicon
        })
    }

    /// Add one row.
    pub fn insert(&mut self, word: impl Into<String>, category: impl Into<String>) {
        let category = category.into();
        let categories = self.entries.entry(word.into()).or_default();
        if !categories.contains(&category) {
            categories.push(category);
        }
    }

    /// Number of distinct words.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the lexicon has no words.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl SentimentLexicon for Lexicon {
    fn categories(&self, word: &str) -> &[String] {
        self.entries.get(word).map(Vec::as_slice).unwrap_or_default()
    }
}

/// Count sentiment categories per group.
///
/// Each token contributes one count to every category its word carries;
/// unknown words contribute nothing. Terms are category names.
///
/// # Errors
///
/// [`Error::Configuration`] for an invalid grouping.
pub fn sentiment_counts(
    tokens: &[Token],
    lexicon: &dyn SentimentLexicon,
    group_by: &[Dimension],
) -> Result<Vec<FrequencyRecord>> {
    let labelled: Vec<Token> = tokens
        .iter()
        .flat_map(|token| {
            lexicon
                .categories(&token.text)
                .iter()
                .map(move |category| Token {
                    text: category.clone(),
                    following: None,
                    ..token.clone()
                })
        })
        .collect();
    FrequencyQuery::new()
        .group_by(group_by.iter().copied())
        .run(&labelled)
}

/// A sparse term-document count matrix.
///
/// Documents are unit keys and terms are words, both in first-seen order.
///
/// ```rust
/// use folio::{FrequencyRecord, Term, TermDocumentMatrix, UnitKey};
///
/// let row = |chapter, word: &str, count| FrequencyRecord {
///     unit: UnitKey::chapter(chapter),
///     term: Term::Word(word.into()),
///     count,
///     percentage: None,
/// };
/// let matrix = TermDocumentMatrix::from_records(&[row(0, "ice", 2), row(1, "rock", 1)]).unwrap();
/// assert_eq!(matrix.n_documents(), 2);
/// assert_eq!(matrix.get(0, 0), 2);
/// assert_eq!(matrix.get(1, 0), 0);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermDocumentMatrix {
    documents: Vec<UnitKey>,
    terms: Vec<String>,
    cells: FxHashMap<(usize, usize), usize>,
}

impl TermDocumentMatrix {
    /// Build from word-count records. Zero counts are skipped.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if a record is not a word count.
    pub fn from_records(records: &[FrequencyRecord]) -> Result<Self> {
        let mut matrix = Self::default();
        let mut document_index: FxHashMap<UnitKey, usize> = FxHashMap::default();
        let mut term_index: FxHashMap<String, usize> = FxHashMap::default();

        for record in records.iter().filter(|r| r.count > 0) {
            let Term::Word(word) = &record.term else {
                return Err(Error::config(format!(
                    "term-document matrix needs word counts, got term {:?}",
                    record.term.to_string()
                )));
            };
            let document = *document_index.entry(record.unit).or_insert_with(|| {
                matrix.documents.push(record.unit);
                matrix.documents.len() - 1
            });
            let term = *term_index.entry(word.clone()).or_insert_with(|| {
                matrix.terms.push(word.clone());
                matrix.terms.len() - 1
            });
            *matrix.cells.entry((document, term)).or_insert(0) += record.count;
        }
        Ok(matrix)
    }

    /// Document keys, row order.
    #[must_use]
    pub fn documents(&self) -> &[UnitKey] {
        &self.documents
    }

    /// Terms, column order.
    #[must_use]
    pub fn terms(&self) -> &[String] {
        &self.terms
    }

    /// Number of rows.
    #[must_use]
    pub fn n_documents(&self) -> usize {
        self.documents.len()
    }

    /// Number of columns.
    #[must_use]
    pub fn n_terms(&self) -> usize {
        self.terms.len()
    }

    /// Whether the matrix has no non-zero cell.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Count at `(document, term)`; zero outside the matrix.
    #[must_use]
    pub fn get(&self, document: usize, term: usize) -> usize {
        self.cells.get(&(document, term)).copied().unwrap_or(0)
    }

    /// Dense row for one document.
    #[must_use]
    pub fn row(&self, document: usize) -> Vec<usize> {
        (0..self.terms.len())
            .map(|term| self.get(document, term))
            .collect()
    }
}

/// A document-by-topic weight matrix returned by a topic model.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentTopics {
    /// Row keys, in the matrix's document order.
    pub documents: Vec<UnitKey>,
    /// `weights[d][t]`: weight of topic `t` in document `d`.
    pub weights: Vec<Vec<f64>>,
}

/// One cell of a [`DocumentTopics`] table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TopicWeight {
    /// The document.
    #[serde(flatten)]
    pub unit: UnitKey,
    /// Zero-based topic number.
    pub topic: usize,
    /// Weight of the topic in the document.
    pub weight: f64,
}

impl DocumentTopics {
    /// Flatten into rows, documents first.
    #[must_use]
    pub fn to_rows(&self) -> Vec<TopicWeight> {
        self.documents
            .iter()
            .zip(&self.weights)
            .flat_map(|(&unit, row)| {
                row.iter()
                    .enumerate()
                    .map(move |(topic, &weight)| TopicWeight {
                        unit,
                        topic,
                        weight,
                    })
            })
            .collect()
    }

    /// The highest-weighted topic of each document. Ties go to the lower topic.
    #[must_use]
    pub fn dominant_topics(&self) -> Vec<(UnitKey, usize)> {
        self.documents
            .iter()
            .zip(&self.weights)
            .map(|(&unit, row)| {
                let best = row
                    .iter()
                    .enumerate()
                    .fold((0, f64::NEG_INFINITY), |best, (topic, &weight)| {
                        if weight > best.1 {
                            (topic, weight)
                        } else {
                            best
                        }
                    });
                (unit, best.0)
            })
            .collect()
    }
}

/// A topic-model solver such as LDA.
pub trait TopicModel {
    /// Fit `k` topics and return one weight row per document of `matrix`.
    ///
    /// # Errors
    ///
    /// Whatever the solver reports.
    fn fit(&self, matrix: &TermDocumentMatrix, k: usize) -> Result<DocumentTopics>;
}

/// Validate the request, run the solver and check the shape it returns.
///
/// # Errors
///
/// [`Error::Configuration`] if `k < 1`, if the matrix is empty, or if the
/// solver's answer does not have one `k`-wide row per document.
pub fn fit_topics(
    model: &dyn TopicModel,
    matrix: &TermDocumentMatrix,
    k: usize,
) -> Result<DocumentTopics> {
    if k < 1 {
        return Err(Error::config("topic count k must be >= 1"));
    }
    if matrix.is_empty() {
        return Err(Error::config("cannot fit topics on an empty matrix"));
    }

    let topics = model.fit(matrix, k)?;
    if topics.documents != matrix.documents()
        || topics.weights.len() != matrix.n_documents()
        || topics.weights.iter().any(|row| row.len() != k)
    {
        return Err(Error::config(format!(
            "topic model returned a {}-row result for {} documents and k = {k}",
            topics.weights.len(),
            matrix.n_documents()
        )));
    }
    log::debug!(
        "fitted {k} topics over {} documents and {} terms",
        matrix.n_documents(),
        matrix.n_terms()
    );
    Ok(topics)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct TrimPlural;

    impl Stemmer for TrimPlural {
        fn stem(&self, word: &str) -> String {
            word.strip_suffix('s').unwrap_or(word).to_string()
        }
    }

    /// Puts all weight on topic `document % k`.
    struct RoundRobin;

    impl TopicModel for RoundRobin {
        fn fit(&self, matrix: &TermDocumentMatrix, k: usize) -> Result<DocumentTopics> {
            let weights = (0..matrix.n_documents())
                .map(|d| (0..k).map(|t| if t == d % k { 1.0 } else { 0.0 }).collect())
                .collect();
            Ok(DocumentTopics {
                documents: matrix.documents().to_vec(),
                weights,
            })
        }
    }

    struct Truncating;

    impl TopicModel for Truncating {
        fn fit(&self, matrix: &TermDocumentMatrix, _k: usize) -> Result<DocumentTopics> {
            Ok(DocumentTopics {
                documents: matrix.documents().to_vec(),
                weights: vec![vec![1.0]; matrix.n_documents()],
            })
        }
    }

    fn token(text: &str, token_index: usize, chapter: usize) -> Token {
        Token {
            text: text.to_string(),
            token_index,
            line_index: token_index,
            paragraph_index: chapter,
            chapter_index: chapter,
            following: None,
        }
    }

    fn row(chapter: usize, word: &str, count: usize) -> FrequencyRecord {
        FrequencyRecord {
            unit: UnitKey::chapter(chapter),
            term: Term::Word(word.to_string()),
            count,
            percentage: None,
        }
    }

    #[test]
    fn test_stem_tokens() {
        let mut tokens = vec![token("glaciers", 0, 0), token("peaks", 1, 0)];
        crate::attach_following(&mut tokens);
        let stemmed = stem_tokens(&tokens, &TrimPlural);
        assert_eq!(stemmed[0].text, "glacier");
        assert_eq!(stemmed[0].following.as_deref(), Some("peak"));
        assert_eq!(stemmed[1].token_index, 1);
    }

    #[test]
    fn test_sentiment_counts_by_chapter() {
        let lexicon = Lexicon::from_rows([
            ("storm", "negative"),
            ("storm", "fear"),
            ("sunny", "positive"),
        ]);
        let tokens = vec![
            token("storm", 0, 0),
            token("rock", 1, 0),
            token("sunny", 2, 1),
            token("storm", 3, 1),
        ];
        let records = sentiment_counts(&tokens, &lexicon, &[Dimension::Chapter]).unwrap();
        let summary: Vec<(String, String, usize)> = records
            .iter()
            .map(|r| (r.unit.to_string(), r.term.to_string(), r.count))
            .collect();
        assert_eq!(
            summary,
            [
                ("chapter 0".to_string(), "negative".to_string(), 1),
                ("chapter 0".to_string(), "fear".to_string(), 1),
                ("chapter 1".to_string(), "negative".to_string(), 1),
                ("chapter 1".to_string(), "fear".to_string(), 1),
                ("chapter 1".to_string(), "positive".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_lexicon_dedups() {
        let lexicon = Lexicon::from_rows([("a", "x"), ("a", "x")]);
        assert_eq!(lexicon.categories("a").len(), 1);
        assert_eq!(lexicon.len(), 1);
    }

    #[test]
    fn test_matrix_merges_and_rows() {
        let matrix = TermDocumentMatrix::from_records(&[
            row(0, "ice", 1),
            row(0, "rock", 2),
            row(1, "ice", 3),
            row(1, "snow", 0),
        ])
        .unwrap();
        assert_eq!(matrix.terms(), ["ice", "rock"]);
        assert_eq!(matrix.row(1), [3, 0]);
    }

    #[test]
    fn test_fit_topics_validates_k() {
        let matrix = TermDocumentMatrix::from_records(&[row(0, "ice", 1)]).unwrap();
        let err = fit_topics(&RoundRobin, &matrix, 0).unwrap_err();
        assert!(matches!(err, Error::Configuration(_)));
    }

    #[test]
    fn test_fit_topics_rejects_empty_matrix() {
        let matrix = TermDocumentMatrix::default();
        assert!(fit_topics(&RoundRobin, &matrix, 2).is_err());
    }

    #[test]
    fn test_fit_topics_checks_shape() {
        let matrix =
            TermDocumentMatrix::from_records(&[row(0, "ice", 1), row(1, "rock", 1)]).unwrap();
        assert!(fit_topics(&Truncating, &matrix, 2).is_err());
    }

    #[test]
    fn test_topic_rows_and_dominant() {
        let matrix =
            TermDocumentMatrix::from_records(&[row(0, "ice", 1), row(1, "rock", 1)]).unwrap();
        let topics = fit_topics(&RoundRobin, &matrix, 2).unwrap();
        assert_eq!(topics.to_rows().len(), 4);
        assert_eq!(
            topics.dominant_topics(),
            [(UnitKey::chapter(0), 0), (UnitKey::chapter(1), 1)]
        );
    }
}
