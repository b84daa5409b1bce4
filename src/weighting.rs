//! TF-IDF over structural units.
//!
//! Each distinct unit key of a grouped word-count table is one document:
//!
//! ```text
//! tf(t, d)     = n(t, d) / total(d)
//! idf(t)       = ln(documents / documents containing t)
//! tf_idf(t, d) = tf(t, d) * idf(t)
//! ```
//!
//! A word used in every chapter gets `idf = 0`; words that characterise a
//! single chapter rank highest.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::{Error, FrequencyRecord, Result, Term, UnitKey};

/// One term's weight in one document.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TfIdfRecord {
    /// The document.
    #[serde(flatten)]
    pub unit: UnitKey,
    /// The word.
    pub term: String,
    /// Raw count.
    pub count: usize,
    /// Term frequency.
    pub tf: f64,
    /// Inverse document frequency.
    pub idf: f64,
    /// `tf * idf`.
    pub tf_idf: f64,
}

/// Weight raw word counts by TF-IDF.
///
/// Output keeps the input order. Zero-count rows (from a zero-filled query)
/// are dropped, but every unit must have at least one non-zero count.
///
/// ```rust
/// use folio::{tf_idf, FrequencyRecord, Term, UnitKey};
///
/// let row = |chapter, word: &str, count| FrequencyRecord {
///     unit: UnitKey::chapter(chapter),
///     term: Term::Word(word.into()),
///     count,
///     percentage: None,
/// };
/// let weights = tf_idf(&[row(0, "the", 2), row(0, "glacier", 1), row(1, "the", 3)]).unwrap();
/// assert_eq!(weights[0].idf, 0.0);
/// assert!(weights[1].tf_idf > 0.0);
/// ```
///
/// # Errors
///
/// [`Error::Configuration`] if a record is not a word count,
/// [`Error::DivisionUndefined`] for a unit whose counts are all zero.
pub fn tf_idf(records: &[FrequencyRecord]) -> Result<Vec<TfIdfRecord>> {
    let mut totals: FxHashMap<UnitKey, usize> = FxHashMap::default();
    let mut containing: FxHashMap<&str, FxHashSet<UnitKey>> = FxHashMap::default();

    for record in records {
        let Term::Word(word) = &record.term else {
            return Err(Error::config(format!(
                "tf-idf needs word counts, got term {:?}",
                record.term.to_string()
            )));
        };
        *totals.entry(record.unit).or_insert(0) += record.count;
        if record.count > 0 {
            containing.entry(word.as_str()).or_default().insert(record.unit);
        }
    }

    if let Some(empty) = records
        .iter()
        .find(|record| totals.get(&record.unit) == Some(&0))
    {
        return Err(Error::DivisionUndefined {
            unit: empty.unit.to_string(),
        });
    }

    let documents = totals.len() as f64;
    let weighted: Vec<TfIdfRecord> = records
        .iter()
        .filter(|record| record.count > 0)
        .map(|record| {
            let word = record.term.as_word().unwrap_or_default();
            let total = totals.get(&record.unit).copied().unwrap_or(1);
            let with_term = containing.get(word).map_or(0, FxHashSet::len) as f64;
            let tf = record.count as f64 / total as f64;
            let idf = (documents / with_term).ln();
            TfIdfRecord {
                unit: record.unit,
                term: word.to_string(),
                count: record.count,
                tf,
                idf,
                tf_idf: tf * idf,
            }
        })
        .collect();
    Ok(weighted)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(chapter: usize, word: &str, count: usize) -> FrequencyRecord {
        FrequencyRecord {
            unit: UnitKey::chapter(chapter),
            term: Term::Word(word.to_string()),
            count,
            percentage: None,
        }
    }

    #[test]
    fn test_shared_word_has_zero_idf() {
        let weights = tf_idf(&[row(0, "the", 1), row(1, "the", 1)]).unwrap();
        assert!(weights.iter().all(|w| w.tf_idf == 0.0));
    }

    #[test]
    fn test_distinctive_word() {
        let weights =
            tf_idf(&[row(0, "the", 3), row(0, "tasman", 1), row(1, "the", 2)]).unwrap();
        let tasman = &weights[1];
        assert_eq!(tasman.term, "tasman");
        assert!((tasman.tf - 0.25).abs() < 1e-12);
        assert!((tasman.idf - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_zero_rows_dropped() {
        let weights = tf_idf(&[row(0, "a", 1), row(1, "a", 0), row(1, "b", 1)]).unwrap();
        assert_eq!(weights.len(), 2);
        assert!((weights[0].idf - 2f64.ln()).abs() < 1e-12);
    }

    #[test]
    fn test_all_zero_unit_is_undefined() {
        let err = tf_idf(&[row(0, "a", 1), row(1, "a", 0)]).unwrap_err();
        assert!(matches!(err, Error::DivisionUndefined { unit } if unit == "chapter 1"));
    }

    #[test]
    fn test_rejects_pairs() {
        let record = FrequencyRecord {
            unit: UnitKey::DOCUMENT,
            term: Term::Pair("a".into(), "b".into()),
            count: 1,
            percentage: None,
        };
        assert!(matches!(tf_idf(&[record]), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_empty() {
        assert!(tf_idf(&[]).unwrap().is_empty());
    }
}
