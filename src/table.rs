//! Row-oriented tables for plotting tools, spreadsheets and other collaborators.
//!
//! Every table is tab-separated with a header row. Unit-key columns appear
//! only for the dimensions the table was grouped by:
//!
//! ```text
//! chapter  term     count  percentage
//! 0        aorangi  3      3.000000
//! 2        aorangi  0      0.000000
//! ```
//!
//! Tabs and newlines inside a term are replaced by spaces so that a row is
//! always one line. Every row type also implements `serde::Serialize` for
//! JSON output.

use std::io::{BufRead, Write};

use crate::{Dimension, Error, FrequencyRecord, Lexicon, Result, TfIdfRecord, Token, UnitKey};

fn io_error(source: std::io::Error) -> Error {
    Error::ResourceUnavailable {
        resource: "table".to_string(),
        source,
    }
}

fn clean(field: &str) -> String {
    field.replace(['\t', '\n', '\r'], " ")
}

fn key_header(dimensions: &[Dimension]) -> Vec<String> {
    let mut sorted = dimensions.to_vec();
    sorted.sort();
    sorted.iter().map(ToString::to_string).collect()
}

fn key_fields(unit: UnitKey) -> Vec<String> {
    [unit.chapter, unit.paragraph]
        .into_iter()
        .flatten()
        .map(|index| index.to_string())
        .collect()
}

/// Write tokens, one row per token.
///
/// Columns: `token_index`, `line`, `paragraph`, `chapter`, `text`, `following`
/// (empty when absent).
///
/// # Errors
///
/// [`Error::ResourceUnavailable`] if writing fails.
pub fn write_tokens_tsv<W: Write>(tokens: &[Token], mut out: W) -> Result<()> {
    writeln!(out, "token_index\tline\tparagraph\tchapter\ttext\tfollowing").map_err(io_error)?;
    for token in tokens {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}\t{}",
            token.token_index,
            token.line_index,
            token.paragraph_index,
            token.chapter_index,
            clean(&token.text),
            token.following.as_deref().map(clean).unwrap_or_default()
        )
        .map_err(io_error)?;
    }
    Ok(())
}

/// Write a frequency table.
///
/// `dimensions` names the key columns; pass the query's
/// [`dimensions`](crate::FrequencyQuery::dimensions). The `percentage` column
/// is empty for raw counts.
///
/// ```rust
/// use folio::{write_frequencies_tsv, FrequencyRecord, Term, UnitKey, Dimension};
///
/// let records = [FrequencyRecord {
///     unit: UnitKey::chapter(2),
///     term: Term::Word("aorangi".into()),
///     count: 0,
///     percentage: Some(0.0),
/// }];
/// let mut out = Vec::new();
/// write_frequencies_tsv(&records, &[Dimension::Chapter], &mut out).unwrap();
/// assert_eq!(
///     String::from_utf8(out).unwrap(),
///     "chapter\tterm\tcount\tpercentage\n2\taorangi\t0\t0.000000\n"
/// );
/// ```
///
/// # Errors
///
/// [`Error::ResourceUnavailable`] if writing fails.
pub fn write_frequencies_tsv<W: Write>(
    records: &[FrequencyRecord],
    dimensions: &[Dimension],
    mut out: W,
) -> Result<()> {
    let mut header = key_header(dimensions);
    header.extend(["term", "count", "percentage"].map(String::from));
    writeln!(out, "{}", header.join("\t")).map_err(io_error)?;

    for record in records {
        let mut row = key_fields(record.unit);
        row.push(clean(&record.term.to_string()));
        row.push(record.count.to_string());
        row.push(
            record
                .percentage
                .map(|p| format!("{p:.6}"))
                .unwrap_or_default(),
        );
        writeln!(out, "{}", row.join("\t")).map_err(io_error)?;
    }
    Ok(())
}

/// Write a TF-IDF table.
///
/// # Errors
///
/// [`Error::ResourceUnavailable`] if writing fails.
pub fn write_tf_idf_tsv<W: Write>(
    records: &[TfIdfRecord],
    dimensions: &[Dimension],
    mut out: W,
) -> Result<()> {
    let mut header = key_header(dimensions);
    header.extend(["term", "count", "tf", "idf", "tf_idf"].map(String::from));
    writeln!(out, "{}", header.join("\t")).map_err(io_error)?;

    for record in records {
        let mut row = key_fields(record.unit);
        row.push(clean(&record.term));
        row.push(record.count.to_string());
        row.push(format!("{:.6}", record.tf));
        row.push(format!("{:.6}", record.idf));
        row.push(format!("{:.6}", record.tf_idf));
        writeln!(out, "{}", row.join("\t")).map_err(io_error)?;
    }
    Ok(())
}

/// Read a sentiment lexicon from `word<TAB>category` rows.
///
/// Blank lines and lines starting with `#` are ignored. Words are lowercased
/// to match case-folded tokens.
///
/// ```rust
/// use folio::{read_lexicon_tsv, SentimentLexicon};
///
/// let lexicon = read_lexicon_tsv("# nrc\nStorm\tfear\n\nstorm\tnegative\n".as_bytes()).unwrap();
/// assert_eq!(lexicon.categories("storm"), ["fear", "negative"]);
/// ```
///
/// # Errors
///
/// [`Error::ResourceUnavailable`] if reading fails, [`Error::Configuration`]
/// for a row without exactly two fields.
pub fn read_lexicon_tsv<R: BufRead>(input: R) -> Result<Lexicon> {
    let mut lexicon = Lexicon::default();
    for (number, line) in input.lines().enumerate() {
        let line = line.map_err(|source| Error::ResourceUnavailable {
            resource: "lexicon".to_string(),
            source,
        })?;
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut fields = line.split('\t');
        match (fields.next(), fields.next(), fields.next()) {
            (Some(word), Some(category), None) if !word.is_empty() && !category.is_empty() => {
                lexicon.insert(word.to_lowercase(), category);
            }
            _ => {
                return Err(Error::config(format!(
                    "lexicon line {number}: expected word<TAB>category"
                )))
            }
        }
    }
    log::debug!("read lexicon with {} words", lexicon.len());
    Ok(lexicon)
}
