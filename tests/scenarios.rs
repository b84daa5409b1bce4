//! End-to-end scenarios over small books.
//!
//! Each test runs the full pipeline, from bytes or a file, through to
//! frequency records or tables.

use std::io::Write;

use folio::{
    write_frequencies_tsv, ChapterRules, ConfigLoader, Dimension, ErrorPolicy, FrequencyQuery,
    Line, Normalization, Order, Pipeline, PrefixRule, StopWords, Term, TokenPredicate,
};

const THREE_CHAPTERS: &str = "\
CHAPTER I
Aorangi rises.
CHAPTER II
Aorangi and Aorangi.
CHAPTER III
The Tasman glacier.
";

fn aorangi_by_chapter(normalization: Normalization) -> FrequencyQuery {
    FrequencyQuery::new()
        .group_by([Dimension::Chapter])
        .filter(TokenPredicate::text("aorangi"))
        .normalization(normalization)
}

// =============================================================================
// Structure
// =============================================================================

#[test]
fn chapter_heading_on_first_line_is_front_matter() {
    let lines = ["CHAPTER I", "Cook and Aorangi.", "", "Mount Cook is big."]
        .iter()
        .enumerate()
        .map(|(i, text)| Line::new(*text, i))
        .collect();
    let analysis = Pipeline::default().run_lines(lines).unwrap();

    let paragraphs: Vec<usize> = analysis.lines.iter().map(|l| l.paragraph_index).collect();
    assert_eq!(paragraphs, [0, 0, 0, 1]);
    assert!(analysis.lines.iter().all(|l| l.chapter_index == 0));
    assert_eq!(analysis.paragraph_count(), 2);

    let line_one: Vec<&str> = analysis
        .tokens
        .iter()
        .filter(|t| t.line_index == 1)
        .map(|t| t.text.as_str())
        .collect();
    assert_eq!(line_one, ["cook", "and", "aorangi"]);

    let mount = analysis.tokens.iter().find(|t| t.text == "mount").unwrap();
    assert_eq!(mount.paragraph_index, 1);
    assert_eq!(mount.following.as_deref(), Some("cook"));

    // "aorangi" ends paragraph 0; "mount" in paragraph 1 is not its follower.
    let aorangi = analysis.tokens.iter().find(|t| t.text == "aorangi").unwrap();
    assert_eq!(aorangi.following, None);
}

#[test]
fn token_indices_are_dense() {
    let analysis = Pipeline::default().run_str(THREE_CHAPTERS).unwrap();
    for (i, token) in analysis.tokens.iter().enumerate() {
        assert_eq!(token.token_index, i);
    }
}

#[test]
fn custom_boundary_rules() {
    let rules = ChapterRules::none()
        .with(PrefixRule::case_insensitive("book"))
        .with(PrefixRule::new("EPILOGUE"));
    let analysis = Pipeline::default()
        .with_chapter_rules(rules)
        .run_str("Preface.\nBook One\nA.\nEPILOGUE\nB.")
        .unwrap();
    let chapters: Vec<usize> = analysis.lines.iter().map(|l| l.chapter_index).collect();
    assert_eq!(chapters, [0, 1, 1, 2, 2]);
}

// =============================================================================
// Frequencies
// =============================================================================

#[test]
fn group_percentage_zero_fills_missing_chapter() {
    let analysis = Pipeline::default().run_str(THREE_CHAPTERS).unwrap();
    assert_eq!(analysis.chapter_count(), 3);

    let records = analysis
        .query(&aorangi_by_chapter(Normalization::PercentOfGroup))
        .unwrap();
    let chapters: Vec<Option<usize>> = records.iter().map(|r| r.unit.chapter).collect();
    assert_eq!(chapters, [Some(0), Some(1), Some(2)]);

    // chapter, i, aorangi, rises
    assert_eq!(records[0].count, 1);
    assert!((records[0].percentage.unwrap() - 25.0).abs() < 1e-9);
    // chapter, ii, aorangi, and, aorangi
    assert_eq!(records[1].count, 2);
    assert!((records[1].percentage.unwrap() - 40.0).abs() < 1e-9);

    assert_eq!(records[2].count, 0);
    assert_eq!(records[2].percentage, Some(0.0));
    assert_eq!(records[2].term, Term::Word("aorangi".into()));
}

#[test]
fn match_percentage_omits_missing_chapter() {
    let analysis = Pipeline::default().run_str(THREE_CHAPTERS).unwrap();
    let records = analysis
        .query(&aorangi_by_chapter(Normalization::PercentOfMatches))
        .unwrap();

    assert_eq!(records.len(), 2);
    assert!(records.iter().all(|r| r.unit.chapter != Some(2)));
    let total: f64 = records.iter().filter_map(|r| r.percentage).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert!((records[1].percentage.unwrap() - 200.0 / 3.0).abs() < 1e-9);
}

#[test]
fn absent_word_still_reports_every_chapter() {
    let analysis = Pipeline::default().run_str(THREE_CHAPTERS).unwrap();
    let query = FrequencyQuery::new()
        .group_by([Dimension::Chapter])
        .filter(TokenPredicate::text("rakaia"));

    let group = analysis
        .query(&query.clone().normalization(Normalization::PercentOfGroup))
        .unwrap();
    let chapters: Vec<Option<usize>> = group.iter().map(|r| r.unit.chapter).collect();
    assert_eq!(chapters, [Some(0), Some(1), Some(2)]);
    assert!(group
        .iter()
        .all(|r| r.count == 0 && r.percentage == Some(0.0)));

    let matches = analysis
        .query(&query.normalization(Normalization::PercentOfMatches))
        .unwrap();
    assert!(matches.is_empty());
}

#[test]
fn bigrams_never_cross_paragraphs() {
    let analysis = Pipeline::default()
        .run_str("Mount Cook.\n\nCook village.")
        .unwrap();
    let records = analysis
        .query(&FrequencyQuery::new().terms(folio::TermShape::Bigram))
        .unwrap();
    let pairs: Vec<String> = records.iter().map(|r| r.term.to_string()).collect();
    assert_eq!(pairs, ["mount cook", "cook village"]);
}

#[test]
fn stop_words_then_counts() {
    let analysis = Pipeline::default()
        .run_str("The glacier and the moraine and the glacier.")
        .unwrap();
    let kept = StopWords::english().remove(&analysis.tokens);
    let records = FrequencyQuery::new()
        .order(Order::CountDescending)
        .run(&kept)
        .unwrap();
    assert_eq!(records[0].term, Term::Word("glacier".into()));
    assert_eq!(records[0].count, 2);
    assert!(records.iter().all(|r| r.term != Term::Word("the".into())));
}

// =============================================================================
// Determinism and I/O
// =============================================================================

fn render(bytes: &[u8]) -> Vec<u8> {
    let analysis = Pipeline::default().run_bytes(bytes).unwrap();
    let query = FrequencyQuery::new()
        .group_by([Dimension::Chapter, Dimension::Paragraph])
        .normalization(Normalization::PercentOfGroup);
    let records = analysis.query(&query).unwrap();
    let mut out = Vec::new();
    write_frequencies_tsv(&records, query.dimensions(), &mut out).unwrap();
    out
}

#[test]
fn identical_input_gives_identical_output() {
    let bytes = THREE_CHAPTERS.repeat(20);
    let first = render(bytes.as_bytes());
    for _ in 0..5 {
        assert_eq!(render(bytes.as_bytes()), first);
    }
}

#[test]
fn loads_from_file_with_config() {
    let mut book = tempfile::NamedTempFile::new().unwrap();
    book.write_all(b"\xef\xbb\xbfPrologue\r\nPART ONE\r\nwell-known peak\r\n")
        .unwrap();

    let mut settings = tempfile::NamedTempFile::new().unwrap();
    writeln!(
        settings,
        "[chapters]\nprefixes = [\"PART\"]\n[tokenizer]\nhyphens = \"keep\""
    )
    .unwrap();

    let pipeline = ConfigLoader::new()
        .with_file(settings.path())
        .build()
        .unwrap()
        .build()
        .unwrap();
    let analysis = pipeline.run_path(book.path()).unwrap();

    assert_eq!(analysis.lines[0].text(), "Prologue");
    assert_eq!(analysis.chapter_count(), 2);
    let texts: Vec<&str> = analysis.tokens.iter().map(|t| t.text.as_str()).collect();
    assert_eq!(texts, ["prologue", "part", "one", "well-known", "peak"]);
}

#[test]
fn missing_file_is_resource_error() {
    let err = Pipeline::default()
        .run_path("/no/such/book.txt")
        .unwrap_err();
    assert!(matches!(err, folio::Error::ResourceUnavailable { .. }));
}

#[test]
fn skipped_lines_keep_physical_indices() {
    let analysis = Pipeline::default()
        .with_policy(ErrorPolicy::SkipLine)
        .run_bytes(b"one\n\xc3\x28\nthree")
        .unwrap();
    assert_eq!(analysis.skipped.len(), 1);
    let lines: Vec<usize> = analysis.tokens.iter().map(|t| t.line_index).collect();
    assert_eq!(lines, [0, 2]);
}
