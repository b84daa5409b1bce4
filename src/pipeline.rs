//! The end-to-end analysis pipeline.
//!
//! ```text
//! bytes -> LineLoader -> Annotator -> tokenize_lines -> attach_following -> Analysis
//! ```
//!
//! Every stage is a plain function of the previous stage's output, so the
//! same input always yields the same [`Analysis`].

use std::io::BufRead;
use std::path::Path;

use crate::{
    attach_following, lines_from_str, tokenize_lines, AnnotatedLine, Annotator, ChapterRules,
    Error, ErrorPolicy, FrequencyQuery, FrequencyRecord, Line, LineLoader, Loaded, Result,
    TextEncoding, Token, Tokenizer, WordTokenizer,
};

/// Loads, annotates and tokenizes a text.
///
/// ```rust
/// use folio::{FrequencyQuery, Pipeline};
///
/// let analysis = Pipeline::default()
///     .run_str("CHAPTER I\nCook and Aorangi.\n\nMount Cook.")
///     .unwrap();
/// assert_eq!(analysis.tokens.len(), 7);
/// assert_eq!(analysis.tokens[2].following.as_deref(), Some("and"));
///
/// let counts = analysis.query(&FrequencyQuery::new()).unwrap();
/// assert_eq!(counts[0].term.to_string(), "chapter");
/// ```
#[derive(Debug)]
pub struct Pipeline {
    loader: LineLoader,
    annotator: Annotator,
    tokenizer: Box<dyn Tokenizer>,
    policy: ErrorPolicy,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new(WordTokenizer::default())
    }
}

impl Pipeline {
    /// UTF-8 input, `CHAPTER` headings and the given tokenizer.
    pub fn new(tokenizer: impl Tokenizer + 'static) -> Self {
        Self::from_parts(
            LineLoader::default(),
            Annotator::new(ChapterRules::chapter_headings()),
            Box::new(tokenizer),
            ErrorPolicy::FailFast,
        )
    }

    pub(crate) fn from_parts(
        loader: LineLoader,
        annotator: Annotator,
        tokenizer: Box<dyn Tokenizer>,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            loader: loader.with_policy(policy),
            annotator,
            tokenizer,
            policy,
        }
    }

    /// Declared input encoding.
    #[must_use]
    pub fn with_encoding(mut self, encoding: TextEncoding) -> Self {
        self.loader = LineLoader::new(encoding).with_policy(self.policy);
        self
    }

    /// Chapter boundary rules.
    #[must_use]
    pub fn with_chapter_rules(mut self, rules: ChapterRules) -> Self {
        self.annotator = Annotator::new(rules);
        self
    }

    /// Policy for undecodable and untokenizable lines, applied at both stages.
    #[must_use]
    pub fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self.loader = self.loader.with_policy(policy);
        self
    }

    /// Replace the tokenizer.
    #[must_use]
    pub fn with_tokenizer(mut self, tokenizer: impl Tokenizer + 'static) -> Self {
        self.tokenizer = Box::new(tokenizer);
        self
    }

    /// The error policy.
    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    /// Analyse a file.
    ///
    /// # Errors
    ///
    /// [`Error::ResourceUnavailable`] if the file cannot be read; under
    /// [`ErrorPolicy::FailFast`], [`Error::Decoding`] or [`Error::Tokenization`]
    /// for the first bad line.
    pub fn run_path(&self, path: impl AsRef<Path>) -> Result<Analysis> {
        let loaded = self.loader.load_path(path)?;
        self.finish(loaded)
    }

    /// Analyse a buffered reader. `resource` names it in errors.
    ///
    /// # Errors
    ///
    /// As for [`run_path`](Self::run_path).
    pub fn run_reader<R: BufRead>(&self, reader: R, resource: &str) -> Result<Analysis> {
        let loaded = self.loader.load_reader(reader, resource)?;
        self.finish(loaded)
    }

    /// Analyse raw bytes in the declared encoding.
    ///
    /// # Errors
    ///
    /// As for [`run_path`](Self::run_path), minus resource errors.
    pub fn run_bytes(&self, bytes: &[u8]) -> Result<Analysis> {
        let loaded = self.loader.load_bytes(bytes)?;
        self.finish(loaded)
    }

    /// Analyse already-decoded text. The declared encoding is ignored.
    ///
    /// # Errors
    ///
    /// [`Error::Tokenization`] under [`ErrorPolicy::FailFast`].
    pub fn run_str(&self, text: &str) -> Result<Analysis> {
        self.run_lines(lines_from_str(text))
    }

    /// Analyse lines produced elsewhere.
    ///
    /// # Errors
    ///
    /// [`Error::Tokenization`] under [`ErrorPolicy::FailFast`].
    pub fn run_lines(&self, lines: Vec<Line>) -> Result<Analysis> {
        self.finish(Loaded {
            lines,
            skipped: Vec::new(),
        })
    }

    fn finish(&self, loaded: Loaded) -> Result<Analysis> {
        let Loaded { lines, mut skipped } = loaded;
        let lines = self.annotator.annotate(lines);
        let tokenized = tokenize_lines(&lines, self.tokenizer.as_ref(), self.policy)?;
        let mut tokens = tokenized.tokens;
        attach_following(&mut tokens);
        skipped.extend(tokenized.skipped);

        let analysis = Analysis {
            lines,
            tokens,
            skipped,
        };
        log::debug!(
            "analysis: {} lines, {} tokens, {} chapters, {} skipped",
            analysis.lines.len(),
            analysis.tokens.len(),
            analysis.chapter_count(),
            analysis.skipped.len()
        );
        Ok(analysis)
    }
}

/// The output of a [`Pipeline`] run.
#[derive(Debug, Default)]
pub struct Analysis {
    /// Annotated lines in source order.
    pub lines: Vec<AnnotatedLine>,
    /// The token stream, with `following` attached.
    pub tokens: Vec<Token>,
    /// Lines skipped under [`ErrorPolicy::SkipLine`], in source order per stage.
    pub skipped: Vec<Error>,
}

impl Analysis {
    /// Run a frequency query over the tokens.
    ///
    /// # Errors
    ///
    /// As for [`FrequencyQuery::run`].
    pub fn query(&self, query: &FrequencyQuery) -> Result<Vec<FrequencyRecord>> {
        query.run(&self.tokens)
    }

    /// Number of chapters, counting front matter as chapter 0.
    pub fn chapter_count(&self) -> usize {
        self.lines.last().map_or(0, |line| line.chapter_index + 1)
    }

    /// Number of paragraphs.
    pub fn paragraph_count(&self) -> usize {
        self.lines.last().map_or(0, |line| line.paragraph_index + 1)
    }
}
