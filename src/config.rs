//! Pipeline configuration.
//!
//! `defaults/folio.default.toml` is embedded into the crate so the documented
//! defaults and the runtime defaults cannot drift. Callers layer their own
//! TOML files and single-key overrides on top with [`ConfigLoader`], then
//! turn the result into a [`Pipeline`] with [`PipelineConfig::build`], which
//! validates everything before any input is read.

use std::path::Path;

use ::config::builder::DefaultState;
use ::config::{Config, ConfigBuilder, File, FileFormat, ValueKind};
use serde::Deserialize;

use crate::{
    Annotator, ChapterRules, ContractionRule, Error, ErrorPolicy, HyphenRule, LineLoader,
    NgramTokenizer, PatternRule, Pipeline, PrefixRule, Result, SentenceTokenizer, TextEncoding,
    Tokenizer, TokenizerOptions, WordTokenizer,
};

const DEFAULT_TOML: &str = include_str!("../defaults/folio.default.toml");

/// Top-level configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PipelineConfig {
    /// How the input is read.
    pub input: InputConfig,
    /// Chapter boundary rules.
    pub chapters: ChapterConfig,
    /// Tokenization rule.
    pub tokenizer: TokenizerConfig,
}

/// How the input is read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct InputConfig {
    /// Declared encoding.
    pub encoding: TextEncoding,
    /// What to do with lines that cannot be decoded or tokenized.
    pub on_error: ErrorPolicy,
}

/// Chapter boundary rules, ORed together.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct ChapterConfig {
    /// Literal prefixes.
    pub prefixes: Vec<String>,
    /// Whether prefixes match case-sensitively.
    pub case_sensitive: bool,
    /// Regular expressions.
    pub patterns: Vec<String>,
}

/// Unit of tokenization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// [`WordTokenizer`].
    Words,
    /// [`SentenceTokenizer`].
    Sentences,
    /// [`NgramTokenizer`] with `ngram-size`.
    Ngrams,
}

/// Tokenization rule.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct TokenizerConfig {
    /// Unit of tokenization.
    pub granularity: Granularity,
    /// `n` for n-grams.
    pub ngram_size: usize,
    /// Lowercase tokens.
    pub case_folding: bool,
    /// Hyphen handling.
    pub hyphens: HyphenRule,
    /// Apostrophe handling.
    pub contractions: ContractionRule,
}

impl ChapterConfig {
    fn rules(&self) -> Result<ChapterRules> {
        let mut rules = ChapterRules::none();
        for prefix in &self.prefixes {
            if prefix.trim().is_empty() {
                return Err(Error::config("chapter prefixes must not be empty"));
            }
            let rule = if self.case_sensitive {
                PrefixRule::new(prefix.as_str())
            } else {
                PrefixRule::case_insensitive(prefix.as_str())
            };
            rules.push(Box::new(rule));
        }
        for pattern in &self.patterns {
            rules.push(Box::new(PatternRule::new(pattern)?));
        }
        Ok(rules)
    }
}

impl TokenizerConfig {
    fn tokenizer(&self) -> Result<Box<dyn Tokenizer>> {
        let options = TokenizerOptions {
            case_folding: self.case_folding,
            hyphens: self.hyphens,
            contractions: self.contractions,
        };
        Ok(match self.granularity {
            Granularity::Words => Box::new(WordTokenizer::new(options)),
            Granularity::Sentences => Box::new(SentenceTokenizer::new(options)),
            Granularity::Ngrams => Box::new(NgramTokenizer::new(self.ngram_size, options)?),
        })
    }
}

impl PipelineConfig {
    /// Validate the configuration and assemble a pipeline.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] for an empty prefix, a pattern that does not
    /// compile, or an n-gram size of zero.
    pub fn build(&self) -> Result<Pipeline> {
        let loader = LineLoader::new(self.input.encoding);
        let annotator = Annotator::new(self.chapters.rules()?);
        let tokenizer = self.tokenizer.tokenizer()?;
        log::debug!(
            "pipeline: {} input, {} chapter rules, {:?} tokens",
            self.input.encoding,
            annotator.chapter_rules().len(),
            self.tokenizer.granularity
        );
        Ok(Pipeline::from_parts(
            loader,
            annotator,
            tokenizer,
            self.input.on_error,
        ))
    }
}

/// Layers user configuration over the built-in defaults.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    builder: ConfigBuilder<DefaultState>,
}

impl ConfigLoader {
    /// Start from the embedded defaults.
    pub fn new() -> Self {
        let builder = Config::builder().add_source(File::from_str(DEFAULT_TOML, FileFormat::Toml));
        Self { builder }
    }

    /// Layer a TOML file. A missing file is an error at [`build`](Self::build).
    #[must_use]
    pub fn with_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(true);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer a TOML file if it exists.
    #[must_use]
    pub fn with_optional_file(mut self, path: impl AsRef<Path>) -> Self {
        let source = File::from(path.as_ref())
            .format(FileFormat::Toml)
            .required(false);
        self.builder = self.builder.add_source(source);
        self
    }

    /// Layer TOML text.
    #[must_use]
    pub fn with_toml(mut self, toml: &str) -> Self {
        self.builder = self.builder.add_source(File::from_str(toml, FileFormat::Toml));
        self
    }

    /// Override a single key, e.g. `tokenizer.granularity`.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if the key is malformed.
    pub fn set_override<I>(mut self, key: &str, value: I) -> Result<Self>
    where
        I: Into<ValueKind>,
    {
        self.builder = self.builder.set_override(key, value)?;
        Ok(self)
    }

    /// Merge every layer and deserialize.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] if a file is missing or unreadable, or a value
    /// has the wrong type or an unknown variant.
    pub fn build(self) -> Result<PipelineConfig> {
        Ok(self.builder.build()?.try_deserialize()?)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// The built-in defaults.
///
/// # Errors
///
/// Only if the embedded defaults are broken.
pub fn load_defaults() -> Result<PipelineConfig> {
    ConfigLoader::new().build()
}
