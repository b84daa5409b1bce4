//! Error types for folio.

use crate::loader::TextEncoding;

/// Errors that can occur while loading, annotating, tokenizing or counting.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input could not be opened or read.
    #[error("resource unavailable: {resource}: {source}")]
    ResourceUnavailable {
        /// Path or description of the resource.
        resource: String,
        /// The underlying I/O failure.
        #[source]
        source: std::io::Error,
    },

    /// A line's bytes are not valid under the declared encoding.
    #[error("line {line}: bytes are not valid {encoding}")]
    Decoding {
        /// Zero-based physical line number.
        line: usize,
        /// The encoding the caller declared.
        encoding: TextEncoding,
    },

    /// A line could not be tokenized.
    #[error("line {line}: cannot tokenize: {reason}")]
    Tokenization {
        /// Zero-based physical line number.
        line: usize,
        /// What was wrong with the line.
        reason: String,
    },

    /// Invalid configuration, detected before any processing.
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// A percentage was requested over a group with no tokens.
    #[error("percentage undefined for {unit}: group has no tokens")]
    DivisionUndefined {
        /// The offending group.
        unit: String,
    },
}

impl Error {
    /// The physical line an error points at, if any.
    #[must_use]
    pub fn line(&self) -> Option<usize> {
        match self {
            Self::Decoding { line, .. } | Self::Tokenization { line, .. } => Some(*line),
            _ => None,
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

impl From<::config::ConfigError> for Error {
    fn from(err: ::config::ConfigError) -> Self {
        Self::Configuration(err.to_string())
    }
}

/// Result type for folio operations.
pub type Result<T> = std::result::Result<T, Error>;

/// What to do when a single line cannot be decoded or tokenized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorPolicy {
    /// Abort the whole run on the first bad line.
    #[default]
    FailFast,
    /// Drop the line, log it and keep going.
    SkipLine,
}
