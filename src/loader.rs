//! Line loading.
//!
//! Reads a text resource into [`Line`] records, one per physical line, in
//! source order. Nothing is merged and nothing is dropped unless the caller
//! asked for [`ErrorPolicy::SkipLine`] and the line cannot be decoded.
//!
//! ## Line Splitting
//!
//! ```text
//! bytes:  "CHAPTER I\r\nCook and Aorangi.\n\nMount Cook is big.\n"
//!
//! line 0: "CHAPTER I"            <- trailing \r stripped
//! line 1: "Cook and Aorangi."
//! line 2: ""
//! line 3: "Mount Cook is big."   <- final newline does not open a line 4
//! ```
//!
//! A UTF-8 byte order mark at the very start is dropped.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::Deserialize;

use crate::{Error, ErrorPolicy, Line, Result};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// The character encoding the caller declares for the input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextEncoding {
    /// Strict UTF-8. Invalid sequences are decoding errors.
    #[default]
    #[serde(rename = "utf-8", alias = "utf8")]
    Utf8,
    /// ISO-8859-1. Every byte maps to the code point of the same value.
    #[serde(rename = "latin-1", alias = "latin1", alias = "iso-8859-1")]
    Latin1,
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => f.write_str("UTF-8"),
            Self::Latin1 => f.write_str("Latin-1"),
        }
    }
}

impl std::str::FromStr for TextEncoding {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "utf-8" | "utf8" => Ok(Self::Utf8),
            "latin-1" | "latin1" | "iso-8859-1" => Ok(Self::Latin1),
            other => Err(Error::config(format!("unknown encoding: {other}"))),
        }
    }
}

/// Lines read from a resource, plus the lines that were skipped.
#[derive(Debug, Default)]
pub struct Loaded {
    /// Decoded lines in source order.
    pub lines: Vec<Line>,
    /// One error per skipped line. Always empty under [`ErrorPolicy::FailFast`].
    pub skipped: Vec<Error>,
}

/// Reads text resources into lines.
///
/// ```rust
/// use folio::LineLoader;
///
/// let loaded = LineLoader::default()
///     .load_bytes("CHAPTER I\nCook and Aorangi.\n".as_bytes())
///     .unwrap();
/// assert_eq!(loaded.lines.len(), 2);
/// assert_eq!(loaded.lines[1].raw_text, "Cook and Aorangi.");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct LineLoader {
    encoding: TextEncoding,
    policy: ErrorPolicy,
}

impl LineLoader {
    /// Create a loader for the given encoding that fails on the first bad line.
    #[must_use]
    pub const fn new(encoding: TextEncoding) -> Self {
        Self {
            encoding,
            policy: ErrorPolicy::FailFast,
        }
    }

    /// Set what happens to undecodable lines.
    #[must_use]
    pub const fn with_policy(mut self, policy: ErrorPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// The declared encoding.
    #[must_use]
    pub const fn encoding(&self) -> TextEncoding {
        self.encoding
    }

    /// Load a file.
    ///
    /// # Errors
    ///
    /// [`Error::ResourceUnavailable`] if the file cannot be opened or read,
    /// [`Error::Decoding`] for a bad line under [`ErrorPolicy::FailFast`].
    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<Loaded> {
        let path = path.as_ref();
        let resource = path.display().to_string();
        let file = File::open(path).map_err(|source| Error::ResourceUnavailable {
            resource: resource.clone(),
            source,
        })?;
        self.load_reader(BufReader::new(file), &resource)
    }

    /// Load an in-memory byte buffer.
    ///
    /// # Errors
    ///
    /// [`Error::Decoding`] for a bad line under [`ErrorPolicy::FailFast`].
    pub fn load_bytes(&self, bytes: &[u8]) -> Result<Loaded> {
        self.load_reader(bytes, "<memory>")
    }

    /// Load from any buffered reader. `resource` names the source in errors.
    ///
    /// # Errors
    ///
    /// [`Error::ResourceUnavailable`] if reading fails part way,
    /// [`Error::Decoding`] for a bad line under [`ErrorPolicy::FailFast`].
    pub fn load_reader<R: BufRead>(&self, mut reader: R, resource: &str) -> Result<Loaded> {
        let mut loaded = Loaded::default();
        let mut buf = Vec::new();
        let mut line_index = 0;

        loop {
            buf.clear();
            let read = reader
                .read_until(b'\n', &mut buf)
                .map_err(|source| Error::ResourceUnavailable {
                    resource: resource.to_string(),
                    source,
                })?;
            if read == 0 {
                break;
            }

            let mut bytes = buf.as_slice();
            if let Some(rest) = bytes.strip_suffix(b"\n") {
                bytes = rest;
            }
            if let Some(rest) = bytes.strip_suffix(b"\r") {
                bytes = rest;
            }
            if line_index == 0 && self.encoding == TextEncoding::Utf8 {
                bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
            }

            match self.decode(bytes, line_index) {
                Ok(text) => loaded.lines.push(Line::new(text, line_index)),
                Err(err) if self.policy == ErrorPolicy::SkipLine => {
                    log::warn!("{resource}: skipping {err}");
                    loaded.skipped.push(err);
                }
                Err(err) => return Err(err),
            }
            line_index += 1;
        }

        log::debug!(
            "{resource}: loaded {} lines ({} skipped)",
            loaded.lines.len(),
            loaded.skipped.len()
        );
        Ok(loaded)
    }

    fn decode(&self, bytes: &[u8], line: usize) -> Result<String> {
        match self.encoding {
            TextEncoding::Utf8 => std::str::from_utf8(bytes)
                .map(str::to_string)
                .map_err(|_| Error::Decoding {
                    line,
                    encoding: self.encoding,
                }),
            TextEncoding::Latin1 => Ok(bytes.iter().map(|&b| char::from(b)).collect()),
        }
    }
}

/// Split an already-decoded string into lines, using the same rules as
/// [`LineLoader`].
///
/// ```rust
/// let lines = folio::lines_from_str("a\r\n\nb");
/// assert_eq!(lines.len(), 3);
/// assert!(lines[1].is_blank());
/// ```
#[must_use]
pub fn lines_from_str(text: &str) -> Vec<Line> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.is_empty() {
        return Vec::new();
    }
    text.strip_suffix('\n')
        .unwrap_or(text)
        .split('\n')
        .enumerate()
        .map(|(index, raw)| Line::new(raw.strip_suffix('\r').unwrap_or(raw), index))
        .collect()
}
