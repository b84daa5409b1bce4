//! Line records: raw lines as loaded and lines with structural annotations.

use serde::Serialize;

/// One physical line of the source document.
///
/// `line_index` is assigned at load and never changes. When the loader skips
/// an undecodable line the following lines keep their physical numbers, so
/// indices can have gaps but never repeat.
///
/// ```rust
/// use folio::Line;
///
/// let line = Line::new("CHAPTER I", 0);
/// assert!(!line.is_blank());
/// assert!(Line::new("   ", 1).is_blank());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Line {
    /// The line text, without its terminator.
    pub raw_text: String,
    /// Zero-based physical line number.
    pub line_index: usize,
}

impl Line {
    /// Create a new line.
    #[must_use]
    pub fn new(raw_text: impl Into<String>, line_index: usize) -> Self {
        Self {
            raw_text: raw_text.into(),
            line_index,
        }
    }

    /// Whether the line is empty after trimming whitespace.
    ///
    /// Blank lines are the paragraph separators.
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.raw_text.trim().is_empty()
    }
}

impl std::fmt::Display for Line {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:>6}  {}", self.line_index, self.raw_text)
    }
}

/// A line together with the paragraph and chapter it belongs to.
///
/// ```text
/// line  paragraph  chapter  text
///    0          0        0  CHAPTER I
///    1          0        0  Cook and Aorangi.
///    2          0        0
///    3          1        0  Mount Cook is big.
/// ```
///
/// Both indices are non-decreasing in `line_index` and are fixed once the
/// annotator has produced them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AnnotatedLine {
    /// The source line.
    #[serde(flatten)]
    pub line: Line,
    /// Number of blank lines before this one.
    pub paragraph_index: usize,
    /// Chapter this line belongs to.
    pub chapter_index: usize,
}

impl AnnotatedLine {
    /// The line text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.line.raw_text
    }

    /// The physical line number.
    #[must_use]
    pub fn line_index(&self) -> usize {
        self.line.line_index
    }
}
