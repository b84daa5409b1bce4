//! Following-word annotation.
//!
//! Within each paragraph, every token learns the text of the token after it.
//! The last token of a paragraph has no follower: adjacency never crosses a
//! paragraph boundary, even between neighbouring paragraphs.
//!
//! ```text
//! paragraph 0:  cook -> and -> aorangi -> (none)
//! paragraph 1:  mount -> cook -> is -> big -> (none)
//!                                         ^ not "mount"
//! ```

use rustc_hash::FxHashMap;

use crate::Token;

/// Set `following` on every token, per paragraph.
///
/// Tokens of one paragraph need not be contiguous; order within a paragraph
/// is the slice order. Only `following` is written. Runs in linear time.
///
/// ```rust
/// use folio::{attach_following, lines_from_str, tokenize_lines, Annotator, ErrorPolicy, WordTokenizer};
///
/// let lines = Annotator::default().annotate(lines_from_str("a b\n\nc"));
/// let mut tokens = tokenize_lines(&lines, &WordTokenizer::default(), ErrorPolicy::FailFast)
///     .unwrap()
///     .tokens;
/// attach_following(&mut tokens);
///
/// assert_eq!(tokens[0].following.as_deref(), Some("b"));
/// assert_eq!(tokens[1].following, None);
/// assert_eq!(tokens[2].following, None);
/// ```
pub fn attach_following(tokens: &mut [Token]) {
    // Walking backwards, the map holds the nearest later token of each paragraph.
    let mut next_in_paragraph: FxHashMap<usize, String> = FxHashMap::default();

    for token in tokens.iter_mut().rev() {
        token.following = next_in_paragraph.insert(token.paragraph_index, token.text.clone());
    }
}
