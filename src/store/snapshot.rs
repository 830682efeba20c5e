use std::sync::Arc;

use ropey::Rope;
use tower_lsp::lsp_types::{Position, Range, Url};

use crate::store::document::{char_to_position, position_to_char};

/// An immutable (text, version) view of one document at a point in time.
///
/// Cloning is cheap: the rope shares its chunks, so any number of snapshots
/// of the same document may coexist while requests are in flight. A snapshot
/// never changes after creation; staleness checks compare its version with
/// the store's current one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    uri: Url,
    rope: Rope,
    version: i32,
    language_id: Arc<str>,
}

impl Snapshot {
    pub(crate) fn new(uri: Url, rope: Rope, version: i32, language_id: &str) -> Self {
        Self {
            uri,
            rope,
            version,
            language_id: Arc::from(language_id),
        }
    }

    pub fn uri(&self) -> &Url {
        &self.uri
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn language_id(&self) -> &str {
        &self.language_id
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    pub fn len_chars(&self) -> usize {
        self.rope.len_chars()
    }

    pub fn len_lines(&self) -> usize {
        self.rope.len_lines()
    }

    pub fn line(&self, idx: usize) -> Option<String> {
        (idx < self.rope.len_lines()).then(|| self.rope.line(idx).to_string())
    }

    pub fn position_to_char(&self, pos: Position) -> usize {
        position_to_char(&self.rope, pos)
    }

    pub fn char_to_position(&self, char_idx: usize) -> Position {
        char_to_position(&self.rope, char_idx)
    }

    /// The identifier-like word under the cursor, with its range.
    pub fn word_at(&self, pos: Position) -> Option<(String, Range)> {
        let offset = self.position_to_char(pos);

        let mut start = offset;
        while start > 0 && is_word_char(self.rope.char(start - 1)) {
            start -= 1;
        }

        let mut end = offset;
        while end < self.rope.len_chars() && is_word_char(self.rope.char(end)) {
            end += 1;
        }

        if start == end {
            return None;
        }

        let word = self.rope.slice(start..end).to_string();
        let range = Range {
            start: self.char_to_position(start),
            end: self.char_to_position(end),
        };

        Some((word, range))
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}
