use ropey::Rope;
use tower_lsp::lsp_types::{Position, TextDocumentContentChangeEvent, Url};

use crate::store::snapshot::Snapshot;

/// One open document: rope text, language id and the version last
/// acknowledged by the client. Mutated only through the store, behind the
/// per-entry lock.
#[derive(Debug)]
pub struct Document {
    rope: Rope,
    version: i32,
    language_id: String,
}

impl Document {
    pub fn new(text: &str, language_id: &str, version: i32) -> Self {
        Self {
            rope: Rope::from_str(&normalize_line_endings(text)),
            version,
            language_id: language_id.to_string(),
        }
    }

    pub fn version(&self) -> i32 {
        self.version
    }

    pub fn text(&self) -> String {
        self.rope.to_string()
    }

    /// Apply a single content change and bump the version.
    ///
    /// A change without a range is a full-text replacement; otherwise the
    /// range is resolved to character offsets and spliced. Positions past
    /// the end of the text are clamped, matching how the host editor treats
    /// out-of-bounds edits.
    pub fn apply_change(&mut self, change: &TextDocumentContentChangeEvent) {
        let text = normalize_line_endings(&change.text);

        match change.range {
            None => {
                self.rope = Rope::from_str(&text);
            }
            Some(range) => {
                let start = position_to_char(&self.rope, range.start);
                let end = position_to_char(&self.rope, range.end).max(start);

                if start < end {
                    self.rope.remove(start..end);
                }
                self.rope.insert(start, &text);
            }
        }

        self.version += 1;
    }

    /// Produce an immutable view of the current state. The caller must hold
    /// the store's entry guard so text and version come from the same state.
    pub fn snapshot(&self, uri: &Url) -> Snapshot {
        Snapshot::new(
            uri.clone(),
            self.rope.clone(),
            self.version,
            &self.language_id,
        )
    }
}

/// Convert an LSP position to a character index into the rope, clamping
/// lines and columns that run past the end of the text.
pub(crate) fn position_to_char(rope: &Rope, pos: Position) -> usize {
    let line_idx = (pos.line as usize).min(rope.len_lines().saturating_sub(1));
    let line_start = rope.line_to_char(line_idx);
    let line_len = rope.line(line_idx).len_chars();

    line_start + (pos.character as usize).min(line_len)
}

/// Convert a character index back to an LSP position.
pub(crate) fn char_to_position(rope: &Rope, char_idx: usize) -> Position {
    let char_idx = char_idx.min(rope.len_chars());
    let line = rope.char_to_line(char_idx);
    let line_start = rope.line_to_char(line);

    Position {
        line: line as u32,
        character: (char_idx - line_start) as u32,
    }
}

/// The host model stores LF only; clients on Windows may send CRLF.
fn normalize_line_endings(text: &str) -> String {
    text.replace("\r\n", "\n")
}
