use std::collections::BTreeSet;
use std::collections::HashMap;

use tower_lsp::lsp_types::{
    CompletionItem, CompletionItemKind, Diagnostic, DiagnosticSeverity, FormattingOptions, Hover,
    HoverContents, Location, MarkedString, Position, Range, TextEdit, WorkspaceEdit,
};

use crate::analysis::{AnalysisEngine, AnalysisError};
use crate::cancel::CancelFlag;
use crate::store::Snapshot;

/// Identifier-based engine: treats every identifier-like word in the
/// snapshot as a symbol. It exists to make the shipped binary a working
/// server and to exercise the engine boundary; a real host plugs its own
/// semantic engine in behind the same trait.
#[derive(Debug, Default)]
pub struct WordEngine;

impl WordEngine {
    pub fn new() -> Self {
        Self
    }
}

impl AnalysisEngine for WordEngine {
    /// Flags trailing whitespace, line by line. Deliberately shallow; the
    /// interesting part is that it reads only the snapshot and polls the
    /// flag between lines.
    fn diagnostics(
        &self,
        snapshot: &Snapshot,
        cancel: &CancelFlag,
    ) -> Result<Vec<Diagnostic>, AnalysisError> {
        let mut diagnostics = Vec::new();

        for line_idx in 0..snapshot.len_lines() {
            cancel.checkpoint()?;

            let Some(line) = snapshot.line(line_idx) else {
                continue;
            };
            let content = line.trim_end_matches('\n');
            let trimmed = content.trim_end();
            if trimmed.len() == content.len() {
                continue;
            }

            let start = trimmed.chars().count() as u32;
            let end = content.chars().count() as u32;
            diagnostics.push(Diagnostic {
                range: Range {
                    start: Position::new(line_idx as u32, start),
                    end: Position::new(line_idx as u32, end),
                },
                severity: Some(DiagnosticSeverity::WARNING),
                message: "Trailing whitespace".to_string(),
                ..Default::default()
            });
        }

        Ok(diagnostics)
    }

    fn completions(
        &self,
        snapshot: &Snapshot,
        _position: Position,
        cancel: &CancelFlag,
    ) -> Result<Vec<CompletionItem>, AnalysisError> {
        let mut words = BTreeSet::new();

        for line_idx in 0..snapshot.len_lines() {
            cancel.checkpoint()?;

            let Some(line) = snapshot.line(line_idx) else {
                continue;
            };
            for (word, _) in words_in_line(&line, line_idx as u32) {
                words.insert(word);
            }
        }

        Ok(words
            .into_iter()
            .map(|label| CompletionItem {
                label,
                kind: Some(CompletionItemKind::TEXT),
                ..Default::default()
            })
            .collect())
    }

    fn hover(
        &self,
        snapshot: &Snapshot,
        position: Position,
        cancel: &CancelFlag,
    ) -> Result<Option<Hover>, AnalysisError> {
        let Some((word, range)) = snapshot.word_at(position) else {
            return Ok(None);
        };

        let occurrences = word_occurrences(snapshot, &word, cancel)?;
        Ok(Some(Hover {
            contents: HoverContents::Scalar(MarkedString::String(format!(
                "`{}`: {} occurrence(s)",
                word,
                occurrences.len()
            ))),
            range: Some(range),
        }))
    }

    /// First occurrence of the word stands in for its definition.
    fn definition(
        &self,
        snapshot: &Snapshot,
        position: Position,
        cancel: &CancelFlag,
    ) -> Result<Vec<Location>, AnalysisError> {
        let Some((word, _)) = snapshot.word_at(position) else {
            return Ok(Vec::new());
        };

        Ok(word_occurrences(snapshot, &word, cancel)?
            .into_iter()
            .take(1)
            .map(|range| Location {
                uri: snapshot.uri().clone(),
                range,
            })
            .collect())
    }

    fn rename(
        &self,
        snapshot: &Snapshot,
        position: Position,
        new_name: &str,
        cancel: &CancelFlag,
    ) -> Result<Option<WorkspaceEdit>, AnalysisError> {
        let Some((word, _)) = snapshot.word_at(position) else {
            return Ok(None);
        };

        let edits: Vec<TextEdit> = word_occurrences(snapshot, &word, cancel)?
            .into_iter()
            .map(|range| TextEdit {
                range,
                new_text: new_name.to_string(),
            })
            .collect();

        if edits.is_empty() {
            return Ok(None);
        }

        let changes = HashMap::from([(snapshot.uri().clone(), edits)]);
        Ok(Some(WorkspaceEdit {
            changes: Some(changes),
            ..Default::default()
        }))
    }

    fn formatting(
        &self,
        snapshot: &Snapshot,
        options: &FormattingOptions,
        cancel: &CancelFlag,
    ) -> Result<Vec<TextEdit>, AnalysisError> {
        let mut edits = Vec::new();

        for line_idx in 0..snapshot.len_lines() {
            cancel.checkpoint()?;

            let Some(line) = snapshot.line(line_idx) else {
                continue;
            };
            let content = line.trim_end_matches('\n');
            let trimmed = content.trim_end();
            if trimmed.len() == content.len() {
                continue;
            }

            edits.push(TextEdit {
                range: Range {
                    start: Position::new(line_idx as u32, trimmed.chars().count() as u32),
                    end: Position::new(line_idx as u32, content.chars().count() as u32),
                },
                new_text: String::new(),
            });
        }

        if options.insert_final_newline == Some(true) && !snapshot.text().ends_with('\n') {
            let end = snapshot.char_to_position(snapshot.len_chars());
            edits.push(TextEdit {
                range: Range { start: end, end },
                new_text: "\n".to_string(),
            });
        }

        Ok(edits)
    }
}

/// Every occurrence of `word` in the snapshot, in document order.
fn word_occurrences(
    snapshot: &Snapshot,
    word: &str,
    cancel: &CancelFlag,
) -> Result<Vec<Range>, AnalysisError> {
    let mut ranges = Vec::new();

    for line_idx in 0..snapshot.len_lines() {
        cancel.checkpoint()?;

        let Some(line) = snapshot.line(line_idx) else {
            continue;
        };
        for (candidate, range) in words_in_line(&line, line_idx as u32) {
            if candidate == word {
                ranges.push(range);
            }
        }
    }

    Ok(ranges)
}

/// Identifier-like words in one line, with their character ranges.
fn words_in_line(line: &str, line_idx: u32) -> Vec<(String, Range)> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut start = 0u32;

    for (col, c) in line.chars().enumerate() {
        if c.is_alphanumeric() || c == '_' {
            if current.is_empty() {
                start = col as u32;
            }
            current.push(c);
        } else if !current.is_empty() {
            words.push((
                std::mem::take(&mut current),
                Range {
                    start: Position::new(line_idx, start),
                    end: Position::new(line_idx, col as u32),
                },
            ));
        }
    }

    if !current.is_empty() {
        let end = line.chars().count() as u32;
        words.push((
            current,
            Range {
                start: Position::new(line_idx, start),
                end: Position::new(line_idx, end),
            },
        ));
    }

    words
}

#[cfg(test)]
mod tests {
    use super::*;
    use ropey::Rope;
    use tower_lsp::lsp_types::Url;

    fn snapshot(text: &str) -> Snapshot {
        Snapshot::new(
            Url::parse("file:///test.py").unwrap(),
            Rope::from_str(text),
            0,
            "python",
        )
    }

    fn flag() -> CancelFlag {
        CancelFlag::default()
    }

    #[test]
    fn completions_are_distinct_sorted_words() {
        let engine = WordEngine::new();
        let snap = snapshot("beta alpha\nbeta gamma");

        let items = engine
            .completions(&snap, Position::new(0, 0), &flag())
            .unwrap();
        let labels: Vec<_> = items.iter().map(|i| i.label.as_str()).collect();
        assert_eq!(labels, vec!["alpha", "beta", "gamma"]);
    }

    #[test]
    fn hover_reports_occurrences() {
        let engine = WordEngine::new();
        let snap = snapshot("foo bar\nfoo baz");

        let hover = engine.hover(&snap, Position::new(0, 1), &flag()).unwrap();
        let Some(Hover {
            contents: HoverContents::Scalar(MarkedString::String(text)),
            ..
        }) = hover
        else {
            panic!("expected scalar hover");
        };
        assert_eq!(text, "`foo`: 2 occurrence(s)");
    }

    #[test]
    fn definition_is_first_occurrence() {
        let engine = WordEngine::new();
        let snap = snapshot("one two\ntwo three");

        let locations = engine
            .definition(&snap, Position::new(1, 1), &flag())
            .unwrap();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].range.start, Position::new(0, 4));
    }

    #[test]
    fn rename_touches_every_occurrence() {
        let engine = WordEngine::new();
        let snap = snapshot("x = x + x");

        let edit = engine
            .rename(&snap, Position::new(0, 0), "y", &flag())
            .unwrap()
            .unwrap();
        let changes = edit.changes.unwrap();
        let edits = &changes[snap.uri()];
        assert_eq!(edits.len(), 3);
        assert!(edits.iter().all(|e| e.new_text == "y"));
    }

    #[test]
    fn formatting_trims_trailing_whitespace() {
        let engine = WordEngine::new();
        let snap = snapshot("clean\ndirty   \n");

        let edits = engine
            .formatting(&snap, &FormattingOptions::default(), &flag())
            .unwrap();
        assert_eq!(edits.len(), 1);
        assert_eq!(edits[0].range.start, Position::new(1, 5));
        assert_eq!(edits[0].range.end, Position::new(1, 8));
        assert_eq!(edits[0].new_text, "");
    }

    #[test]
    fn diagnostics_flag_trailing_whitespace() {
        let engine = WordEngine::new();
        let snap = snapshot("ok\nbad  ");

        let diags = engine.diagnostics(&snap, &flag()).unwrap();
        assert_eq!(diags.len(), 1);
        assert_eq!(diags[0].severity, Some(DiagnosticSeverity::WARNING));
        assert_eq!(diags[0].range.start, Position::new(1, 3));
    }

    #[test]
    fn cancelled_flag_stops_the_engine() {
        let engine = WordEngine::new();
        let snap = snapshot("a b c");

        let registry = crate::cancel::CancelRegistry::new();
        let (id, flag) = registry.register();
        registry.cancel(id);

        let err = engine.completions(&snap, Position::new(0, 0), &flag);
        assert!(matches!(err, Err(AnalysisError::Cancelled(_))));
    }
}
