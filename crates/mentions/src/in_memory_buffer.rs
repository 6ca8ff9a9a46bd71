// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::MentionAttribute;

use crate::{MentionSpan, TextBuffer, TextRange, UnicodeString};

/// A self-contained attributed buffer implementing [`TextBuffer`].
///
/// Hosts embedding a native editor implement [`TextBuffer`] over it; this
/// type backs the test suite and headless integrations.
#[derive(Clone, Debug, Default)]
pub struct InMemoryBuffer<S: UnicodeString> {
    text: S,
    runs: Vec<MentionSpan>,
    selection: TextRange,
}

impl<S: UnicodeString> InMemoryBuffer<S> {
    pub fn new() -> Self {
        Self {
            text: S::default(),
            runs: Vec::new(),
            selection: TextRange::caret(0),
        }
    }

    /// A buffer holding `text` with the caret at the end.
    pub fn from_text(text: S) -> Self {
        let caret = text.len();
        Self {
            text,
            runs: Vec::new(),
            selection: TextRange::caret(caret),
        }
    }

    fn clamp(&self, range: TextRange) -> TextRange {
        let len = self.text.len();
        let start = range.start.min(len);
        TextRange::new(start, range.len.min(len - start))
    }

    /// Shift and drop runs so they stay consistent with a replacement of
    /// `range` by `new_len` code units. Runs the edit cuts into, covers, or
    /// splits are dropped; insertion at a run boundary never extends it.
    fn adjust_runs(&mut self, range: TextRange, new_len: usize) {
        let removed = range.len;
        self.runs.retain_mut(|span| {
            if span.range.end() <= range.start {
                // Entirely before the edit.
                true
            } else if span.range.start >= range.end() {
                span.range.start = span.range.start - removed + new_len;
                true
            } else if range.is_empty() && range.start > span.range.start {
                // Insertion strictly inside the run invalidates it.
                false
            } else {
                // The edit removed at least part of the run.
                false
            }
        });
    }
}

impl<S: UnicodeString> TextBuffer<S> for InMemoryBuffer<S> {
    fn text(&self) -> S {
        self.text.clone()
    }

    fn text_len(&self) -> usize {
        self.text.len()
    }

    fn substring(&self, range: TextRange) -> S {
        self.text.substring(self.clamp(range).to_range())
    }

    fn selection(&self) -> TextRange {
        self.selection
    }

    fn set_selection(&mut self, range: TextRange) {
        self.selection = self.clamp(range);
    }

    fn replace_range(&mut self, range: TextRange, replacement: &S) {
        let range = self.clamp(range);
        self.adjust_runs(range, replacement.len());
        self.text.replace_range(range.to_range(), replacement);
        self.selection = self.clamp(self.selection);
    }

    fn mention_at(&self, index: usize) -> Option<MentionSpan> {
        self.runs.iter().find(|span| span.range.contains(index)).cloned()
    }

    fn set_mention(&mut self, range: TextRange, attribute: MentionAttribute) {
        let range = self.clamp(range);
        self.runs.retain(|span| !span.range.intersects(&range));
        let insert_at = self
            .runs
            .iter()
            .position(|span| span.range.start > range.start)
            .unwrap_or(self.runs.len());
        self.runs
            .insert(insert_at, MentionSpan::new(range, attribute));
    }

    fn remove_mention(&mut self, range: TextRange) {
        self.runs.retain(|span| !span.range.intersects(&range));
    }

    fn mention_spans(&self) -> Vec<MentionSpan> {
        self.runs.clone()
    }
}
