// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! The pull API a list-backed chooser consumes, and the entry points for
//! hosts that own their chooser and data plumbing outright.

use mention_entities::{Mention, MentionAttribute};

use crate::{MentionsController, PluginState, TextBuffer, TextRange, UnicodeString};

impl<S> MentionsController<S>
where
    S: UnicodeString,
{
    /// Number of rows the chooser should display.
    pub fn number_of_model_objects(&self) -> usize {
        self.creation.results().len()
    }

    /// The entity backing a chooser row.
    pub fn model_object_for_index(&self, index: usize) -> Option<&Mention> {
        self.creation.results().get(index)
    }

    /// Whether the chooser should show a loading row: the data source
    /// supports one and the live query is still waiting for its first batch.
    pub fn should_display_loading_indicator(&self) -> bool {
        self.data_source.loading_indicator_supported
            && self.creation.is_active()
            && self.creation.awaiting_first_batch()
    }

    /// The user picked a chooser row. Commits the mention at that index.
    pub fn model_object_selected_at_index(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        index: usize,
    ) {
        let Some(entity) = self.creation.results().get(index).cloned() else {
            return;
        };
        self.commit_mention(buffer, entity);
    }

    /// Selection entry point for hosts driving a fully custom chooser.
    pub fn handle_selection_for_entity(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        entity: Mention,
    ) {
        if self.state != PluginState::CreatingMention {
            return;
        }
        self.creation.set_committed_externally();
        self.commit_mention(buffer, entity);
    }

    /// Result notification for hosts driving a fully custom chooser: the
    /// host fetched for the current key string and reports whether the
    /// result set came back empty.
    pub fn data_returned_with_empty_results(
        &mut self,
        is_empty_results: bool,
        keystring_ends_with_whitespace: bool,
    ) {
        if self.state != PluginState::CreatingMention || !is_empty_results {
            return;
        }
        if keystring_ends_with_whitespace
            || !self.config.should_continue_searching_after_empty_results
        {
            self.creation.cancel();
            self.end_creation(true);
        }
    }

    /// Replace the live query with the committed display text, attach the
    /// attribute, and leave the creation superstate.
    pub(crate) fn commit_mention(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        entity: Mention,
    ) {
        if self.state != PluginState::CreatingMention {
            return;
        }
        let range = self.creation.replacement_range(&self.config);
        let display = S::from_str(entity.display_text());

        self.ignore_stack.push();
        buffer.replace_range(range, &display);
        let run = TextRange::new(range.start, display.len());
        buffer.set_mention(run, MentionAttribute::new(entity.clone()));
        buffer.set_selection(TextRange::caret(run.end()));
        self.ignore_stack.pop();
        self.selection_change_expected = true;

        self.emit_created_mention(&entity, run.start);
        if self.config.notify_text_view_delegate_on_mention_creation {
            self.emit_text_changed_by_controller();
        }
        self.end_creation(true);
    }
}
