// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::{MentionAttribute, MentionHighlight};
use tracing::debug;

use crate::controller::base::PendingChange;
use crate::creation_state_machine::CreationStep;
use crate::lifecycle::DeleteDecision;
use crate::start_detection::{word_after_location, MentionStart};
use crate::{
    MentionSpan, MentionsController, PluginState, SearchType, TextBuffer, TextRange,
    UnicodeString,
};

impl<S> MentionsController<S>
where
    S: UnicodeString,
{
    /// Pre-change hook. Must be called before the host applies a user edit;
    /// returning `false` means the edit must not be applied (the controller
    /// either absorbed it into a gesture or performed its own edit instead).
    pub fn should_change_text(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        range: TextRange,
        replacement: &S,
    ) -> bool {
        if self.ignore_stack.is_ignoring() {
            return true;
        }
        if !replacement.is_empty() && range.is_empty() {
            self.should_insert(buffer, range.start, replacement)
        } else if replacement.is_empty() && !range.is_empty() {
            self.should_delete(buffer, range)
        } else if !replacement.is_empty() {
            self.should_replace(buffer, range, replacement)
        } else {
            true
        }
    }

    fn should_insert(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        location: usize,
        text: &S,
    ) -> bool {
        if let Some(span) = buffer.mention_at(location) {
            if span.range.start < location {
                // Insertion strictly inside a mention bleaches the whole run
                // before the edit goes through.
                self.bleach_run(buffer, &span);
            }
        }
        let buffer_text = buffer.text();
        self.pending_change = Some(PendingChange::Insertion {
            location,
            text: text.clone(),
            previous_char: buffer_text.char_before(location),
        });
        true
    }

    fn should_delete(&mut self, buffer: &mut dyn TextBuffer<S>, range: TextRange) -> bool {
        let text = buffer.text();
        let spans: Vec<MentionSpan> = buffer
            .mention_spans()
            .into_iter()
            .filter(|span| span.range.intersects(&range))
            .collect();

        if spans.is_empty() {
            self.pending_change = Some(PendingChange::Deletion {
                range,
                deleted: text.substring(range.to_range()),
                preceding_char: text.char_before(range.start),
            });
            return true;
        }

        // A delete resolving an already selected mention trims or removes it.
        if let Some(selected) = self.lifecycle.selected_run() {
            if range == selected {
                if let Some(span) = buffer.mention_at(selected.start) {
                    if span.range == selected {
                        self.trim_or_delete(buffer, span);
                        return false;
                    }
                }
            }
        }

        // A single-character delete at a run edge advances the
        // arm/select/resolve gesture instead of editing.
        if let [span] = spans.as_slice() {
            let single_char = text
                .char_before(range.end())
                .map(|c| S::char_len(c) == range.len)
                .unwrap_or(false);
            let at_edge =
                range.end() == span.range.end() || range.start == span.range.start;
            if single_char
                && at_edge
                && span.range.covers(&range)
                && range.len < span.range.len
            {
                let span = span.clone();
                return match self.lifecycle.backspace_on_run(span.range) {
                    DeleteDecision::EnterAboutToSelect => false,
                    DeleteDecision::SelectRun => {
                        self.select_mention(buffer, &span);
                        false
                    }
                    DeleteDecision::TrimOrDelete => {
                        self.trim_or_delete(buffer, span);
                        false
                    }
                };
            }
        }

        // Any other deletion goes through: runs it swallows whole are
        // reported as deleted, runs it cuts into are bleached first.
        for span in &spans {
            if range.covers(&span.range) {
                self.pending_deleted_mentions
                    .push((span.attribute.mention().clone(), span.range.start));
            } else {
                self.bleach_run(buffer, span);
            }
        }
        self.pending_change = Some(PendingChange::Deletion {
            range,
            deleted: text.substring(range.to_range()),
            preceding_char: text.char_before(range.start),
        });
        true
    }

    fn should_replace(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        range: TextRange,
        replacement: &S,
    ) -> bool {
        let spans: Vec<MentionSpan> = buffer
            .mention_spans()
            .into_iter()
            .filter(|span| span.range.intersects(&range))
            .collect();
        for span in &spans {
            if range.covers(&span.range) {
                // Typing over a selected mention (or replacing it outright)
                // removes the attribute along with the text.
                if self.lifecycle.is_selected(span.range) {
                    self.lifecycle.reset();
                }
                self.pending_deleted_mentions
                    .push((span.attribute.mention().clone(), span.range.start));
            } else {
                self.bleach_run(buffer, span);
            }
        }
        self.pending_change = Some(PendingChange::Replacement {
            range,
            replacement: replacement.clone(),
        });
        true
    }

    /// Post-change hook. Call after an edit approved by
    /// [`Self::should_change_text`] has been applied.
    pub fn did_change_text(&mut self, buffer: &mut dyn TextBuffer<S>) {
        if self.ignore_stack.is_ignoring() {
            return;
        }
        for (mention, location) in std::mem::take(&mut self.pending_deleted_mentions) {
            self.emit_deleted_mention(&mention, location);
        }
        let Some(pending) = self.pending_change.take() else {
            return;
        };
        self.selection_change_expected = true;

        if let Some(run) = self.lifecycle.reset() {
            self.deselect_run(buffer, run);
        }

        match self.state {
            PluginState::Quiescent => self.route_to_start_detection(buffer, pending),
            PluginState::CreatingMention => self.route_to_creation(pending),
        }
        self.drain_creation();
    }

    /// Selection-change hook. Call after every selection change the host
    /// observes; edit-driven changes are recognized and ignored.
    pub fn did_change_selection(&mut self, buffer: &mut dyn TextBuffer<S>) {
        if self.ignore_stack.is_ignoring() {
            return;
        }
        if self.selection_change_expected {
            self.selection_change_expected = false;
            return;
        }
        let selection = buffer.selection();
        match self.state {
            PluginState::CreatingMention => {
                let step = if selection.is_empty() {
                    self.creation.cursor_moved(selection.start)
                } else {
                    self.creation.cancel();
                    CreationStep::Cancelled {
                        can_immediately_restart: false,
                    }
                };
                self.apply_creation_step(step);
            }
            PluginState::Quiescent => {
                let text = buffer.text();
                self.start_detection
                    .cursor_moved(text.char_before(selection.start));
                if let Some(run) = self.lifecycle.reset() {
                    self.deselect_run(buffer, run);
                }
                if self.config.resume_mentions_creation_enabled && selection.is_empty() {
                    self.try_resume(buffer, selection.start);
                }
            }
        }
    }

    /// Programmatic-update hook: the host replaced the whole text. Derived
    /// state is rebuilt from the new buffer and both machines restart from
    /// its trailing context.
    pub fn did_replace_whole_text(&mut self, buffer: &mut dyn TextBuffer<S>) {
        self.pending_change = None;
        self.pending_deleted_mentions.clear();
        self.deactivate_chooser();
        self.creation.end();
        self.lifecycle.focus_lost();
        self.transition_state(PluginState::Quiescent);

        // Drop attribute runs the new text no longer backs.
        for span in buffer.mention_spans() {
            let expected = S::from_str(span.attribute.mention().display_text());
            if span.range.end() > buffer.text_len()
                || buffer.substring(span.range) != expected
            {
                debug!(range = ?span.range, "dropping mention run invalidated by programmatic update");
                buffer.remove_mention(span.range);
            }
        }

        let text = buffer.text();
        self.start_detection
            .reset_state_using_string(&self.config, &text);
    }

    /// Drain asynchronously delivered query results. Hosts should call this
    /// from their event loop; every other entry point drains as well, so
    /// synchronous data sources need no extra pumping.
    pub fn pump(&mut self) {
        self.drain_creation();
    }

    /// The editor is about to resign focus; a selected mention is deselected
    /// without resolving the gesture.
    pub fn editor_will_lose_focus(&mut self, buffer: &mut dyn TextBuffer<S>) {
        if let Some(run) = self.lifecycle.begin_losing_focus() {
            self.deselect_run(buffer, run);
        }
    }

    pub fn editor_did_lose_focus(&mut self) {
        self.lifecycle.focus_lost();
    }

    /// Synchronously abandon the live mention attempt: the chooser is
    /// hidden, the creation machine ends and pending results become stale.
    pub fn cancel_mention_creation(&mut self) {
        if self.state != PluginState::CreatingMention {
            return;
        }
        self.creation.cancel();
        self.end_creation(false);
    }

    fn route_to_start_detection(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        pending: PendingChange<S>,
    ) {
        let start = match pending {
            PendingChange::Insertion {
                location,
                text,
                previous_char,
            } => {
                let chars = text.char_indices();
                if let [(_, c)] = chars.as_slice() {
                    let buffer_text = buffer.text();
                    let next_word =
                        word_after_location(&buffer_text, location + S::char_len(*c));
                    self.start_detection.character_typed(
                        &self.config,
                        *c,
                        location,
                        previous_char,
                        &next_word,
                    )
                } else {
                    self.start_detection.valid_string_inserted(
                        &self.config,
                        &text,
                        location,
                        previous_char,
                    )
                }
            }
            PendingChange::Deletion {
                range,
                deleted,
                preceding_char,
            } => {
                let Some(deleted_char) = deleted.to_string().chars().next_back() else {
                    return;
                };
                let buffer_text = buffer.text();
                self.start_detection.delete_typed(
                    &self.config,
                    deleted_char,
                    preceding_char,
                    range.start,
                    &buffer_text,
                )
            }
            PendingChange::Replacement { range, replacement } => {
                let buffer_text = buffer.text();
                let previous_char = buffer_text.char_before(range.start);
                self.start_detection.valid_string_inserted(
                    &self.config,
                    &replacement,
                    range.start,
                    previous_char,
                )
            }
        };
        if let Some(start) = start {
            self.begin_mentions_creation(start);
        }
    }

    fn route_to_creation(&mut self, pending: PendingChange<S>) {
        let step = match pending {
            PendingChange::Insertion { text, .. } => {
                let chars = text.char_indices();
                if let [(_, c)] = chars.as_slice() {
                    self.creation
                        .character_typed(*c, &self.config, &mut self.data_source)
                } else {
                    self.creation.valid_string_inserted(
                        &text,
                        &self.config,
                        &mut self.data_source,
                    )
                }
            }
            PendingChange::Deletion { range, deleted, .. } => {
                let removed_anchor = range.start <= self.creation.anchor_location();
                self.creation.string_deleted(
                    &deleted,
                    removed_anchor,
                    &self.config,
                    &mut self.data_source,
                )
            }
            PendingChange::Replacement { .. } => {
                // A replacement rewrites the live query wholesale; give up
                // and let start detection look at the result.
                self.creation.cancel();
                CreationStep::Cancelled {
                    can_immediately_restart: false,
                }
            }
        };
        self.apply_creation_step(step);
    }

    pub(crate) fn begin_mentions_creation(&mut self, start: MentionStart<S>) {
        let search_type = if start.control_character.is_some() {
            SearchType::Explicit
        } else {
            SearchType::Implicit
        };
        self.start_creation(
            start.prefix,
            start.control_character,
            start.location,
            search_type,
        );
    }

    pub(crate) fn start_creation(
        &mut self,
        prefix: S,
        control_character: Option<char>,
        location: usize,
        search_type: SearchType,
    ) {
        self.creation.mention_creation_started(
            prefix,
            control_character,
            location,
            search_type,
            &self.config,
            &mut self.data_source,
        );
        self.transition_state(PluginState::CreatingMention);
        if self.data_source.loading_indicator_supported {
            // Show the chooser in its loading state right away.
            self.refresh_chooser();
        }
        self.drain_creation();
    }

    pub(crate) fn drain_creation(&mut self) {
        if !self.creation.is_active() {
            return;
        }
        let steps = self.creation.drain(&self.config, &mut self.data_source);
        for step in steps {
            self.apply_creation_step(step);
        }
    }

    pub(crate) fn apply_creation_step(&mut self, step: CreationStep) {
        match step {
            CreationStep::Continue => {}
            CreationStep::ResultsUpdated | CreationStep::EmptyResults => {
                self.refresh_chooser();
            }
            CreationStep::Cancelled {
                can_immediately_restart,
            } => self.end_creation(can_immediately_restart),
        }
    }

    pub(crate) fn end_creation(&mut self, can_immediately_restart: bool) {
        self.deactivate_chooser();
        self.creation.end();
        self.start_detection
            .mention_creation_ended(can_immediately_restart);
        self.transition_state(PluginState::Quiescent);
    }

    /// Select and highlight a committed mention (the second step of the
    /// backspace gesture).
    fn select_mention(&mut self, buffer: &mut dyn TextBuffer<S>, span: &MentionSpan) {
        buffer.set_mention(
            span.range,
            span.attribute.with_highlight(MentionHighlight::Highlighted),
        );
        buffer.set_selection(span.range);
        self.selection_change_expected = true;
    }

    /// Resolve a selected mention: replace it with its trimmed form when the
    /// entity supports one, delete it otherwise.
    pub(crate) fn trim_or_delete(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        span: MentionSpan,
    ) {
        let mention = span.attribute.mention().clone();
        let trimmed = self
            .data_source
            .trimmed_text(&mention)
            .filter(|trimmed| trimmed != mention.display_text());

        match trimmed {
            Some(trimmed) => {
                let display = S::from_str(&trimmed);
                let trimmed_mention = mention.with_display_text(trimmed);
                self.ignore_stack.push();
                buffer.replace_range(span.range, &display);
                let run = TextRange::new(span.range.start, display.len());
                buffer.set_mention(run, MentionAttribute::new(trimmed_mention.clone()));
                buffer.set_selection(TextRange::caret(run.end()));
                self.ignore_stack.pop();
                self.selection_change_expected = true;
                self.lifecycle.reset();
                self.emit_trimmed_mention(&trimmed_mention, span.range.start);
                if self.config.notify_text_view_delegate_on_mention_trim {
                    self.emit_text_changed_by_controller();
                }
            }
            None => {
                self.ignore_stack.push();
                buffer.replace_range(span.range, &S::default());
                buffer.set_selection(TextRange::caret(span.range.start));
                self.ignore_stack.pop();
                self.selection_change_expected = true;
                self.lifecycle.reset();
                self.emit_deleted_mention(&mention, span.range.start);
                if self.config.notify_text_view_delegate_on_mention_deletion {
                    self.emit_text_changed_by_controller();
                }
            }
        }
    }

    /// Strip the attribute from a run, leaving its text behind, and queue
    /// the deletion notification.
    fn bleach_run(&mut self, buffer: &mut dyn TextBuffer<S>, span: &MentionSpan) {
        buffer.remove_mention(span.range);
        self.pending_deleted_mentions
            .push((span.attribute.mention().clone(), span.range.start));
    }

    /// Re-enter creation when the caret lands at the end of a still-valid
    /// control-character prefix.
    fn try_resume(&mut self, buffer: &mut dyn TextBuffer<S>, caret: usize) {
        let text = buffer.text();
        // Only resume at the end of the word.
        if text.char_at(caret).is_some_and(|c| self.config.is_word_char(c)) {
            return;
        }
        let mut key = String::new();
        let mut index = caret;
        while let Some(c) = text.char_before(index) {
            if !self.config.is_word_char(c) {
                break;
            }
            key.insert(0, c);
            index -= S::char_len(c);
        }
        let Some(control) = text.char_before(index) else {
            return;
        };
        if !self.config.is_control_character(control) {
            return;
        }
        let control_start = index - S::char_len(control);
        if !self
            .config
            .is_boundary_before(text.char_before(control_start))
        {
            return;
        }
        if buffer.mention_at(control_start).is_some() {
            return;
        }
        self.start_detection.mention_creation_resumed();
        self.start_creation(
            S::from_str(&key),
            Some(control),
            control_start,
            SearchType::Explicit,
        );
    }
}
