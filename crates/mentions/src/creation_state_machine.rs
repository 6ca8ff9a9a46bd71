// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::Mention;
use strum_macros::Display;
use tracing::trace;

use crate::char_ext::CharExt;
use crate::query::{PipelineEvent, QueryPipeline};
use crate::{MentionDataSource, MentionsConfig, SearchType, TextRange, UnicodeString};

/// States of a mention attempt, from the first query to commit or cancel.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum CreationState {
    /// No attempt in progress.
    Idle,
    /// A query was issued and no results have arrived yet.
    PrimedBeforeResults,
    /// Results are displayed and the set is final for the current query.
    ChooserShown,
    /// Progressive loading: a first batch is shown and more may follow.
    AwaitingMoreResults,
    /// The host reported a selection through the custom chooser path.
    CommittedExternally,
    /// Terminal; the controller exits the attempt.
    Cancelled,
}

/// What the controller should do after feeding an event to the machine.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum CreationStep {
    Continue,
    /// The visible result set changed; reload (and possibly show) the
    /// chooser.
    ResultsUpdated,
    /// The query came back empty but the session stays alive with an empty
    /// chooser.
    EmptyResults,
    Cancelled {
        can_immediately_restart: bool,
    },
}

/// Tracks the evolving query of an active mention attempt and owns its
/// query pipeline.
#[derive(Debug)]
pub struct CreationStateMachine<S: UnicodeString> {
    state: CreationState,
    key_string: S,
    search_type: SearchType,
    control_character: Option<char>,
    anchor_location: usize,
    pipeline: QueryPipeline,
}

impl<S> CreationStateMachine<S>
where
    S: UnicodeString,
{
    pub fn new() -> Self {
        Self {
            state: CreationState::Idle,
            key_string: S::default(),
            search_type: SearchType::Explicit,
            control_character: None,
            anchor_location: 0,
            pipeline: QueryPipeline::new(),
        }
    }

    pub fn state(&self) -> CreationState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            CreationState::PrimedBeforeResults
                | CreationState::ChooserShown
                | CreationState::AwaitingMoreResults
        )
    }

    pub fn key_string(&self) -> &S {
        &self.key_string
    }

    pub fn search_type(&self) -> SearchType {
        self.search_type
    }

    pub fn control_character(&self) -> Option<char> {
        self.control_character
    }

    pub fn anchor_location(&self) -> usize {
        self.anchor_location
    }

    pub fn results(&self) -> &[Mention] {
        self.pipeline.results()
    }

    pub fn generation(&self) -> u64 {
        self.pipeline.generation()
    }

    /// Whether the current query is still waiting for its first batch.
    pub fn awaiting_first_batch(&self) -> bool {
        self.pipeline.awaiting_first_batch()
    }

    fn transition(&mut self, to: CreationState) {
        if self.state != to {
            trace!(from = %self.state, to = %to, "mention creation transition");
            self.state = to;
        }
    }

    /// Begin an attempt and issue the seed query.
    pub(crate) fn mention_creation_started(
        &mut self,
        prefix: S,
        control_character: Option<char>,
        location: usize,
        search_type: SearchType,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) {
        self.key_string = prefix;
        self.control_character = control_character;
        self.anchor_location = location;
        self.search_type = search_type;
        self.pipeline.reset();
        self.transition(CreationState::PrimedBeforeResults);
        self.requery(config, data_source);
    }

    fn requery(&mut self, config: &MentionsConfig, data_source: &mut MentionDataSource) {
        self.pipeline.dispatch(
            self.key_string.to_string(),
            self.search_type,
            self.control_character,
            self.anchor_location,
            config,
            data_source,
        );
    }

    /// A character was typed at the end of the live query.
    pub(crate) fn character_typed(
        &mut self,
        c: char,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) -> CreationStep {
        if !self.is_active() {
            return CreationStep::Continue;
        }
        if c.is_line_terminator() {
            return self.cancel_step(false);
        }
        if !config.is_word_char(c)
            && !self.pipeline.has_results()
            && !config.should_continue_searching_after_empty_results
        {
            return self.cancel_step(true);
        }
        self.key_string.push_char(c);
        self.requery(config, data_source);
        CreationStep::Continue
    }

    /// A whole string was inserted at the end of the live query.
    pub(crate) fn valid_string_inserted(
        &mut self,
        string: &S,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) -> CreationStep {
        if !self.is_active() {
            return CreationStep::Continue;
        }
        if string.to_string().chars().any(|c| c.is_line_terminator()) {
            return self.cancel_step(false);
        }
        let end = self.key_string.len();
        self.key_string.replace_range(end..end, string);
        self.requery(config, data_source);
        CreationStep::Continue
    }

    /// A string was deleted from the end of the live query.
    /// `removed_anchor` is set when the deletion reached the control
    /// character (or the start of an implicit run).
    pub(crate) fn string_deleted(
        &mut self,
        deleted: &S,
        removed_anchor: bool,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) -> CreationStep {
        if !self.is_active() {
            return CreationStep::Continue;
        }
        if removed_anchor {
            return self.cancel_step(false);
        }
        let key_len = self.key_string.len();
        let deleted_len = deleted.len().min(key_len);
        self.key_string = self.key_string.substring(0..key_len - deleted_len);

        if self.search_type == SearchType::Implicit
            && self.key_string.to_string().chars().count() < config.implicit_search_length
        {
            // Deletion shortened the prefix below the start threshold; start
            // detection takes over again and may re-fire from here.
            return self.cancel_step(true);
        }
        self.requery(config, data_source);
        CreationStep::Continue
    }

    /// The caret moved to `caret` without an edit.
    pub(crate) fn cursor_moved(&mut self, caret: usize) -> CreationStep {
        if !self.is_active() {
            return CreationStep::Continue;
        }
        let live_start = self.anchor_location;
        let live_end = self.anchor_location + self.control_char_units() + self.key_string.len();
        if caret < live_start || caret > live_end {
            self.cancel_step(false)
        } else {
            CreationStep::Continue
        }
    }

    /// Drain the pipeline on the event thread and fold the batches into
    /// state transitions.
    pub(crate) fn drain(
        &mut self,
        config: &MentionsConfig,
        data_source: &mut MentionDataSource,
    ) -> Vec<CreationStep> {
        if !self.is_active() {
            return Vec::new();
        }
        let mut steps = Vec::new();
        for event in self.pipeline.drain(config, data_source) {
            match event {
                PipelineEvent::Results { is_complete } => {
                    if is_complete {
                        self.transition(CreationState::ChooserShown);
                    } else {
                        self.transition(CreationState::AwaitingMoreResults);
                    }
                    steps.push(CreationStep::ResultsUpdated);
                }
                PipelineEvent::EmptyFinal => {
                    if config.should_continue_searching_after_empty_results {
                        self.transition(CreationState::ChooserShown);
                        steps.push(CreationStep::EmptyResults);
                    } else {
                        steps.push(self.cancel_step(true));
                        break;
                    }
                }
            }
        }
        steps
    }

    fn cancel_step(&mut self, can_immediately_restart: bool) -> CreationStep {
        self.transition(CreationState::Cancelled);
        CreationStep::Cancelled {
            can_immediately_restart,
        }
    }

    /// Mark the attempt cancelled without going through an event.
    pub(crate) fn cancel(&mut self) {
        self.transition(CreationState::Cancelled);
    }

    /// The host reported a selection through the custom chooser path.
    pub(crate) fn set_committed_externally(&mut self) {
        self.transition(CreationState::CommittedExternally);
    }

    /// Leave the attempt; the machine returns to `Idle` and pending results
    /// become stale.
    pub(crate) fn end(&mut self) {
        self.key_string = S::default();
        self.control_character = None;
        self.pipeline.reset();
        self.transition(CreationState::Idle);
    }

    fn control_char_units(&self) -> usize {
        match (self.search_type, self.control_character) {
            (SearchType::Explicit, Some(c)) => S::char_len(c),
            _ => 0,
        }
    }

    /// The buffer range the committed display text replaces.
    ///
    /// For an explicit mention the control character is included unless the
    /// host configured it to stay as a prepended literal; an implicit
    /// mention replaces exactly the typed prefix. An initial-search commit
    /// inserts at the anchor.
    pub(crate) fn replacement_range(&self, config: &MentionsConfig) -> TextRange {
        let ctrl_units = self.control_char_units();
        let key_units = self.key_string.len();
        match self.search_type {
            SearchType::Explicit => {
                let keep_literal = self
                    .control_character
                    .is_some_and(|c| config.should_prepend(c));
                if keep_literal {
                    TextRange::new(self.anchor_location + ctrl_units, key_units)
                } else {
                    TextRange::new(self.anchor_location, ctrl_units + key_units)
                }
            }
            SearchType::Implicit | SearchType::Initial => {
                TextRange::new(self.anchor_location, key_units)
            }
        }
    }
}

impl<S: UnicodeString> Default for CreationStateMachine<S> {
    fn default() -> Self {
        Self::new()
    }
}
