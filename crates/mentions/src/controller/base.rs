// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::{Mention, MentionHighlight};
use tracing::trace;

use crate::{
    ChooserCallbacks, CreationStateMachine, IgnoreStack, MentionDataSource,
    MentionLifecycle, MentionsConfig, MentionsError, PluginState,
    StartDetectionStateMachine, StateChangeObserver, TextBuffer, TextRange,
    UnicodeString,
};

/// A user edit classified by the pre-change hook, consumed by the post-change
/// hook.
#[derive(Clone, Debug)]
pub(crate) enum PendingChange<S> {
    Insertion {
        location: usize,
        text: S,
        previous_char: Option<char>,
    },
    Deletion {
        range: TextRange,
        deleted: S,
        preceding_char: Option<char>,
    },
    Replacement {
        range: TextRange,
        replacement: S,
    },
}

/// The mentions controller: routes host editor events into the start
/// detection, creation and lifecycle state machines, performs the buffer
/// edits they decide on, and reports activity to the host.
///
/// The controller never retains the editor. The host lends it a
/// [`TextBuffer`] for the duration of each event entry point, and forwards
/// the editor's pre/post-change callbacks in the order
/// `should_change_text` → `did_change_text` → `did_change_selection`.
pub struct MentionsController<S: UnicodeString> {
    pub(crate) config: MentionsConfig,
    pub(crate) state: PluginState,
    pub(crate) start_detection: StartDetectionStateMachine,
    pub(crate) creation: CreationStateMachine<S>,
    pub(crate) lifecycle: MentionLifecycle,
    pub(crate) ignore_stack: IgnoreStack,
    pub(crate) data_source: MentionDataSource,
    pub(crate) observer: StateChangeObserver,
    pub(crate) chooser: Option<ChooserCallbacks>,
    pub(crate) chooser_active: bool,
    pub(crate) pending_change: Option<PendingChange<S>>,
    pub(crate) pending_deleted_mentions: Vec<(Mention, usize)>,
    /// Set when the controller moved the selection itself, so the next
    /// selection callback is not mistaken for a user caret move.
    pub(crate) selection_change_expected: bool,
}

impl<S> MentionsController<S>
where
    S: UnicodeString,
{
    pub fn new(config: MentionsConfig, data_source: MentionDataSource) -> Self {
        Self {
            config,
            state: PluginState::Quiescent,
            start_detection: StartDetectionStateMachine::new(),
            creation: CreationStateMachine::new(),
            lifecycle: MentionLifecycle::new(),
            ignore_stack: IgnoreStack::new(),
            data_source,
            observer: StateChangeObserver::new(),
            chooser: None,
            chooser_active: false,
            pending_change: None,
            pending_deleted_mentions: Vec::new(),
            selection_change_expected: false,
        }
    }

    pub fn with_observer(mut self, observer: StateChangeObserver) -> Self {
        self.observer = observer;
        self
    }

    pub fn set_observer(&mut self, observer: StateChangeObserver) {
        self.observer = observer;
    }

    pub fn state(&self) -> PluginState {
        self.state
    }

    pub fn config(&self) -> &MentionsConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut MentionsConfig {
        &mut self.config
    }

    /// Observable depth of the re-entrancy counter.
    pub fn ignore_stack_depth(&self) -> usize {
        self.ignore_stack.depth()
    }

    /// The control character that began the live mention attempt, if any.
    pub fn explicit_search_control_character(&self) -> Option<char> {
        self.creation.control_character()
    }

    /// Attach the chooser callbacks the controller will drive. Fails when
    /// the record advertises neither of the two data paths; the controller
    /// then stays quiescent with no chooser.
    pub fn attach_chooser(
        &mut self,
        chooser: ChooserCallbacks,
    ) -> Result<(), MentionsError> {
        chooser.validate()?;
        self.chooser = Some(chooser);
        Ok(())
    }

    /// Detach from the editor: the chooser is reset, both state machines
    /// return to quiescence and pending query results become stale.
    pub fn detach(&mut self) {
        self.deactivate_chooser();
        self.chooser = None;
        self.creation.end();
        self.start_detection.mention_creation_ended(true);
        self.lifecycle.focus_lost();
        self.pending_change = None;
        self.pending_deleted_mentions.clear();
        self.transition_state(PluginState::Quiescent);
    }

    pub(crate) fn transition_state(&mut self, to: PluginState) {
        if self.state == to {
            return;
        }
        let from = self.state;
        self.state = to;
        trace!(%from, %to, "controller state transition");
        if let Some(state_changed) = &mut self.observer.state_changed {
            state_changed(from, to);
        }
    }

    pub(crate) fn emit_created_mention(&mut self, mention: &Mention, location: usize) {
        if let Some(created_mention) = &mut self.observer.created_mention {
            created_mention(mention, location);
        }
    }

    pub(crate) fn emit_trimmed_mention(&mut self, mention: &Mention, location: usize) {
        if let Some(trimmed_mention) = &mut self.observer.trimmed_mention {
            trimmed_mention(mention, location);
        }
    }

    pub(crate) fn emit_deleted_mention(&mut self, mention: &Mention, location: usize) {
        if let Some(deleted_mention) = &mut self.observer.deleted_mention {
            deleted_mention(mention, location);
        }
    }

    pub(crate) fn emit_text_changed_by_controller(&mut self) {
        if let Some(text_changed) = &mut self.observer.text_changed_by_controller {
            text_changed();
        }
    }

    /// Reload the chooser with the current result set, activating it first
    /// if it is not showing yet.
    pub(crate) fn refresh_chooser(&mut self) {
        if self.chooser.is_none() {
            return;
        }
        let results = self.creation.results().to_vec();
        if self.chooser_active {
            if let Some(chooser) = &mut self.chooser {
                chooser.reload(&results);
            }
            return;
        }
        if let Some(chooser_will_activate) = &mut self.observer.chooser_will_activate {
            chooser_will_activate();
        }
        if let Some(chooser) = &mut self.chooser {
            chooser.reload(&results);
            chooser.show();
        }
        self.chooser_active = true;
        if let Some(chooser_activated) = &mut self.observer.chooser_activated {
            chooser_activated();
        }
    }

    pub(crate) fn deactivate_chooser(&mut self) {
        if !self.chooser_active {
            return;
        }
        if let Some(chooser) = &mut self.chooser {
            chooser.hide();
        }
        self.chooser_active = false;
        if let Some(chooser_deactivated) = &mut self.observer.chooser_deactivated {
            chooser_deactivated();
        }
    }

    /// Clear the highlight on a previously selected run, if it still exists.
    pub(crate) fn deselect_run(&mut self, buffer: &mut dyn TextBuffer<S>, run: TextRange) {
        if let Some(span) = buffer.mention_at(run.start) {
            if span.range == run && span.attribute.is_highlighted() {
                buffer.set_mention(
                    run,
                    span.attribute.with_highlight(MentionHighlight::Unhighlighted),
                );
            }
        }
    }
}

impl<S: UnicodeString> std::fmt::Debug for MentionsController<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionsController")
            .field("state", &self.state)
            .field("creation", &self.creation)
            .field("lifecycle", &self.lifecycle)
            .field("ignore_stack", &self.ignore_stack)
            .field("chooser_active", &self.chooser_active)
            .finish()
    }
}
