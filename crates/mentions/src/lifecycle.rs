// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use strum_macros::Display;
use tracing::trace;

use crate::TextRange;

/// Lifecycle of a committed mention relative to the caret. Deleting into a
/// mention is a three-step gesture: the first backspace arms the selection,
/// the second selects the whole run, the third trims or deletes it.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum MentionLifecycleState {
    Quiescent,
    /// One backspace was absorbed at the run's right edge; the next will
    /// select the run.
    AboutToSelect,
    /// The whole run is selected and highlighted; the next delete trims or
    /// removes it, any printable input bleaches it.
    Selected,
    /// The editor is resigning focus with a selected mention; the mention is
    /// deselected without further edits.
    LosingFocus,
}

/// What the controller should do with a backspace that landed on a mention
/// edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DeleteDecision {
    /// Absorb the backspace; no visible change yet.
    EnterAboutToSelect,
    /// Absorb the backspace and select + highlight the run.
    SelectRun,
    /// The run is already selected: trim it or delete it.
    TrimOrDelete,
}

/// Per-caret-adjacency state machine for committed mentions.
#[derive(Debug, Default)]
pub struct MentionLifecycle {
    state: MentionLifecycleState,
    target: Option<TextRange>,
}

impl Default for MentionLifecycleState {
    fn default() -> Self {
        Self::Quiescent
    }
}

impl MentionLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> MentionLifecycleState {
        self.state
    }

    /// The run currently selected through this machine, if any.
    pub fn selected_run(&self) -> Option<TextRange> {
        if self.state == MentionLifecycleState::Selected {
            self.target
        } else {
            None
        }
    }

    pub(crate) fn is_selected(&self, run: TextRange) -> bool {
        self.selected_run() == Some(run)
    }

    fn transition(&mut self, to: MentionLifecycleState) {
        if self.state != to {
            trace!(from = %self.state, to = %to, "mention lifecycle transition");
            self.state = to;
        }
    }

    /// A backspace landed on the right edge of `run` (or on the run while it
    /// is selected). Advances the three-step gesture.
    pub(crate) fn backspace_on_run(&mut self, run: TextRange) -> DeleteDecision {
        let same_target = self.target == Some(run);
        match self.state {
            MentionLifecycleState::Quiescent | MentionLifecycleState::LosingFocus => {
                self.target = Some(run);
                self.transition(MentionLifecycleState::AboutToSelect);
                DeleteDecision::EnterAboutToSelect
            }
            MentionLifecycleState::AboutToSelect => {
                if same_target {
                    self.transition(MentionLifecycleState::Selected);
                    DeleteDecision::SelectRun
                } else {
                    self.target = Some(run);
                    DeleteDecision::EnterAboutToSelect
                }
            }
            MentionLifecycleState::Selected => {
                if same_target {
                    DeleteDecision::TrimOrDelete
                } else {
                    self.target = Some(run);
                    self.transition(MentionLifecycleState::AboutToSelect);
                    DeleteDecision::EnterAboutToSelect
                }
            }
        }
    }

    /// The caret moved (or an unrelated edit happened). Returns the run that
    /// must be deselected, if one was selected.
    pub(crate) fn reset(&mut self) -> Option<TextRange> {
        let deselect = self.selected_run();
        self.target = None;
        self.transition(MentionLifecycleState::Quiescent);
        deselect
    }

    /// The editor is about to resign focus. Returns the run to deselect.
    pub(crate) fn begin_losing_focus(&mut self) -> Option<TextRange> {
        let deselect = self.selected_run();
        if deselect.is_some() {
            self.transition(MentionLifecycleState::LosingFocus);
        }
        deselect
    }

    /// Focus is gone; the gesture is over.
    pub(crate) fn focus_lost(&mut self) {
        self.target = None;
        self.transition(MentionLifecycleState::Quiescent);
    }
}
