// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::HashSet;
use std::time::Duration;

use crate::char_ext::at_symbols;
use crate::ChooserPositionMode;

/// Host-supplied predicate deciding which characters can form part of a
/// mention query word. The exact classification (letters only, letters and
/// digits, additional scripts) is a host decision.
pub type WordClassifier = fn(char) -> bool;

fn default_word_classifier(c: char) -> bool {
    c.is_alphanumeric()
}

/// Behavior configuration for [`crate::MentionsController`].
#[derive(Clone, Debug)]
pub struct MentionsConfig {
    /// How the host intends to position the chooser. Carried for the host's
    /// layout code; the controller only reads the viewport-locking class.
    pub chooser_position_mode: ChooserPositionMode,

    /// Characters that begin an explicit mention when typed at a word
    /// boundary. An empty set disables explicit mentions.
    pub control_characters: HashSet<char>,

    /// The subset of control characters kept in the buffer as a literal
    /// prefix when a mention started by them is committed. A control
    /// character outside this set is consumed by the commit.
    pub control_characters_to_prepend: HashSet<char>,

    /// Number of consecutive word characters that begin an implicit mention.
    /// Zero disables implicit mentions.
    pub implicit_search_length: usize,

    /// Allow re-entering mention creation when the caret moves back to the
    /// end of a still-valid control-character prefix.
    pub resume_mentions_creation_enabled: bool,

    /// Keep the chooser alive (empty) when a query returns no results,
    /// instead of cancelling creation.
    pub should_continue_searching_after_empty_results: bool,

    /// Whether the host's own change callback fires for the buffer edit a
    /// commit performs.
    pub notify_text_view_delegate_on_mention_creation: bool,

    /// Whether the host's own change callback fires for a trim edit.
    pub notify_text_view_delegate_on_mention_trim: bool,

    /// Whether the host's own change callback fires for a deletion edit.
    pub notify_text_view_delegate_on_mention_deletion: bool,

    pub word_classifier: WordClassifier,

    /// Minimum interval between keystroke-driven queries once a non-empty
    /// final result has arrived. `Duration::ZERO` disables coalescing.
    pub query_cooldown_interval: Duration,

    /// How long to wait for a query's first batch before treating the
    /// generation as an empty final result.
    pub query_timeout: Duration,
}

impl Default for MentionsConfig {
    fn default() -> Self {
        Self {
            chooser_position_mode: ChooserPositionMode::EnclosedTop,
            control_characters: at_symbols().clone(),
            control_characters_to_prepend: HashSet::new(),
            implicit_search_length: 3,
            resume_mentions_creation_enabled: false,
            should_continue_searching_after_empty_results: false,
            notify_text_view_delegate_on_mention_creation: false,
            notify_text_view_delegate_on_mention_trim: false,
            notify_text_view_delegate_on_mention_deletion: false,
            word_classifier: default_word_classifier,
            query_cooldown_interval: Duration::from_millis(150),
            query_timeout: Duration::from_secs(10),
        }
    }
}

impl MentionsConfig {
    pub fn explicit_mentions_enabled(&self) -> bool {
        !self.control_characters.is_empty()
    }

    pub fn implicit_mentions_enabled(&self) -> bool {
        self.implicit_search_length > 0
    }

    pub fn is_control_character(&self, c: char) -> bool {
        self.control_characters.contains(&c)
    }

    pub fn should_prepend(&self, c: char) -> bool {
        self.control_characters_to_prepend.contains(&c)
    }

    pub fn is_word_char(&self, c: char) -> bool {
        (self.word_classifier)(c)
    }

    /// Whether `c` sits at a word boundary, i.e. can be preceded by `prev`
    /// for the purpose of starting a mention. Start-of-buffer counts.
    pub fn is_boundary_before(&self, prev: Option<char>) -> bool {
        match prev {
            None => true,
            Some(c) => !self.is_word_char(c),
        }
    }
}
