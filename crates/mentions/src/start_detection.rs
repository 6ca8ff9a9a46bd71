// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use strum_macros::Display;
use tracing::trace;
use unicode_segmentation::UnicodeSegmentation;

use crate::char_ext::CharExt;
use crate::{MentionsConfig, UnicodeString};

/// States of the start detection machine. While a mention attempt is live
/// the machine merely suppresses further detection.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum StartDetectionState {
    Quiescent,
    CreatingMention,
}

/// The payload fired when detection decides a mention attempt should begin.
#[derive(Clone, Debug, PartialEq)]
pub struct MentionStart<S> {
    /// Characters already in the buffer that seed the query: the run for an
    /// implicit start, or the word following the control character for an
    /// explicit one (usually empty).
    pub prefix: S,
    /// Buffer index where the completed mention will begin; for an explicit
    /// start this is the index of the control character itself.
    pub location: usize,
    /// The control character that began the mention, or `None` for an
    /// implicit start.
    pub control_character: Option<char>,
}

/// Watches the stream of buffer events and decides when mention creation
/// should begin.
///
/// The machine only observes; every mutation of the buffer stays with the
/// controller. Callers feed it character-level events and it answers with a
/// [`MentionStart`] when one of the start rules fires.
#[derive(Debug)]
pub struct StartDetectionStateMachine {
    state: StartDetectionState,
    /// The run of consecutive word characters the user is building towards
    /// an implicit start.
    partial_word: String,
    /// Set after a cancelled attempt: the characters already at the caret
    /// must not re-fire until the caret moves away or a new word begins.
    suppressed: bool,
}

impl Default for StartDetectionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl StartDetectionStateMachine {
    pub fn new() -> Self {
        Self {
            state: StartDetectionState::Quiescent,
            partial_word: String::new(),
            suppressed: false,
        }
    }

    pub fn state(&self) -> StartDetectionState {
        self.state
    }

    fn begin(&mut self) {
        trace!(from = %self.state, "start detection entering CreatingMention");
        self.state = StartDetectionState::CreatingMention;
    }

    /// A single character was typed at `location`. `previous_char` is the
    /// character immediately before it after insertion, `next_word` the word
    /// following it (used to seed an explicit start typed in front of
    /// existing text).
    pub fn character_typed<S: UnicodeString>(
        &mut self,
        config: &MentionsConfig,
        c: char,
        location: usize,
        previous_char: Option<char>,
        next_word: &S,
    ) -> Option<MentionStart<S>> {
        if self.state == StartDetectionState::CreatingMention {
            return None;
        }

        if config.explicit_mentions_enabled()
            && config.is_control_character(c)
            && config.is_boundary_before(previous_char)
        {
            self.partial_word.clear();
            self.suppressed = false;
            self.begin();
            return Some(MentionStart {
                prefix: next_word.clone(),
                location,
                control_character: Some(c),
            });
        }

        if config.is_word_char(c) {
            if !config.implicit_mentions_enabled() {
                return None;
            }
            if self.partial_word.is_empty() && !config.is_boundary_before(previous_char) {
                // Typing inside an existing word never starts a run.
                return None;
            }
            self.partial_word.push(c);
            if !self.suppressed
                && self.partial_word.chars().count() == config.implicit_search_length
            {
                let prefix = S::from_str(&self.partial_word);
                let run_start = location + S::char_len(c) - prefix.len();
                self.partial_word.clear();
                self.begin();
                return Some(MentionStart {
                    prefix,
                    location: run_start,
                    control_character: None,
                });
            }
        } else {
            // A separator or other non-word character begins a fresh word
            // and lifts any post-cancel suppression.
            self.partial_word.clear();
            self.suppressed = false;
        }
        None
    }

    /// A whole string was inserted at `location` (paste, auto-correct,
    /// dictation). The string is scanned for an explicit start; failing
    /// that, its trailing word may complete an implicit run.
    pub fn valid_string_inserted<S: UnicodeString>(
        &mut self,
        config: &MentionsConfig,
        string: &S,
        location: usize,
        previous_char: Option<char>,
    ) -> Option<MentionStart<S>> {
        if self.state == StartDetectionState::CreatingMention {
            return None;
        }

        if config.explicit_mentions_enabled() {
            let chars = string.char_indices();
            let mut prev = previous_char;
            for (index, &(offset, c)) in chars.iter().enumerate() {
                if config.is_control_character(c) && config.is_boundary_before(prev) {
                    let prefix_start = offset + S::char_len(c);
                    let mut prefix_end = prefix_start;
                    for &(next_offset, next_char) in &chars[index + 1..] {
                        if config.is_word_char(next_char) {
                            prefix_end = next_offset + S::char_len(next_char);
                        } else {
                            break;
                        }
                    }
                    let prefix = string.substring(prefix_start..prefix_end);
                    self.partial_word.clear();
                    self.suppressed = false;
                    self.begin();
                    return Some(MentionStart {
                        prefix,
                        location: location + offset,
                        control_character: Some(c),
                    });
                }
                prev = Some(c);
            }
        }

        let candidate = self.sync_partial_word(config, string, previous_char);
        if config.implicit_mentions_enabled()
            && !self.suppressed
            && candidate.chars().count() >= config.implicit_search_length
        {
            let prefix = S::from_str(&candidate);
            let word_end = location + string.len();
            let run_start = word_end - prefix.len();
            self.partial_word.clear();
            self.begin();
            return Some(MentionStart {
                prefix,
                location: run_start,
                control_character: None,
            });
        }
        None
    }

    /// Recompute the partial run after an insertion and return it.
    fn sync_partial_word<S: UnicodeString>(
        &mut self,
        config: &MentionsConfig,
        string: &S,
        previous_char: Option<char>,
    ) -> String {
        let inserted = string.to_string();
        let trailing: String = {
            let mut word = String::new();
            for c in inserted.chars().rev() {
                if config.is_word_char(c) {
                    word.insert(0, c);
                } else {
                    break;
                }
            }
            word
        };

        let candidate = if trailing.chars().count() == inserted.chars().count() {
            // The whole insertion is word characters: it either extends the
            // run in progress or starts one at a boundary.
            if !self.partial_word.is_empty() {
                format!("{}{}", self.partial_word, trailing)
            } else if config.is_boundary_before(previous_char) {
                trailing
            } else {
                String::new()
            }
        } else {
            // The separator inside the insertion is the boundary.
            trailing
        };
        self.partial_word = candidate.clone();
        candidate
    }

    /// A character was deleted; the caret now sits at `location`. The run
    /// ending there is recomputed from the buffer, and an implicit start is
    /// re-fired when the deletion brings a word back to exactly the
    /// configured length.
    pub fn delete_typed<S: UnicodeString>(
        &mut self,
        config: &MentionsConfig,
        deleted_char: char,
        preceding_char: Option<char>,
        location: usize,
        text: &S,
    ) -> Option<MentionStart<S>> {
        if self.state == StartDetectionState::CreatingMention {
            return None;
        }
        trace!(?deleted_char, location, "recomputing run after deletion");

        let mut run = String::new();
        let mut run_start = location;
        let mut prev = preceding_char;
        while let Some(c) = prev {
            if !config.is_word_char(c) {
                break;
            }
            run.insert(0, c);
            run_start -= S::char_len(c);
            prev = text.char_before(run_start);
        }
        self.partial_word = run.clone();

        if config.implicit_mentions_enabled()
            && !self.suppressed
            && run.chars().count() == config.implicit_search_length
        {
            let prefix = S::from_str(&run);
            self.partial_word.clear();
            self.begin();
            return Some(MentionStart {
                prefix,
                location: run_start,
                control_character: None,
            });
        }
        None
    }

    /// The caret moved without an edit. Any partial run is abandoned and
    /// post-cancel suppression is lifted.
    pub fn cursor_moved(&mut self, char_before_cursor: Option<char>) {
        if self.state == StartDetectionState::CreatingMention {
            return;
        }
        trace!(?char_before_cursor, "cursor moved, resetting partial run");
        self.partial_word.clear();
        self.suppressed = false;
    }

    /// Mention creation finished. When `can_immediately_restart` is false
    /// the characters already at the caret are barred from re-firing until
    /// the caret moves or a new word begins.
    pub fn mention_creation_ended(&mut self, can_immediately_restart: bool) {
        trace!(can_immediately_restart, "start detection back to Quiescent");
        self.state = StartDetectionState::Quiescent;
        self.partial_word.clear();
        self.suppressed = !can_immediately_restart;
    }

    /// Creation was resumed by the controller; force the machine back into
    /// the live state so it suppresses detection for the duration.
    pub fn mention_creation_resumed(&mut self) {
        self.state = StartDetectionState::CreatingMention;
    }

    /// The buffer content was replaced programmatically. Detection restarts
    /// from the trailing context of the new text.
    pub fn reset_state_using_string<S: UnicodeString>(
        &mut self,
        config: &MentionsConfig,
        text: &S,
    ) {
        self.state = StartDetectionState::Quiescent;
        self.suppressed = false;
        let text = text.to_string();
        let mut tail = String::new();
        for segment in text.split_word_bounds().rev() {
            if segment.chars().all(|c| config.is_word_char(c)) {
                tail.insert_str(0, segment);
            } else {
                break;
            }
        }
        self.partial_word = tail;
    }
}

/// The word following `location`, up to the next whitespace. Used to seed
/// explicit starts typed in front of existing text.
pub fn word_after_location<S: UnicodeString>(text: &S, location: usize) -> S {
    let mut end = location;
    while let Some(c) = text.char_at(end) {
        if c.is_word_separator() {
            break;
        }
        end += S::char_len(c);
    }
    text.substring(location..end)
}
