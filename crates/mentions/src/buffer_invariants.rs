// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Assertions that guarantee the attributed buffer is in a known state
//! between events:
//!
//! - mention runs never overlap and are stored in ascending order
//! - the text under every run equals the attribute's display text
//! - the selection lies within the buffer
//!
//! By default, outside tests, nothing is asserted. Compile with the
//! "assert-invariants" feature to make every call check.

use crate::in_memory_buffer::InMemoryBuffer;
use crate::UnicodeString;
#[cfg(any(test, feature = "assert-invariants"))]
use crate::TextBuffer;

impl<S> InMemoryBuffer<S>
where
    S: UnicodeString,
{
    /// Check the buffer invariants if this build asserts them. Call wherever
    /// the buffer is expected to be quiescent.
    pub fn explicitly_assert_invariants(&self) {
        #[cfg(any(test, feature = "assert-invariants"))]
        self.assert_invariants();
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    pub(crate) fn assert_invariants(&self) {
        self.assert_runs_sorted_and_disjoint();
        self.assert_run_text_matches_attributes();
        self.assert_selection_in_bounds();
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_runs_sorted_and_disjoint(&self) {
        let spans = self.mention_spans();
        for pair in spans.windows(2) {
            if pair[1].range.start < pair[0].range.end() {
                panic!(
                    "Mention runs overlap or are out of order! {:?} vs {:?}\n{:?}",
                    pair[0].range, pair[1].range, self
                );
            }
        }
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_run_text_matches_attributes(&self) {
        for span in self.mention_spans() {
            let expected = S::from_str(span.attribute.mention().display_text());
            if span.range.end() > self.text_len()
                || self.substring(span.range) != expected
            {
                panic!(
                    "Mention run text does not match its attribute! range {:?}, expected {:?}\n{:?}",
                    span.range, expected, self
                );
            }
        }
    }

    #[cfg(any(test, feature = "assert-invariants"))]
    fn assert_selection_in_bounds(&self) {
        let selection = self.selection();
        if selection.end() > self.text_len() {
            panic!(
                "Selection {:?} exceeds buffer length {}!\n{:?}",
                selection,
                self.text_len(),
                self
            );
        }
    }
}
