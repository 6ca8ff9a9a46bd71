// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::{Mention, MentionAttribute};
use tracing::debug;

use crate::{
    MentionSpan, MentionsController, MentionsError, PluginState, SearchType,
    TextBuffer, TextRange, UnicodeString,
};

impl<S> MentionsController<S>
where
    S: UnicodeString,
{
    /// Install a mention over text already in the buffer, e.g. when opening
    /// a document that was saved with mentions.
    ///
    /// The declared range must exactly cover `mention`'s display text in the
    /// buffer; invalid mentions are silently dropped. No observer
    /// notifications fire for mentions added this way.
    pub fn add_mention(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        mention: Mention,
        range: TextRange,
    ) {
        match Self::validate_mention(buffer, &mention, range) {
            Ok(()) => buffer.set_mention(range, MentionAttribute::new(mention)),
            Err(error) => {
                debug!(%error, ?range, "dropping mention");
            }
        }
    }

    /// Install several mentions; each is validated independently.
    pub fn add_mentions(
        &mut self,
        buffer: &mut dyn TextBuffer<S>,
        mentions: Vec<(Mention, TextRange)>,
    ) {
        for (mention, range) in mentions {
            self.add_mention(buffer, mention, range);
        }
    }

    fn validate_mention(
        buffer: &dyn TextBuffer<S>,
        mention: &Mention,
        range: TextRange,
    ) -> Result<(), MentionsError> {
        let display = S::from_str(mention.display_text());
        if range.end() > buffer.text_len()
            || display.len() != range.len
            || buffer.substring(range) != display
        {
            return Err(MentionsError::InvalidMentionInsertion);
        }
        Ok(())
    }

    /// Every mention currently in the buffer, in ascending order.
    pub fn mentions(&self, buffer: &dyn TextBuffer<S>) -> Vec<MentionSpan> {
        Self::extract_mentions_from_buffer(buffer)
    }

    /// Scan an arbitrary attributed buffer for mention runs. The returned
    /// spans can be fed back through [`Self::add_mentions`].
    pub fn extract_mentions_from_buffer(buffer: &dyn TextBuffer<S>) -> Vec<MentionSpan> {
        buffer.mention_spans()
    }

    /// Begin an un-prefixed mention session so the host can show starting
    /// suggestions, e.g. when the editor gains focus on an empty field.
    pub fn fetch_initial_mentions(&mut self, buffer: &mut dyn TextBuffer<S>) {
        if self.state != PluginState::Quiescent {
            return;
        }
        let caret = buffer.selection().start;
        self.start_detection.mention_creation_resumed();
        self.start_creation(S::default(), None, caret, SearchType::Initial);
    }
}
