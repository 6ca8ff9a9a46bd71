// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Value types describing mention entities, shared between the mentions
//! controller and its host integrations.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Opaque metadata carried alongside an entity. The controller never
/// interprets it; it is round-tripped to the host on commit, trim and
/// deletion.
pub type MentionMetadata = HashMap<String, serde_json::Value>;

/// An entity reference produced by the host's data source and embedded into
/// editable text as an atomic span.
///
/// Two mentions are considered equal when their unique ids are equal; the
/// unique id defaults to the entity id unless one was supplied explicitly.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Mention {
    entity_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    unique_id: Option<String>,
    display_text: String,
    #[serde(default)]
    metadata: MentionMetadata,
}

impl Mention {
    pub fn new(entity_id: impl Into<String>, display_text: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            unique_id: None,
            display_text: display_text.into(),
            metadata: MentionMetadata::new(),
        }
    }

    /// Override the id used for dedup. When never called, the entity id is
    /// used.
    pub fn with_unique_id(mut self, unique_id: impl Into<String>) -> Self {
        self.unique_id = Some(unique_id.into());
        self
    }

    pub fn with_metadata(mut self, metadata: MentionMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// A copy of this mention carrying a different display text. Used when a
    /// mention is trimmed down to its abbreviated form.
    pub fn with_display_text(mut self, display_text: impl Into<String>) -> Self {
        self.display_text = display_text.into();
        self
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    pub fn unique_id(&self) -> &str {
        self.unique_id.as_deref().unwrap_or(&self.entity_id)
    }

    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    pub fn metadata(&self) -> &MentionMetadata {
        &self.metadata
    }

    /// Safe access to a single metadata entry, for hosts that have an
    /// informal agreement about the custom keys their entities carry.
    pub fn value_for_custom_key(&self, key: &str) -> Option<&serde_json::Value> {
        self.metadata.get(key)
    }

    /// The default abbreviated form of the display text: everything up to
    /// the first whitespace. Returns `None` when the display text is a
    /// single word already, in which case trimming is not applicable.
    pub fn trimmed_display_text(&self) -> Option<String> {
        let text = self.display_text.trim();
        let mut first_word = String::new();
        for segment in text.split_word_bounds() {
            if segment.chars().next().is_some_and(char::is_whitespace) {
                break;
            }
            first_word.push_str(segment);
        }
        if first_word.is_empty() || first_word == text {
            None
        } else {
            Some(first_word)
        }
    }
}

impl PartialEq for Mention {
    fn eq(&self, other: &Self) -> bool {
        self.unique_id() == other.unique_id()
    }
}

impl Eq for Mention {}

/// Whether the span holding a mention is currently drawn with the host's
/// highlight styling. Colors themselves are a host concern.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MentionHighlight {
    #[default]
    Unhighlighted,
    Highlighted,
}

/// The immutable descriptor attached to a contiguous run of buffer text.
///
/// The attribute confers no formatting by itself; the controller toggles the
/// highlight tag and the host maps it to actual styling.
#[derive(Clone, Debug, PartialEq)]
pub struct MentionAttribute {
    mention: Mention,
    highlight: MentionHighlight,
}

impl MentionAttribute {
    pub fn new(mention: Mention) -> Self {
        Self {
            mention,
            highlight: MentionHighlight::Unhighlighted,
        }
    }

    pub fn mention(&self) -> &Mention {
        &self.mention
    }

    pub fn highlight(&self) -> MentionHighlight {
        self.highlight
    }

    pub fn is_highlighted(&self) -> bool {
        self.highlight == MentionHighlight::Highlighted
    }

    pub fn with_highlight(&self, highlight: MentionHighlight) -> Self {
        Self {
            mention: self.mention.clone(),
            highlight,
        }
    }
}
