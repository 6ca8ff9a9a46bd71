// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::Mention;

use crate::{PluginState, Query, ResultSink};

/// The host's data source, as an explicit capability record: one required
/// fetch function plus optional trim hooks.
///
/// `retrieve_entities` is handed each [`Query`] together with a
/// [`ResultSink`]. The fetch may complete synchronously or call the sink
/// later from any thread; results are applied when the controller next
/// drains on the event thread.
pub struct MentionDataSource {
    pub retrieve_entities: Box<dyn FnMut(&Query, ResultSink)>,

    /// Whether a given entity may be trimmed to an abbreviated form. When
    /// absent, mentions are never trimmed.
    pub entity_can_be_trimmed: Option<Box<dyn Fn(&Mention) -> bool>>,

    /// Host-supplied abbreviated form. When absent, the default trim (first
    /// whitespace-delimited word) applies.
    pub trimmed_name_for_entity: Option<Box<dyn Fn(&Mention) -> String>>,

    /// Whether the host's chooser can show a loading row while the first
    /// batch of a query is outstanding.
    pub loading_indicator_supported: bool,
}

impl MentionDataSource {
    pub fn new(retrieve_entities: impl FnMut(&Query, ResultSink) + 'static) -> Self {
        Self {
            retrieve_entities: Box::new(retrieve_entities),
            entity_can_be_trimmed: None,
            trimmed_name_for_entity: None,
            loading_indicator_supported: false,
        }
    }

    pub fn with_entity_can_be_trimmed(
        mut self,
        entity_can_be_trimmed: impl Fn(&Mention) -> bool + 'static,
    ) -> Self {
        self.entity_can_be_trimmed = Some(Box::new(entity_can_be_trimmed));
        self
    }

    pub fn with_trimmed_name_for_entity(
        mut self,
        trimmed_name_for_entity: impl Fn(&Mention) -> String + 'static,
    ) -> Self {
        self.trimmed_name_for_entity = Some(Box::new(trimmed_name_for_entity));
        self
    }

    pub fn with_loading_indicator_supported(mut self, supported: bool) -> Self {
        self.loading_indicator_supported = supported;
        self
    }

    pub(crate) fn can_trim(&self, mention: &Mention) -> bool {
        self.entity_can_be_trimmed
            .as_ref()
            .is_some_and(|can_trim| can_trim(mention))
    }

    /// The abbreviated form a trim would produce, or `None` when the entity
    /// is not trimmable. A result equal to the current display text means
    /// the mention is already in its trimmed form.
    pub(crate) fn trimmed_text(&self, mention: &Mention) -> Option<String> {
        if !self.can_trim(mention) {
            return None;
        }
        match &self.trimmed_name_for_entity {
            Some(trimmed_name) => Some(trimmed_name(mention)),
            None => mention.trimmed_display_text(),
        }
    }
}

impl std::fmt::Debug for MentionDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MentionDataSource")
            .field(
                "entity_can_be_trimmed",
                &self.entity_can_be_trimmed.is_some(),
            )
            .field(
                "trimmed_name_for_entity",
                &self.trimmed_name_for_entity.is_some(),
            )
            .field(
                "loading_indicator_supported",
                &self.loading_indicator_supported,
            )
            .finish()
    }
}

/// Observer hooks for hosts that track the controller's activity. Every
/// field is optional; absent hooks are simply skipped.
///
/// The mention notifications fire only for user-originated changes, never
/// for mentions installed through `add_mention`.
#[derive(Default)]
pub struct StateChangeObserver {
    pub state_changed: Option<Box<dyn FnMut(PluginState, PluginState)>>,
    pub created_mention: Option<Box<dyn FnMut(&Mention, usize)>>,
    pub trimmed_mention: Option<Box<dyn FnMut(&Mention, usize)>>,
    pub deleted_mention: Option<Box<dyn FnMut(&Mention, usize)>>,
    pub chooser_will_activate: Option<Box<dyn FnMut()>>,
    pub chooser_activated: Option<Box<dyn FnMut()>>,
    pub chooser_deactivated: Option<Box<dyn FnMut()>>,

    /// The host's own text-change callback, invoked for controller-originated
    /// edits when the corresponding `notify_text_view_delegate_*` flag is on.
    pub text_changed_by_controller: Option<Box<dyn FnMut()>>,
}

impl StateChangeObserver {
    pub fn new() -> Self {
        Self::default()
    }
}

impl std::fmt::Debug for StateChangeObserver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StateChangeObserver")
            .field("state_changed", &self.state_changed.is_some())
            .field("created_mention", &self.created_mention.is_some())
            .field("trimmed_mention", &self.trimmed_mention.is_some())
            .field("deleted_mention", &self.deleted_mention.is_some())
            .finish()
    }
}
