// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

mod buffer_invariants;
mod char_ext;
mod chooser;
mod config;
mod controller;
mod creation_state_machine;
mod delegate;
mod error;
mod ignore_stack;
mod in_memory_buffer;
mod lifecycle;
mod plugin_state;
mod query;
mod start_detection;
mod text_buffer;
mod unicode_string;

pub use mention_entities::{Mention, MentionAttribute, MentionHighlight, MentionMetadata};

pub use crate::char_ext::at_symbols;
pub use crate::char_ext::CharExt;
pub use crate::chooser::ChooserCallbacks;
pub use crate::chooser::ChooserPositionMode;
pub use crate::config::MentionsConfig;
pub use crate::config::WordClassifier;
pub use crate::controller::MentionsController;
pub use crate::creation_state_machine::CreationState;
pub use crate::creation_state_machine::CreationStateMachine;
pub use crate::delegate::MentionDataSource;
pub use crate::delegate::StateChangeObserver;
pub use crate::error::MentionsError;
pub use crate::ignore_stack::IgnoreStack;
pub use crate::in_memory_buffer::InMemoryBuffer;
pub use crate::lifecycle::MentionLifecycle;
pub use crate::lifecycle::MentionLifecycleState;
pub use crate::plugin_state::PluginState;
pub use crate::query::Query;
pub use crate::query::ResultSink;
pub use crate::query::SearchType;
pub use crate::start_detection::word_after_location;
pub use crate::start_detection::MentionStart;
pub use crate::start_detection::StartDetectionState;
pub use crate::start_detection::StartDetectionStateMachine;
pub use crate::text_buffer::MentionSpan;
pub use crate::text_buffer::TextBuffer;
pub use crate::text_buffer::TextRange;
pub use crate::unicode_string::UnicodeString;
