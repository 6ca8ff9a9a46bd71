// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

//! Drives a controller the way a host editor would: every simulated
//! keystroke goes through the should/did event pair, refused edits are not
//! applied, and programmatic selection changes echo back as selection
//! callbacks.

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use mention_entities::Mention;
use widestring::Utf16String;

use crate::{
    ChooserCallbacks, InMemoryBuffer, MentionDataSource, MentionsConfig,
    MentionsController, Query, ResultSink, StateChangeObserver, TextBuffer, TextRange,
    UnicodeString,
};

pub type QueryLog = Rc<RefCell<Vec<Query>>>;
pub type SinkLog = Rc<RefCell<Vec<(Query, ResultSink)>>>;
pub type EventLog = Rc<RefCell<Vec<String>>>;

/// A controller configuration with the keystroke cooldown disabled, so
/// synchronous test data sources answer every keystroke immediately.
pub fn test_config() -> MentionsConfig {
    MentionsConfig {
        query_cooldown_interval: Duration::ZERO,
        ..MentionsConfig::default()
    }
}

pub fn user(id: &str, name: &str) -> Mention {
    Mention::new(id, name)
}

/// A data source answering synchronously with the entries whose display
/// text starts with the key string (case-insensitive).
pub fn directory_data_source(entries: Vec<Mention>) -> (MentionDataSource, QueryLog) {
    let log: QueryLog = Rc::new(RefCell::new(Vec::new()));
    let queries = Rc::clone(&log);
    let data_source = MentionDataSource::new(move |query, sink| {
        queries.borrow_mut().push(query.clone());
        let key = query.key_string.to_lowercase();
        let matches: Vec<Mention> = entries
            .iter()
            .filter(|entry| entry.display_text().to_lowercase().starts_with(&key))
            .cloned()
            .collect();
        sink.deliver(matches, false, true);
    });
    (data_source, log)
}

/// A data source that never answers by itself; tests capture the sinks and
/// deliver batches manually (late, out of order, or repeatedly).
pub fn capturing_data_source() -> (MentionDataSource, SinkLog) {
    let log: SinkLog = Rc::new(RefCell::new(Vec::new()));
    let sinks = Rc::clone(&log);
    let data_source = MentionDataSource::new(move |query, sink| {
        sinks.borrow_mut().push((query.clone(), sink));
    });
    (data_source, log)
}

/// An observer that records every notification as a compact string.
pub fn recording_observer() -> (StateChangeObserver, EventLog) {
    let log: EventLog = Rc::new(RefCell::new(Vec::new()));
    let mut observer = StateChangeObserver::new();

    let events = Rc::clone(&log);
    observer.state_changed = Some(Box::new(move |from, to| {
        events.borrow_mut().push(format!("state:{from}->{to}"));
    }));
    let events = Rc::clone(&log);
    observer.created_mention = Some(Box::new(move |mention, location| {
        events
            .borrow_mut()
            .push(format!("created:{}@{location}", mention.entity_id()));
    }));
    let events = Rc::clone(&log);
    observer.trimmed_mention = Some(Box::new(move |mention, location| {
        events
            .borrow_mut()
            .push(format!("trimmed:{}@{location}", mention.entity_id()));
    }));
    let events = Rc::clone(&log);
    observer.deleted_mention = Some(Box::new(move |mention, location| {
        events
            .borrow_mut()
            .push(format!("deleted:{}@{location}", mention.entity_id()));
    }));
    let events = Rc::clone(&log);
    observer.chooser_will_activate = Some(Box::new(move || {
        events.borrow_mut().push("chooser_will_activate".into());
    }));
    let events = Rc::clone(&log);
    observer.chooser_activated = Some(Box::new(move || {
        events.borrow_mut().push("chooser_activated".into());
    }));
    let events = Rc::clone(&log);
    observer.chooser_deactivated = Some(Box::new(move || {
        events.borrow_mut().push("chooser_deactivated".into());
    }));
    let events = Rc::clone(&log);
    observer.text_changed_by_controller = Some(Box::new(move || {
        events.borrow_mut().push("text_changed".into());
    }));
    (observer, log)
}

/// What a custom chooser has been told so far.
#[derive(Debug, Default)]
pub struct ChooserProbe {
    pub visible: bool,
    pub reload_count: usize,
    pub results: Vec<Mention>,
}

/// A custom-variant chooser capturing pushes into a probe.
pub fn capturing_chooser() -> (ChooserCallbacks, Rc<RefCell<ChooserProbe>>) {
    let probe = Rc::new(RefCell::new(ChooserProbe::default()));

    let shown = Rc::clone(&probe);
    let hidden = Rc::clone(&probe);
    let reloaded = Rc::clone(&probe);
    let callbacks = ChooserCallbacks::new(
        move || shown.borrow_mut().visible = true,
        move || hidden.borrow_mut().visible = false,
    )
    .with_model_updated(move |results| {
        let mut probe = reloaded.borrow_mut();
        probe.reload_count += 1;
        probe.results = results.to_vec();
    });
    (callbacks, probe)
}

pub struct TestHarness {
    pub controller: MentionsController<Utf16String>,
    pub buffer: InMemoryBuffer<Utf16String>,
}

impl TestHarness {
    pub fn new(config: MentionsConfig, data_source: MentionDataSource) -> Self {
        Self {
            controller: MentionsController::new(config, data_source),
            buffer: InMemoryBuffer::new(),
        }
    }

    pub fn with_buffer(mut self, buffer: InMemoryBuffer<Utf16String>) -> Self {
        self.buffer = buffer;
        self
    }

    /// Apply one edit the way a host editor would: ask, apply, notify.
    /// Returns whether the edit was let through.
    pub fn apply_edit(&mut self, range: TextRange, replacement: &str) -> bool {
        let replacement = Utf16String::from(replacement);
        let selection_before = self.buffer.selection();
        let accepted =
            self.controller
                .should_change_text(&mut self.buffer, range, &replacement);
        if accepted {
            self.buffer.replace_range(range, &replacement);
            self.buffer.set_selection(TextRange::caret(
                range.start + UnicodeString::len(&replacement),
            ));
            self.controller.did_change_text(&mut self.buffer);
            self.controller.did_change_selection(&mut self.buffer);
        } else if self.buffer.selection() != selection_before {
            // The controller moved the selection itself; the host's
            // selection observer still fires.
            self.controller.did_change_selection(&mut self.buffer);
        }
        accepted
    }

    /// Type text one character at a time at the current selection.
    pub fn type_str(&mut self, text: &str) {
        for c in text.chars() {
            let selection = self.buffer.selection();
            self.apply_edit(selection, &c.to_string());
        }
    }

    /// Paste a string in one edit at the current selection.
    pub fn paste(&mut self, text: &str) -> bool {
        let selection = self.buffer.selection();
        self.apply_edit(selection, text)
    }

    /// A backspace: deletes the selection, or the character before a caret.
    pub fn press_backspace(&mut self) -> bool {
        let selection = self.buffer.selection();
        let range = if selection.is_empty() {
            if selection.start == 0 {
                return false;
            }
            let text = self.buffer.text();
            let Some(c) = text.char_before(selection.start) else {
                return false;
            };
            TextRange::new(selection.start - c.len_utf16(), c.len_utf16())
        } else {
            selection
        };
        self.apply_edit(range, "")
    }

    /// A forward delete: deletes the selection, or the character after a
    /// caret.
    pub fn press_forward_delete(&mut self) -> bool {
        let selection = self.buffer.selection();
        let range = if selection.is_empty() {
            let text = self.buffer.text();
            let Some(c) = text.char_at(selection.start) else {
                return false;
            };
            TextRange::new(selection.start, c.len_utf16())
        } else {
            selection
        };
        self.apply_edit(range, "")
    }

    /// A user caret move.
    pub fn move_caret(&mut self, to: usize) {
        self.buffer.set_selection(TextRange::caret(to));
        self.controller.did_change_selection(&mut self.buffer);
    }

    /// A user range selection.
    pub fn select(&mut self, start: usize, len: usize) {
        self.buffer.set_selection(TextRange::new(start, len));
        self.controller.did_change_selection(&mut self.buffer);
    }
}
