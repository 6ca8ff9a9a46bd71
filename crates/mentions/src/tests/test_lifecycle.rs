// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::Mention;

use crate::tests::testutils_buffer::{tb, tx};
use crate::tests::testutils_driver::{
    directory_data_source, recording_observer, test_config, user, TestHarness,
};
use crate::text_buffer::TextBuffer;
use crate::{MentionDataSource, TextRange};

fn trimmable_data_source(entries: Vec<Mention>) -> MentionDataSource {
    let (data_source, _) = directory_data_source(entries);
    data_source.with_entity_can_be_trimmed(|_| true)
}

/// A harness around a buffer already holding one committed mention.
fn harness_with_mention(
    data_source: MentionDataSource,
    text: &str,
    mention: Mention,
    range: TextRange,
) -> TestHarness {
    let mut h = TestHarness::new(test_config(), data_source).with_buffer(tb(text));
    h.controller.add_mention(&mut h.buffer, mention, range);
    h.buffer.explicitly_assert_invariants();
    h
}

#[test]
fn backspace_gesture_arms_selects_and_trims() {
    let data_source = trimmable_data_source(vec![]);
    let (observer, events) = recording_observer();
    let mut h = harness_with_mention(
        data_source,
        "John Smith|",
        user("u1", "John Smith"),
        TextRange::new(0, 10),
    );
    h.controller.set_observer(observer);

    // First backspace: armed, nothing visible changes.
    assert!(!h.press_backspace());
    assert_eq!(tx(&h.buffer), "<mention:u1>John Smith</mention>|");

    // Second backspace: the whole run is selected and highlighted.
    assert!(!h.press_backspace());
    assert_eq!(
        tx(&h.buffer),
        "{<mention:u1 highlighted>John Smith</mention>}|"
    );

    // Third backspace: the mention is trimmed to its first word.
    assert!(!h.press_backspace());
    assert_eq!(tx(&h.buffer), "<mention:u1>John</mention>|");
    assert!(events.borrow().contains(&"trimmed:u1@0".to_string()));
    h.buffer.explicitly_assert_invariants();
}

#[test]
fn trimming_an_already_trimmed_mention_deletes_it() {
    let data_source = trimmable_data_source(vec![]);
    let (observer, events) = recording_observer();
    let mut h = harness_with_mention(
        data_source,
        "John|",
        user("u1", "John"),
        TextRange::new(0, 4),
    );
    h.controller.set_observer(observer);

    h.press_backspace();
    h.press_backspace();
    h.press_backspace();

    assert_eq!(tx(&h.buffer), "|");
    assert!(events.borrow().contains(&"deleted:u1@0".to_string()));
}

#[test]
fn mentions_are_never_trimmed_without_the_capability() {
    let (data_source, _) = directory_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "John Smith|",
        user("u1", "John Smith"),
        TextRange::new(0, 10),
    );

    h.press_backspace();
    h.press_backspace();
    h.press_backspace();

    assert_eq!(tx(&h.buffer), "|");
}

#[test]
fn caret_move_disarms_the_gesture() {
    let (data_source, _) = directory_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "hi Alice|",
        user("u1", "Alice"),
        TextRange::new(3, 5),
    );

    assert!(!h.press_backspace());
    h.move_caret(0);
    h.move_caret(8);

    // The gesture restarts from the armed step, so the run survives two
    // more backspaces.
    assert!(!h.press_backspace());
    assert!(!h.press_backspace());
    assert_eq!(
        tx(&h.buffer),
        "hi {<mention:u1 highlighted>Alice</mention>}|"
    );
}

#[test]
fn caret_move_deselects_a_selected_mention() {
    let (data_source, _) = directory_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "hi Alice|",
        user("u1", "Alice"),
        TextRange::new(3, 5),
    );

    h.press_backspace();
    h.press_backspace();
    assert!(tx(&h.buffer).contains("highlighted"));

    h.move_caret(0);
    assert_eq!(tx(&h.buffer), "|hi <mention:u1>Alice</mention>");
}

#[test]
fn typing_over_a_selected_mention_replaces_it() {
    let (data_source, _) = directory_data_source(vec![]);
    let (observer, events) = recording_observer();
    let mut h = harness_with_mention(
        data_source,
        "hi Alice|",
        user("u1", "Alice"),
        TextRange::new(3, 5),
    );
    h.controller.set_observer(observer);

    h.press_backspace();
    h.press_backspace();
    h.type_str("B");

    assert_eq!(tx(&h.buffer), "hi B|");
    assert!(events.borrow().contains(&"deleted:u1@3".to_string()));
}

#[test]
fn insertion_inside_a_mention_bleaches_it() {
    let (data_source, _) = directory_data_source(vec![]);
    let (observer, events) = recording_observer();
    let mut h = harness_with_mention(
        data_source,
        "Austin|",
        user("u1", "Austin"),
        TextRange::new(0, 6),
    );
    h.controller.set_observer(observer);

    h.move_caret(3);
    h.type_str("z");

    assert_eq!(tx(&h.buffer), "Ausz|in");
    assert!(h.buffer.mention_spans().is_empty());
    assert!(events.borrow().contains(&"deleted:u1@0".to_string()));
}

#[test]
fn deletion_inside_a_mention_bleaches_it() {
    let (data_source, _) = directory_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "Austin|",
        user("u1", "Austin"),
        TextRange::new(0, 6),
    );

    h.move_caret(3);
    h.press_backspace();

    assert_eq!(tx(&h.buffer), "Au|tin");
    assert!(h.buffer.mention_spans().is_empty());
}

#[test]
fn deleting_a_manually_selected_mention_removes_it() {
    let (data_source, _) = directory_data_source(vec![]);
    let (observer, events) = recording_observer();
    let mut h = harness_with_mention(
        data_source,
        "hi Alice!|",
        user("u1", "Alice"),
        TextRange::new(3, 5),
    );
    h.controller.set_observer(observer);

    h.select(3, 5);
    h.press_backspace();

    assert_eq!(tx(&h.buffer), "hi |!");
    assert!(events.borrow().contains(&"deleted:u1@3".to_string()));
}

#[test]
fn forward_delete_at_the_left_edge_arms_the_gesture() {
    let (data_source, _) = directory_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "|Alice here",
        user("u1", "Alice"),
        TextRange::new(0, 5),
    );

    assert!(!h.press_forward_delete());
    assert_eq!(tx(&h.buffer), "|Alice here");
    assert!(!h.press_forward_delete());
    assert_eq!(tx(&h.buffer), "{<mention:u1 highlighted>Alice</mention>}| here");
}

#[test]
fn losing_focus_deselects_without_edits() {
    let (data_source, _) = directory_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "hi Alice|",
        user("u1", "Alice"),
        TextRange::new(3, 5),
    );

    h.press_backspace();
    h.press_backspace();
    assert!(tx(&h.buffer).contains("highlighted"));

    h.controller.editor_will_lose_focus(&mut h.buffer);
    h.controller.editor_did_lose_focus();

    assert!(!tx(&h.buffer).contains("highlighted"));
    assert_eq!(tx(&h.buffer), "hi {<mention:u1>Alice</mention>}|");
}

#[test]
fn gesture_operates_on_the_run_not_a_prepended_literal() {
    let data_source = trimmable_data_source(vec![]);
    let mut h = harness_with_mention(
        data_source,
        "@John Smith|",
        user("u1", "John Smith"),
        TextRange::new(1, 10),
    );

    h.press_backspace();
    h.press_backspace();
    h.press_backspace();

    // The literal "@" outside the run is untouched by the trim.
    assert_eq!(tx(&h.buffer), "@<mention:u1>John</mention>|");
}
