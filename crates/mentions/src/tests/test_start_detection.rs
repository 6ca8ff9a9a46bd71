// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use std::collections::HashSet;

use crate::tests::testutils_buffer::tb;
use crate::tests::testutils_driver::{
    directory_data_source, test_config, user, TestHarness,
};
use crate::text_buffer::TextBuffer;
use crate::{PluginState, SearchType, TextRange};

#[test]
fn explicit_start_at_buffer_start_fires_with_empty_prefix() {
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(test_config(), data_source);

    h.type_str("@");

    assert_eq!(h.controller.state(), PluginState::CreatingMention);
    let queries = queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].key_string, "");
    assert_eq!(queries[0].search_type, SearchType::Explicit);
    assert_eq!(queries[0].control_character, Some('@'));
    assert_eq!(queries[0].anchor_location, 0);
    assert_eq!(queries[0].generation, 1);
}

#[test]
fn control_char_typed_inside_a_word_does_not_start() {
    let config = crate::MentionsConfig {
        implicit_search_length: 0,
        ..test_config()
    };
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(config, data_source);

    h.type_str("user@");

    assert_eq!(h.controller.state(), PluginState::Quiescent);
    assert!(queries.borrow().is_empty());
}

#[test]
fn implicit_start_fires_at_the_configured_length() {
    // Implicit-only setup: three-character threshold, no control characters.
    let config = crate::MentionsConfig {
        control_characters: HashSet::new(),
        ..test_config()
    };
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(config, data_source).with_buffer(tb("hi |"));

    h.type_str("aus");

    assert_eq!(h.controller.state(), PluginState::CreatingMention);
    let queries = queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].key_string, "aus");
    assert_eq!(queries[0].search_type, SearchType::Implicit);
    assert_eq!(queries[0].control_character, None);
    assert_eq!(queries[0].anchor_location, 3);
}

#[test]
fn short_words_do_not_start_an_implicit_mention() {
    let config = crate::MentionsConfig {
        control_characters: HashSet::new(),
        implicit_search_length: 4,
        ..test_config()
    };
    let (data_source, queries) = directory_data_source(vec![]);
    let mut h = TestHarness::new(config, data_source);

    h.type_str("aus ");

    assert_eq!(h.controller.state(), PluginState::Quiescent);
    assert!(queries.borrow().is_empty());
}

#[test]
fn implicit_mentions_disabled_by_zero_length() {
    let config = crate::MentionsConfig {
        control_characters: HashSet::new(),
        implicit_search_length: 0,
        ..test_config()
    };
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(config, data_source);

    h.type_str("austin");

    assert_eq!(h.controller.state(), PluginState::Quiescent);
    assert!(queries.borrow().is_empty());
}

#[test]
fn cursor_move_resets_a_partial_implicit_run() {
    let config = crate::MentionsConfig {
        control_characters: HashSet::new(),
        ..test_config()
    };
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(config, data_source);

    h.type_str("au");
    h.move_caret(0);
    h.move_caret(2);
    h.type_str("s");

    assert_eq!(h.controller.state(), PluginState::Quiescent);
    assert!(queries.borrow().is_empty());
}

#[test]
fn pasted_control_char_at_word_boundary_starts_creation() {
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(test_config(), data_source);

    h.paste("hello @au");

    assert_eq!(h.controller.state(), PluginState::CreatingMention);
    let queries = queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].key_string, "au");
    assert_eq!(queries[0].anchor_location, 6);
}

#[test]
fn backspace_into_a_word_of_search_length_refires() {
    let config = crate::MentionsConfig {
        control_characters: HashSet::new(),
        ..test_config()
    };
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(config, data_source).with_buffer(tb("hi |"));

    // The fourth character makes the query "auss", which matches nothing
    // and cancels the session.
    h.type_str("auss");
    assert_eq!(h.controller.state(), PluginState::Quiescent);

    h.press_backspace();

    assert_eq!(h.controller.state(), PluginState::CreatingMention);
    let queries = queries.borrow();
    assert_eq!(queries.last().unwrap().key_string, "aus");
    assert_eq!(queries.last().unwrap().anchor_location, 3);
}

#[test]
fn typing_before_existing_word_seeds_the_query_with_it() {
    let (data_source, queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(test_config(), data_source).with_buffer(tb("|aus"));

    h.type_str("@");

    let queries = queries.borrow();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].key_string, "aus");
    assert_eq!(queries[0].control_character, Some('@'));
    assert_eq!(queries[0].anchor_location, 0);
}

#[test]
fn programmatic_replacement_reprimes_from_trailing_context() {
    let (data_source, _queries) = directory_data_source(vec![user("u1", "Austin")]);
    let mut h = TestHarness::new(test_config(), data_source);

    h.type_str("@au");
    assert_eq!(h.controller.state(), PluginState::CreatingMention);

    h.buffer = tb("fresh text|");
    h.controller.did_replace_whole_text(&mut h.buffer);

    assert_eq!(h.controller.state(), PluginState::Quiescent);
    assert_eq!(h.buffer.selection(), TextRange::caret(10));
}
