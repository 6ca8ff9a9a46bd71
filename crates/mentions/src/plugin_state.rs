// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use strum_macros::Display;

/// The externally observable state of the mentions controller. Reported to
/// the host through [`crate::StateChangeObserver::state_changed`].
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum PluginState {
    /// Watching the buffer for a mention start.
    Quiescent,
    /// A mention attempt is in progress: a query is live and the chooser may
    /// be showing.
    CreatingMention,
}
