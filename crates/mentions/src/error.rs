// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use thiserror::Error;

/// Failures the controller can encounter. None of these cross the public
/// surface as panics; apart from [`MentionsError::UnsupportedChooserProtocol`]
/// (returned from chooser attachment) they are handled locally and logged.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum MentionsError {
    /// An `add_mention` call whose declared range or text does not match the
    /// buffer. The mention is dropped.
    #[error("mention range or text does not match the buffer")]
    InvalidMentionInsertion,

    /// A query result arrived for a generation that is no longer current.
    /// The result is discarded.
    #[error("query result arrived for a stale generation")]
    StaleQueryResult,

    /// The data source kept calling its completion after delivering a final
    /// batch. The extra batches are ignored.
    #[error("data source delivered results after the final batch")]
    DelegateContractViolation,

    /// The ignore stack was popped without a matching push. The depth is
    /// clamped to zero.
    #[error("ignore stack popped without a matching push")]
    IgnoreStackUnderflow,

    /// The chooser callbacks carry neither of the two data paths, so the
    /// controller has no way to present results. Attachment is refused.
    #[error("chooser advertises neither a reload nor a model-update path")]
    UnsupportedChooserProtocol,
}
