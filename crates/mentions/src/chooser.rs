// Copyright 2024 New Vector Ltd.
// Copyright 2023 The Matrix.org Foundation C.I.C.
//
// SPDX-License-Identifier: AGPL-3.0-only OR LicenseRef-Element-Commercial
// Please see LICENSE in the repository root for full details.

use mention_entities::Mention;
use strum_macros::{Display, EnumIter};

use crate::MentionsError;

/// Supported modes for positioning the chooser view.
///
/// The `Enclosed*` modes place the chooser inline within the editor and lock
/// the single-line viewport to the named edge. The `CustomLock*` modes
/// require the host to supply a frame and lock the viewport; `CustomNoLock*`
/// modes require a host frame and never lock. Arrow variants only describe
/// the chrome the host should draw.
#[derive(Clone, Copy, Debug, Display, EnumIter, PartialEq, Eq)]
pub enum ChooserPositionMode {
    EnclosedTop,
    EnclosedBottom,
    CustomLockTopArrowPointingUp,
    CustomLockTopArrowPointingDown,
    CustomLockTopNoArrow,
    CustomLockBottomArrowPointingUp,
    CustomLockBottomArrowPointingDown,
    CustomLockBottomNoArrow,
    CustomNoLockArrowPointingUp,
    CustomNoLockArrowPointingDown,
    CustomNoLockNoArrow,
}

impl ChooserPositionMode {
    /// Whether the chooser is attached within the editor itself, rather
    /// than to a host-supplied frame.
    pub fn is_enclosed(&self) -> bool {
        matches!(self, Self::EnclosedTop | Self::EnclosedBottom)
    }

    /// Whether the host should lock the editor to its single-line viewport
    /// while the chooser is visible.
    pub fn locks_viewport(&self) -> bool {
        !matches!(
            self,
            Self::CustomNoLockArrowPointingUp
                | Self::CustomNoLockArrowPointingDown
                | Self::CustomNoLockNoArrow
        )
    }
}

/// The narrow surface the controller drives a chooser view through.
///
/// The two optional data paths mirror the two chooser protocol variants: a
/// list-backed chooser takes `reload_data` and pulls rows back through the
/// controller's model API; a fully custom chooser takes `model_updated` and
/// receives the result set pushed. At least one of the two must be present
/// or attachment is refused.
pub struct ChooserCallbacks {
    /// Ask a list-backed chooser to reload from the controller's model API.
    pub reload_data: Option<Box<dyn FnMut()>>,

    /// Push the current result set to a custom chooser.
    pub model_updated: Option<Box<dyn FnMut(&[Mention])>>,

    /// Show the chooser.
    pub become_visible: Box<dyn FnMut()>,

    /// Hide the chooser and reset its scroll position to the top.
    pub reset_scroll_position_and_hide: Box<dyn FnMut()>,

    /// Move the insertion-point marker to an x position, for choosers that
    /// draw one.
    pub move_insertion_point_marker: Option<Box<dyn FnMut(f64)>>,
}

impl ChooserCallbacks {
    pub fn new(
        become_visible: impl FnMut() + 'static,
        reset_scroll_position_and_hide: impl FnMut() + 'static,
    ) -> Self {
        Self {
            reload_data: None,
            model_updated: None,
            become_visible: Box::new(become_visible),
            reset_scroll_position_and_hide: Box::new(reset_scroll_position_and_hide),
            move_insertion_point_marker: None,
        }
    }

    pub fn with_reload_data(mut self, reload_data: impl FnMut() + 'static) -> Self {
        self.reload_data = Some(Box::new(reload_data));
        self
    }

    pub fn with_model_updated(
        mut self,
        model_updated: impl FnMut(&[Mention]) + 'static,
    ) -> Self {
        self.model_updated = Some(Box::new(model_updated));
        self
    }

    pub fn with_insertion_point_marker(
        mut self,
        move_marker: impl FnMut(f64) + 'static,
    ) -> Self {
        self.move_insertion_point_marker = Some(Box::new(move_marker));
        self
    }

    /// Reject callback records that advertise neither data path.
    pub(crate) fn validate(&self) -> Result<(), MentionsError> {
        if self.reload_data.is_none() && self.model_updated.is_none() {
            Err(MentionsError::UnsupportedChooserProtocol)
        } else {
            Ok(())
        }
    }

    pub(crate) fn reload(&mut self, results: &[Mention]) {
        if let Some(reload_data) = &mut self.reload_data {
            reload_data();
        }
        if let Some(model_updated) = &mut self.model_updated {
            model_updated(results);
        }
    }

    pub(crate) fn show(&mut self) {
        (self.become_visible)();
    }

    pub(crate) fn hide(&mut self) {
        (self.reset_scroll_position_and_hide)();
    }
}

impl std::fmt::Debug for ChooserCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChooserCallbacks")
            .field("reload_data", &self.reload_data.is_some())
            .field("model_updated", &self.model_updated.is_some())
            .field(
                "move_insertion_point_marker",
                &self.move_insertion_point_marker.is_some(),
            )
            .finish()
    }
}
