//! Data exchanged with the form.
//!
//! The form lives on its own rendering context. It receives [`ViewUpdate`]
//! snapshots through an ordered channel and hands back a [`Selection`] when
//! the user presses a button.

use crate::avatar::AvatarRecord;
use crate::catalog::EffectDescriptor;
use std::sync::Arc;

/// A complete replacement for one of the form's lists.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewUpdate {
    /// Avatars in display order
    Avatars(Vec<AvatarRecord>),
    /// Selectable effects, `None` first
    Effects(Arc<Vec<EffectDescriptor>>),
}

/// Current state of the form's inputs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Selection {
    pub avatar: Option<AvatarRecord>,
    /// `None` and the id 0 sentinel both mean "no effect"
    pub effect: Option<EffectDescriptor>,
    pub keep_on_teleport: bool,
    pub keep_on_room_change: bool,
}

impl Selection {
    pub fn new(avatar: AvatarRecord, effect: EffectDescriptor) -> Self {
        Self {
            avatar: Some(avatar),
            effect: Some(effect),
            ..Self::default()
        }
    }

    pub fn keep_on_teleport(mut self, keep: bool) -> Self {
        self.keep_on_teleport = keep;
        self
    }

    pub fn keep_on_room_change(mut self, keep: bool) -> Self {
        self.keep_on_room_change = keep;
        self
    }
}
