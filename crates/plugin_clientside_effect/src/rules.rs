//! # Persistence Rules Engine
//!
//! Standing instructions to reapply an effect without user action. Rules are
//! keyed by the stable entity id, never by the room index, so they survive
//! room changes and stay inert while their avatar is elsewhere.
//!
//! Two independent tables exist:
//! - **teleport**: reassert the effect when the client echoes a different one
//! - **room change**: reapply the effect shortly after a user list introduces
//!   the avatar
//!
//! The engine only decides. Sending and scheduling belong to the dispatcher.

use crate::avatar::AvatarRecord;
use crate::catalog::EffectDescriptor;
use dashmap::DashMap;
use tracing::debug;

/// An owned (index, effect) pair captured when a reapplication is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledReapply {
    pub entity_index: i32,
    pub effect_id: i32,
}

/// The two rule tables.
#[derive(Debug, Default)]
pub struct PersistenceRules {
    teleport: DashMap<i32, EffectDescriptor>,
    room_change: DashMap<i32, EffectDescriptor>,
}

impl PersistenceRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Updates both tables after the user sets an effect on an avatar.
    ///
    /// Selecting "None" clears both rules whatever the checkboxes say.
    /// Otherwise each checkbox installs or removes its own rule.
    pub fn apply_selection(
        &self,
        entity_id: i32,
        effect: &EffectDescriptor,
        keep_on_teleport: bool,
        keep_on_room_change: bool,
    ) {
        if effect.is_none() {
            self.teleport.remove(&entity_id);
            self.room_change.remove(&entity_id);
            debug!("📌 Cleared persistence rules for entity {}", entity_id);
            return;
        }

        if keep_on_teleport {
            self.teleport.insert(entity_id, effect.clone());
        } else {
            self.teleport.remove(&entity_id);
        }

        if keep_on_room_change {
            self.room_change.insert(entity_id, effect.clone());
        } else {
            self.room_change.remove(&entity_id);
        }

        debug!(
            "📌 Entity {} effect {} (teleport: {}, room change: {})",
            entity_id, effect.effect_id, keep_on_teleport, keep_on_room_change
        );
    }

    pub fn teleport_rule(&self, entity_id: i32) -> Option<EffectDescriptor> {
        self.teleport.get(&entity_id).map(|rule| rule.value().clone())
    }

    pub fn room_change_rule(&self, entity_id: i32) -> Option<EffectDescriptor> {
        self.room_change.get(&entity_id).map(|rule| rule.value().clone())
    }

    /// Effect to reassert after the client echoed `echoed_effect_id`, if the
    /// avatar has a teleport rule that disagrees with it.
    pub fn teleport_reassertion(&self, avatar: &AvatarRecord, echoed_effect_id: i32) -> Option<ScheduledReapply> {
        let rule = self.teleport.get(&avatar.entity_id)?;
        if rule.effect_id == echoed_effect_id {
            return None;
        }
        Some(ScheduledReapply {
            entity_index: avatar.entity_index,
            effect_id: rule.effect_id,
        })
    }

    /// Reapplications owed to avatars that just appeared in a user list.
    pub fn room_change_reapplications(&self, avatars: &[AvatarRecord]) -> Vec<ScheduledReapply> {
        avatars
            .iter()
            .filter_map(|avatar| {
                self.room_change.get(&avatar.entity_id).map(|rule| ScheduledReapply {
                    entity_index: avatar.entity_index,
                    effect_id: rule.effect_id,
                })
            })
            .collect()
    }

    /// Empties both tables.
    pub fn clear_all(&self) {
        self.teleport.clear();
        self.room_change.clear();
    }

    pub fn teleport_len(&self) -> usize {
        self.teleport.len()
    }

    pub fn room_change_len(&self) -> usize {
        self.room_change.len()
    }

    pub fn is_empty(&self) -> bool {
        self.teleport.is_empty() && self.room_change.is_empty()
    }
}
