//! Room user list maintenance.
//!
//! ## `Users` flow
//!
//! 1. Parse every entity record (strict, pets included)
//! 2. Insert the non-pet avatars into the registry, which publishes the new
//!    list to the form
//! 3. Schedule the reapplications owed to avatars with a room-change rule
//!
//! ## `UserRemove` flow
//!
//! The body is a single string holding the index as decimal text.

use crate::avatar::AvatarRecord;
use crate::dispatcher::EffectDispatcher;
use extension_api::{ExtensionError, Packet};
use habbo_protocol::{parse_entities, ProtocolError};
use tracing::debug;

impl EffectDispatcher {
    pub fn on_users(&self, packet: &Packet) -> Result<(), ExtensionError> {
        let entities = parse_entities(packet)?;
        let avatars: Vec<AvatarRecord> = entities
            .iter()
            .map(AvatarRecord::from)
            .filter(|avatar| !avatar.is_pet())
            .collect();

        let owed = self.rules.room_change_reapplications(&avatars);
        let inserted = self.registry.add_all(avatars);
        debug!(
            "👥 Users: {} entities, {} avatars registered, {} reapplications owed",
            entities.len(),
            inserted,
            owed.len()
        );

        for reapply in owed {
            self.schedule_reapply(reapply);
        }
        Ok(())
    }

    pub fn on_user_remove(&self, packet: &Packet) -> Result<(), ExtensionError> {
        let raw = packet.reader().read_string()?;
        let entity_index = raw.trim().parse::<i32>().map_err(|_| {
            ProtocolError::MalformedPacket(format!("UserRemove index '{raw}' is not an integer"))
        })?;

        match self.registry.remove_by_index(entity_index) {
            Some(avatar) => {
                debug!("👥 {} (index {}) left the room", avatar.label(), entity_index);
            }
            None => debug!("👥 UserRemove for unknown index {}", entity_index),
        }
        Ok(())
    }
}
