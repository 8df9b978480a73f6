//! Effect echoes and the form's actions.
//!
//! ## Teleport reassertion
//!
//! The client echoes `AvatarEffect(index, effect, delay)` whenever an
//! avatar's effect changes, including when a teleport animation silently
//! resets it. If the avatar has a teleport rule and the echo disagrees, the
//! ruled effect is sent again immediately.
//!
//! ## Actions
//!
//! - `set_effect` applies the selected effect and updates both rule tables
//! - `clear_all` forgets every rule and strips the effect from every avatar

use crate::catalog::{EffectDescriptor, NO_EFFECT};
use crate::dispatcher::EffectDispatcher;
use crate::view::Selection;
use extension_api::{ExtensionError, Packet};
use tracing::{debug, error, info};

impl EffectDispatcher {
    pub fn on_avatar_effect(&self, packet: &Packet) -> Result<(), ExtensionError> {
        let mut reader = packet.reader();
        let entity_index = reader.read_int()?;
        let effect_id = reader.read_int()?;
        let _delay = reader.read_int()?;

        let Some(avatar) = self.registry.find_by_index(entity_index) else {
            return Ok(());
        };

        if let Some(reapply) = self.rules.teleport_reassertion(&avatar, effect_id) {
            debug!(
                "🌀 {} echoed effect {}, reasserting {}",
                avatar.label(),
                effect_id,
                reapply.effect_id
            );
            self.send_effect(reapply.entity_index, reapply.effect_id)?;
        }
        Ok(())
    }

    /// Applies the form's selection. Returns `false` when no avatar was
    /// selected, in which case nothing happens.
    pub fn set_effect(&self, selection: &Selection) -> Result<bool, ExtensionError> {
        let Some(avatar) = &selection.avatar else {
            debug!("🌀 Set pressed without a selected avatar, ignoring");
            return Ok(false);
        };

        let effect = selection
            .effect
            .clone()
            .unwrap_or_else(EffectDescriptor::none);

        self.send_effect(avatar.entity_index, effect.effect_id)?;
        self.rules.apply_selection(
            avatar.entity_id,
            &effect,
            selection.keep_on_teleport,
            selection.keep_on_room_change,
        );

        info!("🌀 Effect '{}' set on {}", effect.label, avatar.label());
        Ok(true)
    }

    /// Drops every rule and clears the effect on every registered avatar.
    /// Returns how many clear packets were sent.
    pub fn clear_all(&self) -> usize {
        self.rules.clear_all();

        let mut sent = 0;
        for avatar in self.registry.all() {
            match self.send_effect(avatar.entity_index, NO_EFFECT) {
                Ok(()) => sent += 1,
                Err(e) => error!("🌀 Failed to clear effect on {}: {}", avatar.label(), e),
            }
        }

        info!("🌀 Cleared all effects ({} avatars)", sent);
        sent
    }
}
