//! # Effect Dispatcher
//!
//! The single integration point between the host and the plugin state. The
//! per-message logic lives in [`crate::handlers`]; this module owns the
//! shared state and the outbound plumbing they use.
//!
//! ## Contexts
//!
//! Handlers run on the host's event-delivery context. They mutate the
//! registry and rule tables directly, send packets fire-and-forget and hand
//! UI-visible results to the rendering context as snapshots over an
//! unbounded channel, so nothing here ever waits on the form.
//!
//! The host may deliver events from a thread that is not part of any tokio
//! runtime. Timers are therefore spawned on the runtime handle captured when
//! the dispatcher was built, never on whatever runtime the caller happens to
//! be in.

use crate::avatar::AvatarRecord;
use crate::catalog::EffectCatalog;
use crate::config::PersistenceSettings;
use crate::registry::AvatarRegistry;
use crate::rules::{PersistenceRules, ScheduledReapply};
use crate::view::ViewUpdate;
use extension_api::{ExtensionContext, ExtensionError, PacketValue};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, error};

/// Name of the message that shows or clears an effect on an avatar.
pub const AVATAR_EFFECT: &str = "AvatarEffect";
pub const OPEN_CONNECTION: &str = "OpenConnection";
pub const CLOSE_CONNECTION: &str = "CloseConnection";
pub const USERS: &str = "Users";
pub const USER_REMOVE: &str = "UserRemove";

/// Wires intercepted events to the registry, rules and catalog.
#[derive(Debug)]
pub struct EffectDispatcher {
    pub(crate) registry: Arc<AvatarRegistry>,
    pub(crate) rules: Arc<PersistenceRules>,
    pub(crate) catalog: Arc<EffectCatalog>,
    pub(crate) context: Arc<dyn ExtensionContext>,
    view_tx: mpsc::UnboundedSender<ViewUpdate>,
    runtime: Handle,
    reapply_delay: Duration,
}

impl EffectDispatcher {
    /// Creates a dispatcher and the receiving end of its view channel.
    ///
    /// Every registry change is published from inside the registry's write
    /// lock, so snapshots reach the form in the order the changes happened.
    pub fn new(
        context: Arc<dyn ExtensionContext>,
        settings: &PersistenceSettings,
        runtime: Handle,
    ) -> (Self, mpsc::UnboundedReceiver<ViewUpdate>) {
        let (view_tx, view_rx) = mpsc::unbounded_channel();

        let avatars_tx = view_tx.clone();
        let registry = AvatarRegistry::with_listener(move |avatars: &[AvatarRecord]| {
            if avatars_tx.send(ViewUpdate::Avatars(avatars.to_vec())).is_err() {
                debug!("🎨 No form attached, avatar update discarded");
            }
        });

        let dispatcher = Self {
            registry: Arc::new(registry),
            rules: Arc::new(PersistenceRules::new()),
            catalog: Arc::new(EffectCatalog::new()),
            context,
            view_tx,
            runtime,
            reapply_delay: Duration::from_millis(settings.room_change_delay_ms),
        };
        (dispatcher, view_rx)
    }

    /// Runtime that owns the dispatcher's timers and background tasks.
    pub fn runtime(&self) -> &Handle {
        &self.runtime
    }

    pub fn registry(&self) -> &AvatarRegistry {
        &self.registry
    }

    pub fn rules(&self) -> &PersistenceRules {
        &self.rules
    }

    pub fn catalog(&self) -> &EffectCatalog {
        &self.catalog
    }

    /// Hands the current effect list to the form.
    pub(crate) fn publish_effects(&self) {
        if self.view_tx.send(ViewUpdate::Effects(self.catalog.effects())).is_err() {
            debug!("🎨 No form attached, effect update discarded");
        }
    }

    /// Sends `AvatarEffect(index, effect, 0)` to the client.
    pub(crate) fn send_effect(&self, entity_index: i32, effect_id: i32) -> Result<(), ExtensionError> {
        self.context.send_to_client(
            AVATAR_EFFECT,
            &[
                PacketValue::Int(entity_index),
                PacketValue::Int(effect_id),
                PacketValue::Int(0),
            ],
        )
    }

    /// Sends the effect once the room-change delay has passed.
    ///
    /// The task owns its copy of the pair, so later registry changes cannot
    /// redirect it.
    pub(crate) fn schedule_reapply(&self, reapply: ScheduledReapply) {
        let context = Arc::clone(&self.context);
        let delay = self.reapply_delay;
        self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let values = [
                PacketValue::Int(reapply.entity_index),
                PacketValue::Int(reapply.effect_id),
                PacketValue::Int(0),
            ];
            match context.send_to_client(AVATAR_EFFECT, &values) {
                Ok(()) => debug!(
                    "⏱️ Reapplied effect {} on index {} after room change",
                    reapply.effect_id, reapply.entity_index
                ),
                Err(e) => error!("⏱️ Failed to reapply effect after room change: {}", e),
            }
        });
    }
}
