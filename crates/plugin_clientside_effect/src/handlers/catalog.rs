//! Catalog loading and the ready notification.
//!
//! Runs on its own task, away from the event-delivery context. Whatever the
//! outcome the form gets an effect list; only success is announced in game.

use crate::catalog::CatalogSource;
use crate::config::NotificationSettings;
use crate::dispatcher::EffectDispatcher;
use extension_api::{ExtensionError, PacketValue};
use tracing::{debug, error};

/// Bubble notification message name.
pub const NOTIFICATION_DIALOG: &str = "NotificationDialog";

impl EffectDispatcher {
    /// Loads the catalog, publishes it and announces success.
    ///
    /// Returns whether the load succeeded. Failures are already logged by
    /// the catalog and are never fatal.
    pub async fn load_catalog(&self, source: &dyn CatalogSource, notification: &NotificationSettings) -> bool {
        let loaded = self.catalog.load(source).await.is_ok();
        self.publish_effects();

        if loaded && notification.enabled {
            if let Err(e) = self.notify_catalog_ready(notification) {
                error!("💬 Failed to send catalog notification: {}", e);
            }
        }
        loaded
    }

    /// Sends the bubble: an empty type, then display/message/image pairs.
    pub(crate) fn notify_catalog_ready(&self, notification: &NotificationSettings) -> Result<(), ExtensionError> {
        let mut pairs = vec![("display", "BUBBLE"), ("message", notification.message.as_str())];
        if !notification.image_url.is_empty() {
            pairs.push(("image", notification.image_url.as_str()));
        }

        let mut values = vec![PacketValue::from(""), PacketValue::Int(pairs.len() as i32)];
        for (key, value) in pairs {
            values.push(PacketValue::from(key));
            values.push(PacketValue::from(value));
        }

        self.context.send_to_client(NOTIFICATION_DIALOG, &values)?;
        debug!("💬 Catalog notification sent");
        Ok(())
    }
}
