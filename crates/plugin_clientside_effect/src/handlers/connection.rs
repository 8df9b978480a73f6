//! Connection lifecycle.
//!
//! A new or closed connection means every room index is meaningless, so the
//! avatar list is dropped wholesale. Persistence rules are keyed by stable
//! ids and survive.

use crate::dispatcher::EffectDispatcher;
use tracing::debug;

impl EffectDispatcher {
    pub fn on_connection_open(&self) {
        debug!("🔗 Connection opened, resetting avatars");
        self.registry.reset();
    }

    pub fn on_connection_close(&self) {
        debug!("🔗 Connection closed, resetting avatars");
        self.registry.reset();
    }
}
