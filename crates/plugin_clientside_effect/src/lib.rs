//! # Clientside Effects
//!
//! An interception extension that makes any avatar effect appear on the
//! local client. Nothing is sent to the server; the client is simply told
//! that an avatar now wears an effect, and the extension keeps telling it
//! whenever the client would otherwise forget.
//!
//! ## Overview
//!
//! - **Avatar tracking**: `Users`/`UserRemove` keep a sorted list of the
//!   room's users and bots (pets are ignored)
//! - **Effect catalog**: the public effect map is fetched once at startup
//!   and offered as a selectable list, `None` first
//! - **Persistence**: per-avatar rules reapply an effect after a teleport
//!   resets it or when the avatar shows up again after a room change
//!
//! ## Persistence Rules
//!
//! | Rule        | Trigger                       | Reaction                          |
//! |-------------|-------------------------------|-----------------------------------|
//! | Teleport    | `AvatarEffect` echo differs   | resend the ruled effect at once   |
//! | Room change | avatar appears in `Users`     | resend after the configured delay |
//!
//! Rules are keyed by the avatar's stable id, so they survive the index
//! reshuffling that comes with every room load.
//!
//! ## Module Organization
//!
//! - [`avatar`] / [`registry`] - avatar records and the room list
//! - [`catalog`] - effect map download and parsing
//! - [`rules`] - teleport and room-change rule tables
//! - [`dispatcher`] / [`handlers`] - event wiring and user actions
//! - [`view`] - snapshots for the form and its selection
//! - [`config`] / [`logging`] - ambient setup

use async_trait::async_trait;
use extension_api::{
    Direction, ExtensionContext, ExtensionError, ExtensionInfo, Interceptor, LogLevel,
    SimpleExtension,
};
use std::path::Path;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

pub mod avatar;
pub mod catalog;
pub mod config;
pub mod dispatcher;
pub mod handlers;
pub mod logging;
pub mod registry;
pub mod rules;
pub mod view;


pub use avatar::AvatarRecord;
pub use catalog::{CatalogError, CatalogSource, EffectCatalog, EffectDescriptor, HttpCatalogSource};
pub use config::{ConfigError, EffectConfig};
pub use dispatcher::EffectDispatcher;
pub use registry::AvatarRegistry;
pub use rules::PersistenceRules;
pub use view::{Selection, ViewUpdate};

use dispatcher::{AVATAR_EFFECT, CLOSE_CONNECTION, OPEN_CONNECTION, USERS, USER_REMOVE};

/// The extension as loaded by the host.
///
/// The dispatcher only exists once the host has handed over its context in
/// [`register_handlers`](SimpleExtension::register_handlers); until then
/// [`dispatcher`](Self::dispatcher) returns `None`.
pub struct ClientsideEffectPlugin {
    info: ExtensionInfo,
    config: EffectConfig,
    dispatcher: Option<Arc<EffectDispatcher>>,
    view_rx: Option<mpsc::UnboundedReceiver<ViewUpdate>>,
    catalog_source: Option<Arc<dyn CatalogSource>>,
}

impl ClientsideEffectPlugin {
    pub fn new(config: EffectConfig) -> Self {
        debug!("✨ ClientsideEffectPlugin: Creating new instance");
        Self {
            info: ExtensionInfo {
                title: "Clientside Effects".to_string(),
                description: "Make any user effect appear clientside".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                author: "WiredSpast".to_string(),
            },
            config,
            dispatcher: None,
            view_rx: None,
            catalog_source: None,
        }
    }

    /// Loads and validates the configuration file, applies its logging
    /// settings, then builds the plugin.
    ///
    /// A missing file is created with defaults. When the host already
    /// installed a global subscriber, that subscriber is kept.
    pub async fn from_config_file(path: &Path) -> Result<Self, ConfigError> {
        let config = EffectConfig::load_from_file(path).await?;
        config.validate()?;

        if let Err(e) = logging::setup_logging(&config.logging) {
            debug!("🔧 Keeping the host's logging subscriber: {}", e);
        }
        Ok(Self::new(config))
    }

    /// Replaces the HTTP effect map download with another source.
    pub fn with_catalog_source(mut self, source: Arc<dyn CatalogSource>) -> Self {
        self.catalog_source = Some(source);
        self
    }

    pub fn config(&self) -> &EffectConfig {
        &self.config
    }

    /// Shared handle the form uses for its actions.
    pub fn dispatcher(&self) -> Option<Arc<EffectDispatcher>> {
        self.dispatcher.clone()
    }

    /// Takes the receiving end of the view channel. Yields `Some` once.
    pub fn view_updates(&mut self) -> Option<mpsc::UnboundedReceiver<ViewUpdate>> {
        self.view_rx.take()
    }

    fn catalog_source(&self) -> Result<Arc<dyn CatalogSource>, CatalogError> {
        if let Some(source) = &self.catalog_source {
            return Ok(Arc::clone(source));
        }
        let source = HttpCatalogSource::new(&self.config.catalog)?;
        Ok(Arc::new(source))
    }
}

impl Default for ClientsideEffectPlugin {
    fn default() -> Self {
        Self::new(EffectConfig::default())
    }
}

#[async_trait]
impl SimpleExtension for ClientsideEffectPlugin {
    fn info(&self) -> &ExtensionInfo {
        &self.info
    }

    async fn register_handlers(
        &mut self,
        interceptor: Arc<Interceptor>,
        context: Arc<dyn ExtensionContext>,
    ) -> Result<(), ExtensionError> {
        debug!("✨ ClientsideEffectPlugin: Registering handlers...");

        // Handlers may later be called from a host thread outside the runtime
        let runtime = Handle::try_current().map_err(|e| {
            ExtensionError::InitializationFailed(format!("no tokio runtime to schedule effects on: {e}"))
        })?;
        let (dispatcher, view_rx) =
            EffectDispatcher::new(Arc::clone(&context), &self.config.persistence, runtime);
        let dispatcher = Arc::new(dispatcher);

        let d = Arc::clone(&dispatcher);
        interceptor.intercept(Direction::ToClient, OPEN_CONNECTION, move |_| {
            d.on_connection_open();
            Ok(())
        });

        let d = Arc::clone(&dispatcher);
        interceptor.intercept(Direction::ToClient, CLOSE_CONNECTION, move |_| {
            d.on_connection_close();
            Ok(())
        });

        let d = Arc::clone(&dispatcher);
        interceptor.intercept(Direction::ToClient, USERS, move |message| d.on_users(&message.packet));

        let d = Arc::clone(&dispatcher);
        interceptor.intercept(Direction::ToClient, USER_REMOVE, move |message| {
            d.on_user_remove(&message.packet)
        });

        let d = Arc::clone(&dispatcher);
        interceptor.intercept(Direction::ToClient, AVATAR_EFFECT, move |message| {
            d.on_avatar_effect(&message.packet)
        });

        self.dispatcher = Some(dispatcher);
        self.view_rx = Some(view_rx);

        context.log(LogLevel::Info, "✨ ClientsideEffectPlugin: Handlers registered");
        Ok(())
    }

    async fn on_init(&mut self, context: Arc<dyn ExtensionContext>) -> Result<(), ExtensionError> {
        let dispatcher = self.dispatcher.clone().ok_or_else(|| {
            ExtensionError::InitializationFailed("handlers were never registered".to_string())
        })?;

        let source = match self.catalog_source() {
            Ok(source) => source,
            Err(e) => {
                warn!("✨ Effect catalog disabled: {}", e);
                dispatcher.publish_effects();
                return Ok(());
            }
        };

        let notification = self.config.notification.clone();
        let runtime = dispatcher.runtime().clone();
        runtime.spawn(async move {
            dispatcher.load_catalog(source.as_ref(), &notification).await;
        });

        context.log(LogLevel::Info, "✨ ClientsideEffectPlugin: Ready");
        Ok(())
    }

    async fn on_shutdown(&mut self, context: Arc<dyn ExtensionContext>) -> Result<(), ExtensionError> {
        if let Some(dispatcher) = &self.dispatcher {
            let rules = dispatcher.rules();
            info!(
                "✨ Shutting down with {} avatars, {} teleport rules, {} room-change rules",
                dispatcher.registry().len(),
                rules.teleport_len(),
                rules.room_change_len()
            );
            dispatcher.registry().reset();
        }

        context.log(LogLevel::Info, "✨ ClientsideEffectPlugin: Shut down");
        Ok(())
    }
}
