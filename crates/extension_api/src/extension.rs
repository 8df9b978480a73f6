//! # Extension Lifecycle
//!
//! 1. **Creation** - the extension instance is built by the host
//! 2. **Handler registration** - `register_handlers()` subscribes to messages
//! 3. **Initialization** - `on_init()` starts background work
//! 4. **Operation** - intercepted packets flow through the [`Interceptor`]
//! 5. **Shutdown** - `on_shutdown()` releases state
//!
//! Registration always completes before initialization, so an extension
//! never misses packets because a slow startup task is still running.

use crate::context::ExtensionContext;
use crate::error::ExtensionError;
use crate::interceptor::Interceptor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Metadata the host shows in its extension list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtensionInfo {
    pub title: String,
    pub description: String,
    pub version: String,
    pub author: String,
}

/// Safe, high-level extension interface.
#[async_trait]
pub trait SimpleExtension: Send + Sync + 'static {
    /// Metadata shown by the host.
    fn info(&self) -> &ExtensionInfo;

    fn name(&self) -> &str {
        &self.info().title
    }

    fn version(&self) -> &str {
        &self.info().version
    }

    /// Subscribes to intercepted messages.
    ///
    /// Called once, before [`on_init`](Self::on_init).
    async fn register_handlers(
        &mut self,
        interceptor: Arc<Interceptor>,
        context: Arc<dyn ExtensionContext>,
    ) -> Result<(), ExtensionError>;

    /// Starts background work once handlers are live.
    async fn on_init(&mut self, _context: Arc<dyn ExtensionContext>) -> Result<(), ExtensionError> {
        Ok(())
    }

    /// Releases state when the host unloads the extension.
    async fn on_shutdown(&mut self, _context: Arc<dyn ExtensionContext>) -> Result<(), ExtensionError> {
        Ok(())
    }
}

/// Runs registration followed by initialization, the order the host uses.
pub async fn activate<E: SimpleExtension>(
    extension: &mut E,
    interceptor: Arc<Interceptor>,
    context: Arc<dyn ExtensionContext>,
) -> Result<(), ExtensionError> {
    debug!("🔌 Registering handlers for extension '{}'", extension.name());
    extension
        .register_handlers(Arc::clone(&interceptor), Arc::clone(&context))
        .await?;

    extension.on_init(context).await?;
    info!(
        "🔌 Extension '{}' v{} active with {} handlers",
        extension.name(),
        extension.version(),
        interceptor.handler_count()
    );
    Ok(())
}
