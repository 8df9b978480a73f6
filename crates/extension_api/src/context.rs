//! # Extension Context Interface
//!
//! The context is the bridge between extension code and the host proxy. The
//! host owns the game connection; an extension only ever talks to it through
//! this trait.
//!
//! ## Services
//!
//! - **Message table** - header ids for the client release being proxied
//! - **Packet injection** - fire-and-forget sends towards client or server
//! - **Logging** - routed into the host's log
//!
//! ## Thread Safety
//!
//! Implementations are shared as `Arc<dyn ExtensionContext>` and called from
//! the event-delivery context, from timers and from background tasks, so every
//! method must be safe to call concurrently.

use crate::error::ExtensionError;
use habbo_protocol::{encode, Direction, MessageTable, Packet, PacketValue};
use std::fmt::Debug;
use std::sync::Arc;

/// Host services available to an extension.
///
/// # Examples
///
/// ```rust,no_run
/// use extension_api::{ExtensionContext, ExtensionError, LogLevel};
/// use habbo_protocol::PacketValue;
/// use std::sync::Arc;
///
/// fn replay_effect(context: Arc<dyn ExtensionContext>) -> Result<(), ExtensionError> {
///     context.send_to_client(
///         "AvatarEffect",
///         &[PacketValue::Int(3), PacketValue::Int(108), PacketValue::Int(0)],
///     )?;
///     context.log(LogLevel::Debug, "effect 108 replayed on index 3");
///     Ok(())
/// }
/// ```
pub trait ExtensionContext: Send + Sync + Debug {
    /// Message names and header ids of the proxied client release.
    fn messages(&self) -> Arc<MessageTable>;

    /// Hands a packet to the host for injection. Never waits for delivery.
    fn send(&self, direction: Direction, packet: Packet) -> Result<(), ExtensionError>;

    /// Logs a message through the host.
    fn log(&self, level: LogLevel, message: &str);

    /// Encodes a named message and injects it towards the client.
    fn send_to_client(&self, message_name: &str, values: &[PacketValue]) -> Result<(), ExtensionError> {
        let packet = encode(&self.messages(), message_name, Direction::ToClient, values)?;
        self.send(Direction::ToClient, packet)
    }

    /// Encodes a named message and injects it towards the server.
    fn send_to_server(&self, message_name: &str, values: &[PacketValue]) -> Result<(), ExtensionError> {
        let packet = encode(&self.messages(), message_name, Direction::ToServer, values)?;
        self.send(Direction::ToServer, packet)
    }
}

/// Severity of a message logged through the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}
