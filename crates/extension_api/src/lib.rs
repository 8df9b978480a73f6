//! # Extension API
//!
//! Everything an extension needs from the packet-sniffing host:
//!
//! - [`ExtensionContext`] - packet injection, message table and logging
//! - [`SimpleExtension`] - lifecycle trait implemented by extensions
//! - [`Interceptor`] - name-keyed dispatch of intercepted packets
//!
//! The host owns the game connection and the transport to the extension;
//! neither is modelled here.

pub mod context;
pub mod error;
pub mod extension;
pub mod interceptor;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use context::{ExtensionContext, LogLevel};
pub use error::ExtensionError;
pub use extension::{activate, ExtensionInfo, SimpleExtension};
pub use interceptor::{InterceptHandler, InterceptedMessage, Interceptor};

// Re-exported so extensions can depend on this crate alone for protocol types
pub use habbo_protocol::{Direction, MessageTable, Packet, PacketValue};
