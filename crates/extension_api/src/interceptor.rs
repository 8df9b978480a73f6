//! Message-name keyed dispatch table.
//!
//! The host hands every intercepted packet to [`Interceptor::dispatch`]. The
//! header id is resolved to a message name through the [`MessageTable`] and
//! every handler subscribed to that `(direction, name)` pair runs in
//! registration order.
//!
//! Handler failures are contained here: a failing handler gets its packet
//! dropped and an error logged, the remaining handlers and all later packets
//! are unaffected.

use crate::error::ExtensionError;
use dashmap::DashMap;
use habbo_protocol::{Direction, MessageTable, Packet};
use std::sync::Arc;
use tracing::{error, trace, warn};

/// A packet as delivered to a handler.
#[derive(Debug, Clone)]
pub struct InterceptedMessage {
    pub direction: Direction,
    pub name: String,
    pub packet: Packet,
}

/// Boxed handler stored in the table.
pub type InterceptHandler =
    Arc<dyn Fn(&InterceptedMessage) -> Result<(), ExtensionError> + Send + Sync>;

/// Dispatch table from `(direction, message name)` to handlers.
pub struct Interceptor {
    messages: Arc<MessageTable>,
    handlers: DashMap<(Direction, String), Vec<InterceptHandler>>,
}

impl std::fmt::Debug for Interceptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interceptor")
            .field("messages", &self.messages.len())
            .field("handlers", &self.handler_count())
            .finish()
    }
}

impl Interceptor {
    pub fn new(messages: Arc<MessageTable>) -> Self {
        Self {
            messages,
            handlers: DashMap::new(),
        }
    }

    pub fn messages(&self) -> Arc<MessageTable> {
        Arc::clone(&self.messages)
    }

    /// Subscribes a handler to a message.
    ///
    /// A name the table does not know is still registered (the handler simply
    /// never fires) so that a partial table does not stop the extension.
    pub fn intercept<F>(&self, direction: Direction, name: &str, handler: F)
    where
        F: Fn(&InterceptedMessage) -> Result<(), ExtensionError> + Send + Sync + 'static,
    {
        if self.messages.header_id(direction, name).is_none() {
            warn!("🔌 No header id known for '{}' ({}), handler will stay idle", name, direction);
        }

        self.handlers
            .entry((direction, name.to_string()))
            .or_default()
            .push(Arc::new(handler));
    }

    /// Runs every handler subscribed to this packet's message.
    ///
    /// Returns the number of handlers that completed successfully.
    pub fn dispatch(&self, direction: Direction, packet: Packet) -> usize {
        let Some(name) = self.messages.name_of(direction, packet.header_id()) else {
            trace!("🔌 Header {} ({}) is not in the message table", packet.header_id(), direction);
            return 0;
        };

        // Clone the handler list so no map guard is held while handlers run
        let handlers = match self.handlers.get(&(direction, name.to_string())) {
            Some(entry) => entry.value().clone(),
            None => return 0,
        };

        let message = InterceptedMessage {
            direction,
            name: name.to_string(),
            packet,
        };

        let mut completed = 0;
        for handler in handlers {
            match handler(&message) {
                Ok(()) => completed += 1,
                Err(e) => error!("🔌 Handler for '{}' failed, packet dropped: {}", message.name, e),
            }
        }
        completed
    }

    /// Decodes a raw frame and dispatches it. Malformed frames are logged and dropped.
    pub fn dispatch_frame(&self, direction: Direction, frame: &[u8]) -> usize {
        match Packet::decode(frame) {
            Ok(packet) => self.dispatch(direction, packet),
            Err(e) => {
                error!("🔌 Dropping undecodable {} frame: {}", direction, e);
                0
            }
        }
    }

    /// Total number of registered handlers.
    pub fn handler_count(&self) -> usize {
        self.handlers.iter().map(|entry| entry.value().len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habbo_protocol::{PacketBuilder, ProtocolError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn interceptor() -> Interceptor {
        let table = MessageTable::new()
            .with(Direction::ToClient, "UserRemove", 2661)
            .with(Direction::ToClient, "Users", 374);
        Interceptor::new(Arc::new(table))
    }

    #[test]
    fn routes_by_name_and_direction() {
        let interceptor = interceptor();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        interceptor.intercept(Direction::ToClient, "UserRemove", move |message| {
            assert_eq!(message.name, "UserRemove");
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(())
        });

        assert_eq!(interceptor.dispatch(Direction::ToClient, Packet::new(2661, Vec::new())), 1);
        assert_eq!(interceptor.dispatch(Direction::ToClient, Packet::new(374, Vec::new())), 0);
        assert_eq!(interceptor.dispatch(Direction::ToServer, Packet::new(2661, Vec::new())), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failing_handler_does_not_stop_later_packets() {
        let interceptor = interceptor();
        let seen = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&seen);
        interceptor.intercept(Direction::ToClient, "UserRemove", move |message| {
            counter.fetch_add(1, Ordering::SeqCst);
            message.packet.reader().read_string()?;
            Ok(())
        });

        // Empty body: the read fails and the packet is dropped
        assert_eq!(interceptor.dispatch(Direction::ToClient, Packet::new(2661, Vec::new())), 0);

        let mut builder = PacketBuilder::new(2661);
        builder.put_string("4").unwrap();
        assert_eq!(interceptor.dispatch(Direction::ToClient, builder.build()), 1);
        assert_eq!(seen.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn every_subscriber_runs_in_order() {
        let interceptor = interceptor();
        let order = Arc::new(std::sync::Mutex::new(Vec::new()));

        for tag in ["first", "second"] {
            let order = Arc::clone(&order);
            interceptor.intercept(Direction::ToClient, "Users", move |_| {
                order.lock().unwrap().push(tag);
                Ok(())
            });
        }

        interceptor.dispatch(Direction::ToClient, Packet::new(374, Vec::new()));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second"]);
        assert_eq!(interceptor.handler_count(), 2);
    }

    #[test]
    fn malformed_frames_are_dropped() {
        let interceptor = interceptor();
        interceptor.intercept(Direction::ToClient, "Users", |_| {
            Err(ExtensionError::Protocol(ProtocolError::MalformedPacket("never".into())))
        });

        assert_eq!(interceptor.dispatch_frame(Direction::ToClient, &[0, 0, 0, 9]), 0);
        assert_eq!(interceptor.dispatch_frame(Direction::ToClient, &[0, 0, 0, 2, 1, 118]), 0);
    }

    #[test]
    fn unknown_names_register_but_stay_idle() {
        let interceptor = interceptor();
        interceptor.intercept(Direction::ToClient, "NotInTable", |_| Ok(()));
        assert_eq!(interceptor.handler_count(), 1);
    }
}
