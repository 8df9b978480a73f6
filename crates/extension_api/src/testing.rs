//! In-memory host for exercising extensions without a proxy.

use crate::context::{ExtensionContext, LogLevel};
use crate::error::ExtensionError;
use habbo_protocol::{Direction, MessageTable, Packet};
use std::sync::{Arc, Mutex};

/// Records every packet an extension sends instead of forwarding it.
#[derive(Debug)]
pub struct RecordingContext {
    messages: Arc<MessageTable>,
    sent: Mutex<Vec<(Direction, Packet)>>,
}

impl RecordingContext {
    pub fn new(messages: MessageTable) -> Self {
        Self {
            messages: Arc::new(messages),
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Everything sent so far, in send order.
    pub fn sent(&self) -> Vec<(Direction, Packet)> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Packets sent for one message name, in send order.
    pub fn sent_named(&self, direction: Direction, name: &str) -> Vec<Packet> {
        let Some(header_id) = self.messages.header_id(direction, name) else {
            return Vec::new();
        };
        self.sent()
            .into_iter()
            .filter(|(d, packet)| *d == direction && packet.header_id() == header_id)
            .map(|(_, packet)| packet)
            .collect()
    }

    pub fn clear(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

impl ExtensionContext for RecordingContext {
    fn messages(&self) -> Arc<MessageTable> {
        Arc::clone(&self.messages)
    }

    fn send(&self, direction: Direction, packet: Packet) -> Result<(), ExtensionError> {
        self.sent
            .lock()
            .map_err(|_| ExtensionError::Host("recording context poisoned".to_string()))?
            .push((direction, packet));
        Ok(())
    }

    fn log(&self, level: LogLevel, message: &str) {
        tracing::debug!("[{:?}] {}", level, message);
    }
}
