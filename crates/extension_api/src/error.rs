//! Error types for the extension API.

use habbo_protocol::ProtocolError;
use thiserror::Error;

/// Errors raised by extensions and by the host while serving them.
///
/// Handler errors are contained by the [`Interceptor`](crate::Interceptor):
/// they are logged and the offending packet is dropped, nothing reaches the
/// host connection.
#[derive(Error, Debug)]
pub enum ExtensionError {
    /// Packet could not be decoded or encoded
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The host refused or failed to forward a packet
    #[error("Host error: {0}")]
    Host(String),

    /// Extension failed during startup
    #[error("Extension initialization failed: {0}")]
    InitializationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_variant_names_its_source() {
        let errors = [
            ExtensionError::from(ProtocolError::MalformedPacket("short body".to_string())),
            ExtensionError::Host("connection closed".to_string()),
            ExtensionError::InitializationFailed("no runtime".to_string()),
        ];

        for error in &errors {
            let prefix = match error {
                ExtensionError::Protocol(_) => "Protocol error: ",
                ExtensionError::Host(_) => "Host error: ",
                ExtensionError::InitializationFailed(_) => "Extension initialization failed: ",
            };
            assert!(error.to_string().starts_with(prefix), "{error}");
        }
    }
}
