//! Habbo packet protocol as seen through the proxy host.
//!
//! - [`packet`] - framing, primitive readers/writers and message encoding
//! - [`message`] - directions and the name ↔ header id table
//! - [`entity`] - strict parser for the entity records of a `Users` message

pub mod entity;
pub mod error;
pub mod message;
pub mod packet;

pub use entity::{encode_entities, parse_entities, EntityDetails, EntityType, ParsedEntity, Tile};
pub use error::ProtocolError;
pub use message::{Direction, MessageTable};
pub use packet::{encode, Packet, PacketBuilder, PacketReader, PacketValue, FRAME_HEADER_LEN};
