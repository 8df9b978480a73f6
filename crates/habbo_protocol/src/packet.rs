//! Packet framing and primitive encoding.
//!
//! A framed packet on the host channel looks like:
//!
//! ```text
//! +-----------+-------------+----------------------+
//! | u32 len   | u16 header  | body (len - 2 bytes) |
//! +-----------+-------------+----------------------+
//! ```
//!
//! All integers are big-endian. Strings are a `u16` byte length followed by
//! UTF-8 data, booleans a single byte.

use crate::error::ProtocolError;
use crate::message::{Direction, MessageTable};
use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Size of the length prefix plus the header id.
pub const FRAME_HEADER_LEN: usize = 6;

/// A single decoded packet: the header id and its raw body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    header_id: u16,
    body: Bytes,
}

impl Packet {
    pub fn new(header_id: u16, body: impl Into<Bytes>) -> Self {
        Self {
            header_id,
            body: body.into(),
        }
    }

    pub fn header_id(&self) -> u16 {
        self.header_id
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// Sequential cursor over the body. Each call starts from the beginning.
    pub fn reader(&self) -> PacketReader<'_> {
        PacketReader::new(&self.body)
    }

    /// Parses one complete frame. The declared length must match the buffer exactly.
    pub fn decode(bytes: &[u8]) -> Result<Self, ProtocolError> {
        if bytes.len() < FRAME_HEADER_LEN {
            return Err(ProtocolError::MalformedPacket(format!(
                "frame of {} bytes is shorter than the {FRAME_HEADER_LEN} byte header",
                bytes.len()
            )));
        }

        let mut buf = bytes;
        let declared = buf.get_u32() as usize;
        if declared != buf.len() {
            return Err(ProtocolError::MalformedPacket(format!(
                "frame declares {declared} bytes but {} follow",
                buf.len()
            )));
        }

        let header_id = buf.get_u16();
        Ok(Self {
            header_id,
            body: Bytes::copy_from_slice(buf),
        })
    }

    /// Framed wire representation.
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(FRAME_HEADER_LEN + self.body.len());
        out.put_u32((self.body.len() + 2) as u32);
        out.put_u16(self.header_id);
        out.put_slice(&self.body);
        out.freeze()
    }
}

/// A typed argument for an outbound packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PacketValue {
    Int(i32),
    Short(i16),
    Bool(bool),
    Str(String),
}

impl From<i32> for PacketValue {
    fn from(value: i32) -> Self {
        PacketValue::Int(value)
    }
}

impl From<i16> for PacketValue {
    fn from(value: i16) -> Self {
        PacketValue::Short(value)
    }
}

impl From<bool> for PacketValue {
    fn from(value: bool) -> Self {
        PacketValue::Bool(value)
    }
}

impl From<&str> for PacketValue {
    fn from(value: &str) -> Self {
        PacketValue::Str(value.to_string())
    }
}

impl From<String> for PacketValue {
    fn from(value: String) -> Self {
        PacketValue::Str(value)
    }
}

/// Incrementally builds a packet body.
#[derive(Debug, Clone)]
pub struct PacketBuilder {
    header_id: u16,
    body: BytesMut,
}

impl PacketBuilder {
    pub fn new(header_id: u16) -> Self {
        Self {
            header_id,
            body: BytesMut::new(),
        }
    }

    pub fn put_int(&mut self, value: i32) -> &mut Self {
        self.body.put_i32(value);
        self
    }

    pub fn put_short(&mut self, value: i16) -> &mut Self {
        self.body.put_i16(value);
        self
    }

    pub fn put_bool(&mut self, value: bool) -> &mut Self {
        self.body.put_u8(value as u8);
        self
    }

    pub fn put_string(&mut self, value: &str) -> Result<&mut Self, ProtocolError> {
        let len = u16::try_from(value.len()).map_err(|_| {
            ProtocolError::MalformedPacket(format!(
                "string of {} bytes does not fit a u16 length prefix",
                value.len()
            ))
        })?;
        self.body.put_u16(len);
        self.body.put_slice(value.as_bytes());
        Ok(self)
    }

    pub fn put(&mut self, value: &PacketValue) -> Result<&mut Self, ProtocolError> {
        match value {
            PacketValue::Int(v) => Ok(self.put_int(*v)),
            PacketValue::Short(v) => Ok(self.put_short(*v)),
            PacketValue::Bool(v) => Ok(self.put_bool(*v)),
            PacketValue::Str(v) => self.put_string(v),
        }
    }

    pub fn build(self) -> Packet {
        Packet {
            header_id: self.header_id,
            body: self.body.freeze(),
        }
    }
}

/// Serializes a named message with its ordered arguments.
pub fn encode(
    table: &MessageTable,
    message_name: &str,
    direction: Direction,
    values: &[PacketValue],
) -> Result<Packet, ProtocolError> {
    let header_id = table
        .header_id(direction, message_name)
        .ok_or_else(|| ProtocolError::UnknownMessage {
            direction,
            name: message_name.to_string(),
        })?;

    let mut builder = PacketBuilder::new(header_id);
    for value in values {
        builder.put(value)?;
    }
    Ok(builder.build())
}

/// Sequential reader over a packet body.
#[derive(Debug, Clone)]
pub struct PacketReader<'a> {
    buf: &'a [u8],
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        Self { buf }
    }

    pub fn remaining(&self) -> usize {
        self.buf.remaining()
    }

    pub fn is_empty(&self) -> bool {
        !self.buf.has_remaining()
    }

    pub fn read_int(&mut self) -> Result<i32, ProtocolError> {
        self.ensure("int", 4)?;
        Ok(self.buf.get_i32())
    }

    pub fn read_short(&mut self) -> Result<i16, ProtocolError> {
        self.ensure("short", 2)?;
        Ok(self.buf.get_i16())
    }

    pub fn read_bool(&mut self) -> Result<bool, ProtocolError> {
        self.ensure("bool", 1)?;
        Ok(self.buf.get_u8() != 0)
    }

    pub fn read_string(&mut self) -> Result<String, ProtocolError> {
        self.ensure("string length", 2)?;
        let len = self.buf.get_u16() as usize;
        self.ensure("string data", len)?;

        let (data, rest) = self.buf.split_at(len);
        self.buf = rest;
        String::from_utf8(data.to_vec())
            .map_err(|e| ProtocolError::MalformedPacket(format!("string is not valid UTF-8: {e}")))
    }

    /// Fails if any unread bytes are left.
    pub fn expect_end(&self) -> Result<(), ProtocolError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ProtocolError::MalformedPacket(format!(
                "{} unexpected trailing bytes",
                self.remaining()
            )))
        }
    }

    fn ensure(&self, what: &str, needed: usize) -> Result<(), ProtocolError> {
        if self.buf.remaining() < needed {
            return Err(ProtocolError::truncated(what, needed, self.buf.remaining()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> MessageTable {
        MessageTable::new().with(Direction::ToClient, "AvatarEffect", 1167)
    }

    #[test]
    fn avatar_effect_survives_the_wire() {
        let packet = encode(
            &table(),
            "AvatarEffect",
            Direction::ToClient,
            &[PacketValue::Int(5), PacketValue::Int(12), PacketValue::Int(0)],
        )
        .unwrap();

        let wire = packet.to_bytes();
        assert_eq!(&wire[..6], &[0, 0, 0, 14, 0x04, 0x8f]);

        let decoded = Packet::decode(&wire).unwrap();
        assert_eq!(decoded.header_id(), 1167);

        let mut reader = decoded.reader();
        assert_eq!(reader.read_int().unwrap(), 5);
        assert_eq!(reader.read_int().unwrap(), 12);
        assert_eq!(reader.read_int().unwrap(), 0);
        assert!(reader.expect_end().is_ok());
    }

    #[test]
    fn strings_shorts_and_bools_are_laid_out_in_order() {
        let mut builder = PacketBuilder::new(1);
        builder.put_string("hé").unwrap().put_short(-2).put_bool(true);
        let packet = builder.build();

        assert_eq!(packet.body(), &[0, 3, b'h', 0xc3, 0xa9, 0xff, 0xfe, 1]);

        let mut reader = packet.reader();
        assert_eq!(reader.read_string().unwrap(), "hé");
        assert_eq!(reader.read_short().unwrap(), -2);
        assert!(reader.read_bool().unwrap());
        assert!(reader.is_empty());
    }

    #[test]
    fn reading_past_the_end_is_malformed() {
        let packet = Packet::new(1, vec![0u8, 0, 1]);
        let mut reader = packet.reader();

        let err = reader.read_int().unwrap_err();
        assert!(matches!(err, ProtocolError::MalformedPacket(_)));
        assert_eq!(reader.remaining(), 3);
    }

    #[test]
    fn truncated_string_is_malformed() {
        let packet = Packet::new(1, vec![0u8, 10, b'a', b'b']);
        assert!(matches!(
            packet.reader().read_string(),
            Err(ProtocolError::MalformedPacket(_))
        ));
    }

    #[test]
    fn invalid_utf8_is_malformed() {
        let packet = Packet::new(1, vec![0u8, 2, 0xff, 0xfe]);
        assert!(matches!(
            packet.reader().read_string(),
            Err(ProtocolError::MalformedPacket(_))
        ));
    }

    #[test]
    fn frame_length_must_match_buffer() {
        assert!(Packet::decode(&[0, 0, 0, 2, 0]).is_err());
        assert!(Packet::decode(&[0, 0, 0, 9, 0, 1, 0, 0]).is_err());

        let packet = Packet::decode(&[0, 0, 0, 2, 0, 7]).unwrap();
        assert_eq!(packet.header_id(), 7);
        assert!(packet.body().is_empty());
    }

    #[test]
    fn trailing_bytes_are_reported() {
        let packet = Packet::new(1, vec![0u8, 0, 0, 1, 9]);
        let mut reader = packet.reader();
        reader.read_int().unwrap();
        assert!(reader.expect_end().is_err());
    }

    #[test]
    fn unknown_message_names_are_rejected() {
        let err = encode(&table(), "Chat", Direction::ToClient, &[]).unwrap_err();
        assert_eq!(
            err,
            ProtocolError::UnknownMessage {
                direction: Direction::ToClient,
                name: "Chat".to_string()
            }
        );

        // Known name, wrong direction
        assert!(encode(&table(), "AvatarEffect", Direction::ToServer, &[]).is_err());
    }
}
