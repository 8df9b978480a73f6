//! Room entity records as carried by the `Users` message.
//!
//! The body of a `Users` packet is an `int` count followed by that many
//! entity records. Each record has a common prefix and a trailer whose shape
//! depends on the entity type:
//!
//! ```text
//! int id, string name, string motto, string figure, int index,
//! int x, int y, string z, int direction, int type, <trailer>
//! ```
//!
//! Parsing is strict. A count that promises more records than the body holds,
//! an unknown type code or bytes left over after the last record all fail
//! with [`ProtocolError::MalformedPacket`].

use crate::error::ProtocolError;
use crate::packet::{Packet, PacketBuilder, PacketReader};
use serde::{Deserialize, Serialize};

/// Smallest possible encoded record (old bot with empty strings).
const MIN_ENTITY_LEN: usize = 32;

/// Kind of room entity, with its wire code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
    User,
    Pet,
    OldBot,
    Bot,
}

impl EntityType {
    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            1 => Some(EntityType::User),
            2 => Some(EntityType::Pet),
            3 => Some(EntityType::OldBot),
            4 => Some(EntityType::Bot),
            _ => None,
        }
    }

    pub fn code(self) -> i32 {
        match self {
            EntityType::User => 1,
            EntityType::Pet => 2,
            EntityType::OldBot => 3,
            EntityType::Bot => 4,
        }
    }

    pub fn is_bot(self) -> bool {
        matches!(self, EntityType::Bot | EntityType::OldBot)
    }
}

/// Position of an entity in the room. Height travels as a decimal string.
#[derive(Debug, Clone, PartialEq)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
    pub z: f64,
}

/// Type-specific trailer of an entity record.
#[derive(Debug, Clone, PartialEq)]
pub enum EntityDetails {
    User {
        gender: String,
        group_id: i32,
        group_status: i32,
        group_name: String,
        swim_figure: String,
        achievement_score: i32,
        is_moderator: bool,
    },
    Pet {
        sub_type: i32,
        owner_id: i32,
        owner_name: String,
        rarity: i32,
        has_saddle: bool,
        is_riding: bool,
        can_breed: bool,
        can_harvest: bool,
        can_revive: bool,
        has_breeding_permission: bool,
        level: i32,
        posture: String,
    },
    OldBot,
    Bot {
        gender: String,
        owner_id: i32,
        owner_name: String,
        skills: Vec<i16>,
    },
}

impl EntityDetails {
    pub fn entity_type(&self) -> EntityType {
        match self {
            EntityDetails::User { .. } => EntityType::User,
            EntityDetails::Pet { .. } => EntityType::Pet,
            EntityDetails::OldBot => EntityType::OldBot,
            EntityDetails::Bot { .. } => EntityType::Bot,
        }
    }
}

/// One decoded entity, independent of what the caller does with it.
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedEntity {
    pub id: i32,
    pub name: String,
    pub motto: String,
    pub figure: String,
    pub index: i32,
    pub tile: Tile,
    pub direction: i32,
    pub details: EntityDetails,
}

impl ParsedEntity {
    pub fn entity_type(&self) -> EntityType {
        self.details.entity_type()
    }

    /// Reads a single record from the cursor.
    pub fn parse(reader: &mut PacketReader<'_>) -> Result<Self, ProtocolError> {
        let id = reader.read_int()?;
        let name = reader.read_string()?;
        let motto = reader.read_string()?;
        let figure = reader.read_string()?;
        let index = reader.read_int()?;
        let x = reader.read_int()?;
        let y = reader.read_int()?;
        let z_text = reader.read_string()?;
        let z = z_text.trim().parse::<f64>().map_err(|_| {
            ProtocolError::MalformedPacket(format!("entity {id} has non-numeric height '{z_text}'"))
        })?;
        let direction = reader.read_int()?;
        let type_code = reader.read_int()?;

        let entity_type = EntityType::from_code(type_code).ok_or_else(|| {
            ProtocolError::MalformedPacket(format!("entity {id} has unknown type code {type_code}"))
        })?;

        let details = match entity_type {
            EntityType::User => EntityDetails::User {
                gender: reader.read_string()?,
                group_id: reader.read_int()?,
                group_status: reader.read_int()?,
                group_name: reader.read_string()?,
                swim_figure: reader.read_string()?,
                achievement_score: reader.read_int()?,
                is_moderator: reader.read_bool()?,
            },
            EntityType::Pet => EntityDetails::Pet {
                sub_type: reader.read_int()?,
                owner_id: reader.read_int()?,
                owner_name: reader.read_string()?,
                rarity: reader.read_int()?,
                has_saddle: reader.read_bool()?,
                is_riding: reader.read_bool()?,
                can_breed: reader.read_bool()?,
                can_harvest: reader.read_bool()?,
                can_revive: reader.read_bool()?,
                has_breeding_permission: reader.read_bool()?,
                level: reader.read_int()?,
                posture: reader.read_string()?,
            },
            EntityType::OldBot => EntityDetails::OldBot,
            EntityType::Bot => {
                let gender = reader.read_string()?;
                let owner_id = reader.read_int()?;
                let owner_name = reader.read_string()?;
                let skill_count = reader.read_int()?;
                if skill_count < 0 {
                    return Err(ProtocolError::MalformedPacket(format!(
                        "bot {id} declares {skill_count} skills"
                    )));
                }
                let mut skills = Vec::with_capacity((skill_count as usize).min(reader.remaining() / 2));
                for _ in 0..skill_count {
                    skills.push(reader.read_short()?);
                }
                EntityDetails::Bot {
                    gender,
                    owner_id,
                    owner_name,
                    skills,
                }
            }
        };

        Ok(Self {
            id,
            name,
            motto,
            figure,
            index,
            tile: Tile { x, y, z },
            direction,
            details,
        })
    }

    /// Appends this record in wire layout.
    pub fn write(&self, builder: &mut PacketBuilder) -> Result<(), ProtocolError> {
        builder.put_int(self.id);
        builder.put_string(&self.name)?;
        builder.put_string(&self.motto)?;
        builder.put_string(&self.figure)?;
        builder.put_int(self.index).put_int(self.tile.x).put_int(self.tile.y);
        builder.put_string(&self.tile.z.to_string())?;
        builder.put_int(self.direction).put_int(self.entity_type().code());

        match &self.details {
            EntityDetails::User {
                gender,
                group_id,
                group_status,
                group_name,
                swim_figure,
                achievement_score,
                is_moderator,
            } => {
                builder.put_string(gender)?;
                builder.put_int(*group_id).put_int(*group_status);
                builder.put_string(group_name)?;
                builder.put_string(swim_figure)?;
                builder.put_int(*achievement_score).put_bool(*is_moderator);
            }
            EntityDetails::Pet {
                sub_type,
                owner_id,
                owner_name,
                rarity,
                has_saddle,
                is_riding,
                can_breed,
                can_harvest,
                can_revive,
                has_breeding_permission,
                level,
                posture,
            } => {
                builder.put_int(*sub_type).put_int(*owner_id);
                builder.put_string(owner_name)?;
                builder
                    .put_int(*rarity)
                    .put_bool(*has_saddle)
                    .put_bool(*is_riding)
                    .put_bool(*can_breed)
                    .put_bool(*can_harvest)
                    .put_bool(*can_revive)
                    .put_bool(*has_breeding_permission)
                    .put_int(*level);
                builder.put_string(posture)?;
            }
            EntityDetails::OldBot => {}
            EntityDetails::Bot {
                gender,
                owner_id,
                owner_name,
                skills,
            } => {
                builder.put_string(gender)?;
                builder.put_int(*owner_id);
                builder.put_string(owner_name)?;
                builder.put_int(skills.len() as i32);
                for skill in skills {
                    builder.put_short(*skill);
                }
            }
        }
        Ok(())
    }
}

/// Decodes every entity of a `Users` packet, in wire order, pets included.
pub fn parse_entities(packet: &Packet) -> Result<Vec<ParsedEntity>, ProtocolError> {
    let mut reader = packet.reader();
    let count = reader.read_int()?;
    if count < 0 {
        return Err(ProtocolError::MalformedPacket(format!(
            "negative entity count {count}"
        )));
    }

    let mut entities = Vec::with_capacity((count as usize).min(reader.remaining() / MIN_ENTITY_LEN));
    for position in 0..count {
        let entity = ParsedEntity::parse(&mut reader).map_err(|e| match e {
            ProtocolError::MalformedPacket(reason) => ProtocolError::MalformedPacket(format!(
                "entity {} of {count}: {reason}",
                position + 1
            )),
            other => other,
        })?;
        entities.push(entity);
    }

    reader.expect_end()?;
    Ok(entities)
}

/// Builds a `Users` packet body from the given entities.
pub fn encode_entities(header_id: u16, entities: &[ParsedEntity]) -> Result<Packet, ProtocolError> {
    let mut builder = PacketBuilder::new(header_id);
    builder.put_int(entities.len() as i32);
    for entity in entities {
        entity.write(&mut builder)?;
    }
    Ok(builder.build())
}
