//! Message directions and the name ↔ header id table.
//!
//! Header ids change with every client release, so the extension never
//! hard-codes them. The host hands over a [`MessageTable`] describing the
//! current release and every lookup goes through it by name.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Which way a packet travels through the proxy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Server → client (incoming from the game's point of view)
    ToClient,
    /// Client → server
    ToServer,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::ToClient => write!(f, "to-client"),
            Direction::ToServer => write!(f, "to-server"),
        }
    }
}

/// Bidirectional mapping between message names and numeric header ids.
///
/// Deserializes from a document shaped like:
///
/// ```toml
/// [to_client]
/// Users = 374
/// AvatarEffect = 1167
///
/// [to_server]
/// MoveAvatar = 3320
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageTable {
    #[serde(default)]
    to_client: HashMap<String, u16>,
    #[serde(default)]
    to_server: HashMap<String, u16>,
}

impl MessageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style registration of a single message.
    pub fn with(mut self, direction: Direction, name: impl Into<String>, header_id: u16) -> Self {
        self.insert(direction, name, header_id);
        self
    }

    /// Registers or overwrites a message.
    pub fn insert(&mut self, direction: Direction, name: impl Into<String>, header_id: u16) {
        self.side_mut(direction).insert(name.into(), header_id);
    }

    pub fn header_id(&self, direction: Direction, name: &str) -> Option<u16> {
        self.side(direction).get(name).copied()
    }

    pub fn name_of(&self, direction: Direction, header_id: u16) -> Option<&str> {
        self.side(direction)
            .iter()
            .find(|(_, id)| **id == header_id)
            .map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.to_client.len() + self.to_server.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn side(&self, direction: Direction) -> &HashMap<String, u16> {
        match direction {
            Direction::ToClient => &self.to_client,
            Direction::ToServer => &self.to_server,
        }
    }

    fn side_mut(&mut self, direction: Direction) -> &mut HashMap<String, u16> {
        match direction {
            Direction::ToClient => &mut self.to_client,
            Direction::ToServer => &mut self.to_server,
        }
    }
}
