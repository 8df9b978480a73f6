//! Avatar records tracked by the plugin.

use habbo_protocol::{EntityType, ParsedEntity};
use serde::Serialize;
use std::fmt;

/// A visible room entity, reduced to what effect handling needs.
///
/// Structural equality is derived. Registry identity is looser: see
/// [`AvatarRecord::same_avatar`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarRecord {
    /// Per-room index, reused once the entity leaves
    pub entity_index: i32,
    /// Stable id of the underlying character
    pub entity_id: i32,
    pub name: String,
    pub entity_type: EntityType,
}

impl AvatarRecord {
    pub fn new(entity_index: i32, entity_id: i32, name: impl Into<String>, entity_type: EntityType) -> Self {
        Self {
            entity_index,
            entity_id,
            name: name.into(),
            entity_type,
        }
    }

    /// Two records denote the same avatar when either identifier matches.
    pub fn same_avatar(&self, other: &AvatarRecord) -> bool {
        self.entity_id == other.entity_id || self.entity_index == other.entity_index
    }

    pub fn is_pet(&self) -> bool {
        self.entity_type == EntityType::Pet
    }

    /// Label shown in the avatar list.
    pub fn label(&self) -> String {
        if self.entity_type.is_bot() {
            format!("[BOT] {}", self.name)
        } else {
            self.name.clone()
        }
    }
}

impl From<&ParsedEntity> for AvatarRecord {
    fn from(entity: &ParsedEntity) -> Self {
        Self {
            entity_index: entity.index,
            entity_id: entity.id,
            name: entity.name.clone(),
            entity_type: entity.entity_type(),
        }
    }
}

impl fmt::Display for AvatarRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bots_are_tagged_in_labels() {
        assert_eq!(AvatarRecord::new(1, 10, "Frank", EntityType::Bot).label(), "[BOT] Frank");
        assert_eq!(AvatarRecord::new(1, 10, "Frank", EntityType::OldBot).to_string(), "[BOT] Frank");
        assert_eq!(AvatarRecord::new(1, 10, "alice", EntityType::User).label(), "alice");
    }

    #[test]
    fn either_identifier_makes_the_same_avatar() {
        let alice = AvatarRecord::new(1, 10, "alice", EntityType::User);

        assert!(alice.same_avatar(&AvatarRecord::new(7, 10, "alice", EntityType::User)));
        assert!(alice.same_avatar(&AvatarRecord::new(1, 99, "bob", EntityType::User)));
        assert!(!alice.same_avatar(&AvatarRecord::new(2, 11, "alice", EntityType::User)));
    }
}
