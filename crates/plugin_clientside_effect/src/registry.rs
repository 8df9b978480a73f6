//! Live set of avatars visible in the current room.
//!
//! Mutations come from the event-delivery context and are serialized by a
//! lock. Readers get owned snapshots, so a list being rendered never changes
//! underneath the form.
//!
//! An optional change listener sees the list after every mutation while the
//! write lock is still held. Two concurrent mutations therefore reach the
//! listener in the same order they were applied.

use crate::avatar::AvatarRecord;
use std::fmt;
use std::sync::{PoisonError, RwLock};
use tracing::debug;

type ChangeListener = Box<dyn Fn(&[AvatarRecord]) + Send + Sync>;

/// Table of visible avatars, kept sorted by display label.
#[derive(Default)]
pub struct AvatarRegistry {
    avatars: RwLock<Vec<AvatarRecord>>,
    listener: Option<ChangeListener>,
}

impl fmt::Debug for AvatarRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AvatarRegistry")
            .field("avatars", &self.len())
            .field("listener", &self.listener.is_some())
            .finish()
    }
}

impl AvatarRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry that reports every change to `listener`.
    pub fn with_listener<F>(listener: F) -> Self
    where
        F: Fn(&[AvatarRecord]) + Send + Sync + 'static,
    {
        Self {
            avatars: RwLock::default(),
            listener: Some(Box::new(listener)),
        }
    }

    fn notify(&self, avatars: &[AvatarRecord]) {
        if let Some(listener) = &self.listener {
            listener(avatars);
        }
    }

    /// Forgets every avatar. Used when the connection opens or closes.
    pub fn reset(&self) {
        let mut avatars = self.avatars.write().unwrap_or_else(PoisonError::into_inner);
        debug!("👥 Registry reset, dropping {} avatars", avatars.len());
        avatars.clear();
        self.notify(&avatars);
    }

    /// Inserts every non-pet record, replacing any entry with the same id or
    /// index. Returns how many records were inserted.
    ///
    /// Ordering is case-insensitive by label and stable, so avatars with the
    /// same label keep their insertion order.
    pub fn add_all<I>(&self, records: I) -> usize
    where
        I: IntoIterator<Item = AvatarRecord>,
    {
        let mut avatars = self.avatars.write().unwrap_or_else(PoisonError::into_inner);
        let mut inserted = 0;

        for record in records.into_iter().filter(|record| !record.is_pet()) {
            avatars.retain(|existing| !existing.same_avatar(&record));
            avatars.push(record);
            inserted += 1;
        }

        avatars.sort_by_cached_key(|avatar| avatar.label().to_lowercase());
        self.notify(&avatars);
        inserted
    }

    /// Removes the avatar holding this index, if any.
    pub fn remove_by_index(&self, entity_index: i32) -> Option<AvatarRecord> {
        let mut avatars = self.avatars.write().unwrap_or_else(PoisonError::into_inner);
        let position = avatars
            .iter()
            .position(|avatar| avatar.entity_index == entity_index)?;
        let removed = avatars.remove(position);
        self.notify(&avatars);
        Some(removed)
    }

    pub fn find_by_index(&self, entity_index: i32) -> Option<AvatarRecord> {
        self.avatars
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .find(|avatar| avatar.entity_index == entity_index)
            .cloned()
    }

    /// Snapshot of every avatar in display order.
    pub fn all(&self) -> Vec<AvatarRecord> {
        self.avatars.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    pub fn len(&self) -> usize {
        self.avatars.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use habbo_protocol::EntityType;
    use std::sync::{Arc, Mutex};
    use std::thread;

    fn user(index: i32, id: i32, name: &str) -> AvatarRecord {
        AvatarRecord::new(index, id, name, EntityType::User)
    }

    #[test]
    fn pets_are_never_registered() {
        let registry = AvatarRegistry::new();
        let inserted = registry.add_all(vec![
            user(1, 10, "alice"),
            AvatarRecord::new(2, 20, "Rex", EntityType::Pet),
            AvatarRecord::new(3, 30, "Frank", EntityType::Bot),
        ]);

        assert_eq!(inserted, 2);
        let indexes: Vec<i32> = registry.all().iter().map(|a| a.entity_index).collect();
        assert_eq!(indexes, vec![3, 1]);
    }

    #[test]
    fn same_id_replaces_even_with_a_new_index() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 10, "alice")]);
        registry.add_all(vec![user(5, 10, "alice")]);

        let all = registry.all();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].entity_index, 5);
        assert!(registry.find_by_index(1).is_none());
    }

    #[test]
    fn same_index_replaces_the_previous_holder() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 10, "alice")]);
        registry.add_all(vec![user(1, 11, "bob")]);

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.find_by_index(1).map(|a| a.entity_id), Some(11));
    }

    #[test]
    fn duplicates_within_one_batch_keep_the_last() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 10, "alice"), user(1, 10, "alice_renamed")]);

        assert_eq!(registry.all(), vec![user(1, 10, "alice_renamed")]);
    }

    #[test]
    fn indexes_stay_unique_under_mixed_conflicts() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 10, "a"), user(2, 20, "b"), user(3, 30, "c")]);
        // Conflicts with index 1 and id 20 at once
        registry.add_all(vec![user(1, 20, "d")]);

        let mut indexes: Vec<i32> = registry.all().iter().map(|a| a.entity_index).collect();
        indexes.sort();
        assert_eq!(indexes, vec![1, 3]);
    }

    #[test]
    fn sorted_case_insensitively_and_stably() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 1, "bob"), user(2, 2, "Alice"), user(3, 3, "carl")]);
        registry.add_all(vec![user(4, 4, "BOB")]);

        let names: Vec<String> = registry.all().into_iter().map(|a| a.name).collect();
        assert_eq!(names, vec!["Alice", "bob", "BOB", "carl"]);
    }

    #[test]
    fn remove_and_reset() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 10, "alice"), user(2, 20, "bob")]);

        assert_eq!(registry.remove_by_index(1).map(|a| a.entity_id), Some(10));
        assert!(registry.remove_by_index(1).is_none());
        assert_eq!(registry.len(), 1);

        registry.reset();
        assert!(registry.all().is_empty());
        assert!(registry.is_empty());
    }

    #[test]
    fn snapshots_do_not_follow_later_mutations() {
        let registry = AvatarRegistry::new();
        registry.add_all(vec![user(1, 10, "alice")]);
        let snapshot = registry.all();

        registry.reset();
        assert_eq!(snapshot.len(), 1);
    }

    fn recording_registry() -> (Arc<AvatarRegistry>, Arc<Mutex<Vec<Vec<i32>>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let registry = AvatarRegistry::with_listener(move |avatars: &[AvatarRecord]| {
            let ids = avatars.iter().map(|a| a.entity_id).collect();
            sink.lock().unwrap().push(ids);
        });
        (Arc::new(registry), seen)
    }

    #[test]
    fn listener_sees_every_mutation() {
        let (registry, seen) = recording_registry();

        registry.add_all(vec![user(1, 10, "alice"), user(2, 20, "bob")]);
        registry.remove_by_index(1);
        // Nothing to remove, nothing reported
        registry.remove_by_index(7);
        registry.reset();

        assert_eq!(*seen.lock().unwrap(), vec![vec![10, 20], vec![20], vec![]]);
    }

    #[test]
    fn concurrent_mutations_report_the_final_state_last() {
        let (registry, seen) = recording_registry();

        let workers: Vec<_> = (0..8)
            .map(|worker| {
                let registry = Arc::clone(&registry);
                thread::spawn(move || {
                    for round in 0..50 {
                        let index = worker * 100 + round;
                        registry.add_all(vec![user(index, index, &format!("u{index}"))]);
                        if round % 3 == 0 {
                            registry.remove_by_index(index);
                        }
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let final_ids: Vec<i32> = registry.all().iter().map(|a| a.entity_id).collect();
        assert_eq!(seen.lock().unwrap().last(), Some(&final_ids));
    }
}
