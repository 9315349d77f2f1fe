//! Deduplicated projectile membership sets.
//!
//! A group answers "is this projectile one of mine" in O(1). Collider
//! handlers use groups inline as an idempotence guard ("already processed
//! this bullet"); gameplay code uses them as batch containers of bullets of
//! interest.

use std::sync::{Arc, Mutex};

use bevy::platform::collections::HashSet;
use bevy::prelude::*;

/// A shared, deduplicated set of live projectiles, keyed by entity.
///
/// Cloning produces another handle to the same underlying set, so a group can
/// be held by a handler, a resource and the member projectiles at once.
/// Membership is mirrored on the projectile side; go through
/// [`Danmaku::add_to_group`](crate::danmaku::Danmaku::add_to_group) and
/// [`Danmaku::remove_from_group`](crate::danmaku::Danmaku::remove_from_group)
/// so both sides stay consistent.
#[derive(Clone, Default)]
pub struct DanmakuGroup {
    members: Arc<Mutex<HashSet<Entity>>>,
}

impl DanmakuGroup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, entity: Entity) -> bool {
        self.lock().contains(&entity)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Snapshot of the current members, for batch operations.
    pub fn members(&self) -> Vec<Entity> {
        self.lock().iter().copied().collect()
    }

    /// Two handles are the same group iff they share storage.
    pub fn same_group(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.members, &other.members)
    }

    pub(crate) fn insert(&self, entity: Entity) -> bool {
        self.lock().insert(entity)
    }

    pub(crate) fn remove(&self, entity: Entity) -> bool {
        self.lock().remove(&entity)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashSet<Entity>> {
        // The driver is single-threaded; the lock only exists to satisfy
        // resource/component Send + Sync bounds.
        self.members.lock().expect("danmaku group lock poisoned")
    }
}
