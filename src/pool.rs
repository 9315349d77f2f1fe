//! Pooled projectile storage.
//!
//! Bullets are pre-spawned once and recycled through a free list, so steady
//! state firing performs no entity churn. The free list only ever shrinks by
//! `acquire` and grows by the deactivation path; growth on exhaustion is
//! unbounded by design — back-pressure is a caller concern, not this
//! layer's.

use bevy::prelude::*;

use crate::common::layers::CollisionMatrix;
use crate::controllers::Controllers;
use crate::danmaku::{Danmaku, DanmakuBundle, DanmakuState};
use crate::prototype::{DanmakuPrototypes, PrototypeId};
use crate::tasks::Tasks;

/// Reusable backing store of projectile entities.
#[derive(Resource, Debug)]
pub struct DanmakuPool {
    free: Vec<Entity>,
    capacity: usize,
}

impl DanmakuPool {
    pub fn new(capacity: usize) -> Self {
        Self {
            free: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Entities currently parked in the pool.
    pub fn available(&self) -> usize {
        self.free.len()
    }

    /// Total entities spawned for the pool so far, including growth.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub(crate) fn release(&mut self, entity: Entity) {
        debug_assert!(
            !self.free.contains(&entity),
            "danmaku entity released twice"
        );
        self.free.push(entity);
    }
}

/// Pre-spawn the pooled projectiles (inactive).
pub fn init_danmaku_pool(mut commands: Commands, mut pool: ResMut<DanmakuPool>) {
    pool.free.clear();
    let capacity = pool.capacity;
    pool.free.reserve(capacity);

    for _ in 0..capacity {
        let entity = commands
            .spawn((Name::new("Danmaku(Pooled)"), DanmakuBundle::default()))
            .id();
        pool.free.push(entity);
    }
}

/// Pops a free pooled entity, spawning a fresh one when the pool is
/// exhausted.
pub(crate) fn next_pooled_entity(commands: &mut Commands, pool: &mut DanmakuPool) -> Entity {
    match pool.free.pop() {
        Some(entity) => entity,
        None => {
            pool.capacity += 1;
            commands
                .spawn((Name::new("Danmaku(Pooled)"), DanmakuBundle::default()))
                .id()
        }
    }
}

/// Takes an inactive projectile from the pool, matches it to `prototype` and
/// poses it. The projectile is **not** activated; callers activate explicitly
/// once it is fully configured.
///
/// Returns `None` when `prototype` is not registered (logged usage error).
pub fn acquire_danmaku(
    commands: &mut Commands,
    pool: &mut DanmakuPool,
    prototypes: &DanmakuPrototypes,
    matrix: &CollisionMatrix,
    prototype: PrototypeId,
    position: Vec2,
    rotation: f32,
) -> Option<Entity> {
    let Some(proto) = prototypes.get(prototype) else {
        error!("tried to match unregistered danmaku prototype {prototype:?}");
        return None;
    };

    let entity = next_pooled_entity(commands, pool);

    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();
    danmaku.set_entity(entity);
    danmaku.match_prototype(prototype, proto, &mut controllers, matrix);
    danmaku.set_position(position);
    danmaku.set_rotation(rotation);

    commands.entity(entity).insert((
        danmaku,
        controllers,
        Tasks::default(),
        DanmakuState::Inactive,
    ));
    Some(entity)
}
