//! Plugin wiring.

use bevy::prelude::*;

use crate::collision::ColliderHandlers;
use crate::common::layers::CollisionMatrix;
use crate::danmaku::{commit_deactivations, update_danmaku};
use crate::field::DanmakuFields;
use crate::pool::{DanmakuPool, init_danmaku_pool};
use crate::prototype::DanmakuPrototypes;

/// Installs the projectile pool, the registries and the fixed-tick update
/// pipeline.
///
/// The host app provides the geometry collaborator (`avian2d`'s
/// `PhysicsPlugins`) and the fixed clock; this plugin never adds them itself.
pub struct DanmakuPlugin {
    /// Projectiles pre-spawned at startup. The pool grows past this when
    /// exhausted.
    pub pool_capacity: usize,
}

impl Default for DanmakuPlugin {
    fn default() -> Self {
        Self { pool_capacity: 512 }
    }
}

impl Plugin for DanmakuPlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(DanmakuPool::new(self.pool_capacity))
            .init_resource::<CollisionMatrix>()
            .init_resource::<DanmakuPrototypes>()
            .init_resource::<DanmakuFields>()
            .init_resource::<ColliderHandlers>()
            .add_systems(Startup, init_danmaku_pool);

        app.add_systems(FixedUpdate, update_danmaku)
            .add_systems(FixedUpdate, commit_deactivations.after(update_danmaku));
    }
}
