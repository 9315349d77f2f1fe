//! Firing: building and launching projectiles.
//!
//! [`FireData`] describes one shot; [`DanmakuSpawner`] is the system
//! parameter gameplay code fires through. Modifier chains (spread patterns,
//! burst fire, ...) plug in via [`DanmakuModifier`], which only captures the
//! composition contract — concrete strategies live with the host.

use std::sync::Arc;

use bevy::ecs::system::SystemParam;
use bevy::prelude::*;

use crate::common::layers::CollisionMatrix;
use crate::controllers::{Controllers, DanmakuController};
use crate::danmaku::{Danmaku, DanmakuState};
use crate::field::{CoordinateSystem, DanmakuFields, FieldId};
use crate::pool::{DanmakuPool, acquire_danmaku, next_pooled_entity};
use crate::prototype::{DanmakuPrototypes, PrototypeId};
use crate::tasks::Tasks;

/// Everything needed to launch one projectile.
#[derive(Clone)]
pub struct FireData {
    pub prototype: PrototypeId,
    pub field: FieldId,
    pub position: Vec2,
    pub coordinates: CoordinateSystem,
    /// Launch rotation in degrees (0 = up).
    pub rotation: f32,
    pub speed: f32,
    pub angular_speed: f32,
    pub damage: i32,
    /// Controllers attached on top of the prototype's initial set.
    pub controllers: Vec<Arc<dyn DanmakuController>>,
}

impl FireData {
    pub fn new(prototype: PrototypeId, field: FieldId) -> Self {
        Self {
            prototype,
            field,
            position: Vec2::ZERO,
            coordinates: CoordinateSystem::default(),
            rotation: 0.0,
            speed: 0.0,
            angular_speed: 0.0,
            damage: 0,
            controllers: Vec::new(),
        }
    }
}

/// Bundles the pool and registries needed to fire, so gameplay systems take
/// one parameter instead of five.
#[derive(SystemParam)]
pub struct DanmakuSpawner<'w, 's> {
    commands: Commands<'w, 's>,
    pool: ResMut<'w, DanmakuPool>,
    prototypes: Res<'w, DanmakuPrototypes>,
    matrix: Res<'w, CollisionMatrix>,
    fields: Res<'w, DanmakuFields>,
}

impl DanmakuSpawner<'_, '_> {
    /// Low-level acquire: matched and posed, **not** activated.
    pub fn acquire(
        &mut self,
        prototype: PrototypeId,
        position: Vec2,
        rotation: f32,
    ) -> Option<Entity> {
        acquire_danmaku(
            &mut self.commands,
            &mut self.pool,
            &self.prototypes,
            &self.matrix,
            prototype,
            position,
            rotation,
        )
    }

    /// Maps a point in the given field's coordinates into world space.
    pub fn world_point(
        &self,
        field: FieldId,
        point: Vec2,
        coords: CoordinateSystem,
    ) -> Option<Vec2> {
        Some(self.fields.get(field)?.world_point(point, coords))
    }

    /// Launches one projectile described by `data`: acquired, matched,
    /// configured, associated with the field and activated.
    ///
    /// Unregistered prototype or field ids are logged usage errors and fire
    /// nothing.
    pub fn fire(&mut self, data: &FireData) -> Option<Entity> {
        let Some(proto) = self.prototypes.get(data.prototype) else {
            error!(
                "tried to fire unregistered danmaku prototype {:?}",
                data.prototype
            );
            return None;
        };
        let Some(field) = self.fields.get(data.field) else {
            error!("tried to fire into unregistered danmaku field {:?}", data.field);
            return None;
        };
        let position = field.world_point(data.position, data.coordinates);
        let field_bounds = field.bounds();

        let entity = next_pooled_entity(&mut self.commands, &mut self.pool);

        let mut danmaku = Danmaku::default();
        let mut controllers = Controllers::default();
        danmaku.set_entity(entity);
        danmaku.match_prototype(data.prototype, proto, &mut controllers, &self.matrix);
        danmaku.set_position(position);
        danmaku.set_rotation(data.rotation);
        danmaku.speed = data.speed;
        danmaku.angular_speed = data.angular_speed;
        danmaku.damage = data.damage;
        danmaku.set_field_snapshot(data.field, field_bounds);
        for controller in &data.controllers {
            controllers.add(controller.clone());
        }

        let mut state = DanmakuState::Inactive;
        danmaku.activate(&mut state);

        self.commands
            .entity(entity)
            .insert((danmaku, controllers, Tasks::default(), state));
        Some(entity)
    }

    /// Straight-line shot.
    pub fn fire_linear(
        &mut self,
        prototype: PrototypeId,
        field: FieldId,
        position: Vec2,
        coordinates: CoordinateSystem,
        rotation: f32,
        speed: f32,
    ) -> Option<Entity> {
        let mut data = FireData::new(prototype, field);
        data.position = position;
        data.coordinates = coordinates;
        data.rotation = rotation;
        data.speed = speed;
        self.fire(&data)
    }

    /// Curved shot: constant speed plus constant angular speed.
    #[expect(clippy::too_many_arguments)]
    pub fn fire_curved(
        &mut self,
        prototype: PrototypeId,
        field: FieldId,
        position: Vec2,
        coordinates: CoordinateSystem,
        rotation: f32,
        speed: f32,
        angular_speed: f32,
    ) -> Option<Entity> {
        let mut data = FireData::new(prototype, field);
        data.position = position;
        data.coordinates = coordinates;
        data.rotation = rotation;
        data.speed = speed;
        data.angular_speed = angular_speed;
        self.fire(&data)
    }
}

/// A fire-pipeline stage. Implementations snapshot the base kinematics from
/// the fire data, then launch zero or more projectiles per `fire` call,
/// either directly through the spawner or through a downstream modifier.
pub trait DanmakuModifier: Send + Sync {
    fn initialize(&mut self, data: &FireData);
    fn fire(&mut self, spawner: &mut DanmakuSpawner, position: Vec2, rotation: f32);
}

/// Fires through `modifier` when present, directly otherwise. Modified fire
/// returns `None`: the chain decides how many bullets exist and which is
/// "the" one.
pub fn fire_with(
    spawner: &mut DanmakuSpawner,
    data: &FireData,
    modifier: Option<&mut dyn DanmakuModifier>,
) -> Option<Entity> {
    match modifier {
        None => spawner.fire(data),
        Some(modifier) => {
            let Some(position) = spawner.world_point(data.field, data.position, data.coordinates)
            else {
                error!("tried to fire into unregistered danmaku field {:?}", data.field);
                return None;
            };
            modifier.initialize(data);
            modifier.fire(spawner, position, data.rotation);
            None
        }
    }
}
