//! The projectile entity.
//!
//! # Component split
//! One bullet is one pooled entity carrying [`Danmaku`] (kinematics, cached
//! collision shape, flags, counters, memberships), [`DanmakuState`]
//! (lifecycle), [`Controllers`] and [`Tasks`]. The split is deliberate:
//! controllers and tasks receive `&mut Danmaku` while their own list is being
//! iterated, which only borrows cleanly because the lists live in sibling
//! components.
//!
//! # Conventions
//! Rotation is in degrees with 0 pointing straight up and increasing
//! counter-clockwise (90 = left, 180 = down, 270 = right). The unit direction
//! vector is derived from rotation on every rotation write and cached, so the
//! hot path never calls trig for bullets that fly straight.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::collision::ColliderShape;
use crate::common::layers::CollisionMatrix;
use crate::controllers::Controllers;
use crate::field::{DanmakuFields, FieldId};
use crate::groups::DanmakuGroup;
use crate::prototype::{DanmakuPrototype, PrototypeId};
use crate::tasks::Tasks;

mod update;

pub use update::{commit_deactivations, deactivate_now, update_danmaku};

#[cfg(test)]
mod tests;

/// Lifecycle state of a pooled projectile.
#[derive(Component, Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum DanmakuState {
    #[default]
    Inactive,
    Active,
    /// Still updates for the remainder of the current tick, then finalized by
    /// [`commit_deactivations`] before the next one.
    PendingDeactivation,
}

/// A single projectile.
///
/// Instances are pre-spawned by the pool and recycled; "creation" is
/// acquiring an inactive one and activating it, "destruction" returns it to
/// the pool with all transient state cleared.
#[derive(Component)]
pub struct Danmaku {
    entity: Entity,
    prototype: Option<PrototypeId>,

    position: Vec2,
    rotation: f32,
    direction: Vec2,
    pub speed: f32,
    /// Degrees per second; a non-zero value makes the bullet curve.
    pub angular_speed: f32,

    pub color: Color,
    pub damage: i32,
    pub scale: f32,
    pub tag: String,
    layer: u32,
    collision_mask: LayerMask,

    shape: ColliderShape,
    collider_size: Vec2,
    collider_offset: Vec2,
    size_squared: f32,
    cast_shape: Option<Collider>,

    pub bounds_check: bool,
    pub collision_check: bool,
    to_deactivate: bool,

    frames: u32,
    time: f32,

    groups: Vec<DanmakuGroup>,
    field: Option<FieldId>,
    field_bounds: Rect,
}

impl Default for Danmaku {
    fn default() -> Self {
        Self {
            entity: Entity::PLACEHOLDER,
            prototype: None,
            position: Vec2::ZERO,
            rotation: 0.0,
            direction: Vec2::Y,
            speed: 0.0,
            angular_speed: 0.0,
            color: Color::WHITE,
            damage: 0,
            scale: 1.0,
            tag: String::new(),
            layer: 0,
            collision_mask: LayerMask::ALL,
            shape: ColliderShape::default(),
            collider_size: Vec2::ZERO,
            collider_offset: Vec2::ZERO,
            size_squared: 0.0,
            cast_shape: None,
            bounds_check: true,
            collision_check: true,
            to_deactivate: false,
            frames: 0,
            time: 0.0,
            groups: Vec::new(),
            field: None,
            field_bounds: infinite_rect(),
        }
    }
}

impl Danmaku {
    /// The pool entity backing this projectile. Stable while active; reused
    /// for another bullet after deactivation.
    pub fn entity(&self) -> Entity {
        self.entity
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
    }

    /// Rotation in degrees. 0 points straight up, 90 left, 180 down, 270
    /// right.
    pub fn rotation(&self) -> f32 {
        self.rotation
    }

    pub fn set_rotation(&mut self, rotation: f32) {
        self.rotation = rotation;
        self.direction = unit_circle(rotation);
    }

    /// The unit direction vector the projectile is facing. Derived from
    /// rotation; writing one updates the other.
    pub fn direction(&self) -> Vec2 {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Vec2) {
        self.direction = direction.try_normalize().unwrap_or(Vec2::Y);
        self.rotation = self.direction.y.atan2(self.direction.x).to_degrees() - 90.0;
    }

    /// Moves the bullet up to `max_distance_delta` closer to `target`; a
    /// negative delta moves it away instead.
    pub fn move_towards(&mut self, target: Vec2, max_distance_delta: f32) {
        self.position = self.position.move_towards(target, max_distance_delta);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.position += delta;
    }

    pub fn rotate(&mut self, delta_degrees: f32) {
        self.set_rotation(self.rotation + delta_degrees);
    }

    pub fn layer(&self) -> u32 {
        self.layer
    }

    /// Changing the layer re-derives the collision mask from the matrix.
    pub fn set_layer(&mut self, layer: u32, matrix: &CollisionMatrix) {
        self.layer = layer;
        self.collision_mask = matrix.mask(layer);
    }

    pub fn collision_mask(&self) -> LayerMask {
        self.collision_mask
    }

    pub fn shape(&self) -> ColliderShape {
        self.shape
    }

    /// Cached collider size: `x` is the circle radius or line half-length,
    /// Box uses both components.
    pub fn collider_size(&self) -> Vec2 {
        self.collider_size
    }

    pub fn collider_offset(&self) -> Vec2 {
        self.collider_offset
    }

    pub fn prototype(&self) -> Option<PrototypeId> {
        self.prototype
    }

    /// Ticks survived since activation.
    pub fn frames(&self) -> u32 {
        self.frames
    }

    /// Seconds since activation, accumulated from fixed ticks while active.
    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn field(&self) -> Option<FieldId> {
        self.field
    }

    /// Bounds the per-tick bounds check culls against; snapshotted from the
    /// field when it is assigned.
    pub fn field_bounds(&self) -> Rect {
        self.field_bounds
    }

    /// Associates the projectile with a field, snapshotting its current
    /// bounds. Assigning an unregistered field is a logged no-op.
    pub fn set_field(&mut self, field: FieldId, fields: &DanmakuFields) {
        match fields.get(field) {
            Some(data) => {
                self.field = Some(field);
                self.field_bounds = data.bounds();
            }
            None => error!("assigned unregistered danmaku field {field:?}"),
        }
    }

    /// Copies the prototype's cached defaults into this projectile.
    ///
    /// Shape data (collider size/offset, the squared broad-phase threshold
    /// and the cast shape) is only rebuilt when the prototype actually
    /// changed; tag, color, scale, layer and mask are refreshed every call,
    /// and the prototype's initial controllers are merged in.
    pub fn match_prototype(
        &mut self,
        id: PrototypeId,
        prototype: &DanmakuPrototype,
        controllers: &mut Controllers,
        matrix: &CollisionMatrix,
    ) {
        if self.prototype != Some(id) {
            self.prototype = Some(id);
            let scale = prototype.scale;
            self.shape = prototype.shape;
            self.collider_size = match prototype.shape {
                ColliderShape::Point => Vec2::ZERO,
                ColliderShape::Circle => prototype.collider_size * scale.max_element(),
                ColliderShape::Line => prototype.collider_size,
                ColliderShape::Box => prototype.collider_size * scale,
            };
            self.size_squared = self.collider_size.y * self.collider_size.y;
            self.collider_offset = scale * prototype.collider_offset;
            self.cast_shape = match prototype.shape {
                ColliderShape::Circle => Some(Collider::circle(self.collider_size.x)),
                ColliderShape::Box => {
                    Some(Collider::rectangle(self.collider_size.x, self.collider_size.y))
                }
                ColliderShape::Point | ColliderShape::Line => None,
            };
        }

        self.tag.clone_from(&prototype.tag);
        self.color = prototype.color;
        self.scale = 1.0;
        self.layer = prototype.layer;
        self.collision_mask = matrix.mask(prototype.layer);

        for controller in &prototype.controllers {
            controllers.add(controller.clone());
        }
    }

    /// Marks the bullet for deactivation: the current tick completes, then
    /// the bullet finalizes before it would update again. From a collider
    /// handler this terminates the tick's remaining hit processing instead.
    pub fn deactivate(&mut self) {
        self.to_deactivate = true;
    }

    pub fn is_marked_for_deactivation(&self) -> bool {
        self.to_deactivate
    }

    /// Activates an acquired projectile. Re-enables the bounds and collision
    /// checks and clears any pending deactivation mark.
    pub fn activate(&mut self, state: &mut DanmakuState) {
        self.to_deactivate = false;
        self.bounds_check = true;
        self.collision_check = true;
        *state = DanmakuState::Active;
    }

    /// Adds this projectile to `group`, mirroring membership on both sides.
    /// Adding to a group that already contains it is a no-op.
    pub fn add_to_group(&mut self, group: &DanmakuGroup) {
        if !group.contains(self.entity) {
            self.groups.push(group.clone());
            group.insert(self.entity);
        }
    }

    /// Removes this projectile from `group`, mirroring membership on both
    /// sides.
    pub fn remove_from_group(&mut self, group: &DanmakuGroup) {
        if group.contains(self.entity) {
            self.groups.retain(|held| !held.same_group(group));
            group.remove(self.entity);
        }
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub(crate) fn set_entity(&mut self, entity: Entity) {
        self.entity = entity;
    }

    pub(crate) fn set_field_snapshot(&mut self, field: FieldId, bounds: Rect) {
        self.field = Some(field);
        self.field_bounds = bounds;
    }

    pub(crate) fn size_squared(&self) -> f32 {
        self.size_squared
    }

    pub(crate) fn cast_shape(&self) -> Option<&Collider> {
        self.cast_shape.as_ref()
    }

    pub(crate) fn clear_deactivation_mark(&mut self) {
        self.to_deactivate = false;
    }

    pub(crate) fn tick_counters(&mut self, dt: f32) {
        self.frames += 1;
        self.time += dt;
    }

    pub(crate) fn reset_counters(&mut self) {
        self.frames = 0;
        self.time = 0.0;
    }

    pub(crate) fn clear_groups(&mut self) {
        for group in self.groups.drain(..) {
            group.remove(self.entity);
        }
    }
}

/// Mutable view of one projectile's components, handed to collider handlers.
pub struct DanmakuItem<'a> {
    pub danmaku: &'a mut Danmaku,
    pub controllers: &'a mut Controllers,
    pub tasks: &'a mut Tasks,
}

/// Everything a pooled projectile entity carries.
#[derive(Bundle, Default)]
pub struct DanmakuBundle {
    pub danmaku: Danmaku,
    pub state: DanmakuState,
    pub controllers: Controllers,
    pub tasks: Tasks,
}

/// Maps a rotation in degrees to its unit direction: 0° points up and the
/// angle sweeps counter-clockwise.
pub(crate) fn unit_circle(degrees: f32) -> Vec2 {
    let radians = degrees.to_radians();
    Vec2::new(-radians.sin(), radians.cos())
}

fn infinite_rect() -> Rect {
    Rect::new(f32::NEG_INFINITY, f32::NEG_INFINITY, f32::INFINITY, f32::INFINITY)
}
