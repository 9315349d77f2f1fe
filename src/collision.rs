//! Collision-shape dispatch and hit handler resolution.
//!
//! # Philosophy: broad-phase first
//! Every active projectile asks "did I cross anything this tick" against the
//! spatial index. At danmaku counts the swept cast is the expensive part, so
//! three of the four shapes gate it behind a cheap check:
//!
//! - **Point / Circle**: cast only if the squared movement distance exceeds
//!   the cached `size_squared` threshold, or an overlap already exists at the
//!   collision center.
//! - **Line**: same distance threshold, but the "already overlapping" probe
//!   is a single ray of the extended length.
//! - **Box**: always casts. No gate.
//!
//! The per-shape policies are intentionally not unified; they are the
//! contract. All four shapes fill one bounded scratch buffer: no more than
//! [`MAX_HITS_PER_TICK`] hits are ever reported for one projectile in one
//! tick, however many colliders overlap the sweep. Hits are sorted by
//! distance because the multi-hit spatial queries do not guarantee an order
//! and callers process hits nearest-first.
//!
//! # Handler cache
//! Hit entities resolve to handlers through [`ColliderHandlers`]: a registry
//! of handler objects plus a cache from collider entity to bound handler ids,
//! populated lazily on first encounter. Colliders with no bindings get an
//! empty entry so they are never re-queried — at thousands of hits per
//! second the negative entries matter as much as the positive ones.

use avian2d::prelude::*;
use bevy::platform::collections::HashMap;
use bevy::prelude::*;

use crate::danmaku::{Danmaku, DanmakuItem};

/// The supported collider shapes.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum ColliderShape {
    Point,
    Line,
    #[default]
    Circle,
    Box,
}

/// Upper bound on hits reported for one projectile in one tick.
pub const MAX_HITS_PER_TICK: usize = 5;

/// A single resolved collision between a projectile and a collider.
#[derive(Clone, Copy, Debug)]
pub struct DanmakuHit {
    /// The collider entity that was struck.
    pub entity: Entity,
    /// World-space contact point.
    pub point: Vec2,
    pub normal: Vec2,
    /// Distance from the collision center along the swept path.
    pub distance: f32,
}

/// Collects up to [`MAX_HITS_PER_TICK`] hits for this tick's movement into
/// `hits`, ordered nearest-first.
pub(crate) fn collect_hits(
    spatial: &SpatialQuery,
    danmaku: &Danmaku,
    center: Vec2,
    movement: Vec2,
    hits: &mut Vec<DanmakuHit>,
) {
    hits.clear();

    let filter = SpatialQueryFilter::from_mask(danmaku.collision_mask());
    let sqr_distance = movement.length_squared();
    let distance = sqr_distance.sqrt();
    // A zero movement vector has no meaningful direction; the casts below
    // then run with zero length and only report existing overlaps.
    let direction = Dir2::new(movement).unwrap_or(Dir2::Y);

    match danmaku.shape() {
        ColliderShape::Point => {
            if sqr_distance > danmaku.size_squared() || point_overlap(spatial, center, &filter) {
                ray_into(spatial, center, direction, distance, &filter, hits);
            }
        }
        ColliderShape::Line => {
            let length = distance + danmaku.collider_size().x;
            if sqr_distance > danmaku.size_squared()
                || spatial.cast_ray(center, direction, length, true, &filter).is_some()
            {
                ray_into(spatial, center, direction, length, &filter, hits);
            }
        }
        ColliderShape::Circle => {
            let Some(shape) = danmaku.cast_shape() else {
                return;
            };
            if sqr_distance > danmaku.size_squared()
                || shape_overlap(spatial, shape, center, 0.0, &filter)
            {
                sweep_into(spatial, shape, center, 0.0, direction, distance, &filter, hits);
            }
        }
        ColliderShape::Box => {
            let Some(shape) = danmaku.cast_shape() else {
                return;
            };
            let rotation = danmaku.rotation().to_radians();
            sweep_into(spatial, shape, center, rotation, direction, distance, &filter, hits);
        }
    }

    hits.sort_by(|a, b| a.distance.total_cmp(&b.distance));
}

fn point_overlap(spatial: &SpatialQuery, point: Vec2, filter: &SpatialQueryFilter) -> bool {
    let mut found = false;
    spatial.point_intersections_callback(point, filter, |_| {
        found = true;
        false
    });
    found
}

fn shape_overlap(
    spatial: &SpatialQuery,
    shape: &Collider,
    position: Vec2,
    rotation: f32,
    filter: &SpatialQueryFilter,
) -> bool {
    let mut found = false;
    spatial.shape_intersections_callback(shape, position, rotation, filter, |_| {
        found = true;
        false
    });
    found
}

fn ray_into(
    spatial: &SpatialQuery,
    origin: Vec2,
    direction: Dir2,
    max_distance: f32,
    filter: &SpatialQueryFilter,
    out: &mut Vec<DanmakuHit>,
) {
    spatial.ray_hits_callback(origin, direction, max_distance, true, filter, |hit| {
        out.push(DanmakuHit {
            entity: hit.entity,
            point: origin + *direction * hit.distance,
            normal: hit.normal,
            distance: hit.distance,
        });
        out.len() < MAX_HITS_PER_TICK
    });
}

#[expect(clippy::too_many_arguments)]
fn sweep_into(
    spatial: &SpatialQuery,
    shape: &Collider,
    origin: Vec2,
    rotation: f32,
    direction: Dir2,
    max_distance: f32,
    filter: &SpatialQueryFilter,
    out: &mut Vec<DanmakuHit>,
) {
    let config = ShapeCastConfig::from_max_distance(max_distance);
    spatial.shape_hits_callback(shape, origin, rotation, direction, &config, filter, |hit| {
        out.push(DanmakuHit {
            entity: hit.entity,
            point: hit.point1,
            normal: hit.normal1,
            distance: hit.distance,
        });
        out.len() < MAX_HITS_PER_TICK
    });
}

/// External reaction to a projectile striking a collider.
///
/// Handlers run with the full projectile view and may mutate it, attach or
/// clear behaviors, or call [`Danmaku::deactivate`] to stop this tick's hit
/// processing (the projectile then snaps to the hit point and finalizes).
pub trait DanmakuColliderHandler: Send + Sync {
    fn on_danmaku_collision(&mut self, danmaku: DanmakuItem<'_>, hit: &DanmakuHit);
}

/// Index of a registered handler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct HandlerId(usize);

/// Binds registered handlers to a collider entity. Attach this to entities
/// whose colliders projectiles can hit; colliders without it are inert to
/// the danmaku layer (but still block/report hits).
#[derive(Component, Default)]
pub struct DanmakuHandlers(pub Vec<HandlerId>);

/// Handler registry plus the collider → handler cache.
///
/// Bindings are treated as fixed once a collider has been encountered; after
/// rebinding or despawning colliders, call [`ColliderHandlers::invalidate_cache`].
#[derive(Resource, Default)]
pub struct ColliderHandlers {
    handlers: Vec<Box<dyn DanmakuColliderHandler>>,
    cache: HashMap<Entity, Vec<HandlerId>>,
}

impl ColliderHandlers {
    pub fn register(&mut self, handler: impl DanmakuColliderHandler + 'static) -> HandlerId {
        self.handlers.push(Box::new(handler));
        HandlerId(self.handlers.len() - 1)
    }

    /// Copies the handler ids bound to `collider` into `out`, resolving and
    /// caching them on first encounter. Unknown colliders cache an empty
    /// entry.
    pub(crate) fn resolve_into(
        &mut self,
        collider: Entity,
        bindings: &Query<&DanmakuHandlers>,
        out: &mut Vec<HandlerId>,
    ) {
        out.clear();
        let ids = self.cache.entry(collider).or_insert_with(|| {
            bindings
                .get(collider)
                .map(|bound| bound.0.clone())
                .unwrap_or_default()
        });
        out.extend_from_slice(ids);
    }

    pub(crate) fn get_mut(&mut self, id: HandlerId) -> Option<&mut (dyn DanmakuColliderHandler + 'static)> {
        self.handlers.get_mut(id.0).map(|handler| handler.as_mut())
    }

    /// Drops every cached binding; they re-resolve on next encounter.
    pub fn invalidate_cache(&mut self) {
        self.cache.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::test_utils::run_system_once;

    struct Noop;

    impl DanmakuColliderHandler for Noop {
        fn on_danmaku_collision(&mut self, _danmaku: DanmakuItem<'_>, _hit: &DanmakuHit) {}
    }

    fn resolve(world: &mut World, collider: Entity) -> Vec<HandlerId> {
        run_system_once(
            world,
            move |mut handlers: ResMut<ColliderHandlers>, bindings: Query<&DanmakuHandlers>| {
                let mut out = Vec::new();
                handlers.resolve_into(collider, &bindings, &mut out);
                out
            },
        )
    }

    #[test]
    fn unbound_colliders_cache_an_empty_entry() {
        let mut world = World::new();
        let mut registry = ColliderHandlers::default();
        let id = registry.register(Noop);
        world.insert_resource(registry);
        let wall = world.spawn_empty().id();

        assert!(resolve(&mut world, wall).is_empty());

        // The cached empty entry sticks even after a binding appears; it
        // takes an explicit invalidation to pick the binding up.
        world.entity_mut(wall).insert(DanmakuHandlers(vec![id]));
        assert!(resolve(&mut world, wall).is_empty());

        world.resource_mut::<ColliderHandlers>().invalidate_cache();
        assert_eq!(resolve(&mut world, wall), vec![id]);
    }

    #[test]
    fn bound_colliders_resolve_their_handler_ids() {
        let mut world = World::new();
        let mut registry = ColliderHandlers::default();
        let first = registry.register(Noop);
        let second = registry.register(Noop);
        world.insert_resource(registry);

        let wall = world.spawn(DanmakuHandlers(vec![second, first])).id();

        // Binding order is dispatch order.
        assert_eq!(resolve(&mut world, wall), vec![second, first]);
    }
}
