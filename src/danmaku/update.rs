//! The per-tick state machine.
//!
//! # Data flow
//! ```text
//! FixedUpdate (fixed dt)
//! ┌────────────────────────────────────────────────────────────────────┐
//! │ update_danmaku                                                     │
//! │   per active bullet, in this order:                                │
//! │     snapshot position → controllers → tasks → rotation → motion    │
//! │     → shape cast (broad-phase gated) → handler dispatch            │
//! │     → bounds check → counters                                      │
//! │   hard deactivation (handler / out of bounds) finalizes inline;    │
//! │   soft marks become PendingDeactivation                            │
//! │                                                                    │
//! │ commit_deactivations (after update_danmaku)                        │
//! │   PendingDeactivation → Inactive, entity returns to the pool       │
//! └────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The loop must survive thousands of sequential bullets without one failure
//! aborting the batch: nothing in here panics on bad data, usage errors are
//! logged no-ops, and the scratch buffers are `Local`s reused across bullets
//! so the hot path performs no allocation.

use avian2d::prelude::*;
use bevy::prelude::*;

use crate::collision::{ColliderHandlers, DanmakuHandlers, DanmakuHit, HandlerId, collect_hits};
use crate::controllers::Controllers;
use crate::danmaku::{Danmaku, DanmakuItem, DanmakuState};
use crate::pool::DanmakuPool;
use crate::tasks::Tasks;

/// Advances controllers, tasks, rotation and motion for one tick. Returns
/// the snapshotted original position and the tick's movement vector.
///
/// Collision and lifecycle handling stay in [`update_danmaku`]; keeping the
/// integration step free of ECS access makes it directly testable.
pub(crate) fn integrate(
    danmaku: &mut Danmaku,
    controllers: &mut Controllers,
    tasks: &mut Tasks,
    dt: f32,
) -> (Vec2, Vec2) {
    let original = danmaku.position();

    if controllers.should_run() {
        controllers.invoke(danmaku, dt);
    }

    tasks.advance(danmaku);

    if danmaku.angular_speed != 0.0 {
        danmaku.set_rotation(danmaku.rotation() + danmaku.angular_speed * dt);
    }

    if danmaku.speed != 0.0 {
        let step = danmaku.speed * dt;
        danmaku.set_position(danmaku.position() + danmaku.direction() * step);
    }

    (original, danmaku.position() - original)
}

/// Collision center: the cached collider offset rotated by the current
/// direction, applied to the tick's original position. Zero offset takes the
/// cheap path.
#[inline]
fn collision_center(danmaku: &Danmaku, original: Vec2) -> Vec2 {
    let offset = danmaku.collider_offset();
    if offset == Vec2::ZERO {
        return original;
    }
    let dir = danmaku.direction();
    Vec2::new(
        original.x + dir.x * offset.x - dir.y * offset.y,
        original.y + dir.y * offset.x + dir.x * offset.y,
    )
}

/// Advances every active projectile by one fixed tick.
pub fn update_danmaku(
    time: Res<Time<Fixed>>,
    spatial: SpatialQuery,
    mut pool: ResMut<DanmakuPool>,
    mut handlers: ResMut<ColliderHandlers>,
    bindings: Query<&DanmakuHandlers>,
    mut bullets: Query<(
        Entity,
        &mut Danmaku,
        &mut DanmakuState,
        &mut Controllers,
        &mut Tasks,
    )>,
    mut hit_buf: Local<Vec<DanmakuHit>>,
    mut id_buf: Local<Vec<HandlerId>>,
) {
    let dt = time.delta_secs();

    'bullets: for (entity, mut danmaku, mut state, mut controllers, mut tasks) in &mut bullets {
        match *state {
            // PendingDeactivation bullets already had their final tick; the
            // commit system reclaims them.
            DanmakuState::Inactive | DanmakuState::PendingDeactivation => continue,
            DanmakuState::Active => {}
        }

        let (original, movement) = integrate(&mut danmaku, &mut controllers, &mut tasks, dt);

        if danmaku.collision_check {
            let center = collision_center(&danmaku, original);
            collect_hits(&spatial, &danmaku, center, movement, &mut hit_buf);

            for i in 0..hit_buf.len() {
                let hit = hit_buf[i];
                handlers.resolve_into(hit.entity, &bindings, &mut id_buf);
                for j in 0..id_buf.len() {
                    if let Some(handler) = handlers.get_mut(id_buf[j]) {
                        handler.on_danmaku_collision(
                            DanmakuItem {
                                danmaku: &mut *danmaku,
                                controllers: &mut *controllers,
                                tasks: &mut *tasks,
                            },
                            &hit,
                        );
                    }
                }
                if danmaku.is_marked_for_deactivation() {
                    // Terminate at the point of impact; later hits are never
                    // dispatched.
                    danmaku.set_position(hit.point);
                    deactivate_now(
                        &mut pool,
                        entity,
                        &mut danmaku,
                        &mut state,
                        &mut controllers,
                        &mut tasks,
                    );
                    continue 'bullets;
                }
            }
        }

        if danmaku.bounds_check && !danmaku.field_bounds().contains(danmaku.position()) {
            deactivate_now(
                &mut pool,
                entity,
                &mut danmaku,
                &mut state,
                &mut controllers,
                &mut tasks,
            );
            continue;
        }

        danmaku.tick_counters(dt);

        if danmaku.is_marked_for_deactivation() {
            *state = DanmakuState::PendingDeactivation;
        }
    }
}

/// Finalizes soft-deactivated projectiles and recycles them into the pool.
pub fn commit_deactivations(
    mut pool: ResMut<DanmakuPool>,
    mut bullets: Query<(
        Entity,
        &mut Danmaku,
        &mut DanmakuState,
        &mut Controllers,
        &mut Tasks,
    )>,
) {
    for (entity, mut danmaku, mut state, mut controllers, mut tasks) in &mut bullets {
        if *state != DanmakuState::PendingDeactivation {
            continue;
        }
        deactivate_now(
            &mut pool,
            entity,
            &mut danmaku,
            &mut state,
            &mut controllers,
            &mut tasks,
        );
    }
}

/// Immediately deactivates a projectile: group memberships are dropped on
/// both sides, behaviors and counters are cleared, and the entity returns to
/// the pool.
///
/// This is the only path that releases into the pool. Calling it on an
/// already-inactive projectile is a defensive no-op, so the release cannot
/// double-run.
pub fn deactivate_now(
    pool: &mut DanmakuPool,
    entity: Entity,
    danmaku: &mut Danmaku,
    state: &mut DanmakuState,
    controllers: &mut Controllers,
    tasks: &mut Tasks,
) {
    if *state == DanmakuState::Inactive {
        return;
    }

    danmaku.clear_groups();
    tasks.clear();
    controllers.clear();
    danmaku.damage = 0;
    danmaku.reset_counters();
    danmaku.clear_deactivation_mark();
    *state = DanmakuState::Inactive;
    pool.release(entity);
}
