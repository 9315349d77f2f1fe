//! Projectile entity tests: rotation conventions, integration order, group
//! mirroring and prototype matching. Collision and lifecycle flows that need
//! a spatial index live in the integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bevy::prelude::*;

use super::update::integrate;
use super::{Danmaku, unit_circle};
use crate::collision::ColliderShape;
use crate::common::layers::CollisionMatrix;
use crate::controllers::{Controllers, DanmakuController};
use crate::field::{DanmakuField, DanmakuFields};
use crate::groups::DanmakuGroup;
use crate::prototype::{DanmakuPrototype, DanmakuPrototypes};
use crate::tasks::Tasks;

const DT: f32 = 1.0 / 60.0;

fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        (actual - expected).length() < 1.0e-5,
        "expected {expected:?}, got {actual:?}"
    );
}

#[test]
fn rotation_zero_points_up() {
    let mut danmaku = Danmaku::default();
    danmaku.set_rotation(0.0);
    assert_close(danmaku.direction(), Vec2::Y);
}

#[test]
fn rotation_sweeps_counter_clockwise() {
    assert_close(unit_circle(90.0), Vec2::new(-1.0, 0.0));
    assert_close(unit_circle(180.0), Vec2::new(0.0, -1.0));
    assert_close(unit_circle(270.0), Vec2::new(1.0, 0.0));
}

#[test]
fn direction_right_maps_to_minus_ninety() {
    let mut danmaku = Danmaku::default();
    danmaku.set_direction(Vec2::X);
    assert!((danmaku.rotation() - (-90.0)).abs() < 1.0e-4);

    // Round-trip through the derived direction is stable.
    let direction = danmaku.direction();
    danmaku.set_direction(direction);
    assert!((danmaku.rotation() - (-90.0)).abs() < 1.0e-4);
    assert_close(danmaku.direction(), Vec2::X);
}

#[test]
fn straight_line_motion_is_exact() {
    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();
    let mut tasks = Tasks::default();

    danmaku.set_position(Vec2::new(2.0, -3.0));
    danmaku.set_rotation(270.0);
    danmaku.speed = 120.0;

    let original = danmaku.position();
    let direction = danmaku.direction();
    let (snapshot, movement) = integrate(&mut danmaku, &mut controllers, &mut tasks, DT);

    assert_eq!(snapshot, original);
    // No angular speed: exactly original + direction * speed * dt, no drift.
    assert_eq!(danmaku.position(), original + direction * (danmaku.speed * DT));
    assert_eq!(movement, danmaku.position() - original);
}

#[test]
fn angular_speed_rederives_direction() {
    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();
    let mut tasks = Tasks::default();

    danmaku.angular_speed = 90.0;
    integrate(&mut danmaku, &mut controllers, &mut tasks, DT);

    assert_eq!(danmaku.rotation(), 90.0 * DT);
    assert_close(danmaku.direction(), unit_circle(danmaku.rotation()));
}

#[test]
fn controllers_run_before_tasks_before_motion() {
    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();
    let mut tasks = Tasks::default();

    danmaku.set_position(Vec2::ZERO);
    controllers.add_fn(|d, _| d.speed = 60.0);

    let seen = Arc::new(Mutex::new(Vec::new()));
    let log = seen.clone();
    tasks.start(move |d: &mut Danmaku| {
        // Tasks observe controller effects but run before motion.
        log.lock().unwrap().push((d.speed, d.position()));
        crate::tasks::TaskStep::Continue
    });

    integrate(&mut danmaku, &mut controllers, &mut tasks, DT);

    let seen = seen.lock().unwrap();
    assert_eq!(*seen, vec![(60.0, Vec2::ZERO)]);
    assert_close(danmaku.position(), Vec2::new(0.0, 60.0 * DT));
}

#[test]
fn cleared_controllers_never_run() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter: Arc<dyn DanmakuController> = {
        let calls = calls.clone();
        Arc::new(move |_: &mut Danmaku, _: f32| {
            calls.fetch_add(1, Ordering::Relaxed);
        })
    };

    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();
    let mut tasks = Tasks::default();

    controllers.add(counter.clone());
    controllers.add(counter);
    controllers.clear();

    integrate(&mut danmaku, &mut controllers, &mut tasks, DT);

    assert_eq!(calls.load(Ordering::Relaxed), 0);
}

#[test]
fn group_membership_is_mirrored_and_deduplicated() {
    let mut world = World::new();
    let entity = world.spawn_empty().id();

    let mut danmaku = Danmaku::default();
    danmaku.set_entity(entity);

    let group = DanmakuGroup::new();
    danmaku.add_to_group(&group);
    danmaku.add_to_group(&group);

    assert!(group.contains(entity));
    assert_eq!(group.len(), 1);
    assert_eq!(danmaku.group_count(), 1);

    danmaku.remove_from_group(&group);
    assert!(!group.contains(entity));
    assert_eq!(danmaku.group_count(), 0);
}

#[test]
fn clearing_groups_empties_both_sides() {
    let mut world = World::new();
    let entity = world.spawn_empty().id();

    let mut danmaku = Danmaku::default();
    danmaku.set_entity(entity);

    let near = DanmakuGroup::new();
    let far = DanmakuGroup::new();
    danmaku.add_to_group(&near);
    danmaku.add_to_group(&far);

    danmaku.clear_groups();

    assert!(near.is_empty());
    assert!(far.is_empty());
    assert_eq!(danmaku.group_count(), 0);
}

#[test]
fn match_prototype_caches_shape_and_scales_it() {
    let mut prototypes = DanmakuPrototypes::default();
    let circle = prototypes.register(DanmakuPrototype {
        scale: Vec2::new(2.0, 3.0),
        tag: "orb".into(),
        layer: 1,
        ..DanmakuPrototype::new(ColliderShape::Circle, Vec2::splat(4.0))
    });
    let line = prototypes.register(DanmakuPrototype {
        scale: Vec2::new(2.0, 3.0),
        ..DanmakuPrototype::new(ColliderShape::Line, Vec2::new(6.0, 1.0))
    });
    let matrix = CollisionMatrix::default();

    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();

    danmaku.match_prototype(circle, prototypes.get(circle).unwrap(), &mut controllers, &matrix);
    // Circle radius scales by the largest scale component.
    assert_eq!(danmaku.collider_size(), Vec2::splat(4.0) * 3.0);
    assert_eq!(danmaku.size_squared(), danmaku.collider_size().y * danmaku.collider_size().y);
    assert_eq!(danmaku.tag, "orb");
    assert_eq!(danmaku.layer(), 1);
    assert!(danmaku.cast_shape().is_some());

    // Line sizes are cached unscaled, and re-matching swaps the shape data.
    danmaku.match_prototype(line, prototypes.get(line).unwrap(), &mut controllers, &matrix);
    assert_eq!(danmaku.shape(), ColliderShape::Line);
    assert_eq!(danmaku.collider_size(), Vec2::new(6.0, 1.0));
    assert_eq!(danmaku.size_squared(), 1.0);
    assert!(danmaku.cast_shape().is_none());
}

#[test]
fn match_prototype_merges_initial_controllers_every_match() {
    let mut prototypes = DanmakuPrototypes::default();
    let id = prototypes.register(DanmakuPrototype {
        controllers: vec![Arc::new(|d: &mut Danmaku, _: f32| d.speed += 1.0)],
        ..DanmakuPrototype::default()
    });
    let matrix = CollisionMatrix::default();

    let mut danmaku = Danmaku::default();
    let mut controllers = Controllers::default();

    danmaku.match_prototype(id, prototypes.get(id).unwrap(), &mut controllers, &matrix);
    assert_eq!(controllers.len(), 1);

    danmaku.match_prototype(id, prototypes.get(id).unwrap(), &mut controllers, &matrix);
    assert_eq!(controllers.len(), 2);
}

#[test]
fn set_field_snapshots_the_current_bounds() {
    let mut fields = DanmakuFields::default();
    let id = fields.register(DanmakuField::new(Vec2::ZERO, Vec2::splat(10.0), Some(0.0)));

    let mut danmaku = Danmaku::default();
    danmaku.set_field(id, &fields);

    assert_eq!(danmaku.field(), Some(id));
    let snapshot = danmaku.field_bounds();
    assert!(snapshot.contains(Vec2::splat(4.0)));
    assert!(!snapshot.contains(Vec2::splat(6.0)));

    // Later registry updates do not reach bullets already associated.
    *fields.get_mut(id).unwrap() = DanmakuField::new(Vec2::ZERO, Vec2::splat(100.0), Some(0.0));
    assert_eq!(danmaku.field_bounds(), snapshot);
}

#[test]
fn move_towards_with_negative_delta_moves_away() {
    let mut danmaku = Danmaku::default();
    danmaku.set_position(Vec2::new(1.0, 0.0));

    danmaku.move_towards(Vec2::new(5.0, 0.0), 2.0);
    assert_close(danmaku.position(), Vec2::new(3.0, 0.0));

    danmaku.move_towards(Vec2::new(5.0, 0.0), -2.0);
    assert_close(danmaku.position(), Vec2::new(1.0, 0.0));
}
