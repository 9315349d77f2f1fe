//! Integration test harness.
//!
//! Keep integration tests headless:
//! - `MinimalPlugins` provides the core ECS runtime.
//! - `TransformPlugin` + Avian's `PhysicsPlugins` provide the spatial index
//!   the collision dispatch casts against.
//! - time advances manually so every `app.update()` steps exactly one fixed
//!   tick, deterministically.

use std::time::Duration;

use avian2d::prelude::*;
use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use bevy::transform::TransformPlugin;
use bevy_danmaku::DanmakuPlugin;

pub const DT: f32 = 1.0 / 60.0;

pub fn app_headless(pool_capacity: usize) -> App {
    let mut app = App::new();

    app.add_plugins((MinimalPlugins, TransformPlugin, PhysicsPlugins::default()));
    app.add_plugins(DanmakuPlugin { pool_capacity });

    app.insert_resource(Gravity(Vec2::ZERO));
    app.insert_resource(Time::<Fixed>::from_seconds(DT as f64));
    app.insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f64(
        DT as f64,
    )));

    // First update initializes the clock (and runs Startup, pre-spawning the
    // pool); fixed ticks are steady from here on.
    app.update();
    app
}

/// Advances exactly one fixed tick.
pub fn tick(app: &mut App) {
    app.update();
}
