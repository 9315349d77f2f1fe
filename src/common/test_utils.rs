//! Test helpers.
//!
//! `World::run_system_once` (via the `RunSystemOnce` trait) executes a system
//! without building a full schedule. Systems that use `Commands` enqueue
//! structural changes, so we flush the world after running to apply them
//! before assertions.

use bevy::ecs::system::{IntoSystem, RunSystemOnce};
use bevy::prelude::*;

/// Run a system once on the given world, then flush deferred commands.
/// Returns the system output.
pub fn run_system_once<T, Out, Marker>(world: &mut World, system: T) -> Out
where
    T: IntoSystem<(), Out, Marker>,
{
    let out = world.run_system_once(system).expect("system run failed");
    world.flush();
    out
}
