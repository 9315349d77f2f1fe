//! Library entry point.
//!
//! `bevy_danmaku` is a bullet-hell simulation toolkit: a pooled projectile
//! store, a fixed-tick update pipeline (controllers → tasks → motion →
//! collision), four-shape collision dispatch against `avian2d` spatial
//! queries, and group/handler plumbing for gameplay reactions.
//!
//! The host app composes `avian2d`'s `PhysicsPlugins` and adds
//! [`DanmakuPlugin`]; everything else is registry resources plus the pooled
//! entities themselves.
//!
//! Integration tests in `tests/` are compiled as separate crates and import
//! this public API surface.

pub mod collision;
pub mod common;
pub mod controllers;
pub mod danmaku;
pub mod field;
pub mod fire;
pub mod groups;
pub mod plugin;
pub mod pool;
pub mod prototype;
pub mod tasks;

pub use plugin::DanmakuPlugin;
