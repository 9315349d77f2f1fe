//! Projectile templates.
//!
//! A prototype is the immutable default-attribute source a pooled projectile
//! is matched against on acquire: shape, collider size/offset, scale, tag,
//! layer, base color and an initial controller set. Prototypes live in an
//! explicitly registered, simulation-scoped registry and are addressed by id;
//! matching an unregistered id is a logged usage error, never a panic, so a
//! bad id cannot abort a batch update.

use std::sync::Arc;

use bevy::prelude::*;

use crate::collision::ColliderShape;
use crate::controllers::DanmakuController;

/// Immutable per-instance template for projectile defaults.
pub struct DanmakuPrototype {
    pub shape: ColliderShape,
    /// Shape size before scaling: `x` is the circle radius or the line
    /// half-length; Box uses both components as full extents. Ignored for
    /// Point.
    pub collider_size: Vec2,
    pub collider_offset: Vec2,
    pub scale: Vec2,
    pub tag: String,
    pub layer: u32,
    pub color: Color,
    /// Controllers merged into every projectile matched to this prototype.
    pub controllers: Vec<Arc<dyn DanmakuController>>,
}

impl Default for DanmakuPrototype {
    fn default() -> Self {
        Self {
            shape: ColliderShape::default(),
            collider_size: Vec2::ZERO,
            collider_offset: Vec2::ZERO,
            scale: Vec2::ONE,
            tag: String::new(),
            layer: 0,
            color: Color::WHITE,
            controllers: Vec::new(),
        }
    }
}

impl DanmakuPrototype {
    pub fn new(shape: ColliderShape, collider_size: Vec2) -> Self {
        Self {
            shape,
            collider_size,
            ..Default::default()
        }
    }
}

/// Identifier of a registered prototype.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct PrototypeId(usize);

/// Registry of prototypes, constructed at simulation start.
#[derive(Resource, Default)]
pub struct DanmakuPrototypes {
    prototypes: Vec<DanmakuPrototype>,
}

impl DanmakuPrototypes {
    pub fn register(&mut self, prototype: DanmakuPrototype) -> PrototypeId {
        self.prototypes.push(prototype);
        PrototypeId(self.prototypes.len() - 1)
    }

    pub fn get(&self, id: PrototypeId) -> Option<&DanmakuPrototype> {
        self.prototypes.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.prototypes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prototypes.is_empty()
    }
}
