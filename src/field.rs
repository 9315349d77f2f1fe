//! Playfields.
//!
//! A field is the bounded coordinate space projectiles are fired into: a
//! movement area (where gameplay happens) plus an outer clip boundary that
//! the per-tick bounds check culls against. Viewport/camera tracking is a
//! host concern — hosts update a field's rectangles through the registry and
//! projectiles snapshot them on assignment.

use bevy::prelude::*;

/// Coordinate conventions accepted by the mapping and firing functions.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum CoordinateSystem {
    /// Normalized [0, 1]² across the movement area; (0.5, 0.5) is the center.
    #[default]
    View,
    /// Normalized point scaled by the movement area size, without the origin
    /// offset.
    ViewRelative,
    /// Offset from the movement area's bottom-left corner, in world units.
    Relative,
    /// Absolute world coordinates.
    World,
}

/// A playfield: movement area plus clip-extended cull bounds.
#[derive(Clone, Debug)]
pub struct DanmakuField {
    movement_bounds: Rect,
    bounds: Rect,
}

impl DanmakuField {
    /// `clip_boundary` extends the cull bounds past the movement area by a
    /// fraction of its largest half-extent; `None` makes the field unbounded
    /// (bullets are never culled by it).
    pub fn new(center: Vec2, size: Vec2, clip_boundary: Option<f32>) -> Self {
        let movement_bounds = Rect::from_center_size(center, size);
        let bounds = match clip_boundary {
            Some(clip) => {
                let extents = size * 0.5;
                let padded = extents + Vec2::splat(clip * extents.max_element());
                Rect::from_center_half_size(center, padded)
            }
            None => Rect::new(
                f32::NEG_INFINITY,
                f32::NEG_INFINITY,
                f32::INFINITY,
                f32::INFINITY,
            ),
        };
        Self {
            movement_bounds,
            bounds,
        }
    }

    pub fn movement_bounds(&self) -> Rect {
        self.movement_bounds
    }

    /// Clip-extended bounds used for the per-tick bounds check.
    pub fn bounds(&self) -> Rect {
        self.bounds
    }

    pub fn center(&self) -> Vec2 {
        self.movement_bounds.center()
    }

    /// Maps `point` expressed in `coords` into world space.
    pub fn world_point(&self, point: Vec2, coords: CoordinateSystem) -> Vec2 {
        let size = self.movement_bounds.size();
        match coords {
            CoordinateSystem::World => point,
            CoordinateSystem::Relative => self.movement_bounds.min + point,
            CoordinateSystem::ViewRelative => point * size,
            CoordinateSystem::View => self.movement_bounds.min + point * size,
        }
    }

    /// Maps `point` into an offset from the movement area's bottom-left
    /// corner.
    pub fn relative_point(&self, point: Vec2, coords: CoordinateSystem) -> Vec2 {
        match coords {
            CoordinateSystem::World => point - self.movement_bounds.min,
            CoordinateSystem::Relative => point,
            CoordinateSystem::View | CoordinateSystem::ViewRelative => {
                let size = self.movement_bounds.size();
                (point - self.movement_bounds.min) / size
            }
        }
    }

    /// Maps `point` into normalized view coordinates.
    pub fn view_point(&self, point: Vec2, coords: CoordinateSystem) -> Vec2 {
        let size = self.bounds.size();
        match coords {
            CoordinateSystem::World | CoordinateSystem::ViewRelative => {
                (point - self.movement_bounds.min) / size
            }
            CoordinateSystem::Relative => point / size,
            CoordinateSystem::View => point,
        }
    }
}

/// Identifier of a registered field.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct FieldId(usize);

/// Registry of playfields, constructed at simulation start.
#[derive(Resource, Default)]
pub struct DanmakuFields {
    fields: Vec<DanmakuField>,
}

impl DanmakuFields {
    pub fn register(&mut self, field: DanmakuField) -> FieldId {
        self.fields.push(field);
        FieldId(self.fields.len() - 1)
    }

    pub fn get(&self, id: FieldId) -> Option<&DanmakuField> {
        self.fields.get(id.0)
    }

    /// Mutable access for hosts that track a moving viewport. Projectiles
    /// snapshot bounds on field assignment, so updates here affect bullets
    /// fired afterwards.
    pub fn get_mut(&mut self, id: FieldId) -> Option<&mut DanmakuField> {
        self.fields.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn view_coordinates_span_the_movement_area() {
        let field = DanmakuField::new(Vec2::ZERO, Vec2::new(20.0, 10.0), Some(1.0));

        assert_eq!(
            field.world_point(Vec2::new(0.5, 0.5), CoordinateSystem::View),
            Vec2::ZERO
        );
        assert_eq!(
            field.world_point(Vec2::new(0.0, 0.0), CoordinateSystem::View),
            Vec2::new(-10.0, -5.0)
        );
        assert_eq!(
            field.world_point(Vec2::new(1.0, 1.0), CoordinateSystem::View),
            Vec2::new(10.0, 5.0)
        );
    }

    #[test]
    fn world_and_relative_round_trip() {
        let field = DanmakuField::new(Vec2::new(5.0, 5.0), Vec2::new(10.0, 10.0), Some(0.5));

        let world = Vec2::new(3.0, 8.0);
        let relative = field.relative_point(world, CoordinateSystem::World);
        assert_eq!(
            field.world_point(relative, CoordinateSystem::Relative),
            world
        );
    }

    #[test]
    fn clip_boundary_extends_the_cull_bounds() {
        let field = DanmakuField::new(Vec2::ZERO, Vec2::new(20.0, 10.0), Some(1.0));

        // Largest half-extent is 10, so the cull bounds pad by 10 on each side.
        assert!(field.bounds().contains(Vec2::new(19.0, 14.0)));
        assert!(!field.bounds().contains(Vec2::new(21.0, 0.0)));
        assert!(!field.movement_bounds().contains(Vec2::new(19.0, 0.0)));
    }

    #[test]
    fn unbounded_fields_never_cull() {
        let field = DanmakuField::new(Vec2::ZERO, Vec2::new(20.0, 10.0), None);
        assert!(field.bounds().contains(Vec2::new(1.0e30, -1.0e30)));
    }
}
