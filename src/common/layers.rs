//! Per-layer collision masks.

use avian2d::prelude::*;
use bevy::prelude::*;

/// Maps a projectile's numeric layer to the set of collider layers its casts
/// scan. Built once at simulation start; projectiles cache the mask for
/// their layer when matched, so changing the matrix afterwards only affects
/// newly matched bullets.
#[derive(Resource, Default)]
pub struct CollisionMatrix {
    masks: Vec<LayerMask>,
}

impl CollisionMatrix {
    pub fn set(&mut self, layer: u32, mask: impl Into<LayerMask>) {
        let index = layer as usize;
        if index >= self.masks.len() {
            self.masks.resize(index + 1, LayerMask::ALL);
        }
        self.masks[index] = mask.into();
    }

    /// Layers without an explicit entry scan everything.
    pub fn mask(&self, layer: u32) -> LayerMask {
        self.masks
            .get(layer as usize)
            .copied()
            .unwrap_or(LayerMask::ALL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_layers_scan_everything() {
        let matrix = CollisionMatrix::default();
        assert_eq!(matrix.mask(0), LayerMask::ALL);
        assert_eq!(matrix.mask(31), LayerMask::ALL);
    }

    #[test]
    fn set_overrides_one_layer() {
        let mut matrix = CollisionMatrix::default();
        matrix.set(2, LayerMask::NONE);

        assert_eq!(matrix.mask(2), LayerMask::NONE);
        assert_eq!(matrix.mask(0), LayerMask::ALL);
        assert_eq!(matrix.mask(3), LayerMask::ALL);
    }
}
