//! Recommended camera distance.
//!
//! Legacy families have a fixed distance. Generic families derive one from
//! the realized geometry: the largest of width (layer count times family
//! spacing), height and depth (largest grid extents), scaled by the family
//! factor and floored at [`MIN_DISTANCE`].

use crate::family::ModelFamily;
use crate::graph::{CELL_SPACING, SLAB_SPACING};
use crate::layers::LayerSpec;

/// Closest recommended camera distance.
pub const MIN_DISTANCE: f32 = 12.0;

/// Scene extents `(width, height, depth)` for a generic layer list.
pub fn scene_extent(layers: &[LayerSpec], family: ModelFamily) -> (f32, f32, f32) {
    if layers.is_empty() {
        return (0.0, 0.0, 0.0);
    }
    let spacing = family.profile().layer_spacing;

    let grids: Vec<_> = layers.iter().map(LayerSpec::grid).collect();
    let max_x = grids.iter().map(|g| g.x).max().unwrap_or(1) as f32;
    let max_y = grids.iter().map(|g| g.y).max().unwrap_or(1) as f32;
    let max_z = grids.iter().map(|g| g.z).max().unwrap_or(1) as f32;

    let width = (layers.len() - 1) as f32 * spacing + max_z * CELL_SPACING * SLAB_SPACING;
    let height = max_y * CELL_SPACING;
    let depth = max_x * CELL_SPACING;
    (width, height, depth)
}

/// Recommended viewing distance for `layers` under `family`.
pub fn recommended_distance(layers: &[LayerSpec], family: ModelFamily) -> f32 {
    let profile = family.profile();
    if let Some(distance) = profile.legacy_distance {
        return distance;
    }

    let (width, height, depth) = scene_extent(layers, family);
    let extent = width.max(height).max(depth);
    (extent * profile.scale_factor).max(MIN_DISTANCE)
}
