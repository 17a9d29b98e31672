//! Pool keys for shared tile geometry.

use terrakit_geo::{Srs, TileKey};

/// Identifies a family of congruent tile meshes.
///
/// On a geocentric globe every tile in one row at one level has the same
/// shape, only rotated about the polar axis. In a projected world every tile at
/// one level has the same shape. Ordering is lexicographic over the fields in
/// declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GeometryKey {
    pub lod: i32,
    pub tile_y: i32,
    pub size: u32,
    pub patch: bool,
}

impl GeometryKey {
    /// The pool key for tile `key` tessellated at `size` in `world_srs`.
    #[must_use]
    pub fn for_tile_key(key: &TileKey, size: u32, world_srs: Srs) -> Self {
        let lod = i32::try_from(key.level_of_detail()).unwrap_or(i32::MAX);
        let tile_y = if world_srs.is_geocentric() {
            i32::try_from(key.tile_y()).unwrap_or(i32::MAX)
        } else {
            0
        };
        Self {
            lod,
            tile_y,
            size,
            patch: false,
        }
    }
}

impl Default for GeometryKey {
    fn default() -> Self {
        Self {
            lod: -1,
            tile_y: 0,
            size: 0,
            patch: false,
        }
    }
}
