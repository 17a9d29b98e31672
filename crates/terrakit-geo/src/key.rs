//! Quadtree tile keys.

use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::{GeoError, GeoResult};
use crate::extent::GeoExtent;
use crate::profile::Profile;

/// A `(lod, x, y)` address of one tile within a [`Profile`].
///
/// Keys are validated on construction, so every `TileKey` value addresses a
/// real tile. Operations that may fail to produce a key return `Option`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileKey {
    lod: u32,
    x: u32,
    y: u32,
    profile: Profile,
}

impl TileKey {
    /// Create a key, checking `x` and `y` against the tile counts at `lod`.
    pub fn new(lod: u32, x: u32, y: u32, profile: Profile) -> GeoResult<Self> {
        let (wide, high) = profile.tile_count(lod);
        if u64::from(x) >= wide || u64::from(y) >= high {
            return Err(GeoError::OutOfRange {
                context: "tile key",
                detail: format!("{lod}/{x}/{y} exceeds {wide}x{high} tiles"),
            });
        }
        Ok(Self { lod, x, y, profile })
    }

    /// The key of the tile containing a point, at `lod`.
    #[must_use]
    pub fn from_point(profile: Profile, lod: u32, x: f64, y: f64) -> Option<Self> {
        let extent = profile.extent();
        if x < extent.x_min() || x > extent.x_max() || y < extent.y_min() || y > extent.y_max() {
            return None;
        }
        let (width, height) = profile.tile_dimensions(lod);
        let (wide, high) = profile.tile_count(lod);
        let col = ((x - extent.x_min()) / width).floor() as u64;
        let row = ((extent.y_max() - y) / height).floor() as u64;
        let col = u32::try_from(col.min(wide - 1)).ok()?;
        let row = u32::try_from(row.min(high - 1)).ok()?;
        Self::new(lod, col, row, profile).ok()
    }

    /// Quadtree level; 0 is the root.
    #[must_use]
    pub fn level_of_detail(&self) -> u32 {
        self.lod
    }

    /// Column, counted from the west.
    #[must_use]
    pub fn tile_x(&self) -> u32 {
        self.x
    }

    /// Row, counted from the north.
    #[must_use]
    pub fn tile_y(&self) -> u32 {
        self.y
    }

    /// The profile this key tiles.
    #[must_use]
    pub fn profile(&self) -> &Profile {
        &self.profile
    }

    /// Georeferenced extent in the key's profile SRS.
    #[must_use]
    pub fn extent(&self) -> GeoExtent {
        self.profile.tile_extent(self.lod, self.x, self.y)
    }

    /// The ancestor of this key at `target_lod`.
    ///
    /// Returns the key itself when `target_lod` equals its level and `None`
    /// when `target_lod` is deeper.
    #[must_use]
    pub fn create_ancestor_key(&self, target_lod: u32) -> Option<TileKey> {
        if target_lod > self.lod {
            return None;
        }
        let shift = self.lod - target_lod;
        Some(Self {
            lod: target_lod,
            x: self.x >> shift,
            y: self.y >> shift,
            profile: self.profile,
        })
    }

    /// The key one level up, or `None` at the root.
    #[must_use]
    pub fn create_parent_key(&self) -> Option<TileKey> {
        self.lod
            .checked_sub(1)
            .and_then(|lod| self.create_ancestor_key(lod))
    }

    /// The child in `quadrant` (0 = NW, 1 = NE, 2 = SW, 3 = SE).
    #[must_use]
    pub fn create_child_key(&self, quadrant: u32) -> TileKey {
        Self {
            lod: self.lod + 1,
            x: self.x * 2 + (quadrant & 1),
            y: self.y * 2 + ((quadrant >> 1) & 1),
            profile: self.profile,
        }
    }

    /// Whether `self` is `other` or one of its ancestors.
    #[must_use]
    pub fn is_ancestor_of(&self, other: &TileKey) -> bool {
        other
            .create_ancestor_key(self.lod)
            .is_some_and(|ancestor| ancestor == *self)
    }
}

// Profiles are built from finite, validated coordinates.
impl Eq for TileKey {}

impl Hash for TileKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.lod.hash(state);
        self.x.hash(state);
        self.y.hash(state);
        self.profile.srs().hash(state);
    }
}

impl fmt::Display for TileKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.lod, self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_rejects_out_of_range() {
        let p = Profile::global_geodetic();
        assert!(TileKey::new(0, 1, 0, p).is_ok());
        assert!(matches!(
            TileKey::new(0, 2, 0, p),
            Err(GeoError::OutOfRange { .. })
        ));
        assert!(TileKey::new(0, 0, 1, p).is_err());
    }

    #[test]
    fn test_ancestor() {
        let key = TileKey::new(5, 21, 13, Profile::global_geodetic()).unwrap();
        let ancestor = key.create_ancestor_key(3).unwrap();
        assert_eq!(
            (ancestor.level_of_detail(), ancestor.tile_x(), ancestor.tile_y()),
            (3, 5, 3)
        );
        assert_eq!(key.create_ancestor_key(5), Some(key));
        assert_eq!(key.create_ancestor_key(6), None);
        assert!(ancestor.is_ancestor_of(&key));
    }

    #[test]
    fn test_parent_of_root_is_none() {
        let root = TileKey::new(0, 0, 0, Profile::global_geodetic()).unwrap();
        assert!(root.create_parent_key().is_none());
    }

    #[test]
    fn test_child_round_trip() {
        let key = TileKey::new(2, 3, 1, Profile::global_geodetic()).unwrap();
        for quadrant in 0..4 {
            let child = key.create_child_key(quadrant);
            assert_eq!(child.create_parent_key(), Some(key));
        }
    }

    #[test]
    fn test_from_point() {
        let p = Profile::global_geodetic();
        // Paris.
        let key = TileKey::from_point(p, 10, 2.35, 48.85).unwrap();
        assert!(key.extent().contains(2.35, 48.85));
        assert!(TileKey::from_point(p, 3, 200.0, 0.0).is_none());
    }

    #[test]
    fn test_display() {
        let key = TileKey::new(4, 7, 2, Profile::spherical_mercator()).unwrap();
        assert_eq!(key.to_string(), "4/7/2");
    }

    proptest! {
        #[test]
        fn prop_ancestor_extent_contains_key(lod in 0u32..20, fx in 0.0f64..1.0, fy in 0.0f64..1.0, up in 0u32..20) {
            let p = Profile::global_geodetic();
            let (wide, high) = p.tile_count(lod);
            let x = ((fx * wide as f64) as u64).min(wide - 1) as u32;
            let y = ((fy * high as f64) as u64).min(high - 1) as u32;
            let key = TileKey::new(lod, x, y, p).unwrap();
            let target = lod.saturating_sub(up);
            let ancestor = key.create_ancestor_key(target).unwrap();
            let (cx, cy) = key.extent().center();
            prop_assert!(ancestor.extent().contains(cx, cy));
            prop_assert!(ancestor.is_ancestor_of(&key));
        }
    }
}
