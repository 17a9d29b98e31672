//! Tiling profiles.
//!
//! A profile pairs an SRS with the layout of its root tiles. Every quadtree
//! level doubles the tile count along both axes.

use std::fmt;

use crate::error::{GeoError, GeoResult};
use crate::extent::GeoExtent;
use crate::srs::{MERCATOR_MAX, MERCATOR_MAX_LATITUDE, Srs};

/// Deepest level `equivalent_lod` will scan to.
const MAX_LOD: u32 = 40;

/// An SRS plus a root tiling scheme.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Profile {
    extent: GeoExtent,
    tiles_wide: u32,
    tiles_high: u32,
}

impl Profile {
    /// WGS84 with two 180°×180° root tiles.
    #[must_use]
    pub fn global_geodetic() -> Self {
        Self {
            extent: GeoExtent::from_bounds(Srs::Geographic, -180.0, -90.0, 180.0, 90.0),
            tiles_wide: 2,
            tiles_high: 1,
        }
    }

    /// Spherical mercator with one square root tile.
    #[must_use]
    pub fn spherical_mercator() -> Self {
        Self {
            extent: GeoExtent::from_bounds(
                Srs::SphericalMercator,
                -MERCATOR_MAX,
                -MERCATOR_MAX,
                MERCATOR_MAX,
                MERCATOR_MAX,
            ),
            tiles_wide: 1,
            tiles_high: 1,
        }
    }

    /// A custom profile over `extent` with the given root tile counts.
    pub fn new(extent: GeoExtent, tiles_wide: u32, tiles_high: u32) -> GeoResult<Self> {
        if extent.srs().is_geocentric() {
            return Err(GeoError::UnsupportedTransform {
                from: extent.srs(),
                to: extent.srs(),
            });
        }
        if tiles_wide == 0 || tiles_high == 0 {
            return Err(GeoError::OutOfRange {
                context: "root tile count",
                detail: format!("{tiles_wide}x{tiles_high}"),
            });
        }
        if extent.width() <= 0.0 || extent.height() <= 0.0 {
            return Err(GeoError::InvalidExtent {
                detail: format!("profile extent {extent} is empty"),
            });
        }
        Ok(Self {
            extent,
            tiles_wide,
            tiles_high,
        })
    }

    /// Look up a well-known profile by name.
    pub fn from_name(name: &str) -> GeoResult<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "global-geodetic" | "geodetic" | "wgs84" => Ok(Self::global_geodetic()),
            "spherical-mercator" | "mercator" | "epsg:3857" => Ok(Self::spherical_mercator()),
            _ => Err(GeoError::UnknownProfile(name.to_string())),
        }
    }

    /// The well-known name of this profile, if it is one.
    #[must_use]
    pub fn well_known_name(&self) -> Option<&'static str> {
        if self.is_horiz_equivalent_to(&Self::global_geodetic()) {
            Some("global-geodetic")
        } else if self.is_horiz_equivalent_to(&Self::spherical_mercator()) {
            Some("spherical-mercator")
        } else {
            None
        }
    }

    /// The SRS tiles are laid out in.
    #[must_use]
    pub fn srs(&self) -> Srs {
        self.extent.srs()
    }

    /// Area covered by the root tiles.
    #[must_use]
    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    /// Root tile counts as `(wide, high)`.
    #[must_use]
    pub fn root_tiles(&self) -> (u32, u32) {
        (self.tiles_wide, self.tiles_high)
    }

    /// Tile counts at `lod` as `(wide, high)`.
    #[must_use]
    pub fn tile_count(&self, lod: u32) -> (u64, u64) {
        let factor = 1u64.checked_shl(lod).unwrap_or(u64::MAX);
        (
            u64::from(self.tiles_wide).saturating_mul(factor),
            u64::from(self.tiles_high).saturating_mul(factor),
        )
    }

    /// Size of one tile at `lod` as `(width, height)` in SRS units.
    #[must_use]
    pub fn tile_dimensions(&self, lod: u32) -> (f64, f64) {
        let (wide, high) = self.tile_count(lod);
        (
            self.extent.width() / wide as f64,
            self.extent.height() / high as f64,
        )
    }

    /// Extent of tile `(x, y)` at `lod`; row 0 is the northernmost.
    #[must_use]
    pub fn tile_extent(&self, lod: u32, x: u32, y: u32) -> GeoExtent {
        let (width, height) = self.tile_dimensions(lod);
        let x_min = self.extent.x_min() + width * f64::from(x);
        let y_max = self.extent.y_max() - height * f64::from(y);
        GeoExtent::from_bounds(self.srs(), x_min, y_max - height, x_min + width, y_max)
    }

    /// Whether two profiles share SRS, extent and root layout.
    #[must_use]
    pub fn is_horiz_equivalent_to(&self, other: &Profile) -> bool {
        const EPSILON: f64 = 1e-6;
        let a = &self.extent;
        let b = &other.extent;
        self.srs().is_horiz_equivalent_to(other.srs())
            && self.tiles_wide == other.tiles_wide
            && self.tiles_high == other.tiles_high
            && (a.x_min() - b.x_min()).abs() < EPSILON
            && (a.y_min() - b.y_min()).abs() < EPSILON
            && (a.x_max() - b.x_max()).abs() < EPSILON
            && (a.y_max() - b.y_max()).abs() < EPSILON
    }

    /// The level in this profile whose tile span best matches `other_lod` in
    /// `other`.
    ///
    /// Tile widths are compared after converting the other profile's width
    /// into this profile's units. The scan stops once this profile's tiles
    /// become narrower than the target, keeping whichever of the two bracketing
    /// levels is closest.
    #[must_use]
    pub fn equivalent_lod(&self, other: &Profile, other_lod: u32) -> u32 {
        if self.is_horiz_equivalent_to(other) {
            return other_lod;
        }

        let (other_width, _) = other.tile_dimensions(other_lod);
        if other_width <= 0.0 {
            return other_lod;
        }
        let target = other.srs().units().convert_to(self.srs().units(), other_width);

        let mut best_lod = 0;
        let mut best_delta = f64::MAX;
        for lod in 0..=MAX_LOD {
            let (width, _) = self.tile_dimensions(lod);
            let delta = (width - target).abs();
            if delta < best_delta {
                best_delta = delta;
                best_lod = lod;
            }
            if width < target {
                break;
            }
        }
        best_lod
    }

    /// Reproject `extent` into this profile's SRS and clip it to the valid
    /// domain.
    ///
    /// Geographic results keep a wrapped east edge so callers can detect and
    /// split antimeridian crossings. Returns `None` when nothing remains.
    #[must_use]
    pub fn clamp_and_transform_extent(&self, extent: &GeoExtent) -> Option<GeoExtent> {
        let source = if extent.srs().is_geographic() && self.srs().is_projected() {
            // Clip to the mercator latitude band before projecting.
            let lat = MERCATOR_MAX_LATITUDE;
            GeoExtent::new(
                Srs::Geographic,
                extent.x_min(),
                extent.y_min().clamp(-lat, lat),
                extent.x_max(),
                extent.y_max().clamp(-lat, lat),
            )
            .ok()?
        } else {
            *extent
        };

        let transformed = source.transform(self.srs()).ok()?;

        if self.srs().is_geographic() {
            let y_min = transformed.y_min().max(-90.0);
            let y_max = transformed.y_max().min(90.0);
            if y_min >= y_max || transformed.width() <= 0.0 {
                return None;
            }
            GeoExtent::new(
                Srs::Geographic,
                transformed.x_min(),
                y_min,
                transformed.x_max(),
                y_max,
            )
            .ok()
        } else {
            transformed.intersection(&self.extent)
        }
    }
}

impl fmt::Display for Profile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.well_known_name() {
            Some(name) => f.write_str(name),
            None => write!(
                f,
                "{} {}x{}",
                self.extent, self.tiles_wide, self.tiles_high
            ),
        }
    }
}
