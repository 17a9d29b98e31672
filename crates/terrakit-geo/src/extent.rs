//! Georeferenced rectangles.

use std::fmt;

use crate::error::{GeoError, GeoResult};
use crate::srs::Srs;

/// An axis-aligned rectangle in some SRS.
///
/// Geographic extents are kept with `x_min` in `[-180, 180)`. An extent that
/// wraps past the antimeridian keeps going east, so `x_max` may exceed 180 (at
/// most by 360 degrees of total width).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoExtent {
    srs: Srs,
    x_min: f64,
    y_min: f64,
    x_max: f64,
    y_max: f64,
}

impl GeoExtent {
    /// Create an extent, normalizing geographic longitudes.
    pub fn new(srs: Srs, x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> GeoResult<Self> {
        if ![x_min, y_min, x_max, y_max].iter().all(|v| v.is_finite()) {
            return Err(GeoError::InvalidExtent {
                detail: format!("non-finite coordinates ({x_min}, {y_min}, {x_max}, {y_max})"),
            });
        }
        if x_min > x_max || y_min > y_max {
            return Err(GeoError::InvalidExtent {
                detail: format!("inverted coordinates ({x_min}, {y_min}, {x_max}, {y_max})"),
            });
        }
        if srs.is_geographic() && x_max - x_min > 360.0 {
            return Err(GeoError::InvalidExtent {
                detail: format!("longitude span {} exceeds 360 degrees", x_max - x_min),
            });
        }

        let mut extent = Self {
            srs,
            x_min,
            y_min,
            x_max,
            y_max,
        };
        extent.normalize();
        Ok(extent)
    }

    /// The whole valid domain of a 2-D SRS.
    #[must_use]
    pub fn whole(srs: Srs) -> Option<Self> {
        let [x_min, y_min, x_max, y_max] = srs.bounds()?;
        Some(Self::from_bounds(srs, x_min, y_min, x_max, y_max))
    }

    /// Build from coordinates already known to be ordered and normalized.
    pub(crate) const fn from_bounds(srs: Srs, x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> Self {
        Self {
            srs,
            x_min,
            y_min,
            x_max,
            y_max,
        }
    }

    fn normalize(&mut self) {
        if !self.srs.is_geographic() {
            return;
        }
        while self.x_min < -180.0 {
            self.x_min += 360.0;
            self.x_max += 360.0;
        }
        while self.x_min >= 180.0 {
            self.x_min -= 360.0;
            self.x_max -= 360.0;
        }
    }

    /// The SRS the coordinates are expressed in.
    #[must_use]
    pub fn srs(&self) -> Srs {
        self.srs
    }

    /// Western edge.
    #[must_use]
    pub fn x_min(&self) -> f64 {
        self.x_min
    }

    /// Southern edge.
    #[must_use]
    pub fn y_min(&self) -> f64 {
        self.y_min
    }

    /// Eastern edge; past +180 for a wrapped geographic extent.
    #[must_use]
    pub fn x_max(&self) -> f64 {
        self.x_max
    }

    /// Northern edge.
    #[must_use]
    pub fn y_max(&self) -> f64 {
        self.y_max
    }

    /// East-west span in SRS units.
    #[must_use]
    pub fn width(&self) -> f64 {
        self.x_max - self.x_min
    }

    /// North-south span in SRS units.
    #[must_use]
    pub fn height(&self) -> f64 {
        self.y_max - self.y_min
    }

    /// Midpoint as `(x, y)`.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (
            0.5 * (self.x_min + self.x_max),
            0.5 * (self.y_min + self.y_max),
        )
    }

    /// Lower-left and upper-right corners, as used by the spatial index.
    #[must_use]
    pub fn corners(&self) -> ([f64; 2], [f64; 2]) {
        ([self.x_min, self.y_min], [self.x_max, self.y_max])
    }

    /// Whether a geographic extent wraps past the 180th meridian.
    #[must_use]
    pub fn crosses_antimeridian(&self) -> bool {
        self.srs.is_geographic() && self.x_max > 180.0
    }

    /// Split a wrapped geographic extent into its parts on either side of the
    /// antimeridian.
    ///
    /// The west part ends at +180, the east part starts at -180. A side the
    /// extent does not reach is `None`; both are `None` when the extent does
    /// not cross.
    #[must_use]
    pub fn split_across_antimeridian(&self) -> (Option<GeoExtent>, Option<GeoExtent>) {
        if !self.crosses_antimeridian() {
            return (None, None);
        }
        let west = (self.x_min < 180.0).then(|| Self {
            x_max: 180.0,
            ..*self
        });
        let east = Self {
            x_min: -180.0,
            x_max: self.x_max - 360.0,
            ..*self
        };
        (west, (east.width() > 0.0).then_some(east))
    }

    /// Whether a point lies inside the extent, honoring geographic wrap.
    #[must_use]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        if y < self.y_min || y > self.y_max {
            return false;
        }
        self.x_offsets()
            .iter()
            .any(|dx| x + dx >= self.x_min && x + dx <= self.x_max)
    }

    /// Whether the interiors of two extents overlap; touching edges do not count.
    ///
    /// `other` is transformed into this extent's SRS first. Extents that cannot
    /// be transformed never intersect.
    #[must_use]
    pub fn intersects(&self, other: &GeoExtent) -> bool {
        let Ok(other) = other.transform(self.srs) else {
            return false;
        };
        if self.y_min >= other.y_max || self.y_max <= other.y_min {
            return false;
        }
        self.x_offsets()
            .iter()
            .any(|dx| self.x_min < other.x_max + dx && self.x_max > other.x_min + dx)
    }

    fn x_offsets(&self) -> &'static [f64] {
        if self.srs.is_geographic() {
            &[-360.0, 0.0, 360.0]
        } else {
            &[0.0]
        }
    }

    /// Grow this extent to cover `other` (transformed into this SRS).
    pub fn expand_to_include(&mut self, other: &GeoExtent) -> GeoResult<()> {
        let other = other.transform(self.srs)?;
        self.x_min = self.x_min.min(other.x_min);
        self.y_min = self.y_min.min(other.y_min);
        self.x_max = self.x_max.max(other.x_max);
        self.y_max = self.y_max.max(other.y_max);
        if self.srs.is_geographic() && self.width() > 360.0 {
            self.x_min = -180.0;
            self.x_max = 180.0;
        }
        Ok(())
    }

    /// Intersection with another extent in the same SRS, if non-empty.
    #[must_use]
    pub fn intersection(&self, other: &GeoExtent) -> Option<GeoExtent> {
        if self.srs != other.srs {
            return None;
        }
        let out = Self {
            srs: self.srs,
            x_min: self.x_min.max(other.x_min),
            y_min: self.y_min.max(other.y_min),
            x_max: self.x_max.min(other.x_max),
            y_max: self.y_max.min(other.y_max),
        };
        (out.x_min < out.x_max && out.y_min < out.y_max).then_some(out)
    }

    /// Reproject the corners of this extent into `to`.
    ///
    /// Geographic input is clamped to the mercator latitude limit when
    /// projecting. A wrapped geographic extent keeps its east overflow.
    pub fn transform(&self, to: Srs) -> GeoResult<GeoExtent> {
        if self.srs == to {
            return Ok(*self);
        }
        let (x_min, y_min) = self.srs.transform_xy(to, self.x_min, self.y_min)?;
        let (x_max, y_max) = self.srs.transform_xy(to, self.x_max, self.y_max)?;
        GeoExtent::new(to, x_min, y_min, x_max, y_max)
    }
}

impl fmt::Display for GeoExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}: {}, {}, {}, {}]",
            self.srs, self.x_min, self.y_min, self.x_max, self.y_max
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> GeoExtent {
        GeoExtent::new(Srs::Geographic, x_min, y_min, x_max, y_max).unwrap()
    }

    #[test]
    fn test_rejects_inverted() {
        let result = GeoExtent::new(Srs::Geographic, 10.0, 0.0, 5.0, 1.0);
        assert!(matches!(result, Err(GeoError::InvalidExtent { .. })));
    }

    #[test]
    fn test_normalizes_west_overflow() {
        let e = geo(-190.0, 0.0, -170.0, 10.0);
        assert_eq!(e.x_min(), 170.0);
        assert_eq!(e.x_max(), 190.0);
        assert!(e.crosses_antimeridian());
    }

    #[test]
    fn test_split_across_antimeridian() {
        let e = geo(170.0, -10.0, 190.0, 10.0);
        let (west, east) = e.split_across_antimeridian();
        let west = west.unwrap();
        let east = east.unwrap();
        assert_eq!((west.x_min(), west.x_max()), (170.0, 180.0));
        assert_eq!((east.x_min(), east.x_max()), (-180.0, -170.0));
        assert_eq!(west.y_min(), -10.0);
        assert_eq!(east.y_max(), 10.0);
    }

    #[test]
    fn test_split_non_crossing() {
        let e = geo(0.0, 0.0, 10.0, 10.0);
        assert_eq!(e.split_across_antimeridian(), (None, None));
    }

    #[test]
    fn test_intersects_excludes_touching() {
        let a = geo(0.0, 0.0, 10.0, 10.0);
        let b = geo(10.0, 0.0, 20.0, 10.0);
        let c = geo(5.0, 5.0, 15.0, 15.0);
        assert!(!a.intersects(&b));
        assert!(a.intersects(&c));
        assert!(c.intersects(&a));
    }

    #[test]
    fn test_intersects_across_antimeridian() {
        let wrapped = geo(170.0, -10.0, 190.0, 10.0);
        let east_side = geo(-175.0, -5.0, -172.0, 5.0);
        let elsewhere = geo(0.0, -5.0, 10.0, 5.0);
        assert!(wrapped.intersects(&east_side));
        assert!(east_side.intersects(&wrapped));
        assert!(!wrapped.intersects(&elsewhere));
    }

    #[test]
    fn test_intersects_other_srs() {
        let europe = geo(-10.0, 35.0, 30.0, 70.0);
        let mercator = europe.transform(Srs::SphericalMercator).unwrap();
        assert!(mercator.intersects(&europe));
        assert!(europe.intersects(&mercator));
    }

    #[test]
    fn test_expand_to_include() {
        let mut a = geo(0.0, 0.0, 10.0, 10.0);
        a.expand_to_include(&geo(-20.0, 5.0, 5.0, 30.0)).unwrap();
        assert_eq!(a, geo(-20.0, 0.0, 10.0, 30.0));
    }

    #[test]
    fn test_contains_wrapped() {
        let wrapped = geo(170.0, -10.0, 190.0, 10.0);
        assert!(wrapped.contains(-175.0, 0.0));
        assert!(wrapped.contains(175.0, 0.0));
        assert!(!wrapped.contains(0.0, 0.0));
    }
}
