//! Spatial reference systems.
//!
//! Only the reference systems a global terrain engine needs are modelled:
//! geographic WGS84, spherical ("web") mercator and geocentric ECEF. Horizontal
//! transforms exist between the two 2-D systems; the geocentric system is a
//! world frame for geometry and has no 2-D extent representation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{GeoError, GeoResult};
use crate::units::Units;

/// Semi-major axis of the WGS84 ellipsoid, also the spherical mercator radius.
pub const WGS84_SEMI_MAJOR: f64 = 6_378_137.0;

/// Half the width of the spherical mercator world, in meters.
pub const MERCATOR_MAX: f64 = 20_037_508.342_789_244;

/// Latitude at which spherical mercator becomes square.
pub const MERCATOR_MAX_LATITUDE: f64 = 85.051_128_779_806_59;

/// A spatial reference system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Srs {
    /// Longitude/latitude on WGS84, in degrees.
    Geographic,
    /// EPSG:3857 spherical mercator, in meters.
    SphericalMercator,
    /// Earth-centered, earth-fixed cartesian, in meters.
    Geocentric,
}

impl Srs {
    /// Parse a definition such as `wgs84`, `epsg:3857` or `geocentric`.
    pub fn from_definition(definition: &str) -> GeoResult<Self> {
        match definition.trim().to_ascii_lowercase().as_str() {
            "wgs84" | "epsg:4326" | "geographic" | "global-geodetic" => Ok(Self::Geographic),
            "spherical-mercator" | "epsg:3857" | "epsg:900913" | "web-mercator" => {
                Ok(Self::SphericalMercator)
            }
            "geocentric" | "ecef" | "epsg:4978" => Ok(Self::Geocentric),
            _ => Err(GeoError::UnknownSrs(definition.to_string())),
        }
    }

    /// Canonical definition string, accepted by [`Srs::from_definition`].
    #[must_use]
    pub fn definition(self) -> &'static str {
        match self {
            Self::Geographic => "wgs84",
            Self::SphericalMercator => "spherical-mercator",
            Self::Geocentric => "geocentric",
        }
    }

    /// Units of the horizontal axes.
    #[must_use]
    pub fn units(self) -> Units {
        match self {
            Self::Geographic => Units::Degrees,
            Self::SphericalMercator | Self::Geocentric => Units::Meters,
        }
    }

    /// Whether coordinates are longitude and latitude.
    #[must_use]
    pub fn is_geographic(self) -> bool {
        matches!(self, Self::Geographic)
    }

    /// Whether coordinates are on a flat projection.
    #[must_use]
    pub fn is_projected(self) -> bool {
        matches!(self, Self::SphericalMercator)
    }

    /// Whether coordinates are earth-centered cartesian.
    #[must_use]
    pub fn is_geocentric(self) -> bool {
        matches!(self, Self::Geocentric)
    }

    /// Whether both systems share the same horizontal datum and projection.
    #[must_use]
    pub fn is_horiz_equivalent_to(self, other: Srs) -> bool {
        self == other
    }

    /// Valid horizontal domain as `[x_min, y_min, x_max, y_max]`.
    #[must_use]
    pub fn bounds(self) -> Option<[f64; 4]> {
        match self {
            Self::Geographic => Some([-180.0, -90.0, 180.0, 90.0]),
            Self::SphericalMercator => {
                Some([-MERCATOR_MAX, -MERCATOR_MAX, MERCATOR_MAX, MERCATOR_MAX])
            }
            Self::Geocentric => None,
        }
    }

    /// Transform a horizontal point into `to`.
    ///
    /// Latitudes outside the mercator domain are clamped before projecting.
    pub fn transform_xy(self, to: Srs, x: f64, y: f64) -> GeoResult<(f64, f64)> {
        match (self, to) {
            (a, b) if a == b && !a.is_geocentric() => Ok((x, y)),
            (Self::Geographic, Self::SphericalMercator) => Ok(geographic_to_mercator(x, y)),
            (Self::SphericalMercator, Self::Geographic) => Ok(mercator_to_geographic(x, y)),
            (from, to) => Err(GeoError::UnsupportedTransform { from, to }),
        }
    }
}

impl fmt::Display for Srs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.definition())
    }
}

impl FromStr for Srs {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_definition(s)
    }
}

impl TryFrom<String> for Srs {
    type Error = GeoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_definition(&value)
    }
}

impl From<Srs> for String {
    fn from(srs: Srs) -> Self {
        srs.definition().to_string()
    }
}

fn geographic_to_mercator(lon: f64, lat: f64) -> (f64, f64) {
    let lat = lat.clamp(-MERCATOR_MAX_LATITUDE, MERCATOR_MAX_LATITUDE);
    let x = WGS84_SEMI_MAJOR * lon.to_radians();
    let y = WGS84_SEMI_MAJOR
        * (std::f64::consts::FRAC_PI_4 + lat.to_radians() / 2.0)
            .tan()
            .ln();
    (x, y)
}

fn mercator_to_geographic(x: f64, y: f64) -> (f64, f64) {
    let lon = (x / WGS84_SEMI_MAJOR).to_degrees();
    let lat = (y / WGS84_SEMI_MAJOR).sinh().atan().to_degrees();
    (lon, lat)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_definitions() {
        assert_eq!(Srs::from_definition("WGS84").unwrap(), Srs::Geographic);
        assert_eq!(
            Srs::from_definition("epsg:3857").unwrap(),
            Srs::SphericalMercator
        );
        assert_eq!(Srs::from_definition("ecef").unwrap(), Srs::Geocentric);
        assert!(matches!(
            Srs::from_definition("epsg:32633"),
            Err(GeoError::UnknownSrs(_))
        ));
    }

    #[test]
    fn test_definition_round_trip() {
        for srs in [Srs::Geographic, Srs::SphericalMercator, Srs::Geocentric] {
            assert_eq!(Srs::from_definition(srs.definition()).unwrap(), srs);
        }
    }

    #[test]
    fn test_mercator_corner() {
        let (x, y) = Srs::Geographic
            .transform_xy(Srs::SphericalMercator, 180.0, MERCATOR_MAX_LATITUDE)
            .unwrap();
        assert!((x - MERCATOR_MAX).abs() < 1e-6);
        assert!((y - MERCATOR_MAX).abs() < 1e-3);
    }

    #[test]
    fn test_mercator_round_trip() {
        let (x, y) = Srs::Geographic
            .transform_xy(Srs::SphericalMercator, 2.35, 48.85)
            .unwrap();
        let (lon, lat) = Srs::SphericalMercator
            .transform_xy(Srs::Geographic, x, y)
            .unwrap();
        assert!((lon - 2.35).abs() < 1e-9);
        assert!((lat - 48.85).abs() < 1e-9);
    }

    #[test]
    fn test_geocentric_has_no_horizontal_transform() {
        let result = Srs::Geographic.transform_xy(Srs::Geocentric, 0.0, 0.0);
        assert!(matches!(result, Err(GeoError::UnsupportedTransform { .. })));
    }
}
