//! Reference ellipsoid conversions.
//!
//! Converts between geodetic coordinates (longitude, latitude in degrees,
//! height in meters) and ECEF (Earth-Centered, Earth-Fixed) coordinates, and
//! builds local east-north-up frames for placing tile geometry.

use glam::{DMat4, DVec3, DVec4};

use crate::srs::WGS84_SEMI_MAJOR;

/// An oblate reference ellipsoid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ellipsoid {
    semi_major: f64,
    semi_minor: f64,
}

impl Ellipsoid {
    /// The WGS84 ellipsoid.
    pub const WGS84: Ellipsoid = Ellipsoid {
        semi_major: WGS84_SEMI_MAJOR,
        semi_minor: 6_356_752.314_245_179,
    };

    fn eccentricity_squared(&self) -> f64 {
        let a2 = self.semi_major * self.semi_major;
        let b2 = self.semi_minor * self.semi_minor;
        (a2 - b2) / a2
    }

    /// Convert longitude, latitude (degrees) and height to ECEF.
    #[must_use]
    pub fn geodetic_to_geocentric(&self, lon_deg: f64, lat_deg: f64, height: f64) -> DVec3 {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let e2 = self.eccentricity_squared();
        let sin_lat = lat.sin();
        let n = self.semi_major / (1.0 - e2 * sin_lat * sin_lat).sqrt();
        DVec3::new(
            (n + height) * lat.cos() * lon.cos(),
            (n + height) * lat.cos() * lon.sin(),
            (n * (1.0 - e2) + height) * sin_lat,
        )
    }

    /// Unit normal to the ellipsoid surface at a geodetic location.
    #[must_use]
    pub fn surface_normal(&self, lon_deg: f64, lat_deg: f64) -> DVec3 {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        DVec3::new(lat.cos() * lon.cos(), lat.cos() * lon.sin(), lat.sin())
    }

    /// Local east-north-up frame at a geodetic location, as a local-to-world matrix.
    #[must_use]
    pub fn local_to_world(&self, lon_deg: f64, lat_deg: f64, height: f64) -> DMat4 {
        let lat = lat_deg.to_radians();
        let lon = lon_deg.to_radians();
        let east = DVec3::new(-lon.sin(), lon.cos(), 0.0);
        let north = DVec3::new(-lat.sin() * lon.cos(), -lat.sin() * lon.sin(), lat.cos());
        let up = self.surface_normal(lon_deg, lat_deg);
        let origin = self.geodetic_to_geocentric(lon_deg, lat_deg, height);
        DMat4::from_cols(
            east.extend(0.0),
            north.extend(0.0),
            up.extend(0.0),
            DVec4::new(origin.x, origin.y, origin.z, 1.0),
        )
    }
}

impl Default for Ellipsoid {
    fn default() -> Self {
        Self::WGS84
    }
}
