//! Spatial reference systems, tiling profiles and quadtree tile keys.
//!
//! This crate holds the pure, synchronous geodesy that the tile layer and
//! geometry pool build on. Nothing here locks or allocates behind the caller's
//! back, so every type is safe to use from any thread.
//!
//! # Example
//!
//! ```
//! use terrakit_geo::{Profile, TileKey};
//!
//! let profile = Profile::global_geodetic();
//! let key = TileKey::new(3, 5, 2, profile).unwrap();
//! let parent = key.create_ancestor_key(2).unwrap();
//! assert_eq!(parent.to_string(), "2/2/1");
//! ```

mod ellipsoid;
mod error;
mod extent;
mod key;
mod profile;
mod srs;
mod units;

pub use ellipsoid::Ellipsoid;
pub use error::{GeoError, GeoResult};
pub use extent::GeoExtent;
pub use key::TileKey;
pub use profile::Profile;
pub use srs::{MERCATOR_MAX, MERCATOR_MAX_LATITUDE, Srs, WGS84_SEMI_MAJOR};
pub use units::{METERS_PER_DEGREE, Units};
