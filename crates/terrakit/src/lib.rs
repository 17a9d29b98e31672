//! Tile availability and shared terrain geometry for globe renderers.
//!
//! This crate decides which tiles a layer can serve and builds the meshes
//! tiles are drawn with, sharing one mesh between every tile of the same
//! shape.
//!
//! # Design principles
//!
//! - **Thread-safe queries**: Availability checks and pool lookups take `&self`
//!   and can run from any number of threads
//! - **Lazy structures**: Extent unions and R-tree indexes are built on first
//!   use and rebuilt after the extents change
//! - **Cooperative cancellation**: Long builds poll a [`Cancelable`] token
//!
//! # Example
//!
//! ```
//! use terrakit::{DataExtent, GeometryPool, NeverCancel, Settings, TileLayer, TileLayerOptions};
//! use terrakit_geo::{GeoExtent, Profile, Srs, TileKey};
//!
//! let layer = TileLayer::new("imagery", TileLayerOptions {
//!     profile: Some(Profile::global_geodetic()),
//!     ..Default::default()
//! });
//! let europe = GeoExtent::new(Srs::Geographic, -10.0, 35.0, 30.0, 70.0).unwrap();
//! layer.add_data_extent(DataExtent::with_levels(europe, None, Some(8)));
//!
//! let paris = TileKey::from_point(Profile::global_geodetic(), 10, 2.35, 48.85).unwrap();
//! let best = layer.best_available_tile_key(&paris, false).unwrap();
//! assert_eq!(best.level_of_detail(), 8);
//!
//! let pool = GeometryPool::new(Srs::Geocentric);
//! let mesh = pool.get_pooled_geometry(&best, &Settings::default(), &NeverCancel);
//! assert!(mesh.is_some());
//! ```

pub mod cache_bin;
pub mod config;
mod data_extent;
pub mod env;
mod error;
mod gate;
pub mod geometry;
pub mod index;
mod io;
pub mod layer;
mod status;

pub use cache_bin::CacheBinMetadata;
pub use config::Config;
pub use data_extent::DataExtent;
pub use error::{Error, Result};
pub use gate::{Gate, GateGuard};
pub use geometry::{GeometryKey, GeometryPool, PoolStats, Settings, SharedGeometry};
pub use index::{DataExtentsIndex, SpatialIndex};
pub use io::{Cancelable, IoOptions, NeverCancel, ProxySettings};
pub use layer::{TileLayer, TileLayerOptions};
pub use status::{Status, StatusCode};

// Re-export geodesy types for convenience.
pub use terrakit_geo::{GeoExtent, Profile, Srs, TileKey};
