//! Shared terrain geometry.

mod key;
mod pool;
mod tessellate;
mod types;

pub use key::GeometryKey;
pub use pool::{GeometryPool, PoolStats};
pub use tessellate::{
    create_geometry, create_indices, num_skirt_elements, num_surface_elements,
    tile_local_to_world, validate,
};
pub use types::{BuildError, BuildResult, DrawCommand, Settings, SharedGeometry, vertex_flags};
