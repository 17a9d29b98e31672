//! Tile mesh data shared between tiles.

use std::fmt;

use glam::Vec3;
use terrakit_geo::GeoError;

/// Per-vertex flags, stored in the `z` component of each UV.
pub mod vertex_flags {
    /// Draw it.
    pub const VISIBLE: u32 = 1;
    /// Lies on the tile boundary.
    pub const BOUNDARY: u32 = 2;
    /// Subject to elevation displacement.
    pub const HAS_ELEVATION: u32 = 4;
    /// Part of the skirt.
    pub const SKIRT: u32 = 8;
    /// Part of a constraint that must not morph.
    pub const CONSTRAINT: u32 = 16;
}

/// Tessellation settings for one tile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Settings {
    /// Vertices along one tile edge.
    pub tile_size: u32,
    /// Skirt height as a fraction of the tile edge length; 0 disables skirts.
    pub skirt_ratio: f32,
    /// Alternate quad diagonals so geomorphing stays symmetric.
    pub morphing: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            tile_size: 17,
            skirt_ratio: 0.05,
            morphing: true,
        }
    }
}

/// A range of the index buffer to draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DrawCommand {
    pub first_index: u32,
    pub index_count: u32,
}

/// A tessellated tile surface, shared by every tile with the same shape.
#[derive(Debug, Clone, Default)]
pub struct SharedGeometry {
    /// Vertex positions in the tile's local frame.
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    /// Texture coordinates, with the vertex flags in `z`.
    pub uvs: Vec<Vec3>,
    /// Triangle list indices.
    pub indices: Vec<u16>,
    pub has_constraints: bool,
    /// The surface, then the skirt when there is one.
    pub commands: Vec<DrawCommand>,
}

impl SharedGeometry {
    /// Whether the geometry has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Number of vertices, skirt included.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Flags of vertex `index`.
    #[must_use]
    pub fn flags(&self, index: usize) -> u32 {
        self.uvs.get(index).map_or(0, |uv| uv.z as u32)
    }
}

/// Errors that can occur while building tile geometry.
#[derive(Debug, Clone, PartialEq)]
pub enum BuildError {
    /// The caller canceled the build.
    Canceled,
    /// Settings that cannot be tessellated.
    InvalidSettings {
        /// Which setting is wrong.
        detail: String,
    },
    /// More vertices than 16-bit indices can address.
    TooManyVertices {
        /// Vertices the settings would produce.
        count: usize,
    },
    /// The tile's placement could not be computed.
    Geo(GeoError),
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Canceled => write!(f, "geometry build canceled"),
            Self::InvalidSettings { detail } => write!(f, "invalid tessellation settings: {detail}"),
            Self::TooManyVertices { count } => {
                write!(f, "{count} vertices exceed the 16-bit index range")
            }
            Self::Geo(e) => write!(f, "tile placement failed: {e}"),
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Geo(e) => Some(e),
            _ => None,
        }
    }
}

impl From<GeoError> for BuildError {
    fn from(e: GeoError) -> Self {
        Self::Geo(e)
    }
}

/// Result type for geometry builds.
pub type BuildResult<T> = std::result::Result<T, BuildError>;
