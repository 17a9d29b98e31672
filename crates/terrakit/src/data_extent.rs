//! Rectangles advertising where a layer has data.

use std::fmt;

use terrakit_geo::{GeoExtent, Srs};

use crate::config::Config;
use crate::error::Result;

/// A [`GeoExtent`] with optional LOD bounds.
///
/// The layer may have data inside the rectangle for levels in
/// `[min_level, max_level]`; an absent bound is open on that side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataExtent {
    extent: GeoExtent,
    min_level: Option<u32>,
    max_level: Option<u32>,
}

impl DataExtent {
    /// An extent with data at every level.
    #[must_use]
    pub fn new(extent: GeoExtent) -> Self {
        Self {
            extent,
            min_level: None,
            max_level: None,
        }
    }

    /// An extent with data only between the given levels.
    #[must_use]
    pub fn with_levels(extent: GeoExtent, min_level: Option<u32>, max_level: Option<u32>) -> Self {
        Self {
            extent,
            min_level,
            max_level,
        }
    }

    /// The rectangle covered.
    #[must_use]
    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    /// Coarsest level with data, if bounded.
    #[must_use]
    pub fn min_level(&self) -> Option<u32> {
        self.min_level
    }

    /// Finest level with data, if bounded.
    #[must_use]
    pub fn max_level(&self) -> Option<u32> {
        self.max_level
    }

    /// Same LOD bounds over a different rectangle.
    #[must_use]
    pub(crate) fn with_extent(&self, extent: GeoExtent) -> Self {
        Self { extent, ..*self }
    }

    /// Read from an `{srs, xmin, ymin, xmax, ymax, minlevel?, maxlevel?}` node.
    pub fn from_config(conf: &Config) -> Result<Self> {
        let srs = Srs::from_definition(conf.value("srs").unwrap_or_default())?;
        let extent = GeoExtent::new(
            srs,
            conf.get("xmin").unwrap_or(0.0),
            conf.get("ymin").unwrap_or(0.0),
            conf.get("xmax").unwrap_or(0.0),
            conf.get("ymax").unwrap_or(0.0),
        )?;
        Ok(Self::with_levels(
            extent,
            conf.get("minlevel"),
            conf.get("maxlevel"),
        ))
    }

    /// Serialize into an `extent` node.
    #[must_use]
    pub fn to_config(&self) -> Config {
        let mut conf = Config::new("extent");
        conf.set("srs", self.extent.srs().definition());
        conf.set("xmin", self.extent.x_min());
        conf.set("ymin", self.extent.y_min());
        conf.set("xmax", self.extent.x_max());
        conf.set("ymax", self.extent.y_max());
        conf.set_opt("minlevel", self.min_level);
        conf.set_opt("maxlevel", self.max_level);
        conf
    }
}

impl From<GeoExtent> for DataExtent {
    fn from(extent: GeoExtent) -> Self {
        Self::new(extent)
    }
}

impl fmt::Display for DataExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extent)?;
        match (self.min_level, self.max_level) {
            (None, None) => Ok(()),
            (min, max) => write!(
                f,
                " lod {}..{}",
                min.map_or_else(String::new, |v| v.to_string()),
                max.map_or_else(String::new, |v| v.to_string())
            ),
        }
    }
}
