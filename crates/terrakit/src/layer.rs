//! Tile layers and their availability model.
//!
//! A [`TileLayer`] answers one question for the renderer: given a tile key in
//! any profile, which key should actually be requested from this layer? The
//! answer depends on the layer's level and resolution gates, its maximum data
//! level, and the data extents it advertises.

use std::sync::{OnceLock, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use terrakit_geo::{GeoExtent, Profile, Srs, TileKey};
use tracing::{debug, info, warn};

use crate::cache_bin::CacheBinMetadata;
use crate::config::{Config, profile_from_config, profile_to_config};
use crate::data_extent::DataExtent;
use crate::env;
use crate::error::Result;
use crate::index::DataExtentsIndex;
use crate::io::{Cancelable, IoOptions};
use crate::status::{Status, StatusCode};

/// Maximum data level assumed when none is configured.
pub const DEFAULT_MAX_DATA_LEVEL: u32 = 99;

/// Samples along one tile edge when none is configured.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// User-facing layer settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TileLayerOptions {
    /// Coarsest level served.
    pub min_level: Option<u32>,
    /// Finest level served.
    pub max_level: Option<u32>,
    /// Finest level with real data; deeper keys fall back to ancestors.
    pub max_data_level: Option<u32>,
    /// Finest resolution served, in layer SRS units per sample.
    pub min_resolution: Option<f64>,
    /// Coarsest resolution served, in layer SRS units per sample.
    pub max_resolution: Option<f64>,
    /// Samples along one tile edge.
    pub tile_size: Option<u32>,
    /// Serve keys past the data from upsampled ancestors.
    pub upsample: Option<bool>,
    /// Native tiling profile.
    #[serde(with = "profile_serde")]
    pub profile: Option<Profile>,
    /// Requested L2 cache size, before environment overrides.
    pub l2_cache_size: Option<u32>,
}

impl TileLayerOptions {
    /// Read options from a layer config. Unknown keys are ignored.
    pub fn from_config(conf: &Config) -> Result<Self> {
        let profile = conf.child("profile").map(profile_from_config).transpose()?;
        Ok(Self {
            min_level: conf.get("min_level"),
            max_level: conf.get("max_level"),
            max_data_level: conf.get("max_data_level"),
            min_resolution: conf.get("min_resolution"),
            max_resolution: conf.get("max_resolution"),
            tile_size: conf.get("tile_size"),
            upsample: conf.get("upsample"),
            profile,
            l2_cache_size: conf.get("l2_cache_size"),
        })
    }

    /// Write set options into `conf`, leaving other keys alone.
    pub fn write_config(&self, conf: &mut Config) {
        conf.set_opt("max_level", self.max_level);
        conf.set_opt("max_resolution", self.max_resolution);
        conf.set_opt("max_data_level", self.max_data_level);
        conf.set_opt("min_level", self.min_level);
        conf.set_opt("min_resolution", self.min_resolution);
        match &self.profile {
            Some(profile) => conf.set_child("profile", profile_to_config(profile)),
            None => conf.remove("profile"),
        }
        conf.set_opt("tile_size", self.tile_size);
        conf.set_opt("upsample", self.upsample);
        conf.set_opt("l2_cache_size", self.l2_cache_size);
    }
}

mod profile_serde {
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use terrakit_geo::Profile;

    use crate::config::{Config, profile_from_config, profile_to_config};

    pub fn serialize<S: Serializer>(profile: &Option<Profile>, s: S) -> Result<S::Ok, S::Error> {
        profile.as_ref().map(profile_to_config).serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Profile>, D::Error> {
        Option::<Config>::deserialize(d)?
            .map(|conf| profile_from_config(&conf))
            .transpose()
            .map_err(D::Error::custom)
    }
}

/// Data extents plus the structures derived from them.
///
/// The union and index are built on first use and reset whenever the extents
/// change, always under the write lock.
#[derive(Debug, Default)]
struct DataState {
    extents: Vec<DataExtent>,
    union: OnceLock<Option<DataExtent>>,
    index: OnceLock<DataExtentsIndex>,
}

impl DataState {
    fn invalidate(&mut self) {
        self.union = OnceLock::new();
        self.index = OnceLock::new();
    }
}

/// A layer of tiled data with an availability model.
#[derive(Debug)]
pub struct TileLayer {
    name: String,
    options: TileLayerOptions,
    status: Status,
    open: bool,
    disabled: bool,
    reopen_required: bool,
    writing_supported: bool,
    writing_requested: bool,
    data: RwLock<DataState>,
}

impl TileLayer {
    /// Create a closed layer with no data extents.
    #[must_use]
    pub fn new(name: impl Into<String>, options: TileLayerOptions) -> Self {
        Self {
            name: name.into(),
            options,
            status: Status::ok(),
            open: false,
            disabled: false,
            reopen_required: false,
            writing_supported: false,
            writing_requested: false,
            data: RwLock::new(DataState::default()),
        }
    }

    /// Build a layer from its config form.
    pub fn from_config(conf: &Config) -> Result<Self> {
        let name = conf.value("name").unwrap_or_default();
        Ok(Self::new(name, TileLayerOptions::from_config(conf)?))
    }

    /// Serialize into a `layer` node.
    #[must_use]
    pub fn to_config(&self) -> Config {
        let mut conf = Config::new("layer");
        conf.set("name", &self.name);
        self.options.write_config(&mut conf);
        conf
    }

    /// Name given at construction.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current options.
    #[must_use]
    pub fn options(&self) -> &TileLayerOptions {
        &self.options
    }

    /// Native tiling profile, if known.
    #[must_use]
    pub fn profile(&self) -> Option<&Profile> {
        self.options.profile.as_ref()
    }

    /// Change the native profile. Derived extent structures are rebuilt.
    pub fn set_profile(&mut self, profile: Profile) {
        self.options.profile = Some(profile);
        self.write_data().invalidate();
    }

    /// Coarsest level the layer serves.
    #[must_use]
    pub fn min_level(&self) -> Option<u32> {
        self.options.min_level
    }

    /// Set the coarsest level served.
    pub fn set_min_level(&mut self, value: u32) {
        self.options.min_level = Some(value);
        self.reopen_required = true;
    }

    /// Finest level the layer serves.
    #[must_use]
    pub fn max_level(&self) -> Option<u32> {
        self.options.max_level
    }

    /// Set the finest level served.
    pub fn set_max_level(&mut self, value: u32) {
        self.options.max_level = Some(value);
        self.reopen_required = true;
    }

    /// Minimum resolution gate.
    #[must_use]
    pub fn min_resolution(&self) -> Option<f64> {
        self.options.min_resolution
    }

    /// Set the minimum resolution gate.
    pub fn set_min_resolution(&mut self, value: f64) {
        self.options.min_resolution = Some(value);
        self.reopen_required = true;
    }

    /// Maximum resolution gate.
    #[must_use]
    pub fn max_resolution(&self) -> Option<f64> {
        self.options.max_resolution
    }

    /// Set the maximum resolution gate.
    pub fn set_max_resolution(&mut self, value: f64) {
        self.options.max_resolution = Some(value);
        self.reopen_required = true;
    }

    /// Finest level real data exists at.
    #[must_use]
    pub fn max_data_level(&self) -> Option<u32> {
        self.options.max_data_level
    }

    /// Set the finest level with real data.
    pub fn set_max_data_level(&mut self, value: u32) {
        self.options.max_data_level = Some(value);
        self.reopen_required = true;
        self.write_data().invalidate();
    }

    /// Samples along one tile edge.
    #[must_use]
    pub fn tile_size(&self) -> u32 {
        self.options.tile_size.unwrap_or(DEFAULT_TILE_SIZE)
    }

    /// Set the samples along one tile edge.
    pub fn set_tile_size(&mut self, value: u32) {
        self.options.tile_size = Some(value);
        self.reopen_required = true;
    }

    /// Whether keys past the data may be served from upsampled ancestors.
    #[must_use]
    pub fn upsample(&self) -> bool {
        self.options.upsample.unwrap_or(false)
    }

    /// Allow or forbid upsampling.
    pub fn set_upsample(&mut self, value: bool) {
        self.options.upsample = Some(value);
        self.reopen_required = true;
        self.write_data().invalidate();
    }

    /// Whether settings changed since the last open.
    #[must_use]
    pub fn reopen_required(&self) -> bool {
        self.reopen_required
    }

    /// Outcome of the last open or configuration step.
    #[must_use]
    pub fn status(&self) -> &Status {
        &self.status
    }

    /// Whether the layer opened successfully.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open the layer, clearing any pending reopen.
    ///
    /// A disabled layer stays closed and keeps its error status.
    pub fn open(&mut self, io: &IoOptions) -> &Status {
        if self.disabled {
            return &self.status;
        }
        if io.is_canceled() {
            self.status = Status::error(StatusCode::ResourceUnavailable, "open canceled");
            return &self.status;
        }
        if self.options.tile_size == Some(0) {
            self.status = Status::error(StatusCode::ConfigurationError, "tile_size must be positive");
            return &self.status;
        }

        self.reopen_required = false;
        self.open = true;
        self.status = Status::ok();
        info!(
            layer = %self.name,
            profile = ?self.profile().map(ToString::to_string),
            writing = self.writing_requested,
            "opened tile layer"
        );
        &self.status
    }

    /// Close the layer and drop any writing request.
    pub fn close(&mut self) {
        self.open = false;
        self.writing_requested = false;
    }

    /// Mark the layer unusable. It will refuse to open from now on.
    pub fn disable(&mut self, message: impl Into<String>) {
        self.disable_with(StatusCode::GeneralError, message.into());
    }

    fn disable_with(&mut self, code: StatusCode, message: String) -> &Status {
        warn!(layer = %self.name, %message, "disabling tile layer");
        self.status = Status::error(code, message);
        self.disabled = true;
        self.open = false;
        &self.status
    }

    /// Whether the layer can be opened for writing.
    #[must_use]
    pub fn is_writing_supported(&self) -> bool {
        self.writing_supported
    }

    /// Declare whether writing is possible.
    pub fn set_writing_supported(&mut self, value: bool) {
        self.writing_supported = value;
    }

    /// Whether the last open asked for writing.
    #[must_use]
    pub fn is_writing_requested(&self) -> bool {
        self.writing_requested
    }

    /// Open the layer for writing; fails when writing is unsupported.
    pub fn open_for_writing(&mut self, io: &IoOptions) -> &Status {
        if !self.writing_supported {
            self.status = Status::error(
                StatusCode::ServiceUnavailable,
                "Layer does not support writing",
            );
            return &self.status;
        }
        self.writing_requested = true;
        self.open(io)
    }

    /// Adopt what the layer lacks from a cache bin's metadata.
    ///
    /// Invalid metadata disables the layer. Otherwise the source profile is
    /// used when the layer has none, and the cached data extents are used when
    /// the layer advertises none.
    pub fn apply_cache_bin_metadata(&mut self, meta: &CacheBinMetadata) -> &Status {
        if !meta.is_valid() {
            return self.disable_with(
                StatusCode::ConfigurationError,
                "Cache bin metadata is missing required attribution".into(),
            );
        }

        if self.options.profile.is_none() {
            if let Some(conf) = &meta.source_profile {
                match profile_from_config(conf) {
                    Ok(profile) => self.set_profile(profile),
                    Err(e) => {
                        return self.disable_with(
                            StatusCode::ConfigurationError,
                            format!("Cache bin source profile is unusable: {e}"),
                        );
                    }
                }
            }
        }

        if self.data_extents_size() == 0 && !meta.data_extents.is_empty() {
            debug!(
                layer = %self.name,
                count = meta.data_extents.len(),
                "using data extents from cache bin"
            );
            self.set_data_extents(meta.data_extents.clone());
        }
        &self.status
    }

    /// L2 cache size for this layer inside a map using `map_profile`.
    ///
    /// Layers whose SRS differs from the map's get a small cache because
    /// mosaicing is likely. The options value replaces that default, and the
    /// environment has the final say.
    #[must_use]
    pub fn l2_cache_size(&self, map_profile: Option<&Profile>) -> u32 {
        let mut size = 0;
        if let (Some(map), Some(layer)) = (map_profile, self.profile()) {
            if !map.srs().is_horiz_equivalent_to(layer.srs()) {
                size = env::MOSAIC_L2_CACHE_SIZE;
            }
        }
        if let Some(requested) = self.options.l2_cache_size {
            size = requested;
        }
        env::l2_cache_size(size)
    }

    // Data extents.

    fn read_data(&self) -> RwLockReadGuard<'_, DataState> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_data(&self) -> RwLockWriteGuard<'_, DataState> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of advertised data extents.
    #[must_use]
    pub fn data_extents_size(&self) -> usize {
        self.read_data().extents.len()
    }

    /// A snapshot of the advertised data extents.
    #[must_use]
    pub fn data_extents(&self) -> Vec<DataExtent> {
        self.read_data().extents.clone()
    }

    /// Replace the advertised data extents.
    pub fn set_data_extents(&self, extents: Vec<DataExtent>) {
        let mut data = self.write_data();
        data.extents = extents;
        data.invalidate();
    }

    /// Advertise one more data extent.
    pub fn add_data_extent(&self, extent: DataExtent) {
        let mut data = self.write_data();
        data.extents.push(extent);
        data.invalidate();
    }

    /// Union of all data extents, in the SRS of the first one.
    ///
    /// The max level is promoted to the max data level when upsampling.
    /// `None` when the layer advertises no extents.
    #[must_use]
    pub fn data_extents_union(&self) -> Option<DataExtent> {
        let data = self.read_data();
        *data.union.get_or_init(|| self.compute_union(&data.extents))
    }

    /// Geographic coverage of the layer; the same as the extents union.
    #[must_use]
    pub fn extent(&self) -> Option<GeoExtent> {
        self.data_extents_union().map(|de| *de.extent())
    }

    fn compute_union(&self, extents: &[DataExtent]) -> Option<DataExtent> {
        let (first, rest) = extents.split_first()?;
        let mut extent = *first.extent();
        let mut min_level = first.min_level();
        let mut max_level = first.max_level();

        for de in rest {
            if let Err(e) = extent.expand_to_include(de.extent()) {
                warn!(layer = %self.name, error = %e, "data extent left out of union");
                continue;
            }
            if let Some(level) = de.min_level() {
                min_level = Some(min_level.map_or(level, |m| m.min(level)));
            }
            if let Some(level) = de.max_level() {
                max_level = Some(max_level.map_or(level, |m| m.max(level)));
            }
        }

        if let (Some(mdl), true) = (self.options.max_data_level, self.upsample()) {
            max_level = Some(max_level.map_or(mdl, |m| m.max(mdl)));
        }

        Some(DataExtent::with_levels(extent, min_level, max_level))
    }

    /// Bring an extent into the SRS the index is built in.
    fn to_layer_srs(&self, extent: &GeoExtent, fallback: Srs) -> Option<GeoExtent> {
        match self.profile() {
            Some(profile) => profile.clamp_and_transform_extent(extent),
            None => extent.transform(fallback).ok(),
        }
    }

    /// Pieces of `extent` in the index SRS, none of them wrapping.
    ///
    /// A wrapped geographic extent is split before reprojecting, since a
    /// projected domain would clip away everything past the antimeridian.
    fn index_parts(&self, extent: &GeoExtent, srs: Srs) -> Vec<GeoExtent> {
        let sources = if extent.crosses_antimeridian() {
            let (west, east) = extent.split_across_antimeridian();
            [west, east].into_iter().flatten().collect()
        } else {
            vec![*extent]
        };

        let mut parts = Vec::with_capacity(sources.len());
        for source in &sources {
            let Some(local) = self.to_layer_srs(source, srs) else {
                continue;
            };
            if local.crosses_antimeridian() {
                let (west, east) = local.split_across_antimeridian();
                parts.extend([west, east].into_iter().flatten());
            } else {
                parts.push(local);
            }
        }
        parts
    }

    fn build_index(&self, extents: &[DataExtent], srs: Srs) -> DataExtentsIndex {
        debug!(layer = %self.name, count = extents.len(), "building data extents index");
        let mut index = DataExtentsIndex::new();
        for de in extents {
            let parts = self.index_parts(de.extent(), srs);
            if parts.is_empty() {
                debug!(layer = %self.name, extent = %de, "data extent outside layer domain");
            }
            for part in parts {
                let (min, max) = part.corners();
                index.insert(min, max, de.with_extent(part));
            }
        }
        index
    }

    /// Visit the index entries, building the index first if needed.
    ///
    /// Exposed for inspection; `None` when the layer has no extents.
    pub fn with_data_extents_index<R>(&self, f: impl FnOnce(&DataExtentsIndex) -> R) -> Option<R> {
        let data = self.read_data();
        let first = data.extents.first()?;
        let srs = first.extent().srs();
        let index = data.index.get_or_init(|| self.build_index(&data.extents, srs));
        Some(f(index))
    }

    // Availability.

    fn effective_max_data_level(&self) -> u32 {
        self.options.max_data_level.unwrap_or(DEFAULT_MAX_DATA_LEVEL)
    }

    /// The key's level expressed in this layer's profile.
    fn local_lod(&self, key: &TileKey) -> u32 {
        match self.profile() {
            Some(profile) => profile.equivalent_lod(key.profile(), key.level_of_detail()),
            None => key.level_of_detail(),
        }
    }

    fn passes_level_gates(&self, local_lod: u32) -> bool {
        if self.options.max_level.is_some_and(|max| local_lod > max) {
            return false;
        }
        !self.options.min_level.is_some_and(|min| local_lod < min)
    }

    // The inequalities here reject keys coarser than max_resolution and finer
    // than min_resolution, opposite to what the names suggest. Kept as is.
    fn passes_resolution_gates(&self, key: &TileKey) -> bool {
        let (min_res, max_res) = (self.options.min_resolution, self.options.max_resolution);
        if min_res.is_none() && max_res.is_none() {
            return true;
        }
        let Some(profile) = self.profile() else {
            return true;
        };
        let res_key = key.extent().width() / f64::from(self.tile_size());
        let res_layer = key
            .profile()
            .srs()
            .units()
            .convert_to(profile.srs().units(), res_key);

        if max_res.is_some_and(|max| max > res_layer) {
            return false;
        }
        !min_res.is_some_and(|min| min < res_layer)
    }

    /// Whether the layer could produce data for `key`, honoring every gate.
    #[must_use]
    pub fn is_key_in_legal_range(&self, key: &TileKey) -> bool {
        let local_lod = self.local_lod(key);
        if !self.passes_level_gates(local_lod) {
            return false;
        }
        if self
            .options
            .max_data_level
            .is_some_and(|mdl| local_lod > mdl)
        {
            return false;
        }
        self.passes_resolution_gates(key)
    }

    /// Like [`TileLayer::is_key_in_legal_range`], but keys past the max data
    /// level still count since they can be drawn from upsampled data.
    #[must_use]
    pub fn is_key_in_visual_range(&self, key: &TileKey) -> bool {
        self.passes_level_gates(self.local_lod(key)) && self.passes_resolution_gates(key)
    }

    /// The key to request from this layer in place of `key`.
    ///
    /// This is `key` itself when the layer has data for it, an ancestor when
    /// only coarser data exists, and `None` when the layer has nothing to
    /// offer. Upsampling is considered only when both the caller and the layer
    /// allow it.
    #[must_use]
    pub fn best_available_tile_key(&self, key: &TileKey, consider_upsampling: bool) -> Option<TileKey> {
        let local_lod = self.local_lod(key);
        if !self.passes_level_gates(local_lod) || !self.passes_resolution_gates(key) {
            return None;
        }

        let mdl = self.effective_max_data_level();
        let clamp_to_mdl = || {
            if local_lod > mdl {
                key.create_ancestor_key(mdl)
            } else {
                Some(*key)
            }
        };

        let data = self.read_data();
        let Some(first) = data.extents.first() else {
            return clamp_to_mdl();
        };
        let srs = first.extent().srs();

        let union = (*data.union.get_or_init(|| self.compute_union(&data.extents)))?;
        let key_extent = key.extent();
        if !union.extent().intersects(&key_extent) {
            return None;
        }

        let index = data.index.get_or_init(|| self.build_index(&data.extents, srs));
        let query = self.to_layer_srs(&key_extent, srs)?;
        let (min, max) = query.corners();

        let mut intersects = false;
        let mut highest_lod = 0;
        let mut best = None;
        index.search(min, max, |de| {
            if de.min_level().is_some_and(|min_level| local_lod < min_level) {
                return true;
            }
            intersects = true;
            match de.max_level() {
                Some(max_level) if local_lod > max_level => {
                    highest_lod = highest_lod.max(max_level);
                    true
                }
                _ => {
                    best = clamp_to_mdl();
                    false
                }
            }
        });

        if best.is_some() {
            return best;
        }
        if !intersects {
            return None;
        }

        let max_available = if consider_upsampling && self.upsample() {
            highest_lod.max(mdl)
        } else {
            highest_lod.min(mdl)
        };
        key.create_ancestor_key(key.level_of_detail().min(max_available))
    }

    /// Whether `key` can be served as is, upsampling allowed.
    #[must_use]
    pub fn may_have_data(&self, key: &TileKey) -> bool {
        self.best_available_tile_key(key, true) == Some(*key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrakit_geo::Srs;

    fn geodetic() -> Profile {
        Profile::global_geodetic()
    }

    fn key(lod: u32, x: u32, y: u32) -> TileKey {
        TileKey::new(lod, x, y, geodetic()).unwrap()
    }

    fn extent(x_min: f64, y_min: f64, x_max: f64, y_max: f64) -> GeoExtent {
        GeoExtent::new(Srs::Geographic, x_min, y_min, x_max, y_max).unwrap()
    }

    fn layer(options: TileLayerOptions) -> TileLayer {
        TileLayer::new(
            "test",
            TileLayerOptions {
                profile: Some(geodetic()),
                ..options
            },
        )
    }

    #[test]
    fn test_no_extents_clamps_to_mdl() {
        let layer = layer(TileLayerOptions {
            max_data_level: Some(4),
            ..Default::default()
        });
        let k = key(6, 40, 20);
        let best = layer.best_available_tile_key(&k, false).unwrap();
        assert_eq!(best.level_of_detail(), 4);
        assert!(best.is_ancestor_of(&k));

        let shallow = key(3, 2, 1);
        assert_eq!(layer.best_available_tile_key(&shallow, false), Some(shallow));
    }

    #[test]
    fn test_level_gates() {
        let layer = layer(TileLayerOptions {
            min_level: Some(2),
            max_level: Some(5),
            ..Default::default()
        });
        assert!(layer.best_available_tile_key(&key(1, 0, 0), true).is_none());
        assert!(layer.best_available_tile_key(&key(6, 0, 0), true).is_none());
        assert!(layer.best_available_tile_key(&key(3, 0, 0), true).is_some());
        assert!(!layer.is_key_in_legal_range(&key(1, 0, 0)));
        assert!(layer.is_key_in_legal_range(&key(4, 0, 0)));
    }

    #[test]
    fn test_legal_vs_visual_range() {
        let layer = layer(TileLayerOptions {
            max_data_level: Some(3),
            ..Default::default()
        });
        let deep = key(5, 0, 0);
        assert!(!layer.is_key_in_legal_range(&deep));
        assert!(layer.is_key_in_visual_range(&deep));
    }

    #[test]
    fn test_resolution_gate_direction() {
        // At lod 0 a geodetic tile is 180 degrees wide: 180 / 256 per sample.
        let res0 = 180.0 / 256.0;
        let layer = layer(TileLayerOptions {
            max_resolution: Some(res0 / 2.0),
            ..Default::default()
        });
        // max_resolution rejects keys whose resolution is finer than it.
        assert!(layer.is_key_in_legal_range(&key(0, 0, 0)));
        assert!(!layer.is_key_in_legal_range(&key(2, 0, 0)));

        let layer = layer_with_min_res(res0 / 2.0);
        assert!(!layer.is_key_in_legal_range(&key(0, 0, 0)));
        assert!(layer.is_key_in_legal_range(&key(2, 0, 0)));
    }

    fn layer_with_min_res(res: f64) -> TileLayer {
        layer(TileLayerOptions {
            min_resolution: Some(res),
            ..Default::default()
        })
    }

    #[test]
    fn test_resolution_gate_needs_profile() {
        let layer = TileLayer::new(
            "no-profile",
            TileLayerOptions {
                max_resolution: Some(1e9),
                ..Default::default()
            },
        );
        assert!(layer.is_key_in_legal_range(&key(0, 0, 0)));
    }

    #[test]
    fn test_union() {
        let layer = layer(TileLayerOptions::default());
        assert!(layer.data_extents_union().is_none());
        layer.add_data_extent(DataExtent::with_levels(extent(0.0, 0.0, 10.0, 10.0), Some(3), Some(6)));
        layer.add_data_extent(DataExtent::with_levels(extent(-20.0, 5.0, 5.0, 30.0), Some(1), None));
        layer.add_data_extent(DataExtent::with_levels(extent(40.0, -5.0, 50.0, 0.0), None, Some(9)));

        let union = layer.data_extents_union().unwrap();
        assert_eq!(*union.extent(), extent(-20.0, -5.0, 50.0, 30.0));
        assert_eq!(union.min_level(), Some(1));
        assert_eq!(union.max_level(), Some(9));
        assert_eq!(layer.extent(), Some(*union.extent()));
    }

    #[test]
    fn test_union_promotes_mdl_when_upsampling() {
        let mut layer = layer(TileLayerOptions {
            max_data_level: Some(12),
            ..Default::default()
        });
        layer.add_data_extent(DataExtent::with_levels(extent(0.0, 0.0, 10.0, 10.0), None, Some(8)));
        assert_eq!(layer.data_extents_union().unwrap().max_level(), Some(8));

        layer.set_upsample(true);
        assert_eq!(layer.data_extents_union().unwrap().max_level(), Some(12));
    }

    #[test]
    fn test_min_level_skips_extent() {
        let layer = layer(TileLayerOptions::default());
        layer.add_data_extent(DataExtent::with_levels(extent(-180.0, -90.0, 180.0, 90.0), Some(4), None));
        assert!(layer.best_available_tile_key(&key(2, 1, 1), false).is_none());
        let k = key(5, 10, 10);
        assert_eq!(layer.best_available_tile_key(&k, false), Some(k));
    }

    #[test]
    fn test_may_have_data() {
        let layer = layer(TileLayerOptions::default());
        layer.add_data_extent(DataExtent::with_levels(extent(0.0, 0.0, 90.0, 90.0), None, Some(3)));
        // Tile 2/4/0 covers [0, 45] x [45, 90].
        assert!(layer.may_have_data(&key(2, 4, 0)));
        assert!(!layer.may_have_data(&key(5, 32, 0)));
        // Tile 1/0/1 covers [-180, -90] x [-90, 0].
        assert!(!layer.may_have_data(&key(1, 0, 1)));
    }

    #[test]
    fn test_setters_require_reopen() {
        let mut layer = layer(TileLayerOptions::default());
        assert!(!layer.reopen_required());
        layer.set_tile_size(512);
        assert!(layer.reopen_required());
        assert_eq!(layer.tile_size(), 512);

        layer.open(&IoOptions::new());
        assert!(!layer.reopen_required());
        assert!(layer.is_open());

        layer.set_upsample(false);
        assert!(layer.reopen_required());
        assert!(!layer.upsample());
    }

    #[test]
    fn test_open_canceled() {
        let mut layer = layer(TileLayerOptions::default());
        let io = IoOptions::new();
        io.cancel();
        assert_eq!(layer.open(&io).code(), StatusCode::ResourceUnavailable);
        assert!(!layer.is_open());
    }

    #[test]
    fn test_open_for_writing_unsupported() {
        let mut layer = layer(TileLayerOptions::default());
        let status = layer.open_for_writing(&IoOptions::new());
        assert_eq!(status.code(), StatusCode::ServiceUnavailable);

        layer.set_writing_supported(true);
        assert!(layer.open_for_writing(&IoOptions::new()).is_ok());
        assert!(layer.is_writing_requested());
        layer.close();
        assert!(!layer.is_open());
    }

    #[test]
    fn test_disabled_layer_stays_closed() {
        let mut layer = layer(TileLayerOptions::default());
        layer.disable("broken");
        assert_eq!(layer.status().code(), StatusCode::GeneralError);
        assert!(layer.open(&IoOptions::new()).is_error());
        assert!(!layer.is_open());
    }

    #[test]
    fn test_invalid_cache_bin_metadata_disables() {
        let mut layer = layer(TileLayerOptions::default());
        let status = layer.apply_cache_bin_metadata(&CacheBinMetadata::default());
        assert_eq!(status.code(), StatusCode::ConfigurationError);
        assert!(layer.open(&IoOptions::new()).is_error());
    }

    #[test]
    fn test_cache_bin_metadata_fills_gaps() {
        let mut layer = TileLayer::new("cached", TileLayerOptions::default());
        let de = DataExtent::with_levels(extent(0.0, 0.0, 10.0, 10.0), None, Some(7));
        let meta = CacheBinMetadata::new(
            256,
            profile_to_config(&Profile::spherical_mercator()),
            profile_to_config(&Profile::spherical_mercator()),
            vec![de],
        );
        assert!(layer.apply_cache_bin_metadata(&meta).is_ok());
        assert!(
            layer
                .profile()
                .is_some_and(|p| p.is_horiz_equivalent_to(&Profile::spherical_mercator()))
        );
        assert_eq!(layer.data_extents(), vec![de]);
    }

    #[test]
    fn test_config_round_trip() {
        let layer = layer(TileLayerOptions {
            min_level: Some(1),
            max_data_level: Some(14),
            max_resolution: Some(0.25),
            upsample: Some(true),
            tile_size: Some(257),
            ..Default::default()
        });
        let conf = layer.to_config();
        let parsed = TileLayer::from_config(&conf).unwrap();
        assert_eq!(parsed.name(), "test");
        assert_eq!(parsed.options(), layer.options());
    }

    #[test]
    fn test_options_serde() {
        let options = TileLayerOptions {
            max_level: Some(18),
            profile: Some(Profile::spherical_mercator()),
            ..Default::default()
        };
        let json = serde_json::to_string(&options).unwrap();
        let parsed: TileLayerOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, options);

        let sparse: TileLayerOptions = serde_json::from_str(r#"{"upsample": true}"#).unwrap();
        assert_eq!(sparse.upsample, Some(true));
        assert!(sparse.profile.is_none());
    }

    #[test]
    fn test_l2_cache_size_defaults() {
        if std::env::var_os(env::L2_CACHE_SIZE_VAR).is_some()
            || std::env::var_os(env::MEMORY_PROFILE_VAR).is_some()
        {
            return;
        }
        let layer = layer(TileLayerOptions::default());
        assert_eq!(layer.l2_cache_size(Some(&geodetic())), 0);
        assert_eq!(
            layer.l2_cache_size(Some(&Profile::spherical_mercator())),
            env::MOSAIC_L2_CACHE_SIZE
        );

        let sized = self::layer(TileLayerOptions {
            l2_cache_size: Some(4),
            ..Default::default()
        });
        assert_eq!(sized.l2_cache_size(Some(&Profile::spherical_mercator())), 4);
    }
}
