//! Metadata persisted alongside a layer's tile cache.

use tracing::warn;

use crate::config::Config;
use crate::data_extent::DataExtent;

/// Attribution for one cache bin.
///
/// Metadata read from an empty document, or one missing the source tile size
/// or either profile, is invalid and must not be applied to a layer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CacheBinMetadata {
    valid: bool,
    pub cachebin_id: Option<String>,
    pub source_name: Option<String>,
    pub source_driver: Option<String>,
    pub source_tile_size: Option<u32>,
    pub source_profile: Option<Config>,
    pub cache_profile: Option<Config>,
    pub cache_create_time: Option<i64>,
    pub data_extents: Vec<DataExtent>,
}

impl CacheBinMetadata {
    /// Read metadata from its config form.
    ///
    /// Extents that fail to parse are skipped with a warning.
    #[must_use]
    pub fn from_config(conf: &Config) -> Self {
        let mut data_extents = Vec::new();
        if let Some(extents) = conf.child("extents") {
            for extent in extents.children() {
                match DataExtent::from_config(extent) {
                    Ok(de) => data_extents.push(de),
                    Err(e) => warn!(error = %e, "skipping malformed cache bin extent"),
                }
            }
        }

        let valid = !conf.is_empty()
            && conf.has_value("source_tile_size")
            && conf.has_child("source_profile")
            && conf.has_child("cache_profile");

        Self {
            valid,
            cachebin_id: conf.value("cachebin_id").map(str::to_string),
            source_name: conf.value("source_name").map(str::to_string),
            source_driver: conf.value("source_driver").map(str::to_string),
            source_tile_size: conf.get("source_tile_size"),
            source_profile: conf.child("source_profile").cloned(),
            cache_profile: conf.child("cache_profile").cloned(),
            cache_create_time: conf.get("cache_create_time"),
            data_extents,
        }
    }

    /// Metadata describing a cache being written now.
    ///
    /// Validity follows the same rule as parsed metadata.
    #[must_use]
    pub fn new(
        source_tile_size: u32,
        source_profile: Config,
        cache_profile: Config,
        data_extents: Vec<DataExtent>,
    ) -> Self {
        Self {
            valid: true,
            source_tile_size: Some(source_tile_size),
            source_profile: Some(source_profile),
            cache_profile: Some(cache_profile),
            data_extents,
            ..Self::default()
        }
    }

    /// Whether every required attribute was present.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.valid
            && self.source_tile_size.is_some()
            && self.source_profile.is_some()
            && self.cache_profile.is_some()
    }

    /// Serialize into a `cachebin` node.
    #[must_use]
    pub fn to_config(&self) -> Config {
        let mut conf = Config::new("cachebin");
        conf.set_opt("cachebin_id", self.cachebin_id.as_deref());
        conf.set_opt("source_name", self.source_name.as_deref());
        conf.set_opt("source_driver", self.source_driver.as_deref());
        conf.set_opt("source_tile_size", self.source_tile_size);
        if let Some(profile) = &self.source_profile {
            conf.set_child("source_profile", profile.clone());
        }
        if let Some(profile) = &self.cache_profile {
            conf.set_child("cache_profile", profile.clone());
        }
        conf.set_opt("cache_create_time", self.cache_create_time);

        if !self.data_extents.is_empty() {
            let mut extents = Config::new("extents");
            for de in &self.data_extents {
                extents.add("extent", de.to_config());
            }
            conf.set_child("extents", extents);
        }
        conf
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::profile_to_config;
    use terrakit_geo::{GeoExtent, Profile, Srs};

    fn sample() -> CacheBinMetadata {
        let extent = GeoExtent::new(Srs::Geographic, -10.0, 35.0, 30.0, 70.0).unwrap();
        let mut meta = CacheBinMetadata::new(
            256,
            profile_to_config(&Profile::global_geodetic()),
            profile_to_config(&Profile::spherical_mercator()),
            vec![DataExtent::with_levels(extent, Some(0), Some(8))],
        );
        meta.cachebin_id = Some("imagery_1".into());
        meta.source_driver = Some("tms".into());
        meta.cache_create_time = Some(1_700_000_000);
        meta
    }

    #[test]
    fn test_round_trip() {
        let meta = sample();
        assert!(meta.is_valid());
        let parsed = CacheBinMetadata::from_config(&meta.to_config());
        assert!(parsed.is_valid());
        assert_eq!(parsed.to_config(), meta.to_config());
        assert_eq!(parsed.data_extents, meta.data_extents);
        assert_eq!(parsed.source_tile_size, Some(256));
        assert_eq!(parsed.cachebin_id.as_deref(), Some("imagery_1"));
    }

    #[test]
    fn test_empty_is_invalid() {
        let meta = CacheBinMetadata::from_config(&Config::new("cachebin"));
        assert!(!meta.is_valid());
    }

    #[test]
    fn test_missing_fields_are_invalid() {
        for field in ["source_tile_size", "source_profile", "cache_profile"] {
            let mut conf = sample().to_config();
            conf.remove(field);
            let meta = CacheBinMetadata::from_config(&conf);
            assert!(!meta.is_valid(), "{field} should be required");
        }
    }

    #[test]
    fn test_malformed_extent_is_skipped() {
        let mut conf = sample().to_config();
        let mut extents = conf.child("extents").cloned().unwrap();
        let mut bad = Config::new("extent");
        bad.set("srs", "mars");
        extents.add("extent", bad);
        conf.set_child("extents", extents);

        let meta = CacheBinMetadata::from_config(&conf);
        assert_eq!(meta.data_extents.len(), 1);
        assert!(meta.is_valid());
    }
}
