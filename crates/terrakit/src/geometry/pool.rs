//! Pool of shared tile geometries.
//!
//! In a geocentric world every tile at one level and one row has the same
//! shape; each tile only places it differently. In a projected world every
//! tile at one level does. The pool builds one [`SharedGeometry`] per shape
//! and hands out shared references to it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use terrakit_geo::{Srs, TileKey};
use tracing::{debug, warn};

use super::key::GeometryKey;
use super::tessellate::{self, create_geometry, create_indices};
use super::types::{BuildError, Settings, SharedGeometry};
use crate::gate::Gate;
use crate::io::Cancelable;

/// Counters describing pool effectiveness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PoolStats {
    /// Geometries tessellated, including canceled attempts.
    pub builds: u64,
    /// Requests answered from the pool.
    pub hits: u64,
    /// Requests that had to build.
    pub misses: u64,
}

impl PoolStats {
    /// Fraction of pooled requests answered without building.
    #[must_use]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Keyed, single-flight cache of tile geometry.
///
/// Settings other than the tile size are not part of the key, so a pool
/// should be used with one set of settings at a time; call
/// [`GeometryPool::clear`] when they change.
#[derive(Debug)]
pub struct GeometryPool {
    world_srs: Srs,
    enabled: bool,
    gate: Gate<GeometryKey>,
    geometries: RwLock<HashMap<GeometryKey, Arc<SharedGeometry>>>,
    default_indices: Mutex<Option<(Settings, Arc<Vec<u16>>)>>,
    builds: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl GeometryPool {
    /// Create an enabled, empty pool for a world in `world_srs`.
    #[must_use]
    pub fn new(world_srs: Srs) -> Self {
        Self {
            world_srs,
            enabled: true,
            gate: Gate::new(),
            geometries: RwLock::new(HashMap::new()),
            default_indices: Mutex::new(None),
            builds: AtomicU64::new(0),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Turn sharing on or off. A disabled pool builds a fresh geometry on
    /// every request.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Whether geometries are shared.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// SRS of the world geometries are built for.
    #[must_use]
    pub fn world_srs(&self) -> Srs {
        self.world_srs
    }

    /// Number of skirt indices a geometry built with `settings` carries.
    #[must_use]
    pub fn num_skirt_elements(&self, settings: &Settings) -> u32 {
        tessellate::num_skirt_elements(settings)
    }

    /// The geometry for `key`, built on first request.
    ///
    /// Concurrent requests for the same shape wait for a single build. Returns
    /// `None` when the build is canceled or fails; nothing is pooled then.
    pub fn get_pooled_geometry<C: Cancelable + ?Sized>(
        &self,
        key: &TileKey,
        settings: &Settings,
        cancel: &C,
    ) -> Option<Arc<SharedGeometry>> {
        if !self.enabled {
            return self.build(key, settings, cancel).map(Arc::new);
        }

        let geometry_key = GeometryKey::for_tile_key(key, settings.tile_size, self.world_srs);
        if let Some(geometry) = self.lookup(&geometry_key) {
            return Some(geometry);
        }

        let _guard = self.gate.lock(&geometry_key);
        // Another thread may have finished the build while we waited.
        if let Some(geometry) = self.lookup(&geometry_key) {
            return Some(geometry);
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let geometry = Arc::new(self.build(key, settings, cancel)?);
        self.geometries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(geometry_key, Arc::clone(&geometry));
        Some(geometry)
    }

    fn lookup(&self, key: &GeometryKey) -> Option<Arc<SharedGeometry>> {
        let geometries = self.geometries.read().unwrap_or_else(PoisonError::into_inner);
        let geometry = geometries.get(key).map(Arc::clone)?;
        self.hits.fetch_add(1, Ordering::Relaxed);
        Some(geometry)
    }

    fn build<C: Cancelable + ?Sized>(
        &self,
        key: &TileKey,
        settings: &Settings,
        cancel: &C,
    ) -> Option<SharedGeometry> {
        self.builds.fetch_add(1, Ordering::Relaxed);
        let indices = self.default_indices(settings);
        match create_geometry(
            key,
            settings,
            self.world_srs,
            indices.as_ref().map(|i| i.as_slice()),
            cancel,
        ) {
            Ok(geometry) => {
                debug!(tile = %key, vertices = geometry.vertex_count(), "built tile geometry");
                Some(geometry)
            }
            Err(BuildError::Canceled) => {
                debug!(tile = %key, "tile geometry build canceled");
                None
            }
            Err(e) => {
                warn!(tile = %key, error = %e, "failed to build tile geometry");
                None
            }
        }
    }

    /// Index list for `settings`, reused while the settings stay the same.
    fn default_indices(&self, settings: &Settings) -> Option<Arc<Vec<u16>>> {
        let mut cached = self
            .default_indices
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if let Some((cached_settings, indices)) = cached.as_ref() {
            if cached_settings == settings {
                return Some(Arc::clone(indices));
            }
        }
        let indices = Arc::new(create_indices(settings).ok()?);
        *cached = Some((*settings, Arc::clone(&indices)));
        Some(indices)
    }

    /// Drop every pooled geometry and the cached indices.
    ///
    /// Handles already given out stay valid.
    pub fn clear(&self) {
        self.geometries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
        *self
            .default_indices
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Number of pooled geometries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.geometries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing is pooled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of the pool counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        PoolStats {
            builds: self.builds.load(Ordering::Relaxed),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }
}
