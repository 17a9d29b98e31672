//! Environment overrides for layer memory settings.

use tracing::debug;

/// Overrides the per-layer L2 cache size when set to an integer.
pub const L2_CACHE_SIZE_VAR: &str = "ROCKY_L2_CACHE_SIZE";

/// Disables the L2 cache entirely when set to any value.
pub const MEMORY_PROFILE_VAR: &str = "ROCKY_MEMORY_PROFILE";

/// L2 size used when the map and layer profiles differ, since mosaicing is
/// then likely.
pub const MOSAIC_L2_CACHE_SIZE: u32 = 16;

/// Resolve the effective L2 cache size from the process environment.
#[must_use]
pub fn l2_cache_size(requested: u32) -> u32 {
    let l2_override = std::env::var(L2_CACHE_SIZE_VAR).ok();
    let memory_profile = std::env::var_os(MEMORY_PROFILE_VAR).is_some();
    resolve_l2_cache_size(requested, l2_override.as_deref(), memory_profile)
}

/// Apply the environment rules to a requested size.
///
/// An override that fails to parse counts as 0. The memory profile wins over
/// everything.
#[must_use]
pub fn resolve_l2_cache_size(requested: u32, l2_override: Option<&str>, memory_profile: bool) -> u32 {
    let mut size = requested;
    if let Some(value) = l2_override {
        size = value.trim().parse().unwrap_or(0);
        debug!(size, "L2 cache size set from environment");
    }
    if memory_profile {
        size = 0;
    }
    size
}
