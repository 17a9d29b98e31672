//! Tile grid tessellation.
//!
//! A tile is a `size × size` grid of vertices, row 0 along the southern edge.
//! When skirts are enabled, a ring of `4 · size` extra vertices hangs below the
//! tile boundary: each edge is walked corner to corner, so every corner
//! appears once at the end of one edge and again at the start of the next.

use glam::{DMat4, DVec3, Vec3};
use terrakit_geo::{Ellipsoid, GeoExtent, Srs, TileKey};
use tracing::trace;

use super::types::{
    BuildError, BuildResult, DrawCommand, SharedGeometry, Settings, vertex_flags,
};
use crate::io::Cancelable;

/// Check that `settings` can be tessellated with 16-bit indices.
pub fn validate(settings: &Settings) -> BuildResult<()> {
    if settings.tile_size < 2 {
        return Err(BuildError::InvalidSettings {
            detail: format!("tile_size {} is below 2", settings.tile_size),
        });
    }
    if !settings.skirt_ratio.is_finite() || settings.skirt_ratio < 0.0 {
        return Err(BuildError::InvalidSettings {
            detail: format!("skirt_ratio {} must be finite and non-negative", settings.skirt_ratio),
        });
    }
    let count = vertex_count(settings);
    if count > usize::from(u16::MAX) + 1 {
        return Err(BuildError::TooManyVertices { count });
    }
    Ok(())
}

fn has_skirt(settings: &Settings) -> bool {
    settings.skirt_ratio > 0.0
}

fn vertex_count(settings: &Settings) -> usize {
    let size = settings.tile_size as usize;
    let skirt = if has_skirt(settings) { 4 * size } else { 0 };
    size * size + skirt
}

/// Number of surface indices for a grid of `tile_size` vertices per edge.
#[must_use]
pub fn num_surface_elements(settings: &Settings) -> u32 {
    let quads = settings.tile_size.saturating_sub(1);
    quads * quads * 6
}

/// Number of skirt indices, or 0 when skirts are off.
#[must_use]
pub fn num_skirt_elements(settings: &Settings) -> u32 {
    if has_skirt(settings) {
        4 * settings.tile_size * 6
    } else {
        0
    }
}

/// Surface vertex indices of the skirt ring, in walk order.
fn skirt_ring(size: u32) -> impl Iterator<Item = u32> {
    let last = size - 1;
    let south = 0..size;
    let east = (0..size).map(move |j| j * size + last);
    let north = (0..size).rev().map(move |i| last * size + i);
    let west = (0..size).rev().map(move |j| j * size);
    south.chain(east).chain(north).chain(west)
}

/// Build the triangle list for a tile: the surface grid, then the skirt.
///
/// With morphing, quad diagonals alternate in a checkerboard so that every
/// other vertex can collapse onto its neighbors.
pub fn create_indices(settings: &Settings) -> BuildResult<Vec<u16>> {
    validate(settings)?;
    let size = settings.tile_size;
    let total = num_surface_elements(settings) + num_skirt_elements(settings);
    let mut indices = Vec::with_capacity(total as usize);
    let mut push = |tri: [u32; 3]| indices.extend(tri.map(|v| v as u16));

    for j in 0..size - 1 {
        for i in 0..size - 1 {
            let v00 = j * size + i;
            let v10 = v00 + 1;
            let v01 = v00 + size;
            let v11 = v01 + 1;
            if settings.morphing && (i + j) % 2 == 1 {
                push([v00, v10, v01]);
                push([v10, v11, v01]);
            } else {
                push([v00, v10, v11]);
                push([v00, v11, v01]);
            }
        }
    }

    if has_skirt(settings) {
        let ring: Vec<u32> = skirt_ring(size).collect();
        let base = size * size;
        let n = ring.len() as u32;
        for k in 0..n {
            let next = (k + 1) % n;
            let a = ring[k as usize];
            let b = ring[next as usize];
            let c = base + k;
            let d = base + next;
            push([a, c, b]);
            push([b, c, d]);
        }
    }

    Ok(indices)
}

/// Length of the longest grid edge, measured corner to corner.
///
/// A tile touching a pole has one edge collapsed to a point, so no single
/// edge can stand in for the tile size.
fn longest_edge(positions: &[Vec3], size: u32) -> f32 {
    let last = (size - 1) as usize;
    let size = size as usize;
    let sw = positions[0];
    let se = positions[last];
    let nw = positions[last * size];
    let ne = positions[last * size + last];
    [sw.distance(se), se.distance(ne), ne.distance(nw), nw.distance(sw)]
        .into_iter()
        .fold(0.0, f32::max)
}

/// Geodetic longitude and latitude of a point in `srs`.
fn to_geodetic(srs: Srs, x: f64, y: f64) -> BuildResult<(f64, f64)> {
    Ok(srs.transform_xy(Srs::Geographic, x, y)?)
}

/// Local frame of a tile on the globe, centered on its extent.
fn geocentric_frame(extent: &GeoExtent) -> BuildResult<DMat4> {
    let (cx, cy) = extent.center();
    let (lon, lat) = to_geodetic(extent.srs(), cx, cy)?;
    Ok(Ellipsoid::WGS84.local_to_world(lon, lat, 0.0))
}

/// Where a tile's shared geometry sits in the world.
///
/// On a geocentric globe this is the tile's local east-north-up frame. In a
/// projected world it maps the unit square onto the tile extent.
pub fn tile_local_to_world(key: &TileKey, world_srs: Srs) -> BuildResult<DMat4> {
    let extent = key.extent();
    if world_srs.is_geocentric() {
        return geocentric_frame(&extent);
    }
    let extent = extent.transform(world_srs)?;
    Ok(DMat4::from_translation(DVec3::new(extent.x_min(), extent.y_min(), 0.0))
        * DMat4::from_scale(DVec3::new(extent.width(), extent.height(), 1.0)))
}

/// Tessellate the geometry shared by every tile with `key`'s shape.
///
/// `indices` may supply a prebuilt index list from [`create_indices`] for the
/// same settings. `cancel` is polled after each vertex row and before the
/// index list is produced.
pub fn create_geometry<C: Cancelable + ?Sized>(
    key: &TileKey,
    settings: &Settings,
    world_srs: Srs,
    indices: Option<&[u16]>,
    cancel: &C,
) -> BuildResult<SharedGeometry> {
    validate(settings)?;
    let size = settings.tile_size;
    let last = size - 1;
    let count = vertex_count(settings);

    let mut positions = Vec::with_capacity(count);
    let mut normals = Vec::with_capacity(count);
    let mut uvs = Vec::with_capacity(count);

    // Every tile in a geocentric row shares the shape of the row's first tile.
    let (extent, world_to_local) = if world_srs.is_geocentric() {
        let row_start = TileKey::new(key.level_of_detail(), 0, key.tile_y(), *key.profile())?;
        let extent = row_start.extent();
        (Some(extent), geocentric_frame(&extent)?.inverse())
    } else {
        (None, DMat4::IDENTITY)
    };

    for j in 0..size {
        let ny = f64::from(j) / f64::from(last);
        for i in 0..size {
            let nx = f64::from(i) / f64::from(last);
            let mut flags = vertex_flags::VISIBLE | vertex_flags::HAS_ELEVATION;
            if i == 0 || j == 0 || i == last || j == last {
                flags |= vertex_flags::BOUNDARY;
            }

            let (position, normal) = match &extent {
                Some(extent) => {
                    let x = extent.x_min() + nx * extent.width();
                    let y = extent.y_min() + ny * extent.height();
                    let (lon, lat) = to_geodetic(extent.srs(), x, y)?;
                    let ellipsoid = Ellipsoid::WGS84;
                    let world = ellipsoid.geodetic_to_geocentric(lon, lat, 0.0);
                    let up = ellipsoid.surface_normal(lon, lat);
                    (
                        world_to_local.transform_point3(world).as_vec3(),
                        world_to_local.transform_vector3(up).normalize().as_vec3(),
                    )
                }
                None => (Vec3::new(nx as f32, ny as f32, 0.0), Vec3::Z),
            };

            positions.push(position);
            normals.push(normal);
            uvs.push(Vec3::new(nx as f32, ny as f32, flags as f32));
        }
        if cancel.is_canceled() {
            trace!(lod = key.level_of_detail(), row = j, "tessellation canceled");
            return Err(BuildError::Canceled);
        }
    }

    if has_skirt(settings) {
        let height = settings.skirt_ratio * longest_edge(&positions, size);
        for v in skirt_ring(size) {
            let v = v as usize;
            let mut uv = uvs[v];
            uv.z = (uv.z as u32 | vertex_flags::SKIRT | vertex_flags::BOUNDARY) as f32;
            positions.push(positions[v] - normals[v] * height);
            normals.push(normals[v]);
            uvs.push(uv);
        }
    }

    if cancel.is_canceled() {
        return Err(BuildError::Canceled);
    }
    let indices = match indices {
        Some(indices) => indices.to_vec(),
        None => create_indices(settings)?,
    };

    let surface = num_surface_elements(settings);
    let mut commands = vec![DrawCommand {
        first_index: 0,
        index_count: surface,
    }];
    if has_skirt(settings) {
        commands.push(DrawCommand {
            first_index: surface,
            index_count: num_skirt_elements(settings),
        });
    }

    Ok(SharedGeometry {
        positions,
        normals,
        uvs,
        indices,
        has_constraints: false,
        commands,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicBool;
    use terrakit_geo::Profile;

    use crate::io::NeverCancel;

    fn settings(tile_size: u32, skirt_ratio: f32, morphing: bool) -> Settings {
        Settings {
            tile_size,
            skirt_ratio,
            morphing,
        }
    }

    fn tile(lod: u32, x: u32, y: u32) -> TileKey {
        TileKey::new(lod, x, y, Profile::global_geodetic()).unwrap()
    }

    #[test]
    fn test_element_counts() {
        let s = settings(17, 0.1, true);
        assert_eq!(num_surface_elements(&s), 16 * 16 * 6);
        assert_eq!(num_skirt_elements(&s), 4 * 17 * 6);
        let indices = create_indices(&s).unwrap();
        assert_eq!(
            indices.len() as u32,
            num_surface_elements(&s) + num_skirt_elements(&s)
        );
        assert_eq!(num_skirt_elements(&settings(17, 0.0, true)), 0);
    }

    #[test]
    fn test_indices_in_range() {
        let s = settings(9, 0.05, false);
        let indices = create_indices(&s).unwrap();
        let vertices = 9 * 9 + 4 * 9;
        assert!(indices.iter().all(|&i| usize::from(i) < vertices));
    }

    #[test]
    fn test_morphing_alternates_diagonals() {
        let plain = create_indices(&settings(3, 0.0, false)).unwrap();
        let morph = create_indices(&settings(3, 0.0, true)).unwrap();
        // The first quad is the same, the second differs.
        assert_eq!(plain[..6], morph[..6]);
        assert_ne!(plain[6..12], morph[6..12]);
    }

    #[test]
    fn test_invalid_settings() {
        assert!(matches!(
            create_indices(&settings(1, 0.0, false)),
            Err(BuildError::InvalidSettings { .. })
        ));
        assert!(matches!(
            create_indices(&settings(300, 0.0, false)),
            Err(BuildError::TooManyVertices { .. })
        ));
        assert!(create_indices(&settings(250, 0.1, true)).is_ok());
        assert!(create_indices(&settings(255, 0.1, true)).is_err());
    }

    #[test]
    fn test_projected_geometry() {
        let s = settings(5, 0.1, true);
        let g = create_geometry(&tile(3, 2, 1), &s, Srs::SphericalMercator, None, &NeverCancel)
            .unwrap();
        assert_eq!(g.vertex_count(), 25 + 20);
        assert_eq!(g.positions[0], Vec3::ZERO);
        assert_eq!(g.positions[24], Vec3::new(1.0, 1.0, 0.0));
        assert!(g.normals[..25].iter().all(|n| *n == Vec3::Z));
        assert_eq!(g.commands.len(), 2);
        assert_eq!(g.commands[1].first_index, g.commands[0].index_count);

        // Skirt hangs below the surface.
        assert!(g.positions[25..].iter().all(|p| p.z < 0.0));
        assert!((25..45).all(|v| g.flags(v) & vertex_flags::SKIRT != 0));
    }

    #[test]
    fn test_boundary_flags() {
        let s = settings(4, 0.0, false);
        let g = create_geometry(&tile(2, 0, 0), &s, Srs::SphericalMercator, None, &NeverCancel)
            .unwrap();
        for j in 0..4usize {
            for i in 0..4usize {
                let flags = g.flags(j * 4 + i);
                let edge = i == 0 || j == 0 || i == 3 || j == 3;
                assert_eq!(flags & vertex_flags::BOUNDARY != 0, edge, "vertex {i},{j}");
                assert_ne!(flags & vertex_flags::VISIBLE, 0);
            }
        }
        assert_eq!(g.commands.len(), 1);
    }

    #[test]
    fn test_geocentric_row_is_shared_shape() {
        let s = settings(5, 0.0, false);
        let a = create_geometry(&tile(3, 1, 2), &s, Srs::Geocentric, None, &NeverCancel).unwrap();
        let b = create_geometry(&tile(3, 9, 2), &s, Srs::Geocentric, None, &NeverCancel).unwrap();
        assert_eq!(a.positions, b.positions);

        // Local frames put the surface near z = 0 with normals close to +Z.
        let center = &a.normals[12];
        assert!(center.z > 0.999);
        assert!(a.positions[12].z.abs() < 1.0);
    }

    #[test]
    fn test_polar_rows_get_skirts() {
        let s = settings(5, 0.1, false);
        let ring: Vec<u32> = skirt_ring(5).collect();
        for y in [0, 3] {
            let g = create_geometry(&tile(2, 0, y), &s, Srs::Geocentric, None, &NeverCancel)
                .unwrap();
            for (k, &v) in ring.iter().enumerate() {
                let drop = g.positions[25 + k].distance(g.positions[v as usize]);
                assert!(drop > 1000.0, "row {y} skirt vertex {k} dropped {drop} m");
            }
        }
    }

    #[test]
    fn test_geocentric_placement() {
        let key = tile(3, 9, 2);
        let local_to_world = tile_local_to_world(&key, Srs::Geocentric).unwrap();
        let g = create_geometry(&key, &settings(5, 0.0, false), Srs::Geocentric, None, &NeverCancel)
            .unwrap();

        // The south-west grid corner lands on the tile's south-west corner.
        let extent = key.extent();
        let expected =
            Ellipsoid::WGS84.geodetic_to_geocentric(extent.x_min(), extent.y_min(), 0.0);
        let placed = local_to_world.transform_point3(g.positions[0].as_dvec3());
        assert!(placed.distance(expected) < 1.0, "off by {}", placed.distance(expected));
    }

    #[test]
    fn test_projected_placement() {
        let key = TileKey::new(1, 1, 0, Profile::spherical_mercator()).unwrap();
        let m = tile_local_to_world(&key, Srs::SphericalMercator).unwrap();
        let extent = key.extent();
        let corner = m.transform_point3(DVec3::new(1.0, 1.0, 0.0));
        assert!((corner.x - extent.x_max()).abs() < 1e-6);
        assert!((corner.y - extent.y_max()).abs() < 1e-6);
    }

    #[test]
    fn test_canceled() {
        let canceled = AtomicBool::new(true);
        let result = create_geometry(
            &tile(2, 0, 0),
            &settings(9, 0.1, true),
            Srs::Geocentric,
            None,
            &canceled,
        );
        assert_eq!(result.unwrap_err(), BuildError::Canceled);
    }

    #[test]
    fn test_prebuilt_indices() {
        let s = settings(6, 0.1, true);
        let indices = create_indices(&s).unwrap();
        let g = create_geometry(&tile(2, 0, 0), &s, Srs::SphericalMercator, Some(&indices), &NeverCancel)
            .unwrap();
        assert_eq!(g.indices, indices);
    }
}
