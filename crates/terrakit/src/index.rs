//! R-tree over 2-D rectangles.

use rstar::{AABB, RTree, RTreeObject};

use crate::data_extent::DataExtent;

/// Index of a layer's data extents in the layer SRS.
pub type DataExtentsIndex = SpatialIndex<DataExtent>;

#[derive(Debug, Clone)]
struct Entry<T> {
    envelope: AABB<[f64; 2]>,
    payload: T,
}

impl<T> RTreeObject for Entry<T> {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

/// Axis-aligned rectangles with arbitrary payloads.
#[derive(Debug, Clone)]
pub struct SpatialIndex<T> {
    tree: RTree<Entry<T>>,
}

impl<T> Default for SpatialIndex<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> SpatialIndex<T> {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Add `payload` covering the rectangle from `min` to `max`.
    pub fn insert(&mut self, min: [f64; 2], max: [f64; 2], payload: T) {
        self.tree.insert(Entry {
            envelope: AABB::from_corners(min, max),
            payload,
        });
    }

    /// Visit every payload whose rectangle intersects `[min, max]`.
    ///
    /// Rectangles that only touch the query count as intersecting. The visitor
    /// returns `false` to stop early. Returns the number of payloads visited.
    pub fn search<F>(&self, min: [f64; 2], max: [f64; 2], mut visitor: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let envelope = AABB::from_corners(min, max);
        let mut visited = 0;
        for entry in self.tree.locate_in_envelope_intersecting(&envelope) {
            visited += 1;
            if !visitor(&entry.payload) {
                break;
            }
        }
        visited
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tree.size()
    }

    /// Whether the index has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tree.size() == 0
    }

    /// All entries as `(min, max, payload)`, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = ([f64; 2], [f64; 2], &T)> {
        self.tree
            .iter()
            .map(|entry| (entry.envelope.lower(), entry.envelope.upper(), &entry.payload))
    }
}
