//! Uniform selection of connectable light vertices across the whole cache.

use crate::path_cache::PathCache;
use ground_core::base::*;
use ground_core::rng::Rng;

/// A flat index over every connectable cached vertex (depth at least one;
/// subpath roots carry no material to connect through). Selection is uniform
/// over the entire cache, independent of which path a vertex belongs to.
pub struct VertexSelector {
    entries: Vec<(u32, u32)>,
}

impl VertexSelector {
    /// Builds the flat index from a fully populated cache.
    ///
    /// * `cache` - The cache of the current iteration.
    pub fn new(cache: &PathCache) -> Self {
        let mut entries = Vec::new();
        for path_index in 0..cache.num_paths() as u32 {
            for vertex_index in 1..cache.length(path_index) {
                entries.push((path_index, vertex_index));
            }
        }
        Self { entries }
    }

    /// Number of selectable vertices.
    pub fn count(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing can be selected.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Draws one vertex uniformly, returning its path and vertex index plus
    /// the probability of this pick.
    ///
    /// * `rng` - The caller's random number generator.
    pub fn select(&self, rng: &mut Rng) -> Option<(u32, u32, Float)> {
        if self.entries.is_empty() {
            return None;
        }
        let pick = rng.next_int(0, self.entries.len() as u32) as usize;
        let (path_index, vertex_index) = self.entries[pick];
        Some((path_index, vertex_index, 1.0 / self.entries.len() as Float))
    }

    /// All selectable vertices, for the light tracer sweep.
    pub fn entries(&self) -> &[(u32, u32)] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path_cache::PathVertex;

    #[test]
    fn roots_are_not_selectable() {
        let mut cache = PathCache::new(2, 3);
        for path in 0..2u32 {
            for depth in 0..3u32 {
                let slot = path as usize * cache.stride + depth as usize;
                cache.vertices[slot] = PathVertex {
                    depth,
                    path_index: path,
                    ..Default::default()
                };
            }
            cache.lengths[path as usize] = 3;
        }

        let selector = VertexSelector::new(&cache);
        // Two paths with three vertices each, minus the two roots.
        assert_eq!(selector.count(), 4);

        let mut rng = Rng::new(1);
        for _ in 0..100 {
            let (path, vertex, prob) = selector.select(&mut rng).unwrap();
            assert!(vertex >= 1);
            assert!(path < 2);
            assert!((prob - 0.25).abs() < 1e-6);
        }
    }

    #[test]
    fn empty_cache_yields_nothing() {
        let cache = PathCache::new(2, 3);
        let selector = VertexSelector::new(&cache);
        assert!(selector.is_empty());
        let mut rng = Rng::new(1);
        assert!(selector.select(&mut rng).is_none());
    }
}
