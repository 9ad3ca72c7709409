//! Contiguous storage for the vertices of all light subpaths of one
//! iteration.

use ground_core::base::*;
use ground_core::geometry::SurfacePoint;
use ground_core::spectrum::RgbColor;

/// One cached light-subpath vertex.
///
/// Depth 0 is the point on the emitter (or on the scene bounding sphere for
/// background paths), depth 1 the primary light hit. `pdf_reverse_ancestor`
/// is the density of sampling this vertex from its successor; it stays zero
/// on vertices the walk never advanced past, in particular terminal ones.
#[derive(Copy, Clone, Default)]
pub struct PathVertex {
    /// The surface point.
    pub point: SurfacePoint,

    /// Density of this vertex as sampled from its ancestor, in the sampling
    /// direction of the subpath. Area measure for surface ancestors.
    pub pdf_from_ancestor: Float,

    /// Density of sampling this vertex from its successor.
    pub pdf_reverse_ancestor: Float,

    /// Set only on the depth 2 vertex: the density with which next-event
    /// estimation would sample the subpath root from the depth 1 vertex.
    pub pdf_next_event_ancestor: Float,

    /// Accumulated throughput from the start of the subpath.
    pub weight: RgbColor,

    /// Index of the ancestor within the same path; strictly less than this
    /// vertex's own index.
    pub ancestor_index: u32,

    /// Depth along the subpath.
    pub depth: u32,

    /// Index of the owning path.
    pub path_index: u32,

    /// True on roots of background paths, which sit on the scene bounding
    /// sphere instead of an emitter.
    pub is_background: bool,
}

/// Dense per-iteration vertex storage: one fixed-stride slot range per light
/// path plus the used length of each range. Built once per iteration by the
/// light path tracer, read-only afterwards.
pub struct PathCache {
    pub(crate) vertices: Vec<PathVertex>,
    pub(crate) lengths: Vec<u32>,
    pub(crate) stride: usize,
}

impl PathCache {
    /// Allocates storage for a fixed number of paths and depth bound.
    ///
    /// * `num_paths` - Number of light paths per iteration.
    /// * `max_depth` - Maximum subpath depth; each path gets `max_depth + 1`
    ///                 slots.
    pub fn new(num_paths: usize, max_depth: u32) -> Self {
        let stride = max_depth as usize + 1;
        Self {
            vertices: vec![PathVertex::default(); num_paths * stride],
            lengths: vec![0; num_paths],
            stride,
        }
    }

    /// Number of paths.
    pub fn num_paths(&self) -> usize {
        self.lengths.len()
    }

    /// Number of cached vertices of one path.
    ///
    /// * `path_index` - The path.
    pub fn length(&self, path_index: u32) -> u32 {
        self.lengths[path_index as usize]
    }

    /// A cached vertex.
    ///
    /// * `path_index`   - The path.
    /// * `vertex_index` - Index of the vertex within the path.
    pub fn vertex(&self, path_index: u32, vertex_index: u32) -> &PathVertex {
        debug_assert!(vertex_index < self.lengths[path_index as usize]);
        &self.vertices[path_index as usize * self.stride + vertex_index as usize]
    }

    /// The ancestor of a cached vertex.
    ///
    /// * `vertex` - The vertex.
    pub fn ancestor(&self, vertex: &PathVertex) -> &PathVertex {
        self.vertex(vertex.path_index, vertex.ancestor_index)
    }

    /// Resets all path lengths for the next iteration. Slot contents are
    /// overwritten lazily.
    pub fn clear(&mut self) {
        for length in self.lengths.iter_mut() {
            *length = 0;
        }
    }
}
