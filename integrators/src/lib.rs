//! Bidirectional Monte Carlo path integration with a shared light-vertex
//! cache, combined by multiple importance sampling, plus the unidirectional
//! reference path tracer.

pub mod bidir_base;
pub mod light_path_cache;
pub mod path_cache;
pub mod path_tracer;
pub mod random_walk;
pub mod tech_pyramid;
pub mod vertex_cache_bidir;
pub mod vertex_selector;

pub use light_path_cache::LightPathCache;
pub use path_cache::{PathCache, PathVertex};
pub use path_tracer::PathTracer;
pub use tech_pyramid::TechPyramid;
pub use vertex_cache_bidir::{RenderError, VertexCacheBidir};
pub use vertex_selector::VertexSelector;
