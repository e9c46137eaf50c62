//! wgpu render pipelines.
//!
//! - [`sprite`]: multi-texture sprite pipeline, one variant per blend mode.

pub mod sprite;
