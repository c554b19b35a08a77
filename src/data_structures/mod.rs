//! Engine data structures: placements, graphic branches and GPU meshes.
//!
//! - `instance` holds the placement transform and its GPU layout
//! - `scene_graph` contains the graphic branch a template is wrapped in
//! - `model` contains the vertex layout and GPU meshes of templates

pub mod instance;
pub mod model;
pub mod scene_graph;
