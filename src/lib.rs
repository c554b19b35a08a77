//! decor-ngin
//!
//! Instanced marker decorations for 3D views rendered by a host engine. One
//! template asset is placed at many world positions; every placement becomes a
//! GPU graphic that is owned by the decorator until it is explicitly released.
//! The host asks the decorator for its graphics once per viewport and frame and
//! may cache the answer until the decorator invalidates it.
//!
//! High-level modules
//! - `placed_graphic`: the decorator that owns template, branch and placed graphics
//! - `decorator`: the decorator contract and per-frame decoration context
//! - `view_manager`: host side registry, viewports and decoration caching
//! - `graphic`: render graphics, their single owner and the render system seam
//! - `data_structures`: placement transforms, graphic branches and GPU meshes
//! - `context`: headless GPU setup and the wgpu backed render system
//! - `pipelines`: the pipeline drawing scene decorations
//! - `render`: decoration categories and batching into instanced draws
//! - `resources`: loading templates from glTF assets
//! - `config`: placement configuration
//! - `flow`: loading, placing and (un)registering in one place
//!

pub mod config;
pub mod context;
pub mod data_structures;
pub mod decorator;
pub mod flow;
pub mod graphic;
pub mod pipelines;
pub mod placed_graphic;
pub mod render;
pub mod resources;
pub mod view_manager;

// Re-exports commonly used types for convenience in downstream code.
pub use cgmath;
pub use wgpu;
