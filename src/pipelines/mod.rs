//! Render pipelines for decorations.

pub mod basic;
