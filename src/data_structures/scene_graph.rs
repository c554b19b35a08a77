//! Graphic branches: the named grouping a template is wrapped in before it is
//! instanced.

use crate::graphic::GraphicRef;

/// A named container of graphics that is instanced as a whole.
///
/// The decorator keeps one branch around the current template and asks the
/// render system for a positioned copy of it on every placement. The branch
/// itself is never drawn.
#[derive(Clone, Debug, Default)]
pub struct GraphicBranch {
    name: String,
    entries: Vec<GraphicRef>,
}

impl GraphicBranch {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn add(&mut self, graphic: GraphicRef) {
        self.entries.push(graphic);
    }

    pub fn entries(&self) -> &[GraphicRef] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry. Graphics already instanced from this branch are not affected.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
