//! Placement configuration.
//!
//! Which template to load and where to put it is read from a JSON asset,
//! `assets/coordinates.json` by default:
//!
//! ```json
//! {
//!     "template": "Streetlights",
//!     "height_offset": 0.0,
//!     "coordinates": [{ "x": 1.0, "y": 2.0, "z": -5.1 }]
//! }
//! ```
//!
//! Every field is optional.

use serde::{Deserialize, Serialize};

use crate::resources::load_string;

pub const DEFAULT_CONFIG_FILE: &str = "coordinates.json";
pub const DEFAULT_TEMPLATE: &str = "Streetlights";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<Coordinate> for cgmath::Vector3<f32> {
    fn from(c: Coordinate) -> Self {
        cgmath::Vector3::new(c.x, c.y, c.z)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Asset name of the template, without the `.glb` extension.
    pub template: String,
    /// Added to the `z` of every coordinate.
    pub height_offset: f32,
    pub coordinates: Vec<Coordinate>,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self {
            template: DEFAULT_TEMPLATE.to_string(),
            height_offset: 0.0,
            coordinates: Vec::new(),
        }
    }
}

impl PlacementConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read a config from the asset directory.
    pub async fn load(file_name: &str) -> anyhow::Result<Self> {
        let json = load_string(file_name).await?;
        Self::from_json(&json)
    }

    /// World positions of all placements, with the height offset applied.
    pub fn positions(&self) -> impl Iterator<Item = cgmath::Vector3<f32>> + '_ {
        self.coordinates.iter().map(|&c| {
            let mut position: cgmath::Vector3<f32> = c.into();
            position.z += self.height_offset;
            position
        })
    }
}
