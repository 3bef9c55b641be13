//! Tile map data types.
//!
//! Serializable description of a tile map as produced by the content
//! pipeline: a tile size and a list of named layers, each listing the
//! occupied tile cells. The engine only reads this data to build
//! [`TileCollision`](crate::components::tilecollision::TileCollision)
//! surfaces; drawing tiles is the renderer's business.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Single tile placement within a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct TilePosition {
    /// X coordinate in tiles.
    pub x: u32,
    /// Y coordinate in tiles.
    pub y: u32,
    /// Tile identifier (tileset-local).
    pub id: u32,
}

/// A named tile layer containing positions.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TileLayer {
    pub name: String,
    pub positions: Vec<TilePosition>,
}

/// Tilemap metadata and layers.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Tilemap {
    /// Size of a tile in pixels.
    pub tile_size: u32,
    /// Map width in tiles.
    pub map_width: u32,
    /// Map height in tiles.
    pub map_height: u32,
    pub layers: Vec<TileLayer>,
}

impl Tilemap {
    /// Parse a tile map from its JSON form.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::Config(format!("tile map: {e}")))
    }

    pub fn layer(&self, name: &str) -> Option<&TileLayer> {
        self.layers.iter().find(|l| l.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_json_and_finds_layer() {
        let map = Tilemap::from_json(
            r#"{"tile_size":16,"map_width":4,"map_height":4,
                "layers":[{"name":"walls","positions":[{"x":1,"y":2,"id":7}]}]}"#,
        )
        .unwrap();
        let walls = map.layer("walls").unwrap();
        assert_eq!(walls.positions[0], TilePosition { x: 1, y: 2, id: 7 });
        assert!(map.layer("floor").is_none());
    }

    #[test]
    fn malformed_json_is_config_error() {
        assert!(matches!(
            Tilemap::from_json("{"),
            Err(EngineError::Config(_))
        ));
    }
}
