//! Static tile obstacles.
//!
//! A [`TileCollision`] holds a read-only array of rectangles in the owning
//! entity's local space, one per occupied tile. Physics scales and places them
//! by the entity's [`Transform`] each time it tests against them. They are
//! always solid and are never tracked as entities of their own.

use std::sync::Arc;

use bevy_ecs::prelude::Component;
use glam::Vec2;
use log::debug;

use super::transform::Transform;
use super::{ComponentKind, EngineComponent};
use crate::aabb::Aabb2;
use crate::resources::tilemap::Tilemap;

#[derive(Component, Clone, Debug)]
pub struct TileCollision {
    /// Local-space rectangles, shared between entities built from the same map.
    pub rects: Arc<[Aabb2]>,
}

impl TileCollision {
    pub fn new(rects: impl Into<Arc<[Aabb2]>>) -> Self {
        Self { rects: rects.into() }
    }

    /// Build the rectangle array from one layer of a tile map.
    /// An unknown layer yields an empty surface.
    pub fn from_tilemap(map: &Tilemap, layer: &str) -> Self {
        let size = map.tile_size as f32;
        let rects: Vec<Aabb2> = map
            .layer(layer)
            .map(|l| {
                l.positions
                    .iter()
                    .map(|p| {
                        Aabb2::from_origin_size(
                            Vec2::new(p.x as f32 * size, p.y as f32 * size),
                            Vec2::splat(size),
                        )
                    })
                    .collect()
            })
            .unwrap_or_default();
        debug!(
            "built tile collision surface from layer '{}' with {} rects",
            layer,
            rects.len()
        );
        Self::new(rects)
    }

    /// World-space rectangles for an entity at `transform`.
    pub fn world_rects<'a>(&'a self, transform: &'a Transform) -> impl Iterator<Item = Aabb2> + 'a {
        self.rects.iter().map(move |r| {
            Aabb2::new(
                transform.position + r.min * transform.scale,
                transform.position + r.max * transform.scale,
            )
        })
    }

    pub fn len(&self) -> usize {
        self.rects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rects.is_empty()
    }
}

impl EngineComponent for TileCollision {
    const KIND: ComponentKind = ComponentKind::TileCollision;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::tilemap::{TileLayer, TilePosition};

    fn map() -> Tilemap {
        Tilemap {
            tile_size: 16,
            map_width: 8,
            map_height: 8,
            layers: vec![TileLayer {
                name: "walls".into(),
                positions: vec![
                    TilePosition { x: 0, y: 0, id: 1 },
                    TilePosition { x: 3, y: 1, id: 1 },
                ],
            }],
        }
    }

    #[test]
    fn from_tilemap_builds_one_rect_per_tile() {
        let tiles = TileCollision::from_tilemap(&map(), "walls");
        assert_eq!(tiles.len(), 2);
        assert_eq!(tiles.rects[1].min, Vec2::new(48.0, 16.0));
        assert_eq!(tiles.rects[1].max, Vec2::new(64.0, 32.0));
        assert!(TileCollision::from_tilemap(&map(), "missing").is_empty());
    }

    #[test]
    fn world_rects_follow_scale_and_position() {
        let tiles = TileCollision::from_tilemap(&map(), "walls");
        let t = Transform::at(Vec2::new(100.0, 0.0)).with_scale(Vec2::splat(2.0));
        let rects: Vec<Aabb2> = tiles.world_rects(&t).collect();
        assert_eq!(rects[0].min, Vec2::new(100.0, 0.0));
        assert_eq!(rects[0].max, Vec2::new(132.0, 32.0));
    }
}
