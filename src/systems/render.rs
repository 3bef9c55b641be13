//! Read-only render views.
//!
//! The engine does not draw. After a frame it collects, per visible sprite
//! entity, a [`RenderView`] with everything a backend needs, sorts the views
//! by depth and hands them to a [`SpriteRenderer`]. The renderer must treat
//! the views as read-only.
//!
//! An optional camera rectangle culls sprites whose bounds fall entirely
//! outside the view.

use glam::Vec2;

use crate::aabb::Aabb2;
use crate::components::sprite::{Sprite, TextureRegion};
use crate::components::transform::Transform;
use crate::world::{EntityId, World};

/// What the renderer gets to see of one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderView {
    pub entity: EntityId,
    pub position: Vec2,
    pub rotation: f32,
    pub scale: Vec2,
    pub tex_key: String,
    pub region: TextureRegion,
    pub origin: Vec2,
    pub flip_h: bool,
    pub flip_v: bool,
    pub depth: i32,
}

impl RenderView {
    /// World-space bounds of the drawn region.
    pub fn bounds(&self) -> Aabb2 {
        let min = self.position - self.origin * self.scale;
        let size = Vec2::new(self.region.width, self.region.height) * self.scale;
        Aabb2::from_origin_size(min, size)
    }
}

/// Implemented by the external drawing backend.
pub trait SpriteRenderer {
    fn begin_frame(&mut self) {}
    fn draw(&mut self, view: &RenderView);
    fn end_frame(&mut self) {}
}

/// Views of every visible sprite, sorted by `(depth, entity)`.
/// With `camera`, sprites whose bounds miss it are skipped.
pub fn collect_render_views(world: &mut World, camera: Option<&Aabb2>) -> Vec<RenderView> {
    let mut views: Vec<RenderView> = world
        .query::<(Transform, Sprite)>()
        .into_iter()
        .filter_map(|id| {
            let transform = world.get_component::<Transform>(id).ok()?;
            let sprite = world.get_component::<Sprite>(id).ok()?;
            if !sprite.visible {
                return None;
            }
            Some(RenderView {
                entity: id,
                position: transform.position,
                rotation: transform.rotation,
                scale: transform.scale,
                tex_key: sprite.tex_key.clone(),
                region: sprite.region,
                origin: sprite.origin,
                flip_h: sprite.flip_h,
                flip_v: sprite.flip_v,
                depth: sprite.depth,
            })
        })
        .filter(|view| camera.is_none_or(|cam| view.bounds().intersects(cam)))
        .collect();
    views.sort_by_key(|v| (v.depth, v.entity));
    views
}

/// Collect views and feed them to `renderer` in draw order.
pub fn render_world(world: &mut World, renderer: &mut impl SpriteRenderer, camera: Option<&Aabb2>) -> usize {
    let views = collect_render_views(world, camera);
    renderer.begin_frame();
    for view in &views {
        renderer.draw(view);
    }
    renderer.end_frame();
    views.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        drawn: Vec<EntityId>,
        frames: u32,
    }

    impl SpriteRenderer for Recorder {
        fn begin_frame(&mut self) {
            self.frames += 1;
        }
        fn draw(&mut self, view: &RenderView) {
            self.drawn.push(view.entity);
        }
    }

    fn spawn(world: &mut World, at: Vec2, depth: i32) -> EntityId {
        let e = world.create_entity();
        world.add_component(e, Transform::at(at)).unwrap();
        world
            .add_component(
                e,
                Sprite::new("atlas", TextureRegion::new(0.0, 0.0, 16.0, 16.0)).with_depth(depth),
            )
            .unwrap();
        e
    }

    #[test]
    fn views_sorted_by_depth_then_id() {
        let mut world = World::new();
        let top = spawn(&mut world, Vec2::ZERO, 5);
        let bottom_a = spawn(&mut world, Vec2::ZERO, -1);
        let bottom_b = spawn(&mut world, Vec2::ZERO, -1);
        let mut r = Recorder::default();
        assert_eq!(render_world(&mut world, &mut r, None), 3);
        assert_eq!(r.drawn, vec![bottom_a, bottom_b, top]);
        assert_eq!(r.frames, 1);
    }

    #[test]
    fn invisible_and_culled_sprites_are_skipped() {
        let mut world = World::new();
        let hidden = spawn(&mut world, Vec2::ZERO, 0);
        world.get_component_mut::<Sprite>(hidden).unwrap().visible = false;
        let far = spawn(&mut world, Vec2::new(1000.0, 0.0), 0);
        let near = spawn(&mut world, Vec2::new(10.0, 10.0), 0);

        let camera = Aabb2::from_origin_size(Vec2::ZERO, Vec2::new(320.0, 180.0));
        let views = collect_render_views(&mut world, Some(&camera));
        let ids: Vec<EntityId> = views.iter().map(|v| v.entity).collect();
        assert_eq!(ids, vec![near]);
        assert!(collect_render_views(&mut world, None).iter().any(|v| v.entity == far));
    }
}
