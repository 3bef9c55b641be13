//! Axis-aligned bounding boxes.
//!
//! [`Aabb2`] is the single rectangle type used by collision detection, tile
//! surfaces and touch areas. Boxes are always normalized so `min <= max`
//! component-wise, which keeps negative sizes (mirrored sprites) well behaved.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// 2D axis-aligned bounding box in world space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Aabb2 {
    pub min: Vec2,
    pub max: Vec2,
}

impl Aabb2 {
    /// Creates an AABB from two corner points, normalizing the order.
    pub fn new(a: Vec2, b: Vec2) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Creates an AABB from a top-left corner and a size.
    pub fn from_origin_size(origin: Vec2, size: Vec2) -> Self {
        Self::new(origin, origin + size)
    }

    /// Creates an AABB centred on `center`.
    pub fn from_center_size(center: Vec2, size: Vec2) -> Self {
        let half = size.abs() * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// Inclusive point containment.
    pub fn contains_point(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Strict overlap test. Boxes that only share an edge do not intersect.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x < other.max.x
            && self.max.x > other.min.x
            && self.min.y < other.max.y
            && self.max.y > other.min.y
    }

    /// The overlapping region, if any.
    pub fn intersection(&self, other: &Self) -> Option<Self> {
        if !self.intersects(other) {
            return None;
        }
        Some(Self {
            min: self.min.max(other.min),
            max: self.max.min(other.max),
        })
    }

    /// Returns this box moved by `delta`.
    pub fn translated(&self, delta: Vec2) -> Self {
        Self {
            min: self.min + delta,
            max: self.max + delta,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_corners() {
        let b = Aabb2::new(Vec2::new(10.0, 5.0), Vec2::new(0.0, 20.0));
        assert_eq!(b.min, Vec2::new(0.0, 5.0));
        assert_eq!(b.max, Vec2::new(10.0, 20.0));
    }

    #[test]
    fn touching_edges_do_not_intersect() {
        let a = Aabb2::from_origin_size(Vec2::ZERO, Vec2::splat(10.0));
        let b = Aabb2::from_origin_size(Vec2::new(10.0, 0.0), Vec2::splat(10.0));
        assert!(!a.intersects(&b));
        assert!(a.intersection(&b).is_none());
    }

    #[test]
    fn intersection_region() {
        let a = Aabb2::from_origin_size(Vec2::new(50.0, 0.0), Vec2::splat(32.0));
        let b = Aabb2::from_origin_size(Vec2::new(40.0, 0.0), Vec2::splat(32.0));
        let i = a.intersection(&b).unwrap();
        assert_eq!(i.width(), 22.0);
        assert_eq!(i.height(), 32.0);
    }

    #[test]
    fn center_size_roundtrip() {
        let b = Aabb2::from_center_size(Vec2::new(5.0, 5.0), Vec2::new(4.0, 2.0));
        assert_eq!(b.center(), Vec2::new(5.0, 5.0));
        assert_eq!(b.size(), Vec2::new(4.0, 2.0));
        assert!(b.contains_point(Vec2::new(3.0, 4.0)));
        assert!(!b.contains_point(Vec2::new(2.0, 4.0)));
    }
}
