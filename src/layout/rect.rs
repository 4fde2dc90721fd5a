use glam::{Vec2, vec2};

use crate::style::Padding;

#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    pub const ZERO: Self = Self {
        origin: Vec2::ZERO,
        size: Vec2::ZERO,
    };

    pub fn new(origin: Vec2, size: Vec2) -> Self {
        Self { origin, size }
    }

    pub fn from_xywh(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self::new(vec2(x, y), vec2(w, h))
    }

    pub fn max(&self) -> Vec2 {
        self.origin + self.size
    }

    /// Inclusive on every edge, so a pointer on the last pixel column still hits.
    pub fn contains(&self, p: Vec2) -> bool {
        let min = self.origin;
        let max = self.max();
        p.x >= min.x && p.x <= max.x && p.y >= min.y && p.y <= max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        let (a_min, a_max) = (self.origin, self.max());
        let (b_min, b_max) = (other.origin, other.max());
        a_min.x < b_max.x && a_max.x > b_min.x && a_min.y < b_max.y && a_max.y > b_min.y
    }

    pub fn intersection(&self, other: &Rect) -> Rect {
        let min = self.origin.max(other.origin);
        let max = self.max().min(other.max());
        Rect::new(min, (max - min).max(Vec2::ZERO))
    }

    pub fn inset(&self, pad: Padding) -> Rect {
        let origin = self.origin + vec2(pad.left, pad.top);
        let size = self.size - vec2(pad.left + pad.right, pad.top + pad.bottom);
        Rect::new(origin, size.max(Vec2::ZERO))
    }

    pub fn translate(&self, by: Vec2) -> Rect {
        Rect::new(self.origin + by, self.size)
    }

    pub fn is_empty(&self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }
}
