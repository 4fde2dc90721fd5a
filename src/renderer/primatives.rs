use glam::{Vec2, Vec4};

use crate::layout::Rect;

#[derive(Debug, Clone, PartialEq)]
pub enum RenderPrimative {
    Rectangle {
        position: Vec2,
        size: Vec2,
        color: Vec4,
        radius: f32,
    },
    Outline {
        position: Vec2,
        size: Vec2,
        color: Vec4,
        width: f32,
    },
    Line {
        start: Vec2,
        end: Vec2,
        color: Vec4,
        width: f32,
    },
    Circle {
        center: Vec2,
        radius: f32,
        color: Vec4,
    },
}

// Anything that knows how to describe itself as primatives
pub trait Primative {
    fn to_primatives(&self) -> Vec<RenderPrimative>;
}

impl Primative for RenderPrimative {
    fn to_primatives(&self) -> Vec<RenderPrimative> {
        vec![self.clone()]
    }
}

impl RenderPrimative {
    pub fn rectangle(position: Vec2, size: Vec2, color: Vec4) -> Self {
        Self::Rectangle {
            position,
            size,
            color,
            radius: 0.0,
        }
    }

    pub fn rounded(position: Vec2, size: Vec2, color: Vec4, radius: f32) -> Self {
        Self::Rectangle {
            position,
            size,
            color,
            radius,
        }
    }

    pub fn outline(position: Vec2, size: Vec2, color: Vec4, width: f32) -> Self {
        Self::Outline {
            position,
            size,
            color,
            width,
        }
    }

    pub fn line(start: Vec2, end: Vec2, color: Vec4, width: f32) -> Self {
        Self::Line {
            start,
            end,
            color,
            width,
        }
    }

    pub fn circle(center: Vec2, radius: f32, color: Vec4) -> Self {
        Self::Circle {
            center,
            radius,
            color,
        }
    }

    pub fn bounding_box(&self) -> Rect {
        match self {
            Self::Rectangle { position, size, .. } => Rect::new(*position, *size),
            Self::Outline {
                position,
                size,
                width,
                ..
            } => {
                let half = Vec2::splat(*width * 0.5);
                Rect::new(*position - half, *size + half * 2.0)
            }
            Self::Line {
                start, end, width, ..
            } => {
                let min = start.min(*end) - Vec2::splat(*width * 0.5);
                let max = start.max(*end) + Vec2::splat(*width * 0.5);
                Rect::new(min, max - min)
            }
            Self::Circle { center, radius, .. } => {
                let offset = Vec2::splat(*radius);
                Rect::new(*center - offset, offset * 2.0)
            }
        }
    }
}
