use glam::{Vec2, vec2};

use super::{Rect, layout, natural, tree::{ContainerId, Tree}};
use crate::style::{Align, Justify, Size};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Axis {
    Horizontal,
    Vertical,
}

impl Axis {
    pub fn flip(self) -> Self {
        match self {
            Axis::Horizontal => Axis::Vertical,
            Axis::Vertical => Axis::Horizontal,
        }
    }

    pub fn main(self, v: Vec2) -> f32 {
        match self {
            Axis::Horizontal => v.x,
            Axis::Vertical => v.y,
        }
    }

    pub fn cross(self, v: Vec2) -> f32 {
        self.flip().main(v)
    }

    /// Builds a vector from main/cross components.
    pub fn pack(self, main: f32, cross: f32) -> Vec2 {
        match self {
            Axis::Horizontal => vec2(main, cross),
            Axis::Vertical => vec2(cross, main),
        }
    }

    pub fn wanted(self, w: Size, h: Size) -> Size {
        match self {
            Axis::Horizontal => w,
            Axis::Vertical => h,
        }
    }
}

/// Lays the existing children of `id` out one after another along `axis`
/// inside `content`. Fill children split the space the others leave.
pub fn compute(tree: &mut Tree, id: ContainerId, content: Rect, axis: Axis) {
    let Some(node) = tree.get(id) else {
        return;
    };
    let (spacing, align, justify) = (node.spacing, node.align, node.justify);
    let kids: Vec<ContainerId> = node
        .children
        .iter()
        .copied()
        .filter(|k| tree.get(*k).is_some_and(|c| c.exists))
        .collect();
    if kids.is_empty() {
        return;
    }

    let extent = axis.main(content.size);
    let cross_extent = axis.cross(content.size);

    let mut reserved = spacing * (kids.len() - 1) as f32;
    let mut fills = 0usize;
    let mut mains = Vec::with_capacity(kids.len());
    for k in &kids {
        let Some(c) = tree.get(*k) else {
            mains.push(Some(0.0));
            continue;
        };
        match axis.wanted(c.wanted.w, c.wanted.h) {
            Size::Fill => {
                fills += 1;
                mains.push(None);
            }
            _ => {
                let v = natural(tree, *k, axis);
                reserved += v;
                mains.push(Some(v));
            }
        }
    }

    let free = (extent - reserved).max(0.0);
    let fill = if fills > 0 { free / fills as f32 } else { 0.0 };
    let mut cursor = if fills > 0 {
        0.0
    } else {
        match justify {
            Justify::Start => 0.0,
            Justify::Center => free / 2.0,
            Justify::End => free,
        }
    };

    for (k, main) in kids.into_iter().zip(mains) {
        let main = main.unwrap_or(fill);
        // an earlier sibling's layout hook may have removed it
        let Some(c) = tree.get(k) else {
            continue;
        };
        let cross = match axis.flip().wanted(c.wanted.w, c.wanted.h) {
            Size::Fill => cross_extent,
            _ => natural(tree, k, axis.flip()),
        };
        let cross_offset = match align {
            Align::Start => 0.0,
            Align::Center => (cross_extent - cross).max(0.0) / 2.0,
            Align::End => (cross_extent - cross).max(0.0),
        };

        let origin = content.origin + axis.pack(cursor, cross_offset);
        layout(tree, k, Rect::new(origin, axis.pack(main, cross)));
        cursor += main + spacing;
    }
}
