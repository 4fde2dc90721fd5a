pub mod node;
pub mod rect;
pub mod stack;
pub mod tree;

use glam::{Vec2, vec2};

pub use node::{Container, Scroll, State};
pub use rect::Rect;
pub use stack::Axis;
pub use tree::{ContainerId, Tree};

use crate::style::{LayoutType, Size};

/// Assigns `bounds` to `id` and recursively resolves every descendant.
///
/// Sizes are always derived from the wanted bounds, never from a previous
/// pass, so calling this repeatedly with the same input is a no-op.
pub fn layout(tree: &mut Tree, id: ContainerId, bounds: Rect) {
    let hook = tree
        .get_mut(id)
        .and_then(|c| c.callbacks.before_layout.take());
    if let Some(mut hook) = hook {
        hook(tree, id, bounds);
        if let Some(c) = tree.get_mut(id) {
            if c.callbacks.before_layout.is_none() {
                c.callbacks.before_layout = Some(hook);
            }
        }
    }

    let Some(node) = tree.get_mut(id) else {
        return;
    };
    node.real = bounds;
    let content = bounds.inset(node.padding);
    let kind = node.layout;

    match kind {
        LayoutType::Vertical => stack::compute(tree, id, content, Axis::Vertical),
        LayoutType::Horizontal => stack::compute(tree, id, content, Axis::Horizontal),
        LayoutType::ScrollPane => scroll_pane(tree, id, content),
        LayoutType::Free => free(tree, id, content),
    }
}

fn existing_children(tree: &Tree, id: ContainerId) -> Vec<ContainerId> {
    tree.children(id)
        .iter()
        .copied()
        .filter(|k| tree.get(*k).is_some_and(|c| c.exists))
        .collect()
}

/// Extent `id` asks for along `axis` when it isn't filling.
pub fn natural(tree: &Tree, id: ContainerId, axis: Axis) -> f32 {
    let Some(c) = tree.get(id) else {
        return 0.0;
    };
    match axis.wanted(c.wanted.w, c.wanted.h) {
        Size::Fixed(px) => px.max(0.0),
        Size::Fill => 0.0,
        Size::Content => content_extent(tree, id, axis),
    }
}

fn content_extent(tree: &Tree, id: ContainerId, axis: Axis) -> f32 {
    let c = &tree[id];
    let pad = match axis {
        Axis::Horizontal => c.padding.horizontal(),
        Axis::Vertical => c.padding.vertical(),
    };
    let kids = existing_children(tree, id);
    let stacked = matches!(
        (c.layout, axis),
        (LayoutType::Vertical | LayoutType::ScrollPane, Axis::Vertical)
            | (LayoutType::Horizontal, Axis::Horizontal)
    );

    let inner = if stacked {
        let gaps = c.spacing * kids.len().saturating_sub(1) as f32;
        kids.iter().map(|k| natural(tree, *k, axis)).sum::<f32>() + gaps
    } else if c.layout == LayoutType::Free {
        kids.iter()
            .map(|k| {
                let w = &tree[*k].wanted;
                axis.main(vec2(w.x, w.y)) + natural(tree, *k, axis)
            })
            .fold(0.0, f32::max)
    } else {
        kids.iter()
            .map(|k| natural(tree, *k, axis))
            .fold(0.0, f32::max)
    };
    inner + pad
}

fn free(tree: &mut Tree, id: ContainerId, content: Rect) {
    for k in existing_children(tree, id) {
        let Some(wanted) = tree.get(k).map(|c| c.wanted) else {
            continue;
        };
        let w = match wanted.w {
            Size::Fill => content.size.x,
            _ => natural(tree, k, Axis::Horizontal),
        };
        let h = match wanted.h {
            Size::Fill => content.size.y,
            _ => natural(tree, k, Axis::Vertical),
        };
        let origin = content.origin + vec2(wanted.x, wanted.y);
        layout(tree, k, Rect::new(origin, vec2(w, h)));
    }
}

/// Size of everything inside a scroll pane, at least as big as its viewport.
pub fn scroll_content_size(tree: &Tree, id: ContainerId, viewport: Vec2) -> Vec2 {
    let Some(c) = tree.get(id) else {
        return viewport;
    };
    let kids = existing_children(tree, id);
    let gaps = c.spacing * kids.len().saturating_sub(1) as f32;
    let height = kids
        .iter()
        .map(|k| natural(tree, *k, Axis::Vertical))
        .sum::<f32>()
        + gaps;
    let width = kids
        .iter()
        .map(|k| natural(tree, *k, Axis::Horizontal))
        .fold(0.0, f32::max);
    vec2(width.max(viewport.x), height.max(viewport.y))
}

/// How far a scroll pane can scroll on each axis.
pub fn scroll_limits(tree: &Tree, id: ContainerId) -> Vec2 {
    let Some(c) = tree.get(id) else {
        return Vec2::ZERO;
    };
    let viewport = c.real.inset(c.padding).size;
    (scroll_content_size(tree, id, viewport) - viewport).max(Vec2::ZERO)
}

fn scroll_pane(tree: &mut Tree, id: ContainerId, viewport: Rect) {
    let offset = tree[id]
        .scroll
        .as_ref()
        .map_or(Vec2::ZERO, |s| s.visual());
    let size = scroll_content_size(tree, id, viewport.size);
    let content = Rect::new(viewport.origin, size).translate(-offset);
    stack::compute(tree, id, content, Axis::Vertical);
}
