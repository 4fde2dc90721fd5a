pub mod primatives;
pub mod surface;

use glam::{Vec2, Vec4};
use log::trace;
use tiny_skia::{
    Color, ColorU8, FillRule, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::{
    app::Services,
    layout::{ContainerId, Rect, node::fire},
    windowing::Client,
};

pub use primatives::{Primative, RenderPrimative};
pub use surface::Surfaces;

fn to_color(c: Vec4) -> Color {
    let c = c.clamp(Vec4::ZERO, Vec4::ONE);
    Color::from_rgba(c.x, c.y, c.z, c.w).unwrap_or(Color::TRANSPARENT)
}

fn solid(c: Vec4) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(to_color(c));
    paint.anti_alias = true;
    paint
}

/// Software drawing target with a stack of rectangular clips.
pub struct Canvas {
    pixmap: Pixmap,
    clips: Vec<Rect>,
    mask: Option<Mask>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            pixmap: Pixmap::new(width, height)?,
            clips: Vec::new(),
            mask: None,
        })
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.pixmap.width() as f32, self.pixmap.height() as f32)
    }

    pub fn pixmap(&self) -> &Pixmap {
        &self.pixmap
    }

    pub fn pixmap_mut(&mut self) -> &mut Pixmap {
        &mut self.pixmap
    }

    /// Un-premultiplied RGBA of one pixel.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let px = self.pixmap.pixel(x, y)?.demultiply();
        Some([px.red(), px.green(), px.blue(), px.alpha()])
    }

    /// Fully transparent, clips dropped.
    pub fn clear(&mut self) {
        self.pixmap.fill(Color::TRANSPARENT);
        self.clips.clear();
        self.mask = None;
    }

    /// Narrows drawing to `rect` intersected with the current clip.
    pub fn push_clip(&mut self, rect: Rect) {
        let rect = match self.clips.last() {
            Some(top) => top.intersection(&rect),
            None => rect,
        };
        self.clips.push(rect);
        self.rebuild_mask();
    }

    pub fn pop_clip(&mut self) {
        self.clips.pop();
        self.rebuild_mask();
    }

    pub fn clip(&self) -> Option<Rect> {
        self.clips.last().copied()
    }

    fn rebuild_mask(&mut self) {
        self.mask = None;
        let Some(rect) = self.clip() else {
            return;
        };
        let Some(mut mask) = Mask::new(self.pixmap.width(), self.pixmap.height()) else {
            return;
        };
        if let Some(r) =
            tiny_skia::Rect::from_xywh(rect.origin.x, rect.origin.y, rect.size.x, rect.size.y)
        {
            mask.fill_path(
                &PathBuilder::from_rect(r),
                FillRule::Winding,
                false,
                Transform::identity(),
            );
        }
        self.mask = Some(mask);
    }

    /// Whether anything inside `bounds` could still show up.
    pub fn visible(&self, bounds: Rect) -> bool {
        let screen = Rect::new(Vec2::ZERO, self.size());
        let area = self.clip().map_or(screen, |c| c.intersection(&screen));
        !area.is_empty() && area.intersects(&bounds)
    }

    pub fn draw(&mut self, prim: &impl Primative) {
        for p in prim.to_primatives() {
            self.draw_primative(&p);
        }
    }

    fn draw_primative(&mut self, prim: &RenderPrimative) {
        if !self.visible(prim.bounding_box()) {
            return;
        }
        let mask = self.mask.as_ref();
        match prim {
            RenderPrimative::Rectangle {
                position,
                size,
                color,
                radius,
            } => {
                let path = if *radius > 0.0 {
                    rounded_rect(*position, *size, *radius)
                } else {
                    tiny_skia::Rect::from_xywh(position.x, position.y, size.x, size.y)
                        .map(PathBuilder::from_rect)
                };
                if let Some(path) = path {
                    self.pixmap.fill_path(
                        &path,
                        &solid(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        mask,
                    );
                }
            }
            RenderPrimative::Outline {
                position,
                size,
                color,
                width,
            } => {
                if let Some(r) = tiny_skia::Rect::from_xywh(position.x, position.y, size.x, size.y)
                {
                    let stroke = Stroke {
                        width: *width,
                        ..Stroke::default()
                    };
                    self.pixmap.stroke_path(
                        &PathBuilder::from_rect(r),
                        &solid(*color),
                        &stroke,
                        Transform::identity(),
                        mask,
                    );
                }
            }
            RenderPrimative::Line {
                start,
                end,
                color,
                width,
            } => {
                let mut pb = PathBuilder::new();
                pb.move_to(start.x, start.y);
                pb.line_to(end.x, end.y);
                if let Some(path) = pb.finish() {
                    let stroke = Stroke {
                        width: *width,
                        ..Stroke::default()
                    };
                    self.pixmap.stroke_path(
                        &path,
                        &solid(*color),
                        &stroke,
                        Transform::identity(),
                        mask,
                    );
                }
            }
            RenderPrimative::Circle {
                center,
                radius,
                color,
            } => {
                if let Some(path) = PathBuilder::from_circle(center.x, center.y, *radius) {
                    self.pixmap.fill_path(
                        &path,
                        &solid(*color),
                        FillRule::Winding,
                        Transform::identity(),
                        mask,
                    );
                }
            }
        }
    }

    pub fn draw_rect(&mut self, position: Vec2, size: Vec2, color: Vec4) {
        self.draw_primative(&RenderPrimative::rectangle(position, size, color));
    }

    pub fn draw_rounded_rect(&mut self, position: Vec2, size: Vec2, radius: f32, color: Vec4) {
        self.draw_primative(&RenderPrimative::rounded(position, size, color, radius));
    }

    pub fn draw_outline(&mut self, position: Vec2, size: Vec2, width: f32, color: Vec4) {
        self.draw_primative(&RenderPrimative::outline(position, size, color, width));
    }

    pub fn draw_line(&mut self, start: Vec2, end: Vec2, width: f32, color: Vec4) {
        self.draw_primative(&RenderPrimative::line(start, end, color, width));
    }

    pub fn draw_circle(&mut self, center: Vec2, radius: f32, color: Vec4) {
        self.draw_primative(&RenderPrimative::circle(center, radius, color));
    }

    /// Raw access for callers that bring their own pixels, e.g. icons.
    /// Ignores the clip.
    pub fn put_pixel(&mut self, x: u32, y: u32, rgba: [u8; 4]) {
        let width = self.pixmap.width();
        if x >= width || y >= self.pixmap.height() {
            return;
        }
        let [r, g, b, a] = rgba;
        self.pixmap.pixels_mut()[(y * width + x) as usize] =
            ColorU8::from_rgba(r, g, b, a).premultiply();
    }
}

fn rounded_rect(position: Vec2, size: Vec2, radius: f32) -> Option<tiny_skia::Path> {
    let r = radius.min(size.x / 2.0).min(size.y / 2.0).max(0.0);
    let (x, y, w, h) = (position.x, position.y, size.x, size.y);
    let mut pb = PathBuilder::new();
    pb.move_to(x + r, y);
    pb.line_to(x + w - r, y);
    pb.quad_to(x + w, y, x + w, y + r);
    pb.line_to(x + w, y + h - r);
    pb.quad_to(x + w, y + h, x + w - r, y + h);
    pb.line_to(x + r, y + h);
    pb.quad_to(x, y + h, x, y + h - r);
    pb.line_to(x, y + r);
    pb.quad_to(x, y, x + r, y);
    pb.close();
    pb.finish()
}

/// Paints the whole client into its back buffer, copies it to the front
/// buffer and hands the frame to the display.
pub(crate) fn paint(client: &mut Client, services: &mut Services<'_>) {
    client.state.needs_repaint = false;
    client.surfaces.back_mut().clear();

    let root = client.tree.root();
    paint_container(client, services, root);

    client.surfaces.blit();
    let display = &services.runtime.display;
    display.present(client.state.window, client.surfaces.front());
    display.flush();
    trace!("presented {:?}", client.id());
}

fn paint_container(client: &mut Client, services: &mut Services<'_>, id: ContainerId) {
    if !client.tree.get(id).is_some_and(|c| c.exists) {
        return;
    }
    fire!(client, services, id, paint);

    // the paint callback may have removed or hidden it
    let Some(node) = client.tree.get(id) else {
        return;
    };
    if !node.exists || !node.auto_paint_children {
        return;
    }

    let clip = node.clip_children.then_some(node.real);
    let mut order: Vec<(i32, ContainerId)> = node
        .children
        .iter()
        .filter_map(|k| client.tree.get(*k).map(|c| (c.z_index, *k)))
        .collect();
    // stable: equal z keeps insertion order
    order.sort_by_key(|(z, _)| *z);

    if let Some(rect) = clip {
        client.surfaces.back_mut().push_clip(rect);
    }
    for (_, kid) in order {
        if clip.is_some() {
            let Some(bounds) = client.tree.get(kid).map(|c| c.real) else {
                continue;
            };
            if !client.surfaces.back().visible(bounds) {
                continue;
            }
        }
        paint_container(client, services, kid);
    }
    if clip.is_some() {
        client.surfaces.back_mut().pop_clip();
    }
}
