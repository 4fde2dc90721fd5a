use std::time::Duration;

use glam::{Vec2, Vec4, vec2};

use crate::{
    animation::{Tween, easing},
    layout::{self, Container, ContainerId, Rect, Tree},
    renderer::{Primative, RenderPrimative},
    style::{LayoutType, Obstruction, Size},
    task::CancelToken,
    windowing::{Button, Ctx},
};

/// A vertically scrolling pane with a scrollbar next to it.
///
/// The wheel and the bar both move the pane's real offset right away and
/// animate the visual offset behind it. Holding the bar's track pages
/// repeatedly until the button comes back up.
#[derive(Debug, Clone)]
pub struct ScrollPane {
    pub step: f32,
    pub duration: Duration,
    pub bar_width: f32,
    pub repeat_delay: Duration,
    pub repeat_interval: Duration,
    pub track: Vec4,
    pub thumb: Vec4,
}

impl Default for ScrollPane {
    fn default() -> Self {
        Self {
            step: 40.0,
            duration: Duration::from_millis(120),
            bar_width: 8.0,
            repeat_delay: Duration::from_millis(350),
            repeat_interval: Duration::from_millis(60),
            track: Vec4::new(1.0, 1.0, 1.0, 0.08),
            thumb: Vec4::new(1.0, 1.0, 1.0, 0.45),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ScrollPaneIds {
    pub frame: ContainerId,
    /// Add rows here.
    pub pane: ContainerId,
    pub bar: ContainerId,
}

/// Track plus the thumb, if there is anything to scroll.
struct Scrollbar {
    track: Rect,
    thumb: Option<Rect>,
    colors: (Vec4, Vec4),
}

impl Primative for Scrollbar {
    fn to_primatives(&self) -> Vec<RenderPrimative> {
        let (track, thumb) = self.colors;
        let mut out = vec![RenderPrimative::rectangle(self.track.origin, self.track.size, track)];
        if let Some(t) = self.thumb {
            out.push(RenderPrimative::rounded(t.origin, t.size, thumb, t.size.x / 2.0));
        }
        out
    }
}

struct Bar {
    grab: f32,
    repeat: Option<CancelToken>,
}

impl ScrollPane {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: f32) -> Self {
        self.step = step;
        self
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_bar_width(mut self, width: f32) -> Self {
        self.bar_width = width;
        self
    }

    pub fn build(self, tree: &mut Tree, parent: ContainerId) -> Option<ScrollPaneIds> {
        let frame = tree.add(
            parent,
            Container::new()
                .named("scroll-frame")
                .layout(LayoutType::Horizontal),
        )?;

        let step = self.step;
        let duration = self.duration;
        let pane = tree.add(
            frame,
            Container::new()
                .named("scroll-pane")
                .layout(LayoutType::ScrollPane)
                .clip()
                .obstruction(Obstruction::Full)
                .on_scroll(move |ctx, me, delta| {
                    let by = vec2(-delta.x, -delta.y) * step;
                    if scroll_by(ctx, me, by, duration) {
                        ctx.request_repaint();
                    }
                }),
        )?;

        let bar = tree.add(frame, self.bar(pane))?;
        Some(ScrollPaneIds { frame, pane, bar })
    }

    fn bar(&self, pane: ContainerId) -> Container {
        let (track, thumb) = (self.track, self.thumb);
        let (duration, delay, interval) = (self.duration, self.repeat_delay, self.repeat_interval);

        Container::new()
            .named("scroll-bar")
            .size(self.bar_width, Size::Fill)
            .user_data(Bar {
                grab: 0.0,
                repeat: None,
            })
            .on_paint(move |ctx, me| {
                let Some(bounds) = ctx.container(me).map(|c| c.real) else {
                    return;
                };
                let bar = Scrollbar {
                    track: bounds,
                    thumb: thumb_rect(ctx.tree, pane, bounds),
                    colors: (track, thumb),
                };
                ctx.canvas.draw(&bar);
            })
            .on_mouse_down(move |ctx, me, button| {
                if button != Button::Left {
                    return;
                }
                let Some(bounds) = ctx.container(me).map(|c| c.real) else {
                    return;
                };
                let Some(t) = thumb_rect(ctx.tree, pane, bounds) else {
                    return;
                };
                let y = ctx.mouse().y;
                if t.contains(ctx.mouse()) {
                    if let Some(bar) = ctx.container_mut(me).and_then(|c| c.data_mut::<Bar>()) {
                        bar.grab = y - t.origin.y;
                    }
                    return;
                }

                let direction = if y < t.origin.y { -1.0 } else { 1.0 };
                page(ctx, pane, direction, duration);
                let repeat = ctx.spawn(move |task| {
                    if !task.sleep(delay) {
                        return;
                    }
                    loop {
                        {
                            let Some(mut state) = task.lock() else {
                                return;
                            };
                            let moved = state
                                .with_ctx(task.client(), |ctx| page(ctx, pane, direction, duration));
                            if moved != Some(true) {
                                return;
                            }
                        }
                        if !task.sleep(interval) {
                            return;
                        }
                    }
                });
                if let Some(bar) = ctx.container_mut(me).and_then(|c| c.data_mut::<Bar>()) {
                    bar.repeat = repeat;
                }
            })
            .on_mouse_up(move |ctx, me, _| {
                if let Some(bar) = ctx.container_mut(me).and_then(|c| c.data_mut::<Bar>()) {
                    if let Some(repeat) = bar.repeat.take() {
                        repeat.cancel();
                    }
                }
            })
            .on_drag(move |ctx, me| {
                let Some(c) = ctx.container(me) else {
                    return;
                };
                let (bounds, grab) = (c.real, c.data::<Bar>().map_or(0.0, |b| b.grab));
                if c.data::<Bar>().is_some_and(|b| b.repeat.is_some()) {
                    return;
                }
                let Some(t) = thumb_rect(ctx.tree, pane, bounds) else {
                    return;
                };
                let room = bounds.size.y - t.size.y;
                if room <= 0.0 {
                    return;
                }
                let limits = layout::scroll_limits(ctx.tree, pane);
                let fraction = ((ctx.mouse().y - grab - bounds.origin.y) / room).clamp(0.0, 1.0);
                let Some(real) = ctx.tree.get(pane).and_then(|p| p.scroll.as_ref()).map(|s| s.real)
                else {
                    return;
                };
                scroll_by(ctx, pane, vec2(0.0, fraction * limits.y - real.y), Duration::ZERO);
            })
    }
}

/// Moves `pane`'s target offset by `delta`, clamped to what it can scroll,
/// and animates the visible offset there. Returns whether anything moved.
pub fn scroll_by(ctx: &mut Ctx<'_>, pane: ContainerId, delta: Vec2, length: Duration) -> bool {
    let limits = layout::scroll_limits(ctx.tree, pane);
    let Some(scroll) = ctx.tree.get_mut(pane).and_then(|c| c.scroll.as_mut()) else {
        return false;
    };
    let target = (scroll.real + delta).clamp(Vec2::ZERO, limits);
    if target == scroll.real {
        return false;
    }
    let moved = target - scroll.real;
    scroll.real = target;
    let (x, y) = (scroll.visual_x.clone(), scroll.visual_y.clone());

    if moved.x != 0.0 {
        ctx.animate(
            Tween::new(&x, target.x as f64, length)
                .easing(easing::ease_out_cubic)
                .relayout(),
        );
    }
    if moved.y != 0.0 {
        ctx.animate(
            Tween::new(&y, target.y as f64, length)
                .easing(easing::ease_out_cubic)
                .relayout(),
        );
    }
    true
}

fn page(ctx: &mut Ctx<'_>, pane: ContainerId, direction: f32, length: Duration) -> bool {
    let Some(viewport) = ctx.container(pane).map(|c| c.real.size.y) else {
        return false;
    };
    scroll_by(ctx, pane, vec2(0.0, direction * viewport * 0.9), length)
}

/// Where the thumb sits inside `track`, or `None` if there's nothing to scroll.
pub fn thumb_rect(tree: &Tree, pane: ContainerId, track: Rect) -> Option<Rect> {
    let node = tree.get(pane)?;
    let viewport = node.real.size.y;
    let limit = layout::scroll_limits(tree, pane).y;
    if limit <= 0.0 || viewport <= 0.0 {
        return None;
    }
    let offset = node.scroll.as_ref()?.visual().y.clamp(0.0, limit);
    let content = viewport + limit;
    let height = (track.size.y * viewport / content).max(track.size.x.min(track.size.y));
    let y = track.origin.y + (track.size.y - height) * offset / limit;
    Some(Rect::new(vec2(track.origin.x, y), vec2(track.size.x, height)))
}
