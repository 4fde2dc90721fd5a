//! A dock along the top of the screen with a few hover-animated buttons and
//! a popup holding a scrolling list.
//!
//! `HEARTH_REFRESH_RATE` and `HEARTH_DISPLAY` override the defaults.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use hearth::{
    AnimatedValue, App, AppConfig, AppState, ClientConfig, ClientId, Container, ContainerId, Ctx,
    LayoutType, Padding, ScrollPane, Size, Tween, Vec2, Vec4, animation::easing, init_logging,
    vec2, vec4,
};
use log::{error, info};
use parking_lot::Mutex;

const HEIGHT: f32 = 36.0;
const BACKGROUND: Vec4 = Vec4::new(0.08, 0.09, 0.11, 0.92);
const IDLE: Vec4 = Vec4::new(0.18, 0.2, 0.24, 1.0);
const HOT: Vec4 = Vec4::new(0.32, 0.52, 0.86, 1.0);

struct Glow(AnimatedValue);

fn button(
    label: &'static str,
    mut on_click: impl FnMut(&mut Ctx<'_>) + Send + 'static,
) -> Container {
    Container::new()
        .named(label)
        .size(96.0, Size::Fill)
        .user_data(Glow(AnimatedValue::new(0.0)))
        .on_paint(|ctx, me| {
            let Some(c) = ctx.container(me) else {
                return;
            };
            let t = c.data::<Glow>().map_or(0.0, |g| g.0.get()) as f32;
            let pressed = c.state.pressing;
            let bounds = c.real;
            let mut color = IDLE.lerp(HOT, t);
            if pressed {
                color *= vec4(0.8, 0.8, 0.8, 1.0);
            }
            ctx.canvas
                .draw_rounded_rect(bounds.origin, bounds.size, 6.0, color);
        })
        .on_mouse_enter(|ctx, me| fade(ctx, me, 1.0))
        .on_mouse_leave(|ctx, me| fade(ctx, me, 0.0))
        .on_mouse_down(|ctx, _, _| ctx.request_repaint())
        .on_mouse_up(|ctx, _, _| ctx.request_repaint())
        .on_click(move |ctx, _| on_click(ctx))
}

fn fade(ctx: &mut Ctx<'_>, me: ContainerId, to: f64) {
    let Some(glow) = ctx
        .container(me)
        .and_then(|c| c.data::<Glow>())
        .map(|g| g.0.clone())
    else {
        return;
    };
    ctx.animate(Tween::new(&glow, to, Duration::from_millis(150)).easing(easing::ease_out_quad));
}

fn backdrop(ctx: &mut Ctx<'_>, me: ContainerId) {
    if let Some(b) = ctx.container(me).map(|c| c.real) {
        ctx.canvas.draw_rect(b.origin, b.size, BACKGROUND);
    }
}

fn build_list(state: &mut AppState, at: Vec2) -> hearth::Result<ClientId> {
    let id = state.create_client(
        ClientConfig::new()
            .with_title("hearth list")
            .with_position(at.x, at.y)
            .with_size(240.0, 320.0)
            .popup()
            .above(),
    )?;
    if let Some(client) = state.client_mut(id) {
        let root = client.root();
        let tree = &mut client.tree;
        tree[root].padding = Padding::all(6.0);
        tree[root].callbacks.paint = Some(Box::new(backdrop));
        if let Some(ids) = ScrollPane::new().build(tree, root) {
            tree[ids.frame].wanted.w = Size::Fill;
            tree[ids.frame].wanted.h = Size::Fill;
            tree[ids.pane].spacing = 4.0;
            for i in 0..40 {
                let shade = if i % 2 == 0 { 0.16 } else { 0.2 };
                tree.add(
                    ids.pane,
                    Container::new()
                        .size(Size::Fill, 28.0)
                        .on_paint(move |ctx, me| {
                            if let Some(b) = ctx.container(me).map(|c| c.real) {
                                ctx.canvas
                                    .draw_rect(b.origin, b.size, vec4(shade, shade, shade, 1.0));
                            }
                        })
                        .on_click(move |_, _| info!("row {i}")),
                );
            }
        }
    }
    state.show_client(id);
    Ok(id)
}

fn main() -> hearth::Result<()> {
    init_logging();

    let app = App::connect(AppConfig::from_env())?;
    let screen = app.screen();

    let mut state = app.lock();
    let dock = state.create_client(
        ClientConfig::new()
            .with_title("hearth panel")
            .with_position(screen.origin.x, screen.origin.y)
            .with_size(screen.size.x, HEIGHT)
            .dock()
            .sticky()
            .skip_taskbar()
            .undecorated(),
    )?;

    let client = state.client_mut(dock).context("dock vanished")?;
    let root = client.root();
    let tree = &mut client.tree;
    tree[root].layout = LayoutType::Horizontal;
    tree[root].padding = Padding::symmetric(8.0, 4.0);
    tree[root].spacing = 4.0;
    tree[root].callbacks.paint = Some(Box::new(backdrop));

    let list: Arc<Mutex<Option<ClientId>>> = Arc::default();
    tree.add(
        root,
        button("list", move |ctx| {
            let at = ctx.bounds().origin + vec2(4.0, HEIGHT + 4.0);
            let list = list.clone();
            // needs the engine lock, which this callback is running under
            ctx.spawn(move |task| {
                let Some(mut state) = task.lock() else {
                    return;
                };
                let mut open = list.lock();
                if let Some(id) = open.take() {
                    if state.client(id).is_some() {
                        state.mark_to_close(id);
                        return;
                    }
                }
                match build_list(&mut state, at) {
                    Ok(id) => *open = Some(id),
                    Err(err) => error!("cannot open list: {err:#}"),
                }
            });
        }),
    );
    tree.add(
        root,
        button("clock", |ctx| {
            ctx.add_timeout(Duration::from_secs(1), false, |_| info!("tick"));
        }),
    );
    tree.add(root, Container::new().size(Size::Fill, Size::Fill));
    tree.add(
        root,
        button("quit", |ctx| {
            if let Some(app) = ctx.app() {
                app.stop();
            }
        }),
    );

    state.show_client(dock);
    drop(state);

    app.run()
}
