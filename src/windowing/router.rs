//! Pointer and keyboard routing over a client's container tree.
//!
//! Two sets drive everything here. The *pierced* set is what lies under the
//! pointer right now, front-most first. The *concerned* set is whatever is
//! currently hovered, pressed or dragged and so is owed a follow-up event.

use glam::{Vec2, vec2};
use log::{debug, trace};

use crate::{
    app::Services,
    layout::{ContainerId, Tree, node::fire},
    style::Obstruction,
    windowing::{Button, Client, EventKind, KeyEvent},
};

/// Where the pointer is parked once it left the window.
pub const OFF_SCREEN: Vec2 = vec2(-1.0, -1.0);

pub(crate) fn route(client: &mut Client, services: &mut Services<'_>, kind: &EventKind) {
    match kind {
        EventKind::PointerMove { pos } => motion(client, services, *pos),
        EventKind::PointerDown { button, pos } => press(client, services, *button, *pos),
        EventKind::PointerUp { button, pos } => release(client, services, *button, *pos),
        EventKind::PointerEnter { pos, normal } => {
            if *normal {
                motion(client, services, *pos);
            }
        }
        EventKind::PointerLeave { normal } => {
            if *normal {
                leave(client, services);
            }
        }
        EventKind::KeyDown(key) => keys(client, services, key, true),
        EventKind::KeyUp(key) => keys(client, services, key, false),
        EventKind::Configure { bounds } => {
            let resized = bounds.size != client.state.bounds.size;
            client.state.bounds = *bounds;
            if resized {
                client.surfaces.resize(bounds.size);
                client.state.needs_relayout = true;
                client.state.needs_repaint = true;
            }
        }
        EventKind::Expose => client.state.needs_repaint = true,
        EventKind::CloseRequested => {
            debug!("{:?} asked to close", client.id());
            client.state.marked_to_close = true;
        }
        EventKind::FocusIn | EventKind::FocusOut => {
            trace!("{:?} focus changed: {kind:?}", client.id());
        }
    }
}

/// Every interactable, existing container under `pos`, front-most first.
///
/// Children come before their parent. Among siblings the one painted last
/// (highest z, later on ties) comes first. Hidden containers hide their
/// whole subtree, clipping containers the parts of it outside their bounds.
pub fn pierced(tree: &Tree, pos: Vec2) -> Vec<ContainerId> {
    let mut out = Vec::new();
    pierced_into(tree, tree.root(), pos, &mut out);
    out
}

fn pierced_into(tree: &Tree, id: ContainerId, pos: Vec2, out: &mut Vec<ContainerId>) {
    let Some(node) = tree.get(id) else {
        return;
    };
    if !node.exists {
        return;
    }
    let hit = node.interactable && node.hit(pos);
    // clipped children can't be seen, so they can't be hit either
    if node.clip_children && !node.hit(pos) {
        if hit {
            out.push(id);
        }
        return;
    }

    let mut kids: Vec<(usize, i32, ContainerId)> = node
        .children
        .iter()
        .enumerate()
        .filter_map(|(i, k)| tree.get(*k).map(|c| (i, c.z_index, *k)))
        .collect();
    kids.sort_by(|a, b| b.1.cmp(&a.1).then(b.0.cmp(&a.0)));
    for (_, _, k) in kids {
        pierced_into(tree, k, pos, out);
    }

    if hit {
        out.push(id);
    }
}

/// Containers currently flagged concerned, in post-order.
pub fn concerned(tree: &Tree) -> Vec<ContainerId> {
    tree.post_order(tree.root())
        .into_iter()
        .filter(|id| tree[*id].state.concerned)
        .collect()
}

/// Only the top-most pierced container gets events unless the others
/// explicitly let them through.
fn may_receive(tree: &Tree, pierced: &[ContainerId], index: usize) -> bool {
    if index == 0 {
        return true;
    }
    let Some(c) = tree.get(pierced[index]) else {
        return false;
    };
    match c.obstruction {
        Obstruction::Full => true,
        Obstruction::ByOne => tree.parent(pierced[0]) == Some(pierced[index]),
        Obstruction::None => false,
    }
}

pub(crate) fn motion(client: &mut Client, services: &mut Services<'_>, pos: Vec2) {
    client.state.mouse = pos;
    let pierced = pierced(&client.tree, pos);
    let concerned = concerned(&client.tree);

    for &id in &concerned {
        let Some(c) = client.tree.get(id) else {
            continue;
        };
        let (state, threshold) = (c.state, c.drag_threshold);

        if state.dragging {
            fire!(client, services, id, drag);
        } else if state.pressing {
            if pos.distance(client.state.press_origin) >= threshold {
                client.tree[id].state.dragging = true;
                fire!(client, services, id, drag_start);
            }
        } else if pierced.contains(&id) {
            fire!(client, services, id, mouse_motion);
        } else {
            client.tree[id].state.reset();
            fire!(client, services, id, mouse_leave);
        }
    }

    let held = concerned.iter().any(|id| {
        client
            .tree
            .get(*id)
            .is_some_and(|c| c.state.pressing || c.state.dragging)
    });
    if held {
        return;
    }

    for (i, &id) in pierced.iter().enumerate() {
        if !client.tree.get(id).is_some_and(|c| !c.state.concerned) {
            continue;
        }
        if !may_receive(&client.tree, &pierced, i) {
            continue;
        }
        let state = &mut client.tree[id].state;
        state.concerned = true;
        state.hovering = true;
        fire!(client, services, id, mouse_enter);
    }
}

pub(crate) fn press(client: &mut Client, services: &mut Services<'_>, button: Button, pos: Vec2) {
    client.state.mouse = pos;
    let pierced = pierced(&client.tree, pos);

    if let Some(delta) = button.scroll_delta() {
        for (i, &id) in pierced.iter().enumerate() {
            if may_receive(&client.tree, &pierced, i) {
                fire!(client, services, id, scroll, delta);
            }
        }
        // content may have moved under the pointer
        client.settle_layout();
        motion(client, services, pos);
        return;
    }
    if !button.is_standard() {
        trace!("ignoring press of {button:?}");
        return;
    }

    client.state.press_origin = pos;
    let mut pressed = Vec::new();
    for (i, &id) in pierced.iter().enumerate() {
        if !client.tree.contains(id) || !may_receive(&client.tree, &pierced, i) {
            continue;
        }
        let state = &mut client.tree[id].state;
        state.concerned = true;
        state.hovering = true;
        state.pressing = true;
        state.button = Some(button);
        fire!(client, services, id, mouse_down, button);
        pressed.push(id);
    }

    let root = client.tree.root();
    for id in client.tree.post_order(root) {
        client.tree[id].active = pressed.contains(&id);
    }
}

pub(crate) fn release(
    client: &mut Client,
    services: &mut Services<'_>,
    button: Button,
    pos: Vec2,
) {
    if !button.is_standard() {
        return;
    }
    client.state.mouse = pos;
    let pierced = pierced(&client.tree, pos);

    for id in concerned(&client.tree) {
        let Some(c) = client.tree.get(id) else {
            continue;
        };
        let (state, drag_end_is_click) = (c.state, c.drag_end_is_click);
        let inside = pierced.contains(&id);

        if !inside {
            fire!(client, services, id, mouse_leave);
        }
        if state.dragging {
            fire!(client, services, id, drag_end);
            if drag_end_is_click && inside {
                fire!(client, services, id, clicked);
            }
        } else if state.pressing && inside {
            fire!(client, services, id, clicked);
        }
        if state.pressing {
            fire!(client, services, id, mouse_up, button);
        }

        if let Some(c) = client.tree.get_mut(id) {
            c.state.reset();
            c.state.concerned = inside;
            c.state.hovering = inside;
        }
    }

    // anything the release uncovered gets its enter now
    client.settle_layout();
    motion(client, services, pos);
}

pub(crate) fn leave(client: &mut Client, services: &mut Services<'_>) {
    client.state.mouse = OFF_SCREEN;
    for id in concerned(&client.tree) {
        let Some(c) = client.tree.get_mut(id) else {
            continue;
        };
        if c.state.pressing {
            continue;
        }
        c.state.reset();
        fire!(client, services, id, mouse_leave);
    }
}

fn keys(client: &mut Client, services: &mut Services<'_>, key: &KeyEvent, pressed: bool) {
    let root = client.tree.root();
    for id in client.tree.post_order(root) {
        if pressed {
            fire!(client, services, id, key_press, key);
        } else {
            fire!(client, services, id, key_release, key);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;
    use crate::{
        App, AppConfig,
        layout::Container,
        style::{LayoutType, Size},
        windowing::{ClientConfig, ClientId, Ctx, Headless, WindowId},
    };

    type Log = Arc<Mutex<Vec<String>>>;

    fn app() -> (App, ClientId, WindowId) {
        let app = App::with_display(Headless::new(1000.0, 1000.0), AppConfig::default()).unwrap();
        let id = app
            .lock()
            .create_client(ClientConfig::new().with_size(400.0, 400.0))
            .unwrap();
        let window = app.lock().client(id).unwrap().state.window;
        (app, id, window)
    }

    fn note(log: &Log, name: &str, what: &str) -> impl Fn() + Send + 'static {
        let (log, line) = (log.clone(), format!("{name}:{what}"));
        move || log.lock().unwrap().push(line.clone())
    }

    fn logged(log: &Log, name: &str, c: Container) -> Container {
        let (enter, leave) = (note(log, name, "enter"), note(log, name, "leave"));
        let (down, up) = (note(log, name, "down"), note(log, name, "up"));
        let (click, drag_start) = (note(log, name, "click"), note(log, name, "drag_start"));
        let drag_end = note(log, name, "drag_end");
        let (scrolls, prefix) = (log.clone(), name.to_string());
        c.named(name)
            .on_mouse_enter(move |_, _| enter())
            .on_mouse_leave(move |_, _| leave())
            .on_mouse_down(move |_, _, _| down())
            .on_mouse_up(move |_, _, _| up())
            .on_click(move |_, _| click())
            .on_drag_start(move |_, _| drag_start())
            .on_drag_end(move |_, _| drag_end())
            .on_scroll(move |_, _, d| {
                scrolls.lock().unwrap().push(format!("{prefix}:scroll {}", d.y))
            })
    }

    /// Two overlapping 100x100 boxes at the origin; B is painted over A.
    fn overlapping(app: &App, id: ClientId, log: &Log, a: Obstruction) -> (ContainerId, ContainerId) {
        let mut state = app.lock();
        let client = state.client_mut(id).unwrap();
        let root = client.root();
        client.tree[root].layout = LayoutType::Free;
        let a = client
            .tree
            .add(root, logged(log, "a", Container::new().size(100.0, 100.0).obstruction(a)))
            .unwrap();
        let b = client
            .tree
            .add(root, logged(log, "b", Container::new().size(100.0, 100.0).z_index(1)))
            .unwrap();
        client.layout();
        (a, b)
    }

    fn events(log: &Log) -> Vec<String> {
        std::mem::take(&mut *log.lock().unwrap())
    }

    #[test]
    fn pierced_lists_front_most_first() {
        let mut tree = Tree::new(Container::new().layout(LayoutType::Free).size(200.0, 200.0));
        let root = tree.root();
        let back = tree.add(root, Container::new().size(100.0, 100.0)).unwrap();
        let inner = tree.add(back, Container::new().size(50.0, 50.0)).unwrap();
        let front = tree.add(root, Container::new().size(100.0, 100.0)).unwrap();
        let raised = tree
            .add(root, Container::new().size(100.0, 100.0).z_index(2))
            .unwrap();
        crate::layout::layout(&mut tree, root, crate::layout::Rect::from_xywh(0.0, 0.0, 200.0, 200.0));

        assert_eq!(
            pierced(&tree, vec2(10.0, 10.0)),
            vec![raised, front, inner, back, root]
        );
        assert_eq!(pierced(&tree, vec2(150.0, 150.0)), vec![root]);
        assert!(pierced(&tree, vec2(250.0, 10.0)).is_empty());
    }

    #[test]
    fn hidden_and_inert_containers_are_not_pierced() {
        let mut tree = Tree::new(Container::new().layout(LayoutType::Free));
        let root = tree.root();
        let hidden = tree.add(root, Container::new().size(100.0, 100.0)).unwrap();
        let under_hidden = tree.add(hidden, Container::new().size(100.0, 100.0)).unwrap();
        let inert = tree
            .add(root, Container::new().size(100.0, 100.0).interactable(false))
            .unwrap();
        crate::layout::layout(&mut tree, root, crate::layout::Rect::from_xywh(0.0, 0.0, 200.0, 200.0));
        tree[hidden].exists = false;

        let hits = pierced(&tree, vec2(5.0, 5.0));
        assert!(!hits.contains(&hidden));
        assert!(!hits.contains(&under_hidden));
        assert!(!hits.contains(&inert));
        assert_eq!(hits, vec![root]);
    }

    #[test]
    fn hit_test_callback_overrides_rectangle() {
        let mut tree = Tree::new(Container::new().layout(LayoutType::Free));
        let root = tree.root();
        let circle = tree
            .add(
                root,
                Container::new()
                    .size(100.0, 100.0)
                    .hit_test(|c, p| p.distance(c.real.origin + c.real.size / 2.0) <= 50.0),
            )
            .unwrap();
        crate::layout::layout(&mut tree, root, crate::layout::Rect::from_xywh(0.0, 0.0, 200.0, 200.0));

        assert!(pierced(&tree, vec2(50.0, 50.0)).contains(&circle));
        assert!(!pierced(&tree, vec2(2.0, 2.0)).contains(&circle));
    }

    #[test]
    fn only_the_top_most_receives_without_obstruction_bypass() {
        let (app, id, window) = app();
        let log = Log::default();
        overlapping(&app, id, &log, Obstruction::None);

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
        });
        assert_eq!(events(&log), vec!["b:down"]);

        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
        });
        assert_eq!(events(&log), vec!["b:click", "b:up"]);
    }

    #[test]
    fn full_obstruction_lets_events_through() {
        let (app, id, window) = app();
        let log = Log::default();
        let (a, b) = overlapping(&app, id, &log, Obstruction::Full);

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
        });
        assert_eq!(events(&log), vec!["b:down", "a:down"]);

        let tree = &state.client(id).unwrap().tree;
        assert!(tree[a].active && tree[b].active);
        assert!(!tree[tree.root()].active);
    }

    #[test]
    fn by_one_obstruction_only_covers_the_direct_parent() {
        let (app, id, window) = app();
        let log = Log::default();
        {
            let mut state = app.lock();
            let client = state.client_mut(id).unwrap();
            let root = client.root();
            let outer = client
                .tree
                .add(
                    root,
                    logged(&log, "outer", Container::new().obstruction(Obstruction::ByOne)),
                )
                .unwrap();
            let middle = client
                .tree
                .add(
                    outer,
                    logged(&log, "middle", Container::new().obstruction(Obstruction::ByOne)),
                )
                .unwrap();
            client
                .tree
                .add(middle, logged(&log, "leaf", Container::new().size(50.0, 50.0)))
                .unwrap();
            client.layout();
        }

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerMove { pos: vec2(10.0, 10.0) },
        });
        assert_eq!(events(&log), vec!["leaf:enter", "middle:enter"]);
    }

    #[test]
    fn drag_end_counts_as_click_when_asked() {
        let (app, id, window) = app();
        let log = Log::default();
        {
            let mut state = app.lock();
            let client = state.client_mut(id).unwrap();
            let root = client.root();
            client
                .tree
                .add(
                    root,
                    logged(
                        &log,
                        "knob",
                        Container::new()
                            .size(200.0, 200.0)
                            .drag_end_is_click()
                            .drag_threshold(4.0),
                    ),
                )
                .unwrap();
            client.layout();
        }

        let mut state = app.lock();
        let send = |state: &mut crate::app::AppState, kind| {
            state.dispatch(crate::windowing::Event { window, kind })
        };
        send(&mut state, EventKind::PointerMove { pos: vec2(10.0, 10.0) });
        send(
            &mut state,
            EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(10.0, 10.0),
            },
        );
        // below the threshold nothing happens yet
        send(&mut state, EventKind::PointerMove { pos: vec2(12.0, 10.0) });
        send(&mut state, EventKind::PointerMove { pos: vec2(40.0, 10.0) });
        send(
            &mut state,
            EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(40.0, 10.0),
            },
        );

        assert_eq!(
            events(&log),
            vec![
                "knob:enter",
                "knob:down",
                "knob:drag_start",
                "knob:drag_end",
                "knob:click",
                "knob:up"
            ]
        );
    }

    #[test]
    fn releasing_outside_fires_leave_but_no_click() {
        let (app, id, window) = app();
        let log = Log::default();
        overlapping(&app, id, &log, Obstruction::None);

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
        });
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(300.0, 300.0),
            },
        });
        assert_eq!(events(&log), vec!["b:down", "b:leave", "b:up"]);
    }

    #[test]
    fn pressing_blocks_new_enters_until_release() {
        let (app, id, window) = app();
        let log = Log::default();
        {
            let mut state = app.lock();
            let client = state.client_mut(id).unwrap();
            let root = client.root();
            client.tree[root].layout = LayoutType::Free;
            client
                .tree
                .add(root, logged(&log, "left", Container::new().size(100.0, 100.0)))
                .unwrap();
            client
                .tree
                .add(
                    root,
                    logged(&log, "right", Container::new().at(200.0, 0.0).size(100.0, 100.0)),
                )
                .unwrap();
            client.layout();
        }

        let mut state = app.lock();
        for kind in [
            EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(10.0, 10.0),
            },
            EventKind::PointerMove { pos: vec2(250.0, 10.0) },
        ] {
            state.dispatch(crate::windowing::Event { window, kind });
        }
        // with no threshold any motion while pressed is a drag
        assert_eq!(events(&log), vec!["left:down", "left:drag_start"]);

        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(250.0, 10.0),
            },
        });
        assert_eq!(
            events(&log),
            vec!["left:leave", "left:drag_end", "left:up", "right:enter"]
        );
    }

    #[test]
    fn wheel_scrolls_instead_of_pressing() {
        let (app, id, window) = app();
        let log = Log::default();
        let (_, b) = overlapping(&app, id, &log, Obstruction::None);

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerDown {
                button: Button::WheelDown,
                pos: vec2(50.0, 50.0),
            },
        });
        assert_eq!(events(&log), vec!["b:scroll -1", "b:enter"]);
        let c = &state.client(id).unwrap().tree[b];
        assert!(!c.state.pressing && !c.active);
    }

    #[test]
    fn leaving_the_window_parks_the_pointer() {
        let (app, id, window) = app();
        let log = Log::default();
        overlapping(&app, id, &log, Obstruction::None);

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerMove { pos: vec2(50.0, 50.0) },
        });
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerLeave { normal: true },
        });
        assert_eq!(events(&log), vec!["b:enter", "b:leave"]);
        let client = state.client(id).unwrap();
        assert_eq!(client.state.mouse, OFF_SCREEN);
        assert!(concerned(&client.tree).is_empty());
    }

    #[test]
    fn keys_reach_every_container_children_first() {
        let (app, id, window) = app();
        let seen = Arc::new(Mutex::new(Vec::new()));
        {
            let mut state = app.lock();
            let client = state.client_mut(id).unwrap();
            let root = client.root();
            for name in ["one", "two"] {
                let seen = seen.clone();
                client
                    .tree
                    .add(
                        root,
                        Container::new().size(Size::Content, Size::Content).on_key_press(
                            move |_, _, key| seen.lock().unwrap().push((name, key.keysym)),
                        ),
                    )
                    .unwrap();
            }
        }

        let key = KeyEvent {
            keycode: 38,
            keysym: 0x61,
            text: Some('a'),
            modifiers: Default::default(),
        };
        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::KeyDown(key.clone()),
        });
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::KeyUp(key),
        });
        assert_eq!(*seen.lock().unwrap(), vec![("one", 0x61), ("two", 0x61)]);
    }

    #[test]
    fn a_callback_may_remove_its_own_container() {
        let (app, id, window) = app();
        let target = {
            let mut state = app.lock();
            let client = state.client_mut(id).unwrap();
            let root = client.root();
            let target = client
                .tree
                .add(
                    root,
                    Container::new().on_mouse_down(|ctx, me, _| {
                        ctx.tree.remove(me);
                    }),
                )
                .unwrap();
            client.layout();
            target
        };

        let mut state = app.lock();
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(5.0, 5.0),
            },
        });
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(5.0, 5.0),
            },
        });
        assert!(!state.client(id).unwrap().tree.contains(target));
    }

    /// A 100px `top` over a filling `bottom`.
    fn stacked(app: &App, id: ClientId, log: &Log, top: Container) -> ContainerId {
        let mut state = app.lock();
        let client = state.client_mut(id).unwrap();
        let root = client.root();
        let top = client
            .tree
            .add(root, logged(log, "top", top.size(Size::Fill, 100.0)))
            .unwrap();
        client
            .tree
            .add(root, logged(log, "bottom", Container::new().size(Size::Fill, Size::Fill)))
            .unwrap();
        client.layout();
        top
    }

    #[test]
    fn pending_relayout_runs_before_hit_testing() {
        let (app, id, window) = app();
        let log = Log::default();
        let top = stacked(&app, id, &log, Container::new());

        let mut state = app.lock();
        state.client_mut(id).unwrap().tree[top].wanted.h = Size::Fixed(10.0);
        state.request_relayout(id);
        state.dispatch(crate::windowing::Event {
            window,
            kind: EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
        });
        assert_eq!(events(&log), vec!["bottom:down"]);
    }

    #[test]
    fn release_sees_layout_changed_by_its_click() {
        let (app, id, window) = app();
        let log = Log::default();
        let top = stacked(&app, id, &log, Container::new());
        {
            let mut state = app.lock();
            let tree = &mut state.client_mut(id).unwrap().tree;
            tree[top].callbacks.clicked = Some(Box::new(|ctx: &mut Ctx<'_>, me: ContainerId| {
                if let Some(c) = ctx.container_mut(me) {
                    c.wanted.h = Size::Fixed(10.0);
                }
                ctx.request_relayout();
            }));
        }

        let mut state = app.lock();
        for kind in [
            EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
            EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(50.0, 50.0),
            },
        ] {
            state.dispatch(crate::windowing::Event { window, kind });
        }
        assert_eq!(
            events(&log),
            vec!["top:down", "top:up", "top:leave", "bottom:enter"]
        );
        assert_eq!(state.client(id).unwrap().tree[top].real.size.y, 10.0);
    }

    #[test]
    fn clipped_children_outside_the_clip_are_not_pierced() {
        let mut tree = Tree::new(Container::new().layout(LayoutType::Free));
        let root = tree.root();
        let header = tree.add(root, Container::new().size(100.0, 30.0)).unwrap();
        let viewport = tree
            .add(
                root,
                Container::new()
                    .layout(LayoutType::Free)
                    .at(0.0, 30.0)
                    .size(100.0, 100.0)
                    .clip(),
            )
            .unwrap();
        // sticks out above the viewport, over the header
        let row = tree
            .add(viewport, Container::new().at(0.0, -30.0).size(100.0, 60.0))
            .unwrap();
        crate::layout::layout(&mut tree, root, crate::layout::Rect::from_xywh(0.0, 0.0, 200.0, 200.0));

        assert_eq!(pierced(&tree, vec2(20.0, 10.0)), vec![header, root]);
        assert_eq!(pierced(&tree, vec2(20.0, 40.0)), vec![row, viewport, root]);
    }
}
