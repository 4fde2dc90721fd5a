use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use hearth::{
    AnimatedValue, App, AppConfig, Button, ClientConfig, ClientId, Container, Event, EventKind,
    Headless, HandlerTarget, Rect, Size, Tween, WindowId, vec2, vec4,
};

fn engine() -> (App, Headless) {
    let display = Headless::new(1024.0, 768.0);
    let app = App::with_display(display.clone(), AppConfig::default()).unwrap();
    (app, display)
}

fn client(app: &App, w: f32, h: f32) -> (ClientId, WindowId) {
    let mut state = app.lock();
    let id = state
        .create_client(ClientConfig::new().with_title("test").with_size(w, h))
        .unwrap();
    let window = state.client(id).unwrap().state.window;
    (id, window)
}

fn wait_until(what: impl Fn() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if what() {
            return true;
        }
        thread::sleep(Duration::from_millis(5));
    }
    false
}

#[test]
fn show_client_maps_and_presents_a_frame() {
    let (app, display) = engine();
    let (id, window) = client(&app, 40.0, 20.0);
    assert!(!display.is_mapped(window));

    let mut state = app.lock();
    let c = state.client_mut(id).unwrap();
    let root = c.root();
    c.tree.add(
        root,
        Container::new()
            .size(10.0, Size::Fill)
            .on_paint(|ctx, me| {
                let b = ctx.container(me).unwrap().real;
                ctx.canvas.draw_rect(b.origin, b.size, vec4(1.0, 0.0, 0.0, 1.0));
            }),
    );
    assert!(state.show_client(id));

    assert!(display.is_mapped(window));
    assert_eq!(display.frames(window), 1);
    let frame = display.last_frame(window).unwrap();
    assert_eq!((frame.width(), frame.height()), (40, 20));
    let inside = frame.pixel(5, 10).unwrap().demultiply();
    assert_eq!((inside.red(), inside.alpha()), (255, 255));
    assert_eq!(frame.pixel(30, 10).unwrap().alpha(), 0);
}

#[test]
fn closing_the_last_client_stops_the_engine() {
    let (app, display) = engine();
    let (a, _) = client(&app, 10.0, 10.0);
    let (b, window) = client(&app, 10.0, 10.0);
    let closed = Arc::new(AtomicBool::new(false));

    let mut state = app.lock();
    let flag = closed.clone();
    state.client_mut(b).unwrap().state.on_closed = Some(Box::new(move |client| {
        assert_eq!(client.state.window, window);
        flag.store(true, Ordering::SeqCst);
    }));

    assert!(state.close_client(b));
    assert!(closed.load(Ordering::SeqCst));
    assert!(state.client(b).is_none());
    assert_eq!(display.window_count(), 1);
    assert!(state.is_running());

    assert!(!state.close_client(b));
    assert!(state.close_client(a));
    assert!(!state.is_running());
    assert_eq!(display.window_count(), 0);
}

#[test]
fn close_requested_is_deferred_until_closures_run() {
    let (app, _display) = engine();
    let (id, window) = client(&app, 10.0, 10.0);
    let (other, _) = client(&app, 10.0, 10.0);

    let mut state = app.lock();
    state.dispatch(Event {
        window,
        kind: EventKind::CloseRequested,
    });
    assert!(state.client(id).unwrap().state.marked_to_close);

    state.process_closures();
    assert!(state.client(id).is_none());
    assert_eq!(state.client_ids(), vec![other]);
}

#[test]
fn handler_can_swallow_events() {
    let (app, _display) = engine();
    let (id, window) = client(&app, 50.0, 50.0);
    let clicks = Arc::new(AtomicUsize::new(0));

    let mut state = app.lock();
    let c = state.client_mut(id).unwrap();
    let root = c.root();
    let counter = clicks.clone();
    c.tree.add(
        root,
        Container::new()
            .size(Size::Fill, Size::Fill)
            .on_click(move |_, _| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
    );
    state.layout(id);

    let handler = state.add_handler(HandlerTarget::Client(id), |event| {
        !matches!(event.kind, EventKind::PointerDown { .. })
    });
    let click = |state: &mut hearth::AppState| {
        for kind in [
            EventKind::PointerDown {
                button: Button::Left,
                pos: vec2(5.0, 5.0),
            },
            EventKind::PointerUp {
                button: Button::Left,
                pos: vec2(5.0, 5.0),
            },
        ] {
            state.dispatch(Event { window, kind });
        }
    };

    click(&mut state);
    assert_eq!(clicks.load(Ordering::SeqCst), 0);

    assert!(state.remove_handler(handler));
    click(&mut state);
    assert_eq!(clicks.load(Ordering::SeqCst), 1);
}

#[test]
fn configure_resizes_and_relays_out() {
    let (app, display) = engine();
    let (id, window) = client(&app, 100.0, 50.0);

    let mut state = app.lock();
    let c = state.client_mut(id).unwrap();
    let root = c.root();
    let fill = c.tree.add(root, Container::new().size(Size::Fill, Size::Fill)).unwrap();
    state.show_client(id);
    assert_eq!(state.client(id).unwrap().tree[fill].real.size, vec2(100.0, 50.0));

    state.dispatch(Event {
        window,
        kind: EventKind::Configure {
            bounds: Rect::from_xywh(10.0, 20.0, 200.0, 80.0),
        },
    });
    state.flush_invalidations();

    let c = state.client(id).unwrap();
    assert_eq!(c.state.bounds.origin, vec2(10.0, 20.0));
    assert_eq!(c.tree[fill].real.size, vec2(200.0, 80.0));
    let frame = display.last_frame(window).unwrap();
    assert_eq!((frame.width(), frame.height()), (200, 80));
}

#[test]
fn animations_finish_on_tick() {
    let (app, _display) = engine();
    let (id, _) = client(&app, 10.0, 10.0);
    let value = AnimatedValue::new(0.0);
    let done = Arc::new(AtomicBool::new(false));

    let mut state = app.lock();
    let flag = done.clone();
    let tween = Tween::new(&value, 10.0, Duration::from_millis(100)).on_done(move |ctx| {
        assert_eq!(ctx.client.animation_count, 0);
        flag.store(true, Ordering::SeqCst);
    });
    assert!(state.animate(id, tween));
    // same value again replaces instead of stacking
    assert!(state.animate(id, Tween::new(&value, 20.0, Duration::from_millis(100))));
    assert_eq!(state.client(id).unwrap().state.animation_count, 1);

    state.tick(Instant::now() + Duration::from_secs(1));
    assert_eq!(value.get(), 20.0);
    assert_eq!(state.client(id).unwrap().state.animation_count, 0);
    assert!(state.animations().is_empty());
    // the replaced tween's callback went with it
    assert!(!done.load(Ordering::SeqCst));
}

#[test]
fn animating_clients_repaint_every_tick() {
    let (app, display) = engine();
    let (busy, busy_window) = client(&app, 10.0, 10.0);
    let (idle, idle_window) = client(&app, 10.0, 10.0);

    let mut state = app.lock();
    state.show_client(busy);
    state.show_client(idle);
    let now = Instant::now();
    state.tick(now);
    let (busy_frames, idle_frames) = (display.frames(busy_window), display.frames(idle_window));

    // counted without a scheduled tween, as a widget driving its own frames would
    state.client_mut(busy).unwrap().state.animation_count = 1;
    state.tick(now + Duration::from_millis(16));
    state.tick(now + Duration::from_millis(32));

    assert_eq!(display.frames(busy_window), busy_frames + 2);
    assert_eq!(display.frames(idle_window), idle_frames);
    assert!(state.animations().is_empty());
    assert_eq!(state.client(idle).unwrap().state.animation_count, 0);
}

#[test]
fn closing_a_client_snaps_its_animations() {
    let (app, _display) = engine();
    let (a, _) = client(&app, 10.0, 10.0);
    let (b, _) = client(&app, 10.0, 10.0);
    let (x, y) = (AnimatedValue::new(0.0), AnimatedValue::new(0.0));

    let mut state = app.lock();
    state.animate(a, Tween::new(&x, 5.0, Duration::from_secs(60)));
    state.animate(b, Tween::new(&y, 5.0, Duration::from_secs(60)));

    state.close_client(a);
    assert_eq!(x.get(), 5.0);
    assert_eq!(y.get(), 0.0);
    assert_eq!(state.animations().len(), 1);
}

#[test]
fn tasks_are_cancelled_with_their_client() {
    let (app, _display) = engine();
    let (id, _) = client(&app, 10.0, 10.0);
    let (_keep, _) = client(&app, 10.0, 10.0);
    let exited = Arc::new(AtomicBool::new(false));

    let flag = exited.clone();
    let token = app
        .lock()
        .spawn_task(id, move |task| {
            while task.sleep(Duration::from_millis(5)) {}
            flag.store(true, Ordering::SeqCst);
        })
        .unwrap();

    app.lock().close_client(id);
    assert!(token.is_cancelled());
    assert!(exited.load(Ordering::SeqCst));
}

#[test]
fn tasks_take_the_lock_to_touch_state() {
    let (app, display) = engine();
    let (id, window) = client(&app, 10.0, 10.0);

    app.lock()
        .spawn_task(id, |task| {
            if let Some(mut state) = task.lock() {
                state.set_title(task.client(), "from a task");
            }
        })
        .unwrap();

    assert!(wait_until(|| display.title(window).as_deref() == Some("from a task")));
    assert_eq!(app.lock().client(id).unwrap().state.config.title, "from a task");
}

#[test]
fn run_returns_once_a_timeout_closes_the_last_client() {
    let (app, display) = engine();
    let (id, window) = client(&app, 10.0, 10.0);
    let fired = Arc::new(AtomicUsize::new(0));

    {
        let mut state = app.lock();
        state.show_client(id);
        let count = fired.clone();
        state
            .add_timeout(id, Duration::from_millis(5), true, move |ctx| {
                if count.fetch_add(1, Ordering::SeqCst) == 2 {
                    ctx.close();
                }
            })
            .unwrap();
    }

    app.run().unwrap();
    assert_eq!(fired.load(Ordering::SeqCst), 3);
    assert!(!app.is_running());
    assert_eq!(display.window_count(), 0);
    assert!(!display.is_mapped(window));
}

#[test]
fn run_stops_on_close_request_from_the_display() {
    let (app, display) = engine();
    let (id, window) = client(&app, 10.0, 10.0);
    app.lock().show_client(id);

    let pusher = display.clone();
    let feeder = thread::spawn(move || {
        pusher.push(
            window,
            EventKind::PointerMove {
                pos: vec2(1.0, 1.0),
            },
        );
        pusher.push(window, EventKind::CloseRequested);
    });

    app.run().unwrap();
    feeder.join().unwrap();
    assert!(app.lock().clients().next().is_none());
}

#[test]
fn dropping_the_engine_destroys_remaining_windows() {
    let (app, display) = engine();
    client(&app, 10.0, 10.0);
    client(&app, 10.0, 10.0);
    assert_eq!(display.window_count(), 2);

    drop(app);
    assert_eq!(display.window_count(), 0);
}
