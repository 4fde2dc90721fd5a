use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::{Duration, Instant},
};

use anyhow::{Context, anyhow};
use log::{debug, error, info, trace, warn};
use parking_lot::{Mutex, MutexGuard};

use crate::{
    Result,
    animation::{Registered, Scheduler, Tween},
    dbg_ev, debug,
    layout::{Container, Rect, Tree},
    reactor::{Poller, Waker},
    renderer::{self, Surfaces},
    task::{CancelToken, TaskContext},
    timeout::{Due, TimeoutCallback, TimeoutId, Timeouts},
    windowing::{
        Client, ClientConfig, ClientId, ClientState, Ctx, Display, Event, router, x11::X11Display,
    },
};

/// Poller token of the self-pipe; timeouts use tokens from
/// [`Timeouts::RESERVED`] up.
const WAKER_TOKEN: u64 = 0;

#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Minimum time between two frames of the render loop.
    pub frame_interval: Duration,
    /// X display to connect to; `None` uses `$DISPLAY`.
    pub display: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            frame_interval: Duration::from_secs_f64(1.0 / 60.0),
            display: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_refresh_rate(mut self, hz: u32) -> Self {
        self.frame_interval = Duration::from_secs_f64(1.0 / hz.max(1) as f64);
        self
    }

    pub fn with_frame_interval(mut self, interval: Duration) -> Self {
        self.frame_interval = interval;
        self
    }

    pub fn with_display(mut self, name: impl Into<String>) -> Self {
        self.display = Some(name.into());
        self
    }

    /// Defaults, overridden by `HEARTH_REFRESH_RATE` and `HEARTH_DISPLAY`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(raw) = std::env::var("HEARTH_REFRESH_RATE") {
            match raw.trim().parse::<u32>() {
                Ok(hz) if hz > 0 => config = config.with_refresh_rate(hz),
                _ => warn!("ignoring HEARTH_REFRESH_RATE={raw:?}"),
            }
        }
        if let Ok(name) = std::env::var("HEARTH_DISPLAY") {
            config.display = Some(name);
        }
        config
    }
}

/// State shared by both loops that never needs the lock.
pub(crate) struct Runtime {
    pub display: Arc<dyn Display>,
    pub poller: Poller,
    pub waker: Waker,
    pub config: AppConfig,
    running: AtomicBool,
    app: Weak<Inner>,
}

impl Runtime {
    pub fn app(&self) -> Option<App> {
        self.app.upgrade().map(|inner| App { inner })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Clears the running flag and kicks both loops out of their waits.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::AcqRel) {
            info!("stopping");
        }
        self.waker.wake();
        self.display.wake();
    }
}

/// Engine-wide services handed down to routing, painting and callbacks.
pub(crate) struct Services<'a> {
    pub animations: &'a mut Scheduler,
    pub timeouts: &'a mut Timeouts,
    pub runtime: &'a Runtime,
}

impl Services<'_> {
    pub fn reborrow(&mut self) -> Services<'_> {
        Services {
            animations: self.animations,
            timeouts: self.timeouts,
            runtime: self.runtime,
        }
    }

    pub fn add_timeout(
        &mut self,
        client: ClientId,
        delay: Duration,
        repeat: bool,
        callback: TimeoutCallback,
    ) -> Option<TimeoutId> {
        match self
            .timeouts
            .add(&self.runtime.poller, client, delay, repeat, callback)
        {
            Ok(id) => Some(id),
            Err(err) => {
                error!("failed to arm timeout for {client:?}: {err}");
                None
            }
        }
    }

    pub fn remove_timeout(&mut self, id: TimeoutId) -> bool {
        self.timeouts.remove(&self.runtime.poller, id)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum HandlerTarget {
    Client(ClientId),
    All,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

/// Sees native events before routing. Returning `false` swallows the event.
pub type EventHandler = Box<dyn FnMut(&Event) -> bool + Send>;

struct Handler {
    id: HandlerId,
    target: HandlerTarget,
    callback: EventHandler,
}

struct Inner {
    state: Mutex<AppState>,
    runtime: Arc<Runtime>,
}

/// Everything behind the global lock.
pub struct AppState {
    clients: Vec<Client>,
    handlers: Vec<Handler>,
    animations: Scheduler,
    timeouts: Timeouts,
    runtime: Arc<Runtime>,
    next_client: u64,
    next_handler: u64,
}

impl AppState {
    fn new(runtime: Arc<Runtime>) -> Self {
        Self {
            clients: Vec::new(),
            handlers: Vec::new(),
            animations: Scheduler::default(),
            timeouts: Timeouts::default(),
            runtime,
            next_client: 1,
            next_handler: 1,
        }
    }

    fn split(&mut self) -> (&mut Vec<Client>, Services<'_>) {
        (
            &mut self.clients,
            Services {
                animations: &mut self.animations,
                timeouts: &mut self.timeouts,
                runtime: &self.runtime,
            },
        )
    }

    fn index_of(&self, id: ClientId) -> Option<usize> {
        self.clients.iter().position(|c| c.id() == id)
    }

    pub fn screen(&self) -> Rect {
        self.runtime.display.screen()
    }

    pub fn is_running(&self) -> bool {
        self.runtime.is_running()
    }

    pub fn stop(&self) {
        self.runtime.stop();
    }

    pub fn clients(&self) -> impl Iterator<Item = &Client> {
        self.clients.iter()
    }

    pub fn client_ids(&self) -> Vec<ClientId> {
        self.clients.iter().map(Client::id).collect()
    }

    pub fn client(&self, id: ClientId) -> Option<&Client> {
        self.clients.iter().find(|c| c.id() == id)
    }

    pub fn client_mut(&mut self, id: ClientId) -> Option<&mut Client> {
        self.clients.iter_mut().find(|c| c.id() == id)
    }

    pub fn animations(&self) -> &Scheduler {
        &self.animations
    }

    pub fn timeouts(&self) -> &Timeouts {
        &self.timeouts
    }

    /// Creates a window and an empty tree for it. The window stays hidden
    /// until [`AppState::show_client`].
    pub fn create_client(&mut self, config: ClientConfig) -> Result<ClientId> {
        let window = self
            .runtime
            .display
            .create_window(&config)
            .with_context(|| format!("failed to create window {:?}", config.title))?;
        let Some(surfaces) = Surfaces::new(config.size) else {
            self.runtime.display.destroy_window(window);
            return Err(anyhow!("cannot allocate {}x{} surfaces", config.size.x, config.size.y));
        };

        let id = ClientId::new(self.next_client);
        self.next_client += 1;

        let root = Container::new().named("root");
        let state = ClientState {
            id,
            window,
            bounds: Rect::new(config.position, config.size),
            mouse: router::OFF_SCREEN,
            press_origin: router::OFF_SCREEN,
            animation_count: 0,
            marked_to_close: false,
            on_closed: None,
            needs_repaint: true,
            needs_relayout: true,
            config,
            tasks: Vec::new(),
        };
        info!("created {id:?} ({:?}) as {window:?}", state.config.title);
        self.clients.push(Client::new(state, Tree::new(root), surfaces));
        Ok(id)
    }

    /// Maps the window and draws the first frame.
    pub fn show_client(&mut self, id: ClientId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let (clients, mut services) = self.split();
        let client = &mut clients[index];
        services.runtime.display.map_window(client.state.window);
        client.layout();
        if log::log_enabled!(log::Level::Trace) {
            trace!("{:?} tree:\n{}", id, debug::dump_tree(&client.tree));
        }
        renderer::paint(client, &mut services);
        true
    }

    pub fn set_title(&mut self, id: ClientId, title: &str) -> bool {
        let Some(client) = self.client_mut(id) else {
            return false;
        };
        client.state.config.title = title.to_string();
        let window = client.state.window;
        self.runtime.display.set_title(window, title);
        self.runtime.display.flush();
        true
    }

    /// Tears a client down right away. Unknown ids are ignored.
    ///
    /// Background tasks are cancelled and joined, animations snap to their
    /// targets without callbacks, timeouts are disarmed and the window is
    /// destroyed. Closing the last client stops the engine.
    pub fn close_client(&mut self, id: ClientId) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let mut client = self.clients.remove(index);

        for task in client.state.tasks.drain(..) {
            task.join();
        }
        let snapped = self.animations.cancel_client(id);
        let disarmed = self.timeouts.remove_client(&self.runtime.poller, id);
        self.handlers.retain(|h| h.target != HandlerTarget::Client(id));

        if let Some(on_closed) = client.state.on_closed.take() {
            on_closed(&mut client);
        }
        self.runtime.display.destroy_window(client.state.window);
        self.runtime.display.flush();
        info!("closed {id:?} ({snapped} animations, {disarmed} timeouts dropped)");

        if self.clients.is_empty() {
            self.runtime.stop();
        }
        true
    }

    /// Defers closing to the end of the current loop iteration.
    pub fn mark_to_close(&mut self, id: ClientId) -> bool {
        match self.client_mut(id) {
            Some(client) => {
                client.state.marked_to_close = true;
                true
            }
            None => false,
        }
    }

    pub fn process_closures(&mut self) {
        let marked: Vec<ClientId> = self
            .clients
            .iter()
            .filter(|c| c.state.marked_to_close)
            .map(Client::id)
            .collect();
        for id in marked {
            self.close_client(id);
        }
    }

    pub fn add_handler(
        &mut self,
        target: HandlerTarget,
        callback: impl FnMut(&Event) -> bool + Send + 'static,
    ) -> HandlerId {
        let id = HandlerId(self.next_handler);
        self.next_handler += 1;
        self.handlers.push(Handler {
            id,
            target,
            callback: Box::new(callback),
        });
        id
    }

    pub fn remove_handler(&mut self, id: HandlerId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|h| h.id != id);
        self.handlers.len() != before
    }

    pub fn animate(&mut self, id: ClientId, tween: Tween) -> bool {
        let Some(index) = self.index_of(id) else {
            return false;
        };
        let registered = self.animations.register(id, tween, Instant::now());
        if registered == Registered::New {
            self.clients[index].state.animation_count += 1;
        }
        self.runtime.waker.wake();
        true
    }

    pub fn add_timeout(
        &mut self,
        id: ClientId,
        delay: Duration,
        repeat: bool,
        callback: impl FnMut(&mut Ctx<'_>) + Send + 'static,
    ) -> Option<TimeoutId> {
        self.index_of(id)?;
        let (_, mut services) = self.split();
        services.add_timeout(id, delay, repeat, Box::new(callback))
    }

    pub fn remove_timeout(&mut self, timeout: TimeoutId) -> bool {
        let (_, mut services) = self.split();
        services.remove_timeout(timeout)
    }

    pub fn request_repaint(&mut self, id: ClientId) {
        if let Some(client) = self.client_mut(id) {
            client.state.needs_repaint = true;
            self.runtime.waker.wake();
        }
    }

    pub fn request_relayout(&mut self, id: ClientId) {
        if let Some(client) = self.client_mut(id) {
            client.state.needs_relayout = true;
            client.state.needs_repaint = true;
            self.runtime.waker.wake();
        }
    }

    pub fn layout(&mut self, id: ClientId) {
        if let Some(client) = self.client_mut(id) {
            client.layout();
        }
    }

    pub fn paint(&mut self, id: ClientId) {
        let Some(index) = self.index_of(id) else {
            return;
        };
        let (clients, mut services) = self.split();
        renderer::paint(&mut clients[index], &mut services);
    }

    /// Runs `f` with a callback context for `id`, as if from inside a callback.
    pub fn with_ctx<R>(&mut self, id: ClientId, f: impl FnOnce(&mut Ctx<'_>) -> R) -> Option<R> {
        let index = self.index_of(id)?;
        let (clients, mut services) = self.split();
        let mut ctx = clients[index].ctx(&mut services);
        Some(f(&mut ctx))
    }

    pub fn spawn_task(
        &mut self,
        id: ClientId,
        job: impl FnOnce(TaskContext) + Send + 'static,
    ) -> Option<CancelToken> {
        let app = self.runtime.app()?;
        self.client_mut(id)?.state.spawn(app, job)
    }

    /// Runs event handlers, then routes the event into its client's tree.
    pub fn dispatch(&mut self, event: Event) {
        trace!("{} for {:?}", dbg_ev!(&event.kind), event.window);
        let index = self
            .clients
            .iter()
            .position(|c| c.state.window == event.window);
        let owner = index.map(|i| self.clients[i].id());

        for handler in &mut self.handlers {
            let applies = match handler.target {
                HandlerTarget::All => true,
                HandlerTarget::Client(id) => owner == Some(id),
            };
            if applies && !(handler.callback)(&event) {
                debug!("{} swallowed by {:?}", dbg_ev!(&event.kind), handler.id);
                return;
            }
        }

        let Some(index) = index else {
            trace!("no client owns {:?}", event.window);
            return;
        };
        let (clients, mut services) = self.split();
        let client = &mut clients[index];
        client.settle_layout();
        router::route(client, &mut services, &event.kind);
    }

    /// Lays out and repaints every client that asked for it.
    pub fn flush_invalidations(&mut self) {
        let (clients, mut services) = self.split();
        for client in clients.iter_mut() {
            refresh(client, &mut services);
        }
    }

    /// One render-loop frame: advance animations, then repaint whatever is
    /// animating or invalid.
    pub fn tick(&mut self, now: Instant) {
        let (clients, mut services) = self.split();
        services.runtime.waker.drain();

        let relayouts: Vec<bool> = clients
            .iter()
            .map(|c| services.animations.relayouts(c.id()))
            .collect();

        for done in services.animations.tick(now) {
            let Some(client) = clients.iter_mut().find(|c| c.id() == done.client) else {
                continue;
            };
            client.state.animation_count = client.state.animation_count.saturating_sub(1);
            if let Some(on_done) = done.on_done {
                let mut ctx = client.ctx(&mut services);
                on_done(&mut ctx);
            }
            client.state.needs_relayout |= done.relayout;
            client.state.needs_repaint = true;
        }

        for (client, relayout) in clients.iter_mut().zip(relayouts) {
            client.state.needs_relayout |= relayout;
            if client.state.animation_count > 0 {
                client.state.needs_repaint = true;
            }
            refresh(client, &mut services);
        }

        // level-triggered: leaving a byte in the pipe keeps frames coming
        let animating = !services.animations.is_empty()
            || clients.iter().any(|c| c.state.animation_count > 0);
        if animating {
            services.runtime.waker.wake();
        }
    }

    fn fire_timeout(&mut self, token: u64) {
        let (clients, mut services) = self.split();
        let Some(Due {
            id,
            client,
            mut callback,
        }) = services.timeouts.take_due(&services.runtime.poller, token)
        else {
            return;
        };
        if let Some(owner) = clients.iter_mut().find(|c| c.id() == client) {
            let mut ctx = owner.ctx(&mut services);
            callback(&mut ctx);
        }
        services.timeouts.restore(id, callback);
    }
}

impl Drop for AppState {
    fn drop(&mut self) {
        for id in self.client_ids() {
            self.close_client(id);
        }
    }
}

fn refresh(client: &mut Client, services: &mut Services<'_>) {
    client.settle_layout();
    if client.state.needs_repaint {
        renderer::paint(client, services);
    }
}

/// Handle to the engine. Clones share the same state.
#[derive(Clone)]
pub struct App {
    inner: Arc<Inner>,
}

impl App {
    /// Connects to the X server named by `config` (or `$DISPLAY`).
    pub fn connect(config: AppConfig) -> Result<Self> {
        let display = X11Display::connect(config.display.as_deref())?;
        Self::with_display(display, config)
    }

    pub fn with_display(display: impl Display + 'static, config: AppConfig) -> Result<Self> {
        let poller = Poller::new().context("failed to create epoll instance")?;
        let waker = Waker::new().context("failed to create self-pipe")?;
        poller
            .add(waker.as_raw_fd(), WAKER_TOKEN)
            .context("failed to watch self-pipe")?;
        let display: Arc<dyn Display> = Arc::new(display);

        let inner = Arc::new_cyclic(|weak| {
            let runtime = Arc::new(Runtime {
                display,
                poller,
                waker,
                config,
                running: AtomicBool::new(true),
                app: weak.clone(),
            });
            Inner {
                state: Mutex::new(AppState::new(runtime.clone())),
                runtime,
            }
        });
        debug!(
            "engine up, frame interval {:?}",
            inner.runtime.config.frame_interval
        );
        Ok(Self { inner })
    }

    /// Takes the global lock.
    pub fn lock(&self) -> MutexGuard<'_, AppState> {
        self.inner.state.lock()
    }

    pub(crate) fn try_lock_for(&self, timeout: Duration) -> Option<MutexGuard<'_, AppState>> {
        self.inner.state.try_lock_for(timeout)
    }

    pub fn is_running(&self) -> bool {
        self.inner.runtime.is_running()
    }

    pub fn stop(&self) {
        self.inner.runtime.stop();
    }

    pub fn screen(&self) -> Rect {
        self.inner.runtime.display.screen()
    }

    /// Runs the input loop on this thread and the render loop on another
    /// until the last client closes or [`App::stop`] is called.
    pub fn run(&self) -> Result<()> {
        if self.lock().clients.is_empty() {
            warn!("run() without clients, nothing to do");
            return Ok(());
        }
        self.lock().flush_invalidations();

        let render = {
            let app = self.clone();
            thread::Builder::new()
                .name("hearth-render".into())
                .spawn(move || app.render_loop())
                .context("failed to spawn render thread")?
        };

        let result = self.input_loop();
        self.stop();
        if render.join().is_err() {
            error!("render thread panicked");
        }

        let mut state = self.lock();
        for id in state.client_ids() {
            state.close_client(id);
        }
        result
    }

    fn input_loop(&self) -> Result<()> {
        let runtime = &self.inner.runtime;
        while runtime.is_running() {
            let event = match runtime.display.wait_for_event() {
                Ok(Some(event)) => event,
                Ok(None) => continue,
                Err(err) => return Err(err.context("display connection lost")),
            };
            let mut state = self.lock();
            state.dispatch(event);
            state.flush_invalidations();
            state.process_closures();
        }
        Ok(())
    }

    fn render_loop(&self) {
        let runtime = &self.inner.runtime;
        let mut ready = Vec::new();
        while runtime.is_running() {
            if let Err(err) = runtime.poller.wait(&mut ready, None) {
                error!("render loop poll failed: {err}");
                runtime.stop();
                break;
            }
            if !runtime.is_running() {
                break;
            }

            let started = Instant::now();
            {
                let mut state = self.lock();
                for token in &ready {
                    if *token != WAKER_TOKEN {
                        state.fire_timeout(*token);
                    }
                }
                state.tick(started);
                state.process_closures();
            }

            if let Some(rest) = runtime.config.frame_interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }
        debug!("render loop done");
    }
}
