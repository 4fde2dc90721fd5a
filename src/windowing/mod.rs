pub mod display;
pub mod events;
pub mod headless;
pub mod router;
pub mod x11;

use std::fmt;

use glam::{Vec2, vec2};

use crate::{
    App,
    app::Services,
    layout::{self, ContainerId, Rect, Tree},
    renderer::surface::Surfaces,
    task::{BackgroundTask, CancelToken, TaskContext},
};

pub use display::Display;
pub use events::{Button, Ctx, Event, EventKind, KeyEvent, Modifiers, ScrollDelta};
pub use headless::Headless;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClientId(u64);

impl ClientId {
    pub(crate) const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

/// Native window handle as handed out by a [`Display`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct WindowId(pub u32);

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum WindowKind {
    #[default]
    Normal,
    /// Panels and bars; the window manager keeps them out of the way.
    Dock,
    /// Menus and tooltips: undecorated and placed by us, not the WM.
    Popup,
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub title: String,
    pub position: Vec2,
    pub size: Vec2,
    pub transparent: bool,
    pub decorations: bool,
    pub kind: WindowKind,
    pub sticky: bool,
    pub skip_taskbar: bool,
    pub override_redirect: bool,
    pub above: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            title: "Hearth".to_string(),
            position: Vec2::ZERO,
            size: vec2(800.0, 600.0),
            transparent: false,
            decorations: true,
            kind: WindowKind::Normal,
            sticky: false,
            skip_taskbar: false,
            override_redirect: false,
            above: false,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_size(mut self, width: f32, height: f32) -> Self {
        self.size = vec2(width.max(1.0), height.max(1.0));
        self
    }

    pub fn with_position(mut self, x: f32, y: f32) -> Self {
        self.position = vec2(x, y);
        self
    }

    pub fn transparent(mut self) -> Self {
        self.transparent = true;
        self
    }

    pub fn undecorated(mut self) -> Self {
        self.decorations = false;
        self
    }

    pub fn dock(mut self) -> Self {
        self.kind = WindowKind::Dock;
        self.decorations = false;
        self
    }

    pub fn popup(mut self) -> Self {
        self.kind = WindowKind::Popup;
        self.decorations = false;
        self.override_redirect = true;
        self
    }

    pub fn sticky(mut self) -> Self {
        self.sticky = true;
        self
    }

    pub fn skip_taskbar(mut self) -> Self {
        self.skip_taskbar = true;
        self
    }

    pub fn override_redirect(mut self) -> Self {
        self.override_redirect = true;
        self
    }

    pub fn above(mut self) -> Self {
        self.above = true;
        self
    }
}

pub type OnClosed = Box<dyn FnOnce(&mut Client) + Send>;

/// Everything about a client except its tree and pixels.
pub struct ClientState {
    pub id: ClientId,
    pub window: WindowId,
    /// Screen position and size of the window.
    pub bounds: Rect,
    /// Last pointer position, window relative. (-1, -1) once the pointer left.
    pub mouse: Vec2,
    pub(crate) press_origin: Vec2,
    /// Non-zero keeps the client repainting every frame.
    pub animation_count: u32,
    pub marked_to_close: bool,
    pub on_closed: Option<OnClosed>,
    pub(crate) needs_repaint: bool,
    pub(crate) needs_relayout: bool,
    pub config: ClientConfig,
    pub(crate) tasks: Vec<BackgroundTask>,
}

impl ClientState {
    pub(crate) fn spawn(
        &mut self,
        app: App,
        job: impl FnOnce(TaskContext) + Send + 'static,
    ) -> Option<CancelToken> {
        self.tasks.retain(|t| !t.is_finished());
        match BackgroundTask::spawn(app, self.id, job) {
            Ok(task) => {
                let token = task.token();
                self.tasks.push(task);
                Some(token)
            }
            Err(err) => {
                log::error!("failed to spawn task for {:?}: {err}", self.id);
                None
            }
        }
    }
}

impl fmt::Debug for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientState")
            .field("id", &self.id)
            .field("window", &self.window)
            .field("bounds", &self.bounds)
            .field("mouse", &self.mouse)
            .field("animation_count", &self.animation_count)
            .field("marked_to_close", &self.marked_to_close)
            .field("tasks", &self.tasks.len())
            .finish_non_exhaustive()
    }
}

/// One native window with its container tree and drawing surfaces.
pub struct Client {
    pub state: ClientState,
    pub tree: Tree,
    pub(crate) surfaces: Surfaces,
}

impl Client {
    pub(crate) fn new(state: ClientState, tree: Tree, surfaces: Surfaces) -> Self {
        Self {
            state,
            tree,
            surfaces,
        }
    }

    pub fn id(&self) -> ClientId {
        self.state.id
    }

    pub fn root(&self) -> ContainerId {
        self.tree.root()
    }

    pub(crate) fn ctx<'a>(&'a mut self, services: &'a mut Services<'_>) -> Ctx<'a> {
        Ctx {
            client: &mut self.state,
            tree: &mut self.tree,
            canvas: self.surfaces.back_mut(),
            services: services.reborrow(),
        }
    }

    /// Lays the tree out over the window's current size.
    pub fn layout(&mut self) {
        let root = self.tree.root();
        let bounds = Rect::new(Vec2::ZERO, self.state.bounds.size);
        layout::layout(&mut self.tree, root, bounds);
        self.state.needs_relayout = false;
    }

    /// Runs a pending relayout so hit-testing sees current bounds.
    pub(crate) fn settle_layout(&mut self) {
        if self.state.needs_relayout {
            self.layout();
            self.state.needs_repaint = true;
        }
    }

    /// The last presented frame.
    pub fn front(&self) -> &tiny_skia::Pixmap {
        self.surfaces.front()
    }
}

impl fmt::Debug for Client {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Client")
            .field("state", &self.state)
            .field("containers", &self.tree.len())
            .finish()
    }
}
