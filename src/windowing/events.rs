use std::time::Duration;

use glam::Vec2;

use crate::{
    App,
    animation::{Registered, Tween},
    app::Services,
    layout::{self, Container, ContainerId, Rect, Tree},
    renderer::Canvas,
    task::{CancelToken, TaskContext},
    timeout::TimeoutId,
    windowing::{ClientId, ClientState, WindowId},
};

/// Pointer buttons, numbered the way X11 reports them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Button {
    Left,
    Middle,
    Right,
    WheelUp,
    WheelDown,
    WheelLeft,
    WheelRight,
    Other(u8),
}

impl Button {
    pub fn from_detail(detail: u8) -> Self {
        match detail {
            1 => Button::Left,
            2 => Button::Middle,
            3 => Button::Right,
            4 => Button::WheelUp,
            5 => Button::WheelDown,
            6 => Button::WheelLeft,
            7 => Button::WheelRight,
            other => Button::Other(other),
        }
    }

    pub fn detail(self) -> u8 {
        match self {
            Button::Left => 1,
            Button::Middle => 2,
            Button::Right => 3,
            Button::WheelUp => 4,
            Button::WheelDown => 5,
            Button::WheelLeft => 6,
            Button::WheelRight => 7,
            Button::Other(d) => d,
        }
    }

    /// Left, middle or right: the buttons with press/drag/click semantics.
    pub fn is_standard(self) -> bool {
        matches!(self, Button::Left | Button::Middle | Button::Right)
    }

    pub fn scroll_delta(self) -> Option<ScrollDelta> {
        match self {
            Button::WheelUp => Some(ScrollDelta { x: 0.0, y: 1.0 }),
            Button::WheelDown => Some(ScrollDelta { x: 0.0, y: -1.0 }),
            Button::WheelLeft => Some(ScrollDelta { x: 1.0, y: 0.0 }),
            Button::WheelRight => Some(ScrollDelta { x: -1.0, y: 0.0 }),
            _ => None,
        }
    }
}

/// Wheel notches; positive `y` is away from the user.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ScrollDelta {
    pub x: f32,
    pub y: f32,
}

#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub shift: bool,
    pub control: bool,
    pub alt: bool,
    pub logo: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyEvent {
    pub keycode: u8,
    pub keysym: u32,
    pub text: Option<char>,
    pub modifiers: Modifiers,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    PointerMove { pos: Vec2 },
    PointerDown { button: Button, pos: Vec2 },
    PointerUp { button: Button, pos: Vec2 },
    /// `normal` is false for crossings caused by grabs rather than movement.
    PointerEnter { pos: Vec2, normal: bool },
    PointerLeave { normal: bool },

    KeyDown(KeyEvent),
    KeyUp(KeyEvent),

    FocusIn,
    FocusOut,

    Expose,
    Configure { bounds: Rect },
    CloseRequested,
}

/// A native event, already translated, addressed to one window.
#[derive(Clone, Debug, PartialEq)]
pub struct Event {
    pub window: WindowId,
    pub kind: EventKind,
}

/// What a callback gets to work with.
///
/// The global lock is held by whoever built the context, so everything here
/// can be mutated directly.
pub struct Ctx<'a> {
    pub client: &'a mut ClientState,
    pub tree: &'a mut Tree,
    /// Bound to the client's back surface.
    pub canvas: &'a mut Canvas,
    pub(crate) services: Services<'a>,
}

impl<'a> Ctx<'a> {
    pub fn client_id(&self) -> ClientId {
        self.client.id
    }

    pub fn mouse(&self) -> Vec2 {
        self.client.mouse
    }

    pub fn bounds(&self) -> Rect {
        self.client.bounds
    }

    pub fn container(&self, id: ContainerId) -> Option<&Container> {
        self.tree.get(id)
    }

    pub fn container_mut(&mut self, id: ContainerId) -> Option<&mut Container> {
        self.tree.get_mut(id)
    }

    /// Starts (or restarts) an animation owned by this client.
    pub fn animate(&mut self, tween: Tween) {
        let registered = self.services.animations.register(
            self.client.id,
            tween,
            std::time::Instant::now(),
        );
        if registered == Registered::New {
            self.client.animation_count += 1;
        }
        self.services.runtime.waker.wake();
    }

    pub fn add_timeout(
        &mut self,
        delay: Duration,
        repeat: bool,
        callback: impl FnMut(&mut Ctx<'_>) + Send + 'static,
    ) -> Option<TimeoutId> {
        self.services
            .add_timeout(self.client.id, delay, repeat, Box::new(callback))
    }

    pub fn remove_timeout(&mut self, id: TimeoutId) -> bool {
        self.services.remove_timeout(id)
    }

    pub fn request_repaint(&mut self) {
        self.client.needs_repaint = true;
        self.services.runtime.waker.wake();
    }

    pub fn request_relayout(&mut self) {
        self.client.needs_relayout = true;
        self.request_repaint();
    }

    /// Lays the whole client out right away so hit-testing sees fresh bounds.
    pub fn layout_now(&mut self) {
        let root = self.tree.root();
        layout::layout(self.tree, root, Rect::new(Vec2::ZERO, self.client.bounds.size));
        self.client.needs_relayout = false;
    }

    /// Closes this client once the current dispatch is over.
    pub fn close(&mut self) {
        self.client.marked_to_close = true;
    }

    pub fn app(&self) -> Option<App> {
        self.services.runtime.app()
    }

    /// Runs `job` on its own thread; the task is cancelled and joined before
    /// this client goes away.
    pub fn spawn(
        &mut self,
        job: impl FnOnce(TaskContext) + Send + 'static,
    ) -> Option<CancelToken> {
        let app = self.app()?;
        self.client.spawn(app, job)
    }
}
