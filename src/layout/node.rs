use std::{any::Any, fmt};

use glam::Vec2;

use crate::{
    animation::AnimatedValue,
    layout::{Rect, tree::{ContainerId, Tree}},
    style::{Align, Justify, LayoutType, Obstruction, Padding, Size, WantedBounds},
    windowing::events::{Button, Ctx, KeyEvent, ScrollDelta},
};

pub type Callback = Box<dyn FnMut(&mut Ctx<'_>, ContainerId) + Send>;
pub type ButtonCallback = Box<dyn FnMut(&mut Ctx<'_>, ContainerId, Button) + Send>;
pub type ScrollCallback = Box<dyn FnMut(&mut Ctx<'_>, ContainerId, ScrollDelta) + Send>;
pub type KeyCallback = Box<dyn FnMut(&mut Ctx<'_>, ContainerId, &KeyEvent) + Send>;
pub type HitTest = Box<dyn Fn(&Container, Vec2) -> bool + Send>;
pub type LayoutHook = Box<dyn FnMut(&mut Tree, ContainerId, Rect) + Send>;

/// Interaction state; everything false means "not involved".
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct State {
    pub concerned: bool,
    pub hovering: bool,
    pub pressing: bool,
    pub dragging: bool,
    pub button: Option<Button>,
}

impl State {
    pub fn reset(&mut self) {
        *self = State::default();
    }
}

#[derive(Default)]
pub struct Callbacks {
    pub paint: Option<Callback>,
    pub clicked: Option<Callback>,
    pub mouse_down: Option<ButtonCallback>,
    pub mouse_up: Option<ButtonCallback>,
    pub mouse_enter: Option<Callback>,
    pub mouse_leave: Option<Callback>,
    pub mouse_motion: Option<Callback>,
    pub drag_start: Option<Callback>,
    pub drag: Option<Callback>,
    pub drag_end: Option<Callback>,
    pub scroll: Option<ScrollCallback>,
    pub key_press: Option<KeyCallback>,
    pub key_release: Option<KeyCallback>,
    pub hit_test: Option<HitTest>,
    pub before_layout: Option<LayoutHook>,
}

/// Scroll offsets of a scroll pane. `real` is where the pane wants to be,
/// `visual` is what layout applies and what animations move.
#[derive(Debug, Clone, Default)]
pub struct Scroll {
    pub real: Vec2,
    pub visual_x: AnimatedValue,
    pub visual_y: AnimatedValue,
}

impl Scroll {
    pub fn visual(&self) -> Vec2 {
        Vec2::new(self.visual_x.get() as f32, self.visual_y.get() as f32)
    }
}

pub struct Container {
    pub(crate) parent: Option<ContainerId>,
    pub(crate) children: Vec<ContainerId>,

    pub wanted: WantedBounds,
    pub padding: Padding,
    pub spacing: f32,
    pub align: Align,
    pub justify: Justify,
    pub layout: LayoutType,
    pub scroll: Option<Scroll>,

    /// Layout result, relative to the window's top-left.
    pub real: Rect,
    pub z_index: i32,

    pub exists: bool,
    pub interactable: bool,
    pub clip_children: bool,
    pub auto_paint_children: bool,
    pub obstruction: Obstruction,
    pub drag_end_is_click: bool,
    /// Pointer travel needed before a press turns into a drag.
    pub drag_threshold: f32,

    pub active: bool,
    pub state: State,

    pub name: Option<String>,
    pub user_data: Option<Box<dyn Any + Send>>,
    pub callbacks: Callbacks,
}

impl Default for Container {
    fn default() -> Self {
        Self {
            parent: None,
            children: Vec::new(),
            wanted: WantedBounds::default(),
            padding: Padding::default(),
            spacing: 0.0,
            align: Align::default(),
            justify: Justify::default(),
            layout: LayoutType::default(),
            scroll: None,
            real: Rect::ZERO,
            z_index: 0,
            exists: true,
            interactable: true,
            clip_children: false,
            auto_paint_children: true,
            obstruction: Obstruction::None,
            drag_end_is_click: false,
            drag_threshold: 0.0,
            active: false,
            state: State::default(),
            name: None,
            user_data: None,
            callbacks: Callbacks::default(),
        }
    }
}

impl Container {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn parent(&self) -> Option<ContainerId> {
        self.parent
    }

    pub fn children(&self) -> &[ContainerId] {
        &self.children
    }

    /// Default containment is the real rectangle; a hit-test callback overrides it.
    pub fn hit(&self, pt: Vec2) -> bool {
        match &self.callbacks.hit_test {
            Some(test) => test(self, pt),
            None => self.real.contains(pt),
        }
    }

    pub fn data<T: 'static>(&self) -> Option<&T> {
        self.user_data.as_ref()?.downcast_ref()
    }

    pub fn data_mut<T: 'static>(&mut self) -> Option<&mut T> {
        self.user_data.as_mut()?.downcast_mut()
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn layout(mut self, layout: LayoutType) -> Self {
        self.layout = layout;
        if layout == LayoutType::ScrollPane && self.scroll.is_none() {
            self.scroll = Some(Scroll::default());
        }
        self
    }

    pub fn size(mut self, w: impl Into<Size>, h: impl Into<Size>) -> Self {
        self.wanted.w = w.into();
        self.wanted.h = h.into();
        self
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.wanted.x = x;
        self.wanted.y = y;
        self
    }

    pub fn padding(mut self, padding: Padding) -> Self {
        self.padding = padding;
        self
    }

    pub fn spacing(mut self, spacing: f32) -> Self {
        self.spacing = spacing;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn justify(mut self, justify: Justify) -> Self {
        self.justify = justify;
        self
    }

    pub fn z_index(mut self, z: i32) -> Self {
        self.z_index = z;
        self
    }

    pub fn interactable(mut self, interactable: bool) -> Self {
        self.interactable = interactable;
        self
    }

    pub fn clip(mut self) -> Self {
        self.clip_children = true;
        self
    }

    pub fn obstruction(mut self, obstruction: Obstruction) -> Self {
        self.obstruction = obstruction;
        self
    }

    pub fn drag_end_is_click(mut self) -> Self {
        self.drag_end_is_click = true;
        self
    }

    pub fn drag_threshold(mut self, px: f32) -> Self {
        self.drag_threshold = px;
        self
    }

    pub fn user_data<T: Any + Send>(mut self, data: T) -> Self {
        self.user_data = Some(Box::new(data));
        self
    }

    pub fn on_paint(mut self, f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static) -> Self {
        self.callbacks.paint = Some(Box::new(f));
        self
    }

    pub fn on_click(mut self, f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static) -> Self {
        self.callbacks.clicked = Some(Box::new(f));
        self
    }

    pub fn on_mouse_down(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId, Button) + Send + 'static,
    ) -> Self {
        self.callbacks.mouse_down = Some(Box::new(f));
        self
    }

    pub fn on_mouse_up(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId, Button) + Send + 'static,
    ) -> Self {
        self.callbacks.mouse_up = Some(Box::new(f));
        self
    }

    pub fn on_mouse_enter(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static,
    ) -> Self {
        self.callbacks.mouse_enter = Some(Box::new(f));
        self
    }

    pub fn on_mouse_leave(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static,
    ) -> Self {
        self.callbacks.mouse_leave = Some(Box::new(f));
        self
    }

    pub fn on_mouse_motion(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static,
    ) -> Self {
        self.callbacks.mouse_motion = Some(Box::new(f));
        self
    }

    pub fn on_drag_start(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static,
    ) -> Self {
        self.callbacks.drag_start = Some(Box::new(f));
        self
    }

    pub fn on_drag(mut self, f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static) -> Self {
        self.callbacks.drag = Some(Box::new(f));
        self
    }

    pub fn on_drag_end(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId) + Send + 'static,
    ) -> Self {
        self.callbacks.drag_end = Some(Box::new(f));
        self
    }

    pub fn on_scroll(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId, ScrollDelta) + Send + 'static,
    ) -> Self {
        self.callbacks.scroll = Some(Box::new(f));
        self
    }

    pub fn on_key_press(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId, &KeyEvent) + Send + 'static,
    ) -> Self {
        self.callbacks.key_press = Some(Box::new(f));
        self
    }

    pub fn on_key_release(
        mut self,
        f: impl FnMut(&mut Ctx<'_>, ContainerId, &KeyEvent) + Send + 'static,
    ) -> Self {
        self.callbacks.key_release = Some(Box::new(f));
        self
    }

    pub fn hit_test(mut self, f: impl Fn(&Container, Vec2) -> bool + Send + 'static) -> Self {
        self.callbacks.hit_test = Some(Box::new(f));
        self
    }

    pub fn before_layout(
        mut self,
        f: impl FnMut(&mut Tree, ContainerId, Rect) + Send + 'static,
    ) -> Self {
        self.callbacks.before_layout = Some(Box::new(f));
        self
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("name", &self.name)
            .field("layout", &self.layout)
            .field("wanted", &self.wanted)
            .field("real", &self.real)
            .field("z_index", &self.z_index)
            .field("exists", &self.exists)
            .field("state", &self.state)
            .field("children", &self.children.len())
            .finish_non_exhaustive()
    }
}

/// Runs the callback in `slot` of container `id`, if any.
///
/// The callback is taken out of the container for the duration of the call
/// so it can freely mutate the tree (including removing its own container),
/// then put back if its container still exists and nothing replaced it.
macro_rules! fire {
    ($client:expr, $services:expr, $id:expr, $slot:ident $(, $arg:expr)*) => {{
        let id = $id;
        let taken = $client
            .tree
            .get_mut(id)
            .and_then(|c| c.callbacks.$slot.take());
        if let Some(mut callback) = taken {
            {
                let mut ctx = $client.ctx($services);
                callback(&mut ctx, id $(, $arg)*);
            }
            if let Some(c) = $client.tree.get_mut(id) {
                if c.callbacks.$slot.is_none() {
                    c.callbacks.$slot = Some(callback);
                }
            }
            true
        } else {
            false
        }
    }};
}

pub(crate) use fire;
