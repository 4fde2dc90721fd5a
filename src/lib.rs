pub mod animation;
pub mod app;
pub mod debug;
pub mod layout;
pub mod reactor;
pub mod renderer;
pub mod style;
pub mod task;
pub mod timeout;
pub mod widgets;
pub mod windowing;

pub use animation::{AnimatedValue, Tween};
pub use app::{App, AppConfig, AppState, HandlerId, HandlerTarget};
pub use layout::{Container, ContainerId, Rect, Tree};
pub use renderer::Canvas;
pub use style::{Align, Justify, LayoutType, Obstruction, Padding, Size};
pub use task::{CancelToken, TaskContext};
pub use timeout::TimeoutId;
pub use widgets::{ScrollPane, ScrollPaneIds};
pub use windowing::{
    Button, Client, ClientConfig, ClientId, Ctx, Display, Event, EventKind, Headless, KeyEvent,
    WindowId,
};

pub use glam::{Vec2, Vec4, vec2, vec4};

pub type Result<T> = anyhow::Result<T>;

pub fn init_logging() {
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .try_init();
}
