use tiny_skia::Pixmap;

use crate::{
    Result,
    layout::Rect,
    windowing::{ClientConfig, Event, WindowId},
};

/// A connection to a display server.
///
/// The input loop blocks in [`Display::wait_for_event`] while the render
/// loop presents frames from another thread, so implementations must be
/// usable from both at once.
pub trait Display: Send + Sync {
    /// Size and position of the screen windows are placed on.
    fn screen(&self) -> Rect;

    fn create_window(&self, config: &ClientConfig) -> Result<WindowId>;
    fn map_window(&self, window: WindowId);
    fn destroy_window(&self, window: WindowId);
    fn set_title(&self, window: WindowId, title: &str);

    /// Copies a finished frame onto the window.
    fn present(&self, window: WindowId, frame: &Pixmap);

    /// Blocks until the next event. `Ok(None)` means something arrived that
    /// isn't for us (or a [`Display::wake`]), `Err` that the connection is gone.
    fn wait_for_event(&self) -> Result<Option<Event>>;

    /// Unblocks a pending [`Display::wait_for_event`].
    fn wake(&self);

    fn flush(&self);
}
