use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicU32, Ordering},
        mpsc::{self, Receiver, Sender},
    },
};

use glam::Vec2;
use parking_lot::Mutex;
use tiny_skia::Pixmap;

use crate::{
    Result,
    layout::Rect,
    windowing::{ClientConfig, Display, Event, EventKind, WindowId},
};

#[derive(Debug, Default)]
struct Window {
    title: String,
    mapped: bool,
    frames: usize,
    last_frame: Option<Pixmap>,
}

struct Shared {
    screen: Rect,
    next_window: AtomicU32,
    windows: Mutex<HashMap<WindowId, Window>>,
    tx: Sender<Option<Event>>,
    rx: Mutex<Receiver<Option<Event>>>,
}

/// A display with no server behind it.
///
/// Events are pushed in by hand and presented frames are kept for
/// inspection. Clones share the same queue and windows.
#[derive(Clone)]
pub struct Headless {
    shared: Arc<Shared>,
}

impl Headless {
    pub fn new(width: f32, height: f32) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            shared: Arc::new(Shared {
                screen: Rect::new(Vec2::ZERO, Vec2::new(width, height)),
                next_window: AtomicU32::new(1),
                windows: Mutex::new(HashMap::new()),
                tx,
                rx: Mutex::new(rx),
            }),
        }
    }

    pub fn push(&self, window: WindowId, kind: EventKind) {
        let _ = self.shared.tx.send(Some(Event { window, kind }));
    }

    pub fn frames(&self, window: WindowId) -> usize {
        self.shared.windows.lock().get(&window).map_or(0, |w| w.frames)
    }

    pub fn last_frame(&self, window: WindowId) -> Option<Pixmap> {
        self.shared
            .windows
            .lock()
            .get(&window)
            .and_then(|w| w.last_frame.clone())
    }

    pub fn is_mapped(&self, window: WindowId) -> bool {
        self.shared.windows.lock().get(&window).is_some_and(|w| w.mapped)
    }

    pub fn title(&self, window: WindowId) -> Option<String> {
        self.shared.windows.lock().get(&window).map(|w| w.title.clone())
    }

    pub fn window_count(&self) -> usize {
        self.shared.windows.lock().len()
    }
}

impl Display for Headless {
    fn screen(&self) -> Rect {
        self.shared.screen
    }

    fn create_window(&self, config: &ClientConfig) -> Result<WindowId> {
        let id = WindowId(self.shared.next_window.fetch_add(1, Ordering::Relaxed));
        self.shared.windows.lock().insert(
            id,
            Window {
                title: config.title.clone(),
                ..Window::default()
            },
        );
        Ok(id)
    }

    fn map_window(&self, window: WindowId) {
        if let Some(w) = self.shared.windows.lock().get_mut(&window) {
            w.mapped = true;
        }
    }

    fn destroy_window(&self, window: WindowId) {
        self.shared.windows.lock().remove(&window);
    }

    fn set_title(&self, window: WindowId, title: &str) {
        if let Some(w) = self.shared.windows.lock().get_mut(&window) {
            w.title = title.to_string();
        }
    }

    fn present(&self, window: WindowId, frame: &Pixmap) {
        if let Some(w) = self.shared.windows.lock().get_mut(&window) {
            w.frames += 1;
            w.last_frame = Some(frame.clone());
        }
    }

    fn wait_for_event(&self) -> Result<Option<Event>> {
        let rx = self.shared.rx.lock();
        Ok(rx.recv()?)
    }

    fn wake(&self) {
        let _ = self.shared.tx.send(None);
    }

    fn flush(&self) {}
}
