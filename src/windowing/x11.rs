use std::collections::HashMap;

use anyhow::Context;
use glam::{Vec2, vec2};
use log::{debug, info, warn};
use parking_lot::Mutex;
use tiny_skia::Pixmap;
use x11rb::{
    connection::{Connection, RequestConnection},
    protocol::{
        Event as XEvent,
        xproto::{
            AtomEnum, ClientMessageEvent, ColormapAlloc, ConnectionExt as _, CreateGCAux,
            CreateWindowAux, EventMask, ImageFormat, KeyButMask, NotifyMode, PropMode, Screen,
            VisualClass, Visualid, WindowClass,
        },
    },
    rust_connection::RustConnection,
    wrapper::ConnectionExt as _,
};

use crate::{
    Result,
    layout::Rect,
    windowing::{
        Button, ClientConfig, Display, Event, EventKind, KeyEvent, Modifiers, WindowId, WindowKind,
    },
};

x11rb::atom_manager! {
    pub Atoms: AtomsCookie {
        WM_PROTOCOLS,
        WM_DELETE_WINDOW,
        UTF8_STRING,
        _NET_WM_NAME,
        _NET_WM_WINDOW_TYPE,
        _NET_WM_WINDOW_TYPE_NORMAL,
        _NET_WM_WINDOW_TYPE_DOCK,
        _NET_WM_WINDOW_TYPE_POPUP_MENU,
        _NET_WM_STATE,
        _NET_WM_STATE_STICKY,
        _NET_WM_STATE_SKIP_TASKBAR,
        _NET_WM_STATE_ABOVE,
        _MOTIF_WM_HINTS,
        _HEARTH_WAKE,
    }
}

fn event_mask() -> EventMask {
    EventMask::EXPOSURE
        | EventMask::STRUCTURE_NOTIFY
        | EventMask::POINTER_MOTION
        | EventMask::BUTTON_PRESS
        | EventMask::BUTTON_RELEASE
        | EventMask::ENTER_WINDOW
        | EventMask::LEAVE_WINDOW
        | EventMask::KEY_PRESS
        | EventMask::KEY_RELEASE
        | EventMask::FOCUS_CHANGE
}

struct NativeWindow {
    gc: u32,
    depth: u8,
    colormap: Option<u32>,
}

struct Keymap {
    min_keycode: u8,
    per_keycode: usize,
    keysyms: Vec<u32>,
}

impl Keymap {
    fn load(conn: &RustConnection) -> Result<Self> {
        let setup = conn.setup();
        let (min, max) = (setup.min_keycode, setup.max_keycode);
        let reply = conn
            .get_keyboard_mapping(min, max - min + 1)?
            .reply()
            .context("failed to read keyboard mapping")?;
        Ok(Self {
            min_keycode: min,
            per_keycode: reply.keysyms_per_keycode as usize,
            keysyms: reply.keysyms,
        })
    }

    fn lookup(&self, keycode: u8, shift: bool) -> u32 {
        if keycode < self.min_keycode || self.per_keycode == 0 {
            return 0;
        }
        let base = (keycode - self.min_keycode) as usize * self.per_keycode;
        let column = |c: usize| self.keysyms.get(base + c).copied().unwrap_or(0);
        match (shift, column(1)) {
            (true, sym) if sym != 0 => sym,
            _ => column(0),
        }
    }
}

/// Printable text for a keysym, if it has any.
fn keysym_text(sym: u32) -> Option<char> {
    match sym {
        0x20..=0x7e | 0xa0..=0xff => char::from_u32(sym),
        0xff0d => Some('\n'),
        0xff09 => Some('\t'),
        0x0100_0000..=0x0110_ffff => char::from_u32(sym - 0x0100_0000),
        _ => None,
    }
}

fn modifiers(state: KeyButMask) -> Modifiers {
    let bits = u16::from(state);
    let has = |m: KeyButMask| bits & u16::from(m) != 0;
    Modifiers {
        shift: has(KeyButMask::SHIFT),
        control: has(KeyButMask::CONTROL),
        alt: has(KeyButMask::MOD1),
        logo: has(KeyButMask::MOD4),
    }
}

fn argb_visual(screen: &Screen) -> Option<Visualid> {
    screen
        .allowed_depths
        .iter()
        .filter(|d| d.depth == 32)
        .flat_map(|d| d.visuals.iter())
        .find(|v| v.class == VisualClass::TRUE_COLOR)
        .map(|v| v.visual_id)
}

/// X11 through x11rb's pure-Rust connection.
pub struct X11Display {
    conn: RustConnection,
    screen_num: usize,
    atoms: Atoms,
    keymap: Keymap,
    /// Input-only window that [`Display::wake`] sends messages to.
    wake_window: u32,
    windows: Mutex<HashMap<u32, NativeWindow>>,
}

impl X11Display {
    pub fn connect(name: Option<&str>) -> Result<Self> {
        let (conn, screen_num) = x11rb::connect(name).context("cannot open X display")?;
        let atoms = Atoms::new(&conn)?.reply().context("failed to intern atoms")?;
        let keymap = Keymap::load(&conn)?;

        let root = conn.setup().roots[screen_num].root;
        let wake_window = conn.generate_id()?;
        conn.create_window(
            x11rb::COPY_DEPTH_FROM_PARENT,
            wake_window,
            root,
            -1,
            -1,
            1,
            1,
            0,
            WindowClass::INPUT_ONLY,
            x11rb::COPY_FROM_PARENT,
            &CreateWindowAux::new(),
        )?;
        conn.flush()?;

        let screen = &conn.setup().roots[screen_num];
        info!(
            "connected to X screen {screen_num} ({}x{})",
            screen.width_in_pixels, screen.height_in_pixels
        );
        Ok(Self {
            conn,
            screen_num,
            atoms,
            keymap,
            wake_window,
            windows: Mutex::new(HashMap::new()),
        })
    }

    fn screen_info(&self) -> &Screen {
        &self.conn.setup().roots[self.screen_num]
    }

    fn set_properties(&self, window: u32, config: &ClientConfig) -> Result<()> {
        let atoms = &self.atoms;
        self.write_title(window, &config.title)?;
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms.WM_PROTOCOLS,
            AtomEnum::ATOM,
            &[atoms.WM_DELETE_WINDOW],
        )?;

        let kind = match config.kind {
            WindowKind::Normal => atoms._NET_WM_WINDOW_TYPE_NORMAL,
            WindowKind::Dock => atoms._NET_WM_WINDOW_TYPE_DOCK,
            WindowKind::Popup => atoms._NET_WM_WINDOW_TYPE_POPUP_MENU,
        };
        self.conn.change_property32(
            PropMode::REPLACE,
            window,
            atoms._NET_WM_WINDOW_TYPE,
            AtomEnum::ATOM,
            &[kind],
        )?;

        let states: Vec<u32> = [
            (config.sticky, atoms._NET_WM_STATE_STICKY),
            (config.skip_taskbar, atoms._NET_WM_STATE_SKIP_TASKBAR),
            (config.above, atoms._NET_WM_STATE_ABOVE),
        ]
        .into_iter()
        .filter_map(|(on, atom)| on.then_some(atom))
        .collect();
        if !states.is_empty() {
            self.conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms._NET_WM_STATE,
                AtomEnum::ATOM,
                &states,
            )?;
        }

        if !config.decorations {
            // flags = decorations, decorations = none
            self.conn.change_property32(
                PropMode::REPLACE,
                window,
                atoms._MOTIF_WM_HINTS,
                atoms._MOTIF_WM_HINTS,
                &[2, 0, 0, 0, 0],
            )?;
        }
        Ok(())
    }

    fn write_title(&self, window: u32, title: &str) -> Result<()> {
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            self.atoms._NET_WM_NAME,
            self.atoms.UTF8_STRING,
            title.as_bytes(),
        )?;
        self.conn.change_property8(
            PropMode::REPLACE,
            window,
            AtomEnum::WM_NAME,
            AtomEnum::STRING,
            title.as_bytes(),
        )?;
        Ok(())
    }

    fn key_event(&self, keycode: u8, state: KeyButMask) -> KeyEvent {
        let modifiers = modifiers(state);
        let keysym = self.keymap.lookup(keycode, modifiers.shift);
        KeyEvent {
            keycode,
            keysym,
            text: keysym_text(keysym),
            modifiers,
        }
    }

    fn translate(&self, event: XEvent) -> Option<Event> {
        let pos = |x: i16, y: i16| vec2(x as f32, y as f32);
        let (window, kind) = match event {
            XEvent::Expose(e) if e.count == 0 => (e.window, EventKind::Expose),
            XEvent::ConfigureNotify(e) => (
                e.window,
                EventKind::Configure {
                    bounds: Rect::from_xywh(e.x as f32, e.y as f32, e.width as f32, e.height as f32),
                },
            ),
            XEvent::MotionNotify(e) => (
                e.event,
                EventKind::PointerMove {
                    pos: pos(e.event_x, e.event_y),
                },
            ),
            XEvent::ButtonPress(e) => (
                e.event,
                EventKind::PointerDown {
                    button: Button::from_detail(e.detail),
                    pos: pos(e.event_x, e.event_y),
                },
            ),
            XEvent::ButtonRelease(e) => (
                e.event,
                EventKind::PointerUp {
                    button: Button::from_detail(e.detail),
                    pos: pos(e.event_x, e.event_y),
                },
            ),
            XEvent::EnterNotify(e) => (
                e.event,
                EventKind::PointerEnter {
                    pos: pos(e.event_x, e.event_y),
                    normal: e.mode == NotifyMode::NORMAL,
                },
            ),
            XEvent::LeaveNotify(e) => (
                e.event,
                EventKind::PointerLeave {
                    normal: e.mode == NotifyMode::NORMAL,
                },
            ),
            XEvent::KeyPress(e) => (e.event, EventKind::KeyDown(self.key_event(e.detail, e.state))),
            XEvent::KeyRelease(e) => (e.event, EventKind::KeyUp(self.key_event(e.detail, e.state))),
            XEvent::FocusIn(e) => (e.event, EventKind::FocusIn),
            XEvent::FocusOut(e) => (e.event, EventKind::FocusOut),
            XEvent::ClientMessage(e) => {
                if e.window == self.wake_window {
                    return None;
                }
                if e.format == 32 && e.data.as_data32()[0] == self.atoms.WM_DELETE_WINDOW {
                    (e.window, EventKind::CloseRequested)
                } else {
                    return None;
                }
            }
            XEvent::Error(e) => {
                warn!("X error: {e:?}");
                return None;
            }
            _ => return None,
        };
        Some(Event {
            window: WindowId(window),
            kind,
        })
    }
}

impl Display for X11Display {
    fn screen(&self) -> Rect {
        let screen = self.screen_info();
        Rect::new(
            Vec2::ZERO,
            vec2(screen.width_in_pixels as f32, screen.height_in_pixels as f32),
        )
    }

    fn create_window(&self, config: &ClientConfig) -> Result<WindowId> {
        let screen = self.screen_info();
        let window = self.conn.generate_id()?;
        let mut aux = CreateWindowAux::new()
            .event_mask(event_mask())
            .border_pixel(0)
            .override_redirect(u32::from(config.override_redirect));

        let argb = config.transparent.then(|| argb_visual(screen)).flatten();
        let (depth, visual, colormap) = match argb {
            Some(visual) => {
                let colormap = self.conn.generate_id()?;
                self.conn
                    .create_colormap(ColormapAlloc::NONE, colormap, screen.root, visual)?;
                aux = aux.background_pixel(0).colormap(colormap);
                (32, visual, Some(colormap))
            }
            None => {
                if config.transparent {
                    warn!("no 32-bit visual, {:?} will be opaque", config.title);
                }
                aux = aux.background_pixel(screen.black_pixel);
                (screen.root_depth, screen.root_visual, None)
            }
        };

        self.conn.create_window(
            depth,
            window,
            screen.root,
            config.position.x as i16,
            config.position.y as i16,
            config.size.x.max(1.0) as u16,
            config.size.y.max(1.0) as u16,
            0,
            WindowClass::INPUT_OUTPUT,
            visual,
            &aux,
        )?;
        let gc = self.conn.generate_id()?;
        self.conn.create_gc(gc, window, &CreateGCAux::new())?;

        if let Err(err) = self.set_properties(window, config) {
            warn!("could not set all properties of window {window}: {err:#}");
        }
        self.conn.flush()?;

        self.windows.lock().insert(
            window,
            NativeWindow {
                gc,
                depth,
                colormap,
            },
        );
        debug!("window {window} depth {depth}");
        Ok(WindowId(window))
    }

    fn map_window(&self, window: WindowId) {
        if let Err(err) = self.conn.map_window(window.0) {
            warn!("map_window({window:?}) failed: {err}");
        }
        self.flush();
    }

    fn destroy_window(&self, window: WindowId) {
        let Some(native) = self.windows.lock().remove(&window.0) else {
            return;
        };
        let _ = self.conn.free_gc(native.gc);
        let _ = self.conn.destroy_window(window.0);
        if let Some(colormap) = native.colormap {
            let _ = self.conn.free_colormap(colormap);
        }
    }

    fn set_title(&self, window: WindowId, title: &str) {
        if let Err(err) = self.write_title(window.0, title) {
            warn!("set_title({window:?}) failed: {err:#}");
        }
    }

    fn present(&self, window: WindowId, frame: &Pixmap) {
        let windows = self.windows.lock();
        let Some(native) = windows.get(&window.0) else {
            return;
        };

        let data = to_bgra(frame.data());
        let width = frame.width() as u16;
        let stride = width as usize * 4;
        let Some(rows) = rows_per_request(self.conn.maximum_request_bytes(), stride) else {
            return;
        };

        for (i, chunk) in data.chunks(rows * stride).enumerate() {
            let result = self.conn.put_image(
                ImageFormat::Z_PIXMAP,
                window.0,
                native.gc,
                width,
                (chunk.len() / stride) as u16,
                0,
                (i * rows) as i16,
                0,
                native.depth,
                chunk,
            );
            if let Err(err) = result {
                warn!("put_image on {window:?} failed: {err}");
                return;
            }
        }
    }

    fn wait_for_event(&self) -> Result<Option<Event>> {
        let event = self.conn.wait_for_event()?;
        Ok(self.translate(event))
    }

    fn wake(&self) {
        let message = ClientMessageEvent::new(
            32,
            self.wake_window,
            self.atoms._HEARTH_WAKE,
            [0u32; 5],
        );
        if let Err(err) =
            self.conn
                .send_event(false, self.wake_window, EventMask::NO_EVENT, message)
        {
            warn!("failed to wake input loop: {err}");
        }
        self.flush();
    }

    fn flush(&self) {
        if let Err(err) = self.conn.flush() {
            warn!("flush failed: {err}");
        }
    }
}

/// tiny-skia is premultiplied RGBA, ZPixmap on little endian is BGRA.
fn to_bgra(rgba: &[u8]) -> Vec<u8> {
    let mut data = Vec::with_capacity(rgba.len());
    for px in bytemuck::cast_slice::<u8, [u8; 4]>(rgba) {
        data.extend_from_slice(&[px[2], px[1], px[0], px[3]]);
    }
    data
}

/// How many image rows fit in one `PutImage` request, leaving room for the
/// request header. At least one, `None` for an empty row.
fn rows_per_request(max_request_bytes: usize, stride: usize) -> Option<usize> {
    if stride == 0 {
        return None;
    }
    let budget = max_request_bytes.saturating_sub(64);
    Some((budget / stride).max(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keysyms_map_to_text() {
        assert_eq!(keysym_text(0x61), Some('a'));
        assert_eq!(keysym_text(0xe9), Some('é'));
        assert_eq!(keysym_text(0x0100_20ac), Some('€'));
        assert_eq!(keysym_text(0xff0d), Some('\n'));
        // F1
        assert_eq!(keysym_text(0xffbe), None);
    }

    #[test]
    fn shift_picks_second_column_when_present() {
        let keymap = Keymap {
            min_keycode: 8,
            per_keycode: 2,
            keysyms: vec![0x61, 0x41, 0xff0d, 0],
        };
        assert_eq!(keymap.lookup(8, false), 0x61);
        assert_eq!(keymap.lookup(8, true), 0x41);
        assert_eq!(keymap.lookup(9, true), 0xff0d);
        assert_eq!(keymap.lookup(3, false), 0);
        assert_eq!(keymap.lookup(200, false), 0);
    }

    #[test]
    fn frames_are_split_by_the_request_limit() {
        // 100px wide rows are 400 bytes
        assert_eq!(rows_per_request(4096 + 64, 400), Some(10));
        assert_eq!(rows_per_request(100, 400), Some(1));
        assert_eq!(rows_per_request(4096, 0), None);
    }

    #[test]
    fn pixels_are_swizzled_to_bgra() {
        assert_eq!(to_bgra(&[1, 2, 3, 4, 5, 6, 7, 8]), vec![3, 2, 1, 4, 7, 6, 5, 8]);
    }
}
