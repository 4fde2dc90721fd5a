use glam::Vec2;
use tiny_skia::Pixmap;

use super::Canvas;

fn pixels(size: Vec2) -> (u32, u32) {
    (size.x.round().max(1.0) as u32, size.y.round().max(1.0) as u32)
}

/// A client's double buffer: callbacks draw into `back`, finished frames
/// are copied to `front` and presented from there.
pub struct Surfaces {
    front: Pixmap,
    back: Canvas,
}

impl Surfaces {
    pub fn new(size: Vec2) -> Option<Self> {
        let (w, h) = pixels(size);
        Some(Self {
            front: Pixmap::new(w, h)?,
            back: Canvas::new(w, h)?,
        })
    }

    pub fn front(&self) -> &Pixmap {
        &self.front
    }

    pub fn back(&self) -> &Canvas {
        &self.back
    }

    pub fn back_mut(&mut self) -> &mut Canvas {
        &mut self.back
    }

    /// Reallocates both buffers. Keeps the old ones if the new size can't
    /// be allocated.
    pub fn resize(&mut self, size: Vec2) {
        let (w, h) = pixels(size);
        if self.front.width() == w && self.front.height() == h {
            return;
        }
        match (Pixmap::new(w, h), Canvas::new(w, h)) {
            (Some(front), Some(back)) => {
                self.front = front;
                self.back = back;
            }
            _ => log::warn!("cannot allocate {w}x{h} surfaces, keeping the old ones"),
        }
    }

    /// Replaces the front buffer with the back buffer, alpha included.
    pub fn blit(&mut self) {
        let src = self.back.pixmap().data();
        let dst = self.front.data_mut();
        if src.len() == dst.len() {
            dst.copy_from_slice(src);
        }
    }
}
