//! egui side of the video seam

use eframe::egui::{self, Color32, ColorImage, TextureHandle, TextureOptions};
use parking_lot::Mutex;
use rh_integration::{FrameView, TextureTarget};
use std::sync::Arc;

/// Texture handle shared between the sink (writer) and the UI (reader)
#[derive(Clone, Default)]
pub struct SharedTexture(Arc<Mutex<Option<TextureHandle>>>);

impl SharedTexture {
    /// Id and pixel size of the current texture, once the core has drawn
    pub fn get(&self) -> Option<(egui::TextureId, egui::Vec2)> {
        self.0.lock().as_ref().map(|t| (t.id(), t.size_vec2()))
    }
}

/// [`TextureTarget`] backed by an egui managed texture
pub struct EguiTexture {
    ctx: egui::Context,
    shared: SharedTexture,
}

impl EguiTexture {
    pub fn new(ctx: egui::Context, shared: SharedTexture) -> Self {
        Self { ctx, shared }
    }
}

impl TextureTarget for EguiTexture {
    fn allocate(&mut self, width: u32, height: u32) {
        let blank = ColorImage::new([width as usize, height as usize], Color32::BLACK);
        let handle = self
            .ctx
            .load_texture("core-frame", blank, TextureOptions::NEAREST);
        *self.shared.0.lock() = Some(handle);
    }

    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]) {
        let image = ColorImage::from_rgba_unmultiplied([width as usize, height as usize], rgba);
        if let Some(handle) = self.shared.0.lock().as_mut() {
            handle.set(image, TextureOptions::NEAREST);
        }
    }
}

/// Asks egui for a repaint whenever the core presents
pub struct RepaintView {
    ctx: egui::Context,
}

impl RepaintView {
    pub fn new(ctx: egui::Context) -> Self {
        Self { ctx }
    }
}

impl FrameView for RepaintView {
    fn request_redraw(&self) {
        self.ctx.request_repaint();
    }
}
