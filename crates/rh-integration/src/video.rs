//! Video frame hand-off
//!
//! The core pushes a framebuffer from inside `retro_run`. The sink converts
//! it to RGBA8 into its texture target and asks every live view to redraw.

use libc::{c_uint, c_void, size_t};
use parking_lot::Mutex;
use rh_core::error::VideoError;
use rh_ffi::PixelFormat;
use std::sync::{Arc, Weak};

/// The texture a sink uploads into
pub trait TextureTarget: Send {
    /// (Re)create storage for a `width` x `height` RGBA8 image
    fn allocate(&mut self, width: u32, height: u32);

    /// Replace the whole image. `rgba` holds `width * height * 4` bytes.
    fn upload(&mut self, width: u32, height: u32, rgba: &[u8]);
}

/// Something that displays the texture.
///
/// `request_redraw` is called from the emulation thread and must only
/// schedule the redraw on the view's own thread.
pub trait FrameView: Send + Sync {
    fn request_redraw(&self);
}

/// Last uploaded image, kept in memory
#[derive(Debug, Default, Clone)]
pub struct CpuFrame {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
    pub allocations: u64,
    pub uploads: u64,
}

impl CpuFrame {
    /// RGBA of the pixel at `(x, y)`
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        let i = ((y * self.width + x) * 4) as usize;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }
}

/// In-memory texture target for headless runs and tests.
///
/// Clones share the same frame.
#[derive(Debug, Default, Clone)]
pub struct CpuTexture {
    frame: Arc<Mutex<CpuFrame>>,
}

impl CpuTexture {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current frame
    pub fn snapshot(&self) -> CpuFrame {
        self.frame.lock().clone()
    }
}

impl TextureTarget for CpuTexture {
    fn allocate(&mut self, width: u32, height: u32) {
        let mut frame = self.frame.lock();
        frame.width = width;
        frame.height = height;
        frame.pixels = vec![0; width as usize * height as usize * 4];
        frame.allocations += 1;
    }

    fn upload(&mut self, _width: u32, _height: u32, rgba: &[u8]) {
        let mut frame = self.frame.lock();
        frame.pixels.copy_from_slice(rgba);
        frame.uploads += 1;
    }
}

/// Receives frames from the core and republishes them as a texture
pub struct VideoSink {
    format: PixelFormat,
    target: Box<dyn TextureTarget>,
    views: Vec<Weak<dyn FrameView>>,
    size: Option<(u32, u32)>,
    rgba: Vec<u8>,
    frames: u64,
    dupes: u64,
}

impl VideoSink {
    pub fn new(target: Box<dyn TextureTarget>) -> Self {
        Self {
            format: PixelFormat::Rgb1555,
            target,
            views: Vec::new(),
            size: None,
            rgba: Vec::new(),
            frames: 0,
            dupes: 0,
        }
    }

    pub fn pixel_format(&self) -> PixelFormat {
        self.format
    }

    /// Format of incoming frames, as negotiated with the core
    pub fn set_pixel_format(&mut self, format: PixelFormat) {
        self.format = format;
    }

    /// Back to the libretro default format with no texture allocated.
    /// Registered views are kept.
    pub fn reset(&mut self) {
        self.format = PixelFormat::Rgb1555;
        self.size = None;
        self.rgba.clear();
        self.frames = 0;
        self.dupes = 0;
    }

    /// Register a view. Views that have been dropped are pruned here.
    pub fn add_view(&mut self, view: &Arc<dyn FrameView>) {
        self.views.retain(|v| v.strong_count() > 0);
        self.views.push(Arc::downgrade(view));
    }

    /// Live registered views
    pub fn view_count(&self) -> usize {
        self.views.iter().filter(|v| v.strong_count() > 0).count()
    }

    /// Current texture size
    pub fn size(&self) -> Option<(u32, u32)> {
        self.size
    }

    /// `(presented, duplicated)` frame counters
    pub fn frame_counts(&self) -> (u64, u64) {
        (self.frames, self.dupes)
    }

    /// Present a frame. `None` repeats the previous frame.
    ///
    /// `stride` is the byte distance between rows and may exceed
    /// `width * bytes_per_pixel`.
    pub fn present(
        &mut self,
        data: Option<&[u8]>,
        width: u32,
        height: u32,
        stride: usize,
    ) -> Result<(), VideoError> {
        let Some(data) = data else {
            self.dupes += 1;
            self.redraw();
            return Ok(());
        };
        if width == 0 || height == 0 {
            return Ok(());
        }

        let bpp = self.format.bytes_per_pixel();
        let row_bytes = width as usize * bpp;
        let needed = (height as usize - 1) * stride + row_bytes;
        if stride < row_bytes || data.len() < needed {
            return Err(VideoError::FrameTooSmall {
                height,
                stride,
                len: data.len(),
            });
        }

        if self.size != Some((width, height)) {
            tracing::debug!("Video texture resized to {}x{}", width, height);
            self.target.allocate(width, height);
            self.size = Some((width, height));
        }

        self.rgba.resize(width as usize * height as usize * 4, 0);
        let out_row = width as usize * 4;
        for (y, out) in self.rgba.chunks_exact_mut(out_row).enumerate() {
            let row = &data[y * stride..y * stride + row_bytes];
            convert_row(self.format, row, out);
        }
        self.target.upload(width, height, &self.rgba);

        self.frames += 1;
        self.redraw();
        Ok(())
    }

    /// Present a frame straight from the video refresh callback.
    ///
    /// # Safety
    /// `data` must be null or point to `height` rows of `pitch` bytes.
    pub unsafe fn present_raw(
        &mut self,
        data: *const c_void,
        width: c_uint,
        height: c_uint,
        pitch: size_t,
    ) -> Result<(), VideoError> {
        if data.is_null() {
            return self.present(None, width, height, pitch);
        }
        if height == 0 {
            return Ok(());
        }
        let row_bytes = width as usize * self.format.bytes_per_pixel();
        if pitch < row_bytes {
            return Err(VideoError::FrameTooSmall {
                height,
                stride: pitch,
                len: 0,
            });
        }
        let len = (height as usize - 1) * pitch + row_bytes;
        let frame = std::slice::from_raw_parts(data.cast::<u8>(), len);
        self.present(Some(frame), width, height, pitch)
    }

    fn redraw(&self) {
        for view in self.views.iter().filter_map(Weak::upgrade) {
            view.request_redraw();
        }
    }
}

fn convert_row(format: PixelFormat, src: &[u8], out: &mut [u8]) {
    match format {
        PixelFormat::Rgb565 => {
            for (px, dst) in src.chunks_exact(2).zip(out.chunks_exact_mut(4)) {
                let p = u16::from_ne_bytes([px[0], px[1]]);
                let r = ((p >> 11) & 0x1f) as u8;
                let g = ((p >> 5) & 0x3f) as u8;
                let b = (p & 0x1f) as u8;
                dst.copy_from_slice(&[expand5(r), (g << 2) | (g >> 4), expand5(b), 0xff]);
            }
        }
        PixelFormat::Rgb1555 => {
            for (px, dst) in src.chunks_exact(2).zip(out.chunks_exact_mut(4)) {
                let p = u16::from_ne_bytes([px[0], px[1]]);
                let r = ((p >> 10) & 0x1f) as u8;
                let g = ((p >> 5) & 0x1f) as u8;
                let b = (p & 0x1f) as u8;
                dst.copy_from_slice(&[expand5(r), expand5(g), expand5(b), 0xff]);
            }
        }
        PixelFormat::Xrgb8888 => {
            for (px, dst) in src.chunks_exact(4).zip(out.chunks_exact_mut(4)) {
                let p = u32::from_ne_bytes([px[0], px[1], px[2], px[3]]);
                dst.copy_from_slice(&[(p >> 16) as u8, (p >> 8) as u8, p as u8, 0xff]);
            }
        }
    }
}

#[inline]
fn expand5(v: u8) -> u8 {
    (v << 3) | (v >> 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingView(AtomicUsize);

    impl FrameView for CountingView {
        fn request_redraw(&self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn rgb565_frame(width: usize, height: usize, stride: usize, pixel: u16) -> Vec<u8> {
        let mut data = vec![0xAAu8; stride * height];
        for y in 0..height {
            for x in 0..width {
                let i = y * stride + x * 2;
                data[i..i + 2].copy_from_slice(&pixel.to_ne_bytes());
            }
        }
        data
    }

    fn sink() -> (VideoSink, CpuTexture) {
        let texture = CpuTexture::new();
        let mut sink = VideoSink::new(Box::new(texture.clone()));
        sink.set_pixel_format(PixelFormat::Rgb565);
        (sink, texture)
    }

    #[test]
    fn test_reallocates_only_on_size_change() {
        let (mut sink, texture) = sink();
        let frame = rgb565_frame(4, 2, 8, 0xffff);

        sink.present(Some(&frame), 4, 2, 8).unwrap();
        sink.present(Some(&frame), 4, 2, 8).unwrap();
        assert_eq!(texture.snapshot().allocations, 1);
        assert_eq!(texture.snapshot().uploads, 2);

        let bigger = rgb565_frame(8, 4, 16, 0);
        sink.present(Some(&bigger), 8, 4, 16).unwrap();
        let snap = texture.snapshot();
        assert_eq!(snap.allocations, 2);
        assert_eq!((snap.width, snap.height), (8, 4));
        assert_eq!(sink.size(), Some((8, 4)));
    }

    #[test]
    fn test_reset_forces_reallocation() {
        let (mut sink, texture) = sink();
        let frame = rgb565_frame(4, 2, 8, 0xffff);
        sink.present(Some(&frame), 4, 2, 8).unwrap();

        sink.reset();
        assert_eq!(sink.pixel_format(), PixelFormat::Rgb1555);
        assert_eq!(sink.size(), None);
        assert_eq!(sink.frame_counts(), (0, 0));

        sink.present(Some(&frame), 4, 2, 8).unwrap();
        assert_eq!(texture.snapshot().allocations, 2);
    }

    #[test]
    fn test_stride_is_authoritative() {
        let (mut sink, texture) = sink();
        // 2 px wide, stride padded to 8 bytes with 0xAA garbage
        let frame = rgb565_frame(2, 3, 8, 0xf800);
        sink.present(Some(&frame), 2, 3, 8).unwrap();

        let snap = texture.snapshot();
        assert_eq!(snap.pixels.len(), 2 * 3 * 4);
        for y in 0..3 {
            for x in 0..2 {
                assert_eq!(snap.pixel(x, y), [0xff, 0, 0, 0xff]);
            }
        }
    }

    #[test]
    fn test_xrgb8888_conversion() {
        let texture = CpuTexture::new();
        let mut sink = VideoSink::new(Box::new(texture.clone()));
        sink.set_pixel_format(PixelFormat::Xrgb8888);

        let frame = 0x0012_3456u32.to_ne_bytes();
        sink.present(Some(&frame), 1, 1, 4).unwrap();
        assert_eq!(texture.snapshot().pixel(0, 0), [0x12, 0x34, 0x56, 0xff]);
    }

    #[test]
    fn test_rgb565_channel_expansion() {
        let mut out = [0u8; 4];
        convert_row(PixelFormat::Rgb565, &0x07e0u16.to_ne_bytes(), &mut out);
        assert_eq!(out, [0, 0xff, 0, 0xff]);
        convert_row(PixelFormat::Rgb565, &0x001fu16.to_ne_bytes(), &mut out);
        assert_eq!(out, [0, 0, 0xff, 0xff]);
    }

    #[test]
    fn test_fan_out_and_dupes() {
        let (mut sink, texture) = sink();
        let main: Arc<CountingView> = Arc::new(CountingView::default());
        let glow: Arc<CountingView> = Arc::new(CountingView::default());
        let main_dyn: Arc<dyn FrameView> = main.clone();
        let glow_dyn: Arc<dyn FrameView> = glow.clone();
        sink.add_view(&main_dyn);
        sink.add_view(&glow_dyn);

        let frame = rgb565_frame(2, 2, 4, 0);
        sink.present(Some(&frame), 2, 2, 4).unwrap();
        sink.present(None, 2, 2, 4).unwrap();

        assert_eq!(main.0.load(Ordering::SeqCst), 2);
        assert_eq!(glow.0.load(Ordering::SeqCst), 2);
        assert_eq!(texture.snapshot().uploads, 1, "one upload shared by all views");
        assert_eq!(sink.frame_counts(), (1, 1));
    }

    #[test]
    fn test_dropped_views_pruned() {
        let (mut sink, _texture) = sink();
        let keep: Arc<dyn FrameView> = Arc::new(CountingView::default());
        {
            let gone: Arc<dyn FrameView> = Arc::new(CountingView::default());
            sink.add_view(&gone);
            assert_eq!(sink.view_count(), 1);
        }
        sink.add_view(&keep);
        assert_eq!(sink.view_count(), 1);
        assert_eq!(sink.views.len(), 1);
    }

    #[test]
    fn test_short_buffer_rejected() {
        let (mut sink, texture) = sink();
        let frame = vec![0u8; 10];
        let err = sink.present(Some(&frame), 4, 2, 8).unwrap_err();
        assert!(matches!(err, VideoError::FrameTooSmall { .. }));
        assert_eq!(texture.snapshot().uploads, 0);
    }

    #[test]
    fn test_present_raw_null_is_dupe() {
        let (mut sink, _texture) = sink();
        unsafe { sink.present_raw(std::ptr::null(), 320, 240, 640) }.unwrap();
        assert_eq!(sink.frame_counts(), (0, 1));
    }
}
