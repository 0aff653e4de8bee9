//! Display sinks that receive rendered frames.
//!
//! A sink is handed a float image once per displayed frame and must be done
//! with it when `present` returns, because the caller reuses the buffer on
//! the next step.

use crate::buffer::FieldBuffer;
use crate::error::{Result, SimError};
use crate::render::rescale_to_rgb;

/// Receives one rendered float frame at a time.
pub trait DisplaySink {
    /// Show `frame`. Synchronous.
    fn present(&mut self, frame: &FieldBuffer);

    /// Number of frames presented so far.
    fn frames_presented(&self) -> u64;
}

/// Discards frames, only counting them.
#[derive(Debug, Default)]
pub struct NullSink {
    frames: u64,
}

impl NullSink {
    /// Create a new sink.
    pub fn new() -> Self {
        Self::default()
    }
}

impl DisplaySink for NullSink {
    fn present(&mut self, _frame: &FieldBuffer) {
        self.frames += 1;
    }

    fn frames_presented(&self) -> u64 {
        self.frames
    }
}

/// Color range used when converting frames to pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ColorRange {
    /// Scan every frame for its own minimum and maximum.
    #[default]
    Auto,
    /// Map this fixed range onto black..white.
    Fixed(f32, f32),
}

impl ColorRange {
    fn as_option(self) -> Option<(f32, f32)> {
        match self {
            ColorRange::Auto => None,
            ColorRange::Fixed(lo, hi) => Some((lo, hi)),
        }
    }
}

/// An in-memory `0x00RRGGBB` pixel surface, standing in for a window.
#[derive(Debug)]
pub struct Framebuffer {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
    range: ColorRange,
    frames: u64,
}

impl Framebuffer {
    /// Create a surface of the given size.
    ///
    /// Fails with [`SimError::DisplayInit`] for a zero-sized surface.
    pub fn new(width: usize, height: usize) -> Result<Self> {
        if width == 0 || height == 0 {
            return Err(SimError::display_init(format!(
                "cannot create a {width}x{height} surface"
            )));
        }
        Ok(Self {
            width,
            height,
            pixels: vec![0; width * height],
            range: ColorRange::Auto,
            frames: 0,
        })
    }

    /// Use a fixed color range instead of per-frame auto ranging.
    pub fn with_range(mut self, range: ColorRange) -> Self {
        self.range = range;
        self
    }

    /// Surface width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Surface height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The most recently presented pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at (x, y).
    pub fn pixel(&self, x: usize, y: usize) -> u32 {
        self.pixels[y * self.width + x]
    }

    /// Order-dependent checksum of the current pixels.
    pub fn checksum(&self) -> u64 {
        self.pixels.iter().fold(0xcbf2_9ce4_8422_2325u64, |hash, &p| {
            (hash ^ u64::from(p)).wrapping_mul(0x0100_0000_01b3)
        })
    }
}

impl DisplaySink for Framebuffer {
    fn present(&mut self, frame: &FieldBuffer) {
        assert!(
            frame.width() == self.width && frame.height() == self.height,
            "frame {}x{} does not match {}x{} surface",
            frame.width(),
            frame.height(),
            self.width,
            self.height
        );
        rescale_to_rgb(frame, self.range.as_option(), &mut self.pixels);
        self.frames += 1;
        tracing::trace!(frame = self.frames, checksum = self.checksum(), "presented");
    }

    fn frames_presented(&self) -> u64 {
        self.frames
    }
}

/// Keeps copies of presented frames, up to a limit.
#[derive(Debug)]
pub struct FrameRecorder {
    frames: Vec<FieldBuffer>,
    limit: usize,
    presented: u64,
}

impl FrameRecorder {
    /// Record at most `limit` frames; later frames are counted but dropped.
    pub fn new(limit: usize) -> Self {
        Self {
            frames: Vec::with_capacity(limit.min(64)),
            limit,
            presented: 0,
        }
    }

    /// The recorded frames in presentation order.
    pub fn frames(&self) -> &[FieldBuffer] {
        &self.frames
    }
}

impl DisplaySink for FrameRecorder {
    fn present(&mut self, frame: &FieldBuffer) {
        if self.frames.len() < self.limit {
            self.frames.push(frame.clone());
        }
        self.presented += 1;
    }

    fn frames_presented(&self) -> u64 {
        self.presented
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_sized_framebuffer_fails() {
        let err = Framebuffer::new(0, 720).unwrap_err();
        assert!(matches!(err, SimError::DisplayInit(_)));
    }

    #[test]
    fn test_framebuffer_present() {
        let mut fb = Framebuffer::new(2, 1).unwrap();
        let mut frame = FieldBuffer::new(2, 1);
        frame.set(1, 0, 4.0);

        fb.present(&frame);

        assert_eq!(fb.pixel(0, 0), 0x000000);
        assert_eq!(fb.pixel(1, 0), 0xFFFFFF);
        assert_eq!(fb.frames_presented(), 1);
    }

    #[test]
    fn test_framebuffer_fixed_range() {
        let mut fb = Framebuffer::new(1, 1).unwrap().with_range(ColorRange::Fixed(0.0, 2.0));
        fb.present(&FieldBuffer::filled(1, 1, 1.0));
        assert_eq!(fb.pixel(0, 0), 0x808080);
    }

    #[test]
    fn test_checksum_changes_with_content() {
        let mut fb = Framebuffer::new(2, 2).unwrap();
        let before = fb.checksum();
        let mut frame = FieldBuffer::new(2, 2);
        frame.set(0, 1, 1.0);
        fb.present(&frame);
        assert_ne!(before, fb.checksum());
    }

    #[test]
    fn test_recorder_limit() {
        let mut rec = FrameRecorder::new(2);
        for i in 0..5 {
            rec.present(&FieldBuffer::filled(1, 1, i as f32));
        }
        assert_eq!(rec.frames_presented(), 5);
        assert_eq!(rec.frames().len(), 2);
        assert_eq!(rec.frames()[1].get(0, 0), 1.0);
    }

    #[test]
    fn test_null_sink_counts() {
        let mut sink = NullSink::new();
        sink.present(&FieldBuffer::new(1, 1));
        sink.present(&FieldBuffer::new(1, 1));
        assert_eq!(sink.frames_presented(), 2);
    }
}
