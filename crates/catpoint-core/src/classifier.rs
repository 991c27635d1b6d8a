//! Camera frames and the cat-classifier contract.

use crate::error::Result;

/// A decoded camera frame.
///
/// Pixels are row-major and packed as `0xRRGGBB`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CameraImage {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl CameraImage {
    /// Build a frame from packed pixels.
    ///
    /// Returns `None` when `pixels.len() != width * height`.
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Option<Self> {
        (width.checked_mul(height)? == pixels.len()).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// A frame of a single colour.
    pub fn filled(width: usize, height: usize, rgb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![rgb & 0x00FF_FFFF; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Split a packed pixel into `(r, g, b)`.
    pub fn channels(rgb: u32) -> (u8, u8, u8) {
        (
            ((rgb >> 16) & 0xFF) as u8,
            ((rgb >> 8) & 0xFF) as u8,
            (rgb & 0xFF) as u8,
        )
    }
}

/// Decides whether a camera frame shows a cat.
///
/// Implementations are opaque to the engine; a failure is reported as an
/// error and leaves the engine state untouched.
pub trait ImageClassifier: Send + Sync {
    fn image_contains_cat(&self, image: &CameraImage) -> Result<bool>;
}

impl<F> ImageClassifier for F
where
    F: Fn(&CameraImage) -> Result<bool> + Send + Sync,
{
    fn image_contains_cat(&self, image: &CameraImage) -> Result<bool> {
        self(image)
    }
}
