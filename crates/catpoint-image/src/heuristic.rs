//! Stand-in cat classifiers.
//!
//! Neither of these recognises cats. [`ColorHeuristicClassifier`] looks for
//! a large share of orange and brown fur-coloured pixels, which is enough to
//! drive the controller from test frames; [`FixedClassifier`] always gives
//! the same answer.

use catpoint_core::classifier::{CameraImage, ImageClassifier};
use catpoint_core::Result;
use tracing::debug;

/// Default distance between sampled pixels.
pub const DEFAULT_SAMPLE_STRIDE: usize = 10;

/// A cat is reported when strictly more than `1 / CAT_PIXEL_DIVISOR` of the
/// sampled pixels are fur-coloured.
const CAT_PIXEL_DIVISOR: usize = 4;

// ── ColorHeuristicClassifier ──────────────────────────────────────────────────

/// Reports a cat when enough sampled pixels fall in the orange/brown band.
#[derive(Debug, Clone, Copy)]
pub struct ColorHeuristicClassifier {
    sample_stride: usize,
}

impl ColorHeuristicClassifier {
    /// Sample every `sample_stride`-th pixel; a stride of 0 is treated as 1.
    pub fn new(sample_stride: usize) -> Self {
        Self {
            sample_stride: sample_stride.max(1),
        }
    }

    pub fn sample_stride(&self) -> usize {
        self.sample_stride
    }

    /// `true` for the fur band `r > 150, 50 < g < 200, b < 100`.
    pub fn is_fur_coloured(rgb: u32) -> bool {
        let (r, g, b) = CameraImage::channels(rgb);
        r > 150 && g > 50 && g < 200 && b < 100
    }

    fn classify(&self, image: &CameraImage) -> bool {
        let (sampled, fur) = image
            .pixels()
            .iter()
            .step_by(self.sample_stride)
            .fold((0usize, 0usize), |(sampled, fur), &rgb| {
                (sampled + 1, fur + usize::from(Self::is_fur_coloured(rgb)))
            });

        let cat = sampled > 0 && fur * CAT_PIXEL_DIVISOR > sampled;
        debug!(sampled, fur, cat, "colour heuristic applied");
        cat
    }
}

impl Default for ColorHeuristicClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_STRIDE)
    }
}

impl ImageClassifier for ColorHeuristicClassifier {
    fn image_contains_cat(&self, image: &CameraImage) -> Result<bool> {
        Ok(self.classify(image))
    }
}

// ── FixedClassifier ───────────────────────────────────────────────────────────

/// Always returns the configured answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedClassifier(pub bool);

impl ImageClassifier for FixedClassifier {
    fn image_contains_cat(&self, _image: &CameraImage) -> Result<bool> {
        Ok(self.0)
    }
}

// ── Classifier selection ──────────────────────────────────────────────────────

/// Any of the stand-in classifiers, chosen at runtime.
#[derive(Debug, Clone, Copy)]
pub enum StandInClassifier {
    Heuristic(ColorHeuristicClassifier),
    Fixed(FixedClassifier),
}

impl StandInClassifier {
    /// Build from a command-line name: `heuristic`, `always-cat` or `never-cat`.
    pub fn from_name(name: &str, sample_stride: usize) -> Option<Self> {
        match name {
            "heuristic" => Some(Self::Heuristic(ColorHeuristicClassifier::new(sample_stride))),
            "always-cat" => Some(Self::Fixed(FixedClassifier(true))),
            "never-cat" => Some(Self::Fixed(FixedClassifier(false))),
            _ => None,
        }
    }
}

impl ImageClassifier for StandInClassifier {
    fn image_contains_cat(&self, image: &CameraImage) -> Result<bool> {
        match self {
            Self::Heuristic(c) => c.image_contains_cat(image),
            Self::Fixed(c) => c.image_contains_cat(image),
        }
    }
}
