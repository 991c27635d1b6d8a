//! Netpbm colour image loading.
//!
//! Camera frames are accepted as PPM files in either the binary (`P6`) or
//! the plain-text (`P3`) flavour, with a maximum sample value of at most 255.

use std::path::{Path, PathBuf};

use catpoint_core::classifier::CameraImage;
use thiserror::Error;
use tracing::debug;

/// Errors raised while loading a camera frame.
#[derive(Error, Debug)]
pub enum ImageError {
    /// The file could not be opened or read.
    #[error("Failed to read image {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The first token is not `P3` or `P6`.
    #[error("Unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// The header or pixel data is malformed.
    #[error("Malformed image: {0}")]
    Malformed(String),
}

impl From<ImageError> for catpoint_core::SecurityError {
    fn from(err: ImageError) -> Self {
        catpoint_core::SecurityError::Classifier(err.to_string())
    }
}

/// Read and decode the PPM file at `path`.
pub fn load_ppm(path: &Path) -> Result<CameraImage, ImageError> {
    let bytes = std::fs::read(path).map_err(|source| ImageError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let image = parse_ppm(&bytes)?;
    debug!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "loaded camera frame"
    );
    Ok(image)
}

/// Decode an in-memory PPM document.
pub fn parse_ppm(bytes: &[u8]) -> Result<CameraImage, ImageError> {
    let mut cursor = Cursor { bytes, pos: 0 };

    let magic = cursor
        .token()
        .ok_or_else(|| ImageError::Malformed("empty input".to_string()))?;
    let binary = match magic {
        b"P6" => true,
        b"P3" => false,
        other => {
            return Err(ImageError::UnsupportedFormat(
                String::from_utf8_lossy(other).into_owned(),
            ))
        }
    };

    let width = cursor.number("width")?;
    let height = cursor.number("height")?;
    let maxval = cursor.number("maxval")?;
    if maxval == 0 || maxval > 255 {
        return Err(ImageError::Malformed(format!("unsupported maxval {maxval}")));
    }

    let needed = width
        .checked_mul(height)
        .and_then(|count| count.checked_mul(3))
        .ok_or_else(|| ImageError::Malformed("image dimensions overflow".to_string()))?;

    let samples: Vec<u8> = if binary {
        // Exactly one whitespace byte separates the header from the raster.
        cursor.pos += 1;
        let raster = bytes
            .get(cursor.pos..cursor.pos.saturating_add(needed))
            .ok_or_else(|| ImageError::Malformed(format!("expected {needed} raster bytes")))?;
        if let Some(&value) = raster.iter().find(|&&v| usize::from(v) > maxval) {
            return Err(ImageError::Malformed(format!(
                "sample {value} exceeds maxval {maxval}"
            )));
        }
        raster.to_vec()
    } else {
        // Every plain sample takes a digit and a separator, bar the last one.
        let remaining = bytes.len().saturating_sub(cursor.pos);
        if needed > remaining.saturating_add(1) / 2 {
            return Err(ImageError::Malformed(format!(
                "expected {needed} samples, input too short"
            )));
        }
        let mut samples = Vec::with_capacity(needed);
        for _ in 0..needed {
            let value = cursor.number("sample")?;
            if value > maxval {
                return Err(ImageError::Malformed(format!(
                    "sample {value} exceeds maxval {maxval}"
                )));
            }
            samples.push(value as u8);
        }
        samples
    };

    let pixels = samples
        .chunks_exact(3)
        .map(|rgb| {
            let scale = |v: u8| u32::from(v) * 255 / maxval as u32;
            (scale(rgb[0]) << 16) | (scale(rgb[1]) << 8) | scale(rgb[2])
        })
        .collect();

    CameraImage::new(width, height, pixels)
        .ok_or_else(|| ImageError::Malformed("pixel count does not match dimensions".to_string()))
}

// ── Header tokenizer ──────────────────────────────────────────────────────────

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Next whitespace-delimited token, skipping `#` comments.
    fn token(&mut self) -> Option<&'a [u8]> {
        loop {
            while self.pos < self.bytes.len() && self.bytes[self.pos].is_ascii_whitespace() {
                self.pos += 1;
            }
            if self.bytes.get(self.pos) == Some(&b'#') {
                while self.pos < self.bytes.len() && self.bytes[self.pos] != b'\n' {
                    self.pos += 1;
                }
                continue;
            }
            break;
        }
        let bytes = self.bytes;
        let start = self.pos;
        while self.pos < bytes.len() && !bytes[self.pos].is_ascii_whitespace() {
            self.pos += 1;
        }
        let end = self.pos;
        (end > start).then(|| &bytes[start..end])
    }

    fn number(&mut self, field: &str) -> Result<usize, ImageError> {
        let token = self
            .token()
            .ok_or_else(|| ImageError::Malformed(format!("missing {field}")))?;
        std::str::from_utf8(token)
            .ok()
            .and_then(|s| s.parse().ok())
            .ok_or_else(|| {
                ImageError::Malformed(format!(
                    "invalid {field}: {}",
                    String::from_utf8_lossy(token)
                ))
            })
    }
}
