//! Pixel buffers and the normalized-coordinate grid rule.

use super::color::Color;
use crate::error::{PixelGraphError, Result};
use std::path::Path;

/// Map a normalized coordinate onto an integer grid of `dim` cells.
///
/// Uses `floor((dim + 0.5) * c)`. Coordinates outside `[0, 1)` (and NaN)
/// are out of bounds. The half-pixel bias can push the last in-range
/// coordinates to `dim`, which is clamped back to `dim - 1`.
#[inline]
pub fn grid_index(dim: usize, c: f64) -> Option<usize> {
    if dim == 0 || !(0.0..1.0).contains(&c) {
        return None;
    }
    let idx = ((dim as f64 + 0.5) * c).floor() as usize;
    Some(idx.min(dim - 1))
}

/// Normalized coordinate of the centre of cell `i` on a grid of `dim` cells.
#[inline]
pub fn cell_center(i: usize, dim: usize) -> f64 {
    (i as f64 + 0.5) / dim as f64
}

/// Row-major 2D array of [`Color`] samples.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    data: Vec<Color>,
}

impl PixelBuffer {
    /// Buffer filled with [`Color::DEFAULT`].
    pub fn new(width: usize, height: usize) -> Self {
        Self::filled(width, height, Color::DEFAULT)
    }

    pub fn filled(width: usize, height: usize, color: Color) -> Self {
        Self {
            width,
            height,
            data: vec![color; width * height],
        }
    }

    /// Build a buffer by evaluating `f(x, y)` for every pixel in row-major order.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> Color) -> Self {
        let mut data = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                data.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            data,
        }
    }

    /// Wrap existing row-major pixels. Returns `None` when the length does not match.
    pub fn from_pixels(width: usize, height: usize, data: Vec<Color>) -> Option<Self> {
        (data.len() == width * height).then_some(Self {
            width,
            height,
            data,
        })
    }

    /// Convert tightly packed 8-bit RGB into opaque float colors.
    pub fn from_rgb8(width: usize, height: usize, bytes: &[u8]) -> Option<Self> {
        if bytes.len() != width * height * 3 {
            return None;
        }
        let data = bytes
            .chunks_exact(3)
            .map(|px| Color::from_rgb8(px[0], px[1], px[2]))
            .collect();
        Some(Self {
            width,
            height,
            data,
        })
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn pixels(&self) -> &[Color] {
        &self.data
    }

    /// Pixel at integer coordinates; out-of-bounds reads return [`Color::DEFAULT`].
    #[inline]
    pub fn get(&self, x: i64, y: i64) -> Color {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return Color::DEFAULT;
        }
        self.data[y as usize * self.width + x as usize]
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: Color) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = color;
        }
    }

    /// Nearest sample at normalized coordinates using [`grid_index`].
    #[inline]
    pub fn sample(&self, x: f64, y: f64) -> Color {
        match (grid_index(self.width, x), grid_index(self.height, y)) {
            (Some(ix), Some(iy)) => self.data[iy * self.width + ix],
            _ => Color::DEFAULT,
        }
    }

    /// Export as 8-bit RGBA, clamping every channel.
    pub fn to_rgba8(&self) -> Vec<u8> {
        self.data.iter().flat_map(|c| c.to_rgba8()).collect()
    }

    pub fn to_image(&self) -> Result<::image::RgbaImage> {
        ::image::RgbaImage::from_raw(self.width as u32, self.height as u32, self.to_rgba8())
            .ok_or_else(|| {
                PixelGraphError::Image(format!(
                    "buffer of {}x{} does not fit an RGBA image",
                    self.width, self.height
                ))
            })
    }

    pub fn from_image(img: &::image::DynamicImage) -> Self {
        let rgba = img.to_rgba8();
        let (w, h) = rgba.dimensions();
        let data = rgba.pixels().map(|p| Color::from_rgba8(p.0)).collect();
        Self {
            width: w as usize,
            height: h as usize,
            data,
        }
    }

    /// Decode an image file (PNG, JPEG or BMP).
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let img = ::image::open(path)
            .map_err(|e| PixelGraphError::Image(format!("failed to open {:?}: {}", path, e)))?;
        Ok(Self::from_image(&img))
    }

    /// Encode as PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        self.to_image()?
            .save_with_format(path, ::image::ImageFormat::Png)
            .map_err(|e| PixelGraphError::Image(format!("failed to write {:?}: {}", path, e)))
    }
}
