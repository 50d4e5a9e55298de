//! Pixel-space primitives shared by the acquirer, the calculator and the emitter.
//!
//! All coordinates are in image pixels with the origin at the top-left corner
//! and `y` growing downwards, which is also how TikZ sees the picture once the
//! emitter flips the y axis.

use crate::error::AppError;
use serde::Serialize;
use std::path::Path;

/// Width and height of the input raster, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageSize {
    pub width: u32,
    pub height: u32,
}

impl ImageSize {
    /// Reads the dimensions from the image header without decoding pixel data.
    pub fn from_header(path: &Path) -> Result<Self, AppError> {
        let (width, height) = image::image_dimensions(path)?;
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// The reference line the scale is calibrated against.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

impl Segment {
    pub fn new(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Spans the whole image width at mid-height.
    pub fn full_width(size: ImageSize) -> Self {
        let mid = f64::from(size.height / 2);
        Self {
            start: Point::new(0.0, mid),
            end: Point::new(f64::from(size.width), mid),
        }
    }

    /// Euclidean length in pixels.
    pub fn length(&self) -> f64 {
        (self.start.x - self.end.x).hypot(self.start.y - self.end.y)
    }
}
