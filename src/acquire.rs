//! Obtaining the reference segment the scale is calibrated against.
//!
//! Full-scale mode needs no interaction and uses the image width. Manual mode
//! asks a [`PointSource`] for two points; the interactive window and the
//! `--points` command-line value are the two sources.

use crate::error::AppError;
use crate::geometry::{ImageSize, Point, Segment};
use crate::scale::length_mm;
use std::path::{Path, PathBuf};

/// How the reference length is obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Use the full image width.
    FullScale,
    /// The operator marks a segment of the given declared pixel length.
    Manual { declared_px: u32 },
}

impl Mode {
    /// A declared length always selects manual mode, whatever `--fullscale` says.
    pub fn select(length: Option<u32>) -> Self {
        match length {
            Some(declared_px) => Mode::Manual { declared_px },
            None => Mode::FullScale,
        }
    }
}

/// What the operator is asked to mark.
#[derive(Debug, Clone)]
pub struct Prompt {
    pub image: PathBuf,
    pub size: ImageSize,
    pub declared_px: u32,
    pub pixel_size_um: f64,
}

impl Prompt {
    /// Physical length of the declared reference, in millimeters.
    pub fn declared_mm(&self) -> f64 {
        length_mm(f64::from(self.declared_px), self.pixel_size_um)
    }

    pub fn start_title(&self) -> String {
        format!(
            "{}\nClick on start point of {} px long ({} mm) line",
            self.image.display(),
            self.declared_px,
            self.declared_mm()
        )
    }

    pub fn end_title(&self) -> String {
        format!(
            "{}\nClick on end point of {} px long ({} mm) line",
            self.image.display(),
            self.declared_px,
            self.declared_mm()
        )
    }

    pub fn done_title(&self) -> String {
        format!(
            "{}\nThis line is {} px long ({} mm)",
            self.image.display(),
            self.declared_px,
            self.declared_mm()
        )
    }
}

/// Capability that yields the two points of a manual reference segment.
pub trait PointSource {
    fn acquire(&mut self, prompt: &Prompt) -> Result<Segment, AppError>;
}

/// Points known in advance, e.g. from `--points`.
#[derive(Debug, Clone, Copy)]
pub struct FixedPoints(pub Segment);

impl PointSource for FixedPoints {
    fn acquire(&mut self, _prompt: &Prompt) -> Result<Segment, AppError> {
        Ok(self.0)
    }
}

/// Source used when no display support is compiled in.
#[derive(Debug, Default)]
pub struct Headless;

impl PointSource for Headless {
    fn acquire(&mut self, _prompt: &Prompt) -> Result<Segment, AppError> {
        Err(AppError::NoViewer)
    }
}

/// Parses `X1,Y1,X2,Y2` into a segment.
pub fn parse_points(raw: &str) -> Result<Segment, AppError> {
    let values: Vec<f64> = raw
        .split(',')
        .map(|v| v.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|_| AppError::InvalidPoints(raw.to_string()))?;

    match values.as_slice() {
        [x1, y1, x2, y2] if values.iter().all(|v| v.is_finite()) => Ok(Segment::new(
            Point::new(*x1, *y1),
            Point::new(*x2, *y2),
        )),
        _ => Err(AppError::InvalidPoints(raw.to_string())),
    }
}

/// Resolves the reference segment and the declared length for `mode`.
pub fn reference_segment(
    mode: Mode,
    image: &Path,
    size: ImageSize,
    pixel_size_um: f64,
    source: &mut dyn PointSource,
) -> Result<(Segment, f64), AppError> {
    match mode {
        Mode::FullScale => {
            println!(
                "Using full size of image ({} x {} px @{} um) to calculate scalebar",
                size.width, size.height, pixel_size_um
            );
            Ok((Segment::full_width(size), f64::from(size.width)))
        }
        Mode::Manual { declared_px } => {
            let prompt = Prompt {
                image: image.to_path_buf(),
                size,
                declared_px,
                pixel_size_um,
            };
            println!();
            println!(
                "Please click on two points {} px (@ {} um) apart, i.e. the length you chose will be {} mm",
                declared_px,
                pixel_size_um,
                prompt.declared_mm()
            );
            println!();
            let segment = source.acquire(&prompt)?;
            log::debug!(
                "reference segment ({:.1}, {:.1}) -> ({:.1}, {:.1})",
                segment.start.x,
                segment.start.y,
                segment.end.x,
                segment.end.y
            );
            Ok((segment, f64::from(declared_px)))
        }
    }
}
