//! Pixel-to-micrometer conversion for the scale bar.
//!
//! The calculation goes through an intermediate "item length" of 100 px: first
//! the physical size of 100 px is derived from the reference segment, then the
//! pixel length of the target bar follows from it. In full-scale mode this
//! collapses to `target_um / pixel_size_um`.
//!
//! The physical scale is derived from the *declared* reference length while the
//! per-pixel unit uses the *measured* one. In manual mode the two differ by
//! however imprecise the clicks were; the difference is reported, not corrected.

use crate::error::AppError;
use serde::Serialize;

/// Fixed intermediate span, in pixels.
pub const ITEM_LENGTH_PX: f64 = 100.0;

/// Default physical length of the drawn bar, in micrometers.
pub const DEFAULT_TARGET_UM: f64 = 500.0;

/// Relative declared/measured mismatch above which the operator is warned.
pub const DIVERGENCE_WARN_RATIO: f64 = 0.01;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleSettings {
    pub item_length_px: f64,
    pub target_um: f64,
}

impl Default for ScaleSettings {
    fn default() -> Self {
        Self {
            item_length_px: ITEM_LENGTH_PX,
            target_um: DEFAULT_TARGET_UM,
        }
    }
}

/// Everything derived from one calibration, computed once per run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScaleBar {
    /// Reference length the physical scale is based on.
    pub declared_px: f64,
    /// Measured length of the reference segment.
    pub chosen_length_px: f64,
    pub pixel_size_um: f64,
    /// Physical length of the declared reference, in millimeters.
    pub scale_mm: f64,
    /// Physical length of `item_length_px`, in micrometers.
    pub unit_length_um: f64,
    /// Pixel length of a `target_um` bar.
    pub scale_bar_px: f64,
    /// Pixel length of a 100 um bar.
    pub per_hundred_px: f64,
    pub settings: ScaleSettings,
}

impl ScaleBar {
    /// Computes the scale bar for a reference of `declared_px` pixels measured
    /// as `chosen_length_px` pixels on screen.
    ///
    /// # Errors
    ///
    /// Returns `AppError::DegenerateSegment` when the measured length is zero
    /// or not finite, `AppError::InvalidLength` for a non-positive declared
    /// length, `AppError::InvalidPixelSize` for a non-positive calibration and
    /// `AppError::InvalidTarget` for a non-positive bar size.
    pub fn compute(
        declared_px: f64,
        chosen_length_px: f64,
        pixel_size_um: f64,
        settings: ScaleSettings,
    ) -> Result<Self, AppError> {
        if !pixel_size_um.is_finite() || pixel_size_um <= 0.0 {
            return Err(AppError::InvalidPixelSize(pixel_size_um));
        }
        if !settings.target_um.is_finite() || settings.target_um <= 0.0 {
            return Err(AppError::InvalidTarget(settings.target_um));
        }
        if !declared_px.is_finite() || declared_px <= 0.0 {
            return Err(AppError::InvalidLength(declared_px));
        }
        if !chosen_length_px.is_finite() || chosen_length_px <= 0.0 {
            return Err(AppError::DegenerateSegment(chosen_length_px));
        }

        let scale_mm = declared_px * pixel_size_um / 1000.0;
        let unit_length_um = scale_mm / chosen_length_px * settings.item_length_px * 1000.0;
        let scale_bar_px = settings.item_length_px / unit_length_um * settings.target_um;
        let per_hundred_px = scale_bar_px / (settings.target_um / 100.0);

        Ok(Self {
            declared_px,
            chosen_length_px,
            pixel_size_um,
            scale_mm,
            unit_length_um,
            scale_bar_px,
            per_hundred_px,
            settings,
        })
    }

    /// Relative difference between the declared and the measured reference.
    pub fn divergence(&self) -> f64 {
        (self.declared_px - self.chosen_length_px).abs() / self.declared_px
    }

    /// Human-readable summary, one line per derived quantity.
    pub fn report_lines(&self) -> Vec<String> {
        vec![
            format!(
                "The chosen length of {} px corresponds to {} mm.",
                px(self.chosen_length_px),
                self.scale_mm
            ),
            format!(
                "{} px are thus {} um",
                self.settings.item_length_px,
                px(self.unit_length_um)
            ),
            format!(
                "{} px are thus {} um and",
                px(self.scale_bar_px),
                self.settings.target_um
            ),
            format!("{} px are thus 100 um", px(self.per_hundred_px)),
        ]
    }
}

/// Physical length in millimeters of `length_px` pixels.
pub fn length_mm(length_px: f64, pixel_size_um: f64) -> f64 {
    length_px * pixel_size_um / 1000.0
}

/// Rounds a pixel quantity to the nearest integer, halves away from zero.
pub fn px(value: f64) -> i64 {
    value.round() as i64
}
