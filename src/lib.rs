//! The main library for the `scalebar` application.
//!
//! This crate turns an image and its pixel size into a LaTeX/TikZ document that
//! draws a calibrated scale bar on top of the image, and optionally compiles it.
//! The primary entry point is the `run` function, which takes the parsed CLI
//! arguments and executes the whole process.
//!
//! The library is structured into several modules:
//! - `cli`: Defines the command-line interface.
//! - `geometry`: Pixel-space points, segments and image dimensions.
//! - `acquire`: Obtains the reference segment, automatically or from clicks.
//! - `viewer`: The click window (behind the `gui` feature).
//! - `scale`: Converts the reference into the scale bar length.
//! - `markup`: Generates the LaTeX/TikZ source.
//! - `render`: Runs the external LaTeX toolchain.
//! - `error`: Defines the application's custom error type.

use anyhow::{Context, Result};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub mod acquire;
pub mod cli;
pub mod error;
pub mod geometry;
pub mod markup;
pub mod render;
pub mod scale;
#[cfg(feature = "gui")]
pub mod viewer;

use crate::acquire::{Mode, PointSource};
use crate::cli::Cli;
use crate::error::AppError;
use crate::geometry::{ImageSize, Segment};
use crate::markup::Overlay;
use crate::render::{Latexmk, Renderer};
use crate::scale::{ScaleBar, ScaleSettings, DIVERGENCE_WARN_RATIO};

/// Validated inputs of a run.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub image: PathBuf,
    pub pixel_size_um: f64,
    pub mode: Mode,
}

/// Everything a run produced, as printed by `--json`.
#[derive(Debug, Serialize)]
pub struct Report {
    pub image: PathBuf,
    pub size: ImageSize,
    pub reference: Segment,
    pub scale: ScaleBar,
    pub output: PathBuf,
}

/// The main entry point for the application logic.
///
/// This function orchestrates the entire process:
/// 1.  It validates the image path and pixel size.
/// 2.  It picks the point source for manual mode (click window or `--points`).
/// 3.  It writes the `.tex` file into the current working directory.
/// 4.  It hands the file to `latexmk` unless `--no-compile` is given.
///
/// # Errors
///
/// Returns an error if the inputs are missing or invalid, if the reference
/// cannot be obtained, or if the `.tex` file cannot be written. Rendering
/// failures are never reported as errors.
pub fn run(cli: &Cli) -> Result<()> {
    let inputs = resolve_inputs(cli)?;
    let mut source = point_source(cli, inputs.mode)?;
    let renderer = Latexmk::new(cli.latexmk.clone(), cli.dpi);
    let out_dir = std::env::current_dir().context("Failed to read the working directory")?;

    run_with(cli, &inputs, source.as_mut(), &renderer, &out_dir)?;
    Ok(())
}

/// Runs the pipeline with explicit collaborators and returns the report.
///
/// # Arguments
///
/// * `cli` - The parsed command-line arguments.
/// * `inputs` - Validated inputs from `resolve_inputs`.
/// * `source` - Where manual-mode points come from.
/// * `renderer` - What turns the `.tex` into PDF/PNG.
/// * `out_dir` - Directory receiving `<stem>_scalebar.tex`.
pub fn run_with(
    cli: &Cli,
    inputs: &Inputs,
    source: &mut dyn PointSource,
    renderer: &dyn Renderer,
    out_dir: &Path,
) -> Result<Report> {
    println!("{}", "-".repeat(80));

    // 1. Read the image dimensions
    let size = ImageSize::from_header(&inputs.image)
        .with_context(|| format!("Failed to read image {}", inputs.image.display()))?;
    log::debug!("{} is {} x {} px", inputs.image.display(), size.width, size.height);

    // 2. Obtain the reference segment
    let (reference, declared_px) = acquire::reference_segment(
        inputs.mode,
        &inputs.image,
        size,
        inputs.pixel_size_um,
        source,
    )?;

    // 3. Calculate the scale bar
    let settings = ScaleSettings {
        target_um: cli.size,
        ..ScaleSettings::default()
    };
    let scale = ScaleBar::compute(declared_px, reference.length(), inputs.pixel_size_um, settings)?;

    if scale.divergence() > DIVERGENCE_WARN_RATIO {
        println!(
            "Note: the clicked line is {:.1} px long, not the declared {} px; the scale bar follows the clicked line.",
            scale.chosen_length_px, declared_px
        );
    }
    for line in scale.report_lines() {
        println!("{}", line);
    }

    // 4. Write the LaTeX source
    println!("{}", "-".repeat(80));
    let output = generate_output_path(&inputs.image, out_dir);
    println!("writing LaTeX-code to {}", output.display());
    let tex = markup::generate_tex(&Overlay {
        image: &inputs.image,
        size,
        reference,
        bar: &scale,
        shadow: (cli.shadow > 0).then_some(cli.shadow),
    });
    fs::write(&output, tex)
        .with_context(|| format!("Failed to write output to {}", output.display()))?;

    // 5. Render, best effort
    if cli.no_compile {
        log::debug!("--no-compile given, skipping latexmk");
    } else {
        renderer.render(&output);
    }

    println!("{}", "-".repeat(80));
    if cli.no_compile {
        println!("You now have {} for further editing.", output.display());
    } else {
        println!(
            "You now have {} and {} (plus a .png when pdftoppm is available).",
            output.display(),
            output.with_extension("pdf").display()
        );
        println!("The .tex-file is for further editing and the .pdf file can be used as is in a slide...");
    }

    let report = Report {
        image: inputs.image.clone(),
        size,
        reference,
        scale,
        output,
    };
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report).map_err(AppError::from)?);
    }
    Ok(report)
}

/// Checks the inputs in the order an operator would fix them.
///
/// # Errors
///
/// * `AppError::MissingImage` when no image was given,
/// * `AppError::ImageNotFound` when it does not point to a file,
/// * `AppError::MissingPixelSize` when no pixel size was given,
/// * `AppError::InvalidPixelSize` when it is not a positive number.
pub fn resolve_inputs(cli: &Cli) -> Result<Inputs, AppError> {
    let image = cli.image.clone().ok_or(AppError::MissingImage)?;
    if !image.is_file() {
        return Err(AppError::ImageNotFound(image));
    }

    let pixel_size_um = cli.pixel_size.ok_or_else(|| {
        AppError::MissingPixelSize(std::env::args().collect::<Vec<_>>().join(" "))
    })?;
    if !pixel_size_um.is_finite() || pixel_size_um <= 0.0 {
        return Err(AppError::InvalidPixelSize(pixel_size_um));
    }

    Ok(Inputs {
        image,
        pixel_size_um,
        mode: Mode::select(cli.length),
    })
}

/// Picks where manual-mode points come from.
///
/// `--points` wins over the click window. Full-scale mode never asks.
fn point_source(cli: &Cli, mode: Mode) -> Result<Box<dyn PointSource>, AppError> {
    if let Some(raw) = &cli.points {
        if mode == Mode::FullScale {
            log::warn!("--points is ignored without --length");
            return Ok(Box::new(acquire::Headless));
        }
        return Ok(Box::new(acquire::FixedPoints(acquire::parse_points(raw)?)));
    }

    #[cfg(feature = "gui")]
    return Ok(Box::new(viewer::ClickPicker));

    #[cfg(not(feature = "gui"))]
    return Ok(Box::new(acquire::Headless));
}

/// Determines the output path for the generated `.tex` file.
///
/// The file is named `<input_stem>_scalebar.tex` and placed in `out_dir`,
/// which is the working directory for normal runs.
pub fn generate_output_path(input_path: &Path, out_dir: &Path) -> PathBuf {
    let stem = input_path.file_stem().unwrap_or_default().to_string_lossy();
    out_dir.join(format!("{}_scalebar.tex", stem))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::acquire::FixedPoints;
    use crate::geometry::Point;
    use clap::Parser;
    use std::cell::RefCell;

    #[derive(Default)]
    struct RecordingRenderer {
        calls: RefCell<Vec<PathBuf>>,
    }

    impl Renderer for RecordingRenderer {
        fn render(&self, source: &Path) {
            self.calls.borrow_mut().push(source.to_path_buf());
        }
    }

    fn write_image(dir: &Path, name: &str, w: u32, h: u32) -> PathBuf {
        let path = dir.join(name);
        image::RgbImage::new(w, h).save(&path).unwrap();
        path
    }

    fn cli(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("scalebar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn output_path_uses_stem_and_suffix() {
        assert_eq!(
            generate_output_path(Path::new("/data/e13960/test.jpg"), Path::new("/work")),
            PathBuf::from("/work/test_scalebar.tex")
        );
        assert_eq!(
            generate_output_path(Path::new("rec.v2.png"), Path::new(".")),
            PathBuf::from("./rec.v2_scalebar.tex")
        );
    }

    #[test]
    fn resolve_reports_missing_inputs_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_image(dir.path(), "a.png", 4, 4);
        let img = img.to_str().unwrap();

        assert!(matches!(resolve_inputs(&cli(&["-p", "1"])), Err(AppError::MissingImage)));
        assert!(matches!(
            resolve_inputs(&cli(&["-i", "/nonexistent/a.png"])),
            Err(AppError::ImageNotFound(_))
        ));
        assert!(matches!(
            resolve_inputs(&cli(&["-i", img])),
            Err(AppError::MissingPixelSize(_))
        ));
        assert!(matches!(
            resolve_inputs(&cli(&["-i", img, "-p", "0"])),
            Err(AppError::InvalidPixelSize(_))
        ));

        let inputs = resolve_inputs(&cli(&["-i", img, "-p", "0.65", "-l", "2170", "-f"])).unwrap();
        assert_eq!(inputs.mode, Mode::Manual { declared_px: 2170 });
    }

    #[test]
    fn points_are_only_parsed_when_clicks_are_needed() {
        let full = cli(&["-i", "a.png", "-p", "1", "--points", "not,points"]);
        assert!(point_source(&full, Mode::FullScale).is_ok());

        let manual = cli(&["-i", "a.png", "-p", "1", "-l", "10", "--points", "not,points"]);
        assert!(matches!(
            point_source(&manual, Mode::Manual { declared_px: 10 }),
            Err(AppError::InvalidPoints(_))
        ));
    }

    #[test]
    fn full_scale_run_writes_tex_and_renders_once() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_image(dir.path(), "rec.png", 1024, 1014);
        let args = cli(&["-i", img.to_str().unwrap(), "-p", "2.8"]);
        let inputs = resolve_inputs(&args).unwrap();
        let renderer = RecordingRenderer::default();

        let report = run_with(
            &args,
            &inputs,
            &mut acquire::Headless,
            &renderer,
            dir.path(),
        )
        .unwrap();

        assert_eq!(report.output, dir.path().join("rec_scalebar.tex"));
        assert_eq!(report.reference.length(), 1024.0);
        assert!((report.scale.scale_bar_px - 500.0 / 2.8).abs() < 1e-9);
        assert_eq!(*renderer.calls.borrow(), vec![report.output.clone()]);

        let tex = fs::read_to_string(&report.output).unwrap();
        assert!(tex.contains("(\\x+179,\\y)"));
    }

    #[test]
    fn manual_run_uses_point_source_and_skips_render() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_image(dir.path(), "3d.png", 2560, 64);
        let args = cli(&["-i", img.to_str().unwrap(), "-p", "0.65", "-l", "2170", "--no-compile"]);
        let inputs = resolve_inputs(&args).unwrap();
        let renderer = RecordingRenderer::default();
        let mut source = FixedPoints(Segment::new(Point::new(100.0, 30.0), Point::new(2270.0, 30.0)));

        let report = run_with(&args, &inputs, &mut source, &renderer, dir.path()).unwrap();

        assert!(renderer.calls.borrow().is_empty());
        assert!((report.scale.scale_mm - 1.4105).abs() < 1e-12);
        assert!((report.scale.scale_bar_px - 769.230_769).abs() < 1e-3);
        assert!(report.output.is_file());
    }

    #[test]
    fn degenerate_clicks_write_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let img = write_image(dir.path(), "dot.png", 32, 32);
        let args = cli(&["-i", img.to_str().unwrap(), "-p", "1", "-l", "10", "--no-compile"]);
        let inputs = resolve_inputs(&args).unwrap();
        let mut source = FixedPoints(Segment::new(Point::new(5.0, 5.0), Point::new(5.0, 5.0)));

        let err = run_with(
            &args,
            &inputs,
            &mut source,
            &RecordingRenderer::default(),
            dir.path(),
        )
        .unwrap_err();

        assert!(matches!(
            err.downcast_ref::<AppError>(),
            Some(AppError::DegenerateSegment(_))
        ));
        assert!(!dir.path().join("dot_scalebar.tex").exists());
    }
}
