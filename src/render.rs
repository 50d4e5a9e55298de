//! Best-effort compilation of the emitted `.tex` into PDF and PNG.
//!
//! The `.tex` file is the deliverable; everything here may fail silently.
//! Compiler output is discarded and exit codes only show up in the log.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

/// Default raster resolution for the PNG, in dots per inch.
pub const DEFAULT_DPI: u32 = 300;

/// Capability that turns a `.tex` source into rendered artifacts.
pub trait Renderer {
    fn render(&self, source: &Path);
}

/// Renders with `latexmk`, rasterizes with `pdftoppm` and cleans up after.
#[derive(Debug, Clone)]
pub struct Latexmk {
    latexmk: Option<PathBuf>,
    pdftoppm: Option<PathBuf>,
    dpi: u32,
}

impl Latexmk {
    /// Resolves the executables, preferring an explicit `latexmk` path.
    pub fn new(latexmk: Option<PathBuf>, dpi: u32) -> Self {
        let latexmk = latexmk.or_else(|| which::which("latexmk").ok());
        let pdftoppm = which::which("pdftoppm").ok();
        log::debug!("latexmk: {:?}, pdftoppm: {:?}", latexmk, pdftoppm);
        Self {
            latexmk,
            pdftoppm,
            dpi,
        }
    }

    fn compile(&self, latexmk: &Path, source: &Path) {
        // compile even with errors
        run_quietly(Command::new(latexmk).args(["-pdf", "-silent"]).arg(source));
    }

    fn rasterize(&self, source: &Path) {
        let Some(pdftoppm) = &self.pdftoppm else {
            log::warn!("pdftoppm not found on PATH, skipping PNG output");
            return;
        };
        let pdf = source.with_extension("pdf");
        if !pdf.is_file() {
            log::warn!("{} was not produced, skipping PNG output", pdf.display());
            return;
        }
        run_quietly(
            Command::new(pdftoppm)
                .args(["-png", "-singlefile", "-r"])
                .arg(self.dpi.to_string())
                .arg(&pdf)
                .arg(source.with_extension("")),
        );
    }

    fn clean(&self, latexmk: &Path, source: &Path) {
        run_quietly(Command::new(latexmk).arg("-c").arg(source));
    }
}

impl Renderer for Latexmk {
    fn render(&self, source: &Path) {
        let Some(latexmk) = &self.latexmk else {
            log::warn!("latexmk not found on PATH, only the .tex file was written");
            return;
        };
        println!("compiling {}", source.display());
        self.compile(latexmk, source);
        self.rasterize(source);
        println!("cleaning up");
        self.clean(latexmk, source);
    }
}

/// Runs `cmd` to completion with all output discarded; failures are logged.
fn run_quietly(cmd: &mut Command) {
    let status = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status();
    match status {
        Ok(s) if s.success() => log::debug!("{:?} finished", cmd.get_program()),
        Ok(s) => log::warn!("{:?} exited with {}", cmd.get_program(), s),
        Err(e) => log::warn!("failed to run {:?}: {}", cmd.get_program(), e),
    }
}
