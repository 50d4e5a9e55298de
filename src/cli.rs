use crate::markup::DEFAULT_SHADOW;
use crate::render::DEFAULT_DPI;
use crate::scale::DEFAULT_TARGET_UM;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "A tool to draw calibrated scale bars on images with LaTeX and TikZ."
)]
pub struct Cli {
    /// Location of the file you want to draw a scalebar on.
    #[arg(short, long, value_name = "path")]
    pub image: Option<PathBuf>,

    /// Pixel/voxel size of the image (in micrometers).
    #[arg(short, long = "pixelsize", value_name = "1.48")]
    pub pixel_size: Option<f64>,

    /// Length of the reference you will click, in pixels.
    /// Generally you know that two features are x pixels apart, e.g. the tips
    /// of your sample are 648 pixels apart. Selects manual mode.
    #[arg(short, long, value_name = "648")]
    pub length: Option<u32>,

    /// Use the full image width for scaling instead of clicking a reference.
    /// On by default; a --length makes it obsolete.
    #[arg(short, long, default_value_t = true)]
    pub fullscale: bool,

    /// Reference points for manual mode, skipping the click window.
    #[arg(long, value_name = "X1,Y1,X2,Y2", allow_hyphen_values = true)]
    pub points: Option<String>,

    /// Physical length of the drawn scale bar (in micrometers).
    #[arg(short, long, default_value_t = DEFAULT_TARGET_UM, value_name = "500")]
    pub size: f64,

    /// Offset of the dark shadow under the white bar, in image pixels.
    /// 0 draws the white bar only.
    #[arg(long, default_value_t = DEFAULT_SHADOW)]
    pub shadow: u32,

    /// Only write the .tex file, do not run latexmk.
    #[arg(long, default_value_t = false)]
    pub no_compile: bool,

    /// Path to the latexmk executable. Defaults to the one on PATH.
    #[arg(long, value_name = "path")]
    pub latexmk: Option<PathBuf>,

    /// Resolution of the PNG rendered from the PDF.
    #[arg(long, default_value_t = DEFAULT_DPI)]
    pub dpi: u32,

    /// Print the computed scale bar geometry as JSON.
    #[arg(long, default_value_t = false)]
    pub json: bool,

    /// Print debug info about the calibration and the external tools.
    #[arg(long, default_value_t = false)]
    pub debug: bool,
}

/// Worked examples printed after the usage text when no image is given.
pub fn examples(program: &str) -> String {
    format!(
        "Example:\n\
         The command below makes a 500 um long scalebar on a 2D image 'rec.png', \
         which is 1024 x 1014 pixels big (with 2.8 um pixel size):\n\
         \n\
         {program} -i rec.png -p 2.8 -f\n\
         \n\
         The command below makes a 500 um long scalebar on a test-image '3d.jpg' \
         from which you know that two features are 2170 px apart (650 nm px size). \
         The script asks you to click the two points.\n\
         \n\
         {program} -i 3d.jpg -p 0.65 -l 2170\n"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = Cli::try_parse_from(["scalebar", "-i", "rec.png", "-p", "2.8"]).unwrap();
        assert_eq!(cli.image, Some(PathBuf::from("rec.png")));
        assert_eq!(cli.pixel_size, Some(2.8));
        assert_eq!(cli.length, None);
        assert!(cli.fullscale);
        assert_eq!(cli.size, 500.0);
        assert_eq!(cli.shadow, 4);
        assert!(!cli.no_compile);
    }

    #[test]
    fn manual_mode_flags() {
        let cli = Cli::try_parse_from([
            "scalebar",
            "--image",
            "3d.jpg",
            "--pixelsize",
            "0.65",
            "-l",
            "2170",
            "-f",
            "--points",
            "0,0,2170,0",
            "--no-compile",
        ])
        .unwrap();
        assert_eq!(cli.length, Some(2170));
        assert_eq!(cli.points.as_deref(), Some("0,0,2170,0"));
        assert!(cli.no_compile);
    }

    #[test]
    fn length_must_be_an_integer() {
        assert!(Cli::try_parse_from(["scalebar", "-i", "a.png", "-p", "1", "-l", "64.5"]).is_err());
    }

    #[test]
    fn everything_is_optional_at_parse_time() {
        let cli = Cli::try_parse_from(["scalebar"]).unwrap();
        assert!(cli.image.is_none());
        assert!(cli.pixel_size.is_none());
    }
}
