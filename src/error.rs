use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("No image given")]
    MissingImage,

    #[error("I cannot find {}, please try again.", .0.display())]
    ImageNotFound(PathBuf),

    #[error("You need to enter a pixel size! Please enter your command as this\n{0} -p some_micrometers")]
    MissingPixelSize(String),

    #[error("Pixel size must be a positive number of micrometers, got {0}")]
    InvalidPixelSize(f64),

    #[error("Scale bar length must be a positive number of pixels, got {0}")]
    InvalidLength(f64),

    #[error("Scale bar size must be a positive number of micrometers, got {0}")]
    InvalidTarget(f64),

    #[error("Reference segment has zero length ({0} px); pick two distinct points")]
    DegenerateSegment(f64),

    #[error("Invalid --points value '{0}': expected X1,Y1,X2,Y2")]
    InvalidPoints(String),

    #[error("Point selection was closed before both points were chosen")]
    SelectionAborted,

    #[error("Manual mode needs a display; rebuild with the `gui` feature or pass --points")]
    NoViewer,

    #[error("Image viewer failed: {0}")]
    Viewer(String),

    #[error("I/O error")]
    Io(#[from] std::io::Error),

    #[error("Image decoding error")]
    Image(#[from] image::ImageError),

    #[error("Failed to serialize data to JSON")]
    JsonSerialization(#[from] serde_json::Error),
}
