//! Error kinds produced by the morphing engine.

use thiserror::Error;

use crate::resolution::Resolution;

/// Errors reported by the engine's fallible operations.
///
/// Every recoverable kind leaves the output buffer holding an unmodified copy
/// of the source image, so callers can keep presenting frames after logging
/// the failure. [`Error::DimensionMismatch`] is the exception: it is detected
/// before any pixel is written.
#[derive(Debug, Error)]
pub enum Error {
    /// One of the landmark arrays has fewer than 400 valid entries.
    #[error("insufficient landmarks: {found} valid entries, need at least 400")]
    InsufficientLandmarks { found: usize },

    /// Triangulation of the key landmarks yielded no usable triangles.
    #[error("triangulation produced no usable triangles")]
    DegenerateMesh,

    /// Fewer than 3 usable hull points were available for the face mask.
    #[error("face mask construction failed: only {hull_points} usable hull points")]
    MaskConstructionFailed { hull_points: usize },

    /// The output buffer's dimensions don't match the source image.
    #[error("output buffer is {out}, source is {src}")]
    DimensionMismatch { src: Resolution, out: Resolution },

    /// A landmark required to anchor an overlay is absent.
    #[error("overlay anchor landmark {index} is missing")]
    OverlayAnchorMissing { index: usize },

    /// Filesystem error while reading an asset.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Image decode/encode error from the underlying codec.
    #[error("image error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed landmark or catalog JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
