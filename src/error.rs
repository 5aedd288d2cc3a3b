//! Error types for the dct-watermark crate.

/// Errors that can occur while embedding or extracting a watermark.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A grid has zero extent or is smaller than one block in either axis.
    #[error("invalid dimensions {width}x{height} for {block_size}x{block_size} blocks")]
    InvalidDimensions {
        /// Grid width in pixels.
        width: u32,
        /// Grid height in pixels.
        height: u32,
        /// Block side in pixels.
        block_size: u32,
    },

    /// A tuning parameter lies outside its accepted range.
    #[error("parameter `{name}` out of range: {value}")]
    ParameterOutOfRange {
        /// Parameter name.
        name: &'static str,
        /// Rejected value, rendered for display.
        value: String,
    },

    /// A transform received a matrix whose side differs from its basis.
    #[error("block size mismatch: expected {expected}x{expected}, got {actual}x{actual}")]
    BlockSizeMismatch {
        /// Side the transform basis was built for.
        expected: usize,
        /// Side of the offending matrix.
        actual: usize,
    },

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The image format is not supported.
    #[error("unsupported image format: {0}")]
    UnsupportedFormat(String),

    /// An error occurred during image processing (load, save, encode).
    #[error("image processing error: {0}")]
    Image(#[from] image::ImageError),
}

/// A specialized `Result` type for this crate.
pub type Result<T> = std::result::Result<T, Error>;
