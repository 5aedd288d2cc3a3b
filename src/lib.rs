//! Embed and extract image watermarks through block-wise DCT coefficient blending.
//!
//! The host image is split into 8x8 blocks. Each block is moved to the
//! frequency domain with an orthonormal 2D DCT, where the watermark's block
//! coefficients are added at strength `alpha`, and then moved back. Extraction
//! divides a candidate's coefficients by the same `alpha`.
//!
//! # Quick Start
//!
//! ```no_run
//! use dct_watermark::{WatermarkEngine, WatermarkOptions};
//!
//! let engine = WatermarkEngine::new(WatermarkOptions::default()).expect("valid options");
//! let host = image::open("photo.png").unwrap().to_rgb8();
//! let mark = image::open("logo.png").unwrap().to_rgb8();
//! let marked = engine.embed(&host, &mark).unwrap();
//! marked.save("photo_watermarked.png").unwrap();
//!
//! let recovered = engine.extract(&marked).unwrap();
//! recovered.save("photo_extracted.png").unwrap();
//! ```
//!
//! # Channels
//!
//! By default only the red channel is transformed and the result is written
//! to all three channels, so processed regions turn grayscale. Set
//! [`ChannelMode::PerChannel`] to transform R, G and B independently.

#![deny(missing_docs)]

pub mod blocks;
pub mod embedding;
mod engine;
pub mod error;
pub mod scale;
pub mod transform;

pub use embedding::{
    embed, extract, ChannelMode, WatermarkOptions, DEFAULT_ALPHA, DEFAULT_BLOCK_SIZE,
};
pub use engine::{
    default_output_path, is_supported_image, save_image, ProcessResult, WatermarkEngine,
};
pub use error::{Error, Result};
pub use image::imageops::FilterType;
pub use transform::{dct, idct, Block, CoefficientMatrix, DctBasis, SquareMatrix};
