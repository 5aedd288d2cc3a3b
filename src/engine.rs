//! File-level driver around the embedding pipelines.

use std::path::{Path, PathBuf};

use image::{DynamicImage, ImageFormat, RgbImage};

use crate::embedding::{self, WatermarkOptions};
use crate::error::{Error, Result};

/// Result of processing a single image file.
#[derive(Debug)]
pub struct ProcessResult {
    /// Path of the processed input file.
    pub path: PathBuf,
    /// Where the output was written, if anything was.
    pub output: Option<PathBuf>,
    /// Whether processing succeeded.
    pub success: bool,
    /// Human-readable status message.
    pub message: String,
}

impl ProcessResult {
    fn failed(path: &Path, message: String) -> Self {
        Self {
            path: path.to_path_buf(),
            output: None,
            success: false,
            message,
        }
    }

    fn written(path: &Path, output: &Path, message: &str) -> Self {
        Self {
            path: path.to_path_buf(),
            output: Some(output.to_path_buf()),
            success: true,
            message: message.to_string(),
        }
    }
}

/// Embeds and extracts watermarks with one validated set of options.
///
/// Create once with [`WatermarkEngine::new()`] and reuse for multiple images.
#[derive(Debug, Clone)]
pub struct WatermarkEngine {
    options: WatermarkOptions,
}

impl WatermarkEngine {
    /// Create an engine, validating `options` up front.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterOutOfRange`] if `alpha` or `block_size` is invalid.
    pub fn new(options: WatermarkOptions) -> Result<Self> {
        options.validate()?;
        Ok(Self { options })
    }

    /// Options this engine was built with.
    #[must_use]
    pub fn options(&self) -> &WatermarkOptions {
        &self.options
    }

    /// Embed `watermark` into `host`. See [`embedding::embed`].
    ///
    /// # Errors
    ///
    /// Propagates [`embedding::embed`] failures.
    pub fn embed(&self, host: &RgbImage, watermark: &RgbImage) -> Result<RgbImage> {
        embedding::embed(host, watermark, &self.options)
    }

    /// Recover a watermark from `candidate`. See [`embedding::extract`].
    ///
    /// # Errors
    ///
    /// Propagates [`embedding::extract`] failures.
    pub fn extract(&self, candidate: &RgbImage) -> Result<RgbImage> {
        embedding::extract(candidate, &self.options)
    }

    /// Load host and watermark, embed, and save to `output`.
    ///
    /// Fails without writing if `output` names a lossy format, since
    /// re-encoding perturbs the blended coefficients.
    #[must_use]
    pub fn embed_file(&self, host: &Path, watermark: &Path, output: &Path) -> ProcessResult {
        let run = || -> Result<()> {
            if is_lossy_output(output) {
                return Err(Error::UnsupportedFormat(format!(
                    "{} is lossy and would destroy the watermark; use PNG",
                    output.display()
                )));
            }
            let host_img = image::open(host)?.to_rgb8();
            let mark_img = image::open(watermark)?.to_rgb8();
            let marked = self.embed(&host_img, &mark_img)?;
            write_output(&marked, output)
        };

        match run() {
            Ok(()) => {
                log::info!("embedded {} into {}", watermark.display(), output.display());
                ProcessResult::written(host, output, "Watermark embedded")
            }
            Err(e) => ProcessResult::failed(host, format!("Failed to embed: {e}")),
        }
    }

    /// Load `input`, extract its watermark, and save to `output`.
    #[must_use]
    pub fn extract_file(&self, input: &Path, output: &Path) -> ProcessResult {
        let run = || -> Result<()> {
            let candidate = image::open(input)?.to_rgb8();
            let recovered = self.extract(&candidate)?;
            write_output(&recovered, output)
        };

        match run() {
            Ok(()) => {
                log::info!("extracted watermark from {} to {}", input.display(), output.display());
                ProcessResult::written(input, output, "Watermark extracted")
            }
            Err(e) => ProcessResult::failed(input, format!("Failed to extract: {e}")),
        }
    }

    /// Extract watermarks from every supported image in a directory.
    ///
    /// Each output is named `{stem}_{ext}.png` after its input, so inputs that
    /// share a stem do not overwrite each other. Files are processed in
    /// parallel when the `parallel` feature is enabled.
    #[must_use]
    pub fn extract_directory(&self, input_dir: &Path, output_dir: &Path) -> Vec<ProcessResult> {
        let entries: Vec<PathBuf> = match std::fs::read_dir(input_dir) {
            Ok(rd) => rd
                .filter_map(std::result::Result::ok)
                .filter(|e| e.file_type().map(|ft| ft.is_file()).unwrap_or(false))
                .map(|e| e.path())
                .filter(|p| is_supported_image(p))
                .collect(),
            Err(e) => {
                return vec![ProcessResult::failed(
                    input_dir,
                    format!("Failed to read directory: {e}"),
                )];
            }
        };

        if let Err(e) = std::fs::create_dir_all(output_dir) {
            return vec![ProcessResult::failed(
                output_dir,
                format!("Failed to create output directory: {e}"),
            )];
        }

        let process = |input: &PathBuf| {
            let output = output_dir.join(batch_output_name(input));
            self.extract_file(input, &output)
        };

        #[cfg(feature = "parallel")]
        {
            use rayon::prelude::*;
            entries.par_iter().map(process).collect()
        }

        #[cfg(not(feature = "parallel"))]
        {
            entries.iter().map(process).collect()
        }
    }
}

/// `a.bmp` -> `a_bmp.png`.
fn batch_output_name(input: &Path) -> String {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    match input.extension() {
        Some(ext) => format!("{stem}_{}.png", ext.to_string_lossy()),
        None => format!("{stem}.png"),
    }
}

/// Whether saving to `path` would re-encode lossily.
fn is_lossy_output(path: &Path) -> bool {
    matches!(ImageFormat::from_path(path), Ok(ImageFormat::Jpeg))
}

fn write_output(img: &RgbImage, output: &Path) -> Result<()> {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent)?;
        }
    }
    save_image(img, output)
}

/// Check if a file has a supported image extension.
#[must_use]
pub fn is_supported_image(path: &Path) -> bool {
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => matches!(
            ext.to_lowercase().as_str(),
            "jpg" | "jpeg" | "png" | "webp" | "bmp"
        ),
        None => false,
    }
}

/// Save an RGB image, picking the encoder from the file extension.
///
/// JPEG is written at quality 100, but any lossy format will still disturb
/// the embedded coefficients; prefer PNG for watermarked output.
///
/// # Errors
///
/// Returns an error if the format is unsupported or writing fails.
pub fn save_image(img: &RgbImage, path: &Path) -> Result<()> {
    let format =
        ImageFormat::from_path(path).map_err(|e| Error::UnsupportedFormat(e.to_string()))?;

    match format {
        ImageFormat::Jpeg => {
            let file = std::fs::File::create(path)?;
            let mut encoder = image::codecs::jpeg::JpegEncoder::new_with_quality(file, 100);
            encoder.encode_image(img)?;
        }
        ImageFormat::Png | ImageFormat::WebP | ImageFormat::Bmp => {
            DynamicImage::ImageRgb8(img.clone()).save_with_format(path, format)?;
        }
        _ => {
            return Err(Error::UnsupportedFormat(format!("{format:?}")));
        }
    }

    Ok(())
}

/// Generate a default PNG output path next to `input`.
///
/// Example: `"photo.jpg"` with suffix `"watermarked"` becomes `"photo_watermarked.png"`.
#[must_use]
pub fn default_output_path(input: &Path, suffix: &str) -> PathBuf {
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    let parent = input.parent().unwrap_or(Path::new("."));
    parent.join(format!("{stem}_{suffix}.png"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn engine_rejects_invalid_options() {
        let opts = WatermarkOptions {
            alpha: 0.0,
            ..WatermarkOptions::default()
        };
        assert!(WatermarkEngine::new(opts).is_err());
        assert!(WatermarkEngine::new(WatermarkOptions::default()).is_ok());
    }

    #[test]
    fn default_output_path_appends_suffix_as_png() {
        let p = default_output_path(Path::new("/tmp/photo.jpg"), "watermarked");
        assert_eq!(p, PathBuf::from("/tmp/photo_watermarked.png"));

        let p = default_output_path(Path::new("image.png"), "extracted");
        assert_eq!(
            p.file_name().unwrap().to_str().unwrap(),
            "image_extracted.png"
        );
    }

    #[test]
    fn is_supported_image_accepts_common_formats() {
        assert!(is_supported_image(Path::new("photo.jpg")));
        assert!(is_supported_image(Path::new("photo.JPEG")));
        assert!(is_supported_image(Path::new("photo.png")));
        assert!(is_supported_image(Path::new("photo.webp")));
        assert!(is_supported_image(Path::new("photo.bmp")));
    }

    #[test]
    fn is_supported_image_rejects_unsupported_formats() {
        assert!(!is_supported_image(Path::new("photo.gif")));
        assert!(!is_supported_image(Path::new("photo.txt")));
        assert!(!is_supported_image(Path::new("photo")));
    }

    #[test]
    fn batch_output_name_keeps_source_extension() {
        assert_eq!(batch_output_name(Path::new("/in/a.png")), "a_png.png");
        assert_eq!(batch_output_name(Path::new("/in/a.bmp")), "a_bmp.png");
        assert_eq!(batch_output_name(Path::new("/in/a.JPG")), "a_JPG.png");
    }

    #[test]
    fn jpeg_outputs_are_lossy() {
        assert!(is_lossy_output(Path::new("out.jpg")));
        assert!(is_lossy_output(Path::new("out.JPEG")));
        assert!(!is_lossy_output(Path::new("out.png")));
        assert!(!is_lossy_output(Path::new("out.bmp")));
    }

    #[test]
    fn save_image_rejects_unknown_extension() {
        let img = RgbImage::new(8, 8);
        assert!(matches!(
            save_image(&img, Path::new("out.unknownext")),
            Err(Error::UnsupportedFormat(_))
        ));
    }
}
