//! Fit a watermark inside the host's dimensions, preserving aspect ratio.

use image::imageops::{self, FilterType};
use image::RgbImage;

use crate::error::{Error, Result};

/// A watermark resampled to fit its host.
#[derive(Debug, Clone)]
pub struct ScaledWatermark {
    /// The resampled grid.
    pub image: RgbImage,
    /// Width of [`ScaledWatermark::image`].
    pub width: u32,
    /// Height of [`ScaledWatermark::image`].
    pub height: u32,
}

/// Compute the scaled watermark size for a host of `host_width x host_height`.
///
/// Uses the uniform factor `min(host_w / wm_w, host_h / wm_h)`. Each result is
/// floored and kept within `1..=host`, so it never exceeds the host.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] if either the watermark or the host has
/// a zero dimension.
pub fn fit_dimensions(
    wm_width: u32,
    wm_height: u32,
    host_width: u32,
    host_height: u32,
) -> Result<(u32, u32)> {
    if wm_width == 0 || wm_height == 0 {
        return Err(Error::InvalidDimensions {
            width: wm_width,
            height: wm_height,
            block_size: 1,
        });
    }
    if host_width == 0 || host_height == 0 {
        return Err(Error::InvalidDimensions {
            width: host_width,
            height: host_height,
            block_size: 1,
        });
    }

    let scale = (f64::from(host_width) / f64::from(wm_width))
        .min(f64::from(host_height) / f64::from(wm_height));

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let fit = |dim: u32, bound: u32| ((f64::from(dim) * scale).floor() as u32).clamp(1, bound);

    Ok((fit(wm_width, host_width), fit(wm_height, host_height)))
}

/// Resample `watermark` so it fits inside a `host_width x host_height` grid.
///
/// If the computed size matches the source, the source is copied unchanged.
///
/// # Errors
///
/// Returns [`Error::InvalidDimensions`] for zero-sized inputs.
pub fn scale_to_fit(
    watermark: &RgbImage,
    host_width: u32,
    host_height: u32,
    filter: FilterType,
) -> Result<ScaledWatermark> {
    let (width, height) = fit_dimensions(
        watermark.width(),
        watermark.height(),
        host_width,
        host_height,
    )?;

    let image = if (width, height) == watermark.dimensions() {
        watermark.clone()
    } else {
        imageops::resize(watermark, width, height, filter)
    };

    log::debug!(
        "scaled watermark {}x{} -> {width}x{height} for {host_width}x{host_height} host",
        watermark.width(),
        watermark.height(),
    );

    Ok(ScaledWatermark {
        image,
        width,
        height,
    })
}
