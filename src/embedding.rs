//! Coefficient-domain watermark embedding and blind extraction.
//!
//! Embedding adds a scaled copy of the watermark's block DCT to the host's:
//! `F_host' = F_host + alpha * F_watermark`
//!
//! Extraction divides a candidate's block DCT by the same `alpha`:
//! `F_mark = F_candidate / alpha`
//!
//! Extraction is blind. Applied to `embed(H, W)` it yields `H / alpha + W`,
//! which approximates `W` only where the host is dark. It never checks whether
//! a watermark is present.

use image::imageops::FilterType;
use image::RgbImage;

use crate::blocks::{read_block, write_block, BlockLayout, BlockOffset, ChannelTarget};
use crate::error::{Error, Result};
use crate::scale;
use crate::transform::{Block, DctBasis};

/// Default blend strength.
pub const DEFAULT_ALPHA: f64 = 0.1;

/// Default block side in pixels.
pub const DEFAULT_BLOCK_SIZE: u32 = 8;

/// How colour channels are fed through the transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelMode {
    /// Transform the red channel only and write the result to all three.
    ///
    /// Processed regions become grayscale.
    #[default]
    Broadcast,
    /// Transform R, G and B independently, preserving colour.
    PerChannel,
}

impl ChannelMode {
    /// `(source channel, write target)` pairs for one block.
    fn plan(self) -> &'static [(usize, ChannelTarget)] {
        match self {
            Self::Broadcast => &[(0, ChannelTarget::Broadcast)],
            Self::PerChannel => &[
                (0, ChannelTarget::Single(0)),
                (1, ChannelTarget::Single(1)),
                (2, ChannelTarget::Single(2)),
            ],
        }
    }
}

/// Parameters shared by embedding and extraction.
///
/// `alpha` and `block_size` must match between the two or the recovered
/// watermark is meaningless.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatermarkOptions {
    /// Blend strength, in `(0, 1]`.
    pub alpha: f64,
    /// Block side in pixels.
    pub block_size: u32,
    /// Channel handling.
    pub channel_mode: ChannelMode,
    /// Resampling filter used to fit the watermark to the host.
    pub filter: FilterType,
}

impl Default for WatermarkOptions {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            block_size: DEFAULT_BLOCK_SIZE,
            channel_mode: ChannelMode::Broadcast,
            filter: FilterType::Triangle,
        }
    }
}

impl WatermarkOptions {
    /// Check `alpha` and `block_size`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterOutOfRange`] if `alpha` is not a finite value
    /// in `(0, 1]` or `block_size` is zero.
    pub fn validate(&self) -> Result<()> {
        if !(self.alpha.is_finite() && self.alpha > 0.0 && self.alpha <= 1.0) {
            return Err(Error::ParameterOutOfRange {
                name: "alpha",
                value: self.alpha.to_string(),
            });
        }
        if self.block_size == 0 {
            return Err(Error::ParameterOutOfRange {
                name: "block_size",
                value: self.block_size.to_string(),
            });
        }
        Ok(())
    }
}

/// Transformed samples for one block, ready to be written back.
struct BlockUpdate {
    offset: BlockOffset,
    channels: Vec<(ChannelTarget, Block)>,
}

/// Block layout of `grid`, rejecting grids that hold no whole block.
fn checked_layout(grid: &RgbImage, block_size: u32) -> Result<BlockLayout> {
    let layout = BlockLayout::of(grid, block_size);
    if layout.is_empty() {
        return Err(Error::InvalidDimensions {
            width: grid.width(),
            height: grid.height(),
            block_size,
        });
    }

    let (right, bottom) = layout.ragged_edges();
    if right > 0 || bottom > 0 {
        log::debug!(
            "leaving ragged edges unprocessed: {right}px right, {bottom}px bottom of {}x{}",
            grid.width(),
            grid.height(),
        );
    }
    log::debug!(
        "{}x{} blocks of {block_size}px",
        layout.columns(),
        layout.rows()
    );

    Ok(layout)
}

/// Run `work` on every block offset, in parallel when the `parallel` feature is on.
///
/// The first failing block aborts the pass.
fn run_blocks<F>(layout: &BlockLayout, work: F) -> Result<Vec<BlockUpdate>>
where
    F: Fn(BlockOffset) -> Result<BlockUpdate> + Send + Sync,
{
    let offsets: Vec<BlockOffset> = layout.offsets().collect();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        offsets.into_par_iter().map(work).collect()
    }

    #[cfg(not(feature = "parallel"))]
    {
        offsets.into_iter().map(work).collect()
    }
}

/// Write every update into `grid`. Blocks never overlap.
fn apply(grid: &mut RgbImage, updates: Vec<BlockUpdate>) {
    for update in updates {
        for (target, block) in &update.channels {
            write_block(grid, update.offset, block, *target);
        }
    }
}

/// Embed `watermark` into `host`, returning a new grid the size of `host`.
///
/// The watermark is first scaled to fit the host (aspect ratio preserved).
/// Host blocks whose origin lies inside the scaled watermark are blended.
/// Watermark samples past its own edge count as zero. Host blocks outside
/// the watermark only go through the DCT round trip. Ragged host edges are
/// copied through unchanged.
///
/// # Errors
///
/// * [`Error::ParameterOutOfRange`] for invalid options.
/// * [`Error::InvalidDimensions`] if the host holds no whole block or the
///   watermark has a zero dimension.
pub fn embed(host: &RgbImage, watermark: &RgbImage, options: &WatermarkOptions) -> Result<RgbImage> {
    options.validate()?;
    let layout = checked_layout(host, options.block_size)?;
    let scaled = scale::scale_to_fit(watermark, host.width(), host.height(), options.filter)?;
    let basis = DctBasis::new(options.block_size as usize)?;

    let host_area = u64::from(host.width()) * u64::from(host.height());
    let mark_area = u64::from(scaled.width) * u64::from(scaled.height);
    if mark_area * 2 < host_area {
        log::warn!(
            "watermark {}x{} covers under half of the {}x{} host",
            scaled.width,
            scaled.height,
            host.width(),
            host.height(),
        );
    }

    let block_size = options.block_size;
    let alpha = options.alpha;
    let plan = options.channel_mode.plan();

    let updates = run_blocks(&layout, |offset| {
        let covered = offset.x < scaled.width && offset.y < scaled.height;
        let mut channels = Vec::with_capacity(plan.len());
        for &(channel, target) in plan {
            let mut coefficients = basis.forward(&read_block(host, channel, offset, block_size))?;
            if covered {
                let mark = basis.forward(&read_block(&scaled.image, channel, offset, block_size))?;
                coefficients.add_scaled(&mark, alpha)?;
            }
            channels.push((target, basis.inverse(&coefficients)?));
        }
        Ok(BlockUpdate { offset, channels })
    })?;

    let mut output = host.clone();
    apply(&mut output, updates);
    Ok(output)
}

/// Recover a watermark from `candidate`, returning a new grid of the same size.
///
/// Ragged edges of the output stay black.
///
/// # Errors
///
/// * [`Error::ParameterOutOfRange`] for invalid options.
/// * [`Error::InvalidDimensions`] if the candidate holds no whole block.
pub fn extract(candidate: &RgbImage, options: &WatermarkOptions) -> Result<RgbImage> {
    options.validate()?;
    let layout = checked_layout(candidate, options.block_size)?;
    let basis = DctBasis::new(options.block_size as usize)?;

    let block_size = options.block_size;
    let gain = options.alpha.recip();
    let plan = options.channel_mode.plan();

    let updates = run_blocks(&layout, |offset| {
        let mut channels = Vec::with_capacity(plan.len());
        for &(channel, target) in plan {
            let mut coefficients =
                basis.forward(&read_block(candidate, channel, offset, block_size))?;
            coefficients.scale(gain);
            channels.push((target, basis.inverse(&coefficients)?));
        }
        Ok(BlockUpdate { offset, channels })
    })?;

    let mut output = RgbImage::new(candidate.width(), candidate.height());
    apply(&mut output, updates);
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn constant_blocks_blend_to_105() {
        let host = RgbImage::from_pixel(8, 8, Rgb([100, 100, 100]));
        let mark = RgbImage::from_pixel(8, 8, Rgb([50, 50, 50]));
        let out = embed(&host, &mark, &WatermarkOptions::default()).unwrap();
        for px in out.pixels() {
            assert_eq!(px.0, [105, 105, 105]);
        }
    }

    #[test]
    fn ragged_edges_pass_through_embed_and_stay_black_on_extract() {
        let host = RgbImage::from_pixel(20, 13, Rgb([40, 80, 120]));
        let mark = RgbImage::from_pixel(20, 13, Rgb([200, 200, 200]));

        let out = embed(&host, &mark, &WatermarkOptions::default()).unwrap();
        assert_eq!(out.dimensions(), (20, 13));
        assert_eq!(out.get_pixel(16, 0).0, [40, 80, 120]);
        assert_eq!(out.get_pixel(0, 8).0, [40, 80, 120]);
        assert_eq!(out.get_pixel(19, 12).0, [40, 80, 120]);
        // 40 + 0.1 * 200
        assert_eq!(out.get_pixel(3, 3).0, [60, 60, 60]);

        let recovered = extract(&out, &WatermarkOptions::default()).unwrap();
        assert_eq!(recovered.dimensions(), (20, 13));
        assert_eq!(recovered.get_pixel(17, 2).0, [0, 0, 0]);
        assert_eq!(recovered.get_pixel(2, 9).0, [0, 0, 0]);
    }

    #[test]
    fn blocks_outside_watermark_only_round_trip() {
        // 16x32 watermark into a 64x32 host scales to 16x32 and covers the
        // first two block columns.
        let host = RgbImage::from_pixel(64, 32, Rgb([90, 90, 90]));
        let mark = RgbImage::from_pixel(16, 32, Rgb([100, 100, 100]));
        let out = embed(&host, &mark, &WatermarkOptions::default()).unwrap();

        assert_eq!(out.get_pixel(0, 0).0, [100, 100, 100]);
        assert_eq!(out.get_pixel(15, 31).0, [100, 100, 100]);
        assert_eq!(out.get_pixel(16, 0).0, [90, 90, 90]);
        assert_eq!(out.get_pixel(63, 31).0, [90, 90, 90]);
    }

    #[test]
    fn broadcast_discards_colour_per_channel_keeps_it() {
        let host = RgbImage::from_pixel(16, 16, Rgb([10, 150, 240]));
        let mark = RgbImage::new(16, 16);

        let gray = embed(&host, &mark, &WatermarkOptions::default()).unwrap();
        assert_eq!(gray.get_pixel(5, 5).0, [10, 10, 10]);

        let opts = WatermarkOptions {
            channel_mode: ChannelMode::PerChannel,
            ..WatermarkOptions::default()
        };
        let colour = embed(&host, &mark, &opts).unwrap();
        assert_eq!(colour, host);
    }

    #[test]
    fn per_channel_blends_each_channel() {
        let host = RgbImage::from_pixel(8, 8, Rgb([0, 100, 200]));
        let mark = RgbImage::from_pixel(8, 8, Rgb([100, 50, 0]));
        let opts = WatermarkOptions {
            channel_mode: ChannelMode::PerChannel,
            ..WatermarkOptions::default()
        };
        let out = embed(&host, &mark, &opts).unwrap();
        assert_eq!(out.get_pixel(4, 4).0, [10, 105, 200]);
    }

    #[test]
    fn invalid_alpha_is_rejected() {
        let host = RgbImage::new(16, 16);
        let mark = RgbImage::new(16, 16);
        for alpha in [0.0, -0.1, 1.5, f64::NAN, f64::INFINITY] {
            let opts = WatermarkOptions {
                alpha,
                ..WatermarkOptions::default()
            };
            assert!(matches!(
                embed(&host, &mark, &opts),
                Err(Error::ParameterOutOfRange { name: "alpha", .. })
            ));
            assert!(matches!(
                extract(&host, &opts),
                Err(Error::ParameterOutOfRange { name: "alpha", .. })
            ));
        }
    }

    #[test]
    fn zero_block_size_is_rejected() {
        let opts = WatermarkOptions {
            block_size: 0,
            ..WatermarkOptions::default()
        };
        assert!(matches!(
            extract(&RgbImage::new(16, 16), &opts),
            Err(Error::ParameterOutOfRange {
                name: "block_size",
                ..
            })
        ));
    }

    #[test]
    fn grids_smaller_than_a_block_are_rejected() {
        let opts = WatermarkOptions::default();
        let tiny = RgbImage::new(7, 64);
        let mark = RgbImage::new(8, 8);
        assert!(matches!(
            embed(&tiny, &mark, &opts),
            Err(Error::InvalidDimensions {
                width: 7,
                height: 64,
                block_size: 8
            })
        ));
        assert!(matches!(
            extract(&RgbImage::new(0, 0), &opts),
            Err(Error::InvalidDimensions { .. })
        ));
    }

    #[test]
    fn zero_size_watermark_is_rejected() {
        let host = RgbImage::new(16, 16);
        let mark = RgbImage::new(0, 5);
        assert!(matches!(
            embed(&host, &mark, &WatermarkOptions::default()),
            Err(Error::InvalidDimensions { .. })
        ));
    }
}
