//! Block decomposition of pixel grids and block write-back.
//!
//! Offsets are aligned to multiples of the block size and scanned in row-major
//! order. A trailing strip narrower than one block (the ragged edge) is never
//! yielded.

use image::RgbImage;

use crate::transform::{Block, SquareMatrix};

/// Top-left corner of a block, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BlockOffset {
    /// Column of the block's left edge.
    pub x: u32,
    /// Row of the block's top edge.
    pub y: u32,
}

/// Block grid over a `width x height` pixel grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockLayout {
    width: u32,
    height: u32,
    block_size: u32,
}

impl BlockLayout {
    /// Describe the block grid of a `width x height` image.
    ///
    /// A `block_size` of zero yields an empty layout.
    #[must_use]
    pub fn new(width: u32, height: u32, block_size: u32) -> Self {
        Self {
            width,
            height,
            block_size,
        }
    }

    /// Layout covering an image.
    #[must_use]
    pub fn of(image: &RgbImage, block_size: u32) -> Self {
        Self::new(image.width(), image.height(), block_size)
    }

    /// Number of whole blocks per row.
    #[must_use]
    pub fn columns(&self) -> u32 {
        self.width.checked_div(self.block_size).unwrap_or(0)
    }

    /// Number of whole block rows.
    #[must_use]
    pub fn rows(&self) -> u32 {
        self.height.checked_div(self.block_size).unwrap_or(0)
    }

    /// Total number of blocks that will be processed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns() as usize * self.rows() as usize
    }

    /// Whether no whole block fits.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Width and height of the unprocessed right and bottom strips.
    #[must_use]
    pub fn ragged_edges(&self) -> (u32, u32) {
        (
            self.width - self.columns() * self.block_size,
            self.height - self.rows() * self.block_size,
        )
    }

    /// Row-major iterator over every whole block's offset.
    ///
    /// The iterator is lazy and `Clone`, and calling this again restarts it.
    pub fn offsets(&self) -> impl Iterator<Item = BlockOffset> + Clone + '_ {
        let size = self.block_size;
        let columns = self.columns();
        (0..self.rows()).flat_map(move |row| {
            (0..columns).map(move |col| BlockOffset {
                x: col * size,
                y: row * size,
            })
        })
    }
}

/// Where a processed block is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelTarget {
    /// Same value into R, G and B.
    Broadcast,
    /// Only the given channel index (0 = R, 1 = G, 2 = B).
    Single(usize),
}

/// Read one channel of a `block_size` square starting at `offset`.
///
/// Indexing uses the grid's own width and height. Samples that fall outside
/// the grid read as `0.0`, which is how a watermark smaller than the host is
/// padded.
#[must_use]
pub fn read_block(grid: &RgbImage, channel: usize, offset: BlockOffset, block_size: u32) -> Block {
    SquareMatrix::from_fn(block_size as usize, |row, col| {
        #[allow(clippy::cast_possible_truncation)]
        let (dx, dy) = (col as u32, row as u32);
        grid.get_pixel_checked(offset.x + dx, offset.y + dy)
            .map_or(0.0, |px| f64::from(px[channel]))
    })
}

/// Write a block back into `grid` at `offset`, rounding and clamping to `0..=255`.
///
/// Samples that land outside the grid are dropped.
pub fn write_block(grid: &mut RgbImage, offset: BlockOffset, block: &Block, target: ChannelTarget) {
    let n = block.size();
    for (idx, &value) in block.as_slice().iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        let (dx, dy) = ((idx % n) as u32, (idx / n) as u32);
        let Some(px) = grid.get_pixel_mut_checked(offset.x + dx, offset.y + dy) else {
            continue;
        };
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let sample = value.round().clamp(0.0, 255.0) as u8;
        match target {
            ChannelTarget::Broadcast => {
                px[0] = sample;
                px[1] = sample;
                px[2] = sample;
            }
            ChannelTarget::Single(ch) => px[ch] = sample,
        }
    }
}
