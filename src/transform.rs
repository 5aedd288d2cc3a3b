//! Block transform engine: orthonormal 2D DCT-II and its inverse (DCT-III).
//!
//! For an `N x N` block `f`:
//!
//! `F[u][v] = (2/N) * C(u) * C(v) * sum_i sum_j f[i][j] * cos((2i+1)u*pi/2N) * cos((2j+1)v*pi/2N)`
//!
//! with `C(0) = 1/sqrt(2)` and `C(k) = 1` otherwise. At `N = 8` the leading
//! factor is the familiar `0.25`. The inverse applies the same basis in the
//! opposite direction, so `idct(dct(b)) == b` up to floating-point error.
//!
//! Both directions run `rustdct`'s unnormalized 1D DCT-II/DCT-III over the
//! rows, then over the columns of the transposed block, and apply the
//! normalization afterwards.

use std::f64::consts::{FRAC_1_SQRT_2, SQRT_2};
use std::fmt;
use std::sync::Arc;

use rustdct::{Dct2, Dct3, DctPlanner, TransformType2And3};

use crate::error::{Error, Result};

/// A square, row-major matrix of `f64` values.
///
/// Used both for spatial blocks and for their frequency coefficients.
#[derive(Debug, Clone, PartialEq)]
pub struct SquareMatrix {
    size: usize,
    data: Vec<f64>,
}

/// A square tile of spatial intensity samples.
pub type Block = SquareMatrix;

/// The frequency-domain representation of a [`Block`].
pub type CoefficientMatrix = SquareMatrix;

impl SquareMatrix {
    /// Build a matrix from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockSizeMismatch`] if `size` is zero or `data` does
    /// not hold exactly `size * size` values.
    pub fn new(size: usize, data: Vec<f64>) -> Result<Self> {
        if size == 0 || data.len() != size * size {
            return Err(Error::BlockSizeMismatch {
                expected: size,
                actual: data.len().isqrt(),
            });
        }
        Ok(Self { size, data })
    }

    /// Build a `size x size` matrix from `f(row, col)`.
    #[must_use]
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut data = Vec::with_capacity(size * size);
        for row in 0..size {
            for col in 0..size {
                data.push(f(row, col));
            }
        }
        Self { size, data }
    }

    /// A `size x size` matrix with every entry set to `value`.
    #[must_use]
    pub fn filled(size: usize, value: f64) -> Self {
        Self {
            size,
            data: vec![value; size * size],
        }
    }

    /// Side length.
    #[must_use]
    pub fn size(&self) -> usize {
        self.size
    }

    /// Entry at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is not below [`SquareMatrix::size`].
    #[must_use]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        assert!(row < self.size && col < self.size, "index out of block");
        self.data[row * self.size + col]
    }

    /// Row-major view of all entries.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    /// Add `weight * other` to every entry.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockSizeMismatch`] if the sides differ.
    pub fn add_scaled(&mut self, other: &Self, weight: f64) -> Result<()> {
        if other.size != self.size {
            return Err(Error::BlockSizeMismatch {
                expected: self.size,
                actual: other.size,
            });
        }
        for (dst, src) in self.data.iter_mut().zip(&other.data) {
            *dst += weight * src;
        }
        Ok(())
    }

    /// Multiply every entry by `factor`.
    pub fn scale(&mut self, factor: f64) {
        for v in &mut self.data {
            *v *= factor;
        }
    }
}

/// Transpose a row-major `n x n` buffer in place.
fn transpose(buf: &mut [f64], n: usize) {
    for i in 0..n {
        for j in (i + 1)..n {
            buf.swap(i * n + j, j * n + i);
        }
    }
}

/// Planned 1D DCT for one block size.
///
/// The planned transform is unnormalized: DCT-II gives
/// `X[k] = sum_n x[n] cos((2n+1) k pi / 2N)` and DCT-III gives
/// `x[n] = X[0]/2 + sum_{k>0} X[k] cos(..)`. Weights are applied around it.
#[derive(Clone)]
pub struct DctBasis {
    n: usize,
    dct: Arc<dyn TransformType2And3<f64>>,
}

impl fmt::Debug for DctBasis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DctBasis").field("n", &self.n).finish_non_exhaustive()
    }
}

impl DctBasis {
    /// Plan the transform for `n x n` blocks.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ParameterOutOfRange`] if `n` is zero.
    pub fn new(n: usize) -> Result<Self> {
        if n == 0 {
            return Err(Error::ParameterOutOfRange {
                name: "block_size",
                value: n.to_string(),
            });
        }

        let mut planner = DctPlanner::new();
        Ok(Self {
            n,
            dct: planner.plan_dct2(n),
        })
    }

    /// Block side this basis was built for.
    #[must_use]
    pub fn size(&self) -> usize {
        self.n
    }

    fn check(&self, m: &SquareMatrix) -> Result<()> {
        if m.size == self.n {
            Ok(())
        } else {
            Err(Error::BlockSizeMismatch {
                expected: self.n,
                actual: m.size,
            })
        }
    }

    /// `2/N` normalization.
    fn norm(&self) -> f64 {
        #[allow(clippy::cast_precision_loss)]
        let n = self.n as f64;
        2.0 / n
    }

    /// Forward 2D DCT-II.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockSizeMismatch`] if the block side differs from the basis.
    pub fn forward(&self, block: &Block) -> Result<CoefficientMatrix> {
        self.check(block)?;
        let n = self.n;
        let mut buf = block.data.clone();

        for row in buf.chunks_exact_mut(n) {
            self.dct.process_dct2(row);
        }
        transpose(&mut buf, n);
        for row in buf.chunks_exact_mut(n) {
            self.dct.process_dct2(row);
        }
        transpose(&mut buf, n);

        // C(u) * C(v) * 2/N
        let norm = self.norm();
        for (idx, v) in buf.iter_mut().enumerate() {
            let cu = if idx / n == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            let cv = if idx % n == 0 { FRAC_1_SQRT_2 } else { 1.0 };
            *v *= norm * cu * cv;
        }

        Ok(SquareMatrix { size: n, data: buf })
    }

    /// Inverse 2D DCT (DCT-III with matching normalization).
    ///
    /// # Errors
    ///
    /// Returns [`Error::BlockSizeMismatch`] if the matrix side differs from the basis.
    pub fn inverse(&self, coefficients: &CoefficientMatrix) -> Result<Block> {
        self.check(coefficients)?;
        let n = self.n;
        let mut buf = coefficients.data.clone();

        // C(0) = 1/sqrt(2), doubled to undo the DCT-III's halved DC term.
        for (idx, v) in buf.iter_mut().enumerate() {
            if idx / n == 0 {
                *v *= SQRT_2;
            }
            if idx % n == 0 {
                *v *= SQRT_2;
            }
        }

        for row in buf.chunks_exact_mut(n) {
            self.dct.process_dct3(row);
        }
        transpose(&mut buf, n);
        for row in buf.chunks_exact_mut(n) {
            self.dct.process_dct3(row);
        }
        transpose(&mut buf, n);

        let norm = self.norm();
        for v in &mut buf {
            *v *= norm;
        }

        Ok(SquareMatrix { size: n, data: buf })
    }
}

/// Forward 2D DCT of a block, building a basis for its size.
///
/// Prefer [`DctBasis::forward`] when transforming many blocks.
///
/// # Errors
///
/// Propagates [`DctBasis::new`] failures.
pub fn dct(block: &Block) -> Result<CoefficientMatrix> {
    DctBasis::new(block.size())?.forward(block)
}

/// Inverse 2D DCT of a coefficient matrix, building a basis for its size.
///
/// # Errors
///
/// Propagates [`DctBasis::new`] failures.
pub fn idct(coefficients: &CoefficientMatrix) -> Result<Block> {
    DctBasis::new(coefficients.size())?.inverse(coefficients)
}
