use std::fmt;
use std::ops::{Index, IndexMut};

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Reduction axis for [`Matrix::mean`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    /// Collapse along rows: result is `[1, cols]`, each entry the column
    /// average over all rows.
    Row,
    /// Collapse along columns: result is `[rows, 1]`.
    Col,
    /// Collapse everything: result is `[1, 1]`, the grand average.
    All,
}

/// A dense 2D matrix of `f64` values.
///
/// The shape is fixed at construction; the backing store is a flat
/// row-major `Vec` whose length is always exactly `rows * cols`.
/// Binary operations (`mat_mul`, `mat_add`, `elem_wise_mul`) return a
/// fresh matrix and never mutate or alias their operands; only the
/// scalar and elementwise operations mutate the receiver in place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    rows: usize,
    cols: usize,
    data: Vec<f64>,
}

impl Matrix {
    /// Creates a `rows x cols` matrix with every entry set to zero.
    pub fn new(rows: usize, cols: usize) -> Result<Matrix> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape(format!(
                "matrix dimensions must be positive, got {rows}x{cols}"
            )));
        }
        Ok(Matrix {
            rows,
            cols,
            data: vec![0.0; rows * cols],
        })
    }

    /// Builds a matrix from nested rows. Every row must have the same
    /// length as the first, and neither dimension may be empty.
    pub fn from_rows(values: Vec<Vec<f64>>) -> Result<Matrix> {
        let rows = values.len();
        if rows == 0 {
            return Err(Error::InvalidShape("no rows provided".into()));
        }
        let cols = values[0].len();
        if cols == 0 {
            return Err(Error::InvalidShape("rows must not be empty".into()));
        }
        for (i, row) in values.iter().enumerate() {
            if row.len() != cols {
                return Err(Error::InvalidShape(format!(
                    "row {i} has length {}, expected {cols}",
                    row.len()
                )));
            }
        }

        let mut data = Vec::with_capacity(rows * cols);
        for row in &values {
            data.extend_from_slice(row);
        }
        Ok(Matrix { rows, cols, data })
    }

    /// Gaussian-random matrix with mean 0 and standard deviation
    /// `1 / sqrt(rows * cols)`, drawn from the thread-local RNG.
    pub fn rand_gaussian(rows: usize, cols: usize) -> Result<Matrix> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidShape(format!(
                "matrix dimensions must be positive, got {rows}x{cols}"
            )));
        }
        let std_dev = 1.0 / ((rows * cols) as f64).sqrt();
        Matrix::rand_gaussian_with(rows, cols, 0.0, std_dev, &mut rand::thread_rng())
    }

    /// Gaussian-random matrix with explicit mean, standard deviation and
    /// random source. Passing a seeded RNG makes the result reproducible.
    pub fn rand_gaussian_with<R: Rng + ?Sized>(
        rows: usize,
        cols: usize,
        mean: f64,
        std_dev: f64,
        rng: &mut R,
    ) -> Result<Matrix> {
        // rand_distr's Normal only rejects NaN, so validate here: a
        // negative or non-finite spread is a caller error.
        if !(std_dev.is_finite() && std_dev >= 0.0) {
            return Err(Error::InvalidArgument(format!(
                "standard deviation must be finite and non-negative, got {std_dev}"
            )));
        }
        if !mean.is_finite() {
            return Err(Error::InvalidArgument(format!(
                "mean must be finite, got {mean}"
            )));
        }
        let mut result = Matrix::new(rows, cols)?;
        let dist = Normal::new(mean, std_dev)
            .map_err(|e| Error::InvalidArgument(format!("bad Gaussian parameters: {e}")))?;
        for val in &mut result.data {
            *val = dist.sample(rng);
        }
        Ok(result)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// The flat row-major backing store.
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }

    fn idx(&self, i: usize, j: usize) -> usize {
        i * self.cols + j
    }

    fn check_bounds(&self, i: usize, j: usize) -> Result<()> {
        if i >= self.rows || j >= self.cols {
            return Err(Error::OutOfBounds {
                row: i,
                col: j,
                rows: self.rows,
                cols: self.cols,
            });
        }
        Ok(())
    }

    /// Checked element read.
    pub fn get(&self, i: usize, j: usize) -> Result<f64> {
        self.check_bounds(i, j)?;
        Ok(self.data[self.idx(i, j)])
    }

    /// Checked element write.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<()> {
        self.check_bounds(i, j)?;
        let idx = self.idx(i, j);
        self.data[idx] = value;
        Ok(())
    }

    /// Standard matrix product. Requires `self.cols == other.rows`;
    /// the result has shape `[self.rows, other.cols]`.
    ///
    /// Each entry is accumulated row by row with `k` ascending, so the
    /// summation order (and therefore the rounding) is deterministic.
    pub fn mat_mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.rows {
            return Err(Error::DimensionMismatch(format!(
                "cannot multiply {}x{} by {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut result = Matrix::new(self.rows, other.cols)?;
        for i in 0..self.rows {
            for j in 0..other.cols {
                let mut sum = 0.0;
                for k in 0..self.cols {
                    sum += self.data[self.idx(i, k)] * other.data[other.idx(k, j)];
                }
                let idx = result.idx(i, j);
                result.data[idx] = sum;
            }
        }
        Ok(result)
    }

    /// Elementwise sum with single-row broadcasting.
    ///
    /// If the shapes match exactly the matrices are added entry by entry.
    /// If exactly one operand has a single row and the column counts
    /// match, that row is broadcast across every row of the other
    /// operand. Anything else is a `DimensionMismatch`.
    pub fn mat_add(&self, other: &Matrix) -> Result<Matrix> {
        if self.cols != other.cols {
            return Err(Error::DimensionMismatch(format!(
                "cannot add {}x{} and {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }
        if self.rows != other.rows {
            if self.rows == 1 {
                // Swap operands so only one broadcast case needs handling.
                return other.mat_add(self);
            }
            if other.rows != 1 {
                return Err(Error::DimensionMismatch(format!(
                    "cannot add {}x{} and {}x{}",
                    self.rows, self.cols, other.rows, other.cols
                )));
            }
        }

        let broadcast = other.rows == 1 && self.rows != 1;
        let mut result = Matrix::new(self.rows, self.cols)?;
        for i in 0..self.rows {
            let other_row = if broadcast { 0 } else { i };
            for j in 0..self.cols {
                let idx = result.idx(i, j);
                result.data[idx] =
                    self.data[self.idx(i, j)] + other.data[other.idx(other_row, j)];
            }
        }
        Ok(result)
    }

    /// Hadamard (elementwise) product. Shapes must match exactly;
    /// no broadcasting.
    pub fn elem_wise_mul(&self, other: &Matrix) -> Result<Matrix> {
        if self.rows != other.rows || self.cols != other.cols {
            return Err(Error::DimensionMismatch(format!(
                "cannot elementwise-multiply {}x{} and {}x{}",
                self.rows, self.cols, other.rows, other.cols
            )));
        }

        let mut result = Matrix::new(self.rows, self.cols)?;
        for (out, (a, b)) in result
            .data
            .iter_mut()
            .zip(self.data.iter().zip(other.data.iter()))
        {
            *out = a * b;
        }
        Ok(result)
    }

    /// Adds `scalar` to every entry in place.
    pub fn scalar_add(&mut self, scalar: f64) {
        for val in &mut self.data {
            *val += scalar;
        }
    }

    /// Multiplies every entry by `scalar` in place.
    pub fn scalar_mul(&mut self, scalar: f64) {
        for val in &mut self.data {
            *val *= scalar;
        }
    }

    /// Replaces every entry `x` with `f(x)` in place.
    pub fn apply_elementwise<F>(&mut self, f: F)
    where
        F: Fn(f64) -> f64,
    {
        for val in &mut self.data {
            *val = f(*val);
        }
    }

    /// Returns a new `[cols, rows]` matrix with `result[j][i] = self[i][j]`.
    pub fn transpose(&self) -> Matrix {
        let mut result = Matrix {
            rows: self.cols,
            cols: self.rows,
            data: vec![0.0; self.data.len()],
        };
        for i in 0..self.rows {
            for j in 0..self.cols {
                let idx = result.idx(j, i);
                result.data[idx] = self.data[self.idx(i, j)];
            }
        }
        result
    }

    /// Mean reduction along the given axis; see [`Axis`] for the
    /// resulting shapes.
    pub fn mean(&self, axis: Axis) -> Matrix {
        match axis {
            Axis::Row => {
                let mut data = vec![0.0; self.cols];
                for (j, out) in data.iter_mut().enumerate() {
                    let mut sum = 0.0;
                    for i in 0..self.rows {
                        sum += self.data[self.idx(i, j)];
                    }
                    *out = sum / self.rows as f64;
                }
                Matrix {
                    rows: 1,
                    cols: self.cols,
                    data,
                }
            }
            Axis::Col => {
                let mut data = vec![0.0; self.rows];
                for (i, out) in data.iter_mut().enumerate() {
                    let mut sum = 0.0;
                    for j in 0..self.cols {
                        sum += self.data[self.idx(i, j)];
                    }
                    *out = sum / self.cols as f64;
                }
                Matrix {
                    rows: self.rows,
                    cols: 1,
                    data,
                }
            }
            Axis::All => {
                let sum: f64 = self.data.iter().sum();
                Matrix {
                    rows: 1,
                    cols: 1,
                    data: vec![sum / self.data.len() as f64],
                }
            }
        }
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (i, j): (usize, usize)) -> &f64 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &self.data[i * self.cols + j]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (i, j): (usize, usize)) -> &mut f64 {
        assert!(
            i < self.rows && j < self.cols,
            "index ({i}, {j}) out of bounds for {}x{} matrix",
            self.rows,
            self.cols
        );
        &mut self.data[i * self.cols + j]
    }
}

impl fmt::Display for Matrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "[")?;
        for i in 0..self.rows {
            write!(f, "\t[ ")?;
            for j in 0..self.cols {
                write!(f, "{}, ", self.data[self.idx(i, j)])?;
            }
            writeln!(f, "]")?;
        }
        write!(f, "]")
    }
}
