//! Raster grid and scalar fields shared by both sides of the coupling.
//!
//! Everything in this crate is row-major `(row, col)`: row 0 is the top row
//! and the flat index of a cell is `row * cols + col`. The land model and
//! the agent population must agree on this convention; it is checked once
//! when a coupled model is assembled.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    #[error("field shape {field_rows}x{field_cols} does not match grid {rows}x{cols}")]
    ShapeMismatch {
        rows: usize,
        cols: usize,
        field_rows: usize,
        field_cols: usize,
    },
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        rows: usize,
        cols: usize,
        row: usize,
        col: usize,
    },
}

/// Rectangular cell grid with uniform spacing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RasterGrid {
    rows: usize,
    cols: usize,
    spacing_m: f64,
}

impl RasterGrid {
    pub fn new(rows: usize, cols: usize, spacing_m: f64) -> Self {
        Self {
            rows,
            cols,
            spacing_m,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cell_count(&self) -> usize {
        self.rows * self.cols
    }

    pub fn spacing_m(&self) -> f64 {
        self.spacing_m
    }

    pub fn cell_area_m2(&self) -> f64 {
        self.spacing_m * self.spacing_m
    }

    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    /// Flat index of a cell, row-major.
    pub fn index(&self, row: usize, col: usize) -> usize {
        debug_assert!(self.contains(row, col));
        row * self.cols + col
    }

    /// 4-connected neighbors, clipped at the grid edge.
    pub fn neighbors4(&self, row: usize, col: usize) -> Vec<(usize, usize)> {
        let mut neighbors = Vec::with_capacity(4);
        if row > 0 {
            neighbors.push((row - 1, col));
        }
        if row + 1 < self.rows {
            neighbors.push((row + 1, col));
        }
        if col > 0 {
            neighbors.push((row, col - 1));
        }
        if col + 1 < self.cols {
            neighbors.push((row, col + 1));
        }
        neighbors
    }

    /// True for cells on the outermost ring, where boundary conditions apply.
    pub fn is_edge(&self, row: usize, col: usize) -> bool {
        row == 0 || col == 0 || row + 1 == self.rows || col + 1 == self.cols
    }
}

/// One physical quantity sampled at every grid cell.
///
/// Fields are allocated once and mutated in place by their owner; they cross
/// the coupling boundary only as explicit values, never as shared references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScalarField {
    rows: usize,
    cols: usize,
    values: Vec<f64>,
}

impl ScalarField {
    pub fn filled(rows: usize, cols: usize, value: f64) -> Self {
        Self {
            rows,
            cols,
            values: vec![value; rows * cols],
        }
    }

    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self::filled(rows, cols, 0.0)
    }

    pub fn from_fn(rows: usize, cols: usize, mut f: impl FnMut(usize, usize) -> f64) -> Self {
        let mut values = Vec::with_capacity(rows * cols);
        for row in 0..rows {
            for col in 0..cols {
                values.push(f(row, col));
            }
        }
        Self { rows, cols, values }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.values[row * self.cols + col]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.values[row * self.cols + col] = value;
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [f64] {
        &mut self.values
    }

    pub fn fill(&mut self, value: f64) {
        self.values.fill(value);
    }

    pub fn min(&self) -> f64 {
        self.values.iter().copied().fold(f64::INFINITY, f64::min)
    }

    pub fn max(&self) -> f64 {
        self.values
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max)
    }

    pub fn total(&self) -> f64 {
        self.values.iter().sum()
    }

    /// Error unless this field has exactly the given shape.
    pub fn ensure_shape(&self, rows: usize, cols: usize) -> Result<(), GridError> {
        if self.rows == rows && self.cols == cols {
            Ok(())
        } else {
            Err(GridError::ShapeMismatch {
                rows,
                cols,
                field_rows: self.rows,
                field_cols: self.cols,
            })
        }
    }
}
