//! Core data types for gridkit

use serde::Serialize;
use crate::error::{Error, Result};

/// Represents grid dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Dimensions {
    /// Width in samples
    pub width: usize,
    /// Height in samples
    pub height: usize,
}

impl Dimensions {
    /// Creates new dimensions
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height }
    }

    /// Returns the total number of samples
    pub fn pixel_count(&self) -> usize {
        self.width * self.height
    }
}

/// A rectangular region of a grid, in sample coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Rectangle {
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
}

impl Rectangle {
    pub fn new(x: usize, y: usize, width: usize, height: usize) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle covering the whole of `dims`
    pub fn full(dims: Dimensions) -> Self {
        Self::new(0, 0, dims.width, dims.height)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Clips this rectangle to `dims`, returning `None` when nothing is left
    pub fn clamp_to(&self, dims: Dimensions) -> Option<Rectangle> {
        if self.x >= dims.width || self.y >= dims.height {
            return None;
        }
        let width = self.width.min(dims.width - self.x);
        let height = self.height.min(dims.height - self.y);
        let clipped = Rectangle::new(self.x, self.y, width, height);
        (!clipped.is_empty()).then_some(clipped)
    }
}

/// Dense row-major destination buffer for decoded samples
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl Raster {
    /// Creates a raster filled with `fill`
    pub fn new(width: usize, height: usize, fill: f64) -> Self {
        Self {
            width,
            height,
            data: vec![fill; width * height],
        }
    }

    /// Like [`new`](Self::new), but fails instead of aborting when the
    /// sample count overflows or cannot be allocated
    pub fn try_new(width: usize, height: usize, fill: f64) -> Result<Self> {
        let len = width.checked_mul(height).ok_or_else(|| {
            Error::OutOfBounds(format!("{}x{} raster overflows the address space", width, height))
        })?;
        let mut data = Vec::new();
        data.try_reserve_exact(len).map_err(|e| {
            Error::OutOfBounds(format!("cannot allocate a {}x{} raster: {}", width, height, e))
        })?;
        data.resize(len, fill);
        Ok(Self { width, height, data })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn dimensions(&self) -> Dimensions {
        Dimensions::new(self.width, self.height)
    }

    /// Sample at column `x`, row `y`
    pub fn get(&self, x: usize, y: usize) -> Option<f64> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.data.get(y * self.width + x).copied()
    }

    pub fn set(&mut self, x: usize, y: usize, value: f64) {
        if x < self.width && y < self.height {
            self.data[y * self.width + x] = value;
        }
    }

    /// Row `y` as a slice
    pub fn row(&self, y: usize) -> &[f64] {
        &self.data[y * self.width..(y + 1) * self.width]
    }

    pub fn data(&self) -> &[f64] {
        &self.data
    }

    pub fn into_data(self) -> Vec<f64> {
        self.data
    }
}
