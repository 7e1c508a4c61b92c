//! Parallel tile decoding

use rayon::prelude::*;
use crate::error::{Error, Result};
use crate::io::{Backend, RandomAccessStream};
use crate::types::{Dimensions, Rectangle};
use super::raster::{AsciiGridRaster, CancellationToken, NoProgress, ReadParams, RasterRead};

/// Splits `dims` into row-major tiles of at most `tile_width` x `tile_height`
pub fn tile_grid(dims: Dimensions, tile_width: usize, tile_height: usize) -> Result<Vec<Rectangle>> {
    if tile_width == 0 || tile_height == 0 {
        return Err(Error::OutOfBounds(format!(
            "tile size must be positive, got {}x{}",
            tile_width, tile_height
        )));
    }

    let mut tiles = Vec::new();
    for y in (0..dims.height).step_by(tile_height) {
        for x in (0..dims.width).step_by(tile_width) {
            tiles.push(Rectangle::new(
                x,
                y,
                tile_width.min(dims.width - x),
                tile_height.min(dims.height - y),
            ));
        }
    }
    Ok(tiles)
}

/// Reads multiple tiles in parallel
///
/// Each tile gets its own stream from `open`; the marker index and extrema
/// of `raster` are shared, so tiles lower in the grid reuse scan positions
/// recorded by tiles above them. Results come back in the order of `tiles`.
pub fn read_tiles<B, F>(
    raster: &AsciiGridRaster,
    open: F,
    tiles: &[Rectangle],
    x_subsampling: usize,
    y_subsampling: usize,
    cancel: &CancellationToken,
) -> Result<Vec<RasterRead>>
where
    B: Backend,
    F: Fn() -> Result<RandomAccessStream<B>> + Sync,
{
    log::debug!("decoding {} tiles in parallel", tiles.len());

    let tile_results: Vec<_> = tiles
        .par_iter()
        .map(|&tile| {
            let mut stream = open()?;
            let params = ReadParams::new()
                .with_region(tile)
                .with_subsampling(x_subsampling, y_subsampling);
            raster.read_raster(&mut stream, &params, &mut NoProgress, cancel)
        })
        .collect();

    let mut results = Vec::with_capacity(tiles.len());
    for result in tile_results {
        results.push(result?);
    }

    Ok(results)
}
