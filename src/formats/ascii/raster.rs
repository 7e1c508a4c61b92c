//! Streaming raster fill for ASCII grids
//!
//! Samples are scanned in row-major order. Rows above the requested region
//! are skipped token by token; byte offsets reached at regular sample counts
//! are remembered in a shared [`TileMarkers`] index, so the next request for a
//! lower tile starts from the closest known point instead of the data start.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use crate::cache::TileMarkers;
use crate::error::{Error, Result};
use crate::io::{Backend, RandomAccessStream};
use crate::types::{Raster, Rectangle};
use super::header::GridHeader;
use super::lexer::{next_value, skip_token, NumberLexer};

/// Rows per tile when no tile height is configured
pub const DEFAULT_TILE_HEIGHT: usize = 256;

/// Number of progress checkpoints per read
const PROGRESS_STEPS: u64 = 10;

/// Receives percent-complete values during a read
pub trait ProgressSink {
    fn report(&mut self, percent: u8);
}

impl<F: FnMut(u8)> ProgressSink for F {
    fn report(&mut self, percent: u8) {
        self(percent)
    }
}

/// Progress sink that ignores every report
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn report(&mut self, _percent: u8) {}
}

/// Cooperative abort flag shared between a reader and whoever may stop it
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Which part of the grid to decode, and at what density
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadParams {
    /// Region in grid samples; `None` reads the whole grid
    pub source_region: Option<Rectangle>,
    /// Keep every n-th column
    pub x_subsampling: usize,
    /// Keep every n-th row
    pub y_subsampling: usize,
}

impl Default for ReadParams {
    fn default() -> Self {
        Self {
            source_region: None,
            x_subsampling: 1,
            y_subsampling: 1,
        }
    }
}

impl ReadParams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_region(mut self, region: Rectangle) -> Self {
        self.source_region = Some(region);
        self
    }

    pub fn with_subsampling(mut self, x: usize, y: usize) -> Self {
        self.x_subsampling = x;
        self.y_subsampling = y;
        self
    }
}

/// Tile geometry that sets how often scan positions are remembered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RasterConfig {
    pub tile_width: usize,
    pub tile_height: usize,
}

impl RasterConfig {
    pub fn new(tile_width: usize, tile_height: usize) -> Self {
        Self { tile_width, tile_height }
    }

    /// Full-width strips of [`DEFAULT_TILE_HEIGHT`] rows, clamped to the grid
    pub fn for_header(header: &GridHeader) -> Self {
        Self::new(header.ncols, DEFAULT_TILE_HEIGHT.min(header.nrows))
    }

    fn tile_area(&self) -> u64 {
        self.tile_width as u64 * self.tile_height as u64
    }
}

/// Outcome of one [`AsciiGridRaster::read_raster`] call
#[derive(Debug, Clone)]
pub struct RasterRead {
    /// Destination samples; cells never reached hold the NoData value
    pub raster: Raster,
    /// Source region actually read, after clamping
    pub region: Rectangle,
    /// `true` when the read stopped on cancellation
    pub aborted: bool,
    /// Smallest valid sample written
    pub min: Option<f64>,
    /// Largest valid sample written
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
struct Extrema {
    min: Option<f64>,
    max: Option<f64>,
}

impl Extrema {
    fn fold(&mut self, value: f64) {
        self.min = Some(self.min.map_or(value, |m| m.min(value)));
        self.max = Some(self.max.map_or(value, |m| m.max(value)));
    }

    fn merge(&mut self, other: Extrema) {
        if let Some(min) = other.min {
            self.fold(min);
        }
        if let Some(max) = other.max {
            self.fold(max);
        }
    }
}

#[derive(Debug, Default)]
struct ScanState {
    markers: TileMarkers,
    extrema: Extrema,
}

/// Decoder for the data section of one ASCII grid
///
/// Holds no stream: each read is given one, so several threads can decode
/// tiles of the same grid through their own streams while sharing the marker
/// index and the running extrema.
#[derive(Debug)]
pub struct AsciiGridRaster {
    header: GridHeader,
    config: RasterConfig,
    state: Mutex<ScanState>,
}

impl AsciiGridRaster {
    pub fn new(header: GridHeader) -> Self {
        let config = RasterConfig::for_header(&header);
        Self::build(header, config)
    }

    /// Uses `config` for marker spacing; both tile dimensions must be positive
    pub fn with_config(header: GridHeader, config: RasterConfig) -> Result<Self> {
        if config.tile_width == 0 || config.tile_height == 0 {
            return Err(Error::OutOfBounds(format!(
                "tile size must be positive, got {}x{}",
                config.tile_width, config.tile_height
            )));
        }
        Ok(Self::build(header, config))
    }

    fn build(header: GridHeader, config: RasterConfig) -> Self {
        let mut markers = TileMarkers::new();
        markers.insert(0, header.data_offset);
        Self {
            header,
            config,
            state: Mutex::new(ScanState {
                markers,
                extrema: Extrema::default(),
            }),
        }
    }

    pub fn header(&self) -> &GridHeader {
        &self.header
    }

    pub fn config(&self) -> RasterConfig {
        self.config
    }

    fn state(&self) -> MutexGuard<'_, ScanState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Snapshot of the remembered scan positions
    pub fn markers(&self) -> TileMarkers {
        self.state().markers.clone()
    }

    /// Extrema over every read so far, as `(min, max)`
    pub fn extrema(&self) -> Option<(f64, f64)> {
        let extrema = self.state().extrema;
        extrema.min.zip(extrema.max)
    }

    fn record_marker(&self, samples: u64, position: u64) {
        self.state().markers.insert(samples, position);
    }

    /// Decodes `params.source_region` from `stream` into a new raster
    ///
    /// Stops early with `aborted` set when `cancel` fires; the raster then
    /// holds whatever was decoded up to that point.
    pub fn read_raster<B: Backend>(
        &self,
        stream: &mut RandomAccessStream<B>,
        params: &ReadParams,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RasterRead> {
        let (x_factor, y_factor) = (params.x_subsampling, params.y_subsampling);
        if x_factor == 0 || y_factor == 0 {
            return Err(Error::OutOfBounds(format!(
                "subsampling factors must be at least 1, got {}x{}",
                x_factor, y_factor
            )));
        }

        let dims = self.header.dimensions();
        let requested = params.source_region.unwrap_or_else(|| Rectangle::full(dims));
        let region = requested.clamp_to(dims).ok_or_else(|| {
            Error::OutOfBounds(format!(
                "region {:?} lies outside the {}x{} grid",
                requested, dims.width, dims.height
            ))
        })?;

        let nodata = self.header.nodata_value();
        let mut raster = Raster::try_new(
            (region.width - 1) / x_factor + 1,
            (region.height - 1) / y_factor + 1,
            nodata,
        )?;

        let columns = dims.width as u64;
        let to_skip = columns * region.y as u64;
        let to_load = columns * region.height as u64;
        let tile_area = self.config.tile_area();

        let (mut scanned, start) = self
            .state()
            .markers
            .floor(to_skip)
            .unwrap_or((0, self.header.data_offset));
        if scanned > 0 {
            log::debug!(
                "{}: resuming scan at sample {} (byte {})",
                stream.location(),
                scanned,
                start
            );
        }
        stream.seek(start)?;

        let total = (to_skip - scanned) + to_load;
        let step = (total / PROGRESS_STEPS).max(1);
        let mut done = 0u64;
        let mut extrema = Extrema::default();

        let finish = |raster: Raster, extrema: Extrema, aborted: bool| {
            self.state().extrema.merge(extrema);
            RasterRead {
                raster,
                region,
                aborted,
                min: extrema.min,
                max: extrema.max,
            }
        };

        while scanned < to_skip {
            if !skip_token(stream)? {
                return Err(Error::Eof(format!(
                    "{}: grid ended after {} of {} samples",
                    stream.location(),
                    scanned,
                    columns * dims.height as u64
                )));
            }
            scanned += 1;
            if scanned % tile_area == 0 {
                self.record_marker(scanned, stream.position());
            }

            done += 1;
            if done % step == 0 {
                if cancel.is_cancelled() {
                    return Ok(finish(raster, extrema, true));
                }
                progress.report(percent(done, total));
            }
        }

        let mut lexer = NumberLexer::new();
        let (first_col, last_col) = (region.x as u64, (region.x + region.width) as u64);
        for index in 0..to_load {
            let value = next_value(stream, &mut lexer)?.ok_or_else(|| {
                Error::Eof(format!(
                    "{}: grid ended after {} of {} samples",
                    stream.location(),
                    to_skip + index,
                    columns * dims.height as u64
                ))
            })?;

            if value.is_infinite() && index + 1 < to_load {
                return Err(Error::Io(std::io::Error::new(
                    std::io::ErrorKind::InvalidData,
                    format!(
                        "{}: infinite sample at index {}",
                        stream.location(),
                        to_skip + index
                    ),
                )));
            }

            let row = index / columns;
            let col = index % columns;
            if (first_col..last_col).contains(&col) {
                let rel_col = col - first_col;
                if row % y_factor as u64 == 0 && rel_col % x_factor as u64 == 0 {
                    raster.set(
                        (rel_col / x_factor as u64) as usize,
                        (row / y_factor as u64) as usize,
                        value,
                    );
                    if value.is_finite() && !self.header.is_nodata(value) {
                        extrema.fold(value);
                    }
                }
            }

            let absolute = to_skip + index + 1;
            if absolute % tile_area == 0 {
                self.record_marker(absolute, stream.position());
            }

            done += 1;
            if done % step == 0 {
                if cancel.is_cancelled() {
                    return Ok(finish(raster, extrema, true));
                }
                progress.report(percent(done, total));
            }
        }

        self.record_marker(to_skip + to_load, stream.position());
        progress.report(100);
        Ok(finish(raster, extrema, false))
    }
}

fn percent(done: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (done.saturating_mul(100) / total).min(100) as u8
}
