//! ESRI and GRASS ASCII grid reading and writing

pub mod lexer;
pub mod header;
pub mod raster;
pub mod parallel;
pub mod writer;

use std::path::Path;
use std::sync::Arc;
use crate::error::Result;
use crate::io::{
    Backend, FileBackend, HttpBackend, HttpOptions, MemoryBackend, OpenMode, RandomAccessStream,
    StreamOptions,
};

pub use header::{GridFormat, GridHeader, DEFAULT_NODATA};
pub use lexer::NumberLexer;
pub use parallel::{read_tiles, tile_grid};
pub use raster::{
    AsciiGridRaster, CancellationToken, NoProgress, ProgressSink, RasterConfig, RasterRead,
    ReadParams,
};
pub use writer::AsciiGridWriter;

/// ASCII grid reader
///
/// Detects the dialect when opened and keeps the stream for later reads.
/// The decoder is held in an [`Arc`] so it can be handed to other threads
/// that read tiles through streams of their own.
pub struct AsciiGridReader<B: Backend> {
    stream: RandomAccessStream<B>,
    raster: Arc<AsciiGridRaster>,
}

impl AsciiGridReader<FileBackend> {
    /// Opens a local grid file
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::new(RandomAccessStream::open(path, OpenMode::Read)?)
    }
}

impl AsciiGridReader<HttpBackend> {
    /// Opens a grid served over HTTP with range support
    pub fn open_url(url: &str, options: &HttpOptions) -> Result<Self> {
        Self::new(RandomAccessStream::open_url(url, StreamOptions::default(), options)?)
    }
}

impl AsciiGridReader<MemoryBackend> {
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Result<Self> {
        Self::new(RandomAccessStream::from_bytes(name, data))
    }
}

impl<B: Backend> AsciiGridReader<B> {
    /// Detects the header at the current stream position
    pub fn new(mut stream: RandomAccessStream<B>) -> Result<Self> {
        let header = GridHeader::detect(&mut stream)?;
        Ok(Self {
            stream,
            raster: Arc::new(AsciiGridRaster::new(header)),
        })
    }

    /// Like [`new`](Self::new) with an explicit tile geometry for scan markers
    pub fn with_config(mut stream: RandomAccessStream<B>, config: RasterConfig) -> Result<Self> {
        let header = GridHeader::detect(&mut stream)?;
        Ok(Self {
            stream,
            raster: Arc::new(AsciiGridRaster::with_config(header, config)?),
        })
    }

    pub fn header(&self) -> &GridHeader {
        self.raster.header()
    }

    pub fn raster(&self) -> &AsciiGridRaster {
        &self.raster
    }

    /// Shared handle to the decoder
    pub fn shared_raster(&self) -> Arc<AsciiGridRaster> {
        Arc::clone(&self.raster)
    }

    /// Reads `params` without progress reporting or cancellation
    pub fn read(&mut self, params: &ReadParams) -> Result<RasterRead> {
        self.read_with(params, &mut NoProgress, &CancellationToken::new())
    }

    pub fn read_with(
        &mut self,
        params: &ReadParams,
        progress: &mut dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<RasterRead> {
        self.raster.read_raster(&mut self.stream, params, progress, cancel)
    }

    pub fn stream(&self) -> &RandomAccessStream<B> {
        &self.stream
    }

    pub fn stream_mut(&mut self) -> &mut RandomAccessStream<B> {
        &mut self.stream
    }

    pub fn into_stream(self) -> RandomAccessStream<B> {
        self.stream
    }
}
