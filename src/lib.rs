//! gridkit - buffered random-access streams and ASCII grid decoding
//!
//! gridkit reads ESRI and GRASS ASCII grids from local files, HTTP servers
//! with range support, or memory, through a single-window caching stream.
//! Grids are decoded one token at a time, so regions and subsampled
//! overviews of large grids never need the whole text in memory.
//!
//! # Examples
//!
//! ## Basic Usage
//!
//! ```no_run
//! use gridkit::{AsciiGridReader, ReadParams};
//!
//! let mut reader = AsciiGridReader::open("elevation.asc")?;
//! let header = reader.header();
//! println!("Size: {} x {}", header.ncols, header.nrows);
//!
//! let overview = reader.read(&ReadParams::new().with_subsampling(4, 4))?;
//! println!("Range: {:?} - {:?}", overview.min, overview.max);
//! # Ok::<(), gridkit::Error>(())
//! ```
//!
//! ## Reading Binary Data
//!
//! ```no_run
//! use gridkit::{ByteOrder, OpenMode, RandomAccessStream};
//!
//! let mut stream = RandomAccessStream::open("data.bin", OpenMode::Read)?;
//! stream.set_byte_order(ByteOrder::LittleEndian);
//! let count = stream.read_u32()?;
//! stream.seek(64)?;
//! let value = stream.read_f64()?;
//! println!("{} values, first {}", count, value);
//! # Ok::<(), gridkit::Error>(())
//! ```

pub mod io;
pub mod error;
pub mod types;
pub mod formats;
pub mod cache;

pub use error::{Error, Result};
pub use types::{Dimensions, Raster, Rectangle};
pub use cache::TileMarkers;
pub use formats::ascii::{
    AsciiGridRaster, AsciiGridReader, AsciiGridWriter, CancellationToken, GridFormat, GridHeader,
    NoProgress, ProgressSink, RasterConfig, RasterRead, ReadParams,
};
pub use io::{
    Backend, ByteOrder, FileBackend, HttpBackend, HttpOptions, MemoryBackend, OpenMode,
    RandomAccessStream, StreamOptions, StreamStats,
};
