//! I/O utilities for gridkit
//!
//! Provides the buffered random-access stream and its three backends.

pub mod traits;
pub mod byte_order;
pub mod file;
pub mod http;
pub mod memory;
pub mod stream;

pub use traits::Backend;
pub use byte_order::ByteOrder;
pub use file::{FileBackend, OpenMode};
pub use http::{HttpBackend, HttpOptions};
pub use memory::MemoryBackend;
pub use stream::{RandomAccessStream, StreamOptions, StreamStats, DEFAULT_BUFFER_SIZE};
