//! Buffered random-access stream
//!
//! [`RandomAccessStream`] keeps exactly one cache window over a [`Backend`].
//! The window covers the half-open byte range `[buffer_start, data_end)`.
//! Repositioning inside the window costs nothing; repositioning outside it
//! flushes a dirty window and refills from the new position.

use std::io;
use std::path::Path;
use crate::error::{Error, Result};
use crate::io::{Backend, ByteOrder, FileBackend, HttpBackend, HttpOptions, MemoryBackend, OpenMode};

/// Default cache window size in bytes
pub const DEFAULT_BUFFER_SIZE: usize = 8092;

/// Construction options for a [`RandomAccessStream`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamOptions {
    /// Cache window capacity in bytes
    pub buffer_size: usize,
    /// Byte order used by the typed read methods
    pub byte_order: ByteOrder,
    /// Length the backing store is set to on [`close`](RandomAccessStream::close)
    pub min_length: Option<u64>,
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            buffer_size: DEFAULT_BUFFER_SIZE,
            byte_order: ByteOrder::BigEndian,
            min_length: None,
        }
    }
}

impl StreamOptions {
    pub fn with_buffer_size(mut self, buffer_size: usize) -> Self {
        self.buffer_size = buffer_size;
        self
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.byte_order = byte_order;
        self
    }

    pub fn with_min_length(mut self, min_length: u64) -> Self {
        self.min_length = Some(min_length);
        self
    }
}

/// Counters describing how a stream has touched its backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    /// Calls to [`RandomAccessStream::seek`]
    pub seeks: u64,
    /// Window refills from the backend
    pub window_fills: u64,
    /// Bytes loaded by window refills
    pub bytes_filled: u64,
    /// Dirty windows written back
    pub flushes: u64,
    /// Reads that bypassed the window
    pub direct_reads: u64,
    /// Writes that bypassed the window
    pub direct_writes: u64,
}

/// Seekable, buffered byte stream over a file, an HTTP resource or a byte array
pub struct RandomAccessStream<B: Backend> {
    backend: Option<B>,
    buffer: Vec<u8>,
    buffer_start: u64,
    data_end: u64,
    data_size: usize,
    file_position: u64,
    end_of_file: bool,
    buffer_modified: bool,
    /// The window holds the whole store and is never refilled
    fixed_window: bool,
    byte_order: ByteOrder,
    min_length: Option<u64>,
    marks: Vec<u64>,
    stats: StreamStats,
}

impl RandomAccessStream<FileBackend> {
    /// Opens a local file with default options
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::open_with_options(path, mode, StreamOptions::default())
    }

    /// Opens a local file with custom options
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        options: StreamOptions,
    ) -> Result<Self> {
        let backend = FileBackend::open(path, mode)?;
        Ok(Self::new(backend, options))
    }
}

impl RandomAccessStream<HttpBackend> {
    /// Opens an HTTP resource that supports byte ranges
    pub fn open_url(url: &str, options: StreamOptions, http: &HttpOptions) -> Result<Self> {
        let backend = HttpBackend::open(url, http)?;
        Ok(Self::new(backend, options))
    }
}

impl RandomAccessStream<MemoryBackend> {
    /// Wraps a byte array; the array becomes the (fixed) cache window
    pub fn from_bytes(name: impl Into<String>, data: Vec<u8>) -> Self {
        Self::from_bytes_with_order(name, data, ByteOrder::BigEndian)
    }

    pub fn from_bytes_with_order(name: impl Into<String>, data: Vec<u8>, byte_order: ByteOrder) -> Self {
        let len = data.len();
        Self {
            backend: Some(MemoryBackend::new(name, len)),
            buffer: data,
            buffer_start: 0,
            data_end: len as u64,
            data_size: len,
            file_position: 0,
            end_of_file: false,
            buffer_modified: false,
            fixed_window: true,
            byte_order,
            min_length: None,
            marks: Vec::new(),
            stats: StreamStats::default(),
        }
    }

    /// Returns the underlying array, including any writes
    pub fn into_bytes(mut self) -> Vec<u8> {
        std::mem::take(&mut self.buffer)
    }
}

impl<B: Backend> RandomAccessStream<B> {
    /// Wraps `backend` with an empty cache window
    pub fn new(backend: B, options: StreamOptions) -> Self {
        Self {
            backend: Some(backend),
            buffer: vec![0; options.buffer_size.max(1)],
            buffer_start: 0,
            data_end: 0,
            data_size: 0,
            file_position: 0,
            end_of_file: false,
            buffer_modified: false,
            fixed_window: false,
            byte_order: options.byte_order,
            min_length: options.min_length,
            marks: Vec::new(),
            stats: StreamStats::default(),
        }
    }

    fn backend_ref(&self) -> Result<&B> {
        self.backend.as_ref().ok_or(Error::Closed)
    }

    /// Location of the backing store
    pub fn location(&self) -> &str {
        self.backend.as_ref().map(|b| b.location()).unwrap_or("<closed>")
    }

    pub fn is_closed(&self) -> bool {
        self.backend.is_none()
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    /// Changes the byte order used by subsequent typed reads
    pub fn set_byte_order(&mut self, byte_order: ByteOrder) {
        self.byte_order = byte_order;
    }

    /// Sets the length the store is resized to on close
    pub fn set_min_length(&mut self, min_length: u64) {
        self.min_length = Some(min_length);
    }

    pub fn buffer_size(&self) -> usize {
        self.buffer.len()
    }

    /// Replaces the cache window with an empty one of `size` bytes
    ///
    /// Ignored for in-memory streams, whose window is the data itself.
    pub fn set_buffer_size(&mut self, size: usize) -> Result<()> {
        if self.fixed_window {
            return Ok(());
        }
        self.flush()?;
        self.buffer = vec![0; size.max(1)];
        self.buffer_start = self.file_position;
        self.data_size = 0;
        self.data_end = self.buffer_start;
        self.end_of_file = false;
        Ok(())
    }

    /// Logical position of the next read or write
    pub fn position(&self) -> u64 {
        self.file_position
    }

    /// Length of the stream, including cached bytes not yet flushed
    pub fn length(&self) -> Result<u64> {
        Ok(self.backend_ref()?.len()?.max(self.data_end))
    }

    /// Whether the cache holds bytes not yet written to the backend
    pub fn is_dirty(&self) -> bool {
        self.buffer_modified
    }

    pub fn stats(&self) -> StreamStats {
        self.stats
    }

    fn in_window(&self, pos: u64) -> bool {
        pos >= self.buffer_start && pos < self.data_end
    }

    fn writable_in_window(&self, pos: u64) -> bool {
        pos >= self.buffer_start
            && pos <= self.data_end
            && pos < self.buffer_start + self.buffer.len() as u64
    }

    /// Flushes a dirty window and reloads it starting at `pos`
    fn fill_window(&mut self, pos: u64) -> Result<()> {
        if self.buffer_modified {
            self.flush()?;
        }

        let backend = self.backend.as_mut().ok_or(Error::Closed)?;
        let n = backend.read_at(pos, &mut self.buffer)?;

        self.buffer_start = pos;
        self.data_size = n;
        self.data_end = pos + n as u64;
        self.end_of_file = n == 0;
        self.file_position = pos;

        self.stats.window_fills += 1;
        self.stats.bytes_filled += n as u64;
        log::trace!("{}: window [{}, {})", backend.location(), pos, self.data_end);
        Ok(())
    }

    /// Moves to `pos`, refilling the window only when `pos` lies outside it
    pub fn seek(&mut self, pos: u64) -> Result<()> {
        self.backend_ref()?;
        self.stats.seeks += 1;

        if self.fixed_window || self.in_window(pos) {
            self.file_position = pos;
            return Ok(());
        }

        self.fill_window(pos)
    }

    /// Skips up to `n` bytes, never past the end; returns the distance moved
    pub fn skip_bytes(&mut self, n: u64) -> Result<u64> {
        let length = self.length()?;
        let target = self.file_position.saturating_add(n).min(length).max(self.file_position);
        let skipped = target - self.file_position;
        self.seek(target)?;
        Ok(skipped)
    }

    /// Steps back one byte so the last byte read is returned again
    pub fn unread(&mut self) {
        self.file_position = self.file_position.saturating_sub(1);
    }

    /// Pushes the current position on the mark stack
    pub fn mark(&mut self) {
        self.marks.push(self.file_position);
    }

    /// Returns to the most recent mark; does nothing when no mark is set
    pub fn reset(&mut self) -> Result<()> {
        match self.marks.pop() {
            Some(pos) => self.seek(pos),
            None => Ok(()),
        }
    }

    /// Reads one byte, or `None` at end of stream
    pub fn read_byte(&mut self) -> Result<Option<u8>> {
        if self.in_window(self.file_position) {
            let b = self.buffer[(self.file_position - self.buffer_start) as usize];
            self.file_position += 1;
            return Ok(Some(b));
        }

        self.backend_ref()?;
        if self.fixed_window || (self.end_of_file && self.file_position >= self.data_end) {
            return Ok(None);
        }

        self.fill_window(self.file_position)?;
        if self.in_window(self.file_position) {
            let b = self.buffer[(self.file_position - self.buffer_start) as usize];
            self.file_position += 1;
            Ok(Some(b))
        } else {
            Ok(None)
        }
    }

    /// Reads up to `buf.len()` bytes; returns `0` only at end of stream
    ///
    /// Whatever the window holds is copied first. A remainder larger than the
    /// window is read straight from the backend; a smaller one costs a single
    /// refill.
    pub fn read_bytes(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.backend_ref()?;
        if buf.is_empty() {
            return Ok(0);
        }

        if !self.in_window(self.file_position) {
            if self.fixed_window || (self.end_of_file && self.file_position >= self.data_end) {
                return Ok(0);
            }
            self.fill_window(self.file_position)?;
            if self.data_size == 0 {
                return Ok(0);
            }
        }

        let offset = (self.file_position - self.buffer_start) as usize;
        let available = (self.data_end - self.file_position) as usize;
        let copied = available.min(buf.len());
        buf[..copied].copy_from_slice(&self.buffer[offset..offset + copied]);
        self.file_position += copied as u64;

        if copied == buf.len() || self.fixed_window {
            return Ok(copied);
        }

        let remaining = buf.len() - copied;
        let extra = if remaining > self.buffer.len() {
            let backend = self.backend.as_mut().ok_or(Error::Closed)?;
            let n = backend.read_at(self.file_position, &mut buf[copied..])?;
            self.stats.direct_reads += 1;
            n
        } else {
            self.fill_window(self.file_position)?;
            let n = remaining.min(self.data_size);
            buf[copied..copied + n].copy_from_slice(&self.buffer[..n]);
            n
        };
        self.file_position += extra as u64;

        Ok(copied + extra)
    }

    /// Fills `buf` completely or fails with [`Error::Eof`]
    pub fn read_fully(&mut self, buf: &mut [u8]) -> Result<()> {
        let start = self.file_position;
        let mut total = 0;
        while total < buf.len() {
            let n = self.read_bytes(&mut buf[total..])?;
            if n == 0 {
                return Err(Error::Eof(format!(
                    "{}: needed {} bytes at offset {}, only {} available",
                    self.location(),
                    buf.len(),
                    start,
                    total
                )));
            }
            total += n;
        }
        Ok(())
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut bytes = [0u8; N];
        self.read_fully(&mut bytes)?;
        Ok(bytes)
    }

    /// Reads one byte, failing at end of stream
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()?
            .ok_or_else(|| Error::Eof(format!("{}: end of stream at {}", self.location(), self.file_position)))
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        let bytes = self.read_array::<2>()?;
        Ok(self.byte_order.decode_u16(bytes))
    }

    pub fn read_i16(&mut self) -> Result<i16> {
        let bytes = self.read_array::<2>()?;
        Ok(self.byte_order.decode_i16(bytes))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        let bytes = self.read_array::<4>()?;
        Ok(self.byte_order.decode_u32(bytes))
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let bytes = self.read_array::<4>()?;
        Ok(self.byte_order.decode_i32(bytes))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        let bytes = self.read_array::<8>()?;
        Ok(self.byte_order.decode_u64(bytes))
    }

    pub fn read_i64(&mut self) -> Result<i64> {
        let bytes = self.read_array::<8>()?;
        Ok(self.byte_order.decode_i64(bytes))
    }

    pub fn read_f32(&mut self) -> Result<f32> {
        let bytes = self.read_array::<4>()?;
        Ok(self.byte_order.decode_f32(bytes))
    }

    pub fn read_f64(&mut self) -> Result<f64> {
        let bytes = self.read_array::<8>()?;
        Ok(self.byte_order.decode_f64(bytes))
    }

    /// Reads bytes up to, not including, the next `'\n'`
    ///
    /// A `'\r'` before the newline is kept in the returned line. Each byte maps
    /// to one `char` (Latin-1). Returns `None` only when the stream is already
    /// at its end.
    pub fn read_line(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let mut seen_any = false;
        while let Some(b) = self.read_byte()? {
            seen_any = true;
            if b == b'\n' {
                break;
            }
            line.push(b as char);
        }
        Ok(seen_any.then_some(line))
    }

    /// Reads exactly `n` bytes and decodes them as UTF-8, replacing invalid sequences
    pub fn read_string(&mut self, n: usize) -> Result<String> {
        let mut bytes = vec![0u8; n];
        self.read_fully(&mut bytes)?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Scans forward for `pattern`, looking at no more than `max_bytes` bytes
    ///
    /// On success the stream is left at the first byte of the match. Otherwise
    /// it is left where the scan stopped.
    pub fn search_forward(&mut self, pattern: &[u8], max_bytes: Option<u64>) -> Result<bool> {
        if pattern.is_empty() {
            return Ok(true);
        }

        // KMP failure table
        let mut failure = vec![0usize; pattern.len()];
        let mut k = 0;
        for i in 1..pattern.len() {
            while k > 0 && pattern[i] != pattern[k] {
                k = failure[k - 1];
            }
            if pattern[i] == pattern[k] {
                k += 1;
            }
            failure[i] = k;
        }

        let limit = max_bytes.unwrap_or(u64::MAX);
        let mut scanned = 0u64;
        let mut matched = 0;
        while scanned < limit {
            let Some(b) = self.read_byte()? else {
                return Ok(false);
            };
            scanned += 1;
            while matched > 0 && b != pattern[matched] {
                matched = failure[matched - 1];
            }
            if b == pattern[matched] {
                matched += 1;
            }
            if matched == pattern.len() {
                let start = self.file_position - pattern.len() as u64;
                self.seek(start)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn ensure_writable(&self) -> Result<()> {
        let backend = self.backend_ref()?;
        if !self.fixed_window && !backend.is_writable() {
            return Err(Error::Unsupported(format!("{} is not writable", backend.location())));
        }
        Ok(())
    }

    pub fn write_byte(&mut self, b: u8) -> Result<()> {
        self.write_bytes(&[b])
    }

    /// Writes `buf` at the current position
    ///
    /// Writes smaller than the window go through the cache and mark it dirty.
    /// Larger writes flush the window and go straight to the backend, leaving an
    /// empty window at the new position.
    pub fn write_bytes(&mut self, buf: &[u8]) -> Result<()> {
        self.ensure_writable()?;
        if buf.is_empty() {
            return Ok(());
        }

        if self.fixed_window {
            let end = self.file_position + buf.len() as u64;
            if end > self.data_end {
                return Err(Error::Unsupported(format!(
                    "{}: write of {} bytes at {} exceeds fixed size {}",
                    self.location(),
                    buf.len(),
                    self.file_position,
                    self.data_end
                )));
            }
            let offset = self.file_position as usize;
            self.buffer[offset..offset + buf.len()].copy_from_slice(buf);
            self.file_position = end;
            return Ok(());
        }

        if buf.len() < self.buffer.len() {
            let mut written = 0;
            while written < buf.len() {
                if !self.writable_in_window(self.file_position) {
                    self.fill_window(self.file_position)?;
                }
                let offset = (self.file_position - self.buffer_start) as usize;
                let n = (self.buffer.len() - offset).min(buf.len() - written);
                self.buffer[offset..offset + n].copy_from_slice(&buf[written..written + n]);
                self.buffer_modified = true;
                self.end_of_file = false;
                self.file_position += n as u64;
                if self.file_position > self.data_end {
                    self.data_end = self.file_position;
                    self.data_size = (self.data_end - self.buffer_start) as usize;
                }
                written += n;
            }
            return Ok(());
        }

        if self.buffer_modified {
            self.flush()?;
        }
        let backend = self.backend.as_mut().ok_or(Error::Closed)?;
        backend.write_at(self.file_position, buf)?;
        self.stats.direct_writes += 1;

        self.file_position += buf.len() as u64;
        self.buffer_start = self.file_position;
        self.data_size = 0;
        self.data_end = self.buffer_start;
        self.end_of_file = false;
        Ok(())
    }

    // Multi-byte writes are big-endian whatever the configured byte order.

    pub fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_f32(&mut self, value: f32) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    pub fn write_f64(&mut self, value: f64) -> Result<()> {
        self.write_bytes(&value.to_be_bytes())
    }

    /// Writes a dirty window back to the backend; a clean window is left alone
    pub fn flush(&mut self) -> Result<()> {
        if !self.buffer_modified {
            return Ok(());
        }
        let backend = self.backend.as_mut().ok_or(Error::Closed)?;
        backend.write_at(self.buffer_start, &self.buffer[..self.data_size])?;
        self.buffer_modified = false;
        self.stats.flushes += 1;
        log::trace!("{}: flushed [{}, {})", backend.location(), self.buffer_start, self.data_end);
        Ok(())
    }

    /// Flushes, applies the minimum-length policy and releases the backend
    ///
    /// Closing twice is a no-op.
    pub fn close(&mut self) -> Result<()> {
        if self.backend.is_none() {
            return Ok(());
        }
        self.flush()?;

        if let (Some(min_length), Some(backend)) = (self.min_length, self.backend.as_mut()) {
            if backend.is_writable() && backend.len()? != min_length {
                backend.set_len(min_length)?;
            }
        }

        if let Some(backend) = self.backend.take() {
            log::debug!("closed {}", backend.location());
        }
        self.buffer = Vec::new();
        self.buffer_start = 0;
        self.data_size = 0;
        self.data_end = 0;
        self.marks.clear();
        Ok(())
    }
}

impl<B: Backend> Drop for RandomAccessStream<B> {
    fn drop(&mut self) {
        if self.backend.is_some() && self.buffer_modified {
            if let Err(e) = self.flush() {
                log::warn!("{}: failed to flush on drop: {}", self.location(), e);
            }
        }
    }
}

impl<B: Backend> io::Read for RandomAccessStream<B> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.read_bytes(buf).map_err(Into::into)
    }
}

impl<B: Backend> io::Seek for RandomAccessStream<B> {
    fn seek(&mut self, pos: io::SeekFrom) -> io::Result<u64> {
        let target = match pos {
            io::SeekFrom::Start(offset) => Some(offset),
            io::SeekFrom::End(delta) => self.length()?.checked_add_signed(delta),
            io::SeekFrom::Current(delta) => self.file_position.checked_add_signed(delta),
        }
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "seek before start of stream"))?;

        RandomAccessStream::seek(self, target)?;
        Ok(target)
    }
}

impl<B: Backend> io::Write for RandomAccessStream<B> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.write_bytes(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        RandomAccessStream::flush(self).map_err(Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Seek, SeekFrom, Write};
    use tempfile::NamedTempFile;

    fn temp_with(data: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(data).unwrap();
        file.flush().unwrap();
        file
    }

    fn small(size: usize) -> StreamOptions {
        StreamOptions::default().with_buffer_size(size)
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = RandomAccessStream::open(dir.path().join("nope"), OpenMode::Read);
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_sequential_small_reads() {
        let data: Vec<u8> = (0..100).collect();
        let file = temp_with(&data);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::Read, small(32)).unwrap();

        for i in 0u8..100 {
            assert_eq!(stream.read_byte().unwrap(), Some(i));
        }
        assert_eq!(stream.read_byte().unwrap(), None);
        assert_eq!(stream.stats().window_fills, 5);
    }

    #[test]
    fn test_seek_inside_window_does_no_io() {
        let data: Vec<u8> = (0..64).collect();
        let file = temp_with(&data);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::Read, small(16)).unwrap();

        stream.seek(4).unwrap();
        assert_eq!(stream.stats().window_fills, 1);
        stream.seek(10).unwrap();
        stream.seek(19).unwrap();
        assert_eq!(stream.stats().window_fills, 1);
        assert_eq!(stream.read_byte().unwrap(), Some(19));

        stream.seek(40).unwrap();
        assert_eq!(stream.stats().window_fills, 2);
        assert_eq!(stream.read_byte().unwrap(), Some(40));
    }

    #[test]
    fn test_read_bytes_spanning_windows() {
        let data: Vec<u8> = (0..50).collect();
        let file = temp_with(&data);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::Read, small(8)).unwrap();

        stream.seek(5).unwrap();
        let mut buf = [0u8; 6];
        assert_eq!(stream.read_bytes(&mut buf).unwrap(), 6);
        assert_eq!(buf, [5, 6, 7, 8, 9, 10]);
        assert_eq!(stream.position(), 11);
    }

    #[test]
    fn test_large_read_bypasses_window() {
        let data: Vec<u8> = (0..=255).collect();
        let file = temp_with(&data);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::Read, small(16)).unwrap();

        assert_eq!(stream.read_byte().unwrap(), Some(0));
        let mut buf = vec![0u8; 100];
        assert_eq!(stream.read_bytes(&mut buf).unwrap(), 100);
        assert_eq!(buf[0], 1);
        assert_eq!(buf[99], 100);
        assert_eq!(stream.stats().direct_reads, 1);
        assert_eq!(stream.read_byte().unwrap(), Some(101));
    }

    #[test]
    fn test_read_bytes_at_eof() {
        let file = temp_with(&[1, 2, 3]);
        let mut stream = RandomAccessStream::open(file.path(), OpenMode::Read).unwrap();

        let mut buf = [0u8; 8];
        assert_eq!(stream.read_bytes(&mut buf).unwrap(), 3);
        assert_eq!(stream.read_bytes(&mut buf).unwrap(), 0);
    }

    #[test]
    fn test_read_fully_eof() {
        let file = temp_with(&[1, 2, 3]);
        let mut stream = RandomAccessStream::open(file.path(), OpenMode::Read).unwrap();

        stream.seek(1).unwrap();
        let mut buf = [0u8; 4];
        assert!(matches!(stream.read_fully(&mut buf), Err(Error::Eof(_))));
    }

    #[test]
    fn test_write_seek_away_and_back() {
        let file = temp_with(&[0u8; 64]);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, small(8)).unwrap();

        stream.seek(3).unwrap();
        stream.write_byte(0xAA).unwrap();
        assert!(stream.is_dirty());

        stream.seek(40).unwrap();
        assert!(!stream.is_dirty());
        stream.write_byte(0xBB).unwrap();

        stream.seek(3).unwrap();
        assert_eq!(stream.read_byte().unwrap(), Some(0xAA));
        stream.seek(40).unwrap();
        assert_eq!(stream.read_byte().unwrap(), Some(0xBB));
        stream.seek(41).unwrap();
        assert_eq!(stream.read_byte().unwrap(), Some(0));
    }

    #[test]
    fn test_interleaved_writes_match_model() {
        let file = temp_with(&[0u8; 128]);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, small(10)).unwrap();
        let mut model = vec![0u8; 128];

        // deterministic pseudo-random walk
        let mut state = 7u32;
        for step in 0..400u32 {
            state = state.wrapping_mul(1103515245).wrapping_add(12345);
            let pos = (state >> 8) as u64 % 128;
            stream.seek(pos).unwrap();
            if step % 3 == 0 {
                let value = (state >> 16) as u8;
                stream.write_byte(value).unwrap();
                model[pos as usize] = value;
            } else {
                assert_eq!(stream.read_byte().unwrap(), Some(model[pos as usize]));
            }
        }

        stream.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), model);
    }

    #[test]
    fn test_write_spanning_windows() {
        let file = temp_with(&[0u8; 32]);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, small(8)).unwrap();

        stream.seek(6).unwrap();
        stream.write_bytes(&[1, 2, 3, 4, 5]).unwrap();
        assert_eq!(stream.position(), 11);

        stream.seek(0).unwrap();
        let mut buf = [0u8; 12];
        stream.read_fully(&mut buf).unwrap();
        assert_eq!(buf, [0, 0, 0, 0, 0, 0, 1, 2, 3, 4, 5, 0]);
    }

    #[test]
    fn test_large_write_goes_direct() {
        let file = temp_with(&[]);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, small(8)).unwrap();

        stream.write_bytes(&[1, 2]).unwrap();
        let big: Vec<u8> = (10..30).collect();
        stream.write_bytes(&big).unwrap();
        assert_eq!(stream.stats().direct_writes, 1);
        assert_eq!(stream.stats().flushes, 1);
        assert_eq!(stream.position(), 22);

        stream.seek(0).unwrap();
        let mut buf = [0u8; 22];
        stream.read_fully(&mut buf).unwrap();
        assert_eq!(&buf[..2], &[1, 2]);
        assert_eq!(&buf[2..], &big[..]);
    }

    #[test]
    fn test_append_past_end() {
        let file = temp_with(&[9, 9]);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, small(4)).unwrap();

        stream.seek(2).unwrap();
        assert_eq!(stream.read_byte().unwrap(), None);
        stream.write_bytes(&[1, 2, 3]).unwrap();
        assert_eq!(stream.length().unwrap(), 5);

        stream.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![9, 9, 1, 2, 3]);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let file = temp_with(&[0u8; 16]);
        let mut stream = RandomAccessStream::open(file.path(), OpenMode::ReadWrite).unwrap();

        stream.write_byte(1).unwrap();
        stream.flush().unwrap();
        stream.flush().unwrap();
        assert_eq!(stream.stats().flushes, 1);
        assert!(!stream.is_dirty());
    }

    #[test]
    fn test_read_only_rejects_write() {
        let file = temp_with(&[0u8; 4]);
        let mut stream = RandomAccessStream::open(file.path(), OpenMode::Read).unwrap();
        assert!(matches!(stream.write_byte(1), Err(Error::Unsupported(_))));
        assert!(!stream.is_dirty());
    }

    #[test]
    fn test_endian_round_trip() {
        let file = temp_with(&[]);
        let mut stream = RandomAccessStream::open(file.path(), OpenMode::ReadWrite).unwrap();

        stream.write_i16(-12345).unwrap();
        stream.write_i32(0x1234_5678).unwrap();
        stream.write_i64(-0x0102_0304_0506_0708).unwrap();
        stream.write_f32(1.5e-3).unwrap();
        stream.write_f64(-2.25e100).unwrap();

        stream.seek(0).unwrap();
        assert_eq!(stream.read_i16().unwrap(), -12345);
        assert_eq!(stream.read_i32().unwrap(), 0x1234_5678);
        assert_eq!(stream.read_i64().unwrap(), -0x0102_0304_0506_0708);
        assert_eq!(stream.read_f32().unwrap(), 1.5e-3);
        assert_eq!(stream.read_f64().unwrap(), -2.25e100);

        stream.set_byte_order(ByteOrder::LittleEndian);
        stream.seek(0).unwrap();
        assert_eq!(stream.read_i16().unwrap(), (-12345i16).swap_bytes());
        assert_eq!(stream.read_i32().unwrap(), 0x1234_5678i32.swap_bytes());
        assert_eq!(stream.read_i64().unwrap(), (-0x0102_0304_0506_0708i64).swap_bytes());
        assert_eq!(stream.read_f32().unwrap().to_bits(), 1.5e-3f32.to_bits().swap_bytes());
        assert_eq!(stream.read_f64().unwrap().to_bits(), (-2.25e100f64).to_bits().swap_bytes());
    }

    #[test]
    fn test_writes_ignore_byte_order() {
        let file = temp_with(&[]);
        let options = StreamOptions::default().with_byte_order(ByteOrder::LittleEndian);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, options).unwrap();

        stream.write_i32(1).unwrap();
        stream.close().unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![0, 0, 0, 1]);
    }

    #[test]
    fn test_unsigned_reads() {
        let mut stream = RandomAccessStream::from_bytes_with_order(
            "le",
            vec![0xFF, 0xFF, 0x01, 0x00, 0x00, 0x80],
            ByteOrder::LittleEndian,
        );
        assert_eq!(stream.read_u16().unwrap(), 0xFFFF);
        assert_eq!(stream.read_u32().unwrap(), 0x8000_0001);
    }

    #[test]
    fn test_read_line_keeps_carriage_return() {
        let mut stream = RandomAccessStream::from_bytes("lines", b"one\r\ntwo\n\nlast".to_vec());
        assert_eq!(stream.read_line().unwrap(), Some("one\r".to_string()));
        assert_eq!(stream.read_line().unwrap(), Some("two".to_string()));
        assert_eq!(stream.read_line().unwrap(), Some(String::new()));
        assert_eq!(stream.read_line().unwrap(), Some("last".to_string()));
        assert_eq!(stream.read_line().unwrap(), None);
    }

    #[test]
    fn test_read_string() {
        let mut stream = RandomAccessStream::from_bytes("s", b"NCOLS 4".to_vec());
        assert_eq!(stream.read_string(5).unwrap(), "NCOLS");
        assert!(matches!(stream.read_string(5), Err(Error::Eof(_))));
    }

    #[test]
    fn test_memory_stream_writes_in_place() {
        let mut stream = RandomAccessStream::from_bytes("mem", vec![0u8; 4]);
        stream.seek(1).unwrap();
        stream.write_bytes(&[7, 8]).unwrap();
        assert!(!stream.is_dirty());
        assert!(matches!(stream.write_bytes(&[1, 2]), Err(Error::Unsupported(_))));

        stream.seek(10).unwrap();
        assert_eq!(stream.read_byte().unwrap(), None);
        assert_eq!(stream.stats().window_fills, 0);
        assert_eq!(stream.into_bytes(), vec![0, 7, 8, 0]);
    }

    #[test]
    fn test_skip_and_unread() {
        let mut stream = RandomAccessStream::from_bytes("mem", vec![1, 2, 3, 4, 5]);
        assert_eq!(stream.skip_bytes(2).unwrap(), 2);
        assert_eq!(stream.read_byte().unwrap(), Some(3));
        stream.unread();
        assert_eq!(stream.read_byte().unwrap(), Some(3));
        assert_eq!(stream.skip_bytes(100).unwrap(), 2);
        assert_eq!(stream.read_byte().unwrap(), None);
    }

    #[test]
    fn test_mark_and_reset() {
        let mut stream = RandomAccessStream::from_bytes("mem", b"abcdef".to_vec());
        stream.seek(1).unwrap();
        stream.mark();
        stream.seek(4).unwrap();
        stream.mark();
        stream.seek(5).unwrap();

        stream.reset().unwrap();
        assert_eq!(stream.position(), 4);
        stream.reset().unwrap();
        assert_eq!(stream.position(), 1);
        stream.reset().unwrap();
        assert_eq!(stream.position(), 1);
    }

    #[test]
    fn test_search_forward() {
        let mut stream = RandomAccessStream::from_bytes("mem", b"aababcabcd".to_vec());
        assert!(stream.search_forward(b"abcd", None).unwrap());
        assert_eq!(stream.position(), 6);

        stream.seek(0).unwrap();
        assert!(!stream.search_forward(b"abcd", Some(5)).unwrap());
        stream.seek(0).unwrap();
        assert!(!stream.search_forward(b"zz", None).unwrap());
    }

    #[test]
    fn test_close_applies_min_length() {
        let file = temp_with(&[1, 2, 3, 4, 5, 6]);
        let options = StreamOptions::default().with_min_length(3);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, options).unwrap();
        stream.write_byte(9).unwrap();
        stream.close().unwrap();
        stream.close().unwrap();

        assert_eq!(std::fs::read(file.path()).unwrap(), vec![9, 2, 3]);
        assert!(stream.is_closed());
        assert!(matches!(stream.read_byte(), Err(Error::Closed)));
    }

    #[test]
    fn test_drop_flushes() {
        let file = temp_with(&[0u8; 4]);
        {
            let mut stream = RandomAccessStream::open(file.path(), OpenMode::ReadWrite).unwrap();
            stream.seek(2).unwrap();
            stream.write_byte(5).unwrap();
        }
        assert_eq!(std::fs::read(file.path()).unwrap(), vec![0, 0, 5, 0]);
    }

    #[test]
    fn test_std_io_traits() {
        let file = temp_with(b"hello world");
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::ReadWrite, small(4)).unwrap();

        Seek::seek(&mut stream, SeekFrom::End(-5)).unwrap();
        let mut text = String::new();
        stream.read_to_string(&mut text).unwrap();
        assert_eq!(text, "world");

        Seek::seek(&mut stream, SeekFrom::Start(0)).unwrap();
        stream.write_all(b"HELLO").unwrap();
        Write::flush(&mut stream).unwrap();
        assert_eq!(std::fs::read(file.path()).unwrap(), b"HELLO world".to_vec());

        assert!(Seek::seek(&mut stream, SeekFrom::Current(-100)).is_err());
    }

    #[test]
    fn test_set_buffer_size() {
        let data: Vec<u8> = (0..40).collect();
        let file = temp_with(&data);
        let mut stream = RandomAccessStream::open_with_options(file.path(), OpenMode::Read, small(4)).unwrap();
        stream.seek(10).unwrap();
        stream.set_buffer_size(32).unwrap();
        assert_eq!(stream.buffer_size(), 32);
        assert_eq!(stream.read_byte().unwrap(), Some(10));
    }
}
