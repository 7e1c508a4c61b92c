//! Core I/O traits

use crate::error::Result;

/// A positional byte store that a [`RandomAccessStream`](crate::io::RandomAccessStream)
/// buffers.
///
/// Implementations supply only raw positioned I/O. Caching, dirty tracking and
/// flush-before-reposition live in the stream, so each backend stays small.
pub trait Backend: Send {
    /// Reads up to `buf.len()` bytes starting at `pos`.
    ///
    /// Returns the number of bytes read; `0` means `pos` is at or past the end.
    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize>;

    /// Writes all of `buf` at `pos`
    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()>;

    /// Current length of the store in bytes
    fn len(&self) -> Result<u64>;

    /// Truncates or extends the store
    fn set_len(&mut self, len: u64) -> Result<()>;

    /// Whether `write_at` / `set_len` are allowed
    fn is_writable(&self) -> bool;

    /// Human-readable location (path, URL, name) used in logs and errors
    fn location(&self) -> &str;
}

impl<B: Backend + ?Sized> Backend for Box<B> {
    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize> {
        (**self).read_at(pos, buf)
    }

    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        (**self).write_at(pos, buf)
    }

    fn len(&self) -> Result<u64> {
        (**self).len()
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        (**self).set_len(len)
    }

    fn is_writable(&self) -> bool {
        (**self).is_writable()
    }

    fn location(&self) -> &str {
        (**self).location()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::MemoryBackend;

    #[test]
    fn test_boxed_backend_delegates() {
        let mut backend: Box<dyn Backend> = Box::new(MemoryBackend::new("boxed", 4));
        assert_eq!(backend.len().unwrap(), 4);
        assert_eq!(backend.location(), "boxed");
        assert!(!backend.is_writable());

        let mut buf = [0u8; 2];
        assert_eq!(backend.read_at(0, &mut buf).unwrap(), 0);
    }
}
