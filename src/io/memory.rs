//! In-memory backend
//!
//! For byte-array sources the stream's cache window *is* the store: the stream
//! adopts the array as its window and never refills or flushes it. This backend
//! only records the fixed length and name, and refuses anything that would need
//! storage outside the array.

use crate::error::{Error, Result};
use crate::io::Backend;

/// Fixed-size backend paired with a pinned window
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    name: String,
    len: u64,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>, len: usize) -> Self {
        Self {
            name: name.into(),
            len: len as u64,
        }
    }
}

impl Backend for MemoryBackend {
    fn read_at(&mut self, _pos: u64, _buf: &mut [u8]) -> Result<usize> {
        Ok(0)
    }

    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        Err(Error::Unsupported(format!(
            "in-memory stream {} is fixed-size ({} bytes), cannot write {} bytes at {}",
            self.name,
            self.len,
            buf.len(),
            pos
        )))
    }

    fn len(&self) -> Result<u64> {
        Ok(self.len)
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        Err(Error::Unsupported(format!(
            "in-memory stream {} cannot be resized to {}",
            self.name, len
        )))
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn location(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_backend_is_fixed() {
        let mut backend = MemoryBackend::new("mem", 16);
        assert_eq!(backend.len().unwrap(), 16);
        assert!(matches!(backend.write_at(0, &[1]), Err(Error::Unsupported(_))));
        assert!(matches!(backend.set_len(32), Err(Error::Unsupported(_))));
    }
}
