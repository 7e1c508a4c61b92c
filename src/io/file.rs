//! Local file backend

use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use crate::error::{Error, Result};
use crate::io::Backend;

/// Access mode for file-backed streams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpenMode {
    /// Read-only; the file must exist
    #[default]
    Read,
    /// Read-write; the file is created when missing
    ReadWrite,
}

/// Backend over a seekable local file
#[derive(Debug)]
pub struct FileBackend {
    file: File,
    location: String,
    writable: bool,
}

impl FileBackend {
    /// Opens `path` in the given mode
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let path = path.as_ref();
        let file = match mode {
            OpenMode::Read => File::open(path),
            OpenMode::ReadWrite => OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(false)
                .open(path),
        }
        .map_err(|e| match e.kind() {
            ErrorKind::NotFound => Error::NotFound(path.display().to_string()),
            _ => Error::Io(e),
        })?;

        log::debug!("opened {} ({:?})", path.display(), mode);

        Ok(Self {
            file,
            location: path.display().to_string(),
            writable: mode == OpenMode::ReadWrite,
        })
    }
}

impl Backend for FileBackend {
    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize> {
        self.file.seek(SeekFrom::Start(pos))?;

        // a single read may return short before EOF
        let mut total = 0;
        while total < buf.len() {
            match self.file.read(&mut buf[total..]) {
                Ok(0) => break,
                Ok(n) => total += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(Error::Io(e)),
            }
        }
        Ok(total)
    }

    fn write_at(&mut self, pos: u64, buf: &[u8]) -> Result<()> {
        if !self.writable {
            return Err(Error::Unsupported(format!("{} was opened read-only", self.location)));
        }
        self.file.seek(SeekFrom::Start(pos))?;
        self.file.write_all(buf)?;
        Ok(())
    }

    fn len(&self) -> Result<u64> {
        Ok(self.file.metadata()?.len())
    }

    fn set_len(&mut self, len: u64) -> Result<()> {
        if !self.writable {
            return Err(Error::Unsupported(format!("{} was opened read-only", self.location)));
        }
        self.file.set_len(len)?;
        Ok(())
    }

    fn is_writable(&self) -> bool {
        self.writable
    }

    fn location(&self) -> &str {
        &self.location
    }
}
