//! Error types for gridkit

use std::io;
use thiserror::Error;

/// Result type for gridkit operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types that can occur in gridkit operations
#[derive(Debug, Error)]
pub enum Error {
    /// Backing-store failure or corrupt data found mid-scan
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// End of stream reached while a fixed number of bytes was required
    #[error("Unexpected end of stream: {0}")]
    Eof(String),

    /// Malformed header, unexpected lexer input, missing fields
    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    /// Unsupported source or operation
    #[error("Unsupported: {0}")]
    Unsupported(String),

    /// Source does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// Out of bounds access
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    /// Stream already closed
    #[error("Stream is closed")]
    Closed,
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        match error.kind() {
            io::ErrorKind::NotFound => Error::NotFound(error.to_string()),
            io::ErrorKind::UnexpectedEof => Error::Eof(error.to_string()),
            _ => Error::Io(error),
        }
    }
}

impl From<Error> for io::Error {
    fn from(error: Error) -> Self {
        match error {
            Error::Io(e) => e,
            Error::Eof(msg) => io::Error::new(io::ErrorKind::UnexpectedEof, msg),
            Error::NotFound(msg) => io::Error::new(io::ErrorKind::NotFound, msg),
            Error::Unsupported(msg) => io::Error::new(io::ErrorKind::Unsupported, msg),
            other => io::Error::new(io::ErrorKind::InvalidData, other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidFormat("test".to_string());
        assert_eq!(err.to_string(), "Invalid format: test");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_not_found_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[test]
    fn test_back_to_io_error() {
        let err: io::Error = Error::Eof("short".to_string()).into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err: io::Error = Error::Closed.into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    }
}
