//! Byte-at-a-time numeric tokenizer
//!
//! [`NumberLexer`] accumulates the bytes of one whitespace-delimited token in a
//! fixed buffer and converts it to a float once the token is complete. No
//! intermediate `String` is built per sample.

use crate::error::{Error, Result};
use crate::io::{Backend, RandomAccessStream};

/// Longest numeric token accepted
pub const MAX_TOKEN_LEN: usize = 64;

/// Longest run of separators tolerated inside a header
pub const MAX_HEADER_SEPARATORS: usize = 100;

/// GRASS marker for a missing sample
pub const GRASS_NODATA_MARKER: u8 = b'*';

#[inline]
pub fn is_separator(b: u8) -> bool {
    b.is_ascii_whitespace()
}

/// Streaming decimal tokenizer
///
/// Feed bytes with [`push_char`](Self::push_char) until it returns `true`, read
/// the value with [`compute`](Self::compute), then [`reset`](Self::reset).
/// Not meant to be shared between threads.
#[derive(Debug, Clone)]
pub struct NumberLexer {
    builder: [u8; MAX_TOKEN_LEN],
    len: usize,
    nodata: bool,
}

impl Default for NumberLexer {
    fn default() -> Self {
        Self::new()
    }
}

impl NumberLexer {
    pub fn new() -> Self {
        Self {
            builder: [0; MAX_TOKEN_LEN],
            len: 0,
            nodata: false,
        }
    }

    /// Feeds one byte; returns `true` once a token is complete
    ///
    /// Leading separators are ignored. A separator after token bytes ends the
    /// token. `*` is a complete token on its own and evaluates to NaN. A comma
    /// is read as a decimal point.
    pub fn push_char(&mut self, ch: u8) -> Result<bool> {
        match ch {
            c if is_separator(c) => Ok(self.len > 0),
            GRASS_NODATA_MARKER => {
                if self.len > 0 {
                    return Err(Error::InvalidFormat(format!(
                        "'*' inside numeric token {:?}",
                        self.text()
                    )));
                }
                self.nodata = true;
                Ok(true)
            }
            b'0'..=b'9' | b'+' | b'-' | b'.' | b',' | b'e' | b'E' => {
                if self.len == MAX_TOKEN_LEN {
                    return Err(Error::InvalidFormat(format!(
                        "numeric token longer than {} bytes",
                        MAX_TOKEN_LEN
                    )));
                }
                self.builder[self.len] = if ch == b',' { b'.' } else { ch };
                self.len += 1;
                Ok(false)
            }
            other => Err(Error::InvalidFormat(format!(
                "unexpected byte 0x{:02X} ({:?}) in numeric data",
                other, other as char
            ))),
        }
    }

    /// Whether any token bytes (or a `*`) have been seen since the last reset
    pub fn has_token(&self) -> bool {
        self.len > 0 || self.nodata
    }

    fn text(&self) -> &str {
        // only ASCII is ever stored
        std::str::from_utf8(&self.builder[..self.len]).unwrap_or("")
    }

    /// Value of the accumulated token
    pub fn compute(&self) -> Result<f64> {
        if self.nodata {
            return Ok(f64::NAN);
        }
        let text = self.text();
        text.parse::<f64>()
            .map_err(|_| Error::InvalidFormat(format!("malformed number {:?}", text)))
    }

    /// Value of the accumulated token at single precision
    pub fn compute_f32(&self) -> Result<f32> {
        if self.nodata {
            return Ok(f32::NAN);
        }
        let text = self.text();
        text.parse::<f32>()
            .map_err(|_| Error::InvalidFormat(format!("malformed number {:?}", text)))
    }

    pub fn reset(&mut self) {
        self.len = 0;
        self.nodata = false;
    }
}

/// Reads the next numeric token from `stream`
///
/// Returns `None` when the stream ends before any token byte.
pub fn next_value<B: Backend>(
    stream: &mut RandomAccessStream<B>,
    lexer: &mut NumberLexer,
) -> Result<Option<f64>> {
    lexer.reset();
    loop {
        match stream.read_byte()? {
            Some(b) => {
                if lexer.push_char(b)? {
                    return lexer.compute().map(Some);
                }
            }
            None if lexer.has_token() => return lexer.compute().map(Some),
            None => return Ok(None),
        }
    }
}

/// Skips one whitespace-delimited token without decoding it
///
/// Runs of separators count as one boundary. Returns `false` when the stream
/// ends before a token starts.
pub fn skip_token<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<bool> {
    let mut in_token = false;
    loop {
        match stream.read_byte()? {
            None => return Ok(in_token),
            Some(b) if is_separator(b) => {
                if in_token {
                    return Ok(true);
                }
            }
            Some(GRASS_NODATA_MARKER) if !in_token => return Ok(true),
            Some(_) => in_token = true,
        }
    }
}

/// Skips separators, failing after [`MAX_HEADER_SEPARATORS`] of them
///
/// Leaves the stream on the first non-separator byte and returns it, or
/// `None` at end of stream.
pub fn skip_separators<B: Backend>(stream: &mut RandomAccessStream<B>) -> Result<Option<u8>> {
    for _ in 0..=MAX_HEADER_SEPARATORS {
        match stream.read_byte()? {
            Some(b) if is_separator(b) => continue,
            Some(b) => {
                stream.unread();
                return Ok(Some(b));
            }
            None => return Ok(None),
        }
    }
    Err(Error::InvalidFormat(format!(
        "more than {} separator bytes in header",
        MAX_HEADER_SEPARATORS
    )))
}

/// Reads a bareword key of at most `max_len` bytes
///
/// Letters and `_` are accepted, plus `special` which also ends the key
/// (GRASS uses `:`). Reading stops before the first other byte. An empty key
/// means the next token is not a word.
pub fn read_key<B: Backend>(
    stream: &mut RandomAccessStream<B>,
    max_len: usize,
    special: Option<u8>,
) -> Result<String> {
    let mut key = String::new();
    if skip_separators(stream)?.is_none() {
        return Ok(key);
    }

    while key.len() < max_len {
        let Some(b) = stream.read_byte()? else {
            break;
        };
        if Some(b) == special {
            key.push(b as char);
            break;
        }
        if b.is_ascii_alphabetic() || b == b'_' {
            key.push(b as char);
        } else {
            stream.unread();
            break;
        }
    }
    Ok(key)
}
