//! HTTP backend using byte-range requests
//!
//! The resource length and range support are checked once with a `HEAD`
//! request; every window refill is then a single ranged `GET`.

use std::io::Read;
use std::time::Duration;
use crate::error::{Error, Result};
use crate::io::Backend;

/// Options for HTTP sources
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Per-request timeout; `None` leaves the transport default in place
    pub timeout: Option<Duration>,
    pub user_agent: String,
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            timeout: Some(Duration::from_secs(30)),
            user_agent: concat!("gridkit/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl HttpOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// Read-only backend over an HTTP resource that honours `Range` requests
pub struct HttpBackend {
    agent: ureq::Agent,
    url: String,
    total_length: u64,
}

impl std::fmt::Debug for HttpBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpBackend")
            .field("url", &self.url)
            .field("total_length", &self.total_length)
            .finish()
    }
}

impl HttpBackend {
    /// Queries `url` with `HEAD` and returns a backend for it
    ///
    /// Fails with [`Error::NotFound`] on 404 and [`Error::Unsupported`] when the
    /// server does not advertise `Accept-Ranges: bytes` with a `Content-Length`.
    pub fn open(url: &str, options: &HttpOptions) -> Result<Self> {
        let mut builder = ureq::AgentBuilder::new().user_agent(&options.user_agent);
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }
        let agent = builder.build();

        let response = agent.head(url).call().map_err(|e| map_ureq_error(url, e))?;

        let accepts_ranges = response
            .header("Accept-Ranges")
            .map(|v| v.split(',').any(|unit| unit.trim().eq_ignore_ascii_case("bytes")))
            .unwrap_or(false);
        if !accepts_ranges {
            return Err(Error::Unsupported(format!("{} does not accept byte ranges", url)));
        }

        let total_length = response
            .header("Content-Length")
            .and_then(|v| v.trim().parse::<u64>().ok())
            .ok_or_else(|| Error::Unsupported(format!("{} did not report a Content-Length", url)))?;

        log::debug!("opened {} ({} bytes)", url, total_length);

        Ok(Self {
            agent,
            url: url.to_string(),
            total_length,
        })
    }
}

impl Backend for HttpBackend {
    fn read_at(&mut self, pos: u64, buf: &mut [u8]) -> Result<usize> {
        if pos >= self.total_length || buf.is_empty() {
            return Ok(0);
        }

        let end = (pos + buf.len() as u64).min(self.total_length);
        let wanted = (end - pos) as usize;
        let range = format!("bytes={}-{}", pos, end - 1);

        log::trace!("GET {} Range: {}", self.url, range);

        let response = self
            .agent
            .get(&self.url)
            .set("Range", &range)
            .call()
            .map_err(|e| map_ureq_error(&self.url, e))?;

        if response.status() != 206 {
            return Err(Error::Unsupported(format!(
                "{} answered a range request with status {}",
                self.url,
                response.status()
            )));
        }

        let mut reader = response.into_reader();
        let mut total = 0;
        while total < wanted {
            let n = reader.read(&mut buf[total..wanted])?;
            if n == 0 {
                break;
            }
            total += n;
        }
        Ok(total)
    }

    fn write_at(&mut self, _pos: u64, _buf: &[u8]) -> Result<()> {
        Err(Error::Unsupported(format!("{} is read-only", self.url)))
    }

    fn len(&self) -> Result<u64> {
        Ok(self.total_length)
    }

    fn set_len(&mut self, _len: u64) -> Result<()> {
        Err(Error::Unsupported(format!("{} is read-only", self.url)))
    }

    fn is_writable(&self) -> bool {
        false
    }

    fn location(&self) -> &str {
        &self.url
    }
}

fn map_ureq_error(url: &str, error: ureq::Error) -> Error {
    match error {
        ureq::Error::Status(404, _) => Error::NotFound(url.to_string()),
        ureq::Error::Status(code, _) => {
            Error::Unsupported(format!("{} answered with status {}", url, code))
        }
        ureq::Error::Transport(transport) => Error::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            transport.to_string(),
        )),
    }
}
