//! Turns a URL into a random-access byte source

use std::fs::File;
use std::io::{self, BufReader, Cursor, Read};
use std::time::Duration;

use reqwest::Url;
use thiserror::Error;
use tracing::{debug, info};

use crate::reader::MAX_HEADER_LEN;
use crate::source::ByteSource;

/// Retrieval errors
#[derive(Error, Debug)]
pub enum RetrievalError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Server responded with status {0}")]
    Status(u16),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),

    #[error("URL does not name a local file: {0}")]
    InvalidPath(String),
}

/// Fetches the content behind a URL
///
/// Implementations block; callers on an async runtime run them on a
/// blocking thread.
pub trait Retriever: Send + Sync {
    fn fetch(&self, url: &Url) -> Result<Box<dyn ByteSource + Send>, RetrievalError>;
}

/// Retriever for `http`, `https` and `file` URLs
///
/// At most [`MAX_HEADER_LEN`] bytes of an HTTP body are kept in memory, the
/// rest of the download is dropped. Local files are read in place.
#[derive(Debug, Clone)]
pub struct UrlRetriever {
    timeout: Duration,
}

impl Default for UrlRetriever {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl UrlRetriever {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    fn fetch_http(&self, url: &Url) -> Result<Box<dyn ByteSource + Send>, RetrievalError> {
        // The blocking client must be created and dropped off the async runtime.
        let client = reqwest::blocking::Client::builder()
            .timeout(self.timeout)
            .build()?;

        let response = client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RetrievalError::Status(status.as_u16()));
        }

        let body = read_limited(response, MAX_HEADER_LEN)?;
        info!(url = %url, bytes = body.len(), "Downloaded EDF header");
        Ok(Box::new(Cursor::new(body)))
    }

    fn fetch_file(&self, url: &Url) -> Result<Box<dyn ByteSource + Send>, RetrievalError> {
        let path = url
            .to_file_path()
            .map_err(|_| RetrievalError::InvalidPath(url.to_string()))?;

        let file = File::open(&path)?;
        debug!(path = %path.display(), "Opened local EDF file");
        Ok(Box::new(BufReader::new(file)))
    }
}

/// Reads `reader` to its end or until `limit` bytes, whichever comes first
pub fn read_limited<R: Read>(reader: R, limit: u64) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    reader.take(limit).read_to_end(&mut buf)?;
    Ok(buf)
}

impl Retriever for UrlRetriever {
    fn fetch(&self, url: &Url) -> Result<Box<dyn ByteSource + Send>, RetrievalError> {
        match url.scheme() {
            "http" | "https" => self.fetch_http(url),
            "file" => self.fetch_file(url),
            other => Err(RetrievalError::UnsupportedScheme(other.to_string())),
        }
    }
}
