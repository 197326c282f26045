use std::io;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdfError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// The source ended before a fixed-width field could be read in full
    #[error("Truncated source: cannot read {width} bytes at offset {offset}")]
    Truncated { offset: u64, width: usize },

    #[error("Invalid format: {0}")]
    InvalidFormat(String),

    #[error("Field {field} is {len} bytes, exceeds width {width}")]
    FieldTooLong {
        field: &'static str,
        width: usize,
        len: usize,
    },
}

impl EdfError {
    /// Whether this error means the source is shorter than the header layout
    pub fn is_truncated(&self) -> bool {
        matches!(self, EdfError::Truncated { .. })
    }
}

pub type Result<T> = std::result::Result<T, EdfError>;
