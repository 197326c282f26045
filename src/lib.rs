//! # EDF descriptor
//!
//! Extracts descriptive metadata from the header of European Data Format
//! (EDF) recordings, and serves it through an authenticated HTTP endpoint
//! that downloads the recording, decodes it and stores the result.
//!
//! ## Quick Start
//!
//! ### Decoding a header
//!
//! ```rust
//! use edf_descriptor::{EdfReader, Result};
//!
//! fn main() -> Result<()> {
//!     # let path = std::env::temp_dir().join("edf_descriptor_quick_start.edf");
//!     # edf_descriptor::doctest_utils::create_multi_channel_test_file(&path)?;
//!     let reader = EdfReader::open(&path)?;
//!     let metadata = reader.metadata();
//!
//!     println!("Patient: {}", metadata.patient_id);
//!     println!("Start: {}", metadata.start_date);
//!     println!("Duration: {:.2} seconds", metadata.duration);
//!     println!("Annotations: {}", metadata.number_of_annotations);
//!     println!("Channels: {:?}", metadata.channel_labels);
//!
//!     assert_eq!(metadata.channel_labels.len(), metadata.number_of_channels);
//!     # std::fs::remove_file(&path).ok();
//!     Ok(())
//! }
//! ```
//!
//! ### Header layout
//!
//! | Field | Offset | Width |
//! |---|---|---|
//! | patient id | 168 | 20 |
//! | start date | 97 | 16 |
//! | number of annotations | 236 | 4 |
//! | duration | 244 | 8 |
//! | number of channels | 252 | 4 |
//! | channel label *i* | 256 + 16·*i* | 16 |
//!
//! Text is read as ISO-8859-1 and trimmed. Numeric fields that do not parse
//! fall back to `0` / `0.0`; only a source that is too short is an error.
//!
//! ### Running the service
//!
//! The `edf_service` binary serves `GET /api/edf/descriptor?key=..&fileUrl=..`,
//! see [`server`] and [`config`].

pub mod config;
pub mod error;
pub mod reader;
pub mod server;
pub mod service;
pub mod source;
pub mod types;
pub mod utils;
pub mod writer;

#[doc(hidden)]
pub mod doctest_utils; // For internal doctest support

// Re-export main types for convenience
pub use error::{EdfError, Result};
pub use reader::{decode, decode_bytes, EdfReader};
pub use source::ByteSource;
pub use types::{EdfMetadata, StoredMetadata};
pub use writer::EdfWriter;

/// Size of the fixed header preamble
pub const HEADER_SIZE: usize = 256;
/// Width of one channel label
pub const LABEL_SIZE: usize = 16;

/// Library version
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
