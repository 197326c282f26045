use std::fs::File;
use std::io::{self, BufReader, Cursor};
use std::path::Path;

use tracing::{debug, trace};

use crate::error::{EdfError, Result};
use crate::source::ByteSource;
use crate::types::EdfMetadata;
use crate::utils::{decode_field, parse_duration_or_default, parse_or_default};
use crate::{HEADER_SIZE, LABEL_SIZE};

/// Position of a fixed-width text field in the header preamble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeaderField {
    pub name: &'static str,
    pub offset: u64,
    pub width: usize,
}

impl HeaderField {
    const fn new(name: &'static str, offset: u64, width: usize) -> Self {
        HeaderField { name, offset, width }
    }

    /// Byte range covered by the field
    pub fn range(&self) -> std::ops::Range<usize> {
        let start = self.offset as usize;
        start..start + self.width
    }
}

// These two offsets do not follow the published EDF layout, which keeps the
// patient identification at 8 and the start date at 168. Records already
// stored were produced with the values below, so they are kept as they are.
pub const PATIENT_ID: HeaderField = HeaderField::new("patient_id", 168, 20);
pub const START_DATE: HeaderField = HeaderField::new("start_date", 97, 16);

pub const ANNOTATION_COUNT: HeaderField = HeaderField::new("number_of_annotations", 236, 4);
pub const DURATION: HeaderField = HeaderField::new("duration", 244, 8);
pub const CHANNEL_COUNT: HeaderField = HeaderField::new("number_of_channels", 252, 4);

/// Largest channel count the 4-byte count field can express
pub const MAX_CHANNELS: usize = 9999;

/// Bytes `decode` can touch at most: the preamble plus a full label table
pub const MAX_HEADER_LEN: u64 = (HEADER_SIZE + MAX_CHANNELS * LABEL_SIZE) as u64;

/// Offset of the label of channel `index`
pub fn label_offset(index: usize) -> u64 {
    (HEADER_SIZE + index * LABEL_SIZE) as u64
}

/// Decodes the metadata held in the header of an EDF file
///
/// Reads the fixed fields of the 256-byte preamble, then one 16-byte label
/// per channel. Numeric fields that do not parse take their defaults; the
/// only failure is a source too short for the layout.
///
/// # Errors
///
/// * `EdfError::Truncated` - A field or label extends past the end of the source
/// * `EdfError::Io` - The source failed for another reason (file-backed sources)
///
/// # Examples
///
/// ```rust
/// use std::io::Cursor;
/// use edf_descriptor::{decode, EdfWriter};
///
/// let mut writer = EdfWriter::new();
/// writer.set_patient_id("P123")?;
/// writer.add_channel("EEG Fp1")?;
/// writer.add_channel("EEG Fp2")?;
///
/// let metadata = decode(&mut Cursor::new(writer.to_bytes()))?;
/// assert_eq!(metadata.patient_id, "P123");
/// assert_eq!(metadata.channel_labels, vec!["EEG Fp1", "EEG Fp2"]);
/// # Ok::<(), edf_descriptor::EdfError>(())
/// ```
pub fn decode<S: ByteSource + ?Sized>(source: &mut S) -> Result<EdfMetadata> {
    let patient_id = read_text(source, PATIENT_ID.offset, PATIENT_ID.width)?;
    let start_date = read_text(source, START_DATE.offset, START_DATE.width)?;

    let duration_str = read_text(source, DURATION.offset, DURATION.width)?;
    let duration = parse_duration_or_default(&duration_str, 0.0);

    let annotations_str = read_text(source, ANNOTATION_COUNT.offset, ANNOTATION_COUNT.width)?;
    let number_of_annotations = parse_or_default(&annotations_str, 0u32);

    let channels_str = read_text(source, CHANNEL_COUNT.offset, CHANNEL_COUNT.width)?;
    let number_of_channels = parse_or_default(&channels_str, 0usize);

    trace!(
        duration = %duration_str,
        annotations = %annotations_str,
        channels = %channels_str,
        "raw numeric header fields"
    );

    // 标签表紧跟在256字节主头部之后，按文件顺序读取
    let mut channel_labels = Vec::with_capacity(number_of_channels);
    for i in 0..number_of_channels {
        channel_labels.push(read_text(source, label_offset(i), LABEL_SIZE)?);
    }

    debug!(
        patient_id = %patient_id,
        number_of_channels,
        number_of_annotations,
        duration,
        "decoded EDF header"
    );

    Ok(EdfMetadata {
        patient_id,
        start_date,
        number_of_channels,
        duration,
        number_of_annotations,
        channel_labels,
    })
}

/// Decodes an in-memory header image
///
/// ```rust
/// let err = edf_descriptor::decode_bytes(&[b' '; 100]).unwrap_err();
/// assert!(err.is_truncated());
/// ```
pub fn decode_bytes(bytes: &[u8]) -> Result<EdfMetadata> {
    decode(&mut Cursor::new(bytes))
}

fn read_text<S: ByteSource + ?Sized>(source: &mut S, offset: u64, width: usize) -> Result<String> {
    let mut buf = vec![0u8; width];
    source.read_exact_at(offset, &mut buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => EdfError::Truncated { offset, width },
        _ => EdfError::Io(e),
    })?;
    Ok(decode_field(&buf))
}

/// EDF header reader
///
/// Opens a file, or wraps any [`ByteSource`], and decodes its header once.
///
/// # Examples
///
/// ```rust
/// use edf_descriptor::EdfReader;
///
/// # let path = std::env::temp_dir().join("edf_descriptor_reader_doc.edf");
/// # edf_descriptor::doctest_utils::create_simple_test_file(&path)?;
/// let reader = EdfReader::open(&path)?;
/// let metadata = reader.metadata();
///
/// println!("Patient: {}", metadata.patient_id);
/// println!("Duration: {:.1} seconds", metadata.duration);
/// for (i, label) in metadata.channel_labels.iter().enumerate() {
///     println!("Channel {}: {}", i, label);
/// }
/// # std::fs::remove_file(&path).ok();
/// # Ok::<(), edf_descriptor::EdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EdfReader {
    metadata: EdfMetadata,
}

impl EdfReader {
    /// Opens an EDF file and decodes its header
    ///
    /// # Errors
    ///
    /// * `EdfError::FileNotFound` - File doesn't exist or can't be opened
    /// * `EdfError::Truncated` - File is shorter than its header layout
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = File::open(&path)
            .map_err(|e| EdfError::FileNotFound(format!("{}: {}", path.as_ref().display(), e)))?;

        let mut reader = BufReader::new(file);
        Self::from_source(&mut reader)
    }

    /// Decodes the header available from `source`
    pub fn from_source<S: ByteSource + ?Sized>(source: &mut S) -> Result<Self> {
        let metadata = decode(source)?;
        Ok(EdfReader { metadata })
    }

    pub fn metadata(&self) -> &EdfMetadata {
        &self.metadata
    }

    pub fn into_metadata(self) -> EdfMetadata {
        self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn blank_header(channels: &str, labels: &[&str]) -> Vec<u8> {
        let mut bytes = vec![b' '; HEADER_SIZE + labels.len() * LABEL_SIZE];
        bytes[CHANNEL_COUNT.range()][..channels.len()].copy_from_slice(channels.as_bytes());
        for (i, label) in labels.iter().enumerate() {
            let start = label_offset(i) as usize;
            bytes[start..start + label.len()].copy_from_slice(label.as_bytes());
        }
        bytes
    }

    #[test]
    fn test_fields_do_not_overlap() {
        let mut fields = [PATIENT_ID, START_DATE, ANNOTATION_COUNT, DURATION, CHANNEL_COUNT];
        fields.sort_by_key(|f| f.offset);
        for pair in fields.windows(2) {
            assert!(pair[0].range().end <= pair[1].range().start, "{:?}", pair);
        }
        assert_eq!(CHANNEL_COUNT.range().end, HEADER_SIZE);
    }

    #[test]
    fn test_labels_in_file_order() {
        let bytes = blank_header("3", &["C", "A", "B"]);
        let metadata = decode_bytes(&bytes).unwrap();
        assert_eq!(metadata.number_of_channels, 3);
        assert_eq!(metadata.channel_labels, vec!["C", "A", "B"]);
    }

    #[test]
    fn test_blank_numeric_fields_default() {
        let bytes = blank_header("", &[]);
        let metadata = decode_bytes(&bytes).unwrap();
        assert_eq!(metadata.duration, 0.0);
        assert_eq!(metadata.number_of_annotations, 0);
        assert_eq!(metadata.number_of_channels, 0);
        assert!(metadata.channel_labels.is_empty());
        assert_eq!(metadata.patient_id, "");
    }

    #[test]
    fn test_truncated_preamble() {
        let err = decode_bytes(&[b' '; HEADER_SIZE - 1]).unwrap_err();
        match err {
            EdfError::Truncated { offset, width } => {
                assert!(offset as usize + width > HEADER_SIZE - 1);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_truncated_label_table() {
        let mut bytes = blank_header("4", &["A", "B", "C", "D"]);
        bytes.truncate(HEADER_SIZE + 3 * LABEL_SIZE + 15);

        match decode_bytes(&bytes).unwrap_err() {
            EdfError::Truncated { offset, width } => {
                assert_eq!(offset, label_offset(3));
                assert_eq!(width, LABEL_SIZE);
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn test_negative_channel_count_defaults_to_zero() {
        let bytes = blank_header("-3", &[]);
        let metadata = decode_bytes(&bytes).unwrap();
        assert_eq!(metadata.number_of_channels, 0);
    }

    #[test]
    fn test_open_missing_file() {
        let err = EdfReader::open("definitely_missing_file.edf").unwrap_err();
        assert!(matches!(err, EdfError::FileNotFound(_)));
    }
}
