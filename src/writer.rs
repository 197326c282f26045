use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::{EdfError, Result};
use crate::reader::{
    label_offset, HeaderField, ANNOTATION_COUNT, CHANNEL_COUNT, DURATION, MAX_CHANNELS, PATIENT_ID, START_DATE,
};
use crate::utils::encode_latin1;
use crate::{HEADER_SIZE, LABEL_SIZE};

/// Composes an EDF header image with the layout [`decode`](crate::decode) reads
///
/// Each value is written left-aligned and padded with spaces to the width of
/// its field. The channel count field is kept in step with the labels added,
/// unless it is overridden with [`EdfWriter::set_raw_field`].
///
/// # Examples
///
/// ```rust
/// use edf_descriptor::{EdfWriter, EdfReader};
///
/// let path = std::env::temp_dir().join("edf_descriptor_writer_doc.edf");
///
/// let mut writer = EdfWriter::new();
/// writer.set_patient_id("P123")?;
/// writer.set_start_date("12.02.25")?;
/// writer.set_duration(300.0)?;
/// writer.set_annotation_count(5)?;
/// for label in ["EEG Fp1", "EEG Fp2", "EEG F7"] {
///     writer.add_channel(label)?;
/// }
/// writer.save(&path)?;
///
/// let metadata = EdfReader::open(&path)?.into_metadata();
/// assert_eq!(metadata.patient_id, "P123");
/// assert_eq!(metadata.duration, 300.0);
/// assert_eq!(metadata.number_of_channels, 3);
/// # std::fs::remove_file(&path).ok();
/// # Ok::<(), edf_descriptor::EdfError>(())
/// ```
#[derive(Debug, Clone)]
pub struct EdfWriter {
    preamble: Vec<u8>,
    labels: Vec<Vec<u8>>,
    channel_count_overridden: bool,
}

impl Default for EdfWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl EdfWriter {
    /// Creates a writer with an all-blank preamble and no channels
    pub fn new() -> Self {
        let mut preamble = vec![b' '; HEADER_SIZE];
        // 版本字段，与真实文件保持一致
        preamble[0..8].copy_from_slice(b"0       ");

        let mut writer = EdfWriter {
            preamble,
            labels: Vec::new(),
            channel_count_overridden: false,
        };
        writer.sync_channel_count();
        writer
    }

    pub fn set_patient_id(&mut self, patient_id: &str) -> Result<()> {
        self.put(PATIENT_ID, patient_id)
    }

    pub fn set_start_date(&mut self, start_date: &str) -> Result<()> {
        self.put(START_DATE, start_date)
    }

    pub fn set_annotation_count(&mut self, count: u32) -> Result<()> {
        self.put(ANNOTATION_COUNT, &count.to_string())
    }

    /// Sets the duration in seconds, written with the shortest exact text
    pub fn set_duration(&mut self, seconds: f64) -> Result<()> {
        self.put(DURATION, &format!("{}", seconds))
    }

    /// Writes arbitrary text into a fixed field, including text that is not a number
    ///
    /// Writing the channel count this way stops it from following the label table.
    ///
    /// ```rust
    /// use edf_descriptor::{decode_bytes, reader::DURATION, EdfWriter};
    ///
    /// let mut writer = EdfWriter::new();
    /// writer.set_raw_field(DURATION, "n/a")?;
    /// assert_eq!(decode_bytes(&writer.to_bytes())?.duration, 0.0);
    /// # Ok::<(), edf_descriptor::EdfError>(())
    /// ```
    pub fn set_raw_field(&mut self, field: HeaderField, text: &str) -> Result<()> {
        if field == CHANNEL_COUNT {
            self.channel_count_overridden = true;
        }
        self.put(field, text)
    }

    /// Appends a channel label to the label table
    ///
    /// Fails with `FieldTooLong` once the channel count would no longer fit
    /// its 4-byte field, unless that field was overridden.
    pub fn add_channel(&mut self, label: &str) -> Result<()> {
        if !self.channel_count_overridden && self.labels.len() >= MAX_CHANNELS {
            return Err(EdfError::FieldTooLong {
                field: CHANNEL_COUNT.name,
                width: CHANNEL_COUNT.width,
                len: (self.labels.len() + 1).to_string().len(),
            });
        }
        let bytes = padded("channel_label", label, LABEL_SIZE)?;
        self.labels.push(bytes);
        self.sync_channel_count();
        Ok(())
    }

    pub fn channel_count(&self) -> usize {
        self.labels.len()
    }

    /// Header image: the preamble followed by the label table
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity(label_offset(self.labels.len()) as usize);
        bytes.extend_from_slice(&self.preamble);
        for label in &self.labels {
            bytes.extend_from_slice(label);
        }
        bytes
    }

    pub fn write_to<W: Write>(&self, mut out: W) -> Result<()> {
        out.write_all(&self.to_bytes())?;
        out.flush()?;
        Ok(())
    }

    /// Writes the header image to a new file at `path`
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let file = File::create(path)?;
        self.write_to(BufWriter::new(file))
    }

    fn put(&mut self, field: HeaderField, text: &str) -> Result<()> {
        let bytes = padded(field.name, text, field.width)?;
        self.preamble[field.range()].copy_from_slice(&bytes);
        Ok(())
    }

    fn sync_channel_count(&mut self) {
        if self.channel_count_overridden {
            return;
        }
        // add_channel 保证计数不超过 MAX_CHANNELS
        let count = self.labels.len().to_string();
        let mut bytes = vec![b' '; CHANNEL_COUNT.width];
        bytes[..count.len()].copy_from_slice(count.as_bytes());
        self.preamble[CHANNEL_COUNT.range()].copy_from_slice(&bytes);
    }
}

fn padded(name: &'static str, text: &str, width: usize) -> Result<Vec<u8>> {
    let mut bytes = encode_latin1(text).ok_or_else(|| {
        EdfError::InvalidFormat(format!("{} is not representable as ISO-8859-1: {:?}", name, text))
    })?;

    if bytes.len() > width {
        return Err(EdfError::FieldTooLong {
            field: name,
            width,
            len: bytes.len(),
        });
    }

    bytes.resize(width, b' ');
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode_bytes;

    #[test]
    fn test_empty_writer_layout() {
        let bytes = EdfWriter::new().to_bytes();
        assert_eq!(bytes.len(), HEADER_SIZE);
        assert_eq!(&bytes[CHANNEL_COUNT.range()], b"0   ");
        assert!(bytes[8..].iter().filter(|&&b| b != b'0').all(|&b| b == b' '));
    }

    #[test]
    fn test_values_land_at_offsets() {
        let mut writer = EdfWriter::new();
        writer.set_patient_id("P123").unwrap();
        writer.set_annotation_count(12).unwrap();
        writer.add_channel("EEG Fp1").unwrap();

        let bytes = writer.to_bytes();
        assert_eq!(&bytes[168..188], b"P123                ");
        assert_eq!(&bytes[236..240], b"12  ");
        assert_eq!(&bytes[252..256], b"1   ");
        assert_eq!(&bytes[256..272], b"EEG Fp1         ");
    }

    #[test]
    fn test_field_too_long() {
        let mut writer = EdfWriter::new();
        let err = writer.set_patient_id("this id is longer than 20").unwrap_err();
        assert!(matches!(err, EdfError::FieldTooLong { field: "patient_id", width: 20, .. }));

        let err = writer.add_channel("a label that is too long").unwrap_err();
        assert!(matches!(err, EdfError::FieldTooLong { width: 16, .. }));
        assert_eq!(writer.channel_count(), 0);
    }

    #[test]
    fn test_non_latin1_rejected() {
        let mut writer = EdfWriter::new();
        assert!(matches!(
            writer.set_patient_id("\u{60a3}\u{8005}"),
            Err(EdfError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_channel_count_limit() {
        let mut writer = EdfWriter::new();
        for i in 0..MAX_CHANNELS {
            writer.add_channel(&format!("CH{}", i)).unwrap();
        }
        assert_eq!(&writer.to_bytes()[CHANNEL_COUNT.range()], b"9999");

        let err = writer.add_channel("one too many").unwrap_err();
        assert!(matches!(
            err,
            EdfError::FieldTooLong { field: "number_of_channels", width: 4, len: 5 }
        ));
        assert_eq!(writer.channel_count(), MAX_CHANNELS);

        let bytes = writer.to_bytes();
        assert_eq!(bytes.len() as u64, crate::reader::MAX_HEADER_LEN);
        let metadata = decode_bytes(&bytes).unwrap();
        assert_eq!(metadata.number_of_channels, MAX_CHANNELS);
        assert_eq!(metadata.channel_labels[MAX_CHANNELS - 1], "CH9998");
    }

    #[test]
    fn test_raw_channel_count_is_kept() {
        let mut writer = EdfWriter::new();
        writer.set_raw_field(CHANNEL_COUNT, "2").unwrap();
        writer.add_channel("A").unwrap();

        // 声明2个通道但只写了1个标签
        let bytes = writer.to_bytes();
        assert_eq!(&bytes[CHANNEL_COUNT.range()], b"2   ");
        assert!(decode_bytes(&bytes).unwrap_err().is_truncated());
    }
}
