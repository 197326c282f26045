use std::io::{self, Read, Seek, SeekFrom};

/// Random access to a sequence of bytes
///
/// The decoder only ever asks for "exactly `buf.len()` bytes starting at
/// `offset`", which keeps it independent of where the bytes came from: a
/// local file, an in-memory buffer or a downloaded payload.
///
/// Every `Read + Seek` type is a `ByteSource`:
///
/// ```rust
/// use std::io::Cursor;
/// use edf_descriptor::ByteSource;
///
/// let mut source = Cursor::new(b"0       P123".to_vec());
/// let mut buf = [0u8; 4];
/// source.read_exact_at(8, &mut buf)?;
/// assert_eq!(&buf, b"P123");
///
/// // Reading past the end fails instead of returning fewer bytes
/// assert!(source.read_exact_at(10, &mut buf).is_err());
/// # Ok::<(), std::io::Error>(())
/// ```
pub trait ByteSource {
    /// Fills `buf` with the bytes at `offset..offset + buf.len()`
    ///
    /// Fails with `io::ErrorKind::UnexpectedEof` when the source ends first.
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()>;
}

impl<T: Read + Seek> ByteSource for T {
    fn read_exact_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.read_exact(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_read_exact_at_is_positional() {
        let mut source = Cursor::new((0u8..32).collect::<Vec<u8>>());
        let mut buf = [0u8; 4];

        source.read_exact_at(20, &mut buf).unwrap();
        assert_eq!(buf, [20, 21, 22, 23]);

        // 偏移与之前的读取无关
        source.read_exact_at(2, &mut buf).unwrap();
        assert_eq!(buf, [2, 3, 4, 5]);
    }

    #[test]
    fn test_short_read_is_unexpected_eof() {
        let mut source = Cursor::new(vec![0u8; 10]);
        let mut buf = [0u8; 4];

        let err = source.read_exact_at(8, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);

        let err = source.read_exact_at(100, &mut buf).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    }

    #[test]
    fn test_boxed_source() {
        let mut source: Box<dyn ByteSource + Send> = Box::new(Cursor::new(b"abcdef".to_vec()));
        let mut buf = [0u8; 2];
        source.read_exact_at(4, &mut buf).unwrap();
        assert_eq!(&buf, b"ef");
    }
}
