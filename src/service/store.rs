//! Persistence for decoded metadata

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::types::{EdfMetadata, StoredMetadata};

/// Title given to every record created from a downloaded file
pub const RECORD_TITLE: &str = "EDF File";

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Stores metadata records and assigns their identifiers
pub trait MetadataStore: Send + Sync {
    /// Persists `metadata` and returns the stored copy with its new id
    fn save(&self, metadata: EdfMetadata) -> Result<StoredMetadata, StorageError>;

    fn find(&self, id: u64) -> Result<Option<StoredMetadata>, StorageError>;
}

/// Keeps records in memory; ids start at 1
#[derive(Debug)]
pub struct InMemoryStore {
    records: RwLock<Vec<StoredMetadata>>,
    next_id: AtomicU64,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self {
            records: RwLock::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }
}

impl MetadataStore for InMemoryStore {
    fn save(&self, metadata: EdfMetadata) -> Result<StoredMetadata, StorageError> {
        let stored = StoredMetadata {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            title: RECORD_TITLE.to_string(),
            metadata,
        };
        self.records.write().push(stored.clone());
        debug!(id = stored.id, "Stored metadata in memory");
        Ok(stored)
    }

    fn find(&self, id: u64) -> Result<Option<StoredMetadata>, StorageError> {
        Ok(self.records.read().iter().find(|r| r.id == id).cloned())
    }
}

/// Appends one JSON object per record to a file
///
/// Reopening an existing file continues numbering after its largest id.
#[derive(Debug)]
pub struct JsonLinesStore {
    path: PathBuf,
    inner: Mutex<JsonLinesInner>,
}

#[derive(Debug)]
struct JsonLinesInner {
    file: File,
    next_id: u64,
}

impl JsonLinesStore {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        let mut max_id = 0;
        for record in read_records(&path)? {
            max_id = max_id.max(record.id);
        }
        info!(path = %path.display(), next_id = max_id + 1, "Opened JSON lines store");

        Ok(Self {
            path,
            inner: Mutex::new(JsonLinesInner {
                file,
                next_id: max_id + 1,
            }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl MetadataStore for JsonLinesStore {
    fn save(&self, metadata: EdfMetadata) -> Result<StoredMetadata, StorageError> {
        let mut inner = self.inner.lock();
        let stored = StoredMetadata {
            id: inner.next_id,
            title: RECORD_TITLE.to_string(),
            metadata,
        };

        let mut line = serde_json::to_string(&stored)?;
        line.push('\n');
        append_line(&mut inner.file, line.as_bytes())?;

        inner.next_id += 1;
        debug!(id = stored.id, path = %self.path.display(), "Appended metadata record");
        Ok(stored)
    }

    fn find(&self, id: u64) -> Result<Option<StoredMetadata>, StorageError> {
        // 持锁读取，避免读到写了一半的行
        let _guard = self.inner.lock();
        Ok(read_records(&self.path)?.into_iter().find(|r| r.id == id))
    }
}

/// Append target that can be cut back to an earlier length
trait LineSink: Write {
    fn current_len(&self) -> io::Result<u64>;
    fn truncate_to(&mut self, len: u64) -> io::Result<()>;
}

impl LineSink for File {
    fn current_len(&self) -> io::Result<u64> {
        Ok(self.metadata()?.len())
    }

    fn truncate_to(&mut self, len: u64) -> io::Result<()> {
        self.set_len(len)
    }
}

/// Writes one whole line or nothing; a failed write is cut off again
fn append_line<S: LineSink>(sink: &mut S, line: &[u8]) -> io::Result<()> {
    let len = sink.current_len()?;
    if let Err(e) = sink.write_all(line).and_then(|_| sink.flush()) {
        if let Err(undo) = sink.truncate_to(len) {
            warn!(error = %undo, len, "Failed to remove partially written record");
        }
        return Err(e);
    }
    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<StoredMetadata>, StorageError> {
    let reader = BufReader::new(File::open(path)?);
    let mut records = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        records.push(serde_json::from_str(&line)?);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(patient_id: &str) -> EdfMetadata {
        EdfMetadata {
            patient_id: patient_id.to_string(),
            start_date: "12.02.25".to_string(),
            number_of_channels: 2,
            duration: 300.0,
            number_of_annotations: 5,
            channel_labels: vec!["EEG Fp1".to_string(), "EEG Fp2".to_string()],
        }
    }

    #[test]
    fn test_in_memory_assigns_ids() {
        let store = InMemoryStore::new();
        let first = store.save(sample("A")).unwrap();
        let second = store.save(sample("B")).unwrap();

        assert_eq!(first.id, 1);
        assert_eq!(second.id, 2);
        assert_eq!(first.title, RECORD_TITLE);
        assert_eq!(store.len(), 2);
        assert_eq!(store.find(2).unwrap().unwrap().metadata.patient_id, "B");
        assert!(store.find(3).unwrap().is_none());
    }

    #[test]
    fn test_json_lines_persists_across_reopen() {
        let path = std::env::temp_dir().join("edf_descriptor_store_test.jsonl");
        std::fs::remove_file(&path).ok();

        {
            let store = JsonLinesStore::open(&path).unwrap();
            assert_eq!(store.save(sample("A")).unwrap().id, 1);
            assert_eq!(store.save(sample("B")).unwrap().id, 2);
        }

        let store = JsonLinesStore::open(&path).unwrap();
        let found = store.find(1).unwrap().unwrap();
        assert_eq!(found.metadata, sample("A"));
        assert_eq!(store.save(sample("C")).unwrap().id, 3);
        assert!(store.find(42).unwrap().is_none());

        std::fs::remove_file(&path).ok();
    }

    /// Accepts `budget` bytes, then fails every write
    struct ShortSink {
        data: Vec<u8>,
        budget: usize,
    }

    impl Write for ShortSink {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            if self.budget == 0 {
                return Err(io::Error::other("disk full"));
            }
            let n = buf.len().min(self.budget);
            self.data.extend_from_slice(&buf[..n]);
            self.budget -= n;
            Ok(n)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl LineSink for ShortSink {
        fn current_len(&self) -> io::Result<u64> {
            Ok(self.data.len() as u64)
        }

        fn truncate_to(&mut self, len: u64) -> io::Result<()> {
            self.data.truncate(len as usize);
            Ok(())
        }
    }

    #[test]
    fn test_failed_append_leaves_no_partial_line() {
        let first = b"{\"id\":1}\n";
        let mut sink = ShortSink {
            data: Vec::new(),
            budget: first.len() + 5,
        };

        append_line(&mut sink, first).unwrap();
        assert!(append_line(&mut sink, b"{\"id\":2,\"title\":\"EDF File\"}\n").is_err());
        assert_eq!(sink.data, first);

        // 空间恢复后下一行从干净的行首开始
        sink.budget = 64;
        append_line(&mut sink, b"{\"id\":3}\n").unwrap();
        assert_eq!(sink.data, b"{\"id\":1}\n{\"id\":3}\n");
    }

    #[test]
    fn test_file_sink_truncates() {
        let path = std::env::temp_dir().join("edf_descriptor_store_truncate.jsonl");
        std::fs::remove_file(&path).ok();

        let mut file = OpenOptions::new().create(true).append(true).open(&path).unwrap();
        append_line(&mut file, b"first\n").unwrap();
        append_line(&mut file, b"second\n").unwrap();
        assert_eq!(file.current_len().unwrap(), 13);

        file.truncate_to(6).unwrap();
        append_line(&mut file, b"third\n").unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "first\nthird\n");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_json_lines_rejects_corrupt_file() {
        let path = std::env::temp_dir().join("edf_descriptor_store_corrupt.jsonl");
        std::fs::write(&path, "{not json}\n").unwrap();

        assert!(matches!(JsonLinesStore::open(&path), Err(StorageError::Json(_))));
        std::fs::remove_file(&path).ok();
    }
}
