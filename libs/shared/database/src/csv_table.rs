use std::fs;
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde::{de::DeserializeOwned, Serialize};
use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tracing::{debug, instrument};

use crate::error::StoreError;
use crate::lock::table_lock;

/// A row of a CSV-backed table. `HEADERS` is written even when the table is empty and
/// must list the serialized column names in field order.
pub trait TableRow: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    const HEADERS: &'static [&'static str];
}

/// Full contents of a table together with the version they were read at.
/// `version` is `None` when the backing file does not exist.
#[derive(Debug, Clone)]
pub struct Snapshot<T> {
    pub rows: Vec<T>,
    pub version: Option<String>,
}

/// Storage interface the services are written against.
pub trait TableStore<T>: Send + Sync {
    fn location(&self) -> &Path;

    fn load(&self) -> Result<Snapshot<T>, StoreError>;

    /// Replace the whole table, provided nobody wrote it since `expected_version` was read.
    fn replace(&self, expected_version: Option<&str>, rows: &[T]) -> Result<String, StoreError>;

    /// Append one row, keeping every existing row.
    fn append(&self, row: &T) -> Result<String, StoreError>;

    /// Whole table as CSV with the header row first; just the header row when the file is absent.
    fn export(&self) -> Result<Vec<u8>, StoreError>
    where
        T: TableRow,
    {
        let rows = self.load()?.rows;
        encode_rows(self.location(), &rows)
    }

    /// Lock serializing writers of this table inside the process.
    fn write_lock(&self) -> Arc<tokio::sync::Mutex<()>> {
        table_lock(self.location())
    }
}

pub struct CsvTable<T> {
    path: PathBuf,
    _row: PhantomData<fn() -> T>,
}

impl<T> Clone for CsvTable<T> {
    fn clone(&self) -> Self {
        Self {
            path: self.path.clone(),
            _row: PhantomData,
        }
    }
}

impl<T: TableRow> CsvTable<T> {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _row: PhantomData,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_bytes(&self) -> Result<Option<Vec<u8>>, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StoreError::io(&self.path, e)),
        }
    }

    fn check_version(&self, expected: Option<&str>) -> Result<(), StoreError> {
        let found = self.read_bytes()?.map(|bytes| version_of(&bytes));
        if found.as_deref() != expected {
            return Err(StoreError::VersionMismatch {
                path: self.path.clone(),
                expected: expected.unwrap_or("<absent>").to_string(),
                found: found.unwrap_or_else(|| "<absent>".to_string()),
            });
        }
        Ok(())
    }

    fn write_atomically(&self, bytes: &[u8]) -> Result<String, StoreError> {
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut tmp = NamedTempFile::new_in(dir).map_err(|e| StoreError::io(dir, e))?;
        tmp.write_all(bytes).map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.as_file().sync_all().map_err(|e| StoreError::io(tmp.path(), e))?;
        tmp.persist(&self.path)
            .map_err(|e| StoreError::io(&self.path, e.error))?;

        let version = version_of(bytes);
        debug!("Wrote {} bytes to {} (version {})", bytes.len(), self.path.display(), version);
        Ok(version)
    }
}

impl<T: TableRow> TableStore<T> for CsvTable<T> {
    fn location(&self) -> &Path {
        &self.path
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    fn load(&self) -> Result<Snapshot<T>, StoreError> {
        let Some(bytes) = self.read_bytes()? else {
            debug!("Table file absent, treating as empty");
            return Ok(Snapshot { rows: Vec::new(), version: None });
        };

        let rows = decode_rows(&self.path, &bytes)?;
        Ok(Snapshot {
            rows,
            version: Some(version_of(&bytes)),
        })
    }

    #[instrument(skip(self, rows), fields(path = %self.path.display(), rows = rows.len()))]
    fn replace(&self, expected_version: Option<&str>, rows: &[T]) -> Result<String, StoreError> {
        self.check_version(expected_version)?;
        let bytes = encode_rows(&self.path, rows)?;
        self.write_atomically(&bytes)
    }

    #[instrument(skip(self, row), fields(path = %self.path.display()))]
    fn append(&self, row: &T) -> Result<String, StoreError> {
        let mut snapshot = self.load()?;
        snapshot.rows.push(row.clone());
        self.replace(snapshot.version.as_deref(), &snapshot.rows)
    }
}

/// Serialize `rows` as CSV with the `HEADERS` row first.
pub fn encode_rows<T: TableRow>(path: &Path, rows: &[T]) -> Result<Vec<u8>, StoreError> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(Vec::new());

    writer
        .write_record(T::HEADERS)
        .map_err(|e| StoreError::csv(path, e))?;
    for row in rows {
        writer.serialize(row).map_err(|e| StoreError::csv(path, e))?;
    }

    writer
        .into_inner()
        .map_err(|e| StoreError::io(path, std::io::Error::new(e.error().kind(), e.error().to_string())))
}

pub fn decode_rows<T: TableRow>(path: &Path, bytes: &[u8]) -> Result<Vec<T>, StoreError> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(bytes);

    reader
        .deserialize()
        .collect::<Result<Vec<T>, _>>()
        .map_err(|e| StoreError::csv(path, e))
}

fn version_of(bytes: &[u8]) -> String {
    URL_SAFE_NO_PAD.encode(Sha256::digest(bytes))
}
