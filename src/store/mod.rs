//! File-backed keyed collections.
//!
//! Each entity type lives in its own JSON-lines log under the store
//! directory (`colours.jsonl`, `elements.jsonl`, ...). A write appends the
//! record as it stands after the type's merge policy and syncs the file
//! before returning; opening a collection replays the log with the last
//! record per key winning. `CatalogEntity` is the per-type policy seam: write
//! merging and export row shaping are overridden there, not in the store.

mod catalog;
mod collections;

pub use catalog::{Catalog, CatalogCounts};

use crate::error::{StoreError, TableError};
use crate::table::{Table, Value};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};

/// Storage and export policy for one entity type.
pub trait CatalogEntity: Serialize + DeserializeOwned + Clone {
    /// File stem of the collection inside the store directory.
    const COLLECTION: &'static str;
    /// Prefix applied to every exported column (`colour` -> `colour_name`).
    const PREFIX: &'static str;
    /// Unprefixed attribute names, in export order.
    const FIELDS: &'static [&'static str];
    /// Attributes exported as integers; everything else is exported as text.
    const NUMERIC_FIELDS: &'static [&'static str] = &[];

    fn key(&self) -> String;

    /// Combine a stored record with an incoming one written under the same
    /// key. Replaces by default.
    fn merge(stored: Self, incoming: Self) -> Self {
        let _ = stored;
        incoming
    }

    /// Attribute values in `FIELDS` order.
    fn cells(&self) -> Vec<Value>;

    /// Rows contributed to the exported table. One row by default.
    fn export_rows(&self) -> Vec<Vec<Value>> {
        vec![self.cells()]
    }

    fn columns() -> Vec<String> {
        Self::FIELDS
            .iter()
            .map(|field| format!("{}_{field}", Self::PREFIX))
            .collect()
    }
}

#[derive(Serialize)]
struct LogEntry<'a, E> {
    key: &'a str,
    value: &'a E,
}

#[derive(Deserialize)]
struct StoredEntry<E> {
    key: String,
    value: E,
}

/// One durable collection of `E`, keyed by `E::key`.
#[derive(Debug)]
pub struct Store<E: CatalogEntity> {
    path: PathBuf,
    log: File,
    records: BTreeMap<String, E>,
}

impl<E: CatalogEntity> Store<E> {
    /// Open (or create) the collection inside `dir`.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        let path = dir.join(format!("{}.jsonl", E::COLLECTION));
        fs::create_dir_all(dir).map_err(|source| io_error::<E>(dir, source))?;
        let records = replay::<E>(&path)?;
        let log = open_log::<E>(&path)?;
        debug!(
            collection = E::COLLECTION,
            records = records.len(),
            "opened collection"
        );
        Ok(Self { path, log, records })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.records.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Result<&E, StoreError> {
        self.records.get(key).ok_or_else(|| StoreError::NotFound {
            collection: E::COLLECTION,
            key: key.to_string(),
        })
    }

    /// Keys in sorted order. The returned list is a snapshot, so callers may
    /// write to the store while walking it.
    pub fn keys(&self) -> Vec<String> {
        self.records.keys().cloned().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &E> {
        self.records.values()
    }

    /// Write `entity` under its key, applying the type's merge policy when
    /// the key already exists. Returns the record as stored.
    pub fn put(&mut self, entity: E) -> Result<&E, StoreError> {
        let key = entity.key();
        let merged = match self.records.get(&key) {
            Some(stored) => E::merge(stored.clone(), entity),
            None => entity,
        };
        self.write(key, merged)
    }

    /// Rewrite an existing record in place, bypassing the merge policy.
    pub fn update<F>(&mut self, key: &str, edit: F) -> Result<&E, StoreError>
    where
        F: FnOnce(&mut E),
    {
        let mut record = self.get(key)?.clone();
        edit(&mut record);
        self.write(key.to_string(), record)
    }

    /// Export every record as rows of prefixed columns. A row whose width
    /// differs from `FIELDS` is a `TableError::RowWidth`.
    pub fn export_table(&self) -> Result<Table, TableError> {
        let mut table = Table::new(E::columns());
        for record in self.records.values() {
            for row in record.export_rows() {
                if row.len() != E::FIELDS.len() {
                    return Err(TableError::RowWidth {
                        expected: E::FIELDS.len(),
                        found: row.len(),
                    });
                }
                let cells = E::FIELDS
                    .iter()
                    .zip(row)
                    .map(|(field, cell)| export_cell::<E>(field, cell))
                    .collect();
                table.push_row(cells)?;
            }
        }
        Ok(table)
    }

    /// Rewrite the log with a single line per key.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        let dir = self.path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = NamedTempFile::new_in(dir).map_err(|source| io_error::<E>(dir, source))?;
        {
            let mut writer = BufWriter::new(tmp.as_file());
            for (key, value) in &self.records {
                writer
                    .write_all(&encode_entry(key, value)?)
                    .map_err(|source| io_error::<E>(&self.path, source))?;
            }
            writer
                .flush()
                .map_err(|source| io_error::<E>(&self.path, source))?;
        }
        tmp.as_file()
            .sync_all()
            .map_err(|source| io_error::<E>(&self.path, source))?;
        tmp.persist(&self.path)
            .map_err(|err| io_error::<E>(&self.path, err.error))?;
        self.log = open_log::<E>(&self.path)?;
        debug!(
            collection = E::COLLECTION,
            records = self.records.len(),
            "compacted collection"
        );
        Ok(())
    }

    /// Memory is only updated once the line is durable; a failed append is
    /// cut back off the log so it does not reappear on the next open.
    fn write(&mut self, key: String, record: E) -> Result<&E, StoreError> {
        let line = encode_entry(&key, &record)?;
        append_line(&mut self.log, &line, File::sync_data)
            .map_err(|source| io_error::<E>(&self.path, source))?;
        self.records.insert(key.clone(), record);
        Ok(&self.records[&key])
    }
}

fn export_cell<E: CatalogEntity>(field: &str, cell: Value) -> Value {
    if E::NUMERIC_FIELDS.contains(&field) {
        return match cell {
            Value::Text(text) => text.trim().parse().map_or(Value::Null, Value::Int),
            other => other,
        };
    }
    match cell {
        Value::Int(v) => Value::Text(v.to_string()),
        other => other,
    }
}

fn encode_entry<E: CatalogEntity>(key: &str, value: &E) -> Result<Vec<u8>, StoreError> {
    let mut line = serde_json::to_vec(&LogEntry { key, value }).map_err(|source| {
        StoreError::Encode {
            collection: E::COLLECTION,
            key: key.to_string(),
            source,
        }
    })?;
    line.push(b'\n');
    Ok(line)
}

/// Append `line` and make it durable with `sync`. On any failure the log is
/// truncated back to its length before the append.
fn append_line<S>(log: &mut File, line: &[u8], sync: S) -> io::Result<()>
where
    S: FnOnce(&File) -> io::Result<()>,
{
    let len = log.metadata()?.len();
    let result = log.write_all(line).and_then(|()| sync(&*log));
    if let Err(err) = result {
        if let Err(rollback) = log.set_len(len) {
            warn!(%rollback, "cannot truncate failed append");
        }
        return Err(err);
    }
    Ok(())
}

/// Load the log at `path`, last record per key winning.
///
/// A crash mid-append leaves a final line without its newline. If that line
/// does not parse it is dropped and the file truncated to the last complete
/// record; an unreadable line anywhere else is `StoreError::Corrupt`.
fn replay<E: CatalogEntity>(path: &Path) -> Result<BTreeMap<String, E>, StoreError> {
    let mut records = BTreeMap::new();
    let file = match File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(records),
        Err(source) => return Err(io_error::<E>(path, source)),
    };
    let mut reader = BufReader::new(file);
    let mut buf = Vec::new();
    let mut complete: u64 = 0;
    let mut line = 0;
    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| io_error::<E>(path, source))?;
        if read == 0 {
            break;
        }
        line += 1;
        let terminated = buf.last() == Some(&b'\n');
        if buf.iter().all(u8::is_ascii_whitespace) {
            complete += read as u64;
            continue;
        }
        match serde_json::from_slice::<StoredEntry<E>>(&buf) {
            Ok(entry) => {
                records.insert(entry.key, entry.value);
                if !terminated {
                    // Complete record, lost newline: restore it so the next
                    // append starts a fresh line.
                    repair_log::<E>(path, |log| log.write_all(b"\n"))?;
                }
                complete += read as u64;
            }
            Err(_) if !terminated => {
                warn!(
                    collection = E::COLLECTION,
                    path = %path.display(),
                    line,
                    bytes = read,
                    "dropping torn record at end of log"
                );
                repair_log::<E>(path, |log| log.set_len(complete))?;
                break;
            }
            Err(source) => {
                return Err(StoreError::Corrupt {
                    collection: E::COLLECTION,
                    path: path.to_path_buf(),
                    line,
                    source,
                });
            }
        }
    }
    Ok(records)
}

fn repair_log<E: CatalogEntity>(
    path: &Path,
    fix: impl FnOnce(&mut File) -> io::Result<()>,
) -> Result<(), StoreError> {
    let mut log = OpenOptions::new()
        .append(true)
        .open(path)
        .map_err(|source| io_error::<E>(path, source))?;
    fix(&mut log)
        .and_then(|()| log.sync_all())
        .map_err(|source| io_error::<E>(path, source))
}

fn open_log<E: CatalogEntity>(path: &Path) -> Result<File, StoreError> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| io_error::<E>(path, source))
}

fn io_error<E: CatalogEntity>(path: &Path, source: io::Error) -> StoreError {
    StoreError::Io {
        collection: E::COLLECTION,
        path: path.to_path_buf(),
        source,
    }
}
