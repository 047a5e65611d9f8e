//! Error types for the store, tables, box resolution and catalog rebuilds.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{collection}: no entry for key '{key}'")]
    NotFound { collection: &'static str, key: String },

    #[error("{collection}: i/o on {}", path.display())]
    Io {
        collection: &'static str,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{collection}: corrupt record at {}:{line}", path.display())]
    Corrupt {
        collection: &'static str,
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("{collection}: cannot encode record '{key}'")]
    Encode {
        collection: &'static str,
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TableError {
    #[error("unknown column '{0}'")]
    UnknownColumn(String),

    #[error("row has {found} cells, table has {expected} columns")]
    RowWidth { expected: usize, found: usize },
}

#[derive(Debug, Error)]
pub enum BoxError {
    #[error("box assignments line {line}: expected 2 columns, found {columns}")]
    Malformed { line: usize, columns: usize },

    #[error("box assignments row {row}: '{label}' is reserved for unassigned parts")]
    ReservedLabel { row: usize, label: String },

    #[error("reading box assignments from {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Failure reported by a catalog source for one page or resource.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("catalog service returned {status}: {detail}")]
    Remote { status: u16, detail: String },

    #[error("catalog transport: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("owned set list unavailable (page {page})")]
    OwnedSets {
        page: u32,
        #[source]
        source: SourceError,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}
