//! Local inventory of a Lego collection.
//!
//! The catalog service is the system of record for colours, themes, part
//! categories, parts and sets. `rebuild` copies the owned part of it into a
//! file-backed `Catalog`, `boxes` attaches storage boxes to parts, and
//! `pipeline` joins the collections into the tables behind the box and set
//! reports.

pub mod boxes;
pub mod config;
pub mod entity;
pub mod error;
pub mod pipeline;
pub mod rebuild;
pub mod source;
pub mod store;
pub mod table;

pub use boxes::{BoxAssignment, BoxPolicy, ResolveSummary, parse_assignments, resolve, resolve_file};
pub use config::Config;
pub use entity::{BoxLabel, Colour, Element, ImageLayout, Part, PartCategory, Set, Theme};
pub use error::{BoxError, RebuildError, SourceError, StoreError, TableError};
pub use rebuild::{RebuildOptions, RebuildReport, rebuild, sync_images};
pub use source::{CatalogSource, Page};
pub use store::{Catalog, CatalogCounts, CatalogEntity, Store};
pub use table::{Table, Value};

/// Split a comma or whitespace separated list, dropping empty items.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .replace(',', " ")
        .split_whitespace()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
