use super::Store;
use crate::entity::{BoxLabel, Colour, Element, Part, PartCategory, Set, Theme};
use crate::error::StoreError;
use serde::Serialize;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::info;

/// Every collection of one store directory, opened together.
#[derive(Debug)]
pub struct Catalog {
    root: PathBuf,
    pub colours: Store<Colour>,
    pub themes: Store<Theme>,
    pub part_categories: Store<PartCategory>,
    pub parts: Store<Part>,
    pub elements: Store<Element>,
    pub sets: Store<Set>,
    pub boxes: Store<BoxLabel>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct CatalogCounts {
    pub colours: usize,
    pub themes: usize,
    pub part_categories: usize,
    pub parts: usize,
    pub elements: usize,
    pub sets: usize,
    pub boxes: usize,
}

impl Catalog {
    pub fn open(root: &Path) -> Result<Self, StoreError> {
        Ok(Self {
            root: root.to_path_buf(),
            colours: Store::open(root)?,
            themes: Store::open(root)?,
            part_categories: Store::open(root)?,
            parts: Store::open(root)?,
            elements: Store::open(root)?,
            sets: Store::open(root)?,
            boxes: Store::open(root)?,
        })
    }

    /// Discard everything under `root` and open an empty catalog there.
    ///
    /// A rebuild always starts from here; collections are never patched
    /// incrementally.
    pub fn reset(root: &Path) -> Result<Self, StoreError> {
        match fs::remove_dir_all(root) {
            Ok(()) => info!(root = %root.display(), "discarded previous catalog"),
            Err(err) if err.kind() == ErrorKind::NotFound => {}
            Err(source) => {
                return Err(StoreError::Io {
                    collection: "catalog",
                    path: root.to_path_buf(),
                    source,
                });
            }
        }
        Self::open(root)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn counts(&self) -> CatalogCounts {
        CatalogCounts {
            colours: self.colours.len(),
            themes: self.themes.len(),
            part_categories: self.part_categories.len(),
            parts: self.parts.len(),
            elements: self.elements.len(),
            sets: self.sets.len(),
            boxes: self.boxes.len(),
        }
    }

    /// Compact every collection log.
    pub fn compact(&mut self) -> Result<(), StoreError> {
        self.colours.compact()?;
        self.themes.compact()?;
        self.part_categories.compact()?;
        self.parts.compact()?;
        self.elements.compact()?;
        self.sets.compact()?;
        self.boxes.compact()
    }
}
