#![allow(dead_code)]

use anyhow::Result;
use brickshelf::source::{
    CatalogSource, CategoryRecord, ColourRecord, ColourRef, OwnedSetRecord, PartRecord, SetPartRecord,
    SetRecord, SetRef, ThemeRecord,
};
use brickshelf::{
    Catalog, Colour, Element, ImageLayout, Page, Part, PartCategory, Set, SourceError, Theme,
};
use std::collections::{BTreeMap, BTreeSet};
use tempfile::TempDir;

/// A catalog in a temporary directory; removed on drop.
pub struct TempCatalog {
    pub dir: TempDir,
    pub catalog: Catalog,
}

impl TempCatalog {
    pub fn new() -> Result<Self> {
        let dir = TempDir::new()?;
        let catalog = Catalog::open(&dir.path().join("shelves"))?;
        Ok(Self { dir, catalog })
    }

    /// Drop the open handles and replay the logs from disk.
    pub fn reopen(self) -> Result<Self> {
        let Self { dir, catalog } = self;
        let root = catalog.root().to_path_buf();
        drop(catalog);
        Ok(Self {
            catalog: Catalog::open(&root)?,
            dir,
        })
    }
}

pub fn layout() -> ImageLayout {
    ImageLayout::default()
}

pub fn colour(id: i64, name: &str) -> Colour {
    Colour {
        id,
        name: name.to_string(),
        rgb: "FFFFFF".to_string(),
        is_trans: false,
    }
}

pub fn part(num: &str, name: &str, cat_id: i64) -> Part {
    Part::new(
        num,
        name,
        cat_id,
        format!("https://rebrickable.com/parts/{num}/"),
        Some(format!("https://cdn.rebrickable.com/media/parts/{num}.png")),
        &layout(),
    )
}

pub fn element(id: &str, part_num: &str, colour_id: i64, quantity: i64) -> Element {
    Element::new(
        id,
        1,
        part_num,
        colour_id,
        Some(format!("https://cdn.rebrickable.com/media/elements/{id}.jpg")),
        quantity,
        &layout(),
    )
}

pub fn set(num: &str, name: &str, theme_id: i64, elements: &[(&str, i64)]) -> Set {
    Set::new(
        num,
        name,
        2016,
        theme_id,
        elements.iter().map(|(_, q)| q).sum(),
        format!("https://rebrickable.com/sets/{num}/"),
        Some(format!("https://cdn.rebrickable.com/media/sets/{num}.jpg")),
        elements
            .iter()
            .map(|(id, q)| (id.to_string(), *q))
            .collect(),
        1,
        &layout(),
    )
}

/// Two bricks in two colours, one plate, one set containing some of them.
pub fn seed_small_collection(catalog: &mut Catalog) -> Result<()> {
    catalog.colours.put(colour(4, "Red"))?;
    catalog.colours.put(colour(1, "Blue"))?;
    catalog.part_categories.put(PartCategory {
        id: 11,
        name: "Bricks".to_string(),
    })?;
    catalog.part_categories.put(PartCategory {
        id: 14,
        name: "Plates".to_string(),
    })?;
    catalog.themes.put(Theme {
        id: 158,
        name: "Star Wars".to_string(),
        parent_id: None,
    })?;
    catalog.parts.put(part("3001", "Brick 2 x 4", 11))?;
    catalog.parts.put(part("3020", "Plate 2 x 4", 14))?;
    catalog.elements.put(element("100", "3001", 4, 2))?;
    catalog.elements.put(element("101", "3001", 1, 3))?;
    catalog.elements.put(element("200", "3020", 4, 5))?;
    catalog
        .sets
        .put(set("75159-1", "Death Star", 158, &[("100", 2), ("200", 1)]))?;
    Ok(())
}

/// In-memory catalog service with optional failures.
#[derive(Default)]
pub struct FakeSource {
    pub colours: Vec<Vec<ColourRecord>>,
    pub themes: Vec<Vec<ThemeRecord>>,
    pub categories: Vec<Vec<CategoryRecord>>,
    pub owned: Vec<Vec<OwnedSetRecord>>,
    pub sets: BTreeMap<String, SetRecord>,
    pub set_parts: BTreeMap<String, Vec<Vec<SetPartRecord>>>,
    pub images: BTreeMap<String, Vec<u8>>,
    /// Endpoint labels that answer with an error, e.g. `"owned_sets"` or
    /// `"set_parts:10030-1"`.
    pub failing: BTreeSet<String>,
    pub image_requests: usize,
}

fn page_of<T: Clone>(pages: &[Vec<T>], page: u32) -> Page<T> {
    let idx = page as usize - 1;
    let results = pages.get(idx).cloned().unwrap_or_default();
    if idx + 1 < pages.len() {
        Page::more(results)
    } else {
        Page::last(results)
    }
}

impl FakeSource {
    fn check(&self, endpoint: &str) -> Result<(), SourceError> {
        if self.failing.contains(endpoint) {
            return Err(SourceError::Remote {
                status: 404,
                detail: "Not found.".to_string(),
            });
        }
        Ok(())
    }

    pub fn add_set(&mut self, num: &str, copies: i64, pages: Vec<Vec<SetPartRecord>>) {
        if self.owned.is_empty() {
            self.owned.push(Vec::new());
        }
        self.owned[0].push(OwnedSetRecord {
            set: SetRef {
                set_num: num.to_string(),
            },
            quantity: copies,
        });
        self.sets.insert(
            num.to_string(),
            SetRecord {
                set_num: num.to_string(),
                name: format!("Set {num}"),
                year: 2016,
                theme_id: 158,
                num_parts: pages.iter().flatten().map(|p| p.quantity).sum(),
                set_url: format!("https://rebrickable.com/sets/{num}/"),
                set_img_url: Some(format!("https://cdn.rebrickable.com/media/sets/{num}.jpg")),
            },
        );
        self.set_parts.insert(num.to_string(), pages);
    }
}

pub fn set_part(id: i64, part_num: &str, colour_id: i64, quantity: i64) -> SetPartRecord {
    SetPartRecord {
        id,
        inv_part_id: id * 10,
        part: PartRecord {
            part_num: part_num.to_string(),
            name: format!("Part {part_num}"),
            part_cat_id: 11,
            part_url: format!("https://rebrickable.com/parts/{part_num}/"),
            part_img_url: Some(format!("https://cdn.rebrickable.com/media/parts/{part_num}.png")),
        },
        color: ColourRef { id: colour_id },
        quantity,
    }
}

impl CatalogSource for FakeSource {
    fn colours(&mut self, page: u32) -> Result<Page<ColourRecord>, SourceError> {
        self.check("colours")?;
        Ok(page_of(&self.colours, page))
    }

    fn themes(&mut self, page: u32) -> Result<Page<ThemeRecord>, SourceError> {
        self.check("themes")?;
        Ok(page_of(&self.themes, page))
    }

    fn part_categories(&mut self, page: u32) -> Result<Page<CategoryRecord>, SourceError> {
        self.check("part_categories")?;
        Ok(page_of(&self.categories, page))
    }

    fn owned_sets(&mut self, page: u32) -> Result<Page<OwnedSetRecord>, SourceError> {
        self.check("owned_sets")?;
        Ok(page_of(&self.owned, page))
    }

    fn set_detail(&mut self, set_num: &str) -> Result<SetRecord, SourceError> {
        self.check(&format!("set:{set_num}"))?;
        self.sets.get(set_num).cloned().ok_or(SourceError::Remote {
            status: 404,
            detail: "Not found.".to_string(),
        })
    }

    fn set_parts(&mut self, set_num: &str, page: u32) -> Result<Page<SetPartRecord>, SourceError> {
        self.check(&format!("set_parts:{set_num}"))?;
        let pages = self.set_parts.get(set_num).cloned().unwrap_or_default();
        Ok(page_of(&pages, page))
    }

    fn image(&mut self, url: &str) -> Result<Vec<u8>, SourceError> {
        self.image_requests += 1;
        self.images
            .get(url)
            .cloned()
            .ok_or_else(|| SourceError::Transport(format!("connection refused: {url}")))
    }
}
