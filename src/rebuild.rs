//! Full catalog rebuild from a `CatalogSource`.
//!
//! Reference collections (colours, themes, part categories) come first, then
//! the owned set list, then every owned set with its parts. Remote failures
//! are logged and the rebuild moves on to the next independent item; only a
//! missing owned set list aborts. A rebuild that stops half-way leaves the
//! catalog partially populated and it must be rebuilt from scratch.

use crate::entity::{Colour, Element, ImageLayout, Part, PartCategory, Set, Theme};
use crate::error::{RebuildError, SourceError, StoreError};
use crate::source::{CatalogSource, PageOutcome, SetPartRecord, paginate};
use crate::store::Catalog;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone, Debug)]
pub struct RebuildOptions {
    pub page_delay: Duration,
    pub layout: ImageLayout,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self {
            page_delay: crate::source::DEFAULT_PAGE_DELAY,
            layout: ImageLayout::default(),
        }
    }
}

/// A remote item that could not be fetched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct FetchFailure {
    pub item: String,
    pub detail: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RebuildReport {
    pub colours: usize,
    pub themes: usize,
    pub part_categories: usize,
    pub owned_sets: usize,
    pub sets: usize,
    pub element_writes: usize,
    pub failures: Vec<FetchFailure>,
}

impl RebuildReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    fn record(&mut self, item: impl Into<String>, error: &SourceError) {
        self.failures.push(FetchFailure {
            item: item.into(),
            detail: error.to_string(),
        });
    }

    fn record_outcome(&mut self, item: &str, outcome: PageOutcome) {
        if let PageOutcome::Failed { page, error } = outcome {
            self.record(format!("{item} page {page}"), &error);
        }
    }
}

/// Populate `catalog` from `source`. The catalog is expected to be empty
/// (see `Catalog::reset`).
pub fn rebuild<S: CatalogSource>(
    catalog: &mut Catalog,
    source: &mut S,
    options: &RebuildOptions,
) -> Result<RebuildReport, RebuildError> {
    let mut report = RebuildReport::default();
    let delay = options.page_delay;

    let outcome = paginate(
        "colours",
        delay,
        |page| source.colours(page),
        |c| {
            catalog.colours.put(Colour {
                id: c.id,
                name: c.name,
                rgb: c.rgb,
                is_trans: c.is_trans,
            })?;
            report.colours += 1;
            Ok::<_, StoreError>(())
        },
    )?;
    report.record_outcome("colours", outcome);

    let outcome = paginate(
        "themes",
        delay,
        |page| source.themes(page),
        |t| {
            catalog.themes.put(Theme {
                id: t.id,
                name: t.name,
                parent_id: t.parent_id,
            })?;
            report.themes += 1;
            Ok::<_, StoreError>(())
        },
    )?;
    report.record_outcome("themes", outcome);

    let outcome = paginate(
        "part_categories",
        delay,
        |page| source.part_categories(page),
        |c| {
            catalog.part_categories.put(PartCategory {
                id: c.id,
                name: c.name,
            })?;
            report.part_categories += 1;
            Ok::<_, StoreError>(())
        },
    )?;
    report.record_outcome("part_categories", outcome);

    // Owned copies per set; the set list is the precondition for everything
    // below.
    let mut owned: BTreeMap<String, i64> = BTreeMap::new();
    let outcome = paginate(
        "owned_sets",
        delay,
        |page| source.owned_sets(page),
        |entry| {
            owned.insert(entry.set.set_num, entry.quantity);
            Ok::<_, StoreError>(())
        },
    )?;
    if let PageOutcome::Failed { page, error } = outcome {
        return Err(RebuildError::OwnedSets {
            page,
            source: error,
        });
    }
    report.owned_sets = owned.len();
    info!(sets = owned.len(), "fetched owned set list");

    for (set_num, copies) in &owned {
        match fetch_set(catalog, source, options, set_num, *copies, &mut report)? {
            Ok(()) => report.sets += 1,
            Err(error) => {
                warn!(set = %set_num, %error, "skipping set");
                report.record(format!("set {set_num}"), &error);
            }
        }
    }

    info!(
        colours = report.colours,
        themes = report.themes,
        part_categories = report.part_categories,
        sets = report.sets,
        failures = report.failures.len(),
        "catalog rebuilt"
    );
    Ok(report)
}

/// Fetch one owned set and write its parts, elements and the set itself.
/// The outer result carries store failures; the inner one remote failures.
fn fetch_set<S: CatalogSource>(
    catalog: &mut Catalog,
    source: &mut S,
    options: &RebuildOptions,
    set_num: &str,
    copies: i64,
    report: &mut RebuildReport,
) -> Result<Result<(), SourceError>, RebuildError> {
    debug!(set = set_num, "fetching set");
    let detail = match source.set_detail(set_num) {
        Ok(detail) => detail,
        Err(error) => return Ok(Err(error)),
    };

    let layout = &options.layout;
    let mut elements: BTreeMap<String, i64> = BTreeMap::new();
    let outcome = paginate(
        "set_parts",
        options.page_delay,
        |page| source.set_parts(set_num, page),
        |line: SetPartRecord| {
            let part = line.part;
            catalog.parts.put(Part::new(
                part.part_num.clone(),
                part.name,
                part.part_cat_id,
                part.part_url,
                part.part_img_url.clone(),
                layout,
            ))?;
            let element_id = line.id.to_string();
            catalog.elements.put(Element::new(
                element_id.clone(),
                line.inv_part_id,
                part.part_num,
                line.color.id,
                part.part_img_url,
                line.quantity * copies,
                layout,
            ))?;
            report.element_writes += 1;
            elements.insert(element_id, line.quantity);
            Ok::<_, StoreError>(())
        },
    )?;
    if let PageOutcome::Failed { error, .. } = outcome {
        return Ok(Err(error));
    }

    catalog.sets.put(Set::new(
        detail.set_num,
        detail.name,
        detail.year,
        detail.theme_id,
        detail.num_parts,
        detail.set_url,
        detail.set_img_url,
        elements,
        copies,
        layout,
    ))?;
    Ok(Ok(()))
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ImageSyncReport {
    pub fetched: usize,
    pub present: usize,
    pub failed: usize,
}

/// Download element and set images into `root`, skipping files that already
/// exist. Failures are logged and counted; they never abort.
pub fn sync_images<S: CatalogSource>(
    catalog: &Catalog,
    source: &mut S,
    root: &Path,
) -> ImageSyncReport {
    let mut report = ImageSyncReport::default();
    let wanted = catalog
        .elements
        .iter()
        .map(|e| (e.img_url.as_deref(), e.local_img_url.as_str()))
        .chain(
            catalog
                .sets
                .iter()
                .map(|s| (s.img_url.as_deref(), s.local_img_url.as_str())),
        );
    for (remote, local) in wanted {
        let Some(remote) = remote else {
            continue;
        };
        let target = root.join(local);
        if target.is_file() {
            report.present += 1;
            continue;
        }
        let bytes = match source.image(remote) {
            Ok(bytes) => bytes,
            Err(error) => {
                warn!(url = remote, %error, "image fetch failed");
                report.failed += 1;
                continue;
            }
        };
        let written = target
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| fs::write(&target, bytes));
        match written {
            Ok(()) => report.fetched += 1,
            Err(error) => {
                warn!(path = %target.display(), %error, "cannot write image");
                report.failed += 1;
            }
        }
    }
    info!(
        fetched = report.fetched,
        present = report.present,
        failed = report.failed,
        "synced images"
    );
    report
}
