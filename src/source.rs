//! Remote catalog source.
//!
//! The catalog service is reached through `CatalogSource`; the HTTP client
//! lives outside this crate. Records mirror the service's JSON field names so
//! a client can deserialize responses straight into them. List endpoints are
//! paginated and the service throttles callers, so successive page requests
//! are spaced by a fixed delay.

use crate::error::SourceError;
use serde::Deserialize;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};

/// Delay between successive page requests to the catalog service.
pub const DEFAULT_PAGE_DELAY: Duration = Duration::from_millis(500);

/// One page of a list endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct Page<T> {
    pub results: Vec<T>,
    /// Set when another page follows.
    #[serde(default, deserialize_with = "next_marker")]
    pub next: bool,
}

impl<T> Page<T> {
    pub fn last(results: Vec<T>) -> Self {
        Self {
            results,
            next: false,
        }
    }

    pub fn more(results: Vec<T>) -> Self {
        Self {
            results,
            next: true,
        }
    }
}

// The service sends the next page URL or null.
fn next_marker<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => false,
        Some(serde_json::Value::Bool(flag)) => flag,
        Some(serde_json::Value::String(url)) => !url.is_empty(),
        Some(_) => true,
    })
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ColourRecord {
    pub id: i64,
    pub name: String,
    pub rgb: String,
    pub is_trans: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ThemeRecord {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct CategoryRecord {
    pub id: i64,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SetRef {
    pub set_num: String,
}

/// Entry of the user's saved set list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct OwnedSetRecord {
    pub set: SetRef,
    pub quantity: i64,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SetRecord {
    pub set_num: String,
    pub name: String,
    pub year: i64,
    pub theme_id: i64,
    pub num_parts: i64,
    pub set_url: String,
    #[serde(default)]
    pub set_img_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct PartRecord {
    pub part_num: String,
    pub name: String,
    pub part_cat_id: i64,
    pub part_url: String,
    #[serde(default)]
    pub part_img_url: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct ColourRef {
    pub id: i64,
}

/// One line of a set's parts list.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct SetPartRecord {
    pub id: i64,
    pub inv_part_id: i64,
    pub part: PartRecord,
    pub color: ColourRef,
    pub quantity: i64,
}

/// Read access to the remote catalog. Page numbers start at 1.
pub trait CatalogSource {
    fn colours(&mut self, page: u32) -> Result<Page<ColourRecord>, SourceError>;
    fn themes(&mut self, page: u32) -> Result<Page<ThemeRecord>, SourceError>;
    fn part_categories(&mut self, page: u32) -> Result<Page<CategoryRecord>, SourceError>;
    fn owned_sets(&mut self, page: u32) -> Result<Page<OwnedSetRecord>, SourceError>;
    fn set_detail(&mut self, set_num: &str) -> Result<SetRecord, SourceError>;
    fn set_parts(&mut self, set_num: &str, page: u32) -> Result<Page<SetPartRecord>, SourceError>;
    /// Raw bytes behind an image URL.
    fn image(&mut self, url: &str) -> Result<Vec<u8>, SourceError>;
}

/// Where pagination stopped.
#[derive(Debug)]
pub enum PageOutcome {
    /// Every page was read.
    Complete { pages: u32 },
    /// A page failed; pages before it were handed to the sink.
    Failed { page: u32, error: SourceError },
}

impl PageOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, PageOutcome::Complete { .. })
    }
}

/// Walk a paginated endpoint, handing each page's records to `sink` and
/// sleeping `delay` before every page after the first. A failed page is not
/// retried; it ends the walk.
pub fn paginate<T, F, S, E>(
    label: &str,
    delay: Duration,
    mut fetch: F,
    mut sink: S,
) -> Result<PageOutcome, E>
where
    F: FnMut(u32) -> Result<Page<T>, SourceError>,
    S: FnMut(T) -> Result<(), E>,
{
    let mut page = 1;
    loop {
        if page > 1 && !delay.is_zero() {
            thread::sleep(delay);
        }
        debug!(endpoint = label, page, "fetching page");
        let batch = match fetch(page) {
            Ok(batch) => batch,
            Err(error) => {
                warn!(endpoint = label, page, %error, "page fetch failed");
                return Ok(PageOutcome::Failed { page, error });
            }
        };
        for record in batch.results {
            sink(record)?;
        }
        if !batch.next {
            return Ok(PageOutcome::Complete { pages: page });
        }
        page += 1;
    }
}
