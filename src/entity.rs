//! Record types for the collection.
//!
//! Bricks are stored in labelled boxes by shape, so a `Part` (shape only)
//! carries the box assignment while an `Element` (shape plus colour) carries
//! the owned quantity. Field names follow the catalog service so exported
//! columns read the same as the remote data.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// File name used when an entity has no remote image.
pub const PLACEHOLDER_IMAGE: &str = "ni.png";

/// Where local copies of remote images live, relative to the report root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ImageLayout {
    pub part_dir: String,
    pub element_dir: String,
    pub set_dir: String,
}

impl Default for ImageLayout {
    fn default() -> Self {
        Self {
            part_dir: "img/parts".to_string(),
            element_dir: "img/elements".to_string(),
            set_dir: "img/sets".to_string(),
        }
    }
}

impl ImageLayout {
    /// Derive the local image path for a remote URL under `dir`.
    ///
    /// A missing URL maps to the placeholder image; otherwise the last path
    /// segment of the URL is kept and prefixed with `dir`.
    pub fn local_path(dir: &str, remote: Option<&str>) -> String {
        let file = remote
            .and_then(last_segment)
            .unwrap_or(PLACEHOLDER_IMAGE);
        let dir = dir.trim_end_matches('/');
        if dir.is_empty() {
            file.to_string()
        } else {
            format!("{dir}/{file}")
        }
    }
}

fn last_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().filter(|segment| !segment.is_empty())
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Colour {
    pub id: i64,
    pub name: String,
    pub rgb: String,
    pub is_trans: bool,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub id: i64,
    pub name: String,
    /// Parent theme id; not checked against the theme collection.
    pub parent_id: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartCategory {
    pub id: i64,
    pub name: String,
}

/// A brick shape and the box it is stored in.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub num: String,
    pub name: String,
    pub cat_id: i64,
    pub url: String,
    pub img_url: Option<String>,
    pub local_img_url: String,
    /// Unset until the box resolver runs.
    pub box_num: Option<String>,
}

impl Part {
    pub fn new(
        num: impl Into<String>,
        name: impl Into<String>,
        cat_id: i64,
        url: impl Into<String>,
        img_url: Option<String>,
        layout: &ImageLayout,
    ) -> Self {
        let local_img_url = ImageLayout::local_path(&layout.part_dir, img_url.as_deref());
        Self {
            num: num.into(),
            name: name.into(),
            cat_id,
            url: url.into(),
            img_url,
            local_img_url,
            box_num: None,
        }
    }
}

/// A shape in a given colour, with the total owned quantity.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Element {
    pub id: String,
    pub design_id: i64,
    pub part_num: String,
    pub colour_id: i64,
    pub img_url: Option<String>,
    pub local_img_url: String,
    pub quantity: i64,
}

impl Element {
    pub fn new(
        id: impl Into<String>,
        design_id: i64,
        part_num: impl Into<String>,
        colour_id: i64,
        img_url: Option<String>,
        quantity: i64,
        layout: &ImageLayout,
    ) -> Self {
        let local_img_url = ImageLayout::local_path(&layout.element_dir, img_url.as_deref());
        Self {
            id: id.into(),
            design_id,
            part_num: part_num.into(),
            colour_id,
            img_url,
            local_img_url,
            quantity,
        }
    }
}

/// An owned set and the elements it contributes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Set {
    pub num: String,
    pub name: String,
    pub year: i64,
    pub theme_id: i64,
    pub num_parts: i64,
    pub url: String,
    pub img_url: Option<String>,
    pub local_img_url: String,
    /// element id -> quantity in one copy of the set.
    pub elements: BTreeMap<String, i64>,
    /// How many copies of the set are owned.
    pub quantity: i64,
}

impl Set {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        num: impl Into<String>,
        name: impl Into<String>,
        year: i64,
        theme_id: i64,
        num_parts: i64,
        url: impl Into<String>,
        img_url: Option<String>,
        elements: BTreeMap<String, i64>,
        quantity: i64,
        layout: &ImageLayout,
    ) -> Self {
        let local_img_url = ImageLayout::local_path(&layout.set_dir, img_url.as_deref());
        Self {
            num: num.into(),
            name: name.into(),
            year,
            theme_id,
            num_parts,
            url: url.into(),
            img_url,
            local_img_url,
            elements,
            quantity,
        }
    }
}

/// Label of a physical storage box, e.g. `"10"` or `"1.1"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BoxLabel {
    pub num: String,
}

impl BoxLabel {
    pub fn new(num: impl Into<String>) -> Self {
        Self { num: num.into() }
    }
}
