//! Report tables built from the exported collections.
//!
//! Two joined tables feed the reports: a box table (element-centric) and a
//! set table (one row per set element). All joins are left joins, so an
//! element whose colour, part or category is missing still shows up with
//! null columns. Grouping sums the integer columns of each group.

use crate::error::TableError;
use crate::store::Catalog;
use crate::table::{Table, Value};

/// Group key of the box index: one row per part shape and box.
pub const BOX_INDEX_KEYS: &[&str] = &[
    "part_name",
    "part_category_name",
    "part_local_img_url",
    "part_box_num",
];

/// Group key of a single box page; colours stay distinct.
pub const BOX_DETAIL_KEYS: &[&str] = &[
    "part_category_name",
    "part_name",
    "colour_id",
    "colour_name",
    "part_num",
    "element_local_img_url",
];

/// Group key of the set index: one row per set. The owned copy count is a
/// set attribute, so it is part of the key rather than summed per element.
pub const SET_INDEX_KEYS: &[&str] = &[
    "set_num",
    "set_name",
    "set_num_parts",
    "set_local_img_url",
    "theme_name",
    "set_quantity",
];

/// Group key of a single set page: one row per part and colour in the set.
pub const SET_DETAIL_KEYS: &[&str] = &[
    "set_num",
    "set_name",
    "set_num_parts",
    "set_local_img_url",
    "theme_name",
    "set_quantity",
    "part_box_num",
    "part_name",
    "colour_name",
    "colour_id",
    "element_local_img_url",
];

/// Join columns that only repeat information carried elsewhere once the set
/// table is assembled.
const SET_REDUNDANT_COLUMNS: &[&str] = &[
    "set_element_id",
    "element_part_num",
    "set_theme_id",
    "element_colour_id",
    "part_category_id",
    "set_element_quantity",
];

/// Elements joined with their colour, part and part category.
pub fn box_table(catalog: &Catalog) -> Result<Table, TableError> {
    element_details(catalog)
}

/// One row per (part, category, part image, box), quantities summed over
/// every colour of the part.
pub fn box_index(catalog: &Catalog) -> Result<Table, TableError> {
    box_table(catalog)?.group_sum(BOX_INDEX_KEYS)
}

/// Contents of one box, one row per part and colour.
pub fn box_detail(catalog: &Catalog, box_num: &str) -> Result<Table, TableError> {
    box_table(catalog)?
        .filter_eq("part_box_num", &Value::text(box_num))?
        .group_sum(BOX_DETAIL_KEYS)
}

/// Set elements joined with element, colour, part, category and theme.
pub fn set_table(catalog: &Catalog) -> Result<Table, TableError> {
    let sets = catalog.sets.export_table()?;
    let elements = element_details(catalog)?;
    let themes = catalog.themes.export_table()?;

    sets.left_join(&elements, "set_element_id", "element_id")?
        .left_join(&themes, "set_theme_id", "theme_id")?
        .drop_columns(SET_REDUNDANT_COLUMNS)
}

/// One row per owned set.
pub fn set_index(catalog: &Catalog) -> Result<Table, TableError> {
    set_table(catalog)?.group_sum(SET_INDEX_KEYS)
}

/// Contents of one set, one row per part and colour.
pub fn set_detail(catalog: &Catalog, set_num: &str) -> Result<Table, TableError> {
    set_table(catalog)?
        .group_sum(SET_DETAIL_KEYS)?
        .filter_eq("set_num", &Value::text(set_num))
}

fn element_details(catalog: &Catalog) -> Result<Table, TableError> {
    let elements = catalog.elements.export_table()?;
    let colours = catalog.colours.export_table()?;
    let parts = catalog.parts.export_table()?;
    let categories = catalog.part_categories.export_table()?;

    elements
        .left_join(&colours, "element_colour_id", "colour_id")?
        .left_join(&parts, "element_part_num", "part_num")?
        .left_join(&categories, "part_cat_id", "part_category_id")
}
