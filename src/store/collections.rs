use super::CatalogEntity;
use crate::entity::{BoxLabel, Colour, Element, Part, PartCategory, Set, Theme};
use crate::table::Value;

fn flag(value: bool) -> Value {
    Value::text(if value { "True" } else { "False" })
}

impl CatalogEntity for Colour {
    const COLLECTION: &'static str = "colours";
    const PREFIX: &'static str = "colour";
    const FIELDS: &'static [&'static str] = &["id", "name", "rgb", "is_trans"];

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::text(&self.name),
            Value::text(&self.rgb),
            flag(self.is_trans),
        ]
    }
}

impl CatalogEntity for Theme {
    const COLLECTION: &'static str = "themes";
    const PREFIX: &'static str = "theme";
    const FIELDS: &'static [&'static str] = &["id", "name", "parent_id"];

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::Int(self.id),
            Value::text(&self.name),
            self.parent_id.into(),
        ]
    }
}

impl CatalogEntity for PartCategory {
    const COLLECTION: &'static str = "part_categories";
    const PREFIX: &'static str = "part_category";
    const FIELDS: &'static [&'static str] = &["id", "name"];

    fn key(&self) -> String {
        self.id.to_string()
    }

    fn cells(&self) -> Vec<Value> {
        vec![Value::Int(self.id), Value::text(&self.name)]
    }
}

impl CatalogEntity for Part {
    const COLLECTION: &'static str = "parts";
    const PREFIX: &'static str = "part";
    const FIELDS: &'static [&'static str] = &[
        "num",
        "name",
        "cat_id",
        "url",
        "img_url",
        "local_img_url",
        "box_num",
    ];

    fn key(&self) -> String {
        self.num.clone()
    }

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::text(&self.num),
            Value::text(&self.name),
            Value::Int(self.cat_id),
            Value::text(&self.url),
            self.img_url.clone().into(),
            Value::text(&self.local_img_url),
            self.box_num.clone().into(),
        ]
    }
}

/// The same element id shows up once per owned set that contains it, so the
/// stored quantity is the running total. Everything but the quantity is kept
/// from the first write.
impl CatalogEntity for Element {
    const COLLECTION: &'static str = "elements";
    const PREFIX: &'static str = "element";
    const FIELDS: &'static [&'static str] = &[
        "id",
        "design_id",
        "part_num",
        "colour_id",
        "img_url",
        "local_img_url",
        "quantity",
    ];
    const NUMERIC_FIELDS: &'static [&'static str] = &["quantity"];

    fn key(&self) -> String {
        self.id.clone()
    }

    fn merge(mut stored: Self, incoming: Self) -> Self {
        stored.quantity += incoming.quantity;
        stored
    }

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::text(&self.id),
            Value::Int(self.design_id),
            Value::text(&self.part_num),
            Value::Int(self.colour_id),
            self.img_url.clone().into(),
            Value::text(&self.local_img_url),
            Value::Int(self.quantity),
        ]
    }
}

/// Exported one row per (set, element) pair; a set without elements
/// contributes no rows.
impl CatalogEntity for Set {
    const COLLECTION: &'static str = "sets";
    const PREFIX: &'static str = "set";
    const FIELDS: &'static [&'static str] = &[
        "num",
        "name",
        "year",
        "theme_id",
        "num_parts",
        "img_url",
        "local_img_url",
        "url",
        "quantity",
        "element_id",
        "element_quantity",
    ];
    const NUMERIC_FIELDS: &'static [&'static str] =
        &["quantity", "element_quantity", "num_parts"];

    fn key(&self) -> String {
        self.num.clone()
    }

    fn cells(&self) -> Vec<Value> {
        vec![
            Value::text(&self.num),
            Value::text(&self.name),
            Value::Int(self.year),
            Value::Int(self.theme_id),
            Value::Int(self.num_parts),
            self.img_url.clone().into(),
            Value::text(&self.local_img_url),
            Value::text(&self.url),
            Value::Int(self.quantity),
            Value::Null,
            Value::Null,
        ]
    }

    fn export_rows(&self) -> Vec<Vec<Value>> {
        let cells = self.cells();
        let scalar = &cells[..Self::FIELDS.len() - 2];
        self.elements
            .iter()
            .map(|(element_id, qty)| {
                let mut row = scalar.to_vec();
                row.push(Value::text(element_id));
                row.push(Value::Int(*qty));
                row
            })
            .collect()
    }
}

impl CatalogEntity for BoxLabel {
    const COLLECTION: &'static str = "boxes";
    const PREFIX: &'static str = "box";
    const FIELDS: &'static [&'static str] = &["num"];

    fn key(&self) -> String {
        self.num.clone()
    }

    fn cells(&self) -> Vec<Value> {
        vec![Value::text(&self.num)]
    }
}
