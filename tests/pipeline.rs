mod support;

use anyhow::Result;
use brickshelf::pipeline::{self, BOX_DETAIL_KEYS, BOX_INDEX_KEYS, SET_INDEX_KEYS};
use brickshelf::{BoxPolicy, Value, parse_assignments, resolve};
use serde_json::json;
use support::{TempCatalog, element, seed_small_collection};

fn boxed_collection() -> Result<TempCatalog> {
    let mut fixture = TempCatalog::new()?;
    seed_small_collection(&mut fixture.catalog)?;
    let rows = parse_assignments("3001,B7\n".as_bytes())?;
    resolve(&mut fixture.catalog, &rows, &BoxPolicy::default())?;
    Ok(fixture)
}

#[test]
fn element_with_unknown_colour_keeps_its_row() -> Result<()> {
    let mut fixture = boxed_collection()?;
    fixture.catalog.elements.put(element("300", "3001", 99, 1))?;

    let table = pipeline::box_table(&fixture.catalog)?;
    assert_eq!(table.len(), 4);
    let orphan = table.filter_eq("element_id", &Value::text("300"))?;
    assert_eq!(orphan.len(), 1);
    assert_eq!(orphan.get(0, "colour_id"), Some(&Value::Null));
    assert_eq!(orphan.get(0, "colour_name"), Some(&Value::Null));
    assert_eq!(orphan.get(0, "part_name"), Some(&Value::text("Brick 2 x 4")));
    assert_eq!(orphan.get(0, "part_category_name"), Some(&Value::text("Bricks")));
    Ok(())
}

#[test]
fn element_with_unknown_part_has_null_part_columns() -> Result<()> {
    let mut fixture = boxed_collection()?;
    fixture.catalog.elements.put(element("400", "99999", 4, 1))?;

    let table = pipeline::box_table(&fixture.catalog)?;
    let orphan = table.filter_eq("element_id", &Value::text("400"))?;
    assert_eq!(orphan.len(), 1);
    assert_eq!(orphan.get(0, "part_box_num"), Some(&Value::Null));
    assert_eq!(orphan.get(0, "part_category_name"), Some(&Value::Null));
    assert_eq!(orphan.get(0, "colour_name"), Some(&Value::text("Red")));
    Ok(())
}

#[test]
fn box_index_sums_every_colour_of_a_part() -> Result<()> {
    let fixture = boxed_collection()?;
    let index = pipeline::box_index(&fixture.catalog)?;

    assert_eq!(&index.columns()[..BOX_INDEX_KEYS.len()], BOX_INDEX_KEYS);
    let rows: Vec<_> = index
        .to_json_rows()
        .into_iter()
        .map(|row| {
            json!({
                "part_name": row["part_name"],
                "part_box_num": row["part_box_num"],
                "element_quantity": row["element_quantity"],
            })
        })
        .collect();
    assert_eq!(
        rows,
        vec![
            json!({"part_name": "Brick 2 x 4", "part_box_num": "B7", "element_quantity": 5}),
            json!({"part_name": "Plate 2 x 4", "part_box_num": "??", "element_quantity": 5}),
        ]
    );
    Ok(())
}

#[test]
fn box_detail_lists_colours_of_one_box() -> Result<()> {
    let fixture = boxed_collection()?;
    let detail = pipeline::box_detail(&fixture.catalog, "B7")?;

    assert_eq!(&detail.columns()[..BOX_DETAIL_KEYS.len()], BOX_DETAIL_KEYS);
    assert_eq!(detail.len(), 2);
    assert_eq!(detail.get(0, "colour_name"), Some(&Value::text("Blue")));
    assert_eq!(detail.get(0, "element_quantity"), Some(&Value::Int(3)));
    assert_eq!(detail.get(1, "colour_name"), Some(&Value::text("Red")));
    assert_eq!(detail.get(1, "element_quantity"), Some(&Value::Int(2)));

    assert!(pipeline::box_detail(&fixture.catalog, "Z9")?.is_empty());
    Ok(())
}

#[test]
fn box_detail_is_stable_across_runs() -> Result<()> {
    let fixture = boxed_collection()?;
    let first = pipeline::box_detail(&fixture.catalog, "??")?;
    let second = pipeline::box_detail(&fixture.catalog, "??")?;
    assert_eq!(first, second);
    assert_eq!(first.len(), 1);

    let fixture = fixture.reopen()?;
    assert_eq!(pipeline::box_detail(&fixture.catalog, "??")?, first);
    Ok(())
}

#[test]
fn set_table_drops_join_columns() -> Result<()> {
    let fixture = boxed_collection()?;
    let table = pipeline::set_table(&fixture.catalog)?;
    assert_eq!(table.len(), 2);
    for dropped in ["set_element_id", "element_part_num", "set_theme_id"] {
        assert!(table.column_index(dropped).is_err(), "{dropped} still present");
    }
    assert_eq!(table.get(0, "theme_name"), Some(&Value::text("Star Wars")));
    assert_eq!(table.get(0, "part_box_num"), Some(&Value::text("B7")));
    Ok(())
}

#[test]
fn set_index_has_one_row_per_set() -> Result<()> {
    let fixture = boxed_collection()?;
    let index = pipeline::set_index(&fixture.catalog)?;
    assert_eq!(&index.columns()[..SET_INDEX_KEYS.len()], SET_INDEX_KEYS);
    assert_eq!(index.len(), 1);
    assert_eq!(index.get(0, "set_num"), Some(&Value::text("75159-1")));
    assert_eq!(index.get(0, "set_num_parts"), Some(&Value::Int(3)));
    assert_eq!(index.get(0, "set_quantity"), Some(&Value::Int(1)));
    assert_eq!(
        index.get(0, "set_local_img_url"),
        Some(&Value::text("img/sets/75159-1.jpg"))
    );
    Ok(())
}

#[test]
fn set_detail_selects_one_set() -> Result<()> {
    let mut fixture = boxed_collection()?;
    fixture.catalog.sets.put(support::set("6020-1", "Magic Shop", 158, &[("101", 4)]))?;

    let detail = pipeline::set_detail(&fixture.catalog, "75159-1")?;
    assert_eq!(detail.len(), 2);
    // Grouped by box first: "??" sorts before "B7".
    let parts: Vec<_> = (0..detail.len())
        .filter_map(|row| detail.get(row, "part_name").cloned())
        .collect();
    assert_eq!(
        parts,
        vec![Value::text("Plate 2 x 4"), Value::text("Brick 2 x 4")]
    );

    let other = pipeline::set_detail(&fixture.catalog, "6020-1")?;
    assert_eq!(other.len(), 1);
    assert_eq!(other.get(0, "colour_name"), Some(&Value::text("Blue")));
    assert!(pipeline::set_detail(&fixture.catalog, "0000-1")?.is_empty());
    Ok(())
}

#[test]
fn owned_copies_are_not_multiplied_by_element_count() -> Result<()> {
    let mut fixture = boxed_collection()?;
    let mut owned = support::set("6020-1", "Magic Shop", 158, &[("100", 1), ("101", 2), ("200", 4)]);
    owned.quantity = 3;
    fixture.catalog.sets.put(owned)?;

    let index = pipeline::set_index(&fixture.catalog)?;
    let row = index.filter_eq("set_num", &Value::text("6020-1"))?;
    assert_eq!(row.len(), 1);
    assert_eq!(row.get(0, "set_quantity"), Some(&Value::Int(3)));

    let detail = pipeline::set_detail(&fixture.catalog, "6020-1")?;
    assert_eq!(detail.len(), 3);
    for idx in 0..detail.len() {
        assert_eq!(detail.get(idx, "set_quantity"), Some(&Value::Int(3)));
    }
    Ok(())
}
