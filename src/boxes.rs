//! Box resolution: attach a storage box to every stored part.
//!
//! The assignment list is a comma-delimited `part,box` file kept by hand.
//! It is parsed completely before the catalog is touched, so a malformed row
//! aborts the pass with nothing applied.

use crate::entity::BoxLabel;
use crate::error::BoxError;
use crate::store::Catalog;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::{debug, info, warn};

/// Label given to parts that no assignment row places in a box.
pub const DEFAULT_UNASSIGNED: &str = "??";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxAssignment {
    pub part_num: String,
    pub box_num: String,
}

/// How box codes in the assignment list are interpreted.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoxPolicy {
    /// Marker for parts without a box. Must not appear as a real label.
    pub unassigned: String,
    /// Codes meaning "not in any box"; rows using them are ignored. Empty
    /// means every code is a literal box label.
    pub excluded: BTreeSet<String>,
}

impl Default for BoxPolicy {
    fn default() -> Self {
        Self {
            unassigned: DEFAULT_UNASSIGNED.to_string(),
            excluded: BTreeSet::new(),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct ResolveSummary {
    pub boxes_created: usize,
    pub parts_assigned: usize,
    pub parts_unassigned: usize,
    pub rows_excluded: usize,
    /// Part numbers listed in the file but absent from the catalog.
    pub unknown_parts: Vec<String>,
}

/// Parse `part,box` rows. Blank lines are skipped and fields are trimmed;
/// any other shape is an error.
pub fn parse_assignments<R: BufRead>(reader: R) -> Result<Vec<BoxAssignment>, BoxError> {
    let mut rows = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line.map_err(|source| BoxError::Read {
            path: "<reader>".into(),
            source,
        })?;
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').map(str::trim).collect();
        if fields.len() != 2 {
            return Err(BoxError::Malformed {
                line: idx + 1,
                columns: fields.len(),
            });
        }
        rows.push(BoxAssignment {
            part_num: fields[0].to_string(),
            box_num: fields[1].to_string(),
        });
    }
    Ok(rows)
}

/// Apply `assignments` to the catalog's parts and boxes.
pub fn resolve(
    catalog: &mut Catalog,
    assignments: &[BoxAssignment],
    policy: &BoxPolicy,
) -> Result<ResolveSummary, BoxError> {
    let mut summary = ResolveSummary::default();

    // Later rows win for a repeated part.
    let mut wanted: BTreeMap<&str, &str> = BTreeMap::new();
    let mut labels: BTreeSet<&str> = BTreeSet::new();
    for (idx, row) in assignments.iter().enumerate() {
        if row.box_num == policy.unassigned {
            return Err(BoxError::ReservedLabel {
                row: idx + 1,
                label: row.box_num.clone(),
            });
        }
        if policy.excluded.contains(&row.box_num) {
            summary.rows_excluded += 1;
            continue;
        }
        labels.insert(&row.box_num);
        wanted.insert(&row.part_num, &row.box_num);
    }

    for label in labels {
        if !catalog.boxes.contains(label) {
            catalog.boxes.put(BoxLabel::new(label))?;
            summary.boxes_created += 1;
        }
    }

    for (part_num, box_num) in &wanted {
        if !catalog.parts.contains(part_num) {
            debug!(part = *part_num, "assignment for unknown part");
            summary.unknown_parts.push((*part_num).to_string());
            continue;
        }
        catalog
            .parts
            .update(part_num, |part| part.box_num = Some((*box_num).to_string()))?;
        summary.parts_assigned += 1;
    }

    for part_num in catalog.parts.keys() {
        if catalog.parts.get(&part_num)?.box_num.is_some() {
            continue;
        }
        catalog
            .parts
            .update(&part_num, |part| part.box_num = Some(policy.unassigned.clone()))?;
        summary.parts_unassigned += 1;
    }

    if summary.parts_unassigned > 0 && !catalog.boxes.contains(&policy.unassigned) {
        catalog.boxes.put(BoxLabel::new(policy.unassigned.clone()))?;
        summary.boxes_created += 1;
    }

    if !summary.unknown_parts.is_empty() {
        warn!(
            count = summary.unknown_parts.len(),
            "box assignments reference parts missing from the catalog"
        );
    }
    info!(
        boxes_created = summary.boxes_created,
        parts_assigned = summary.parts_assigned,
        parts_unassigned = summary.parts_unassigned,
        "resolved part boxes"
    );
    Ok(summary)
}

/// Read the assignment file at `path` and apply it.
pub fn resolve_file(
    catalog: &mut Catalog,
    path: &Path,
    policy: &BoxPolicy,
) -> Result<ResolveSummary, BoxError> {
    let file = File::open(path).map_err(|source| BoxError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let assignments = parse_assignments(BufReader::new(file)).map_err(|err| match err {
        BoxError::Read { source, .. } => BoxError::Read {
            path: path.to_path_buf(),
            source,
        },
        other => other,
    })?;
    resolve(catalog, &assignments, policy)
}
