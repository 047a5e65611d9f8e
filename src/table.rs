//! In-memory tables used to join and aggregate exported collections.
//!
//! A `Table` is a list of named columns and rows of `Value` cells. Joins are
//! hash joins on one key column per side; grouping maps each key tuple to an
//! accumulator row. Output of `group_sum` is ordered by group key, so
//! repeated runs over the same input produce identical tables.

use crate::error::TableError;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// One table cell.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(untagged)]
pub enum Value {
    Null,
    Int(i64),
    Text(String),
}

impl Value {
    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Fold `next` into an aggregate cell: integers add, anything else keeps
    /// the first non-null value.
    fn absorb(&mut self, next: &Value) {
        match self {
            Value::Int(acc) => {
                if let Value::Int(v) = next {
                    *acc += *v;
                }
            }
            Value::Null => *self = next.clone(),
            Value::Text(_) => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Int(v) => write!(f, "{v}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Value>>,
}

impl Table {
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), TableError> {
        if row.len() != self.columns.len() {
            return Err(TableError::RowWidth {
                expected: self.columns.len(),
                found: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Result<usize, TableError> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| TableError::UnknownColumn(name.to_string()))
    }

    /// Cell at `row` in column `name`, if both exist.
    pub fn get(&self, row: usize, name: &str) -> Option<&Value> {
        let idx = self.column_index(name).ok()?;
        self.rows.get(row).map(|cells| &cells[idx])
    }

    /// All cells of one column, in row order.
    pub fn column(&self, name: &str) -> Result<Vec<&Value>, TableError> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Left outer join on `self.left_col == right.right_col`.
    ///
    /// Every left row is kept. A left row matching several right rows is
    /// repeated once per match; a row without a match (or with a null key) is
    /// padded with nulls for every right column.
    pub fn left_join(
        &self,
        right: &Table,
        left_col: &str,
        right_col: &str,
    ) -> Result<Table, TableError> {
        let left_idx = self.column_index(left_col)?;
        let right_idx = right.column_index(right_col)?;

        let mut build: HashMap<&Value, Vec<usize>> = HashMap::new();
        for (pos, row) in right.rows.iter().enumerate() {
            let key = &row[right_idx];
            if !key.is_null() {
                build.entry(key).or_default().push(pos);
            }
        }

        let mut columns = self.columns.clone();
        columns.extend(right.columns.iter().cloned());
        let mut out = Table {
            columns,
            rows: Vec::with_capacity(self.rows.len()),
        };

        let padding = vec![Value::Null; right.columns.len()];
        for row in &self.rows {
            match build.get(&row[left_idx]) {
                Some(matches) => {
                    for &pos in matches {
                        let mut joined = row.clone();
                        joined.extend(right.rows[pos].iter().cloned());
                        out.rows.push(joined);
                    }
                }
                None => {
                    let mut joined = row.clone();
                    joined.extend(padding.iter().cloned());
                    out.rows.push(joined);
                }
            }
        }
        Ok(out)
    }

    pub fn drop_columns(&self, names: &[&str]) -> Result<Table, TableError> {
        let mut drop = Vec::with_capacity(names.len());
        for name in names {
            drop.push(self.column_index(name)?);
        }
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|idx| !drop.contains(idx))
            .collect();
        Ok(self.project(&keep))
    }

    /// Rows whose `column` equals `value`.
    pub fn filter_eq(&self, column: &str, value: &Value) -> Result<Table, TableError> {
        let idx = self.column_index(column)?;
        Ok(Table {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .filter(|row| &row[idx] == value)
                .cloned()
                .collect(),
        })
    }

    /// Collapse rows sharing the same `keys` tuple into one row.
    ///
    /// Output columns are the keys followed by the remaining columns in their
    /// original order. Integer cells outside the key are summed; other cells
    /// keep the first non-null value of the group. Null key cells form their
    /// own group rather than dropping the row.
    pub fn group_sum(&self, keys: &[&str]) -> Result<Table, TableError> {
        let mut key_idx = Vec::with_capacity(keys.len());
        for key in keys {
            key_idx.push(self.column_index(key)?);
        }
        let rest: Vec<usize> = (0..self.columns.len())
            .filter(|idx| !key_idx.contains(idx))
            .collect();

        let mut groups: BTreeMap<Vec<Value>, Vec<Value>> = BTreeMap::new();
        for row in &self.rows {
            let key: Vec<Value> = key_idx.iter().map(|&i| row[i].clone()).collect();
            match groups.get_mut(&key) {
                Some(acc) => {
                    for (slot, &i) in acc.iter_mut().zip(&rest) {
                        slot.absorb(&row[i]);
                    }
                }
                None => {
                    groups.insert(key, rest.iter().map(|&i| row[i].clone()).collect());
                }
            }
        }

        let columns = key_idx
            .iter()
            .chain(&rest)
            .map(|&i| self.columns[i].clone())
            .collect();
        let rows = groups
            .into_iter()
            .map(|(mut key, acc)| {
                key.extend(acc);
                key
            })
            .collect();
        Ok(Table { columns, rows })
    }

    /// Rows as JSON objects keyed by column name.
    pub fn to_json_rows(&self) -> Vec<serde_json::Map<String, serde_json::Value>> {
        self.rows
            .iter()
            .map(|row| {
                self.columns
                    .iter()
                    .zip(row)
                    .map(|(name, cell)| {
                        let json = match cell {
                            Value::Null => serde_json::Value::Null,
                            Value::Int(v) => serde_json::Value::from(*v),
                            Value::Text(s) => serde_json::Value::from(s.as_str()),
                        };
                        (name.clone(), json)
                    })
                    .collect()
            })
            .collect()
    }

    fn project(&self, keep: &[usize]) -> Table {
        Table {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }
}
