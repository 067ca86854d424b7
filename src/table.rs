use std::collections::HashSet;
use std::fmt;

use camino::Utf8Path;
use csv::ReaderBuilder;
use indexmap::IndexMap;
use serde::Serialize;

use crate::domain::ID_COLUMN;
use crate::error::MirError;

/// One spreadsheet cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Empty,
    Integer(i64),
    Text(String),
}

impl Value {
    pub fn from_cell(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Value::Empty;
        }
        match trimmed.parse::<i64>() {
            Ok(number) => Value::Integer(number),
            Err(_) => Value::Text(raw.to_string()),
        }
    }

    pub fn text(value: impl Into<String>) -> Self {
        Value::Text(value.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Value::Empty)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Empty => Ok(()),
            Value::Integer(number) => write!(f, "{number}"),
            Value::Text(text) => f.write_str(text),
        }
    }
}

/// A table row keyed by column name, in column order.
pub type Record = IndexMap<String, Value>;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordTable {
    columns: Vec<String>,
    records: Vec<Record>,
}

impl RecordTable {
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [Record] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|column| column == name)
    }

    /// Sets `name` on every record from `values`, appending the column if new.
    pub fn set_column(&mut self, name: &str, values: Vec<Value>) {
        if !self.has_column(name) {
            self.columns.push(name.to_string());
        }
        for (record, value) in self.records.iter_mut().zip(values) {
            record.insert(name.to_string(), value);
        }
    }

    /// Builds a table from raw CSV rows. The header is looked for on the
    /// second row first, then on the first; the first column whose name
    /// contains `id_label` is renamed to `MirGeneDB ID`.
    pub fn from_rows(rows: &[Vec<String>], id_label: &str) -> Option<Self> {
        [1usize, 0]
            .into_iter()
            .find_map(|header_row| Self::with_header_row(rows, header_row, id_label))
    }

    fn with_header_row(rows: &[Vec<String>], header_row: usize, id_label: &str) -> Option<Self> {
        let header = rows.get(header_row)?;
        let mut columns = unique_column_names(header);
        let id_index = columns.iter().position(|name| name.contains(id_label))?;
        columns[id_index] = ID_COLUMN.to_string();
        let columns = dedupe(columns);

        let records = rows[header_row + 1..]
            .iter()
            .map(|row| {
                columns
                    .iter()
                    .enumerate()
                    .map(|(index, name)| {
                        let value = row
                            .get(index)
                            .map(|cell| Value::from_cell(cell))
                            .unwrap_or(Value::Empty);
                        (name.clone(), value)
                    })
                    .collect::<Record>()
            })
            .collect();

        Some(Self { columns, records })
    }

    pub fn load(path: &Utf8Path, id_label: &str) -> Result<Self, MirError> {
        if !path.as_std_path().exists() {
            return Err(MirError::MissingTable(path.to_string()));
        }
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .from_path(path.as_std_path())
            .map_err(|err| MirError::TableParse {
                path: path.to_string(),
                message: err.to_string(),
            })?;

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result.map_err(|err| MirError::TableParse {
                path: path.to_string(),
                message: err.to_string(),
            })?;
            rows.push(record.iter().map(str::to_string).collect::<Vec<_>>());
        }

        Self::from_rows(&rows, id_label).ok_or_else(|| MirError::MissingIdColumn {
            label: id_label.to_string(),
            path: path.to_string(),
        })
    }
}

/// Trims the identifier and drops one trailing `" V"` marker.
pub fn clean_identifier(raw: &str) -> String {
    let trimmed = raw.trim();
    trimmed.strip_suffix(" V").unwrap_or(trimmed).to_string()
}

fn unique_column_names(header: &[String]) -> Vec<String> {
    let named = header
        .iter()
        .enumerate()
        .map(|(index, name)| {
            let name = name.trim();
            if name.is_empty() {
                format!("Unnamed: {index}")
            } else {
                name.to_string()
            }
        })
        .collect();
    dedupe(named)
}

fn dedupe(names: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    names
        .into_iter()
        .map(|name| {
            if seen.insert(name.clone()) {
                return name;
            }
            let mut suffix = 1;
            loop {
                let candidate = format!("{name}.{suffix}");
                if seen.insert(candidate.clone()) {
                    return candidate;
                }
                suffix += 1;
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_on_second_row_wins() {
        let rows = rows(&[
            &["Browse", "Browse", "Browse"],
            &["MirGeneDB ID (click)", "Family", "Seed"],
            &["Hsa-Let-7-P1", "LET-7", "GAGGUAG"],
        ]);
        let table = RecordTable::from_rows(&rows, "MirGeneDB ID").unwrap();
        assert_eq!(table.columns(), &["MirGeneDB ID", "Family", "Seed"]);
        assert_eq!(table.len(), 1);
        assert_eq!(
            table.records()[0]["MirGeneDB ID"],
            Value::text("Hsa-Let-7-P1")
        );
    }

    #[test]
    fn falls_back_to_first_row() {
        let rows = rows(&[
            &["MirGeneDB ID", "Start"],
            &["Cel-Mir-1", "1200"],
            &["Cel-Mir-2", ""],
        ]);
        let table = RecordTable::from_rows(&rows, "MirGeneDB ID").unwrap();
        assert_eq!(table.len(), 2);
        assert_eq!(table.records()[0]["Start"], Value::Integer(1200));
        assert_eq!(table.records()[1]["Start"], Value::Empty);
    }

    #[test]
    fn missing_id_column() {
        let rows = rows(&[&["a", "b"], &["c", "d"]]);
        assert!(RecordTable::from_rows(&rows, "MirGeneDB ID").is_none());
    }

    #[test]
    fn duplicate_and_blank_headers() {
        let rows = rows(&[&["MirGeneDB ID", "Seed", "Seed", ""], &["x", "A", "B", "C"]]);
        let table = RecordTable::from_rows(&rows, "MirGeneDB ID").unwrap();
        assert_eq!(
            table.columns(),
            &["MirGeneDB ID", "Seed", "Seed.1", "Unnamed: 3"]
        );
    }

    #[test]
    fn identifier_suffix_stripped_once() {
        assert_eq!(clean_identifier("  mir1 V "), "mir1");
        assert_eq!(clean_identifier("mir1 V V"), "mir1 V");
        assert_eq!(clean_identifier("mir1 VV"), "mir1 VV");
        assert_eq!(clean_identifier("mir1"), "mir1");
    }
}
