use camino::{Utf8Path, Utf8PathBuf};
use rust_xlsxwriter::{Format, Workbook};
use serde::Serialize;

use crate::error::MirError;
use crate::table::{RecordTable, Value};

/// Extra characters added to the widest cell of a column.
const WIDTH_PADDING: usize = 2;

const MAX_SHEET_NAME: usize = 31;
const FORBIDDEN_SHEET_CHARS: [char; 7] = ['[', ']', ':', '*', '?', '/', '\\'];

/// Rejects names Excel would refuse for a worksheet.
pub fn check_sheet_name(name: &str) -> Result<(), MirError> {
    let invalid = |reason: &str| -> Result<(), MirError> {
        Err(MirError::InvalidConfig(format!("sheet name {name:?} {reason}")))
    };
    if name.trim().is_empty() {
        return invalid("is empty");
    }
    if name.chars().count() > MAX_SHEET_NAME {
        return invalid("is longer than 31 characters");
    }
    if name.contains(FORBIDDEN_SHEET_CHARS) {
        return invalid("contains one of [ ] : * ? / \\");
    }
    if name.starts_with('\'') || name.ends_with('\'') {
        return invalid("starts or ends with an apostrophe");
    }
    if name.eq_ignore_ascii_case("history") {
        return invalid("is reserved");
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Sheet {
    /// Keeps the `columns` the table actually has, in the given order.
    pub fn project(name: &str, table: &RecordTable, columns: &[String]) -> Self {
        let columns: Vec<String> = columns
            .iter()
            .filter(|column| table.has_column(column))
            .cloned()
            .collect();
        let rows = table
            .records()
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| record.get(column).cloned().unwrap_or(Value::Empty))
                    .collect()
            })
            .collect();
        Self {
            name: name.to_string(),
            columns,
            rows,
        }
    }

    /// Width per column: longest of header and cell text plus padding, capped.
    pub fn column_widths(&self, max_width: usize) -> Vec<usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(index, column)| {
                let longest_cell = self
                    .rows
                    .iter()
                    .filter_map(|row| row.get(index))
                    .map(|value| value.to_string().chars().count())
                    .max()
                    .unwrap_or(0);
                (column.chars().count().max(longest_cell) + WIDTH_PADDING).min(max_width)
            })
            .collect()
    }
}

pub trait SheetSink {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), MirError>;
}

impl SheetSink for Vec<Sheet> {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), MirError> {
        self.push(sheet.clone());
        Ok(())
    }
}

/// `.xlsx` output; nothing is on disk until [`XlsxWorkbook::save`].
pub struct XlsxWorkbook {
    workbook: Workbook,
    path: Utf8PathBuf,
    max_column_width: usize,
}

impl XlsxWorkbook {
    pub fn new(path: &Utf8Path, max_column_width: usize) -> Self {
        Self {
            workbook: Workbook::new(),
            path: path.to_path_buf(),
            max_column_width,
        }
    }

    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    pub fn save(mut self) -> Result<Utf8PathBuf, MirError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_str().is_empty() {
                std::fs::create_dir_all(parent.as_std_path())
                    .map_err(|err| MirError::Filesystem(err.to_string()))?;
            }
        }
        self.workbook.save(self.path.as_std_path())?;
        Ok(self.path)
    }
}

impl SheetSink for XlsxWorkbook {
    fn write_sheet(&mut self, sheet: &Sheet) -> Result<(), MirError> {
        let header = Format::new().set_bold();
        let worksheet = self.workbook.add_worksheet();
        worksheet.set_name(&sheet.name)?;

        for (col, name) in sheet.columns.iter().enumerate() {
            worksheet.write_string_with_format(0, col_index(col)?, name, &header)?;
        }
        for (row_index, row) in sheet.rows.iter().enumerate() {
            let row_number = u32::try_from(row_index + 1)
                .map_err(|_| MirError::Workbook("too many rows for one sheet".to_string()))?;
            for (col, value) in row.iter().enumerate() {
                let col = col_index(col)?;
                match value {
                    Value::Empty => {}
                    Value::Integer(number) => {
                        worksheet.write_number(row_number, col, *number as f64)?;
                    }
                    Value::Text(text) => {
                        worksheet.write_string(row_number, col, text)?;
                    }
                }
            }
        }
        for (col, width) in sheet
            .column_widths(self.max_column_width)
            .into_iter()
            .enumerate()
        {
            worksheet.set_column_width(col_index(col)?, width as f64)?;
        }
        Ok(())
    }
}

fn col_index(index: usize) -> Result<u16, MirError> {
    u16::try_from(index)
        .map_err(|_| MirError::Workbook("too many columns for one sheet".to_string()))
}
