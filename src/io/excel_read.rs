use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use calamine::{DataType, Range, Reader, Xlsx, open_workbook};
use tracing::debug;

use crate::error::{Result, ToolError};
use crate::model::{CityMetadata, LineItem};
use crate::tables::{LabelTables, MetadataField};

/// An opened survey export. Both extractors read from the same handle.
pub struct SurveyWorkbook {
    path: PathBuf,
    workbook: Xlsx<BufReader<File>>,
}

impl SurveyWorkbook {
    /// Opens the workbook at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        let workbook: Xlsx<_> = open_workbook(path).map_err(|source| ToolError::ExcelRead {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            workbook,
        })
    }

    /// Reads the three line-item columns from the line-item sheet.
    ///
    /// Columns are located by header text in the first row. Empty amounts
    /// become `0`; no rows are dropped.
    pub fn select_fields(&mut self, tables: &LabelTables) -> Result<Vec<LineItem>> {
        let sheet = tables.line_item_sheet.as_str();
        let range = self.read_required_sheet(sheet)?;
        let mut rows = range.rows();

        let headers: Vec<String> = rows
            .next()
            .map(|row| row.iter().map(|cell| cell_to_string(Some(cell))).collect())
            .unwrap_or_default();
        let sub_sector_col = self.find_column(&headers, sheet, &tables.columns.sub_sector)?;
        let fuel_type_col = self.find_column(&headers, sheet, &tables.columns.fuel_type)?;
        let amount_col = self.find_column(&headers, sheet, &tables.columns.amount)?;

        let first_row = range.start().map(|(row, _)| row).unwrap_or(0) as usize;
        let mut items = Vec::with_capacity(range.height().saturating_sub(1));
        for (offset, row) in rows.enumerate() {
            let amount = cell_to_amount(row.get(amount_col)).map_err(|value| {
                ToolError::input_format(
                    &self.path,
                    format!(
                        "sheet '{sheet}' row {}: amount '{value}' is not numeric",
                        first_row + offset + 2
                    ),
                )
            })?;
            items.push(LineItem {
                sub_sector: cell_to_string(row.get(sub_sector_col)),
                fuel_type: cell_to_string(row.get(fuel_type_col)),
                amount,
            });
        }

        debug!(
            path = %self.path.display(),
            line_items = items.len(),
            "selected line items"
        );
        Ok(items)
    }

    /// Reads city name, id, and reporting year from fixed cells of the
    /// metadata sheet, validating labels where the layout names them.
    pub fn extract_metadata(&mut self, tables: &LabelTables) -> Result<CityMetadata> {
        let sheet = tables.metadata_sheet.as_str();
        let range = self.read_required_sheet(sheet)?;
        let layout = &tables.metadata;

        let city = self.required_cell(&range, sheet, "city", &layout.city)?;
        let city_id = self.required_cell(&range, sheet, "city_id", &layout.city_id)?;
        let year_cell = self.required_cell(&range, sheet, "year", &layout.year)?;
        let year = cell_to_year(year_cell).ok_or_else(|| {
            ToolError::input_format(
                &self.path,
                format!(
                    "sheet '{sheet}' cell {}: year '{}' is not an integer",
                    layout.year.cell_ref(),
                    cell_to_string(Some(year_cell))
                ),
            )
        })?;

        Ok(CityMetadata {
            city: cell_to_string(Some(city)),
            city_id: cell_to_string(Some(city_id)),
            year,
        })
    }

    fn read_required_sheet(&mut self, name: &str) -> Result<Range<DataType>> {
        let range_result = self
            .workbook
            .worksheet_range(name)
            .ok_or_else(|| ToolError::input_format(&self.path, format!("missing sheet '{name}'")))?;
        range_result.map_err(|source| ToolError::ExcelRead {
            path: self.path.clone(),
            source,
        })
    }

    fn find_column(&self, headers: &[String], sheet: &str, name: &str) -> Result<usize> {
        headers
            .iter()
            .position(|header| header == name)
            .ok_or_else(|| {
                ToolError::input_format(
                    &self.path,
                    format!("sheet '{sheet}' has no column '{name}'"),
                )
            })
    }

    fn required_cell<'a>(
        &self,
        range: &'a Range<DataType>,
        sheet: &str,
        key: &str,
        field: &MetadataField,
    ) -> Result<&'a DataType> {
        if let Some(expected) = &field.label {
            let found = field
                .column
                .checked_sub(1)
                .map(|column| cell_to_string(range.get_value((field.row, column))))
                .unwrap_or_default();
            if !found.eq_ignore_ascii_case(expected.trim()) {
                return Err(ToolError::input_format(
                    &self.path,
                    format!(
                        "sheet '{sheet}' cell {}: expected label '{expected}' beside {key}, found '{found}'",
                        field.cell_ref()
                    ),
                ));
            }
        }

        match range.get_value((field.row, field.column)) {
            Some(cell) if !cell_to_string(Some(cell)).is_empty() => Ok(cell),
            _ => Err(ToolError::input_format(
                &self.path,
                format!("sheet '{sheet}' cell {}: {key} is empty", field.cell_ref()),
            )),
        }
    }
}

fn cell_to_string(cell: Option<&DataType>) -> String {
    match cell {
        Some(DataType::String(value)) => value.trim().to_string(),
        Some(DataType::Float(value)) => value.to_string(),
        Some(DataType::Int(value)) => value.to_string(),
        Some(DataType::Bool(value)) => value.to_string(),
        Some(DataType::Empty) | None => String::new(),
        Some(other) => other.to_string(),
    }
}

/// Text that spreadsheet exports use for a missing value.
const MISSING_MARKERS: [&str; 19] = [
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null", "",
];

/// Blank cells, error cells, and missing-value markers count as `0`. The
/// error carries the offending text.
fn cell_to_amount(cell: Option<&DataType>) -> std::result::Result<f64, String> {
    match cell {
        Some(DataType::Float(value)) if value.is_finite() => Ok(*value),
        Some(DataType::Int(value)) => Ok(*value as f64),
        Some(DataType::Empty) | Some(DataType::Error(_)) | None => Ok(0.0),
        Some(DataType::String(value)) => {
            let value = value.trim();
            if MISSING_MARKERS.contains(&value) {
                return Ok(0.0);
            }
            match value.parse::<f64>() {
                Ok(amount) if amount.is_finite() => Ok(amount),
                _ => Err(value.to_string()),
            }
        }
        Some(other) => Err(other.to_string()),
    }
}

fn cell_to_year(cell: &DataType) -> Option<i64> {
    let integral = |value: f64| (value.fract() == 0.0).then_some(value as i64);
    match cell {
        DataType::Int(value) => Some(*value),
        DataType::Float(value) => integral(*value),
        DataType::String(value) => {
            let value = value.trim();
            value
                .parse::<i64>()
                .ok()
                .or_else(|| value.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    }
}
