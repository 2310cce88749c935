use std::path::Path;

use rust_xlsxwriter::Workbook;

use crate::error::Result;
use crate::model::{FieldValue, OutputTable};

/// Writes the table to a single worksheet named `sheet_name`.
pub fn write_table(path: &Path, table: &OutputTable, sheet_name: &str) -> Result<()> {
    let mut workbook = Workbook::new();
    let worksheet = workbook.add_worksheet();
    worksheet.set_name(sanitize_sheet_name(sheet_name))?;

    for (col_idx, header) in table.columns.iter().enumerate() {
        worksheet.write_string(0, col_idx as u16, header)?;
    }

    for (row_idx, record) in table.rows.iter().enumerate() {
        let row = (row_idx + 1) as u32;
        for (col_idx, value) in record.values.iter().enumerate() {
            let col = col_idx as u16;
            match value {
                FieldValue::Text(text) => worksheet.write_string(row, col, text)?,
                FieldValue::Integer(number) => worksheet.write_number(row, col, *number as f64)?,
                FieldValue::Number(number) => worksheet.write_number(row, col, *number)?,
            };
        }
    }

    let col_end = (table.columns.len() as u16).saturating_sub(1);
    worksheet.autofilter(0, 0, table.rows.len() as u32, col_end)?;
    worksheet.set_freeze_panes(1, 0)?;

    workbook.save(path)?;
    Ok(())
}

fn sanitize_sheet_name(raw: &str) -> String {
    let invalid = [':', '\\', '/', '?', '*', '[', ']', '\'', '"'];
    let mut sanitized: String = raw
        .chars()
        .map(|ch| {
            if invalid.contains(&ch) || ch.is_control() {
                '_'
            } else {
                ch
            }
        })
        .collect();

    sanitized = sanitized.trim().to_string();
    if sanitized.is_empty() {
        sanitized = "Sheet1".to_string();
    }

    if sanitized.chars().count() > 31 {
        sanitized = sanitized.chars().take(31).collect();
    }

    sanitized
}
