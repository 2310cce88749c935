use std::path::Path;

use crate::error::Result;
use crate::model::OutputTable;

/// Writes the table as comma-separated values with a header row and no
/// index column.
pub fn write_table(path: &Path, table: &OutputTable) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(&table.columns)?;
    for record in &table.rows {
        writer.write_record(record.to_strings())?;
    }
    writer.flush()?;
    Ok(())
}
