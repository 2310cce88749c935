use std::collections::BTreeMap;

use crate::error::{Result, ToolError};
use crate::model::{CityMetadata, CityRecord, FieldValue};
use crate::schema::CITY_RECORD_COLUMNS;

/// Combines reshaped totals with the city metadata and projects the union
/// onto [`CITY_RECORD_COLUMNS`].
///
/// Totals may arrive in any order. Keys outside the schema are dropped. A
/// schema column missing from the union is a [`ToolError::Schema`].
pub fn merge_record<K>(
    totals: impl IntoIterator<Item = (K, f64)>,
    metadata: &CityMetadata,
) -> Result<CityRecord>
where
    K: Into<String>,
{
    let mut merged: BTreeMap<String, FieldValue> = totals
        .into_iter()
        .map(|(key, value)| (key.into(), FieldValue::Number(value)))
        .collect();
    merged.insert("city".to_string(), FieldValue::Text(metadata.city.clone()));
    merged.insert("city_id".to_string(), FieldValue::Text(metadata.city_id.clone()));
    merged.insert("year".to_string(), FieldValue::Integer(metadata.year));

    let values = CITY_RECORD_COLUMNS
        .iter()
        .map(|column| {
            merged
                .remove(*column)
                .ok_or_else(|| ToolError::Schema(format!("merged record has no column '{column}'")))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CityRecord { values })
}
