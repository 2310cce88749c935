use std::collections::BTreeMap;
use std::fmt;

use serde::Serialize;

use crate::schema;

/// One line of the `eCRF_3` sheet after column selection.
#[derive(Debug, Clone, PartialEq)]
pub struct LineItem {
    /// Raw sub-sector label, e.g. `Residential Buildings`.
    pub sub_sector: String,
    /// Raw fuel type or activity label, e.g. `Natural gas`.
    pub fuel_type: String,
    /// Activity amount; absent cells are read as `0`.
    pub amount: f64,
}

impl LineItem {
    pub fn new(sub_sector: impl Into<String>, fuel_type: impl Into<String>, amount: f64) -> Self {
        Self {
            sub_sector: sub_sector.into(),
            fuel_type: fuel_type.into(),
            amount,
        }
    }
}

/// Identity fields read from the `eCRF_1` sheet.
#[derive(Debug, Clone, PartialEq)]
pub struct CityMetadata {
    pub city: String,
    pub city_id: String,
    pub year: i64,
}

/// `{sector}-{fuel}` → summed amount, as produced by the reshaper.
pub type SectorFuelTotals = BTreeMap<String, f64>;

/// A single cell of the output table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Text(String),
    Integer(i64),
    Number(f64),
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Text(value) => f.write_str(value),
            FieldValue::Integer(value) => write!(f, "{value}"),
            FieldValue::Number(value) => write!(f, "{value}"),
        }
    }
}

/// One output row; values follow [`schema::CITY_RECORD_COLUMNS`].
#[derive(Debug, Clone, PartialEq)]
pub struct CityRecord {
    pub values: Vec<FieldValue>,
}

impl CityRecord {
    /// Looks a value up by column name.
    pub fn get(&self, column: &str) -> Option<&FieldValue> {
        schema::column_index(column).and_then(|index| self.values.get(index))
    }

    /// Renders each cell the way it is written to CSV.
    pub fn to_strings(&self) -> Vec<String> {
        self.values.iter().map(ToString::to_string).collect()
    }

    /// Column → value object used by the `extract` command.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        let mut object = serde_json::Map::with_capacity(self.values.len());
        for (column, value) in schema::CITY_RECORD_COLUMNS.iter().zip(&self.values) {
            object.insert((*column).to_string(), serde_json::to_value(value)?);
        }
        Ok(serde_json::Value::Object(object))
    }
}

/// The aggregated table for one collection.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputTable {
    pub columns: Vec<String>,
    pub rows: Vec<CityRecord>,
}

impl OutputTable {
    /// Creates an empty table carrying the current schema's header.
    pub fn new() -> Self {
        Self {
            columns: schema::CITY_RECORD_COLUMNS
                .iter()
                .map(|column| column.to_string())
                .collect(),
            rows: Vec::new(),
        }
    }
}

impl Default for OutputTable {
    fn default() -> Self {
        Self::new()
    }
}
