//! Label tables that drive extraction and reshaping.
//!
//! Fuel categories are configuration data rather than a partition of raw
//! labels: `Kerosene` belongs to both `oil` and `kerosene`, and
//! `District Cooling` is folded into `district_heating`. A label counts in
//! full toward every category that lists it.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Sheet holding the per-sector line items.
pub const LINE_ITEM_SHEET: &str = "eCRF_3";
/// Sheet holding the city identity cells.
pub const METADATA_SHEET: &str = "eCRF_1";

/// Maps one raw sub-sector label to its output code.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectorLabel {
    pub label: String,
    pub code: String,
}

/// A consolidated fuel bucket and the raw labels it sums.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FuelCategory {
    pub name: String,
    pub labels: Vec<String>,
}

impl FuelCategory {
    pub fn contains(&self, label: &str) -> bool {
        self.labels.iter().any(|member| member == label)
    }
}

/// Header text of the three columns read from the line-item sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LineItemColumns {
    pub sub_sector: String,
    pub fuel_type: String,
    pub amount: String,
}

impl Default for LineItemColumns {
    fn default() -> Self {
        Self {
            sub_sector: "CRF - Sub-sector".to_string(),
            fuel_type: "Fuel type or activity".to_string(),
            amount: "Activity data - Amount".to_string(),
        }
    }
}

/// Location of one metadata value on the metadata sheet.
///
/// `row` and `column` are zero-based and absolute from `A1`. When `label` is
/// set, the cell directly left of the value must carry that text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetadataField {
    pub row: u32,
    pub column: u32,
    #[serde(default)]
    pub label: Option<String>,
}

impl MetadataField {
    pub fn at(row: u32, column: u32) -> Self {
        Self {
            row,
            column,
            label: None,
        }
    }

    /// Spreadsheet-style reference such as `C7`, for error messages.
    pub fn cell_ref(&self) -> String {
        let mut letters = Vec::new();
        let mut index = self.column + 1;
        while index > 0 {
            let rem = ((index - 1) % 26) as u8;
            letters.push((b'A' + rem) as char);
            index = (index - 1) / 26;
        }
        letters.reverse();
        format!("{}{}", letters.into_iter().collect::<String>(), self.row + 1)
    }
}

/// Positional schema for the metadata sheet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetadataLayout {
    pub city: MetadataField,
    pub city_id: MetadataField,
    pub year: MetadataField,
}

impl Default for MetadataLayout {
    fn default() -> Self {
        Self {
            city: MetadataField::at(1, 2),
            city_id: MetadataField::at(4, 2),
            year: MetadataField::at(6, 2),
        }
    }
}

/// Everything the extractors and the reshaper need to know about the
/// workbook conventions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelTables {
    pub line_item_sheet: String,
    pub metadata_sheet: String,
    pub columns: LineItemColumns,
    pub sectors: Vec<SectorLabel>,
    pub fuels: Vec<FuelCategory>,
    pub metadata: MetadataLayout,
}

impl Default for LabelTables {
    fn default() -> Self {
        let sector = |label: &str, code: &str| SectorLabel {
            label: label.to_string(),
            code: code.to_string(),
        };
        let fuel = |name: &str, labels: &[&str]| FuelCategory {
            name: name.to_string(),
            labels: labels.iter().map(|label| label.to_string()).collect(),
        };

        Self {
            line_item_sheet: LINE_ITEM_SHEET.to_string(),
            metadata_sheet: METADATA_SHEET.to_string(),
            columns: LineItemColumns::default(),
            sectors: vec![
                sector("Residential Buildings", "RES"),
                sector("Commercial Buildings", "COM"),
                sector("Institutional Buildings", "MUN"),
                sector("Industry", "IND"),
                sector("Agriculture, Forestry and Fisheries", "AFF"),
            ],
            fuels: vec![
                fuel("electricity", &["Electricity"]),
                fuel(
                    "district_heating",
                    &[
                        "District heating - hot water",
                        "District heating - steam",
                        "District Cooling",
                    ],
                ),
                fuel("coal", &["Coal (Bituminous or Black coal)"]),
                fuel("oil", &["Diesel oil", "Kerosene"]),
                fuel("natural_gas", &["Natural gas"]),
                fuel("lpg", &["Liquefied Petroleum Gas (LPG)"]),
                fuel("kerosene", &["Kerosene"]),
                fuel(
                    "biomass",
                    &["Wood or wood waste", "Other biogas", "Other Liquid BioFuels"],
                ),
            ],
            metadata: MetadataLayout::default(),
        }
    }
}

impl LabelTables {
    /// Loads tables from a JSON document. Omitted fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let source = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&source)?)
    }
}
