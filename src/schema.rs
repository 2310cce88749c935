//! Versioned column layout of the per-city output table.

/// Bumped whenever [`CITY_RECORD_COLUMNS`] changes.
pub const SCHEMA_VERSION: u32 = 1;

/// Identity columns leading every row.
pub const METADATA_COLUMNS: [&str; 3] = ["city", "year", "city_id"];

/// Fuel categories in output order. This differs from the label table order.
pub const FUEL_COLUMN_ORDER: [&str; 8] = [
    "electricity",
    "coal",
    "natural_gas",
    "oil",
    "kerosene",
    "lpg",
    "biomass",
    "district_heating",
];

/// Sector codes in output order within each fuel group.
pub const SECTOR_COLUMN_ORDER: [&str; 5] = ["RES", "COM", "MUN", "IND", "AFF"];

/// Full output header: metadata, then sector columns grouped by fuel.
pub const CITY_RECORD_COLUMNS: [&str; 43] = [
    "city",
    "year",
    "city_id",
    "RES-electricity",
    "COM-electricity",
    "MUN-electricity",
    "IND-electricity",
    "AFF-electricity",
    "RES-coal",
    "COM-coal",
    "MUN-coal",
    "IND-coal",
    "AFF-coal",
    "RES-natural_gas",
    "COM-natural_gas",
    "MUN-natural_gas",
    "IND-natural_gas",
    "AFF-natural_gas",
    "RES-oil",
    "COM-oil",
    "MUN-oil",
    "IND-oil",
    "AFF-oil",
    "RES-kerosene",
    "COM-kerosene",
    "MUN-kerosene",
    "IND-kerosene",
    "AFF-kerosene",
    "RES-lpg",
    "COM-lpg",
    "MUN-lpg",
    "IND-lpg",
    "AFF-lpg",
    "RES-biomass",
    "COM-biomass",
    "MUN-biomass",
    "IND-biomass",
    "AFF-biomass",
    "RES-district_heating",
    "COM-district_heating",
    "MUN-district_heating",
    "IND-district_heating",
    "AFF-district_heating",
];

/// Builds the `{sector}-{fuel}` key shared by the reshaper and the header.
pub fn sector_fuel_key(sector_code: &str, fuel: &str) -> String {
    format!("{sector_code}-{fuel}")
}

/// Position of `column` in [`CITY_RECORD_COLUMNS`].
pub fn column_index(column: &str) -> Option<usize> {
    CITY_RECORD_COLUMNS.iter().position(|name| *name == column)
}
