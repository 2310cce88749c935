use crate::model::{LineItem, SectorFuelTotals};
use crate::schema::sector_fuel_key;
use crate::tables::LabelTables;

/// Folds the long-format line items of one workbook into one
/// `{sector}-{fuel}` total per sector and fuel category.
///
/// Every combination of the configured sectors and fuel categories is
/// present in the result; combinations without matching rows are `0`. A raw
/// label listed under several categories contributes its full amount to each
/// of them.
pub fn reshape(items: &[LineItem], tables: &LabelTables) -> SectorFuelTotals {
    let mut totals = SectorFuelTotals::new();

    for sector in &tables.sectors {
        let sector_items: Vec<&LineItem> = items
            .iter()
            .filter(|item| item.sub_sector == sector.label)
            .collect();

        for category in &tables.fuels {
            let total = sector_items
                .iter()
                .filter(|item| category.contains(&item.fuel_type))
                .fold(0.0, |acc, item| acc + item.amount);
            totals.insert(sector_fuel_key(&sector.code, &category.name), total);
        }
    }

    totals
}
