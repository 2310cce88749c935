use std::fs;
use std::path::Path;

use calamine::{DataType, Reader, Xlsx, open_workbook};
use dpfc_tools::ToolError;
use dpfc_tools::batch::{self, BatchConfig, OutputFormat};
use dpfc_tools::model::FieldValue;
use dpfc_tools::schema::CITY_RECORD_COLUMNS;
use dpfc_tools::tables::LabelTables;
use rust_xlsxwriter::Workbook;
use tempfile::tempdir;

enum Amount<'a> {
    Number(f64),
    Text(&'a str),
    Blank,
}

struct Fixture<'a> {
    city: &'a str,
    city_id: &'a str,
    year: f64,
    rows: Vec<(&'a str, &'a str, Amount<'a>)>,
}

impl<'a> Fixture<'a> {
    fn new(city: &'a str, city_id: &'a str, year: f64) -> Self {
        Self {
            city,
            city_id,
            year,
            rows: Vec::new(),
        }
    }

    fn row(mut self, sub_sector: &'a str, fuel_type: &'a str, amount: Amount<'a>) -> Self {
        self.rows.push((sub_sector, fuel_type, amount));
        self
    }
}

/// Writes a workbook laid out like a portal export: line items in columns
/// D, F and H of `eCRF_3`, identity values in column C of `eCRF_1`.
fn write_survey(path: &Path, fixture: &Fixture<'_>) {
    let mut workbook = Workbook::new();

    let identity = workbook.add_worksheet();
    identity.set_name("eCRF_1").expect("sheet named");
    identity.write_string(0, 1, "City information").expect("cell written");
    identity.write_string(1, 1, "City").expect("cell written");
    identity.write_string(1, 2, fixture.city).expect("cell written");
    identity.write_string(4, 1, "City ID").expect("cell written");
    identity.write_string(4, 2, fixture.city_id).expect("cell written");
    identity.write_string(6, 1, "Year").expect("cell written");
    identity.write_number(6, 2, fixture.year).expect("cell written");

    let items = workbook.add_worksheet();
    items.set_name("eCRF_3").expect("sheet named");
    let headers = [
        "Sector",
        "CRF - Sector",
        "Sub-sector code",
        "CRF - Sub-sector",
        "Scope",
        "Fuel type or activity",
        "Notation key",
        "Activity data - Amount",
    ];
    for (col, header) in headers.iter().enumerate() {
        items.write_string(0, col as u16, *header).expect("header written");
    }
    for (index, (sub_sector, fuel_type, amount)) in fixture.rows.iter().enumerate() {
        let row = (index + 1) as u32;
        items.write_string(row, 0, "Stationary Energy").expect("cell written");
        items.write_string(row, 3, *sub_sector).expect("cell written");
        items.write_string(row, 5, *fuel_type).expect("cell written");
        match amount {
            Amount::Number(value) => {
                items.write_number(row, 7, *value).expect("cell written");
            }
            Amount::Text(value) => {
                items.write_string(row, 7, *value).expect("cell written");
            }
            Amount::Blank => {}
        }
    }

    workbook.save(path).expect("workbook saved");
}

fn config_for(base: &Path) -> BatchConfig {
    let mut config = BatchConfig::new(base.join("input"));
    config.output_dir = base.join("processed_data");
    config
}

fn collection_dir(config: &BatchConfig, location: &str) -> std::path::PathBuf {
    let dir = config.input_dir(location);
    fs::create_dir_all(&dir).expect("collection directory created");
    dir
}

fn number(record: &dpfc_tools::model::CityRecord, column: &str) -> f64 {
    match record.get(column) {
        Some(FieldValue::Number(value)) => *value,
        other => panic!("column {column} is not numeric: {other:?}"),
    }
}

#[test]
fn two_file_collection_produces_one_row_per_file() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let dir = collection_dir(&config, "test");

    write_survey(
        &dir.join("a_city.xlsx"),
        &Fixture::new("Alpha", "101", 2020.0).row(
            "Residential Buildings",
            "Electricity",
            Amount::Number(100.0),
        ),
    );
    write_survey(
        &dir.join("b_city.xlsx"),
        &Fixture::new("Beta", "202", 2020.0).row("Transport", "Gasoline", Amount::Number(7.0)),
    );

    let outcome = batch::aggregate_collection(&config, "test").expect("collection aggregated");

    assert_eq!(
        outcome.output_path,
        temp_dir.path().join("processed_data").join("ground_truth_test.csv")
    );
    assert_eq!(outcome.table.rows.len(), 2);

    let first = &outcome.table.rows[0];
    assert_eq!(first.get("city"), Some(&FieldValue::Text("Alpha".into())));
    assert_eq!(first.get("year"), Some(&FieldValue::Integer(2020)));
    assert_eq!(first.get("city_id"), Some(&FieldValue::Text("101".into())));
    for column in CITY_RECORD_COLUMNS.iter().skip(3) {
        let expected = if *column == "RES-electricity" { 100.0 } else { 0.0 };
        assert_eq!(number(first, column), expected, "column {column}");
    }

    let second = &outcome.table.rows[1];
    assert_eq!(second.get("city"), Some(&FieldValue::Text("Beta".into())));
    for column in CITY_RECORD_COLUMNS.iter().skip(3) {
        assert_eq!(number(second, column), 0.0, "column {column}");
    }

    let mut reader = csv::Reader::from_path(&outcome.output_path).expect("CSV opened");
    let headers: Vec<String> = reader
        .headers()
        .expect("header read")
        .iter()
        .map(str::to_string)
        .collect();
    assert_eq!(headers, CITY_RECORD_COLUMNS);

    let rows: Vec<csv::StringRecord> = reader
        .records()
        .collect::<Result<_, _>>()
        .expect("rows read");
    assert_eq!(rows.len(), 2);
    assert_eq!(&rows[0][0], "Alpha");
    assert_eq!(&rows[0][1], "2020");
    assert_eq!(&rows[0][2], "101");
    assert_eq!(&rows[0][3], "100");
    assert!(rows[1].iter().skip(3).all(|cell| cell == "0"));
}

#[test]
fn kerosene_and_cooling_are_consolidated() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("survey.xlsx");
    write_survey(
        &path,
        &Fixture::new("Gamma", "7", 2019.0)
            .row("Residential Buildings", "Kerosene", Amount::Number(10.0))
            .row("Residential Buildings", "Diesel oil", Amount::Number(2.5))
            .row("Commercial Buildings", "District Cooling", Amount::Number(4.0))
            .row("Commercial Buildings", "District heating - steam", Amount::Number(1.0))
            .row("Industry", "Natural gas", Amount::Blank),
    );

    let record =
        batch::extract_city_record(&path, &LabelTables::default()).expect("record extracted");

    assert_eq!(number(&record, "RES-kerosene"), 10.0);
    assert_eq!(number(&record, "RES-oil"), 12.5);
    assert_eq!(number(&record, "COM-district_heating"), 5.0);
    assert_eq!(number(&record, "IND-natural_gas"), 0.0);
    assert_eq!(record.get("year"), Some(&FieldValue::Integer(2019)));
}

#[test]
fn empty_directory_writes_header_only() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    collection_dir(&config, "empty");

    let outcome = batch::aggregate_collection(&config, "empty").expect("collection aggregated");

    assert!(outcome.table.rows.is_empty());
    let written = fs::read_to_string(&outcome.output_path).expect("output read");
    assert_eq!(written.trim_end(), CITY_RECORD_COLUMNS.join(","));
}

#[test]
fn missing_collection_directory_is_reported() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());

    let error = batch::aggregate_collection(&config, "nowhere").expect_err("missing directory");
    assert!(matches!(error, ToolError::MissingInput(path) if path.ends_with("ground_truth_nowhere")));
}

#[test]
fn failing_file_aborts_batch_without_output() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let dir = collection_dir(&config, "broken");

    write_survey(
        &dir.join("a_good.xlsx"),
        &Fixture::new("Alpha", "1", 2020.0),
    );
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .set_name("eCRF_3")
        .expect("sheet named")
        .write_string(0, 0, "CRF - Sub-sector")
        .expect("cell written");
    workbook.save(dir.join("b_bad.xlsx")).expect("workbook saved");

    let error = batch::aggregate_collection(&config, "broken").expect_err("batch aborted");
    match error {
        ToolError::InputFormat { path, reason } => {
            assert!(path.ends_with("b_bad.xlsx"));
            assert!(reason.contains("Fuel type or activity"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!config.output_path("broken").exists());
}

#[test]
fn missing_metadata_sheet_is_an_input_format_error() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("no_identity.xlsx");
    let mut workbook = Workbook::new();
    let items = workbook.add_worksheet();
    items.set_name("eCRF_3").expect("sheet named");
    items.write_string(0, 0, "CRF - Sub-sector").expect("cell written");
    items.write_string(0, 1, "Fuel type or activity").expect("cell written");
    items.write_string(0, 2, "Activity data - Amount").expect("cell written");
    workbook.save(&path).expect("workbook saved");

    let error = batch::extract_city_record(&path, &LabelTables::default())
        .expect_err("missing sheet rejected");
    assert!(matches!(error, ToolError::InputFormat { reason, .. } if reason.contains("eCRF_1")));
}

#[test]
fn non_numeric_amount_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("survey.xlsx");
    write_survey(
        &path,
        &Fixture::new("Delta", "9", 2021.0)
            .row("Industry", "Electricity", Amount::Text("12.5"))
            .row("Industry", "Natural gas", Amount::Text("NO")),
    );

    let error = batch::extract_city_record(&path, &LabelTables::default())
        .expect_err("notation key rejected");
    assert!(matches!(error, ToolError::InputFormat { reason, .. } if reason.contains("row 3")));
}

#[test]
fn configured_metadata_labels_are_validated() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("survey.xlsx");
    write_survey(&path, &Fixture::new("Epsilon", "5", 2018.0));

    let mut tables = LabelTables::default();
    tables.metadata.city.label = Some("city".to_string());
    tables.metadata.year.label = Some("Year".to_string());
    let record = batch::extract_city_record(&path, &tables).expect("labels matched");
    assert_eq!(record.get("city"), Some(&FieldValue::Text("Epsilon".into())));

    tables.metadata.city_id.label = Some("Inventory year".to_string());
    let error = batch::extract_city_record(&path, &tables).expect_err("label mismatch");
    assert!(matches!(error, ToolError::InputFormat { reason, .. } if reason.contains("C5")));
}

#[test]
fn subdirectories_are_not_treated_as_inputs() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let dir = collection_dir(&config, "nested");
    fs::create_dir(dir.join("archive")).expect("subdirectory created");
    write_survey(&dir.join("only.xlsx"), &Fixture::new("Zeta", "3", 2020.0));

    let files = batch::list_input_files(&dir).expect("files listed");
    assert_eq!(files, vec![dir.join("only.xlsx")]);
}

#[test]
fn xlsx_output_holds_numeric_cells() {
    let temp_dir = tempdir().expect("temporary directory");
    let mut config = config_for(temp_dir.path());
    config.format = OutputFormat::Xlsx;
    let dir = collection_dir(&config, "sheet");
    write_survey(
        &dir.join("city.xlsx"),
        &Fixture::new("Eta", "11", 2022.0).row(
            "Institutional Buildings",
            "Liquefied Petroleum Gas (LPG)",
            Amount::Number(3.25),
        ),
    );

    let outcome = batch::aggregate_collection(&config, "sheet").expect("collection aggregated");
    assert!(outcome.output_path.ends_with("ground_truth_sheet.xlsx"));

    let mut workbook: Xlsx<_> = open_workbook(&outcome.output_path).expect("output opened");
    let range = workbook
        .worksheet_range("ground_truth_sheet")
        .expect("sheet present")
        .expect("sheet read");
    let column = CITY_RECORD_COLUMNS
        .iter()
        .position(|name| *name == "MUN-lpg")
        .expect("column known") as u32;
    assert_eq!(
        range.get_value((0, column)),
        Some(&DataType::String("MUN-lpg".to_string()))
    );
    assert_eq!(range.get_value((1, column)), Some(&DataType::Float(3.25)));
    assert_eq!(range.get_value((1, 1)), Some(&DataType::Float(2022.0)));
}

#[test]
fn missing_value_markers_count_as_zero() {
    let temp_dir = tempdir().expect("temporary directory");
    let config = config_for(temp_dir.path());
    let dir = collection_dir(&config, "markers");
    write_survey(
        &dir.join("city.xlsx"),
        &Fixture::new("Theta", "13", 2020.0)
            .row("Residential Buildings", "Electricity", Amount::Text("NaN"))
            .row("Residential Buildings", "Natural gas", Amount::Text("N/A"))
            .row("Commercial Buildings", "Electricity", Amount::Text("#N/A"))
            .row("Commercial Buildings", "Natural gas", Amount::Text("NULL"))
            .row("Industry", "Electricity", Amount::Text("nan"))
            .row("Industry", "Natural gas", Amount::Number(6.0)),
    );

    let outcome = batch::aggregate_collection(&config, "markers").expect("collection aggregated");
    let record = &outcome.table.rows[0];
    for column in CITY_RECORD_COLUMNS.iter().skip(3) {
        let value = number(record, column);
        assert!(value.is_finite(), "column {column} is {value}");
    }
    assert_eq!(number(record, "RES-electricity"), 0.0);
    assert_eq!(number(record, "COM-natural_gas"), 0.0);
    assert_eq!(number(record, "IND-natural_gas"), 6.0);

    let written = fs::read_to_string(&outcome.output_path).expect("output read");
    assert!(!written.to_lowercase().contains("nan"), "{written}");
}

#[test]
fn infinite_amount_is_rejected() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("survey.xlsx");
    write_survey(
        &path,
        &Fixture::new("Iota", "17", 2020.0).row(
            "Residential Buildings",
            "Electricity",
            Amount::Text("inf"),
        ),
    );

    let error = batch::extract_city_record(&path, &LabelTables::default())
        .expect_err("infinite amount rejected");
    assert!(matches!(error, ToolError::InputFormat { reason, .. } if reason.contains("'inf'")));
}

#[test]
fn schema_error_names_the_failing_file() {
    let temp_dir = tempdir().expect("temporary directory");
    let path = temp_dir.path().join("renamed_fuel.xlsx");
    write_survey(&path, &Fixture::new("Kappa", "19", 2020.0));

    let mut tables = LabelTables::default();
    for category in &mut tables.fuels {
        if category.name == "lpg" {
            category.name = "propane".to_string();
        }
    }

    let error = batch::extract_city_record(&path, &tables).expect_err("schema mismatch");
    match error {
        ToolError::Schema(reason) => {
            assert!(reason.contains("renamed_fuel.xlsx"), "{reason}");
            assert!(reason.contains("RES-lpg"), "{reason}");
        }
        other => panic!("unexpected error: {other}"),
    }
}
