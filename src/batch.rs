use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, instrument};

use crate::error::{Result, ToolError};
use crate::io::excel_read::SurveyWorkbook;
use crate::io::{csv_write, excel_write};
use crate::merge::merge_record;
use crate::model::{CityRecord, OutputTable};
use crate::reshape::reshape;
use crate::schema::SCHEMA_VERSION;
use crate::tables::LabelTables;

/// Default directory the collection tables are written to.
pub const DEFAULT_OUTPUT_DIR: &str = "processed_data";
/// Default prefix shared by input directories and output files.
pub const DEFAULT_PREFIX: &str = "ground_truth";

/// File format of the collection table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Xlsx,
}

impl OutputFormat {
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Csv => "csv",
            OutputFormat::Xlsx => "xlsx",
        }
    }
}

/// Where a collection is read from and written to.
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Directory holding one `<prefix>_<location>` subdirectory per collection.
    pub base_dir: PathBuf,
    pub output_dir: PathBuf,
    pub prefix: String,
    pub format: OutputFormat,
    pub tables: LabelTables,
}

impl BatchConfig {
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            prefix: DEFAULT_PREFIX.to_string(),
            format: OutputFormat::default(),
            tables: LabelTables::default(),
        }
    }

    fn collection_name(&self, location: &str) -> String {
        format!("{}_{location}", self.prefix)
    }

    /// `<base_dir>/<prefix>_<location>`
    pub fn input_dir(&self, location: &str) -> PathBuf {
        self.base_dir.join(self.collection_name(location))
    }

    /// `<output_dir>/<prefix>_<location>.<ext>`
    pub fn output_path(&self, location: &str) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}",
            self.collection_name(location),
            self.format.extension()
        ))
    }
}

/// Result of aggregating one collection.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub table: OutputTable,
    pub output_path: PathBuf,
}

/// Runs field selection, metadata extraction, reshaping, and merging for a
/// single survey workbook.
#[instrument(level = "debug", skip_all, fields(input = %path.display()))]
pub fn extract_city_record(path: &Path, tables: &LabelTables) -> Result<CityRecord> {
    let mut workbook = SurveyWorkbook::open(path)?;
    let items = workbook.select_fields(tables)?;
    let totals = reshape(&items, tables);
    let metadata = workbook.extract_metadata(tables)?;
    debug!(city = %metadata.city, year = metadata.year, "extracted city record");
    merge_record(totals, &metadata).map_err(|error| match error {
        ToolError::Schema(reason) => ToolError::Schema(format!("{}: {reason}", path.display())),
        other => other,
    })
}

/// Aggregates every workbook of a collection into one table and writes it.
///
/// Files are processed in file-name order. The first failing file aborts the
/// run before anything is written. An empty directory yields a header-only
/// table.
#[instrument(
    level = "info",
    skip_all,
    fields(location = %location, input = %config.base_dir.display())
)]
pub fn aggregate_collection(config: &BatchConfig, location: &str) -> Result<BatchOutcome> {
    let input_dir = config.input_dir(location);
    let files = list_input_files(&input_dir)?;
    info!(
        file_count = files.len(),
        dir = %input_dir.display(),
        schema_version = SCHEMA_VERSION,
        "aggregating collection"
    );

    let table = files
        .iter()
        .try_fold(OutputTable::new(), |mut table, path| {
            table.rows.push(extract_city_record(path, &config.tables)?);
            Ok::<_, ToolError>(table)
        })?;

    fs::create_dir_all(&config.output_dir)?;
    let output_path = config.output_path(location);
    match config.format {
        OutputFormat::Csv => csv_write::write_table(&output_path, &table)?,
        OutputFormat::Xlsx => {
            excel_write::write_table(&output_path, &table, &config.collection_name(location))?
        }
    }
    info!(
        row_count = table.rows.len(),
        output = %output_path.display(),
        "wrote collection table"
    );

    Ok(BatchOutcome { table, output_path })
}

/// Regular files directly inside `dir`, sorted by file name.
pub fn list_input_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(ToolError::MissingInput(dir.to_path_buf()));
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort_by(|lhs, rhs| lhs.file_name().cmp(&rhs.file_name()));
    Ok(files)
}
