use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use dpfc_tools::batch::{self, BatchConfig, OutputFormat};
use dpfc_tools::tables::LabelTables;
use dpfc_tools::{Result, ToolError};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(cli) {
        eprintln!("error: {error}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    init_logging(cli.verbose)?;
    match cli.command {
        Command::Aggregate(args) => execute_aggregate(args),
        Command::Extract(args) => execute_extract(args),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|error| ToolError::Logging(error.to_string()))
}

fn execute_aggregate(args: AggregateArgs) -> Result<()> {
    let mut config = BatchConfig::new(args.input_dir);
    config.output_dir = args.output_dir;
    config.prefix = args.prefix;
    config.format = args.format.into();
    config.tables = load_tables(args.tables.as_deref())?;

    let outcome = batch::aggregate_collection(&config, &args.location)?;
    println!(
        "wrote {} rows to {}",
        outcome.table.rows.len(),
        outcome.output_path.display()
    );
    Ok(())
}

fn execute_extract(args: ExtractArgs) -> Result<()> {
    if !args.input.exists() {
        return Err(ToolError::MissingInput(args.input));
    }

    let tables = load_tables(args.tables.as_deref())?;
    let record = batch::extract_city_record(&args.input, &tables)?;
    println!("{}", serde_json::to_string_pretty(&record.to_json()?)?);
    Ok(())
}

fn load_tables(path: Option<&Path>) -> Result<LabelTables> {
    match path {
        Some(path) => LabelTables::from_json_file(path),
        None => Ok(LabelTables::default()),
    }
}

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Reshape Data Portal for Cities survey exports into one row per city."
)]
struct Cli {
    /// Log per-file detail.
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Aggregate every workbook of a collection into one table.
    Aggregate(AggregateArgs),
    /// Print the city record of a single workbook as JSON.
    Extract(ExtractArgs),
}

#[derive(clap::Args)]
struct AggregateArgs {
    /// Collection name, e.g. a country or region.
    #[arg(long)]
    location: String,

    /// Directory containing the `<prefix>_<location>` input folder.
    #[arg(long)]
    input_dir: PathBuf,

    /// Directory the collection table is written to.
    #[arg(long, default_value = batch::DEFAULT_OUTPUT_DIR)]
    output_dir: PathBuf,

    /// Prefix of the input folder and output file names.
    #[arg(long, default_value = batch::DEFAULT_PREFIX)]
    prefix: String,

    /// Output file format.
    #[arg(long, value_enum, default_value_t = TableFormat::Csv)]
    format: TableFormat,

    /// JSON file overriding the built-in label tables.
    #[arg(long)]
    tables: Option<PathBuf>,
}

#[derive(clap::Args)]
struct ExtractArgs {
    /// Survey workbook to read.
    #[arg(long)]
    input: PathBuf,

    /// JSON file overriding the built-in label tables.
    #[arg(long)]
    tables: Option<PathBuf>,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum TableFormat {
    Csv,
    Xlsx,
}

impl From<TableFormat> for OutputFormat {
    fn from(format: TableFormat) -> Self {
        match format {
            TableFormat::Csv => OutputFormat::Csv,
            TableFormat::Xlsx => OutputFormat::Xlsx,
        }
    }
}
