//! boutstat - Command-line interface for bout pattern analysis
//!
//! Commands:
//! - analyze: Compute position histograms, transition graphs and pattern trees
//! - validate: Check that every table row segments into whole bout cycles

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use bout_patterns::pipeline::analyze_table;
use bout_patterns::report::{ReportEncoder, ReportFormat};
use bout_patterns::table;
use bout_patterns::{BoutSpec, BoutType, MalformedRowPolicy, PatternError, Segmenter, TableOptions};
use bout_patterns::PATTERNS_VERSION;

/// boutstat - Behavior pattern distributions in stimulus/pause bout tables
#[derive(Parser)]
#[command(name = "boutstat")]
#[command(version = PATTERNS_VERSION)]
#[command(about = "Calculate pattern histograms in stimulus and pause bouts", long_about = None)]
struct Cli {
    /// Log level
    #[arg(short, long, global = true, default_value = "info")]
    log: LogLevel,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute bout pattern statistics
    Analyze {
        #[command(flatten)]
        table: TableArgs,

        /// What to do with rows that do not fit the bout layout
        #[arg(long, default_value = "abort")]
        on_malformed: PolicyArg,

        /// Write the (merged, padded) bouts to a new CSV file
        #[arg(long)]
        bout_file: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: FormatArg,
    },

    /// Check that every row segments into whole bout cycles
    Validate {
        #[command(flatten)]
        table: TableArgs,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args)]
struct TableArgs {
    /// The number of stimulus columns per bout
    stimulus_length: usize,

    /// The number of pause columns per bout
    pause_length: usize,

    /// The CSV file to load
    file: PathBuf,

    /// Type of the first bout in each row
    #[arg(long, default_value = "stimulus")]
    starts_with: String,

    /// Do not combine adjacent identical behaviors in bouts
    #[arg(long)]
    no_merge: bool,

    /// The column offset to the first bout
    #[arg(short, long, default_value = "0")]
    offset: usize,

    /// Delimiter in CSV file
    #[arg(short, long, default_value = ";")]
    delim: String,

    /// Number of header rows in CSV file
    #[arg(long, default_value = "0")]
    head_rows: usize,

    /// Limit the number of data rows read from the input file
    #[arg(short = 'n', long)]
    max_rows: Option<usize>,
}

impl TableArgs {
    fn spec(&self) -> Result<BoutSpec, PatternError> {
        let starts_with: BoutType = self.starts_with.parse()?;
        BoutSpec::new(
            self.stimulus_length,
            self.pause_length,
            starts_with,
            !self.no_merge,
        )
    }

    fn options(&self) -> Result<TableOptions, PatternError> {
        Ok(TableOptions {
            delimiter: TableOptions::parse_delimiter(&self.delim)?,
            head_rows: self.head_rows,
            offset: self.offset,
            max_rows: self.max_rows,
        })
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum LogLevel {
    Error,
    Warning,
    Info,
    Debug,
}

impl LogLevel {
    fn directive(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warning => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum PolicyArg {
    /// Stop at the first malformed row
    Abort,
    /// Warn and continue with the next row
    Skip,
}

impl From<PolicyArg> for MalformedRowPolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Abort => MalformedRowPolicy::Abort,
            PolicyArg::Skip => MalformedRowPolicy::Skip,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Plain text tables
    Text,
}

impl From<FormatArg> for ReportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Json => ReportFormat::Json,
            FormatArg::JsonPretty => ReportFormat::JsonPretty,
            FormatArg::Text => ReportFormat::Text,
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(cli.log.directive())
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BoutCliError> {
    match cli.command {
        Commands::Analyze {
            table,
            on_malformed,
            bout_file,
            output,
            format,
        } => cmd_analyze(&table, on_malformed.into(), bout_file, &output, format.into()),

        Commands::Validate { table, json } => cmd_validate(&table, json),
    }
}

fn cmd_analyze(
    args: &TableArgs,
    policy: MalformedRowPolicy,
    bout_file: Option<PathBuf>,
    output: &PathBuf,
    format: ReportFormat,
) -> Result<(), BoutCliError> {
    // Configuration errors surface before any row is read
    let spec = args.spec()?;
    let options = args.options()?;

    let run = analyze_table(&args.file, &options, spec, policy, bout_file.is_some())?;

    if run.summary.rows_processed == 0 && run.summary.rows_rejected.is_empty() {
        return Err(BoutCliError::NoRows);
    }

    if let (Some(path), Some(rows)) = (bout_file, &run.exported_rows) {
        tracing::info!("Writing bout CSV file: {}", path.display());
        table::write_rows_path(&path, rows, options.delimiter)?;
    }

    let output_data = ReportEncoder::new().render(&run, format)?;

    if output.to_string_lossy() == "-" {
        println!("{}", output_data);
    } else {
        fs::write(output, output_data)?;
    }

    Ok(())
}

fn cmd_validate(args: &TableArgs, json: bool) -> Result<(), BoutCliError> {
    let spec = args.spec()?;
    let options = args.options()?;
    let table = table::read_table_path(&args.file, &options)?;

    if table.rows.is_empty() {
        return Err(BoutCliError::NoRows);
    }

    let mut report = ValidationReport {
        total_rows: table.rows.len(),
        valid_rows: 0,
        invalid_rows: 0,
        errors: Vec::new(),
    };

    for (index, row) in table.rows.iter().enumerate() {
        match Segmenter::segment(row, &spec, index) {
            Ok(_) => report.valid_rows += 1,
            Err(e) => {
                report.invalid_rows += 1;
                report.errors.push(ValidationErrorDetail {
                    row: index,
                    columns: row.len(),
                    error: e.to_string(),
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Total rows:   {}", report.total_rows);
        println!("Valid rows:   {}", report.valid_rows);
        println!("Invalid rows: {}", report.invalid_rows);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  [{}] {} columns: {}", err.row, err.columns, err.error);
            }
        }
    }

    if report.invalid_rows > 0 {
        Err(BoutCliError::ValidationFailed(report.invalid_rows))
    } else {
        Ok(())
    }
}

// Error handling

#[derive(Debug)]
enum BoutCliError {
    Io(std::io::Error),
    Pattern(PatternError),
    Json(serde_json::Error),
    NoRows,
    ValidationFailed(usize),
}

impl From<std::io::Error> for BoutCliError {
    fn from(e: std::io::Error) -> Self {
        BoutCliError::Io(e)
    }
}

impl From<PatternError> for BoutCliError {
    fn from(e: PatternError) -> Self {
        BoutCliError::Pattern(e)
    }
}

impl From<serde_json::Error> for BoutCliError {
    fn from(e: serde_json::Error) -> Self {
        BoutCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<BoutCliError> for CliError {
    fn from(e: BoutCliError) -> Self {
        match e {
            BoutCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            BoutCliError::Pattern(e) => {
                let (code, hint) = match &e {
                    PatternError::InvalidConfiguration { .. } => (
                        "CONFIG_ERROR",
                        "Bout lengths must be positive and --starts-with stimulus or pause",
                    ),
                    PatternError::MalformedRow { .. } => (
                        "MALFORMED_ROW",
                        "Check --offset and bout lengths, or pass --on-malformed skip",
                    ),
                    PatternError::Io(_) => ("IO_ERROR", "Check file paths and permissions"),
                    _ => ("TABLE_ERROR", "Check the delimiter and table layout"),
                };
                CliError {
                    code: code.to_string(),
                    message: e.to_string(),
                    hint: Some(hint.to_string()),
                }
            }
            BoutCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: None,
            },
            BoutCliError::NoRows => CliError {
                code: "NO_ROWS".to_string(),
                message: "No data rows found in input".to_string(),
                hint: Some("Check --head-rows and that the input file is not empty".to_string()),
            },
            BoutCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{} rows failed validation", count),
                hint: Some("Fix the listed rows or pass --on-malformed skip to analyze".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_rows: usize,
    valid_rows: usize,
    invalid_rows: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    row: usize,
    columns: usize,
    error: String,
}
