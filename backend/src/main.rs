//! Planpivot CLI - baseline vs revised budget plan reports
//!
//! # Main Commands
//!
//! ```bash
//! planpivot report plan.csv                 # Nested view JSON to stdout
//! planpivot report plan.xlsx --excel -o r.xlsx
//! planpivot serve                           # Start HTTP server (port 3000)
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! planpivot parse plan.csv                  # Normalized input records as JSON
//! planpivot validate report.json            # Check a report against the schema
//! planpivot labels                          # Show the column label registry
//! ```

use clap::{Parser, Subcommand};
use planpivot::{
    build_report_from_table, extract_records, init_logging, parse_file_auto, validate_nested_view,
    ReportConfig,
};
use serde_json::{json, Value};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Parser)]
#[command(name = "planpivot")]
#[command(about = "Compare baseline and revised budget plans per block", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Flags shared by commands that read input tables.
#[derive(clap::Args)]
struct InputOptions {
    /// Fail on Status values other than 0 or 1
    #[arg(long)]
    strict_status: bool,

    /// Fail when rows carry different ValueDate values
    #[arg(long)]
    strict_dates: bool,

    /// JSON label registry replacing the built-in one
    #[arg(long)]
    labels: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the report from a CSV or XLSX file
    Report {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// Write an XLSX workbook instead of JSON
        #[arg(short = 'x', long)]
        excel: bool,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Indent the JSON output
        #[arg(long)]
        pretty: bool,

        /// chrono format for the date shown in headers
        #[arg(long)]
        date_format: Option<String>,

        #[command(flatten)]
        input_options: InputOptions,
    },

    /// Parse an input file and output the normalized records as JSON
    Parse {
        /// Input CSV or XLSX file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        input_options: InputOptions,
    },

    /// Validate a JSON report against the nested view schema
    Validate {
        /// Report JSON file
        input: PathBuf,
    },

    /// Show the column label registry
    Labels {
        /// Registry file to show instead of the configured one
        #[arg(long)]
        labels: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Report {
            input,
            excel,
            output,
            pretty,
            date_format,
            input_options,
        } => load_config(&input_options, date_format).and_then(|config| {
            cmd_report(&input, excel, output.as_deref(), pretty, &config)
        }),

        Commands::Parse {
            input,
            output,
            input_options,
        } => load_config(&input_options, None)
            .and_then(|config| cmd_parse(&input, output.as_deref(), &config)),

        Commands::Validate { input } => cmd_validate(&input),

        Commands::Labels { labels } => cmd_labels(labels),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Environment settings with CLI flags on top.
fn load_config(
    options: &InputOptions,
    date_format: Option<String>,
) -> Result<ReportConfig, Box<dyn std::error::Error>> {
    let mut config = ReportConfig::from_env()?;
    config.strict_status |= options.strict_status;
    config.strict_dates |= options.strict_dates;
    if let Some(path) = &options.labels {
        config.labels_path = Some(path.clone());
    }
    if let Some(format) = date_format {
        config.date_format = format;
    }
    config.validate()?;
    Ok(config)
}

fn cmd_report(
    input: &Path,
    excel: bool,
    output: Option<&Path>,
    pretty: bool,
    config: &ReportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let labels = config.load_labels()?;
    let parsed = parse_file_auto(input)?;
    if let (Some(encoding), Some(delimiter)) = (&parsed.encoding, parsed.delimiter) {
        info!(%encoding, delimiter = %format_delimiter(delimiter), "CSV detected");
    }

    let report = build_report_from_table(&parsed, config, &labels)?;
    info!(
        blocks = report.merged.len().saturating_sub(1),
        date = %report.date,
        "Report built"
    );

    if excel {
        let bytes = report.to_xlsx(&labels)?;
        write_bytes(&bytes, output)?;
    } else {
        let json = report.to_json(&labels, pretty)?;
        write_output(&json, output)?;
    }
    Ok(())
}

fn cmd_parse(
    input: &Path,
    output: Option<&Path>,
    config: &ReportConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let parsed = parse_file_auto(input)?;
    let extracted = extract_records(&parsed.table, config.extract_options())?;
    let report_date = extracted
        .report_date
        .as_ref()
        .map(|d| d.display(&config.date_format))
        .transpose()?;

    let document = json!({
        "format": parsed.format,
        "encoding": parsed.encoding,
        "delimiter": parsed.delimiter.map(format_delimiter),
        "columns": parsed.table.headers,
        "reportDate": report_date,
        "droppedRows": extracted.dropped,
        "records": extracted.records,
    });
    write_output(&serde_json::to_string_pretty(&document)?, output)
}

fn cmd_validate(input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(input)?;
    let report: Value = serde_json::from_str(&content)?;

    match validate_nested_view(&report) {
        Ok(()) => {
            eprintln!("{}: valid", input.display());
            Ok(())
        }
        Err(errors) => {
            for err in errors.iter().take(10) {
                eprintln!("  - {}", err);
            }
            Err(format!("{}: {} schema violation(s)", input.display(), errors.len()).into())
        }
    }
}

fn cmd_labels(labels: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = ReportConfig::from_env()?;
    if labels.is_some() {
        config.labels_path = labels;
    }
    let registry = config.load_labels()?;
    for entry in registry.entries() {
        println!("{:<12} {}", entry.id, entry.label);
    }
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let config = ReportConfig::from_env()?;
    planpivot::server::start_server(port, config).await
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            info!(path = %p.display(), "Output written");
        }
        None => {
            println!("{}", content);
        }
    }
    Ok(())
}

fn write_bytes(bytes: &[u8], path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, bytes)?;
            info!(path = %p.display(), bytes = bytes.len(), "Workbook written");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(bytes)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
