//! Salesflow CLI - clean, validate and summarize transaction CSVs
//!
//! # Main Commands
//!
//! ```bash
//! salesflow run                           # Full pipeline (data/raw/transactions.csv)
//! salesflow run -i sales.csv -o out/      # Full pipeline on a given file
//! salesflow serve                         # Start HTTP server (port 3000)
//! ```
//!
//! # Stage Commands
//!
//! ```bash
//! salesflow transform sales.csv           # Cleaned records as JSON
//! salesflow validate sales.csv            # Validation report
//! salesflow quality sales.csv             # Per-column quality profile
//! salesflow aggregate sales.csv           # The five summary views
//! salesflow pivot sales.csv -r region -c payment_method -v total_amount
//! ```

use clap::{Parser, Subcommand};
use salesflow::{
    aggregate, generate_quality_report, init_file_log, parse_csv_file_auto, pivot_named,
    remove_duplicates, run_pipeline, start_server, CleanTransaction, Column, OutputStore,
    PipelineOptions, Transformer, Validator,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "salesflow")]
#[command(about = "Batch ETL for sales transaction CSVs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full pipeline: ingest, transform, validate, aggregate and write outputs
    Run {
        /// Input CSV file (default: SALESFLOW_INPUT or data/raw/transactions.csv)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output directory (default: SALESFLOW_OUTPUT_DIR or data/processed)
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Columns identifying duplicates (default: transaction_id)
        #[arg(long, value_delimiter = ',')]
        dedupe: Option<Vec<String>>,

        /// Run in memory without writing files
        #[arg(long)]
        no_write: bool,

        /// Directory for the run log file
        #[arg(long, default_value = salesflow::api::DEFAULT_LOG_DIR)]
        log_dir: PathBuf,
    },

    /// Clean a CSV and output the records as JSON
    Transform {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Validate a CSV and output the report
    Validate {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Per-column quality profile
    Quality {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Build the five summary views
    Aggregate {
        /// Input CSV file
        input: PathBuf,

        /// Write one CSV per view into this directory instead of printing JSON
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },

    /// Ad hoc pivot table
    Pivot {
        /// Input CSV file
        input: PathBuf,

        /// Row key column
        #[arg(short, long)]
        rows: String,

        /// Column key column
        #[arg(short, long)]
        columns: String,

        /// Value column
        #[arg(short, long)]
        values: String,

        /// sum, mean, median, min, max, count or nunique
        #[arg(short, long, default_value = "sum")]
        aggfunc: String,

        /// Write a CSV into this directory instead of printing JSON
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
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

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run {
            input,
            output_dir,
            dedupe,
            no_write,
            log_dir,
        } => cmd_run(input, output_dir, dedupe, no_write, &log_dir),

        Commands::Transform { input, output } => cmd_transform(&input, output.as_deref()),

        Commands::Validate { input, output } => cmd_validate(&input, output.as_deref()),

        Commands::Quality { input, output } => cmd_quality(&input, output.as_deref()),

        Commands::Aggregate { input, output_dir } => cmd_aggregate(&input, output_dir.as_deref()),

        Commands::Pivot {
            input,
            rows,
            columns,
            values,
            aggfunc,
            output_dir,
        } => cmd_pivot(&input, &rows, &columns, &values, &aggfunc, output_dir.as_deref()),

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn cmd_run(
    input: Option<PathBuf>,
    output_dir: Option<PathBuf>,
    dedupe: Option<Vec<String>>,
    no_write: bool,
    log_dir: &Path,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut options = PipelineOptions::from_env();
    if input.is_some() {
        options.input_path = input;
    }
    if let Some(dir) = output_dir {
        options.output_dir = dir;
    }
    if let Some(keys) = dedupe {
        options.dedupe_keys = keys
            .iter()
            .map(|k| k.parse::<Column>().map_err(|bad| format!("Unknown column: {}", bad)))
            .collect::<Result<_, _>>()?;
    }
    options.write_outputs = !no_write;

    if !no_write {
        let log_file = init_file_log(log_dir)?;
        eprintln!("📝 Logging to {}", log_file.display());
    }

    let run = run_pipeline(&options)?;

    if run.passed() {
        eprintln!("\n✨ Pipeline completed successfully!");
        if !run.outputs.is_empty() {
            eprintln!("   Outputs in {}", options.output_dir.display());
        }
        Ok(())
    } else {
        eprintln!("\n❌ Pipeline stopped: data validation failed");
        std::process::exit(1);
    }
}

fn cmd_transform(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_clean(input)?;
    let json = serde_json::to_string_pretty(&records)?;
    write_output(&json, output)?;
    Ok(())
}

fn cmd_validate(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_clean(input)?;
    let (passed, report) = Validator::new().validate(&records);

    for (name, outcome) in report.checks.iter() {
        let mark = if outcome.passed { "✅" } else { "❌" };
        eprintln!("   {} {}: {}", mark, name, outcome.details);
    }
    eprintln!("   Overall: {}", report.overall_status);

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}

fn cmd_quality(input: &Path, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_clean(input)?;
    let report = generate_quality_report(&records);
    eprintln!("   Records: {}", report.record_count);
    eprintln!("   Memory usage: {} MB", report.memory_usage_mb);

    let json = serde_json::to_string_pretty(&report)?;
    write_output(&json, output)?;
    Ok(())
}

fn cmd_aggregate(
    input: &Path,
    output_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_clean(input)?;
    let aggregations = aggregate(&records);

    for (name, rows) in aggregations.views() {
        eprintln!("   {}: {} rows", name, rows);
    }

    match output_dir {
        Some(dir) => {
            let saved = OutputStore::with_dir(dir)?.save_aggregations(&aggregations)?;
            eprintln!("   💾 Saved {} files to {}", saved.len(), dir.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&aggregations)?),
    }
    Ok(())
}

fn cmd_pivot(
    input: &Path,
    rows: &str,
    columns: &str,
    values: &str,
    aggfunc: &str,
    output_dir: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = load_clean(input)?;
    let table = pivot_named(&records, rows, columns, values, aggfunc)?;
    eprintln!(
        "   Pivot {} x {}: {} rows, {} columns",
        rows,
        columns,
        table.rows.len(),
        table.columns.len()
    );

    match output_dir {
        Some(dir) => {
            let path = OutputStore::with_dir(dir)?.save_pivot(&table, None)?;
            eprintln!("   💾 Saved to: {}", path.display());
        }
        None => println!("{}", serde_json::to_string_pretty(&table)?),
    }
    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    start_server(port, PipelineOptions::from_env()).await
}

/// Parse, clean and dedupe a CSV on transaction id.
fn load_clean(input: &Path) -> Result<Vec<CleanTransaction>, Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());
    let parsed = parse_csv_file_auto(input)?;
    eprintln!("   Encoding: {}", parsed.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(parsed.delimiter));
    eprintln!("   Rows: {}", parsed.records.len());

    let result = Transformer::new().transform(&parsed.records);
    let records = remove_duplicates(&result.records, &[Column::TransactionId]);
    eprintln!(
        "   Clean records: {} ({} missing, {} invalid, {} duplicates dropped)",
        records.len(),
        result.summary.dropped_missing,
        result.summary.dropped_invalid,
        result.records.len() - records.len()
    );
    Ok(records)
}

fn format_delimiter(d: char) -> String {
    match d {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

fn write_output(content: &str, output: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("   💾 Saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
