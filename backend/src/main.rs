//! patdash CLI - Analyse patent database exports
//!
//! # Main Commands
//!
//! ```bash
//! patdash analyze export.csv            # Full analysis, JSON report to stdout
//! patdash analyze export.csv -o r.json  # Write the report to a file
//! ```
//!
//! # Debug Commands
//!
//! ```bash
//! patdash parse export.csv          # Just parse CSV to JSON
//! patdash columns                   # Show the configured column names
//! patdash split-codes "A01B,1,00"   # Show how a classification field splits
//! ```

use clap::{Parser, Subcommand};
use patdash::{
    analyze_csv, decode_content, detect_encoding, parse_csv_file_auto, split_codes,
    AnalysisConfig, AnalysisReport, ConfigError, ReportStatus,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "patdash")]
#[command(about = "Rank, group and pivot patent application exports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Full analysis: CSV → rankings, trends, heatmaps, categories
    Analyze {
        /// Input CSV file
        input: PathBuf,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Applicants / codes kept in rankings (default: 10)
        #[arg(long)]
        top_n: Option<usize>,

        /// Applicants kept in the category cross-tabs (default: 15)
        #[arg(long)]
        category_top_applicants: Option<usize>,

        /// Single-line JSON
        #[arg(long)]
        compact: bool,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<char>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show the configured column names
    Columns,

    /// Split a classification field the way the analysis does
    SplitCodes {
        /// Raw classification field
        value: String,
    },
}

fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            input,
            output,
            top_n,
            category_top_applicants,
            compact,
        } => cmd_analyze(
            &input,
            output.as_deref(),
            top_n,
            category_top_applicants,
            compact,
        ),

        Commands::Parse {
            input,
            delimiter,
            output,
        } => cmd_parse(&input, delimiter, output.as_deref()),

        Commands::Columns => cmd_columns(),

        Commands::SplitCodes { value } => cmd_split_codes(&value),
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn load_config(
    top_n: Option<usize>,
    category_top_applicants: Option<usize>,
) -> Result<AnalysisConfig, Box<dyn std::error::Error>> {
    let mut config = AnalysisConfig::from_env()?;
    if let Some(n) = top_n {
        config.top_n = positive("--top-n", n)?;
    }
    if let Some(n) = category_top_applicants {
        config.category_top_applicants = positive("--category-top-applicants", n)?;
    }
    Ok(config)
}

fn positive(flag: &str, n: usize) -> Result<usize, ConfigError> {
    if n == 0 {
        return Err(ConfigError::InvalidNumber {
            key: flag.to_string(),
            value: n.to_string(),
        });
    }
    Ok(n)
}

fn cmd_analyze(
    input: &Path,
    output: Option<&Path>,
    top_n: Option<usize>,
    category_top_applicants: Option<usize>,
    compact: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Processing: {}", input.display());

    let config = load_config(top_n, category_top_applicants)?;
    let report = AnalysisReport::from(analyze_csv(input, &config)?);

    eprintln!("   Encoding: {}", report.csv_info.encoding);
    eprintln!("   Delimiter: '{}'", format_delimiter(report.csv_info.delimiter));
    eprintln!("   Rows: {}", report.csv_info.row_count);
    if let (Some(first), Some(last)) = (report.summary.first_year, report.summary.last_year) {
        eprintln!(
            "   Years: {} - {} ({} years, {} / year)",
            first, last, report.summary.year_span, report.summary.average_per_year
        );
    }
    eprintln!("   Distinct codes: {}", report.summary.distinct_codes);

    if report.status == ReportStatus::Warning {
        for warning in &report.warnings {
            eprintln!("   ⚠️  {}", warning);
        }
    }

    write_output(&report.to_json(!compact)?, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let result = match delimiter {
        None => parse_csv_file_auto(input)?,
        Some(d) => {
            let bytes = fs::read(input)?;
            let encoding = detect_encoding(&bytes);
            let content = decode_content(&bytes, &encoding)?;
            patdash::parser::parse_string_with_metadata(&content, d, encoding)?
        }
    };

    eprintln!("   Encoding: {}", result.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(result.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", result.headers.join(", "));
    eprintln!("✅ Parsed {} records", result.records.len());

    let json = serde_json::to_string_pretty(&result.records)?;
    write_output(&json, output)?;

    Ok(())
}

fn cmd_columns() -> Result<(), Box<dyn std::error::Error>> {
    let config = AnalysisConfig::from_env()?;
    let columns = &config.columns;

    println!("Required columns:");
    for name in columns.required() {
        println!("  {}", name);
    }
    println!("\nOptional columns (both enable the category analysis):");
    for name in columns.optional() {
        println!("  {}", name);
    }
    Ok(())
}

fn cmd_split_codes(value: &str) -> Result<(), Box<dyn std::error::Error>> {
    let codes = split_codes(value);
    println!("{}", serde_json::to_string_pretty(&codes)?);
    Ok(())
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
            eprintln!("💾 Saved to: {}", path.display());
        }
        None => println!("{}", content),
    }
    Ok(())
}
